use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;

/// Conventional MySQL server port, also the port inside the container.
pub const DEFAULT_PORT: u16 = 3306;
/// Hostname of the database service on the compose network.
pub const SERVICE_HOST: &str = "mysql";

const CONTAINER_MARKER: &str = "/.dockerenv";
const CONTAINER_NAME: &str = "ide-judge-mysql";
const COMPOSE_FILE: &str = "docker-compose.yml";
const INSPECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Where to reach the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbEndpoint {
    pub host: String,
    pub port: u16,
}

impl DbEndpoint {
    fn localhost(port: u16) -> Self {
        Self {
            host: "localhost".to_string(),
            port,
        }
    }
}

/// Figures out how to reach the database by probing the environment.
///
/// Probes run in order; the first one that yields an answer wins and every
/// failure falls through silently:
///
/// 1. container marker file present -> we are on the service network
/// 2. `docker inspect` of the database container -> host-mapped port
/// 3. `ports:` mapping in the local compose file -> host-mapped port
/// 4. conventional default
pub struct Resolver {
    marker: PathBuf,
    compose_file: PathBuf,
    container: String,
    debug: bool,
}

impl Resolver {
    pub fn new(debug: bool) -> Self {
        Self {
            marker: PathBuf::from(CONTAINER_MARKER),
            compose_file: PathBuf::from(COMPOSE_FILE),
            container: CONTAINER_NAME.to_string(),
            debug,
        }
    }

    /// Same resolver with every probe location replaced. Used by tests to
    /// point the chain at fake filesystem layouts.
    pub fn with_probes(marker: &Path, compose_file: &Path, container: &str, debug: bool) -> Self {
        Self {
            marker: marker.to_path_buf(),
            compose_file: compose_file.to_path_buf(),
            container: container.to_string(),
            debug,
        }
    }

    /// Resolve an endpoint, honoring explicit overrides first.
    ///
    /// Fields the operator set in the environment are taken as-is; the
    /// probe chain only runs to fill in the ones left unset.
    pub async fn endpoint_for(
        &self,
        host_override: Option<String>,
        port_override: Option<u16>,
    ) -> DbEndpoint {
        if let (Some(host), Some(port)) = (&host_override, port_override) {
            return DbEndpoint {
                host: host.clone(),
                port,
            };
        }

        let resolved = self.resolve().await;
        DbEndpoint {
            host: host_override.unwrap_or(resolved.host),
            port: port_override.unwrap_or(resolved.port),
        }
    }

    /// Run the probe chain. Never fails; degrades to `localhost:3306`.
    pub async fn resolve(&self) -> DbEndpoint {
        if self.marker.exists() {
            self.trace("container marker found, using service network");
            return DbEndpoint {
                host: SERVICE_HOST.to_string(),
                port: DEFAULT_PORT,
            };
        }

        if let Some(port) = self.inspect_container().await {
            self.trace(&format!("container inspection mapped port {port}"));
            return DbEndpoint::localhost(port);
        }

        if let Some(port) = self.compose_port() {
            self.trace(&format!("compose file mapped port {port}"));
            return DbEndpoint::localhost(port);
        }

        self.trace("no mapping found, using default port");
        DbEndpoint::localhost(DEFAULT_PORT)
    }

    /// Ask the container runtime for the host port mapped to the database
    /// container. Spawn failures, timeouts, non-zero exits and unparsable
    /// output all degrade to `None`.
    async fn inspect_container(&self) -> Option<u16> {
        let child = Command::new("docker")
            .args(["inspect", &self.container])
            .kill_on_drop(true)
            .output();

        let output = match timeout(INSPECT_TIMEOUT, child).await {
            Ok(Ok(output)) if output.status.success() => output,
            Ok(Ok(_)) => {
                self.trace("docker inspect exited non-zero");
                return None;
            }
            Ok(Err(err)) => {
                self.trace(&format!("docker inspect failed to run: {err}"));
                return None;
            }
            Err(_) => {
                self.trace("docker inspect timed out");
                return None;
            }
        };

        host_port_from_inspect(&output.stdout, DEFAULT_PORT)
    }

    fn compose_port(&self) -> Option<u16> {
        let text = fs::read_to_string(&self.compose_file).ok()?;
        host_port_from_compose(&text, DEFAULT_PORT)
    }

    fn trace(&self, message: &str) {
        if self.debug {
            eprintln!("resolver: {message}");
        }
    }
}

#[derive(Debug, Deserialize)]
struct InspectEntry {
    #[serde(rename = "NetworkSettings")]
    network_settings: NetworkSettings,
}

#[derive(Debug, Deserialize)]
struct NetworkSettings {
    #[serde(rename = "Ports", default)]
    ports: HashMap<String, Option<Vec<PortBinding>>>,
}

#[derive(Debug, Deserialize)]
struct PortBinding {
    #[serde(rename = "HostPort")]
    host_port: String,
}

/// Extract the host port mapped to `internal` from `docker inspect` output.
fn host_port_from_inspect(stdout: &[u8], internal: u16) -> Option<u16> {
    let entries: Vec<InspectEntry> = serde_json::from_slice(stdout).ok()?;
    let bindings = entries
        .first()?
        .network_settings
        .ports
        .get(&format!("{internal}/tcp"))?
        .as_ref()?;
    bindings.first()?.host_port.parse().ok()
}

/// Scan compose-file text for a `"<host>:<internal>"` entry in a `ports:`
/// block. Pattern match over the raw text, so a file that is not valid
/// YAML elsewhere still resolves.
fn host_port_from_compose(text: &str, internal: u16) -> Option<u16> {
    let item =
        regex::Regex::new(&format!(r#"^\s*-\s*['"]?(\d+):{internal}['"]?\s*(?:#.*)?$"#)).ok()?;

    let mut in_ports = false;
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("ports:") {
            in_ports = true;
            continue;
        }
        if !in_ports {
            continue;
        }
        if let Some(caps) = item.captures(line) {
            return caps[1].parse().ok();
        }
        // ports: lists only contain `- ...` items; anything else ends the block
        if !trimmed.is_empty() && !trimmed.starts_with('-') && !trimmed.starts_with('#') {
            in_ports = false;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const INSPECT_JSON: &str = r#"[
        {
            "Id": "6bb7a8a2f3a1",
            "NetworkSettings": {
                "Ports": {
                    "3306/tcp": [
                        { "HostIp": "0.0.0.0", "HostPort": "2310" }
                    ],
                    "33060/tcp": null
                }
            }
        }
    ]"#;

    #[test]
    fn inspect_output_yields_mapped_port() {
        assert_eq!(host_port_from_inspect(INSPECT_JSON.as_bytes(), 3306), Some(2310));
    }

    #[test]
    fn inspect_output_without_mapping_yields_none() {
        assert_eq!(host_port_from_inspect(INSPECT_JSON.as_bytes(), 5432), None);
        assert_eq!(host_port_from_inspect(INSPECT_JSON.as_bytes(), 33060), None);
    }

    #[test]
    fn malformed_inspect_output_yields_none() {
        assert_eq!(host_port_from_inspect(b"not json", 3306), None);
        assert_eq!(host_port_from_inspect(b"[]", 3306), None);
    }

    #[test]
    fn compose_ports_block_is_matched() {
        let compose = "services:\n  mysql:\n    image: mysql:8\n    ports:\n      - \"2310:3306\"\n";
        assert_eq!(host_port_from_compose(compose, 3306), Some(2310));
    }

    #[test]
    fn compose_unquoted_mapping_is_matched() {
        let compose = "ports:\n  - 13306:3306\n";
        assert_eq!(host_port_from_compose(compose, 3306), Some(13306));
    }

    #[test]
    fn compose_mapping_outside_ports_block_is_ignored() {
        let compose = "volumes:\n  - \"2310:3306\"\n";
        assert_eq!(host_port_from_compose(compose, 3306), None);
    }

    #[test]
    fn compose_mapping_for_other_internal_port_is_ignored() {
        let compose = "ports:\n  - \"8080:80\"\n";
        assert_eq!(host_port_from_compose(compose, 3306), None);
        // 33060 must not match as a prefix of the pattern
        let compose = "ports:\n  - \"8090:33060\"\n";
        assert_eq!(host_port_from_compose(compose, 3306), None);
    }

    #[test]
    fn compose_scan_skips_non_matching_items_in_the_block() {
        let compose = "ports:\n  - \"8090:33060\"\n  - '2310:3306'\n";
        assert_eq!(host_port_from_compose(compose, 3306), Some(2310));
    }

    #[test]
    fn compose_block_ends_at_next_key() {
        let compose = "ports:\n  - \"8080:80\"\nenvironment:\n  - \"2310:3306\"\n";
        assert_eq!(host_port_from_compose(compose, 3306), None);
    }

    #[tokio::test]
    async fn marker_wins_over_other_signals() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join(".dockerenv");
        fs::write(&marker, "").unwrap();
        let compose = dir.path().join("docker-compose.yml");
        fs::write(&compose, "ports:\n  - \"2310:3306\"\n").unwrap();

        let resolver = Resolver::with_probes(&marker, &compose, "judgeadm-test-missing", false);
        assert_eq!(
            resolver.resolve().await,
            DbEndpoint {
                host: SERVICE_HOST.to_string(),
                port: DEFAULT_PORT,
            }
        );
    }

    #[tokio::test]
    async fn compose_file_is_used_when_marker_and_container_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        let compose = dir.path().join("docker-compose.yml");
        fs::write(&compose, "services:\n  mysql:\n    ports:\n      - \"2310:3306\"\n").unwrap();

        // the container name does not exist, so the inspection step fails
        // through to the compose scan whether or not docker is installed
        let resolver = Resolver::with_probes(
            &dir.path().join(".dockerenv"),
            &compose,
            "judgeadm-test-missing",
            false,
        );
        assert_eq!(resolver.resolve().await, DbEndpoint::localhost(2310));
    }

    #[tokio::test]
    async fn default_port_is_the_last_resort() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = Resolver::with_probes(
            &dir.path().join(".dockerenv"),
            &dir.path().join("docker-compose.yml"),
            "judgeadm-test-missing",
            false,
        );
        assert_eq!(resolver.resolve().await, DbEndpoint::localhost(DEFAULT_PORT));
    }

    #[tokio::test]
    async fn explicit_overrides_skip_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join(".dockerenv");
        fs::write(&marker, "").unwrap();

        let resolver = Resolver::with_probes(
            &marker,
            &dir.path().join("docker-compose.yml"),
            "judgeadm-test-missing",
            false,
        );
        let endpoint = resolver
            .endpoint_for(Some("db.example.com".to_string()), Some(9000))
            .await;
        assert_eq!(
            endpoint,
            DbEndpoint {
                host: "db.example.com".to_string(),
                port: 9000,
            }
        );
    }

    #[tokio::test]
    async fn partial_override_fills_the_gap_from_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join(".dockerenv");
        fs::write(&marker, "").unwrap();

        let resolver = Resolver::with_probes(
            &marker,
            &dir.path().join("docker-compose.yml"),
            "judgeadm-test-missing",
            false,
        );
        let endpoint = resolver.endpoint_for(None, Some(9000)).await;
        assert_eq!(endpoint.host, SERVICE_HOST);
        assert_eq!(endpoint.port, 9000);
    }
}
