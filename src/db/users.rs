use sqlx::MySqlPool;
use sqlx::mysql::MySqlDatabaseError;
use thiserror::Error;

use super::models::{NewUser, Role, User};

// MySQL "duplicate entry for key" errno
const ER_DUP_ENTRY: u16 = 1062;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("username or email already exists")]
    Duplicate,
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, RepoError>;

/// Issues the statements against the `users` table. Each operation is a
/// single statement on a pooled connection; the connection goes back to
/// the pool on every exit path.
pub struct UserRepository;

impl UserRepository {
    /// All users, newest first. The password column is never selected.
    pub async fn list_all(pool: &MySqlPool) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, fullname, username, email, role, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(users)
    }

    /// Insert a user and return the server-assigned id.
    pub async fn create(pool: &MySqlPool, user: &NewUser) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (fullname, username, email, password, role)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.fullname)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .execute(pool)
        .await
        .map_err(into_repo_error)?;

        Ok(result.last_insert_id())
    }

    /// Remove a user. `false` means no row had that id.
    pub async fn delete(pool: &MySqlPool, id: u64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace a user's password hash, refreshing `updated_at`.
    pub async fn update_password(pool: &MySqlPool, id: u64, new_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(new_hash)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Change a user's role, refreshing `updated_at`.
    pub async fn update_role(pool: &MySqlPool, id: u64, role: Role) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET role = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(role)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Unique-constraint violations get their own kind so the shell can tell
/// the operator which input to fix; everything else stays a query failure.
fn into_repo_error(err: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            if mysql_err.number() == ER_DUP_ENTRY {
                return RepoError::Duplicate;
            }
        }
    }
    RepoError::Query(err)
}
