use anyhow::Result;
use colored::Colorize;
use dialoguer::{Input, Password};

use crate::db::models::Role;

/// Outcome of an id prompt: the operator can always back out with `q`.
#[derive(Debug, PartialEq, Eq)]
pub enum IdChoice {
    Cancelled,
    Id(u64),
    Invalid,
}

pub fn parse_id_choice(input: &str) -> IdChoice {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("q") {
        return IdChoice::Cancelled;
    }
    match trimmed.parse::<u64>() {
        Ok(id) => IdChoice::Id(id),
        Err(_) => IdChoice::Invalid,
    }
}

pub fn trimmed_non_empty(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Prompt for a user id, reporting invalid input locally.
pub fn prompt_user_id(label: &str) -> Result<IdChoice> {
    let input: String = Input::new()
        .with_prompt(format!("{label} (or 'q' to cancel)"))
        .allow_empty(true)
        .interact_text()?;

    let choice = parse_id_choice(&input);
    if choice == IdChoice::Invalid {
        println!("{}", "Invalid id, expected a number.".red());
    }
    Ok(choice)
}

/// Prompt for a required free-text field. Empty input is reported and
/// yields `None` so the caller returns to the menu.
pub fn prompt_required(label: &str) -> Result<Option<String>> {
    let input: String = Input::new()
        .with_prompt(label)
        .allow_empty(true)
        .interact_text()?;

    let value = trimmed_non_empty(&input);
    if value.is_none() {
        println!("{}", format!("{label} must not be empty.").red());
    }
    Ok(value)
}

/// Prompt for a masked password and its confirmation. Empty input and a
/// mismatched confirmation are reported and yield `None`.
pub fn prompt_password_with_confirmation(label: &str) -> Result<Option<String>> {
    let password = Password::new()
        .with_prompt(label)
        .allow_empty_password(true)
        .interact()?;

    if password.is_empty() {
        println!("{}", "Password must not be empty.".red());
        return Ok(None);
    }

    let confirmation = Password::new()
        .with_prompt("Confirm password")
        .allow_empty_password(true)
        .interact()?;

    if password != confirmation {
        println!("{}", "Passwords do not match.".red());
        return Ok(None);
    }

    Ok(Some(password))
}

/// Show the role menu and read a numeric choice. An unknown choice is
/// reported and yields `None`.
pub fn prompt_role() -> Result<Option<Role>> {
    println!("Select a role:");
    println!("  1. User (regular account)");
    println!("  2. Admin (administrator)");

    let input: String = Input::new()
        .with_prompt("Choice (1/2)")
        .allow_empty(true)
        .interact_text()?;

    let role = Role::from_menu_choice(&input);
    if role.is_none() {
        println!("{}", "Invalid role choice.".red());
    }
    Ok(role)
}
