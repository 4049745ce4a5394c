mod prompts;

use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use dialoguer::Input;
use sqlx::MySqlPool;

use crate::db::models::{NewUser, User};
use crate::db::users::{RepoError, UserRepository};
use crate::password::hash_password;
use self::prompts::{
    IdChoice, prompt_password_with_confirmation, prompt_required, prompt_role, prompt_user_id,
};

pub fn print_banner() {
    println!("{}", "IDE Judge - user administration".bold());
    println!("{}", Local::now().format("%Y-%m-%d %H:%M:%S"));
}

fn print_menu() {
    println!();
    println!("{}", "What do you want to do?".bold());
    println!("  1. List all users");
    println!("  2. Create user");
    println!("  3. Delete user");
    println!("  4. Change password");
    println!("  5. Change role");
    println!("  0. Exit");
}

fn print_section(title: &str) {
    println!();
    println!("{}", title.bold());
}

fn report_db_error(err: &RepoError) {
    println!("{} {err}", "Error:".red());
}

/// The menu loop. Everything in here reports failures to the operator and
/// returns to the menu; only prompt I/O errors propagate out.
pub async fn run(pool: &MySqlPool) -> Result<()> {
    loop {
        print_menu();
        let choice: String = Input::new()
            .with_prompt("Your choice")
            .allow_empty(true)
            .interact_text()?;

        match choice.trim() {
            "1" => list_users(pool).await?,
            "2" => create_user(pool).await?,
            "3" => delete_user(pool).await?,
            "4" => change_password(pool).await?,
            "5" => change_role(pool).await?,
            "0" => {
                println!("{}", "Bye.".green());
                return Ok(());
            }
            _ => println!("{}", "Invalid choice.".red()),
        }
    }
}

async fn list_users(pool: &MySqlPool) -> Result<()> {
    match UserRepository::list_all(pool).await {
        Ok(users) => print_user_table(&users),
        Err(err) => report_db_error(&err),
    }
    Ok(())
}

fn print_user_table(users: &[User]) {
    if users.is_empty() {
        println!("{}", "No users in the system.".yellow());
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["ID", "Full name", "Username", "Email", "Role", "Created"]);

    for user in users {
        table.add_row([
            user.id.to_string(),
            user.fullname.clone(),
            user.username.clone(),
            user.email.clone(),
            user.role.to_string(),
            user.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
    println!("Total: {} users", users.len());
}

async fn create_user(pool: &MySqlPool) -> Result<()> {
    print_section("CREATE USER");

    let Some(fullname) = prompt_required("Full name")? else {
        return Ok(());
    };
    let Some(username) = prompt_required("Username")? else {
        return Ok(());
    };
    let Some(email) = prompt_required("Email")? else {
        return Ok(());
    };
    let Some(password) = prompt_password_with_confirmation("Password")? else {
        return Ok(());
    };
    let Some(role) = prompt_role()? else {
        return Ok(());
    };

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(err) => {
            println!("{} {err}", "Error:".red());
            return Ok(());
        }
    };

    let new_user = NewUser {
        fullname,
        username,
        email,
        password_hash,
        role,
    };

    match UserRepository::create(pool, &new_user).await {
        Ok(id) => {
            println!();
            println!("{}", "User created.".green());
            println!("  ID:        {id}");
            println!("  Full name: {}", new_user.fullname);
            println!("  Username:  {}", new_user.username);
            println!("  Email:     {}", new_user.email);
            println!("  Role:      {}", new_user.role);
        }
        Err(RepoError::Duplicate) => {
            println!("{}", "Username or email already exists.".red());
        }
        Err(err) => report_db_error(&err),
    }
    Ok(())
}

async fn delete_user(pool: &MySqlPool) -> Result<()> {
    print_section("DELETE USER");
    list_users(pool).await?;

    let id = match prompt_user_id("User id to delete")? {
        IdChoice::Id(id) => id,
        IdChoice::Cancelled | IdChoice::Invalid => return Ok(()),
    };

    let confirmation: String = Input::new()
        .with_prompt(format!("Really delete user {id}? (yes/no)"))
        .allow_empty(true)
        .interact_text()?;
    if !confirmation.trim().eq_ignore_ascii_case("yes") {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }

    match UserRepository::delete(pool, id).await {
        Ok(true) => println!("{}", format!("Deleted user {id}.").green()),
        Ok(false) => println!("{}", format!("No user with id {id}.").red()),
        Err(err) => report_db_error(&err),
    }
    Ok(())
}

async fn change_password(pool: &MySqlPool) -> Result<()> {
    print_section("CHANGE PASSWORD");
    list_users(pool).await?;

    let id = match prompt_user_id("User id")? {
        IdChoice::Id(id) => id,
        IdChoice::Cancelled | IdChoice::Invalid => return Ok(()),
    };

    let Some(password) = prompt_password_with_confirmation("New password")? else {
        return Ok(());
    };

    let new_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(err) => {
            println!("{} {err}", "Error:".red());
            return Ok(());
        }
    };

    match UserRepository::update_password(pool, id, &new_hash).await {
        Ok(true) => println!("{}", format!("Password changed for user {id}.").green()),
        Ok(false) => println!("{}", format!("No user with id {id}.").red()),
        Err(err) => report_db_error(&err),
    }
    Ok(())
}

async fn change_role(pool: &MySqlPool) -> Result<()> {
    print_section("CHANGE ROLE");
    list_users(pool).await?;

    let id = match prompt_user_id("User id")? {
        IdChoice::Id(id) => id,
        IdChoice::Cancelled | IdChoice::Invalid => return Ok(()),
    };

    let Some(role) = prompt_role()? else {
        return Ok(());
    };

    match UserRepository::update_role(pool, id, role).await {
        Ok(true) => println!(
            "{}",
            format!("Changed role of user {id} to '{role}'.").green()
        ),
        Ok(false) => println!("{}", format!("No user with id {id}.").red()),
        Err(err) => report_db_error(&err),
    }
    Ok(())
}
