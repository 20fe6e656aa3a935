use anyhow::{Context, Result, bail};
use colored::Colorize;
use opsdesk_core::session::SessionIdentity;
use opsdesk_interaction::Credentials;
use rustyline::DefaultEditor;

use crate::app::AppContext;

const ENV_PASSWORD: &str = "OPSDESK_PASSWORD";

pub async fn login(
    ctx: &AppContext,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let credentials = resolve_credentials(username, password)?;
    let identity = ctx.auth.login(&credentials).await?;
    println!("{}", format!("Logged in as {}", credentials.username).green());
    print_identity(&identity);
    Ok(())
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    ctx.auth.logout()?;
    println!("{}", "Logged out".green());
    Ok(())
}

pub fn whoami(ctx: &AppContext) -> Result<()> {
    match ctx.auth.current_identity() {
        Some(identity) => print_identity(&identity),
        None => println!("{}", "Not logged in".yellow()),
    }
    Ok(())
}

pub fn print_identity(identity: &SessionIdentity) {
    println!(
        "  {} {}",
        "id:".bright_black(),
        identity.user_id.as_deref().unwrap_or("-")
    );
    println!(
        "  {} {}",
        "role:".bright_black(),
        identity.role.as_deref().unwrap_or("-")
    );
}

/// Fills in whatever was not passed on the command line, prompting last.
fn resolve_credentials(username: Option<String>, password: Option<String>) -> Result<Credentials> {
    let password = password.or_else(|| std::env::var(ENV_PASSWORD).ok());
    if let (Some(username), Some(password)) = (&username, &password) {
        return Ok(Credentials::new(username.as_str(), password.as_str()));
    }

    let mut editor = DefaultEditor::new().context("Failed to open the terminal for input")?;
    let username = match username {
        Some(username) => username,
        None => editor.readline("username: ")?.trim().to_string(),
    };
    let password = match password {
        Some(password) => password,
        None => editor.readline("password: ")?,
    };
    if username.is_empty() {
        bail!("username must not be empty");
    }
    Ok(Credentials::new(username, password))
}
