//! CLI command implementations

pub mod admin;
pub mod backup;
pub mod dashboard;
pub mod demo;
pub mod deposit;
pub mod loan;
pub mod logs;
pub mod open;
pub mod profile;
pub mod query;
pub mod setup;
pub mod status;
pub mod transfer;
pub mod withdraw;

use std::path::PathBuf;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tillbook_core::services::{EntryPoint, LogEvent, LoggingService};
use tillbook_core::{AdminSession, LedgerContext, Session};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let tillbook_dir = get_tillbook_dir();
    std::fs::create_dir_all(&tillbook_dir).ok()?;
    LoggingService::new(&tillbook_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the tillbook directory from environment or default
pub fn get_tillbook_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TILLBOOK_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".tillbook")
    }
}

/// Get or create the ledger context
pub fn get_context() -> Result<LedgerContext> {
    let tillbook_dir = get_tillbook_dir();

    std::fs::create_dir_all(&tillbook_dir)
        .with_context(|| format!("Failed to create tillbook directory: {:?}", tillbook_dir))?;

    LedgerContext::new(&tillbook_dir).context("Failed to initialize ledger context")
}

/// Prompt for a password, or take it from TILLBOOK_PASSWORD (for scripting)
pub fn prompt_password(prompt: &str) -> Result<String> {
    if let Ok(password) = std::env::var("TILLBOOK_PASSWORD") {
        return Ok(password);
    }
    let password = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .context("Failed to read password")?;
    Ok(password)
}

/// Prompt for a new password with confirmation
pub fn prompt_new_password(prompt: &str) -> Result<String> {
    if let Ok(password) = std::env::var("TILLBOOK_PASSWORD") {
        return Ok(password);
    }
    let password = dialoguer::Password::new()
        .with_prompt(prompt)
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .context("Failed to read password")?;
    Ok(password)
}

/// Authenticate a customer, prompting for the account password
pub fn authenticate(ctx: &LedgerContext, account: &str) -> Result<Session> {
    let password = prompt_password(&format!("Password for account {account}"))?;
    Ok(ctx.account_service.authenticate(account, &password)?)
}

/// Authenticate an administrator, prompting for the admin password
pub fn authenticate_admin(ctx: &LedgerContext, admin_id: &str) -> Result<AdminSession> {
    let password = prompt_password(&format!("Password for admin {admin_id}"))?;
    Ok(ctx.admin_service.authenticate(admin_id, &password)?)
}

/// Parse a user-supplied amount string
pub fn parse_amount(input: &str) -> Result<Decimal> {
    input
        .trim()
        .trim_start_matches('$')
        .parse::<Decimal>()
        .with_context(|| format!("Invalid amount: {input}"))
}
