//! Admin commands - privileged mutations and bulk queries

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Subcommand;
use colored::Colorize;
use rust_decimal::Decimal;

use super::{
    authenticate_admin, get_context, get_logger, log_event, parse_amount, prompt_password,
    prompt_new_password,
};
use crate::output;
use tillbook_core::services::LogEvent;
use tillbook_core::{AccountFilter, TransactionFilter};

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Totals across the whole book
    Overview {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List accounts, optionally filtered
    Accounts {
        /// Substring match on account number
        #[arg(long)]
        number: Option<String>,
        /// Substring match on holder name
        #[arg(long)]
        name: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one account in full detail
    View {
        /// Account number
        account: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List transaction records, optionally filtered
    Transactions {
        /// Substring match on account number
        #[arg(long)]
        account: Option<String>,
        /// Substring match on record kind (e.g. TRANSFER)
        #[arg(long)]
        kind: Option<String>,
        /// Exact calendar date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Block an account (freezes outgoing money)
    Block {
        /// Account number
        account: String,
    },
    /// Unblock an account
    Unblock {
        /// Account number
        account: String,
    },
    /// Delete an account and all its history (irreversible)
    Delete {
        /// Account number
        account: String,
        /// Reason for deletion (kept in the event log)
        #[arg(long)]
        reason: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
    /// Apply an interest rate to every account
    Interest {
        /// Rate in percent (0-100)
        rate: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename the admin and set a new password
    ResetCredentials {
        /// New admin identifier
        #[arg(long)]
        new_id: String,
    },
}

pub fn run(admin_id: &str, command: AdminCommands) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();
    let session = authenticate_admin(&ctx, admin_id)?;

    match command {
        AdminCommands::Overview { json } => {
            let overview = ctx.dashboard_service.admin_overview()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
                return Ok(());
            }
            println!("{}", "Book overview".bold());
            println!();
            let mut table = output::create_table();
            table.add_row(vec!["Accounts", &overview.total_accounts.to_string()]);
            table.add_row(vec!["Transactions", &overview.total_transactions.to_string()]);
            table.add_row(vec!["Loans", &overview.total_loans.to_string()]);
            table.add_row(vec![
                "Total balance",
                &output::format_money(overview.total_balance),
            ]);
            table.add_row(vec![
                "Total outstanding",
                &output::format_money(overview.total_outstanding),
            ]);
            println!("{}", table);
            Ok(())
        }

        AdminCommands::Accounts { number, name, json } => {
            let accounts = ctx.admin_service.list_accounts(
                &session,
                &AccountFilter {
                    number_contains: number,
                    name_contains: name,
                },
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&accounts)?);
                return Ok(());
            }
            let mut table = output::create_table();
            table.set_header(vec!["Number", "Holder", "Balance", "Status"]);
            for account in &accounts {
                table.add_row(vec![
                    account.account_number.clone(),
                    account.name.clone(),
                    output::format_money(account.balance),
                    if account.is_blocked { "BLOCKED" } else { "ACTIVE" }.to_string(),
                ]);
            }
            println!("{}", table);
            output::info(&format!("{} account(s)", accounts.len()));
            Ok(())
        }

        AdminCommands::View { account, json } => {
            let account = ctx.admin_service.view_account(&session, &account)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&account)?);
                return Ok(());
            }
            let mut table = output::create_table();
            table.add_row(vec!["Number", &account.account_number]);
            table.add_row(vec!["Holder", &account.name]);
            table.add_row(vec!["Balance", &output::format_money(account.balance)]);
            table.add_row(vec![
                "Status",
                if account.is_blocked { "BLOCKED" } else { "ACTIVE" },
            ]);
            table.add_row(vec![
                "Date of birth",
                account.profile.date_of_birth.as_deref().unwrap_or("-"),
            ]);
            table.add_row(vec![
                "Address",
                account.profile.address.as_deref().unwrap_or("-"),
            ]);
            table.add_row(vec![
                "Nationality",
                account.profile.nationality.as_deref().unwrap_or("-"),
            ]);
            table.add_row(vec![
                "National ID",
                account.profile.national_id.as_deref().unwrap_or("-"),
            ]);
            table.add_row(vec![
                "Phone",
                account.profile.phone_number.as_deref().unwrap_or("-"),
            ]);
            println!("{}", table);
            Ok(())
        }

        AdminCommands::Transactions { account, kind, date, json } => {
            let on_date = date
                .map(|d| {
                    NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                        .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {d}"))
                })
                .transpose()?;
            let records = ctx.admin_service.list_transactions(
                &session,
                &TransactionFilter {
                    account_contains: account,
                    kind_contains: kind,
                    on_date,
                },
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }
            let mut table = output::create_table();
            table.set_header(vec!["When", "Account", "Kind", "Amount"]);
            for record in &records {
                table.add_row(vec![
                    record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    record.account_number.clone(),
                    record.kind.to_string(),
                    output::format_money(record.amount),
                ]);
            }
            println!("{}", table);
            output::info(&format!("{} record(s)", records.len()));
            Ok(())
        }

        AdminCommands::Block { account } => {
            ctx.admin_service.block_account(&session, &account)?;
            log_event(&logger, LogEvent::new("account_blocked").with_command("admin block"));
            output::success(&format!("Account {account} blocked."));
            Ok(())
        }

        AdminCommands::Unblock { account } => {
            ctx.admin_service.unblock_account(&session, &account)?;
            log_event(&logger, LogEvent::new("account_unblocked").with_command("admin unblock"));
            output::success(&format!("Account {account} unblocked."));
            Ok(())
        }

        AdminCommands::Delete { account, reason, force } => {
            if !force {
                let confirmed = dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "Delete account {account} with all its loans and history? This cannot be undone"
                    ))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    output::info("Aborted.");
                    return Ok(());
                }
            }
            ctx.admin_service.delete_account(&session, &account, &reason)?;
            log_event(
                &logger,
                LogEvent::new("account_deleted")
                    .with_command("admin delete")
                    .with_error_details(reason),
            );
            output::success(&format!("Account {account} deleted."));
            Ok(())
        }

        AdminCommands::Interest { rate, force, json } => {
            let rate: Decimal = parse_amount(&rate)?;
            if !force {
                let confirmed = dialoguer::Confirm::new()
                    .with_prompt(format!("Apply {rate}% interest to all accounts?"))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    output::info("Aborted.");
                    return Ok(());
                }
            }
            let batch = ctx.admin_service.set_interest_rate(&session, rate)?;
            log_event(&logger, LogEvent::new("interest_applied").with_command("admin interest"));
            if json {
                println!("{}", serde_json::to_string_pretty(&batch)?);
                return Ok(());
            }
            output::success(&format!(
                "Applied {}% interest to {} account(s); {} credited in total.",
                rate,
                batch.accounts_updated,
                output::format_money(batch.total_interest)
            ));
            Ok(())
        }

        AdminCommands::ResetCredentials { new_id } => {
            let current_password = prompt_password("Current admin password")?;
            let new_password = prompt_new_password("New admin password")?;
            ctx.admin_service
                .reset_credentials(&session, &current_password, &new_id, &new_password)?;
            log_event(
                &logger,
                LogEvent::new("admin_credentials_reset").with_command("admin reset-credentials"),
            );
            output::success(&format!("Admin credentials updated; new id is '{new_id}'."));
            Ok(())
        }
    }
}
