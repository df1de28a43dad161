//! Loan commands - apply and repay

use anyhow::Result;
use clap::Subcommand;

use super::{authenticate, get_context, get_logger, log_event, parse_amount};
use crate::output;
use tillbook_core::services::LogEvent;

#[derive(Subcommand)]
pub enum LoanCommands {
    /// Apply for a loan (credited straight to the account)
    Apply {
        /// Account number
        account: String,
        /// Loan amount
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Repay against the earliest open loan
    Repay {
        /// Account number
        account: String,
        /// Repayment amount
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: LoanCommands) -> Result<()> {
    match command {
        LoanCommands::Apply { account, amount, json } => apply(&account, &amount, json),
        LoanCommands::Repay { account, amount, json } => repay(&account, &amount, json),
    }
}

fn apply(account: &str, amount: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();
    let amount = parse_amount(amount)?;

    let session = authenticate(&ctx, account)?;
    let loan = match ctx.engine.apply_for_loan(&session.account_number, amount) {
        Ok(loan) => loan,
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new("loan_failed")
                    .with_command("loan apply")
                    .with_error(e.to_string()),
            );
            return Err(e.into());
        }
    };

    log_event(&logger, LogEvent::new("loan_issued").with_command("loan apply"));

    if json {
        println!("{}", serde_json::to_string_pretty(&loan)?);
        return Ok(());
    }

    output::success(&format!(
        "Loan of {} approved and added to account {}.",
        output::format_money(loan.principal),
        loan.account_number
    ));
    Ok(())
}

fn repay(account: &str, amount: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();
    let amount = parse_amount(amount)?;

    let session = authenticate(&ctx, account)?;
    let outcome = match ctx.engine.repay_loan(&session.account_number, amount) {
        Ok(outcome) => outcome,
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new("repayment_failed")
                    .with_command("loan repay")
                    .with_error(e.to_string()),
            );
            return Err(e.into());
        }
    };

    log_event(&logger, LogEvent::new("loan_repaid").with_command("loan repay"));

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    output::success(&format!(
        "Repayment of {} applied; {} remaining.",
        output::format_money(outcome.amount),
        output::format_money(outcome.remaining)
    ));
    if outcome.fully_repaid {
        output::success("Congratulations! The loan is fully repaid.");
    }
    Ok(())
}
