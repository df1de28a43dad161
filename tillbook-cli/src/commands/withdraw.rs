//! Withdraw command

use anyhow::Result;

use super::{authenticate, get_context, get_logger, log_event, parse_amount};
use crate::output;
use tillbook_core::services::LogEvent;

pub fn run(account: &str, amount: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();
    let amount = parse_amount(amount)?;

    let session = authenticate(&ctx, account)?;
    let record = match ctx.engine.withdraw(&session.account_number, amount) {
        Ok(record) => record,
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new("withdrawal_failed")
                    .with_command("withdraw")
                    .with_error(e.to_string()),
            );
            return Err(e.into());
        }
    };

    log_event(&logger, LogEvent::new("withdrawal_completed").with_command("withdraw"));

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    output::success(&format!(
        "Withdrew {} from {}.",
        output::format_money(record.amount),
        record.account_number
    ));
    Ok(())
}
