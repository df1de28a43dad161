//! Transfer command

use anyhow::Result;

use super::{authenticate, get_context, get_logger, log_event, parse_amount};
use crate::output;
use tillbook_core::services::LogEvent;

pub fn run(from: &str, to: &str, amount: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();
    let amount = parse_amount(amount)?;

    let session = authenticate(&ctx, from)?;
    if let Err(e) = ctx.engine.transfer(&session.account_number, to, amount) {
        log_event(
            &logger,
            LogEvent::new("transfer_failed")
                .with_command("transfer")
                .with_error(e.to_string()),
        );
        return Err(e.into());
    }

    log_event(&logger, LogEvent::new("transfer_completed").with_command("transfer"));

    if json {
        println!(
            "{}",
            serde_json::json!({ "from": from, "to": to, "amount": amount })
        );
        return Ok(());
    }

    output::success(&format!(
        "Transferred {} from {} to {}.",
        output::format_money(amount),
        from,
        to
    ));
    Ok(())
}
