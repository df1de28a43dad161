//! Open command - register a new customer account

use anyhow::Result;

use super::{get_context, get_logger, log_event, prompt_new_password};
use crate::output;
use tillbook_core::services::{LogEvent, OpenAccountRequest};
use tillbook_core::Profile;

#[allow(clippy::too_many_arguments)]
pub fn run(
    name: &str,
    date_of_birth: Option<String>,
    address: Option<String>,
    nationality: Option<String>,
    national_id: Option<String>,
    phone: Option<String>,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();

    let password = prompt_new_password("Choose an account password")?;
    let opened = ctx.account_service.open_account(OpenAccountRequest {
        name: name.to_string(),
        password,
        profile: Profile {
            date_of_birth,
            address,
            nationality,
            national_id,
            phone_number: phone,
        },
    })?;

    log_event(&logger, LogEvent::new("account_opened").with_command("open"));

    if json {
        println!("{}", serde_json::to_string_pretty(&opened)?);
        return Ok(());
    }

    output::success(&format!("Account opened for {}.", opened.name));
    output::info(&format!("Account number: {}", opened.account_number));
    output::warning("Keep the account number safe - it is needed for every operation.");
    Ok(())
}
