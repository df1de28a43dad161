//! Profile command - edit account profile fields

use anyhow::Result;

use super::{authenticate, get_context, get_logger, log_event, prompt_new_password};
use crate::output;
use tillbook_core::services::LogEvent;

#[allow(clippy::too_many_arguments)]
pub fn run(
    account: &str,
    name: Option<String>,
    date_of_birth: Option<String>,
    address: Option<String>,
    nationality: Option<String>,
    national_id: Option<String>,
    phone: Option<String>,
    change_password: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();

    let session = authenticate(&ctx, account)?;
    let current = ctx.account_service.get(&session.account_number)?;

    // Fields not given on the command line keep their current values
    let new_name = name.unwrap_or(current.name);
    let mut profile = current.profile;
    if date_of_birth.is_some() {
        profile.date_of_birth = date_of_birth;
    }
    if address.is_some() {
        profile.address = address;
    }
    if nationality.is_some() {
        profile.nationality = nationality;
    }
    if national_id.is_some() {
        profile.national_id = national_id;
    }
    if phone.is_some() {
        profile.phone_number = phone;
    }

    let new_password = if change_password {
        Some(prompt_new_password("New account password")?)
    } else {
        None
    };

    ctx.engine.edit_profile(
        &session.account_number,
        &new_name,
        &profile,
        new_password.as_deref(),
    )?;

    log_event(&logger, LogEvent::new("profile_updated").with_command("profile"));
    output::success("Profile updated.");
    Ok(())
}
