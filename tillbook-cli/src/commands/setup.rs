//! Setup command - first-run admin provisioning

use anyhow::Result;

use super::{get_context, get_logger, log_event, prompt_new_password};
use crate::output;
use tillbook_core::services::LogEvent;

pub fn run(admin_id: &str) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();

    if ctx.admin_service.is_provisioned()? {
        output::warning("Admin credentials are already provisioned.");
        output::info("Use 'tb admin --as <id> reset-credentials' to change them.");
        return Ok(());
    }

    let password = prompt_new_password(&format!("Password for admin {admin_id}"))?;
    ctx.admin_service.provision(admin_id, &password)?;

    log_event(&logger, LogEvent::new("admin_provisioned").with_command("setup"));
    output::success(&format!("Admin '{admin_id}' provisioned."));
    Ok(())
}
