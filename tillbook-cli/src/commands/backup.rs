//! Backup commands - create and list ledger backups

use anyhow::Result;
use clap::Subcommand;

use super::{get_context, get_logger, log_event};
use crate::output;
use tillbook_core::services::LogEvent;

#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a new backup
    Create {
        /// Keep at most this many backups (oldest pruned)
        #[arg(long)]
        keep: Option<usize>,
    },
    /// List existing backups
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: BackupCommands) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();

    match command {
        BackupCommands::Create { keep } => {
            // Checkpoint first so the file on disk is complete
            ctx.store.checkpoint()?;
            let created = ctx.backup_service.create(keep)?;
            log_event(&logger, LogEvent::new("backup_created").with_command("backup create"));
            output::success(&format!(
                "Backup {} created ({}).",
                created.name,
                created.size_display()
            ));
            Ok(())
        }
        BackupCommands::List { json } => {
            let backups = ctx.backup_service.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&backups)?);
                return Ok(());
            }
            if backups.is_empty() {
                output::info("No backups yet.");
                return Ok(());
            }
            let mut table = output::create_table();
            table.set_header(vec!["Name", "Created", "Size"]);
            for backup in &backups {
                table.add_row(vec![
                    backup.name.clone(),
                    backup.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    backup.size_display(),
                ]);
            }
            println!("{}", table);
            Ok(())
        }
    }
}
