//! Logs commands - view and export event logs

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use super::get_logger;
use crate::output;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    Show {
        /// Maximum entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Only entries with errors
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the log database for troubleshooting
    Export {
        /// Destination file
        path: PathBuf,
    },
}

pub fn run(command: LogsCommands) -> Result<()> {
    let Some(logger) = get_logger() else {
        anyhow::bail!("Could not open the log database");
    };

    match command {
        LogsCommands::Show { limit, errors, json } => {
            let entries = if errors {
                logger.get_errors(limit)?
            } else {
                logger.get_recent(limit)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            if entries.is_empty() {
                output::info("No log entries.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Event", "Command", "Error", "Version"]);
            for entry in &entries {
                table.add_row(vec![
                    entry.event.clone(),
                    entry.command.clone().unwrap_or_default(),
                    entry.error_message.clone().unwrap_or_default(),
                    entry.app_version.clone(),
                ]);
            }
            println!("{}", table);
            Ok(())
        }
        LogsCommands::Export { path } => {
            let exported = logger.export(&path)?;
            output::success(&format!("Logs exported to {:?}.", exported));
            Ok(())
        }
    }
}
