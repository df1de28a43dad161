//! Demo commands - manage demo mode

use anyhow::Result;
use clap::Subcommand;

use super::{get_logger, get_tillbook_dir, log_event};
use crate::output;
use tillbook_core::services::{DemoService, LogEvent, DEMO_PASSWORD};

#[derive(Subcommand)]
pub enum DemoCommands {
    /// Enable demo mode and build a fresh sample book
    On,
    /// Disable demo mode (the demo book stays on disk)
    Off,
    /// Show whether demo mode is enabled
    Status,
}

pub fn run(command: Option<DemoCommands>) -> Result<()> {
    let tillbook_dir = get_tillbook_dir();
    std::fs::create_dir_all(&tillbook_dir)?;
    let service = DemoService::new(&tillbook_dir);
    let logger = get_logger();

    match command.unwrap_or(DemoCommands::Status) {
        DemoCommands::On => {
            let numbers = service.enable()?;
            log_event(&logger, LogEvent::new("demo_enabled").with_command("demo on"));
            output::success("Demo mode enabled with a fresh sample book.");
            output::info(&format!(
                "Sample accounts (password \"{}\"): {}",
                DEMO_PASSWORD,
                numbers.join(", ")
            ));
            Ok(())
        }
        DemoCommands::Off => {
            service.disable()?;
            log_event(&logger, LogEvent::new("demo_disabled").with_command("demo off"));
            output::success("Demo mode disabled.");
            Ok(())
        }
        DemoCommands::Status => {
            if service.is_enabled()? {
                output::info("Demo mode is ON.");
            } else {
                output::info("Demo mode is OFF.");
            }
            Ok(())
        }
    }
}
