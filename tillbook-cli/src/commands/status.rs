//! Status command - show store status and summary

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Ledger Status".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Accounts", &status.total_accounts.to_string()]);
    table.add_row(vec!["Transactions", &status.total_transactions.to_string()]);
    table.add_row(vec!["Loans", &status.total_loans.to_string()]);
    table.add_row(vec![
        "Admin provisioned",
        if status.admin_provisioned { "yes" } else { "no" },
    ]);
    println!("{}", table);

    if !status.admin_provisioned {
        println!();
        output::warning("No admin credential yet - run 'tb setup --admin-id <id>' first.");
    }

    if ctx.config.demo_mode {
        println!();
        output::info("Demo mode is ON - this is the demo book, not real data.");
    }

    Ok(())
}
