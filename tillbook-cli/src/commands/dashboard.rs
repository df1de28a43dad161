//! Dashboard command - balance, loans and recent activity

use anyhow::Result;
use colored::Colorize;

use super::{authenticate, get_context};
use crate::output;

pub fn run(account: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;

    let session = authenticate(&ctx, account)?;
    let overview = ctx
        .dashboard_service
        .account_overview(&session.account_number)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(());
    }

    println!("{}", format!("Account {}", overview.account_number).bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Holder", &overview.name]);
    table.add_row(vec!["Balance", &output::format_money(overview.balance)]);
    table.add_row(vec![
        "Outstanding loans",
        &output::format_money(overview.outstanding_loans),
    ]);
    if overview.is_blocked {
        table.add_row(vec!["Status", "BLOCKED"]);
    }
    println!("{}", table);

    if !overview.loans.is_empty() {
        println!();
        println!("{}", "Loans".bold());
        let mut table = output::create_table();
        table.set_header(vec!["Id", "Principal", "Remaining", "Opened"]);
        for loan in &overview.loans {
            table.add_row(vec![
                loan.id.to_string(),
                output::format_money(loan.principal),
                output::format_money(loan.remaining),
                loan.created_at.format("%Y-%m-%d").to_string(),
            ]);
        }
        println!("{}", table);
    }

    if !overview.recent_activity.is_empty() {
        println!();
        println!("{}", "Recent activity".bold());
        let mut table = output::create_table();
        table.set_header(vec!["When", "Kind", "Amount"]);
        for record in &overview.recent_activity {
            table.add_row(vec![
                record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                record.kind.to_string(),
                output::format_money(record.amount),
            ]);
        }
        println!("{}", table);
    }

    Ok(())
}
