//! Query command - read-only SQL against the ledger

use std::path::Path;

use anyhow::{Context, Result};

use super::{authenticate_admin, get_context};
use crate::output;

pub fn run(admin_id: &str, sql: Option<&str>, file: Option<&Path>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let session = authenticate_admin(&ctx, admin_id)?;

    let sql = match (sql, file) {
        (Some(sql), _) => sql.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read SQL file: {:?}", path))?,
        (None, None) => anyhow::bail!("Provide a SQL string or --file"),
    };

    let result = ctx.query_service.execute(&session, &sql)?;

    if json {
        let rows: Vec<serde_json::Value> = result
            .rows
            .iter()
            .map(|row| {
                let obj: serde_json::Map<String, serde_json::Value> = result
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(result.columns.clone());
    for row in &result.rows {
        table.add_row(row.iter().map(render_value).collect::<Vec<_>>());
    }
    println!("{}", table);
    output::info(&format!("{} row(s)", result.row_count));
    Ok(())
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
