//! Log database migrations - embedded SQL files
//!
//! The event log lives in its own database file (logs.duckdb) with its own
//! migration chain, so a corrupt or deleted log never touches ledger data.

/// All log migrations, embedded at compile time.
/// Format: (filename, sql_content)
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    (
        "001_initial_log_schema.sql",
        include_str!("001_initial_log_schema.sql"),
    ),
];
