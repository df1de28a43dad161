//! DuckDB ledger store implementation

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, params_from_iter, Connection};
use rust_decimal::Decimal;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, AdminCredential, Loan, Profile, TransactionKind, TransactionRecord,
};
use crate::ports::{AccountFilter, InterestBatch, LedgerStore, TransactionFilter};
use crate::services::MigrationService;

/// Validate SQL syntax before execution to catch malformed queries early.
/// This prevents crashes from malformed SQL reaching the database engine.
fn validate_sql_syntax(sql: &str) -> Result<()> {
    let dialect = DuckDbDialect {};
    Parser::parse_sql(&dialect, sql).map_err(|e| {
        let msg = e.to_string();
        let cleaned = msg.trim_start_matches("sql parser error: ");
        Error::validation(cleaned.to_string())
    })?;
    Ok(())
}

/// Maximum number of retries when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// Check if an error message indicates a primary-key collision
fn is_duplicate_key_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("duplicate key") || lower.contains("primary key")
}

/// Result of a raw SQL query
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

/// DuckDB-backed implementation of the ledger store
///
/// A single connection behind a mutex: every store method holds the lock
/// for its whole duration, so multi-statement methods are serializable by
/// construction. Conditional updates still guard every balance and loan
/// mutation so the SQL itself never permits a lost update.
pub struct DuckDbStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbStore {
    /// Open (or create) the ledger database
    ///
    /// Includes retry logic with exponential backoff for file locking
    /// errors, which can occur when another process (a second teller
    /// session, the CLI next to the desktop app) has the file open.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[tillbook] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::store(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// Attempt to open a database connection (called by new() with retry logic)
    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Disable extension autoloading to avoid macOS code signing issues
        // (cached extensions in ~/.duckdb/extensions may have different Team IDs)
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)?;
        Ok(conn)
    }

    /// Path of the underlying database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Force a checkpoint so the file on disk is complete (used by backups)
    pub fn checkpoint(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("CHECKPOINT", [])?;
        Ok(())
    }

    /// Run a closure inside a database transaction
    ///
    /// Exactly one of COMMIT/ROLLBACK runs on every exit path: commit on
    /// Ok, rollback on Err. The connection lock is held throughout.
    fn with_tx<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch("BEGIN TRANSACTION")?;
        match f(&conn) {
            Ok(value) => {
                conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                // Roll back before surfacing the error; a failed rollback is
                // unreportable here, the original error wins.
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    // === Row mappers ===

    const ACCOUNT_COLUMNS: &'static str =
        "account_number, name, password_hash, balance::DOUBLE, is_blocked,
         date_of_birth, address, nationality, national_id, phone_number,
         created_at::VARCHAR, updated_at::VARCHAR";

    fn row_to_account(row: &duckdb::Row) -> duckdb::Result<Account> {
        // Column indices from ACCOUNT_COLUMNS:
        // 0: account_number, 1: name, 2: password_hash, 3: balance, 4: is_blocked,
        // 5: date_of_birth, 6: address, 7: nationality, 8: national_id,
        // 9: phone_number, 10: created_at, 11: updated_at
        let balance: f64 = row.get(3)?;
        let created_str: String = row.get(10)?;
        let updated_str: String = row.get(11)?;

        Ok(Account {
            account_number: row.get(0)?,
            name: row.get(1)?,
            password_hash: row.get(2)?,
            balance: to_decimal(balance),
            is_blocked: row.get(4)?,
            profile: Profile {
                date_of_birth: row.get(5)?,
                address: row.get(6)?,
                nationality: row.get(7)?,
                national_id: row.get(8)?,
                phone_number: row.get(9)?,
            },
            created_at: parse_timestamp(&created_str),
            updated_at: parse_timestamp(&updated_str),
        })
    }

    const LOAN_COLUMNS: &'static str =
        "id, account_number, principal::DOUBLE, remaining_amount::DOUBLE, created_at::VARCHAR";

    fn row_to_loan(row: &duckdb::Row) -> duckdb::Result<Loan> {
        let principal: f64 = row.get(2)?;
        let remaining: f64 = row.get(3)?;
        let created_str: String = row.get(4)?;

        Ok(Loan {
            id: row.get(0)?,
            account_number: row.get(1)?,
            principal: to_decimal(principal),
            remaining: to_decimal(remaining),
            created_at: parse_timestamp(&created_str),
        })
    }

    const RECORD_COLUMNS: &'static str =
        "id, account_number, kind, amount::DOUBLE, created_at::VARCHAR";

    fn row_to_record(row: &duckdb::Row) -> duckdb::Result<TransactionRecord> {
        let kind_str: String = row.get(2)?;
        let amount: f64 = row.get(3)?;
        let created_str: String = row.get(4)?;

        Ok(TransactionRecord {
            id: row.get(0)?,
            account_number: row.get(1)?,
            // Unknown kinds cannot appear: the column is written from
            // TransactionKind::as_str only. Map defensively anyway.
            kind: TransactionKind::parse(&kind_str).unwrap_or(TransactionKind::Deposit),
            amount: to_decimal(amount),
            created_at: parse_timestamp(&created_str),
        })
    }

    // === Statement helpers (run inside an open transaction) ===

    /// Append a ledger record; the store assigns id and timestamp
    fn append_record(
        conn: &Connection,
        number: &str,
        kind: TransactionKind,
        amount: Decimal,
    ) -> Result<TransactionRecord> {
        let id: i64 =
            conn.query_row("SELECT nextval('seq_transaction_id')", [], |row| row.get(0))?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO transactions (id, account_number, kind, amount, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![id, number, kind.as_str(), to_f64(amount), format_timestamp(now)],
        )?;
        Ok(TransactionRecord {
            id,
            account_number: number.to_string(),
            kind,
            amount,
            created_at: now,
        })
    }

    /// True if the account row exists
    fn account_exists(conn: &Connection, number: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE account_number = ?",
            params![number],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Unconditional balance credit; errors if the account is missing
    fn credit_balance(conn: &Connection, number: &str, amount: Decimal) -> Result<()> {
        let updated = conn.execute(
            "UPDATE accounts SET balance = balance + ?, updated_at = ?
             WHERE account_number = ?",
            params![to_f64(amount), format_timestamp(Utc::now()), number],
        )?;
        if updated == 0 {
            return Err(Error::AccountNotFound(number.to_string()));
        }
        Ok(())
    }

    /// Conditional balance debit: succeeds only while balance >= amount
    fn debit_balance(conn: &Connection, number: &str, amount: Decimal) -> Result<()> {
        if !Self::account_exists(conn, number)? {
            return Err(Error::AccountNotFound(number.to_string()));
        }
        let updated = conn.execute(
            "UPDATE accounts SET balance = balance - ?, updated_at = ?
             WHERE account_number = ? AND balance >= ?",
            params![to_f64(amount), format_timestamp(Utc::now()), number, to_f64(amount)],
        )?;
        if updated == 0 {
            return Err(Error::InsufficientFunds);
        }
        Ok(())
    }

    // === Raw queries (admin tooling, not part of the LedgerStore port) ===

    /// Execute a read-only SQL query, returning rows as JSON values
    pub fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        // Only the first statement word decides; SELECT and WITH are the
        // whole read-only surface.
        let first_word = sql
            .trim()
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_uppercase();
        if first_word != "SELECT" && first_word != "WITH" {
            return Err(Error::validation("Only SELECT queries are allowed"));
        }

        // Also block write operations hidden in subqueries
        let sql_upper = sql.to_uppercase();
        for keyword in ["INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE"] {
            for prefix in [' ', '\n', '('] {
                if sql_upper.contains(&format!("{prefix}{keyword} ")) {
                    return Err(Error::validation("Only SELECT queries are allowed"));
                }
            }
        }

        validate_sql_syntax(sql)?;

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let mut result_rows = stmt.query([])?;

        let mut rows: Vec<Vec<serde_json::Value>> = Vec::new();
        let mut column_count = 0;

        while let Some(row) = result_rows.next()? {
            if rows.is_empty() {
                column_count = row.as_ref().column_count();
            }
            let mut row_values: Vec<serde_json::Value> = Vec::new();
            for i in 0..column_count {
                row_values.push(column_value(row, i));
            }
            rows.push(row_values);
        }

        // Drop result_rows to release the borrow on stmt
        drop(result_rows);

        let column_count = if column_count > 0 { column_count } else { stmt.column_count() };
        let columns: Vec<String> = (0..column_count)
            .map(|i| {
                stmt.column_name(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| format!("col{}", i))
            })
            .collect();

        let row_count = rows.len();
        Ok(QueryResult { columns, rows, row_count })
    }
}

impl LedgerStore for DuckDbStore {
    fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let migration_service = MigrationService::new(&conn);
        migration_service
            .run_pending()
            .map_err(|e| Error::store(e.to_string()))?;
        Ok(())
    }

    // === Accounts ===

    fn insert_account(&self, account: &Account) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO accounts (account_number, name, password_hash, balance, is_blocked,
                                   date_of_birth, address, nationality, national_id, phone_number,
                                   created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                account.account_number,
                account.name,
                account.password_hash,
                to_f64(account.balance),
                account.is_blocked,
                account.profile.date_of_birth,
                account.profile.address,
                account.profile.nationality,
                account.profile.national_id,
                account.profile.phone_number,
                format_timestamp(account.created_at),
                format_timestamp(account.updated_at),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key_error(&e.to_string()) => {
                Err(Error::DuplicateIdentifier(account.account_number.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_account(&self, number: &str) -> Result<Option<Account>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM accounts WHERE account_number = ?",
            Self::ACCOUNT_COLUMNS
        );
        match conn.query_row(&sql, params![number], |row| Self::row_to_account(row)) {
            Ok(account) => Ok(Some(account)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        let conn = self.conn.lock().unwrap();
        let mut sql = format!("SELECT {} FROM accounts WHERE 1=1", Self::ACCOUNT_COLUMNS);
        let mut bind: Vec<String> = Vec::new();

        if let Some(number) = &filter.number_contains {
            sql.push_str(" AND account_number LIKE '%' || ? || '%'");
            bind.push(number.clone());
        }
        if let Some(name) = &filter.name_contains {
            sql.push_str(" AND name LIKE '%' || ? || '%'");
            bind.push(name.clone());
        }
        sql.push_str(" ORDER BY created_at DESC, account_number");

        let mut stmt = conn.prepare(&sql)?;
        let accounts = stmt
            .query_map(params_from_iter(bind.iter()), |row| Self::row_to_account(row))?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(accounts)
    }

    fn update_profile(
        &self,
        number: &str,
        name: &str,
        profile: &Profile,
        password_hash: Option<&str>,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = match password_hash {
            Some(hash) => conn.execute(
                "UPDATE accounts SET name = ?, date_of_birth = ?, address = ?, nationality = ?,
                        national_id = ?, phone_number = ?, password_hash = ?, updated_at = ?
                 WHERE account_number = ?",
                params![
                    name,
                    profile.date_of_birth,
                    profile.address,
                    profile.nationality,
                    profile.national_id,
                    profile.phone_number,
                    hash,
                    format_timestamp(Utc::now()),
                    number,
                ],
            )?,
            None => conn.execute(
                "UPDATE accounts SET name = ?, date_of_birth = ?, address = ?, nationality = ?,
                        national_id = ?, phone_number = ?, updated_at = ?
                 WHERE account_number = ?",
                params![
                    name,
                    profile.date_of_birth,
                    profile.address,
                    profile.nationality,
                    profile.national_id,
                    profile.phone_number,
                    format_timestamp(Utc::now()),
                    number,
                ],
            )?,
        };
        Ok(updated > 0)
    }

    fn set_blocked(&self, number: &str, blocked: bool) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE accounts SET is_blocked = ?, updated_at = ? WHERE account_number = ?",
            params![blocked, format_timestamp(Utc::now()), number],
        )?;
        Ok(updated > 0)
    }

    fn delete_account(&self, number: &str) -> Result<bool> {
        self.with_tx(|conn| {
            if !Self::account_exists(conn, number)? {
                return Ok(false);
            }
            // Cascade order: records and loans first, then the account
            conn.execute(
                "DELETE FROM transactions WHERE account_number = ?",
                params![number],
            )?;
            conn.execute("DELETE FROM loans WHERE account_number = ?", params![number])?;
            conn.execute(
                "DELETE FROM accounts WHERE account_number = ?",
                params![number],
            )?;
            Ok(true)
        })
    }

    // === Money movement ===

    fn credit(&self, number: &str, amount: Decimal, kind: TransactionKind) -> Result<TransactionRecord> {
        self.with_tx(|conn| {
            Self::credit_balance(conn, number, amount)?;
            Self::append_record(conn, number, kind, amount)
        })
    }

    fn debit(&self, number: &str, amount: Decimal, kind: TransactionKind) -> Result<TransactionRecord> {
        self.with_tx(|conn| {
            Self::debit_balance(conn, number, amount)?;
            Self::append_record(conn, number, kind, amount)
        })
    }

    fn transfer(&self, source: &str, target: &str, amount: Decimal) -> Result<()> {
        self.with_tx(|conn| {
            if !Self::account_exists(conn, target)? {
                return Err(Error::AccountNotFound(target.to_string()));
            }
            Self::debit_balance(conn, source, amount)?;
            Self::credit_balance(conn, target, amount)?;
            Self::append_record(conn, source, TransactionKind::TransferOut, amount)?;
            Self::append_record(conn, target, TransactionKind::TransferIn, amount)?;
            Ok(())
        })
    }

    fn issue_loan(&self, number: &str, amount: Decimal) -> Result<Loan> {
        self.with_tx(|conn| {
            Self::credit_balance(conn, number, amount)?;
            let id: i64 = conn.query_row("SELECT nextval('seq_loan_id')", [], |row| row.get(0))?;
            let now = Utc::now();
            conn.execute(
                "INSERT INTO loans (id, account_number, principal, remaining_amount, created_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![id, number, to_f64(amount), to_f64(amount), format_timestamp(now)],
            )?;
            Self::append_record(conn, number, TransactionKind::Loan, amount)?;
            Ok(Loan {
                id,
                account_number: number.to_string(),
                principal: amount,
                remaining: amount,
                created_at: now,
            })
        })
    }

    fn repay_loan(&self, number: &str, loan_id: i64, amount: Decimal) -> Result<Decimal> {
        self.with_tx(|conn| {
            Self::debit_balance(conn, number, amount)?;
            // Conditional on remaining >= amount: a racing repayment that
            // shrank the loan turns this into OverRepayment, not a negative
            // remaining amount.
            let updated = conn.execute(
                "UPDATE loans SET remaining_amount = remaining_amount - ?
                 WHERE id = ? AND account_number = ? AND remaining_amount >= ?",
                params![to_f64(amount), loan_id, number, to_f64(amount)],
            )?;
            if updated == 0 {
                return Err(Error::OverRepayment);
            }
            Self::append_record(conn, number, TransactionKind::LoanRepayment, amount)?;
            let remaining: f64 = conn.query_row(
                "SELECT remaining_amount::DOUBLE FROM loans WHERE id = ?",
                params![loan_id],
                |row| row.get(0),
            )?;
            Ok(to_decimal(remaining))
        })
    }

    fn apply_interest(&self, rate: Decimal) -> Result<InterestBatch> {
        self.with_tx(|conn| {
            // Snapshot balances first; updates follow from the snapshot so
            // the per-account delta is computed exactly once.
            let mut stmt = conn.prepare(
                "SELECT account_number, balance::DOUBLE FROM accounts ORDER BY account_number",
            )?;
            let balances = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
                })?
                .collect::<duckdb::Result<Vec<_>>>()?;
            drop(stmt);

            let mut total_interest = Decimal::ZERO;
            let mut accounts_updated = 0usize;
            for (number, balance) in balances {
                let delta = (to_decimal(balance) * rate / Decimal::new(100, 0)).round_dp(2);
                conn.execute(
                    "UPDATE accounts SET balance = balance + ?, updated_at = ?
                     WHERE account_number = ?",
                    params![to_f64(delta), format_timestamp(Utc::now()), number],
                )?;
                Self::append_record(conn, &number, TransactionKind::Interest, delta)?;
                total_interest += delta;
                accounts_updated += 1;
            }

            Ok(InterestBatch { accounts_updated, total_interest })
        })
    }

    // === Loans ===

    fn first_active_loan(&self, number: &str) -> Result<Option<Loan>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM loans
             WHERE account_number = ? AND remaining_amount > 0
             ORDER BY created_at, id LIMIT 1",
            Self::LOAN_COLUMNS
        );
        match conn.query_row(&sql, params![number], |row| Self::row_to_loan(row)) {
            Ok(loan) => Ok(Some(loan)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn loans_for_account(&self, number: &str) -> Result<Vec<Loan>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM loans WHERE account_number = ? ORDER BY created_at, id",
            Self::LOAN_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let loans = stmt
            .query_map(params![number], |row| Self::row_to_loan(row))?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(loans)
    }

    fn outstanding_loan_total(&self, number: &str) -> Result<Decimal> {
        let conn = self.conn.lock().unwrap();
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(remaining_amount), 0)::DOUBLE FROM loans WHERE account_number = ?",
            params![number],
            |row| row.get(0),
        )?;
        Ok(to_decimal(total))
    }

    // === Transaction records ===

    fn recent_transactions(&self, number: &str, limit: usize) -> Result<Vec<TransactionRecord>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM transactions WHERE account_number = ?
             ORDER BY created_at DESC, id DESC LIMIT ?",
            Self::RECORD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![number, limit as i64], |row| Self::row_to_record(row))?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<TransactionRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut sql = format!(
            "SELECT {} FROM transactions WHERE 1=1",
            Self::RECORD_COLUMNS
        );
        let mut bind: Vec<String> = Vec::new();

        if let Some(number) = &filter.account_contains {
            sql.push_str(" AND account_number LIKE '%' || ? || '%'");
            bind.push(number.clone());
        }
        if let Some(kind) = &filter.kind_contains {
            sql.push_str(" AND kind LIKE '%' || upper(?) || '%'");
            bind.push(kind.clone());
        }
        if let Some(date) = &filter.on_date {
            sql.push_str(" AND created_at::DATE = CAST(? AS DATE)");
            bind.push(date.format("%Y-%m-%d").to_string());
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(bind.iter()), |row| Self::row_to_record(row))?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(records)
    }

    // === Aggregates ===

    fn count_accounts(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_loans(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM loans", [], |row| row.get(0))?;
        Ok(count)
    }

    fn total_balance(&self) -> Result<Decimal> {
        let conn = self.conn.lock().unwrap();
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(balance), 0)::DOUBLE FROM accounts",
            [],
            |row| row.get(0),
        )?;
        Ok(to_decimal(total))
    }

    fn total_outstanding(&self) -> Result<Decimal> {
        let conn = self.conn.lock().unwrap();
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(remaining_amount), 0)::DOUBLE FROM loans",
            [],
            |row| row.get(0),
        )?;
        Ok(to_decimal(total))
    }

    // === Admins ===

    fn get_admin(&self, admin_id: &str) -> Result<Option<AdminCredential>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT admin_id, password_hash, created_at::VARCHAR, updated_at::VARCHAR
             FROM admins WHERE admin_id = ?",
            params![admin_id],
            |row| {
                let created_str: String = row.get(2)?;
                let updated_str: String = row.get(3)?;
                Ok(AdminCredential {
                    admin_id: row.get(0)?,
                    password_hash: row.get(1)?,
                    created_at: parse_timestamp(&created_str),
                    updated_at: parse_timestamp(&updated_str),
                })
            },
        );
        match result {
            Ok(admin) => Ok(Some(admin)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn admin_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?;
        Ok(count)
    }

    fn insert_admin(&self, admin: &AdminCredential) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO admins (admin_id, password_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?)",
            params![
                admin.admin_id,
                admin.password_hash,
                format_timestamp(admin.created_at),
                format_timestamp(admin.updated_at),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key_error(&e.to_string()) => {
                Err(Error::DuplicateIdentifier(admin.admin_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn rename_admin(&self, current_id: &str, new_id: &str, new_hash: &str) -> Result<()> {
        self.with_tx(|conn| {
            if new_id != current_id {
                let taken: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM admins WHERE admin_id = ?",
                    params![new_id],
                    |row| row.get(0),
                )?;
                if taken > 0 {
                    return Err(Error::DuplicateIdentifier(new_id.to_string()));
                }
            }
            let updated = conn.execute(
                "UPDATE admins SET admin_id = ?, password_hash = ?, updated_at = ?
                 WHERE admin_id = ?",
                params![new_id, new_hash, format_timestamp(Utc::now()), current_id],
            )?;
            if updated == 0 {
                return Err(Error::validation(format!("admin not found: {current_id}")));
            }
            Ok(())
        })
    }
}

// === Value helpers ===

/// Bind-side conversion; DuckDB casts the double back to DECIMAL(18, 2)
fn to_f64(d: Decimal) -> f64 {
    d.to_string().parse::<f64>().unwrap_or(0.0)
}

/// Read-side conversion; all stored money has two decimal places
fn to_decimal(f: f64) -> Decimal {
    Decimal::try_from(f).unwrap_or_default().round_dp(2)
}

/// Store timestamps as naive UTC text; lexicographic order matches time order
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Convert one result column to a JSON value for raw query output
fn column_value(row: &duckdb::Row, idx: usize) -> serde_json::Value {
    use duckdb::types::ValueRef;

    match row.get_ref(idx) {
        Ok(ValueRef::Null) => serde_json::Value::Null,
        Ok(ValueRef::Boolean(b)) => serde_json::Value::Bool(b),
        Ok(ValueRef::TinyInt(i)) => serde_json::json!(i),
        Ok(ValueRef::SmallInt(i)) => serde_json::json!(i),
        Ok(ValueRef::Int(i)) => serde_json::json!(i),
        Ok(ValueRef::BigInt(i)) => serde_json::json!(i),
        Ok(ValueRef::HugeInt(i)) => serde_json::json!(i.to_string()),
        Ok(ValueRef::UTinyInt(i)) => serde_json::json!(i),
        Ok(ValueRef::USmallInt(i)) => serde_json::json!(i),
        Ok(ValueRef::UInt(i)) => serde_json::json!(i),
        Ok(ValueRef::UBigInt(i)) => serde_json::json!(i),
        Ok(ValueRef::Float(f)) => serde_json::json!(f),
        Ok(ValueRef::Double(f)) => serde_json::json!(f),
        Ok(ValueRef::Decimal(d)) => {
            use std::str::FromStr;
            let s = d.to_string();
            match f64::from_str(&s) {
                Ok(f) => serde_json::json!(f),
                Err(_) => serde_json::Value::String(s),
            }
        }
        Ok(ValueRef::Text(bytes)) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).to_string())
        }
        Ok(other) => serde_json::Value::String(format!("{:?}", other)),
        Err(_) => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> DuckDbStore {
        let store = DuckDbStore::new(&dir.path().join("test.duckdb")).unwrap();
        store.ensure_schema().unwrap();
        store
    }

    fn insert_test_account(store: &DuckDbStore, number: &str) {
        let account = Account::new(number, format!("Account {number}"), "$argon2id$x");
        store.insert_account(&account).unwrap();
    }

    #[test]
    fn test_insert_and_get_account() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        insert_test_account(&store, "ab12cd34ef");

        let account = store.get_account("ab12cd34ef").unwrap().unwrap();
        assert_eq!(account.name, "Account ab12cd34ef");
        assert_eq!(account.balance, Decimal::ZERO);
        assert!(!account.is_blocked);

        assert!(store.get_account("0000000000").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_account_number_rejected() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        insert_test_account(&store, "ab12cd34ef");
        let again = Account::new("ab12cd34ef", "Other", "$argon2id$x");
        assert!(matches!(
            store.insert_account(&again),
            Err(Error::DuplicateIdentifier(_))
        ));
    }

    #[test]
    fn test_credit_and_conditional_debit() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        insert_test_account(&store, "ab12cd34ef");

        store
            .credit("ab12cd34ef", Decimal::new(50000, 2), TransactionKind::Deposit)
            .unwrap();
        assert_eq!(
            store.get_account("ab12cd34ef").unwrap().unwrap().balance,
            Decimal::new(50000, 2)
        );

        // Debit beyond the balance fails and changes nothing
        let err = store
            .debit("ab12cd34ef", Decimal::new(60000, 2), TransactionKind::Withdrawal)
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds));
        assert_eq!(
            store.get_account("ab12cd34ef").unwrap().unwrap().balance,
            Decimal::new(50000, 2)
        );
        assert_eq!(store.recent_transactions("ab12cd34ef", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_transfer_writes_both_records_atomically() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        insert_test_account(&store, "aaaaaaaaaa");
        insert_test_account(&store, "bbbbbbbbbb");
        store
            .credit("aaaaaaaaaa", Decimal::new(10000, 2), TransactionKind::Deposit)
            .unwrap();

        store
            .transfer("aaaaaaaaaa", "bbbbbbbbbb", Decimal::new(2500, 2))
            .unwrap();

        assert_eq!(
            store.get_account("aaaaaaaaaa").unwrap().unwrap().balance,
            Decimal::new(7500, 2)
        );
        assert_eq!(
            store.get_account("bbbbbbbbbb").unwrap().unwrap().balance,
            Decimal::new(2500, 2)
        );

        let out = store.recent_transactions("aaaaaaaaaa", 10).unwrap();
        assert_eq!(out[0].kind, TransactionKind::TransferOut);
        let inc = store.recent_transactions("bbbbbbbbbb", 10).unwrap();
        assert_eq!(inc[0].kind, TransactionKind::TransferIn);
    }

    #[test]
    fn test_transfer_to_missing_target_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        insert_test_account(&store, "aaaaaaaaaa");
        store
            .credit("aaaaaaaaaa", Decimal::new(10000, 2), TransactionKind::Deposit)
            .unwrap();

        let err = store
            .transfer("aaaaaaaaaa", "zzzzzzzzzz", Decimal::new(2500, 2))
            .unwrap_err();
        assert!(matches!(err, Error::AccountNotFound(_)));
        assert_eq!(
            store.get_account("aaaaaaaaaa").unwrap().unwrap().balance,
            Decimal::new(10000, 2)
        );
        // Only the original deposit is on record
        assert_eq!(store.recent_transactions("aaaaaaaaaa", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_loan_issue_and_repay() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        insert_test_account(&store, "ab12cd34ef");

        let loan = store.issue_loan("ab12cd34ef", Decimal::new(20000, 2)).unwrap();
        assert_eq!(loan.principal, Decimal::new(20000, 2));
        assert_eq!(loan.remaining, Decimal::new(20000, 2));
        assert_eq!(
            store.get_account("ab12cd34ef").unwrap().unwrap().balance,
            Decimal::new(20000, 2)
        );

        let remaining = store
            .repay_loan("ab12cd34ef", loan.id, Decimal::new(5000, 2))
            .unwrap();
        assert_eq!(remaining, Decimal::new(15000, 2));

        let active = store.first_active_loan("ab12cd34ef").unwrap().unwrap();
        assert_eq!(active.id, loan.id);
        assert_eq!(active.remaining, Decimal::new(15000, 2));
    }

    #[test]
    fn test_repay_more_than_remaining_rolls_back_balance() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        insert_test_account(&store, "ab12cd34ef");
        store
            .credit("ab12cd34ef", Decimal::new(100000, 2), TransactionKind::Deposit)
            .unwrap();
        let loan = store.issue_loan("ab12cd34ef", Decimal::new(10000, 2)).unwrap();

        let err = store
            .repay_loan("ab12cd34ef", loan.id, Decimal::new(20000, 2))
            .unwrap_err();
        assert!(matches!(err, Error::OverRepayment));

        // The balance debit inside the same transaction was rolled back
        assert_eq!(
            store.get_account("ab12cd34ef").unwrap().unwrap().balance,
            Decimal::new(110000, 2)
        );
        assert_eq!(
            store.first_active_loan("ab12cd34ef").unwrap().unwrap().remaining,
            Decimal::new(10000, 2)
        );
    }

    #[test]
    fn test_first_active_loan_picks_earliest() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        insert_test_account(&store, "ab12cd34ef");

        let first = store.issue_loan("ab12cd34ef", Decimal::new(10000, 2)).unwrap();
        let second = store.issue_loan("ab12cd34ef", Decimal::new(20000, 2)).unwrap();
        assert!(second.id > first.id);

        let picked = store.first_active_loan("ab12cd34ef").unwrap().unwrap();
        assert_eq!(picked.id, first.id);

        // Fully repaying the first moves selection to the second
        store
            .repay_loan("ab12cd34ef", first.id, Decimal::new(10000, 2))
            .unwrap();
        let picked = store.first_active_loan("ab12cd34ef").unwrap().unwrap();
        assert_eq!(picked.id, second.id);
    }

    #[test]
    fn test_delete_account_cascades() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        insert_test_account(&store, "ab12cd34ef");
        store
            .credit("ab12cd34ef", Decimal::new(10000, 2), TransactionKind::Deposit)
            .unwrap();
        store.issue_loan("ab12cd34ef", Decimal::new(5000, 2)).unwrap();

        assert!(store.delete_account("ab12cd34ef").unwrap());
        assert!(store.get_account("ab12cd34ef").unwrap().is_none());
        assert_eq!(store.count_transactions().unwrap(), 0);
        assert_eq!(store.count_loans().unwrap(), 0);

        assert!(!store.delete_account("ab12cd34ef").unwrap());
    }

    #[test]
    fn test_interest_applies_to_all_accounts() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        insert_test_account(&store, "aaaaaaaaaa");
        insert_test_account(&store, "bbbbbbbbbb");
        store
            .credit("aaaaaaaaaa", Decimal::new(10000, 2), TransactionKind::Deposit)
            .unwrap();
        store
            .credit("bbbbbbbbbb", Decimal::new(20000, 2), TransactionKind::Deposit)
            .unwrap();

        let batch = store.apply_interest(Decimal::new(10, 0)).unwrap();
        assert_eq!(batch.accounts_updated, 2);
        assert_eq!(batch.total_interest, Decimal::new(3000, 2));

        assert_eq!(
            store.get_account("aaaaaaaaaa").unwrap().unwrap().balance,
            Decimal::new(11000, 2)
        );
        assert_eq!(
            store.get_account("bbbbbbbbbb").unwrap().unwrap().balance,
            Decimal::new(22000, 2)
        );
    }

    #[test]
    fn test_list_transactions_filters() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        insert_test_account(&store, "aaaaaaaaaa");
        insert_test_account(&store, "bbbbbbbbbb");
        store
            .credit("aaaaaaaaaa", Decimal::new(10000, 2), TransactionKind::Deposit)
            .unwrap();
        store
            .transfer("aaaaaaaaaa", "bbbbbbbbbb", Decimal::new(2500, 2))
            .unwrap();

        let all = store.list_transactions(&TransactionFilter::default()).unwrap();
        assert_eq!(all.len(), 3);

        let transfers = store
            .list_transactions(&TransactionFilter {
                kind_contains: Some("transfer".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(transfers.len(), 2);

        let for_b = store
            .list_transactions(&TransactionFilter {
                account_contains: Some("bbbb".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(for_b.len(), 1);

        let today = store
            .list_transactions(&TransactionFilter {
                on_date: Some(Utc::now().date_naive()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(today.len(), 3);
    }

    #[test]
    fn test_execute_query_is_read_only() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        insert_test_account(&store, "ab12cd34ef");

        let result = store.execute_query("SELECT account_number FROM accounts").unwrap();
        assert_eq!(result.row_count, 1);
        assert_eq!(result.columns, vec!["account_number".to_string()]);

        assert!(store.execute_query("DELETE FROM accounts").is_err());
        assert!(store
            .execute_query("SELECT * FROM (DELETE FROM accounts)")
            .is_err());
    }

    #[test]
    fn test_admin_rename_collision() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.insert_admin(&AdminCredential::new("first", "$h1")).unwrap();
        store.insert_admin(&AdminCredential::new("second", "$h2")).unwrap();

        let err = store.rename_admin("first", "second", "$h3").unwrap_err();
        assert!(matches!(err, Error::DuplicateIdentifier(_)));

        store.rename_admin("first", "primary", "$h3").unwrap();
        assert!(store.get_admin("first").unwrap().is_none());
        let renamed = store.get_admin("primary").unwrap().unwrap();
        assert_eq!(renamed.password_hash, "$h3");
    }
}
