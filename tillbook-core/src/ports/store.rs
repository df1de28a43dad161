//! Ledger store port - transactional persistence abstraction
//!
//! This trait is the only seam between the engine/services and persistent
//! state. Implementations must make every method atomic: multi-statement
//! methods run inside a single database transaction with rollback on every
//! error path, and balance/loan mutations are conditional updates so that
//! two racing debits can never both succeed against one funding.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::result::Result;
use crate::domain::{Account, AdminCredential, Loan, Profile, TransactionKind, TransactionRecord};

/// Optional predicates for account listings
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Substring match on the account number
    pub number_contains: Option<String>,
    /// Substring match on the display name
    pub name_contains: Option<String>,
}

/// Optional predicates for transaction listings
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Substring match on the account number
    pub account_contains: Option<String>,
    /// Substring match on the kind name (e.g. "TRANSFER")
    pub kind_contains: Option<String>,
    /// Exact calendar date of the record's timestamp
    pub on_date: Option<NaiveDate>,
}

/// Result of applying interest across the whole account set
#[derive(Debug, Clone, serde::Serialize)]
pub struct InterestBatch {
    pub accounts_updated: usize,
    pub total_interest: Decimal,
}

/// Transactional CRUD over accounts, loans and transaction records
///
/// Methods return domain errors (`InsufficientFunds`, `AccountNotFound`,
/// `OverRepayment`, ...) directly when a conditional write finds its
/// precondition gone; the engine owns validation and policy *before* the
/// call, the store owns atomicity *during* it.
pub trait LedgerStore: Send + Sync {
    // === Schema ===

    /// Run any pending migrations
    fn ensure_schema(&self) -> Result<()>;

    // === Accounts ===

    /// Insert a new account; fails with `DuplicateIdentifier` on collision
    fn insert_account(&self, account: &Account) -> Result<()>;

    /// Fetch an account by number
    fn get_account(&self, number: &str) -> Result<Option<Account>>;

    /// List accounts matching the filter, newest first
    fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>>;

    /// Replace profile fields and, when given, the credential hash.
    /// Returns false if the account does not exist.
    fn update_profile(
        &self,
        number: &str,
        name: &str,
        profile: &Profile,
        password_hash: Option<&str>,
    ) -> Result<bool>;

    /// Set or clear the blocked flag; returns false if not found
    fn set_blocked(&self, number: &str, blocked: bool) -> Result<bool>;

    /// Delete the account with its loans and transaction records in one
    /// transaction; returns false if not found
    fn delete_account(&self, number: &str) -> Result<bool>;

    // === Money movement (each one atomic, balance change + record together) ===

    /// Unconditional credit; appends a record of `kind`
    fn credit(&self, number: &str, amount: Decimal, kind: TransactionKind) -> Result<TransactionRecord>;

    /// Conditional debit (`balance >= amount`); appends a record of `kind`.
    /// Fails with `InsufficientFunds` when the precondition no longer holds.
    fn debit(&self, number: &str, amount: Decimal, kind: TransactionKind) -> Result<TransactionRecord>;

    /// Conditional debit of `source` plus credit of `target` plus both
    /// TRANSFER records, all in one transaction
    fn transfer(&self, source: &str, target: &str, amount: Decimal) -> Result<()>;

    /// Balance credit, loan row and LOAN record in one transaction
    fn issue_loan(&self, number: &str, amount: Decimal) -> Result<Loan>;

    /// Conditional balance debit, conditional loan decrement and
    /// LOAN_REPAYMENT record in one transaction. Returns the loan's
    /// remaining amount after the repayment.
    fn repay_loan(&self, number: &str, loan_id: i64, amount: Decimal) -> Result<Decimal>;

    /// Apply `rate` percent to every account in one transaction, appending
    /// an INTEREST record per account equal to the applied delta
    fn apply_interest(&self, rate: Decimal) -> Result<InterestBatch>;

    // === Loans ===

    /// The earliest-created loan with remaining > 0, if any
    fn first_active_loan(&self, number: &str) -> Result<Option<Loan>>;

    /// All loans for an account, oldest first
    fn loans_for_account(&self, number: &str) -> Result<Vec<Loan>>;

    /// Sum of remaining amounts over the account's loans
    fn outstanding_loan_total(&self, number: &str) -> Result<Decimal>;

    // === Transaction records ===

    /// Records for one account, newest first, up to `limit`
    fn recent_transactions(&self, number: &str, limit: usize) -> Result<Vec<TransactionRecord>>;

    /// Records matching the filter, newest first (unbounded)
    fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<TransactionRecord>>;

    // === Aggregates ===

    fn count_accounts(&self) -> Result<i64>;
    fn count_transactions(&self) -> Result<i64>;
    fn count_loans(&self) -> Result<i64>;

    /// Sum of balances over all accounts
    fn total_balance(&self) -> Result<Decimal>;

    /// Sum of remaining amounts over all loans
    fn total_outstanding(&self) -> Result<Decimal>;

    // === Admins ===

    fn get_admin(&self, admin_id: &str) -> Result<Option<AdminCredential>>;

    fn admin_count(&self) -> Result<i64>;

    /// Insert an admin credential; `DuplicateIdentifier` on collision
    fn insert_admin(&self, admin: &AdminCredential) -> Result<()>;

    /// Rename an admin and replace its credential hash in one transaction;
    /// `DuplicateIdentifier` if the new id is already taken
    fn rename_admin(&self, current_id: &str, new_id: &str, new_hash: &str) -> Result<()>;
}
