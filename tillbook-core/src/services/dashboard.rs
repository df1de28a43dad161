//! Dashboard service - read-only projections over the ledger
//!
//! Everything here is recomputed on demand from store state; nothing is
//! incrementally maintained, so the numbers are always consistent with the
//! ledger at the moment of the call.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::{Loan, TransactionRecord};
use crate::ports::LedgerStore;

/// How many records the activity feed shows
const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Customer-facing view of one account
#[derive(Debug, Serialize)]
pub struct AccountOverview {
    pub account_number: String,
    pub name: String,
    pub balance: Decimal,
    pub is_blocked: bool,
    /// Sum of remaining amounts over this account's loans
    pub outstanding_loans: Decimal,
    pub loans: Vec<Loan>,
    /// Most recent records, newest first, ties broken by insertion order
    pub recent_activity: Vec<TransactionRecord>,
}

/// Admin-facing totals across the whole book
#[derive(Debug, Serialize)]
pub struct AdminOverview {
    pub total_accounts: i64,
    pub total_transactions: i64,
    pub total_loans: i64,
    /// Sum of balances over all accounts
    pub total_balance: Decimal,
    /// Sum of remaining amounts over all loans
    pub total_outstanding: Decimal,
}

/// Service for dashboard projections
pub struct DashboardService {
    store: Arc<dyn LedgerStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Build the customer dashboard for one account
    pub fn account_overview(&self, number: &str) -> Result<AccountOverview> {
        let account = self
            .store
            .get_account(number)?
            .ok_or_else(|| Error::AccountNotFound(number.to_string()))?;
        let outstanding_loans = self.store.outstanding_loan_total(number)?;
        let loans = self.store.loans_for_account(number)?;
        let recent_activity = self
            .store
            .recent_transactions(number, RECENT_ACTIVITY_LIMIT)?;

        Ok(AccountOverview {
            account_number: account.account_number,
            name: account.name,
            balance: account.balance,
            is_blocked: account.is_blocked,
            outstanding_loans,
            loans,
            recent_activity,
        })
    }

    /// Build the admin dashboard across all accounts
    pub fn admin_overview(&self) -> Result<AdminOverview> {
        Ok(AdminOverview {
            total_accounts: self.store.count_accounts()?,
            total_transactions: self.store.count_transactions()?,
            total_loans: self.store.count_loans()?,
            total_balance: self.store.total_balance()?,
            total_outstanding: self.store.total_outstanding()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::adapters::duckdb::DuckDbStore;
    use crate::domain::{Account, TransactionKind};

    fn store(dir: &TempDir) -> Arc<DuckDbStore> {
        let store = Arc::new(DuckDbStore::new(&dir.path().join("test.duckdb")).unwrap());
        store.ensure_schema().unwrap();
        store
    }

    #[test]
    fn test_recent_activity_caps_at_five_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .insert_account(&Account::new("ab12cd34ef", "Holder", "$x"))
            .unwrap();
        for i in 1..=7 {
            store
                .credit("ab12cd34ef", Decimal::new(i * 100, 2), TransactionKind::Deposit)
                .unwrap();
        }

        let service = DashboardService::new(store);
        let overview = service.account_overview("ab12cd34ef").unwrap();

        assert_eq!(overview.recent_activity.len(), 5);
        // Newest (the 7.00 deposit) first
        assert_eq!(overview.recent_activity[0].amount, Decimal::new(700, 2));
        assert!(overview.recent_activity[0].id > overview.recent_activity[4].id);
    }

    #[test]
    fn test_admin_overview_totals() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .insert_account(&Account::new("aaaaaaaaaa", "A", "$x"))
            .unwrap();
        store
            .insert_account(&Account::new("bbbbbbbbbb", "B", "$x"))
            .unwrap();
        store
            .credit("aaaaaaaaaa", Decimal::new(10000, 2), TransactionKind::Deposit)
            .unwrap();
        store.issue_loan("bbbbbbbbbb", Decimal::new(5000, 2)).unwrap();

        let service = DashboardService::new(store);
        let overview = service.admin_overview().unwrap();

        assert_eq!(overview.total_accounts, 2);
        assert_eq!(overview.total_transactions, 2);
        assert_eq!(overview.total_loans, 1);
        assert_eq!(overview.total_balance, Decimal::new(15000, 2));
        assert_eq!(overview.total_outstanding, Decimal::new(5000, 2));
    }

    #[test]
    fn test_unknown_account_is_an_error() {
        let dir = TempDir::new().unwrap();
        let service = DashboardService::new(store(&dir));
        assert!(matches!(
            service.account_overview("0000000000"),
            Err(Error::AccountNotFound(_))
        ));
    }
}
