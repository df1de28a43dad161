//! Ledger engine - all money- and debt-mutating operations
//!
//! The engine owns validation and policy: positive amounts, blocked-account
//! rules, the loan limit, earliest-active-loan selection. The store it
//! drives owns atomicity: every store call the engine makes either fully
//! applies (balance change plus matching ledger record) or has no effect.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, Loan, Profile, TransactionKind, TransactionRecord};
use crate::ports::{CredentialVerifier, InterestBatch, LedgerStore};

/// Default ceiling for a single loan when none is configured
pub const DEFAULT_LOAN_LIMIT: i64 = 10_000;

/// Outcome of a loan repayment
#[derive(Debug, Clone, Serialize)]
pub struct RepaymentOutcome {
    pub loan_id: i64,
    pub amount: Decimal,
    pub remaining: Decimal,
    /// True when this repayment brought the loan's remaining amount to
    /// exactly zero
    pub fully_repaid: bool,
}

/// The ledger engine
///
/// Cheap to clone; all state lives behind the store.
#[derive(Clone)]
pub struct LedgerEngine {
    store: Arc<dyn LedgerStore>,
    verifier: Arc<dyn CredentialVerifier>,
    loan_limit: Decimal,
}

impl LedgerEngine {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        verifier: Arc<dyn CredentialVerifier>,
        loan_limit: Decimal,
    ) -> Self {
        Self {
            store,
            verifier,
            loan_limit,
        }
    }

    /// The configured single-loan ceiling
    pub fn loan_limit(&self) -> Decimal {
        self.loan_limit
    }

    /// Round to cents and reject non-positive amounts
    fn normalize_amount(amount: Decimal) -> Result<Decimal> {
        let amount = amount.round_dp(2);
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount);
        }
        Ok(amount)
    }

    /// Load an account or fail with `AccountNotFound`
    fn require_account(&self, number: &str) -> Result<Account> {
        self.store
            .get_account(number)?
            .ok_or_else(|| Error::AccountNotFound(number.to_string()))
    }

    /// Credit `amount` into the account and append a DEPOSIT record
    ///
    /// Blocked accounts may still receive deposits: a block freezes
    /// outgoing money, not incoming.
    pub fn deposit(&self, number: &str, amount: Decimal) -> Result<TransactionRecord> {
        let amount = Self::normalize_amount(amount)?;
        self.require_account(number)?;
        self.store.credit(number, amount, TransactionKind::Deposit)
    }

    /// Debit `amount` if the balance covers it and append a WITHDRAWAL record
    pub fn withdraw(&self, number: &str, amount: Decimal) -> Result<TransactionRecord> {
        let amount = Self::normalize_amount(amount)?;
        let account = self.require_account(number)?;
        if account.is_blocked {
            return Err(Error::AccountBlocked(number.to_string()));
        }
        self.store.debit(number, amount, TransactionKind::Withdrawal)
    }

    /// Move `amount` from `source` to `target`
    ///
    /// The target is checked before any money moves. The debit, credit and
    /// both TRANSFER records commit in one store transaction, so a failure
    /// at any step leaves both balances untouched and nothing on the
    /// ledger. A self-transfer is permitted: it nets to zero and still
    /// writes both records.
    pub fn transfer(&self, source: &str, target: &str, amount: Decimal) -> Result<()> {
        let amount = Self::normalize_amount(amount)?;
        if self.store.get_account(target)?.is_none() {
            return Err(Error::AccountNotFound(target.to_string()));
        }
        let source_account = self.require_account(source)?;
        if source_account.is_blocked {
            return Err(Error::AccountBlocked(source.to_string()));
        }
        self.store.transfer(source, target, amount)
    }

    /// Issue a loan: credit the balance and open a loan for the same amount
    pub fn apply_for_loan(&self, number: &str, amount: Decimal) -> Result<Loan> {
        let amount = Self::normalize_amount(amount)?;
        if amount > self.loan_limit {
            return Err(Error::LoanLimitExceeded {
                limit: self.loan_limit,
            });
        }
        let account = self.require_account(number)?;
        if account.is_blocked {
            return Err(Error::AccountBlocked(number.to_string()));
        }
        self.store.issue_loan(number, amount)
    }

    /// Repay against the account's earliest loan that still has a
    /// remaining amount
    ///
    /// There is no choosing which loan to repay: first opened, first
    /// repaid. Repayment is allowed on blocked accounts (reducing debt is
    /// incoming value from the bank's side).
    pub fn repay_loan(&self, number: &str, amount: Decimal) -> Result<RepaymentOutcome> {
        let amount = Self::normalize_amount(amount)?;
        let account = self.require_account(number)?;
        let loan = self
            .store
            .first_active_loan(number)?
            .ok_or(Error::NoActiveLoan)?;
        if amount > loan.remaining {
            return Err(Error::OverRepayment);
        }
        if account.balance < amount {
            return Err(Error::InsufficientFunds);
        }
        let remaining = self.store.repay_loan(number, loan.id, amount)?;
        Ok(RepaymentOutcome {
            loan_id: loan.id,
            amount,
            remaining,
            fully_repaid: remaining == Decimal::ZERO,
        })
    }

    /// Apply `rate` percent interest to every account as one batch
    ///
    /// All-or-nothing: the store runs the whole account set in a single
    /// transaction, so a failure on any account leaves every balance
    /// unchanged.
    pub fn apply_interest(&self, rate: Decimal) -> Result<InterestBatch> {
        if rate < Decimal::ZERO || rate > Decimal::new(100, 0) {
            return Err(Error::InvalidRate);
        }
        self.store.apply_interest(rate)
    }

    /// Replace the profile fields and, when a new password is supplied,
    /// the credential hash
    pub fn edit_profile(
        &self,
        number: &str,
        name: &str,
        profile: &Profile,
        new_password: Option<&str>,
    ) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::validation("account name cannot be empty"));
        }
        let hash = match new_password {
            Some(password) => Some(self.verifier.hash(password)?),
            None => None,
        };
        let updated = self
            .store
            .update_profile(number, name, profile, hash.as_deref())?;
        if !updated {
            return Err(Error::AccountNotFound(number.to_string()));
        }
        Ok(())
    }

    /// Freeze outgoing money movement on the account
    pub fn block(&self, number: &str) -> Result<()> {
        if !self.store.set_blocked(number, true)? {
            return Err(Error::AccountNotFound(number.to_string()));
        }
        Ok(())
    }

    /// Lift a freeze
    pub fn unblock(&self, number: &str) -> Result<()> {
        if !self.store.set_blocked(number, false)? {
            return Err(Error::AccountNotFound(number.to_string()));
        }
        Ok(())
    }

    /// Delete the account with all its loans and transaction records
    ///
    /// Irreversible; the cascade runs in one store transaction.
    pub fn delete_account(&self, number: &str) -> Result<()> {
        if !self.store.delete_account(number)? {
            return Err(Error::AccountNotFound(number.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::adapters::argon2::Argon2Verifier;
    use crate::adapters::duckdb::DuckDbStore;
    use crate::domain::generate_account_number;

    fn engine_with_store(dir: &TempDir) -> (LedgerEngine, Arc<DuckDbStore>) {
        let store = Arc::new(DuckDbStore::new(&dir.path().join("test.duckdb")).unwrap());
        store.ensure_schema().unwrap();
        let engine = LedgerEngine::new(
            store.clone(),
            Arc::new(Argon2Verifier::new()),
            Decimal::new(DEFAULT_LOAN_LIMIT, 0),
        );
        (engine, store)
    }

    fn open_account(store: &DuckDbStore) -> String {
        let number = generate_account_number();
        let account = Account::new(&number, "Test Holder", "$argon2id$x");
        store.insert_account(&account).unwrap();
        number
    }

    #[test]
    fn test_deposit_rejects_non_positive_amounts() {
        let dir = TempDir::new().unwrap();
        let (engine, store) = engine_with_store(&dir);
        let number = open_account(&store);

        assert!(matches!(
            engine.deposit(&number, Decimal::ZERO),
            Err(Error::InvalidAmount)
        ));
        assert!(matches!(
            engine.deposit(&number, Decimal::new(-100, 2)),
            Err(Error::InvalidAmount)
        ));
        // Rounds to 0.00 and is rejected too
        assert!(matches!(
            engine.deposit(&number, Decimal::new(1, 3)),
            Err(Error::InvalidAmount)
        ));
    }

    #[test]
    fn test_withdraw_blocked_account_refused() {
        let dir = TempDir::new().unwrap();
        let (engine, store) = engine_with_store(&dir);
        let number = open_account(&store);
        engine.deposit(&number, Decimal::new(10000, 2)).unwrap();

        engine.block(&number).unwrap();
        assert!(matches!(
            engine.withdraw(&number, Decimal::new(100, 2)),
            Err(Error::AccountBlocked(_))
        ));
        // Deposits still land while blocked
        engine.deposit(&number, Decimal::new(100, 2)).unwrap();

        engine.unblock(&number).unwrap();
        engine.withdraw(&number, Decimal::new(100, 2)).unwrap();
    }

    #[test]
    fn test_blocked_source_cannot_transfer_but_can_receive() {
        let dir = TempDir::new().unwrap();
        let (engine, store) = engine_with_store(&dir);
        let blocked = open_account(&store);
        let other = open_account(&store);
        engine.deposit(&blocked, Decimal::new(10000, 2)).unwrap();
        engine.deposit(&other, Decimal::new(10000, 2)).unwrap();
        engine.block(&blocked).unwrap();

        assert!(matches!(
            engine.transfer(&blocked, &other, Decimal::new(100, 2)),
            Err(Error::AccountBlocked(_))
        ));
        engine.transfer(&other, &blocked, Decimal::new(100, 2)).unwrap();
        assert_eq!(
            store.get_account(&blocked).unwrap().unwrap().balance,
            Decimal::new(10100, 2)
        );
    }

    #[test]
    fn test_loan_limit_enforced() {
        let dir = TempDir::new().unwrap();
        let (engine, store) = engine_with_store(&dir);
        let number = open_account(&store);

        let err = engine
            .apply_for_loan(&number, Decimal::new(10_001, 0))
            .unwrap_err();
        assert!(matches!(err, Error::LoanLimitExceeded { .. }));

        // Exactly at the limit is fine
        engine
            .apply_for_loan(&number, Decimal::new(10_000, 0))
            .unwrap();
    }

    #[test]
    fn test_repayment_signals_full_repayment_on_final_call() {
        let dir = TempDir::new().unwrap();
        let (engine, store) = engine_with_store(&dir);
        let number = open_account(&store);
        engine.apply_for_loan(&number, Decimal::new(20000, 2)).unwrap();

        let first = engine.repay_loan(&number, Decimal::new(12000, 2)).unwrap();
        assert!(!first.fully_repaid);
        assert_eq!(first.remaining, Decimal::new(8000, 2));

        let second = engine.repay_loan(&number, Decimal::new(8000, 2)).unwrap();
        assert!(second.fully_repaid);
        assert_eq!(second.remaining, Decimal::ZERO);

        assert!(matches!(
            engine.repay_loan(&number, Decimal::new(100, 2)),
            Err(Error::NoActiveLoan)
        ));
    }

    #[test]
    fn test_interest_rate_bounds() {
        let dir = TempDir::new().unwrap();
        let (engine, _store) = engine_with_store(&dir);

        assert!(matches!(
            engine.apply_interest(Decimal::new(-1, 0)),
            Err(Error::InvalidRate)
        ));
        assert!(matches!(
            engine.apply_interest(Decimal::new(101, 0)),
            Err(Error::InvalidRate)
        ));
        // Zero percent is legal and touches every account with a 0.00 delta
        engine.apply_interest(Decimal::ZERO).unwrap();
    }

    #[test]
    fn test_edit_profile_rehashes_password() {
        let dir = TempDir::new().unwrap();
        let (engine, store) = engine_with_store(&dir);
        let number = open_account(&store);

        let profile = Profile {
            address: Some("12 Hill Road".to_string()),
            ..Default::default()
        };
        engine
            .edit_profile(&number, "New Name", &profile, Some("hunter2!"))
            .unwrap();

        let account = store.get_account(&number).unwrap().unwrap();
        assert_eq!(account.name, "New Name");
        assert_eq!(account.profile.address.as_deref(), Some("12 Hill Road"));
        assert!(account.password_hash.starts_with("$argon2"));
    }

    #[test]
    fn test_operations_on_missing_account() {
        let dir = TempDir::new().unwrap();
        let (engine, _store) = engine_with_store(&dir);

        assert!(matches!(
            engine.deposit("0000000000", Decimal::new(100, 2)),
            Err(Error::AccountNotFound(_))
        ));
        assert!(matches!(
            engine.block("0000000000"),
            Err(Error::AccountNotFound(_))
        ));
        assert!(matches!(
            engine.delete_account("0000000000"),
            Err(Error::AccountNotFound(_))
        ));
    }
}
