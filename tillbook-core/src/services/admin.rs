//! Admin service - provisioning, privileged mutations and bulk queries
//!
//! Every privileged method takes an `AdminSession` by reference, so the
//! only path to it runs through `authenticate`. There is no global "logged
//! in as admin" state anywhere in the tree, and no built-in default
//! credential: the first admin is created explicitly at setup time.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, AdminCredential, AdminSession, TransactionRecord};
use crate::ports::{
    AccountFilter, CredentialVerifier, InterestBatch, LedgerStore, TransactionFilter,
};
use crate::services::engine::LedgerEngine;

/// Service for administrator operations
pub struct AdminService {
    store: Arc<dyn LedgerStore>,
    verifier: Arc<dyn CredentialVerifier>,
    engine: LedgerEngine,
}

impl AdminService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        verifier: Arc<dyn CredentialVerifier>,
        engine: LedgerEngine,
    ) -> Self {
        Self {
            store,
            verifier,
            engine,
        }
    }

    /// True once an admin credential exists
    pub fn is_provisioned(&self) -> Result<bool> {
        Ok(self.store.admin_count()? > 0)
    }

    /// First-run provisioning of the one admin credential
    ///
    /// Refuses when any admin already exists; use `reset_credentials`
    /// afterwards.
    pub fn provision(&self, admin_id: &str, password: &str) -> Result<()> {
        if admin_id.trim().is_empty() {
            return Err(Error::validation("admin id cannot be empty"));
        }
        if password.is_empty() {
            return Err(Error::validation("password cannot be empty"));
        }
        if self.is_provisioned()? {
            return Err(Error::AlreadyProvisioned);
        }
        let hash = self.verifier.hash(password)?;
        self.store
            .insert_admin(&AdminCredential::new(admin_id.trim(), hash))
    }

    /// Authenticate an administrator
    pub fn authenticate(&self, admin_id: &str, password: &str) -> Result<AdminSession> {
        let admin = self
            .store
            .get_admin(admin_id)?
            .ok_or(Error::InvalidCredentials)?;
        if !self.verifier.verify(password, &admin.password_hash) {
            return Err(Error::InvalidCredentials);
        }
        Ok(AdminSession {
            admin_id: admin.admin_id,
        })
    }

    /// Rename the admin and replace its password in one step
    ///
    /// The current password is re-verified even with a live session, and
    /// the rename is refused if the new id is already taken.
    pub fn reset_credentials(
        &self,
        session: &AdminSession,
        current_password: &str,
        new_id: &str,
        new_password: &str,
    ) -> Result<()> {
        if new_id.trim().is_empty() {
            return Err(Error::validation("admin id cannot be empty"));
        }
        if new_password.is_empty() {
            return Err(Error::validation("password cannot be empty"));
        }
        let admin = self
            .store
            .get_admin(&session.admin_id)?
            .ok_or(Error::InvalidCredentials)?;
        if !self.verifier.verify(current_password, &admin.password_hash) {
            return Err(Error::InvalidCredentials);
        }
        let new_hash = self.verifier.hash(new_password)?;
        self.store
            .rename_admin(&session.admin_id, new_id.trim(), &new_hash)
    }

    // === Bulk queries (read-only, unbounded result sets) ===

    /// All accounts matching the filter
    pub fn list_accounts(
        &self,
        _session: &AdminSession,
        filter: &AccountFilter,
    ) -> Result<Vec<Account>> {
        self.store.list_accounts(filter)
    }

    /// One account with full detail
    pub fn view_account(&self, _session: &AdminSession, number: &str) -> Result<Account> {
        self.store
            .get_account(number)?
            .ok_or_else(|| Error::AccountNotFound(number.to_string()))
    }

    /// All transaction records matching the filter
    pub fn list_transactions(
        &self,
        _session: &AdminSession,
        filter: &TransactionFilter,
    ) -> Result<Vec<TransactionRecord>> {
        self.store.list_transactions(filter)
    }

    // === Privileged mutations (delegated to the engine) ===

    /// Apply interest across all accounts
    pub fn set_interest_rate(
        &self,
        _session: &AdminSession,
        rate: Decimal,
    ) -> Result<InterestBatch> {
        self.engine.apply_interest(rate)
    }

    /// Freeze an account
    pub fn block_account(&self, _session: &AdminSession, number: &str) -> Result<()> {
        self.engine.block(number)
    }

    /// Unfreeze an account
    pub fn unblock_account(&self, _session: &AdminSession, number: &str) -> Result<()> {
        self.engine.unblock(number)
    }

    /// Delete an account and everything attached to it
    ///
    /// The reason is operator-facing; callers record it in the event log.
    pub fn delete_account(
        &self,
        _session: &AdminSession,
        number: &str,
        _reason: &str,
    ) -> Result<()> {
        self.engine.delete_account(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::adapters::argon2::Argon2Verifier;
    use crate::adapters::duckdb::DuckDbStore;
    use crate::services::engine::DEFAULT_LOAN_LIMIT;

    fn service(dir: &TempDir) -> AdminService {
        let store: Arc<DuckDbStore> =
            Arc::new(DuckDbStore::new(&dir.path().join("test.duckdb")).unwrap());
        store.ensure_schema().unwrap();
        let verifier = Arc::new(Argon2Verifier::new());
        let engine = LedgerEngine::new(
            store.clone(),
            verifier.clone(),
            Decimal::new(DEFAULT_LOAN_LIMIT, 0),
        );
        AdminService::new(store, verifier, engine)
    }

    #[test]
    fn test_provision_exactly_once() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);

        assert!(!service.is_provisioned().unwrap());
        service.provision("head-office", "s3cret!").unwrap();
        assert!(service.is_provisioned().unwrap());

        assert!(matches!(
            service.provision("other", "pw"),
            Err(Error::AlreadyProvisioned)
        ));
    }

    #[test]
    fn test_authenticate_and_reset() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        service.provision("head-office", "s3cret!").unwrap();

        let session = service.authenticate("head-office", "s3cret!").unwrap();

        // Wrong current password refuses the reset
        assert!(matches!(
            service.reset_credentials(&session, "wrong", "branch-9", "newpw!"),
            Err(Error::InvalidCredentials)
        ));

        service
            .reset_credentials(&session, "s3cret!", "branch-9", "newpw!")
            .unwrap();

        assert!(service.authenticate("head-office", "s3cret!").is_err());
        service.authenticate("branch-9", "newpw!").unwrap();
    }
}
