//! Account service - registration, authentication and lookup

use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::{generate_account_number, Account, Profile, Session};
use crate::ports::{CredentialVerifier, LedgerStore};

/// How many identifier collisions we tolerate before giving up.
/// With 10 hex chars a single retry is already vanishingly unlikely.
const MAX_NUMBER_ATTEMPTS: usize = 5;

/// Input for opening a new account
#[derive(Debug, Clone)]
pub struct OpenAccountRequest {
    pub name: String,
    pub password: String,
    pub profile: Profile,
}

/// What the caller gets back after registration
#[derive(Debug, Serialize)]
pub struct OpenAccountResult {
    pub account_number: String,
    pub name: String,
}

/// Service for account lifecycle outside of money movement
pub struct AccountService {
    store: Arc<dyn LedgerStore>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl AccountService {
    pub fn new(store: Arc<dyn LedgerStore>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { store, verifier }
    }

    /// Register a new account with a freshly generated number
    pub fn open_account(&self, request: OpenAccountRequest) -> Result<OpenAccountResult> {
        if request.name.trim().is_empty() {
            return Err(Error::validation("account name cannot be empty"));
        }
        if request.password.is_empty() {
            return Err(Error::validation("password cannot be empty"));
        }

        let password_hash = self.verifier.hash(&request.password)?;

        // The generated number is unique for all practical purposes; the
        // primary key catches the rest and we draw again.
        let mut last_err = None;
        for _ in 0..MAX_NUMBER_ATTEMPTS {
            let number = generate_account_number();
            let mut account = Account::new(&number, request.name.trim(), &password_hash);
            account.profile = request.profile.clone();
            match self.store.insert_account(&account) {
                Ok(()) => {
                    return Ok(OpenAccountResult {
                        account_number: number,
                        name: account.name,
                    })
                }
                Err(Error::DuplicateIdentifier(_)) => {
                    last_err = Some(Error::DuplicateIdentifier(number));
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::store("could not allocate an account number")))
    }

    /// Authenticate a customer
    ///
    /// Missing accounts and wrong passwords both map to
    /// `InvalidCredentials`, so a caller cannot probe which numbers exist.
    /// Blocked accounts are refused even with the right password.
    pub fn authenticate(&self, number: &str, password: &str) -> Result<Session> {
        let account = self
            .store
            .get_account(number)?
            .ok_or(Error::InvalidCredentials)?;
        if !self.verifier.verify(password, &account.password_hash) {
            return Err(Error::InvalidCredentials);
        }
        if account.is_blocked {
            return Err(Error::AccountBlocked(number.to_string()));
        }
        Ok(Session {
            account_number: account.account_number,
        })
    }

    /// Fetch an account or fail with `AccountNotFound`
    pub fn get(&self, number: &str) -> Result<Account> {
        self.store
            .get_account(number)?
            .ok_or_else(|| Error::AccountNotFound(number.to_string()))
    }
}
