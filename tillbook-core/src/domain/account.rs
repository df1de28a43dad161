//! Account domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer account holding a balance
///
/// The account number is assigned at creation and never changes. Profile
/// fields are free text; the engine enforces no invariants on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_number: String,
    pub name: String,
    /// Argon2id PHC string; never the plaintext password
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub balance: Decimal,
    pub is_blocked: bool,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable free-text profile fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub nationality: Option<String>,
    pub national_id: Option<String>,
    pub phone_number: Option<String>,
}

impl Account {
    /// Create a new account with a zero balance
    pub fn new(
        account_number: impl Into<String>,
        name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            account_number: account_number.into(),
            name: name.into(),
            password_hash: password_hash.into(),
            balance: Decimal::ZERO,
            is_blocked: false,
            profile: Profile::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate account data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.account_number.trim().is_empty() {
            return Err("account number cannot be empty");
        }
        if self.name.trim().is_empty() {
            return Err("account name cannot be empty");
        }
        Ok(())
    }
}

/// Generate a fresh 10-character account number
///
/// Derived from a UUIDv4 so collisions are vanishingly rare; the accounts
/// table's primary key catches the remainder and callers retry.
pub fn generate_account_number() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_number_shape() {
        let n = generate_account_number();
        assert_eq!(n.len(), 10);
        assert!(n.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_numbers_differ() {
        assert_ne!(generate_account_number(), generate_account_number());
    }

    #[test]
    fn test_account_validation() {
        let mut account = Account::new(generate_account_number(), "Test Account", "$argon2id$x");
        assert!(account.validate().is_ok());

        account.name = "".to_string();
        assert!(account.validate().is_err());
    }

    #[test]
    fn test_new_account_starts_empty_and_unblocked() {
        let account = Account::new("ab12cd34ef", "Test", "$argon2id$x");
        assert_eq!(account.balance, Decimal::ZERO);
        assert!(!account.is_blocked);
    }
}
