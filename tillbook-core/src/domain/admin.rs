//! Admin credential domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An administrator credential record
///
/// Structurally like an account credential but in a disjoint namespace;
/// admins hold no balance. Exactly one exists after first-run provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCredential {
    pub admin_id: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminCredential {
    pub fn new(admin_id: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            admin_id: admin_id.into(),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Proof of a successful customer authentication
///
/// Passed explicitly into operations that act on behalf of a logged-in
/// customer; there is no global login state anywhere.
#[derive(Debug, Clone)]
pub struct Session {
    pub account_number: String,
}

/// Proof of a successful admin authentication
///
/// Privileged service methods take this by reference, so the only way to
/// reach them is through `AdminService::authenticate`.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub admin_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_serialization_omits_hash() {
        let admin = AdminCredential::new("head-office", "$argon2id$secret");
        let json = serde_json::to_string(&admin).unwrap();
        assert!(json.contains("head-office"));
        assert!(!json.contains("argon2id"));
    }
}
