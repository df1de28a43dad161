//! Loan domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A loan issued against an account
///
/// `principal` is fixed at issuance; `remaining` starts equal to it and
/// only ever decreases, with a floor of zero. An account may carry several
/// loans at once; repayments always target the earliest one still open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub account_number: String,
    pub principal: Decimal,
    pub remaining: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    /// True while any of the principal is still owed
    pub fn is_active(&self) -> bool {
        self.remaining > Decimal::ZERO
    }
}
