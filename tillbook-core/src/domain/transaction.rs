//! Transaction record domain model
//!
//! Records are the append-only ledger: one row per balance-affecting event,
//! written in the same store transaction as the balance change itself. They
//! are never updated or deleted except by cascading account deletion.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

/// Kind of ledger event a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
    Loan,
    LoanRepayment,
    Interest,
}

impl TransactionKind {
    /// Stable wire/storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::TransferOut => "TRANSFER_OUT",
            TransactionKind::TransferIn => "TRANSFER_IN",
            TransactionKind::Loan => "LOAN",
            TransactionKind::LoanRepayment => "LOAN_REPAYMENT",
            TransactionKind::Interest => "INTEREST",
        }
    }

    /// Parse the storage name back into a kind
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "DEPOSIT" => Ok(TransactionKind::Deposit),
            "WITHDRAWAL" => Ok(TransactionKind::Withdrawal),
            "TRANSFER_OUT" => Ok(TransactionKind::TransferOut),
            "TRANSFER_IN" => Ok(TransactionKind::TransferIn),
            "LOAN" => Ok(TransactionKind::Loan),
            "LOAN_REPAYMENT" => Ok(TransactionKind::LoanRepayment),
            "INTEREST" => Ok(TransactionKind::Interest),
            other => Err(Error::validation(format!(
                "unknown transaction kind: {other}"
            ))),
        }
    }

    /// True for kinds that reduce the account's balance
    pub fn is_debit(&self) -> bool {
        matches!(
            self,
            TransactionKind::Withdrawal
                | TransactionKind::TransferOut
                | TransactionKind::LoanRepayment
        )
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immutable ledger entry
///
/// The id comes from a store sequence and the timestamp is assigned by the
/// store at insert time, so `(created_at, id)` ordering matches insertion
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub account_number: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            TransactionKind::Deposit,
            TransactionKind::Withdrawal,
            TransactionKind::TransferOut,
            TransactionKind::TransferIn,
            TransactionKind::Loan,
            TransactionKind::LoanRepayment,
            TransactionKind::Interest,
        ] {
            assert_eq!(TransactionKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(TransactionKind::parse("REFUND").is_err());
    }

    #[test]
    fn test_debit_classification() {
        assert!(TransactionKind::Withdrawal.is_debit());
        assert!(TransactionKind::LoanRepayment.is_debit());
        assert!(!TransactionKind::Deposit.is_debit());
        assert!(!TransactionKind::Interest.is_debit());
    }
}
