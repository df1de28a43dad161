//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod admin;
mod backup;
mod loan;
mod transaction;
pub mod result;

pub use account::{generate_account_number, Account, Profile};
pub use admin::{AdminCredential, AdminSession, Session};
pub use backup::BackupMetadata;
pub use loan::Loan;
pub use transaction::{TransactionKind, TransactionRecord};
