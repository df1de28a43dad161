//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. The ledger
//! engine owns every money- and debt-mutating operation; the rest are
//! lifecycle, admin, projection and maintenance concerns around it.

mod accounts;
mod admin;
mod backup;
mod dashboard;
mod demo;
pub mod engine;
pub mod logging;
pub mod migration;
mod query;
mod status;

pub use accounts::{AccountService, OpenAccountRequest, OpenAccountResult};
pub use admin::AdminService;
pub use backup::BackupService;
pub use dashboard::{AccountOverview, AdminOverview, DashboardService};
pub use demo::{DemoService, DEMO_PASSWORD};
pub use engine::{LedgerEngine, RepaymentOutcome, DEFAULT_LOAN_LIMIT};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use query::QueryService;
pub use status::{StatusService, StatusSummary};
