//! Tillbook Core - ledger engine for branch banking
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Account, Loan, TransactionRecord, etc.)
//! - **ports**: Trait definitions for external dependencies (LedgerStore, CredentialVerifier)
//! - **services**: Business logic orchestration, with the LedgerEngine at the center
//! - **adapters**: Concrete implementations (DuckDB store, Argon2 verifier)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::argon2::Argon2Verifier;
use adapters::duckdb::DuckDbStore;
use config::Config;
use ports::{CredentialVerifier, LedgerStore};
use services::*;

// Re-export commonly used types at crate root
pub use adapters::duckdb::QueryResult;
pub use domain::result::{Error, Result as LedgerResult};
pub use domain::{
    Account, AdminCredential, AdminSession, BackupMetadata, Loan, Profile, Session,
    TransactionKind, TransactionRecord,
};
pub use ports::{AccountFilter, InterestBatch, TransactionFilter};

/// Main context for Tillbook operations
///
/// This is the primary entry point for all business logic. It holds
/// the database connection, configuration, and all services.
pub struct LedgerContext {
    pub config: Config,
    pub store: Arc<DuckDbStore>,
    pub engine: LedgerEngine,
    pub account_service: AccountService,
    pub admin_service: AdminService,
    pub dashboard_service: DashboardService,
    pub status_service: StatusService,
    pub query_service: QueryService,
    pub backup_service: BackupService,
    pub demo_service: DemoService,
}

impl LedgerContext {
    /// Create a new ledger context
    pub fn new(tillbook_dir: &Path) -> Result<Self> {
        let config = Config::load(tillbook_dir)?;

        // Determine which database file to use
        let db_filename = if config.demo_mode {
            "demo.duckdb"
        } else {
            "tillbook.duckdb"
        };

        let db_path = tillbook_dir.join(db_filename);
        let store = Arc::new(DuckDbStore::new(&db_path)?);

        // Initialize schema
        store.ensure_schema()?;

        let ledger_store: Arc<dyn LedgerStore> = store.clone();
        let verifier: Arc<dyn CredentialVerifier> = Arc::new(Argon2Verifier::new());

        // Create services
        let engine = LedgerEngine::new(ledger_store.clone(), verifier.clone(), config.loan_limit);
        let account_service = AccountService::new(ledger_store.clone(), verifier.clone());
        let admin_service =
            AdminService::new(ledger_store.clone(), verifier.clone(), engine.clone());
        let dashboard_service = DashboardService::new(ledger_store.clone());
        let status_service = StatusService::new(ledger_store);
        let query_service = QueryService::new(store.clone());
        let backup_service =
            BackupService::new(tillbook_dir.to_path_buf(), db_filename.to_string());
        let demo_service = DemoService::new(tillbook_dir);

        Ok(Self {
            config,
            store,
            engine,
            account_service,
            admin_service,
            dashboard_service,
            status_service,
            query_service,
            backup_service,
            demo_service,
        })
    }
}
