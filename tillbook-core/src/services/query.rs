//! Query service - raw read-only SQL for admin reporting

use std::sync::Arc;

use crate::adapters::duckdb::{DuckDbStore, QueryResult};
use crate::domain::result::Result;
use crate::domain::AdminSession;

/// Query service for ad-hoc SELECT statements
///
/// Bound to the concrete DuckDB store: raw SQL is a property of the
/// backend, not of the ledger port.
pub struct QueryService {
    store: Arc<DuckDbStore>,
}

impl QueryService {
    pub fn new(store: Arc<DuckDbStore>) -> Self {
        Self { store }
    }

    /// Execute a read-only SQL query
    pub fn execute(&self, _session: &AdminSession, sql: &str) -> Result<QueryResult> {
        self.store.execute_query(sql)
    }
}
