//! Status service - store summaries

use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::Result;
use crate::ports::LedgerStore;

/// Status service for store summaries
pub struct StatusService {
    store: Arc<dyn LedgerStore>,
}

impl StatusService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Get overall status summary
    pub fn get_status(&self) -> Result<StatusSummary> {
        Ok(StatusSummary {
            total_accounts: self.store.count_accounts()?,
            total_transactions: self.store.count_transactions()?,
            total_loans: self.store.count_loans()?,
            admin_provisioned: self.store.admin_count()? > 0,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_accounts: i64,
    pub total_transactions: i64,
    pub total_loans: i64,
    pub admin_provisioned: bool,
}
