//! Demo service - manage demo mode
//!
//! Demo mode provides a sandbox ledger with sample accounts and activity
//! for trying the tool without touching real branch data. The demo book
//! lives in its own database file and is rebuilt from scratch on enable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;

use crate::adapters::argon2::Argon2Verifier;
use crate::adapters::duckdb::DuckDbStore;
use crate::config::Config;
use crate::domain::Profile;
use crate::ports::LedgerStore;
use crate::services::accounts::{AccountService, OpenAccountRequest};
use crate::services::engine::LedgerEngine;

/// Names for generated demo account holders
const DEMO_HOLDERS: &[&str] = &[
    "Ada Marsh",
    "Bruno Keller",
    "Chidi Okafor",
    "Dalia Haddad",
    "Edith Varga",
    "Farid Nasser",
];

/// Every demo account opens with this password
pub const DEMO_PASSWORD: &str = "demo";

/// Demo service for managing demo mode
pub struct DemoService {
    tillbook_dir: PathBuf,
}

impl DemoService {
    pub fn new(tillbook_dir: &Path) -> Self {
        Self {
            tillbook_dir: tillbook_dir.to_path_buf(),
        }
    }

    /// Check if demo mode is currently enabled
    pub fn is_enabled(&self) -> Result<bool> {
        let config = Config::load(&self.tillbook_dir)?;
        Ok(config.demo_mode)
    }

    /// Enable demo mode
    ///
    /// This will:
    /// 1. Delete any existing demo database (fresh start)
    /// 2. Enable demo mode in config
    /// 3. Create a demo database seeded through the real engine
    pub fn enable(&self) -> Result<Vec<String>> {
        // Delete existing demo database for a fresh start
        let demo_db = self.tillbook_dir.join("demo.duckdb");
        let demo_wal = self.tillbook_dir.join("demo.duckdb.wal");
        if demo_db.exists() {
            std::fs::remove_file(&demo_db)?;
        }
        if demo_wal.exists() {
            std::fs::remove_file(&demo_wal)?;
        }

        let mut config = Config::load(&self.tillbook_dir).unwrap_or_default();
        config.enable_demo_mode();
        config.save(&self.tillbook_dir)?;

        let store = Arc::new(DuckDbStore::new(&demo_db)?);
        store.ensure_schema()?;
        let numbers = seed_demo_data(store, config.loan_limit)?;
        Ok(numbers)
    }

    /// Disable demo mode (the demo database is kept on disk)
    pub fn disable(&self) -> Result<()> {
        let mut config = Config::load(&self.tillbook_dir).unwrap_or_default();
        config.disable_demo_mode();
        config.save(&self.tillbook_dir)?;
        Ok(())
    }
}

/// Populate a fresh store with sample accounts and activity
///
/// Everything goes through the engine, so demo data obeys the same
/// invariants as real data.
fn seed_demo_data(store: Arc<DuckDbStore>, loan_limit: Decimal) -> Result<Vec<String>> {
    let verifier = Arc::new(Argon2Verifier::new());
    let accounts = AccountService::new(store.clone(), verifier.clone());
    let engine = LedgerEngine::new(store, verifier, loan_limit);

    let mut rng = rand::thread_rng();
    let mut numbers = Vec::new();

    for name in DEMO_HOLDERS {
        let opened = accounts.open_account(OpenAccountRequest {
            name: name.to_string(),
            password: DEMO_PASSWORD.to_string(),
            profile: Profile::default(),
        })?;

        // A few deposits, the odd withdrawal, sometimes a loan
        let deposits = rng.gen_range(1..=4);
        for _ in 0..deposits {
            let cents: i64 = rng.gen_range(50_00..2_000_00);
            engine.deposit(&opened.account_number, Decimal::new(cents, 2))?;
        }
        if rng.gen_bool(0.5) {
            let cents: i64 = rng.gen_range(10_00..50_00);
            engine.withdraw(&opened.account_number, Decimal::new(cents, 2))?;
        }
        if rng.gen_bool(0.33) {
            let cents: i64 = rng.gen_range(100_00..2_000_00);
            engine.apply_for_loan(&opened.account_number, Decimal::new(cents, 2))?;
        }

        numbers.push(opened.account_number);
    }

    // A couple of transfers between random pairs, skipped when the drawn
    // source cannot fund them
    for _ in 0..2 {
        let mut pair = numbers.choose_multiple(&mut rng, 2);
        if let (Some(source), Some(target)) = (pair.next(), pair.next()) {
            let amount = Decimal::new(rng.gen_range(5_00..20_00), 2);
            if accounts.get(source)?.balance >= amount {
                engine.transfer(source, target, amount)?;
            }
        }
    }

    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::ports::LedgerStore;

    #[test]
    fn test_seed_produces_consistent_book() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(DuckDbStore::new(&dir.path().join("demo.duckdb")).unwrap());
        store.ensure_schema().unwrap();

        let numbers = seed_demo_data(store.clone(), Decimal::new(10_000, 0)).unwrap();
        assert_eq!(numbers.len(), DEMO_HOLDERS.len());

        // Demo data obeys the ledger invariants
        for number in &numbers {
            let account = store.get_account(number).unwrap().unwrap();
            assert!(account.balance >= Decimal::ZERO);
            for loan in store.loans_for_account(number).unwrap() {
                assert!(loan.remaining >= Decimal::ZERO);
                assert!(loan.remaining <= loan.principal);
            }
        }
        assert!(store.count_transactions().unwrap() > 0);
    }

    #[test]
    fn test_enable_disable_toggles_config() {
        let dir = TempDir::new().unwrap();
        let service = DemoService::new(dir.path());

        assert!(!service.is_enabled().unwrap());
        service.enable().unwrap();
        assert!(service.is_enabled().unwrap());
        service.disable().unwrap();
        assert!(!service.is_enabled().unwrap());
    }
}
