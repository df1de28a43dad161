//! Configuration management
//!
//! Settings live in settings.json in the data directory (camelCase keys,
//! shared with the desktop app):
//! ```json
//! {
//!   "app": { "demoMode": false, "loanLimit": 10000.0 }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::services::engine::DEFAULT_LOAN_LIMIT;

/// Raw settings.json structure (matching the desktop app format)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    demo_mode: bool,
    /// Single-loan ceiling; absent means the built-in default
    #[serde(default)]
    loan_limit: Option<f64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Tillbook configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub demo_mode: bool,
    pub loan_limit: Decimal,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            demo_mode: false,
            loan_limit: Decimal::new(DEFAULT_LOAN_LIMIT, 0),
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the tillbook directory
    ///
    /// Demo mode can be enabled via:
    /// 1. Settings file (tb demo on)
    /// 2. Environment variable TILLBOOK_DEMO_MODE (for CI/testing)
    pub fn load(tillbook_dir: &Path) -> Result<Self> {
        let settings_path = tillbook_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        // Check env var for demo mode override (for CI/testing)
        let demo_mode = match std::env::var("TILLBOOK_DEMO_MODE").ok().as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.app.demo_mode,
        };

        let loan_limit = raw
            .app
            .loan_limit
            .and_then(|f| Decimal::try_from(f).ok())
            .map(|d| d.round_dp(2))
            .filter(|d| *d > Decimal::ZERO)
            .unwrap_or_else(|| Decimal::new(DEFAULT_LOAN_LIMIT, 0));

        Ok(Self {
            demo_mode,
            loan_limit,
            _raw_settings: raw,
        })
    }

    /// Save config to the tillbook directory
    /// Preserves other settings that the CLI doesn't manage
    pub fn save(&self, tillbook_dir: &Path) -> Result<()> {
        let settings_path = tillbook_dir.join("settings.json");

        // Load existing settings to preserve fields we don't manage
        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        // Update only the fields we manage
        settings.app.demo_mode = self.demo_mode;

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Enable demo mode
    pub fn enable_demo_mode(&mut self) {
        self.demo_mode = true;
    }

    /// Disable demo mode
    pub fn disable_demo_mode(&mut self) {
        self.demo_mode = false;
    }
}
