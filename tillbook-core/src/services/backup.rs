//! Backup service - database backup management
//!
//! Creates ZIP archives containing the ledger database and the settings
//! file. Backups are plain files under backups/ in the data directory;
//! restoring is a manual unzip by design.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::domain::BackupMetadata;

/// Config files to include in a backup (relative to the data dir)
const CONFIG_FILES: &[&str] = &["settings.json"];

/// Backup service for database backup management
pub struct BackupService {
    tillbook_dir: PathBuf,
    db_filename: String,
}

impl BackupService {
    pub fn new(tillbook_dir: PathBuf, db_filename: String) -> Self {
        Self {
            tillbook_dir,
            db_filename,
        }
    }

    fn backups_dir(&self) -> PathBuf {
        self.tillbook_dir.join("backups")
    }

    /// Create a backup of the database and config files as a ZIP archive
    ///
    /// Callers must checkpoint the store first so the file on disk is
    /// complete. With `max_backups`, older archives beyond the limit are
    /// pruned after the new one is written.
    pub fn create(&self, max_backups: Option<usize>) -> Result<BackupMetadata> {
        let backups_dir = self.backups_dir();
        fs::create_dir_all(&backups_dir)?;

        let db_path = self.tillbook_dir.join(&self.db_filename);
        if !db_path.exists() {
            anyhow::bail!("Database file not found");
        }

        let now = Utc::now();
        let timestamp = now.format("%Y-%m-%dT%H-%M-%S");
        let micros = now.timestamp_subsec_micros();
        let backup_name = format!("tillbook-{}-{:06}.zip", timestamp, micros);
        let backup_path = backups_dir.join(&backup_name);

        // Create ZIP archive
        let file = File::create(&backup_path).context("Failed to create backup file")?;
        let mut zip = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        // Add database file
        zip.start_file(&self.db_filename, options)?;
        let mut db_file = File::open(&db_path)?;
        let mut buffer = Vec::new();
        db_file.read_to_end(&mut buffer)?;
        zip.write_all(&buffer)?;

        // Add config files if they exist
        for config_file in CONFIG_FILES {
            let config_path = self.tillbook_dir.join(config_file);
            if config_path.exists() {
                zip.start_file(*config_file, options)?;
                let mut cf = File::open(&config_path)?;
                buffer.clear();
                cf.read_to_end(&mut buffer)?;
                zip.write_all(&buffer)?;
            }
        }

        zip.finish()?;

        let metadata = fs::metadata(&backup_path)?;
        let size_bytes = metadata.len();

        if let Some(max) = max_backups {
            self.apply_retention(max)?;
        }

        Ok(BackupMetadata {
            name: backup_name,
            created_at: now,
            size_bytes,
        })
    }

    /// List all backups, newest first
    pub fn list(&self) -> Result<Vec<BackupMetadata>> {
        let backups_dir = self.backups_dir();
        if !backups_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&backups_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("zip") {
                continue;
            }

            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();
            if !name.starts_with("tillbook-") {
                continue;
            }

            let metadata = fs::metadata(&path)?;
            backups.push(BackupMetadata {
                created_at: Self::parse_backup_time(&name),
                name,
                size_bytes: metadata.len(),
            });
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }

    /// Delete the oldest backups beyond `max`
    fn apply_retention(&self, max: usize) -> Result<()> {
        let backups = self.list()?;
        for stale in backups.iter().skip(max) {
            fs::remove_file(self.backups_dir().join(&stale.name))?;
        }
        Ok(())
    }

    /// Parse the timestamp embedded in a backup filename
    fn parse_backup_time(name: &str) -> chrono::DateTime<Utc> {
        name.strip_prefix("tillbook-")
            .and_then(|rest| rest.strip_suffix(".zip"))
            // Drop the -micros suffix
            .and_then(|rest| rest.rsplit_once('-').map(|(base, _)| base.to_string()))
            .and_then(|base| NaiveDateTime::parse_from_str(&base, "%Y-%m-%dT%H-%M-%S").ok())
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now)
    }
}
