//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the LedgerStore port
//! - Argon2id for the CredentialVerifier port

pub mod argon2;
pub mod duckdb;
