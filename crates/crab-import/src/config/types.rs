//! Configuration type definitions.
//!
//! Every field has a default, so an empty YAML document (or no file at all)
//! yields a working configuration pointing at a local `crab` database.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target database configuration (PostgreSQL).
    #[serde(default)]
    pub target: TargetConfig,

    /// Import behavior configuration.
    #[serde(default)]
    pub import: ImportConfig,
}

/// Target database (PostgreSQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database host (default: "localhost").
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name (default: "crab").
    #[serde(default = "default_crab")]
    pub database: String,

    /// Username (default: "crab").
    #[serde(default = "default_crab")]
    pub user: String,

    /// Password (default: "crab").
    #[serde(default = "default_crab")]
    pub password: String,

    /// Schema tables are created in, via `search_path` (default: "public").
    #[serde(default = "default_public_schema")]
    pub schema: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_pg_port(),
            database: default_crab(),
            user: default_crab(),
            password: default_crab(),
            schema: default_public_schema(),
        }
    }
}

impl std::fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("schema", &self.schema)
            .finish()
    }
}

/// Import behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Rows per committed batch (default: 1024).
    #[serde(default = "default_commit_threshold")]
    pub commit_threshold: usize,

    /// Append the validity/provenance metadata columns (default: false).
    #[serde(default)]
    pub with_metadata: bool,

    /// Source file extension, matched case-insensitively (default: "dbf").
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            commit_threshold: default_commit_threshold(),
            with_metadata: false,
            extension: default_extension(),
        }
    }
}

// Default value functions for serde
fn default_host() -> String {
    "localhost".to_string()
}

fn default_pg_port() -> u16 {
    5432
}

fn default_crab() -> String {
    "crab".to_string()
}

fn default_public_schema() -> String {
    "public".to_string()
}

fn default_commit_threshold() -> usize {
    1024
}

fn default_extension() -> String {
    "dbf".to_string()
}
