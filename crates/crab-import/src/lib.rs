//! # crab-import
//!
//! Loads CRAB address registry exports (dBase `.dbf` files) into PostgreSQL.
//!
//! Every source file kind maps to one strongly typed table from a static
//! catalog. Records are converted column by column into typed statement
//! parameters and written in committed batches:
//!
//! - **Catalog** of the 20 CRAB file kinds, with optional validity metadata
//! - **Typed conversion** including Brussels-time timestamps and typed NULLs
//! - **Batched commits** with a configurable threshold
//! - **Progress reporting** at most once per second
//!
//! ## Example
//!
//! ```rust,no_run
//! use crab_import::{Config, ImportResult, Orchestrator, PgDestination};
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> crab_import::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config);
//!     let files = orchestrator.scan(Path::new("/data/crab"))?;
//!     let mut dest = PgDestination::connect(&orchestrator.config().target).await?;
//!     let result: ImportResult = orchestrator.run(&files, &mut dest).await?;
//!     println!("Imported {} rows", result.rows_imported);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod source;
pub mod target;
pub mod transfer;
pub mod typemap;

// Re-exports for convenient access
pub use config::{Config, ImportConfig, TargetConfig};
pub use error::{ImportError, Result};
pub use orchestrator::{ImportResult, Orchestrator};
pub use source::{DbfReader, Record};
pub use target::{Destination, PgDestination};
pub use transfer::{ImportStats, TableImporter};
