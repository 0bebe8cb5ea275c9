//! Core schema model for the import pipeline.
//!
//! - [`value`]: decoded source values and typed statement parameters
//! - [`schema`]: column and table metadata
//! - [`identifier`]: destination identifier rendering
//! - [`catalog`]: the static source-file registry

pub mod catalog;
pub mod identifier;
pub mod schema;
pub mod value;

pub use identifier::pg_name;
pub use schema::{Column, SqlType, Table};
pub use value::{Row, SqlNullType, SqlValue, Value};
