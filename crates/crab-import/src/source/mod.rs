//! Source file reading.
//!
//! CRAB exports are dBase III files, one per entity kind. [`DbfReader`]
//! exposes the header and iterates records lazily as
//! `Iterator<Item = Result<Record>>`.

pub mod dbf;

pub use dbf::{DbfHeader, DbfReader, FieldDescriptor, FieldType, Record};
