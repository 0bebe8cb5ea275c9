//! Destination schema types: columns and tables.
//!
//! These are immutable value objects built once from the catalog and shared
//! read-only by every file processed in a run.

use serde::Serialize;

use super::identifier::pg_name;
use super::value::SqlNullType;

/// Logical SQL type of a destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlType {
    Date,
    Timestamp,
    Float,
    Integer,
    SmallInt,
    Varchar,
}

impl SqlType {
    /// Type hint used when binding a NULL for this type.
    #[must_use]
    pub fn null_type(self) -> SqlNullType {
        match self {
            SqlType::Date => SqlNullType::Date,
            SqlType::Timestamp => SqlNullType::DateTime,
            SqlType::Float => SqlNullType::F32,
            SqlType::Integer => SqlNullType::I32,
            SqlType::SmallInt => SqlNullType::I16,
            SqlType::Varchar => SqlNullType::String,
        }
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Column {
    /// Registry name, also the source field name.
    pub name: &'static str,

    /// Logical SQL type.
    pub sql_type: SqlType,

    /// Declared length; only meaningful for varchar.
    pub length: Option<u32>,

    /// Whether the column allows NULL.
    pub nullable: bool,
}

impl Column {
    /// A fixed-width, non-null column.
    pub const fn fixed(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            length: None,
            nullable: false,
        }
    }

    /// A non-null column with a declared length.
    pub const fn variable(name: &'static str, sql_type: SqlType, length: u32) -> Self {
        Self {
            name,
            sql_type,
            length: Some(length),
            nullable: false,
        }
    }

    /// The same column, allowing NULL.
    pub const fn with_nulls(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    /// Rendered destination column name.
    pub fn pg_name(&self) -> String {
        pg_name(self.name)
    }

    /// DDL type fragment including the null constraint, e.g. `varchar(40) null`.
    pub fn type_string(&self) -> String {
        let base = match self.sql_type {
            SqlType::Date => "date".to_string(),
            SqlType::Timestamp => "timestamp".to_string(),
            SqlType::Float => "real".to_string(),
            SqlType::Integer => "int".to_string(),
            SqlType::SmallInt => "smallint".to_string(),
            SqlType::Varchar => match self.length {
                Some(length) => format!("varchar({})", length),
                None => "varchar".to_string(),
            },
        };
        let null = if self.nullable { " null" } else { " not null" };
        base + null
    }
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Registry name (mixed case).
    pub name: &'static str,

    /// Entity columns in registry order, without identity or metadata columns.
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: &'static str, columns: Vec<Column>) -> Self {
        Self { name, columns }
    }

    /// Rendered destination table name.
    pub fn pg_name(&self) -> String {
        pg_name(self.name)
    }
}
