//! Value types flowing through the import pipeline.
//!
//! [`Value`] is what the source reader decodes for one field of one record.
//! [`SqlValue`] is the typed statement parameter a column mapper produces from
//! it. NULL parameters carry a [`SqlNullType`] so they stay typed as their
//! destination column.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// A single decoded source field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Character data, trailing padding removed.
    Character(String),

    /// Numeric or floating data with arbitrary precision.
    Numeric(Decimal),

    /// Calendar date.
    Date(NaiveDate),

    /// Logical (boolean) data.
    Logical(bool),

    /// Blank or explicitly unknown field.
    Null,
}

impl Value {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the active variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Character(_) => "character",
            Value::Numeric(_) => "numeric",
            Value::Date(_) => "date",
            Value::Logical(_) => "logical",
            Value::Null => "null",
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Character(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Character(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Numeric(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Numeric(Decimal::from(v))
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Logical(v)
    }
}

/// Type hint for NULL parameters so they bind as the column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlNullType {
    I16,
    I32,
    F32,
    String,
    Date,
    DateTime,
}

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL with type hint.
    Null(SqlNullType),

    /// 16-bit signed integer (smallint).
    I16(i16),

    /// 32-bit signed integer (int).
    I32(i32),

    /// 32-bit floating point (real).
    F32(f32),

    /// Text data.
    String(String),

    /// Date without time component.
    Date(NaiveDate),

    /// Timestamp without timezone, normalized to UTC.
    DateTime(NaiveDateTime),
}

impl SqlValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null(_))
    }

    /// Get the SqlNullType for this value.
    #[must_use]
    pub fn null_type(&self) -> SqlNullType {
        match self {
            SqlValue::Null(t) => *t,
            SqlValue::I16(_) => SqlNullType::I16,
            SqlValue::I32(_) => SqlNullType::I32,
            SqlValue::F32(_) => SqlNullType::F32,
            SqlValue::String(_) => SqlNullType::String,
            SqlValue::Date(_) => SqlNullType::Date,
            SqlValue::DateTime(_) => SqlNullType::DateTime,
        }
    }
}

/// One fully bound insert row, in resolved column order.
pub type Row = Vec<SqlValue>;
