//! Per-column conversion from decoded source values to statement parameters.
//!
//! [`build_mappers`] runs once per table and picks one [`Strategy`] per
//! column. Each [`ColumnMapper`] then converts every record's value for that
//! column. The per-type decision is made once, not per value.
//!
//! Every successful conversion yields exactly one [`SqlValue`], so a row
//! built by applying the mappers in order always has one parameter per
//! column.

use chrono::{Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::core::{Column, SqlType, SqlValue, Value};
use crate::error::{ImportError, Result};

/// Zone the upstream producer writes wall-clock timestamps in.
pub const REFERENCE_ZONE: Tz = chrono_tz::Europe::Brussels;

/// Offset of the `HHMMSS` segment in `YYYYMMDD?HHMMSS`.
pub const TIME_OFFSET: usize = 9;

/// Conversion strategy for one logical SQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Date,
    Float,
    Integer,
    SmallInt,
    Timestamp,
    Varchar,
}

impl Strategy {
    /// Strategy lookup by column type.
    pub fn for_type(sql_type: SqlType) -> Self {
        match sql_type {
            SqlType::Date => Strategy::Date,
            SqlType::Float => Strategy::Float,
            SqlType::Integer => Strategy::Integer,
            SqlType::SmallInt => Strategy::SmallInt,
            SqlType::Timestamp => Strategy::Timestamp,
            SqlType::Varchar => Strategy::Varchar,
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Strategy::Date => "date",
            Strategy::Float | Strategy::Integer | Strategy::SmallInt => "numeric",
            Strategy::Timestamp | Strategy::Varchar => "character",
        }
    }

    /// Convert a non-null value.
    fn convert(self, column: &str, value: &Value) -> Result<SqlValue> {
        match (self, value) {
            (Strategy::Date, Value::Date(d)) => Ok(SqlValue::Date(*d)),
            (Strategy::Float, Value::Numeric(n)) => n
                .to_f32()
                .map(SqlValue::F32)
                .ok_or_else(|| out_of_range(column, n, "real")),
            (Strategy::Integer, Value::Numeric(n)) => n
                .trunc()
                .to_i32()
                .map(SqlValue::I32)
                .ok_or_else(|| out_of_range(column, n, "int")),
            (Strategy::SmallInt, Value::Numeric(n)) => n
                .trunc()
                .to_i16()
                .map(SqlValue::I16)
                .ok_or_else(|| out_of_range(column, n, "smallint")),
            (Strategy::Timestamp, Value::Character(s)) => parse_timestamp(s)
                .map(SqlValue::DateTime)
                .map_err(|message| ImportError::InvalidTimestamp {
                    column: column.to_string(),
                    value: s.clone(),
                    message,
                }),
            (Strategy::Varchar, Value::Character(s)) => Ok(SqlValue::String(s.clone())),
            (strategy, other) => Err(ImportError::mismatch(
                column,
                strategy.expected(),
                other.kind(),
            )),
        }
    }
}

fn out_of_range(column: &str, value: &Decimal, target: &'static str) -> ImportError {
    ImportError::NumericOutOfRange {
        column: column.to_string(),
        value: value.to_string(),
        target,
    }
}

/// Converter for one column, bound to its 1-based parameter position.
#[derive(Debug, Clone)]
pub struct ColumnMapper {
    index: usize,
    column: Column,
    strategy: Strategy,
}

impl ColumnMapper {
    /// 1-based statement parameter index.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn column(&self) -> &Column {
        &self.column
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Convert one source value into the parameter for this column.
    ///
    /// Nullable columns bind NULL typed as the column type. A NULL reaching
    /// a non-nullable column is a kind mismatch.
    pub fn convert(&self, value: &Value) -> Result<SqlValue> {
        if self.column.nullable && value.is_null() {
            return Ok(SqlValue::Null(self.column.sql_type.null_type()));
        }
        self.strategy.convert(self.column.name, value)
    }
}

/// Build the converters for a resolved column list, aligned 1:1 with it.
///
/// # Errors
///
/// Returns [`ImportError::UnexpectedSqlType`] for a column the dispatch
/// cannot bind: a varchar without a positive length.
pub fn build_mappers(columns: &[Column]) -> Result<Vec<ColumnMapper>> {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            if column.sql_type == SqlType::Varchar && !matches!(column.length, Some(n) if n > 0) {
                return Err(ImportError::UnexpectedSqlType {
                    column: column.name.to_string(),
                    message: "varchar column without a positive length".to_string(),
                });
            }
            Ok(ColumnMapper {
                index: i + 1,
                column: column.clone(),
                strategy: Strategy::for_type(column.sql_type),
            })
        })
        .collect()
}

/// Length of the compact `YYYYMMDDHHMMSS` form, which has no separator.
const COMPACT_LEN: usize = 14;

/// Parse `YYYYMMDD?HHMMSS` as Brussels wall-clock time and return it in UTC.
///
/// The compact 14-digit form without separator is accepted as well; its
/// time segment starts right after the date.
///
/// An ambiguous local time (autumn DST fold) resolves to the earlier
/// instant. A local time inside the spring DST gap is moved forward by one
/// hour, the length of the Brussels gap.
pub fn parse_timestamp(s: &str) -> std::result::Result<NaiveDateTime, String> {
    if !s.is_ascii() || s.len() < COMPACT_LEN {
        return Err(format!("expected at least {} ASCII characters", COMPACT_LEN));
    }
    let time_at = if s.len() == COMPACT_LEN { 8 } else { TIME_OFFSET };

    let field = |from: usize, to: usize| -> std::result::Result<u32, String> {
        let part = &s[from..to];
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("non-digit in {:?}", part));
        }
        part.parse::<u32>().map_err(|e| e.to_string())
    };

    let year = field(0, 4)? as i32;
    let month = field(4, 6)?;
    let day = field(6, 8)?;
    let hour = field(time_at, time_at + 2)?;
    let minute = field(time_at + 2, time_at + 4)?;
    let second = field(time_at + 4, time_at + 6)?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or("invalid calendar date")?;
    let time = NaiveTime::from_hms_opt(hour, minute, second).ok_or("invalid time of day")?;
    let local = NaiveDateTime::new(date, time);

    let zoned = match REFERENCE_ZONE.from_local_datetime(&local) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earlier, _) => earlier,
        LocalResult::None => REFERENCE_ZONE
            .from_local_datetime(&(local + Duration::hours(1)))
            .earliest()
            .ok_or("local time does not exist in reference zone")?,
    };

    Ok(zoned.naive_utc())
}
