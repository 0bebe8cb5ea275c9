//! Batched record import.
//!
//! A [`TableImporter`] streams the records of one source file through the
//! column converters and writes them in batches of `commit_threshold` rows,
//! committing after every batch. Batches already committed stay in the
//! database when a later record fails.

pub mod progress;

use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::config::ImportConfig;
use crate::core::{catalog, Column, Row};
use crate::error::{ImportError, Result};
use crate::source::{DbfReader, Record};
use crate::target::Destination;
use crate::typemap::{build_mappers, ColumnMapper};

pub use progress::{Clock, ProgressMonitor, SystemClock};

/// Statistics for one imported file.
#[derive(Debug, Clone, Serialize)]
pub struct ImportStats {
    /// Rendered destination table name.
    pub table: String,

    /// Rows written.
    pub rows: u64,

    /// Batches executed and committed.
    pub flushes: u64,

    /// Wall time for the file.
    #[serde(rename = "duration_seconds", serialize_with = "as_secs_f64")]
    pub duration: Duration,
}

fn as_secs_f64<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Imports source files into their catalog tables.
#[derive(Debug, Clone)]
pub struct TableImporter {
    commit_threshold: usize,
    with_metadata: bool,
}

impl TableImporter {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            commit_threshold: config.commit_threshold.max(1),
            with_metadata: config.with_metadata,
        }
    }

    /// Resolved destination columns for a source-file key.
    pub fn columns(&self, key: &str) -> Result<Vec<Column>> {
        catalog::columns_for(key, self.with_metadata)
    }

    /// Import one `.dbf` file. Errors carry the file path.
    pub async fn import_file<D>(&self, path: &Path, key: &str, dest: &mut D) -> Result<ImportStats>
    where
        D: Destination + ?Sized,
    {
        let label = path.display().to_string();
        let result = match DbfReader::open(path) {
            Ok(reader) => {
                info!("Importing {}", label);
                self.import_reader(key, reader, dest).await
            }
            Err(e) => Err(e),
        };
        result.map_err(|e| ImportError::file(label, e))
    }

    /// Import all live records of an open reader.
    pub async fn import_reader<R, D>(
        &self,
        key: &str,
        reader: DbfReader<R>,
        dest: &mut D,
    ) -> Result<ImportStats>
    where
        R: Read,
        D: Destination + ?Sized,
    {
        let start = Instant::now();
        let table_name = catalog::resolve(key)?.pg_name();
        let columns = self.columns(key)?;
        let mappers = build_mappers(&columns)?;

        if let Some(missing) = columns.iter().find(|c| !reader.header().has_field(c.name)) {
            return Err(ImportError::MissingField(missing.name.to_string()));
        }

        let sql = insert_sql(&table_name, &mappers);
        debug!("{}", sql);

        let mut batch: Vec<Row> = Vec::with_capacity(self.commit_threshold);
        let mut progress = ProgressMonitor::new();
        let mut ordinal: u64 = 0;
        let mut flushes: u64 = 0;

        for record in reader {
            ordinal += 1;
            let row = record
                .and_then(|r| convert_record(&mappers, &r))
                .map_err(|e| ImportError::record(ordinal, e))?;
            batch.push(row);
            progress.record_one();

            if batch.len() >= self.commit_threshold {
                flush(dest, &sql, &mut batch).await?;
                flushes += 1;
            }
        }

        if !batch.is_empty() {
            flush(dest, &sql, &mut batch).await?;
            flushes += 1;
        }
        dest.commit().await?;
        progress.flush_print();

        let stats = ImportStats {
            table: table_name,
            rows: progress.total(),
            flushes,
            duration: start.elapsed(),
        };
        info!(
            "{}: imported {} rows in {:?} ({} batches)",
            stats.table, stats.rows, stats.duration, stats.flushes
        );
        Ok(stats)
    }
}

/// `INSERT INTO <table> (<c1>, ...) VALUES ($1, ...)` in mapper order.
pub fn insert_sql(table_name: &str, mappers: &[ColumnMapper]) -> String {
    let cols = mappers
        .iter()
        .map(|m| m.column().pg_name())
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = mappers
        .iter()
        .map(|m| format!("${}", m.index()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {} ({}) VALUES ({})", table_name, cols, placeholders)
}

fn convert_record(mappers: &[ColumnMapper], record: &Record) -> Result<Row> {
    mappers
        .iter()
        .map(|m| m.convert(record.get(m.column().name)?))
        .collect()
}

async fn flush<D>(dest: &mut D, sql: &str, batch: &mut Vec<Row>) -> Result<()>
where
    D: Destination + ?Sized,
{
    let written = dest.execute_batch(sql, batch).await?;
    dest.commit().await?;
    debug!("Committed batch of {} rows", written);
    batch.clear();
    Ok(())
}
