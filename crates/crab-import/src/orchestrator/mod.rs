//! Import orchestrator - drives a whole directory import.
//!
//! Files are processed sequentially in lexical order. All destination tables
//! are created (and committed) before the first row is written, then every
//! file is imported into its table.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::core::catalog;
use crate::error::{ImportError, Result};
use crate::target::{create_table, Destination};
use crate::transfer::{ImportStats, TableImporter};

/// Width of the separator logged after each file.
const SEPARATOR_WIDTH: usize = 50;

/// Import orchestrator.
pub struct Orchestrator {
    config: Config,
    importer: TableImporter,
}

/// Result of a directory import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    /// Final status.
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the import started.
    pub started_at: DateTime<Utc>,

    /// When the import completed.
    pub completed_at: DateTime<Utc>,

    /// Source files imported.
    pub files_total: usize,

    /// Destination tables created or found, in creation order.
    pub tables: Vec<String>,

    /// Total rows written.
    pub rows_imported: u64,

    /// Average throughput (rows/second).
    pub rows_per_second: u64,

    /// Per-file statistics, in import order.
    pub files: Vec<ImportStats>,
}

impl ImportResult {
    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        let importer = TableImporter::new(&config.import);
        Self { config, importer }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Source files in `dir`, sorted lexically.
    pub fn scan(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        scan_files(dir, &self.config.import.extension)
    }

    /// Create every table, then import every file.
    pub async fn run<D>(&self, files: &[PathBuf], dest: &mut D) -> Result<ImportResult>
    where
        D: Destination + ?Sized,
    {
        let started_at = Utc::now();
        let start = Instant::now();

        let mut planned = Vec::with_capacity(files.len());
        for path in files {
            let key = table_key(path)
                .and_then(|key| catalog::resolve(&key).map(|_| key))
                .map_err(|e| ImportError::file(path.display().to_string(), e))?;
            planned.push((path, key));
        }

        let mut tables: Vec<String> = Vec::new();
        for (path, key) in &planned {
            self.create_table_for(key, dest, &mut tables)
                .await
                .map_err(|e| ImportError::file(path.display().to_string(), e))?;
        }

        let mut stats = Vec::with_capacity(planned.len());
        for (path, key) in &planned {
            stats.push(self.importer.import_file(path, key, dest).await?);
            info!("{}", "-".repeat(SEPARATOR_WIDTH));
        }

        let elapsed = start.elapsed();
        let rows_imported: u64 = stats.iter().map(|s| s.rows).sum();
        let rows_per_second = if elapsed.as_secs_f64() > 0.0 {
            (rows_imported as f64 / elapsed.as_secs_f64()) as u64
        } else {
            0
        };

        info!(
            "Imported {} rows from {} files in {:?}",
            rows_imported,
            stats.len(),
            elapsed
        );

        Ok(ImportResult {
            status: "completed".to_string(),
            duration_seconds: elapsed.as_secs_f64(),
            started_at,
            completed_at: Utc::now(),
            files_total: stats.len(),
            tables,
            rows_imported,
            rows_per_second,
            files: stats,
        })
    }

    async fn create_table_for<D>(
        &self,
        key: &str,
        dest: &mut D,
        created: &mut Vec<String>,
    ) -> Result<()>
    where
        D: Destination + ?Sized,
    {
        let table_name = catalog::resolve(key)?.pg_name();
        if created.contains(&table_name) {
            return Ok(());
        }
        let columns = self.importer.columns(key)?;
        create_table(dest, &table_name, &columns).await?;
        dest.commit().await?;
        info!("Created table {}", table_name);
        created.push(table_name);
        Ok(())
    }
}

/// Non-recursive scan for files with `extension` (case-insensitive), sorted.
///
/// # Errors
///
/// Returns [`ImportError::NoSourceFiles`] when nothing matches.
pub fn scan_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if !matches {
            continue;
        }
        if !path.is_file() {
            warn!("Skipping {}: not a regular file", path.display());
            continue;
        }
        files.push(path);
    }

    if files.is_empty() {
        return Err(ImportError::NoSourceFiles(dir.display().to_string()));
    }
    files.sort();
    Ok(files)
}

/// Catalog key of a source file: its lowercased file stem.
pub fn table_key(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| ImportError::UnknownTableKind(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::dbf::testing::build;
    use crate::target::testing::MemoryDestination;
    use std::fs;

    fn write_gemnm(dir: &Path, file_name: &str, rows: usize) {
        let ids: Vec<String> = (1..=rows).map(|i| i.to_string()).collect();
        let records: Vec<(bool, Vec<&str>)> = ids
            .iter()
            .map(|id| (false, vec![id.as_str(), "7", "Gent", "nl"]))
            .collect();
        let bytes = build(
            &[
                ("ID", b'N', 10, 0),
                ("GEMID", b'N', 10, 0),
                ("GEMNM", b'C', 40, 0),
                ("TAALCODE", b'C', 2, 0),
            ],
            &records,
        );
        fs::write(dir.join(file_name), bytes).unwrap();
    }

    #[test]
    fn test_table_key() {
        assert_eq!(table_key(Path::new("/data/GEMNM.DBF")).unwrap(), "gemnm");
        assert_eq!(table_key(Path::new("straatnm.dbf")).unwrap(), "straatnm");
    }

    #[test]
    fn test_scan_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.dbf"), b"").unwrap();
        fs::write(dir.path().join("A.DBF"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("nested.dbf")).unwrap();

        let files = scan_files(dir.path(), "dbf").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A.DBF", "b.dbf"]);
    }

    #[test]
    fn test_scan_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_files(dir.path(), "dbf").unwrap_err();
        assert!(matches!(err, ImportError::NoSourceFiles(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_creates_all_tables_before_importing() {
        let dir = tempfile::tempdir().unwrap();
        write_gemnm(dir.path(), "gemnm.dbf", 3);

        let orchestrator = Orchestrator::new(Config::default());
        let files = orchestrator.scan(dir.path()).unwrap();
        let mut dest = MemoryDestination::default();
        let result = orchestrator.run(&files, &mut dest).await.unwrap();

        assert_eq!(result.files_total, 1);
        assert_eq!(result.rows_imported, 3);
        assert_eq!(result.tables, vec!["gemeente_naam"]);
        assert!(dest.statements[0].starts_with("CREATE TABLE IF NOT EXISTS gemeente_naam (id int not null"));
        assert!(dest.statements[1].starts_with("INSERT INTO gemeente_naam"));
        assert_eq!(dest.committed.len(), 3);

        let json = result.to_json().unwrap();
        assert!(json.contains("\"rows_imported\": 3"));
    }

    #[tokio::test]
    async fn test_unknown_file_kind_fails_before_ddl() {
        let dir = tempfile::tempdir().unwrap();
        write_gemnm(dir.path(), "gemnm.dbf", 1);
        fs::write(dir.path().join("zzz.dbf"), b"").unwrap();

        let orchestrator = Orchestrator::new(Config::default());
        let files = orchestrator.scan(dir.path()).unwrap();
        let mut dest = MemoryDestination::default();
        let err = orchestrator.run(&files, &mut dest).await.unwrap_err();

        match err {
            ImportError::File { path, source } => {
                assert!(path.ends_with("zzz.dbf"));
                assert!(matches!(*source, ImportError::UnknownTableKind(ref k) if k == "zzz"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(dest.statements.is_empty());
    }
}
