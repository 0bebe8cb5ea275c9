//! End-to-end import tests against an in-memory destination.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use crab_import::core::{Row, SqlNullType, SqlValue};
use crab_import::{Config, Destination, ImportError, Orchestrator, Result};
use std::path::Path;

#[derive(Default)]
struct CapturingDestination {
    statements: Vec<String>,
    pending: Vec<Row>,
    committed: Vec<Row>,
    commits: usize,
}

#[async_trait]
impl Destination for CapturingDestination {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.statements.push(sql.to_string());
        Ok(())
    }

    async fn execute_batch(&mut self, sql: &str, rows: &[Row]) -> Result<u64> {
        self.statements.push(sql.to_string());
        self.pending.extend_from_slice(rows);
        Ok(rows.len() as u64)
    }

    async fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        self.committed.append(&mut self.pending);
        Ok(())
    }
}

/// Minimal dBase III writer: `(name, type, length)` fields, space padded values.
fn write_dbf(path: &Path, fields: &[(&str, u8, u8)], records: &[Vec<&str>]) {
    let header_length = 32 + 32 * fields.len() + 1;
    let record_length = 1 + fields.iter().map(|f| f.2 as usize).sum::<usize>();

    let mut out = vec![0x03, 124, 1, 1];
    out.extend_from_slice(&(records.len() as u32).to_le_bytes());
    out.extend_from_slice(&(header_length as u16).to_le_bytes());
    out.extend_from_slice(&(record_length as u16).to_le_bytes());
    out.extend_from_slice(&[0u8; 20]);
    for (name, code, length) in fields {
        let mut descriptor = [0u8; 32];
        descriptor[..name.len()].copy_from_slice(name.as_bytes());
        descriptor[11] = *code;
        descriptor[16] = *length;
        out.extend_from_slice(&descriptor);
    }
    out.push(0x0D);
    for record in records {
        out.push(b' ');
        for ((_, _, length), value) in fields.iter().zip(record) {
            let mut cell = value.as_bytes().to_vec();
            cell.resize(*length as usize, b' ');
            out.extend_from_slice(&cell);
        }
    }
    out.push(0x1A);
    std::fs::write(path, out).unwrap();
}

fn gem_fields() -> Vec<(&'static str, u8, u8)> {
    vec![
        ("ID", b'N', 10),
        ("NISGEMCODE", b'N', 5),
        ("TAALCODE", b'C', 2),
        ("TAALCODE2", b'C', 2),
        ("BEGINDATUM", b'D', 8),
        ("EINDDATUM", b'D', 8),
        ("BEGINTIJD", b'C', 15),
        ("BEGINBEW", b'N', 4),
        ("BEGINORG", b'N', 4),
    ]
}

#[tokio::test]
async fn imports_directory_with_metadata() {
    let dir = tempfile::tempdir().unwrap();
    write_dbf(
        &dir.path().join("GEM.DBF"),
        &gem_fields(),
        &[
            vec!["1", "44021", "nl", "", "20020101", "", "20230615 143000", "1", "3"],
            vec!["2", "21004", "fr", "nl", "19980101", "20101231", "20040101T000000", "2", "1"],
        ],
    );

    let mut config = Config::default();
    config.import.with_metadata = true;
    let orchestrator = Orchestrator::new(config);
    let files = orchestrator.scan(dir.path()).unwrap();
    let mut dest = CapturingDestination::default();
    let result = orchestrator.run(&files, &mut dest).await.unwrap();

    assert_eq!(result.rows_imported, 2);
    assert_eq!(result.tables, vec!["gemeente"]);
    assert!(dest.statements[0].contains("begintijd timestamp not null"));
    assert_eq!(
        dest.statements[1],
        "INSERT INTO gemeente (id, nisgemcode, taalcode, taalcode2, begindatum, einddatum, \
         begintijd, beginbew, beginorg) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
    );

    let first = &dest.committed[0];
    assert_eq!(first[3], SqlValue::Null(SqlNullType::String));
    assert_eq!(first[5], SqlValue::Null(SqlNullType::Date));
    assert_eq!(
        first[6],
        SqlValue::DateTime(
            NaiveDateTime::parse_from_str("2023-06-15 12:30:00", "%Y-%m-%d %H:%M:%S").unwrap()
        )
    );
    assert_eq!(first[7], SqlValue::I16(1));

    let second = &dest.committed[1];
    assert_eq!(
        second[5],
        SqlValue::Date(NaiveDate::from_ymd_opt(2010, 12, 31).unwrap())
    );
    assert_eq!(
        second[6],
        SqlValue::DateTime(
            NaiveDateTime::parse_from_str("2003-12-31 23:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
        )
    );
}

#[tokio::test]
async fn imports_files_in_lexical_order() {
    let dir = tempfile::tempdir().unwrap();
    write_dbf(
        &dir.path().join("kadgem.dbf"),
        &[("ID", b'N', 10), ("KADGEMCODE", b'N', 6)],
        &[vec!["1", "11001"]],
    );
    write_dbf(
        &dir.path().join("gemnm.dbf"),
        &[("ID", b'N', 10), ("GEMID", b'N', 10), ("GEMNM", b'C', 40), ("TAALCODE", b'C', 2)],
        &[vec!["1", "7", "Sint-Niklaas", "nl"]],
    );

    let orchestrator = Orchestrator::new(Config::default());
    let files = orchestrator.scan(dir.path()).unwrap();
    let mut dest = CapturingDestination::default();
    let result = orchestrator.run(&files, &mut dest).await.unwrap();

    assert_eq!(result.tables, vec!["gemeente_naam", "kad_gemeente"]);
    assert!(dest.statements[0].starts_with("CREATE TABLE IF NOT EXISTS gemeente_naam"));
    assert!(dest.statements[1].starts_with("CREATE TABLE IF NOT EXISTS kad_gemeente"));
    assert!(dest.statements[2].starts_with("INSERT INTO gemeente_naam"));
    assert!(dest.statements[3].starts_with("INSERT INTO kad_gemeente"));
    assert_eq!(dest.committed[0][2], SqlValue::String("Sint-Niklaas".into()));
}

#[tokio::test]
async fn conversion_error_names_file_and_record() {
    let dir = tempfile::tempdir().unwrap();
    write_dbf(
        &dir.path().join("kadgem.dbf"),
        &[("ID", b'N', 10), ("KADGEMCODE", b'C', 6)],
        &[vec!["1", "11001"]],
    );

    let orchestrator = Orchestrator::new(Config::default());
    let files = orchestrator.scan(dir.path()).unwrap();
    let mut dest = CapturingDestination::default();
    let err = orchestrator.run(&files, &mut dest).await.unwrap_err();

    let detailed = err.format_detailed();
    assert!(detailed.contains("kadgem.dbf"));
    assert!(detailed.contains("Record 1"));
    assert!(detailed.contains("KADGEMCODE expects numeric, got character"));
    assert!(matches!(err, ImportError::File { .. }));
    assert!(dest.committed.is_empty());
}
