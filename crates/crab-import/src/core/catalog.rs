//! Schema registry for CRAB source files.
//!
//! Maps the short source-file key (the `.dbf` file stem, e.g. `gem`,
//! `huisnr`) to the destination [`Table`]. The catalog is a literal built
//! once on first use and never mutated afterwards.
//!
//! Resolved column order is always: the identity column, the entity columns
//! in registry order, then the metadata columns when requested. The same
//! order drives both `CREATE TABLE` and the positional insert parameters.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{ImportError, Result};

use super::schema::{Column, Table};

use super::schema::SqlType::{Date, Float, Integer, SmallInt, Timestamp, Varchar};

/// Identity column prepended to every table.
pub const ID: Column = Column::fixed("ID", Integer);

/// Validity period and provenance columns appended in metadata mode.
pub const METADATA: [Column; 5] = [
    Column::fixed("BEGINDATUM", Date),
    Column::fixed("EINDDATUM", Date).with_nulls(),
    Column::fixed("BEGINTIJD", Timestamp),
    Column::fixed("BEGINBEW", SmallInt),
    Column::fixed("BEGINORG", SmallInt),
];

static CATALOG: LazyLock<HashMap<&'static str, Table>> = LazyLock::new(build_catalog);

fn build_catalog() -> HashMap<&'static str, Table> {
    let entries = [
        (
            "gem",
            Table::new(
                "Gemeente",
                vec![
                    Column::fixed("NISGEMCODE", Integer),
                    Column::variable("TAALCODE", Varchar, 2),
                    Column::variable("TAALCODE2", Varchar, 2).with_nulls(),
                ],
            ),
        ),
        (
            "gemnm",
            Table::new(
                "GemeenteNaam",
                vec![
                    Column::fixed("GEMID", Integer),
                    Column::variable("GEMNM", Varchar, 40),
                    Column::variable("TAALCODE", Varchar, 2),
                ],
            ),
        ),
        (
            "huisnr",
            Table::new(
                "HuisNummer",
                vec![
                    Column::fixed("STRAATNMID", Integer),
                    Column::variable("HUISNR", Varchar, 11),
                    Column::variable("HUISNRID0", Varchar, 37),
                ],
            ),
        ),
        (
            "kadgem",
            Table::new("KadGemeente", vec![Column::fixed("KADGEMCODE", Integer)]),
        ),
        (
            "kadggem",
            Table::new(
                "KadGemeenteGemeente",
                vec![
                    Column::fixed("KADGEMID", Integer),
                    Column::fixed("GEMID", Integer),
                ],
            ),
        ),
        (
            "kadgnm",
            Table::new(
                "KadGemeenteNaam",
                vec![
                    Column::fixed("KADGEMID", Integer),
                    Column::variable("KADGEMNM", Varchar, 80),
                    Column::variable("TAALCODE", Varchar, 2),
                ],
            ),
        ),
        (
            "pkancode",
            Table::new(
                "PostKantonCode",
                vec![
                    Column::fixed("HUISNRID", Integer),
                    Column::fixed("PKANCODE", SmallInt),
                ],
            ),
        ),
        (
            "postkan",
            Table::new("PostKanton", vec![Column::fixed("PKANCODE", SmallInt)]),
        ),
        (
            "postknm",
            Table::new(
                "PostKantonNaam",
                vec![
                    Column::fixed("POSTKANID", Integer),
                    Column::variable("POSTKANNM", Varchar, 254),
                    Column::variable("TAALCODE", Varchar, 2),
                ],
            ),
        ),
        (
            "sstrstrn",
            Table::new(
                "SubStraatStraatNaam",
                vec![
                    Column::fixed("SUBSTRID", Integer),
                    Column::fixed("STRAATNMID", Integer),
                ],
            ),
        ),
        (
            "straatnm",
            Table::new(
                "StraatNaam",
                vec![
                    Column::fixed("NISGEMCODE", Integer),
                    Column::variable("STRAATNM", Varchar, 80),
                    Column::variable("TAALCODE", Varchar, 2),
                    Column::variable("STRAATNM2", Varchar, 80).with_nulls(),
                    Column::variable("TAALCODE2", Varchar, 2).with_nulls(),
                    Column::variable("STRAATNM0", Varchar, 80),
                ],
            ),
        ),
        (
            "strkant",
            Table::new(
                "StraatKant",
                vec![
                    Column::fixed("STRAATNMID", Integer),
                    Column::fixed("WEGOBJID", Integer),
                    Column::fixed("KANT", SmallInt),
                    Column::fixed("BEGINPOS", Float),
                    Column::fixed("EINDPOS", Float).with_nulls(),
                    Column::fixed("PARITEIT", SmallInt).with_nulls(),
                    Column::variable("EERSTEHNR", Varchar, 20).with_nulls(),
                    Column::variable("LAATSTEHNR", Varchar, 20).with_nulls(),
                ],
            ),
        ),
        (
            "subadres",
            Table::new(
                "SubAdres",
                vec![
                    Column::fixed("HUISNRID", Integer),
                    Column::variable("SUBADR", Varchar, 35).with_nulls(),
                    Column::fixed("AARD", SmallInt),
                ],
            ),
        ),
        (
            "subkan",
            Table::new(
                "SubKanton",
                vec![
                    Column::fixed("POSTKANID", Integer),
                    Column::fixed("SUBKANNR", SmallInt),
                ],
            ),
        ),
        (
            "subkgem",
            Table::new(
                "SubKantonGemeente",
                vec![
                    Column::fixed("SUBKANID", Integer),
                    Column::fixed("GEMID", Integer),
                ],
            ),
        ),
        (
            "substr",
            Table::new(
                "SubStraat",
                vec![
                    Column::variable("STRAATCODE", Varchar, 4),
                    Column::fixed("SUBKANCODE", SmallInt),
                ],
            ),
        ),
        (
            "substrnm",
            Table::new(
                "SubStraatNaam",
                vec![
                    Column::fixed("SUBSTRID", Integer),
                    Column::variable("SUBSTRNM", Varchar, 80),
                    Column::variable("TAALCODE", Varchar, 2),
                ],
            ),
        ),
        (
            "terrobj",
            Table::new(
                "TerreinObject",
                vec![
                    Column::variable("OBJID", Varchar, 21),
                    Column::fixed("AARD", SmallInt),
                    Column::fixed("X", Float).with_nulls(),
                    Column::fixed("Y", Float).with_nulls(),
                    Column::fixed("KADGEMCODE", Integer).with_nulls(),
                ],
            ),
        ),
        (
            "tobjhnr",
            Table::new(
                "TerreinObjectHuisNummer",
                vec![
                    Column::fixed("TERROBJID", Integer),
                    Column::fixed("HUISNRID", Integer),
                ],
            ),
        ),
        (
            "wegobj",
            Table::new(
                "WegObject",
                vec![
                    Column::variable("OBJID", Varchar, 21),
                    Column::fixed("AARD", SmallInt),
                ],
            ),
        ),
    ];

    entries.into_iter().collect()
}

/// Look up the table for a source-file key.
///
/// # Errors
///
/// Returns [`ImportError::UnknownTableKind`] when the key is not in the catalog.
pub fn resolve(key: &str) -> Result<&'static Table> {
    CATALOG
        .get(key)
        .ok_or_else(|| ImportError::UnknownTableKind(key.to_string()))
}

/// Resolved column list for a source-file key, in binding order.
pub fn columns_for(key: &str, include_metadata: bool) -> Result<Vec<Column>> {
    let table = resolve(key)?;
    let extra = if include_metadata { METADATA.len() } else { 0 };

    let mut columns = Vec::with_capacity(1 + table.columns.len() + extra);
    columns.push(ID);
    columns.extend(table.columns.iter().cloned());
    if include_metadata {
        columns.extend(METADATA);
    }
    Ok(columns)
}

/// All registered keys, sorted.
pub fn keys() -> Vec<&'static str> {
    let mut keys: Vec<_> = CATALOG.keys().copied().collect();
    keys.sort_unstable();
    keys
}
