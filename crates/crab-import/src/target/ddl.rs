//! Table creation.

use tracing::debug;

use super::Destination;
use crate::core::Column;
use crate::error::Result;

/// Build `CREATE TABLE IF NOT EXISTS` for a rendered table name.
///
/// Column names go through [`crate::core::pg_name`]. An existing table is
/// left untouched and never compared against the column list.
pub fn create_table_sql(table_name: &str, columns: &[Column]) -> String {
    let cols = columns
        .iter()
        .map(|c| format!("{} {}", c.pg_name(), c.type_string()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {} ({})", table_name, cols)
}

/// Issue the DDL for one table inside the destination's open transaction.
pub async fn create_table<D>(dest: &mut D, table_name: &str, columns: &[Column]) -> Result<()>
where
    D: Destination + ?Sized,
{
    let sql = create_table_sql(table_name, columns);
    debug!("{}", sql);
    dest.execute(&sql).await
}
