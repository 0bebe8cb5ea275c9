//! PostgreSQL destination.

mod ddl;

pub use ddl::{create_table, create_table_sql};

use async_trait::async_trait;
use bytes::BytesMut;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use futures::future::try_join_all;
use tokio_postgres::types::{IsNull, ToSql, Type};
use tokio_postgres::{Config as PgConfig, NoTls};
use tracing::{debug, info};

use crate::config::TargetConfig;
use crate::core::{Row, SqlNullType, SqlValue};
use crate::error::{ImportError, Result};

/// Store that receives DDL and row batches.
///
/// Statements run inside an implicit transaction that stays open until
/// [`Destination::commit`] is called.
#[async_trait]
pub trait Destination: Send {
    /// Execute a single statement without parameters.
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Execute a parameterized statement once per row. Returns rows affected.
    async fn execute_batch(&mut self, sql: &str, rows: &[Row]) -> Result<u64>;

    /// Commit the open transaction, if any.
    async fn commit(&mut self) -> Result<()>;
}

/// PostgreSQL destination on a single pooled connection.
pub struct PgDestination {
    pool: Pool,
    client: Object,
    in_transaction: bool,
}

impl PgDestination {
    /// Connect to the target database.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);
        pg_config.application_name("crab-import");
        pg_config.options(&format!("-c search_path={}", config.schema));

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(1)
            .build()
            .map_err(|e| ImportError::pool(e, "creating PostgreSQL pool"))?;

        let client = pool.get().await.map_err(|e| {
            ImportError::pool(
                e,
                format!(
                    "connecting to {}:{}/{}",
                    config.host, config.port, config.database
                ),
            )
        })?;

        client.simple_query("SELECT 1").await?;

        info!(
            "Connected to PostgreSQL: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self {
            pool,
            client,
            in_transaction: false,
        })
    }

    async fn begin(&mut self) -> Result<()> {
        if !self.in_transaction {
            self.client.batch_execute("BEGIN").await?;
            self.in_transaction = true;
        }
        Ok(())
    }

    /// Roll back any uncommitted work and release the connection.
    pub async fn close(mut self) -> Result<()> {
        if self.in_transaction {
            debug!("Rolling back uncommitted batch");
            self.client.batch_execute("ROLLBACK").await?;
            self.in_transaction = false;
        }
        drop(self.client);
        self.pool.close();
        Ok(())
    }
}

#[async_trait]
impl Destination for PgDestination {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.begin().await?;
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    async fn execute_batch(&mut self, sql: &str, rows: &[Row]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.begin().await?;
        let stmt = self.client.prepare_cached(sql).await?;

        let params: Vec<Vec<&(dyn ToSql + Sync)>> = rows
            .iter()
            .map(|row| row.iter().map(|v| v as &(dyn ToSql + Sync)).collect())
            .collect();

        // Requests on one connection are pipelined; they still apply in order.
        let counts = try_join_all(params.iter().map(|p| self.client.execute(&stmt, p))).await?;
        Ok(counts.into_iter().sum())
    }

    async fn commit(&mut self) -> Result<()> {
        if self.in_transaction {
            self.client.batch_execute("COMMIT").await?;
            self.in_transaction = false;
        }
        Ok(())
    }
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            SqlValue::Null(null_type) => match null_type {
                SqlNullType::I16 => None::<i16>.to_sql_checked(ty, out),
                SqlNullType::I32 => None::<i32>.to_sql_checked(ty, out),
                SqlNullType::F32 => None::<f32>.to_sql_checked(ty, out),
                SqlNullType::String => None::<String>.to_sql_checked(ty, out),
                SqlNullType::Date => None::<chrono::NaiveDate>.to_sql_checked(ty, out),
                SqlNullType::DateTime => None::<chrono::NaiveDateTime>.to_sql_checked(ty, out),
            },
            SqlValue::I16(v) => v.to_sql_checked(ty, out),
            SqlValue::I32(v) => v.to_sql_checked(ty, out),
            SqlValue::F32(v) => v.to_sql_checked(ty, out),
            SqlValue::String(v) => v.to_sql_checked(ty, out),
            SqlValue::Date(v) => v.to_sql_checked(ty, out),
            SqlValue::DateTime(v) => v.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    // Each variant checks its own payload type against the column.
    fn to_sql_checked(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        self.to_sql(ty, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn encode(value: &SqlValue, ty: &Type) -> std::result::Result<(IsNull, Vec<u8>), String> {
        let mut out = BytesMut::new();
        value
            .to_sql_checked(ty, &mut out)
            .map(|is_null| (is_null, out.to_vec()))
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_integer_encoding() {
        let (is_null, bytes) = encode(&SqlValue::I32(7), &Type::INT4).unwrap();
        assert!(matches!(is_null, IsNull::No));
        assert_eq!(bytes, 7i32.to_be_bytes());

        let (_, bytes) = encode(&SqlValue::I16(-2), &Type::INT2).unwrap();
        assert_eq!(bytes, (-2i16).to_be_bytes());
    }

    #[test]
    fn test_typed_null_encoding() {
        let (is_null, bytes) = encode(&SqlValue::Null(SqlNullType::Date), &Type::DATE).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_wrong_column_type_rejected() {
        assert!(encode(&SqlValue::I16(1), &Type::INT4).is_err());
        assert!(encode(&SqlValue::Null(SqlNullType::I32), &Type::VARCHAR).is_err());
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(encode(&SqlValue::Date(date), &Type::TIMESTAMP).is_err());
    }

    #[test]
    fn test_string_into_varchar() {
        let (_, bytes) = encode(&SqlValue::String("Gent".into()), &Type::VARCHAR).unwrap();
        assert_eq!(bytes, b"Gent");
    }
}
