//! Postgres-backed implementation of [`ConfigStore`].
//!
//! # Data model
//! One row per key in `config_entries(key, value, updated_at)`. The value is
//! the opaque serialized record; the store never inspects it.
//!
//! # Consistency
//! - `put` is an upsert.
//! - `compare_and_put` is a single conditional statement: an
//!   `INSERT .. ON CONFLICT DO NOTHING` when the key must be absent, or an
//!   `UPDATE .. WHERE value = $expected` otherwise. Zero affected rows means
//!   another writer got there first.
//!
//! # Operational notes
//! - Migrations run at connect time via `sqlx::migrate!("./migrations")`.
//! - Database URLs may contain credentials; never log `pg.url`.
use super::{ConfigStore, StoreError, StoreResult};
use crate::config::PostgresConfig;
use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub struct PostgresStore {
    pool: PgPool,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(anyhow!(err))
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(anyhow!(err))
    }
}

impl PostgresStore {
    /// Open a pool and apply pending migrations.
    ///
    /// # Errors
    /// - Invalid URL, unreachable server, or a failed migration.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = tokio::time::timeout(
            Duration::from_millis(pg.connect_timeout_ms),
            PgPoolOptions::new()
                .max_connections(pg.max_connections)
                .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
                .connect_with(connect_options),
        )
        .await
        .map_err(|_| anyhow!("timed out connecting to postgres"))??;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(max_connections = pg.max_connections, "postgres config store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl ConfigStore for PostgresStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let value = sqlx::query_scalar::<_, Vec<u8>>(
            "SELECT value FROM config_entries WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO config_entries (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn compare_and_put(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: Vec<u8>,
    ) -> StoreResult<()> {
        let result = match expected {
            None => {
                sqlx::query(
                    "INSERT INTO config_entries (key, value) VALUES ($1, $2)
                     ON CONFLICT (key) DO NOTHING",
                )
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .await?
            }
            Some(current) => {
                sqlx::query(
                    "UPDATE config_entries SET value = $3, updated_at = now()
                     WHERE key = $1 AND value = $2",
                )
                .bind(key)
                .bind(current)
                .bind(value)
                .execute(&self.pool)
                .await?
            }
        };
        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!("{key} changed concurrently")));
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
