//! Key/value storage for backend configuration records.
//!
//! # Purpose
//! The config service persists a single serialized record under a fixed key.
//! Backends only need atomic single-key operations; `compare_and_put` lets the
//! writer detect a concurrent update between its load and its store.
//!
//! # Key invariants
//! - `get` distinguishes "absent" (`Ok(None)`) from a failure.
//! - `compare_and_put` writes only if the current value equals `expected`
//!   (`None` meaning the key must not exist) and otherwise returns
//!   [`StoreError::Conflict`] without modifying anything.
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;
    /// Unconditional upsert. The config service writes through
    /// [`ConfigStore::compare_and_put`]; `put` serves seeding and operator
    /// overwrites.
    async fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()>;
    async fn compare_and_put(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: Vec<u8>,
    ) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
