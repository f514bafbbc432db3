//! Minimal key-value + list primitive set the rest of the storage layer is built on.
//!
//! Every AEGIS mutation is single-key atomic (spec §5); the only compound
//! primitive needed is the blocking pop-and-push used by the queue driver's
//! `reserve()`.

use async_trait::async_trait;

use crate::error::StorageError;

/// Shared key-value/list store abstraction. `RedisKvStore` is the production
/// implementation; `InMemoryKvStore` backs unit tests without a Redis
/// dependency.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StorageError>;
    async fn del(&self, key: &str) -> Result<(), StorageError>;
    async fn incr(&self, key: &str) -> Result<i64, StorageError>;

    /// Push to the tail of a list.
    async fn rpush(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Push to the head of a list.
    async fn lpush(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Blocking pop from the head of `src`, push to the tail of `dst`. Returns
    /// `None` if nothing arrived within `timeout_secs`.
    async fn blmove_head_to_tail(
        &self,
        src: &str,
        dst: &str,
        timeout_secs: u64,
    ) -> Result<Option<String>, StorageError>;
    /// Removes up to `count` occurrences of `value` from a list (0 = all).
    async fn lrem(&self, key: &str, count: i64, value: &str) -> Result<i64, StorageError>;
    /// Trims a list to the inclusive range `[start, stop]`.
    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), StorageError>;
    async fn llen(&self, key: &str) -> Result<usize, StorageError>;
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, StorageError>;
}
