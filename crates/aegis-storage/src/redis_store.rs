//! Redis-backed `KvStore`.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::error::StorageError;
use crate::kv::KvStore;

/// `KvStore` implementation over a Redis `ConnectionManager`, cheaply
/// cloneable and safe to share across the HTTP front-end and worker tasks.
#[derive(Clone)]
pub struct RedisKvStore {
    conn: ConnectionManager,
}

impl RedisKvStore {
    /// Connects to Redis at `host:port`, optionally authenticating with `password`.
    ///
    /// # Errors
    /// Returns `StorageError::Redis` if the connection cannot be established.
    pub async fn connect(host: &str, port: u16, password: Option<&str>) -> Result<Self, StorageError> {
        let url = match password {
            Some(pw) if !pw.is_empty() => format!("redis://:{pw}@{host}:{port}"),
            _ => format!("redis://{host}:{port}"),
        };
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StorageError> {
        let mut conn = self.conn.clone();
        Ok(conn.incr(key, 1).await?)
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let _: () = conn.rpush(key, value).await?;
        Ok(())
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let _: () = conn.lpush(key, value).await?;
        Ok(())
    }

    async fn blmove_head_to_tail(
        &self,
        src: &str,
        dst: &str,
        timeout_secs: u64,
    ) -> Result<Option<String>, StorageError> {
        let mut conn = self.conn.clone();
        let result: Option<String> = conn
            .blmove(src, dst, redis::Direction::Left, redis::Direction::Right, timeout_secs as f64)
            .await?;
        Ok(result)
    }

    async fn lrem(&self, key: &str, count: i64, value: &str) -> Result<i64, StorageError> {
        let mut conn = self.conn.clone();
        Ok(conn.lrem(key, count, value).await?)
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let _: () = conn.ltrim(key, start, stop).await?;
        Ok(())
    }

    async fn llen(&self, key: &str) -> Result<usize, StorageError> {
        let mut conn = self.conn.clone();
        Ok(conn.llen(key).await?)
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, StorageError> {
        let mut conn = self.conn.clone();
        Ok(conn.lrange(key, start, stop).await?)
    }
}
