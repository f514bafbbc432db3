//! In-memory `KvStore` for unit tests — no Redis dependency required.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::kv::KvStore;

#[derive(Default)]
struct Inner {
    scalars: HashMap<String, String>,
    lists: HashMap<String, Vec<String>>,
}

/// Single-process, Mutex-guarded `KvStore`. TTLs are accepted but not
/// enforced — tests that care about expiry assert directly against the
/// stored value instead of wall-clock behavior.
#[derive(Default)]
pub struct InMemoryKvStore {
    inner: Mutex<Inner>,
}

impl InMemoryKvStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.lock().expect("lock poisoned").scalars.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.lock().expect("lock poisoned").scalars.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, _ttl_secs: u64) -> Result<(), StorageError> {
        self.set(key, value).await
    }

    async fn del(&self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.scalars.remove(key);
        inner.lists.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StorageError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let entry = inner.scalars.entry(key.to_owned()).or_insert_with(|| "0".to_owned());
        let next = entry.parse::<i64>().unwrap_or(0).saturating_add(1);
        *entry = next.to_string();
        Ok(next)
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.lock().expect("lock poisoned").lists.entry(key.to_owned()).or_default().push(value.to_owned());
        Ok(())
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.lock().expect("lock poisoned").lists.entry(key.to_owned()).or_default().insert(0, value.to_owned());
        Ok(())
    }

    async fn blmove_head_to_tail(
        &self,
        src: &str,
        dst: &str,
        _timeout_secs: u64,
    ) -> Result<Option<String>, StorageError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let popped = inner.lists.get_mut(src).filter(|l| !l.is_empty()).map(|l| l.remove(0));
        if let Some(ref value) = popped {
            inner.lists.entry(dst.to_owned()).or_default().push(value.clone());
        }
        Ok(popped)
    }

    async fn lrem(&self, key: &str, count: i64, value: &str) -> Result<i64, StorageError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let Some(list) = inner.lists.get_mut(key) else {
            return Ok(0);
        };
        let mut removed = 0i64;
        let limit = if count <= 0 { usize::MAX } else { count as usize };
        list.retain(|item| {
            if (removed as usize) < limit && item == value {
                removed = removed.saturating_add(1);
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if let Some(list) = inner.lists.get_mut(key) {
            let len = list.len() as isize;
            let norm = |i: isize| -> usize {
                if i < 0 { (len + i).max(0) as usize } else { i.min(len) as usize }
            };
            let (s, e) = (norm(start), norm(stop).min(list.len().saturating_sub(1)));
            if s > e || list.is_empty() {
                list.clear();
            } else {
                *list = list[s..=e].to_vec();
            }
        }
        Ok(())
    }

    async fn llen(&self, key: &str) -> Result<usize, StorageError> {
        Ok(self.inner.lock().expect("lock poisoned").lists.get(key).map_or(0, Vec::len))
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, StorageError> {
        let inner = self.inner.lock().expect("lock poisoned");
        let Some(list) = inner.lists.get(key) else {
            return Ok(Vec::new());
        };
        let len = list.len() as isize;
        let norm = |i: isize| -> usize {
            if i < 0 { (len + i).max(0) as usize } else { i.min(len.max(0)) as usize }
        };
        let s = norm(start);
        let e = norm(stop).min(list.len().saturating_sub(1));
        if list.is_empty() || s > e {
            return Ok(Vec::new());
        }
        Ok(list[s..=e].to_vec())
    }
}
