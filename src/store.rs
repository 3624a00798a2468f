//! The local datastore capability: the five-method interface every storage
//! node serves requests against, plus two concrete implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Error, Result};

/// A local key-value store. The storage server dispatches every request
/// action to one of these methods.
///
/// Implementations are not required to be safe for concurrent callers;
/// wrap one that isn't in [`SharedStore`].
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Stores `value` under `key`, overwriting any existing value.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Returns the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::KeyNotFound` if `key` is absent.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Returns whether `key` is present.
    async fn has(&self, key: &str) -> Result<bool>;

    /// Returns the byte length of the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::KeyNotFound` if `key` is absent.
    async fn get_size(&self, key: &str) -> Result<u64>;

    /// Removes `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// An in-memory [`Datastore`] backed by a `HashMap` behind a `tokio::sync::RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.entries
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or(Error::KeyNotFound)
    }

    async fn has(&self, key: &str) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn get_size(&self, key: &str) -> Result<u64> {
        self.entries
            .read()
            .await
            .get(key)
            .map(|value| value.len() as u64)
            .ok_or(Error::KeyNotFound)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Wraps any [`Datastore`] behind a single mutex, for backing stores that
/// are not themselves safe for concurrent callers.
pub struct SharedStore<D: Datastore> {
    inner: Arc<tokio::sync::Mutex<D>>,
}

impl<D: Datastore> SharedStore<D> {
    /// Wraps `inner` for exclusive access per operation.
    pub fn new(inner: D) -> Self {
        Self {
            inner: Arc::new(tokio::sync::Mutex::new(inner)),
        }
    }
}

impl<D: Datastore> Clone for SharedStore<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl<D: Datastore> Datastore for SharedStore<D> {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.inner.lock().await.put(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.inner.lock().await.get(key).await
    }

    async fn has(&self, key: &str) -> Result<bool> {
        self.inner.lock().await.has(key).await
    }

    async fn get_size(&self, key: &str) -> Result<u64> {
        self.inner.lock().await.get_size(key).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.lock().await.delete(key).await
    }
}
