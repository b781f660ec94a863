// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Lineage Authors

//! Object store abstraction.

use std::future::Future;

use bytes::Bytes;
use dashmap::DashMap;

use crate::error::StoreError;

/// Trait for the object stores trace-record batches are read from and written to.
///
/// Returned futures are `Send` so redaction can run on spawned tasks.
pub trait ObjectStore: Send + Sync {
    /// Fetch an object's body.
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<Bytes, StoreError>> + Send;

    /// Store an object, replacing any existing one.
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<T: ObjectStore> ObjectStore for &T {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        (**self).get_object(bucket, key).await
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StoreError> {
        (**self).put_object(bucket, key, body).await
    }
}

/// In-memory object store.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<(String, String), Bytes>,
}

impl MemoryObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an object synchronously.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.objects.insert((bucket.to_string(), key.to_string()), body.into());
    }

    /// Returns an object's body, if present.
    #[must_use]
    pub fn get(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects.get(&(bucket.to_string(), key.to_string())).map(|b| b.value().clone())
    }

    /// Returns the keys stored in a bucket, sorted.
    #[must_use]
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .iter()
            .filter(|entry| entry.key().0 == bucket)
            .map(|entry| entry.key().1.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Returns the number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if no objects are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        self.get(bucket, key).ok_or_else(|| StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StoreError> {
        self.objects.insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }
}
