use crate::s3::error::StorageError;
use crate::s3::storage::Storage;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// `FakeStorage` is an in-memory implementation of the `Storage` trait for testing purposes.
/// It allows simulating various storage scenarios, including successful operations and failures.
#[derive(Clone)]
pub struct FakeStorage {
    buckets: Arc<Mutex<HashMap<String, BTreeMap<String, Bytes>>>>,
    fail_objects: Arc<Mutex<HashSet<String>>>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl FakeStorage {
    /// Create a new empty FakeStorage instance
    pub fn new() -> Self {
        FakeStorage {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            fail_objects: Arc::new(Mutex::new(HashSet::new())),
            fail_writes: Arc::new(AtomicBool::new(false)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create the bucket if needed and store an object without counting it as a write
    pub async fn fake_add_object(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        let mut buckets = self.buckets.lock().await;
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.into());
    }

    /// Simulate a read failure for a specific object
    /// After calling this, get_object returns a ReadError for this key
    pub async fn fake_fail_object(&self, key: &str) {
        let mut fail_objects = self.fail_objects.lock().await;
        fail_objects.insert(key.to_string());
    }

    /// Make every subsequent put/remove fail with a network error
    pub fn fake_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful put/remove calls made through the trait
    pub fn fake_write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Snapshot of every object in a bucket, ordered by key
    pub async fn fake_objects(&self, bucket: &str) -> BTreeMap<String, Bytes> {
        let buckets = self.buckets.lock().await;
        buckets.get(bucket).cloned().unwrap_or_default()
    }

    fn check_writable(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::NetworkError(format!(
                "simulated failure writing {}",
                key
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for FakeStorage {
    async fn has_bucket(&self, bucket: &str) -> Result<bool, StorageError> {
        let buckets = self.buckets.lock().await;
        Ok(buckets.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        let mut buckets = self.buckets.lock().await;
        buckets.entry(bucket.to_string()).or_default();
        Ok(())
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let buckets = self.buckets.lock().await;
        buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        {
            let fail_objects = self.fail_objects.lock().await;
            if fail_objects.contains(key) {
                return Err(StorageError::ReadError(
                    key.to_string(),
                    "simulated read failure".to_string(),
                ));
            }
        }

        let buckets = self.buckets.lock().await;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        match objects.get(key) {
            Some(bytes) => Ok(bytes.clone()),
            None => Err(StorageError::ObjectNotFound(key.to_string())),
        }
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), StorageError> {
        self.check_writable(key)?;

        let mut buckets = self.buckets.lock().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        objects.insert(key.to_string(), data);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.check_writable(key)?;

        let mut buckets = self.buckets.lock().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        if objects.remove(key).is_some() {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        } else {
            Err(StorageError::ObjectNotFound(key.to_string()))
        }
    }
}

impl Default for FakeStorage {
    fn default() -> Self {
        Self::new()
    }
}
