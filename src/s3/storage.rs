use crate::s3::error::StorageError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Storage trait defining the interface for S3-compatible object storage.
///
/// Every call names its bucket explicitly since the service works with two of
/// them: the raw source bucket and the processed bucket.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Check if a bucket exists
    async fn has_bucket(&self, bucket: &str) -> Result<bool, StorageError>;

    /// Create a bucket. Creating a bucket that already exists is not an error.
    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    /// List the names of all objects in a bucket
    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>, StorageError>;

    /// Get an object by its key
    ///
    /// * `bucket` - The bucket holding the object
    /// * `key` - The object key to retrieve
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError>;

    /// Write an object, replacing any previous content under the same key
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), StorageError>;

    /// Remove an object from a bucket
    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// Create the bucket unless it is already there
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        if !self.has_bucket(bucket).await? {
            self.create_bucket(bucket).await?;
        }
        Ok(())
    }
}

/// Implementation of Storage trait for Arc<T> where T implements Storage
///
/// This allows sharing storage instances across the HTTP handlers, the
/// scheduler and the pipeline.
#[async_trait]
impl<T: Storage + ?Sized> Storage for Arc<T> {
    async fn has_bucket(&self, bucket: &str) -> Result<bool, StorageError> {
        (**self).has_bucket(bucket).await
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        (**self).create_bucket(bucket).await
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        (**self).list_objects(bucket).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        (**self).get_object(bucket, key).await
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), StorageError> {
        (**self).put_object(bucket, key, data).await
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        (**self).remove_object(bucket, key).await
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        (**self).ensure_bucket(bucket).await
    }
}
