use crate::config::S3Config;
use crate::s3::error::StorageError;
use crate::s3::storage::Storage;
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::{config::Region, Client};
use bytes::Bytes;
use tracing::{debug, error, info};

/// Real S3 implementation of the Storage trait
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    /// Create a new S3Storage instance from configuration
    pub async fn new(config: &S3Config) -> Result<Self, StorageError> {
        info!(
            "Creating S3Storage with config: endpoint={:?}, region={}, access_key={:?}",
            config.endpoint, config.region, config.access_key_id
        );

        // MinIO requires path-style requests
        let mut s3_config_builder = aws_sdk_s3::config::Builder::new()
            .behavior_version_latest()
            .region(Region::new(config.region.clone()))
            .force_path_style(true);

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "StaticCredentialsProvider",
            );

            s3_config_builder = s3_config_builder.credentials_provider(credentials);
        } else {
            let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            s3_config_builder.set_credentials_provider(shared.credentials_provider());
        }

        if let Some(endpoint) = &config.endpoint {
            info!("Setting custom endpoint: {}", endpoint);
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!("Created S3 client for region {}", config.region);

        Ok(Self { client })
    }
}

/// Extract the S3 error code of a service error, if any
fn error_code<E: ProvideErrorMetadata, R>(err: &SdkError<E, R>) -> Option<&str> {
    match err {
        SdkError::ServiceError(service_err) => service_err.err().code(),
        _ => None,
    }
}

/// Map an SDK failure on a single object to a StorageError
fn object_error<E, R>(
    bucket: &str,
    key: &str,
    err: SdkError<E, R>,
    write: bool,
) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let error_str = DisplayErrorContext(&err).to_string();

    match error_code(&err) {
        Some("NoSuchKey") | Some("KeyNotFound") | Some("NotFound") => {
            return StorageError::ObjectNotFound(key.to_string());
        }
        Some("NoSuchBucket") => return StorageError::BucketNotFound(bucket.to_string()),
        Some("AccessDenied") => {
            return StorageError::AccessDenied(key.to_string(), error_str);
        }
        _ => {}
    }

    if matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)
    ) {
        return StorageError::NetworkError(error_str);
    }

    // Fallback to string matching for backends with sparse error metadata
    if error_str.contains("NoSuchKey") || error_str.contains("does not exist") {
        StorageError::ObjectNotFound(key.to_string())
    } else if error_str.contains("NoSuchBucket") {
        StorageError::BucketNotFound(bucket.to_string())
    } else if write {
        StorageError::WriteError(key.to_string(), error_str)
    } else {
        StorageError::ReadError(key.to_string(), error_str)
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn has_bucket(&self, bucket: &str) -> Result<bool, StorageError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                debug!("Bucket '{}' exists", bucket);
                Ok(true)
            }
            Err(e) => {
                if let Some(code) = error_code(&e) {
                    debug!("has_bucket error for '{}': code={}", bucket, code);
                    if code == "NoSuchBucket" || code == "NotFound" {
                        info!("Bucket '{}' does not exist", bucket);
                        return Ok(false);
                    }
                }

                let error_str = DisplayErrorContext(&e).to_string();
                if error_str.contains("NoSuchBucket")
                    || error_str.contains("404")
                    || error_str.contains("NotFound")
                {
                    info!("Bucket '{}' does not exist", bucket);
                    Ok(false)
                } else if matches!(e, SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)) {
                    error!("Cannot reach S3 endpoint: {}", error_str);
                    Err(StorageError::ConnectionError(error_str))
                } else {
                    error!("Error checking bucket '{}': {}", bucket, error_str);
                    Err(StorageError::Other(anyhow::anyhow!(
                        "Error checking bucket existence: {}",
                        error_str
                    )))
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        info!("Creating bucket '{}'", bucket);

        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!("Successfully created bucket '{}'", bucket);
                Ok(())
            }
            Err(create_err) => {
                match error_code(&create_err) {
                    Some("BucketAlreadyExists") | Some("BucketAlreadyOwnedByYou") => {
                        info!("Bucket '{}' already exists", bucket);
                        return Ok(());
                    }
                    _ => {}
                }

                let error_str = DisplayErrorContext(&create_err).to_string();
                if error_str.contains("BucketAlreadyExists")
                    || error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("already exists")
                {
                    info!("Bucket '{}' already exists", bucket);
                    Ok(())
                } else {
                    error!("Failed to create bucket '{}': {}", bucket, error_str);
                    Err(StorageError::Other(anyhow::anyhow!(
                        "Failed to create bucket '{}': {}",
                        bucket,
                        error_str
                    )))
                }
            }
        }
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        debug!("Listing objects in bucket: {}", bucket);

        let mut keys = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(token.take())
                .send()
                .await
                .map_err(|e| match error_code(&e) {
                    Some("NoSuchBucket") => StorageError::BucketNotFound(bucket.to_string()),
                    _ => StorageError::ReadError(
                        bucket.to_string(),
                        DisplayErrorContext(&e).to_string(),
                    ),
                })?;

            for object in response.contents() {
                if let Some(key) = object.key() {
                    if !key.ends_with('/') {
                        keys.push(key.to_string());
                    }
                }
            }

            match response.next_continuation_token() {
                Some(next) if response.is_truncated().unwrap_or(false) => {
                    token = Some(next.to_string());
                }
                _ => break,
            }
        }

        debug!("Found {} objects in bucket {}", keys.len(), bucket);
        Ok(keys)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        debug!("Fetching object from S3: {}/{}", bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| object_error(bucket, key, e, false))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::ReadError(key.to_string(), e.to_string()))?
            .into_bytes();

        debug!("Successfully fetched object from S3: {}/{}", bucket, key);
        Ok(data)
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), StorageError> {
        debug!("Writing {} bytes to S3: {}/{}", data.len(), bucket, key);

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(data.into())
            .send()
            .await
            .map_err(|e| object_error(bucket, key, e, true))?;

        Ok(())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| object_error(bucket, key, e, true))?;

        debug!("Successfully removed object: {}/{}", bucket, key);
        Ok(())
    }
}
