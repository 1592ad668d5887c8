use std::sync::Arc;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use bytes::Bytes;

use crate::core::client::storage::{StorageClient, StorageError};
use crate::types::params::StorageArgs;

#[derive(Clone, Debug)]
pub struct AWSS3 {
    pub(crate) client: Arc<Client>,
    bucket_name: String,
}

impl AWSS3 {
    /// Creates a new instance of AWSS3 with the provided AWS configuration and bucket.
    pub fn new(aws_config: &SdkConfig, args: &StorageArgs) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(aws_config).force_path_style(true).build();
        let client = Client::from_conf(s3_config);
        Self { client: Arc::new(client), bucket_name: args.bucket_name.clone() }
    }

    pub(crate) fn bucket_name(&self) -> Result<&str, StorageError> {
        if self.bucket_name.is_empty() {
            return Err(StorageError::InvalidBucketName("Bucket name is not set".to_string()));
        }
        Ok(&self.bucket_name)
    }
}

#[async_trait]
impl StorageClient for AWSS3 {
    async fn get_data(&self, key: &str) -> Result<Bytes, StorageError> {
        let output = match self.client.get_object().bucket(self.bucket_name()?).key(key).send().await {
            Ok(output) => output,
            Err(e) if e.as_service_error().map(|se| se.is_no_such_key()).unwrap_or(false) => {
                return Err(StorageError::ObjectNotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let data = output.body.collect().await.map_err(|e| StorageError::ObjectStreamError(e.to_string()))?;

        Ok(data.into_bytes())
    }

    async fn put_data(&self, data: Bytes, key: &str) -> Result<(), StorageError> {
        self.client.put_object().bucket(self.bucket_name()?).key(key).body(data.into()).send().await?;

        Ok(())
    }

    async fn delete_data(&self, key: &str) -> Result<(), StorageError> {
        Ok(self.client.delete_object().bucket(self.bucket_name()?).key(key).send().await.map(|_| ())?)
    }
}
