use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

use crate::error::{Error, Result};

pub const DEFAULT_KEY_PREFIX: &str = "youtrack_exports";
pub const DEFAULT_REGION: &str = "us-east-1";

/// アップロード先の設定。キーを省略するとAWSの標準の認証情報チェーンを使う
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    pub bucket: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    /// S3互換ストレージのエンドポイント（パス形式でアクセスする）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl UploadConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key_prefix: default_key_prefix(),
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
            endpoint_url: None,
        }
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn credentials(mut self, access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::InvalidConfiguration("S3 bucket must not be empty".to_string()));
        }
        if self.access_key_id.is_some() != self.secret_access_key.is_some() {
            return Err(Error::InvalidConfiguration(
                "AWS access key id and secret access key must be set together".to_string(),
            ));
        }
        Ok(())
    }
}

/// `<prefix>/<file_name>`（前後のスラッシュは1つにまとめる）
pub fn object_key(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", prefix, file_name.trim_start_matches('/'))
    }
}

/// ローカルファイルをオブジェクトストアに置く
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// ファイルをアップロードし、保存したキーを返す
    async fn upload_file(&self, local: &Path) -> Result<String>;
}

pub struct S3Uploader {
    client: aws_sdk_s3::Client,
    bucket: String,
    key_prefix: String,
}

impl S3Uploader {
    pub async fn new(config: &UploadConfig) -> Result<Self> {
        config.validate()?;

        let mut loader = aws_config::from_env().region(Region::new(config.region.clone()));
        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key_id.clone(),
                secret.clone(),
                None,
                None,
                "youtrack-export",
            ));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint_url.is_some())
            .build();

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            key_prefix: config.key_prefix.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn key_for(&self, local: &Path) -> Result<String> {
        let file_name = local
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::NotFound(format!("No file name in {}", local.display())))?;
        Ok(object_key(&self.key_prefix, file_name))
    }
}

#[async_trait]
impl ObjectStore for S3Uploader {
    async fn upload_file(&self, local: &Path) -> Result<String> {
        if fs::metadata(local).await.is_err() {
            return Err(Error::NotFound(format!("File not found: {}", local.display())));
        }

        let key = self.key_for(local)?;
        let body = ByteStream::from_path(local)
            .await
            .map_err(|e| Error::UploadFailed(format!("Failed to read {}: {}", local.display(), e)))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("text/csv")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(bucket = %self.bucket, key = %key, "S3 upload failed: {}", e);
                Error::UploadFailed(format!("s3://{}/{}: {}", self.bucket, key, e))
            })?;

        info!(bucket = %self.bucket, key = %key, "Uploaded to S3");
        Ok(key)
    }
}
