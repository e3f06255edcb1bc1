use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::client::YouTrackConfig;
use crate::error::{Error, Result};
use crate::export::sanitize_file_component;
use crate::fetcher::{
    DEFAULT_MAX_PAGES, DEFAULT_PAGE_DELAY_MS, DEFAULT_PAGE_SIZE, FetchConfig, FetchErrorPolicy,
};
use crate::projector::{BillablePolicy, RecordSchema, RowProjector, SchemaPreset};
use crate::upload::{DEFAULT_KEY_PREFIX, DEFAULT_REGION, UploadConfig};

pub const CONFIG_DIR_NAME: &str = "youtrack-export";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// エクスポート1回分の設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub youtrack: YouTrackConfig,
    pub project: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// 省略時は `YouTrack_<project>_Data`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_prefix: Option<String>,
    #[serde(default)]
    pub schema: SchemaPreset,
    #[serde(default)]
    pub billable_policy: BillablePolicy,
    #[serde(default)]
    pub fetch_error_policy: FetchErrorPolicy,
    /// 未設定ならアップロードしない
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadConfig>,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

fn default_page_delay_ms() -> u64 {
    DEFAULT_PAGE_DELAY_MS
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl ExportConfig {
    pub fn new(youtrack: YouTrackConfig, project: impl Into<String>) -> Self {
        Self {
            youtrack,
            project: project.into(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
            output_dir: default_output_dir(),
            file_prefix: None,
            schema: SchemaPreset::default(),
            billable_policy: BillablePolicy::default(),
            fetch_error_policy: FetchErrorPolicy::default(),
            upload: None,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 環境変数と同じキーで値を引く関数から設定を組み立てる
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| Error::ConfigurationMissing(format!("{} not found in environment", key)))
        };

        let mut youtrack = YouTrackConfig::new(require("YOUTRACK_URL")?, require("YOUTRACK_TOKEN")?)?;
        if let Some(raw) = get("YOUTRACK_TIMEOUT_SECS") {
            youtrack = youtrack.timeout_secs(parse_number("YOUTRACK_TIMEOUT_SECS", &raw)?);
        }

        let mut config = Self::new(youtrack, require("YOUTRACK_PROJECT")?);

        if let Some(raw) = get("EXPORT_PAGE_SIZE") {
            config.page_size = parse_number("EXPORT_PAGE_SIZE", &raw)?;
        }
        if let Some(raw) = get("EXPORT_MAX_PAGES") {
            config.max_pages = parse_number("EXPORT_MAX_PAGES", &raw)?;
        }
        if let Some(raw) = get("EXPORT_PAGE_DELAY_MS") {
            config.page_delay_ms = parse_number("EXPORT_PAGE_DELAY_MS", &raw)?;
        }
        if let Some(dir) = get("EXPORT_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        config.file_prefix = get("EXPORT_FILE_PREFIX");
        if let Some(raw) = get("EXPORT_SCHEMA") {
            config.schema = parse_name("EXPORT_SCHEMA", &raw)?;
        }
        if let Some(raw) = get("EXPORT_BILLABLE_POLICY") {
            config.billable_policy = parse_name("EXPORT_BILLABLE_POLICY", &raw)?;
        }
        if let Some(raw) = get("EXPORT_ON_FETCH_ERROR") {
            config.fetch_error_policy = parse_name("EXPORT_ON_FETCH_ERROR", &raw)?;
        }

        config.upload = get("S3_BUCKET").map(|bucket| UploadConfig {
            bucket,
            key_prefix: get("S3_KEY_PREFIX").unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
            region: get("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            access_key_id: get("AWS_ACCESS_KEY_ID"),
            secret_access_key: get("AWS_SECRET_ACCESS_KEY"),
            endpoint_url: get("S3_ENDPOINT_URL"),
        });

        Ok(config)
    }

    /// JSONファイルから読み込む
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if fs::metadata(path).await.is_err() {
            return Err(Error::NotFound(format!("Config file not found: {}", path.display())));
        }

        let contents = fs::read_to_string(path).await?;
        if contents.trim().is_empty() {
            return Err(Error::ConfigurationMissing(format!("Config file is empty: {}", path.display())));
        }

        let mut config: Self = serde_json::from_str(&contents)?;

        // URLの検証と末尾スラッシュの除去
        let timeout = config.youtrack.timeout_secs;
        config.youtrack = YouTrackConfig::new(&config.youtrack.base_url, &config.youtrack.token)?
            .timeout_secs(timeout);

        Ok(config)
    }

    /// `<config_dir>/youtrack-export/config.json`
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::ConfigurationMissing("Config directory not found".to_string()))?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<()> {
        if self.project.trim().is_empty() {
            return Err(Error::InvalidConfiguration("project must not be empty".to_string()));
        }
        if self.youtrack.token.trim().is_empty() {
            return Err(Error::InvalidConfiguration("token must not be empty".to_string()));
        }
        self.fetch_config().validate()?;
        if let Some(upload) = &self.upload {
            upload.validate()?;
        }
        Ok(())
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn with_output_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn without_upload(mut self) -> Self {
        self.upload = None;
        self
    }

    /// 出力ファイル名の接頭辞（ファイル名に使えない文字は `_` に置換）
    pub fn file_prefix(&self) -> String {
        match &self.file_prefix {
            Some(prefix) => sanitize_file_component(prefix),
            None => format!("YouTrack_{}_Data", sanitize_file_component(&self.project)),
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig::new()
            .page_size(self.page_size)
            .max_pages(self.max_pages)
            .page_delay(Duration::from_millis(self.page_delay_ms))
            .on_error(self.fetch_error_policy)
    }

    pub fn record_schema(&self) -> RecordSchema {
        self.schema.to_schema()
    }

    pub fn projector(&self) -> RowProjector {
        RowProjector::new(self.record_schema()).with_billable_policy(self.billable_policy)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::InvalidConfiguration(format!("{} must be a non-negative integer, got '{}'", key, raw)))
}

/// `compact` や `keep_partial` のようなsnake_caseの名前を列挙型に変換
fn parse_name<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    let name = raw.trim().to_lowercase().replace('-', "_");
    serde_json::from_value(Value::String(name))
        .map_err(|_| Error::InvalidConfiguration(format!("Unknown value for {}: '{}'", key, raw)))
}
