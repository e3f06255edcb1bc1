use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::client::YouTrackClient;
use crate::config::ExportConfig;
use crate::error::Result;
use crate::export::CsvExporter;
use crate::fetcher::{IssueFetcher, IssueSource, ProjectIssueSource, StopReason};
use crate::upload::{ObjectStore, S3Uploader};

/// エクスポート処理の結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    /// 開始時刻
    pub start_time: DateTime<Utc>,
    /// 終了時刻
    pub end_time: DateTime<Utc>,
    /// 重複除外後のIssue数
    pub issues_fetched: usize,
    /// CSVに書いたデータ行数
    pub rows_written: usize,
    pub pages_fetched: u32,
    /// Issueとして読めずに捨てた要素数
    pub skipped_items: usize,
    pub stop_reason: Option<StopReason>,
    pub csv_path: Option<PathBuf>,
    /// アップロード先のキー
    pub uploaded_key: Option<String>,
    pub upload_error: Option<String>,
}

impl ExportReport {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            start_time: now,
            end_time: now,
            issues_fetched: 0,
            rows_written: 0,
            pages_fetched: 0,
            skipped_items: 0,
            stop_reason: None,
            csv_path: None,
            uploaded_key: None,
            upload_error: None,
        }
    }

    /// 終了を記録
    pub fn finish(&mut self) {
        self.end_time = Utc::now();
    }

    /// 処理時間（秒）
    pub fn duration_seconds(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / 1000.0
    }

    /// 取得が最後まで到達した
    pub fn is_complete(&self) -> bool {
        self.stop_reason.as_ref().is_some_and(StopReason::is_complete)
    }

    /// 取得が完了し、読めない要素もなく、アップロードも失敗していない
    pub fn is_success(&self) -> bool {
        self.is_complete() && self.skipped_items == 0 && self.upload_error.is_none()
    }
}

impl Default for ExportReport {
    fn default() -> Self {
        Self::new()
    }
}

/// 取得 → 投影 → CSV書き出し → アップロード
pub struct ExportPipeline {
    config: ExportConfig,
}

impl ExportPipeline {
    pub fn new(config: ExportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// 設定からHTTPクライアントとアップロード先を組み立てて実行
    pub async fn run(&self) -> Result<ExportReport> {
        let client = YouTrackClient::new(self.config.youtrack.clone())?;
        let source = ProjectIssueSource::new(client, self.config.project.clone());

        let store = match &self.config.upload {
            Some(upload) => Some(S3Uploader::new(upload).await?),
            None => None,
        };

        self.run_with(&source, store.as_ref().map(|s| s as &dyn ObjectStore))
            .await
    }

    pub async fn run_with<S>(&self, source: &S, store: Option<&dyn ObjectStore>) -> Result<ExportReport>
    where
        S: IssueSource + ?Sized,
    {
        let mut report = ExportReport::new();
        info!(project = %self.config.project, "Starting export");

        let fetcher = IssueFetcher::new(self.config.fetch_config());
        let outcome = fetcher.fetch_all(source).await?;
        report.issues_fetched = outcome.issues.len();
        report.pages_fetched = outcome.pages_fetched;
        report.skipped_items = outcome.skipped_items;
        if outcome.skipped_items > 0 {
            warn!(skipped = outcome.skipped_items, "Some page elements could not be read as issues");
        }
        if !outcome.is_complete() {
            warn!(reason = ?outcome.stop_reason, "Fetch ended early; exporting partial data");
        }
        report.stop_reason = Some(outcome.stop_reason);

        let projector = self.config.projector();
        let records = projector.project_all(&outcome.issues);

        let exporter = CsvExporter::new(&self.config.output_dir, self.config.file_prefix());
        let path = exporter.write(&projector.headers(), &records).await?;
        report.rows_written = records.len();
        report.csv_path = Some(path.clone());

        if let Some(store) = store {
            match store.upload_file(&path).await {
                Ok(key) => report.uploaded_key = Some(key),
                Err(e) => {
                    error!("Upload failed, CSV kept at {}: {}", path.display(), e);
                    report.upload_error = Some(e.to_string());
                }
            }
        }

        report.finish();
        info!(
            issues = report.issues_fetched,
            rows = report.rows_written,
            pages = report.pages_fetched,
            skipped = report.skipped_items,
            seconds = report.duration_seconds(),
            "Export finished"
        );
        Ok(report)
    }
}
