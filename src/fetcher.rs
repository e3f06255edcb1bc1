use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::models::{ISSUE_FIELDS, Issue, IssueQuery};
use crate::YouTrackClient;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_PAGES: u32 = 2000;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 200;

/// ページ単位でIssueを返す取得元
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// `skip` 件目から最大 `top` 件の生JSONを返す
    async fn fetch_page(&self, skip: u32, top: u32) -> Result<Vec<Value>>;
}

/// 1プロジェクトのIssueを `/api/issues` から取得する
#[derive(Debug, Clone)]
pub struct ProjectIssueSource {
    client: YouTrackClient,
    project: String,
    fields: String,
}

impl ProjectIssueSource {
    pub fn new(client: YouTrackClient, project: impl Into<String>) -> Self {
        Self {
            client,
            project: project.into(),
            fields: ISSUE_FIELDS.to_string(),
        }
    }

    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = fields.into();
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }
}

#[async_trait]
impl IssueSource for ProjectIssueSource {
    async fn fetch_page(&self, skip: u32, top: u32) -> Result<Vec<Value>> {
        let query = IssueQuery::new()
            .project(&self.project)
            .fields(self.fields.as_str())
            .top(top)
            .skip(skip);
        self.client.list_issues(&query).await
    }
}

/// ページ取得が通信エラーで失敗したときの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorPolicy {
    /// ログを出し、それまでに取得したIssueで続行する
    #[default]
    KeepPartial,
    /// エラーをそのまま返す
    Abort,
}

/// ページングの設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// 1ページあたりの件数
    pub page_size: u32,
    /// 取得ページ数の上限（サーバーがページングを誤っても止まる）
    pub max_pages: u32,
    /// ページ間の待機時間
    pub page_delay: Duration,
    pub on_error: FetchErrorPolicy,
}

impl FetchConfig {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
            on_error: FetchErrorPolicy::default(),
        }
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn on_error(mut self, policy: FetchErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::InvalidConfiguration("page_size must be greater than 0".to_string()));
        }
        if self.max_pages == 0 {
            return Err(Error::InvalidConfiguration("max_pages must be greater than 0".to_string()));
        }
        Ok(())
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// ページングを終了した理由
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// 空のページが返った
    EmptyPage,
    /// 未取得のIDが1件もないページ（同じページを返し続けるサーバー対策）
    NoNewIssues,
    /// ページサイズ未満のページ
    LastPage,
    /// ページ数の上限に到達
    SafetyCap,
    /// 通信エラーで中断
    TransportError(String),
}

impl StopReason {
    /// 取得が最後まで到達したかどうか
    pub fn is_complete(&self) -> bool {
        matches!(self, StopReason::EmptyPage | StopReason::NoNewIssues | StopReason::LastPage)
    }
}

/// 取得結果
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// 重複除外済みのIssue（取得順）
    pub issues: Vec<Issue>,
    /// 成功したページ取得の回数
    pub pages_fetched: u32,
    /// Issueとして読めずに捨てた要素数
    pub skipped_items: usize,
    pub stop_reason: StopReason,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        self.stop_reason.is_complete()
    }
}

/// ページングしながら全Issueを集める
#[derive(Debug, Clone, Default)]
pub struct IssueFetcher {
    config: FetchConfig,
}

impl IssueFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub async fn fetch_all<S>(&self, source: &S) -> Result<FetchOutcome>
    where
        S: IssueSource + ?Sized,
    {
        self.config.validate()?;

        let page_size = self.config.page_size;
        let mut issues: Vec<Issue> = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut pages_fetched = 0u32;
        let mut skipped_items = 0usize;

        info!(page_size, max_pages = self.config.max_pages, "fetching issues");

        let stop_reason = loop {
            let skip = pages_fetched.saturating_mul(page_size);

            let page = match source.fetch_page(skip, page_size).await {
                Ok(page) => page,
                Err(e) => {
                    error!(page = pages_fetched + 1, error = %e, "failed to fetch issue page");
                    match self.config.on_error {
                        FetchErrorPolicy::Abort => return Err(e),
                        FetchErrorPolicy::KeepPartial => break StopReason::TransportError(e.to_string()),
                    }
                }
            };
            pages_fetched += 1;

            if page.is_empty() {
                info!("no more issues found");
                break StopReason::EmptyPage;
            }

            let page_len = page.len();
            let mut readable = 0usize;
            let mut new_issues = 0usize;
            for raw in page {
                match serde_json::from_value::<Issue>(raw) {
                    Ok(issue) => {
                        readable += 1;
                        if seen_ids.insert(issue.id.clone()) {
                            issues.push(issue);
                            new_issues += 1;
                        }
                    }
                    Err(e) => {
                        skipped_items += 1;
                        warn!(page = pages_fetched, error = %e, "skipping unreadable issue");
                    }
                }
            }

            // 読めない要素だけのページは重複とは区別し、次のページへ進む
            if readable == 0 {
                warn!(page = pages_fetched, skipped = page_len, "page contained no readable issues");
            } else if new_issues == 0 {
                warn!(page = pages_fetched, "page contained no new issues, stopping");
                break StopReason::NoNewIssues;
            }

            info!(page = pages_fetched, total = issues.len(), "fetched page");

            if page_len < page_size as usize {
                info!("final page reached");
                break StopReason::LastPage;
            }

            if pages_fetched >= self.config.max_pages {
                warn!(max_pages = self.config.max_pages, "page limit reached, stopping");
                break StopReason::SafetyCap;
            }

            if !self.config.page_delay.is_zero() {
                tokio::time::sleep(self.config.page_delay).await;
            }
        };

        info!(total = issues.len(), pages = pages_fetched, ?stop_reason, "finished fetching issues");

        Ok(FetchOutcome {
            issues,
            pages_fetched,
            skipped_items,
            stop_reason,
        })
    }
}
