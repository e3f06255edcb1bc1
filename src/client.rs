use crate::error::Result;
use crate::models::IssueQuery;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const ISSUES_ENDPOINT: &str = "/api/issues";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTrackConfig {
    pub base_url: String,
    pub token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl YouTrackConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();

        // URLの検証
        let _ = Url::parse(&base_url)
            .map_err(|_| crate::error::Error::InvalidConfiguration("Invalid base URL".to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    pub fn from_env() -> Result<Self> {
        use std::env;

        let base_url = env::var("YOUTRACK_URL")
            .map_err(|_| crate::error::Error::ConfigurationMissing("YOUTRACK_URL not found in environment".to_string()))?;

        let token = env::var("YOUTRACK_TOKEN")
            .map_err(|_| crate::error::Error::ConfigurationMissing("YOUTRACK_TOKEN not found in environment".to_string()))?;

        Self::new(base_url, token)
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[derive(Debug, Clone)]
pub struct YouTrackClient {
    pub(crate) client: Client,
    pub(crate) config: Arc<YouTrackConfig>,
}

impl YouTrackClient {
    pub fn new(config: YouTrackConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        // 認証ヘッダーを追加
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", config.token))
                .map_err(|_| crate::error::Error::InvalidConfiguration("Invalid auth header".to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| crate::error::Error::InvalidConfiguration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &YouTrackConfig {
        &self.config
    }

    pub(crate) async fn get_with_query<T, V>(&self, endpoint: &str, query: &[(&str, V)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        V: Serialize,
    {
        let url = format!("{}{}", self.config.base_url, endpoint);

        let response = self.client
            .get(&url)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(crate::error::Error::ApiError { status, message });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Issueの1ページ分を生のJSONとして取得
    pub async fn list_issues(&self, query: &IssueQuery) -> Result<Vec<serde_json::Value>> {
        self.get_with_query(ISSUES_ENDPOINT, &query.to_query_pairs()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtrack_config_new_with_valid_url() {
        // Given: 有効なURLとトークン
        let base_url = "https://youtrack.example.com/";

        // When: YouTrackConfigを作成
        let result = YouTrackConfig::new(base_url, "perm-token");

        // Then: 成功し、末尾のスラッシュが除去される
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.base_url, "https://youtrack.example.com");
        assert_eq!(config.token, "perm-token");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_youtrack_config_new_with_invalid_url() {
        // Given: 無効なURL
        let base_url = "not a valid url";

        // When: YouTrackConfigを作成
        let result = YouTrackConfig::new(base_url, "perm-token");

        // Then: エラーが返される
        assert!(result.is_err());
        match result.unwrap_err() {
            crate::error::Error::InvalidConfiguration(msg) => {
                assert_eq!(msg, "Invalid base URL");
            }
            _ => panic!("Expected InvalidConfiguration error"),
        }
    }

    #[test]
    fn test_youtrack_config_from_env() {
        // Given: 環境変数を設定
        unsafe {
            std::env::set_var("YOUTRACK_URL", "https://env.example.com");
            std::env::set_var("YOUTRACK_TOKEN", "env-token");
        }

        // When: from_env()を呼び出す
        let result = YouTrackConfig::from_env();

        // Then: 成功し、正しい値が設定される
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.base_url, "https://env.example.com");
        assert_eq!(config.token, "env-token");

        // Cleanup
        unsafe {
            std::env::remove_var("YOUTRACK_URL");
            std::env::remove_var("YOUTRACK_TOKEN");
        }
    }

    #[test]
    fn test_youtrack_client_new() {
        // Given: 有効な設定
        let config = YouTrackConfig::new("https://youtrack.example.com", "perm-token").unwrap();

        // When: YouTrackClientを作成
        let result = YouTrackClient::new(config);

        // Then: 成功する
        assert!(result.is_ok());
        assert_eq!(result.unwrap().config().base_url, "https://youtrack.example.com");
    }

    #[test]
    fn test_youtrack_client_rejects_token_with_newline() {
        let config = YouTrackConfig {
            base_url: "https://youtrack.example.com".to_string(),
            token: "bad\ntoken".to_string(),
            timeout_secs: 5,
        };

        let result = YouTrackClient::new(config);

        assert!(matches!(result, Err(crate::error::Error::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_list_issues_success() {
        use wiremock::{MockServer, Mock, ResponseTemplate};
        use wiremock::matchers::{method, path, header, query_param};
        use serde_json::json;

        // Given: モックサーバーを起動
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/issues"))
            .and(header("Authorization", "Bearer perm-token"))
            .and(query_param("query", "project:{ERPOne}"))
            .and(query_param("$top", "100"))
            .and(query_param("$skip", "0"))
            .respond_with(ResponseTemplate::new(200)
                .set_body_json(json!([
                    {"id": "2-1", "idReadable": "ERP-1", "summary": "First"},
                    {"id": "2-2", "idReadable": "ERP-2", "summary": "Second"}
                ])))
            .mount(&mock_server)
            .await;

        let config = YouTrackConfig::new(mock_server.uri(), "perm-token").unwrap();
        let client = YouTrackClient::new(config).unwrap();
        let query = IssueQuery::new().project("ERPOne").top(100).skip(0);

        // When: Issueを取得
        let result = client.list_issues(&query).await;

        // Then: 成功し、2件返る
        assert!(result.is_ok());
        let page = result.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[1]["idReadable"], "ERP-2");
    }

    #[tokio::test]
    async fn test_list_issues_error() {
        use wiremock::{MockServer, Mock, ResponseTemplate};
        use wiremock::matchers::{method, path};

        // Given: エラーレスポンスを返すモックサーバー
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/issues"))
            .respond_with(ResponseTemplate::new(401)
                .set_body_string("Unauthorized"))
            .mount(&mock_server)
            .await;

        let config = YouTrackConfig::new(mock_server.uri(), "expired").unwrap();
        let client = YouTrackClient::new(config).unwrap();

        // When: Issueを取得
        let result = client.list_issues(&IssueQuery::new().top(10)).await;

        // Then: エラーが返される
        assert!(result.is_err());
        match result.unwrap_err() {
            crate::error::Error::ApiError { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Unauthorized");
            }
            _ => panic!("Expected ApiError"),
        }
    }
}
