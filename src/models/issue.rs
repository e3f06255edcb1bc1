use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CustomField, IssueLink, Project, User, WorkItem, lenient};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    // サーバー採番のID（重複除外のキー）
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(rename = "idReadable")]
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_readable: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    // タイムスタンプはエポックミリ秒。変換は投影時に行う
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<Value>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<Value>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Value>,

    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter: Option<User>,
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<User>,

    #[serde(rename = "customFields")]
    #[serde(default, deserialize_with = "lenient::vec")]
    pub custom_fields: Vec<CustomField>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub tags: Vec<Tag>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub links: Vec<IssueLink>,
    #[serde(rename = "workItems")]
    #[serde(default, deserialize_with = "lenient::vec")]
    pub work_items: Vec<WorkItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Issue {
    /// IDだけを持つ空のIssue
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            id_readable: None,
            summary: None,
            description: None,
            created: None,
            updated: None,
            resolved: None,
            project: None,
            reporter: None,
            assignee: None,
            custom_fields: Vec::new(),
            tags: Vec::new(),
            links: Vec::new(),
            work_items: Vec::new(),
        }
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().and_then(|p| p.name.as_deref())
    }

    pub fn reporter_name(&self) -> Option<&str> {
        self.reporter.as_ref().and_then(|u| u.full_name.as_deref())
    }

    pub fn assignee_name(&self) -> Option<&str> {
        self.assignee.as_ref().and_then(|u| u.full_name.as_deref())
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .filter_map(|t| t.name.as_deref())
            .filter(|n| !n.is_empty())
    }
}
