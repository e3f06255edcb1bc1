use serde::{Deserialize, Serialize};

/// `/api/issues` に渡すフィールド指定（投影に必要なものをすべて含む）
pub const ISSUE_FIELDS: &str = concat!(
    "id,idReadable,summary,description,created,updated,resolved,",
    "project(id,name,shortName),",
    "reporter(login,fullName),",
    "assignee(login,fullName),",
    "customFields(name,value(name,value,presentation,minutes)),",
    "tags(name),",
    "links(direction,linkType(name),issues(idReadable,summary)),",
    "workItems(author(login,fullName),duration(minutes,presentation),text,created,",
    "type(name),attributes(name,value(name)))"
);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IssueQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,

    #[serde(rename = "$top")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<u32>,

    #[serde(rename = "$skip")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
}

impl IssueQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// `project:{<name>}` の検索クエリを設定
    pub fn project(mut self, project: &str) -> Self {
        self.query = Some(format!("project:{{{}}}", project));
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    /// クエリ文字列用のキー・値ペア
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(query) = &self.query {
            pairs.push(("query", query.clone()));
        }
        if let Some(fields) = &self.fields {
            pairs.push(("fields", fields.clone()));
        }
        if let Some(top) = self.top {
            pairs.push(("$top", top.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("$skip", skip.to_string()));
        }
        pairs
    }
}
