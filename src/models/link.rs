use serde::{Deserialize, Serialize};

use super::lenient;

/// 方向とリンク種別を持つIssueリンク（1件で複数のIssueを指すことがある）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueLink {
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(rename = "linkType")]
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_type: Option<LinkType>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub issues: Vec<LinkedIssue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkType {
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkedIssue {
    #[serde(rename = "idReadable")]
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_readable: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl IssueLink {
    pub fn link_type_name(&self) -> Option<&str> {
        self.link_type.as_ref().and_then(|t| t.name.as_deref())
    }
}
