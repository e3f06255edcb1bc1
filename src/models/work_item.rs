use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{User, lenient};

/// Issueに記録された作業時間（spent time）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkItem {
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<WorkDuration>,
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    // エポックミリ秒
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<Value>,
    #[serde(rename = "type")]
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_type: Option<WorkItemType>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub attributes: Vec<WorkItemAttribute>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkDuration {
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<i64>,
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkItemType {
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkItemAttribute {
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<AttributeValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeValue {
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

pub const BILLABLE: &str = "Billable";

impl WorkItem {
    /// 欠落した所要時間は0分扱い
    pub fn minutes(&self) -> i64 {
        self.duration.as_ref().and_then(|d| d.minutes).unwrap_or(0)
    }

    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .and_then(|a| a.full_name.as_deref())
            .unwrap_or("")
    }

    pub fn type_name(&self) -> &str {
        self.work_type
            .as_ref()
            .and_then(|t| t.name.as_deref())
            .unwrap_or("")
    }

    /// `Billable` 属性の値が `Yes`
    pub fn has_billable_attribute(&self) -> bool {
        self.attributes
            .iter()
            .any(|attr| attr.name.as_deref() == Some(BILLABLE) && attr.value_name() == Some("Yes"))
    }

    /// 属性値の名前そのものが `Billable`
    pub fn has_billable_value(&self) -> bool {
        self.attributes
            .iter()
            .any(|attr| attr.value_name() == Some(BILLABLE))
    }
}

impl WorkItemAttribute {
    pub fn value_name(&self) -> Option<&str> {
        self.value.as_ref().and_then(|v| v.name.as_deref())
    }
}
