use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Issueに付与されたカスタムフィールド（State, Priority, Sprints など）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub value: FieldValue,
}

impl CustomField {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

/// カスタムフィールド値のタグ付きユニオン
///
/// YouTrackは同じ `value` キーにスカラー、名前付きオブジェクト、
/// 名前付きオブジェクトの配列のいずれかを返す。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FieldValue {
    #[default]
    Absent,
    Scalar(Value),
    Named(NamedValue),
    NamedList(Vec<NamedValue>),
}

/// `name`, `value`, `presentation`, `minutes` のいずれかを持つオブジェクト
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, deserialize_with = "lenient::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<Value>,
}

impl NamedValue {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    fn from_map(map: Map<String, Value>) -> Self {
        serde_json::from_value(Value::Object(map)).unwrap_or_default()
    }

    /// `name` → `value` → `presentation` の順で空でない最初の値、
    /// どれも空なら `minutes` をそのまま使う
    pub fn display_value(&self) -> Option<String> {
        let candidates = [
            self.name.clone().map(Value::String),
            self.value.clone(),
            self.presentation.clone().map(Value::String),
        ];

        candidates
            .into_iter()
            .flatten()
            .find(is_truthy)
            .or_else(|| self.minutes.clone())
            .filter(|v| !v.is_null())
            .map(|v| render_scalar(&v))
    }

    fn non_empty_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// 単一セル向けの表示値
    pub fn display_value(&self) -> Option<String> {
        match self {
            FieldValue::Absent => None,
            FieldValue::Scalar(value) => Some(render_scalar(value)),
            FieldValue::Named(named) => named.display_value(),
            FieldValue::NamedList(items) => Some(
                items
                    .iter()
                    .filter_map(NamedValue::non_empty_name)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        }
    }

    /// 値に含まれる名前をすべて返す（単一オブジェクトでも配列扱い）
    pub fn names(&self) -> Vec<String> {
        match self {
            FieldValue::Named(named) => named.non_empty_name().map(str::to_string).into_iter().collect(),
            FieldValue::NamedList(items) => items
                .iter()
                .filter_map(NamedValue::non_empty_name)
                .map(str::to_string)
                .collect(),
            FieldValue::Absent | FieldValue::Scalar(_) => Vec::new(),
        }
    }

    /// エポックミリ秒として扱える生の値
    pub fn raw_scalar(&self) -> Option<&Value> {
        match self {
            FieldValue::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Absent,
            Value::Object(map) => FieldValue::Named(NamedValue::from_map(map)),
            Value::Array(items) => FieldValue::NamedList(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(map) => Some(NamedValue::from_map(map)),
                        _ => None,
                    })
                    .collect(),
            ),
            scalar => FieldValue::Scalar(scalar),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Absent => Value::Null,
            FieldValue::Scalar(v) => v,
            FieldValue::Named(named) => serde_json::to_value(named).unwrap_or(Value::Null),
            FieldValue::NamedList(items) => Value::Array(
                items
                    .into_iter()
                    .filter_map(|item| serde_json::to_value(item).ok())
                    .collect(),
            ),
        }
    }
}

/// 名前でカスタムフィールドを探す（最初に一致したもの）
pub fn find_field<'a>(fields: &'a [CustomField], name: &str) -> Option<&'a FieldValue> {
    fields
        .iter()
        .find(|f| f.name.as_deref() == Some(name))
        .map(|f| &f.value)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

pub(crate) fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
