//! IssueのネストしたJSONを1行のフラットなレコードへ投影する
//!
//! 投影は失敗しない。壊れた値や欠落した値は `None` か空の配列になる。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{CustomField, FieldValue, Issue, IssueLink, WorkItem, find_field};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const SPRINTS_FIELD: &str = "Sprints";
pub const ASSIGNEE_FIELD: &str = "Assignee";

const CORE_HEADERS: [&str; 9] = [
    "Issue_ID",
    "Summary",
    "Description",
    "Created",
    "Updated",
    "Resolved",
    "Project",
    "Reporter",
    "Assignee",
];

const LINK_HEADERS: [&str; 4] = [
    "Link_Direction",
    "Link_Type",
    "Linked_Issue_ID",
    "Linked_Issue_Summary",
];

const WORK_ITEM_HEADERS: [&str; 9] = [
    "WorkItem_Authors",
    "WorkItem_Types",
    "WorkItem_Texts",
    "WorkItem_Durations_Minutes",
    "WorkItem_Created",
    "Total_WorkItem_Minutes",
    "Billable_WorkItem_Minutes",
    "Spent_Time_Hours",
    "WorkItem_Details",
];

/// 作業時間を請求対象とみなす条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillablePolicy {
    /// `Billable` 属性が `Yes`、または属性値の名前が `Billable`
    #[default]
    Either,
    /// `Billable` 属性が `Yes` の場合のみ
    AttributeYes,
    /// 属性値の名前が `Billable` の場合のみ
    ValueNamedBillable,
}

impl BillablePolicy {
    pub fn is_billable(&self, item: &WorkItem) -> bool {
        match self {
            BillablePolicy::Either => item.has_billable_attribute() || item.has_billable_value(),
            BillablePolicy::AttributeYes => item.has_billable_attribute(),
            BillablePolicy::ValueNamedBillable => item.has_billable_value(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// 表示値をそのまま出力
    Scalar,
    /// エポックミリ秒を日時に変換
    Timestamp,
    /// 名前のJSON配列
    Sprints,
}

/// カスタムフィールド1つに対応する出力列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomColumn {
    pub header: String,
    pub field_name: String,
    pub kind: ColumnKind,
}

impl CustomColumn {
    pub fn new(header: impl Into<String>, field_name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            header: header.into(),
            field_name: field_name.into(),
            kind,
        }
    }

    pub fn scalar(header: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::new(header, field_name, ColumnKind::Scalar)
    }
}

/// 出力列の構成
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub custom_columns: Vec<CustomColumn>,
    pub include_links: bool,
    pub include_work_items: bool,
}

impl RecordSchema {
    /// 全カスタムフィールド、リンク、作業時間を含む構成
    pub fn standard() -> Self {
        let custom_columns = vec![
            CustomColumn::scalar("State", "State"),
            CustomColumn::scalar("Type", "Type"),
            CustomColumn::scalar("Priority", "Priority"),
            CustomColumn::scalar("Reviewer", "Reviewer"),
            CustomColumn::scalar("Assigned_By", "Assigned By"),
            CustomColumn::scalar("Assistance", "Assistance"),
            CustomColumn::scalar("Prioritised_By", "Prioritised by"),
            CustomColumn::new("Due_Date", "Due Date", ColumnKind::Timestamp),
            CustomColumn::scalar("Output_Link", "Output Link"),
            CustomColumn::scalar("Ideal_Days", "Ideal days"),
            CustomColumn::scalar("Original_Estimation", "Original estimation"),
            CustomColumn::scalar("Screenshot", "Screenshot"),
            CustomColumn::scalar("Story_Points", "Story points"),
            CustomColumn::scalar("Estimation", "Estimation"),
            CustomColumn::new("Sprints", SPRINTS_FIELD, ColumnKind::Sprints),
            CustomColumn::scalar("Work_Types", "Work Types"),
            CustomColumn::scalar("Area_Used", "Area Used"),
            CustomColumn::scalar("Spent_Time", "Spent time"),
        ];

        Self {
            custom_columns,
            include_links: true,
            include_work_items: true,
        }
    }

    /// 基本的なカスタムフィールドのみの構成
    pub fn compact() -> Self {
        let custom_columns = vec![
            CustomColumn::scalar("State", "State"),
            CustomColumn::scalar("Type", "Type"),
            CustomColumn::scalar("Priority", "Priority"),
            CustomColumn::scalar("Estimation", "Estimation"),
            CustomColumn::new("Sprints", SPRINTS_FIELD, ColumnKind::Sprints),
            CustomColumn::scalar("Work_Type", "Work Type"),
            CustomColumn::scalar("Area_Type", "Area Type"),
        ];

        Self {
            custom_columns,
            include_links: true,
            include_work_items: true,
        }
    }

    pub fn include_links(mut self, include: bool) -> Self {
        self.include_links = include;
        self
    }

    pub fn include_work_items(mut self, include: bool) -> Self {
        self.include_work_items = include;
        self
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = CORE_HEADERS.iter().map(|h| h.to_string()).collect();
        headers.extend(self.custom_columns.iter().map(|c| c.header.clone()));
        headers.push("Tags".to_string());
        if self.include_links {
            headers.extend(LINK_HEADERS.iter().map(|h| h.to_string()));
        }
        if self.include_work_items {
            headers.extend(WORK_ITEM_HEADERS.iter().map(|h| h.to_string()));
        }
        headers
    }
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self::standard()
    }
}

/// 名前で選べるスキーマのプリセット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPreset {
    #[default]
    Standard,
    Compact,
}

impl SchemaPreset {
    pub fn to_schema(self) -> RecordSchema {
        match self {
            SchemaPreset::Standard => RecordSchema::standard(),
            SchemaPreset::Compact => RecordSchema::compact(),
        }
    }
}

/// リンクを (リンク, 対象Issue) の組ごとに展開した4本の並列配列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkColumns {
    pub directions: Vec<String>,
    pub link_types: Vec<String>,
    pub issue_ids: Vec<String>,
    pub summaries: Vec<String>,
}

impl LinkColumns {
    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    fn cells(&self) -> [String; 4] {
        [
            json_array(&self.directions),
            json_array(&self.link_types),
            json_array(&self.issue_ids),
            json_array(&self.summaries),
        ]
    }
}

/// 作業時間の集計と明細の並列配列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkItemSummary {
    pub total_minutes: i64,
    pub billable_minutes: i64,
    pub authors: Vec<String>,
    pub types: Vec<String>,
    pub texts: Vec<String>,
    pub durations: Vec<i64>,
    pub created: Vec<Value>,
    /// `author (N min) - text`
    pub details: Vec<String>,
}

impl WorkItemSummary {
    /// 合計時間（時間単位、小数2桁に丸め）
    pub fn spent_hours(&self) -> f64 {
        (self.total_minutes as f64 / 60.0 * 100.0).round() / 100.0
    }

    /// 明細を ` | ` で連結した読みやすい形式
    pub fn detail(&self) -> String {
        self.details.join(" | ")
    }

    fn cells(&self) -> [String; 9] {
        [
            json_array(&self.authors),
            json_array(&self.types),
            json_array(&self.texts),
            json_array(&self.durations),
            json_array(&self.created),
            self.total_minutes.to_string(),
            self.billable_minutes.to_string(),
            format!("{:.2}", self.spent_hours()),
            self.detail(),
        ]
    }
}

/// Issue 1件分のフラットなレコード
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    pub issue_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub resolved: Option<DateTime<Utc>>,
    pub project: Option<String>,
    pub reporter: Option<String>,
    pub assignee: Option<String>,
    /// スキーマの `custom_columns` と同じ順序
    pub custom_values: Vec<Option<String>>,
    pub tags: String,
    pub links: Option<LinkColumns>,
    pub work_items: Option<WorkItemSummary>,
}

impl FlatRecord {
    /// CSVの1行（`None` は空セル）
    pub fn to_row(&self) -> Vec<String> {
        let mut row = vec![
            cell(&self.issue_id),
            cell(&self.summary),
            cell(&self.description),
            timestamp_cell(&self.created),
            timestamp_cell(&self.updated),
            timestamp_cell(&self.resolved),
            cell(&self.project),
            cell(&self.reporter),
            cell(&self.assignee),
        ];
        row.extend(self.custom_values.iter().map(cell));
        row.push(self.tags.clone());
        if let Some(links) = &self.links {
            row.extend(links.cells());
        }
        if let Some(work_items) = &self.work_items {
            row.extend(work_items.cells());
        }
        row
    }
}

/// スキーマに従ってIssueを投影する
#[derive(Debug, Clone, Default)]
pub struct RowProjector {
    schema: RecordSchema,
    billable_policy: BillablePolicy,
}

impl RowProjector {
    pub fn new(schema: RecordSchema) -> Self {
        Self {
            schema,
            billable_policy: BillablePolicy::default(),
        }
    }

    pub fn with_billable_policy(mut self, policy: BillablePolicy) -> Self {
        self.billable_policy = policy;
        self
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn headers(&self) -> Vec<String> {
        self.schema.headers()
    }

    pub fn project(&self, issue: &Issue) -> FlatRecord {
        let custom = &issue.custom_fields;

        let custom_values = self
            .schema
            .custom_columns
            .iter()
            .map(|column| project_column(custom, column))
            .collect();

        FlatRecord {
            issue_id: issue.id_readable.clone(),
            summary: issue.summary.clone(),
            description: issue.description.clone(),
            created: issue.created.as_ref().and_then(parse_epoch_millis),
            updated: issue.updated.as_ref().and_then(parse_epoch_millis),
            resolved: issue.resolved.as_ref().and_then(parse_epoch_millis),
            project: issue.project_name().map(str::to_string),
            reporter: issue.reporter_name().map(str::to_string),
            assignee: resolve_assignee(issue),
            custom_values,
            tags: issue.tag_names().collect::<Vec<_>>().join(", "),
            links: self
                .schema
                .include_links
                .then(|| extract_links(&issue.links)),
            work_items: self
                .schema
                .include_work_items
                .then(|| summarize_work_items(&issue.work_items, self.billable_policy)),
        }
    }

    /// 入力順を保ったまま全件を投影
    pub fn project_all(&self, issues: &[Issue]) -> Vec<FlatRecord> {
        issues.iter().map(|issue| self.project(issue)).collect()
    }
}

fn project_column(fields: &[CustomField], column: &CustomColumn) -> Option<String> {
    match column.kind {
        ColumnKind::Sprints => Some(json_array(&sprint_names(fields))),
        ColumnKind::Scalar => find_field(fields, &column.field_name).and_then(FieldValue::display_value),
        ColumnKind::Timestamp => find_field(fields, &column.field_name)
            .and_then(field_timestamp)
            .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string()),
    }
}

fn field_timestamp(value: &FieldValue) -> Option<DateTime<Utc>> {
    match value.raw_scalar() {
        Some(raw) => parse_epoch_millis(raw),
        None => value
            .display_value()
            .and_then(|s| parse_epoch_millis(&Value::String(s))),
    }
}

/// Sprints フィールドの名前一覧（単一オブジェクトでも配列、無ければ空）
pub fn sprint_names(fields: &[CustomField]) -> Vec<String> {
    find_field(fields, SPRINTS_FIELD)
        .map(FieldValue::names)
        .unwrap_or_default()
}

/// ルートの担当者、無ければ `Assignee` カスタムフィールド
pub fn resolve_assignee(issue: &Issue) -> Option<String> {
    issue
        .assignee_name()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| find_field(&issue.custom_fields, ASSIGNEE_FIELD).and_then(FieldValue::display_value))
}

pub fn extract_links(links: &[IssueLink]) -> LinkColumns {
    let mut columns = LinkColumns::default();

    for link in links {
        let direction = link.direction.as_deref().unwrap_or("");
        let link_type = link.link_type_name().unwrap_or("");
        for target in &link.issues {
            columns.directions.push(direction.to_string());
            columns.link_types.push(link_type.to_string());
            columns.issue_ids.push(target.id_readable.clone().unwrap_or_default());
            columns.summaries.push(target.summary.clone().unwrap_or_default());
        }
    }

    columns
}

pub fn summarize_work_items(items: &[WorkItem], policy: BillablePolicy) -> WorkItemSummary {
    let mut summary = WorkItemSummary::default();

    for item in items {
        let minutes = item.minutes();
        // 巨大な値でもi64::MAXで止まる
        summary.total_minutes = summary.total_minutes.saturating_add(minutes);
        if policy.is_billable(item) {
            summary.billable_minutes = summary.billable_minutes.saturating_add(minutes);
        }

        let text = item.text.clone().unwrap_or_default();
        summary
            .details
            .push(format!("{} ({} min) - {}", item.author_name(), minutes, text));

        summary.authors.push(item.author_name().to_string());
        summary.types.push(item.type_name().to_string());
        summary.texts.push(text);
        summary.durations.push(minutes);
        summary.created.push(item.created.clone().unwrap_or(Value::Null));
    }

    summary
}

/// エポックミリ秒（数値または数字の文字列）を日時に変換。変換できなければ `None`
pub fn parse_epoch_millis(value: &Value) -> Option<DateTime<Utc>> {
    let millis = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;

    DateTime::from_timestamp_millis(millis)
}

fn json_array<T: Serialize>(items: &[T]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn timestamp_cell(value: &Option<DateTime<Utc>>) -> String {
    value
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NamedValue;
    use serde_json::json;

    fn issue(value: Value) -> Issue {
        serde_json::from_value(value).unwrap()
    }

    fn work_item(minutes: i64, attributes: Value) -> WorkItem {
        serde_json::from_value(json!({
            "author": {"fullName": "Dev"},
            "duration": {"minutes": minutes},
            "text": "work",
            "created": 1704067200000i64,
            "attributes": attributes
        }))
        .unwrap()
    }

    #[test]
    fn test_empty_custom_fields_yield_empty_values() {
        // Given: カスタムフィールドを持たないIssue
        let issue = Issue::new("2-1");
        let projector = RowProjector::new(RecordSchema::standard());

        // When: 投影
        let record = projector.project(&issue);

        // Then: すべてnullか空で、パニックしない
        assert!(record.custom_values.iter().enumerate().all(|(i, v)| {
            let column = &projector.schema().custom_columns[i];
            match column.kind {
                ColumnKind::Sprints => v.as_deref() == Some("[]"),
                _ => v.is_none(),
            }
        }));
        assert!(record.assignee.is_none());
        assert!(record.created.is_none());
        assert_eq!(record.tags, "");
        assert!(record.links.as_ref().unwrap().is_empty());
        let work = record.work_items.as_ref().unwrap();
        assert_eq!(work.total_minutes, 0);
        assert_eq!(work.billable_minutes, 0);
    }

    #[test]
    fn test_work_item_totals_and_billable_minutes() {
        // Given: 30, 45, 0 分の作業時間のうち 45 分が請求対象
        let items = vec![
            work_item(30, json!([])),
            work_item(45, json!([{"name": "Billable", "value": {"name": "Yes"}}])),
            work_item(0, json!([])),
        ];

        // When: 集計
        let summary = summarize_work_items(&items, BillablePolicy::Either);

        // Then: 合計75分、請求対象45分
        assert_eq!(summary.total_minutes, 75);
        assert_eq!(summary.billable_minutes, 45);
        assert_eq!(summary.durations, vec![30, 45, 0]);
        assert_eq!(summary.spent_hours(), 1.25);
    }

    #[test]
    fn test_missing_duration_is_zero_in_totals() {
        let items: Vec<WorkItem> = vec![
            serde_json::from_value(json!({"text": "no duration"})).unwrap(),
            work_item(20, json!([])),
        ];

        let summary = summarize_work_items(&items, BillablePolicy::Either);

        assert_eq!(summary.total_minutes, 20);
        assert_eq!(summary.durations, vec![0, 20]);
        assert_eq!(summary.created[0], Value::Null);
    }

    #[test]
    fn test_billable_policy_variants() {
        let by_attribute = work_item(10, json!([{"name": "Billable", "value": {"name": "Yes"}}]));
        let by_value = work_item(20, json!([{"name": "Category", "value": {"name": "Billable"}}]));
        let items = vec![by_attribute, by_value];

        assert_eq!(summarize_work_items(&items, BillablePolicy::Either).billable_minutes, 30);
        assert_eq!(summarize_work_items(&items, BillablePolicy::AttributeYes).billable_minutes, 10);
        assert_eq!(summarize_work_items(&items, BillablePolicy::ValueNamedBillable).billable_minutes, 20);
    }

    #[test]
    fn test_sprints_single_object_becomes_array() {
        let fields = vec![CustomField::new(
            "Sprints",
            FieldValue::Named(NamedValue::named("Sprint 7")),
        )];

        assert_eq!(json_array(&sprint_names(&fields)), r#"["Sprint 7"]"#);
    }

    #[test]
    fn test_sprints_list_and_absent() {
        let fields = vec![CustomField::new(
            "Sprints",
            FieldValue::NamedList(vec![NamedValue::named("Sprint 1"), NamedValue::named("Sprint 2")]),
        )];

        assert_eq!(json_array(&sprint_names(&fields)), r#"["Sprint 1","Sprint 2"]"#);
        assert_eq!(json_array(&sprint_names(&[])), "[]");
        assert_eq!(
            json_array(&sprint_names(&[CustomField::new("Sprints", FieldValue::Absent)])),
            "[]"
        );
    }

    #[test]
    fn test_links_expand_per_target_preserving_pairs() {
        // Given: 対象Issueを2件ずつ持つリンク2件
        let issue = issue(json!({
            "id": "2-1",
            "links": [
                {
                    "direction": "OUTWARD",
                    "linkType": {"name": "Depend"},
                    "issues": [
                        {"idReadable": "ERP-2", "summary": "two"},
                        {"idReadable": "ERP-3", "summary": "three"}
                    ]
                },
                {
                    "direction": "INWARD",
                    "linkType": {"name": "Duplicate"},
                    "issues": [
                        {"idReadable": "ERP-4", "summary": "four"},
                        {"idReadable": "ERP-5"}
                    ]
                }
            ]
        }));

        // When: リンクを展開
        let links = extract_links(&issue.links);

        // Then: 4要素の並列配列で組が保たれる
        assert_eq!(links.len(), 4);
        assert_eq!(links.directions, vec!["OUTWARD", "OUTWARD", "INWARD", "INWARD"]);
        assert_eq!(links.link_types, vec!["Depend", "Depend", "Duplicate", "Duplicate"]);
        assert_eq!(links.issue_ids, vec!["ERP-2", "ERP-3", "ERP-4", "ERP-5"]);
        assert_eq!(links.summaries, vec!["two", "three", "four", ""]);
        assert_eq!(links.link_types.len(), links.summaries.len());
    }

    #[test]
    fn test_unparsable_timestamp_becomes_none() {
        assert!(parse_epoch_millis(&json!("yesterday")).is_none());
        assert!(parse_epoch_millis(&json!({"ms": 1})).is_none());
        assert!(parse_epoch_millis(&json!(i64::MAX)).is_none());

        let record = RowProjector::default().project(&issue(json!({
            "id": "2-1",
            "created": "not-a-timestamp",
            "updated": 1704067200000i64
        })));

        assert!(record.created.is_none());
        assert_eq!(
            record.updated.unwrap().format(TIMESTAMP_FORMAT).to_string(),
            "2024-01-01 00:00:00"
        );
    }

    #[test]
    fn test_numeric_string_timestamp_is_parsed() {
        let dt = parse_epoch_millis(&json!("1704067200000")).unwrap();
        assert_eq!(dt.format(TIMESTAMP_FORMAT).to_string(), "2024-01-01 00:00:00");
    }

    #[test]
    fn test_assignee_falls_back_to_custom_field() {
        let with_root = issue(json!({
            "id": "2-1",
            "assignee": {"fullName": "Root Person"},
            "customFields": [{"name": "Assignee", "value": {"name": "Field Person"}}]
        }));
        let without_root = issue(json!({
            "id": "2-2",
            "customFields": [{"name": "Assignee", "value": {"name": "Field Person"}}]
        }));

        assert_eq!(resolve_assignee(&with_root).as_deref(), Some("Root Person"));
        assert_eq!(resolve_assignee(&without_root).as_deref(), Some("Field Person"));
        assert!(resolve_assignee(&Issue::new("2-3")).is_none());
    }

    #[test]
    fn test_project_full_issue_row() {
        let issue = issue(json!({
            "id": "2-10",
            "idReadable": "ERP-10",
            "summary": "Report totals",
            "created": 1704067200000i64,
            "project": {"name": "ERPOne"},
            "reporter": {"fullName": "Priya Menon"},
            "customFields": [
                {"name": "State", "value": {"name": "Open"}},
                {"name": "Due Date", "value": 1704153600000i64},
                {"name": "Story points", "value": 3},
                {"name": "Work Types", "value": [{"name": "Dev"}, {"name": "QA"}]},
                {"name": "Sprints", "value": {"name": "Sprint 7"}}
            ],
            "tags": [{"name": "finance"}, {"name": "q1"}]
        }));
        let projector = RowProjector::new(RecordSchema::standard());

        let record = projector.project(&issue);
        let row = record.to_row();
        let headers = projector.headers();
        let get = |name: &str| {
            let idx = headers.iter().position(|h| h == name).unwrap();
            row[idx].clone()
        };

        assert_eq!(row.len(), headers.len());
        assert_eq!(get("Issue_ID"), "ERP-10");
        assert_eq!(get("Created"), "2024-01-01 00:00:00");
        assert_eq!(get("Resolved"), "");
        assert_eq!(get("Project"), "ERPOne");
        assert_eq!(get("State"), "Open");
        assert_eq!(get("Due_Date"), "2024-01-02 00:00:00");
        assert_eq!(get("Story_Points"), "3");
        assert_eq!(get("Work_Types"), "Dev, QA");
        assert_eq!(get("Sprints"), r#"["Sprint 7"]"#);
        assert_eq!(get("Priority"), "");
        assert_eq!(get("Tags"), "finance, q1");
        assert_eq!(get("Link_Direction"), "[]");
        assert_eq!(get("Total_WorkItem_Minutes"), "0");
        assert_eq!(get("Spent_Time_Hours"), "0.00");
    }

    #[test]
    fn test_project_all_preserves_order() {
        let issues = vec![Issue::new("2-3"), Issue::new("2-1"), Issue::new("2-2")];
        let issues: Vec<Issue> = issues
            .into_iter()
            .map(|mut i| {
                i.id_readable = Some(format!("ERP-{}", i.id));
                i
            })
            .collect();

        let records = RowProjector::default().project_all(&issues);

        let ids: Vec<_> = records.iter().map(|r| r.issue_id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["ERP-2-3", "ERP-2-1", "ERP-2-2"]);
    }

    #[test]
    fn test_schema_without_optional_groups() {
        let schema = RecordSchema::compact()
            .include_links(false)
            .include_work_items(false);
        let projector = RowProjector::new(schema);

        let record = projector.project(&Issue::new("2-1"));

        assert!(record.links.is_none());
        assert!(record.work_items.is_none());
        assert_eq!(record.to_row().len(), projector.headers().len());
        assert_eq!(projector.headers().len(), 9 + 7 + 1);
    }

    #[test]
    fn test_work_item_cells_are_json_arrays() {
        let items = vec![work_item(15, json!([]))];

        let cells = summarize_work_items(&items, BillablePolicy::Either).cells();

        assert_eq!(cells[0], r#"["Dev"]"#);
        assert_eq!(cells[1], r#"[""]"#);
        assert_eq!(cells[2], r#"["work"]"#);
        assert_eq!(cells[3], "[15]");
        assert_eq!(cells[4], "[1704067200000]");
        assert_eq!(cells[7], "0.25");
        assert_eq!(cells[8], "Dev (15 min) - work");
    }

    #[test]
    fn test_work_item_details_joined() {
        let items: Vec<WorkItem> = vec![
            work_item(30, json!([])),
            serde_json::from_value(json!({"author": {"fullName": "QA"}})).unwrap(),
        ];

        let summary = summarize_work_items(&items, BillablePolicy::Either);

        assert_eq!(summary.detail(), "Dev (30 min) - work | QA (0 min) - ");
        assert_eq!(summarize_work_items(&[], BillablePolicy::Either).detail(), "");
    }

    #[test]
    fn test_huge_durations_saturate_instead_of_overflowing() {
        // Given: 合計するとi64を超える所要時間
        let items = vec![
            work_item(i64::MAX, json!([{"name": "Billable", "value": {"name": "Yes"}}])),
            work_item(1, json!([{"name": "Billable", "value": {"name": "Yes"}}])),
        ];

        // When: 集計
        let summary = summarize_work_items(&items, BillablePolicy::Either);

        // Then: パニックせず上限で止まる
        assert_eq!(summary.total_minutes, i64::MAX);
        assert_eq!(summary.billable_minutes, i64::MAX);
        assert_eq!(summary.durations, vec![i64::MAX, 1]);
        assert!(summary.spent_hours().is_finite());
    }

    #[test]
    fn test_schema_preset_serde_names() {
        let preset: SchemaPreset = serde_json::from_value(json!("compact")).unwrap();
        assert_eq!(preset.to_schema(), RecordSchema::compact());
    }
}
