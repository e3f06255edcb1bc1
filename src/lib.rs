pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod models;
pub mod pipeline;
pub mod projector;
pub mod upload;

pub use client::{YouTrackClient, YouTrackConfig};
pub use error::{Error, Result};
pub use models::*;

// Fetcher re-exports
pub use fetcher::{
    FetchConfig, FetchErrorPolicy, FetchOutcome, IssueFetcher, IssueSource, ProjectIssueSource,
    StopReason,
};

// Projector re-exports
pub use projector::{
    BillablePolicy, ColumnKind, CustomColumn, FlatRecord, LinkColumns, RecordSchema, RowProjector,
    SchemaPreset, WorkItemSummary, parse_epoch_millis,
};

// Output re-exports
pub use export::CsvExporter;
pub use upload::{ObjectStore, S3Uploader, UploadConfig, object_key};

// Pipeline re-exports
pub use config::ExportConfig;
pub use pipeline::{ExportPipeline, ExportReport};
