use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{Error, Result};
use crate::projector::FlatRecord;

/// 表計算ソフトがUTF-8として開けるよう先頭に付けるBOM
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// ファイル名に使えない文字（パス区切りや `..` を含む）を `_` に置き換える
pub fn sanitize_file_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// フラットなレコードをCSVファイルに書き出す
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
    file_prefix: String,
}

impl CsvExporter {
    pub fn new<P: AsRef<Path>>(output_dir: P, file_prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            file_prefix: file_prefix.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn file_prefix(&self) -> &str {
        &self.file_prefix
    }

    /// `<prefix>_<YYYYmmdd_HHMMSS>.csv`
    pub fn file_name_at(&self, at: &DateTime<Local>) -> String {
        format!("{}_{}.csv", self.file_prefix, at.format(FILE_TIMESTAMP_FORMAT))
    }

    /// BOM、ヘッダー行、レコード行をメモリ上に組み立てる
    pub fn render(&self, headers: &[String], records: &[FlatRecord]) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());

        writer.write_record(headers)?;
        for record in records {
            writer.write_record(record.to_row())?;
        }

        writer.into_inner().map_err(|e| Error::IoError(e.into_error()))
    }

    /// 現在時刻のファイル名で書き出し、書き出したパスを返す
    pub async fn write(&self, headers: &[String], records: &[FlatRecord]) -> Result<PathBuf> {
        let path = self.output_dir.join(self.file_name_at(&Local::now()));
        self.write_to(&path, headers, records).await?;
        Ok(path)
    }

    pub async fn write_to(&self, path: &Path, headers: &[String], records: &[FlatRecord]) -> Result<()> {
        let data = self.render(headers, records)?;

        // 親ディレクトリを作成
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;

        info!(path = %path.display(), rows = records.len(), "CSV written");
        Ok(())
    }
}
