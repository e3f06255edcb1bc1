//! YouTrackのIssueをCSVに書き出し、設定があればS3にアップロードする
//!
//! 設定の優先順位:
//! 1. `--config <path>` のJSONファイル
//! 2. 環境変数（`.env` も読む）
//! 3. `<config_dir>/youtrack-export/config.json`

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;
use youtrack_export::{Error, ExportConfig, ExportPipeline, ExportReport};

#[derive(Debug, Parser)]
#[command(name = "youtrack-export", version, about = "Export YouTrack issues to CSV")]
struct Cli {
    /// JSON設定ファイル
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// CSVの出力先ディレクトリ
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// 対象プロジェクト
    #[arg(long)]
    project: Option<String>,

    /// S3へのアップロードを行わない
    #[arg(long)]
    no_upload: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(report) => {
            print_summary(&report);
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(err) => {
            error!("export failed: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExportReport> {
    let mut config = load_config(cli.config.as_ref()).await?;

    if let Some(project) = cli.project {
        config = config.with_project(project);
    }
    if let Some(dir) = cli.output_dir {
        config = config.with_output_dir(dir);
    }
    if cli.no_upload {
        config = config.without_upload();
    }

    let pipeline = ExportPipeline::new(config).context("invalid export configuration")?;
    pipeline.run().await.context("export did not complete")
}

async fn load_config(path: Option<&PathBuf>) -> Result<ExportConfig> {
    if let Some(path) = path {
        return ExportConfig::from_file(path)
            .await
            .with_context(|| format!("failed to load config from {}", path.display()));
    }

    match ExportConfig::from_env() {
        Ok(config) => Ok(config),
        Err(Error::ConfigurationMissing(msg)) => {
            let default_path = ExportConfig::default_config_path().context(msg.clone())?;
            if !default_path.exists() {
                anyhow::bail!("{} (and no config file at {})", msg, default_path.display());
            }
            ExportConfig::from_file(&default_path)
                .await
                .with_context(|| format!("failed to load config from {}", default_path.display()))
        }
        Err(e) => Err(e).context("invalid environment configuration"),
    }
}

fn print_summary(report: &ExportReport) {
    println!("📊 Export summary");
    println!("   Issues fetched : {}", report.issues_fetched);
    println!("   Rows written   : {}", report.rows_written);
    println!("   Pages fetched  : {}", report.pages_fetched);
    if report.skipped_items > 0 {
        println!("⚠️  Skipped items : {}", report.skipped_items);
    }
    if let Some(reason) = &report.stop_reason {
        println!("   Stop reason    : {:?}", reason);
    }
    if let Some(path) = &report.csv_path {
        println!("   CSV            : {}", path.display());
    }
    if let Some(key) = &report.uploaded_key {
        println!("   Uploaded key   : {}", key);
    }
    if let Some(err) = &report.upload_error {
        println!("⚠️  Upload failed : {}", err);
    }
    println!("   Duration       : {:.2}s", report.duration_seconds());
}
