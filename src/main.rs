// ==========================================
// SSP 犯罪数据 ETL - 命令行入口
// ==========================================
// 子命令:
// - run:         读取源 → 转换 → 加载（或 --dry-run 仅诊断）
// - show-config: 以 JSON 打印内置预设
// ==========================================

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ssp_crime_etl::config::{preset, PipelineConfig, PRESET_NAMES};
use ssp_crime_etl::domain::{LoadOutcome, RunSummary};
use ssp_crime_etl::engine::EtlOrchestrator;
use ssp_crime_etl::importer::{discover_sources, UniversalSourceReader};
use ssp_crime_etl::repository::SqliteDatasetSink;
use ssp_crime_etl::{db, logging, APP_NAME, VERSION};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "ssp-crime-etl")]
#[command(about = "SSP 犯罪数据 ETL：表格汇总、过滤、清洗、类型规整与整表替换加载")]
#[command(version)]
struct Cli {
    /// 以 JSON 行输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 执行一次完整运行
    Run {
        /// 内置预设名（dados-criminais / produtividade）
        #[arg(long, conflicts_with = "config")]
        preset: Option<String>,

        /// JSON 配置文件
        #[arg(long)]
        config: Option<PathBuf>,

        /// 源文件（可重复）
        #[arg(long = "source")]
        sources: Vec<PathBuf>,

        /// 源目录（扫描全部受支持文件）
        #[arg(long)]
        source_dir: Option<PathBuf>,

        /// SQLite 数据库路径（默认位于用户数据目录）
        #[arg(long)]
        db: Option<String>,

        /// 覆盖目标表
        #[arg(long)]
        table: Option<String>,

        /// 仅转换与诊断，不加载
        #[arg(long)]
        dry_run: bool,
    },
    /// 打印内置预设配置（JSON）
    ShowConfig {
        #[arg(long)]
        preset: String,
    },
}

fn resolve_config(preset_name: Option<&str>, config: Option<&PathBuf>) -> Result<PipelineConfig> {
    match (preset_name, config) {
        (Some(name), None) => {
            preset(name).with_context(|| format!("可用预设: {}", PRESET_NAMES.join(", ")))
        }
        (None, Some(path)) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("加载配置失败: {}", path.display())),
        _ => bail!("须且仅须指定 --preset 或 --config 之一"),
    }
}

fn print_summary(summary: &RunSummary) -> Result<()> {
    match &summary.load {
        LoadOutcome::Loaded {
            table, table_rows, ..
        } => println!("✅ 已加载 {} 行到 {}", table_rows, table),
        LoadOutcome::Skipped { reason } => println!("ℹ️  未加载: {}", reason),
    }
    for residual in &summary.residuals {
        println!(
            "⚠️  列 {} 含非数值内容: {}",
            residual.column,
            residual.values.join(", ")
        );
    }
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json);

    info!(version = VERSION, "{}", APP_NAME);

    match cli.command {
        Commands::ShowConfig { preset: name } => {
            let config = preset(&name)?;
            println!("{}", config.to_json_pretty()?);
        }
        Commands::Run {
            preset: preset_name,
            config,
            mut sources,
            source_dir,
            db: db_arg,
            table,
            dry_run,
        } => {
            let mut config = resolve_config(preset_name.as_deref(), config.as_ref())?;
            if let Some(table) = table {
                config.destination_table = table;
            }
            config.validate()?;

            if let Some(dir) = source_dir {
                sources.extend(discover_sources(&dir)?);
            }
            if sources.is_empty() {
                bail!("未指定任何源文件（--source 或 --source-dir）");
            }

            let reader = Arc::new(UniversalSourceReader::new(config.first_sheet_only));
            let mut orchestrator = EtlOrchestrator::new(config, reader);
            if !dry_run {
                let db_path = db_arg.unwrap_or_else(db::default_db_path);
                info!(db = %db_path, "使用数据库");
                let sink = SqliteDatasetSink::new(&db_path)
                    .with_context(|| format!("无法打开数据库: {}", db_path))?;
                orchestrator = orchestrator.with_sink(Arc::new(sink));
            }

            let summary = orchestrator.run(sources).await?;
            print_summary(&summary)?;
        }
    }

    Ok(())
}
