// ==========================================
// SSP 犯罪数据 ETL - 运行编排
// ==========================================
// 职责: 源读取 → 汇总 → 转换 → 加载前检查 → 加载（或试运行）
// 约束: 阶段边界失败（I/O、加载拒绝）向上传播并终止本次运行
// 约束: 无数据（无批次准入 / 无行存活）为正常结束，不调用加载
// ==========================================

use crate::config::PipelineConfig;
use crate::domain::dataset::RawRecordBatch;
use crate::domain::report::{LoadOutcome, RunOutcome, RunSummary, TransformReport};
use crate::engine::dq_validator::DqValidator;
use crate::engine::error::PipelineResult;
use crate::engine::loader::SchemaValidatedLoader;
use crate::engine::transform::TransformPipeline;
use crate::importer::{load_sources, Consolidator, SourceReader};
use crate::repository::DatasetSink;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

pub struct EtlOrchestrator {
    config: PipelineConfig,
    reader: Arc<dyn SourceReader>,
    sink: Option<Arc<dyn DatasetSink>>, // None 为试运行
}

impl EtlOrchestrator {
    pub fn new(config: PipelineConfig, reader: Arc<dyn SourceReader>) -> Self {
        Self {
            config,
            reader,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DatasetSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 从源文件执行完整运行
    pub async fn run(&self, sources: Vec<PathBuf>) -> PipelineResult<RunSummary> {
        let started = Instant::now();
        let loaded = load_sources(
            sources,
            Arc::clone(&self.reader),
            self.config.source_concurrency,
            self.config.skip_failed_sources,
        )
        .await?;

        let source_ids = loaded
            .iter()
            .map(|s| s.source.display().to_string())
            .collect();
        let batches = loaded.into_iter().flat_map(|s| s.batches).collect();
        self.process(source_ids, batches, started).await
    }

    /// 从已读取的批次执行运行（源读取由调用方完成）
    pub async fn run_batches(
        &self,
        source_ids: Vec<String>,
        batches: Vec<RawRecordBatch>,
    ) -> PipelineResult<RunSummary> {
        self.process(source_ids, batches, Instant::now()).await
    }

    async fn process(
        &self,
        sources: Vec<String>,
        batches: Vec<RawRecordBatch>,
        started: Instant,
    ) -> PipelineResult<RunSummary> {
        let run_id = Uuid::new_v4().to_string();
        info!(
            run_id = %run_id,
            pipeline = %self.config.name,
            sources = sources.len(),
            batches = batches.len(),
            "开始运行"
        );

        // === 汇总 ===
        let consolidation =
            Consolidator::new(self.config.sheet_prefix.as_deref()).consolidate(batches);
        let Some(dataset) = consolidation.dataset else {
            let summary = RunSummary {
                run_id,
                outcome: RunOutcome::NoData,
                sources,
                admissions: consolidation.admissions,
                transform: None,
                residuals: Vec::new(),
                load: LoadOutcome::Skipped {
                    reason: "无批次准入".to_string(),
                },
                elapsed_ms: started.elapsed().as_millis(),
            };
            log_summary(&summary);
            return Ok(summary);
        };

        // === 转换 ===
        let pipeline = TransformPipeline::from_config(&self.config);
        let (transformed, report) = pipeline.run(dataset)?;

        // === 加载前检查 ===
        let validator = DqValidator::new(self.config.numeric_check_columns.clone());
        let residuals = validator.find_non_numeric_values(&transformed, &report.coercion_failures);
        DqValidator::log_profile(&transformed);

        // === 加载 ===
        let (outcome, load) = match &self.sink {
            None => (
                RunOutcome::DryRun,
                LoadOutcome::Skipped {
                    reason: "试运行，未加载".to_string(),
                },
            ),
            Some(sink) => {
                let loader = SchemaValidatedLoader::new(Arc::clone(sink));
                let load = loader
                    .load(&transformed, &self.config.schema, &self.config.destination_table)
                    .await?;
                let outcome = match load {
                    LoadOutcome::Loaded { .. } => RunOutcome::Completed,
                    LoadOutcome::Skipped { .. } => RunOutcome::NoData,
                };
                (outcome, load)
            }
        };

        let summary = RunSummary {
            run_id,
            outcome,
            sources,
            admissions: consolidation.admissions,
            transform: Some(report),
            residuals,
            load,
            elapsed_ms: started.elapsed().as_millis(),
        };

        if let (Some(sink), RunOutcome::Completed) = (&self.sink, summary.outcome) {
            sink.record_run(&summary).await?;
        }
        log_summary(&summary);
        Ok(summary)
    }
}

fn log_summary(summary: &RunSummary) {
    let empty = TransformReport::default();
    let report = summary.transform.as_ref().unwrap_or(&empty);
    info!(
        run_id = %summary.run_id,
        outcome = ?summary.outcome,
        input_rows = report.input_rows,
        output_rows = report.output_rows,
        residual_columns = summary.residuals.len(),
        elapsed_ms = summary.elapsed_ms as u64,
        "运行结束"
    );
    if !summary.residuals.is_empty() {
        warn!(
            columns = ?summary.residuals.iter().map(|r| r.column.as_str()).collect::<Vec<_>>(),
            "数值列存在非数值内容，请核查源数据"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::presets::produtividade;
    use crate::domain::types::CellValue;
    use crate::importer::UniversalSourceReader;
    use std::io;
    use std::sync::Mutex;

    // 收集日志输出
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_no_admitted_batch_still_logs_run_end() {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut batch = RawRecordBatch::new(Some("OUTROS".to_string()), vec!["NUM_BO".to_string()]);
        batch.push_row(vec![CellValue::from("BO-1")]);
        let orchestrator =
            EtlOrchestrator::new(produtividade(), Arc::new(UniversalSourceReader::new(false)));

        let summary = orchestrator
            .run_batches(vec!["fixture.xlsx".to_string()], vec![batch])
            .await
            .unwrap();

        assert_eq!(summary.outcome, RunOutcome::NoData);
        assert!(summary.transform.is_none());
        let logged = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("运行结束"));
        assert!(logged.contains("NoData"));
    }
}
