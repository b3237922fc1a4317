// ==========================================
// SSP 犯罪数据 ETL - 参数化转换管道
// ==========================================
// 职责: 由 PipelineConfig 组装阶段序列并顺序执行
// 顺序: 类别过滤 → 日期规整 → 空值填充 → 重命名 → 文本规范化
//       → 数值规整 → 时刻规整 → 最终列投影
// 约束: 严格分阶段；每阶段完整物化输出后下一阶段才开始
// ==========================================

use crate::config::PipelineConfig;
use crate::domain::dataset::Dataset;
use crate::domain::types::FieldType;
use crate::domain::report::TransformReport;
use crate::engine::categorical_filter::CategoricalFilter;
use crate::engine::data_cleaner::{NullFiller, TextNormalizer};
use crate::engine::date_normalizer::DateNormalizer;
use crate::engine::error::EngineResult;
use crate::engine::field_mapper::ColumnRenamer;
use crate::engine::projector::SchemaProjector;
use crate::engine::stage::{run_stage, TransformStage};
use crate::engine::type_coercer::{NumericCoercer, TextCoercer, TimeCoercer};
use tracing::info;

pub struct TransformPipeline {
    stages: Vec<Box<dyn TransformStage>>,
}

impl TransformPipeline {
    /// 由配置组装阶段（未配置的可选阶段不加入）
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut stages: Vec<Box<dyn TransformStage>> = Vec::new();

        if !config.filters.is_empty() {
            stages.push(Box::new(CategoricalFilter::new(
                &config.filters,
                config.missing_filter_column,
            )));
        }
        if let Some(date) = &config.date {
            stages.push(Box::new(DateNormalizer::new(date.clone())));
        }
        if !config.null_fill_columns.is_empty() {
            stages.push(Box::new(NullFiller::new(
                config.null_fill_columns.clone(),
                &config.sentinel,
            )));
        }
        if !config.rename.is_empty() {
            stages.push(Box::new(ColumnRenamer::new(config.rename.clone())));
        }
        if config.normalize_text {
            // 时刻列不文本化；派生星期列保持固定名称表
            let mut excluded: Vec<String> = config.time_column.iter().cloned().collect();
            if let Some(date) = &config.date {
                excluded.push(config.canonical_name(&date.weekday_column).to_string());
            }
            stages.push(Box::new(TextNormalizer::new(&config.sentinel, excluded)));
        }
        if !config.integer_columns.is_empty() || !config.float_columns.is_empty() {
            stages.push(Box::new(NumericCoercer::new(
                config.integer_columns.clone(),
                config.float_columns.clone(),
                config.integer_policy,
                &config.sentinel,
            )));
        }
        if let Some(time_column) = &config.time_column {
            stages.push(Box::new(TimeCoercer::new(time_column)));
        }
        let text_columns = config.schema.names_of_type(FieldType::Text);
        if !text_columns.is_empty() {
            stages.push(Box::new(TextCoercer::new(text_columns)));
        }
        stages.push(Box::new(SchemaProjector::new(config.final_columns.clone())));

        Self { stages }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// 执行全部阶段
    pub fn run(&self, dataset: Dataset) -> EngineResult<(Dataset, TransformReport)> {
        let mut report = TransformReport {
            input_rows: dataset.len(),
            ..Default::default()
        };

        let mut current = dataset;
        for stage in &self.stages {
            current = run_stage(stage.as_ref(), current, &mut report)?;
        }

        report.output_rows = current.len();
        report.output_columns = current.columns().to_vec();
        info!(
            input_rows = report.input_rows,
            output_rows = report.output_rows,
            output_columns = report.output_columns.len(),
            dropped_invalid_dates = report.dropped_invalid_dates,
            dropped_invalid_integers = report.dropped_invalid_integers,
            "转换管道完成"
        );
        Ok((current, report))
    }
}
