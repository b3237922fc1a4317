// ==========================================
// SSP 犯罪数据 ETL - 转换阶段抽象
// ==========================================
// 职责: 列存在性驱动的阶段接口
// 约束: 每个阶段声明其触及的列；缺失列由 run_stage 统一告警并记录，
//       阶段内部对缺失列按列逐个 no-op
// 约束: 数据集以所有权转移方式在阶段间传递
// ==========================================

use crate::domain::dataset::Dataset;
use crate::domain::report::TransformReport;
use crate::engine::error::{EngineError, EngineResult};
use tracing::{debug, warn};

// ==========================================
// TransformStage Trait
// ==========================================
// 实现者: CategoricalFilter, DateNormalizer, NullFiller, ColumnRenamer,
//         TextNormalizer, NumericCoercer, TimeCoercer, SchemaProjector
pub trait TransformStage: Send + Sync {
    /// 阶段名称（用于日志与报告）
    fn name(&self) -> &'static str;

    /// 阶段触及的输入列
    fn touched_columns(&self) -> Vec<String>;

    /// 缺失列是否可容忍（false 时缺失即失败）
    fn tolerates_missing(&self) -> bool {
        true
    }

    /// 执行阶段
    fn apply(&self, dataset: Dataset, report: &mut TransformReport) -> EngineResult<Dataset>;
}

/// 执行单个阶段（统一处理缺失列）
pub fn run_stage(
    stage: &dyn TransformStage,
    dataset: Dataset,
    report: &mut TransformReport,
) -> EngineResult<Dataset> {
    let touched = stage.touched_columns();
    let (_, missing) = dataset.partition_columns(&touched);

    if let Some(column) = missing.first() {
        if !stage.tolerates_missing() {
            return Err(EngineError::MissingFilterColumn {
                stage: stage.name().to_string(),
                column: column.to_string(),
            });
        }
    }
    for column in &missing {
        warn!(stage = stage.name(), column = %column, "列不存在，跳过");
        report.record_skipped(stage.name(), column);
    }

    let rows_in = dataset.len();
    let output = stage.apply(dataset, report)?;
    debug!(
        stage = stage.name(),
        rows_in,
        rows_out = output.len(),
        columns = output.columns().len(),
        "阶段完成"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CellValue;

    struct Touch {
        columns: Vec<String>,
        strict: bool,
    }

    impl TransformStage for Touch {
        fn name(&self) -> &'static str {
            "touch"
        }
        fn touched_columns(&self) -> Vec<String> {
            self.columns.clone()
        }
        fn tolerates_missing(&self) -> bool {
            !self.strict
        }
        fn apply(&self, dataset: Dataset, _report: &mut TransformReport) -> EngineResult<Dataset> {
            Ok(dataset)
        }
    }

    fn dataset() -> Dataset {
        Dataset::from_rows(vec!["A".to_string()], vec![vec![CellValue::from("x")]])
    }

    #[test]
    fn test_missing_columns_recorded() {
        let stage = Touch {
            columns: vec!["A".to_string(), "B".to_string()],
            strict: false,
        };
        let mut report = TransformReport::default();
        let out = run_stage(&stage, dataset(), &mut report).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(report.skipped_columns["touch"], vec!["B".to_string()]);
    }

    #[test]
    fn test_missing_columns_fail_when_strict() {
        let stage = Touch {
            columns: vec!["B".to_string()],
            strict: true,
        };
        let mut report = TransformReport::default();
        let result = run_stage(&stage, dataset(), &mut report);
        assert!(matches!(result, Err(EngineError::MissingFilterColumn { .. })));
    }
}
