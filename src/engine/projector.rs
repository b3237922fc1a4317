// ==========================================
// SSP 犯罪数据 ETL - 最终列投影
// ==========================================
// 职责: 按主列序选择并排序实际存在的列
// 规则: 缺失列直接省略，不合成 Null 列
// ==========================================

use crate::domain::dataset::Dataset;
use crate::domain::report::TransformReport;
use crate::engine::error::EngineResult;
use crate::engine::stage::TransformStage;
use tracing::debug;

pub struct SchemaProjector {
    final_columns: Vec<String>,
}

impl SchemaProjector {
    pub fn new(final_columns: Vec<String>) -> Self {
        Self { final_columns }
    }
}

impl TransformStage for SchemaProjector {
    fn name(&self) -> &'static str {
        "projector"
    }

    // 主列序覆盖所有已知源格式，单次运行缺列属常态，不计入跳过
    fn touched_columns(&self) -> Vec<String> {
        Vec::new()
    }

    fn apply(&self, dataset: Dataset, _report: &mut TransformReport) -> EngineResult<Dataset> {
        let dropped: Vec<String> = dataset
            .columns()
            .iter()
            .filter(|c| !self.final_columns.contains(*c))
            .cloned()
            .collect();
        if !dropped.is_empty() {
            debug!(dropped = ?dropped, "未列入最终列序的列已移除");
        }

        let order: Vec<&str> = self.final_columns.iter().map(String::as_str).collect();
        Ok(dataset.select(&order))
    }
}
