// ==========================================
// SSP 犯罪数据 ETL - 类别过滤
// ==========================================
// 职责: 按维度值集合限定行（辖区）
// 规则: 两侧大写后精确成员判定（非子串、非正则）
// 规则: 行须满足全部"存在列"的谓词；Null 永不匹配
// 规则: 过滤列缺失按 MissingColumnPolicy 处理（Skip 告警 / Fail 失败）
// ==========================================

use crate::config::{FilterRule, MissingColumnPolicy};
use crate::domain::dataset::Dataset;
use crate::domain::report::TransformReport;
use crate::domain::types::CellValue;
use crate::engine::error::EngineResult;
use crate::engine::stage::TransformStage;
use std::collections::HashSet;
use tracing::info;

pub struct CategoricalFilter {
    predicates: Vec<(String, HashSet<String>)>, // 列 → 大写接受值
    policy: MissingColumnPolicy,
}

impl CategoricalFilter {
    pub fn new(rules: &[FilterRule], policy: MissingColumnPolicy) -> Self {
        let predicates = rules
            .iter()
            .map(|rule| {
                let accepted = rule.accepted.iter().map(|v| v.to_uppercase()).collect();
                (rule.column.clone(), accepted)
            })
            .collect();
        Self { predicates, policy }
    }

    fn matches(cell: &CellValue, accepted: &HashSet<String>) -> bool {
        cell.to_text()
            .map(|value| accepted.contains(&value.to_uppercase()))
            .unwrap_or(false)
    }
}

impl TransformStage for CategoricalFilter {
    fn name(&self) -> &'static str {
        "categorical_filter"
    }

    fn touched_columns(&self) -> Vec<String> {
        self.predicates.iter().map(|(c, _)| c.clone()).collect()
    }

    fn tolerates_missing(&self) -> bool {
        self.policy == MissingColumnPolicy::Skip
    }

    fn apply(&self, mut dataset: Dataset, report: &mut TransformReport) -> EngineResult<Dataset> {
        // 仅存在列参与判定
        let active: Vec<(usize, &HashSet<String>)> = self
            .predicates
            .iter()
            .filter_map(|(column, accepted)| dataset.column_index(column).map(|i| (i, accepted)))
            .collect();

        let before = dataset.len();
        if !active.is_empty() {
            dataset.retain_rows(|row| {
                active
                    .iter()
                    .all(|(idx, accepted)| Self::matches(&row[*idx], accepted))
            });
        }

        info!(
            input_rows = before,
            retained_rows = dataset.len(),
            active_predicates = active.len(),
            "类别过滤完成"
        );
        report.filter_retained_rows = Some(dataset.len());
        Ok(dataset)
    }
}
