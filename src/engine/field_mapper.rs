// ==========================================
// SSP 犯罪数据 ETL - 列重命名
// ==========================================
// 职责: 源列名 → 规范列名
// 规则: 仅数据集中存在的键参与；未映射列保留原名
// 规则: 目标名已被其他列占用时跳过该项并告警
// ==========================================

use crate::config::ColumnRename;
use crate::domain::dataset::Dataset;
use crate::domain::report::TransformReport;
use crate::engine::error::EngineResult;
use crate::engine::stage::TransformStage;
use tracing::{info, warn};

pub struct ColumnRenamer {
    mapping: Vec<ColumnRename>,
}

impl ColumnRenamer {
    pub fn new(mapping: Vec<ColumnRename>) -> Self {
        Self { mapping }
    }
}

impl TransformStage for ColumnRenamer {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn touched_columns(&self) -> Vec<String> {
        self.mapping.iter().map(|m| m.from.clone()).collect()
    }

    fn apply(&self, mut dataset: Dataset, report: &mut TransformReport) -> EngineResult<Dataset> {
        for entry in &self.mapping {
            if !dataset.has_column(&entry.from) {
                continue;
            }
            if dataset.rename_column(&entry.from, &entry.to) {
                report
                    .renamed_columns
                    .push((entry.from.clone(), entry.to.clone()));
            } else {
                warn!(from = %entry.from, to = %entry.to, "目标列名已存在，跳过重命名");
                report.record_skipped(self.name(), &entry.from);
            }
        }
        info!(renamed = report.renamed_columns.len(), "列重命名完成");
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CellValue;
    use crate::engine::stage::run_stage;

    fn mapping(pairs: &[(&str, &str)]) -> Vec<ColumnRename> {
        pairs
            .iter()
            .map(|(from, to)| ColumnRename {
                from: from.to_string(),
                to: to.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_rename_absent_keys_ignored() {
        let ds = Dataset::from_rows(
            vec!["NUM_BO".to_string(), "EXTRA".to_string()],
            vec![vec![CellValue::from("1"), CellValue::from("x")]],
        );
        let stage = ColumnRenamer::new(mapping(&[
            ("NUM_BO", "codigo_bo"),
            ("BAIRRO", "bairro"),
        ]));
        let mut report = TransformReport::default();
        let out = run_stage(&stage, ds, &mut report).unwrap();
        assert_eq!(out.columns(), &["codigo_bo".to_string(), "EXTRA".to_string()]);
        assert_eq!(
            report.renamed_columns,
            vec![("NUM_BO".to_string(), "codigo_bo".to_string())]
        );
    }

    #[test]
    fn test_rename_collision_skipped() {
        let ds = Dataset::from_rows(
            vec!["LATITUDE".to_string(), "latitude".to_string()],
            vec![vec![CellValue::from("1"), CellValue::from("2")]],
        );
        let stage = ColumnRenamer::new(mapping(&[("LATITUDE", "latitude")]));
        let mut report = TransformReport::default();
        let out = run_stage(&stage, ds, &mut report).unwrap();
        assert_eq!(out.columns(), &["LATITUDE".to_string(), "latitude".to_string()]);
        assert!(report.renamed_columns.is_empty());
    }
}
