// ==========================================
// SSP 犯罪数据 ETL - 批次汇总
// ==========================================
// 职责: 多源多批次 → 单一 Dataset
// 规则: 配置了工作表前缀时，仅准入标签（去空白、大写后）以前缀开头的批次
// 规则: 列为各准入批次列的并集，按首次出现顺序；批次缺失的列填 Null
// 规则: 零批次准入 → 无数据集（EmptyDataset）
// ==========================================

use crate::domain::dataset::{Dataset, RawRecordBatch};
use crate::domain::report::{AdmissionDecision, BatchAdmission};
use crate::domain::types::CellValue;
use tracing::{debug, info, warn};

/// 汇总结果
#[derive(Debug, Clone, PartialEq)]
pub struct Consolidation {
    pub dataset: Option<Dataset>,         // None 表示无批次准入
    pub admissions: Vec<BatchAdmission>,  // 每个批次的准入记录（按输入顺序）
}

pub struct Consolidator {
    sheet_prefix: Option<String>, // 规范化（去空白、大写）后的前缀
}

impl Consolidator {
    pub fn new(sheet_prefix: Option<&str>) -> Self {
        Self {
            sheet_prefix: sheet_prefix
                .map(|p| p.trim().to_uppercase())
                .filter(|p| !p.is_empty()),
        }
    }

    /// 判定批次是否准入
    ///
    /// 无前缀时全部准入；有前缀时无标签批次不准入
    pub fn admits(&self, batch: &RawRecordBatch) -> bool {
        match &self.sheet_prefix {
            None => true,
            Some(prefix) => batch
                .label
                .as_deref()
                .map(|label| label.trim().to_uppercase().starts_with(prefix.as_str()))
                .unwrap_or(false),
        }
    }

    pub fn consolidate<I>(&self, batches: I) -> Consolidation
    where
        I: IntoIterator<Item = RawRecordBatch>,
    {
        let mut admissions = Vec::new();
        let mut accepted: Vec<RawRecordBatch> = Vec::new();

        for batch in batches {
            let decision = if self.admits(&batch) {
                AdmissionDecision::Accepted
            } else {
                AdmissionDecision::FilteredByPrefix
            };
            debug!(
                label = batch.label_or_default(),
                rows = batch.row_count(),
                decision = ?decision,
                "批次准入判定"
            );
            admissions.push(BatchAdmission {
                label: batch.label.clone(),
                rows: batch.row_count(),
                decision,
            });
            if decision == AdmissionDecision::Accepted {
                accepted.push(batch);
            }
        }

        if accepted.is_empty() {
            warn!(
                total_batches = admissions.len(),
                prefix = self.sheet_prefix.as_deref().unwrap_or(""),
                "无批次准入，数据集为空"
            );
            return Consolidation {
                dataset: None,
                admissions,
            };
        }

        // 列并集（首次出现顺序）
        let mut columns: Vec<String> = Vec::new();
        for batch in &accepted {
            for column in &batch.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut dataset = Dataset::new(columns.clone());
        for batch in accepted {
            // 批次列 → 汇总列位置
            let positions: Vec<usize> = batch
                .columns
                .iter()
                .map(|c| columns.iter().position(|u| u == c).unwrap_or_default())
                .collect();

            for row in batch.rows {
                let mut merged = vec![CellValue::Null; columns.len()];
                for (value, &pos) in row.into_iter().zip(positions.iter()) {
                    merged[pos] = value;
                }
                dataset.push_row(merged);
            }
        }

        info!(
            admitted = admissions
                .iter()
                .filter(|a| a.decision == AdmissionDecision::Accepted)
                .count(),
            rows = dataset.len(),
            columns = dataset.columns().len(),
            "批次汇总完成"
        );

        Consolidation {
            dataset: Some(dataset),
            admissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(label: &str, columns: &[&str], rows: Vec<Vec<CellValue>>) -> RawRecordBatch {
        let mut b = RawRecordBatch::new(
            Some(label.to_string()),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        for row in rows {
            b.push_row(row);
        }
        b
    }

    #[test]
    fn test_prefix_admission_case_insensitive() {
        let consolidator = Consolidator::new(Some("PRESOS E APREENDIDOS"));
        let batches = vec![
            batch("  presos e apreendidos 2024", &["A"], vec![vec![CellValue::from("1")]]),
            batch("VEICULOS", &["A"], vec![vec![CellValue::from("2")]]),
        ];
        let result = consolidator.consolidate(batches);
        assert_eq!(result.admissions[0].decision, AdmissionDecision::Accepted);
        assert_eq!(result.admissions[1].decision, AdmissionDecision::FilteredByPrefix);
        assert_eq!(result.dataset.unwrap().len(), 1);
    }

    #[test]
    fn test_union_of_columns_fills_null() {
        let consolidator = Consolidator::new(None);
        let batches = vec![
            batch("s1", &["A", "B"], vec![vec![CellValue::from("a1"), CellValue::from("b1")]]),
            batch("s2", &["C", "A"], vec![vec![CellValue::from("c2"), CellValue::from("a2")]]),
        ];
        let dataset = consolidator.consolidate(batches).dataset.unwrap();
        assert_eq!(dataset.columns(), &["A", "B", "C"]);
        assert_eq!(dataset.cell(1, "A"), Some(&CellValue::from("a2")));
        assert_eq!(dataset.cell(1, "B"), Some(&CellValue::Null));
        assert_eq!(dataset.cell(0, "C"), Some(&CellValue::Null));
    }

    #[test]
    fn test_no_admitted_batches_yields_none() {
        let consolidator = Consolidator::new(Some("PRESOS"));
        let result = consolidator.consolidate(vec![batch("OUTRO", &["A"], vec![])]);
        assert!(result.dataset.is_none());
        assert_eq!(result.admissions.len(), 1);
    }

    #[test]
    fn test_unlabelled_batch_rejected_when_prefix_set() {
        let consolidator = Consolidator::new(Some("PRESOS"));
        let unlabelled = RawRecordBatch::new(None, vec!["A".to_string()]);
        assert!(!consolidator.admits(&unlabelled));
        assert!(Consolidator::new(None).admits(&unlabelled));
    }
}
