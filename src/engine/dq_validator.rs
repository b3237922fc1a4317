// ==========================================
// SSP 犯罪数据 ETL - 加载前数据质量检查
// ==========================================
// 职责: 数值列残留非数值检查（加载前校验，不自动中止）/ 数据集概览
// 输入: 转换后数据集 + 类型规整阶段的失败值记录
// ==========================================

use crate::domain::dataset::Dataset;
use crate::domain::report::{ColumnProfile, NumericResidual};
use crate::domain::types::CellValue;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

pub struct DqValidator {
    numeric_columns: Vec<String>, // 期望为数值的列
}

impl DqValidator {
    pub fn new(numeric_columns: Vec<String>) -> Self {
        Self { numeric_columns }
    }

    fn is_numeric_residual(cell: &CellValue) -> Option<String> {
        match cell {
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() || trimmed.parse::<f64>().is_ok() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Date(_) | CellValue::Time(_) => Some(cell.to_string()),
            _ => None,
        }
    }

    /// 报告每个含非空非数值内容的列
    ///
    /// # 参数
    /// - dataset: 转换后的数据集
    /// - coercion_log: 类型规整时被置为 Null 的原始值（列 → 值集合）
    ///
    /// # 返回
    /// 含残留值的列（按配置顺序）；列不存在时告警并跳过
    pub fn find_non_numeric_values(
        &self,
        dataset: &Dataset,
        coercion_log: &BTreeMap<String, BTreeSet<String>>,
    ) -> Vec<NumericResidual> {
        let mut residuals = Vec::new();

        for column in &self.numeric_columns {
            if !dataset.has_column(column) {
                warn!(column = %column, "数值检查列不存在，跳过");
                continue;
            }

            let mut values: BTreeSet<String> = dataset
                .column_values(column)
                .filter_map(Self::is_numeric_residual)
                .collect();
            // 日志中的数值形式（如整数列中的 "12.5"）不算非数值残留
            if let Some(logged) = coercion_log.get(column) {
                values.extend(
                    logged
                        .iter()
                        .filter(|v| v.trim().parse::<f64>().is_err())
                        .cloned(),
                );
            }

            if values.is_empty() {
                continue;
            }
            warn!(column = %column, values = ?values, "数值列包含非数值内容");
            residuals.push(NumericResidual {
                column: column.clone(),
                values: values.into_iter().collect(),
            });
        }

        if residuals.is_empty() {
            info!(columns = self.numeric_columns.len(), "数值列检查通过");
        }
        residuals
    }

    /// 数据集概览（列、主类型、非空数）
    pub fn profile(dataset: &Dataset) -> Vec<ColumnProfile> {
        dataset
            .columns()
            .iter()
            .map(|column| {
                let kinds: BTreeSet<&'static str> = dataset
                    .column_values(column)
                    .filter(|c| !c.is_null())
                    .map(CellValue::kind)
                    .collect();
                let kind = match kinds.len() {
                    0 => "NULL".to_string(),
                    1 => kinds.into_iter().next().unwrap_or("NULL").to_string(),
                    _ => "MIXED".to_string(),
                };
                ColumnProfile {
                    name: column.clone(),
                    kind,
                    non_null: dataset.column_values(column).filter(|c| !c.is_null()).count(),
                }
            })
            .collect()
    }

    /// 以日志输出概览
    pub fn log_profile(dataset: &Dataset) -> Vec<ColumnProfile> {
        let profile = Self::profile(dataset);
        info!(rows = dataset.len(), columns = profile.len(), "加载前数据集概览");
        for column in &profile {
            info!(
                column = %column.name,
                kind = %column.kind,
                non_null = column.non_null,
                "列概览"
            );
        }
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_rows(
            vec!["latitude".to_string(), "mes".to_string()],
            vec![
                vec![CellValue::Float(-23.456), CellValue::Integer(3)],
                vec![CellValue::Null, CellValue::from("marco")],
                vec![CellValue::Null, CellValue::from("4")],
            ],
        )
    }

    #[test]
    fn test_coercion_log_flags_nulled_values() {
        let mut log = BTreeMap::new();
        log.insert("latitude".to_string(), BTreeSet::from(["abc".to_string()]));
        let validator = DqValidator::new(vec![
            "latitude".to_string(),
            "mes".to_string(),
            "ausente".to_string(),
        ]);
        let residuals = validator.find_non_numeric_values(&dataset(), &log);
        assert_eq!(residuals.len(), 2);
        assert_eq!(residuals[0].column, "latitude");
        assert_eq!(residuals[0].values, vec!["abc".to_string()]);
        assert_eq!(residuals[1].values, vec!["marco".to_string()]);
    }

    #[test]
    fn test_numeric_looking_logged_values_are_not_residuals() {
        let mut log = BTreeMap::new();
        log.insert(
            "latitude".to_string(),
            BTreeSet::from(["2024.5".to_string(), "abc".to_string(), " 1e3 ".to_string()]),
        );
        let validator = DqValidator::new(vec!["latitude".to_string()]);

        let residuals = validator.find_non_numeric_values(&dataset(), &log);

        assert_eq!(residuals.len(), 1);
        assert_eq!(residuals[0].values, vec!["abc".to_string()]);

        log.insert("latitude".to_string(), BTreeSet::from(["2024.5".to_string()]));
        assert!(validator.find_non_numeric_values(&dataset(), &log).is_empty());
    }

    #[test]
    fn test_clean_dataset_passes() {
        let validator = DqValidator::new(vec!["latitude".to_string()]);
        let residuals = validator.find_non_numeric_values(&dataset(), &BTreeMap::new());
        assert!(residuals.is_empty());
    }

    #[test]
    fn test_profile_kinds() {
        let profile = DqValidator::profile(&dataset());
        assert_eq!(profile[0].kind, "FLOAT");
        assert_eq!(profile[0].non_null, 1);
        assert_eq!(profile[1].kind, "MIXED");
    }
}
