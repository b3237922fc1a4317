// ==========================================
// SSP 犯罪数据 ETL - 运行诊断报告
// ==========================================
// 职责: 各阶段必需诊断量的承载结构
// - 批次准入/拒绝原因
// - 过滤保留行数 / 日期丢弃行数 / 类型规整失败值
// - 数值残留检查 / 数据集概览 / 加载结果
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// AdmissionDecision - 批次准入结论
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionDecision {
    Accepted,         // 准入
    FilteredByPrefix, // 标签前缀不匹配
}

// ==========================================
// BatchAdmission - 单批次准入记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAdmission {
    pub label: Option<String>,        // 批次标签
    pub rows: usize,                  // 批次行数
    pub decision: AdmissionDecision,  // 结论
}

// ==========================================
// TransformReport - 转换阶段汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformReport {
    pub input_rows: usize,                                    // 进入转换的行数
    pub filter_retained_rows: Option<usize>,                  // 类别过滤后保留行数
    pub dropped_invalid_dates: usize,                         // 日期无法解析而丢弃的行数
    pub dropped_invalid_integers: usize,                      // 整数无法解析而丢弃的行数（DropRow 策略）
    pub null_filled_cells: usize,                             // 哨兵填充的单元格数
    pub renamed_columns: Vec<(String, String)>,               // 实际生效的重命名
    pub coercion_failures: BTreeMap<String, BTreeSet<String>>, // 列 → 规整为 Null 的原始值
    pub unparsed_times: usize,                                // 时刻无法解析（置 Null）的单元格数
    pub skipped_columns: BTreeMap<String, Vec<String>>,       // 阶段 → 缺失而跳过的列
    pub output_rows: usize,                                   // 输出行数
    pub output_columns: Vec<String>,                          // 输出列序
}

impl TransformReport {
    pub fn record_skipped(&mut self, stage: &str, column: &str) {
        self.skipped_columns
            .entry(stage.to_string())
            .or_default()
            .push(column.to_string());
    }

    pub fn record_coercion_failure(&mut self, column: &str, raw: &str) {
        self.coercion_failures
            .entry(column.to_string())
            .or_default()
            .insert(raw.to_string());
    }
}

// ==========================================
// NumericResidual - 数值列残留非数值
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericResidual {
    pub column: String,       // 列名
    pub values: Vec<String>,  // 去重后的非数值内容
}

// ==========================================
// ColumnProfile - 列概览
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,      // 列名
    pub kind: String,      // 主类型（混合时为 MIXED）
    pub non_null: usize,   // 非空单元格数
}

// ==========================================
// LoadOutcome - 加载结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadOutcome {
    Loaded {
        table: String,         // 目标表
        rows_written: usize,   // 写入行数
        table_rows: usize,     // 加载后目标表行数
        schema_fields: usize,  // 过滤后 schema 字段数
    },
    Skipped {
        reason: String,        // 空数据集等无操作原因
    },
}

// ==========================================
// RunOutcome - 运行结论
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    Completed, // 已加载
    NoData,    // 无批次准入或无行存活，未调用加载
    DryRun,    // 仅转换与诊断
}

// ==========================================
// RunSummary - 单次运行汇总
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,                       // 运行 ID（UUID）
    pub outcome: RunOutcome,                  // 运行结论
    pub sources: Vec<String>,                 // 参与的源
    pub admissions: Vec<BatchAdmission>,      // 批次准入记录
    pub transform: Option<TransformReport>,   // 转换汇总（无批次准入时为 None）
    pub residuals: Vec<NumericResidual>,      // 加载前数值检查
    pub load: LoadOutcome,                    // 加载结果
    pub elapsed_ms: u128,                     // 耗时（毫秒）
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_coercion_failure_dedups() {
        let mut report = TransformReport::default();
        report.record_coercion_failure("latitude", "abc");
        report.record_coercion_failure("latitude", "abc");
        report.record_coercion_failure("latitude", "n/d");
        assert_eq!(report.coercion_failures["latitude"].len(), 2);
    }

    #[test]
    fn test_load_outcome_tagged_json() {
        let outcome = LoadOutcome::Skipped {
            reason: "empty".to_string(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"status\":\"SKIPPED\""));
    }
}
