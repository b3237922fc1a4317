// ==========================================
// SSP 犯罪数据 ETL - 类型规整
// ==========================================
// 职责: 整数列 / 浮点列（坐标）/ 时刻列的尽力解析
// 规则: 解析失败一律置 Null 并记录原始值（从不残留非数值文本）
// 规则: 浮点列先将小数逗号替换为小数点
// 规则: 整数列失败行按 IntegerPolicy 处理（DropRow 丢行 / KeepNull 保留）
// 规则: 时刻列失败置 Null，不丢行
// 规则: schema 声明为文本的列中，非文本单元格文本化
// ==========================================

use crate::config::IntegerPolicy;
use crate::domain::dataset::Dataset;
use crate::domain::report::TransformReport;
use crate::domain::types::CellValue;
use crate::engine::error::EngineResult;
use crate::engine::stage::TransformStage;
use chrono::{NaiveDateTime, NaiveTime};
use tracing::{info, warn};

/// 支持的时刻格式
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%H:%M:%S%.f"];

/// 支持的日期时间格式（仅取时刻部分）
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// 无小数部分且在 i64 范围内的浮点 → 整数（越界不截断）
fn integral_f64(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

/// 整数解析：整数文本或无小数部分的数值
pub fn parse_integer(cell: &CellValue) -> Option<i64> {
    match cell {
        CellValue::Integer(i) => Some(*i),
        CellValue::Float(f) => integral_f64(*f),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integral_f64))
        }
        _ => None,
    }
}

/// 浮点解析：小数逗号 → 小数点
pub fn parse_float(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Float(f) => Some(*f),
        CellValue::Integer(i) => Some(*i as f64),
        CellValue::Text(s) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite()),
        _ => None,
    }
}

/// 时刻解析（无日期部分）
pub fn parse_time(cell: &CellValue) -> Option<NaiveTime> {
    match cell {
        CellValue::Time(t) => Some(*t),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
                .or_else(|| {
                    DATETIME_FORMATS
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                        .map(|dt| dt.time())
                })
        }
        _ => None,
    }
}

// ==========================================
// NumericCoercer - 整数 / 浮点列
// ==========================================
pub struct NumericCoercer {
    integer_columns: Vec<String>,
    float_columns: Vec<String>,
    policy: IntegerPolicy,
    sentinel: String, // 哨兵视为缺失（Null），不计为解析失败
}

impl NumericCoercer {
    pub fn new(
        integer_columns: Vec<String>,
        float_columns: Vec<String>,
        policy: IntegerPolicy,
        sentinel: &str,
    ) -> Self {
        Self {
            integer_columns,
            float_columns,
            policy,
            sentinel: sentinel.to_string(),
        }
    }

    fn is_missing(&self, cell: &CellValue) -> bool {
        match cell {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty() || s == &self.sentinel,
            _ => false,
        }
    }

    /// 规整单列；返回失败的原始值
    fn coerce_column<F>(&self, dataset: &mut Dataset, column: &str, parse: F) -> Vec<String>
    where
        F: Fn(&CellValue) -> Option<CellValue>,
    {
        let mut failures = Vec::new();
        dataset.map_column(column, |cell| {
            if self.is_missing(&cell) {
                return CellValue::Null;
            }
            match parse(&cell) {
                Some(value) => value,
                None => {
                    failures.push(cell.to_string());
                    CellValue::Null
                }
            }
        });
        failures
    }
}

impl TransformStage for NumericCoercer {
    fn name(&self) -> &'static str {
        "numeric_coercer"
    }

    fn touched_columns(&self) -> Vec<String> {
        self.integer_columns
            .iter()
            .chain(self.float_columns.iter())
            .cloned()
            .collect()
    }

    fn apply(&self, mut dataset: Dataset, report: &mut TransformReport) -> EngineResult<Dataset> {
        for column in &self.integer_columns {
            let failures = self.coerce_column(&mut dataset, column, |cell| {
                parse_integer(cell).map(CellValue::Integer)
            });
            for raw in &failures {
                report.record_coercion_failure(column, raw);
            }
            if !failures.is_empty() {
                warn!(column = %column, failed = failures.len(), "整数解析失败，已置空");
            }
        }

        for column in &self.float_columns {
            let failures = self.coerce_column(&mut dataset, column, |cell| {
                parse_float(cell).map(CellValue::Float)
            });
            for raw in &failures {
                report.record_coercion_failure(column, raw);
            }
            if !failures.is_empty() {
                warn!(column = %column, failed = failures.len(), "浮点解析失败，已置空");
            }
        }

        if self.policy == IntegerPolicy::DropRow {
            let indices: Vec<usize> = self
                .integer_columns
                .iter()
                .filter_map(|c| dataset.column_index(c))
                .collect();
            let dropped = dataset.retain_rows(|row| indices.iter().all(|i| !row[*i].is_null()));
            if dropped > 0 {
                info!(dropped_rows = dropped, "整数列为空的行已丢弃");
            }
            report.dropped_invalid_integers += dropped;
        }

        Ok(dataset)
    }
}

// ==========================================
// TimeCoercer - 时刻列
// ==========================================
pub struct TimeCoercer {
    column: String,
}

impl TimeCoercer {
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
        }
    }
}

impl TransformStage for TimeCoercer {
    fn name(&self) -> &'static str {
        "time_coercer"
    }

    fn touched_columns(&self) -> Vec<String> {
        vec![self.column.clone()]
    }

    fn apply(&self, mut dataset: Dataset, report: &mut TransformReport) -> EngineResult<Dataset> {
        let mut unparsed = 0usize;
        dataset.map_column(&self.column, |cell| {
            if cell.is_null() {
                return cell;
            }
            match parse_time(&cell) {
                Some(t) => CellValue::Time(t),
                None => {
                    unparsed += 1;
                    CellValue::Null
                }
            }
        });
        if unparsed > 0 {
            warn!(column = %self.column, unparsed, "时刻解析失败，已置空");
        }
        report.unparsed_times += unparsed;
        Ok(dataset)
    }
}

// ==========================================
// TextCoercer - schema 声明为文本的列
// ==========================================
// 非文本单元格（表格中的数值编号、日期等）一律文本化，Null 保持
pub struct TextCoercer {
    columns: Vec<String>,
}

impl TextCoercer {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }
}

impl TransformStage for TextCoercer {
    fn name(&self) -> &'static str {
        "text_coercer"
    }

    // 与最终列序一致：单次运行缺列属常态，不计入跳过
    fn touched_columns(&self) -> Vec<String> {
        Vec::new()
    }

    fn apply(&self, mut dataset: Dataset, _report: &mut TransformReport) -> EngineResult<Dataset> {
        let mut converted = 0usize;
        for column in &self.columns {
            dataset.map_column(column, |cell| match cell {
                CellValue::Null | CellValue::Text(_) => cell,
                other => {
                    converted += 1;
                    other.to_text().map(CellValue::Text).unwrap_or(CellValue::Null)
                }
            });
        }
        if converted > 0 {
            info!(cells = converted, "非文本单元格已按 schema 文本化");
        }
        Ok(dataset)
    }
}
