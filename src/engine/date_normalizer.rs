// ==========================================
// SSP 犯罪数据 ETL - 日期规整与派生
// ==========================================
// 职责: 解析日期列（DD/MM/YYYY）→ 丢弃无效日期行 → 派生月/年/星期
// 规则: 无法按格式解析的值视为 Null，Null 日期行无条件丢弃
// 规则: 已是日期的单元格原样保留（重复执行结果不变）
// 规则: 星期名经固定七项表翻译（葡语），不保留中间英文名
// ==========================================

use crate::config::DateConfig;
use crate::domain::dataset::Dataset;
use crate::domain::report::TransformReport;
use crate::domain::types::CellValue;
use crate::engine::error::EngineResult;
use crate::engine::stage::TransformStage;
use chrono::{Datelike, NaiveDate, Weekday};
use tracing::info;

/// 星期 → 葡语名称（按 Monday 起始顺序）
pub const WEEKDAY_LABELS: [(Weekday, &str); 7] = [
    (Weekday::Mon, "Segunda-feira"),
    (Weekday::Tue, "Terça-feira"),
    (Weekday::Wed, "Quarta-feira"),
    (Weekday::Thu, "Quinta-feira"),
    (Weekday::Fri, "Sexta-feira"),
    (Weekday::Sat, "Sábado"),
    (Weekday::Sun, "Domingo"),
];

/// 星期名称查表
pub fn weekday_label(day: Weekday) -> &'static str {
    WEEKDAY_LABELS[day.num_days_from_monday() as usize].1
}

pub struct DateNormalizer {
    config: DateConfig,
}

impl DateNormalizer {
    pub fn new(config: DateConfig) -> Self {
        Self { config }
    }

    /// 单元格 → 日期（失败为 None）
    pub fn parse_cell(&self, cell: &CellValue) -> Option<NaiveDate> {
        match cell {
            CellValue::Date(d) => Some(*d),
            CellValue::Text(s) => NaiveDate::parse_from_str(s.trim(), &self.config.format).ok(),
            _ => None,
        }
    }
}

impl TransformStage for DateNormalizer {
    fn name(&self) -> &'static str {
        "date_normalizer"
    }

    fn touched_columns(&self) -> Vec<String> {
        vec![self.config.column.clone()]
    }

    fn apply(&self, mut dataset: Dataset, report: &mut TransformReport) -> EngineResult<Dataset> {
        let Some(idx) = dataset.column_index(&self.config.column) else {
            return Ok(dataset);
        };

        dataset.map_column(&self.config.column, |cell| {
            self.parse_cell(&cell)
                .map(CellValue::Date)
                .unwrap_or(CellValue::Null)
        });
        let dropped = dataset.retain_rows(|row| !row[idx].is_null());

        let parsed = |row: &[CellValue]| match &row[idx] {
            CellValue::Date(d) => Some(*d),
            _ => None,
        };
        dataset.set_column_with(&self.config.month_column, |row| {
            parsed(row).map(|d| CellValue::Integer(d.month() as i64)).into()
        });
        dataset.set_column_with(&self.config.year_column, |row| {
            parsed(row).map(|d| CellValue::Integer(d.year() as i64)).into()
        });
        dataset.set_column_with(&self.config.weekday_column, |row| {
            parsed(row)
                .map(|d| CellValue::from(weekday_label(d.weekday())))
                .into()
        });

        info!(
            column = %self.config.column,
            dropped_rows = dropped,
            remaining_rows = dataset.len(),
            "日期规整完成"
        );
        report.dropped_invalid_dates += dropped;
        Ok(dataset)
    }
}
