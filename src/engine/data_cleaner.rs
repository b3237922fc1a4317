// ==========================================
// SSP 犯罪数据 ETL - 数据清洗
// ==========================================
// 职责: 空值哨兵填充 / 文本标题大小写规范化
// 规则: 标题化之后再将退化标记（"Nao Informado" / "Nan"）统一为哨兵
// 规则: 时刻列与派生星期列永不文本化
// ==========================================

use crate::domain::dataset::Dataset;
use crate::domain::report::TransformReport;
use crate::domain::types::CellValue;
use crate::engine::error::EngineResult;
use crate::engine::stage::TransformStage;
use tracing::{debug, info};

/// 标题化后需统一为哨兵的退化标记（整值、区分大小写）
pub const DEGENERATE_TOKENS: &[&str] = &["Nao Informado", "Nan"];

/// 标题大小写：每个"有大小写字符"的连续段首字母大写，其余小写
///
/// 例: "NÃO INFORMADO" → "Não Informado"，"o'neil" → "O'Neil"
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_cased = false;
    for c in value.chars() {
        let cased = c.is_uppercase() || c.is_lowercase();
        if cased && prev_cased {
            out.extend(c.to_lowercase());
        } else if cased {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        prev_cased = cased;
    }
    out
}

// ==========================================
// NullFiller - 空值哨兵填充
// ==========================================
pub struct NullFiller {
    columns: Vec<String>,
    sentinel: String,
}

impl NullFiller {
    pub fn new(columns: Vec<String>, sentinel: &str) -> Self {
        Self {
            columns,
            sentinel: sentinel.to_string(),
        }
    }
}

impl TransformStage for NullFiller {
    fn name(&self) -> &'static str {
        "null_fill"
    }

    fn touched_columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn apply(&self, mut dataset: Dataset, report: &mut TransformReport) -> EngineResult<Dataset> {
        let mut filled = 0usize;
        for column in &self.columns {
            dataset.map_column(column, |cell| {
                if cell.is_null() {
                    filled += 1;
                    CellValue::Text(self.sentinel.clone())
                } else {
                    cell
                }
            });
        }
        debug!(filled_cells = filled, "空值填充完成");
        report.null_filled_cells += filled;
        Ok(dataset)
    }
}

// ==========================================
// TextNormalizer - 文本列标题化
// ==========================================
// 文本列: 含至少一个文本单元格的列
// 文本列中的 Null 文本化后为 "Nan"，最终统一为哨兵
pub struct TextNormalizer {
    sentinel: String,
    excluded: Vec<String>, // 永不文本化的列（时刻列 / 星期列）
}

impl TextNormalizer {
    pub fn new(sentinel: &str, excluded: Vec<String>) -> Self {
        Self {
            sentinel: sentinel.to_string(),
            excluded,
        }
    }

    fn normalize(&self, cell: CellValue) -> CellValue {
        let Some(text) = cell.to_text() else {
            return CellValue::Text(self.sentinel.clone());
        };
        let titled = title_case(&text);
        if DEGENERATE_TOKENS.contains(&titled.as_str()) {
            CellValue::Text(self.sentinel.clone())
        } else {
            CellValue::Text(titled)
        }
    }
}

impl TransformStage for TextNormalizer {
    fn name(&self) -> &'static str {
        "text_normalizer"
    }

    fn touched_columns(&self) -> Vec<String> {
        Vec::new()
    }

    fn apply(&self, mut dataset: Dataset, _report: &mut TransformReport) -> EngineResult<Dataset> {
        let textual: Vec<String> = dataset
            .columns()
            .iter()
            .filter(|c| !self.excluded.contains(*c))
            .filter(|c| dataset.column_values(c).any(CellValue::is_text))
            .cloned()
            .collect();

        for column in &textual {
            dataset.map_column(column, |cell| self.normalize(cell));
        }
        info!(columns = textual.len(), "文本规范化完成");
        Ok(dataset)
    }
}
