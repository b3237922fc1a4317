// ==========================================
// SSP 犯罪数据 ETL - 管道配置
// ==========================================
// 职责: 单一参数化管道的"按数据源配置对象"
// 覆盖: 工作表前缀 / 过滤规则 / 空值填充 / 重命名 / 类型列 /
//       整数策略 / 最终列序 / 目标 Schema / 目标表
// 格式: JSON（serde_json）
// ==========================================

use crate::domain::schema::TypeSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// 默认哨兵值
pub const DEFAULT_SENTINEL: &str = "Não Informado";

/// 默认日期格式（DD/MM/YYYY）
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// 默认源读取并发度
pub const DEFAULT_SOURCE_CONCURRENCY: usize = 4;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    ReadError { path: String, message: String },

    #[error("配置解析失败: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("未知预设: {0}")]
    UnknownPreset(String),

    #[error("配置值非法 (key: {key}): {message}")]
    InvalidValue { key: String, message: String },
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// MissingColumnPolicy - 过滤列缺失策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissingColumnPolicy {
    #[default]
    Skip, // 跳过该谓词并告警
    Fail, // 立即失败
}

// ==========================================
// IntegerPolicy - 整数列解析失败策略
// ==========================================
// 必填项，无隐式默认值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegerPolicy {
    DropRow,  // 丢弃该行
    KeepNull, // 保留该行，单元格置 Null（可空整数）
}

// ==========================================
// FilterRule - 单列类别过滤
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    pub column: String,        // 源列名
    pub accepted: Vec<String>, // 接受值（大小写不敏感）
}

// ==========================================
// DateConfig - 日期列与派生列
// ==========================================
// 列名均为重命名前的源列名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateConfig {
    pub column: String,
    #[serde(default = "default_date_format")]
    pub format: String,
    pub month_column: String,
    pub year_column: String,
    pub weekday_column: String,
}

// ==========================================
// ColumnRename - 源列 → 规范列
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    pub from: String,
    pub to: String,
}

// ==========================================
// PipelineConfig - 管道配置
// ==========================================
// 列名约定:
// - filters / null_fill_columns / date / rename.from: 源列名
// - time_column / integer_columns / float_columns / final_columns /
//   numeric_check_columns / schema: 重命名后的规范列名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,

    // ===== 源与汇总 =====
    #[serde(default)]
    pub sheet_prefix: Option<String>,
    #[serde(default)]
    pub first_sheet_only: bool,
    #[serde(default = "default_source_concurrency")]
    pub source_concurrency: usize,
    #[serde(default)]
    pub skip_failed_sources: bool,

    // ===== 过滤 =====
    #[serde(default)]
    pub filters: Vec<FilterRule>,
    #[serde(default)]
    pub missing_filter_column: MissingColumnPolicy,

    // ===== 日期 / 时刻 =====
    #[serde(default)]
    pub date: Option<DateConfig>,
    #[serde(default)]
    pub time_column: Option<String>,

    // ===== 清洗 =====
    #[serde(default)]
    pub null_fill_columns: Vec<String>,
    #[serde(default = "default_sentinel")]
    pub sentinel: String,
    #[serde(default)]
    pub rename: Vec<ColumnRename>,
    #[serde(default)]
    pub normalize_text: bool,

    // ===== 类型规整 =====
    #[serde(default)]
    pub integer_columns: Vec<String>,
    #[serde(default)]
    pub float_columns: Vec<String>,
    pub integer_policy: IntegerPolicy,

    // ===== 投影 / 加载 =====
    pub final_columns: Vec<String>,
    pub schema: TypeSchema,
    #[serde(default)]
    pub numeric_check_columns: Vec<String>,
    pub destination_table: String,
}

fn default_sentinel() -> String {
    DEFAULT_SENTINEL.to_string()
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_source_concurrency() -> usize {
    DEFAULT_SOURCE_CONCURRENCY
}

impl PipelineConfig {
    /// 从 JSON 字符串解析并校验
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: PipelineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件加载并校验
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 结构性校验（不涉及数据）
    pub fn validate(&self) -> ConfigResult<()> {
        if self.source_concurrency == 0 {
            return Err(invalid("source_concurrency", "必须 >= 1"));
        }
        if self.destination_table.trim().is_empty() {
            return Err(invalid("destination_table", "不能为空"));
        }
        if self.final_columns.is_empty() {
            return Err(invalid("final_columns", "不能为空"));
        }
        if self.sentinel.is_empty() {
            return Err(invalid("sentinel", "不能为空"));
        }
        if let Some(rule) = self.filters.iter().find(|r| r.accepted.is_empty()) {
            return Err(invalid(
                "filters",
                &format!("列 {} 的接受值为空", rule.column),
            ));
        }
        if let Some(date) = &self.date {
            if date.format.trim().is_empty() {
                return Err(invalid("date.format", "不能为空"));
            }
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.final_columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(invalid("final_columns", &format!("重复列 {}", dup)));
        }
        Ok(())
    }

    /// 有效重命名后的列名（不在映射中则原样返回）
    pub fn canonical_name<'a>(&'a self, source: &'a str) -> &'a str {
        self.rename
            .iter()
            .find(|r| r.from == source)
            .map(|r| r.to.as_str())
            .unwrap_or(source)
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
