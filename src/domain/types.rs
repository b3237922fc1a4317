// ==========================================
// SSP 犯罪数据 ETL - 领域类型定义
// ==========================================
// 职责: 单元格值 (CellValue) 与字段原始类型 (FieldType)
// 红线: 单元格要么符合声明类型，要么为 Null
// ==========================================

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 单元格值 (Cell Value)
// ==========================================
// 源数据为弱类型：文本 / 数值 / 空
// 转换后可携带日期与时刻
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::Text(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 文本化表示（Null → None），用于比较与再解析
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// 是否符合给定字段类型（Null 恒符合）
    pub fn conforms_to(&self, field_type: FieldType) -> bool {
        matches!(
            (self, field_type),
            (CellValue::Null, _)
                | (CellValue::Text(_), FieldType::Text)
                | (CellValue::Integer(_), FieldType::Integer)
                | (CellValue::Float(_), FieldType::Float)
                | (CellValue::Integer(_), FieldType::Float)
                | (CellValue::Date(_), FieldType::Date)
                | (CellValue::Time(_), FieldType::Time)
        )
    }

    /// 值的类型名（用于诊断输出）
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Null => "NULL",
            CellValue::Text(_) => "STRING",
            CellValue::Integer(_) => "INTEGER",
            CellValue::Float(_) => "FLOAT",
            CellValue::Date(_) => "DATE",
            CellValue::Time(_) => "TIME",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, ""),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Integer(i) => write!(f, "{}", i),
            // 整值浮点保留 ".0"，与表格导出的文本形态一致
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{:.1}", v),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

// ==========================================
// 字段原始类型 (Field Type)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与目标表声明一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    #[serde(alias = "STRING")]
    Text,
    Integer,
    Float,
    Date,
    Time,
}

impl FieldType {
    /// 对应 SQLite 列类型
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Integer => "INTEGER",
            FieldType::Float => "REAL",
            FieldType::Date => "TEXT",
            FieldType::Time => "TEXT",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "STRING"),
            FieldType::Integer => write!(f, "INTEGER"),
            FieldType::Float => write!(f, "FLOAT"),
            FieldType::Date => write!(f, "DATE"),
            FieldType::Time => write!(f, "TIME"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Integer(42).to_string(), "42");
        assert_eq!(CellValue::Float(5.0).to_string(), "5.0");
        assert_eq!(CellValue::Float(-23.456).to_string(), "-23.456");
        assert_eq!(
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()).to_string(),
            "2024-03-05"
        );
    }

    #[test]
    fn test_conforms_to() {
        assert!(CellValue::Null.conforms_to(FieldType::Date));
        assert!(CellValue::Integer(3).conforms_to(FieldType::Float));
        assert!(!CellValue::Text("3".to_string()).conforms_to(FieldType::Integer));
        assert!(!CellValue::Float(1.5).conforms_to(FieldType::Integer));
    }

    #[test]
    fn test_field_type_serde_alias() {
        let t: FieldType = serde_json::from_str("\"STRING\"").unwrap();
        assert_eq!(t, FieldType::Text);
        assert_eq!(serde_json::to_string(&FieldType::Time).unwrap(), "\"TIME\"");
    }
}
