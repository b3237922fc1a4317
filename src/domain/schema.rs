// ==========================================
// SSP 犯罪数据 ETL - 目标表 Schema
// ==========================================
// 职责: 规范字段声明（名称 + 原始类型 + 可空）
// 用途: 驱动类型规整；加载前按实际列过滤
// ==========================================

use crate::domain::types::FieldType;
use serde::{Deserialize, Serialize};

// ==========================================
// FieldMode - 字段模式
// ==========================================
// 所有字段均可空
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldMode {
    #[default]
    Nullable,
}

// ==========================================
// SchemaField - 单个字段声明
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub mode: FieldMode,
}

impl SchemaField {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            mode: FieldMode::Nullable,
        }
    }
}

// ==========================================
// TypeSchema - 有序字段列表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeSchema {
    fields: Vec<SchemaField>,
}

impl TypeSchema {
    pub fn new(fields: Vec<SchemaField>) -> Self {
        Self { fields }
    }

    /// 由 (名称, 类型) 列表构造
    pub fn from_pairs(pairs: &[(&str, FieldType)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(name, t)| SchemaField::new(name, *t))
                .collect(),
        )
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 声明为给定类型的字段名
    pub fn names_of_type(&self, field_type: FieldType) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.field_type == field_type)
            .map(|f| f.name.clone())
            .collect()
    }

    /// 过滤为数据集中实际存在的字段（保持 schema 声明顺序）
    pub fn filter_to_columns(&self, columns: &[String]) -> TypeSchema {
        TypeSchema {
            fields: self
                .fields
                .iter()
                .filter(|f| columns.iter().any(|c| c == &f.name))
                .cloned()
                .collect(),
        }
    }
}
