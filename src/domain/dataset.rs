// ==========================================
// SSP 犯罪数据 ETL - 数据集结构
// ==========================================
// 职责: RawRecordBatch（源批次）与 Dataset（内存全量数据集）
// 约束: 列名大小写敏感；列顺序为首次出现顺序
// 约束: 每行长度恒等于列数（缺失列以 Null 填充）
// ==========================================

use crate::domain::types::CellValue;
use serde::{Deserialize, Serialize};

// ==========================================
// RawRecordBatch - 源批次（一张工作表 / 一个文件）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecordBatch {
    pub label: Option<String>,       // 批次来源标签（如工作表名）
    pub columns: Vec<String>,        // 源列名
    pub rows: Vec<Vec<CellValue>>,   // 行数据（与 columns 对齐）
}

impl RawRecordBatch {
    pub fn new(label: Option<String>, columns: Vec<String>) -> Self {
        Self {
            label,
            columns,
            rows: Vec::new(),
        }
    }

    /// 追加一行（长度不足补 Null，超出截断）
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Null);
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn label_or_default(&self) -> &str {
        self.label.as_deref().unwrap_or("<unnamed>")
    }
}

// ==========================================
// Dataset - 全量内存数据集
// ==========================================
// 各阶段以所有权转移方式传递，不在原地修改上游数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// 由列名与行构造（行长度自动对齐）
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut dataset = Self::new(columns);
        for row in rows {
            dataset.push_row(row);
        }
        dataset
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// 按声明列表切分为 (存在列, 缺失列)，保持声明顺序
    pub fn partition_columns<'a>(&self, wanted: &'a [String]) -> (Vec<&'a str>, Vec<&'a str>) {
        wanted
            .iter()
            .map(String::as_str)
            .partition(|name| self.has_column(name))
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// 列值迭代器（列不存在时为空）
    pub fn column_values<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a CellValue> + 'a {
        let idx = self.column_index(column);
        self.rows
            .iter()
            .filter_map(move |row| idx.and_then(|i| row.get(i)))
    }

    /// 追加或覆盖一列；值由每行计算
    pub fn set_column_with<F>(&mut self, name: &str, mut f: F)
    where
        F: FnMut(&[CellValue]) -> CellValue,
    {
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    let value = f(row);
                    row[idx] = value;
                }
            }
            None => {
                for row in &mut self.rows {
                    let value = f(row);
                    row.push(value);
                }
                self.columns.push(name.to_string());
            }
        }
    }

    /// 原地变换单列；列不存在返回 false
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> bool
    where
        F: FnMut(CellValue) -> CellValue,
    {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        for row in &mut self.rows {
            let value = std::mem::replace(&mut row[idx], CellValue::Null);
            row[idx] = f(value);
        }
        true
    }

    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// 重命名列；源列不存在或目标名已被其他列占用时返回 false
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return self.has_column(from);
        }
        if self.has_column(to) {
            return false;
        }
        match self.column_index(from) {
            Some(idx) => {
                self.columns[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// 保留满足条件的行，返回被移除的行数
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|row| keep(row));
        before - self.rows.len()
    }

    /// 按给定列序投影（列需全部存在，缺失列被忽略）
    pub fn select(self, columns: &[&str]) -> Dataset {
        let indices: Vec<(String, usize)> = columns
            .iter()
            .filter_map(|name| self.column_index(name).map(|i| (name.to_string(), i)))
            .collect();

        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                indices
                    .iter()
                    .map(|(_, i)| std::mem::replace(&mut row[*i], CellValue::Null))
                    .collect()
            })
            .collect();

        Dataset {
            columns: indices.into_iter().map(|(name, _)| name).collect(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_rows(
            vec!["A".to_string(), "B".to_string()],
            vec![
                vec![CellValue::from("x"), CellValue::Integer(1)],
                vec![CellValue::from("y")],
            ],
        )
    }

    #[test]
    fn test_short_rows_padded_with_null() {
        let ds = sample();
        assert_eq!(ds.cell(1, "B"), Some(&CellValue::Null));
    }

    #[test]
    fn test_rename_refuses_collision() {
        let mut ds = sample();
        assert!(!ds.rename_column("A", "B"));
        assert!(ds.rename_column("A", "a"));
        assert_eq!(ds.columns(), &["a".to_string(), "B".to_string()]);
        assert!(!ds.rename_column("missing", "z"));
    }

    #[test]
    fn test_select_reorders_and_skips_missing() {
        let ds = sample().select(&["B", "ZZ", "A"]);
        assert_eq!(ds.columns(), &["B".to_string(), "A".to_string()]);
        assert_eq!(ds.rows()[0], vec![CellValue::Integer(1), CellValue::from("x")]);
    }

    #[test]
    fn test_set_column_with_appends() {
        let mut ds = sample();
        ds.set_column_with("C", |row| match &row[0] {
            CellValue::Text(s) => CellValue::Text(s.to_uppercase()),
            _ => CellValue::Null,
        });
        assert_eq!(ds.cell(0, "C"), Some(&CellValue::from("X")));
    }

    #[test]
    fn test_retain_rows_counts_removed() {
        let mut ds = sample();
        let removed = ds.retain_rows(|row| !row[1].is_null());
        assert_eq!(removed, 1);
        assert_eq!(ds.len(), 1);
    }
}
