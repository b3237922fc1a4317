// ==========================================
// SSP 犯罪数据 ETL - 源读取器实现
// ==========================================
// 职责: 源文件 → 命名的原始批次（RawRecordBatch）
// 支持: Excel (.xlsx/.xls/.xlsm，逐工作表) / CSV (.csv，单批次)
// 约束: 首行为表头；完全空白的行跳过；空单元格为 Null
// ==========================================

use crate::domain::dataset::RawRecordBatch;
use crate::domain::types::CellValue;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// 支持的扩展名
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "csv"];

// ==========================================
// SourceReader Trait
// ==========================================
// 用途: 源读取边界（给定源标识，返回零或多个命名批次）
// 实现者: CsvReader, ExcelReader, UniversalSourceReader
pub trait SourceReader: Send + Sync {
    /// 读取源文件为原始批次列表
    ///
    /// # 返回
    /// - Ok(Vec<RawRecordBatch>): 批次列表（可能为空）
    /// - Err: 文件不存在 / 格式不支持 / 解码失败
    fn read_batches(&self, path: &Path) -> ImportResult<Vec<RawRecordBatch>>;
}

/// 文件扩展名（小写）
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

/// 规范化表头：去空白；空表头命名为 "Unnamed: {idx}"；重复表头追加 ".N"
fn normalize_headers<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .enumerate()
        .map(|(idx, header)| {
            let trimmed = header.trim();
            let base = if trimmed.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                trimmed.to_string()
            };
            let mut name = base.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                name = format!("{}.{}", base, n);
                n += 1;
            }
            name
        })
        .collect()
}

fn text_cell(value: &str) -> CellValue {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        CellValue::Null
    } else {
        CellValue::Text(trimmed.to_string())
    }
}

// ==========================================
// CSV Reader 实现
// ==========================================
pub struct CsvReader;

impl SourceReader for CsvReader {
    fn read_batches(&self, path: &Path) -> ImportResult<Vec<RawRecordBatch>> {
        ensure_exists(path)?;

        let ext = extension_of(path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers = normalize_headers(reader.headers()?.iter().map(str::to_string));
        let label = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string);

        let mut batch = RawRecordBatch::new(label, headers);
        for result in reader.records() {
            let record = result?;
            let row: Vec<CellValue> = record.iter().map(text_cell).collect();

            // 跳过完全空白的行
            if row.iter().all(CellValue::is_null) {
                continue;
            }
            batch.push_row(row);
        }

        debug!(file = %path.display(), rows = batch.row_count(), "CSV 读取完成");
        Ok(vec![batch])
    }
}

// ==========================================
// Excel Reader 实现
// ==========================================
pub struct ExcelReader {
    first_sheet_only: bool, // 仅读取首个工作表
}

impl ExcelReader {
    pub fn new(first_sheet_only: bool) -> Self {
        Self { first_sheet_only }
    }

    /// Excel 单元格 → CellValue
    fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Null,
            Data::String(s) => text_cell(s),
            Data::Int(i) => CellValue::Integer(*i),
            // 整值浮点按整数处理（表格中的编号/年份常以浮点存储）
            Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => CellValue::Integer(*f as i64),
            Data::Float(f) => CellValue::Float(*f),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::DateTime(dt) => {
                // 小于 1 的序列值只含时刻部分
                let time_only = dt.as_f64() < 1.0;
                match dt.as_datetime() {
                    Some(ndt) if time_only => CellValue::Time(ndt.time()),
                    Some(ndt) => CellValue::Date(ndt.date()),
                    None => CellValue::Null,
                }
            }
            Data::DateTimeIso(s) | Data::DurationIso(s) => text_cell(s),
            Data::Error(_) => CellValue::Null,
        }
    }
}

impl SourceReader for ExcelReader {
    fn read_batches(&self, path: &Path) -> ImportResult<Vec<RawRecordBatch>> {
        ensure_exists(path)?;

        let ext = extension_of(path);
        if !matches!(ext.as_str(), "xlsx" | "xls" | "xlsm") {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(path)?;
        let mut sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError(format!(
                "Excel 文件无工作表: {}",
                path.display()
            )));
        }
        if self.first_sheet_only {
            sheet_names.truncate(1);
        }

        let mut batches = Vec::with_capacity(sheet_names.len());
        for sheet_name in sheet_names {
            let range = workbook.worksheet_range(&sheet_name)?;

            let mut rows = range.rows();
            // 空工作表：无表头，产出零列批次
            let Some(header_row) = rows.next() else {
                batches.push(RawRecordBatch::new(Some(sheet_name), Vec::new()));
                continue;
            };

            let headers = normalize_headers(header_row.iter().map(|c| c.to_string()));
            let mut batch = RawRecordBatch::new(Some(sheet_name), headers);

            for data_row in rows {
                let row: Vec<CellValue> = data_row.iter().map(Self::convert_cell).collect();

                // 跳过完全空白的行
                if row.iter().all(CellValue::is_null) {
                    continue;
                }
                batch.push_row(row);
            }

            debug!(
                file = %path.display(),
                sheet = batch.label_or_default(),
                rows = batch.row_count(),
                "工作表读取完成"
            );
            batches.push(batch);
        }

        Ok(batches)
    }
}

// ==========================================
// 通用源读取器（根据扩展名自动选择）
// ==========================================
pub struct UniversalSourceReader {
    excel: ExcelReader,
}

impl UniversalSourceReader {
    pub fn new(first_sheet_only: bool) -> Self {
        Self {
            excel: ExcelReader::new(first_sheet_only),
        }
    }
}

impl SourceReader for UniversalSourceReader {
    fn read_batches(&self, path: &Path) -> ImportResult<Vec<RawRecordBatch>> {
        match extension_of(path).as_str() {
            "csv" => CsvReader.read_batches(path),
            "xlsx" | "xls" | "xlsm" => self.excel.read_batches(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_csv_reader_valid_file() {
        let file = csv_file(&[
            "NOME_MUNICIPIO,LATITUDE",
            "SOROCABA,\"-23,456\"",
            "CAMPINAS,",
        ]);

        let batches = CsvReader.read_batches(file.path()).unwrap();
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        assert_eq!(batch.columns, vec!["NOME_MUNICIPIO", "LATITUDE"]);
        assert_eq!(batch.rows[0][1], CellValue::from("-23,456"));
        assert_eq!(batch.rows[1][1], CellValue::Null);
    }

    #[test]
    fn test_csv_reader_skip_empty_rows() {
        let file = csv_file(&["A,B", "1,2", ",", "3,4"]);
        let batches = CsvReader.read_batches(file.path()).unwrap();
        assert_eq!(batches[0].row_count(), 2);
    }

    #[test]
    fn test_csv_reader_file_not_found() {
        let result = CsvReader.read_batches(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_universal_reader_rejects_unknown_extension() {
        let reader = UniversalSourceReader::new(false);
        let result = reader.read_batches(Path::new("data.parquet"));
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_excel_cell_conversion() {
        use calamine::{ExcelDateTime, ExcelDateTimeType};
        use chrono::{NaiveDate, NaiveTime};

        let date = Data::DateTime(ExcelDateTime::new(45356.0, ExcelDateTimeType::DateTime, false));
        assert_eq!(
            ExcelReader::convert_cell(&date),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );

        // 14:30:00 的序列值
        let time = Data::DateTime(ExcelDateTime::new(
            0.6041666666666666,
            ExcelDateTimeType::DateTime,
            false,
        ));
        assert_eq!(
            ExcelReader::convert_cell(&time),
            CellValue::Time(NaiveTime::from_hms_opt(14, 30, 0).unwrap())
        );

        assert_eq!(ExcelReader::convert_cell(&Data::Float(123456.0)), CellValue::Integer(123456));
        assert_eq!(ExcelReader::convert_cell(&Data::Float(-47.458)), CellValue::Float(-47.458));
        assert_eq!(ExcelReader::convert_cell(&Data::Float(1.0e16)), CellValue::Float(1.0e16));
        assert_eq!(ExcelReader::convert_cell(&Data::Int(5)), CellValue::Integer(5));
        assert_eq!(ExcelReader::convert_cell(&Data::String("  ".to_string())), CellValue::Null);
        assert_eq!(ExcelReader::convert_cell(&Data::Empty), CellValue::Null);
    }

    #[test]
    fn test_excel_reader_rejects_non_excel_extension() {
        let file = csv_file(&["A", "1"]);
        let result = ExcelReader::new(false).read_batches(file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_normalize_headers_dedup_and_unnamed() {
        let headers = normalize_headers(
            vec![" A ".to_string(), "A".to_string(), "".to_string()].into_iter(),
        );
        assert_eq!(headers, vec!["A", "A.1", "Unnamed: 2"]);
    }
}
