// ==========================================
// Excel 源集成测试
// ==========================================
// 夹具: tests/fixtures/produtividade_multi_sheet.xlsx
//   工作表 "PRESOS E APREENDIDOS": 3 行（日期/时刻单元格、数值编号、文本坐标）
//   工作表 "OUTROS": 1 行（前缀不匹配）
// ==========================================


use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;
use ssp_crime_etl::config::presets::produtividade;
use ssp_crime_etl::domain::{CellValue, LoadOutcome, RunOutcome};
use ssp_crime_etl::engine::EtlOrchestrator;
use ssp_crime_etl::importer::{ExcelReader, SourceReader, UniversalSourceReader};
use ssp_crime_etl::repository::SqliteDatasetSink;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use test_helpers::create_test_db;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/produtividade_multi_sheet.xlsx")
}

#[test]
fn test_every_sheet_becomes_a_labelled_batch() {
    let batches = ExcelReader::new(false).read_batches(&fixture()).unwrap();

    let labels: Vec<&str> = batches.iter().map(|b| b.label_or_default()).collect();
    assert_eq!(labels, vec!["PRESOS E APREENDIDOS", "OUTROS"]);
    assert_eq!(batches[0].row_count(), 3);
    assert_eq!(batches[1].row_count(), 1);
    assert_eq!(batches[0].columns[0], "NUM_BO");
    assert_eq!(batches[0].columns.len(), 8);
}

#[test]
fn test_excel_cells_keep_their_types() {
    let batches = ExcelReader::new(false).read_batches(&fixture()).unwrap();
    let first = &batches[0].rows[0];
    let second = &batches[0].rows[1];

    assert_eq!(first[0], CellValue::Integer(123456));
    assert_eq!(
        first[3],
        CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
    );
    assert_eq!(
        first[4],
        CellValue::Time(NaiveTime::from_hms_opt(14, 30, 0).unwrap())
    );
    assert_eq!(first[5], CellValue::from("-23,456"));
    assert_eq!(first[6], CellValue::Float(-47.458));
    assert_eq!(first[7], CellValue::Integer(31));

    // 文本形式的日期/时刻原样保留，由转换阶段解析
    assert_eq!(second[3], CellValue::from("06/03/2024"));
    assert_eq!(second[4], CellValue::from("08:15"));
    // 缺失的尾部单元格补 Null
    assert_eq!(second[7], CellValue::Null);
}

#[test]
fn test_first_sheet_only_reads_one_batch() {
    let batches = ExcelReader::new(true).read_batches(&fixture()).unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].label_or_default(), "PRESOS E APREENDIDOS");
}

#[tokio::test]
async fn test_workbook_is_loaded_into_sqlite() {
    let (_db, db_path) = create_test_db().unwrap();
    let config = produtividade();
    let table = config.destination_table.clone();
    let sink = SqliteDatasetSink::new(&db_path).unwrap();
    let orchestrator = EtlOrchestrator::new(config, Arc::new(UniversalSourceReader::new(false)))
        .with_sink(Arc::new(sink));

    let summary = orchestrator.run(vec![fixture()]).await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.admissions.len(), 2);
    assert!(matches!(
        summary.load,
        LoadOutcome::Loaded { rows_written: 2, table_rows: 2, .. }
    ));

    let conn = Connection::open(&db_path).unwrap();
    let sql = format!(
        "SELECT codigo_bo, data_ocorrencia_bo, hora_ocorrencia_bo, latitude, idade_autor \
         FROM \"{}\" ORDER BY codigo_bo",
        table
    );
    let mut stmt = conn.prepare(&sql).unwrap();
    let rows: Vec<(String, String, String, f64, Option<i64>)> = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(rows.len(), 2);
    let (codigo, data, hora, latitude, idade) = &rows[0];
    assert_eq!(codigo, "123456");
    assert_eq!(data, "2024-03-05");
    assert_eq!(hora, "14:30:00");
    assert!((latitude - -23.456).abs() < 1e-9);
    assert_eq!(*idade, Some(31));

    let (codigo, data, hora, _, idade) = &rows[1];
    assert_eq!(codigo, "654321");
    assert_eq!(data, "2024-03-06");
    assert_eq!(hora, "08:15:00");
    assert_eq!(*idade, None);
}
