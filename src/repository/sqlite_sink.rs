// ==========================================
// SSP 犯罪数据 ETL - SQLite 加载目标实现
// ==========================================
// 职责: 替换式加载（DROP + CREATE + INSERT 于同一事务）/ 行数查询 / 运行日志
// 红线: 写入前完成全部 Schema 校验；失败时目标表保持原状
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::dataset::Dataset;
use crate::domain::report::{LoadOutcome, RunSummary};
use crate::domain::schema::TypeSchema;
use crate::domain::types::CellValue;
use crate::repository::dataset_sink::DatasetSink;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// 运行日志表
const RUN_LOG_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS etl_run_log (
    run_id TEXT PRIMARY KEY,
    outcome TEXT NOT NULL,
    table_name TEXT,
    rows_written INTEGER,
    elapsed_ms INTEGER NOT NULL,
    summary_json TEXT NOT NULL,
    created_at TEXT NOT NULL
)
"#;

/// 校验目标表标识（字母、数字、下划线、点；不以数字开头）
pub fn validate_table_name(table: &str) -> RepositoryResult<()> {
    let valid = !table.is_empty()
        && !table.starts_with(|c: char| c.is_ascii_digit())
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(RepositoryError::InvalidTableName(table.to_string()))
    }
}

/// 标识符加引号（点号保留在名称内，不视为库名分隔）
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// 校验数据集与 schema 一致
///
/// 每列须在 schema 中声明，每个单元格须符合声明类型或为 Null
pub fn validate_conformity(dataset: &Dataset, schema: &TypeSchema) -> RepositoryResult<()> {
    for (idx, column) in dataset.columns().iter().enumerate() {
        let Some(field) = schema.field(column) else {
            return Err(RepositoryError::SchemaMismatch {
                field: column.clone(),
                message: "列未在 schema 中声明".to_string(),
            });
        };
        if let Some((row_no, cell)) = dataset
            .rows()
            .iter()
            .enumerate()
            .find(|(_, row)| !row[idx].conforms_to(field.field_type))
            .map(|(i, row)| (i, &row[idx]))
        {
            return Err(RepositoryError::SchemaMismatch {
                field: column.clone(),
                message: format!(
                    "第 {} 行值 '{}' ({}) 不符合类型 {}",
                    row_no + 1,
                    cell,
                    cell.kind(),
                    field.field_type
                ),
            });
        }
    }
    Ok(())
}

fn to_sql_value(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Text(s) => Value::Text(s.clone()),
        CellValue::Integer(i) => Value::Integer(*i),
        CellValue::Float(f) => Value::Real(*f),
        CellValue::Date(_) | CellValue::Time(_) => Value::Text(cell.to_string()),
    }
}

// ==========================================
// SqliteDatasetSink
// ==========================================
pub struct SqliteDatasetSink {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatasetSink {
    /// 打开数据库文件并初始化运行日志表
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// 使用已有连接（测试用内存库等）
    pub fn from_connection(conn: Connection) -> RepositoryResult<Self> {
        conn.execute_batch(RUN_LOG_DDL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn replace_table_sync(
        conn: &mut Connection,
        dataset: &Dataset,
        schema: &TypeSchema,
        table: &str,
    ) -> RepositoryResult<usize> {
        validate_table_name(table)?;
        validate_conformity(dataset, schema)?;

        let quoted_table = quote_identifier(table);
        let mut column_defs = Vec::with_capacity(dataset.columns().len());
        for column in dataset.columns() {
            let field_type = schema
                .field(column)
                .map(|f| f.field_type)
                .ok_or_else(|| RepositoryError::SchemaMismatch {
                    field: column.clone(),
                    message: "列未在 schema 中声明".to_string(),
                })?;
            column_defs.push(format!("{} {}", quote_identifier(column), field_type.sql_type()));
        }

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quoted_table))?;
        tx.execute_batch(&format!(
            "CREATE TABLE {} ({})",
            quoted_table,
            column_defs.join(", ")
        ))?;

        let placeholders: Vec<String> = (1..=dataset.columns().len())
            .map(|i| format!("?{}", i))
            .collect();
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quoted_table,
            dataset
                .columns()
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", "),
            placeholders.join(", ")
        );

        let mut written = 0usize;
        {
            let mut stmt = tx.prepare(&insert_sql)?;
            for row in dataset.rows() {
                stmt.execute(params_from_iter(row.iter().map(to_sql_value)))?;
                written += 1;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        debug!(table = %table, rows = written, "目标表替换完成");
        Ok(written)
    }
}

#[async_trait]
impl DatasetSink for SqliteDatasetSink {
    async fn replace_table(
        &self,
        dataset: &Dataset,
        schema: &TypeSchema,
        table: &str,
    ) -> RepositoryResult<usize> {
        let mut conn = self.lock()?;
        Self::replace_table_sync(&mut conn, dataset, schema, table)
    }

    async fn row_count(&self, table: &str) -> RepositoryResult<usize> {
        validate_table_name(table)?;
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn record_run(&self, summary: &RunSummary) -> RepositoryResult<()> {
        let (table, rows) = match &summary.load {
            LoadOutcome::Loaded {
                table,
                rows_written,
                ..
            } => (Some(table.clone()), Some(*rows_written as i64)),
            LoadOutcome::Skipped { .. } => (None, None),
        };
        let outcome = serde_json::to_value(summary.outcome)?
            .as_str()
            .unwrap_or_default()
            .to_string();
        let summary_json = serde_json::to_string(summary)?;

        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO etl_run_log (
                run_id, outcome, table_name, rows_written, elapsed_ms, summary_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                summary.run_id,
                outcome,
                table,
                rows,
                summary.elapsed_ms as i64,
                summary_json,
                chrono::Local::now().to_rfc3339(),
            ],
        )?;
        info!(run_id = %summary.run_id, outcome = %outcome, "运行日志已记录");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::FieldType;

    fn sink() -> SqliteDatasetSink {
        SqliteDatasetSink::from_connection(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn schema() -> TypeSchema {
        TypeSchema::from_pairs(&[("bairro", FieldType::Text), ("latitude", FieldType::Float)])
    }

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("dados_ssp.dados_2025").is_ok());
        assert!(validate_table_name("x; DROP TABLE y").is_err());
        assert!(validate_table_name("9abc").is_err());
        assert!(validate_table_name("").is_err());
    }

    #[test]
    fn test_conformity_rejects_undeclared_column() {
        let ds = Dataset::from_rows(vec!["outra".to_string()], vec![vec![CellValue::from("x")]]);
        let result = validate_conformity(&ds, &schema());
        assert!(matches!(result, Err(RepositoryError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_conformity_rejects_wrong_cell_type() {
        let ds = Dataset::from_rows(
            vec!["latitude".to_string()],
            vec![vec![CellValue::from("-23,4")]],
        );
        let result = validate_conformity(&ds, &schema());
        assert!(matches!(result, Err(RepositoryError::SchemaMismatch { .. })));
    }

    #[tokio::test]
    async fn test_replace_table_and_count() {
        let sink = sink();
        let ds = Dataset::from_rows(
            vec!["bairro".to_string(), "latitude".to_string()],
            vec![
                vec![CellValue::from("Centro"), CellValue::Float(-23.5)],
                vec![CellValue::from("Éden"), CellValue::Null],
            ],
        );
        let written = sink.replace_table(&ds, &schema(), "dados_ssp.t").await.unwrap();
        assert_eq!(written, 2);
        assert_eq!(sink.row_count("dados_ssp.t").await.unwrap(), 2);

        // 再次加载为整体替换，而非追加
        let smaller = Dataset::from_rows(
            vec!["bairro".to_string()],
            vec![vec![CellValue::from("Vila")]],
        );
        sink.replace_table(&smaller, &schema(), "dados_ssp.t").await.unwrap();
        assert_eq!(sink.row_count("dados_ssp.t").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_previous_table() {
        let sink = sink();
        let ds = Dataset::from_rows(vec!["bairro".to_string()], vec![vec![CellValue::from("A")]]);
        sink.replace_table(&ds, &schema(), "t").await.unwrap();

        let bad = Dataset::from_rows(
            vec!["latitude".to_string()],
            vec![vec![CellValue::from("abc")]],
        );
        assert!(sink.replace_table(&bad, &schema(), "t").await.is_err());
        assert_eq!(sink.row_count("t").await.unwrap(), 1);
    }
}
