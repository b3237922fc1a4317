// ==========================================
// SSP 犯罪数据 ETL - Schema 校验加载器
// ==========================================
// 职责: schema 过滤为实际存在列 → 整表替换 → 回查行数
// 前置: 空数据集直接无操作返回（不调用加载目标）
// ==========================================

use crate::domain::dataset::Dataset;
use crate::domain::report::LoadOutcome;
use crate::domain::schema::TypeSchema;
use crate::repository::{DatasetSink, RepositoryResult};
use std::sync::Arc;
use tracing::{info, warn};

pub struct SchemaValidatedLoader {
    sink: Arc<dyn DatasetSink>,
}

impl SchemaValidatedLoader {
    pub fn new(sink: Arc<dyn DatasetSink>) -> Self {
        Self { sink }
    }

    /// 加载数据集到目标表
    ///
    /// # 参数
    /// - dataset: 转换后的数据集
    /// - schema: 完整规范 schema（与单次运行的实际列无关）
    /// - table: 目标表标识
    pub async fn load(
        &self,
        dataset: &Dataset,
        schema: &TypeSchema,
        table: &str,
    ) -> RepositoryResult<LoadOutcome> {
        if dataset.is_empty() {
            let reason = "数据集为空（无行通过过滤/清洗），跳过加载".to_string();
            warn!(table = %table, "{}", reason);
            return Ok(LoadOutcome::Skipped { reason });
        }

        let filtered = schema.filter_to_columns(dataset.columns());
        if filtered.len() < schema.len() {
            info!(
                declared = schema.len(),
                present = filtered.len(),
                "schema 已按实际列过滤"
            );
        }

        let rows_written = self.sink.replace_table(dataset, &filtered, table).await?;
        let table_rows = self.sink.row_count(table).await?;
        info!(
            table = %table,
            rows_written,
            table_rows,
            "加载完成"
        );

        Ok(LoadOutcome::Loaded {
            table: table.to_string(),
            rows_written,
            table_rows,
            schema_fields: filtered.len(),
        })
    }
}
