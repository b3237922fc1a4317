// ==========================================
// SSP 犯罪数据 ETL - 加载目标 Trait
// ==========================================
// 职责: 定义加载目标边界（不包含转换逻辑）
// 约束: 替换式加载必须原子：失败不得留下半截断的目标表
// ==========================================

use crate::domain::dataset::Dataset;
use crate::domain::report::RunSummary;
use crate::domain::schema::TypeSchema;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// DatasetSink Trait
// ==========================================
// 实现者: SqliteDatasetSink（使用 rusqlite）
#[async_trait]
pub trait DatasetSink: Send + Sync {
    /// 以数据集整体替换目标表内容
    ///
    /// # 参数
    /// - dataset: 转换后的数据集（列须全部在 schema 中）
    /// - schema: 已按数据集列过滤的 schema
    /// - table: 目标表标识
    ///
    /// # 返回
    /// - Ok(usize): 写入行数
    /// - Err: SchemaMismatch / 数据库错误（目标表保持原状）
    async fn replace_table(
        &self,
        dataset: &Dataset,
        schema: &TypeSchema,
        table: &str,
    ) -> RepositoryResult<usize>;

    /// 查询目标表行数
    async fn row_count(&self, table: &str) -> RepositoryResult<usize>;

    /// 记录一次运行
    async fn record_run(&self, summary: &RunSummary) -> RepositoryResult<()>;
}
