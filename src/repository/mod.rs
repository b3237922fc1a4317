// ==========================================
// SSP 犯罪数据 ETL - 数据仓储层
// ==========================================
// 职责: 加载目标边界，屏蔽数据库细节
// 红线: Repository 不含转换逻辑
// 约束: 数据值一律参数化写入；表/列标识经校验后加引号
// ==========================================

pub mod dataset_sink;
pub mod error;
pub mod sqlite_sink;

// 重导出核心仓储
pub use dataset_sink::DatasetSink;
pub use error::{RepositoryError, RepositoryResult};
pub use sqlite_sink::SqliteDatasetSink;
