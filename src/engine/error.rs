// ==========================================
// SSP 犯罪数据 ETL - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束: 单元格级解析失败不是错误（置 Null / 丢行并计数）
// ==========================================

use crate::config::ConfigError;
use crate::importer::ImportError;
use crate::repository::RepositoryError;
use thiserror::Error;

/// 转换阶段错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("过滤列缺失 (stage={stage}): {column}")]
    MissingFilterColumn { stage: String, column: String },

    #[error("配置无效: {0}")]
    InvalidConfig(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

/// 运行级错误（阶段边界失败向上传播）
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
