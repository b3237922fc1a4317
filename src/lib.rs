// ==========================================
// SSP 犯罪数据 ETL - 核心库
// ==========================================
// 职责: 圣保罗州公共安全局（SSP）表格导出 → 汇总 → 辖区过滤
//       → 清洗与类型规整 → 整表替换加载
// 技术栈: Rust + calamine/csv + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 数据集与类型
pub mod domain;

// 配置层 - 按数据源的管道配置
pub mod config;

// 导入层 - 源读取与汇总
pub mod importer;

// 引擎层 - 转换管道与加载
pub mod engine;

// 数据仓储层 - 加载目标
pub mod repository;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{preset, PipelineConfig};
pub use domain::{CellValue, Dataset, FieldType, RawRecordBatch, RunSummary, TypeSchema};
pub use engine::{EtlOrchestrator, PipelineError, TransformPipeline};
pub use importer::{SourceReader, UniversalSourceReader};
pub use repository::{DatasetSink, SqliteDatasetSink};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "SSP 犯罪数据 ETL";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
