// ==========================================
// SSP 犯罪数据 ETL - 导入层
// ==========================================
// 职责: 源文件读取与多批次汇总
// 支持: Excel（逐工作表）, CSV
// ==========================================

// 模块声明
pub mod consolidator;
pub mod error;
pub mod file_parser;
pub mod source_loader;

// 重导出核心类型
pub use consolidator::{Consolidation, Consolidator};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvReader, ExcelReader, SourceReader, UniversalSourceReader};
pub use source_loader::{discover_sources, load_sources, SourceBatches};
