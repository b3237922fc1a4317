// ==========================================
// SSP 犯罪数据 ETL - 领域层
// ==========================================
// 职责: 数据集、单元格类型、Schema 与诊断报告
// 红线: 领域层不含 I/O
// ==========================================

pub mod dataset;
pub mod report;
pub mod schema;
pub mod types;

// 重导出核心类型
pub use dataset::{Dataset, RawRecordBatch};
pub use report::{
    AdmissionDecision, BatchAdmission, ColumnProfile, LoadOutcome, NumericResidual, RunOutcome,
    RunSummary, TransformReport,
};
pub use schema::{FieldMode, SchemaField, TypeSchema};
pub use types::{CellValue, FieldType};
