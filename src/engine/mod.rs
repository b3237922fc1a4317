// ==========================================
// SSP 犯罪数据 ETL - 引擎层
// ==========================================
// 职责: 转换管道各阶段、加载前检查、加载与运行编排
// 红线: 引擎不拼数据 SQL；单元格解析失败就地恢复并计数
// ==========================================

pub mod categorical_filter;
pub mod data_cleaner;
pub mod date_normalizer;
pub mod dq_validator;
pub mod error;
pub mod field_mapper;
pub mod loader;
pub mod orchestrator;
pub mod projector;
pub mod stage;
pub mod transform;
pub mod type_coercer;

// 重导出核心引擎
pub use categorical_filter::CategoricalFilter;
pub use data_cleaner::{title_case, NullFiller, TextNormalizer};
pub use date_normalizer::{weekday_label, DateNormalizer, WEEKDAY_LABELS};
pub use dq_validator::DqValidator;
pub use error::{EngineError, EngineResult, PipelineError, PipelineResult};
pub use field_mapper::ColumnRenamer;
pub use loader::SchemaValidatedLoader;
pub use orchestrator::EtlOrchestrator;
pub use projector::SchemaProjector;
pub use stage::{run_stage, TransformStage};
pub use transform::TransformPipeline;
pub use type_coercer::{NumericCoercer, TextCoercer, TimeCoercer};
