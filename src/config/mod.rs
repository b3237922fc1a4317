// ==========================================
// SSP 犯罪数据 ETL - 配置层
// ==========================================
// 职责: 按数据源的管道配置（JSON / 内置预设）
// ==========================================

pub mod pipeline_config;
pub mod presets;

// 重导出核心配置类型
pub use pipeline_config::{
    ColumnRename, ConfigError, ConfigResult, DateConfig, FilterRule, IntegerPolicy,
    MissingColumnPolicy, PipelineConfig, DEFAULT_DATE_FORMAT, DEFAULT_SENTINEL,
};
pub use presets::{preset, PRESET_NAMES};
