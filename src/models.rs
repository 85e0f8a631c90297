// models.rs - 作为模块目录入口文件（Rust 2018+ 风格）
// 导出所有子模块
pub mod config;
pub mod direction;
pub mod observer_spec;
pub mod run_context;

// 重新导出常用类型，保持API一致性
pub use config::{Config, DefaultsConfig, GeneralConfig};
pub use direction::{Direction, MAXIMIZE_KEYWORDS};
pub use observer_spec::{
    CheckpointSpec, CsvLogSpec, EarlyStopSpec, MetricLogSpec, ObserverSpec, ReduceLrSpec, UpdateFreq,
};
pub use run_context::RunContext;
