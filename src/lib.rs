//! 为一次训练运行准备带时间戳的输出目录，并组装一组标准的训练观察者：
//! 检查点、学习率衰减、提前停止、事件日志和 CSV 日志。
//!
//! ```no_run
//! use run_callbacks::{RunConfigurator, RunOptions};
//!
//! let setup = RunConfigurator::new("runs")
//!     .prepare(&RunOptions::new("resnet50", "val_accuracy", 10))?;
//! println!("{}", setup.context.run_dir.display());
//! # Ok::<(), run_callbacks::Error>(())
//! ```

pub mod callbacks;
pub mod config;
pub mod error;
pub mod models;
pub mod observers;
pub mod run_dir;

pub use callbacks::{RunConfigurator, RunOptions, RunSetup, standard_callbacks};
pub use error::{Error, Result};
pub use models::{Direction, ObserverSpec, RunContext};
pub use observers::{EpochLogs, Observer, ObserverList, Trainer};
