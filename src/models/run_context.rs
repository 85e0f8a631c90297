use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CHECKPOINTS_DIR: &str = "checkpoints";
pub const LOGS_DIR: &str = "logs";
pub const CHECKPOINT_STEM: &str = "best_model";

/// 单次运行的目录与文件路径，构造后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunContext {
    pub run_name: String,
    pub timestamp: String, // YYYYMMDD_HHMMSS
    pub run_dir: PathBuf,
    pub checkpoint_path: PathBuf,
    pub csv_path: PathBuf,
    pub log_dir: PathBuf,
}

impl RunContext {
    /// 由基础目录、运行名和时间戳推导出全部路径，不触碰文件系统
    pub fn new(base_dir: &Path, run_name: &str, timestamp: &str, checkpoint_ext: &str) -> Self {
        let run_dir = base_dir.join(format!("{}_{}", run_name, timestamp));
        let checkpoint_path = run_dir
            .join(CHECKPOINTS_DIR)
            .join(format!("{}.{}", CHECKPOINT_STEM, checkpoint_ext));
        let csv_path = run_dir.join(format!("{}_training_log.csv", run_name));
        let log_dir = run_dir.join(LOGS_DIR);

        Self {
            run_name: run_name.to_string(),
            timestamp: timestamp.to_string(),
            run_dir,
            checkpoint_path,
            csv_path,
            log_dir,
        }
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        self.run_dir.join(CHECKPOINTS_DIR)
    }
}
