// src/callbacks.rs
use crate::error::Result;
use crate::models::{
    CheckpointSpec, Config, CsvLogSpec, Direction, EarlyStopSpec, MetricLogSpec, ObserverSpec,
    ReduceLrSpec, RunContext, UpdateFreq,
};
use crate::run_dir::{create_run_dirs, format_timestamp};
use chrono::{Local, NaiveDateTime};
use crossterm::style::Stylize;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_DIR: &str = "runs";
pub const DEFAULT_CHECKPOINT_EXTENSION: &str = "safetensors";

// 学习率衰减的参数与 patience 参数无关，固定不变
pub const REDUCE_LR_FACTOR: f64 = 0.5;
pub const REDUCE_LR_PATIENCE: u32 = 3;
pub const REDUCE_LR_MIN_LR: f64 = 1e-6;
pub const REDUCE_LR_MIN_DELTA: f64 = 1e-4;

pub const HISTOGRAM_FREQ: u32 = 1;
pub const CSV_SEPARATOR: char = ',';

/// build 的三个参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub run_name: String,
    pub monitor: String,
    pub patience: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            run_name: "default_run".to_string(),
            monitor: "val_loss".to_string(),
            patience: 7,
        }
    }
}

impl RunOptions {
    pub fn new(run_name: impl Into<String>, monitor: impl Into<String>, patience: u32) -> Self {
        Self {
            run_name: run_name.into(),
            monitor: monitor.into(),
            patience,
        }
    }
}

/// 一次配置的完整结果：路径、方向与有序的观察者列表
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSetup {
    pub context: RunContext,
    pub direction: Direction,
    pub observers: Vec<ObserverSpec>,
}

/// 为一次训练运行准备目录并组装标准观察者列表
#[derive(Debug, Clone)]
pub struct RunConfigurator {
    base_dir: PathBuf,
    checkpoint_extension: String,
}

impl Default for RunConfigurator {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DIR)
    }
}

impl RunConfigurator {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            checkpoint_extension: DEFAULT_CHECKPOINT_EXTENSION.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.general.base_dir).with_checkpoint_extension(&config.general.checkpoint_extension)
    }

    pub fn with_checkpoint_extension(mut self, extension: impl Into<String>) -> Self {
        self.checkpoint_extension = extension.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 返回五个观察者配置，顺序固定：
    /// Checkpoint, ReduceLr, EarlyStop, MetricLog, CsvLog
    pub fn build(&self, options: &RunOptions) -> Result<Vec<ObserverSpec>> {
        Ok(self.prepare(options)?.observers)
    }

    /// 以当前本地时间为时间戳进行配置
    pub fn prepare(&self, options: &RunOptions) -> Result<RunSetup> {
        self.prepare_at(options, &Local::now().naive_local())
    }

    /// 以给定时刻为时间戳进行配置，同一时刻的结果是确定的
    pub fn prepare_at(&self, options: &RunOptions, now: &NaiveDateTime) -> Result<RunSetup> {
        let timestamp = format_timestamp(now);
        let context = RunContext::new(
            &self.base_dir,
            &options.run_name,
            &timestamp,
            &self.checkpoint_extension,
        );
        create_run_dirs(&context)?;

        let direction = Direction::from_monitor(&options.monitor);
        let observers = standard_observers(&context, &options.monitor, options.patience, direction);

        print_status(&context);

        Ok(RunSetup {
            context,
            direction,
            observers,
        })
    }
}

/// 组装标准观察者列表，不触碰文件系统
pub fn standard_observers(
    ctx: &RunContext,
    monitor: &str,
    patience: u32,
    direction: Direction,
) -> Vec<ObserverSpec> {
    let checkpoint = ObserverSpec::Checkpoint(CheckpointSpec {
        path: ctx.checkpoint_path.clone(),
        monitor: monitor.to_string(),
        direction,
        save_best_only: true,
        save_weights_only: false,
        verbose: true,
    });

    let reduce_lr = ObserverSpec::ReduceLr(ReduceLrSpec {
        monitor: monitor.to_string(),
        factor: REDUCE_LR_FACTOR,
        patience: REDUCE_LR_PATIENCE,
        min_lr: REDUCE_LR_MIN_LR,
        min_delta: REDUCE_LR_MIN_DELTA,
        cooldown: 0,
        direction,
        verbose: true,
    });

    let early_stop = ObserverSpec::EarlyStop(EarlyStopSpec {
        monitor: monitor.to_string(),
        patience,
        min_delta: 0.0,
        direction,
        restore_best_weights: true,
        verbose: true,
    });

    let metric_log = ObserverSpec::MetricLog(MetricLogSpec {
        log_dir: ctx.log_dir.clone(),
        histogram_freq: HISTOGRAM_FREQ,
        write_graph: true,
        update_freq: UpdateFreq::Epoch,
    });

    let csv_log = ObserverSpec::CsvLog(CsvLogSpec {
        path: ctx.csv_path.clone(),
        append: false,
        separator: CSV_SEPARATOR,
    });

    vec![checkpoint, reduce_lr, early_stop, metric_log, csv_log]
}

fn print_status(ctx: &RunContext) {
    println!("{} Initialized for run: {}", "[CALLBACKS]".green(), ctx.run_name);
    println!(
        "  → Logs: {} | Checkpoints: {}",
        ctx.log_dir.display(),
        ctx.checkpoint_path.display()
    );
}

/// 在当前工作目录下的 runs/ 中为一次运行组装标准观察者列表
pub fn standard_callbacks(run_name: &str, monitor: &str, patience: u32) -> Result<Vec<ObserverSpec>> {
    RunConfigurator::default().build(&RunOptions::new(run_name, monitor, patience))
}
