use crate::models::direction::Direction;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 指标日志的写入频率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateFreq {
    Epoch,      // 每个 epoch 结束时写入
    Batch(u32), // 每 N 个 batch 写入，由训练循环自行驱动
}

/// 保存最优模型的检查点配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSpec {
    pub path: PathBuf,
    pub monitor: String,
    pub direction: Direction,
    pub save_best_only: bool,
    pub save_weights_only: bool,
    pub verbose: bool,
}

/// 指标停滞时降低学习率的配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReduceLrSpec {
    pub monitor: String,
    pub factor: f64,
    pub patience: u32,
    pub min_lr: f64,
    pub min_delta: f64,
    pub cooldown: u32,
    pub direction: Direction,
    pub verbose: bool,
}

/// 提前停止配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyStopSpec {
    pub monitor: String,
    pub patience: u32,
    pub min_delta: f64,
    pub direction: Direction,
    pub restore_best_weights: bool,
    pub verbose: bool,
}

/// 事件日志（指标、直方图、计算图）配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricLogSpec {
    pub log_dir: PathBuf,
    pub histogram_freq: u32,
    pub write_graph: bool,
    pub update_freq: UpdateFreq,
}

/// CSV 训练日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvLogSpec {
    pub path: PathBuf,
    pub append: bool,
    pub separator: char,
}

/// 观察者配置，五种固定类型之一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObserverSpec {
    Checkpoint(CheckpointSpec),
    ReduceLr(ReduceLrSpec),
    EarlyStop(EarlyStopSpec),
    MetricLog(MetricLogSpec),
    CsvLog(CsvLogSpec),
}

impl ObserverSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            ObserverSpec::Checkpoint(_) => "checkpoint",
            ObserverSpec::ReduceLr(_) => "reduce_lr",
            ObserverSpec::EarlyStop(_) => "early_stop",
            ObserverSpec::MetricLog(_) => "metric_log",
            ObserverSpec::CsvLog(_) => "csv_log",
        }
    }

    /// 该观察者监控的指标名，日志类观察者没有
    pub fn monitor(&self) -> Option<&str> {
        match self {
            ObserverSpec::Checkpoint(spec) => Some(&spec.monitor),
            ObserverSpec::ReduceLr(spec) => Some(&spec.monitor),
            ObserverSpec::EarlyStop(spec) => Some(&spec.monitor),
            ObserverSpec::MetricLog(_) | ObserverSpec::CsvLog(_) => None,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            ObserverSpec::Checkpoint(spec) => Some(spec.direction),
            ObserverSpec::ReduceLr(spec) => Some(spec.direction),
            ObserverSpec::EarlyStop(spec) => Some(spec.direction),
            ObserverSpec::MetricLog(_) | ObserverSpec::CsvLog(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn early_stop() -> ObserverSpec {
        ObserverSpec::EarlyStop(EarlyStopSpec {
            monitor: "val_loss".to_string(),
            patience: 7,
            min_delta: 0.0,
            direction: Direction::Minimize,
            restore_best_weights: true,
            verbose: true,
        })
    }

    #[test]
    fn test_kind_and_monitor() {
        let spec = early_stop();
        assert_eq!(spec.kind(), "early_stop");
        assert_eq!(spec.monitor(), Some("val_loss"));
        assert_eq!(spec.direction(), Some(Direction::Minimize));

        let csv = ObserverSpec::CsvLog(CsvLogSpec {
            path: PathBuf::from("runs/a/a_training_log.csv"),
            append: false,
            separator: ',',
        });
        assert_eq!(csv.kind(), "csv_log");
        assert_eq!(csv.monitor(), None);
        assert_eq!(csv.direction(), None);
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_value(early_stop()).unwrap();
        assert_eq!(json["kind"], "early_stop");
        assert_eq!(json["patience"], 7);
        assert_eq!(json["direction"], "minimize");
    }

    #[test]
    fn test_deserialize_metric_log_yaml() {
        let yaml = r#"
        kind: metric_log
        log_dir: runs/exp_20240101_000000/logs
        histogram_freq: 1
        write_graph: true
        update_freq: epoch
        "#;
        let spec: ObserverSpec = serde_yaml::from_str(yaml).expect("Failed to deserialize spec");
        match spec {
            ObserverSpec::MetricLog(log) => {
                assert_eq!(log.histogram_freq, 1);
                assert_eq!(log.update_freq, UpdateFreq::Epoch);
                assert!(log.log_dir.ends_with("logs"));
            }
            other => panic!("unexpected spec: {:?}", other),
        }
    }
}
