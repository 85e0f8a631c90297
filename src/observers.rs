//! 训练观察者运行时：每种配置对应一个实现，由外部训练循环在固定时机调用

pub mod checkpoint;
pub mod csv_log;
pub mod early_stopping;
pub mod metric_log;
pub mod reduce_lr;

use crate::error::Result;
use crate::models::ObserverSpec;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

pub use checkpoint::ModelCheckpoint;
pub use csv_log::CsvLogger;
pub use early_stopping::EarlyStopping;
pub use metric_log::MetricLogger;
pub use reduce_lr::ReduceLrOnPlateau;

/// 一个 epoch 结束时的指标，键有序
pub type EpochLogs = BTreeMap<String, f64>;

/// 单层参数的数值分布
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerHistogram {
    pub name: String,
    pub bucket_edges: Vec<f64>, // 长度为 counts.len() + 1
    pub counts: Vec<u64>,
}

/// 训练循环向观察者开放的操作，由调用方实现
pub trait Trainer {
    fn learning_rate(&self) -> f64;
    fn set_learning_rate(&mut self, lr: f64);
    /// 在当前 epoch 结束后停止训练
    fn request_stop(&mut self);
    fn save_model(&mut self, path: &Path, weights_only: bool) -> anyhow::Result<()>;
    /// 保存当前权重的副本，覆盖之前的副本
    fn snapshot_weights(&mut self);
    /// 恢复最近一次 `snapshot_weights` 保存的权重
    fn restore_weights(&mut self) -> anyhow::Result<()>;

    fn layer_histograms(&self) -> Vec<LayerHistogram> {
        Vec::new()
    }

    fn graph_summary(&self) -> Option<String> {
        None
    }
}

/// 训练观察者，epoch 编号从 0 开始
pub trait Observer: Send {
    fn name(&self) -> &'static str;

    fn on_train_begin(&mut self, _trainer: &mut dyn Trainer) -> Result<()> {
        Ok(())
    }

    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs, trainer: &mut dyn Trainer) -> Result<()>;

    fn on_train_end(&mut self, _trainer: &mut dyn Trainer) -> Result<()> {
        Ok(())
    }
}

/// 由配置创建对应的观察者
pub fn instantiate(spec: &ObserverSpec) -> Box<dyn Observer> {
    match spec {
        ObserverSpec::Checkpoint(spec) => Box::new(ModelCheckpoint::new(spec.clone())),
        ObserverSpec::ReduceLr(spec) => Box::new(ReduceLrOnPlateau::new(spec.clone())),
        ObserverSpec::EarlyStop(spec) => Box::new(EarlyStopping::new(spec.clone())),
        ObserverSpec::MetricLog(spec) => Box::new(MetricLogger::new(spec.clone())),
        ObserverSpec::CsvLog(spec) => Box::new(CsvLogger::new(spec.clone())),
    }
}

/// 按顺序分发钩子的观察者列表，遇到第一个错误即返回
#[derive(Default)]
pub struct ObserverList {
    observers: Vec<Box<dyn Observer>>,
}

impl ObserverList {
    pub fn new(observers: Vec<Box<dyn Observer>>) -> Self {
        Self { observers }
    }

    pub fn from_specs(specs: &[ObserverSpec]) -> Self {
        Self::new(specs.iter().map(instantiate).collect())
    }

    pub fn push(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.observers.iter().map(|o| o.name()).collect()
    }

    pub fn on_train_begin(&mut self, trainer: &mut dyn Trainer) -> Result<()> {
        for observer in &mut self.observers {
            observer.on_train_begin(trainer)?;
        }
        Ok(())
    }

    pub fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs, trainer: &mut dyn Trainer) -> Result<()> {
        for observer in &mut self.observers {
            observer.on_epoch_end(epoch, logs, trainer)?;
        }
        Ok(())
    }

    pub fn on_train_end(&mut self, trainer: &mut dyn Trainer) -> Result<()> {
        for observer in &mut self.observers {
            observer.on_train_end(trainer)?;
        }
        Ok(())
    }
}

/// 取出监控指标的值，缺失时记录警告
pub(crate) fn monitored_value(observer: &str, monitor: &str, logs: &EpochLogs) -> Option<f64> {
    let value = logs.get(monitor).copied();
    if value.is_none() {
        let available: Vec<&str> = logs.keys().map(String::as_str).collect();
        tracing::warn!(
            observer,
            monitor,
            ?available,
            "monitored metric is not available in epoch logs, skipping"
        );
    }
    value
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::path::PathBuf;

    /// 记录所有调用的假训练器
    #[derive(Debug)]
    pub struct MockTrainer {
        pub lr: f64,
        pub stop_requested: bool,
        pub saved: Vec<(PathBuf, bool)>,
        pub snapshots: usize,
        pub restores: usize,
        pub histograms: Vec<LayerHistogram>,
        pub graph: Option<String>,
    }

    impl MockTrainer {
        pub fn new(lr: f64) -> Self {
            Self {
                lr,
                stop_requested: false,
                saved: Vec::new(),
                snapshots: 0,
                restores: 0,
                histograms: Vec::new(),
                graph: None,
            }
        }
    }

    impl Trainer for MockTrainer {
        fn learning_rate(&self) -> f64 {
            self.lr
        }

        fn set_learning_rate(&mut self, lr: f64) {
            self.lr = lr;
        }

        fn request_stop(&mut self) {
            self.stop_requested = true;
        }

        fn save_model(&mut self, path: &Path, weights_only: bool) -> anyhow::Result<()> {
            self.saved.push((path.to_path_buf(), weights_only));
            Ok(())
        }

        fn snapshot_weights(&mut self) {
            self.snapshots += 1;
        }

        fn restore_weights(&mut self) -> anyhow::Result<()> {
            self.restores += 1;
            Ok(())
        }

        fn layer_histograms(&self) -> Vec<LayerHistogram> {
            self.histograms.clone()
        }

        fn graph_summary(&self) -> Option<String> {
            self.graph.clone()
        }
    }

    pub fn logs(pairs: &[(&str, f64)]) -> EpochLogs {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{MockTrainer, logs};
    use super::*;
    use crate::callbacks::{RunConfigurator, RunOptions};
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_from_specs_keeps_order() {
        let temp_dir = tempdir().unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let setup = RunConfigurator::new(temp_dir.path())
            .prepare_at(&RunOptions::default(), &now)
            .unwrap();

        let list = ObserverList::from_specs(&setup.observers);
        assert_eq!(list.len(), 5);
        assert_eq!(
            list.names(),
            vec!["ModelCheckpoint", "ReduceLROnPlateau", "EarlyStopping", "MetricLogger", "CSVLogger"]
        );
    }

    #[test]
    fn test_full_training_session() {
        let temp_dir = tempdir().unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let setup = RunConfigurator::new(temp_dir.path())
            .prepare_at(&RunOptions::new("session", "val_loss", 2), &now)
            .unwrap();
        let mut list = ObserverList::from_specs(&setup.observers);
        let mut trainer = MockTrainer::new(0.01);

        list.on_train_begin(&mut trainer).unwrap();
        let losses = [0.9, 0.7, 0.8, 0.75];
        for (epoch, loss) in losses.iter().enumerate() {
            list.on_epoch_end(epoch, &logs(&[("loss", 1.0), ("val_loss", *loss)]), &mut trainer)
                .unwrap();
            if trainer.stop_requested {
                break;
            }
        }
        list.on_train_end(&mut trainer).unwrap();

        // 两次改进各保存一次
        assert_eq!(trainer.saved.len(), 2);
        assert!(trainer.saved.iter().all(|(p, w)| *p == setup.context.checkpoint_path && !w));
        // 连续两个 epoch 没有改进，触发提前停止并恢复最优权重
        assert!(trainer.stop_requested);
        assert_eq!(trainer.restores, 1);
        // 停滞时间不足 3 个 epoch，学习率不变
        assert_eq!(trainer.lr, 0.01);

        let csv = fs::read_to_string(&setup.context.csv_path).unwrap();
        assert_eq!(csv.lines().count(), 1 + 4);
        assert!(setup.context.log_dir.join("events.jsonl").is_file());
    }

    #[test]
    fn test_empty_list() {
        let mut list = ObserverList::default();
        let mut trainer = MockTrainer::new(0.1);
        assert!(list.is_empty());
        list.on_train_begin(&mut trainer).unwrap();
        list.on_epoch_end(0, &logs(&[("loss", 1.0)]), &mut trainer).unwrap();
        list.on_train_end(&mut trainer).unwrap();
    }

    #[test]
    fn test_monitored_value_missing() {
        let epoch_logs = logs(&[("loss", 0.3)]);
        assert_eq!(monitored_value("test", "loss", &epoch_logs), Some(0.3));
        assert_eq!(monitored_value("test", "val_loss", &epoch_logs), None);
    }
}
