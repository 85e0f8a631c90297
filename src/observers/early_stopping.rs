use crate::error::Result;
use crate::models::EarlyStopSpec;
use crate::observers::{EpochLogs, Observer, Trainer, monitored_value};

/// 监控指标连续 patience 个 epoch 未改进时停止训练
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    spec: EarlyStopSpec,
    wait: u32,
    best: f64,
    best_epoch: Option<usize>,
    stopped_epoch: Option<usize>,
}

impl EarlyStopping {
    pub fn new(spec: EarlyStopSpec) -> Self {
        let best = spec.direction.worst_value();
        Self {
            spec,
            wait: 0,
            best,
            best_epoch: None,
            stopped_epoch: None,
        }
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }

    pub fn stopped_epoch(&self) -> Option<usize> {
        self.stopped_epoch
    }
}

impl Observer for EarlyStopping {
    fn name(&self) -> &'static str {
        "EarlyStopping"
    }

    fn on_train_begin(&mut self, _trainer: &mut dyn Trainer) -> Result<()> {
        self.wait = 0;
        self.best = self.spec.direction.worst_value();
        self.best_epoch = None;
        self.stopped_epoch = None;
        Ok(())
    }

    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs, trainer: &mut dyn Trainer) -> Result<()> {
        let Some(current) = monitored_value(self.name(), &self.spec.monitor, logs) else {
            return Ok(());
        };

        self.wait += 1;
        if self.spec.direction.is_improvement(current, self.best, self.spec.min_delta) {
            self.best = current;
            self.best_epoch = Some(epoch);
            self.wait = 0;
            if self.spec.restore_best_weights {
                trainer.snapshot_weights();
            }
            return Ok(());
        }

        // 第一个 epoch 永远不会触发停止
        if self.wait >= self.spec.patience && epoch > 0 {
            self.stopped_epoch = Some(epoch);
            trainer.request_stop();
            tracing::debug!(epoch, wait = self.wait, "early stopping triggered");

            if self.spec.restore_best_weights {
                if let Some(best_epoch) = self.best_epoch {
                    if self.spec.verbose {
                        println!(
                            "Restoring model weights from the end of the best epoch: {}.",
                            best_epoch + 1
                        );
                    }
                    trainer.restore_weights()?;
                }
            }
        }
        Ok(())
    }

    fn on_train_end(&mut self, _trainer: &mut dyn Trainer) -> Result<()> {
        if let Some(stopped) = self.stopped_epoch {
            if self.spec.verbose {
                println!("Epoch {}: early stopping", stopped + 1);
            }
        }
        Ok(())
    }
}
