use crate::error::Result;
use crate::models::CheckpointSpec;
use crate::observers::{EpochLogs, Observer, Trainer, monitored_value};

/// 监控指标改进时保存模型
#[derive(Debug, Clone)]
pub struct ModelCheckpoint {
    spec: CheckpointSpec,
    best: f64,
}

impl ModelCheckpoint {
    pub fn new(spec: CheckpointSpec) -> Self {
        let best = spec.direction.worst_value();
        Self { spec, best }
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    fn save(&self, trainer: &mut dyn Trainer) -> Result<()> {
        trainer.save_model(&self.spec.path, self.spec.save_weights_only)?;
        Ok(())
    }
}

impl Observer for ModelCheckpoint {
    fn name(&self) -> &'static str {
        "ModelCheckpoint"
    }

    fn on_train_begin(&mut self, _trainer: &mut dyn Trainer) -> Result<()> {
        self.best = self.spec.direction.worst_value();
        Ok(())
    }

    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs, trainer: &mut dyn Trainer) -> Result<()> {
        if !self.spec.save_best_only {
            if self.spec.verbose {
                println!("Epoch {}: saving model to {}", epoch + 1, self.spec.path.display());
            }
            return self.save(trainer);
        }

        let Some(current) = monitored_value(self.name(), &self.spec.monitor, logs) else {
            return Ok(());
        };

        if self.spec.direction.is_improvement(current, self.best, 0.0) {
            if self.spec.verbose {
                println!(
                    "Epoch {}: {} improved from {:.5} to {:.5}, saving model to {}",
                    epoch + 1,
                    self.spec.monitor,
                    self.best,
                    current,
                    self.spec.path.display()
                );
            }
            self.best = current;
            self.save(trainer)?;
        } else if self.spec.verbose {
            println!(
                "Epoch {}: {} did not improve from {:.5}",
                epoch + 1,
                self.spec.monitor,
                self.best
            );
        }
        Ok(())
    }
}
