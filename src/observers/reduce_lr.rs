use crate::error::Result;
use crate::models::ReduceLrSpec;
use crate::observers::{EpochLogs, Observer, Trainer, monitored_value};

/// 监控指标停滞时按 factor 降低学习率，不低于 min_lr
#[derive(Debug, Clone)]
pub struct ReduceLrOnPlateau {
    spec: ReduceLrSpec,
    wait: u32,
    cooldown_counter: u32,
    best: f64,
}

impl ReduceLrOnPlateau {
    pub fn new(spec: ReduceLrSpec) -> Self {
        let best = spec.direction.worst_value();
        Self {
            spec,
            wait: 0,
            cooldown_counter: 0,
            best,
        }
    }

    fn in_cooldown(&self) -> bool {
        self.cooldown_counter > 0
    }

    fn reset(&mut self) {
        self.best = self.spec.direction.worst_value();
        self.wait = 0;
        self.cooldown_counter = 0;
    }
}

impl Observer for ReduceLrOnPlateau {
    fn name(&self) -> &'static str {
        "ReduceLROnPlateau"
    }

    fn on_train_begin(&mut self, _trainer: &mut dyn Trainer) -> Result<()> {
        self.reset();
        Ok(())
    }

    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs, trainer: &mut dyn Trainer) -> Result<()> {
        let Some(current) = monitored_value(self.name(), &self.spec.monitor, logs) else {
            return Ok(());
        };

        if self.in_cooldown() {
            self.cooldown_counter -= 1;
            self.wait = 0;
        }

        if self.spec.direction.is_improvement(current, self.best, self.spec.min_delta) {
            self.best = current;
            self.wait = 0;
        } else if !self.in_cooldown() {
            self.wait += 1;
            if self.wait >= self.spec.patience {
                let old_lr = trainer.learning_rate();
                if old_lr > self.spec.min_lr {
                    let new_lr = (old_lr * self.spec.factor).max(self.spec.min_lr);
                    trainer.set_learning_rate(new_lr);
                    tracing::debug!(old_lr, new_lr, "learning rate reduced");
                    if self.spec.verbose {
                        println!(
                            "Epoch {}: ReduceLROnPlateau reducing learning rate to {}.",
                            epoch + 1,
                            new_lr
                        );
                    }
                    self.cooldown_counter = self.spec.cooldown;
                    self.wait = 0;
                }
            }
        }
        Ok(())
    }
}
