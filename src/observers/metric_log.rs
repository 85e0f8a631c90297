use crate::error::{Error, Result};
use crate::models::{MetricLogSpec, UpdateFreq};
use crate::observers::{EpochLogs, Observer, Trainer};
use chrono::Utc;
use serde_json::{Value, json};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub const EVENTS_FILE: &str = "events.jsonl";

/// 以 JSON Lines 形式把训练事件写入 log_dir/events.jsonl
#[derive(Debug)]
pub struct MetricLogger {
    spec: MetricLogSpec,
    writer: Option<BufWriter<File>>,
}

impl MetricLogger {
    pub fn new(spec: MetricLogSpec) -> Self {
        Self { spec, writer: None }
    }

    pub fn events_path(&self) -> PathBuf {
        self.spec.log_dir.join(EVENTS_FILE)
    }

    fn open(&mut self) -> Result<&mut BufWriter<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                fs::create_dir_all(&self.spec.log_dir).map_err(|e| Error::io(&self.spec.log_dir, e))?;
                let path = self.events_path();
                // 同一目录下多次训练的事件依次追加
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .map_err(|e| Error::io(&path, e))?;
                BufWriter::new(file)
            }
        };
        Ok(self.writer.insert(writer))
    }

    fn write_event(&mut self, mut event: Value) -> Result<()> {
        event["wall_time"] = json!(Utc::now().timestamp_millis() as f64 / 1000.0);
        let path = self.events_path();
        let writer = self.open()?;
        serde_json::to_writer(&mut *writer, &event)?;
        writer
            .write_all(b"\n")
            .and_then(|_| writer.flush())
            .map_err(|e| Error::io(&path, e))
    }
}

impl Observer for MetricLogger {
    fn name(&self) -> &'static str {
        "MetricLogger"
    }

    fn on_train_begin(&mut self, trainer: &mut dyn Trainer) -> Result<()> {
        let mut event = json!({ "event": "train_begin" });
        if self.spec.write_graph {
            if let Some(graph) = trainer.graph_summary() {
                event["graph"] = Value::String(graph);
            }
        }
        self.write_event(event)
    }

    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs, trainer: &mut dyn Trainer) -> Result<()> {
        // 按 batch 写入时由训练循环负责，这里只处理按 epoch 写入
        if self.spec.update_freq == UpdateFreq::Epoch {
            self.write_event(json!({
                "event": "epoch",
                "epoch": epoch,
                "learning_rate": trainer.learning_rate(),
                "metrics": logs,
            }))?;
        }

        let freq = self.spec.histogram_freq as usize;
        if freq > 0 && epoch % freq == 0 {
            let layers = trainer.layer_histograms();
            if !layers.is_empty() {
                self.write_event(json!({
                    "event": "histograms",
                    "epoch": epoch,
                    "layers": layers,
                }))?;
            }
        }
        Ok(())
    }

    fn on_train_end(&mut self, _trainer: &mut dyn Trainer) -> Result<()> {
        self.write_event(json!({ "event": "train_end" }))?;
        self.writer = None;
        Ok(())
    }
}
