use crate::error::{Error, Result};
use crate::models::CsvLogSpec;
use crate::observers::{EpochLogs, Observer, Trainer};
use std::fs::{File, OpenOptions};

/// 每个 epoch 向 CSV 文件追加一行指标
pub struct CsvLogger {
    spec: CsvLogSpec,
    writer: Option<csv::Writer<File>>,
    keys: Option<Vec<String>>,
    write_header: bool,
}

impl CsvLogger {
    pub fn new(spec: CsvLogSpec) -> Self {
        Self {
            spec,
            writer: None,
            keys: None,
            write_header: true,
        }
    }

    fn open(&mut self) -> Result<()> {
        if !self.spec.separator.is_ascii() {
            return Err(Error::InvalidSeparator(self.spec.separator));
        }
        let delimiter = self.spec.separator as u8;

        let path = &self.spec.path;
        // 追加到非空文件时沿用原有表头
        self.write_header = !(self.spec.append
            && path.metadata().map(|m| m.len() > 0).unwrap_or(false));

        let mut options = OpenOptions::new();
        options.create(true);
        if self.spec.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options.open(path).map_err(|e| Error::io(path, e))?;

        self.writer = Some(
            csv::WriterBuilder::new()
                .delimiter(delimiter)
                .has_headers(false)
                .from_writer(file),
        );
        self.keys = None;
        Ok(())
    }
}

impl Observer for CsvLogger {
    fn name(&self) -> &'static str {
        "CSVLogger"
    }

    fn on_train_begin(&mut self, _trainer: &mut dyn Trainer) -> Result<()> {
        self.open()
    }

    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs, _trainer: &mut dyn Trainer) -> Result<()> {
        if self.writer.is_none() {
            self.open()?;
        }
        // 列以第一个 epoch 的指标为准，之后缺失的值写 NA
        let keys = self
            .keys
            .get_or_insert_with(|| logs.keys().cloned().collect())
            .clone();

        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        if self.write_header {
            let header = std::iter::once("epoch").chain(keys.iter().map(String::as_str));
            writer.write_record(header)?;
            self.write_header = false;
        }

        let row = std::iter::once(epoch.to_string()).chain(keys.iter().map(|key| {
            logs.get(key)
                .map(|value| value.to_string())
                .unwrap_or_else(|| "NA".to_string())
        }));
        writer.write_record(row)?;
        writer.flush().map_err(|e| Error::io(&self.spec.path, e))?;
        Ok(())
    }

    fn on_train_end(&mut self, _trainer: &mut dyn Trainer) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| Error::io(&self.spec.path, e))?;
        }
        self.keys = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::test_support::{MockTrainer, logs};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn spec(path: PathBuf, append: bool, separator: char) -> CsvLogSpec {
        CsvLogSpec {
            path,
            append,
            separator,
        }
    }

    fn session(logger: &mut CsvLogger, rows: &[&[(&str, f64)]]) {
        let mut trainer = MockTrainer::new(0.1);
        logger.on_train_begin(&mut trainer).unwrap();
        for (epoch, row) in rows.iter().enumerate() {
            logger.on_epoch_end(epoch, &logs(row), &mut trainer).unwrap();
        }
        logger.on_train_end(&mut trainer).unwrap();
    }

    #[test]
    fn test_header_and_rows() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("exp_training_log.csv");
        let mut logger = CsvLogger::new(spec(path.clone(), false, ','));

        session(
            &mut logger,
            &[&[("val_loss", 0.5), ("loss", 0.75)], &[("val_loss", 0.25), ("loss", 0.5)]],
        );

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "epoch,loss,val_loss\n0,0.75,0.5\n1,0.5,0.25\n");
    }

    #[test]
    fn test_overwrites_previous_run() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("log.csv");
        fs::write(&path, "stale content\nmore stale content\n").unwrap();

        let mut logger = CsvLogger::new(spec(path.clone(), false, ','));
        session(&mut logger, &[&[("loss", 1.0)]]);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "epoch,loss\n0,1\n");
    }

    #[test]
    fn test_append_skips_header() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("log.csv");

        let mut logger = CsvLogger::new(spec(path.clone(), true, ','));
        session(&mut logger, &[&[("loss", 1.0)]]);
        session(&mut logger, &[&[("loss", 0.5)]]);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "epoch,loss\n0,1\n0,0.5\n");
    }

    #[test]
    fn test_custom_separator_and_missing_values() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("log.tsv");
        let mut logger = CsvLogger::new(spec(path.clone(), false, '\t'));

        session(&mut logger, &[&[("acc", 0.5), ("loss", 2.0)], &[("loss", 1.5)]]);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "epoch\tacc\tloss\n0\t0.5\t2\n1\tNA\t1.5\n");
    }

    #[test]
    fn test_invalid_separator() {
        let temp_dir = tempdir().unwrap();
        let mut logger = CsvLogger::new(spec(temp_dir.path().join("log.csv"), false, '→'));
        let mut trainer = MockTrainer::new(0.1);

        let err = logger.on_train_begin(&mut trainer).unwrap_err();
        assert!(matches!(err, Error::InvalidSeparator('→')));
    }
}
