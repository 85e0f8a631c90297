use std::path::PathBuf;
use thiserror::Error;

/// 库内统一错误类型
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Separator {0:?} is not a single-byte character")]
    InvalidSeparator(char),

    #[error("Failed to serialize event record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Trainer error: {0}")]
    Trainer(#[from] anyhow::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
