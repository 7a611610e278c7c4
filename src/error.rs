use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error("no observations to train on")]
    EmptyDataset,

    #[error("{entity} id {id} is outside the universe of {limit}")]
    OutOfBounds {
        entity: &'static str,
        id: u32,
        limit: usize,
    },

    #[error("no model has been trained or loaded")]
    NotReady,

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed model artifact: {0}")]
    Format(String),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl ModelError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;
