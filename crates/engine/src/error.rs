//! Error types for the surge engine

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by training, persistence and prediction
#[derive(Debug, Error)]
pub enum SurgeError {
    #[error("no trained model is available; train or load one before predicting")]
    UntrainedModel,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("training failed: {0}")]
    Training(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model lock poisoned")]
    LockPoisoned,
}

/// Failures reading or writing the persisted (regressor, scaler) pair
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode or decode {artifact}: {source}")]
    Codec {
        artifact: &'static str,
        #[source]
        source: bincode::Error,
    },

    #[error("invalid model manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("checksum mismatch for {artifact}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        artifact: &'static str,
        expected: String,
        actual: String,
    },

    #[error("artifacts belong to different training runs: regressor {regressor}, scaler {scaler}")]
    VersionMismatch { regressor: String, scaler: String },

    #[error("persisted feature schema does not match: {0:?}")]
    SchemaMismatch(Vec<String>),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SurgeError>;
