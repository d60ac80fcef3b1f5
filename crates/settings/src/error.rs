use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings are not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no config directory available")]
    NoConfigDir,
    #[error("settings file {0:?} does not contain a json object")]
    NotAnObject(PathBuf),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
