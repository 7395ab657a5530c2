use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("history path is not a directory: {0}")]
    NotADirectory(std::path::PathBuf),

    #[error("invalid user key {0:?}")]
    InvalidUser(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
