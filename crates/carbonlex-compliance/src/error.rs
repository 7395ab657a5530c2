use thiserror::Error;

/// Registry load failures. These are fatal at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate regulation id {0:?}")]
    DuplicateId(String),
}
