use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Missing {kind} at: {}", path.display())]
    MissingResource { kind: &'static str, path: PathBuf },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Could not decode image: {0}")]
    InvalidImage(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
