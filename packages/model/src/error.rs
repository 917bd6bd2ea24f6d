//! Error types for the tree model

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tree serialized to an unexpected shape: {0}")]
    UnexpectedShape(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
