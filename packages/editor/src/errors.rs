//! Error types for the editor

use folio_layout::LayoutError;
use folio_model::ModelError;
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Model error: {0}")]
    Model(String),
}

impl From<ModelError> for EditorError {
    fn from(e: ModelError) -> Self {
        EditorError::Model(e.to_string())
    }
}
