use crate::catalog::CatalogKey;
use folio_model::LayoutId;
use thiserror::Error;

pub type LayoutResult<T> = Result<T, LayoutError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// No layout supports the requested slot count. This is a catalog
    /// configuration problem, never something a user edit can fix.
    #[error("No {key} layout supports {count} slot(s)")]
    EmptyBucket { count: usize, key: CatalogKey },

    #[error("Layout {0} is not in the catalog")]
    UnknownLayout(LayoutId),

    #[error("Duplicate layout id {id} in the {key} catalog")]
    DuplicateLayout { id: LayoutId, key: CatalogKey },

    #[error("Invalid catalog source: {0}")]
    InvalidSource(String),
}

impl From<serde_json::Error> for LayoutError {
    fn from(e: serde_json::Error) -> Self {
        LayoutError::InvalidSource(e.to_string())
    }
}
