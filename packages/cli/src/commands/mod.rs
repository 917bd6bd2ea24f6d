pub mod catalog;
pub mod check;
pub mod stats;

pub use catalog::{catalog, CatalogArgs};
pub use check::{check, CheckArgs};
pub use stats::{stats, StatsArgs};

use anyhow::{Context, Result};
use folio_layout::LayoutCatalog;
use folio_model::AlbumTree;
use std::fs;
use std::path::Path;

pub(crate) fn load_tree(path: &Path) -> Result<AlbumTree> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("Invalid album tree in {}", path.display()))
}

pub(crate) fn load_catalog(path: &Path) -> Result<LayoutCatalog> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let catalog = LayoutCatalog::from_json(&source)
        .with_context(|| format!("Invalid layout catalog in {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded layout catalog");
    Ok(catalog)
}
