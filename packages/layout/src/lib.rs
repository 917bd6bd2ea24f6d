//! # Folio Layout
//!
//! Layout catalogs and the resolver that keeps page content and page layout
//! consistent.
//!
//! ```rust,ignore
//! use folio_layout::{LayoutCatalog, LayoutResolver};
//!
//! let catalog = Arc::new(LayoutCatalog::from_json(&source)?);
//! let mut resolver = LayoutResolver::new(catalog);
//!
//! // Page now holds three photos
//! let layout = resolver.validate(page.layout_id, 3, tree.mode())?;
//! ```

mod catalog;
mod error;
mod family;
mod resolver;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use catalog::{CatalogKey, CatalogSource, LayoutCatalog, LayoutGroup};
pub use error::{LayoutError, LayoutResult};
pub use family::LayoutFamily;
pub use resolver::{Correction, LayoutResolver};
