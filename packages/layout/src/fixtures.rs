//! Catalog built from the model's sample layouts

use crate::catalog::LayoutCatalog;
use folio_model::fixtures;

pub fn sample_catalog() -> LayoutCatalog {
    LayoutCatalog::build(
        fixtures::spread_layouts(),
        fixtures::layflat_layouts(),
        fixtures::cover_layouts(),
    )
    .unwrap_or_default()
}
