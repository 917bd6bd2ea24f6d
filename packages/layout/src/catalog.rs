//! # Layout Catalogs
//!
//! Flat layout lists are grouped once per session by the number of content
//! slots each layout supports. Groups are kept separately for spread albums,
//! layflat albums and covers, and are read-only afterwards.

use crate::error::{LayoutError, LayoutResult};
use folio_model::{AlbumMode, Layout, LayoutId, SubtreeKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Selects one catalog group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKey {
    Spread,
    Layflat,
    Cover,
}

impl CatalogKey {
    /// Group that applies to layout folders of the given subtree
    pub fn for_subtree(kind: SubtreeKind, mode: AlbumMode) -> Self {
        match kind {
            SubtreeKind::Book => mode.into(),
            SubtreeKind::Cover => CatalogKey::Cover,
        }
    }
}

impl From<AlbumMode> for CatalogKey {
    fn from(mode: AlbumMode) -> Self {
        match mode {
            AlbumMode::Spread => CatalogKey::Spread,
            AlbumMode::Layflat => CatalogKey::Layflat,
        }
    }
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogKey::Spread => f.write_str("spread"),
            CatalogKey::Layflat => f.write_str("layflat"),
            CatalogKey::Cover => f.write_str("cover"),
        }
    }
}

/// Layouts of one group, bucketed by slot count
#[derive(Debug, Clone, Default)]
pub struct LayoutGroup {
    /// Slot count -> layout ids, in catalog order
    by_count: BTreeMap<usize, Vec<LayoutId>>,

    by_id: HashMap<LayoutId, Layout>,

    /// Highest slot count any layout supports
    max_count: usize,
}

impl LayoutGroup {
    pub fn build(key: CatalogKey, layouts: Vec<Layout>) -> LayoutResult<Self> {
        let mut group = LayoutGroup::default();

        for layout in layouts {
            let id = layout.id;
            let count = layout.slot_count();

            if group.by_id.contains_key(&id) {
                return Err(LayoutError::DuplicateLayout { id, key });
            }

            group.by_count.entry(count).or_default().push(id);
            group.max_count = group.max_count.max(count);
            group.by_id.insert(id, layout);
        }

        Ok(group)
    }

    /// Ids supporting exactly `count` slots (empty if none)
    pub fn bucket(&self, count: usize) -> &[LayoutId] {
        self.by_count
            .get(&count)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    pub fn get(&self, id: LayoutId) -> Option<&Layout> {
        self.by_id.get(&id)
    }

    pub fn contains(&self, id: LayoutId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// True if `id` is in this group and supports exactly `count` slots
    pub fn supports(&self, id: LayoutId, count: usize) -> bool {
        self.get(id)
            .map(|layout| layout.slot_count() == count)
            .unwrap_or(false)
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// `(slot count, bucket size)` pairs in ascending count order
    pub fn bucket_sizes(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.by_count.iter().map(|(count, ids)| (*count, ids.len()))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Flat layout lists as delivered by the catalog source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSource {
    #[serde(default)]
    pub spread: Vec<Layout>,

    #[serde(default)]
    pub layflat: Vec<Layout>,

    #[serde(default)]
    pub cover: Vec<Layout>,
}

/// All layout groups for one session
#[derive(Debug, Clone, Default)]
pub struct LayoutCatalog {
    spread: LayoutGroup,
    layflat: LayoutGroup,
    cover: LayoutGroup,
}

impl LayoutCatalog {
    pub fn build(
        spread: Vec<Layout>,
        layflat: Vec<Layout>,
        cover: Vec<Layout>,
    ) -> LayoutResult<Self> {
        Ok(Self {
            spread: LayoutGroup::build(CatalogKey::Spread, spread)?,
            layflat: LayoutGroup::build(CatalogKey::Layflat, layflat)?,
            cover: LayoutGroup::build(CatalogKey::Cover, cover)?,
        })
    }

    pub fn from_source(source: CatalogSource) -> LayoutResult<Self> {
        Self::build(source.spread, source.layflat, source.cover)
    }

    pub fn from_json(json: &str) -> LayoutResult<Self> {
        let source: CatalogSource = serde_json::from_str(json)?;
        Self::from_source(source)
    }

    pub fn group(&self, key: CatalogKey) -> &LayoutGroup {
        match key {
            CatalogKey::Spread => &self.spread,
            CatalogKey::Layflat => &self.layflat,
            CatalogKey::Cover => &self.cover,
        }
    }

    /// Look a layout up in the given group
    pub fn layout(&self, key: CatalogKey, id: LayoutId) -> Option<&Layout> {
        self.group(key).get(id)
    }
}
