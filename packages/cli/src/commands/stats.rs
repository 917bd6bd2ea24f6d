use super::{load_catalog, load_tree};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_layout::{CatalogKey, LayoutCatalog, LayoutFamily};
use folio_model::{AlbumTree, Fingerprint, SubtreeKind, TreeStats};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Album tree JSON file
    pub tree: PathBuf,

    /// Layout catalog JSON file, for the family breakdown
    #[arg(short, long)]
    pub catalog: Option<PathBuf>,
}

pub fn stats(args: StatsArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let tree = load_tree(&args.tree)?;
    let stats = TreeStats::collect(&tree);

    println!("📖 {}", args.tree.display().to_string().bright_white().bold());
    if let Some(title) = &tree.attributes.title {
        println!("   Title:       {}", title);
    }
    println!("   Version:     {}", tree.marker());
    println!("   Fingerprint: {}", Fingerprint::of(&tree)?);
    println!("   Mode:        {:?}", tree.mode());
    println!();
    println!("   Spreads:      {}", stats.spreads);
    println!("   Pages:        {}", stats.pages);
    println!("   Photos:       {}", stats.images);
    println!("   Texts:        {}", stats.texts);
    println!("   Empty slots:  {}", stats.placeholders);
    println!("   Cover photos: {}", stats.cover_images);

    if let Some(path) = config.catalog_path(cwd, args.catalog.as_deref()) {
        let catalog = load_catalog(&path)?;
        let (families, unknown) = family_histogram(&tree, &catalog);

        println!();
        println!("   {}", "Layout families".bold());
        for family in [
            LayoutFamily::Regular,
            LayoutFamily::Magazine,
            LayoutFamily::Panorama,
        ] {
            let count = families.get(&family).copied().unwrap_or(0);
            println!("   {:<12} {}", format!("{family:?}"), count);
        }
        if unknown > 0 {
            println!("   {:<12} {}", "Unknown".red(), unknown);
        }
    }

    Ok(())
}

/// Count layout families over all layout-bearing folders. Layouts missing
/// from the catalog are counted separately.
fn family_histogram(tree: &AlbumTree, catalog: &LayoutCatalog) -> (HashMap<LayoutFamily, usize>, usize) {
    let mut families = HashMap::new();
    let mut unknown = 0;

    for kind in [SubtreeKind::Book, SubtreeKind::Cover] {
        let key = CatalogKey::for_subtree(kind, tree.mode());
        for folder in tree.layout_folders(kind) {
            let Some(id) = folder.layout_id else {
                continue;
            };
            match catalog.layout(key, id) {
                Some(layout) => *families.entry(LayoutFamily::classify(layout)).or_insert(0) += 1,
                None => unknown += 1,
            }
        }
    }

    (families, unknown)
}
