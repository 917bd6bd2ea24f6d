use super::load_catalog;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_layout::{CatalogKey, LayoutGroup};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Layout catalog JSON file
    pub catalog: PathBuf,
}

pub fn catalog(args: CatalogArgs) -> Result<()> {
    let catalog = load_catalog(&args.catalog)?;

    println!("🗂  {}", args.catalog.display().to_string().bright_white().bold());
    for key in [CatalogKey::Spread, CatalogKey::Layflat, CatalogKey::Cover] {
        let group = catalog.group(key);
        println!();
        println!(
            "   {} {} layouts, up to {} item(s)",
            format!("{:<8}", key.to_string()).bold(),
            group.len(),
            group.max_count()
        );
        println!("   {}", bucket_line(group));
    }

    Ok(())
}

fn bucket_line(group: &LayoutGroup) -> String {
    if group.is_empty() {
        return "(empty)".dimmed().to_string();
    }

    group
        .bucket_sizes()
        .map(|(count, size)| format!("{count}:{size}"))
        .collect::<Vec<_>>()
        .join("  ")
}
