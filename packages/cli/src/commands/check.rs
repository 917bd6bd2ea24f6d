use super::{load_catalog, load_tree};
use crate::config::Config;
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use folio_layout::LayoutResolver;
use folio_model::check_structure;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Album tree JSON file
    pub tree: PathBuf,

    /// Layout catalog JSON file (defaults to the config's `catalog`)
    #[arg(short, long)]
    pub catalog: Option<PathBuf>,

    /// Write layout corrections back to the tree file
    #[arg(long)]
    pub fix: bool,

    /// Seed for layout picks
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn check(args: CheckArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let mut tree = load_tree(&args.tree)?;

    println!("🔍 {} {}", "Checking".green().bold(), args.tree.display());
    println!("   Version: {}", tree.marker());
    println!();

    let issues = check_structure(&tree);
    for issue in &issues {
        println!("  {} {}", "error".red().bold(), issue);
    }

    let Some(catalog_path) = config.catalog_path(cwd, args.catalog.as_deref()) else {
        println!(
            "  {} no layout catalog given, layouts were not checked",
            "warning".yellow().bold()
        );
        return summarize(issues.len(), 0, false);
    };

    let catalog = Arc::new(load_catalog(&catalog_path)?);
    let mut resolver = match config.seed(args.seed) {
        Some(seed) => LayoutResolver::with_seed(catalog, seed),
        None => LayoutResolver::new(catalog),
    };

    let corrections = resolver.reconcile(&mut tree)?;
    for correction in &corrections {
        let from = correction
            .from
            .map(|id| id.to_string())
            .unwrap_or_else(|| "none".to_string());
        println!(
            "  {} {}: layout {} does not fit {} item(s), use {}",
            "layout".yellow().bold(),
            correction.folder,
            from,
            correction.content_count,
            correction.to.to_string().bright_white()
        );
    }

    let fixed = args.fix && !corrections.is_empty();
    if fixed {
        fs::write(&args.tree, serde_json::to_string_pretty(&tree)?)?;
        println!();
        println!("  {} Wrote {}", "✓".green(), args.tree.display());
    }

    summarize(issues.len(), corrections.len(), fixed)
}

fn summarize(issues: usize, corrections: usize, fixed: bool) -> Result<()> {
    println!();
    if issues == 0 && corrections == 0 {
        println!("   {} No issues found!", "✓".green());
        return Ok(());
    }

    if corrections > 0 {
        let state = if fixed { "fixed" } else { "pending" };
        println!("   {} {} ({})", "Layout corrections:".yellow(), corrections, state);
    }
    if issues > 0 {
        println!("   {} {}", "Structure issues:".red(), issues);
    }

    if issues > 0 || !fixed {
        bail!("{} problem(s) found", issues + if fixed { 0 } else { corrections });
    }
    Ok(())
}
