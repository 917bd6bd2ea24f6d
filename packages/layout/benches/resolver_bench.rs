use criterion::{black_box, criterion_group, criterion_main, Criterion};
use folio_layout::{fixtures::sample_catalog, LayoutCatalog, LayoutResolver};
use folio_model::{fixtures, AlbumMode, Folder, LayoutId};
use std::sync::Arc;

fn large_tree(spreads: u64) -> folio_model::AlbumTree {
    let mut tree = fixtures::sample_tree();
    tree.book.folders.clear();

    for s in 1..=spreads {
        let pages = (0..2)
            .map(|p| {
                let page_id = s * 100 + p;
                let slots = (0..(page_id % 5))
                    .map(|i| Folder::new(page_id * 10 + i))
                    .collect();
                // Deliberately stale layout so every page gets corrected
                Folder::new(page_id)
                    .with_layout(LayoutId(999))
                    .with_children(slots)
            })
            .collect();
        tree.book.folders.push(Folder::new(s).with_children(pages));
    }

    tree
}

fn build_catalog(c: &mut Criterion) {
    let source = folio_layout::CatalogSource {
        spread: folio_model::fixtures::layouts(100, 20),
        layflat: folio_model::fixtures::layouts(200, 20),
        cover: folio_model::fixtures::cover_layouts(),
    };

    c.bench_function("build_catalog", |b| {
        b.iter(|| LayoutCatalog::from_source(black_box(source.clone())))
    });
}

fn validate_layout(c: &mut Criterion) {
    let mut resolver = LayoutResolver::with_seed(Arc::new(sample_catalog()), 42);

    c.bench_function("validate_valid_layout", |b| {
        b.iter(|| resolver.validate(black_box(Some(LayoutId(120))), 2, AlbumMode::Spread))
    });

    c.bench_function("validate_stale_layout", |b| {
        b.iter(|| resolver.validate(black_box(Some(LayoutId(120))), 3, AlbumMode::Spread))
    });
}

fn reconcile_tree(c: &mut Criterion) {
    let catalog = Arc::new(sample_catalog());
    let tree = large_tree(100);

    c.bench_function("reconcile_100_spreads", |b| {
        let mut resolver = LayoutResolver::with_seed(catalog.clone(), 42);
        b.iter(|| {
            let mut tree = tree.clone();
            resolver.reconcile(black_box(&mut tree))
        })
    });
}

criterion_group!(benches, build_catalog, validate_layout, reconcile_tree);
criterion_main!(benches);
