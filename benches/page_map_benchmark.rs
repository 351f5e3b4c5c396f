//! Benchmarks for page mapping and article removal.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic issues with a fixed number of paragraphs per page.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use journal_updater::journal::{clear_articles, find_toc_titles};
use journal_updater::{map_pages_to_paragraphs, Document};

const PARAGRAPHS_PER_PAGE: usize = 20;

/// Creates an issue with a table of contents and `page_count` article pages.
fn create_test_issue(page_count: usize) -> Document {
    let mut doc = Document::new();
    doc.add_paragraph("Volume 1, Issue 1");
    doc.add_paragraph("Table of Contents");
    doc.add_paragraph("ARTICLES");
    for page in 0..page_count {
        doc.add_paragraph(&format!("Article {}..........{}", page + 1, page + 2));
    }
    doc.add_page_break();

    for page in 0..page_count {
        doc.add_paragraph(&format!("Article {}", page + 1));
        let mut last = 0;
        for line in 0..PARAGRAPHS_PER_PAGE {
            last = doc.add_paragraph(&format!("Benchmark body text line {} of page {}.", line, page));
        }
        doc.add_break_to(last);
    }
    doc
}

/// Benchmark page bucketing at various sizes.
fn bench_page_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_mapping");

    for page_count in [10, 100, 500].iter() {
        let doc = create_test_issue(*page_count);

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| map_pages_to_paragraphs(black_box(&doc)).page_count());
        });
    }

    group.finish();
}

/// Benchmark table-of-contents scanning.
fn bench_toc_titles(c: &mut Criterion) {
    let doc = create_test_issue(100);

    c.bench_function("toc_titles_100_pages", |b| {
        b.iter(|| find_toc_titles(black_box(&doc)).len());
    });
}

/// Benchmark full article removal, rebuilding the issue for each run.
fn bench_clear_articles(c: &mut Criterion) {
    let mut group = c.benchmark_group("clear_articles");

    for page_count in [10, 100].iter() {
        let doc = create_test_issue(*page_count);

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter_batched(
                || doc.clone(),
                |mut doc| clear_articles(&mut doc).removed,
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_page_mapping,
    bench_toc_titles,
    bench_clear_articles,
);
criterion_main!(benches);
