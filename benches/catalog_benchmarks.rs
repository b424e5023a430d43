use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lending_catalog::{Book, Catalog, User};

/// Catalog with `size` books by a rotating set of authors
fn seeded_catalog(size: usize) -> Catalog {
    let authors = ["Leo Tolstoy", "Jane Austen", "Frank Herbert", "Ursula K. Le Guin"];
    let mut catalog = Catalog::default();
    for (i, author) in (0..size).zip(authors.iter().cycle()) {
        let title = format!("Volume {}", size.saturating_sub(i));
        catalog.add_book(Book::new(&title, author, &i.to_string()));
    }
    catalog.add_user(User::new("u1", "Alice"));
    catalog
}

/// Author and ISBN lookups over growing catalogs
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for size in [100, 1_000, 10_000] {
        let catalog = seeded_catalog(size);
        group.bench_with_input(BenchmarkId::new("by_author", size), &catalog, |b, catalog| {
            b.iter(|| catalog.search_by_author(black_box("tolstoy")));
        });
        group.bench_with_input(BenchmarkId::new("by_isbn", size), &catalog, |b, catalog| {
            b.iter(|| catalog.find_book_by_isbn(black_box("42")));
        });
    }

    group.finish();
}

/// Sorting a full handle list by title
fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");

    for size in [100, 1_000] {
        let catalog = seeded_catalog(size);
        group.bench_with_input(BenchmarkId::new("handles_by_title", size), &catalog, |b, catalog| {
            b.iter(|| {
                let mut handles = catalog.all_books();
                catalog.sort_by_title(&mut handles, true);
                handles
            });
        });
    }

    group.finish();
}

/// Lending and taking back the same book
fn bench_checkout_cycle(c: &mut Criterion) {
    let mut catalog = seeded_catalog(1_000);
    c.bench_function("checkout_return_cycle", |b| {
        b.iter(|| {
            catalog.check_out_book(black_box("500"), "u1");
            catalog.return_book(black_box("500"))
        });
    });
}

criterion_group!(benches, bench_search, bench_sort, bench_checkout_cycle);
criterion_main!(benches);
