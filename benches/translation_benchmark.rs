use std::hint::black_box;

use catalog_db::prelude::*;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

fn insert_with_values(rows: usize) -> String {
    let tuples: Vec<&str> = (0..rows).map(|_| "(?, ?, ?)").collect();
    format!(
        "INSERT INTO users (name, email, password) VALUES {}",
        tuples.join(", ")
    )
}

fn bench_translation(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate_statement");

    let select = "SELECT b.id, b.title FROM books b /* catalog? */ \
                  JOIN author_books ab ON ab.book_id = b.id \
                  WHERE ab.author_id = ? AND b.title LIKE '%?%'";
    group.bench_function("select", |b| {
        b.iter(|| translate_statement(black_box(select), StatementKind::Select, Some("id"), true));
    });

    let ignore = "INSERT OR IGNORE INTO author_books (author_id, book_id, position) VALUES (?, ?, ?)";
    group.bench_function("insert_or_ignore", |b| {
        b.iter(|| {
            let kind = StatementKind::classify(black_box(ignore));
            translate_statement(ignore, kind, Some("id"), true)
        });
    });

    for rows in [1_usize, 10, 100] {
        let sql = insert_with_values(rows);
        group.bench_with_input(BenchmarkId::new("multi_row_insert", rows), &sql, |b, sql| {
            b.iter(|| translate_statement(black_box(sql), StatementKind::Insert, Some("id"), true));
        });
    }

    let untouched = "SELECT * FROM books WHERE id = $1";
    group.bench_function("no_placeholders", |b| {
        b.iter(|| translate_placeholders(black_box(untouched), true));
    });

    group.finish();
}

criterion_group!(benches, bench_translation);
criterion_main!(benches);
