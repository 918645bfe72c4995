//! Cleaning engine benchmarks.
//!
//! Measures whole-pipeline throughput for the text-heavy kinds at a few dataset sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use retail_etl::cleaning::{clean, rules_for, DatasetKind};
use retail_etl::processing::weight_in_kilograms;
use retail_etl::types::{DataSet, Value};

const SIZES: &[usize] = &[1_000, 10_000, 100_000];

/// Raw weight cells as they appear upstream.
const WEIGHT_SAMPLES: &[&str] = &["1.6kg", "500g", "12 x 100g", "77g .", "16oz", "400ml", "heavy"];

fn users(n: usize) -> DataSet {
    let rows = (0..n)
        .map(|i| {
            let country = ["United Kingdom", "Germany", "United States", "Narnia"][i % 4];
            let code = ["GB", "DE", "US", "GGB"][i % 4];
            vec![
                Value::text(i.to_string()),
                Value::text(if i % 50 == 0 { "12345".to_string() } else { format!("First{i}") }),
                Value::text("Last"),
                Value::text("1990 December 24"),
                Value::text("Company Ltd"),
                Value::text(if i % 7 == 0 { format!("user{i}@@example.com") } else { format!("user{i}@example.com") }),
                Value::text("Flat 1\nSome Street\nTown"),
                Value::text(country),
                Value::text(code),
                Value::text("+44 1234 567890"),
                Value::text("2016-12-05"),
                Value::text(format!("uuid-{i}")),
            ]
        })
        .collect();
    DataSet::new(rules_for(DatasetKind::Users).raw_schema(), rows)
}

fn products(n: usize) -> DataSet {
    let rows = (0..n)
        .map(|i| {
            vec![
                Value::text(format!("Product {i}")),
                Value::text("£1,234.50"),
                Value::text(WEIGHT_SAMPLES[i % WEIGHT_SAMPLES.len()]),
                Value::text("food-and-drink"),
                Value::text("7425710935115"),
                Value::text("2005-12-02"),
                Value::text(format!("uuid-{i}")),
                Value::text(if i % 3 == 0 { "Removed" } else { "Still_available" }),
                Value::text("R7-3126933h"),
            ]
        })
        .collect();
    DataSet::new(rules_for(DatasetKind::ProductDetails).raw_schema(), rows)
}

fn bench_clean(c: &mut Criterion) {
    let mut group = c.benchmark_group("clean");
    for &n in SIZES {
        group.throughput(Throughput::Elements(n as u64));

        let raw = users(n);
        group.bench_with_input(BenchmarkId::new("users", n), &raw, |b, raw| {
            b.iter(|| clean(black_box(raw.clone()), DatasetKind::Users).unwrap())
        });

        let raw = products(n);
        group.bench_with_input(BenchmarkId::new("product_details", n), &raw, |b, raw| {
            b.iter(|| clean(black_box(raw.clone()), DatasetKind::ProductDetails).unwrap())
        });
    }
    group.finish();
}

fn bench_weight(c: &mut Criterion) {
    let cells: Vec<Value> = WEIGHT_SAMPLES.iter().map(|s| Value::text(*s)).collect();
    c.bench_function("weight_in_kilograms", |b| {
        b.iter(|| {
            for cell in &cells {
                black_box(weight_in_kilograms(black_box(cell)));
            }
        })
    });
}

criterion_group!(benches, bench_clean, bench_weight);
criterion_main!(benches);
