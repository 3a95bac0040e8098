use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::path::Path;
use uniqprops_core::{DuplicateKeyTracker, UniquePropertiesCheck};

fn bench_assign(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker_assign");
    group.throughput(Throughput::Elements(10_000));

    group.bench_function("10k_unique", |b| {
        b.iter(|| {
            let tracker = DuplicateKeyTracker::with_capacity(10_000);
            for i in 0..10_000 {
                black_box(tracker.assign(format!("key.{}", i), "value"));
            }
        });
    });

    group.bench_function("10k_50pct_dup", |b| {
        b.iter(|| {
            let tracker = DuplicateKeyTracker::with_capacity(10_000);
            for i in 0..10_000 {
                black_box(tracker.assign(format!("key.{}", i % 5000), "value"));
            }
        });
    });

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker_snapshot");

    let tracker = DuplicateKeyTracker::new();
    for i in 0..20_000 {
        tracker.assign(format!("key.{}", i % 10_000), "value");
    }

    group.throughput(Throughput::Elements(10_000));
    group.bench_function("snapshot_10k_duplicates", |b| {
        b.iter(|| black_box(tracker.duplicates()));
    });

    group.finish();
}

fn bench_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("check");

    let mut text = String::new();
    let mut entries = Vec::new();
    let mut pairs = Vec::new();
    for i in 0..2_000 {
        let key = format!("app.message.{}", i % 1_500);
        text.push_str(&format!("{}=text {}\n", key, i));
        entries.push((key.clone(), format!("text {}", i), i + 1));
        pairs.push((key, format!("text {}", i)));
    }

    group.throughput(Throughput::Elements(2_000));
    group.bench_function("2k_lines_500_dups", |b| {
        let check = UniquePropertiesCheck::default();
        b.iter(|| {
            black_box(
                check
                    .process(Path::new("bench.properties"), entries.clone())
                    .unwrap(),
            )
        });
    });

    group.bench_function("2k_lines_500_dups_unlocated", |b| {
        let check = UniquePropertiesCheck::default();
        b.iter(|| {
            black_box(
                check
                    .process_unlocated(Path::new("bench.properties"), &text, pairs.clone())
                    .unwrap(),
            )
        });
    });

    group.finish();
}

criterion_group!(benches, bench_assign, bench_snapshot, bench_check);
criterion_main!(benches);
