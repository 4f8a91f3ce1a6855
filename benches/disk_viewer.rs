//! # Disk Viewer Benchmarks
//!
//! Access patterns measured against a temporary backing file:
//!
//! | Benchmark              | Cache  | Working set | Pattern                    |
//! |------------------------|--------|-------------|----------------------------|
//! | read/hit_100           | 100    | 100         | every read hits            |
//! | read/miss_100          | 10     | 10,000      | every read misses          |
//! | read/hit_80            | 1,000  | 5,000       | 80% hot set, 20% cold      |
//! | read/sequential        | 10,000 | 10,000      | in-order, fully cached     |
//! | read/random            | 10,000 | 10,000      | uniform random             |
//! | read/eviction_pressure | 100    | 10,000      | uniform random             |
//! | read/tiny_cache        | 2      | 100         | uniform random             |
//! | mixed/read_heavy       | 1,000  | 10,000+     | 80% read, 20% create       |
//! | mixed/write_heavy      | 1,000  | grows       | 20% read, 80% create       |
//! | mixed/concurrent       | 1,000  | 10,000+     | 4 threads, 70% read        |
//!
//! Throughput is reported in bytes (one page per operation).

use std::sync::Arc;
use std::thread;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use diskview::{Config, DiskViewer, PageId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

fn setup(capacity: usize, pages: u64) -> (DiskViewer, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.data");
    let viewer = DiskViewer::open(&path, Config::default().with_max_capacity(capacity)).unwrap();
    for _ in 0..pages {
        viewer.create().unwrap();
    }
    (viewer, dir)
}

fn warm(viewer: &DiskViewer, ids: impl Iterator<Item = u64>) {
    for id in ids {
        let _ = viewer.read(PageId::new(id));
    }
}

fn bench_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Bytes(diskview::native_page_size() as u64));

    {
        let (viewer, _dir) = setup(100, 100);
        warm(&viewer, 0..100);
        let mut i = 0u64;
        group.bench_function("hit_100", |b| {
            b.iter(|| {
                i = (i + 1) % 100;
                viewer.read(PageId::new(i)).unwrap()
            })
        });
    }

    {
        let (viewer, _dir) = setup(10, 10_000);
        let mut i = 0u64;
        group.bench_function("miss_100", |b| {
            b.iter(|| {
                i = (i + 1) % 10_000;
                viewer.read(PageId::new(i)).unwrap()
            })
        });
    }

    {
        let cache_size = 1_000u64;
        let (viewer, _dir) = setup(cache_size as usize, 5_000);
        warm(&viewer, 0..cache_size);
        let mut rng = StdRng::seed_from_u64(42);
        group.bench_function("hit_80", |b| {
            b.iter(|| {
                let id = if rng.gen::<f64>() < 0.8 {
                    rng.gen_range(0..cache_size)
                } else {
                    rng.gen_range(cache_size..5_000)
                };
                viewer.read(PageId::new(id)).unwrap()
            })
        });
    }

    {
        let (viewer, _dir) = setup(10_000, 10_000);
        warm(&viewer, 0..10_000);
        let mut i = 0u64;
        group.bench_function("sequential", |b| {
            b.iter(|| {
                i = (i + 1) % 9_999;
                viewer.read(PageId::new(i)).unwrap()
            })
        });
    }

    for (name, capacity, pages) in [
        ("random", 10_000usize, 10_000u64),
        ("eviction_pressure", 100, 10_000),
        ("tiny_cache", 2, 100),
    ] {
        let (viewer, _dir) = setup(capacity, pages);
        let mut rng = StdRng::seed_from_u64(42);
        group.bench_with_input(BenchmarkId::new(name, capacity), &pages, |b, &pages| {
            b.iter(|| viewer.read(PageId::new(rng.gen_range(0..pages))).unwrap())
        });
    }

    group.finish();
}

fn bench_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Bytes(diskview::native_page_size() as u64));
    group.sample_size(20);

    for (name, read_ratio) in [("read_heavy", 0.8), ("write_heavy", 0.2)] {
        let (viewer, _dir) = setup(1_000, 10_000);
        let mut rng = StdRng::seed_from_u64(42);
        group.bench_function(name, |b| {
            b.iter(|| {
                if rng.gen::<f64>() < read_ratio {
                    viewer.read(PageId::new(rng.gen_range(0..10_000))).map(|_| ())
                } else {
                    viewer.create().map(|_| ())
                }
            })
        });
    }

    {
        let (viewer, _dir) = setup(1_000, 10_000);
        let viewer = Arc::new(viewer);
        group.bench_function("concurrent", |b| {
            b.iter(|| {
                let handles: Vec<_> = (0..4u64)
                    .map(|t| {
                        let viewer = Arc::clone(&viewer);
                        thread::spawn(move || {
                            let mut rng = StdRng::seed_from_u64(t);
                            for _ in 0..64 {
                                if rng.gen::<f64>() < 0.7 {
                                    let _ = viewer.read(PageId::new(rng.gen_range(0..10_000)));
                                } else {
                                    let _ = viewer.create();
                                }
                            }
                        })
                    })
                    .collect();
                for h in handles {
                    h.join().unwrap();
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reads, bench_mixed);
criterion_main!(benches);
