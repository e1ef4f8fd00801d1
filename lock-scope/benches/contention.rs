use criterion::{criterion_group, criterion_main, Criterion};
use lock_scope::{LockMode, LockScopeFactory};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

const THREADS: usize = 8;
const OPS_PER_THREAD: usize = 1000;
const TIMEOUT: Duration = Duration::from_secs(10);

// Scope overhead with nobody else around.
fn bench_uncontended(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncontended");

    let plain = RwLock::new(());
    group.bench_function("parking_lot_read", |b| {
        b.iter(|| drop(std::hint::black_box(plain.read())));
    });
    group.bench_function("parking_lot_write", |b| {
        b.iter(|| drop(std::hint::black_box(plain.write())));
    });

    let factory = LockScopeFactory::new(TIMEOUT).unwrap();
    group.bench_function("scope_read", |b| {
        b.iter(|| drop(std::hint::black_box(factory.create_scope(LockMode::Read).unwrap())));
    });
    group.bench_function("scope_write", |b| {
        b.iter(|| drop(std::hint::black_box(factory.create_scope(LockMode::Write).unwrap())));
    });
    group.bench_function("scope_read_from_code", |b| {
        b.iter(|| drop(std::hint::black_box(factory.create_scope(1).unwrap())));
    });

    group.finish();
}

// Mostly readers, one write in ten.
fn bench_read_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_heavy");
    group.sample_size(20);

    group.bench_function("parking_lot_rwlock", |b| {
        b.iter(|| {
            let lock = RwLock::new(0u64);
            thread::scope(|s| {
                for _ in 0..THREADS {
                    s.spawn(|| {
                        for j in 0..OPS_PER_THREAD {
                            if j % 10 == 0 {
                                *lock.write() += 1;
                            } else {
                                std::hint::black_box(*lock.read());
                            }
                        }
                    });
                }
            });
        });
    });

    group.bench_function("lock_scope", |b| {
        b.iter(|| {
            let factory = LockScopeFactory::new(TIMEOUT).unwrap();
            let value = AtomicU64::new(0);
            thread::scope(|s| {
                for _ in 0..THREADS {
                    s.spawn(|| {
                        for j in 0..OPS_PER_THREAD {
                            if j % 10 == 0 {
                                let _scope = factory.create_scope(LockMode::Write).unwrap();
                                value.fetch_add(1, Ordering::Relaxed);
                            } else {
                                let _scope = factory.create_scope(LockMode::Read).unwrap();
                                std::hint::black_box(value.load(Ordering::Relaxed));
                            }
                        }
                    });
                }
            });
        });
    });

    group.finish();
}

// Every thread writes.
fn bench_write_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_contention");
    group.sample_size(20);

    group.bench_function("parking_lot_rwlock", |b| {
        b.iter(|| {
            let lock = RwLock::new(0u64);
            thread::scope(|s| {
                for _ in 0..THREADS {
                    s.spawn(|| {
                        for _ in 0..OPS_PER_THREAD {
                            *lock.write() += 1;
                        }
                    });
                }
            });
        });
    });

    group.bench_function("lock_scope", |b| {
        b.iter(|| {
            let factory = LockScopeFactory::new(TIMEOUT).unwrap();
            let value = AtomicU64::new(0);
            thread::scope(|s| {
                for _ in 0..THREADS {
                    s.spawn(|| {
                        for _ in 0..OPS_PER_THREAD {
                            let _scope = factory.create_scope(LockMode::Write).unwrap();
                            value.fetch_add(1, Ordering::Relaxed);
                        }
                    });
                }
            });
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_uncontended,
    bench_read_heavy,
    bench_write_contention
);
criterion_main!(benches);
