//! ECS benchmarks using criterion for historical comparison.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tessera_ecs::{Entity, EntityStore, Pool, SparseSet};

#[derive(Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Clone, Copy)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

fn populated(count: u32) -> EntityStore {
    let mut store = EntityStore::with_capacity(count as usize, 2);
    for i in 0..count {
        let entity = Entity::from_raw(i);
        store.attach(
            entity,
            Position {
                x: i as f32,
                y: 0.0,
                z: 0.0,
            },
        );
        if i % 2 == 0 {
            store.attach(
                entity,
                Velocity {
                    x: 1.0,
                    y: 0.0,
                    z: 0.0,
                },
            );
        }
    }
    store
}

fn sparse_set_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_set");

    for count in [100u32, 1000, 10000] {
        group.throughput(Throughput::Elements(u64::from(count)));

        group.bench_with_input(BenchmarkId::new("add", count), &count, |b, &count| {
            b.iter(|| {
                let mut set: SparseSet<u32> = SparseSet::new();
                for id in 0..count {
                    black_box(set.add(id));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("contains", count), &count, |b, &count| {
            let mut set: SparseSet<u32> = SparseSet::new();
            for id in (0..count).step_by(3) {
                set.add(id);
            }

            b.iter(|| {
                for id in 0..count {
                    black_box(set.contains(id));
                }
            });
        });
    }

    group.finish();
}

fn pool_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool");

    for count in [100u32, 1000, 10000] {
        group.throughput(Throughput::Elements(u64::from(count)));

        group.bench_with_input(BenchmarkId::new("churn", count), &count, |b, &count| {
            let mut pool: Pool<Position> = Pool::new();

            b.iter(|| {
                let handles: Vec<_> = (0..count)
                    .map(|i| {
                        pool.acquire_with(Position {
                            x: i as f32,
                            y: 0.0,
                            z: 0.0,
                        })
                    })
                    .collect();
                for handle in handles {
                    black_box(pool.release(handle)).ok();
                }
            });
        });
    }

    group.finish();
}

fn component_access_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("component_access");

    for count in [100u32, 1000, 10000] {
        group.throughput(Throughput::Elements(u64::from(count)));

        group.bench_with_input(BenchmarkId::new("get", count), &count, |b, &count| {
            let store = populated(count);

            b.iter(|| {
                for i in 0..count {
                    black_box(store.get::<Position>(Entity::from_raw(i)).ok());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("query_pair", count), &count, |b, &count| {
            let store = populated(count);

            b.iter(|| {
                let mut sum = 0.0;
                for entity in store.query::<(Velocity, Position)>() {
                    if let Ok(position) = store.get::<Position>(entity) {
                        sum += position.x + position.y + position.z;
                    }
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

fn destroy_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("destroy");

    for count in [100u32, 1000, 10000] {
        group.throughput(Throughput::Elements(u64::from(count)));

        group.bench_with_input(BenchmarkId::new("detach_all", count), &count, |b, &count| {
            b.iter_batched(
                || populated(count),
                |mut store| {
                    for i in 0..count {
                        store.detach_all(Entity::from_raw(i));
                    }
                    store
                },
                criterion::BatchSize::SmallInput,
            );
        });

        group.bench_with_input(
            BenchmarkId::new("respawn_reuses_slots", count),
            &count,
            |b, &count| {
                b.iter_batched(
                    || {
                        let mut store = populated(count);
                        for i in 0..count {
                            store.detach_all(Entity::from_raw(i));
                        }
                        store
                    },
                    |mut store| {
                        for i in count..count * 2 {
                            store.attach(
                                Entity::from_raw(i),
                                Velocity {
                                    x: 0.0,
                                    y: 1.0,
                                    z: 0.0,
                                },
                            );
                        }
                        store
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    sparse_set_benchmarks,
    pool_benchmarks,
    component_access_benchmarks,
    destroy_benchmarks,
);

criterion_main!(benches);
