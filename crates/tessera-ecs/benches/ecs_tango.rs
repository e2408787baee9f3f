//! ECS benchmarks using tango-bench for paired comparison testing.

use std::hint::black_box;

use tango_bench::{IntoBenchmarks, benchmark_fn, tango_benchmarks, tango_main};
use tessera_ecs::{Entity, EntityStore, SparseSet};

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

#[derive(Clone, Copy)]
struct Health(u32);

fn store_with(count: u32) -> EntityStore {
    let mut store = EntityStore::new();
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
        store.attach(entity, Health(100));
    }
    store
}

fn sparse_set_benchmarks() -> impl IntoBenchmarks {
    [
        benchmark_fn("sparse_set_add/1000", |b| {
            b.iter(|| {
                let mut set: SparseSet<u32> = SparseSet::new();
                for id in 0..1000 {
                    black_box(set.add(id));
                }
            })
        }),
        benchmark_fn("sparse_set_add_spread/1000", |b| {
            b.iter(|| {
                let mut set: SparseSet<u32> = SparseSet::new();
                for id in 0..1000 {
                    black_box(set.add(id * 97));
                }
            })
        }),
        benchmark_fn("sparse_set_remove/1000", |b| {
            b.iter(|| {
                let mut set: SparseSet<u32> = SparseSet::new();
                for id in 0..1000 {
                    set.add(id);
                }
                for id in 0..1000 {
                    black_box(set.remove(id));
                }
            })
        }),
    ]
}

fn component_benchmarks() -> impl IntoBenchmarks {
    [
        benchmark_fn("attach/1000", |b| {
            b.iter(|| {
                let mut store = EntityStore::new();
                for i in 0..1000 {
                    store.attach(
                        Entity::from_raw(i),
                        Velocity {
                            x: 1.0,
                            y: 0.0,
                            z: 0.0,
                        },
                    );
                }
                black_box(store.entity_count())
            })
        }),
        benchmark_fn("get_component/1000", |b| {
            let store = store_with(1000);
            b.iter(move || {
                let mut total = 0u32;
                for i in 0..1000 {
                    if let Ok(health) = store.get::<Health>(Entity::from_raw(i)) {
                        total += health.0;
                    }
                }
                black_box(total)
            })
        }),
        benchmark_fn("get_mut_component/1000", |b| {
            let mut store = store_with(1000);
            b.iter(move || {
                for i in 0..1000 {
                    if let Ok(position) = store.get_mut::<Position>(Entity::from_raw(i)) {
                        position.x += 1.0;
                        position.y += position.z;
                    }
                }
            })
        }),
        benchmark_fn("query_pair/1000", |b| {
            let store = store_with(1000);
            b.iter(move || black_box(store.query::<(Health, Position)>().len()))
        }),
    ]
}

fn destroy_benchmarks() -> impl IntoBenchmarks {
    [benchmark_fn("detach_all/1000", |b| {
        b.iter(|| {
            let mut store = store_with(1000);
            for i in 0..1000 {
                store.detach_all(Entity::from_raw(i));
            }
            black_box(store.entity_count())
        })
    })]
}

tango_benchmarks!(
    sparse_set_benchmarks(),
    component_benchmarks(),
    destroy_benchmarks()
);
tango_main!();
