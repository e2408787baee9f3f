#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::float_cmp)]

//! Tessera ECS - sparse-set Entity Component System
//!
//! Built for step-based simulation where systems only read during a step and
//! every structural change is deferred until the step ends.
//!
//! # Key Concepts
//!
//! - **Entity**: An opaque id, never reused within a world
//! - **Component**: Data attached to entities (e.g., Position, Velocity)
//! - **Resource**: Global data that exists once per world
//! - **Pool**: Per-type slot arena, so destroyed components leave slots to reuse
//! - **SparseSet**: O(1) membership per component type, dense iteration
//!
//! # Storage Layout
//!
//! Every component type owns a [`Pool`] of values and a [`SparseSet`] of the
//! entities carrying it. Each entity keeps a short list of
//! `(ComponentId, SlotHandle)` records pointing into those pools.
//!
//! ```
//! use tessera_ecs::{Entity, EntityStore};
//!
//! #[derive(Debug, PartialEq)]
//! struct Position { x: f32, y: f32 }
//! struct Velocity;
//!
//! let mut store = EntityStore::new();
//! store.attach(Entity::from_raw(0), Position { x: 1.0, y: 2.0 });
//! store.attach(Entity::from_raw(1), Position { x: 3.0, y: 4.0 });
//! store.attach(Entity::from_raw(1), Velocity);
//!
//! assert_eq!(store.query::<(Position, Velocity)>(), vec![Entity::from_raw(1)]);
//! ```
//!
//! # Deferred Mutation
//!
//! Systems record changes through [`Commands`]; the resulting
//! [`CommandBuffer`] is applied between steps. See the [`command`] module for
//! the apply order.

pub mod command;
mod component;
mod entity;
mod error;
mod pool;
mod query;
mod resource;
mod sparse_set;
mod storage;
mod store;

pub use command::{Bundle, CommandBuffer, Commands, PendingComponent, PendingComponents};
pub use component::{Component, ComponentId, ComponentInfo, ComponentRegistry};
pub use entity::{Entity, EntityAllocator, EntityId};
pub use error::{EcsError, EcsResult};
pub use pool::{Pool, SlotHandle};
pub use query::{Query, QueryBuilder, QueryIds, Queryer};
pub use resource::{Resource, ResourceId, ResourceRegistry, Resources};
pub use sparse_set::{DEFAULT_PAGE_SIZE, SparseIndex, SparseSet};
pub use storage::{ComponentStorage, ErasedStorage};
pub use store::{ComponentRecord, EntityStore};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Bundle, Commands, Component, EcsError, EcsResult, Entity, EntityStore, Queryer, Resource,
        Resources,
    };
}
