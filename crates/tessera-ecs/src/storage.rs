//! Per-type component storage.
//!
//! Each component type gets one [`ComponentStorage`]: a [`Pool`] holding the
//! values plus a [`SparseSet`] of the entities that carry the type. The store
//! keeps them behind the [`ErasedStorage`] trait so storages of different
//! types can live in one map.

use std::any::Any;

use crate::{
    component::{Component, ComponentInfo},
    entity::Entity,
    error::EcsResult,
    pool::{Pool, SlotHandle},
    sparse_set::SparseSet,
};

/// Type-erased view of a [`ComponentStorage`].
pub trait ErasedStorage: Any {
    /// Metadata of the stored component type.
    fn info(&self) -> &ComponentInfo;

    /// Check if the entity carries this component.
    fn contains(&self, entity: Entity) -> bool;

    /// Entities carrying this component, in dense order.
    fn entities(&self) -> &[Entity];

    /// Release `handle` and drop `entity` from the membership set.
    fn remove(&mut self, entity: Entity, handle: SlotHandle) -> EcsResult<()>;

    /// Number of slots the pool has ever constructed.
    fn pool_capacity(&self) -> usize;

    /// Upcast for downcasting to the concrete storage.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete storage.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Number of entities carrying this component.
    fn len(&self) -> usize {
        self.entities().len()
    }

    /// Check if no entity carries this component.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storage for all values of one component type.
pub struct ComponentStorage<T> {
    info: ComponentInfo,
    pool: Pool<T>,
    entities: SparseSet<Entity>,
}

impl<T: Component> ComponentStorage<T> {
    /// Create empty storage for the described component type.
    #[must_use]
    pub fn new(info: ComponentInfo) -> Self {
        debug_assert!(info.is::<T>(), "Type mismatch in ComponentStorage::new");
        Self {
            info,
            pool: Pool::new(),
            entities: SparseSet::new(),
        }
    }

    /// Store a value for `entity`, returning the slot it landed in.
    pub fn insert(&mut self, entity: Entity, value: T) -> SlotHandle {
        let handle = self.pool.acquire_with(value);
        self.entities.add(entity);
        handle
    }

    /// Get the value in a live slot.
    #[must_use]
    pub fn get(&self, handle: SlotHandle) -> Option<&T> {
        self.pool.get(handle)
    }

    /// Get the value in a live slot mutably.
    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        self.pool.get_mut(handle)
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<T> {
        &self.pool
    }
}

impl<T: Component> ErasedStorage for ComponentStorage<T> {
    fn info(&self) -> &ComponentInfo {
        &self.info
    }

    fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(entity)
    }

    fn entities(&self) -> &[Entity] {
        self.entities.as_slice()
    }

    fn remove(&mut self, entity: Entity, handle: SlotHandle) -> EcsResult<()> {
        self.entities.remove(entity);
        self.pool.release(handle)
    }

    fn pool_capacity(&self) -> usize {
        self.pool.capacity()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
