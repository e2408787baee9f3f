//! EntityStore - the component storage of a world.
//!
//! The store owns, per component type, a [`ComponentStorage`] (pool plus
//! sparse set of carriers) and, per entity, a small index of the component
//! records it carries. Structural changes (`attach`, `detach_all`) are meant
//! to run while command buffers are applied, never while systems iterate.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    component::{Component, ComponentId, ComponentInfo, ComponentRegistry},
    entity::Entity,
    error::{EcsError, EcsResult},
    pool::SlotHandle,
    query::Query,
    storage::{ComponentStorage, ErasedStorage},
};

/// A component carried by an entity: its type and the pool slot holding it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentRecord {
    /// Component type.
    pub id: ComponentId,
    /// Slot in that type's pool.
    pub handle: SlotHandle,
}

type Records = SmallVec<[ComponentRecord; 8]>;

/// Storage for every entity and component of a world.
#[derive(Default)]
pub struct EntityStore {
    /// Component type registry.
    registry: ComponentRegistry,
    /// One storage per component type, created on first attach.
    storages: FxHashMap<ComponentId, Box<dyn ErasedStorage>>,
    /// Component records per entity.
    entities: FxHashMap<Entity, Records>,
}

impl EntityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with room for `entity_capacity` entities and
    /// `component_capacity` component types.
    #[must_use]
    pub fn with_capacity(entity_capacity: usize, component_capacity: usize) -> Self {
        Self {
            registry: ComponentRegistry::new(),
            storages: FxHashMap::with_capacity_and_hasher(component_capacity, Default::default()),
            entities: FxHashMap::with_capacity_and_hasher(entity_capacity, Default::default()),
        }
    }

    // ==================== Entity Operations ====================

    /// Make `entity` known to the store without giving it components.
    ///
    /// Returns `false` if the entity was already known.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is [`Entity::RESERVED`].
    pub fn insert_entity(&mut self, entity: Entity) -> bool {
        assert_not_reserved(entity);
        if self.entities.contains_key(&entity) {
            return false;
        }
        self.entities.insert(entity, Records::new());
        true
    }

    /// Attach a component to an entity.
    ///
    /// Creates the type's storage on first use. If the entity already carries
    /// `T`, the value in its existing slot is overwritten.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is [`Entity::RESERVED`]. The store is left untouched.
    pub fn attach<T: Component>(&mut self, entity: Entity, value: T) {
        assert_not_reserved(entity);
        let id = self.registry.register::<T>();

        let storage = self
            .storages
            .entry(id)
            .or_insert_with(|| {
                let component = std::any::type_name::<T>();
                tracing::debug!(component, ?id, "created component storage");
                Box::new(ComponentStorage::<T>::new(ComponentInfo::of::<T>(id)))
            })
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
            .expect("Type mismatch in component storage");

        let records = self.entities.entry(entity).or_default();

        if let Some(record) = records.iter().find(|record| record.id == id) {
            if let Some(slot) = storage.get_mut(record.handle) {
                *slot = value;
                return;
            }
        }

        let handle = storage.insert(entity, value);
        records.push(ComponentRecord { id, handle });
    }

    /// Detach every component of an entity and forget the entity.
    ///
    /// Returns `false` if the entity was unknown.
    pub fn detach_all(&mut self, entity: Entity) -> bool {
        let Some(records) = self.entities.remove(&entity) else {
            return false;
        };

        for record in records {
            self.release(entity, record);
        }

        true
    }

    /// Detach a single component. The entity stays known.
    ///
    /// Returns `false` if the entity did not carry `T`.
    pub fn detach<T: Component>(&mut self, entity: Entity) -> bool {
        let Some(id) = self.registry.get_id::<T>() else {
            return false;
        };
        let Some(records) = self.entities.get_mut(&entity) else {
            return false;
        };
        let Some(position) = records.iter().position(|record| record.id == id) else {
            return false;
        };

        let record = records.swap_remove(position);
        self.release(entity, record);
        true
    }

    /// Check if an entity is known (spawned and not destroyed).
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Number of known entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterate over known entities in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys().copied()
    }

    /// Component records of an entity.
    #[must_use]
    pub fn records(&self, entity: Entity) -> &[ComponentRecord] {
        self.entities
            .get(&entity)
            .map(|records| records.as_slice())
            .unwrap_or(&[])
    }

    // ==================== Component Operations ====================

    /// Register a component type without attaching it anywhere.
    pub fn register<T: Component>(&mut self) -> ComponentId {
        self.registry.register::<T>()
    }

    /// The component registry.
    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Check if an entity carries `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.registry
            .get_id::<T>()
            .is_some_and(|id| self.has_id(entity, id))
    }

    /// Check if an entity carries the component with the given id.
    #[must_use]
    pub fn has_id(&self, entity: Entity, id: ComponentId) -> bool {
        self.storages
            .get(&id)
            .is_some_and(|storage| storage.contains(entity))
    }

    /// Get a component of an entity.
    pub fn get<T: Component>(&self, entity: Entity) -> EcsResult<&T> {
        self.registry
            .get_id::<T>()
            .and_then(|id| {
                let handle = self.handle_of(entity, id)?;
                self.typed_storage::<T>(id)?.get(handle)
            })
            .ok_or_else(|| missing::<T>(entity))
    }

    /// Get a component of an entity mutably.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        let Some(id) = self.registry.get_id::<T>() else {
            return Err(missing::<T>(entity));
        };
        let Some(handle) = self.handle_of(entity, id) else {
            return Err(missing::<T>(entity));
        };

        self.storages
            .get_mut(&id)
            .and_then(|storage| storage.as_any_mut().downcast_mut::<ComponentStorage<T>>())
            .and_then(|storage| storage.get_mut(handle))
            .ok_or_else(|| missing::<T>(entity))
    }

    /// Number of entities carrying `T`.
    #[must_use]
    pub fn len_of<T: Component>(&self) -> usize {
        self.registry
            .get_id::<T>()
            .and_then(|id| self.storages.get(&id))
            .map_or(0, |storage| storage.len())
    }

    /// Number of pool slots ever constructed for `T`.
    #[must_use]
    pub fn pool_capacity_of<T: Component>(&self) -> usize {
        self.registry
            .get_id::<T>()
            .and_then(|id| self.storages.get(&id))
            .map_or(0, |storage| storage.pool_capacity())
    }

    /// Number of component types this store has registered.
    #[must_use]
    pub fn component_type_count(&self) -> usize {
        self.registry.len()
    }

    // ==================== Query ====================

    /// Entities carrying every component type in `Q`.
    ///
    /// `Q` is a tuple such as `(Position,)` or `(Position, Velocity)`. The first
    /// type drives iteration; list the rarest type first for speed.
    #[must_use]
    pub fn query<Q: Query>(&self) -> Vec<Entity> {
        match Q::component_ids(&self.registry) {
            Some(ids) => self.query_ids(&ids),
            None => Vec::new(),
        }
    }

    /// Entities carrying every listed component type.
    ///
    /// Iterates the carriers of `ids[0]` and keeps those that also carry the
    /// remaining types. An empty list matches nothing.
    #[must_use]
    pub fn query_ids(&self, ids: &[ComponentId]) -> Vec<Entity> {
        let Some((first, rest)) = ids.split_first() else {
            return Vec::new();
        };
        let Some(driver) = self.storages.get(first) else {
            return Vec::new();
        };

        driver
            .entities()
            .iter()
            .copied()
            .filter(|&entity| rest.iter().all(|&id| self.has_id(entity, id)))
            .collect()
    }

    // ==================== Lifecycle ====================

    /// Drop every component value, storage and entity record.
    ///
    /// The registry is kept so component ids stay stable.
    pub fn clear(&mut self) {
        self.storages.clear();
        self.entities.clear();
    }

    fn handle_of(&self, entity: Entity, id: ComponentId) -> Option<SlotHandle> {
        self.entities
            .get(&entity)?
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.handle)
    }

    fn typed_storage<T: Component>(&self, id: ComponentId) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&id)?
            .as_any()
            .downcast_ref::<ComponentStorage<T>>()
    }

    fn release(&mut self, entity: Entity, record: ComponentRecord) {
        let Some(storage) = self.storages.get_mut(&record.id) else {
            tracing::error!(%entity, id = ?record.id, "component record without storage");
            return;
        };

        if let Err(err) = storage.remove(entity, record.handle) {
            let component = storage.info().name();
            tracing::error!(%entity, component, %err, "component record out of sync with pool");
        }
    }
}

fn assert_not_reserved(entity: Entity) {
    assert!(
        entity.id() != Entity::RESERVED,
        "reserved entity id used as an entity"
    );
}

fn missing<T: Component>(entity: Entity) -> EcsError {
    EcsError::MissingComponent {
        entity,
        component: std::any::type_name::<T>(),
    }
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("entity_count", &self.entities.len())
            .field("component_types", &self.registry.len())
            .field("storages", &self.storages.len())
            .finish()
    }
}
