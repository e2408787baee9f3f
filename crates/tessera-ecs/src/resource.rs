//! Resources - global state that exists once per world.
//!
//! Unlike components, which are attached to entities, a resource exists
//! independently and is looked up by type. Each resource type is assigned a
//! [`ResourceId`] the first time the registry sees it; ids are never reused
//! even after the value is removed.
//!
//! Examples: simulation time, configuration, input state.

use std::{
    any::{Any, TypeId},
    cell::{Ref, RefCell, RefMut},
    fmt,
};

use rustc_hash::FxHashMap;

use crate::error::{EcsError, EcsResult};

/// Marker trait for resource types.
pub trait Resource: 'static {}

impl<T: 'static> Resource for T {}

/// Unique identifier for a resource type within one registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u32);

impl ResourceId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({})", self.0)
    }
}

/// Type-erased resource value.
struct ResourceEntry {
    name: &'static str,
    value: Box<dyn Any>,
}

impl ResourceEntry {
    fn new<T: Resource>(value: T) -> Self {
        Self {
            name: std::any::type_name::<T>(),
            value: Box::new(value),
        }
    }

    fn into_inner<T: Resource>(self) -> Option<T> {
        self.value.downcast().ok().map(|b| *b)
    }
}

/// Storage for resources.
///
/// Holds zero or one value per type.
#[derive(Default)]
pub struct ResourceRegistry {
    /// Ids handed out so far, kept across removals.
    ids: FxHashMap<TypeId, ResourceId>,
    /// Current values keyed by id.
    values: FxHashMap<ResourceId, ResourceEntry>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type and return its ID.
    ///
    /// If the type is already registered, returns the existing ID.
    pub fn register<T: Resource>(&mut self) -> ResourceId {
        let next = ResourceId(self.ids.len() as u32);
        *self.ids.entry(TypeId::of::<T>()).or_insert(next)
    }

    /// Get the ID of a resource type, if registered.
    #[must_use]
    pub fn get_id<T: Resource>(&self) -> Option<ResourceId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Set a resource, replacing any existing value of the same type.
    ///
    /// Returns the replaced value.
    pub fn set<T: Resource>(&mut self, value: T) -> Option<T> {
        let id = self.register::<T>();
        let old = self.values.insert(id, ResourceEntry::new(value))?;

        tracing::debug!(resource = old.name, "replaced resource");
        old.into_inner()
    }

    /// Insert a resource only if none of its type exists.
    ///
    /// Fails with [`EcsError::DuplicateResource`] otherwise, leaving the
    /// existing value in place.
    pub fn try_insert<T: Resource>(&mut self, value: T) -> EcsResult<()> {
        if self.contains::<T>() {
            return Err(EcsError::DuplicateResource {
                resource: std::any::type_name::<T>(),
            });
        }
        self.set(value);
        Ok(())
    }

    /// Get a resource.
    #[must_use]
    pub fn get<T: Resource>(&self) -> Option<&T> {
        let id = self.get_id::<T>()?;
        self.values.get(&id)?.value.downcast_ref()
    }

    /// Get a resource mutably.
    pub fn get_mut<T: Resource>(&mut self) -> Option<&mut T> {
        let id = self.get_id::<T>()?;
        self.values.get_mut(&id)?.value.downcast_mut()
    }

    /// Check if a resource of type `T` exists.
    #[must_use]
    pub fn contains<T: Resource>(&self) -> bool {
        self.get_id::<T>()
            .is_some_and(|id| self.values.contains_key(&id))
    }

    /// Remove a resource, returning it if it existed.
    pub fn remove<T: Resource>(&mut self) -> Option<T> {
        let id = self.get_id::<T>()?;
        self.values.remove(&id)?.into_inner()
    }

    /// Remove a resource by its `TypeId`.
    ///
    /// Returns `false` if no value of that type existed.
    pub fn remove_by_type_id(&mut self, type_id: TypeId) -> bool {
        let Some(id) = self.ids.get(&type_id) else {
            return false;
        };
        self.values.remove(id).is_some()
    }

    /// Number of resources currently set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no resource is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop every resource value. Registered ids are kept.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.values.values().map(|entry| entry.name).collect();
        names.sort_unstable();

        f.debug_struct("ResourceRegistry")
            .field("registered", &self.ids.len())
            .field("set", &names)
            .finish()
    }
}

// ============================================================================
// Resources - System View
// ============================================================================

/// Resource access handed to systems.
///
/// Shares the world's registry with [`Commands::set_resource`], so borrows
/// are checked at runtime: holding a [`Resources::get_mut`] guard while
/// setting a resource through commands panics.
///
/// [`Commands::set_resource`]: crate::command::Commands::set_resource
#[derive(Clone, Copy)]
pub struct Resources<'w> {
    registry: &'w RefCell<ResourceRegistry>,
}

impl<'w> Resources<'w> {
    /// Wrap a shared registry.
    #[must_use]
    pub const fn new(registry: &'w RefCell<ResourceRegistry>) -> Self {
        Self { registry }
    }

    /// Check if a resource of type `T` exists.
    #[must_use]
    pub fn has<T: Resource>(&self) -> bool {
        self.registry.borrow().contains::<T>()
    }

    /// Borrow a resource.
    ///
    /// # Panics
    ///
    /// Panics if the resource registry is mutably borrowed.
    #[must_use]
    pub fn get<T: Resource>(&self) -> Option<Ref<'w, T>> {
        Ref::filter_map(self.registry.borrow(), ResourceRegistry::get::<T>).ok()
    }

    /// Borrow a resource mutably.
    ///
    /// # Panics
    ///
    /// Panics if the resource registry is already borrowed.
    #[must_use]
    pub fn get_mut<T: Resource>(&self) -> Option<RefMut<'w, T>> {
        RefMut::filter_map(self.registry.borrow_mut(), ResourceRegistry::get_mut::<T>).ok()
    }
}

impl fmt::Debug for Resources<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resources")
            .field("len", &self.registry.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Config {
        world_size: u32,
        tick_rate: u32,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Time {
        tick: u64,
    }

    #[test]
    fn test_resource_set_get() {
        let mut registry = ResourceRegistry::new();

        registry.set(Config {
            world_size: 1000,
            tick_rate: 20,
        });

        let config = registry.get::<Config>().unwrap();
        assert_eq!(config.world_size, 1000);
        assert_eq!(config.tick_rate, 20);
        assert!(registry.get::<Time>().is_none());
    }

    #[test]
    fn test_resource_replace() {
        let mut registry = ResourceRegistry::new();

        assert!(registry.set(Time { tick: 1 }).is_none());
        let old = registry.set(Time { tick: 2 });

        assert_eq!(old, Some(Time { tick: 1 }));
        assert_eq!(registry.get::<Time>(), Some(&Time { tick: 2 }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resource_try_insert_duplicate() {
        let mut registry = ResourceRegistry::new();

        assert!(registry.try_insert(Time { tick: 1 }).is_ok());
        let err = registry.try_insert(Time { tick: 2 }).unwrap_err();

        assert!(matches!(err, EcsError::DuplicateResource { .. }));
        assert_eq!(registry.get::<Time>(), Some(&Time { tick: 1 }));
    }

    #[test]
    fn test_resource_get_mut() {
        let mut registry = ResourceRegistry::new();
        registry.set(Time::default());

        registry.get_mut::<Time>().unwrap().tick = 100;

        assert_eq!(registry.get::<Time>().unwrap().tick, 100);
    }

    #[test]
    fn test_resource_remove_keeps_id() {
        let mut registry = ResourceRegistry::new();
        registry.set(Config::default());
        registry.set(Time::default());
        let id = registry.get_id::<Config>();

        assert_eq!(registry.remove::<Config>(), Some(Config::default()));
        assert!(!registry.contains::<Config>());
        assert!(registry.remove::<Config>().is_none());

        registry.set(Config::default());
        assert_eq!(registry.get_id::<Config>(), id);
    }

    #[test]
    fn test_resource_remove_by_type_id() {
        let mut registry = ResourceRegistry::new();
        registry.set(Time::default());

        assert!(registry.remove_by_type_id(TypeId::of::<Time>()));
        assert!(!registry.remove_by_type_id(TypeId::of::<Time>()));
        assert!(!registry.remove_by_type_id(TypeId::of::<Config>()));
    }

    #[test]
    fn test_resource_ids_independent_of_values() {
        let mut registry = ResourceRegistry::new();

        let time = registry.register::<Time>();
        let config = registry.register::<Config>();

        assert_ne!(time, config);
        assert_eq!(registry.register::<Time>(), time);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear_keeps_ids() {
        let mut registry = ResourceRegistry::new();
        registry.set(Time::default());
        let id = registry.get_id::<Time>();

        registry.clear();

        assert!(registry.is_empty());
        assert_eq!(registry.get_id::<Time>(), id);
    }

    #[test]
    fn test_resources_view() {
        let cell = RefCell::new(ResourceRegistry::new());
        cell.borrow_mut().set(Time { tick: 3 });

        let resources = Resources::new(&cell);

        assert!(resources.has::<Time>());
        assert!(!resources.has::<Config>());
        assert_eq!(resources.get::<Time>().unwrap().tick, 3);

        resources.get_mut::<Time>().unwrap().tick = 4;
        assert_eq!(resources.get::<Time>().unwrap().tick, 4);

        assert!(resources.get::<Config>().is_none());
        assert!(resources.get_mut::<Config>().is_none());
    }
}
