//! Deferred structural changes.
//!
//! Systems never mutate the [`EntityStore`] directly. They record intents in a
//! [`CommandBuffer`] through a [`Commands`] handle, and the scheduler applies
//! every buffer once all systems of a step have run.
//!
//! # Apply order
//!
//! Within one buffer, categories are applied in a fixed order regardless of
//! the order they were recorded in:
//!
//! 1. destroy entities
//! 2. remove resources
//! 3. spawn entities
//!
//! Destroying an entity and spawning the same id in one buffer therefore
//! always leaves the spawned components.
//!
//! The single exception to deferral is [`Commands::set_resource`], which
//! writes the resource immediately. If the system still holds a
//! [`Resources`](crate::resource::Resources) guard at that moment, the write
//! is staged and lands as soon as the guard is gone, before the next system
//! runs.

use std::{any::TypeId, cell::RefCell, fmt};

use smallvec::SmallVec;

use crate::{
    component::Component,
    entity::{Entity, EntityAllocator},
    resource::{Resource, ResourceRegistry},
    store::EntityStore,
};

// ============================================================================
// Pending Components
// ============================================================================

/// A component value waiting to be attached.
pub trait PendingComponent {
    /// Attach the value to `entity`.
    fn attach(self: Box<Self>, store: &mut EntityStore, entity: Entity);

    /// Name of the component type, used in logs.
    fn name(&self) -> &'static str;
}

struct Pending<T>(T);

impl<T: Component> PendingComponent for Pending<T> {
    fn attach(self: Box<Self>, store: &mut EntityStore, entity: Entity) {
        store.attach(entity, self.0);
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Pending components of one spawn.
pub type PendingComponents = SmallVec<[Box<dyn PendingComponent>; 4]>;

/// A set of components spawned together.
///
/// Implemented for tuples of up to eight components, including `()`.
pub trait Bundle: 'static {
    /// Move each component into `out`.
    fn into_pending(self, out: &mut PendingComponents);
}

impl Bundle for () {
    fn into_pending(self, _out: &mut PendingComponents) {}
}

macro_rules! impl_bundle {
    ($($name:ident),+) => {
        impl<$($name: Component),+> Bundle for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_pending(self, out: &mut PendingComponents) {
                let ($($name,)+) = self;
                $(out.push(Box::new(Pending($name)));)+
            }
        }
    };
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);

// ============================================================================
// Staged Resources
// ============================================================================

/// A resource write that could not take the registry borrow.
trait StagedResource {
    fn set(self: Box<Self>, registry: &mut ResourceRegistry);
    fn name(&self) -> &'static str;
}

struct Staged<T>(T);

impl<T: Resource> StagedResource for Staged<T> {
    fn set(self: Box<Self>, registry: &mut ResourceRegistry) {
        registry.set(self.0);
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

// ============================================================================
// CommandBuffer
// ============================================================================

struct SpawnCommand {
    entity: Entity,
    components: PendingComponents,
}

struct ResourceRemoval {
    type_id: TypeId,
    name: &'static str,
}

/// Commands recorded by one system invocation.
#[derive(Default)]
pub struct CommandBuffer {
    staged_resources: Vec<Box<dyn StagedResource>>,
    destroys: Vec<Entity>,
    resource_removals: Vec<ResourceRemoval>,
    spawns: Vec<SpawnCommand>,
}

impl CommandBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of recorded commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.staged_resources.len()
            + self.destroys.len()
            + self.resource_removals.len()
            + self.spawns.len()
    }

    /// Check if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of resource writes waiting for the registry borrow to end.
    #[must_use]
    pub fn staged_resource_count(&self) -> usize {
        self.staged_resources.len()
    }

    /// Write every staged resource into the registry, in recording order.
    pub fn flush_resources(&mut self, resources: &mut ResourceRegistry) {
        for staged in self.staged_resources.drain(..) {
            tracing::trace!(resource = staged.name(), "flushing staged resource");
            staged.set(resources);
        }
    }

    /// Apply every recorded command, consuming the buffer.
    ///
    /// Staged resource writes land first, since they were issued as
    /// immediate writes.
    pub fn apply(mut self, store: &mut EntityStore, resources: &mut ResourceRegistry) {
        self.flush_resources(resources);

        let Self {
            destroys,
            resource_removals,
            spawns,
            ..
        } = self;

        if !destroys.is_empty() {
            tracing::trace!(count = destroys.len(), "applying destroys");
        }
        for entity in destroys {
            store.detach_all(entity);
        }

        if !resource_removals.is_empty() {
            tracing::trace!(count = resource_removals.len(), "applying resource removals");
        }
        for removal in resource_removals {
            if !resources.remove_by_type_id(removal.type_id) {
                tracing::trace!(resource = removal.name, "resource already absent");
            }
        }

        if !spawns.is_empty() {
            tracing::trace!(count = spawns.len(), "applying spawns");
        }
        for spawn in spawns {
            store.insert_entity(spawn.entity);
            for component in spawn.components {
                tracing::trace!(entity = %spawn.entity, component = component.name(), "attaching");
                component.attach(store, spawn.entity);
            }
        }
    }
}

impl fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBuffer")
            .field(
                "staged_resources",
                &self.staged_resources.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .field("destroys", &self.destroys)
            .field(
                "resource_removals",
                &self.resource_removals.iter().map(|r| r.name).collect::<Vec<_>>(),
            )
            .field(
                "spawns",
                &self.spawns.iter().map(|s| s.entity).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ============================================================================
// Commands - System Handle
// ============================================================================

/// Handle through which a system records commands.
pub struct Commands<'w> {
    buffer: &'w mut CommandBuffer,
    entities: &'w EntityAllocator,
    resources: &'w RefCell<ResourceRegistry>,
}

impl<'w> Commands<'w> {
    /// Create a handle recording into `buffer`.
    pub fn new(
        buffer: &'w mut CommandBuffer,
        entities: &'w EntityAllocator,
        resources: &'w RefCell<ResourceRegistry>,
    ) -> Self {
        Self {
            buffer,
            entities,
            resources,
        }
    }

    /// Spawn an entity with the components in `bundle`.
    ///
    /// The id is reserved now and returned, but the entity only exists in
    /// the store once the buffer is applied.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Entity {
        let entity = self.entities.reserve();

        let mut components = PendingComponents::new();
        bundle.into_pending(&mut components);

        self.buffer.spawns.push(SpawnCommand { entity, components });
        entity
    }

    /// Destroy an entity and all of its components.
    ///
    /// Unknown entities are ignored when the buffer is applied.
    pub fn destroy(&mut self, entity: Entity) -> &mut Self {
        self.buffer.destroys.push(entity);
        self
    }

    /// Remove the resource of type `T`.
    pub fn remove_resource<T: Resource>(&mut self) -> &mut Self {
        self.buffer.resource_removals.push(ResourceRemoval {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        });
        self
    }

    /// Set a resource, replacing any existing value.
    ///
    /// Unlike every other command this takes effect immediately, so systems
    /// running later in the same step observe the new value. While a
    /// [`Resources`](crate::resource::Resources) guard is alive the write is
    /// staged instead, and every later write from this handle queues behind
    /// it so the order of writes is kept.
    pub fn set_resource<T: Resource>(&mut self, value: T) -> &mut Self {
        if self.buffer.staged_resources.is_empty()
            && let Ok(mut registry) = self.resources.try_borrow_mut()
        {
            registry.set(value);
            return self;
        }

        tracing::trace!(
            resource = std::any::type_name::<T>(),
            "resource registry borrowed, staging write"
        );
        self.buffer.staged_resources.push(Box::new(Staged(value)));
        self
    }

    /// Write staged resources now if the registry is free.
    ///
    /// Returns `true` if nothing is left staged.
    pub fn flush_resources(&mut self) -> bool {
        if let Ok(mut registry) = self.resources.try_borrow_mut() {
            self.buffer.flush_resources(&mut registry);
        }
        self.buffer.staged_resources.is_empty()
    }

    /// Number of commands recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl fmt::Debug for Commands<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commands")
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Name(String);

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Id(u32);

    #[derive(Debug, PartialEq)]
    struct Score(u32);

    struct Fixture {
        store: EntityStore,
        allocator: EntityAllocator,
        resources: RefCell<ResourceRegistry>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: EntityStore::new(),
                allocator: EntityAllocator::new(),
                resources: RefCell::new(ResourceRegistry::new()),
            }
        }

        fn record(&self, f: impl FnOnce(&mut Commands<'_>)) -> CommandBuffer {
            let mut buffer = CommandBuffer::new();
            f(&mut Commands::new(&mut buffer, &self.allocator, &self.resources));
            buffer
        }

        fn apply(&mut self, buffer: CommandBuffer) {
            buffer.apply(&mut self.store, self.resources.get_mut());
        }
    }

    #[test]
    fn test_spawn_is_deferred() {
        let mut fx = Fixture::new();

        let mut spawned = None;
        let buffer = fx.record(|cmd| {
            spawned = Some(cmd.spawn((Name("a".to_string()), Id(1))));
        });
        let entity = spawned.unwrap();

        assert!(!fx.store.contains(entity));
        assert_eq!(buffer.len(), 1);

        fx.apply(buffer);

        assert_eq!(fx.store.get::<Name>(entity), Ok(&Name("a".to_string())));
        assert_eq!(fx.store.get::<Id>(entity), Ok(&Id(1)));
    }

    #[test]
    fn test_spawn_empty_bundle() {
        let mut fx = Fixture::new();

        let mut spawned = None;
        let buffer = fx.record(|cmd| spawned = Some(cmd.spawn(())));
        fx.apply(buffer);

        let entity = spawned.unwrap();
        assert!(fx.store.contains(entity));
        assert!(fx.store.records(entity).is_empty());
    }

    #[test]
    fn test_spawn_reserves_distinct_ids() {
        let fx = Fixture::new();

        let mut ids = Vec::new();
        let _buffer = fx.record(|cmd| {
            ids.push(cmd.spawn((Id(0),)));
            ids.push(cmd.spawn((Id(1),)));
        });

        assert_ne!(ids[0], ids[1]);
        assert_eq!(fx.allocator.reserved_count(), 2);
    }

    #[test]
    fn test_destroy_then_spawn_same_id() {
        let mut fx = Fixture::new();
        let entity = fx.allocator.reserve();
        fx.store.attach(entity, Id(7));

        let mut buffer = CommandBuffer::new();
        buffer.destroys.push(entity);
        buffer.spawns.push(SpawnCommand {
            entity,
            components: {
                let mut pending = PendingComponents::new();
                (Name("respawned".to_string()),).into_pending(&mut pending);
                pending
            },
        });
        fx.apply(buffer);

        assert!(fx.store.contains(entity));
        assert!(fx.store.has::<Name>(entity));
        assert!(!fx.store.has::<Id>(entity));
    }

    #[test]
    fn test_spawn_then_destroy_in_one_buffer_keeps_spawn() {
        let mut fx = Fixture::new();

        let mut spawned = None;
        let buffer = fx.record(|cmd| {
            let entity = cmd.spawn((Id(3),));
            cmd.destroy(entity);
            spawned = Some(entity);
        });
        fx.apply(buffer);

        // Destroys run before spawns, so the destroy found nothing.
        let entity = spawned.unwrap();
        assert_eq!(fx.store.get::<Id>(entity), Ok(&Id(3)));
    }

    #[test]
    fn test_destroy_unknown_is_noop() {
        let mut fx = Fixture::new();
        let buffer = fx.record(|cmd| {
            cmd.destroy(Entity::from_raw(99)).destroy(Entity::from_raw(100));
        });

        fx.apply(buffer);
        assert_eq!(fx.store.entity_count(), 0);
    }

    #[test]
    fn test_set_resource_is_immediate() {
        let mut fx = Fixture::new();

        let buffer = fx.record(|cmd| {
            cmd.set_resource(Score(1));
        });

        assert!(buffer.is_empty());
        assert_eq!(fx.resources.borrow().get::<Score>(), Some(&Score(1)));

        fx.apply(buffer);
        assert_eq!(fx.resources.borrow().get::<Score>(), Some(&Score(1)));
    }

    #[test]
    fn test_remove_resource_is_deferred() {
        let mut fx = Fixture::new();
        fx.resources.get_mut().set(Score(5));

        let buffer = fx.record(|cmd| {
            cmd.remove_resource::<Score>();
        });
        assert!(fx.resources.borrow().contains::<Score>());

        fx.apply(buffer);
        assert!(!fx.resources.borrow().contains::<Score>());
    }

    #[test]
    fn test_set_then_remove_resource_in_one_system() {
        let mut fx = Fixture::new();

        let buffer = fx.record(|cmd| {
            cmd.remove_resource::<Score>().set_resource(Score(2));
        });
        fx.apply(buffer);

        // The set happened at once; the removal ran at apply time.
        assert!(!fx.resources.borrow().contains::<Score>());
    }

    #[test]
    fn test_set_resource_while_reading_is_staged() {
        use crate::resource::Resources;

        let mut fx = Fixture::new();
        fx.resources.get_mut().set(Score(1));

        let mut buffer = CommandBuffer::new();
        {
            let view = Resources::new(&fx.resources);
            let mut cmd = Commands::new(&mut buffer, &fx.allocator, &fx.resources);

            if let Some(score) = view.get::<Score>() {
                cmd.set_resource(Score(score.0 + 1));
                // The guard is still alive, so the write waits.
                assert_eq!(score.0, 1);
            }
            cmd.set_resource(Score(10));

            assert!(cmd.flush_resources());
        }

        assert_eq!(buffer.staged_resource_count(), 0);
        assert_eq!(fx.resources.borrow().get::<Score>(), Some(&Score(10)));
    }

    #[test]
    fn test_staged_resource_lands_on_apply() {
        use crate::resource::Resources;

        let mut fx = Fixture::new();
        fx.resources.get_mut().set(Score(1));

        let mut buffer = CommandBuffer::new();
        {
            let view = Resources::new(&fx.resources);
            let _guard = view.get::<Score>();
            Commands::new(&mut buffer, &fx.allocator, &fx.resources).set_resource(Score(2));
        }

        assert_eq!(buffer.staged_resource_count(), 1);
        assert_eq!(fx.resources.borrow().get::<Score>(), Some(&Score(1)));

        fx.apply(buffer);
        assert_eq!(fx.resources.borrow().get::<Score>(), Some(&Score(2)));
    }

    #[test]
    fn test_buffers_apply_in_sequence() {
        let mut fx = Fixture::new();
        let entity = fx.allocator.reserve();
        fx.store.attach(entity, Id(1));

        let first = fx.record(|cmd| {
            cmd.destroy(entity);
        });
        let second = fx.record(|cmd| {
            cmd.spawn((Id(2),));
        });

        fx.apply(first);
        fx.apply(second);

        assert!(!fx.store.contains(entity));
        assert_eq!(fx.store.len_of::<Id>(), 1);
    }
}
