//! World - owns the storage and runs systems step by step.

use std::{
    cell::{Ref, RefCell},
    fmt,
};

use tessera_ecs::{
    CommandBuffer, Commands, Component, EcsResult, Entity, EntityAllocator, EntityStore, Query,
    Queryer, Resource, ResourceRegistry, Resources,
};
use tessera_event::EventBus;

/// A system run once by [`World::startup`].
pub type StartupSystem = Box<dyn FnMut(&mut Commands<'_>)>;

/// A system run once per step by [`World::update`].
pub type UpdateSystem =
    Box<dyn FnMut(&mut Commands<'_>, &Queryer<'_>, &Resources<'_>, &mut EventBus)>;

struct SystemEntry<S> {
    name: &'static str,
    run: S,
}

/// Capacity hints for a new [`World`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldConfig {
    /// Entities to reserve room for.
    pub entity_capacity: usize,
    /// Component types to reserve room for.
    pub component_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 1024,
            component_capacity: 32,
        }
    }
}

impl WorldConfig {
    /// Set the entity capacity hint.
    #[must_use]
    pub const fn with_entity_capacity(mut self, entity_capacity: usize) -> Self {
        self.entity_capacity = entity_capacity;
        self
    }

    /// Set the component type capacity hint.
    #[must_use]
    pub const fn with_component_capacity(mut self, component_capacity: usize) -> Self {
        self.component_capacity = component_capacity;
        self
    }
}

/// The simulation world.
///
/// Systems run sequentially in registration order. During a step they see the
/// store through a read-only [`Queryer`]; their [`Commands`] are collected in
/// one buffer per system and applied, in registration order, once every
/// system has run. The event bus is swapped after that.
pub struct World {
    store: EntityStore,
    entities: EntityAllocator,
    resources: RefCell<ResourceRegistry>,
    events: EventBus,
    startup_systems: Vec<SystemEntry<StartupSystem>>,
    systems: Vec<SystemEntry<UpdateSystem>>,
    started: bool,
    step: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create an empty world with the given capacity hints.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            store: EntityStore::with_capacity(config.entity_capacity, config.component_capacity),
            entities: EntityAllocator::new(),
            resources: RefCell::new(ResourceRegistry::new()),
            events: EventBus::new(),
            startup_systems: Vec::new(),
            systems: Vec::new(),
            started: false,
            step: 0,
        }
    }

    // ==================== Setup ====================

    /// Register a system to run once at startup.
    pub fn add_startup_system<F>(&mut self, system: F) -> &mut Self
    where
        F: FnMut(&mut Commands<'_>) + 'static,
    {
        self.startup_systems.push(SystemEntry {
            name: std::any::type_name::<F>(),
            run: Box::new(system),
        });
        self
    }

    /// Register a system to run every step.
    pub fn add_system<F>(&mut self, system: F) -> &mut Self
    where
        F: FnMut(&mut Commands<'_>, &Queryer<'_>, &Resources<'_>, &mut EventBus) + 'static,
    {
        self.systems.push(SystemEntry {
            name: std::any::type_name::<F>(),
            run: Box::new(system),
        });
        self
    }

    /// Set a resource, replacing any existing value.
    pub fn set_resource<T: Resource>(&mut self, value: T) -> &mut Self {
        self.resources.get_mut().set(value);
        self
    }

    // ==================== Execution ====================

    /// Run every startup system once and apply their commands.
    ///
    /// A second call does nothing.
    pub fn startup(&mut self) {
        if self.started {
            tracing::warn!("world already started, ignoring startup");
            return;
        }
        self.started = true;

        let Self {
            store,
            entities,
            resources,
            startup_systems,
            ..
        } = self;

        let mut buffers = Vec::with_capacity(startup_systems.len());
        for system in startup_systems.iter_mut() {
            tracing::trace!(system = system.name, "running startup system");

            let mut buffer = CommandBuffer::new();
            (system.run)(&mut Commands::new(&mut buffer, entities, resources));
            buffers.push(buffer);
        }

        let registry = resources.get_mut();
        for buffer in buffers {
            buffer.apply(store, registry);
        }

        tracing::info!(
            systems = self.startup_systems.len(),
            entities = self.store.entity_count(),
            "world started"
        );
    }

    /// Run one step.
    ///
    /// Every system runs with a fresh command buffer; the buffers are then
    /// applied in registration order and the event bus is swapped.
    pub fn update(&mut self) {
        let Self {
            store,
            entities,
            resources,
            events,
            systems,
            step,
            ..
        } = self;

        let mut buffers = Vec::with_capacity(systems.len());
        {
            let queryer = Queryer::new(store);
            let view = Resources::new(resources);

            for system in systems.iter_mut() {
                tracing::trace!(system = system.name, step = *step, "running system");

                let mut buffer = CommandBuffer::new();
                let mut commands = Commands::new(&mut buffer, entities, resources);
                (system.run)(&mut commands, &queryer, &view, events);
                // Writes staged behind a resource guard land before the next system.
                if !commands.flush_resources() {
                    tracing::warn!(system = system.name, "resource writes deferred to apply");
                }
                buffers.push(buffer);
            }
        }

        let commands: usize = buffers.iter().map(CommandBuffer::len).sum();
        let registry = resources.get_mut();
        for buffer in buffers {
            buffer.apply(store, registry);
        }

        events.swap();
        *step += 1;

        tracing::debug!(step = *step, commands, "step complete");
    }

    /// Run `steps` steps.
    pub fn run(&mut self, steps: u64) {
        for _ in 0..steps {
            self.update();
        }
    }

    /// Drop every entity, resource and event.
    ///
    /// Registered systems and type ids are kept, so the world can be started
    /// again.
    pub fn shutdown(&mut self) {
        let entities = self.store.entity_count();

        self.store.clear();
        self.resources.get_mut().clear();
        self.events.clear();
        self.started = false;
        self.step = 0;

        tracing::info!(entities, "world shut down");
    }

    // ==================== Access ====================

    /// The entity store.
    #[must_use]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// A read-only view of the store, as systems see it.
    #[must_use]
    pub fn queryer(&self) -> Queryer<'_> {
        Queryer::new(&self.store)
    }

    /// Borrow a resource.
    #[must_use]
    pub fn resource<T: Resource>(&self) -> Option<Ref<'_, T>> {
        Resources::new(&self.resources).get::<T>()
    }

    /// Get a resource mutably.
    pub fn resource_mut<T: Resource>(&mut self) -> Option<&mut T> {
        self.resources.get_mut().get_mut::<T>()
    }

    /// Check if a resource exists.
    #[must_use]
    pub fn has_resource<T: Resource>(&self) -> bool {
        self.resources.borrow().contains::<T>()
    }

    /// The event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The event bus, mutably.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Get a component of an entity.
    pub fn get<T: Component>(&self, entity: Entity) -> EcsResult<&T> {
        self.store.get::<T>(entity)
    }

    /// Get a component of an entity mutably.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        self.store.get_mut::<T>(entity)
    }

    /// Entities carrying every component type in `Q`.
    #[must_use]
    pub fn query<Q: Query>(&self) -> Vec<Entity> {
        self.store.query::<Q>()
    }

    /// Number of completed steps since startup.
    #[must_use]
    pub const fn step_count(&self) -> u64 {
        self.step
    }

    /// Check if [`World::startup`] has run.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Number of registered update systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("store", &self.store)
            .field("entities", &self.entities)
            .field("resources", &self.resources.borrow())
            .field("events", &self.events)
            .field("startup_systems", &self.startup_systems.len())
            .field("systems", &self.systems.len())
            .field("started", &self.started)
            .field("step", &self.step)
            .finish()
    }
}
