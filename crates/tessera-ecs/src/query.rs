//! Queries over entities carrying a set of component types.
//!
//! Two ways to describe a query:
//!
//! - Statically, as a tuple type: `store.query::<(Position, Velocity)>()`
//! - At runtime, with a builder: `queryer.builder().with::<Position>().with::<Velocity>().build()`
//!
//! Either way the result is a snapshot `Vec<Entity>`. The first listed type
//! drives iteration and the others are membership-tested, so put the rarest
//! type first.
//!
//! Systems receive a [`Queryer`], a read-only view of the store. Because it is
//! a shared borrow, nothing can change the store's structure while a system
//! is iterating.

use smallvec::{SmallVec, smallvec};

use crate::{
    component::{Component, ComponentId, ComponentRegistry},
    entity::Entity,
    error::EcsResult,
    store::EntityStore,
};

/// Component ids collected for a query.
pub type QueryIds = SmallVec<[ComponentId; 8]>;

/// A tuple of component types usable as a query.
pub trait Query {
    /// Ids of the component types, in tuple order.
    ///
    /// Returns `None` if any type was never registered, in which case no
    /// entity can match.
    fn component_ids(registry: &ComponentRegistry) -> Option<QueryIds>;
}

macro_rules! impl_query {
    ($($name:ident),+) => {
        impl<$($name: Component),+> Query for ($($name,)+) {
            fn component_ids(registry: &ComponentRegistry) -> Option<QueryIds> {
                Some(smallvec![$(registry.get_id::<$name>()?),+])
            }
        }
    };
}

impl_query!(A);
impl_query!(A, B);
impl_query!(A, B, C);
impl_query!(A, B, C, D);
impl_query!(A, B, C, D, E);
impl_query!(A, B, C, D, E, F);
impl_query!(A, B, C, D, E, F, G);
impl_query!(A, B, C, D, E, F, G, H);

// ============================================================================
// QueryBuilder - Runtime Builder Pattern
// ============================================================================

/// Builder for queries composed at runtime.
pub struct QueryBuilder<'w> {
    store: &'w EntityStore,
    ids: QueryIds,
    /// Set once a requested type turns out to be unregistered.
    unmatchable: bool,
}

impl<'w> QueryBuilder<'w> {
    /// Create a new query builder.
    #[must_use]
    pub fn new(store: &'w EntityStore) -> Self {
        Self {
            store,
            ids: QueryIds::new(),
            unmatchable: false,
        }
    }

    /// Require component `T`.
    #[must_use]
    pub fn with<T: Component>(mut self) -> Self {
        match self.store.registry().get_id::<T>() {
            Some(id) => self.ids.push(id),
            None => self.unmatchable = true,
        }
        self
    }

    /// Run the query.
    #[must_use]
    pub fn build(self) -> Vec<Entity> {
        if self.unmatchable {
            return Vec::new();
        }
        self.store.query_ids(&self.ids)
    }
}

impl core::fmt::Debug for QueryBuilder<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("ids", &self.ids)
            .field("unmatchable", &self.unmatchable)
            .finish()
    }
}

// ============================================================================
// Queryer - Read View For Systems
// ============================================================================

/// Read-only view of an [`EntityStore`] handed to systems.
#[derive(Clone, Copy)]
pub struct Queryer<'w> {
    store: &'w EntityStore,
}

impl<'w> Queryer<'w> {
    /// Wrap a store.
    #[must_use]
    pub const fn new(store: &'w EntityStore) -> Self {
        Self { store }
    }

    /// Entities carrying every component type in `Q`.
    #[must_use]
    pub fn query<Q: Query>(&self) -> Vec<Entity> {
        self.store.query::<Q>()
    }

    /// Start a runtime-composed query.
    #[must_use]
    pub fn builder(&self) -> QueryBuilder<'w> {
        QueryBuilder::new(self.store)
    }

    /// Check if an entity carries `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.store.has::<T>(entity)
    }

    /// Get a component of an entity.
    pub fn get<T: Component>(&self, entity: Entity) -> EcsResult<&'w T> {
        self.store.get::<T>(entity)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.store.contains(entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.store.entity_count()
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &'w EntityStore {
        self.store
    }
}

impl core::fmt::Debug for Queryer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Queryer")
            .field("entity_count", &self.store.entity_count())
            .finish()
    }
}
