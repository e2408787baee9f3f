//! Entity identifiers.
//!
//! Entities are plain monotonically increasing integers. An id is never
//! handed out twice by the same allocator, so a destroyed entity can never
//! resolve to live components again.

use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

/// Raw entity index.
pub type EntityId = u32;

/// A unique identifier for an entity in a world.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(EntityId);

impl Entity {
    /// Reserved raw value. Used as the "absent" marker by sparse sets and
    /// therefore never issued by an [`EntityAllocator`].
    pub const RESERVED: EntityId = EntityId::MAX;

    /// Create an entity from a raw id.
    #[must_use]
    pub const fn from_raw(id: EntityId) -> Self {
        Self(id)
    }

    /// Get the raw id.
    #[must_use]
    pub const fn id(self) -> EntityId {
        self.0
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic entity id source.
///
/// Reservation only needs a shared reference so that command buffers can
/// hand out ids while systems hold read views of the world.
#[derive(Default)]
pub struct EntityAllocator {
    next: AtomicU32,
}

impl EntityAllocator {
    /// Create a new allocator starting at id 0.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(0),
        }
    }

    /// Reserve the next entity id.
    ///
    /// # Panics
    ///
    /// Panics once every id below [`Entity::RESERVED`] has been issued.
    pub fn reserve(&self) -> Entity {
        match self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| {
                (id < Entity::RESERVED).then(|| id + 1)
            }) {
            Ok(id) => Entity(id),
            Err(_) => panic!("entity id space exhausted"),
        }
    }

    /// Number of ids issued so far.
    #[must_use]
    pub fn reserved_count(&self) -> u32 {
        self.next.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for EntityAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityAllocator")
            .field("reserved", &self.reserved_count())
            .finish()
    }
}
