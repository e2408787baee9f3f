//! Object pool with a free list.
//!
//! A [`Pool`] hands out slots for values of one type. Released slots go onto a
//! free list and are reused by later acquisitions; the pool never shrinks.
//! Reused slots keep whatever value they last held until overwritten.

use std::fmt;

use crate::{
    error::{EcsError, EcsResult},
    sparse_set::SparseSet,
};

/// Handle to a slot in a [`Pool`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotHandle(u32);

impl SlotHandle {
    /// Create a handle from a raw slot index.
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw slot index.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for SlotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotHandle({})", self.0)
    }
}

/// A growable arena of `T` slots with slot reuse.
///
/// # Example
///
/// ```
/// use tessera_ecs::Pool;
///
/// let mut pool: Pool<u32> = Pool::default();
///
/// let handle = pool.acquire_with(42);
/// pool.release(handle).unwrap();
///
/// // The cached slot is reused, capacity does not grow.
/// let again = pool.acquire().unwrap();
/// assert_eq!(again, handle);
/// assert_eq!(pool.capacity(), 1);
/// ```
pub struct Pool<T> {
    /// Every slot ever constructed.
    slots: Vec<T>,
    /// Indices of slots currently handed out.
    live: SparseSet<u32>,
    /// Indices of cached slots, most recently released last.
    free: Vec<u32>,
    /// Builds the value for a brand new slot.
    factory: Option<fn() -> T>,
}

impl<T: Default> Default for Pool<T> {
    fn default() -> Self {
        Self::with_factory(T::default)
    }
}

impl<T> Pool<T> {
    /// Create a pool without a factory.
    ///
    /// Such a pool only grows through [`Pool::acquire_with`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: SparseSet::new(),
            free: Vec::new(),
            factory: None,
        }
    }

    /// Create a pool whose fresh slots are built by `factory`.
    #[must_use]
    pub const fn with_factory(factory: fn() -> T) -> Self {
        Self {
            slots: Vec::new(),
            live: SparseSet::new(),
            free: Vec::new(),
            factory: Some(factory),
        }
    }

    /// Acquire a slot.
    ///
    /// Returns a cached slot if one is available (its previous value is left
    /// in place), otherwise constructs a new slot with the factory. Returns
    /// `None` when there is no cached slot and the pool has no factory.
    ///
    /// # Panics
    ///
    /// Panics if the pool already holds `u32::MAX` slots.
    pub fn acquire(&mut self) -> Option<SlotHandle> {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let value = (self.factory?)();
                self.push_slot(value)
            }
        };

        self.live.add(index);
        Some(SlotHandle(index))
    }

    /// Acquire a slot and store `value` in it.
    ///
    /// # Panics
    ///
    /// Panics if the pool already holds `u32::MAX` slots.
    pub fn acquire_with(&mut self, value: T) -> SlotHandle {
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = value;
                index
            }
            None => self.push_slot(value),
        };

        self.live.add(index);
        SlotHandle(index)
    }

    /// Return a slot to the free list.
    ///
    /// Fails with [`EcsError::InvalidHandle`] if the handle is not live in
    /// this pool.
    pub fn release(&mut self, handle: SlotHandle) -> EcsResult<()> {
        if !self.live.remove(handle.0) {
            return Err(EcsError::InvalidHandle { handle });
        }

        self.free.push(handle.0);
        Ok(())
    }

    /// Get a live slot's value.
    #[must_use]
    pub fn get(&self, handle: SlotHandle) -> Option<&T> {
        if !self.live.contains(handle.0) {
            return None;
        }
        self.slots.get(handle.0 as usize)
    }

    /// Get a live slot's value mutably.
    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        if !self.live.contains(handle.0) {
            return None;
        }
        self.slots.get_mut(handle.0 as usize)
    }

    /// Check if a handle refers to a live slot.
    #[must_use]
    pub fn is_live(&self, handle: SlotHandle) -> bool {
        self.live.contains(handle.0)
    }

    /// Number of slots ever constructed (live + cached).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently handed out.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of cached slots waiting for reuse.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.free.len()
    }

    /// Iterate over live slots.
    pub fn iter(&self) -> impl Iterator<Item = (SlotHandle, &T)> {
        self.live
            .iter()
            .map(|&index| (SlotHandle(index), &self.slots[index as usize]))
    }

    fn push_slot(&mut self, value: T) -> u32 {
        let index = u32::try_from(self.slots.len())
            .ok()
            .filter(|&index| index != u32::MAX)
            .unwrap_or_else(|| panic!("pool slot space exhausted"));
        self.slots.push(value);
        index
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("type", &std::any::type_name::<T>())
            .field("live", &self.live.len())
            .field("cached", &self.free.len())
            .finish()
    }
}
