//! Paged sparse sets.
//!
//! A sparse set maps integer ids to positions in a dense, gap-free array.
//! Membership, insertion and removal are O(1); iteration walks the dense
//! array directly.
//!
//! The sparse side is split into pages of `PAGE_SIZE` slots. A page is only
//! allocated once an id falling into it is added, so a handful of large ids
//! does not force one slot per possible id value.
//!
//! Removal swaps the last dense element into the hole, so iteration order is
//! insertion order only until the first removal.

use std::{fmt, slice};

use crate::entity::Entity;

/// Default number of slots per sparse page.
pub const DEFAULT_PAGE_SIZE: usize = 32;

/// Integer-like ids usable as sparse set keys.
///
/// [`SparseIndex::ABSENT`] marks empty sparse slots. It is reserved: it can
/// never be stored in a set.
pub trait SparseIndex: Copy + Eq + fmt::Debug {
    /// Marker for "no dense position". The type's maximum value.
    const ABSENT: Self;

    /// Convert to a `usize` index.
    fn to_index(self) -> usize;

    /// Convert from a `usize` index.
    fn from_index(index: usize) -> Self;
}

macro_rules! impl_sparse_index {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SparseIndex for $ty {
                const ABSENT: Self = <$ty>::MAX;

                #[inline]
                fn to_index(self) -> usize {
                    self as usize
                }

                #[inline]
                fn from_index(index: usize) -> Self {
                    index as $ty
                }
            }
        )*
    };
}

impl_sparse_index!(u16, u32, u64, usize);

impl SparseIndex for Entity {
    const ABSENT: Self = Entity::from_raw(Entity::RESERVED);

    #[inline]
    fn to_index(self) -> usize {
        self.id() as usize
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        Entity::from_raw(index as u32)
    }
}

type Page<I, const PAGE_SIZE: usize> = Box<[I; PAGE_SIZE]>;

/// A paged sparse set of ids.
///
/// Invariant: `dense[sparse[id]] == id` for every present id, and `dense`
/// holds no gaps and no duplicates.
///
/// `PAGE_SIZE` must be non-zero:
///
/// ```compile_fail
/// let set = tessera_ecs::SparseSet::<u32, 0>::new();
/// ```
pub struct SparseSet<I: SparseIndex, const PAGE_SIZE: usize = DEFAULT_PAGE_SIZE> {
    /// Present ids, packed.
    dense: Vec<I>,
    /// Dense position per id, `ABSENT` when missing. Pages allocated on demand.
    sparse: Vec<Option<Page<I, PAGE_SIZE>>>,
}

impl<I: SparseIndex, const PAGE_SIZE: usize> Default for SparseSet<I, PAGE_SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: SparseIndex, const PAGE_SIZE: usize> SparseSet<I, PAGE_SIZE> {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        const { assert!(PAGE_SIZE > 0, "sparse set page size must be non-zero") };
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
        }
    }

    /// Create an empty set with room for `capacity` dense entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut set = Self::new();
        set.dense.reserve_exact(capacity);
        set
    }

    /// Add an id. Returns `false` if it was already present.
    ///
    /// # Panics
    ///
    /// Panics if `id` is [`SparseIndex::ABSENT`].
    pub fn add(&mut self, id: I) -> bool {
        assert_ne!(id, I::ABSENT, "reserved sparse index used as an id");

        if self.contains(id) {
            return false;
        }

        let position = I::from_index(self.dense.len());
        self.dense.push(id);
        *self.assure(id) = position;
        true
    }

    /// Remove an id. Returns `false` if it was not present.
    pub fn remove(&mut self, id: I) -> bool {
        let Some(position) = self.index_of(id) else {
            return false;
        };

        let last = self.dense.len() - 1;
        if position != last {
            let moved = self.dense[last];
            self.dense.swap(position, last);
            *self.assure(moved) = I::from_index(position);
        }

        self.dense.pop();
        *self.assure(id) = I::ABSENT;
        true
    }

    /// Check whether an id is present.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: I) -> bool {
        self.index_of(id).is_some()
    }

    /// Dense position of an id, if present.
    #[must_use]
    pub fn index_of(&self, id: I) -> Option<usize> {
        if id == I::ABSENT {
            return None;
        }

        let index = id.to_index();
        let page = self.sparse.get(index / PAGE_SIZE)?.as_ref()?;
        let position = page[index % PAGE_SIZE];

        (position != I::ABSENT).then(|| position.to_index())
    }

    /// Number of present ids.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Check if the set is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// The dense sequence of present ids.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[I] {
        &self.dense
    }

    /// Iterate over present ids in dense order.
    pub fn iter(&self) -> slice::Iter<'_, I> {
        self.dense.iter()
    }

    /// Number of sparse pages currently allocated.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.sparse.iter().filter(|page| page.is_some()).count()
    }

    /// Remove every id and release all pages.
    pub fn clear(&mut self) {
        self.dense.clear();
        self.sparse.clear();
    }

    /// Sparse slot for `id`, allocating its page if needed.
    fn assure(&mut self, id: I) -> &mut I {
        let index = id.to_index();
        let page = index / PAGE_SIZE;

        if page >= self.sparse.len() {
            self.sparse.resize_with(page + 1, || None);
        }

        let page = self.sparse[page].get_or_insert_with(|| Box::new([I::ABSENT; PAGE_SIZE]));
        &mut page[index % PAGE_SIZE]
    }
}

impl<'a, I: SparseIndex, const PAGE_SIZE: usize> IntoIterator for &'a SparseSet<I, PAGE_SIZE> {
    type Item = &'a I;
    type IntoIter = slice::Iter<'a, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<I: SparseIndex, const PAGE_SIZE: usize> fmt::Debug for SparseSet<I, PAGE_SIZE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseSet")
            .field("dense", &self.dense)
            .field("pages", &self.page_count())
            .finish()
    }
}
