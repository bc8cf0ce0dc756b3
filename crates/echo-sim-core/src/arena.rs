//! Generational slot arena: the substrate every entity handle is validated
//! against.
//!
//! Ordering invariant
//! - Freeing a slot is the only way its generation advances; the free index
//!   is pushed onto a LIFO free list so immediate reuse reuses the most
//!   recently freed slot first. This is an implementation detail, not an
//!   API guarantee — callers must not depend on *which* free index is
//!   returned by the next `allocate`.
//! - Validation (`is_valid`, `get`, `get_mut`) never panics; callers branch
//!   on the result instead.

use std::sync::Mutex;

use thiserror::Error;

use crate::ident::{first_generation, next_generation, Generation, Handle};

/// Errors surfaced by [`HandleArena`] operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArenaError {
    /// `allocate` was called on an arena already at its configured ceiling.
    #[error("arena is full (capacity {capacity})")]
    ArenaFull {
        /// The configured maximum capacity.
        capacity: usize,
    },
    /// `get`/`get_mut` was called with a handle whose generation no longer
    /// matches the slot's current occupant.
    #[error("stale handle: index {index} generation {supplied} (current generation {current})")]
    StaleHandle {
        /// Slot index named by the handle.
        index: u32,
        /// Generation carried by the handle.
        supplied: u32,
        /// Generation currently stored at that slot.
        current: u32,
    },
}

enum Slot<T> {
    Free { generation: Generation },
    Occupied { generation: Generation, value: T },
}

struct Inner<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    max_capacity: Option<usize>,
}

/// Allocates, validates, and frees fixed-size slots of one element type.
///
/// All mutating operations (`allocate`, `free`) and the accessor methods are
/// serialized by a single internal mutex, matching the "single mutator"
/// concurrency model used throughout this crate: validation is wait-free
/// once the lock is acquired, and there is never more than one arena-level
/// critical section in flight.
pub struct HandleArena<T> {
    inner: Mutex<Inner<T>>,
    on_spawn: Option<Box<dyn Fn(&mut T) + Send + Sync>>,
    on_despawn: Option<Box<dyn Fn(&mut T) + Send + Sync>>,
}

impl<T> HandleArena<T> {
    /// Creates an empty arena with no capacity ceiling; storage doubles on
    /// demand.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0, None)
    }

    /// Creates an arena pre-sized to `initial_capacity`, optionally bounded
    /// by `max_capacity`. Allocation past `max_capacity` yields
    /// [`ArenaError::ArenaFull`] instead of growing further.
    #[must_use]
    pub fn with_capacity(initial_capacity: usize, max_capacity: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: Vec::with_capacity(initial_capacity),
                free_list: Vec::new(),
                max_capacity,
            }),
            on_spawn: None,
            on_despawn: None,
        }
    }

    /// Registers a callback fired once, synchronously, every time a slot is
    /// allocated (including on growth-triggered first use of a fresh slot).
    #[must_use]
    pub fn with_on_spawn(mut self, f: impl Fn(&mut T) + Send + Sync + 'static) -> Self {
        self.on_spawn = Some(Box::new(f));
        self
    }

    /// Registers a callback fired once, synchronously, every time a slot is
    /// freed, before the slot's value is dropped.
    #[must_use]
    pub fn with_on_despawn(mut self, f: impl Fn(&mut T) + Send + Sync + 'static) -> Self {
        self.on_despawn = Some(Box::new(f));
        self
    }

    /// Allocates a slot for `value`, reusing the most recently freed index
    /// when the free list is non-empty, else growing storage by doubling
    /// (or allocating one slot from empty).
    ///
    /// # Errors
    /// Returns [`ArenaError::ArenaFull`] if a maximum capacity was configured
    /// and every slot up to that ceiling is occupied.
    pub fn allocate(&self, mut value: T) -> Result<Handle<T>, ArenaError> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(f) = &self.on_spawn {
            f(&mut value);
        }
        if let Some(index) = inner.free_list.pop() {
            let slot = &mut inner.slots[index as usize];
            let generation = match slot {
                Slot::Free { generation } => *generation,
                Slot::Occupied { .. } => unreachable!("free list index must name a free slot"),
            };
            *slot = Slot::Occupied { generation, value };
            return Ok(Handle::new(index, generation));
        }

        let len = inner.slots.len();
        if let Some(max) = inner.max_capacity {
            if len >= max {
                return Err(ArenaError::ArenaFull { capacity: max });
            }
        }
        let generation = first_generation();
        inner.slots.push(Slot::Occupied { generation, value });
        let index = u32::try_from(len).unwrap_or(u32::MAX);
        Ok(Handle::new(index, generation))
    }

    /// Frees the slot named by `handle` iff its generation still matches the
    /// slot's current occupant. On success the slot's generation advances
    /// (wrapping 0 → 1) and the value is reset (dropped) after
    /// `on_despawn` runs.
    ///
    /// Returns `false`, never an error, on a generation mismatch — a stale
    /// `free` is a no-op by design (§4.1: "treated as no-op").
    pub fn free(&self, handle: Handle<T>) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(slot) = inner.slots.get_mut(handle.index as usize) else {
            return false;
        };
        let Slot::Occupied { generation, .. } = slot else {
            return false;
        };
        if *generation != handle.generation {
            return false;
        }
        let next = next_generation(*generation);
        let mut taken = std::mem::replace(slot, Slot::Free { generation: next });
        if let Slot::Occupied { value, .. } = &mut taken {
            if let Some(f) = &self.on_despawn {
                f(value);
            }
        }
        inner.free_list.push(handle.index);
        true
    }

    /// Reports whether `handle` currently names an allocated slot.
    #[must_use]
    pub fn is_valid(&self, handle: Handle<T>) -> bool {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        matches!(
            inner.slots.get(handle.index as usize),
            Some(Slot::Occupied { generation, .. }) if *generation == handle.generation
        )
    }

    /// Runs `f` with a mutable reference to the value named by `handle`.
    ///
    /// # Errors
    /// Returns [`ArenaError::StaleHandle`] if the handle's generation does
    /// not match the slot's current occupant.
    pub fn with_mut<R>(&self, handle: Handle<T>, f: impl FnOnce(&mut T) -> R) -> Result<R, ArenaError> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let index = handle.index;
        let current = match inner.slots.get(index as usize) {
            Some(Slot::Occupied { generation, .. }) => generation.get(),
            Some(Slot::Free { generation }) => generation.get(),
            None => {
                return Err(ArenaError::StaleHandle {
                    index,
                    supplied: handle.generation.get(),
                    current: 0,
                })
            }
        };
        match inner.slots.get_mut(index as usize) {
            Some(Slot::Occupied { generation, value }) if *generation == handle.generation => {
                Ok(f(value))
            }
            _ => Err(ArenaError::StaleHandle {
                index,
                supplied: handle.generation.get(),
                current,
            }),
        }
    }

    /// Number of currently occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.slots.len() - inner.free_list.len()
    }

    /// Whether the arena currently holds no occupied slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for HandleArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn arena_reuse_bumps_generation() {
        let arena: HandleArena<u32> = HandleArena::new();
        let h0 = arena.allocate(10).unwrap();
        assert_eq!(h0.index(), 0);
        assert_eq!(h0.generation().get(), 1);

        assert!(arena.free(h0));
        assert!(!arena.is_valid(h0));

        let h1 = arena.allocate(20).unwrap();
        assert_eq!(h1.index(), 0);
        assert_eq!(h1.generation().get(), 2);
        assert!(!arena.is_valid(h0));
        assert!(arena.is_valid(h1));
    }

    #[test]
    fn free_on_mismatched_generation_is_noop() {
        let arena: HandleArena<u32> = HandleArena::new();
        let h0 = arena.allocate(1).unwrap();
        assert!(arena.free(h0));
        // h0 is now stale; freeing again must not touch the new occupant.
        assert!(!arena.free(h0));
    }

    #[test]
    fn capacity_ceiling_yields_arena_full() {
        let arena: HandleArena<u32> = HandleArena::with_capacity(1, Some(1));
        let _h0 = arena.allocate(1).unwrap();
        let err = arena.allocate(2).unwrap_err();
        assert_eq!(err, ArenaError::ArenaFull { capacity: 1 });
    }

    #[test]
    fn on_spawn_and_on_despawn_fire() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let spawns = Arc::new(AtomicUsize::new(0));
        let despawns = Arc::new(AtomicUsize::new(0));
        let spawns_cb = spawns.clone();
        let despawns_cb = despawns.clone();

        let arena: HandleArena<u32> = HandleArena::new()
            .with_on_spawn(move |_| {
                spawns_cb.fetch_add(1, Ordering::SeqCst);
            })
            .with_on_despawn(move |_| {
                despawns_cb.fetch_add(1, Ordering::SeqCst);
            });

        let h = arena.allocate(1).unwrap();
        assert_eq!(spawns.load(Ordering::SeqCst), 1);
        arena.free(h);
        assert_eq!(despawns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn with_mut_rejects_stale_handle() {
        let arena: HandleArena<u32> = HandleArena::new();
        let h = arena.allocate(1).unwrap();
        arena.free(h);
        let result = arena.with_mut(h, |v| *v += 1);
        assert!(result.is_err());
    }
}
