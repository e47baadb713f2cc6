//! Fixed-capacity object pool with a free-index stack.
//!
//! Slots are reused LIFO; every release bumps the slot generation so a
//! `Handle` taken before the release no longer resolves.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Clone, Debug)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    /// Free slot indices; the top is handed out next.
    free_list: Vec<usize>,
    active: usize,
}

impl<T> Pool<T> {
    /// Pre-allocates `capacity` empty slots. Slot 0 is handed out first.
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                generation: 0,
                value: None,
            })
            .collect();
        Self {
            slots,
            free_list: (0..capacity).rev().collect(),
            active: 0,
        }
    }

    /// Number of slots, free or not. Only grows.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Stores `value` in a free slot, growing the pool when none is left.
    /// The previous occupant is gone entirely.
    pub fn spawn(&mut self, value: T) -> Handle {
        let index = match self.free_list.pop() {
            Some(i) => i,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                log::debug!("pool grown to {} slots", self.slots.len());
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.value = Some(value);
        self.active += 1;
        Handle {
            index: index as u32,
            generation: slot.generation,
        }
    }

    /// Releases the slot behind `handle`. Stale or already released handles
    /// are ignored and return `None`.
    pub fn despawn(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index());
        self.active -= 1;
        Some(value)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value.as_ref().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.value.as_mut().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation,
                    },
                    v,
                )
            })
        })
    }

    /// Snapshot of live handles, for loops that despawn while walking.
    pub fn handles(&self) -> Vec<Handle> {
        self.iter().map(|(h, _)| h).collect()
    }

    /// Releases every live slot.
    pub fn clear(&mut self) {
        for handle in self.handles() {
            self.despawn(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_uses_preallocated_slots_first() {
        let mut pool: Pool<u32> = Pool::with_capacity(4);
        let a = pool.spawn(1);
        let b = pool.spawn(2);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(pool.active_count(), 2);
        assert_eq!(pool.capacity(), 4);
    }

    #[test]
    fn despawn_is_idempotent() {
        let mut pool: Pool<u32> = Pool::with_capacity(2);
        let a = pool.spawn(7);
        assert_eq!(pool.despawn(a), Some(7));
        assert_eq!(pool.despawn(a), None);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn released_slot_is_reused_with_new_generation() {
        let mut pool: Pool<u32> = Pool::with_capacity(2);
        let a = pool.spawn(7);
        pool.despawn(a);
        let b = pool.spawn(9);

        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(pool.get(a).is_none(), "stale handle must not resolve");
        assert_eq!(pool.get(b), Some(&9));
    }

    #[test]
    fn grows_when_exhausted() {
        let mut pool: Pool<u32> = Pool::with_capacity(1);
        pool.spawn(1);
        let b = pool.spawn(2);
        assert_eq!(pool.capacity(), 2);
        assert_eq!(b.index(), 1);
        assert_eq!(pool.active_count(), 2);
    }

    #[test]
    fn clear_releases_everything() {
        let mut pool: Pool<u32> = Pool::with_capacity(3);
        pool.spawn(1);
        pool.spawn(2);
        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.iter().count(), 0);
    }
}
