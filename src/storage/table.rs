//! Id-indexed record storage and its capacity growth schedule.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use super::free_index::FreeIndexList;
use crate::error::{GraphError, Result};

/// Largest capacity an element table can be grown to.
pub const MAX_CAPACITY: usize = u32::MAX as usize - 1;

/// Capacity growth schedule used when a table runs out of free ids.
///
/// Only amortised cost depends on these values; any schedule that strictly
/// grows is correct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthPolicy {
    /// Capacities below this are doubled.
    pub double_below: usize,
    /// Increment applied between `double_below` and `mid_limit`.
    pub mid_step: usize,
    /// Capacity at which the mid tier ends.
    pub mid_limit: usize,
    /// Increment applied at or above `mid_limit`.
    pub high_step: usize,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self {
            double_below: 256 * 1024,
            mid_step: 256 * 1024,
            mid_limit: 1024 * 1024,
            high_step: 128 * 1024,
        }
    }
}

impl GrowthPolicy {
    /// Next capacity after `current`; always strictly larger.
    pub fn next_capacity(&self, current: usize) -> usize {
        let next = if current < self.double_below {
            current.saturating_mul(2)
        } else if current < self.mid_limit {
            current.saturating_add(self.mid_step)
        } else {
            current.saturating_add(self.high_step)
        };
        next.max(current + 1).min(MAX_CAPACITY.max(current + 1))
    }
}

/// Dense slot array indexed by id, with id assignment through a
/// [`FreeIndexList`]. Slot 0 is permanently vacant.
#[derive(Debug)]
pub struct ElementTable<T> {
    slots: Vec<Option<T>>,
    ids: FreeIndexList,
    /// Slots filled by [`Self::place`] since the last [`Self::rebuild_ids`].
    placed: usize,
    kind: &'static str,
}

impl<T> ElementTable<T> {
    /// Empty table with ids `1..=capacity`. `kind` names records in panic messages.
    pub fn with_capacity(kind: &'static str, capacity: usize) -> Result<Self> {
        if capacity > MAX_CAPACITY {
            return Err(GraphError::InvalidCapacity {
                requested: capacity,
                current: 0,
            });
        }
        let mut slots = Vec::with_capacity(capacity + 1);
        slots.resize_with(capacity + 1, || None);
        Ok(Self {
            slots,
            ids: FreeIndexList::new(capacity),
            placed: 0,
            kind,
        })
    }

    /// Highest id the table can hold.
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// Number of live slots, including ones placed but not yet indexed.
    pub fn len(&self) -> usize {
        self.ids.used() + self.placed
    }

    /// Whether no slot is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The id allocation list.
    pub fn ids(&self) -> &FreeIndexList {
        &self.ids
    }

    /// Forwards to [`FreeIndexList::set_validating`].
    pub fn set_validating(&mut self, enabled: bool) {
        self.ids.set_validating(enabled);
    }

    /// Whether `id` holds a record.
    pub fn contains(&self, id: u32) -> bool {
        matches!(self.slots.get(id as usize), Some(Some(_)))
    }

    /// Record at `id`, if live.
    pub fn get(&self, id: u32) -> Option<&T> {
        self.slots.get(id as usize)?.as_ref()
    }

    /// Mutable record at `id`, if live.
    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.slots.get_mut(id as usize)?.as_mut()
    }

    /// Reserves the smallest free id, or `None` if the table is full.
    pub fn allocate(&mut self) -> Option<u32> {
        match self.ids.allocate_index() {
            0 => None,
            id => Some(id),
        }
    }

    /// Stores `value` in a slot previously returned by [`Self::allocate`].
    pub fn fill(&mut self, id: u32, value: T) {
        let slot = &mut self.slots[id as usize];
        debug_assert!(slot.is_none(), "{} slot {id} already occupied", self.kind);
        *slot = Some(value);
    }

    /// Vacates a live slot and releases its id.
    pub fn release(&mut self, id: u32) -> T {
        let value = self.slots[id as usize].take();
        match value {
            Some(value) => {
                self.ids.free_index(id);
                value
            }
            None => panic!("{} {id} is not live", self.kind),
        }
    }

    /// Stores `value` at an externally chosen id without touching the id
    /// list. Used in loading mode; call [`Self::rebuild_ids`] afterwards.
    pub fn place(&mut self, id: u32, value: T) {
        debug_assert!(id > 0, "{} id 0 is reserved", self.kind);
        let slot = &mut self.slots[id as usize];
        debug_assert!(slot.is_none(), "{} slot {id} already occupied", self.kind);
        *slot = Some(value);
        self.placed += 1;
    }

    /// Recomputes the id list from slot occupancy.
    pub fn rebuild_ids(&mut self) {
        self.ids.reinitialize(&self.slots);
        self.placed = 0;
    }

    /// Grows the table to `new_capacity` slots, keeping every id.
    pub fn expand(&mut self, new_capacity: usize) -> Result<()> {
        let current = self.capacity();
        if new_capacity <= current || new_capacity > MAX_CAPACITY {
            return Err(GraphError::InvalidCapacity {
                requested: new_capacity,
                current,
            });
        }
        self.slots.resize_with(new_capacity + 1, || None);
        self.ids.expand_by(new_capacity - current);
        Ok(())
    }

    /// Moves the element at `from` into the vacant id `to`.
    ///
    /// Only used while defragmenting: the caller has already freed `from` and
    /// allocated `to` in the id list.
    pub(crate) fn relocate(&mut self, from: u32, to: u32) {
        let value = self.slots[from as usize].take();
        debug_assert!(value.is_some(), "{} {from} is not live", self.kind);
        debug_assert!(self.slots[to as usize].is_none(), "{} slot {to} occupied", self.kind);
        self.slots[to as usize] = value;
    }

    /// Freeing the highest used id and reallocating the lowest free one, for
    /// defragmentation. Returns `(from, to)` or `None` once packed.
    pub(crate) fn next_compaction_move(&mut self) -> Option<(u32, u32)> {
        if !self.ids.is_fragmented() {
            return None;
        }
        let from = self.ids.highest_used()?;
        self.ids.free_index(from);
        let to = self.ids.allocate_index();
        debug_assert!(to != 0 && to < from, "compaction must move downward");
        Some((from, to))
    }

    /// Drops every slot past the live count. Requires an unfragmented table.
    pub(crate) fn shrink_to_live(&mut self) {
        debug_assert!(!self.ids.is_fragmented(), "shrinking a fragmented table");
        let live = self.len();
        self.slots.truncate(live + 1);
        self.slots.shrink_to_fit();
        self.ids.reset_packed(live);
    }

    /// Ids of live slots in ascending order.
    pub fn live_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, slot)| slot.is_some())
            .map(|(id, _)| id as u32)
    }
}

impl<T> Index<u32> for ElementTable<T> {
    type Output = T;

    fn index(&self, id: u32) -> &T {
        match self.slots.get(id as usize) {
            Some(Some(value)) => value,
            _ => panic!("{} {id} is not live", self.kind),
        }
    }
}

impl<T> IndexMut<u32> for ElementTable<T> {
    fn index_mut(&mut self, id: u32) -> &mut T {
        let kind = self.kind;
        match self.slots.get_mut(id as usize) {
            Some(Some(value)) => value,
            _ => panic!("{kind} {id} is not live"),
        }
    }
}
