//! Tween arena, active registry and pools
//!
//! Records live in a generational [`SlotMap`]; [`TweenId`] handles stay
//! stable while the record is alive and stop resolving once it is released.
//! Top-level tweens additionally occupy one slot of a dense active array that
//! the tick walks by index. Slots are only ever cleared during an update and
//! closed up in a single compaction pass afterwards, so removing any number
//! of tweens costs one shift of the tail.
//!
//! Released records keep their payload allocations and wait in a pool bucket
//! keyed by [`PoolKey`] until a tween of the same shape is requested.

use crate::config::SchedulerConfig;
use crate::tween::{PoolKey, Tween, TweenId};
use crate::values::CodecId;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

/// Snapshot of registry occupancy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TweenCounts {
    /// Live leaf tweens, top-level or nested
    pub active_leaves: usize,
    /// Live sequences, top-level or nested
    pub active_sequences: usize,
    /// Leaf tweens waiting in the pool
    pub pooled_leaves: usize,
    /// Sequences waiting in the pool
    pub pooled_sequences: usize,
    /// Tweens currently held in the dense active array
    pub registered: usize,
}

impl TweenCounts {
    /// Live plus pooled leaf tweens
    pub fn total_leaves(&self) -> usize {
        self.active_leaves + self.pooled_leaves
    }

    /// Live plus pooled sequences
    pub fn total_sequences(&self) -> usize {
        self.active_sequences + self.pooled_sequences
    }
}

pub(crate) struct Registry {
    pub tweens: SlotMap<TweenId, Tween>,
    active: Vec<Option<TweenId>>,
    /// Lowest slot cleared since the last compaction
    compact_from: Option<usize>,
    kill_queue: Vec<TweenId>,
    leaf_pools: FxHashMap<CodecId, Vec<Tween>>,
    sequence_pool: Vec<Tween>,
    live_leaves: usize,
    live_sequences: usize,
    max_leaves: usize,
    max_sequences: usize,
    capacity_warned: bool,
    next_instance: u64,
}

impl Registry {
    pub fn new(max_leaves: usize, max_sequences: usize) -> Self {
        Self {
            tweens: SlotMap::with_capacity_and_key(max_leaves + max_sequences),
            active: Vec::with_capacity(max_leaves + max_sequences),
            compact_from: None,
            kill_queue: Vec::new(),
            leaf_pools: FxHashMap::default(),
            sequence_pool: Vec::new(),
            live_leaves: 0,
            live_sequences: 0,
            max_leaves,
            max_sequences,
            capacity_warned: false,
            next_instance: 0,
        }
    }

    // ========================================================================
    // Acquire / register
    // ========================================================================

    /// Pop a pooled record of the given shape, if any
    pub fn take_pooled(&mut self, key: PoolKey) -> Option<Tween> {
        match key {
            PoolKey::Leaf(codec) => self.leaf_pools.get_mut(&codec)?.pop(),
            PoolKey::Sequence => self.sequence_pool.pop(),
        }
    }

    /// Allocate a serial for a brand new record, growing capacity if needed
    pub fn next_instance(&mut self, key: PoolKey) -> u64 {
        let counts = self.counts();
        let over = match key {
            PoolKey::Leaf(_) => counts.total_leaves() >= self.max_leaves,
            PoolKey::Sequence => counts.total_sequences() >= self.max_sequences,
        };
        if over {
            if !self.capacity_warned {
                tracing::warn!(
                    "Tween capacity exceeded ({} leaves, {} sequences), growing automatically. \
                     Raise SchedulerConfig capacities to avoid this",
                    self.max_leaves,
                    self.max_sequences
                );
                self.capacity_warned = true;
            }
            match key {
                PoolKey::Leaf(_) => self.max_leaves = (self.max_leaves * 2).max(1),
                PoolKey::Sequence => self.max_sequences = (self.max_sequences * 2).max(1),
            }
            self.reserve();
        }

        let instance = self.next_instance;
        self.next_instance += 1;
        instance
    }

    /// Insert a live record and append it to the active array
    pub fn register(&mut self, mut tween: Tween) -> TweenId {
        if tween.is_sequence() {
            self.live_sequences += 1;
        } else {
            self.live_leaves += 1;
        }
        tween.active = true;
        tween.active_slot = Some(self.active.len());
        let id = self.tweens.insert(tween);
        self.active.push(Some(id));
        id
    }

    /// Take a live tween out of the active array, keeping it alive.
    /// Used when a tween is nested into a sequence.
    pub fn unregister(&mut self, id: TweenId) {
        let Some(tween) = self.tweens.get_mut(id) else {
            return;
        };
        if let Some(slot) = tween.active_slot.take() {
            self.clear_slot(slot);
        }
    }

    fn clear_slot(&mut self, slot: usize) {
        if let Some(entry) = self.active.get_mut(slot) {
            *entry = None;
            self.compact_from = Some(self.compact_from.map_or(slot, |from| from.min(slot)));
        }
    }

    // ========================================================================
    // Deferred removal
    // ========================================================================

    /// Flag a tween for removal at the end of the current update
    pub fn mark_for_killing(&mut self, id: TweenId) {
        let Some(tween) = self.tweens.get_mut(id) else {
            return;
        };
        tween.active = false;
        if !tween.kill_queued {
            tween.kill_queued = true;
            self.kill_queue.push(id);
        }
    }

    pub fn pop_kill(&mut self) -> Option<TweenId> {
        self.kill_queue.pop()
    }

    pub fn has_pending_kills(&self) -> bool {
        !self.kill_queue.is_empty()
    }

    /// Remove a record from the arena and its active slot
    pub fn remove(&mut self, id: TweenId) -> Option<Tween> {
        let tween = self.tweens.remove(id)?;
        if let Some(slot) = tween.active_slot {
            self.clear_slot(slot);
        }
        if tween.is_sequence() {
            self.live_sequences -= 1;
        } else {
            self.live_leaves -= 1;
        }
        Some(tween)
    }

    /// Reset a removed record and pool it, or drop it if it is not recyclable
    pub fn release(&mut self, mut tween: Tween, config: &SchedulerConfig) {
        let recyclable = tween.recyclable;
        tween.reset(config);
        if !recyclable {
            return;
        }
        match tween.pool_key() {
            PoolKey::Leaf(codec) => self.leaf_pools.entry(codec).or_default().push(tween),
            PoolKey::Sequence => self.sequence_pool.push(tween),
        }
    }

    /// Close the gaps left by cleared slots, in one pass over the tail
    pub fn compact(&mut self) {
        let Some(from) = self.compact_from.take() else {
            return;
        };
        let mut write = from;
        for read in from..self.active.len() {
            let Some(id) = self.active[read] else {
                continue;
            };
            if let Some(tween) = self.tweens.get_mut(id) {
                tween.active_slot = Some(write);
                self.active[write] = Some(id);
                write += 1;
            }
        }
        self.active.truncate(write);
    }

    // ========================================================================
    // Active array access
    // ========================================================================

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn active_at(&self, slot: usize) -> Option<TweenId> {
        self.active.get(slot).copied().flatten()
    }

    /// Snapshot of the registered ids, in slot order
    #[cfg(test)]
    pub fn active_ids(&self) -> Vec<TweenId> {
        self.active.iter().flatten().copied().collect()
    }

    pub fn has_active(&self) -> bool {
        self.live_leaves + self.live_sequences > 0
    }

    // ========================================================================
    // Capacity
    // ========================================================================

    pub fn counts(&self) -> TweenCounts {
        TweenCounts {
            active_leaves: self.live_leaves,
            active_sequences: self.live_sequences,
            pooled_leaves: self.leaf_pools.values().map(Vec::len).sum(),
            pooled_sequences: self.sequence_pool.len(),
            registered: self.active.iter().filter(|slot| slot.is_some()).count(),
        }
    }

    pub fn set_capacity(&mut self, max_leaves: usize, max_sequences: usize) {
        self.max_leaves = max_leaves;
        self.max_sequences = max_sequences;
        self.capacity_warned = false;
        self.reserve();
        tracing::debug!("Tween capacity set to {} leaves, {} sequences", max_leaves, max_sequences);
    }

    pub fn capacity(&self) -> (usize, usize) {
        (self.max_leaves, self.max_sequences)
    }

    fn reserve(&mut self) {
        let wanted = self.max_leaves + self.max_sequences;
        self.active.reserve(wanted.saturating_sub(self.active.len()));
        self.tweens.reserve(wanted.saturating_sub(self.tweens.len()));
    }

    /// Drop every pooled record
    pub fn purge_pools(&mut self) -> usize {
        let purged = self.leaf_pools.values().map(Vec::len).sum::<usize>() + self.sequence_pool.len();
        self.leaf_pools.clear();
        self.sequence_pool.clear();
        if purged > 0 {
            tracing::debug!("Purged {} pooled tweens", purged);
        }
        purged
    }
}
