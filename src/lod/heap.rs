//! Indexed binary min-heap.
//!
//! The simplifier needs to reprioritize and drop arbitrary live edges while
//! collapsing, so this heap keeps a per-id slot cache: `update` and `remove`
//! are O(log n) with no linear scan.

/// Sentinel slot for ids not currently in the heap.
const ABSENT: usize = usize::MAX;

/// Min-heap over dense ids `0..capacity`, keyed by an `f32` cost.
#[derive(Debug, Clone)]
pub struct IndexedHeap {
    /// `(cost, id)` entries in heap order.
    entries: Vec<(f32, usize)>,
    /// id -> heap slot.
    slots: Vec<usize>,
}

impl IndexedHeap {
    #[must_use]
    pub fn with_capacity(ids: usize) -> Self {
        Self {
            entries: Vec::with_capacity(ids),
            slots: vec![ABSENT; ids],
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: usize) -> bool {
        self.slots[id] != ABSENT
    }

    /// Minimum entry as `(cost, id)` without removing it.
    #[inline]
    #[must_use]
    pub fn peek(&self) -> Option<(f32, usize)> {
        self.entries.first().copied()
    }

    pub fn push(&mut self, id: usize, cost: f32) {
        debug_assert!(!self.contains(id), "id already queued");
        let slot = self.entries.len();
        self.entries.push((cost, id));
        self.slots[id] = slot;
        self.sift_up(slot);
    }

    pub fn pop(&mut self) -> Option<(f32, usize)> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        self.sync_slot(0);
        let (cost, id) = self.entries.pop().expect("non-empty");
        self.slots[id] = ABSENT;
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Some((cost, id))
    }

    /// Changes the cost of a live entry (or inserts it when absent) and
    /// restores heap order.
    pub fn update(&mut self, id: usize, cost: f32) {
        let slot = self.slots[id];
        if slot == ABSENT {
            self.push(id, cost);
            return;
        }
        self.entries[slot].0 = cost;
        let slot = self.sift_up(slot);
        self.sift_down(slot);
    }

    /// Drops a live entry; a no-op when the id is not queued.
    pub fn remove(&mut self, id: usize) {
        let slot = self.slots[id];
        if slot == ABSENT {
            return;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(slot, last);
        self.entries.pop();
        self.slots[id] = ABSENT;
        if slot < self.entries.len() {
            self.sync_slot(slot);
            let slot = self.sift_up(slot);
            self.sift_down(slot);
        }
    }

    #[inline]
    fn sync_slot(&mut self, slot: usize) {
        let id = self.entries[slot].1;
        self.slots[id] = slot;
    }

    fn sift_up(&mut self, mut slot: usize) -> usize {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.entries[slot].0 >= self.entries[parent].0 {
                break;
            }
            self.entries.swap(slot, parent);
            self.sync_slot(slot);
            self.sync_slot(parent);
            slot = parent;
        }
        slot
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let left = slot * 2 + 1;
            if left >= self.entries.len() {
                break;
            }
            let right = left + 1;
            let mut smallest = left;
            if right < self.entries.len() && self.entries[right].0 < self.entries[left].0 {
                smallest = right;
            }
            if self.entries[slot].0 <= self.entries[smallest].0 {
                break;
            }
            self.entries.swap(slot, smallest);
            self.sync_slot(slot);
            self.sync_slot(smallest);
            slot = smallest;
        }
    }
}
