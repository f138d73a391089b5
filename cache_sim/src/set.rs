//! A single set of a set-associative cache and the LRU bookkeeping for it.

use serde::Serialize;

/// one resident line. Presence in a slot is what makes a line valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheLine {
    tag: u32,
    dirty: bool,
    age: u64,
}

impl CacheLine {
    /// freshly allocated line, most recently used.
    pub fn new(tag: u32) -> Self {
        Self {
            tag,
            dirty: false,
            age: 0,
        }
    }
    pub fn tag(&self) -> u32 {
        self.tag
    }
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
    pub fn age(&self) -> u64 {
        self.age
    }
    pub fn set_dirty(&mut self) {
        self.dirty = true
    }
    pub fn add_age(&mut self) {
        self.age += 1
    }
    pub fn reset_age(&mut self) {
        self.age = 0
    }
}

/// Fixed number of slots sharing one index. A slot holds `None` until a
/// line is allocated into it; slots are never emptied afterwards.
#[derive(Debug, Clone)]
pub struct CacheSet {
    slots: Box<[Option<CacheLine>]>,
}

impl CacheSet {
    pub fn new(associativity: usize) -> Self {
        Self {
            slots: vec![None; associativity].into_boxed_slice(),
        }
    }

    pub fn associativity(&self) -> usize {
        self.slots.len()
    }

    /// slot of the valid line tagged `tag`.
    pub fn find_line(&self, tag: u32) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| matches!(s, Some(line) if line.tag == tag))
    }

    /// makes every valid line one access older.
    pub fn age_all(&mut self) {
        for line in self.slots.iter_mut().flatten() {
            line.add_age();
        }
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// places `line` in the first invalid slot. `false` if the set is full.
    pub fn insert_first_free(&mut self, line: CacheLine) -> bool {
        match self.slots.iter_mut().find(|s| s.is_none()) {
            Some(slot) => {
                *slot = Some(line);
                true
            }
            None => false,
        }
    }

    /// valid slot with the strictly greatest age; the lowest slot wins ties.
    ///
    /// # Panics
    /// if no slot is valid. Callers only evict from a full set.
    pub fn oldest_valid_slot(&self) -> usize {
        let mut oldest: Option<(usize, u64)> = None;
        for (i, line) in self.slots.iter().enumerate() {
            let Some(line) = line else {
                continue;
            };
            match oldest {
                Some((_, age)) if line.age <= age => {}
                _ => oldest = Some((i, line.age)),
            }
        }
        match oldest {
            Some((i, _)) => i,
            None => panic!("oldest_valid_slot called on a set without valid lines"),
        }
    }

    /// overwrites `slot`, returning the line that was there.
    pub fn replace(&mut self, slot: usize, line: CacheLine) -> Option<CacheLine> {
        self.slots[slot].replace(line)
    }

    pub fn line(&self, slot: usize) -> Option<&CacheLine> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn line_mut(&mut self, slot: usize) -> Option<&mut CacheLine> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// `(slot, line)` for every valid slot, in slot order.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &CacheLine)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|line| (i, line)))
    }

    pub fn num_valid(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
