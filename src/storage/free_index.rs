//! Run-length encoded used/free bookkeeping over a dense id range `1..=N`.
//!
//! The range is stored as alternating signed run lengths: a negative entry is
//! a run of used ids, a positive entry is a run of free ids. Allocation always
//! hands out the smallest free id, which keeps live ids packed toward the
//! front and the run list short.

use std::fmt;

/// Tracks which ids in `1..=size` are in use.
///
/// Freeing an id that is not in use, or a range that crosses a run boundary,
/// is a precondition violation checked only by `debug_assert!`. Enable
/// [`FreeIndexList::set_validating`] to re-check every invariant after each
/// mutation.
#[derive(Clone, Default)]
pub struct FreeIndexList {
    runs: Vec<i64>,
    used: usize,
    free: usize,
    validating: bool,
}

impl FreeIndexList {
    /// Creates a list of `size` free ids.
    pub fn new(size: usize) -> Self {
        let mut runs = Vec::with_capacity(8);
        if size > 0 {
            runs.push(size as i64);
        }
        Self {
            runs,
            used: 0,
            free: size,
            validating: false,
        }
    }

    /// Re-checks the run invariants after every mutation while enabled.
    pub fn set_validating(&mut self, enabled: bool) {
        self.validating = enabled;
        self.validate();
    }

    /// Whether validating mode is on.
    pub fn is_validating(&self) -> bool {
        self.validating
    }

    /// Number of free ids.
    pub fn free(&self) -> usize {
        self.free
    }

    /// Number of used ids.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Total ids tracked, `used + free`.
    pub fn size(&self) -> usize {
        self.used + self.free
    }

    /// Signed run lengths, front to back.
    pub fn runs(&self) -> &[i64] {
        &self.runs
    }

    /// True unless the used ids form the single prefix `1..=used`.
    pub fn is_fragmented(&self) -> bool {
        self.runs.len() > 2 || (self.runs.len() == 2 && self.runs[0] > 0)
    }

    /// Returns the smallest free id, or 0 when every id is in use.
    pub fn allocate_index(&mut self) -> u32 {
        if self.free == 0 {
            return 0;
        }
        let id;
        if self.runs[0] > 0 {
            id = 1;
            if self.runs[0] == 1 {
                if self.runs.len() == 1 {
                    self.runs[0] = -1;
                } else {
                    self.runs[1] -= 1;
                    self.runs.remove(0);
                }
            } else {
                self.runs[0] -= 1;
                self.runs.insert(0, -1);
            }
        } else {
            debug_assert!(self.runs.len() >= 2, "free ids without a free run");
            id = (-self.runs[0] + 1) as u32;
            self.runs[0] -= 1;
            self.runs[1] -= 1;
            if self.runs[1] == 0 {
                if self.runs.len() > 2 {
                    self.runs[0] += self.runs[2];
                    self.runs.drain(1..3);
                } else {
                    self.runs.truncate(1);
                }
            }
        }
        self.used += 1;
        self.free -= 1;
        self.validate();
        id
    }

    /// Releases one used id.
    pub fn free_index(&mut self, id: u32) {
        self.free_range(id, 1);
    }

    /// Marks `id..id + len` free. The range must lie inside one used run.
    pub fn free_range(&mut self, id: u32, len: usize) {
        debug_assert!(id > 0, "id 0 is never allocated");
        debug_assert!(len > 0, "empty range");
        let id = u64::from(id);
        let len_i = len as i64;
        let (i, start) = self.locate(id);
        debug_assert!(self.runs[i] < 0, "freeing id {id} which is not in use");
        let end = start + self.runs[i].unsigned_abs();
        debug_assert!(
            id + len as u64 <= end,
            "range {id}+{len} crosses the end of its used run"
        );
        let at_start = id == start;
        let at_end = id + len as u64 == end;
        match (at_start, at_end) {
            (true, true) => {
                let has_prev = i > 0;
                let has_next = i + 1 < self.runs.len();
                match (has_prev, has_next) {
                    (true, true) => {
                        self.runs[i - 1] += len_i + self.runs[i + 1];
                        self.runs.drain(i..i + 2);
                    }
                    (true, false) => {
                        self.runs[i - 1] += len_i;
                        self.runs.remove(i);
                    }
                    (false, true) => {
                        self.runs[i + 1] += len_i;
                        self.runs.remove(i);
                    }
                    (false, false) => self.runs[i] = len_i,
                }
            }
            (true, false) => {
                self.runs[i] += len_i;
                if i > 0 {
                    self.runs[i - 1] += len_i;
                } else {
                    self.runs.insert(0, len_i);
                }
            }
            (false, true) => {
                self.runs[i] += len_i;
                if i + 1 < self.runs.len() {
                    self.runs[i + 1] += len_i;
                } else {
                    self.runs.push(len_i);
                }
            }
            (false, false) => {
                let before = (id - start) as i64;
                let after = (end - id) as i64 - len_i;
                self.runs[i] = -before;
                self.runs.insert(i + 1, len_i);
                self.runs.insert(i + 2, -after);
            }
        }
        self.used -= len;
        self.free += len;
        self.validate();
    }

    /// Appends `n` free ids past the current maximum.
    pub fn expand_by(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if *last > 0 => *last += n as i64,
            _ => self.runs.push(n as i64),
        }
        self.free += n;
        self.validate();
    }

    /// Rebuilds the runs from a slot array indexed by id. Slot 0 is ignored and
    /// `None` marks a free id.
    pub fn reinitialize<T>(&mut self, slots: &[Option<T>]) {
        self.runs.clear();
        self.used = 0;
        self.free = 0;
        for slot in slots.iter().skip(1) {
            let used = slot.is_some();
            match self.runs.last_mut() {
                Some(last) if used && *last < 0 => *last -= 1,
                Some(last) if !used && *last > 0 => *last += 1,
                _ => self.runs.push(if used { -1 } else { 1 }),
            }
            if used {
                self.used += 1;
            } else {
                self.free += 1;
            }
        }
        self.validate();
    }

    /// Resets to exactly `used` ids, all in use, with no free tail.
    pub fn reset_packed(&mut self, used: usize) {
        self.runs.clear();
        if used > 0 {
            self.runs.push(-(used as i64));
        }
        self.used = used;
        self.free = 0;
        self.validate();
    }

    /// Whether `id` is currently allocated.
    pub fn is_used(&self, id: u32) -> bool {
        let id = u64::from(id);
        if id == 0 || id > self.size() as u64 {
            return false;
        }
        let (i, _) = self.locate(id);
        self.runs[i] < 0
    }

    /// Highest id currently in use.
    pub fn highest_used(&self) -> Option<u32> {
        let last = *self.runs.last()?;
        if last < 0 {
            Some(self.size() as u32)
        } else if self.runs.len() >= 2 {
            Some((self.size() as i64 - last) as u32)
        } else {
            None
        }
    }

    /// Used ids in ascending order.
    pub fn iter_used(&self) -> impl Iterator<Item = u32> + '_ {
        let mut start = 1u64;
        self.runs.iter().flat_map(move |&run| {
            let len = run.unsigned_abs();
            let first = start;
            start += len;
            let range = if run < 0 { first..first + len } else { 0..0 };
            range.map(|id| id as u32)
        })
    }

    /// Checks the run-list invariants, describing the first one broken.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let mut used = 0usize;
        let mut free = 0usize;
        for (i, &run) in self.runs.iter().enumerate() {
            if run == 0 {
                return Err(format!("zero-length run at position {i}"));
            }
            if i > 0 && (run < 0) == (self.runs[i - 1] < 0) {
                return Err(format!("runs {} and {i} share a sign", i - 1));
            }
            if run < 0 {
                used += run.unsigned_abs() as usize;
            } else {
                free += run as usize;
            }
        }
        if used != self.used {
            return Err(format!("used counter {} but runs hold {used}", self.used));
        }
        if free != self.free {
            return Err(format!("free counter {} but runs hold {free}", self.free));
        }
        Ok(())
    }

    /// Run index containing `id` and the first id of that run.
    fn locate(&self, id: u64) -> (usize, u64) {
        let mut start = 1u64;
        for (i, &run) in self.runs.iter().enumerate() {
            let len = run.unsigned_abs();
            if id < start + len {
                return (i, start);
            }
            start += len;
        }
        panic!("id {id} is outside the managed range 1..={}", self.size());
    }

    fn validate(&self) {
        if self.validating {
            if let Err(msg) = self.check_invariants() {
                panic!("free index list corrupted: {msg} (runs {:?})", self.runs);
            }
        }
    }
}

impl fmt::Debug for FreeIndexList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreeIndexList")
            .field("used", &self.used)
            .field("free", &self.free)
            .field("runs", &self.runs)
            .finish()
    }
}
