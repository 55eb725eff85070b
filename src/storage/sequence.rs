//! Intrusive doubly linked sequences over arena slots.
//!
//! A [`SeqAnchor`] holds the head, tail, length, and version of one sequence;
//! the prev/next links themselves live inside the element records and are
//! reached through [`LinkSlots`]. The global vertex and edge sequences and
//! every per-vertex incidence sequence are anchors over different slot views.

use std::cmp::Ordering;

/// Access to the prev/next links stored for each sequence member.
pub trait LinkSlots<K: Copy> {
    /// Predecessor of `key`.
    fn prev(&self, key: K) -> Option<K>;
    /// Successor of `key`.
    fn next(&self, key: K) -> Option<K>;
    /// Sets the predecessor of `key`.
    fn set_prev(&mut self, key: K, prev: Option<K>);
    /// Sets the successor of `key`.
    fn set_next(&mut self, key: K, next: Option<K>);
}

/// Head, tail, length, and structural version of one sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeqAnchor<K> {
    first: Option<K>,
    last: Option<K>,
    len: usize,
    version: u64,
}

impl<K> Default for SeqAnchor<K> {
    fn default() -> Self {
        Self {
            first: None,
            last: None,
            len: 0,
            version: 0,
        }
    }
}

impl<K: Copy + Eq> SeqAnchor<K> {
    /// Empty sequence at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Head of the sequence.
    pub fn first(&self) -> Option<K> {
        self.first
    }

    /// Tail of the sequence.
    pub fn last(&self) -> Option<K> {
        self.last
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the sequence has no members.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bumped by every change to membership or order.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump(&mut self) {
        self.version += 1;
    }

    /// Links `key` at the tail.
    pub fn append<S: LinkSlots<K>>(&mut self, slots: &mut S, key: K) {
        self.link_last(slots, key);
        self.bump();
    }

    /// [`Self::append`] without the version bump, for bulk loading.
    pub(crate) fn link_last<S: LinkSlots<K>>(&mut self, slots: &mut S, key: K) {
        slots.set_next(key, None);
        slots.set_prev(key, self.last);
        match self.last {
            Some(tail) => slots.set_next(tail, Some(key)),
            None => self.first = Some(key),
        }
        self.last = Some(key);
        self.len += 1;
    }

    /// Unlinks `key`, which must be a member.
    pub fn remove<S: LinkSlots<K>>(&mut self, slots: &mut S, key: K) {
        self.unlink(slots, key);
        self.len -= 1;
        self.bump();
    }

    /// Moves `moved` directly in front of `target`.
    pub fn put_before<S: LinkSlots<K>>(&mut self, slots: &mut S, target: K, moved: K) {
        if target == moved || slots.next(moved) == Some(target) {
            return;
        }
        self.unlink(slots, moved);
        let prev = slots.prev(target);
        slots.set_prev(moved, prev);
        slots.set_next(moved, Some(target));
        slots.set_prev(target, Some(moved));
        match prev {
            Some(p) => slots.set_next(p, Some(moved)),
            None => self.first = Some(moved),
        }
        self.bump();
    }

    /// Moves `moved` directly behind `target`.
    pub fn put_after<S: LinkSlots<K>>(&mut self, slots: &mut S, target: K, moved: K) {
        if target == moved || slots.prev(moved) == Some(target) {
            return;
        }
        self.unlink(slots, moved);
        let next = slots.next(target);
        slots.set_next(moved, next);
        slots.set_prev(moved, Some(target));
        slots.set_next(target, Some(moved));
        match next {
            Some(n) => slots.set_prev(n, Some(moved)),
            None => self.last = Some(moved),
        }
        self.bump();
    }

    /// Whether `a` occurs strictly before `b`.
    pub fn is_before<S: LinkSlots<K>>(&self, slots: &S, a: K, b: K) -> bool {
        let mut cursor = slots.next(a);
        while let Some(k) = cursor {
            if k == b {
                return true;
            }
            cursor = slots.next(k);
        }
        false
    }

    /// Points the neighbours of a member at its new key after the member's
    /// record was moved from `old` to `new`.
    pub(crate) fn rename<S: LinkSlots<K>>(&mut self, slots: &mut S, old: K, new: K) {
        match slots.prev(new) {
            Some(p) => slots.set_next(p, Some(new)),
            None => {
                debug_assert!(self.first == Some(old) || self.first == Some(new));
                self.first = Some(new);
            }
        }
        match slots.next(new) {
            Some(n) => slots.set_prev(n, Some(new)),
            None => {
                debug_assert!(self.last == Some(old) || self.last == Some(new));
                self.last = Some(new);
            }
        }
        self.bump();
    }

    /// Replaces the whole sequence with a chain already linked through
    /// `next`, fixing up `prev` links and the length.
    pub(crate) fn adopt_chain<S: LinkSlots<K>>(&mut self, slots: &mut S, head: Option<K>) {
        self.first = head;
        self.last = None;
        self.len = 0;
        let mut prev = None;
        let mut cursor = head;
        while let Some(k) = cursor {
            slots.set_prev(k, prev);
            prev = Some(k);
            self.len += 1;
            cursor = slots.next(k);
        }
        self.last = prev;
        self.bump();
    }

    /// Walks members head to tail through `slots`.
    pub fn iter<'a, S: LinkSlots<K>>(&self, slots: &'a S) -> SeqIter<'a, K, S> {
        SeqIter {
            slots,
            next: self.first,
            remaining: self.len,
        }
    }

    /// Stable natural merge sort of the sequence in place.
    ///
    /// Each pass splits the list into maximal non-descending runs and merges
    /// neighbouring runs pairwise until a single run remains. Among elements
    /// that compare equal their relative order is kept. `cmp` gets read access
    /// to the slots so it can inspect the records behind the keys.
    pub fn sort_by<S, F>(&mut self, slots: &mut S, mut cmp: F)
    where
        S: LinkSlots<K>,
        F: FnMut(&S, K, K) -> Ordering,
    {
        if self.len < 2 {
            return;
        }
        loop {
            let mut out = Tail::default();
            let mut merges = 0usize;
            let mut cursor = self.first;
            while let Some(a) = cursor {
                let a_end = run_end(slots, a, &mut cmp);
                let Some(b) = slots.next(a_end) else {
                    out.splice(slots, a, a_end);
                    merges += 1;
                    break;
                };
                slots.set_next(a_end, None);
                let b_end = run_end(slots, b, &mut cmp);
                cursor = slots.next(b_end);
                slots.set_next(b_end, None);
                merge_into(&mut out, slots, a, b, &mut cmp);
                merges += 1;
            }
            if let Some(tail) = out.tail {
                slots.set_next(tail, None);
            }
            self.first = out.head;
            self.last = out.tail;
            if merges <= 1 {
                break;
            }
        }
        self.bump();
    }

    fn unlink<S: LinkSlots<K>>(&mut self, slots: &mut S, key: K) {
        let prev = slots.prev(key);
        let next = slots.next(key);
        match prev {
            Some(p) => slots.set_next(p, next),
            None => {
                debug_assert!(self.first == Some(key), "unlinking a non-member");
                self.first = next;
            }
        }
        match next {
            Some(n) => slots.set_prev(n, prev),
            None => {
                debug_assert!(self.last == Some(key), "unlinking a non-member");
                self.last = prev;
            }
        }
        slots.set_prev(key, None);
        slots.set_next(key, None);
    }
}

/// Output list under construction during a merge pass.
struct Tail<K> {
    head: Option<K>,
    tail: Option<K>,
}

impl<K> Default for Tail<K> {
    fn default() -> Self {
        Self {
            head: None,
            tail: None,
        }
    }
}

impl<K: Copy> Tail<K> {
    fn push<S: LinkSlots<K>>(&mut self, slots: &mut S, key: K) {
        match self.tail {
            Some(t) => slots.set_next(t, Some(key)),
            None => self.head = Some(key),
        }
        slots.set_prev(key, self.tail);
        self.tail = Some(key);
    }

    /// Appends an already linked run `from..=to`.
    fn splice<S: LinkSlots<K>>(&mut self, slots: &mut S, from: K, to: K) {
        match self.tail {
            Some(t) => slots.set_next(t, Some(from)),
            None => self.head = Some(from),
        }
        slots.set_prev(from, self.tail);
        self.tail = Some(to);
    }
}

fn run_end<K, S, F>(slots: &S, start: K, cmp: &mut F) -> K
where
    K: Copy,
    S: LinkSlots<K>,
    F: FnMut(&S, K, K) -> Ordering,
{
    let mut end = start;
    while let Some(n) = slots.next(end) {
        if cmp(slots, end, n) == Ordering::Greater {
            break;
        }
        end = n;
    }
    end
}

/// Merges two `None`-terminated runs onto `out`, preferring `a` on ties.
fn merge_into<K, S, F>(out: &mut Tail<K>, slots: &mut S, a: K, b: K, cmp: &mut F)
where
    K: Copy,
    S: LinkSlots<K>,
    F: FnMut(&S, K, K) -> Ordering,
{
    let mut a = Some(a);
    let mut b = Some(b);
    loop {
        match (a, b) {
            (Some(x), Some(y)) => {
                if cmp(&*slots, x, y) != Ordering::Greater {
                    a = slots.next(x);
                    out.push(slots, x);
                } else {
                    b = slots.next(y);
                    out.push(slots, y);
                }
            }
            (Some(x), None) | (None, Some(x)) => {
                let mut end = x;
                while let Some(n) = slots.next(end) {
                    end = n;
                }
                out.splice(slots, x, end);
                return;
            }
            (None, None) => return,
        }
    }
}

/// Borrowing walk over a sequence, head to tail.
pub struct SeqIter<'a, K, S> {
    slots: &'a S,
    next: Option<K>,
    remaining: usize,
}

impl<'a, K: Copy, S: LinkSlots<K>> Iterator for SeqIter<'a, K, S> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        let key = self.next?;
        self.next = self.slots.next(key);
        self.remaining = self.remaining.saturating_sub(1);
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
