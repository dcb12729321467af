//! ChainedTable: structural layer of the dict.
//!
//! A host `hashbrown::HashMap` maps each *bucket key* to the head of a
//! singly linked chain of entries. The bucket key is derived from the
//! lookup key by a [`Bucketing`] strategy; distinct keys that derive the
//! same bucket key share a chain and are told apart by comparing key
//! strings. The host map never sees the real keys, so its own equality is
//! only ever applied to bucket keys.
//!
//! Invariants
//! - `size` equals the number of entries reachable from all chains.
//! - No chain holds two entries with equal key strings.
//! - No bucket is empty: a bucket stores a non-optional head entry, so the
//!   last removal from a chain removes the bucket.
//!
//! Iteration order is host bucket order, then chain order (newest first,
//! since insertion prepends). Neither is stable across mutation and callers
//! must not rely on it.

use crate::bucketing::{Bucketing, ExactBucket};
use crate::entry::{unlink, Entry};
use crate::guard::OpGuard;
use crate::object::StrBox;
use core::fmt;
use core::hash::BuildHasher;
use core::mem;
use hashbrown::HashMap;
use std::collections::hash_map::RandomState;
use tracing::{debug, trace};

pub struct ChainedTable<V, B = ExactBucket, S = RandomState> {
    buckets: HashMap<Box<str>, Box<Entry<V>>, S>,
    size: usize,
    bucketing: B,
    guard: OpGuard,
}

impl<V> ChainedTable<V> {
    pub fn new() -> Self {
        Self::with_hasher(ExactBucket, RandomState::new())
    }
}

impl<V> Default for ChainedTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, B> ChainedTable<V, B>
where
    B: Bucketing,
{
    pub fn with_bucketing(bucketing: B) -> Self {
        Self::with_hasher(bucketing, RandomState::new())
    }
}

/// Iterator over `(key, value)` pairs of a `ChainedTable`.
pub struct Iter<'a, V> {
    heads: hashbrown::hash_map::Values<'a, Box<str>, Box<Entry<V>>>,
    chain: Option<&'a Entry<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a StrBox, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.chain {
                self.chain = e.next.as_deref();
                return Some((&e.key, &e.value));
            }
            self.chain = Some(&**self.heads.next()?);
        }
    }
}

impl<V, B, S> ChainedTable<V, B, S>
where
    B: Bucketing,
    S: BuildHasher,
{
    pub fn with_hasher(bucketing: B, hasher: S) -> Self {
        Self {
            buckets: HashMap::with_hasher(hasher),
            size: 0,
            bucketing,
            guard: OpGuard::new(),
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, bucketing: B, hasher: S) -> Self {
        Self {
            buckets: HashMap::with_capacity_and_hasher(capacity, hasher),
            size: 0,
            bucketing,
            guard: OpGuard::new(),
        }
    }

    pub fn bucketing(&self) -> &B {
        &self.bucketing
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of entries chained under `bucket` (a bucket key, not a
    /// lookup key).
    pub fn chain_len(&self, bucket: &str) -> usize {
        self.buckets
            .get(bucket)
            .map(|head| head.chain().count())
            .unwrap_or(0)
    }

    fn find_in_chain(&self, key: &str) -> Option<&Entry<V>> {
        let bucket = self.bucketing.bucket_key(key);
        self.buckets
            .get(bucket.as_ref())?
            .chain()
            .find(|e| e.key.as_str() == key)
    }

    pub fn find(&self, key: &str) -> Option<&Entry<V>> {
        let _g = self.guard.enter("find");
        self.find_in_chain(key)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let _g = self.guard.enter("get");
        self.find_in_chain(key).map(|e| &e.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        let _g = self.guard.enter("contains_key");
        self.find_in_chain(key).is_some()
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let _g = self.guard.enter("get_mut");
        let bucket = self.bucketing.bucket_key(key);
        let mut cur = self.buckets.get_mut(bucket.as_ref()).map(|head| &mut **head);
        while let Some(e) = cur {
            if e.key.as_str() == key {
                return Some(&mut e.value);
            }
            cur = e.next.as_deref_mut();
        }
        None
    }

    /// Insert or overwrite. An existing entry keeps its identity and chain
    /// position and the replaced value is returned; otherwise a new entry
    /// is prepended to its bucket's chain.
    pub fn insert(&mut self, key: StrBox, value: V) -> Option<V> {
        let _g = self.guard.enter("insert");
        let probe = key.clone();
        let bucket = self.bucketing.bucket_key(probe.as_str());
        match self.buckets.get_mut(bucket.as_ref()) {
            Some(head) => {
                let mut depth = 0usize;
                let mut cur = Some(&mut **head);
                while let Some(e) = cur {
                    if e.key == key {
                        return Some(mem::replace(&mut e.value, value));
                    }
                    depth += 1;
                    cur = e.next.as_deref_mut();
                }
                let rest = mem::replace(head, Box::new(Entry::new(key, value, None)));
                head.next = Some(rest);
                trace!(bucket = %bucket, depth, "chained entry");
            }
            None => {
                self.buckets
                    .insert(Box::from(bucket.as_ref()), Box::new(Entry::new(key, value, None)));
            }
        }
        self.size += 1;
        None
    }

    /// Unlink the entry for `key` and hand back its key and value.
    pub fn remove(&mut self, key: &str) -> Option<(StrBox, V)> {
        let _g = self.guard.enter("remove");
        let bucket = self.bucketing.bucket_key(key);
        let head = self.buckets.get_mut(bucket.as_ref())?;
        let removed = if head.key.as_str() == key {
            match head.next.take() {
                Some(next) => mem::replace(head, next),
                None => {
                    trace!(bucket = %bucket, "bucket emptied");
                    self.buckets.remove(bucket.as_ref())?
                }
            }
        } else {
            let mut prev: &mut Entry<V> = &mut **head;
            loop {
                let next = prev.next.as_deref()?;
                if next.key.as_str() == key {
                    break;
                }
                prev = prev.next.as_deref_mut()?;
            }
            let mut node = prev.next.take()?;
            prev.next = node.next.take();
            node
        };
        self.size -= 1;
        let Entry { key, value, .. } = *removed;
        Some((key, value))
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            heads: self.buckets.values(),
            chain: None,
        }
    }

    /// Every entry, flattened: bucket order, then chain order.
    pub fn entries(&self) -> Vec<&Entry<V>> {
        let _g = self.guard.enter("entries");
        let mut out = Vec::with_capacity(self.size);
        for head in self.buckets.values() {
            out.extend(head.chain());
        }
        debug_assert_eq!(out.len(), self.size);
        out
    }

    /// Owned copy of every `(key, value)` pair in `entries` order.
    pub fn snapshot(&self) -> Vec<(StrBox, V)>
    where
        V: Clone,
    {
        self.entries()
            .into_iter()
            .map(|e| (e.key.clone(), e.value.clone()))
            .collect()
    }

    /// Rebuild every chain with fresh entries sharing the same key boxes
    /// and cloned values. Chain order is preserved.
    pub fn duplicate(&self) -> Self
    where
        V: Clone,
        B: Clone,
        S: Clone,
    {
        let _g = self.guard.enter("duplicate");
        let mut buckets =
            HashMap::with_capacity_and_hasher(self.buckets.len(), self.buckets.hasher().clone());
        for (bucket, head) in &self.buckets {
            let nodes: Vec<&Entry<V>> = head.chain().collect();
            let mut rebuilt: Option<Box<Entry<V>>> = None;
            for e in nodes.into_iter().rev() {
                rebuilt = Some(Box::new(Entry::new(e.key.clone(), e.value.clone(), rebuilt)));
            }
            if let Some(h) = rebuilt {
                buckets.insert(bucket.clone(), h);
            }
        }
        debug!(size = self.size, buckets = buckets.len(), "duplicated chained table");
        Self {
            buckets,
            size: self.size,
            bucketing: self.bucketing.clone(),
            guard: OpGuard::new(),
        }
    }

    /// Empty the table and hand its chains to the caller. The entries are
    /// dropped when the returned value is, not here.
    pub fn detach(&mut self) -> Detached<V> {
        let _g = self.guard.enter("detach");
        let len = mem::take(&mut self.size);
        let heads: Vec<Box<Entry<V>>> = self.buckets.drain().map(|(_, head)| head).collect();
        debug!(entries = len, buckets = heads.len(), "detached chained table");
        Detached { heads, len }
    }

    pub fn clear(&mut self) {
        drop(self.detach());
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let mut total = 0;
        for head in self.buckets.values() {
            let keys: Vec<&str> = head.chain().map(|e| e.key.as_str()).collect();
            let mut dedup = keys.clone();
            dedup.sort_unstable();
            dedup.dedup();
            assert_eq!(dedup.len(), keys.len(), "duplicate key in chain {keys:?}");
            total += keys.len();
        }
        assert_eq!(total, self.size, "size out of sync with chains");
    }
}

impl<V, B, S> Drop for ChainedTable<V, B, S> {
    fn drop(&mut self) {
        for (_, head) in self.buckets.drain() {
            unlink(head);
        }
    }
}

/// Chains taken out of a table by [`ChainedTable::detach`].
pub struct Detached<V> {
    heads: Vec<Box<Entry<V>>>,
    len: usize,
}

impl<V> Detached<V> {
    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<V> Drop for Detached<V> {
    fn drop(&mut self) {
        for head in self.heads.drain(..) {
            unlink(head);
        }
    }
}

impl<V: fmt::Debug, B, S> fmt::Debug for ChainedTable<V, B, S>
where
    B: Bucketing,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucketing::PrefixBucket;
    use std::collections::BTreeMap;

    fn k(s: &str) -> StrBox {
        StrBox::new(s)
    }

    /// Invariant: insert on a new key grows size; on an existing key it
    /// replaces in place and returns the old value.
    #[test]
    fn insert_and_overwrite() {
        let mut t: ChainedTable<i32> = ChainedTable::new();
        assert_eq!(t.insert(k("a"), 1), None);
        assert_eq!(t.insert(k("b"), 2), None);
        assert_eq!(t.insert(k("a"), 3), Some(1));
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("a"), Some(&3));
        assert_eq!(t.get("b"), Some(&2));
        assert_eq!(t.get("c"), None);
        t.assert_invariants();
    }

    /// Invariant: overwriting keeps the original key box (entry identity).
    #[test]
    fn overwrite_preserves_entry() {
        let mut t: ChainedTable<i32> = ChainedTable::new();
        let first = k("a");
        t.insert(first.clone(), 1);
        t.insert(k("a"), 2);
        let e = t.find("a").unwrap();
        assert!(StrBox::ptr_eq(e.key(), &first));
        assert_eq!(*e.value(), 2);
    }

    /// Invariant: colliding keys chain newest-first and resolve by string.
    #[test]
    fn collisions_chain_newest_first() {
        let mut t = ChainedTable::with_bucketing(PrefixBucket::new(1));
        t.insert(k("apple"), 1);
        t.insert(k("avocado"), 2);
        t.insert(k("apricot"), 3);
        t.insert(k("banana"), 4);
        assert_eq!(t.bucket_count(), 2);
        assert_eq!(t.chain_len("a"), 3);
        assert_eq!(t.chain_len("b"), 1);
        assert_eq!(t.chain_len("z"), 0);
        assert_eq!(t.get("avocado"), Some(&2));
        let order: Vec<&str> = t
            .find("apricot")
            .unwrap()
            .chain()
            .map(|e| e.key().as_str())
            .collect();
        assert_eq!(order, ["apricot", "avocado", "apple"]);
        // Same bucket, different key.
        assert!(!t.contains_key("acorn"));
        t.assert_invariants();
    }

    /// Invariant: removal from head, middle and tail keeps the chain intact
    /// and the bucket disappears with its last entry.
    #[test]
    fn remove_positions() {
        let mut t = ChainedTable::with_bucketing(PrefixBucket::new(0));
        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            t.insert(k(name), i);
        }
        // Chain: d c b a
        assert_eq!(t.remove("c"), Some((k("c"), 2)));
        t.assert_invariants();
        assert_eq!(t.remove("d").map(|(_, v)| v), Some(3));
        t.assert_invariants();
        assert_eq!(t.remove("a").map(|(_, v)| v), Some(0));
        t.assert_invariants();
        assert_eq!(t.remove("zz"), None);
        assert_eq!(t.len(), 1);
        assert_eq!(t.bucket_count(), 1);
        assert_eq!(t.remove("b").map(|(_, v)| v), Some(1));
        assert_eq!(t.bucket_count(), 0);
        assert!(t.is_empty());
        assert_eq!(t.remove("b"), None);
    }

    #[test]
    fn get_mut_updates() {
        let mut t = ChainedTable::with_bucketing(PrefixBucket::new(0));
        t.insert(k("x"), 1);
        t.insert(k("y"), 2);
        *t.get_mut("x").unwrap() += 10;
        assert_eq!(t.get("x"), Some(&11));
        assert!(t.get_mut("q").is_none());
    }

    /// Invariant: iteration and entries visit every entry once.
    #[test]
    fn iteration_covers_all_entries() {
        let mut t = ChainedTable::with_bucketing(PrefixBucket::new(1));
        for name in ["aa", "ab", "ba", "bb", "c"] {
            t.insert(k(name), name.len());
        }
        let seen: BTreeMap<String, usize> =
            t.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        assert_eq!(seen.len(), 5);
        assert_eq!(t.entries().len(), 5);
        assert_eq!(t.snapshot().len(), 5);
    }

    /// Invariant: duplicate shares key boxes but not chain nodes.
    #[test]
    fn duplicate_is_shallow_and_independent() {
        let mut t = ChainedTable::with_bucketing(PrefixBucket::new(0));
        t.insert(k("a"), 1);
        t.insert(k("b"), 2);
        let mut d = t.duplicate();
        d.assert_invariants();
        assert!(StrBox::ptr_eq(t.find("a").unwrap().key(), d.find("a").unwrap().key()));
        let order_t: Vec<String> = t.iter().map(|(k, _)| k.to_string()).collect();
        let order_d: Vec<String> = d.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(order_t, order_d);

        d.insert(k("a"), 100);
        d.remove("b");
        assert_eq!(t.get("a"), Some(&1));
        assert_eq!(t.get("b"), Some(&2));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn clear_resets() {
        let mut t: ChainedTable<i32> = ChainedTable::new();
        t.insert(k("a"), 1);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.bucket_count(), 0);
        assert_eq!(t.get("a"), None);
        t.insert(k("a"), 2);
        assert_eq!(t.len(), 1);
    }

    /// Invariant: detached entries outlive the table's emptying and are
    /// dropped only with the detached value.
    #[test]
    fn detach_defers_drops() {
        use std::rc::Rc;
        let shared = Rc::new(());
        let mut t = ChainedTable::with_bucketing(PrefixBucket::new(0));
        t.insert(k("a"), shared.clone());
        t.insert(k("b"), shared.clone());
        let detached = t.detach();
        assert!(t.is_empty());
        assert_eq!(t.bucket_count(), 0);
        t.assert_invariants();
        assert_eq!(detached.len(), 2);
        assert_eq!(Rc::strong_count(&shared), 3);
        drop(detached);
        assert_eq!(Rc::strong_count(&shared), 1);
    }

    /// Invariant: very long chains drop without recursing per node.
    #[test]
    fn long_chain_drops() {
        let mut t = ChainedTable::with_bucketing(PrefixBucket::new(0));
        // Built by hand: going through insert would walk the chain each time.
        let mut head: Option<Box<Entry<usize>>> = None;
        for i in 0..200_000 {
            head = Some(Box::new(Entry::new(StrBox::from(i.to_string()), i, head)));
        }
        t.buckets.insert(Box::from(""), head.unwrap());
        t.size = 200_000;
        assert_eq!(t.bucket_count(), 1);
        assert_eq!(t.get("0"), Some(&0));
        t.clear();
        assert!(t.is_empty());

        let mut head: Option<Box<Entry<usize>>> = None;
        for i in 0..200_000 {
            head = Some(Box::new(Entry::new(StrBox::from(i.to_string()), i, head)));
        }
        t.buckets.insert(Box::from(""), head.unwrap());
        t.size = 200_000;
        drop(t);
    }

    /// Invariant (debug-only): a bucketing strategy that re-enters the
    /// table mid-operation trips the guard.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrant_bucketing_panics() {
        use std::cell::Cell;
        use std::rc::Rc;

        let table: Rc<Cell<*const ChainedTable<i32, Box<dyn Fn(&str) -> String>>>> =
            Rc::new(Cell::new(core::ptr::null()));
        let hook = table.clone();
        let bucketing: Box<dyn Fn(&str) -> String> = Box::new(move |key: &str| {
            let p = hook.get();
            if !p.is_null() && key == "boom" {
                // Re-enter the table from inside its own operation.
                unsafe {
                    let _ = (*p).contains_key("other");
                }
            }
            key.to_string()
        });
        let mut t = ChainedTable::with_bucketing(bucketing);
        t.insert(k("fine"), 1);
        table.set(&t as *const _);
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = t.get("boom");
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}
