//! Dict: the runtime's string-keyed mapping object.
//!
//! Wraps a [`ChainedTable`] behind `Rc<RefCell<..>>` so views can keep a
//! weak back-reference and observe later mutation. All methods take `&self`;
//! the dict is single-threaded (`!Send`/`!Sync`) and does not implement
//! `Clone` (use [`Dict::copy`] for a shallow copy).

use crate::bucketing::{Bucketing, ExactBucket};
use crate::chained_table::ChainedTable;
use crate::error::{DictError, Result};
use crate::iter::{DictIter, Element, IterKind};
use crate::object::{Classed, HostValue, IntBox, Key, Length, StrBox};
use crate::registry::{Builtins, ClassId, TypeRegistry};
use crate::view::{Items, Keys, Values};
use core::cell::RefCell;
use core::fmt;
use core::hash::BuildHasher;
use std::collections::hash_map::RandomState;
use std::rc::Rc;
use tracing::debug;

pub struct Dict<V, B = ExactBucket, S = RandomState> {
    table: Rc<RefCell<ChainedTable<V, B, S>>>,
    class: ClassId,
    builtins: Builtins,
}

impl<V: Clone> Dict<V> {
    /// Empty dict of the builtin `dict` class.
    pub fn new(registry: &TypeRegistry) -> Self {
        let builtins = registry.builtins();
        Self {
            table: Rc::new(RefCell::new(ChainedTable::new())),
            class: builtins.dict,
            builtins,
        }
    }

    /// Empty dict of `class`, which must be `dict` or a registered subclass.
    pub fn with_class(registry: &TypeRegistry, class: ClassId) -> Result<Self> {
        Self::with_table(registry, class, ChainedTable::new())
    }

    /// Dict of `class` (default `dict`) filled from a host-native map.
    /// Any other seed shape is rejected; the class is checked first.
    pub fn from_seed(
        registry: &TypeRegistry,
        class: Option<ClassId>,
        seed: HostValue<V>,
    ) -> Result<Self> {
        let dict = Self::with_class(registry, class.unwrap_or(registry.builtins().dict))?;
        let pairs = match seed {
            HostValue::Map(pairs) => pairs,
            other => {
                debug!(found = other.kind(), "rejected dict seed");
                return Err(DictError::InvalidSeed {
                    found: other.kind(),
                });
            }
        };
        {
            let mut table = dict.table.borrow_mut();
            for (key, value) in pairs {
                table.insert(StrBox::from(key), value);
            }
        }
        Ok(dict)
    }
}

impl<V, B, S> Dict<V, B, S>
where
    V: Clone,
    B: Bucketing,
    S: BuildHasher,
{
    /// Dict of `class` over a caller-built table, e.g. one with a custom
    /// bucketing strategy, hasher or capacity.
    pub fn with_table(
        registry: &TypeRegistry,
        class: ClassId,
        table: ChainedTable<V, B, S>,
    ) -> Result<Self> {
        let builtins = registry.builtins();
        if !registry.is_subclass(class, builtins.dict) {
            let name = registry.name(class).unwrap_or("<unregistered>").to_string();
            debug!(class = %name, "rejected dict class");
            return Err(DictError::NotDictSubclass { class: name });
        }
        Ok(Self {
            table: Rc::new(RefCell::new(table)),
            class,
            builtins,
        })
    }

    /// Value stored under `key`, or `fallback` handed back untouched.
    pub fn get<'k>(&self, key: impl Into<Key<'k>>, fallback: V) -> Result<V> {
        let key = key.into().as_text()?;
        Ok(self.table.borrow().get(key).cloned().unwrap_or(fallback))
    }

    pub fn lookup<'k>(&self, key: impl Into<Key<'k>>) -> Result<Option<V>> {
        let key = key.into().as_text()?;
        Ok(self.table.borrow().get(key).cloned())
    }

    pub fn contains_key<'k>(&self, key: impl Into<Key<'k>>) -> Result<bool> {
        let key = key.into().as_text()?;
        Ok(self.table.borrow().contains_key(key))
    }

    /// Insert or overwrite. Overwriting keeps the existing entry in place
    /// and leaves the size unchanged.
    pub fn set<'k>(&self, key: impl Into<Key<'k>>, value: V) -> Result<()> {
        let key = key.into().into_box()?;
        // Bound so the replaced value drops after the borrow is released.
        let replaced = self.table.borrow_mut().insert(key, value);
        drop(replaced);
        Ok(())
    }

    /// Remove `key` and return its value. A missing key yields `Ok(None)`.
    pub fn pop<'k>(&self, key: impl Into<Key<'k>>) -> Result<Option<V>> {
        let key = key.into().as_text()?;
        Ok(self.table.borrow_mut().remove(key).map(|(_, value)| value))
    }

    /// Copy of every `(key, value)` pair. Order is unspecified.
    pub fn entries(&self) -> Vec<(StrBox, V)> {
        self.table.borrow().snapshot()
    }

    pub fn keys(&self) -> Keys<V, B, S> {
        Keys::new(
            Rc::downgrade(&self.table),
            self.builtins.dict_keys,
            self.builtins.dict_iterator,
        )
    }

    pub fn values(&self) -> Values<V, B, S> {
        Values::new(
            Rc::downgrade(&self.table),
            self.builtins.dict_values,
            self.builtins.dict_iterator,
        )
    }

    pub fn items(&self) -> Items<V, B, S> {
        Items::new(
            Rc::downgrade(&self.table),
            self.builtins.dict_items,
            self.builtins.dict_iterator,
        )
    }

    /// Iterate the keys of a snapshot, as iterating a mapping does.
    pub fn iter(&self) -> DictIter<V> {
        DictIter::new(&*self.table.borrow(), IterKind::Keys, self.builtins.dict_iterator)
    }

    /// Shallow copy: fresh chains sharing key boxes and cloned values. The
    /// copy is of the builtin `dict` class whatever this dict's class is.
    pub fn copy(&self) -> Self
    where
        B: Clone,
        S: Clone,
    {
        let table = self.table.borrow().duplicate();
        Self {
            table: Rc::new(RefCell::new(table)),
            class: self.builtins.dict,
            builtins: self.builtins,
        }
    }

    /// Set every entry of `other` into this dict.
    pub fn update<B2, S2>(&self, other: &Dict<V, B2, S2>)
    where
        B2: Bucketing,
        S2: BuildHasher,
    {
        // Snapshot first so updating a dict from itself does not double borrow.
        let pairs = other.entries();
        let replaced: Vec<V> = {
            let mut table = self.table.borrow_mut();
            pairs
                .into_iter()
                .filter_map(|(key, value)| table.insert(key, value))
                .collect()
        };
        drop(replaced);
    }

    /// Drop every entry. Views taken earlier stay bound and see the empty
    /// dict.
    pub fn clear(&self) {
        let detached = self.table.borrow_mut().detach();
        drop(detached);
    }

    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.borrow().is_empty()
    }

    /// True when both handles share one table.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.table, &other.table)
    }
}

impl<V, B, S> Length for Dict<V, B, S>
where
    V: Clone,
    B: Bucketing,
    S: BuildHasher,
{
    fn length(&self) -> IntBox {
        IntBox::from(self.len())
    }
}

impl<V, B, S> Classed for Dict<V, B, S> {
    fn class(&self) -> ClassId {
        self.class
    }
}

impl<'a, V, B, S> IntoIterator for &'a Dict<V, B, S>
where
    V: Clone,
    B: Bucketing,
    S: BuildHasher,
{
    type Item = Element<V>;
    type IntoIter = DictIter<V>;
    fn into_iter(self) -> DictIter<V> {
        self.iter()
    }
}

impl<V, B, S> fmt::Debug for Dict<V, B, S>
where
    V: fmt::Debug,
    B: Bucketing,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.borrow();
        f.debug_map().entries(table.iter()).finish()
    }
}
