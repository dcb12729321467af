//! DictIter: snapshot cursor shared by the dict and its three views.

use crate::bucketing::Bucketing;
use crate::chained_table::ChainedTable;
use crate::object::{Classed, IntBox, Length, StrBox};
use crate::registry::ClassId;
use core::hash::BuildHasher;
use core::iter::FusedIterator;

/// Output shape of a [`DictIter`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IterKind {
    Keys,
    Values,
    Items,
}

/// One element produced by a [`DictIter`].
#[derive(Clone, Debug, PartialEq)]
pub enum Element<V> {
    Key(StrBox),
    Value(V),
    Item(StrBox, V),
}

impl<V> Element<V> {
    pub fn into_key(self) -> Option<StrBox> {
        match self {
            Element::Key(k) | Element::Item(k, _) => Some(k),
            Element::Value(_) => None,
        }
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            Element::Value(v) | Element::Item(_, v) => Some(v),
            Element::Key(_) => None,
        }
    }

    pub fn into_pair(self) -> Option<(StrBox, V)> {
        match self {
            Element::Item(k, v) => Some((k, v)),
            _ => None,
        }
    }
}

/// Iterator over a copy of a dict's entries taken when the iterator was
/// created. Later mutation of the dict is not observed. Once exhausted it
/// stays exhausted; iterate again by asking the dict or view for a new one.
#[derive(Clone, Debug)]
pub struct DictIter<V> {
    entries: Vec<(StrBox, V)>,
    position: usize,
    kind: IterKind,
    class: ClassId,
}

impl<V: Clone> DictIter<V> {
    pub(crate) fn new<B, S>(table: &ChainedTable<V, B, S>, kind: IterKind, class: ClassId) -> Self
    where
        B: Bucketing,
        S: BuildHasher,
    {
        Self {
            entries: table.snapshot(),
            position: 0,
            kind,
            class,
        }
    }
}

impl<V> DictIter<V> {
    pub(crate) fn empty(kind: IterKind, class: ClassId) -> Self {
        Self {
            entries: Vec::new(),
            position: 0,
            kind,
            class,
        }
    }

    pub fn kind(&self) -> IterKind {
        self.kind
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Elements left to produce.
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.position
    }
}

impl<V: Clone> Iterator for DictIter<V> {
    type Item = Element<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.entries.get(self.position)?;
        self.position += 1;
        Some(match self.kind {
            IterKind::Keys => Element::Key(key.clone()),
            IterKind::Values => Element::Value(value.clone()),
            IterKind::Items => Element::Item(key.clone(), value.clone()),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl<V: Clone> ExactSizeIterator for DictIter<V> {}

impl<V: Clone> FusedIterator for DictIter<V> {}

impl<V> Length for DictIter<V> {
    fn length(&self) -> IntBox {
        IntBox::from(self.remaining())
    }
}

impl<V> Classed for DictIter<V> {
    fn class(&self) -> ClassId {
        self.class
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;

    fn table() -> ChainedTable<i32> {
        let mut t = ChainedTable::new();
        t.insert(StrBox::new("a"), 1);
        t.insert(StrBox::new("b"), 2);
        t
    }

    /// Invariant: each kind shapes the same snapshot differently.
    #[test]
    fn shapes_by_kind() {
        let t = table();
        let class = TypeRegistry::new().builtins().dict_iterator;
        let mut keys: Vec<String> = DictIter::new(&t, IterKind::Keys, class)
            .filter_map(Element::into_key)
            .map(|k| k.to_string())
            .collect();
        keys.sort();
        assert_eq!(keys, ["a", "b"]);

        let mut values: Vec<i32> = DictIter::new(&t, IterKind::Values, class)
            .filter_map(Element::into_value)
            .collect();
        values.sort();
        assert_eq!(values, [1, 2]);

        let mut items: Vec<(String, i32)> = DictIter::new(&t, IterKind::Items, class)
            .filter_map(Element::into_pair)
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        items.sort();
        assert_eq!(items, [("a".to_string(), 1), ("b".to_string(), 2)]);
    }

    /// Invariant: exhaustion is terminal and the cursor never moves past the end.
    #[test]
    fn exhaustion_is_terminal() {
        let t = table();
        let class = TypeRegistry::new().builtins().dict_iterator;
        let mut it = DictIter::new(&t, IterKind::Keys, class);
        assert_eq!(it.len(), 2);
        assert!(it.next().is_some());
        assert_eq!(it.length(), IntBox(1));
        assert!(it.next().is_some());
        for _ in 0..3 {
            assert!(it.next().is_none());
        }
        assert_eq!(it.position(), 2);
        assert_eq!(it.remaining(), 0);
    }

    #[test]
    fn element_accessors() {
        assert_eq!(Element::<i32>::Key(StrBox::new("k")).into_value(), None);
        assert_eq!(Element::Value(3).into_key(), None);
        assert_eq!(Element::Value(3).into_pair(), None);
        assert_eq!(
            Element::Item(StrBox::new("k"), 3).into_key(),
            Some(StrBox::new("k"))
        );
    }
}
