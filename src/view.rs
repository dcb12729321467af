//! Keys, Values and Items views.
//!
//! A view holds a weak back-reference to its dict's table. It caches
//! nothing: every `len` and `iter` call reads the table as it is now. A
//! view that outlives its dict reports length 0 and iterates nothing.

use crate::bucketing::{Bucketing, ExactBucket};
use crate::chained_table::ChainedTable;
use crate::iter::{DictIter, Element, IterKind};
use crate::object::{Classed, IntBox, Length};
use crate::registry::ClassId;
use core::cell::RefCell;
use core::hash::BuildHasher;
use std::collections::hash_map::RandomState;
use std::rc::Weak;

struct Binding<V, B, S> {
    table: Weak<RefCell<ChainedTable<V, B, S>>>,
    iter_class: ClassId,
}

impl<V, B, S> Binding<V, B, S>
where
    V: Clone,
    B: Bucketing,
    S: BuildHasher,
{
    fn len(&self) -> usize {
        self.table
            .upgrade()
            .map(|t| t.borrow().len())
            .unwrap_or(0)
    }

    fn is_bound(&self) -> bool {
        self.table.strong_count() > 0
    }

    fn iter(&self, kind: IterKind) -> DictIter<V> {
        match self.table.upgrade() {
            Some(t) => DictIter::new(&*t.borrow(), kind, self.iter_class),
            None => DictIter::empty(kind, self.iter_class),
        }
    }
}

macro_rules! view {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        pub struct $name<V, B = ExactBucket, S = RandomState> {
            binding: Binding<V, B, S>,
            class: ClassId,
        }

        impl<V, B, S> $name<V, B, S>
        where
            V: Clone,
            B: Bucketing,
            S: BuildHasher,
        {
            pub(crate) fn new(
                table: Weak<RefCell<ChainedTable<V, B, S>>>,
                class: ClassId,
                iter_class: ClassId,
            ) -> Self {
                Self {
                    binding: Binding { table, iter_class },
                    class,
                }
            }

            /// Size of the bound dict right now.
            pub fn len(&self) -> usize {
                self.binding.len()
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// False once the dict this view was taken from is gone.
            pub fn is_bound(&self) -> bool {
                self.binding.is_bound()
            }

            /// Fresh iterator over a snapshot of the bound dict.
            pub fn iter(&self) -> DictIter<V> {
                self.binding.iter($kind)
            }
        }

        impl<V, B, S> Length for $name<V, B, S>
        where
            V: Clone,
            B: Bucketing,
            S: BuildHasher,
        {
            fn length(&self) -> IntBox {
                IntBox::from(self.len())
            }
        }

        impl<V, B, S> Classed for $name<V, B, S> {
            fn class(&self) -> ClassId {
                self.class
            }
        }

        impl<'a, V, B, S> IntoIterator for &'a $name<V, B, S>
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
    };
}

view!(
    /// View producing a dict's keys.
    Keys,
    IterKind::Keys
);
view!(
    /// View producing a dict's values.
    Values,
    IterKind::Values
);
view!(
    /// View producing `(key, value)` pairs.
    Items,
    IterKind::Items
);
