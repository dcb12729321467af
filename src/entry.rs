//! Chain node.

use crate::object::StrBox;

/// One key/value node in a bucket chain. Owns the rest of its chain.
#[derive(Debug)]
pub struct Entry<V> {
    pub(crate) key: StrBox,
    pub(crate) value: V,
    pub(crate) next: Option<Box<Entry<V>>>,
}

impl<V> Entry<V> {
    pub(crate) fn new(key: StrBox, value: V, next: Option<Box<Entry<V>>>) -> Self {
        Self { key, value, next }
    }

    pub fn key(&self) -> &StrBox {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn next(&self) -> Option<&Entry<V>> {
        self.next.as_deref()
    }

    /// Iterate this node and every node after it.
    pub fn chain(&self) -> Chain<'_, V> {
        Chain { cur: Some(self) }
    }
}

/// Iterator along one bucket chain.
pub struct Chain<'a, V> {
    cur: Option<&'a Entry<V>>,
}

impl<'a, V> Iterator for Chain<'a, V> {
    type Item = &'a Entry<V>;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.cur?;
        self.cur = e.next.as_deref();
        Some(e)
    }
}

/// Drop a chain node by node so long chains do not recurse.
pub(crate) fn unlink<V>(head: Box<Entry<V>>) {
    let mut next = Some(head);
    while let Some(mut node) = next {
        next = node.next.take();
    }
}
