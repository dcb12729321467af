//! Boxed runtime scalars and the small protocol traits the dict needs
//! from the surrounding object system.

use crate::error::{DictError, Result};
use crate::registry::ClassId;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::rc::Rc;

/// Boxed runtime string.
///
/// Equality, ordering and hashing follow the string contents; two boxes
/// holding the same text compare equal even when they are distinct
/// allocations. Use [`StrBox::ptr_eq`] for identity.
#[derive(Clone)]
pub struct StrBox(Rc<str>);

impl StrBox {
    pub fn new(s: &str) -> Self {
        StrBox(Rc::from(s))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when both boxes are the same allocation.
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.0, &other.0)
    }
}

impl PartialEq for StrBox {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for StrBox {}

impl PartialEq<str> for StrBox {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for StrBox {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialOrd for StrBox {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StrBox {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for StrBox {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Borrow<str> for StrBox {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for StrBox {
    fn from(s: &str) -> Self {
        StrBox::new(s)
    }
}

impl From<String> for StrBox {
    fn from(s: String) -> Self {
        StrBox(Rc::from(s))
    }
}

impl fmt::Debug for StrBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

impl fmt::Display for StrBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boxed runtime integer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntBox(pub i64);

impl IntBox {
    #[inline]
    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<usize> for IntBox {
    fn from(n: usize) -> Self {
        IntBox(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl PartialEq<i64> for IntBox {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

/// Host-native structure a dict may be seeded from.
#[derive(Clone, Debug, PartialEq)]
pub enum HostValue<V> {
    Map(Vec<(String, V)>),
    List(Vec<V>),
    Str(String),
    Int(i64),
    Nil,
}

impl<V> HostValue<V> {
    /// Short name of the value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            HostValue::Map(_) => "map",
            HostValue::List(_) => "list",
            HostValue::Str(_) => "str",
            HostValue::Int(_) => "int",
            HostValue::Nil => "nil",
        }
    }
}

/// A key argument as it arrives from the runtime.
///
/// Boxed and raw strings are accepted; anything else is carried as its
/// type name and rejected by every keyed operation.
#[derive(Copy, Clone, Debug)]
pub enum Key<'a> {
    Boxed(&'a StrBox),
    Raw(&'a str),
    Other(&'static str),
}

impl<'a> Key<'a> {
    /// Key text for lookups.
    pub fn as_text(&self) -> Result<&'a str> {
        match *self {
            Key::Boxed(b) => Ok(b.as_str()),
            Key::Raw(s) => Ok(s),
            Key::Other(found) => {
                tracing::debug!(found, "rejected dict key");
                Err(DictError::InvalidKey { found })
            }
        }
    }

    /// Boxed key for storage. A boxed argument is shared, a raw one is
    /// boxed fresh.
    pub fn into_box(self) -> Result<StrBox> {
        match self {
            Key::Boxed(b) => Ok(b.clone()),
            Key::Raw(s) => Ok(StrBox::new(s)),
            Key::Other(found) => {
                tracing::debug!(found, "rejected dict key");
                Err(DictError::InvalidKey { found })
            }
        }
    }
}

impl<'a> From<&'a StrBox> for Key<'a> {
    fn from(b: &'a StrBox) -> Self {
        Key::Boxed(b)
    }
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(s: &'a str) -> Self {
        Key::Raw(s)
    }
}

impl<'a> From<&'a String> for Key<'a> {
    fn from(s: &'a String) -> Self {
        Key::Raw(s.as_str())
    }
}

impl<'a> From<&'a IntBox> for Key<'a> {
    fn from(_: &'a IntBox) -> Self {
        Key::Other("int")
    }
}

impl<'a, V> From<&'a HostValue<V>> for Key<'a> {
    fn from(v: &'a HostValue<V>) -> Self {
        match v {
            HostValue::Str(s) => Key::Raw(s.as_str()),
            other => Key::Other(other.kind()),
        }
    }
}

/// Objects that report a runtime length.
pub trait Length {
    fn length(&self) -> IntBox;
}

/// Objects tagged with a runtime class.
pub trait Classed {
    fn class(&self) -> ClassId;
}
