//! chained-dict: the string-keyed mapping object of an embedded runtime.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: reproduce a dynamic-language dict (value equality on string
//!   keys, fallback lookup, live views, iteration that survives mutation)
//!   on top of a host associative container, with collision chaining done
//!   by the dict itself rather than by the host container.
//! - Layers:
//!   - Entry: a chain node owning its key box, its value and the rest of
//!     its chain.
//!   - ChainedTable<V, B, S>: host `hashbrown::HashMap` from bucket key to
//!     chain head, plus the live entry count. Bucket keys come from a
//!     `Bucketing` strategy; a debug-only guard catches strategies that
//!     re-enter the table.
//!   - Dict<V, B, S>: public object. Owns the table behind
//!     `Rc<RefCell<..>>`, validates keys and construction class, and hands
//!     out views.
//!   - Keys / Values / Items: weak back-references to the table; length is
//!     always read live.
//!   - DictIter: owns a snapshot of the entries taken at creation.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (Rc/Weak inside).
//! - Only string keys. Boxed (`StrBox`) and raw (`&str`) keys are both
//!   accepted; every other key shape is a `DictError::InvalidKey`.
//! - Failed operations never mutate: keys are validated first.
//! - Bucket and chain iteration order is unspecified.
//!
//! Snapshot semantics
//! - An iterator copies `(key, value)` pairs when it is created. Later
//!   `set`/`pop`/`clear` on the dict never change what an existing iterator
//!   yields, so "mutated during iteration" cannot happen.
//! - Views are the opposite: they hold no data and every query goes to the
//!   live dict. A view that outlives its dict is empty.
//!
//! Class checks
//! - Constructors take an explicit `TypeRegistry`; the class must be `dict`
//!   or a registered subclass. There is no global class table.
//!
//! Notes and non-goals
//! - No hashing of non-string keys, no ordering guarantees, no
//!   persistence.
//! - `pop` on a missing key returns `Ok(None)` rather than an error.

pub mod bucketing;
pub mod chained_table;
mod chained_table_proptest;
mod dict;
pub mod entry;
mod error;
mod guard;
mod iter;
mod object;
mod registry;
mod view;

// Public surface
pub use bucketing::{Bucketing, ExactBucket, PrefixBucket};
pub use chained_table::{ChainedTable, Detached};
pub use dict::Dict;
pub use error::{DictError, Result};
pub use guard::{OpGuard, OpScope};
pub use iter::{DictIter, Element, IterKind};
pub use object::{Classed, HostValue, IntBox, Key, Length, StrBox};
pub use registry::{Builtins, ClassDescriptor, ClassId, TypeRegistry};
pub use view::{Items, Keys, Values};
