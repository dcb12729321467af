//! TypeRegistry: explicit class-descriptor table used for construction-time
//! subclass checks. Constructors receive the registry; there is no global
//! class lookup.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Generational id of a registered class.
    pub struct ClassId;
}

#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    name: String,
    base: Option<ClassId>,
}

impl ClassDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn base(&self) -> Option<ClassId> {
        self.base
    }
}

/// Ids of the classes every registry starts with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Builtins {
    pub object: ClassId,
    pub dict: ClassId,
    pub dict_keys: ClassId,
    pub dict_values: ClassId,
    pub dict_items: ClassId,
    pub iterator: ClassId,
    pub dict_iterator: ClassId,
}

#[derive(Debug)]
pub struct TypeRegistry {
    classes: SlotMap<ClassId, ClassDescriptor>,
    builtins: Builtins,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut classes = SlotMap::with_key();
        let mut add = |name: &str, base: Option<ClassId>| {
            classes.insert(ClassDescriptor {
                name: name.to_string(),
                base,
            })
        };
        let object = add("object", None);
        let dict = add("dict", Some(object));
        let dict_keys = add("dict_keys", Some(object));
        let dict_values = add("dict_values", Some(object));
        let dict_items = add("dict_items", Some(object));
        let iterator = add("iterator", Some(object));
        let dict_iterator = add("dict_iterator", Some(iterator));
        Self {
            classes,
            builtins: Builtins {
                object,
                dict,
                dict_keys,
                dict_values,
                dict_items,
                iterator,
                dict_iterator,
            },
        }
    }

    #[inline]
    pub fn builtins(&self) -> Builtins {
        self.builtins
    }

    /// Register a class deriving from `base`.
    pub fn register(&mut self, name: &str, base: ClassId) -> ClassId {
        debug_assert!(self.classes.contains_key(base), "unknown base class");
        self.classes.insert(ClassDescriptor {
            name: name.to_string(),
            base: Some(base),
        })
    }

    pub fn get(&self, class: ClassId) -> Option<&ClassDescriptor> {
        self.classes.get(class)
    }

    pub fn name(&self, class: ClassId) -> Option<&str> {
        self.classes.get(class).map(|c| c.name())
    }

    /// Reflexive subclass test walking base links. Ids not in this
    /// registry are subclasses of nothing.
    pub fn is_subclass(&self, class: ClassId, base: ClassId) -> bool {
        let mut cur = Some(class);
        while let Some(c) = cur {
            let Some(desc) = self.classes.get(c) else {
                return false;
            };
            if c == base {
                return true;
            }
            cur = desc.base;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
