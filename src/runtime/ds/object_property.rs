use crate::runtime::ds::function_object::Function;
use crate::runtime::ds::object::ObjectRef;
use crate::runtime::ds::value::Value;

/// The `(writable, enumerable, configurable)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyAttributes {
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl PropertyAttributes {
    pub const fn new(writable: bool, enumerable: bool, configurable: bool) -> Self {
        PropertyAttributes {
            writable,
            enumerable,
            configurable,
        }
    }

    pub const PUBLIC: PropertyAttributes = PropertyAttributes::new(true, true, false);
    pub const PRIVATE: PropertyAttributes = PropertyAttributes::new(true, false, false);
    pub const CONSTANT: PropertyAttributes = PropertyAttributes::new(false, true, false);
    pub const PRIVATE_CONSTANT: PropertyAttributes = PropertyAttributes::new(false, false, false);
    pub const METHOD: PropertyAttributes = PropertyAttributes::new(false, true, false);
    pub const PRIVATE_METHOD: PropertyAttributes = PropertyAttributes::new(false, false, false);
    pub const MOCK: PropertyAttributes = PropertyAttributes::new(false, true, true);
    /// What plain assignment produces.
    pub const PLAIN: PropertyAttributes = PropertyAttributes::new(true, true, true);
    /// A resolved deferred property.
    pub const FROZEN: PropertyAttributes = PropertyAttributes::new(false, true, false);
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDescriptor {
    Data {
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        get: Option<Function>,
        set: Option<Function>,
        enumerable: bool,
        configurable: bool,
    },
}

impl PropertyDescriptor {
    pub fn data(value: Value, attributes: PropertyAttributes) -> Self {
        PropertyDescriptor::Data {
            value,
            writable: attributes.writable,
            enumerable: attributes.enumerable,
            configurable: attributes.configurable,
        }
    }

    pub fn accessor(
        get: Option<Function>,
        set: Option<Function>,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        PropertyDescriptor::Accessor {
            get,
            set,
            enumerable,
            configurable,
        }
    }

    pub fn is_enumerable(&self) -> bool {
        match self {
            PropertyDescriptor::Data { enumerable, .. } => *enumerable,
            PropertyDescriptor::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub fn is_configurable(&self) -> bool {
        match self {
            PropertyDescriptor::Data { configurable, .. } => *configurable,
            PropertyDescriptor::Accessor { configurable, .. } => *configurable,
        }
    }

    /// Accessors have no writable flag and report `false`.
    pub fn is_writable(&self) -> bool {
        match self {
            PropertyDescriptor::Data { writable, .. } => *writable,
            PropertyDescriptor::Accessor { .. } => false,
        }
    }

    pub fn is_data_descriptor(&self) -> bool {
        matches!(self, PropertyDescriptor::Data { .. })
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        matches!(self, PropertyDescriptor::Accessor { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            PropertyDescriptor::Data { value, .. } => Some(value),
            PropertyDescriptor::Accessor { .. } => None,
        }
    }

    pub fn getter(&self) -> Option<&Function> {
        match self {
            PropertyDescriptor::Accessor { get, .. } => get.as_ref(),
            PropertyDescriptor::Data { .. } => None,
        }
    }
}

/// Input to the assignment verbs: either a plain value or an accessor pair.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Value(Value),
    Accessor {
        get: Option<Function>,
        set: Option<Function>,
    },
}

impl PropertyValue {
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            PropertyValue::Value(Value::Function(f)) => Some(f),
            _ => None,
        }
    }
}

macro_rules! property_value_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for PropertyValue {
                fn from(v: $t) -> Self {
                    PropertyValue::Value(v.into())
                }
            }
        )*
    };
}

property_value_from!(Value, &str, String, f64, i32, bool, Function, ObjectRef);

/// An insertion-ordered property map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, PropertyValue)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        PropertyMap {
            entries: Vec::new(),
        }
    }

    /// Inserts or replaces `key`; a replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_accessor(
        mut self,
        key: impl Into<String>,
        get: Option<Function>,
        set: Option<Function>,
    ) -> Self {
        self.insert(key, PropertyValue::Accessor { get, set });
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> std::iter::FromIterator<(K, V)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = PropertyMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
