use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use uuid::Uuid;

use crate::runtime::class::surrogate::SurrogateRule;
use crate::runtime::ds::error::ObjError;
use crate::runtime::ds::object_property::PropertyDescriptor;
use crate::runtime::ds::value::Value;

pub type ObjectRef = Rc<RefCell<Object>>;

/// A prototype-linked property bag. Classes, instances, traits, namespaces
/// and memoization registries are all `Object`s.
pub struct Object {
    id: Uuid,
    properties: HashMap<String, PropertyDescriptor>,
    keys: Vec<String>,
    prototype: Option<ObjectRef>,
    is_extensible: bool,
    is_overlay: bool,
    surrogates: Option<Vec<SurrogateRule>>,
}

impl Object {
    fn with_prototype_of(prototype: Option<ObjectRef>) -> Self {
        Object {
            id: Uuid::new_v4(),
            properties: HashMap::new(),
            keys: Vec::new(),
            prototype,
            is_extensible: true,
            is_overlay: false,
            surrogates: None,
        }
    }

    /// An object with no prototype at all.
    pub fn new_plain() -> ObjectRef {
        Rc::new(RefCell::new(Object::with_prototype_of(None)))
    }

    pub fn new_with_prototype(prototype: Option<ObjectRef>) -> ObjectRef {
        Rc::new(RefCell::new(Object::with_prototype_of(prototype)))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn get_prototype_of(&self) -> Option<ObjectRef> {
        self.prototype.clone()
    }

    /// Re-links the prototype, refusing links that would form a cycle.
    pub fn set_prototype_of(this: &ObjectRef, prototype: Option<ObjectRef>) -> bool {
        let mut p = prototype.clone();
        while let Some(some_p) = p {
            if Rc::ptr_eq(&some_p, this) {
                // To prevent circular chain
                return false;
            }
            p = some_p.borrow().get_prototype_of();
        }
        this.borrow_mut().prototype = prototype;
        true
    }

    pub fn is_extensible(&self) -> bool {
        self.is_extensible
    }

    pub fn prevent_extensions(&mut self) {
        self.is_extensible = false;
    }

    /// Whether this object is the mockable outer handle produced by a
    /// testing-mode extension.
    pub fn is_overlay(&self) -> bool {
        self.is_overlay
    }

    pub(crate) fn mark_overlay(&mut self) {
        self.is_overlay = true;
    }

    pub fn get_own_property(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Own keys in insertion order.
    pub fn own_property_keys(&self) -> Vec<String> {
        self.keys.clone()
    }

    /// Checks whether `descriptor` may be installed at `key` without
    /// touching the object.
    pub fn can_define_own_property(
        &self,
        key: &str,
        descriptor: &PropertyDescriptor,
    ) -> Result<(), ObjError> {
        match self.properties.get(key) {
            None => {
                if self.is_extensible {
                    Ok(())
                } else {
                    Err(ObjError::NotExtensible(key.to_string()))
                }
            }
            Some(current) => {
                if current.is_configurable() || current == descriptor {
                    return Ok(());
                }
                match (current, descriptor) {
                    (
                        PropertyDescriptor::Data {
                            writable: true,
                            enumerable: current_enumerable,
                            ..
                        },
                        PropertyDescriptor::Data {
                            enumerable,
                            configurable: false,
                            ..
                        },
                    ) if current_enumerable == enumerable => Ok(()),
                    _ => Err(ObjError::NotConfigurable(key.to_string())),
                }
            }
        }
    }

    pub fn define_own_property(
        &mut self,
        key: &str,
        descriptor: PropertyDescriptor,
    ) -> Result<(), ObjError> {
        self.can_define_own_property(key, &descriptor)?;
        if self.properties.insert(key.to_string(), descriptor).is_none() {
            self.keys.push(key.to_string());
        }
        Ok(())
    }

    /// Installs `descriptor` regardless of the current property's
    /// configurability. Used for plain overwrites and internal transitions.
    pub(crate) fn force_define_own_property(&mut self, key: &str, descriptor: PropertyDescriptor) {
        if self.properties.insert(key.to_string(), descriptor).is_none() {
            self.keys.push(key.to_string());
        }
    }

    /// Updates the value of an existing writable data property in place.
    pub(crate) fn write_own_value(&mut self, key: &str, new_value: Value) -> Result<(), ObjError> {
        match self.properties.get_mut(key) {
            Some(PropertyDescriptor::Data {
                value,
                writable: true,
                ..
            }) => {
                *value = new_value;
                Ok(())
            }
            _ => Err(ObjError::ReadOnly(key.to_string())),
        }
    }

    pub fn delete(&mut self, key: &str) -> bool {
        match self.properties.get(key) {
            None => true,
            Some(pd) => {
                if pd.is_configurable() {
                    self.properties.remove(key);
                    self.keys.retain(|k| k != key);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub(crate) fn own_surrogates(&self) -> Option<&Vec<SurrogateRule>> {
        self.surrogates.as_ref()
    }

    pub(crate) fn own_surrogates_mut(&mut self) -> &mut Vec<SurrogateRule> {
        self.surrogates.get_or_insert_with(Vec::new)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id)
            .field("keys", &self.keys)
            .field("has_prototype", &self.prototype.is_some())
            .field("is_overlay", &self.is_overlay)
            .finish()
    }
}
