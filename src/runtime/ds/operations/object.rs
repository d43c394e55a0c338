//! Property-level operations that may call back into user code.
//!
//! Nothing here holds a `RefCell` borrow across a getter, setter or method
//! invocation, so callbacks are free to read and mutate the objects involved.

use std::rc::Rc;

use crate::runtime::ds::error::ObjError;
use crate::runtime::ds::object::{Object, ObjectRef};
use crate::runtime::ds::object_property::{PropertyAttributes, PropertyDescriptor};
use crate::runtime::ds::value::Value;

pub fn get_prototype(o: &ObjectRef) -> Option<ObjectRef> {
    o.borrow().get_prototype_of()
}

pub fn get_own_keys(o: &ObjectRef) -> Vec<String> {
    o.borrow().own_property_keys()
}

pub fn define_property(
    o: &ObjectRef,
    key: &str,
    descriptor: PropertyDescriptor,
) -> Result<(), ObjError> {
    o.borrow_mut().define_own_property(key, descriptor)
}

pub fn create_with_prototype(prototype: &ObjectRef) -> ObjectRef {
    Object::new_with_prototype(Some(prototype.clone()))
}

pub fn get_own_property(o: &ObjectRef, key: &str) -> Option<PropertyDescriptor> {
    o.borrow().get_own_property(key).cloned()
}

pub fn has_own_property(o: &ObjectRef, key: &str) -> bool {
    o.borrow().has_own_property(key)
}

pub fn has_property(o: &ObjectRef, key: &str) -> bool {
    find_property(o, key).is_some()
}

/// Walks the prototype chain starting at `o` and returns the first holder
/// of `key` together with a copy of its descriptor.
pub fn find_property(o: &ObjectRef, key: &str) -> Option<(ObjectRef, PropertyDescriptor)> {
    let mut current = Some(o.clone());
    while let Some(c) = current {
        let next = {
            let cb = c.borrow();
            if let Some(pd) = cb.get_own_property(key) {
                let pd = pd.clone();
                drop(cb);
                return Some((c, pd));
            }
            cb.get_prototype_of()
        };
        current = next;
    }
    None
}

/// `true` if `ancestor` appears anywhere on `o`'s prototype chain.
pub fn is_prototype_of(ancestor: &ObjectRef, o: &ObjectRef) -> bool {
    let mut p = get_prototype(o);
    while let Some(some_p) = p {
        if Rc::ptr_eq(&some_p, ancestor) {
            return true;
        }
        p = get_prototype(&some_p);
    }
    false
}

pub fn get(o: &ObjectRef, key: &str) -> Result<Value, ObjError> {
    get_with_receiver(o, key, &Value::Object(o.clone()))
}

pub fn get_with_receiver(o: &ObjectRef, key: &str, receiver: &Value) -> Result<Value, ObjError> {
    match find_property(o, key) {
        None => Ok(Value::Undefined),
        Some((_, pd)) => match pd {
            PropertyDescriptor::Data { value, .. } => Ok(value),
            PropertyDescriptor::Accessor { get, .. } => match get {
                None => Ok(Value::Undefined),
                Some(getter) => getter.call(receiver, &[]),
            },
        },
    }
}

/// Assignment semantics: the receiver is `o` itself.
pub fn set(o: &ObjectRef, key: &str, value: Value) -> Result<(), ObjError> {
    let receiver = Value::Object(o.clone());
    match find_property(o, key) {
        None => add_plain_property(o, key, value),
        Some((holder, pd)) => match pd {
            PropertyDescriptor::Data { writable, .. } => {
                if !writable {
                    Err(ObjError::ReadOnly(key.to_string()))
                } else if Rc::ptr_eq(&holder, o) {
                    o.borrow_mut().write_own_value(key, value)
                } else {
                    add_plain_property(o, key, value)
                }
            }
            PropertyDescriptor::Accessor { set, .. } => match set {
                None => Err(ObjError::ReadOnly(key.to_string())),
                Some(setter) => setter.call(&receiver, &[value]).map(|_| ()),
            },
        },
    }
}

fn add_plain_property(o: &ObjectRef, key: &str, value: Value) -> Result<(), ObjError> {
    o.borrow_mut()
        .define_own_property(key, PropertyDescriptor::data(value, PropertyAttributes::PLAIN))
}

/// Overwrites an own property with a plain data property, bypassing
/// descriptor validation.
pub fn put(o: &ObjectRef, key: &str, value: Value) {
    o.borrow_mut()
        .force_define_own_property(key, PropertyDescriptor::data(value, PropertyAttributes::PLAIN));
}

pub fn delete(o: &ObjectRef, key: &str) -> bool {
    o.borrow_mut().delete(key)
}

/// Looks `name` up on `o` and calls it with `o` as the receiver.
pub fn call_method(o: &ObjectRef, name: &str, args: &[Value]) -> Result<Value, ObjError> {
    match get(o, name)? {
        Value::Function(f) => f.call(&Value::Object(o.clone()), args),
        _ => Err(ObjError::NotCallable(name.to_string())),
    }
}

/// Resolves a dotted path (`a.b.c`) starting at `root`. Returns `None` as
/// soon as a segment is missing or is not an object.
pub fn resolve_path(root: &ObjectRef, path: &str) -> Result<Option<ObjectRef>, ObjError> {
    let mut current = root.clone();
    if path.is_empty() {
        return Ok(Some(current));
    }
    for segment in path.split('.') {
        match get(&current, segment)? {
            Value::Object(o) => current = o,
            _ => return Ok(None),
        }
    }
    Ok(Some(current))
}
