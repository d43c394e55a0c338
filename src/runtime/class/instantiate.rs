use std::rc::Rc;

use tracing::debug;

use crate::runtime::class::memo::{add_instance, get_instance, instance_key, instance_registry};
use crate::runtime::class::surrogate::get_surrogate;
use crate::runtime::class::extend;
use crate::runtime::ds::error::ObjError;
use crate::runtime::ds::object::ObjectRef;
use crate::runtime::ds::operations::object::{get, is_prototype_of};
use crate::runtime::ds::value::Value;

pub const INIT: &str = "init";

/// Instantiates `class` with `args`.
///
/// A memoized class is consulted first; a cache hit skips surrogate
/// selection and `init` entirely. Otherwise the surrogate (if any) becomes
/// the effective class, a bare instance is extended from it and its `init`
/// runs with the instance as receiver. `init` may return `undefined` or
/// another object that descends from the effective class.
///
/// A surrogate with a registry of its own is consulted and written the same
/// way, after selection.
pub fn create(class: &ObjectRef, args: &[Value]) -> Result<ObjectRef, ObjError> {
    let key = instance_key(class, args)?;
    if let Some(key) = &key {
        if let Some(cached) = get_instance(class, key) {
            debug!(key = %key, "memoized instance reused");
            return Ok(cached);
        }
    }

    let effective = get_surrogate(class, args)?.unwrap_or_else(|| class.clone());
    let effective_key = if separate_registry(class, &effective) {
        instance_key(&effective, args)?
    } else {
        None
    };
    if let Some(key) = &effective_key {
        if let Some(cached) = get_instance(&effective, key) {
            debug!(key = %key, "memoized surrogate instance reused");
            return Ok(cached);
        }
    }

    let bare = extend(&effective, None);

    let init = match get(&effective, INIT)? {
        Value::Undefined => return Err(ObjError::MissingInit),
        Value::Function(init) => init,
        _ => return Err(ObjError::NotCallable(INIT.to_string())),
    };
    let instance = match init.call(&Value::Object(bare.clone()), args)? {
        Value::Undefined => bare,
        Value::Object(other)
            if !Rc::ptr_eq(&other, &effective) && is_prototype_of(&effective, &other) =>
        {
            other
        }
        _ => return Err(ObjError::InvalidInitResult),
    };

    if let Some(key) = key {
        add_instance(class, &key, &instance)?;
    }
    if let Some(key) = effective_key {
        add_instance(&effective, &key, &instance)?;
    }
    Ok(instance)
}

/// True when `effective` is memoized through a registry `class` can't see.
fn separate_registry(class: &ObjectRef, effective: &ObjectRef) -> bool {
    if Rc::ptr_eq(class, effective) {
        return false;
    }
    match (instance_registry(class), instance_registry(effective)) {
        (_, None) => false,
        (Some(ours), Some(theirs)) => !Rc::ptr_eq(&ours, &theirs),
        (None, Some(_)) => true,
    }
}
