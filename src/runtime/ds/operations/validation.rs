//! Precondition checks. Each one raises a validation error naming the
//! operation that was called, or hands back the checked value.

use std::rc::Rc;

use crate::runtime::class::base_class;
use crate::runtime::ds::error::ObjError;
use crate::runtime::ds::function_object::Function;
use crate::runtime::ds::object::ObjectRef;
use crate::runtime::ds::object_property::PropertyMap;
use crate::runtime::ds::operations::object::get_prototype;
use crate::runtime::ds::value::{Value, TYPE_STR_FUNCTION, TYPE_STR_OBJECT, TYPE_STR_STRING};

fn mismatch(operation: &'static str, expected: &'static str, found: &Value) -> ObjError {
    ObjError::Validation {
        operation,
        expected,
        found: found.type_name().to_string(),
    }
}

pub fn assert_is_function<'a>(
    operation: &'static str,
    value: &'a Value,
) -> Result<&'a Function, ObjError> {
    match value {
        Value::Function(f) => Ok(f),
        _ => Err(mismatch(operation, TYPE_STR_FUNCTION, value)),
    }
}

pub fn assert_is_string<'a>(operation: &'static str, value: &'a Value) -> Result<&'a str, ObjError> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(mismatch(operation, TYPE_STR_STRING, value)),
    }
}

pub fn assert_is_object<'a>(
    operation: &'static str,
    value: &'a Value,
) -> Result<&'a ObjectRef, ObjError> {
    match value {
        Value::Object(o) => Ok(o),
        _ => Err(mismatch(operation, TYPE_STR_OBJECT, value)),
    }
}

/// A plain object has no prototype or inherits directly from the base class.
pub fn assert_is_plain_object<'a>(
    operation: &'static str,
    value: &'a Value,
) -> Result<&'a ObjectRef, ObjError> {
    if let Value::Object(o) = value {
        let plain = match get_prototype(o) {
            None => true,
            Some(p) => Rc::ptr_eq(&p, &base_class()),
        };
        if plain {
            return Ok(o);
        }
    }
    Err(mismatch(operation, "plain object", value))
}

pub fn assert_all_functions(operation: &'static str, map: &PropertyMap) -> Result<(), ObjError> {
    for (key, value) in map.iter() {
        if value.as_function().is_none() {
            return Err(ObjError::Validation {
                operation,
                expected: TYPE_STR_FUNCTION,
                found: format!("non-function at '{}'", key),
            });
        }
    }
    Ok(())
}

pub fn assert_all_prefixed(prefix: &str, map: &PropertyMap) -> Result<(), ObjError> {
    match map.keys().find(|k| !k.starts_with(prefix)) {
        None => Ok(()),
        Some(key) => Err(ObjError::NotPrefixed {
            key: key.clone(),
            prefix: prefix.to_string(),
        }),
    }
}
