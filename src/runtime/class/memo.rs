//! Memoization: a per-lineage instance cache keyed by a mapper function.
//!
//! The mapper and the registry are ordinary (non-enumerable) properties of
//! the class that called [`set_instance_mapper`]. Descendants see both
//! through the prototype chain, so the whole lineage shares one registry.

use tracing::debug;

use crate::runtime::descriptor::resolution_target;
use crate::runtime::ds::error::ObjError;
use crate::runtime::ds::object::{Object, ObjectRef};
use crate::runtime::ds::object_property::{PropertyAttributes, PropertyDescriptor};
use crate::runtime::ds::operations::object::{find_property, get_own_property, put};
use crate::runtime::ds::operations::validation::assert_is_function;
use crate::runtime::ds::value::Value;

pub const INSTANCE_MAPPER: &str = "instanceMapper";
pub const INSTANCE_REGISTRY: &str = "instanceRegistry";

pub fn set_instance_mapper(class: &ObjectRef, mapper: &Value) -> Result<ObjectRef, ObjError> {
    assert_is_function("set_instance_mapper", mapper)?;
    if is_memoized(class) {
        return Err(ObjError::AlreadyMemoized);
    }
    let owner = resolution_target(class);
    let mapper_pd = PropertyDescriptor::data(mapper.clone(), PropertyAttributes::PRIVATE_CONSTANT);
    let registry_pd =
        PropertyDescriptor::data(Value::Object(Object::new_plain()), PropertyAttributes::PRIVATE);
    let mut ob = owner.borrow_mut();
    ob.can_define_own_property(INSTANCE_REGISTRY, &registry_pd)?;
    ob.define_own_property(INSTANCE_MAPPER, mapper_pd)?;
    ob.define_own_property(INSTANCE_REGISTRY, registry_pd)?;
    Ok(class.clone())
}

fn mapper(class: &ObjectRef) -> Option<Value> {
    match find_property(class, INSTANCE_MAPPER) {
        Some((_, PropertyDescriptor::Data { value, .. })) => match value {
            Value::Function(_) => Some(value),
            _ => None,
        },
        _ => None,
    }
}

/// True when a mapper is visible anywhere on the chain.
pub fn is_memoized(class: &ObjectRef) -> bool {
    mapper(class).is_some()
}

/// The nearest registry on the chain.
pub fn instance_registry(class: &ObjectRef) -> Option<ObjectRef> {
    match find_property(class, INSTANCE_REGISTRY) {
        Some((_, PropertyDescriptor::Data { value: Value::Object(registry), .. })) => Some(registry),
        _ => None,
    }
}

/// Runs the mapper over the instantiation arguments. `None` when the class
/// is not memoized.
pub fn instance_key(class: &ObjectRef, args: &[Value]) -> Result<Option<String>, ObjError> {
    match mapper(class) {
        Some(Value::Function(f)) => {
            let key = f.call(&Value::Object(class.clone()), args)?;
            Ok(Some(key.to_property_key()))
        }
        _ => Ok(None),
    }
}

pub fn add_instance(class: &ObjectRef, key: &str, instance: &ObjectRef) -> Result<(), ObjError> {
    let registry = instance_registry(class).ok_or(ObjError::NotOwner)?;
    put(&registry, key, Value::Object(instance.clone()));
    debug!(key = %key, "instance memoized");
    Ok(())
}

pub fn get_instance(class: &ObjectRef, key: &str) -> Option<ObjectRef> {
    let registry = instance_registry(class)?;
    match get_own_property(&registry, key) {
        Some(PropertyDescriptor::Data { value: Value::Object(instance), .. }) => Some(instance),
        _ => None,
    }
}

/// Swaps in an empty registry. Only the class that set the mapper may.
pub fn clear_instance_registry(class: &ObjectRef) -> Result<ObjectRef, ObjError> {
    let owner = resolution_target(class);
    if !owner.borrow().has_own_property(INSTANCE_REGISTRY) {
        return Err(ObjError::NotOwner);
    }
    owner
        .borrow_mut()
        .write_own_value(INSTANCE_REGISTRY, Value::Object(Object::new_plain()))?;
    debug!("instance registry cleared");
    Ok(class.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::class::{base_class, extend};
    use crate::runtime::ds::function_object::Function;
    use std::rc::Rc;

    fn identity_mapper() -> Value {
        Value::Function(Function::new("identity", |_, args| {
            Ok(args.first().cloned().unwrap_or_default())
        }))
    }

    #[test]
    fn test_set_mapper_once() {
        let class = extend(&base_class(), None);
        assert!(!is_memoized(&class));
        set_instance_mapper(&class, &identity_mapper()).unwrap();
        assert!(is_memoized(&class));
        assert_eq!(
            set_instance_mapper(&class, &identity_mapper()).err(),
            Some(ObjError::AlreadyMemoized)
        );
        let child = extend(&class, None);
        assert!(is_memoized(&child));
        assert_eq!(
            set_instance_mapper(&child, &identity_mapper()).err(),
            Some(ObjError::AlreadyMemoized)
        );
    }

    #[test]
    fn test_mapper_must_be_function() {
        let class = extend(&base_class(), None);
        assert!(set_instance_mapper(&class, &Value::from(1)).is_err());
        assert!(!is_memoized(&class));
    }

    #[test]
    fn test_registry_shared_with_descendants() {
        let class = extend(&base_class(), None);
        set_instance_mapper(&class, &identity_mapper()).unwrap();
        let child = extend(&class, None);
        let instance = extend(&child, None);
        add_instance(&child, "k", &instance).unwrap();
        assert!(Rc::ptr_eq(&get_instance(&class, "k").unwrap(), &instance));
        assert_eq!(clear_instance_registry(&child).err(), Some(ObjError::NotOwner));
        clear_instance_registry(&class).unwrap();
        assert!(get_instance(&child, "k").is_none());
    }

    #[test]
    fn test_instance_key() {
        let class = extend(&base_class(), None);
        assert_eq!(instance_key(&class, &[Value::str("a")]).unwrap(), None);
        set_instance_mapper(&class, &identity_mapper()).unwrap();
        assert_eq!(
            instance_key(&class, &[Value::str("a")]).unwrap(),
            Some("a".to_string())
        );
    }

    #[test]
    fn test_not_memoized_has_no_registry() {
        let class = extend(&base_class(), None);
        let instance = extend(&class, None);
        assert_eq!(add_instance(&class, "k", &instance), Err(ObjError::NotOwner));
        assert!(get_instance(&class, "k").is_none());
    }
}
