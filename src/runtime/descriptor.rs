//! The descriptor engine: installs properties with a fixed attribute triple.
//!
//! Every verb here is all-or-nothing. Either every entry of the supplied
//! [`PropertyMap`] is installed, or none is: validation failures on keys
//! raise, malformed method maps and clashes with existing non-configurable
//! properties are logged and the call becomes a no-op.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::runtime::class::base_class;
use crate::runtime::config;
use crate::runtime::ds::error::ObjError;
use crate::runtime::ds::object::ObjectRef;
use crate::runtime::ds::object_property::{
    PropertyAttributes, PropertyDescriptor, PropertyMap, PropertyValue,
};
use crate::runtime::ds::operations::object::{get_own_keys, get_own_property, get_prototype};
use crate::runtime::ds::operations::validation::{assert_all_functions, assert_all_prefixed};
use crate::runtime::ds::value::Value;

/// Where definitions on `o` land: the sealed layer behind an overlay
/// handle, or the object itself.
pub fn resolution_target(o: &ObjectRef) -> ObjectRef {
    let ob = o.borrow();
    if ob.is_overlay() {
        if let Some(sealed) = ob.get_prototype_of() {
            return sealed;
        }
    }
    o.clone()
}

fn to_descriptor(value: &PropertyValue, attributes: PropertyAttributes) -> PropertyDescriptor {
    let settings = config::current();
    match value {
        PropertyValue::Accessor { get, set } => PropertyDescriptor::accessor(
            get.clone(),
            set.clone(),
            attributes.enumerable,
            attributes.configurable,
        ),
        PropertyValue::Value(v) if settings.sloppy => {
            PropertyDescriptor::data(v.clone(), PropertyAttributes::PLAIN)
        }
        PropertyValue::Value(v) => PropertyDescriptor::data(
            v.clone(),
            PropertyAttributes {
                writable: attributes.writable || settings.messy,
                ..attributes
            },
        ),
    }
}

/// Installs `descriptors` on `dst` if every one of them is accepted.
/// Returns the first rejected key otherwise.
fn define_all(
    dst: &ObjectRef,
    descriptors: Vec<(String, PropertyDescriptor)>,
) -> Result<(), (String, ObjError)> {
    {
        let db = dst.borrow();
        for (key, pd) in &descriptors {
            if let Err(e) = db.can_define_own_property(key, pd) {
                return Err((key.clone(), e));
            }
        }
    }
    let mut db = dst.borrow_mut();
    for (key, pd) in descriptors {
        db.force_define_own_property(&key, pd);
    }
    Ok(())
}

fn install(
    operation: &'static str,
    dst: &ObjectRef,
    properties: &PropertyMap,
    attributes: PropertyAttributes,
) {
    let descriptors = properties
        .iter()
        .map(|(k, v)| (k.clone(), to_descriptor(v, attributes)))
        .collect::<Vec<_>>();
    if let Err((key, e)) = define_all(dst, descriptors) {
        warn!(operation, key = %key, error = %e, "property already defined, call skipped");
    }
}

/// Installs every entry of `properties` on `target` with the given
/// attributes. Accessor pairs ignore `writable`.
pub fn assign(
    target: &ObjectRef,
    properties: &PropertyMap,
    writable: bool,
    enumerable: bool,
    configurable: bool,
) -> ObjectRef {
    let dst = resolution_target(target);
    install(
        "assign",
        &dst,
        properties,
        PropertyAttributes::new(writable, enumerable, configurable),
    );
    target.clone()
}

fn functions_or_warn(operation: &'static str, properties: &PropertyMap) -> bool {
    match assert_all_functions(operation, properties) {
        Ok(()) => true,
        Err(e) => {
            warn!(operation, error = %e, "method map rejected, call skipped");
            false
        }
    }
}

pub fn add_method(target: &ObjectRef, methods: &PropertyMap) -> ObjectRef {
    if functions_or_warn("add_method", methods) {
        install("add_method", &resolution_target(target), methods, PropertyAttributes::METHOD);
    }
    target.clone()
}

pub fn add_private_method(target: &ObjectRef, methods: &PropertyMap) -> Result<ObjectRef, ObjError> {
    assert_all_prefixed(&config::private_prefix(), methods)?;
    if functions_or_warn("add_private_method", methods) {
        install(
            "add_private_method",
            &resolution_target(target),
            methods,
            PropertyAttributes::PRIVATE_METHOD,
        );
    }
    Ok(target.clone())
}

pub fn add_public(target: &ObjectRef, properties: &PropertyMap) -> ObjectRef {
    install("add_public", &resolution_target(target), properties, PropertyAttributes::PUBLIC);
    target.clone()
}

pub fn add_private(target: &ObjectRef, properties: &PropertyMap) -> Result<ObjectRef, ObjError> {
    assert_all_prefixed(&config::private_prefix(), properties)?;
    install("add_private", &resolution_target(target), properties, PropertyAttributes::PRIVATE);
    Ok(target.clone())
}

pub fn add_constant(target: &ObjectRef, properties: &PropertyMap) -> ObjectRef {
    install("add_constant", &resolution_target(target), properties, PropertyAttributes::CONSTANT);
    target.clone()
}

pub fn add_private_constant(
    target: &ObjectRef,
    properties: &PropertyMap,
) -> Result<ObjectRef, ObjError> {
    assert_all_prefixed(&config::private_prefix(), properties)?;
    install(
        "add_private_constant",
        &resolution_target(target),
        properties,
        PropertyAttributes::PRIVATE_CONSTANT,
    );
    Ok(target.clone())
}

fn same_link(a: &Option<ObjectRef>, b: &Option<ObjectRef>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

/// Copies every own property of the trait onto the host, descriptors
/// unchanged. The trait must extend the host's parent or the base class.
pub fn add_trait(host: &ObjectRef, trait_object: &ObjectRef) -> Result<ObjectRef, ObjError> {
    let src = resolution_target(trait_object);
    let dst = resolution_target(host);
    let src_parent = get_prototype(&src);
    let dst_parent = get_prototype(&dst);
    if !same_link(&src_parent, &dst_parent) && !same_link(&src_parent, &Some(base_class())) {
        return Err(ObjError::StructuralMismatch);
    }
    let descriptors = get_own_keys(&src)
        .into_iter()
        .filter_map(|k| get_own_property(&src, &k).map(|pd| (k, pd)))
        .collect::<Vec<_>>();
    debug!(count = descriptors.len(), "copying trait properties");
    define_all(&dst, descriptors).map_err(|(_, e)| e)?;
    Ok(host.clone())
}

/// Shadows methods with deletable replacements. Only allowed in testing mode.
pub fn add_mock(target: &ObjectRef, mocks: &PropertyMap) -> Result<ObjectRef, ObjError> {
    if !config::is_testing() {
        return Err(ObjError::MockOutsideTesting);
    }
    if functions_or_warn("add_mock", mocks) {
        install("add_mock", target, mocks, PropertyAttributes::MOCK);
    }
    Ok(target.clone())
}

/// Deletes every own enumerable, configurable, function-valued property of
/// `target`, uncovering whatever the prototype chain holds underneath.
pub fn remove_mocks(target: &ObjectRef) -> ObjectRef {
    let mock_keys = {
        let tb = target.borrow();
        tb.own_property_keys()
            .into_iter()
            .filter(|k| match tb.get_own_property(k) {
                Some(PropertyDescriptor::Data {
                    value: Value::Function(_),
                    enumerable: true,
                    configurable: true,
                    ..
                }) => true,
                _ => false,
            })
            .collect::<Vec<_>>()
    };
    let mut tb = target.borrow_mut();
    for key in &mock_keys {
        tb.delete(key);
    }
    debug!(count = mock_keys.len(), "mocks removed");
    target.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::config::{scoped, Settings};
    use crate::runtime::ds::function_object::Function;
    use crate::runtime::ds::object::Object;
    use crate::runtime::ds::operations::object::{get, set};

    fn noop(name: &str) -> Function {
        Function::new(name, |_, _| Ok(Value::Undefined))
    }

    #[test]
    fn test_assign_attributes() {
        let _s = scoped(Settings::default());
        let o = Object::new_plain();
        assign(&o, &PropertyMap::new().with("a", 1), false, false, true);
        let pd = get_own_property(&o, "a").unwrap();
        assert_eq!(
            pd,
            PropertyDescriptor::data(Value::from(1), PropertyAttributes::new(false, false, true))
        );
    }

    #[test]
    fn test_assign_accessor() {
        let _s = scoped(Settings::default());
        let o = Object::new_plain();
        let getter = Function::new("g", |_, _| Ok(Value::from(42)));
        assign(
            &o,
            &PropertyMap::new().with_accessor("x", Some(getter), None),
            false,
            true,
            false,
        );
        assert!(get_own_property(&o, "x").unwrap().is_accessor_descriptor());
        assert_eq!(get(&o, "x").unwrap(), Value::from(42));
    }

    #[test]
    fn test_messy_forces_writable() {
        let _s = scoped(Settings::default().with_messy(true));
        let o = Object::new_plain();
        add_constant(&o, &PropertyMap::new().with("c", 1));
        assert!(get_own_property(&o, "c").unwrap().is_writable());
        set(&o, "c", Value::from(2)).unwrap();
    }

    #[test]
    fn test_sloppy_plain_assignment() {
        let _s = scoped(Settings::default().with_sloppy(true));
        let o = Object::new_plain();
        add_constant(&o, &PropertyMap::new().with("c", 1));
        assert_eq!(
            get_own_property(&o, "c").unwrap(),
            PropertyDescriptor::data(Value::from(1), PropertyAttributes::PLAIN)
        );
    }

    #[test]
    fn test_add_method_rejects_non_functions() {
        let _s = scoped(Settings::default());
        let o = Object::new_plain();
        add_method(&o, &PropertyMap::new().with("ok", noop("ok")).with("bad", 3));
        assert!(get_own_keys(&o).is_empty());
    }

    #[test]
    fn test_private_prefix_enforced() {
        let _s = scoped(Settings::default());
        let o = Object::new_plain();
        let r = add_private(&o, &PropertyMap::new().with("_a", 1).with("b", 2));
        assert!(matches!(r, Err(ObjError::NotPrefixed { .. })));
        assert!(get_own_keys(&o).is_empty());
        add_private(&o, &PropertyMap::new().with("_a", 1)).unwrap();
        assert!(!get_own_property(&o, "_a").unwrap().is_enumerable());
    }

    #[test]
    fn test_custom_prefix() {
        let _s = scoped(Settings::default().with_private_prefix("$"));
        let o = Object::new_plain();
        assert!(add_private_constant(&o, &PropertyMap::new().with("_a", 1)).is_err());
        assert!(add_private_constant(&o, &PropertyMap::new().with("$a", 1)).is_ok());
    }

    #[test]
    fn test_clash_is_all_or_nothing() {
        let _s = scoped(Settings::default());
        let o = Object::new_plain();
        add_constant(&o, &PropertyMap::new().with("a", 1));
        add_constant(&o, &PropertyMap::new().with("b", 2).with("a", 3));
        assert!(!o.borrow().has_own_property("b"));
        assert_eq!(get(&o, "a").unwrap(), Value::from(1));
    }

    #[test]
    fn test_mock_requires_testing() {
        let _s = scoped(Settings::default());
        let o = Object::new_plain();
        assert_eq!(
            add_mock(&o, &PropertyMap::new().with("m", noop("m"))).err(),
            Some(ObjError::MockOutsideTesting)
        );
    }

    #[test]
    fn test_remove_mocks_keeps_data() {
        let _s = scoped(Settings::default().with_testing(true));
        let o = Object::new_plain();
        set(&o, "data", Value::from(1)).unwrap();
        add_mock(&o, &PropertyMap::new().with("m", noop("m"))).unwrap();
        remove_mocks(&o);
        assert_eq!(get_own_keys(&o), vec!["data".to_string()]);
    }
}
