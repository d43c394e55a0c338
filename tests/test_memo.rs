//! Tests for memoized instantiation.

extern crate protoform;

use std::cell::Cell;
use std::rc::Rc;

use protoform::runtime::class::memo::{INSTANCE_MAPPER, INSTANCE_REGISTRY};
use protoform::runtime::class::{base_class, ClassObject};
use protoform::runtime::config::{scoped, Settings};
use protoform::runtime::ds::error::{ErrorKind, ObjError};
use protoform::runtime::ds::function_object::Function;
use protoform::runtime::ds::object::{Object, ObjectRef};
use protoform::runtime::ds::object_property::PropertyMap;
use protoform::runtime::ds::operations::object::{get_own_keys, get_own_property, put};
use protoform::runtime::ds::value::Value;

fn first_arg() -> Value {
    Value::Function(Function::new("first_arg", |_, args| {
        Ok(args.first().cloned().unwrap_or_default())
    }))
}

/// A memoized class plus a counter of `init` invocations.
fn counted_class() -> (ObjectRef, Rc<Cell<u32>>) {
    let inits = Rc::new(Cell::new(0));
    let counter = inits.clone();
    let class = base_class().extend(Some(&PropertyMap::new().with(
        "init",
        Function::new("init", move |_, _| {
            counter.set(counter.get() + 1);
            Ok(Value::Undefined)
        }),
    )));
    class.set_instance_mapper(&first_arg()).unwrap();
    (class, inits)
}

// ============================================================================
// Idempotence
// ============================================================================

mod idempotence_tests {
    use super::*;

    #[test]
    fn test_same_key_same_instance() {
        let (a, inits) = counted_class();
        let foo = a.create(&[Value::str("foo")]).unwrap();
        let again = a.create(&[Value::str("foo")]).unwrap();
        let bar = a.create(&[Value::str("bar")]).unwrap();
        assert!(Rc::ptr_eq(&foo, &again));
        assert!(!Rc::ptr_eq(&foo, &bar));
        assert_eq!(inits.get(), 2);

        let registry = match a.get(INSTANCE_REGISTRY).unwrap() {
            Value::Object(r) => r,
            other => panic!("registry is {:?}", other),
        };
        assert_eq!(get_own_keys(&registry), vec!["foo", "bar"]);
        assert!(Rc::ptr_eq(&a.get_instance("foo").unwrap(), &foo));
        assert!(Rc::ptr_eq(&a.get_instance("bar").unwrap(), &bar));
    }

    #[test]
    fn test_clear_forces_new_instance() {
        let (a, inits) = counted_class();
        let first = a.create(&[Value::str("foo")]).unwrap();
        a.clear_instance_registry().unwrap();
        let second = a.create(&[Value::str("foo")]).unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
        assert_eq!(inits.get(), 2);
    }

    #[test]
    fn test_cache_hit_skips_surrogates() {
        let (a, _) = counted_class();
        let filtered = Rc::new(Cell::new(0));
        let counter = filtered.clone();
        let sub = a.extend(None);
        let provided = sub.clone();
        a.add_surrogate_provider(
            move || Some(provided.clone()),
            &Value::Function(Function::new("filter", move |_, _| {
                counter.set(counter.get() + 1);
                Ok(Value::Boolean(true))
            })),
        )
        .unwrap();

        let x = a.create(&[Value::str("k")]).unwrap();
        let y = a.create(&[Value::str("k")]).unwrap();
        assert!(Rc::ptr_eq(&x, &y));
        assert!(x.is_a(&sub));
        assert_eq!(filtered.get(), 1);
    }

    #[test]
    fn test_object_keys_are_distinct() {
        let (a, _) = counted_class();
        let k1 = base_class().extend(None);
        let k2 = base_class().extend(None);
        let x = a.create(&[Value::Object(k1.clone())]).unwrap();
        let y = a.create(&[Value::Object(k2)]).unwrap();
        let z = a.create(&[Value::Object(k1)]).unwrap();
        assert!(!Rc::ptr_eq(&x, &y));
        assert!(Rc::ptr_eq(&x, &z));
    }
}

// ============================================================================
// Lineage
// ============================================================================

mod lineage_tests {
    use super::*;

    #[test]
    fn test_mapper_and_registry_are_hidden() {
        let (a, _) = counted_class();
        let mapper = get_own_property(&a, INSTANCE_MAPPER).unwrap();
        let registry = get_own_property(&a, INSTANCE_REGISTRY).unwrap();
        assert!(!mapper.is_enumerable() && !mapper.is_writable());
        assert!(!registry.is_enumerable() && registry.is_writable());
    }

    #[test]
    fn test_descendants_share_registry() {
        let (a, _) = counted_class();
        let b = a.extend(None);
        assert!(b.is_memoized());
        let from_b = b.create(&[Value::str("shared")]).unwrap();
        assert!(Rc::ptr_eq(&a.get_instance("shared").unwrap(), &from_b));

        let err = b.clear_instance_registry().unwrap_err();
        assert_eq!(err, ObjError::NotOwner);
        assert_eq!(err.kind(), ErrorKind::Structural);

        a.clear_instance_registry().unwrap();
        assert!(b.get_instance("shared").is_none());
    }

    #[test]
    fn test_remapping_descendant_rejected() {
        let (a, _) = counted_class();
        let b = a.extend(None);
        assert_eq!(
            b.set_instance_mapper(&first_arg()).unwrap_err(),
            ObjError::AlreadyMemoized
        );
    }

    #[test]
    fn test_memoized_surrogate_of_unmemoized_class() {
        let inits = Rc::new(Cell::new(0));
        let counter = inits.clone();
        let base = base_class().extend(Some(&PropertyMap::new().with(
            "init",
            Function::new("init", move |_, _| {
                counter.set(counter.get() + 1);
                Ok(Value::Undefined)
            }),
        )));
        let sub = base.extend(None);
        sub.set_instance_mapper(&first_arg()).unwrap();
        let ns = Object::new_plain();
        put(&ns, "Sub", Value::Object(sub.clone()));
        base.add_surrogate(
            &Value::Object(ns),
            &Value::str("Sub"),
            &Value::Function(Function::new("always", |_, _| Ok(Value::Boolean(true)))),
        )
        .unwrap();

        assert!(!base.is_memoized());
        let x = base.create(&[Value::str("foo")]).unwrap();
        assert!(x.is_a(&sub));
        assert!(Rc::ptr_eq(&sub.get_instance("foo").unwrap(), &x));
        assert!(Rc::ptr_eq(&base.create(&[Value::str("foo")]).unwrap(), &x));
        assert!(Rc::ptr_eq(&sub.create(&[Value::str("foo")]).unwrap(), &x));
        assert!(!Rc::ptr_eq(&base.create(&[Value::str("bar")]).unwrap(), &x));
        assert_eq!(inits.get(), 2);
    }

    #[test]
    fn test_unmemoized_class() {
        let class = base_class().extend(None);
        assert!(!class.is_memoized());
        assert_eq!(class.clear_instance_registry().unwrap_err(), ObjError::NotOwner);
        assert!(class.set_instance_mapper(&Value::str("nope")).is_err());
    }

    #[test]
    fn test_memoized_in_testing_mode() {
        let _s = scoped(Settings::default().with_testing(true));
        let (a, inits) = counted_class();
        let x = a.create(&[Value::str("t")]).unwrap();
        let y = a.create(&[Value::str("t")]).unwrap();
        assert!(Rc::ptr_eq(&x, &y));
        assert_eq!(inits.get(), 1);
        a.clear_instance_registry().unwrap();
        assert!(a.get_instance("t").is_none());
    }
}
