//! Classes as prototype-linked objects.
//!
//! A class is an [`ObjectRef`] whose chain ends at the per-runtime
//! [`base_class`]. Every verb a class understands is available through the
//! [`ClassObject`] trait, which is implemented for `ObjectRef` so that
//! instances, traits and classes share one vocabulary:
//!
//! ```
//! use protoform::runtime::class::{base_class, ClassObject};
//! use protoform::runtime::ds::function_object::Function;
//! use protoform::runtime::ds::object_property::PropertyMap;
//! use protoform::runtime::ds::value::Value;
//!
//! let point = base_class().extend(Some(&PropertyMap::new().with(
//!     "init",
//!     Function::new("init", |this, args| {
//!         let this = this.as_object().cloned().unwrap();
//!         this.set("x", args[0].clone())?;
//!         Ok(Value::Undefined)
//!     }),
//! )));
//! let p = point.create(&[Value::from(3)]).unwrap();
//! assert_eq!(p.get("x").unwrap(), Value::from(3));
//! ```
//!
//! ## Testing mode
//!
//! While [`config::is_testing`] is on, [`extend`] hands out an *overlay*
//! whose prototype is the *sealed* layer that actually carries the class's
//! definitions:
//!
//! ```text
//! overlay (mocks only) -> sealed (methods, constants, traits) -> parent
//! ```
//!
//! Mocks go on the overlay and shadow the sealed methods until
//! `remove_mocks` deletes them again.

pub mod instantiate;
pub mod memo;
pub mod surrogate;

use std::rc::Rc;

use tracing::debug;

use crate::runtime::config;
use crate::runtime::descriptor;
use crate::runtime::ds::error::ObjError;
use crate::runtime::ds::object::{Object, ObjectRef};
use crate::runtime::ds::object_property::PropertyMap;
use crate::runtime::ds::operations::object;
use crate::runtime::ds::value::Value;

thread_local! {
    static BASE_CLASS: ObjectRef = Object::new_plain();
}

/// The root every class chain ends at.
pub fn base_class() -> ObjectRef {
    BASE_CLASS.with(|b| b.clone())
}

/// Derives a new object from `parent`, inserting the sealed layer in
/// testing mode, and installs `methods` on it.
pub fn extend(parent: &ObjectRef, methods: Option<&PropertyMap>) -> ObjectRef {
    let result = if config::is_testing() {
        let sealed = object::create_with_prototype(parent);
        let overlay = object::create_with_prototype(&sealed);
        overlay.borrow_mut().mark_overlay();
        overlay
    } else {
        object::create_with_prototype(parent)
    };
    debug!(id = %result.borrow().id(), overlay = result.borrow().is_overlay(), "extended");
    if let Some(methods) = methods {
        descriptor::add_method(&result, methods);
    }
    result
}

/// The nearest ancestor that is not an injected testing layer.
pub fn class_parent(o: &ObjectRef) -> Option<ObjectRef> {
    let target = descriptor::resolution_target(o);
    object::get_prototype(&target)
}

pub trait ClassObject {
    fn extend(&self, methods: Option<&PropertyMap>) -> ObjectRef;

    fn class_parent(&self) -> Option<ObjectRef>;

    fn assign(
        &self,
        properties: &PropertyMap,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    ) -> ObjectRef;

    fn add_method(&self, methods: &PropertyMap) -> ObjectRef;

    fn add_private_method(&self, methods: &PropertyMap) -> Result<ObjectRef, ObjError>;

    fn add_public(&self, properties: &PropertyMap) -> ObjectRef;

    fn add_private(&self, properties: &PropertyMap) -> Result<ObjectRef, ObjError>;

    fn add_constant(&self, properties: &PropertyMap) -> ObjectRef;

    fn add_private_constant(&self, properties: &PropertyMap) -> Result<ObjectRef, ObjError>;

    fn add_trait(&self, trait_object: &ObjectRef) -> Result<ObjectRef, ObjError>;

    fn add_mock(&self, mocks: &PropertyMap) -> Result<ObjectRef, ObjError>;

    fn remove_mocks(&self) -> ObjectRef;

    fn add_surrogate(
        &self,
        container: &Value,
        identifier: &Value,
        filter: &Value,
    ) -> Result<ObjectRef, ObjError>;

    fn add_surrogate_provider<F>(&self, provider: F, filter: &Value) -> Result<ObjectRef, ObjError>
    where
        F: Fn() -> Option<ObjectRef> + 'static;

    fn get_surrogate(&self, args: &[Value]) -> Result<Option<ObjectRef>, ObjError>;

    fn set_instance_mapper(&self, mapper: &Value) -> Result<ObjectRef, ObjError>;

    fn is_memoized(&self) -> bool;

    fn add_instance(&self, key: &str, instance: &ObjectRef) -> Result<(), ObjError>;

    fn get_instance(&self, key: &str) -> Option<ObjectRef>;

    fn clear_instance_registry(&self) -> Result<ObjectRef, ObjError>;

    fn create(&self, args: &[Value]) -> Result<ObjectRef, ObjError>;

    fn get(&self, key: &str) -> Result<Value, ObjError>;

    fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), ObjError>;

    fn call(&self, name: &str, args: &[Value]) -> Result<Value, ObjError>;

    fn is_a(&self, class: &ObjectRef) -> bool;
}

impl ClassObject for ObjectRef {
    fn extend(&self, methods: Option<&PropertyMap>) -> ObjectRef {
        extend(self, methods)
    }

    fn class_parent(&self) -> Option<ObjectRef> {
        class_parent(self)
    }

    fn assign(
        &self,
        properties: &PropertyMap,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    ) -> ObjectRef {
        descriptor::assign(self, properties, writable, enumerable, configurable)
    }

    fn add_method(&self, methods: &PropertyMap) -> ObjectRef {
        descriptor::add_method(self, methods)
    }

    fn add_private_method(&self, methods: &PropertyMap) -> Result<ObjectRef, ObjError> {
        descriptor::add_private_method(self, methods)
    }

    fn add_public(&self, properties: &PropertyMap) -> ObjectRef {
        descriptor::add_public(self, properties)
    }

    fn add_private(&self, properties: &PropertyMap) -> Result<ObjectRef, ObjError> {
        descriptor::add_private(self, properties)
    }

    fn add_constant(&self, properties: &PropertyMap) -> ObjectRef {
        descriptor::add_constant(self, properties)
    }

    fn add_private_constant(&self, properties: &PropertyMap) -> Result<ObjectRef, ObjError> {
        descriptor::add_private_constant(self, properties)
    }

    fn add_trait(&self, trait_object: &ObjectRef) -> Result<ObjectRef, ObjError> {
        descriptor::add_trait(self, trait_object)
    }

    fn add_mock(&self, mocks: &PropertyMap) -> Result<ObjectRef, ObjError> {
        descriptor::add_mock(self, mocks)
    }

    fn remove_mocks(&self) -> ObjectRef {
        descriptor::remove_mocks(self)
    }

    fn add_surrogate(
        &self,
        container: &Value,
        identifier: &Value,
        filter: &Value,
    ) -> Result<ObjectRef, ObjError> {
        surrogate::add_surrogate(self, container, identifier, filter)
    }

    fn add_surrogate_provider<F>(&self, provider: F, filter: &Value) -> Result<ObjectRef, ObjError>
    where
        F: Fn() -> Option<ObjectRef> + 'static,
    {
        surrogate::add_surrogate_provider(self, provider, filter)
    }

    fn get_surrogate(&self, args: &[Value]) -> Result<Option<ObjectRef>, ObjError> {
        surrogate::get_surrogate(self, args)
    }

    fn set_instance_mapper(&self, mapper: &Value) -> Result<ObjectRef, ObjError> {
        memo::set_instance_mapper(self, mapper)
    }

    fn is_memoized(&self) -> bool {
        memo::is_memoized(self)
    }

    fn add_instance(&self, key: &str, instance: &ObjectRef) -> Result<(), ObjError> {
        memo::add_instance(self, key, instance)
    }

    fn get_instance(&self, key: &str) -> Option<ObjectRef> {
        memo::get_instance(self, key)
    }

    fn clear_instance_registry(&self) -> Result<ObjectRef, ObjError> {
        memo::clear_instance_registry(self)
    }

    fn create(&self, args: &[Value]) -> Result<ObjectRef, ObjError> {
        instantiate::create(self, args)
    }

    fn get(&self, key: &str) -> Result<Value, ObjError> {
        object::get(self, key)
    }

    fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), ObjError> {
        object::set(self, key, value.into())
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value, ObjError> {
        object::call_method(self, name, args)
    }

    fn is_a(&self, class: &ObjectRef) -> bool {
        Rc::ptr_eq(self, class) || object::is_prototype_of(class, self)
    }
}
