//! # protoform - prototype-based object composition
//!
//! A small runtime for building class hierarchies out of prototype-linked
//! objects:
//! - attribute-controlled property installation (public, private, constant,
//!   method, mock)
//! - class extension with an optional testing layer for mocks
//! - surrogate selection at instantiation time
//! - per-lineage memoization of instances
//! - deferred properties computed on first read
//!
//! ## Quick Start
//!
//! ```
//! use protoform::runtime::class::{base_class, ClassObject};
//! use protoform::runtime::ds::function_object::Function;
//! use protoform::runtime::ds::object_property::PropertyMap;
//! use protoform::runtime::ds::value::Value;
//!
//! let animal = base_class().extend(Some(
//!     &PropertyMap::new()
//!         .with(
//!             "init",
//!             Function::new("init", |this, args| {
//!                 let this = this.as_object().cloned().unwrap();
//!                 this.set("name", args[0].clone())?;
//!                 Ok(Value::Undefined)
//!             }),
//!         )
//!         .with(
//!             "describe",
//!             Function::new("describe", |this, _| {
//!                 let this = this.as_object().cloned().unwrap();
//!                 Ok(Value::str(format!("animal {}", this.get("name")?)))
//!             }),
//!         ),
//! ));
//!
//! let rex = animal.create(&[Value::str("rex")]).unwrap();
//! assert_eq!(rex.call("describe", &[]).unwrap(), Value::str("animal rex"));
//! assert!(rex.is_a(&animal));
//! ```
//!
//! ## Memoization
//!
//! ```
//! use protoform::runtime::class::{base_class, ClassObject};
//! use protoform::runtime::ds::function_object::Function;
//! use protoform::runtime::ds::object_property::PropertyMap;
//! use protoform::runtime::ds::value::Value;
//! use std::rc::Rc;
//!
//! let color = base_class().extend(Some(&PropertyMap::new().with(
//!     "init",
//!     Function::new("init", |_, _| Ok(Value::Undefined)),
//! )));
//! color
//!     .set_instance_mapper(&Value::Function(Function::new("key", |_, args| {
//!         Ok(args[0].clone())
//!     })))
//!     .unwrap();
//!
//! let red = color.create(&[Value::str("red")]).unwrap();
//! let again = color.create(&[Value::str("red")]).unwrap();
//! assert!(Rc::ptr_eq(&red, &again));
//! ```
//!
//! ## Architecture
//!
//! - **[`runtime::ds`]** - values, objects, descriptors and primitive operations
//! - **[`runtime::config`]** - settings, testing mode and the capability probe
//! - **[`runtime::descriptor`]** - the definition verbs
//! - **[`runtime::class`]** - extension, surrogates, memoization, `create`
//! - **[`runtime::deferred`]** - `postpone`, `promise` and `amend`
//!
//! All runtime state (settings, the base class, the global root and the
//! unfulfilled registry) is kept per thread.

#[macro_use]
extern crate lazy_static;

pub mod runtime;
