//! Data structures: values, objects, property descriptors, functions and
//! the primitive operations over them.

pub mod error;
pub mod function_object;
pub mod object;
pub mod object_property;
pub mod operations;
pub mod value;
