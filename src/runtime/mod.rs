//! The object-composition runtime.
//!
//! - **[`ds`]** - values, objects, descriptors and primitive operations
//! - **[`config`]** - per-runtime settings and the capability probe
//! - **[`descriptor`]** - attribute-controlled property installation
//! - **[`class`]** - extension, surrogates, memoization and instantiation
//! - **[`deferred`]** - lazily computed, once-only properties

pub mod class;
pub mod config;
pub mod deferred;
pub mod descriptor;
pub mod ds;
