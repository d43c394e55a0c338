//! Dotted-path addressing for promised properties.
//!
//! Paths are resolved against a per-runtime global root object, one
//! segment at a time. Every promised property declared with a derivable
//! path is tracked in the unfulfilled registry until it resolves.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::runtime::ds::error::ObjError;
use crate::runtime::ds::object::{Object, ObjectRef};
use crate::runtime::ds::operations::object::resolve_path;

pub const PATH_SEPARATOR: char = '.';

thread_local! {
    static GLOBAL_ROOT: RefCell<ObjectRef> = RefCell::new(Object::new_plain());
    static UNFULFILLED: RefCell<BTreeMap<String, bool>> = RefCell::new(BTreeMap::new());
}

/// The object textual paths start from.
pub fn global_root() -> ObjectRef {
    GLOBAL_ROOT.with(|r| r.borrow().clone())
}

/// Snapshot of every tracked, still unresolved path (always mapped to `true`).
pub fn unfulfilled() -> BTreeMap<String, bool> {
    UNFULFILLED.with(|u| u.borrow().clone())
}

pub fn is_unfulfilled(path: &str) -> bool {
    UNFULFILLED.with(|u| u.borrow().contains_key(path))
}

/// Forgets every tracked path and installs a fresh global root.
pub fn reset() {
    UNFULFILLED.with(|u| u.borrow_mut().clear());
    GLOBAL_ROOT.with(|r| *r.borrow_mut() = Object::new_plain());
}

pub(crate) fn track(path: &str) {
    UNFULFILLED.with(|u| u.borrow_mut().insert(path.to_string(), true));
}

pub(crate) fn fulfil(path: &str) {
    UNFULFILLED.with(|u| u.borrow_mut().remove(path));
}

/// The three ways a promised property can be addressed.
#[derive(Debug, Clone)]
pub enum DeferredTarget {
    /// `("app.models", "User")`
    HostPath { host_path: String, name: String },
    /// `"app.models.User"`, split on the last separator.
    PropertyPath(String),
    /// An object with no derivable path. Resolution is not tracked.
    Host { host: ObjectRef, name: String },
}

impl DeferredTarget {
    pub fn host_path(host_path: impl Into<String>, name: impl Into<String>) -> Self {
        DeferredTarget::HostPath {
            host_path: host_path.into(),
            name: name.into(),
        }
    }

    pub fn property_path(path: impl Into<String>) -> Self {
        DeferredTarget::PropertyPath(path.into())
    }

    pub fn host(host: &ObjectRef, name: impl Into<String>) -> Self {
        DeferredTarget::Host {
            host: host.clone(),
            name: name.into(),
        }
    }

    pub fn normalize(self) -> Result<ResolvedTarget, ObjError> {
        match self {
            DeferredTarget::Host { host, name } => Ok(ResolvedTarget {
                host,
                name,
                full_path: None,
            }),
            DeferredTarget::HostPath { host_path, name } => {
                let full_path = join(&host_path, &name);
                Ok(ResolvedTarget {
                    host: lookup_host(&host_path)?,
                    name,
                    full_path: Some(full_path),
                })
            }
            DeferredTarget::PropertyPath(path) => {
                let (host_path, name) = match path.rfind(PATH_SEPARATOR) {
                    Some(i) => (&path[..i], &path[i + 1..]),
                    None => ("", path.as_str()),
                };
                Ok(ResolvedTarget {
                    host: lookup_host(host_path)?,
                    name: name.to_string(),
                    full_path: Some(path.clone()),
                })
            }
        }
    }
}

/// A target after path resolution.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub host: ObjectRef,
    pub name: String,
    pub full_path: Option<String>,
}

fn join(host_path: &str, name: &str) -> String {
    if host_path.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", host_path, PATH_SEPARATOR, name)
    }
}

fn lookup_host(host_path: &str) -> Result<ObjectRef, ObjError> {
    resolve_path(&global_root(), host_path)?
        .ok_or_else(|| ObjError::UnresolvedHost(host_path.to_string()))
}
