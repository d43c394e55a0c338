//! Deferred properties: values computed by a generator on first read.
//!
//! Declaring installs an enumerable, configurable accessor pair. The first
//! read runs the generator once and replaces the accessor with a frozen
//! (non-writable, non-configurable, enumerable) data property. A generator
//! may instead assign the property itself; the accessor's setter resolves
//! the placeholder the same way.
//!
//! Each accessor carries a [`DeferredCell`] in its getter's internal slot:
//!
//! ```text
//! Pending { generator, amendments } -> Resolving -> Resolved(value)
//! ```
//!
//! Amendments queued while pending run in registration order right after
//! resolution; amendments added later run immediately. Promised properties
//! are additionally tracked by dotted path in the unfulfilled registry (see
//! [`path`]) until they resolve.
//!
//! ```
//! use protoform::runtime::deferred::postpone;
//! use protoform::runtime::ds::function_object::Function;
//! use protoform::runtime::ds::object::Object;
//! use protoform::runtime::ds::operations::object::get;
//! use protoform::runtime::ds::value::Value;
//!
//! let ns = Object::new_plain();
//! let generator = Function::new("bar", |_, _| Ok(Value::str("foo")));
//! postpone(&ns, "bar", &Value::Function(generator), &[]).unwrap();
//! assert_eq!(get(&ns, "bar").unwrap(), Value::str("foo"));
//! ```

pub mod path;

use std::cell::RefCell;
use std::mem;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::runtime::ds::error::ObjError;
use crate::runtime::ds::function_object::Function;
use crate::runtime::ds::object::{Object, ObjectRef};
use crate::runtime::ds::object_property::{PropertyAttributes, PropertyDescriptor};
use crate::runtime::ds::operations::object::get_own_property;
use crate::runtime::ds::operations::validation::assert_is_function;
use crate::runtime::ds::value::Value;

pub use path::{global_root, is_unfulfilled, reset, unfulfilled, DeferredTarget, ResolvedTarget};

struct Amendment {
    modifier: Function,
    args: Vec<Value>,
}

struct Pending {
    generator: Function,
    extra_args: Vec<Value>,
    amendments: Vec<Amendment>,
}

enum DeferredState {
    Pending(Pending),
    Resolving(Pending),
    Resolved(Value),
}

enum Begin {
    Run(Function, Vec<Value>),
    Done(Value),
}

/// One-way resolution state of a single deferred property.
pub struct DeferredCell {
    host: Weak<RefCell<Object>>,
    name: String,
    full_path: Option<String>,
    state: RefCell<DeferredState>,
}

impl DeferredCell {
    fn label(&self) -> String {
        self.full_path.clone().unwrap_or_else(|| self.name.clone())
    }

    fn host(&self) -> Result<ObjectRef, ObjError> {
        self.host
            .upgrade()
            .ok_or_else(|| ObjError::UnresolvedHost(self.label()))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.state.borrow(), DeferredState::Resolved(_))
    }

    fn begin(&self) -> Result<Begin, ObjError> {
        let mut state = self.state.borrow_mut();
        match mem::replace(&mut *state, DeferredState::Resolved(Value::Undefined)) {
            DeferredState::Pending(p) => {
                let run = Begin::Run(p.generator.clone(), p.extra_args.clone());
                *state = DeferredState::Resolving(p);
                Ok(run)
            }
            DeferredState::Resolving(p) => {
                *state = DeferredState::Resolving(p);
                Err(ObjError::CyclicResolution(self.label()))
            }
            DeferredState::Resolved(v) => {
                *state = DeferredState::Resolved(v.clone());
                Ok(Begin::Done(v))
            }
        }
    }

    /// Puts a failed resolution back to pending so a later read retries.
    fn abort(&self) {
        let mut state = self.state.borrow_mut();
        if let DeferredState::Resolving(_) = &*state {
            if let DeferredState::Resolving(p) =
                mem::replace(&mut *state, DeferredState::Resolved(Value::Undefined))
            {
                *state = DeferredState::Pending(p);
            }
        }
    }

    fn resolved_value(&self) -> Option<Value> {
        match &*self.state.borrow() {
            DeferredState::Resolved(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Queues an amendment. Returns it back if the value is already resolved.
    fn queue(&self, amendment: Amendment) -> Option<Amendment> {
        match &mut *self.state.borrow_mut() {
            DeferredState::Pending(p) | DeferredState::Resolving(p) => {
                p.amendments.push(amendment);
                None
            }
            DeferredState::Resolved(_) => Some(amendment),
        }
    }

    /// Freezes `value` onto the host and replays queued amendments. Returns
    /// `false` if the property had already been resolved.
    fn finalize(&self, value: Value) -> Result<bool, ObjError> {
        let host = self.host()?;
        let amendments = {
            let mut state = self.state.borrow_mut();
            match mem::replace(&mut *state, DeferredState::Resolved(value.clone())) {
                DeferredState::Pending(p) | DeferredState::Resolving(p) => p.amendments,
                DeferredState::Resolved(previous) => {
                    *state = DeferredState::Resolved(previous);
                    return Ok(false);
                }
            }
        };
        host.borrow_mut().force_define_own_property(
            &self.name,
            PropertyDescriptor::data(value, PropertyAttributes::FROZEN),
        );
        if let Some(path) = &self.full_path {
            path::fulfil(path);
        }
        debug!(property = %self.label(), amendments = amendments.len(), "deferred property resolved");
        for amendment in amendments {
            amendment.modifier.call(&Value::Undefined, &amendment.args)?;
        }
        Ok(true)
    }

    fn read(&self) -> Result<Value, ObjError> {
        let (generator, extra_args) = match self.begin()? {
            Begin::Done(v) => return Ok(v),
            Begin::Run(generator, extra_args) => (generator, extra_args),
        };
        let host = match self.host() {
            Ok(host) => host,
            Err(e) => {
                self.abort();
                return Err(e);
            }
        };
        let mut args = vec![Value::Object(host), Value::String(self.name.clone())];
        args.extend(extra_args);
        let produced = match generator.call(&Value::Undefined, &args) {
            Ok(v) => v,
            Err(e) => {
                self.abort();
                return Err(e);
            }
        };
        if let Some(assigned) = self.resolved_value() {
            if !produced.is_undefined() {
                debug!(property = %self.label(), "generator assigned and returned, assignment kept");
            }
            return Ok(assigned);
        }
        if produced.is_undefined() {
            warn!(property = %self.label(), "generator neither returned nor assigned a value");
        }
        self.finalize(produced.clone())?;
        Ok(produced)
    }

    fn write(&self, incoming: Value) -> Result<(), ObjError> {
        if self.finalize(incoming)? {
            Ok(())
        } else {
            Err(ObjError::ReadOnly(self.name.clone()))
        }
    }
}

/// The resolution cell behind `host[name]`, while it is still a deferred
/// accessor.
pub fn deferred_cell(host: &ObjectRef, name: &str) -> Option<Rc<DeferredCell>> {
    match get_own_property(host, name) {
        Some(PropertyDescriptor::Accessor { get: Some(getter), .. }) => getter.slot::<DeferredCell>(),
        _ => None,
    }
}

fn declare(
    host: &ObjectRef,
    name: &str,
    generator: &Value,
    extra_args: &[Value],
    full_path: Option<String>,
) -> Result<bool, ObjError> {
    let generator = match generator {
        Value::Function(f) => f.clone(),
        _ => return Err(ObjError::InvalidGenerator(name.to_string())),
    };
    if host.borrow().has_own_property(name) {
        warn!(property = %name, "already declared, ignored");
        return Ok(false);
    }
    let cell = Rc::new(DeferredCell {
        host: Rc::downgrade(host),
        name: name.to_string(),
        full_path,
        state: RefCell::new(DeferredState::Pending(Pending {
            generator,
            extra_args: extra_args.to_vec(),
            amendments: Vec::new(),
        })),
    });
    let reader = cell.clone();
    let getter = Function::with_slot(format!("get {}", name), cell.clone(), move |_, _| {
        reader.read()
    });
    let writer = cell;
    let setter = Function::new(format!("set {}", name), move |_, args| {
        writer
            .write(args.first().cloned().unwrap_or_default())
            .map(|_| Value::Undefined)
    });
    host.borrow_mut().define_own_property(
        name,
        PropertyDescriptor::accessor(Some(getter), Some(setter), true, true),
    )?;
    Ok(true)
}

/// Declares `host[name]` as computed by `generator(host, name, ...extra_args)`
/// on first read. A no-op if `host` already owns `name`.
pub fn postpone(
    host: &ObjectRef,
    name: &str,
    generator: &Value,
    extra_args: &[Value],
) -> Result<(), ObjError> {
    declare(host, name, generator, extra_args, None).map(|_| ())
}

/// Like [`postpone`], but tracks the property's dotted path in the
/// unfulfilled registry until it resolves.
pub fn promise(
    target: DeferredTarget,
    generator: &Value,
    extra_args: &[Value],
) -> Result<(), ObjError> {
    let ResolvedTarget {
        host,
        name,
        full_path,
    } = target.normalize()?;
    let tracked = full_path.clone();
    if declare(&host, &name, generator, extra_args, full_path)? {
        match tracked {
            Some(path) => path::track(&path),
            None => warn!(property = %name, "promise has no derivable path and is not tracked"),
        }
    }
    Ok(())
}

/// Applies `modifier(host, name, ...extra_args)` to the property's value:
/// after resolution if it is still pending, right away otherwise.
pub fn amend(
    host: &ObjectRef,
    name: &str,
    modifier: &Value,
    extra_args: &[Value],
) -> Result<(), ObjError> {
    let modifier = assert_is_function("amend", modifier)?.clone();
    let mut args = vec![Value::Object(host.clone()), Value::String(name.to_string())];
    args.extend_from_slice(extra_args);
    let amendment = Amendment { modifier, args };
    let amendment = match deferred_cell(host, name) {
        Some(cell) => match cell.queue(amendment) {
            None => {
                debug!(property = %name, "amendment queued");
                return Ok(());
            }
            Some(amendment) => amendment,
        },
        None => amendment,
    };
    amendment
        .modifier
        .call(&Value::Undefined, &amendment.args)
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ds::operations::object::{get, set};
    use std::cell::Cell;

    fn counting(counter: Rc<Cell<u32>>, value: &'static str) -> Value {
        Value::Function(Function::new("gen", move |_, _| {
            counter.set(counter.get() + 1);
            Ok(Value::str(value))
        }))
    }

    #[test]
    fn test_generator_runs_once() {
        let ns = Object::new_plain();
        let runs = Rc::new(Cell::new(0));
        postpone(&ns, "bar", &counting(runs.clone(), "foo"), &[]).unwrap();
        assert!(get_own_property(&ns, "bar").unwrap().is_accessor_descriptor());
        assert_eq!(get(&ns, "bar").unwrap(), Value::str("foo"));
        assert_eq!(get(&ns, "bar").unwrap(), Value::str("foo"));
        assert_eq!(runs.get(), 1);
        assert_eq!(
            get_own_property(&ns, "bar").unwrap(),
            PropertyDescriptor::data(Value::str("foo"), PropertyAttributes::FROZEN)
        );
    }

    #[test]
    fn test_generator_receives_host_name_and_extras() {
        let ns = Object::new_plain();
        let expected = Rc::downgrade(&ns);
        let generator = Function::new("gen", move |_, args| {
            let host = args[0].as_object().unwrap();
            assert!(Rc::ptr_eq(host, &expected.upgrade().unwrap()));
            assert_eq!(args[1], Value::str("bar"));
            Ok(Value::str(format!("{}{}", args[2], args[3])))
        });
        postpone(
            &ns,
            "bar",
            &Value::Function(generator),
            &[Value::str("p1"), Value::str("p2")],
        )
        .unwrap();
        assert_eq!(get(&ns, "bar").unwrap(), Value::str("p1p2"));
    }

    #[test]
    fn test_generator_may_assign() {
        let ns = Object::new_plain();
        let generator = Function::new("gen", |_, args| {
            let host = args[0].as_object().unwrap();
            set(host, "bar", Value::from(7))?;
            Ok(Value::Undefined)
        });
        postpone(&ns, "bar", &Value::Function(generator), &[]).unwrap();
        assert_eq!(get(&ns, "bar").unwrap(), Value::from(7));
        assert!(!get_own_property(&ns, "bar").unwrap().is_writable());
    }

    #[test]
    fn test_redeclare_is_noop() {
        let ns = Object::new_plain();
        let runs = Rc::new(Cell::new(0));
        postpone(&ns, "bar", &counting(runs.clone(), "first"), &[]).unwrap();
        postpone(&ns, "bar", &counting(runs.clone(), "second"), &[]).unwrap();
        assert_eq!(get(&ns, "bar").unwrap(), Value::str("first"));
    }

    #[test]
    fn test_duplicate_declaration_is_rejected_softly() {
        let ns = Object::new_plain();
        let runs = Rc::new(Cell::new(0));
        let first = counting(runs.clone(), "first");
        assert_eq!(declare(&ns, "bar", &first, &[], None), Ok(true));
        assert_eq!(
            declare(&ns, "bar", &counting(runs.clone(), "second"), &[], Some("ns.bar".to_string())),
            Ok(false)
        );
        assert!(!is_unfulfilled("ns.bar"));
        assert_eq!(get(&ns, "bar").unwrap(), Value::str("first"));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_invalid_generator() {
        let ns = Object::new_plain();
        assert_eq!(
            postpone(&ns, "bar", &Value::from(1), &[]),
            Err(ObjError::InvalidGenerator("bar".to_string()))
        );
        assert!(!ns.borrow().has_own_property("bar"));
    }

    #[test]
    fn test_cyclic_read() {
        let ns = Object::new_plain();
        let generator = Function::new("gen", |_, args| {
            let host = args[0].as_object().unwrap();
            get(host, "bar")
        });
        postpone(&ns, "bar", &Value::Function(generator), &[]).unwrap();
        assert_eq!(
            get(&ns, "bar"),
            Err(ObjError::CyclicResolution("bar".to_string()))
        );
    }

    #[test]
    fn test_failed_generator_stays_pending() {
        let ns = Object::new_plain();
        let attempts = Rc::new(Cell::new(0));
        let a = attempts.clone();
        let generator = Function::new("gen", move |_, _| {
            a.set(a.get() + 1);
            if a.get() == 1 {
                Err(ObjError::thrown("not yet"))
            } else {
                Ok(Value::from(2))
            }
        });
        postpone(&ns, "bar", &Value::Function(generator), &[]).unwrap();
        assert_eq!(get(&ns, "bar"), Err(ObjError::thrown("not yet")));
        assert!(deferred_cell(&ns, "bar").is_some());
        assert_eq!(get(&ns, "bar").unwrap(), Value::from(2));
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_amendment_order() {
        let ns = Object::new_plain();
        let log = Rc::new(RefCell::new(Vec::new()));
        postpone(&ns, "bar", &counting(Rc::new(Cell::new(0)), "v"), &[]).unwrap();
        for tag in &["a", "b"] {
            let log = log.clone();
            let modifier = Function::new("m", move |_, args| {
                log.borrow_mut().push(format!("{}:{}", args[2], args[1]));
                Ok(Value::Undefined)
            });
            amend(&ns, "bar", &Value::Function(modifier), &[Value::str(*tag)]).unwrap();
        }
        assert!(log.borrow().is_empty());
        get(&ns, "bar").unwrap();
        assert_eq!(*log.borrow(), vec!["a:bar".to_string(), "b:bar".to_string()]);
        get(&ns, "bar").unwrap();
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_promise_tracks_path() {
        reset();
        let runs = Rc::new(Cell::new(0));
        promise(
            DeferredTarget::property_path("answer"),
            &counting(runs, "42"),
            &[],
        )
        .unwrap();
        assert!(is_unfulfilled("answer"));
        assert_eq!(get(&global_root(), "answer").unwrap(), Value::str("42"));
        assert!(!is_unfulfilled("answer"));
    }

    #[test]
    fn test_promise_on_host_is_untracked() {
        reset();
        let host = Object::new_plain();
        promise(
            DeferredTarget::host(&host, "x"),
            &counting(Rc::new(Cell::new(0)), "v"),
            &[],
        )
        .unwrap();
        assert!(unfulfilled().is_empty());
        assert_eq!(get(&host, "x").unwrap(), Value::str("v"));
    }
}
