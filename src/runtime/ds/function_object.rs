use std::any::Any;
use std::fmt;
use std::rc::Rc;

use uuid::Uuid;

use crate::runtime::ds::error::ObjError;
use crate::runtime::ds::value::Value;

/// Signature of every callable in the runtime: the receiver (`this`) and
/// the argument list.
pub type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value, ObjError>;

struct FunctionBase {
    id: Uuid,
    name: String,
    body: Box<NativeFn>,
    slot: Option<Rc<dyn Any>>,
}

/// A callable value. Cloning shares the same function; equality is identity.
#[derive(Clone)]
pub struct Function {
    base: Rc<FunctionBase>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, ObjError> + 'static,
    {
        Function {
            base: Rc::new(FunctionBase {
                id: Uuid::new_v4(),
                name: name.into(),
                body: Box::new(body),
                slot: None,
            }),
        }
    }

    /// Creates a function carrying an opaque internal slot, retrievable
    /// later through [`Function::slot`].
    pub fn with_slot<F>(name: impl Into<String>, slot: Rc<dyn Any>, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, ObjError> + 'static,
    {
        Function {
            base: Rc::new(FunctionBase {
                id: Uuid::new_v4(),
                name: name.into(),
                body: Box::new(body),
                slot: Some(slot),
            }),
        }
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value, ObjError> {
        (self.base.body)(this, args)
    }

    pub fn name(&self) -> &str {
        &self.base.name
    }

    pub fn id(&self) -> Uuid {
        self.base.id
    }

    pub fn same(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.base, &other.base)
    }

    pub fn slot<T: 'static>(&self) -> Option<Rc<T>> {
        match &self.base.slot {
            None => None,
            Some(s) => s.clone().downcast::<T>().ok(),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({} {})", self.base.name, self.base.id)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}
