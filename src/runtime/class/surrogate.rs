//! Surrogates: subtypes picked at instantiation time by predicate.
//!
//! Rules live on the class that registered them and are evaluated in
//! registration order. Selection is first-match: the first rule whose
//! filter accepts the instantiation arguments decides, even if its target
//! turns out not to exist. Lookup of the rules themselves walks the
//! prototype chain, so a subclass without rules of its own uses its
//! nearest ancestor's list.

use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::runtime::descriptor::resolution_target;
use crate::runtime::ds::error::ObjError;
use crate::runtime::ds::function_object::Function;
use crate::runtime::ds::object::ObjectRef;
use crate::runtime::ds::operations::object::get;
use crate::runtime::ds::operations::validation::{
    assert_is_function, assert_is_plain_object, assert_is_string,
};
use crate::runtime::ds::value::Value;

pub type SurrogateProvider = Rc<dyn Fn() -> Option<ObjectRef>>;

/// Where the subtype comes from. Both variants are resolved at dispatch
/// time, so a rule may name a class that does not exist yet.
#[derive(Clone)]
pub enum SurrogateTarget {
    /// Looked up as `container[identifier]`.
    Container {
        container: ObjectRef,
        identifier: String,
    },
    Provider(SurrogateProvider),
}

#[derive(Clone)]
pub struct SurrogateRule {
    pub target: SurrogateTarget,
    pub filter: Function,
}

impl SurrogateRule {
    fn resolve_target(&self) -> Result<Option<ObjectRef>, ObjError> {
        match &self.target {
            SurrogateTarget::Container {
                container,
                identifier,
            } => match get(container, identifier)? {
                Value::Object(class) => Ok(Some(class)),
                _ => {
                    warn!(identifier = %identifier, "surrogate target is not defined");
                    Ok(None)
                }
            },
            SurrogateTarget::Provider(provider) => {
                let class = provider();
                if class.is_none() {
                    warn!("surrogate provider returned no class");
                }
                Ok(class)
            }
        }
    }
}

impl fmt::Debug for SurrogateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            SurrogateTarget::Container { identifier, .. } => {
                write!(f, "SurrogateRule({} if {})", identifier, self.filter.name())
            }
            SurrogateTarget::Provider(_) => {
                write!(f, "SurrogateRule(<provider> if {})", self.filter.name())
            }
        }
    }
}

fn push_rule(class: &ObjectRef, rule: SurrogateRule) -> ObjectRef {
    debug!(rule = ?rule, "surrogate registered");
    resolution_target(class)
        .borrow_mut()
        .own_surrogates_mut()
        .push(rule);
    class.clone()
}

pub fn add_surrogate(
    class: &ObjectRef,
    container: &Value,
    identifier: &Value,
    filter: &Value,
) -> Result<ObjectRef, ObjError> {
    let container = assert_is_plain_object("add_surrogate", container)?;
    let identifier = assert_is_string("add_surrogate", identifier)?;
    let filter = assert_is_function("add_surrogate", filter)?;
    Ok(push_rule(
        class,
        SurrogateRule {
            target: SurrogateTarget::Container {
                container: container.clone(),
                identifier: identifier.to_string(),
            },
            filter: filter.clone(),
        },
    ))
}

pub fn add_surrogate_provider<F>(
    class: &ObjectRef,
    provider: F,
    filter: &Value,
) -> Result<ObjectRef, ObjError>
where
    F: Fn() -> Option<ObjectRef> + 'static,
{
    let filter = assert_is_function("add_surrogate_provider", filter)?;
    Ok(push_rule(
        class,
        SurrogateRule {
            target: SurrogateTarget::Provider(Rc::new(provider)),
            filter: filter.clone(),
        },
    ))
}

/// The nearest rule list on the chain starting at `class`.
pub fn surrogate_rules(class: &ObjectRef) -> Vec<SurrogateRule> {
    let mut current = Some(class.clone());
    while let Some(c) = current {
        let next = {
            let cb = c.borrow();
            if let Some(rules) = cb.own_surrogates() {
                return rules.clone();
            }
            cb.get_prototype_of()
        };
        current = next;
    }
    Vec::new()
}

/// Picks the subtype for `args`, or `None` when no rule accepts. Filters
/// run with `class` as their receiver.
pub fn get_surrogate(class: &ObjectRef, args: &[Value]) -> Result<Option<ObjectRef>, ObjError> {
    let this = Value::Object(class.clone());
    for rule in surrogate_rules(class) {
        if rule.filter.call(&this, args)?.is_truthy() {
            return rule.resolve_target();
        }
    }
    Ok(None)
}
