//! Local Action Binder - path-scoped, value-comparable action descriptors.
//!
//! A component declares action names (with a fixed arity). At creation the
//! dispatcher binds every name to the thunk's path, producing an
//! [`ActionCreators`] table. Calling a creator yields a [`LocalAction`]
//! descriptor `{path, name, args}`.
//!
//! Descriptors are compared by value, not identity: a component that hands
//! `actions.create("select", [id])` to a child on every render produces a
//! fresh descriptor each time, and the child's props must still compare equal
//! when nothing changed.
//!
//! # Example
//!
//! ```ignore
//! let creators = ActionCreators::bind("0.1", &[("increment".into(), 0)]);
//! let a = creators.create("increment", [])?;
//! let b = creators.create("increment", [])?;
//! assert!(!Rc::ptr_eq(&a, &b));
//! assert_eq!(a, b);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::ProtocolError;
use crate::types::Value;

// =============================================================================
// LocalAction
// =============================================================================

/// A local action descriptor addressed to the thunk at `path`.
#[derive(Clone)]
pub struct LocalAction {
    pub path: Rc<str>,
    pub name: Rc<str>,
    pub args: Vec<Value>,
}

impl LocalAction {
    pub fn new(path: impl Into<Rc<str>>, name: impl Into<Rc<str>>, args: Vec<Value>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            args,
        }
    }

    /// First argument, if any. Reducers for single-argument actions use this.
    #[inline]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }
}

/// Value equality: same path, same name, element-wise identical arguments.
impl PartialEq for LocalAction {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.name == other.name
            && self.args.len() == other.args.len()
            && self.args.iter().zip(&other.args).all(|(a, b)| a.same(b))
    }
}

impl fmt::Debug for LocalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalAction")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}

// =============================================================================
// ActionCreator
// =============================================================================

/// A creator bound to one declared action name and one thunk path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCreator {
    path: Rc<str>,
    name: Rc<str>,
    arity: usize,
}

impl ActionCreator {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Build a descriptor. The argument count must match the declared arity.
    pub fn call(&self, args: impl IntoIterator<Item = Value>) -> Result<Rc<LocalAction>, ProtocolError> {
        let args: Vec<Value> = args.into_iter().collect();
        if args.len() != self.arity {
            return Err(ProtocolError::Arity {
                name: self.name.to_string(),
                expected: self.arity,
                found: args.len(),
            });
        }

        Ok(Rc::new(LocalAction {
            path: Rc::clone(&self.path),
            name: Rc::clone(&self.name),
            args,
        }))
    }
}

// =============================================================================
// ActionCreators
// =============================================================================

/// All creators of one thunk, keyed by action name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionCreators {
    path: Rc<str>,
    creators: BTreeMap<String, ActionCreator>,
}

impl ActionCreators {
    /// Bind declared `(name, arity)` pairs to `path`.
    pub fn bind(path: &str, declared: &[(String, usize)]) -> Self {
        let path: Rc<str> = Rc::from(path);
        let creators = declared
            .iter()
            .map(|(name, arity)| {
                let creator = ActionCreator {
                    path: Rc::clone(&path),
                    name: Rc::from(name.as_str()),
                    arity: *arity,
                };
                (name.clone(), creator)
            })
            .collect();

        Self { path, creators }
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&ActionCreator> {
        self.creators.get(name)
    }

    /// Look up `name` and build a descriptor in one step.
    pub fn create(
        &self,
        name: &str,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<Rc<LocalAction>, ProtocolError> {
        let creator = self.get(name).ok_or_else(|| ProtocolError::UnknownAction {
            path: self.path.to_string(),
            name: name.to_string(),
        })?;
        creator.call(args)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.creators.keys().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.creators.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creators() -> ActionCreators {
        ActionCreators::bind(
            "0.1",
            &[("increment".to_string(), 0), ("set".to_string(), 1)],
        )
    }

    #[test]
    fn test_distinct_invocations_compare_equal() {
        let creators = creators();
        let a = creators.create("set", [Value::from(5)]).unwrap();
        let b = creators.create("set", [Value::from(5)]).unwrap();

        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_differing_args_compare_unequal() {
        let creators = creators();
        let a = creators.create("set", [Value::from(5)]).unwrap();
        let b = creators.create("set", [Value::from(6)]).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_shared_args_compare_by_identity() {
        let creators = creators();
        let list = Value::list([1, 2]);
        let a = creators.create("set", [list.clone()]).unwrap();
        let b = creators.create("set", [list]).unwrap();
        let c = creators.create("set", [Value::list([1, 2])]).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_path_and_name_participate() {
        let here = ActionCreators::bind("0", &[("go".to_string(), 0)]);
        let there = ActionCreators::bind("1", &[("go".to_string(), 0)]);

        assert_ne!(
            here.create("go", []).unwrap(),
            there.create("go", []).unwrap()
        );
    }

    #[test]
    fn test_arity_is_enforced() {
        let err = creators().create("increment", [Value::from(1)]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::Arity {
                name: "increment".into(),
                expected: 0,
                found: 1
            }
        );
    }

    #[test]
    fn test_unknown_action() {
        let err = creators().create("reset", []).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownAction { .. }));
    }

    #[test]
    fn test_bound_path() {
        let creators = creators();
        let action = creators.create("increment", []).unwrap();

        assert_eq!(&*action.path, "0.1");
        assert_eq!(creators.len(), 2);
        assert_eq!(creators.names().collect::<Vec<_>>(), vec!["increment", "set"]);
    }
}
