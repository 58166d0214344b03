//! Thunk - the lifecycle record of one component instance at one tree position.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::Component;
use crate::action::Dispatch;
use crate::local_action::ActionCreators;
use crate::types::{Context, Props, VNode, Value};

/// A thunk shared between the diff driver and the dispatcher.
pub type SharedThunk = Rc<RefCell<Thunk>>;

/// Lifecycle record for one component instance.
///
/// The driver fills `path`, `component`, `props` and `children`; the
/// dispatcher owns every other field.
#[derive(Clone)]
pub struct Thunk {
    /// Stable tree position. Constant across updates of the same instance.
    pub path: String,
    pub component: Rc<Component>,
    pub props: Props,
    pub children: Vec<VNode>,
    /// Local state. Present for components with a reducer or initial state.
    pub state: Option<Value>,
    /// Ambient context seen by the last processed action.
    pub context: Option<Context>,
    /// Memoized render output.
    pub vnode: Option<VNode>,
    pub actions: Option<Rc<ActionCreators>>,
    /// Scoped dispatch. Built once on create, carried over on every update.
    pub middleware: Option<Dispatch>,
}

impl Thunk {
    pub fn new(
        path: impl Into<String>,
        component: &Rc<Component>,
        props: Props,
        children: Vec<VNode>,
    ) -> Self {
        Self {
            path: path.into(),
            component: Rc::clone(component),
            props,
            children,
            state: None,
            context: None,
            vnode: None,
            actions: None,
            middleware: None,
        }
    }

    /// Wrap in a [`SharedThunk`].
    pub fn into_shared(self) -> SharedThunk {
        Rc::new(RefCell::new(self))
    }

    /// A context root has no hierarchical separator in its path.
    #[inline]
    pub fn is_context_root(&self, separator: char) -> bool {
        !self.path.contains(separator)
    }

    /// Component name, if declared.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.component.name()
    }

    /// Look up a key of the local state map.
    pub fn state_value(&self, key: &str) -> Option<&Value> {
        self.state.as_ref().and_then(|state| state.get(key))
    }

    /// Look up a key of the ambient context.
    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context.as_ref().and_then(|context| context.get(key))
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk")
            .field("path", &self.path)
            .field("component", &self.component.name())
            .field("props", &self.props)
            .field("children", &self.children.len())
            .field("state", &self.state)
            .field("context", &self.context)
            .field("vnode", &self.vnode)
            .field("middleware", &self.middleware.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_root() {
        let component = Component::function(|_| Ok(VNode::empty())).build();

        assert!(Thunk::new("0", &component, Props::new(), vec![]).is_context_root('.'));
        assert!(!Thunk::new("0.1", &component, Props::new(), vec![]).is_context_root('.'));
        assert!(Thunk::new("0.1", &component, Props::new(), vec![]).is_context_root('/'));
    }

    #[test]
    fn test_state_value() {
        let component = Component::function(|_| Ok(VNode::empty())).build();
        let mut thunk = Thunk::new("0", &component, Props::new(), vec![]);
        assert!(thunk.state_value("count").is_none());

        thunk.state = Some(Value::map([("count", 3)]));
        assert_eq!(thunk.state_value("count").and_then(Value::as_int), Some(3));
    }
}
