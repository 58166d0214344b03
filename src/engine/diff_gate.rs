//! Diff Gate - decides whether an UPDATE re-renders or reuses the prev vnode.
//!
//! Precedence:
//! 1. A changed context reference always re-renders, custom predicate or not.
//! 2. A component's custom predicate replaces the default entirely.
//! 3. Default: re-render when the state identity changed, the children
//!    differ element-wise by identity, or the props differ under
//!    action-aware shallow equality.

use crate::component::Thunk;
use crate::equality::{children_equal, props_equal};
use crate::types::{Context, Record, Value};

pub fn should_render(prev: &Thunk, next: &Thunk) -> bool {
    if !same_context(prev.context.as_ref(), next.context.as_ref()) {
        return true;
    }

    match &next.component.should_render {
        Some(predicate) => predicate(prev, next),
        None => default_should_render(prev, next),
    }
}

/// The predicate used when a component declares none.
pub fn default_should_render(prev: &Thunk, next: &Thunk) -> bool {
    !same_state(prev.state.as_ref(), next.state.as_ref())
        || !children_equal(&prev.children, &next.children)
        || !props_equal(&prev.props, &next.props)
}

/// Reference comparison. Two absent contexts are the same.
pub(crate) fn same_context(a: Option<&Context>, b: Option<&Context>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Record::ptr_eq(a, b),
        _ => false,
    }
}

/// Identity comparison. Two absent states are the same.
pub(crate) fn same_state(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.same(b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::component::Component;
    use crate::local_action::LocalAction;
    use crate::types::{Props, VNode};

    fn plain() -> Rc<Component> {
        Component::function(|_| Ok(VNode::empty())).build()
    }

    fn pair(component: &Rc<Component>, props: Props) -> (Thunk, Thunk) {
        let prev = Thunk::new("0.1", component, props.clone(), vec![]);
        let next = Thunk::new("0.1", component, props, vec![]);
        (prev, next)
    }

    #[test]
    fn test_identical_inputs_skip() {
        let (prev, next) = pair(&plain(), Props::new().with("label", "a"));
        assert!(!should_render(&prev, &next));
    }

    #[test]
    fn test_equal_props_skip() {
        let component = plain();
        let prev = Thunk::new("0.1", &component, Props::new().with("label", "a"), vec![]);
        let next = Thunk::new("0.1", &component, Props::new().with("label", "a"), vec![]);

        assert!(!should_render(&prev, &next));
    }

    #[test]
    fn test_changed_prop_renders() {
        let component = plain();
        let prev = Thunk::new("0.1", &component, Props::new().with("label", "a"), vec![]);
        let next = Thunk::new("0.1", &component, Props::new().with("label", "b"), vec![]);

        assert!(should_render(&prev, &next));
    }

    #[test]
    fn test_rebuilt_local_action_prop_skips() {
        let component = plain();
        let action = |n| Value::from(Rc::new(LocalAction::new("0", "select", vec![Value::from(n)])));
        let prev = Thunk::new("0.1", &component, Props::new().with("on_click", action(1)), vec![]);
        let next = Thunk::new("0.1", &component, Props::new().with("on_click", action(1)), vec![]);

        assert!(!should_render(&prev, &next));
    }

    #[test]
    fn test_state_identity_renders() {
        let (mut prev, mut next) = pair(&plain(), Props::new());
        prev.state = Some(Value::map([("n", 1)]));
        next.state = Some(Value::map([("n", 1)]));

        // Structurally equal but a new reference
        assert!(should_render(&prev, &next));

        next.state = prev.state.clone();
        assert!(!should_render(&prev, &next));
    }

    #[test]
    fn test_children_identity_renders() {
        let (mut prev, mut next) = pair(&plain(), Props::new());
        let child = VNode::text("x");
        prev.children = vec![child.clone()];
        next.children = vec![child];
        assert!(!should_render(&prev, &next));

        next.children = vec![VNode::text("x")];
        assert!(should_render(&prev, &next));
    }

    #[test]
    fn test_custom_predicate_replaces_default() {
        let never = Component::function(|_| Ok(VNode::empty()))
            .should_render(|_, _| false)
            .build();
        let prev = Thunk::new("0.1", &never, Props::new().with("label", "a"), vec![]);
        let next = Thunk::new("0.1", &never, Props::new().with("label", "b"), vec![]);

        assert!(!should_render(&prev, &next));
    }

    #[test]
    fn test_context_change_overrides_predicate() {
        let never = Component::function(|_| Ok(VNode::empty()))
            .should_render(|_, _| false)
            .build();
        let (mut prev, mut next) = pair(&never, Props::new());
        prev.context = Some(Record::new().with("theme", "dark"));
        next.context = Some(Record::new().with("theme", "dark"));

        assert!(should_render(&prev, &next));

        next.context = prev.context.clone();
        assert!(!should_render(&prev, &next));
    }
}
