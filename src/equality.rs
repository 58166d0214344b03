//! Equality kernel - shallow sequence/map equality.
//!
//! Everything here is one level deep and identity based ([`Value::same`]).
//! The one exception is [`props_equal`], which also treats two local action
//! descriptors as equal when they are value-equal: creators mint a fresh
//! descriptor on every render, and without this rule every prop map carrying
//! one would compare unequal.

use crate::types::{Record, VNode, Value};

/// Element-wise identity of two child lists. Different lengths are unequal.
pub fn children_equal(a: &[VNode], b: &[VNode]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| VNode::ptr_eq(x, y))
}

/// Element-wise identity of two value lists.
pub fn list_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same(y))
}

/// Same key set and identical values under every key.
pub fn record_equal(a: &Record, b: &Record) -> bool {
    shallow_equal(a, b, Value::same)
}

/// Same key set, and each pair of values is identical or a pair of
/// value-equal local action descriptors.
pub fn props_equal(a: &Record, b: &Record) -> bool {
    shallow_equal(a, b, action_aware_same)
}

/// Identity, widened to value equality for local action descriptors.
pub fn action_aware_same(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Action(x), Value::Action(y)) => x == y,
        _ => a.same(b),
    }
}

fn shallow_equal(a: &Record, b: &Record, same: impl Fn(&Value, &Value) -> bool) -> bool {
    if Record::ptr_eq(a, b) {
        return true;
    }
    if a.len() != b.len() {
        return false;
    }

    a.iter().all(|(key, x)| b.get(key).is_some_and(|y| same(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_action::ActionCreators;
    use crate::types::Props;

    #[test]
    fn test_children_equal() {
        let a = VNode::text("a");
        let b = VNode::text("b");

        assert!(children_equal(&[a.clone(), b.clone()], &[a.clone(), b.clone()]));
        assert!(!children_equal(&[a.clone(), b.clone()], &[b.clone(), a.clone()]));
        assert!(!children_equal(&[a.clone()], &[a.clone(), b]));
        assert!(!children_equal(&[a], &[VNode::text("a")]));
        assert!(children_equal(&[], &[]));
    }

    #[test]
    fn test_list_equal() {
        let shared = Value::list([1]);
        assert!(list_equal(&[Value::from(1), shared.clone()], &[Value::from(1), shared]));
        assert!(!list_equal(&[Value::list([1])], &[Value::list([1])]));
    }

    #[test]
    fn test_record_equal_requires_same_keys() {
        let a = Props::new().with("x", 1).with("y", 2);
        let b = Props::new().with("x", 1).with("z", 2);
        let c = Props::new().with("x", 1);

        assert!(!record_equal(&a, &b));
        assert!(!record_equal(&a, &c));
        assert!(record_equal(&a, &Props::new().with("y", 2).with("x", 1)));
    }

    #[test]
    fn test_record_equal_compares_values_by_identity() {
        let a = Props::new().with("items", Value::list([1, 2]));
        let b = Props::new().with("items", Value::list([1, 2]));

        assert!(!record_equal(&a, &b));
        assert!(record_equal(&a, &a.clone()));
    }

    #[test]
    fn test_props_equal_accepts_equal_action_descriptors() {
        let creators = ActionCreators::bind("0", &[("select".to_string(), 1)]);
        let a = Props::new()
            .with("id", 1)
            .with("on_click", creators.create("select", [Value::from(1)]).unwrap());
        let b = Props::new()
            .with("id", 1)
            .with("on_click", creators.create("select", [Value::from(1)]).unwrap());

        assert!(props_equal(&a, &b));
        assert!(!record_equal(&a, &b));
    }

    #[test]
    fn test_props_equal_rejects_differing_action_args() {
        let creators = ActionCreators::bind("0", &[("select".to_string(), 1)]);
        let a = Props::new().with("on_click", creators.create("select", [Value::from(1)]).unwrap());
        let b = Props::new().with("on_click", creators.create("select", [Value::from(2)]).unwrap());

        assert!(!props_equal(&a, &b));
    }
}
