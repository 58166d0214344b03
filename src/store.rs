//! Keyed local-state store.
//!
//! The dispatcher only reads the store ([`LocalStateStore::lookup`]); it
//! creates and releases entries by dispatching [`StoreAction`]s through the
//! root, so every state transition is serialized through the single root
//! dispatch point.
//!
//! [`EphemeralStore`] is the in-memory implementation used by the test host.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::action::{Action, StoreAction};
use crate::types::Value;

/// Interface the dispatcher requires of the local-state store.
pub trait LocalStateStore {
    /// Current state of `path`, if any.
    fn lookup(&self, path: &str) -> Option<Value>;

    /// Create (or overwrite) the state of `path`.
    fn create(&self, path: &str, state: Value);

    /// Release the state of `path`.
    fn destroy(&self, path: &str);

    /// Whether `action` is one of the store's own actions.
    fn is_own_action(&self, action: &Action) -> bool {
        matches!(action, Action::Store(_))
    }
}

/// In-memory ephemeral state, keyed by thunk path.
#[derive(Default)]
pub struct EphemeralStore {
    states: RefCell<HashMap<String, Value>>,
    writes: RefCell<HashMap<String, usize>>,
}

impl EphemeralStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a store effect. Returns the state of the path afterwards.
    pub fn apply(&self, action: &StoreAction) -> Option<Value> {
        match action {
            StoreAction::Create { path, state } => {
                self.create(path, state.clone());
                Some(state.clone())
            }
            StoreAction::Update {
                path,
                action,
                reducer,
            } => {
                let Some(current) = self.lookup(path) else {
                    tracing::warn!(path = %path, action = %action.name, "state update for unknown path");
                    return None;
                };

                let next = reducer.apply(&current, action);
                if !next.same(&current) {
                    self.states.borrow_mut().insert(path.to_string(), next.clone());
                    *self.writes.borrow_mut().entry(path.to_string()).or_default() += 1;
                }
                Some(next)
            }
            StoreAction::Destroy { path } => {
                self.destroy(path);
                None
            }
        }
    }

    /// Number of identity-changing state updates applied to `path`.
    pub fn writes(&self, path: &str) -> usize {
        self.writes.borrow().get(path).copied().unwrap_or(0)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.states.borrow().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.states.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.borrow().is_empty()
    }
}

impl LocalStateStore for EphemeralStore {
    fn lookup(&self, path: &str) -> Option<Value> {
        self.states.borrow().get(path).cloned()
    }

    fn create(&self, path: &str, state: Value) {
        self.states.borrow_mut().insert(path.to_string(), state);
    }

    fn destroy(&self, path: &str) {
        self.states.borrow_mut().remove(path);
        self.writes.borrow_mut().remove(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::action::Reducer;
    use crate::local_action::LocalAction;

    fn increment(path: &str) -> StoreAction {
        StoreAction::Update {
            path: Rc::from(path),
            action: Rc::new(LocalAction::new(path, "increment", vec![])),
            reducer: Reducer::new(|state, _| {
                let count = state.get("count").and_then(Value::as_int).unwrap_or(0);
                state.with("count", count + 1)
            }),
        }
    }

    #[test]
    fn test_create_update_destroy() {
        let store = EphemeralStore::new();
        store.apply(&StoreAction::Create {
            path: Rc::from("0"),
            state: Value::map([("count", 0)]),
        });
        assert!(store.contains("0"));

        let next = store.apply(&increment("0")).unwrap();
        assert_eq!(next.get("count").and_then(Value::as_int), Some(1));
        assert!(store.lookup("0").unwrap().same(&next));
        assert_eq!(store.writes("0"), 1);

        store.apply(&StoreAction::Destroy { path: Rc::from("0") });
        assert!(!store.contains("0"));
        assert!(store.is_empty());
        assert_eq!(store.writes("0"), 0);
    }

    #[test]
    fn test_identity_preserving_update_is_not_a_write() {
        let store = EphemeralStore::new();
        store.create("0", Value::map([("count", 0)]));

        store.apply(&StoreAction::Update {
            path: Rc::from("0"),
            action: Rc::new(LocalAction::new("0", "noop", vec![])),
            reducer: Reducer::new(|state, _| state.clone()),
        });

        assert_eq!(store.writes("0"), 0);
    }

    #[test]
    fn test_update_of_unknown_path_is_ignored() {
        let store = EphemeralStore::new();
        assert!(store.apply(&increment("9")).is_none());
        assert!(!store.contains("9"));
    }

    #[test]
    fn test_own_actions() {
        let store = EphemeralStore::new();
        assert!(store.is_own_action(&Action::Store(StoreAction::Destroy { path: Rc::from("0") })));
        assert!(!store.is_own_action(&Action::InvalidateContext));
    }
}
