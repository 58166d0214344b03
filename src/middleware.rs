//! Scoped middleware chain - per-thunk dispatch.
//!
//! Every thunk dispatches through its own chain, built once on create and
//! carried over verbatim on every update. A component that declares no
//! reducer, controller or middleware gets the root dispatch itself (no
//! wrapping at all). Otherwise the chain is, outer to inner:
//!
//! ```text
//! local-action transformer   Local{path == own path} → Store(Update{path, reducer})
//!          │
//! flattening adapter         Sequence[a, b, ..] → dispatch a, then b, ..
//!          │
//! batch adapter              Batch[a, b, ..] → dispatch all, join pending results
//!          │
//! user middleware            in declared order
//!          │
//! controller (optional)      terminal, may replace forwarding
//!          │
//!        root
//! ```
//!
//! Falsy dispatches (`None`) are dropped at the entry point,
//! [`dispatch_maybe`], before any stage runs.
//!
//! Stages are interpreted by index: [`Next`] continues at the following
//! stage, [`Scope::dispatch`] re-enters at the top so re-dispatched local
//! actions are still routed.

use std::rc::Rc;

use crate::action::{Action, Dispatch, DispatchResult, Outcome, Reducer, StoreAction};
use crate::component::Component;

/// A middleware or controller: `(scope, action, next) -> result`.
pub type Middleware = Rc<dyn Fn(&Scope<'_>, Action, Next<'_>) -> DispatchResult>;

/// Wrap a closure as a [`Middleware`].
pub fn middleware_fn(
    f: impl Fn(&Scope<'_>, Action, Next<'_>) -> DispatchResult + 'static,
) -> Middleware {
    Rc::new(f)
}

/// Dispatch `action` unless it is `None`.
pub fn dispatch_maybe(dispatch: &Dispatch, action: Option<Action>) -> DispatchResult {
    match action {
        Some(action) => dispatch(action),
        None => Ok(Outcome::Nothing),
    }
}

/// Build the dispatch function for a thunk at `path`.
///
/// Returns a clone of `root` when the component needs no scoping.
pub fn scoped_dispatch(path: &str, component: &Component, root: &Dispatch) -> Dispatch {
    if !component.capabilities().needs_scoped_dispatch() {
        return Rc::clone(root);
    }

    let chain = ScopedChain::new(path, component, Rc::clone(root));
    Rc::new(move |action| chain.dispatch(action))
}

// =============================================================================
// Chain
// =============================================================================

enum Stage {
    LocalActions(Reducer),
    Flatten,
    Batch,
    User(Middleware),
    Controller(Middleware),
}

/// A composed chain scoped to one thunk path.
pub struct ScopedChain {
    path: Rc<str>,
    stages: Vec<Stage>,
    root: Dispatch,
}

impl ScopedChain {
    pub fn new(path: &str, component: &Component, root: Dispatch) -> Self {
        let mut stages = Vec::with_capacity(component.middleware.len() + 4);

        if let Some(reducer) = &component.reducer {
            stages.push(Stage::LocalActions(reducer.clone()));
        }
        stages.push(Stage::Flatten);
        stages.push(Stage::Batch);
        stages.extend(component.middleware.iter().cloned().map(Stage::User));
        if let Some(controller) = &component.controller {
            stages.push(Stage::Controller(Rc::clone(controller)));
        }

        Self {
            path: Rc::from(path),
            stages,
            root,
        }
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Dispatch from the top of the chain.
    pub fn dispatch(&self, action: Action) -> DispatchResult {
        self.run(0, action)
    }

    fn run(&self, index: usize, action: Action) -> DispatchResult {
        let Some(stage) = self.stages.get(index) else {
            return (self.root)(action);
        };
        let next = Next { chain: self, index: index + 1 };

        match stage {
            Stage::LocalActions(reducer) => match action {
                Action::Local(local) if local.path == self.path => {
                    tracing::trace!(path = %self.path, action = %local.name, "local action to state update");
                    next.run(Action::Store(StoreAction::Update {
                        path: Rc::clone(&self.path),
                        action: local,
                        reducer: reducer.clone(),
                    }))
                }
                other => next.run(other),
            },
            Stage::Flatten => match action {
                Action::Sequence(actions) => {
                    let mut outcomes = Vec::with_capacity(actions.len());
                    for action in actions {
                        outcomes.push(self.dispatch(action)?);
                    }
                    Ok(Outcome::Many(outcomes))
                }
                other => next.run(other),
            },
            Stage::Batch => match action {
                Action::Batch(actions) => {
                    let outcomes = actions
                        .into_iter()
                        .map(|action| self.dispatch(action))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Outcome::join(outcomes))
                }
                other => next.run(other),
            },
            Stage::User(middleware) | Stage::Controller(middleware) => {
                middleware(&Scope { chain: self }, action, next)
            }
        }
    }
}

// =============================================================================
// Scope / Next
// =============================================================================

/// What a middleware sees of its chain.
pub struct Scope<'a> {
    chain: &'a ScopedChain,
}

impl Scope<'_> {
    /// Path of the thunk that owns the chain.
    #[inline]
    pub fn path(&self) -> &str {
        self.chain.path()
    }

    /// Re-dispatch from the top of the chain.
    pub fn dispatch(&self, action: Action) -> DispatchResult {
        self.chain.dispatch(action)
    }

    /// Bypass the chain and dispatch at the root.
    pub fn dispatch_root(&self, action: Action) -> DispatchResult {
        (self.chain.root)(action)
    }
}

/// Continuation to the following stage (or the root past the last one).
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a ScopedChain,
    index: usize,
}

impl Next<'_> {
    pub fn run(self, action: Action) -> DispatchResult {
        self.chain.run(self.index, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use futures::executor::block_on;

    use crate::action::dispatch_fn;
    use crate::error::LifecycleError;
    use crate::local_action::{ActionCreators, LocalAction};
    use crate::types::{VNode, Value};

    type Log = Rc<RefCell<Vec<String>>>;

    fn recording_root() -> (Dispatch, Log) {
        let log: Log = Rc::default();
        let sink = Rc::clone(&log);
        let root = dispatch_fn(move |action| {
            sink.borrow_mut().push(action.kind().to_string());
            Ok(Outcome::Value(Value::from(action.kind())))
        });
        (root, log)
    }

    fn counter_reducer() -> Reducer {
        Reducer::new(|state: &Value, _: &LocalAction| state.clone())
    }

    #[test]
    fn test_plain_component_uses_root() {
        let (root, _) = recording_root();
        let component = Component::function(|_| Ok(VNode::empty())).build();

        let dispatch = scoped_dispatch("0", &component, &root);
        assert!(Rc::ptr_eq(&dispatch, &root));
    }

    #[test]
    fn test_local_action_becomes_state_update() {
        let component = Component::function(|_| Ok(VNode::empty()))
            .reducer(counter_reducer())
            .action("increment", 0)
            .build();

        let seen: Rc<RefCell<Option<Action>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let root = dispatch_fn(move |action| {
            *sink.borrow_mut() = Some(action);
            Ok(Outcome::Nothing)
        });

        let dispatch = scoped_dispatch("0.1", &component, &root);
        let creators = ActionCreators::bind("0.1", component.actions());
        dispatch(creators.create("increment", []).unwrap().into()).unwrap();

        match seen.borrow_mut().take() {
            Some(Action::Store(StoreAction::Update { path, action, .. })) => {
                assert_eq!(&*path, "0.1");
                assert_eq!(&*action.name, "increment");
            }
            other => panic!("expected store update, got {other:?}"),
        }
    }

    #[test]
    fn test_foreign_local_action_passes_through() {
        let (root, log) = recording_root();
        let component = Component::function(|_| Ok(VNode::empty()))
            .reducer(counter_reducer())
            .build();

        let dispatch = scoped_dispatch("0.1", &component, &root);
        let parent = ActionCreators::bind("0", &[("select".to_string(), 0)]);
        dispatch(parent.create("select", []).unwrap().into()).unwrap();

        assert_eq!(*log.borrow(), vec!["local"]);
    }

    #[test]
    fn test_sequence_is_flattened_through_the_top() {
        let (root, log) = recording_root();
        let component = Component::function(|_| Ok(VNode::empty()))
            .reducer(counter_reducer())
            .action("increment", 0)
            .build();

        let dispatch = scoped_dispatch("0", &component, &root);
        let creators = ActionCreators::bind("0", component.actions());
        let outcome = dispatch(Action::Sequence(vec![
            Action::custom("first", Value::Null),
            creators.create("increment", []).unwrap().into(),
        ]))
        .unwrap();

        assert_eq!(*log.borrow(), vec!["first", "store_update"]);
        assert!(matches!(outcome, Outcome::Many(items) if items.len() == 2));
    }

    #[test]
    fn test_batch_joins_pending_entries() {
        let root = dispatch_fn(|action| match action {
            Action::Custom { kind, .. } if &*kind == "fetch" => Ok(Outcome::pending(async {
                Outcome::Value(Value::from("fetched"))
            })),
            _ => Ok(Outcome::Value(Value::from("sync"))),
        });
        let component = Component::function(|_| Ok(VNode::empty()))
            .middleware(middleware_fn(|_, action, next| next.run(action)))
            .build();

        let dispatch = scoped_dispatch("0", &component, &root);
        let outcome = dispatch(Action::Batch(vec![
            Action::custom("fetch", Value::Null),
            Action::custom("log", Value::Null),
        ]))
        .unwrap();
        assert!(outcome.is_pending());

        let Outcome::Many(items) = block_on(outcome.resolve()) else {
            panic!("expected Many");
        };
        let values: Vec<_> = items
            .into_iter()
            .filter_map(Outcome::into_value)
            .map(|v| v.as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(values, vec!["fetched", "sync"]);
    }

    #[test]
    fn test_middleware_run_in_declared_order() {
        let (root, log) = recording_root();
        let first = Rc::clone(&log);
        let second = Rc::clone(&log);

        let component = Component::function(|_| Ok(VNode::empty()))
            .middleware(middleware_fn(move |_, action, next| {
                first.borrow_mut().push("first".into());
                next.run(action)
            }))
            .middleware(middleware_fn(move |_, action, next| {
                second.borrow_mut().push("second".into());
                next.run(action)
            }))
            .build();

        let dispatch = scoped_dispatch("0", &component, &root);
        dispatch(Action::custom("ping", Value::Null)).unwrap();

        assert_eq!(*log.borrow(), vec!["first", "second", "ping"]);
    }

    #[test]
    fn test_controller_can_replace_forwarding() {
        let (root, log) = recording_root();
        let component = Component::function(|_| Ok(VNode::empty()))
            .controller(middleware_fn(|scope, action, next| match action {
                Action::Custom { kind, .. } if &*kind == "request" => {
                    Ok(Outcome::Value(Value::from(format!("handled at {}", scope.path()))))
                }
                other => next.run(other),
            }))
            .build();

        let dispatch = scoped_dispatch("0.2", &component, &root);
        let outcome = dispatch(Action::custom("request", Value::Null)).unwrap();
        dispatch(Action::custom("other", Value::Null)).unwrap();

        assert_eq!(
            outcome.into_value().and_then(|v| v.as_str().map(str::to_string)),
            Some("handled at 0.2".to_string())
        );
        assert_eq!(*log.borrow(), vec!["other"]);
    }

    #[test]
    fn test_scope_dispatch_reenters_at_top() {
        let (root, log) = recording_root();
        let component = Component::function(|_| Ok(VNode::empty()))
            .reducer(counter_reducer())
            .action("increment", 0)
            .middleware(middleware_fn(|scope, action, next| match action {
                Action::Custom { kind, .. } if &*kind == "bump" => {
                    let creators = ActionCreators::bind(scope.path(), &[("increment".into(), 0)]);
                    scope.dispatch(creators.create("increment", [])?.into())
                }
                other => next.run(other),
            }))
            .build();

        let dispatch = scoped_dispatch("0", &component, &root);
        dispatch(Action::custom("bump", Value::Null)).unwrap();

        assert_eq!(*log.borrow(), vec!["store_update"]);
    }

    #[test]
    fn test_middleware_errors_propagate() {
        let (root, log) = recording_root();
        let component = Component::function(|_| Ok(VNode::empty()))
            .middleware(middleware_fn(|_, _, _| {
                Err(LifecycleError::dispatch(anyhow::anyhow!("denied")))
            }))
            .build();

        let dispatch = scoped_dispatch("0", &component, &root);
        let err = dispatch(Action::custom("ping", Value::Null)).unwrap_err();

        assert_eq!(err.to_string(), "dispatch rejected: denied");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_dispatch_maybe_drops_none() {
        let (root, log) = recording_root();

        assert!(matches!(dispatch_maybe(&root, None), Ok(Outcome::Nothing)));
        dispatch_maybe(&root, Some(Action::custom("ping", Value::Null))).unwrap();
        assert_eq!(*log.borrow(), vec!["ping"]);
    }
}
