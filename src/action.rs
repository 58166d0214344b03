//! Action protocol - what flows through dispatch.
//!
//! The dispatcher consumes the three lifecycle actions and the
//! context-invalidation command. Everything else is ordinary traffic that it
//! forwards untouched (local-state effects are observed on the way through).
//!
//! ```text
//! driver ──CreateThunk/UpdateThunk/DestroyThunk──▶ Dispatcher ──▶ next stage
//!                                                     │
//!          hooks ──▶ scoped chain ──Store(..)/Custom──┘ (re-enters at root)
//! ```

use std::fmt;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};

use crate::component::SharedThunk;
use crate::error::LifecycleError;
use crate::local_action::LocalAction;
use crate::types::{VNode, Value};

// =============================================================================
// Dispatch
// =============================================================================

/// Result of dispatching one action.
pub type DispatchResult = Result<Outcome, LifecycleError>;

/// A dispatch function. The root dispatch and every scoped chain have this shape.
pub type Dispatch = Rc<dyn Fn(Action) -> DispatchResult>;

/// Wrap a closure as a [`Dispatch`].
pub fn dispatch_fn(f: impl Fn(Action) -> DispatchResult + 'static) -> Dispatch {
    Rc::new(f)
}

// =============================================================================
// Reducer
// =============================================================================

/// Local-state reducer: `(state, action) -> next state`.
#[derive(Clone)]
pub struct Reducer(Rc<dyn Fn(&Value, &LocalAction) -> Value>);

impl Reducer {
    pub fn new(f: impl Fn(&Value, &LocalAction) -> Value + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[inline]
    pub fn apply(&self, state: &Value, action: &LocalAction) -> Value {
        (self.0)(state, action)
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reducer(..)")
    }
}

// =============================================================================
// Actions
// =============================================================================

/// Effects addressed to the keyed local-state store.
#[derive(Debug, Clone)]
pub enum StoreAction {
    /// Create local state for `path`.
    Create { path: Rc<str>, state: Value },
    /// Run `reducer` over the state of `path` with a local action.
    Update {
        path: Rc<str>,
        action: Rc<LocalAction>,
        reducer: Reducer,
    },
    /// Release local state for `path`.
    Destroy { path: Rc<str> },
}

impl StoreAction {
    pub fn path(&self) -> &str {
        match self {
            StoreAction::Create { path, .. }
            | StoreAction::Update { path, .. }
            | StoreAction::Destroy { path } => path,
        }
    }
}

/// Anything that can be dispatched.
#[derive(Debug, Clone)]
pub enum Action {
    /// A freshly built thunk entered the tree.
    CreateThunk { vnode: SharedThunk },
    /// A thunk position was revisited. `prev` is present when the position is reused.
    UpdateThunk {
        vnode: SharedThunk,
        prev: Option<SharedThunk>,
    },
    /// A thunk left the tree.
    DestroyThunk { vnode: SharedThunk },
    /// Force the next context computation to produce a new reference.
    InvalidateContext,
    /// A local action descriptor.
    Local(Rc<LocalAction>),
    /// A local-state effect.
    Store(StoreAction),
    /// Dispatched one after another, in order.
    Sequence(Vec<Action>),
    /// Dispatched together; the outcome resolves when every entry has.
    Batch(Vec<Action>),
    /// Application action.
    Custom { kind: Rc<str>, payload: Value },
}

impl Action {
    pub fn custom(kind: impl Into<Rc<str>>, payload: impl Into<Value>) -> Self {
        Action::Custom {
            kind: kind.into(),
            payload: payload.into(),
        }
    }

    pub fn create(thunk: &SharedThunk) -> Self {
        Action::CreateThunk {
            vnode: Rc::clone(thunk),
        }
    }

    pub fn update(thunk: &SharedThunk, prev: Option<&SharedThunk>) -> Self {
        Action::UpdateThunk {
            vnode: Rc::clone(thunk),
            prev: prev.map(Rc::clone),
        }
    }

    pub fn destroy(thunk: &SharedThunk) -> Self {
        Action::DestroyThunk {
            vnode: Rc::clone(thunk),
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &str {
        match self {
            Action::CreateThunk { .. } => "create_thunk",
            Action::UpdateThunk { .. } => "update_thunk",
            Action::DestroyThunk { .. } => "destroy_thunk",
            Action::InvalidateContext => "invalidate_context",
            Action::Local(_) => "local",
            Action::Store(StoreAction::Create { .. }) => "store_create",
            Action::Store(StoreAction::Update { .. }) => "store_update",
            Action::Store(StoreAction::Destroy { .. }) => "store_destroy",
            Action::Sequence(_) => "sequence",
            Action::Batch(_) => "batch",
            Action::Custom { kind, .. } => kind,
        }
    }
}

impl From<Rc<LocalAction>> for Action {
    fn from(action: Rc<LocalAction>) -> Self {
        Action::Local(action)
    }
}

impl From<StoreAction> for Action {
    fn from(action: StoreAction) -> Self {
        Action::Store(action)
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// What a dispatch produced.
pub enum Outcome {
    Nothing,
    /// Render output (lifecycle actions).
    Node(VNode),
    Value(Value),
    /// One outcome per entry of a sequence or a fully synchronous batch.
    Many(Vec<Outcome>),
    /// Resolves later. Produced by controllers and by batches with async entries.
    Pending(LocalBoxFuture<'static, Outcome>),
}

impl Outcome {
    /// Wrap a future.
    pub fn pending(fut: impl Future<Output = Outcome> + 'static) -> Self {
        Outcome::Pending(fut.boxed_local())
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending(_))
    }

    pub fn into_node(self) -> Option<VNode> {
        match self {
            Outcome::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Turn any outcome into a future. Ready outcomes resolve immediately.
    pub fn resolve(self) -> LocalBoxFuture<'static, Outcome> {
        match self {
            Outcome::Pending(fut) => fut,
            ready => future::ready(ready).boxed_local(),
        }
    }

    /// Combine batch results: synchronous if every entry is, pending otherwise.
    pub fn join(outcomes: Vec<Outcome>) -> Outcome {
        if !outcomes.iter().any(Outcome::is_pending) {
            return Outcome::Many(outcomes);
        }

        let futures: Vec<_> = outcomes.into_iter().map(Outcome::resolve).collect();
        Outcome::pending(async move { Outcome::Many(future::join_all(futures).await) })
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Nothing => f.write_str("Nothing"),
            Outcome::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Outcome::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Outcome::Many(items) => f.debug_tuple("Many").field(items).finish(),
            Outcome::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}
