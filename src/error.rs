//! Lifecycle errors.
//!
//! Every failure in the lifecycle engine is immediate and synchronous:
//!
//! | Error | When | Recovery |
//! |-------|------|----------|
//! | [`Hook`](LifecycleError::Hook) | A user hook, render or initial-state producer failed | Transition aborted |
//! | [`Protocol`](LifecycleError::Protocol) | Caller misuse (bad path, missing prev, arity) | Fix the caller |
//! | [`Dispatch`](LifecycleError::Dispatch) | A middleware or controller rejected an action | Transition aborted |
//!
//! Nothing here is retried. Advisory shape mismatches are not errors at all;
//! see [`crate::validation::ValidationWarning`].

use std::fmt;

use thiserror::Error;

/// Which user-supplied function failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    OnCreate,
    OnUpdate,
    OnRemove,
    AfterRender,
    Render,
    InitialState,
}

impl HookKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            HookKind::OnCreate => "on_create",
            HookKind::OnUpdate => "on_update",
            HookKind::OnRemove => "on_remove",
            HookKind::AfterRender => "after_render",
            HookKind::Render => "render",
            HookKind::InitialState => "initial_state",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller misuse of the lifecycle protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("thunk has an empty path")]
    EmptyPath,

    #[error("update path mismatch: thunk is at `{thunk}` but prev is at `{prev}`")]
    PathMismatch { thunk: String, prev: String },

    #[error("update of `{path}` has no previous thunk and no rendered vnode")]
    MissingPrev { path: String },

    #[error("action `{name}` takes {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("component at `{path}` declares no action `{name}`")]
    UnknownAction { path: String, name: String },
}

/// Error raised by a lifecycle transition.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A hook failed. The message is prefixed with the component and hook names.
    #[error("{component}: {hook}: {source}")]
    Hook {
        component: String,
        hook: HookKind,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A middleware or controller refused the action.
    #[error("dispatch rejected: {0}")]
    Dispatch(#[source] anyhow::Error),
}

impl LifecycleError {
    /// Wrap an error raised by a middleware or controller.
    pub fn dispatch(err: impl Into<anyhow::Error>) -> Self {
        LifecycleError::Dispatch(err.into())
    }

    /// The failing hook, for hook errors.
    pub fn hook(&self) -> Option<HookKind> {
        match self {
            LifecycleError::Hook { hook, .. } => Some(*hook),
            _ => None,
        }
    }
}
