//! # spark-thunk
//!
//! Component lifecycle reconciliation for action-dispatch virtual-tree renderers.
//!
//! A host renderer diffs its virtual tree and emits `CreateThunk`,
//! `UpdateThunk` and `DestroyThunk` actions into its dispatch pipeline. The
//! [`Dispatcher`] turns those into component lifecycles: it resolves props,
//! local state and ambient context, decides whether an update re-renders,
//! runs hooks, and wires every component instance to its own scoped
//! middleware chain.
//!
//! Local state lives outside the dispatcher in a keyed store. The dispatcher
//! reads it directly but changes it only by dispatching store effects through
//! the root, so every state transition is visible to the whole pipeline.
//!
//! ## Architecture
//!
//! ```text
//!  diff driver ──▶ root dispatch ──▶ Dispatcher::handle ──▶ rest of the host pipeline
//!                       ▲                  │
//!                       │          create / update / destroy
//!                       │                  │
//!                       └── scoped chain ◀─┘  (hooks dispatch here)
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Values, props, context records, virtual nodes
//! - [`component`] - Component descriptors and thunks
//! - [`action`] - The action protocol and dispatch outcomes
//! - [`engine`] - Dispatcher, registry, context propagator, diff gate
//! - [`middleware`] - Per-thunk scoped dispatch chains
//! - [`local_action`] - Path-bound local action creators
//! - [`equality`] - Identity and action-aware shallow equality
//! - [`store`] - Local-state store interface and the in-memory store
//! - [`host`] - Deferred scheduling and host-node lookup
//! - [`testing`] - In-memory host for tests

pub mod action;
pub mod component;
pub mod config;
pub mod engine;
pub mod equality;
pub mod error;
pub mod host;
pub mod local_action;
pub mod middleware;
pub mod store;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use types::{Context, HostNode, Map, Node, Props, Record, VNode, Value, ValueKind};

pub use action::{Action, Dispatch, DispatchResult, Outcome, Reducer, StoreAction, dispatch_fn};

pub use component::{Capabilities, Component, ComponentBuilder, Renderer, SharedThunk, Thunk, View};

pub use config::DispatcherConfig;

pub use engine::{Dispatcher, DispatcherBuilder};

pub use error::{HookKind, LifecycleError, ProtocolError};

pub use host::{DeferredQueue, DeferredTask, NoHostNodes, NodeLocator, Scheduler};

pub use local_action::{ActionCreator, ActionCreators, LocalAction};

pub use middleware::{Middleware, Next, Scope, dispatch_maybe, middleware_fn, scoped_dispatch};

pub use store::{EphemeralStore, LocalStateStore};

pub use validation::{Shape, ShapeTarget, ValidationWarning};
