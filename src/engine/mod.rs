//! Lifecycle engine - the dispatcher and the state it owns.
//!
//! - Registry: live thunks by path, plus the reactive dirty set
//! - Context: ambient context, recomputed only at roots
//! - Diff gate: render or reuse on UPDATE
//! - Hooks: error decoration of user functions
//! - Dispatcher: CREATE / UPDATE / DESTROY
//!
//! # Architecture
//!
//! ```text
//!  driver ──lifecycle action──▶ Dispatcher::handle
//!                                 ├─ Registry        (path → thunk, dirty)
//!                                 ├─ ContextPropagator
//!                                 ├─ diff_gate::should_render
//!                                 └─ hooks::decorate (user fns)
//!                                        │
//!                                 scoped chain ──▶ root dispatch
//! ```
//!
//! The dispatcher is single-threaded. Everything it owns sits behind
//! `RefCell`/`Cell` and is mutated only while a transition runs.

mod context;
mod diff_gate;
mod dispatcher;
mod hooks;
mod registry;

pub use context::ContextPropagator;
pub use diff_gate::{default_should_render, should_render};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use hooks::decorate;
pub use registry::Registry;
