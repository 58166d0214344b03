//! Lifecycle Dispatcher - the CREATE/UPDATE/DESTROY state machine.
//!
//! The dispatcher sits in the host's action pipeline. It consumes the three
//! lifecycle actions and the context-invalidation command; every other action
//! is handed to the next stage, with two additions:
//!
//! - A local action addressed to a live thunk that owns a reducer is routed
//!   back through that thunk's scoped chain, so it is rewritten into a state
//!   update no matter where it was dispatched from.
//! - A state update observed on its way to the store marks the thunk dirty
//!   when it changed the identity of the stored state.
//!
//! # Transitions
//!
//! ```text
//!             CreateThunk                UpdateThunk (gate: render)
//! (absent) ──────────────▶ live ◀──────────────────────────────┐
//!                           │  └───────────────────────────────┘
//!                           │          UpdateThunk (gate: skip, prev vnode)
//!                           │ DestroyThunk
//!                           ▼
//!                        (absent)
//! ```
//!
//! Transitions work on a snapshot of the thunk. User hooks never see a live
//! `RefCell` borrow, and a failed transition rolls back what the dispatcher
//! owns: the registry entry, the path's dirty mark and the propagator's
//! context are put back, and the shared thunk keeps its previous contents.
//! Effects a hook already dispatched through the root are not undone.

use std::rc::Rc;

use crate::action::{Action, Dispatch, DispatchResult, Outcome, StoreAction};
use crate::component::{Component, SharedThunk, Thunk};
use crate::config::DispatcherConfig;
use crate::error::{HookKind, LifecycleError, ProtocolError};
use crate::host::{NoHostNodes, NodeLocator, Scheduler};
use crate::local_action::{ActionCreators, LocalAction};
use crate::middleware::{dispatch_maybe, scoped_dispatch};
use crate::store::LocalStateStore;
use crate::types::{Context, Value, VNode};
use crate::validation::{ShapeTarget, validate};

use super::context::{ContextPropagator, ContextSnapshot};
use super::diff_gate::{same_state, should_render};
use super::hooks::decorate;
use super::registry::Registry;

// =============================================================================
// Builder
// =============================================================================

/// Assembles a [`Dispatcher`].
pub struct DispatcherBuilder {
    root: Dispatch,
    store: Rc<dyn LocalStateStore>,
    scheduler: Rc<dyn Scheduler>,
    locator: Rc<dyn NodeLocator>,
    config: DispatcherConfig,
}

impl DispatcherBuilder {
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Host-node lookup handed to post-render hooks. Defaults to [`NoHostNodes`].
    pub fn locator(mut self, locator: Rc<dyn NodeLocator>) -> Self {
        self.locator = locator;
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            config: self.config,
            root: self.root,
            store: self.store,
            scheduler: self.scheduler,
            locator: self.locator,
            registry: Registry::new(),
            context: ContextPropagator::new(),
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Dispatcher-owned state a failed transition puts back.
struct Checkpoint {
    context: ContextSnapshot,
    dirty: bool,
}

/// Processes lifecycle actions for one tree.
pub struct Dispatcher {
    config: DispatcherConfig,
    root: Dispatch,
    store: Rc<dyn LocalStateStore>,
    scheduler: Rc<dyn Scheduler>,
    locator: Rc<dyn NodeLocator>,
    registry: Registry,
    context: ContextPropagator,
}

impl Dispatcher {
    /// Start a dispatcher.
    ///
    /// `root` is the host's top-level dispatch. Hooks, scoped chains and
    /// store effects all dispatch through it, so it normally leads back into
    /// [`Dispatcher::handle`].
    pub fn builder(
        root: Dispatch,
        store: Rc<dyn LocalStateStore>,
        scheduler: Rc<dyn Scheduler>,
    ) -> DispatcherBuilder {
        DispatcherBuilder {
            root,
            store,
            scheduler,
            locator: Rc::new(NoHostNodes),
            config: DispatcherConfig::default(),
        }
    }

    /// Process one action, forwarding anything that is not a lifecycle
    /// concern to `next`.
    pub fn handle(&self, action: Action, next: impl FnOnce(Action) -> DispatchResult) -> DispatchResult {
        match action {
            Action::CreateThunk { vnode } => self.create(&vnode).map(Outcome::Node),
            Action::UpdateThunk { vnode, prev } => self.update(&vnode, prev.as_ref()).map(Outcome::Node),
            Action::DestroyThunk { vnode } => self.destroy(&vnode).map(|()| Outcome::Nothing),
            Action::InvalidateContext => {
                tracing::debug!("context invalidated");
                self.context.invalidate();
                Ok(Outcome::Nothing)
            }
            Action::Local(local) => self.route_local(local, next),
            action if self.store.is_own_action(&action) => self.observe_store(action, next),
            action => next(action),
        }
    }

    // =========================================================================
    // CREATE
    // =========================================================================

    /// Initialize a new thunk and render it.
    pub fn create(&self, shared: &SharedThunk) -> Result<VNode, LifecycleError> {
        let path = shared.borrow().path.clone();
        if path.is_empty() {
            return Err(ProtocolError::EmptyPath.into());
        }

        let checkpoint = self.checkpoint(&path);
        let previous = self.registry.register(&path, shared);
        let result = self.create_registered(shared, &path);
        if result.is_err() {
            self.registry.restore(&path, previous);
            self.rollback(&path, checkpoint);
        }
        result
    }

    fn create_registered(&self, shared: &SharedThunk, path: &str) -> Result<VNode, LifecycleError> {
        let mut thunk = shared.borrow().clone();
        let component = Rc::clone(&thunk.component);
        let name = self.component_name(&component);
        tracing::debug!(path, component = name, "create thunk");

        thunk.props = component.resolve_props(&thunk.props);

        // State: warm start from the store, else the initial-state producer
        thunk.state = self.store.lookup(path);
        self.registry.clear_dirty(path);
        if thunk.state.is_none() && component.capabilities().has_local_state() {
            let initial = match &component.initial_state {
                Some(produce) => decorate(name, HookKind::InitialState, produce(&thunk))?,
                None => Value::map::<String, Value>([]),
            };
            thunk.state = Some(initial.clone());
            (self.root)(Action::Store(StoreAction::Create {
                path: Rc::from(path),
                state: initial,
            }))?;
        }

        thunk.context = self.context.resolve(&thunk, self.config.path_separator);
        self.validate_shapes(&component, &thunk);

        if !component.actions().is_empty() {
            thunk.actions = Some(Rc::new(ActionCreators::bind(path, component.actions())));
        }
        let dispatch = scoped_dispatch(path, &component, &self.root);
        thunk.middleware = Some(Rc::clone(&dispatch));

        if let Some(hook) = &component.on_create {
            let action = decorate(name, HookKind::OnCreate, hook(&thunk))?;
            dispatch_maybe(&dispatch, action)?;
        }

        let vnode = decorate(name, HookKind::Render, component.renderer().invoke(&thunk))?;
        thunk.vnode = Some(vnode.clone());
        *shared.borrow_mut() = thunk;

        self.schedule_after_render(shared, &component);
        Ok(vnode)
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    /// Revisit a thunk position: render it again or reuse the prev output.
    ///
    /// A thunk that already carries a vnode is returned as is.
    pub fn update(&self, shared: &SharedThunk, prev: Option<&SharedThunk>) -> Result<VNode, LifecycleError> {
        if let Some(vnode) = shared.borrow().vnode.clone() {
            tracing::trace!(path = %shared.borrow().path, "update of rendered thunk, reusing vnode");
            return Ok(vnode);
        }

        let path = shared.borrow().path.clone();
        let Some(prev) = prev else {
            return Err(ProtocolError::MissingPrev { path }.into());
        };
        // Snapshot before anything else; `prev` and `shared` may be one cell
        let prev = prev.borrow().clone();
        if prev.path != path {
            return Err(ProtocolError::PathMismatch {
                thunk: path,
                prev: prev.path,
            }
            .into());
        }

        let checkpoint = self.checkpoint(&path);
        let previous = self.registry.register(&path, shared);
        let result = self.update_registered(shared, &prev, &path);
        if result.is_err() {
            self.registry.restore(&path, previous);
            self.rollback(&path, checkpoint);
        }
        result
    }

    fn update_registered(&self, shared: &SharedThunk, prev: &Thunk, path: &str) -> Result<VNode, LifecycleError> {
        let mut thunk = shared.borrow().clone();
        let component = Rc::clone(&thunk.component);
        let name = self.component_name(&component);

        thunk.actions = prev.actions.clone();
        thunk.middleware = prev
            .middleware
            .clone()
            .or_else(|| Some(scoped_dispatch(path, &component, &self.root)));
        thunk.props = component.resolve_props(&thunk.props);
        thunk.state = self.store.lookup(path);
        self.registry.clear_dirty(path);
        thunk.context = self.context.resolve(&thunk, self.config.path_separator);
        self.validate_shapes(&component, &thunk);

        let render = should_render(prev, &thunk);
        if !render && let Some(vnode) = prev.vnode.clone() {
            tracing::trace!(path, component = name, "render skipped");
            thunk.vnode = Some(vnode.clone());
            *shared.borrow_mut() = thunk;
            return Ok(vnode);
        }

        tracing::debug!(path, component = name, "update thunk");
        if let Some(hook) = &component.on_update {
            let action = decorate(name, HookKind::OnUpdate, hook(prev, &thunk))?;
            if let Some(dispatch) = &thunk.middleware {
                dispatch_maybe(dispatch, action)?;
            }
        }

        let vnode = decorate(name, HookKind::Render, component.renderer().invoke(&thunk))?;
        thunk.vnode = Some(vnode.clone());
        *shared.borrow_mut() = thunk;

        self.schedule_after_render(shared, &component);
        Ok(vnode)
    }

    // =========================================================================
    // DESTROY
    // =========================================================================

    /// Tear a thunk down. Destroying an unregistered path is a no-op.
    pub fn destroy(&self, shared: &SharedThunk) -> Result<(), LifecycleError> {
        let thunk = shared.borrow().clone();
        let checkpoint = self.checkpoint(&thunk.path);
        let Some(previous) = self.registry.deregister(&thunk.path) else {
            tracing::trace!(path = %thunk.path, "destroy of unregistered path ignored");
            return Ok(());
        };

        let component = Rc::clone(&thunk.component);
        let name = self.component_name(&component);
        tracing::debug!(path = %thunk.path, component = name, "destroy thunk");

        let result = self.teardown(&thunk, &component, name);
        if result.is_err() {
            self.registry.restore(&thunk.path, Some(previous));
            self.rollback(&thunk.path, checkpoint);
        }
        result
    }

    /// Stored props were resolved when the thunk rendered; hooks get them as is.
    fn teardown(&self, thunk: &Thunk, component: &Component, name: &str) -> Result<(), LifecycleError> {
        if let Some(hook) = &component.on_remove {
            let dispatch = thunk
                .middleware
                .clone()
                .unwrap_or_else(|| Rc::clone(&self.root));
            let action = decorate(name, HookKind::OnRemove, hook(thunk))?;
            dispatch_maybe(&dispatch, action)?;
        }

        if component.capabilities().has_local_state() {
            (self.root)(Action::Store(StoreAction::Destroy {
                path: Rc::from(thunk.path.as_str()),
            }))?;
        }
        Ok(())
    }

    fn checkpoint(&self, path: &str) -> Checkpoint {
        Checkpoint {
            context: self.context.snapshot(),
            dirty: self.registry.peek_dirty(path),
        }
    }

    fn rollback(&self, path: &str, checkpoint: Checkpoint) {
        tracing::trace!(path, "rolling back failed transition");
        self.context.rollback(checkpoint.context);
        if checkpoint.dirty {
            self.registry.mark_dirty(path);
        } else {
            self.registry.clear_dirty(path);
        }
    }

    // =========================================================================
    // Forwarded traffic
    // =========================================================================

    fn route_local(
        &self,
        local: Rc<LocalAction>,
        next: impl FnOnce(Action) -> DispatchResult,
    ) -> DispatchResult {
        let owner_chain = self.registry.get(&local.path).and_then(|owner| {
            let owner = owner.borrow();
            owner
                .component
                .reducer()
                .and(owner.middleware.clone())
        });

        match owner_chain {
            Some(chain) => {
                tracing::trace!(path = %local.path, action = %local.name, "routing local action to owner");
                chain(Action::Local(local))
            }
            None => next(Action::Local(local)),
        }
    }

    fn observe_store(&self, action: Action, next: impl FnOnce(Action) -> DispatchResult) -> DispatchResult {
        let path = match &action {
            Action::Store(StoreAction::Update { path, .. }) => Rc::clone(path),
            _ => return next(action),
        };

        let before = self.store.lookup(&path);
        let outcome = next(action)?;
        let after = self.store.lookup(&path);

        if !same_state(before.as_ref(), after.as_ref()) && self.registry.contains(&path) {
            tracing::trace!(path = %path, "local state changed");
            self.registry.mark_dirty(&path);
        }
        Ok(outcome)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn component_name<'a>(&'a self, component: &'a Component) -> &'a str {
        component.name().unwrap_or(&self.config.anonymous_name)
    }

    fn schedule_after_render(&self, shared: &SharedThunk, component: &Component) {
        let Some(hook) = component.after_render.clone() else {
            return;
        };

        let shared = Rc::clone(shared);
        let locator = Rc::clone(&self.locator);
        let name = self.component_name(component).to_string();

        self.scheduler.defer(Box::new(move || {
            let thunk = shared.borrow().clone();
            let node = locator.find_node(&thunk.path);
            let action = decorate(&name, HookKind::AfterRender, hook(&thunk, node))?;
            match &thunk.middleware {
                Some(dispatch) => dispatch_maybe(dispatch, action).map(drop),
                None => Ok(()),
            }
        }));
    }

    fn validate_shapes(&self, component: &Component, thunk: &Thunk) {
        if !self.config.validate_shapes {
            return;
        }
        let name = self.component_name(component);

        if let Some(shape) = component.prop_shape() {
            validate(name, &thunk.path, ShapeTarget::Props, shape, thunk.props.as_map());
        }
        if let Some(shape) = component.state_shape()
            && let Some(state) = thunk.state.as_ref().and_then(Value::as_map)
        {
            validate(name, &thunk.path, ShapeTarget::State, shape, state);
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Live thunk at `path`.
    pub fn lookup(&self, path: &str) -> Option<SharedThunk> {
        self.registry.get(path)
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.registry.paths()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Whether the local state of `path` changed since it last rendered.
    pub fn is_dirty(&self, path: &str) -> bool {
        self.registry.is_dirty(path)
    }

    pub fn dirty_paths(&self) -> Vec<String> {
        self.registry.dirty_paths()
    }

    /// The current context reference.
    pub fn context(&self) -> Option<Context> {
        self.context.current()
    }
}
