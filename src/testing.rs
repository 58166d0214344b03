//! Test host for exercising components without a renderer.
//!
//! [`TestHost`] wires a [`Dispatcher`] to an in-memory root: lifecycle
//! actions go to the dispatcher, store effects are applied to an
//! [`EphemeralStore`], and everything else is recorded for assertions.
//! Post-render hooks queue up until [`TestHost::flush`].
//!
//! # Example
//!
//! ```ignore
//! use spark_thunk::testing::TestHost;
//! use spark_thunk::{Component, Props, VNode};
//!
//! let host = TestHost::new();
//! let label = Component::function(|_| Ok(VNode::text("hi"))).build();
//!
//! let thunk = host.thunk("0", &label, Props::new());
//! let vnode = host.create(&thunk)?;
//! assert_eq!(host.dispatcher().len(), 1);
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::action::{Action, Dispatch, DispatchResult, Outcome, dispatch_fn};
use crate::component::{Component, SharedThunk, Thunk};
use crate::config::DispatcherConfig;
use crate::engine::Dispatcher;
use crate::error::LifecycleError;
use crate::host::DeferredQueue;
use crate::store::EphemeralStore;
use crate::types::{Props, VNode};

/// In-memory host around one dispatcher.
pub struct TestHost {
    dispatcher: Dispatcher,
    root: Dispatch,
    store: Rc<EphemeralStore>,
    queue: Rc<DeferredQueue>,
    log: RefCell<Vec<Action>>,
}

impl TestHost {
    pub fn new() -> Rc<Self> {
        Self::with_config(DispatcherConfig::default())
    }

    pub fn with_config(config: DispatcherConfig) -> Rc<Self> {
        Rc::new_cyclic(|host: &Weak<TestHost>| {
            let host = host.clone();
            let root = dispatch_fn(move |action| match host.upgrade() {
                Some(host) => host.dispatch(action),
                None => Err(LifecycleError::dispatch(anyhow::anyhow!("test host dropped"))),
            });

            let store = Rc::new(EphemeralStore::new());
            let queue = Rc::new(DeferredQueue::new());
            let dispatcher = Dispatcher::builder(Rc::clone(&root), store.clone(), queue.clone())
                .config(config)
                .build();

            Self {
                dispatcher,
                root,
                store,
                queue,
                log: RefCell::default(),
            }
        })
    }

    /// The root dispatch: dispatcher first, then the store and the log.
    pub fn dispatch(&self, action: Action) -> DispatchResult {
        self.dispatcher.handle(action, |action| self.terminal(action))
    }

    fn terminal(&self, action: Action) -> DispatchResult {
        match action {
            Action::Store(effect) => Ok(self.store.apply(&effect).map_or(Outcome::Nothing, Outcome::Value)),
            other => {
                tracing::trace!(action = other.kind(), "recorded");
                self.log.borrow_mut().push(other);
                Ok(Outcome::Nothing)
            }
        }
    }

    // =========================================================================
    // Lifecycle helpers
    // =========================================================================

    pub fn thunk(&self, path: &str, component: &Rc<Component>, props: Props) -> SharedThunk {
        Thunk::new(path, component, props, vec![]).into_shared()
    }

    pub fn thunk_with_children(
        &self,
        path: &str,
        component: &Rc<Component>,
        props: Props,
        children: Vec<VNode>,
    ) -> SharedThunk {
        Thunk::new(path, component, props, children).into_shared()
    }

    pub fn create(&self, thunk: &SharedThunk) -> Result<VNode, LifecycleError> {
        self.dispatch(Action::create(thunk)).and_then(expect_node)
    }

    pub fn update(&self, thunk: &SharedThunk, prev: &SharedThunk) -> Result<VNode, LifecycleError> {
        self.dispatch(Action::update(thunk, Some(prev))).and_then(expect_node)
    }

    pub fn destroy(&self, thunk: &SharedThunk) -> Result<(), LifecycleError> {
        self.dispatch(Action::destroy(thunk)).map(drop)
    }

    /// Run queued post-render hooks.
    pub fn flush(&self) -> Vec<LifecycleError> {
        self.queue.flush()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn root(&self) -> Dispatch {
        Rc::clone(&self.root)
    }

    pub fn store(&self) -> &EphemeralStore {
        &self.store
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Actions that reached the end of the root pipeline, oldest first.
    pub fn recorded(&self) -> Vec<Action> {
        self.log.borrow().clone()
    }

    /// Kinds of the recorded actions.
    pub fn recorded_kinds(&self) -> Vec<String> {
        self.log.borrow().iter().map(|a| a.kind().to_string()).collect()
    }

    pub fn clear_recorded(&self) {
        self.log.borrow_mut().clear();
    }
}

fn expect_node(outcome: Outcome) -> Result<VNode, LifecycleError> {
    outcome
        .into_node()
        .ok_or_else(|| LifecycleError::dispatch(anyhow::anyhow!("lifecycle action produced no vnode")))
}
