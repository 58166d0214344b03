//! Context Propagator - ambient context from roots to descendants.
//!
//! Only context roots (paths without a separator) may recompute context, and
//! only when their component declares a context function. A recomputed
//! context that is shallow-equal to the current one is discarded so the
//! current reference survives, which keeps context-driven re-renders away
//! from descendants. Every other thunk takes the current reference as is.
//!
//! [`ContextPropagator::invalidate`] forces the next recomputation to
//! install a new reference even when nothing changed structurally.

use std::cell::{Cell, RefCell};

use crate::component::Thunk;
use crate::equality::record_equal;
use crate::types::{Context, Record};

/// Propagator state taken before a transition, put back if it fails.
pub(crate) struct ContextSnapshot {
    current: Option<Context>,
    invalidated: bool,
}

#[derive(Default)]
pub struct ContextPropagator {
    current: RefCell<Option<Context>>,
    invalidated: Cell<bool>,
}

impl ContextPropagator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference current for this dispatch pass.
    pub fn current(&self) -> Option<Context> {
        self.current.borrow().clone()
    }

    /// Drop the cached reference once.
    pub fn invalidate(&self) {
        self.invalidated.set(true);
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.get()
    }

    pub(crate) fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            current: self.current(),
            invalidated: self.invalidated.get(),
        }
    }

    pub(crate) fn rollback(&self, snapshot: ContextSnapshot) {
        *self.current.borrow_mut() = snapshot.current;
        self.invalidated.set(snapshot.invalidated);
    }

    /// Context visible to `thunk`, recomputing it first when `thunk` is a root.
    pub fn resolve(&self, thunk: &Thunk, separator: char) -> Option<Context> {
        if thunk.is_context_root(separator)
            && let Some(produce) = &thunk.component.context
        {
            let produced = Record::from_map(produce(thunk));
            let forced = self.invalidated.replace(false);
            let mut current = self.current.borrow_mut();

            let unchanged = !forced && current.as_ref().is_some_and(|c| record_equal(c, &produced));
            if unchanged {
                tracing::trace!(path = %thunk.path, "context unchanged, keeping reference");
            } else {
                tracing::debug!(path = %thunk.path, forced, "context replaced");
                *current = Some(produced);
            }
        }

        self.current()
    }
}
