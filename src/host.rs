//! Host collaborators - deferred callbacks and host-node lookup.
//!
//! Post-render hooks never run inside a lifecycle transition. The dispatcher
//! hands them to a [`Scheduler`] and moves on; the host runs them after the
//! current render/patch cycle, in enqueue order. Their failures belong to the
//! host: the dispatcher neither awaits nor catches them.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::LifecycleError;
use crate::types::HostNode;

/// A deferred post-render task.
pub type DeferredTask = Box<dyn FnOnce() -> Result<(), LifecycleError>>;

/// Deferred-callback facility.
pub trait Scheduler {
    fn defer(&self, task: DeferredTask);
}

/// Host-node lookup. Only meaningful inside post-render hooks.
pub trait NodeLocator {
    fn find_node(&self, path: &str) -> Option<HostNode>;
}

/// Locator for hosts without materialized nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHostNodes;

impl NodeLocator for NoHostNodes {
    fn find_node(&self, _path: &str) -> Option<HostNode> {
        None
    }
}

// =============================================================================
// DeferredQueue
// =============================================================================

/// FIFO scheduler flushed explicitly by the host.
#[derive(Default)]
pub struct DeferredQueue {
    tasks: RefCell<VecDeque<DeferredTask>>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run queued tasks in enqueue order, including tasks queued while
    /// flushing. Every task runs; the failures are returned.
    pub fn flush(&self) -> Vec<LifecycleError> {
        let mut errors = Vec::new();
        // Pop one at a time so tasks may enqueue more work.
        loop {
            let Some(task) = self.tasks.borrow_mut().pop_front() else {
                break;
            };
            if let Err(err) = task() {
                tracing::warn!(error = %err, "deferred task failed");
                errors.push(err);
            }
        }
        errors
    }
}

impl Scheduler for DeferredQueue {
    fn defer(&self, task: DeferredTask) {
        self.tasks.borrow_mut().push_back(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::error::ProtocolError;

    #[test]
    fn test_flush_runs_in_enqueue_order() {
        let queue = DeferredQueue::new();
        let log: Rc<RefCell<Vec<u8>>> = Rc::default();

        for i in 0..3 {
            let log = Rc::clone(&log);
            queue.defer(Box::new(move || {
                log.borrow_mut().push(i);
                Ok(())
            }));
        }
        assert_eq!(queue.len(), 3);

        assert!(queue.flush().is_empty());
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_failures_do_not_stop_the_flush() {
        let queue = DeferredQueue::new();
        let ran: Rc<RefCell<bool>> = Rc::default();
        let ran_clone = Rc::clone(&ran);

        queue.defer(Box::new(|| Err(ProtocolError::EmptyPath.into())));
        queue.defer(Box::new(move || {
            *ran_clone.borrow_mut() = true;
            Ok(())
        }));

        let errors = queue.flush();
        assert_eq!(errors.len(), 1);
        assert!(*ran.borrow());
    }

    #[test]
    fn test_tasks_may_enqueue_tasks() {
        let queue = Rc::new(DeferredQueue::new());
        let log: Rc<RefCell<Vec<&str>>> = Rc::default();

        let inner_queue = Rc::clone(&queue);
        let outer_log = Rc::clone(&log);
        queue.defer(Box::new(move || {
            outer_log.borrow_mut().push("outer");
            let inner_log = Rc::clone(&outer_log);
            inner_queue.defer(Box::new(move || {
                inner_log.borrow_mut().push("inner");
                Ok(())
            }));
            Ok(())
        }));

        queue.flush();
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_no_host_nodes() {
        assert!(NoHostNodes.find_node("0").is_none());
    }
}
