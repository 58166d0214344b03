//! Thunk Registry - live thunks by path, plus the dirty set.
//!
//! Owned by exactly one dispatcher and mutated only inside its transition
//! handlers:
//! - `path → SharedThunk` map, one live thunk per path
//! - ReactiveSet of dirty paths (local state changed since the thunk last
//!   rendered); an external scheduler's deriveds react to add/remove
//!
//! Writes to the dirty set run inside [`batch`], so the set's `RefCell` is
//! released before any effect that reads it gets to run.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use spark_signals::{ReactiveSet, batch};

use crate::component::SharedThunk;

/// Live thunks of one dispatcher.
pub struct Registry {
    thunks: RefCell<HashMap<String, SharedThunk>>,
    dirty: RefCell<ReactiveSet<String>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            thunks: RefCell::new(HashMap::new()),
            dirty: RefCell::new(ReactiveSet::new()),
        }
    }

    // =========================================================================
    // Thunks
    // =========================================================================

    /// Register `thunk` at `path`, returning the thunk it replaced.
    pub fn register(&self, path: &str, thunk: &SharedThunk) -> Option<SharedThunk> {
        self.thunks
            .borrow_mut()
            .insert(path.to_string(), Rc::clone(thunk))
    }

    /// Put back (or clear) whatever was registered before a failed transition.
    pub fn restore(&self, path: &str, previous: Option<SharedThunk>) {
        let mut thunks = self.thunks.borrow_mut();
        match previous {
            Some(thunk) => {
                thunks.insert(path.to_string(), thunk);
            }
            None => {
                thunks.remove(path);
            }
        }
    }

    /// Remove `path` from the registry and the dirty set.
    pub fn deregister(&self, path: &str) -> Option<SharedThunk> {
        let removed = self.thunks.borrow_mut().remove(path);
        self.clear_dirty(path);
        removed
    }

    pub fn get(&self, path: &str) -> Option<SharedThunk> {
        self.thunks.borrow().get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.thunks.borrow().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.thunks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.thunks.borrow().is_empty()
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.thunks.borrow().keys().cloned().collect();
        paths.sort();
        paths
    }

    // =========================================================================
    // Dirty Set
    // =========================================================================

    pub fn mark_dirty(&self, path: &str) {
        batch(|| {
            self.dirty.borrow_mut().insert(path.to_string());
        });
    }

    pub fn clear_dirty(&self, path: &str) {
        batch(|| {
            self.dirty.borrow_mut().remove(path);
        });
    }

    /// Reactive read: creates a dependency when called from a derived/effect.
    pub fn is_dirty(&self, path: &str) -> bool {
        self.dirty.borrow().contains(path)
    }

    /// Untracked read, for callers that must not subscribe.
    pub fn peek_dirty(&self, path: &str) -> bool {
        self.dirty.borrow().raw().contains(path)
    }

    /// Dirty paths, sorted. Reactive read.
    pub fn dirty_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.dirty.borrow().iter().cloned().collect();
        paths.sort();
        paths
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, Thunk};
    use crate::types::{Props, VNode};

    fn thunk(path: &str) -> SharedThunk {
        let component = Component::function(|_| Ok(VNode::empty())).build();
        Thunk::new(path, &component, Props::new(), vec![]).into_shared()
    }

    #[test]
    fn test_register_and_replace() {
        let registry = Registry::new();
        let first = thunk("0");
        let second = thunk("0");

        assert!(registry.register("0", &first).is_none());
        let replaced = registry.register("0", &second).unwrap();

        assert!(Rc::ptr_eq(&replaced, &first));
        assert!(Rc::ptr_eq(&registry.get("0").unwrap(), &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_deregister_clears_dirty() {
        let registry = Registry::new();
        registry.register("0.1", &thunk("0.1"));
        registry.mark_dirty("0.1");
        assert!(registry.is_dirty("0.1"));

        assert!(registry.deregister("0.1").is_some());
        assert!(!registry.contains("0.1"));
        assert!(!registry.is_dirty("0.1"));
        assert!(registry.deregister("0.1").is_none());
    }

    #[test]
    fn test_restore() {
        let registry = Registry::new();
        let old = thunk("0");
        registry.register("0", &old);

        let previous = registry.register("0", &thunk("0"));
        registry.restore("0", previous);
        assert!(Rc::ptr_eq(&registry.get("0").unwrap(), &old));

        let previous = registry.register("1", &thunk("1"));
        registry.restore("1", previous);
        assert!(!registry.contains("1"));
    }

    #[test]
    fn test_dirty_paths_sorted() {
        let registry = Registry::new();
        registry.mark_dirty("0.2");
        registry.mark_dirty("0.1");
        registry.mark_dirty("0.2");

        assert_eq!(registry.dirty_paths(), vec!["0.1", "0.2"]);

        registry.clear_dirty("0.2");
        assert_eq!(registry.dirty_paths(), vec!["0.1"]);
    }

    #[test]
    fn test_effect_reads_dirty_paths_while_marking() {
        use spark_signals::{effect, flush_sync};

        let registry = Rc::new(Registry::new());
        let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::default();

        let (watched, log) = (Rc::clone(&registry), Rc::clone(&seen));
        let _dispose = effect(move || {
            let paths = watched.dirty_paths();
            let _ = watched.is_dirty("0");
            log.borrow_mut().push(paths);
        });

        registry.mark_dirty("0");
        flush_sync();
        registry.mark_dirty("0.1");
        flush_sync();
        registry.clear_dirty("0");
        flush_sync();

        let seen = seen.borrow();
        assert_eq!(seen.first().unwrap(), &Vec::<String>::new());
        assert_eq!(seen.last().unwrap(), &vec!["0.1".to_string()]);
        assert!(seen.iter().any(|paths| paths == &vec!["0".to_string(), "0.1".to_string()]));
    }

    #[test]
    fn test_paths_sorted() {
        let registry = Registry::new();
        registry.register("1", &thunk("1"));
        registry.register("0", &thunk("0"));

        assert_eq!(registry.paths(), vec!["0", "1"]);
        assert!(!registry.is_empty());
    }
}
