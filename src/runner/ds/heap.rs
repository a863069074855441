//! Heap management for the runtime.
//!
//! Objects are reference counted; the heap only keeps weak handles to them so
//! it can count live entries, enforce an object limit, and break
//! environment/closure cycles when the owning runtime is dropped.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Deserialize;
use uuid::Uuid;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment};
use crate::runner::ds::object::{JsObjectType, ObjectType};

const MIN_SWEEP_THRESHOLD: usize = 1024;

/// Identity of a runtime. Objects and host handles are tagged with it so
/// values from one runtime cannot be slipped into another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RuntimeId(Uuid);

impl RuntimeId {
    pub fn new() -> Self {
        RuntimeId(Uuid::new_v4())
    }
}

impl Default for RuntimeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hyphenated())
    }
}

/// Configuration for the heap manager.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeapConfig {
    /// Maximum number of live objects. None means unlimited.
    pub max_objects: Option<usize>,
}

impl HeapConfig {
    /// Create a new heap configuration with no object limit.
    pub fn unlimited() -> Self {
        HeapConfig { max_objects: None }
    }

    /// Create a new heap configuration with an object limit.
    pub fn with_limit(max_objects: usize) -> Self {
        HeapConfig {
            max_objects: Some(max_objects),
        }
    }
}

/// Heap manager tracking every object and environment a runtime allocates.
pub struct Heap {
    config: HeapConfig,
    objects: Vec<Weak<RefCell<ObjectType>>>,
    environments: Vec<Weak<RefCell<LexEnvironment>>>,
    object_sweep_at: usize,
    environment_sweep_at: usize,
}

impl Heap {
    /// Create a new heap with the given configuration.
    pub fn new(config: HeapConfig) -> Self {
        Heap {
            config,
            objects: Vec::new(),
            environments: Vec::new(),
            object_sweep_at: MIN_SWEEP_THRESHOLD,
            environment_sweep_at: MIN_SWEEP_THRESHOLD,
        }
    }

    /// Moves `object` onto the heap.
    ///
    /// Returns a RangeError if the object limit would be exceeded.
    pub fn allocate(&mut self, object: ObjectType) -> Result<JsObjectType, JErrorType> {
        if let Some(max) = self.config.max_objects {
            if self.objects.len() >= max {
                self.sweep_objects();
                if self.objects.len() >= max {
                    return Err(JErrorType::RangeError("Out of memory".to_string()));
                }
            }
        } else if self.objects.len() >= self.object_sweep_at {
            self.sweep_objects();
            self.object_sweep_at = MIN_SWEEP_THRESHOLD.max(self.objects.len() * 2);
        }
        let rc = Rc::new(RefCell::new(object));
        self.objects.push(Rc::downgrade(&rc));
        Ok(rc)
    }

    /// Starts tracking an object that was created outside the heap.
    pub fn adopt(&mut self, object: &JsObjectType) {
        let ptr = Rc::as_ptr(object);
        if !self.objects.iter().any(|w| w.as_ptr() == ptr) {
            self.objects.push(Rc::downgrade(object));
        }
    }

    pub fn track_environment(&mut self, env: &JsLexEnvironmentType) {
        if self.environments.len() >= self.environment_sweep_at {
            self.environments.retain(|w| w.strong_count() > 0);
            self.environment_sweep_at = MIN_SWEEP_THRESHOLD.max(self.environments.len() * 2);
        }
        self.environments.push(Rc::downgrade(env));
    }

    fn sweep_objects(&mut self) {
        self.objects.retain(|w| w.strong_count() > 0);
    }

    /// Number of objects still alive.
    pub fn live_objects(&mut self) -> usize {
        self.sweep_objects();
        self.objects.len()
    }

    /// Number of environments still alive.
    pub fn live_environments(&mut self) -> usize {
        self.environments.retain(|w| w.strong_count() > 0);
        self.environments.len()
    }

    pub fn get_max_objects(&self) -> Option<usize> {
        self.config.max_objects
    }

    /// Clears every environment the runtime created. Closures and the
    /// environments they capture point at each other, so without this those
    /// cycles would never be freed.
    pub fn teardown(&mut self) {
        for env in self.environments.drain(..) {
            if let Some(env) = env.upgrade() {
                if let Ok(mut env) = env.try_borrow_mut() {
                    env.inner.clear();
                    env.outer = None;
                }
            }
        }
        self.objects.clear();
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(HeapConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::OrdinaryObject;
    use crate::runner::ds::operations::lex_env::new_declarative_environment;

    fn ordinary() -> ObjectType {
        ObjectType::Ordinary(OrdinaryObject::new())
    }

    #[test]
    fn test_heap_unlimited() {
        let mut heap = Heap::new(HeapConfig::unlimited());
        let kept: Vec<_> = (0..2000).map(|_| heap.allocate(ordinary()).unwrap()).collect();
        assert_eq!(heap.live_objects(), 2000);
        drop(kept);
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_heap_limited() {
        let mut heap = Heap::new(HeapConfig::with_limit(2));
        let a = heap.allocate(ordinary()).unwrap();
        let _b = heap.allocate(ordinary()).unwrap();

        let result = heap.allocate(ordinary());
        match result {
            Err(JErrorType::RangeError(msg)) => assert_eq!(msg, "Out of memory"),
            _ => panic!("expected a RangeError"),
        }

        // Releasing an object frees a slot.
        drop(a);
        assert!(heap.allocate(ordinary()).is_ok());
    }

    #[test]
    fn test_adopt_counts_once() {
        let mut heap = Heap::default();
        let o = ordinary().into_untracked();
        heap.adopt(&o);
        heap.adopt(&o);
        assert_eq!(heap.live_objects(), 1);
    }

    #[test]
    fn test_teardown_clears_environments() {
        let mut heap = Heap::default();
        let env = new_declarative_environment(None);
        env.borrow_mut()
            .inner
            .as_env_record_mut()
            .create_mutable_binding("x".to_string());
        heap.track_environment(&env);
        assert_eq!(heap.live_environments(), 1);
        heap.teardown();
        assert!(!env.borrow().inner.as_env_record().has_binding("x"));
    }
}
