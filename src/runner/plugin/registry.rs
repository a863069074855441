//! Built-in registry: the definitions behind every core super-global name.

use std::collections::HashMap;

use super::types::{BuiltInFn, BuiltInObject};
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::register_core_builtins;

/// Registry for built-in objects.
///
/// Holds the definitions of every built-in namespace and constructor, the
/// methods reachable from primitive and object instances, and plain global
/// values such as `NaN`.
pub struct BuiltInRegistry {
    /// All registered built-in objects.
    objects: HashMap<String, BuiltInObject>,

    /// Global names bound to plain values.
    values: HashMap<String, JsValue>,
}

impl BuiltInRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        BuiltInRegistry {
            objects: HashMap::new(),
            values: HashMap::new(),
        }
    }

    /// Create a registry with the core built-ins.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        register_core_builtins(&mut registry);
        registry
    }

    /// Register a built-in object (programmatic API).
    pub fn register_object(&mut self, obj: BuiltInObject) {
        self.objects.insert(obj.name.clone(), obj);
    }

    /// Bind a global name to a plain value.
    pub fn register_value(&mut self, name: impl Into<String>, value: JsValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get_object(&self, name: &str) -> Option<&BuiltInObject> {
        self.objects.get(name)
    }

    pub fn get_value(&self, name: &str) -> Option<&JsValue> {
        self.values.get(name)
    }

    pub fn get_method(&self, object: &str, method: &str) -> Option<&BuiltInFn> {
        self.objects
            .get(object)
            .and_then(|obj| obj.methods.get(method))
    }

    /// Method looked up from an instance, e.g. `("Array", "push")`.
    pub fn get_prototype_method(&self, class: &str, method: &str) -> Option<&BuiltInFn> {
        self.objects
            .get(class)
            .and_then(|obj| obj.prototype_methods.get(method))
    }

    pub fn get_constructor(&self, object: &str) -> Option<&BuiltInFn> {
        self.objects
            .get(object)
            .and_then(|obj| obj.constructor.as_ref())
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    pub fn has_method(&self, object: &str, method: &str) -> bool {
        self.objects
            .get(object)
            .map(|obj| obj.methods.contains_key(method))
            .unwrap_or(false)
    }

    /// Names of all registered objects and values, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .objects
            .keys()
            .chain(self.values.keys())
            .map(|s| s.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl Default for BuiltInRegistry {
    fn default() -> Self {
        Self::with_core()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_registry_contents() {
        let registry = BuiltInRegistry::with_core();
        assert!(registry.has_object("Math"));
        assert!(registry.has_method("Math", "floor"));
        assert!(registry.get_prototype_method("Array", "push").is_some());
        assert!(registry.get_prototype_method("String", "trim").is_some());
        assert!(registry.get_constructor("Error").is_some());
        assert!(registry.get_value("NaN").is_some());
        assert!(registry.get_method("Math", "nope").is_none());
    }

    #[test]
    fn test_names_cover_objects_and_values() {
        let registry = BuiltInRegistry::with_core();
        let names = registry.names();
        assert!(names.contains(&"console"));
        assert!(names.contains(&"Infinity"));
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
        assert!(BuiltInRegistry::new().names().is_empty());
    }
}
