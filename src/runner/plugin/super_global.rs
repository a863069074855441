//! Super-global environment: the bottom of the scope chain.
//!
//! This environment sits below the global scope and lazily resolves
//! built-in and plugin-provided values on first access. Values are cached
//! after first resolution so each name is materialized at most once.
//!
//! ```text
//! script: Math.abs(-5)
//! 1. local and outer scopes -> not found
//! 2. global scope           -> not found
//! 3. super-global           -> CorePluginResolver claims "Math"
//! 4. the Math object is built, cached, and `abs` is read from it
//! ```
//!
//! ## Example
//!
//! ```
//! use qs_engine::runner::plugin::super_global::SuperGlobalEnvironment;
//! use qs_engine::runner::plugin::resolver::PluginResolver;
//! use qs_engine::runner::plugin::types::EvalContext;
//! use qs_engine::runner::ds::value::JsValue;
//! use qs_engine::runner::ds::error::JErrorType;
//!
//! struct MyPlugin;
//!
//! impl PluginResolver for MyPlugin {
//!     fn has_binding(&self, name: &str) -> bool {
//!         name == "MyObject"
//!     }
//!
//!     fn resolve(&self, _name: &str, _ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
//!         Ok(JsValue::Number(42.0))
//!     }
//!
//!     fn name(&self) -> &str { "my_plugin" }
//! }
//!
//! let mut sg = SuperGlobalEnvironment::new();
//! sg.add_resolver(Box::new(MyPlugin));
//! assert!(sg.has_name("MyObject"));
//! ```

use std::collections::HashMap;

use log::{debug, trace};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::resolver::PluginResolver;
use crate::runner::plugin::types::EvalContext;

/// The super-global environment for lazy resolution of built-in objects.
///
/// When a name is looked up:
/// 1. Return the cached value if the name was resolved before
/// 2. Otherwise ask each resolver's `has_binding()` in registration order
/// 3. The first resolver that claims the name materializes it via `resolve()`
/// 4. The value is cached for the rest of the runtime's life
///
/// Script code can read these bindings but never create or modify them.
/// The environment is shared through [`SharedSuperGlobal`](super::types::SharedSuperGlobal).
pub struct SuperGlobalEnvironment {
    /// Registered plugin resolvers, queried in order.
    resolvers: Vec<Box<dyn PluginResolver>>,
    /// Already-resolved bindings.
    cache: HashMap<String, JsValue>,
}

impl SuperGlobalEnvironment {
    pub fn new() -> Self {
        SuperGlobalEnvironment {
            resolvers: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Register a plugin resolver. Resolvers are queried in registration order.
    pub fn add_resolver(&mut self, resolver: Box<dyn PluginResolver>) {
        debug!("adding resolver {}", resolver.name());
        self.resolvers.push(resolver);
    }

    fn find_resolver_index(&self, name: &str) -> Option<usize> {
        self.resolvers.iter().position(|r| r.has_binding(name))
    }

    /// Check if any resolver provides the given name.
    pub fn has_name(&self, name: &str) -> bool {
        self.cache.contains_key(name) || self.find_resolver_index(name).is_some()
    }

    /// Resolve a name, caching the result.
    pub fn resolve_binding(
        &mut self,
        name: &str,
        ctx: &mut EvalContext,
    ) -> Result<JsValue, JErrorType> {
        if let Some(val) = self.cache.get(name) {
            return Ok(val.clone());
        }
        match self.find_resolver_index(name) {
            Some(idx) => {
                trace!("{} resolved by {}", name, self.resolvers[idx].name());
                let value = self.resolvers[idx].resolve(name, ctx)?;
                self.cache.insert(name.to_string(), value.clone());
                Ok(value)
            }
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
        }
    }

    /// Drops every cached value. Called when the owning runtime shuts down.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for SuperGlobalEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
