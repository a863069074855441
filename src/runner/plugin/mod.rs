//! Plugin architecture and super-global scope.
//!
//! The super-global scope sits outside the lexical environment chain and
//! provides names that are available everywhere but resolved on demand:
//!
//! ```text
//! Variable Lookup Order:
//! 1. Local scope (function/block)
//! 2. Outer scopes (lexical chain)
//! 3. Global scope
//! 4. Super-global scope  <- built-ins and plugins live here
//! ```
//!
//! - [`PluginResolver`]: trait for providing named values dynamically
//! - [`SuperGlobalEnvironment`]: resolvers plus a cache of materialized values
//! - [`CorePluginResolver`]: adapter exposing a [`BuiltInRegistry`] as a resolver
//! - [`EvalContext`](types::EvalContext): execution state with super-global integration
//!
//! A script may shadow any super-global name with its own declaration; it can
//! never modify the super-global binding itself.
//!
//! ## Example: custom plugin
//!
//! ```
//! use qs_engine::runner::plugin::resolver::PluginResolver;
//! use qs_engine::runner::plugin::types::EvalContext;
//! use qs_engine::runner::ds::value::JsValue;
//! use qs_engine::runner::ds::error::JErrorType;
//!
//! struct Answer;
//!
//! impl PluginResolver for Answer {
//!     fn has_binding(&self, name: &str) -> bool {
//!         name == "ANSWER"
//!     }
//!
//!     fn resolve(&self, _name: &str, _ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
//!         Ok(JsValue::Number(42.0))
//!     }
//!
//!     fn name(&self) -> &str { "answer" }
//! }
//!
//! let mut ctx = EvalContext::new();
//! ctx.add_resolver(Box::new(Answer));
//! assert_eq!(ctx.get_binding("ANSWER").unwrap(), JsValue::Number(42.0));
//! ```

pub mod core_resolver;
pub mod registry;
pub mod resolver;
pub mod super_global;
pub mod types;

pub use core_resolver::CorePluginResolver;
pub use registry::BuiltInRegistry;
pub use resolver::PluginResolver;
pub use super_global::SuperGlobalEnvironment;
pub use types::{BuiltInFn, BuiltInObject, EvalContext, NativeFn};
