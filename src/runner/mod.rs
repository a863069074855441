//! Evaluation side of the engine.
//!
//! - [`api`]: the [`Runtime`](api::Runtime) a host embeds
//! - [`config`]: TOML runtime configuration
//! - [`ds`]: values, objects, environments and the heap
//! - [`eval`]: the tree-walking evaluator
//! - [`plugin`]: super-global scope and built-in registry
//! - [`std_lib`]: core built-ins (console, Math, Array, ...)

pub mod api;
pub mod config;
pub mod ds;
pub mod eval;
pub mod plugin;
pub mod std_lib;

pub use api::{EvalError, EvaluationState, Runtime};
pub use config::{ConfigError, RuntimeConfig};
