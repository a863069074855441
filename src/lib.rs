//! # qs-engine
//!
//! An embeddable JavaScript evaluation engine with a C ABI:
//! - pest grammar producing an ESTree-style AST
//! - tree-walking evaluator with closures, `try/catch` and `new`
//! - lazily resolved built-ins behind a super-global scope
//! - opaque-handle `extern "C"` API (`qs_*`) for non-Rust hosts
//!
//! ## Quick start
//!
//! ```
//! use qs_engine::runner::Runtime;
//! use qs_engine::runner::ds::value::JsValue;
//!
//! let mut rt = Runtime::new();
//! let result = rt
//!     .eval("function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); } fact(5)")
//!     .unwrap();
//! assert_eq!(result, JsValue::Number(120.0));
//! ```
//!
//! ## Parsing only
//!
//! ```
//! use qs_engine::parser::parse_to_ast;
//!
//! let ast = parse_to_ast("var x = 5 + 3;").unwrap();
//! assert_eq!(ast.body.len(), 1);
//! ```
//!
//! ## Host functions and configuration
//!
//! ```
//! use qs_engine::runner::{Runtime, RuntimeConfig};
//! use qs_engine::runner::ds::value::JsValue;
//!
//! let config = RuntimeConfig::parse("max_call_depth = 64").unwrap();
//! let mut rt = Runtime::with_config(config);
//! rt.register_function("host_add", |_ctx, _this, args| {
//!     let sum: f64 = args.iter().map(|a| match a {
//!         JsValue::Number(n) => *n,
//!         _ => 0.0,
//!     }).sum();
//!     Ok(JsValue::Number(sum))
//! }).unwrap();
//! assert_eq!(rt.eval("host_add(1, 2, 3)").unwrap(), JsValue::Number(6.0));
//! ```
//!
//! ## Super-global scope
//!
//! Built-ins such as `Math` or `console` are not preloaded into the global
//! environment. They live in a registry and are materialized the first time a
//! script names them, then cached. Scripts can shadow them but never replace
//! them. Hosts extend the scope with their own
//! [`PluginResolver`](runner::plugin::resolver::PluginResolver)s.
//!
//! ## Layout
//!
//! - [`parser`]: grammar, AST and early errors
//! - [`runner`]: runtime, evaluator, values and built-ins
//! - [`c_api`]: the C boundary; the matching header is `include/qs_engine.h`

#[macro_use]
extern crate lazy_static;

pub mod c_api;
pub mod parser;
pub mod runner;

/// Crate version, as reported by `qs_version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
