//! Standard library built-in objects.
//!
//! Built-ins are described as [`BuiltInObject`](crate::runner::plugin::types::BuiltInObject)
//! entries in a registry and only become script objects when first referenced.

pub mod array;
pub mod console;
pub mod core;
pub mod error;
pub mod global;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod string;

pub use self::core::register_core_builtins;
