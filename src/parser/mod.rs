pub mod api;
pub mod ast;
#[cfg(test)]
mod numeric_string_unit_tests;
pub(crate) mod static_semantics;
#[cfg(test)]
mod unit_tests;
mod util;

pub use api::{parse_to_ast, JsParser, Rule};
