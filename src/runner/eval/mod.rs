//! Evaluation module for executing the AST.
//!
//! A tree-walking evaluator: statements produce completion records,
//! expressions produce values, and calls recurse through [`function::call_function`].

pub mod expression;
pub mod function;
pub mod statement;
pub mod types;

pub use statement::evaluate_program;
pub use types::{Completion, CompletionType, EvalResult, Reference, ValueResult};

/// Remaining stack below which evaluation moves to a fresh segment.
pub(crate) const STACK_RED_ZONE: usize = 100 * 1024;
/// Size of each stack segment allocated once the red zone is reached.
pub(crate) const STACK_SEGMENT_SIZE: usize = 1024 * 1024;
