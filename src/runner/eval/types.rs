//! Core types for the evaluation engine.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::value::JsValue;

/// Completion record type.
/// Represents how a statement finished; throws travel as `Err` instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionType {
    /// Normal completion - execution continues.
    Normal,
    /// Return completion - function returns.
    Return,
    /// Break completion - break from the innermost loop.
    Break,
    /// Continue completion - continue loop iteration.
    Continue,
}

/// Completion record. Every statement evaluation returns one; exceptions
/// travel separately as the `Err` side of [`EvalResult`].
#[derive(Debug, Clone)]
pub struct Completion {
    /// The type of completion.
    pub completion_type: CompletionType,
    /// The value, if the statement produced one.
    pub value: Option<JsValue>,
}

impl Completion {
    /// Create a normal completion with no value.
    pub fn normal() -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: None,
        }
    }

    /// Create a normal completion with a value.
    pub fn normal_with_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: Some(value),
        }
    }

    /// Create a return completion.
    pub fn return_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Return,
            value: Some(value),
        }
    }

    /// Create a break completion.
    pub fn break_completion() -> Self {
        Completion {
            completion_type: CompletionType::Break,
            value: None,
        }
    }

    /// Create a continue completion.
    pub fn continue_completion() -> Self {
        Completion {
            completion_type: CompletionType::Continue,
            value: None,
        }
    }

    /// Check if this is an abrupt completion (anything but normal).
    pub fn is_abrupt(&self) -> bool {
        self.completion_type != CompletionType::Normal
    }

    /// Fills in the value of a completion that has none.
    pub fn update_empty(mut self, value: Option<JsValue>) -> Self {
        if self.value.is_none() {
            self.value = value;
        }
        self
    }
}

/// Result of evaluating a statement.
pub type EvalResult = Result<Completion, JErrorType>;

/// Result of evaluating an expression.
pub type ValueResult = Result<JsValue, JErrorType>;

/// The target of an assignment or update once its sub-expressions ran.
pub enum Reference {
    /// A name resolved through the scope chain.
    Binding(String),
    /// A property of an already evaluated base value.
    Property { base: JsValue, key: PropertyKey },
}
