use thiserror::Error;

use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;

/// Errors raised while running a script.
///
/// The four named kinds are produced by the engine itself. `Thrown` carries
/// whatever value a `throw` statement produced.
#[derive(Debug, Clone, Error)]
pub enum JErrorType {
    #[error("Uncaught ReferenceError: {0}")]
    ReferenceError(String),
    #[error("Uncaught TypeError: {0}")]
    TypeError(String),
    #[error("Uncaught RangeError: {0}")]
    RangeError(String),
    #[error("Uncaught SyntaxError: {0}")]
    SyntaxError(String),
    #[error("Uncaught {}", to_string(.0))]
    Thrown(JsValue),
}

impl JErrorType {
    /// Name of the error constructor this error maps to when caught by script.
    pub fn name(&self) -> &'static str {
        match self {
            JErrorType::ReferenceError(_) => "ReferenceError",
            JErrorType::TypeError(_) => "TypeError",
            JErrorType::RangeError(_) => "RangeError",
            JErrorType::SyntaxError(_) => "SyntaxError",
            JErrorType::Thrown(_) => "Error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m) => m.to_string(),
            JErrorType::Thrown(v) => to_string(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = JErrorType::ReferenceError("x is not defined".to_string());
        assert_eq!(e.to_string(), "Uncaught ReferenceError: x is not defined");
        assert_eq!(e.name(), "ReferenceError");
        assert_eq!(e.message(), "x is not defined");
    }

    #[test]
    fn test_thrown_value_display() {
        let e = JErrorType::Thrown(JsValue::Number(42.0));
        assert_eq!(e.to_string(), "Uncaught 42");
        let e = JErrorType::Thrown(JsValue::String("boom".to_string()));
        assert_eq!(e.to_string(), "Uncaught boom");
    }
}
