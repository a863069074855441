//! Core built-ins registration and helpers shared by the built-in functions.

use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;

use super::array;
use super::console;
use super::error;
use super::global;
use super::json;
use super::math;
use super::number;
use super::object;
use super::string;

/// Register all core built-in objects with the registry.
pub fn register_core_builtins(registry: &mut BuiltInRegistry) {
    global::register(registry);
    object::register(registry);
    array::register(registry);
    string::register(registry);
    number::register(registry);
    math::register(registry);
    error::register(registry);
    json::register(registry);
    console::register(registry);
}

/// Argument `index`, or undefined when the caller passed fewer.
pub(crate) fn arg(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or(JsValue::Undefined)
}

/// Resolves a relative index argument (negative counts from the end) into
/// `0..=len`. Undefined yields `default`.
pub(crate) fn relative_index(value: &JsValue, len: usize, default: usize) -> usize {
    use crate::runner::ds::operations::type_conversion::to_integer;
    if let JsValue::Undefined = value {
        return default;
    }
    let n = to_integer(value);
    let len_f = len as f64;
    if n < 0.0 {
        (len_f + n).max(0.0) as usize
    } else {
        n.min(len_f) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_index() {
        assert_eq!(relative_index(&JsValue::Number(-1.0), 5, 0), 4);
        assert_eq!(relative_index(&JsValue::Number(-10.0), 5, 0), 0);
        assert_eq!(relative_index(&JsValue::Number(10.0), 5, 0), 5);
        assert_eq!(relative_index(&JsValue::Undefined, 5, 3), 3);
        assert_eq!(relative_index(&JsValue::Number(f64::NAN), 5, 3), 0);
    }
}
