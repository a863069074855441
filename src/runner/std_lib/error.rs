//! Error constructors.
//!
//! `Error`, `TypeError`, `RangeError`, `ReferenceError` and `SyntaxError`
//! build error objects carrying a `name` and a `message`. Calling them with or
//! without `new` has the same effect.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{ObjectType, OrdinaryObject};
use crate::runner::ds::operations::type_conversion::{error_to_string, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext, NativeFn};

use super::core::arg;

/// Register all error types with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let constructors: [(&str, NativeFn); 5] = [
        ("Error", error_constructor),
        ("TypeError", type_error_constructor),
        ("RangeError", range_error_constructor),
        ("ReferenceError", reference_error_constructor),
        ("SyntaxError", syntax_error_constructor),
    ];
    for (name, constructor) in constructors.iter() {
        registry.register_object(
            BuiltInObject::new(*name)
                .with_constructor(*constructor)
                .add_prototype_method("toString", error_to_string_method),
        );
    }
}

fn get_message(args: &[JsValue]) -> String {
    match arg(args, 0) {
        JsValue::Undefined => String::new(),
        v => to_string(&v),
    }
}

/// A new error object with the given name and the message argument, if any.
fn make_error(ctx: &mut EvalContext, name: &str, args: &[JsValue]) -> Result<JsValue, JErrorType> {
    let error = OrdinaryObject::new_error(name, &get_message(args));
    Ok(JsValue::Object(ctx.alloc(ObjectType::Ordinary(error))?))
}

/// Error constructor.
fn error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    make_error(ctx, "Error", &args)
}

/// TypeError constructor.
fn type_error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    make_error(ctx, "TypeError", &args)
}

/// RangeError constructor.
fn range_error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    make_error(ctx, "RangeError", &args)
}

/// ReferenceError constructor.
fn reference_error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    make_error(ctx, "ReferenceError", &args)
}

/// SyntaxError constructor.
fn syntax_error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    make_error(ctx, "SyntaxError", &args)
}

/// `err.toString()` gives "Name: message", or just the name when the message is empty.
fn error_to_string_method(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match &this {
        JsValue::Object(o) => Ok(JsValue::String(error_to_string(o))),
        _ => Err(JErrorType::TypeError(
            "Error.prototype.toString called on non-object".to_string(),
        )),
    }
}
