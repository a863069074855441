//! Number built-in.
//!
//! Provides the Number constructor, its constants and predicates, and the
//! formatting methods of number values.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{
    number_to_radix_string, number_to_string, to_integer, to_number,
};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::arg;
use super::global::{parse_float, parse_int};

const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;

/// Register the Number built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let number = BuiltInObject::new("Number")
        .with_constructor(number_constructor)
        .add_property("MAX_VALUE", JsValue::Number(f64::MAX))
        .add_property("MIN_VALUE", JsValue::Number(5e-324))
        .add_property("POSITIVE_INFINITY", JsValue::Number(f64::INFINITY))
        .add_property("NEGATIVE_INFINITY", JsValue::Number(f64::NEG_INFINITY))
        .add_property("NaN", JsValue::Number(f64::NAN))
        .add_property("MAX_SAFE_INTEGER", JsValue::Number(MAX_SAFE_INTEGER))
        .add_property("MIN_SAFE_INTEGER", JsValue::Number(-MAX_SAFE_INTEGER))
        .add_property("EPSILON", JsValue::Number(f64::EPSILON))
        .add_method("isNaN", number_is_nan)
        .add_method("isFinite", number_is_finite)
        .add_method("isInteger", number_is_integer)
        .add_method("isSafeInteger", number_is_safe_integer)
        .add_method("parseFloat", parse_float)
        .add_method("parseInt", parse_int)
        .add_prototype_method("toString", number_to_string_method)
        .add_prototype_method("toFixed", number_to_fixed)
        .add_prototype_method("valueOf", number_value_of);

    registry.register_object(number);
}

/// `Number(v)`. A bigint converts to the nearest double.
fn number_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match args.first() {
        None => Ok(JsValue::Number(0.0)),
        Some(JsValue::Symbol(_)) => Err(JErrorType::TypeError(
            "Cannot convert a Symbol value to a number".to_string(),
        )),
        Some(v) => Ok(JsValue::Number(to_number(v))),
    }
}

fn as_number(v: &JsValue) -> Option<f64> {
    match v {
        JsValue::Number(n) => Some(*n),
        _ => None,
    }
}

/// Number.isNaN - Unlike the global, never converts its argument.
fn number_is_nan(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(
        as_number(&arg(&args, 0)).map_or(false, f64::is_nan),
    ))
}

/// Number.isFinite
fn number_is_finite(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(
        as_number(&arg(&args, 0)).map_or(false, f64::is_finite),
    ))
}

/// Number.isInteger
fn number_is_integer(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(
        as_number(&arg(&args, 0)).map_or(false, |n| n.is_finite() && n.trunc() == n),
    ))
}

/// Number.isSafeInteger - Integers no larger than 2^53 - 1 in magnitude.
fn number_is_safe_integer(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(as_number(&arg(&args, 0)).map_or(false, |n| {
        n.is_finite() && n.trunc() == n && n.abs() <= MAX_SAFE_INTEGER
    })))
}

fn this_number(this: &JsValue, method: &str) -> Result<f64, JErrorType> {
    as_number(this).ok_or_else(|| {
        JErrorType::TypeError(format!(
            "Number.prototype.{} requires that 'this' be a Number",
            method
        ))
    })
}

/// Number.prototype.toString - Takes an optional radix from 2 to 36.
fn number_to_string_method(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let n = this_number(&this, "toString")?;
    let radix = match arg(&args, 0) {
        JsValue::Undefined => 10.0,
        r => to_integer(&r),
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(JErrorType::RangeError(
            "toString() radix must be between 2 and 36".to_string(),
        ));
    }
    let s = if radix == 10.0 {
        number_to_string(n)
    } else {
        number_to_radix_string(n, radix as u32)
    };
    Ok(JsValue::String(s))
}

/// Number.prototype.toFixed
fn number_to_fixed(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let n = this_number(&this, "toFixed")?;
    let digits = to_integer(&arg(&args, 0));
    if !(0.0..=100.0).contains(&digits) {
        return Err(JErrorType::RangeError(
            "toFixed() digits argument must be between 0 and 100".to_string(),
        ));
    }
    if !n.is_finite() || n.abs() >= 1e21 {
        return Ok(JsValue::String(number_to_string(n)));
    }
    let s = format!("{:.*}", digits as usize, n);
    // -0.0 and values that round to zero keep no sign.
    let s = match s.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => s,
    };
    Ok(JsValue::String(s))
}

/// Number.prototype.valueOf
fn number_value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Number(this_number(&this, "valueOf")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_on(f: crate::runner::plugin::types::NativeFn, n: f64, args: Vec<JsValue>) -> JsValue {
        let mut ctx = EvalContext::new();
        f(&mut ctx, JsValue::Number(n), args).unwrap()
    }

    #[test]
    fn test_to_string_radix() {
        assert_eq!(
            call_on(number_to_string_method, 255.0, vec![JsValue::Number(16.0)]),
            JsValue::from("ff")
        );
        assert_eq!(call_on(number_to_string_method, 1e21, vec![]), JsValue::from("1e+21"));
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(
            call_on(number_to_fixed, 3.14159, vec![JsValue::Number(2.0)]),
            JsValue::from("3.14")
        );
        assert_eq!(call_on(number_to_fixed, -0.0001, vec![]), JsValue::from("0"));
    }

    #[test]
    fn test_predicates_do_not_coerce() {
        let mut ctx = EvalContext::new();
        assert_eq!(
            number_is_nan(&mut ctx, JsValue::Undefined, vec![JsValue::from("x")]).unwrap(),
            JsValue::Boolean(false)
        );
        assert_eq!(
            number_is_integer(&mut ctx, JsValue::Undefined, vec![JsValue::Number(5.0)]).unwrap(),
            JsValue::Boolean(true)
        );
    }

    #[test]
    fn test_constructor_rejects_symbol() {
        let mut ctx = EvalContext::new();
        let sym = JsValue::Symbol(crate::runner::ds::symbol::SymbolData::new(None));
        assert!(number_constructor(&mut ctx, JsValue::Undefined, vec![sym]).is_err());
    }
}
