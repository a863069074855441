//! Global functions and values: `isNaN`, `parseInt`, `Symbol()`, `BigInt()`,
//! `undefined`, `NaN` and the like.

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{
    number_to_string, string_to_bigint, to_boolean, to_int32, to_number, to_string,
};
use crate::runner::ds::symbol::{SymbolData, SYMBOL_ITERATOR, SYMBOL_TO_STRING_TAG};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext, NativeFn};

use super::core::arg;

/// Register the global functions and values with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    registry.register_value("undefined", JsValue::Undefined);
    registry.register_value("NaN", JsValue::Number(f64::NAN));
    registry.register_value("Infinity", JsValue::Number(f64::INFINITY));

    let functions: [(&str, NativeFn); 6] = [
        ("isNaN", is_nan),
        ("isFinite", is_finite),
        ("parseInt", parse_int),
        ("parseFloat", parse_float),
        ("BigInt", bigint_constructor),
        ("Boolean", boolean_constructor),
    ];
    for (name, f) in functions.iter() {
        registry.register_object(BuiltInObject::new(*name).with_constructor(*f));
    }

    registry.register_object(
        BuiltInObject::new("Symbol")
            .with_constructor(symbol_constructor)
            .add_property("iterator", JsValue::Symbol(SYMBOL_ITERATOR.clone()))
            .add_property("toStringTag", JsValue::Symbol(SYMBOL_TO_STRING_TAG.clone())),
    );
}

fn is_nan(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_number(&arg(&args, 0)).is_nan()))
}

fn is_finite(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_number(&arg(&args, 0)).is_finite()))
}

/// `parseInt(s, radix)`: the longest valid digit prefix after optional sign
/// and `0x`. No digits gives NaN.
pub(crate) fn parse_int(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let input = to_string(&arg(&args, 0));
    let mut s = input.trim_start();
    let negative = s.starts_with('-');
    if negative || s.starts_with('+') {
        s = &s[1..];
    }
    let mut radix = match arg(&args, 1) {
        JsValue::Undefined => 0,
        r => to_int32(&r),
    };
    if radix != 0 && !(2..=36).contains(&radix) {
        return Ok(JsValue::Number(f64::NAN));
    }
    if (radix == 0 || radix == 16) && (s.starts_with("0x") || s.starts_with("0X")) {
        s = &s[2..];
        radix = 16;
    }
    if radix == 0 {
        radix = 10;
    }
    let mut value = 0.0f64;
    let mut any = false;
    for c in s.chars() {
        match c.to_digit(radix as u32) {
            Some(d) => {
                value = value * radix as f64 + d as f64;
                any = true;
            }
            None => break,
        }
    }
    if !any {
        return Ok(JsValue::Number(f64::NAN));
    }
    Ok(JsValue::Number(if negative { -value } else { value }))
}

/// Length of the longest prefix of `s` that reads as a decimal literal.
fn decimal_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    if s[i..].starts_with("Infinity") {
        return i + "Infinity".len();
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - digits_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        mantissa_digits += j - frac_start;
        if mantissa_digits > 0 {
            i = j;
        }
    }
    if mantissa_digits == 0 {
        return 0;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

pub(crate) fn parse_float(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let input = to_string(&arg(&args, 0));
    let s = input.trim_start();
    let len = decimal_prefix_len(s);
    if len == 0 {
        return Ok(JsValue::Number(f64::NAN));
    }
    let prefix = &s[..len];
    let n = match prefix.trim_start_matches(|c| c == '+' || c == '-') {
        "Infinity" if prefix.starts_with('-') => f64::NEG_INFINITY,
        "Infinity" => f64::INFINITY,
        _ => prefix.parse::<f64>().unwrap_or(f64::NAN),
    };
    Ok(JsValue::Number(n))
}

/// `Symbol(desc)` makes a fresh symbol; equal descriptions do not make equal symbols.
fn symbol_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let description = match arg(&args, 0) {
        JsValue::Undefined => None,
        d => Some(to_string(&d)),
    };
    Ok(JsValue::Symbol(SymbolData::new(description)))
}

fn bigint_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let value = arg(&args, 0);
    let result = match &value {
        JsValue::BigInt(b) => b.clone(),
        JsValue::Boolean(b) => BigInt::from(*b as u8),
        JsValue::Number(n) => {
            if !n.is_finite() || n.trunc() != *n {
                return Err(JErrorType::RangeError(format!(
                    "The number {} cannot be converted to a BigInt because it is not an integer",
                    number_to_string(*n)
                )));
            }
            number_to_bigint(*n)
        }
        JsValue::String(s) => string_to_bigint(s).ok_or_else(|| {
            JErrorType::SyntaxError(format!("Cannot convert {} to a BigInt", s))
        })?,
        other => {
            return Err(JErrorType::TypeError(format!(
                "Cannot convert {} to a BigInt",
                to_string(other)
            )))
        }
    };
    Ok(JsValue::BigInt(result))
}

/// Exact conversion of an integral double.
fn number_to_bigint(n: f64) -> BigInt {
    if let Some(i) = n.to_i64() {
        return BigInt::from(i);
    }
    let bits = n.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i64 - 1075;
    let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);
    let magnitude = BigInt::from(mantissa) << (exponent.max(0) as usize);
    if n < 0.0 {
        BigInt::zero() - magnitude
    } else {
        magnitude
    }
}

fn boolean_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_boolean(&arg(&args, 0))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: NativeFn, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
        let mut ctx = EvalContext::new();
        f(&mut ctx, JsValue::Undefined, args)
    }

    fn num(v: Result<JsValue, JErrorType>) -> f64 {
        match v {
            Ok(JsValue::Number(n)) => n,
            other => panic!("expected a number, got {:?}", other.map_err(|e| e.to_string())),
        }
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(num(call(parse_int, vec![JsValue::from("  42px")])), 42.0);
        assert_eq!(num(call(parse_int, vec![JsValue::from("-0x1F")])), -31.0);
        assert_eq!(
            num(call(parse_int, vec![JsValue::from("101"), JsValue::Number(2.0)])),
            5.0
        );
        assert!(num(call(parse_int, vec![JsValue::from("abc")])).is_nan());
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(num(call(parse_float, vec![JsValue::from("3.5e2xyz")])), 350.0);
        assert_eq!(num(call(parse_float, vec![JsValue::from(".5")])), 0.5);
        assert_eq!(
            num(call(parse_float, vec![JsValue::from("-Infinity")])),
            f64::NEG_INFINITY
        );
        assert!(num(call(parse_float, vec![JsValue::from("e5")])).is_nan());
    }

    #[test]
    fn test_is_nan_coerces() {
        assert_eq!(
            call(is_nan, vec![JsValue::from("abc")]).unwrap(),
            JsValue::Boolean(true)
        );
        assert_eq!(
            call(is_finite, vec![JsValue::from("12")]).unwrap(),
            JsValue::Boolean(true)
        );
    }

    #[test]
    fn test_symbols_are_unique() {
        let a = call(symbol_constructor, vec![JsValue::from("x")]).unwrap();
        let b = call(symbol_constructor, vec![JsValue::from("x")]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_bigint_conversion() {
        assert_eq!(
            call(bigint_constructor, vec![JsValue::Number(1e20)]).unwrap(),
            JsValue::BigInt("100000000000000000000".parse().unwrap())
        );
        assert!(matches!(
            call(bigint_constructor, vec![JsValue::Number(1.5)]),
            Err(JErrorType::RangeError(_))
        ));
        assert!(matches!(
            call(bigint_constructor, vec![JsValue::from("12x")]),
            Err(JErrorType::SyntaxError(_))
        ));
    }
}
