//! Math built-in object.
//!
//! Provides mathematical constants and functions.

use uuid::Uuid;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{to_number, to_uint32};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::arg;

/// Defines a `Math` method that applies an `f64 -> f64` function to its first argument.
macro_rules! unary_math_fn {
    ($name:ident, $op:expr) => {
        fn $name(
            _ctx: &mut EvalContext,
            _this: JsValue,
            args: Vec<JsValue>,
        ) -> Result<JsValue, JErrorType> {
            let f: fn(f64) -> f64 = $op;
            Ok(JsValue::Number(f(to_number(&arg(&args, 0)))))
        }
    };
}

/// Register the Math object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let math = BuiltInObject::new("Math")
        .add_property("E", JsValue::Number(std::f64::consts::E))
        .add_property("LN10", JsValue::Number(std::f64::consts::LN_10))
        .add_property("LN2", JsValue::Number(std::f64::consts::LN_2))
        .add_property("LOG10E", JsValue::Number(std::f64::consts::LOG10_E))
        .add_property("LOG2E", JsValue::Number(std::f64::consts::LOG2_E))
        .add_property("PI", JsValue::Number(std::f64::consts::PI))
        .add_property("SQRT1_2", JsValue::Number(std::f64::consts::FRAC_1_SQRT_2))
        .add_property("SQRT2", JsValue::Number(std::f64::consts::SQRT_2))
        .add_method("abs", math_abs)
        .add_method("floor", math_floor)
        .add_method("ceil", math_ceil)
        .add_method("round", math_round)
        .add_method("trunc", math_trunc)
        .add_method("sign", math_sign)
        .add_method("sqrt", math_sqrt)
        .add_method("cbrt", math_cbrt)
        .add_method("exp", math_exp)
        .add_method("log", math_log)
        .add_method("log2", math_log2)
        .add_method("log10", math_log10)
        .add_method("sin", math_sin)
        .add_method("cos", math_cos)
        .add_method("tan", math_tan)
        .add_method("atan", math_atan)
        .add_method("atan2", math_atan2)
        .add_method("pow", math_pow)
        .add_method("min", math_min)
        .add_method("max", math_max)
        .add_method("hypot", math_hypot)
        .add_method("clz32", math_clz32)
        .add_method("random", math_random);

    registry.register_object(math);
}

/// Rounds half-way cases towards positive infinity, unlike `f64::round`.
fn round_half_up(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

fn sign(x: f64) -> f64 {
    if x.is_nan() || x == 0.0 {
        x
    } else {
        x.signum()
    }
}

unary_math_fn!(math_abs, f64::abs);
unary_math_fn!(math_floor, f64::floor);
unary_math_fn!(math_ceil, f64::ceil);
unary_math_fn!(math_round, round_half_up);
unary_math_fn!(math_trunc, f64::trunc);
unary_math_fn!(math_sign, sign);
unary_math_fn!(math_sqrt, f64::sqrt);
unary_math_fn!(math_cbrt, f64::cbrt);
unary_math_fn!(math_exp, f64::exp);
unary_math_fn!(math_log, f64::ln);
unary_math_fn!(math_log2, f64::log2);
unary_math_fn!(math_log10, f64::log10);
unary_math_fn!(math_sin, f64::sin);
unary_math_fn!(math_cos, f64::cos);
unary_math_fn!(math_tan, f64::tan);
unary_math_fn!(math_atan, f64::atan);

fn math_atan2(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let y = to_number(&arg(&args, 0));
    let x = to_number(&arg(&args, 1));
    Ok(JsValue::Number(y.atan2(x)))
}

fn math_pow(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let base = to_number(&arg(&args, 0));
    let exponent = to_number(&arg(&args, 1));
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return Ok(JsValue::Number(f64::NAN));
    }
    Ok(JsValue::Number(base.powf(exponent)))
}

/// Folds the arguments with `pick`; any NaN argument makes the result NaN.
fn fold_numbers(args: &[JsValue], start: f64, pick: fn(f64, f64) -> f64) -> JsValue {
    let mut result = start;
    for a in args {
        let x = to_number(a);
        if x.is_nan() {
            return JsValue::Number(f64::NAN);
        }
        result = pick(result, x);
    }
    JsValue::Number(result)
}

fn math_min(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(fold_numbers(&args, f64::INFINITY, f64::min))
}

fn math_max(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(fold_numbers(&args, f64::NEG_INFINITY, f64::max))
}

fn math_hypot(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let values: Vec<f64> = args.iter().map(to_number).collect();
    if values.iter().any(|v| v.is_infinite()) {
        return Ok(JsValue::Number(f64::INFINITY));
    }
    Ok(JsValue::Number(values.iter().map(|v| v * v).sum::<f64>().sqrt()))
}

/// Math.clz32 - count leading zeros of the 32-bit unsigned form.
fn math_clz32(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Number(
        to_uint32(&arg(&args, 0)).leading_zeros() as f64,
    ))
}

/// Math.random, drawing 53 random bits from a v4 uuid.
fn math_random(
    _ctx: &mut EvalContext,
    _this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let bits = (Uuid::new_v4().as_u128() >> 75) as u64;
    Ok(JsValue::Number(bits as f64 / (1u64 << 53) as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: crate::runner::plugin::types::NativeFn, args: Vec<JsValue>) -> JsValue {
        let mut ctx = EvalContext::new();
        f(&mut ctx, JsValue::Undefined, args).unwrap()
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(
            call(math_max, vec![JsValue::Number(1.0), JsValue::Number(3.0)]),
            JsValue::Number(3.0)
        );
        assert_eq!(call(math_min, vec![]), JsValue::Number(f64::INFINITY));
        match call(math_max, vec![JsValue::Number(1.0), JsValue::from("x")]) {
            JsValue::Number(n) => assert!(n.is_nan()),
            v => panic!("unexpected {:?}", v),
        }
    }

    #[test]
    fn test_random_in_unit_interval() {
        for _ in 0..100 {
            match call(math_random, vec![]) {
                JsValue::Number(n) => assert!((0.0..1.0).contains(&n)),
                v => panic!("unexpected {:?}", v),
            }
        }
    }

    #[test]
    fn test_clz32() {
        assert_eq!(call(math_clz32, vec![JsValue::Number(1.0)]), JsValue::Number(31.0));
        assert_eq!(call(math_clz32, vec![]), JsValue::Number(32.0));
    }
}
