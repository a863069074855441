use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::FromPrimitive;

use crate::runner::ds::operations::type_conversion::{
    bigint_to_f64, string_to_bigint, to_number, to_primitive,
};
use crate::runner::ds::value::JsValue;

/// `===`. NaN is unequal to itself, +0 equals -0, objects compare by identity.
pub fn strict_equality_comparison(a: &JsValue, b: &JsValue) -> bool {
    a == b
}

/// SameValueZero, used by `includes`: like `===` except NaN equals NaN.
pub fn same_value_zero(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a == b,
    }
}

fn bigint_equals_number(b: &BigInt, n: f64) -> bool {
    if !n.is_finite() || n.fract() != 0.0 {
        return false;
    }
    BigInt::from_f64(n).map(|m| m == *b).unwrap_or(false)
}

/// `==`.
pub fn abstract_equality_comparison(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Undefined, _) | (JsValue::Null, _) => b.is_nullish(),
        (_, JsValue::Undefined) | (_, JsValue::Null) => false,
        (JsValue::Number(x), JsValue::String(s)) | (JsValue::String(s), JsValue::Number(x)) => {
            *x == to_number(&JsValue::String(s.clone()))
        }
        (JsValue::BigInt(x), JsValue::String(s)) | (JsValue::String(s), JsValue::BigInt(x)) => {
            string_to_bigint(s).map(|y| y == *x).unwrap_or(false)
        }
        (JsValue::BigInt(x), JsValue::Number(n)) | (JsValue::Number(n), JsValue::BigInt(x)) => {
            bigint_equals_number(x, *n)
        }
        (JsValue::Boolean(_), _) if !matches!(b, JsValue::Boolean(_)) => {
            abstract_equality_comparison(&JsValue::Number(to_number(a)), b)
        }
        (_, JsValue::Boolean(_)) if !matches!(a, JsValue::Boolean(_)) => {
            abstract_equality_comparison(a, &JsValue::Number(to_number(b)))
        }
        (JsValue::Object(_), JsValue::Object(_)) => a == b,
        (JsValue::Object(_), _) => abstract_equality_comparison(&to_primitive(a), b),
        (_, JsValue::Object(_)) => abstract_equality_comparison(a, &to_primitive(b)),
        _ => a == b,
    }
}

/// Abstract relational comparison. None means the operands are unordered
/// (a NaN was involved), which makes every relational operator false.
pub fn compare_values(a: &JsValue, b: &JsValue) -> Option<Ordering> {
    let pa = to_primitive(a);
    let pb = to_primitive(b);
    match (&pa, &pb) {
        (JsValue::String(x), JsValue::String(y)) => Some(x.cmp(y)),
        (JsValue::BigInt(x), JsValue::BigInt(y)) => Some(x.cmp(y)),
        (JsValue::BigInt(x), JsValue::String(s)) => string_to_bigint(s).map(|y| x.cmp(&y)),
        (JsValue::String(s), JsValue::BigInt(y)) => string_to_bigint(s).map(|x| x.cmp(y)),
        (JsValue::BigInt(x), _) => bigint_to_f64(x).partial_cmp(&to_number(&pb)),
        (_, JsValue::BigInt(y)) => to_number(&pa).partial_cmp(&bigint_to_f64(y)),
        _ => to_number(&pa).partial_cmp(&to_number(&pb)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_equality() {
        assert!(abstract_equality_comparison(&JsValue::Null, &JsValue::Undefined));
        assert!(!abstract_equality_comparison(&JsValue::Null, &JsValue::Number(0.0)));
        assert!(abstract_equality_comparison(&JsValue::from("1"), &JsValue::Number(1.0)));
        assert!(abstract_equality_comparison(&JsValue::Boolean(true), &JsValue::from("1")));
        assert!(abstract_equality_comparison(
            &JsValue::BigInt(BigInt::from(2)),
            &JsValue::Number(2.0)
        ));
        assert!(!abstract_equality_comparison(
            &JsValue::Number(f64::NAN),
            &JsValue::Number(f64::NAN)
        ));
    }

    #[test]
    fn test_strict_equality() {
        assert!(strict_equality_comparison(&JsValue::Number(0.0), &JsValue::Number(-0.0)));
        assert!(!strict_equality_comparison(&JsValue::from("1"), &JsValue::Number(1.0)));
        assert!(same_value_zero(&JsValue::Number(f64::NAN), &JsValue::Number(f64::NAN)));
    }

    #[test]
    fn test_compare() {
        assert_eq!(
            compare_values(&JsValue::from("a"), &JsValue::from("b")),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_values(&JsValue::from("10"), &JsValue::Number(9.0)),
            Some(Ordering::Greater)
        );
        assert_eq!(compare_values(&JsValue::Number(f64::NAN), &JsValue::Number(1.0)), None);
        assert_eq!(
            compare_values(&JsValue::BigInt(BigInt::from(1)), &JsValue::Number(1.5)),
            Some(Ordering::Less)
        );
    }
}
