use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::runner::ds::object::{JsObject, JsObjectType, ObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::get;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::{STACK_RED_ZONE, STACK_SEGMENT_SIZE};

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_SYMBOL: &str = "symbol";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_BIGINT: &str = "bigint";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

/// Result of the `typeof` operator.
pub fn type_of(v: &JsValue) -> &'static str {
    match v {
        JsValue::Undefined => TYPE_STR_UNDEFINED,
        JsValue::Null => TYPE_STR_OBJECT,
        JsValue::Boolean(_) => TYPE_STR_BOOLEAN,
        JsValue::Number(_) => TYPE_STR_NUMBER,
        JsValue::BigInt(_) => TYPE_STR_BIGINT,
        JsValue::String(_) => TYPE_STR_STRING,
        JsValue::Symbol(_) => TYPE_STR_SYMBOL,
        JsValue::Object(o) => {
            if o.borrow().is_callable() {
                TYPE_STR_FUNCTION
            } else {
                TYPE_STR_OBJECT
            }
        }
    }
}

pub fn to_boolean(v: &JsValue) -> bool {
    match v {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::Number(n) => !(*n == 0.0 || n.is_nan()),
        JsValue::BigInt(b) => !b.is_zero(),
        JsValue::String(s) => !s.is_empty(),
        JsValue::Symbol(_) | JsValue::Object(_) => true,
    }
}

/// Converts objects to a primitive. Objects have no user-visible
/// `valueOf`, so every object becomes its string form.
pub fn to_primitive(v: &JsValue) -> JsValue {
    match v {
        JsValue::Object(_) => JsValue::String(to_string(v)),
        _ => v.clone(),
    }
}

pub fn to_number(v: &JsValue) -> f64 {
    match v {
        JsValue::Undefined => f64::NAN,
        JsValue::Null => 0.0,
        JsValue::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        JsValue::Number(n) => *n,
        JsValue::BigInt(b) => bigint_to_f64(b),
        JsValue::String(s) => string_to_number(s),
        JsValue::Symbol(_) | JsValue::Object(_) => f64::NAN,
    }
}

pub fn bigint_to_f64(b: &BigInt) -> f64 {
    b.to_f64().unwrap_or(f64::NAN)
}

fn trim_js_whitespace(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

fn parse_radix_digits(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    let mut value = 0.0f64;
    for c in digits.chars() {
        value = value * radix as f64 + c.to_digit(radix)? as f64;
    }
    Some(value)
}

fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digit_count = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digit_count += i - frac_start;
    }
    if digit_count == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

/// ToNumber applied to a string.
pub fn string_to_number(s: &str) -> f64 {
    let s = trim_js_whitespace(s);
    if s.is_empty() {
        return 0.0;
    }
    let prefixed = if s.len() > 2 && s.as_bytes()[0] == b'0' {
        match s.as_bytes()[1] {
            b'x' | b'X' => Some(16),
            b'o' | b'O' => Some(8),
            b'b' | b'B' => Some(2),
            _ => None,
        }
    } else {
        None
    };
    if let Some(radix) = prefixed {
        return parse_radix_digits(&s[2..], radix).unwrap_or(f64::NAN);
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if !is_decimal_literal(s) {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parses a string the way `BigInt("...")` and loose equality do.
pub fn string_to_bigint(s: &str) -> Option<BigInt> {
    let s = trim_js_whitespace(s);
    if s.is_empty() {
        return Some(BigInt::zero());
    }
    if s.len() > 2 && s.as_bytes()[0] == b'0' {
        let radix = match s.as_bytes()[1] {
            b'x' | b'X' => Some(16),
            b'o' | b'O' => Some(8),
            b'b' | b'B' => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return BigInt::parse_bytes(s[2..].as_bytes(), radix);
        }
    }
    let digits = s.strip_prefix('+').unwrap_or(s);
    if digits.is_empty() || !digits.trim_start_matches('-').bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigInt::parse_bytes(digits.as_bytes(), 10)
}

/// Number::toString with the usual exponent rules: `1e+21`, `1e-7`, `0.000001`.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n < 0.0 {
        return format!("-{}", number_to_string(-n));
    }
    // `{:e}` yields the shortest round-tripping digits, e.g. "1.2345e3".
    let formatted = format!("{:e}", n);
    let (mantissa, exponent) = match formatted.split_once('e') {
        Some(parts) => parts,
        None => return formatted,
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let point = exponent + 1;

    if k <= point && point <= 21 {
        let mut s = digits;
        s.extend(std::iter::repeat('0').take((point - k) as usize));
        s
    } else if 0 < point && point <= 21 {
        let (int_part, frac_part) = digits.split_at(point as usize);
        format!("{}.{}", int_part, frac_part)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else {
        let e = point - 1;
        let sign = if e < 0 { '-' } else { '+' };
        if k == 1 {
            format!("{}e{}{}", digits, sign, e.abs())
        } else {
            format!("{}.{}e{}{}", &digits[..1], &digits[1..], sign, e.abs())
        }
    }
}

/// Number::toString(radix) for radix other than 10.
pub fn number_to_radix_string(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() {
        return number_to_string(n);
    }
    let negative = n < 0.0;
    let n = n.abs();
    let mut int_part = n.trunc();
    let mut frac_part = n - int_part;
    let mut int_digits = Vec::new();
    if int_part == 0.0 {
        int_digits.push('0');
    }
    while int_part >= 1.0 {
        let d = (int_part % radix as f64) as u32;
        int_digits.push(std::char::from_digit(d, radix).unwrap_or('0'));
        int_part = (int_part / radix as f64).trunc();
    }
    let mut s: String = int_digits.into_iter().rev().collect();
    if frac_part > 0.0 {
        s.push('.');
        let mut count = 0;
        while frac_part > 0.0 && count < 20 {
            frac_part *= radix as f64;
            let d = frac_part.trunc() as u32;
            s.push(std::char::from_digit(d, radix).unwrap_or('0'));
            frac_part -= d as f64;
            count += 1;
        }
    }
    if negative {
        format!("-{}", s)
    } else {
        s
    }
}

/// ToString. Never fails: symbols and objects get a fixed textual form.
pub fn to_string(v: &JsValue) -> String {
    let mut visiting = Vec::new();
    to_string_inner(v, &mut visiting)
}

fn to_string_inner(v: &JsValue, visiting: &mut Vec<*const ()>) -> String {
    match v {
        JsValue::Undefined => "undefined".to_string(),
        JsValue::Null => "null".to_string(),
        JsValue::Boolean(b) => b.to_string(),
        JsValue::Number(n) => number_to_string(*n),
        JsValue::BigInt(b) => b.to_string(),
        JsValue::String(s) => s.clone(),
        JsValue::Symbol(s) => s.to_string(),
        JsValue::Object(o) => object_to_string(o, visiting),
    }
}

fn object_to_string(o: &JsObjectType, visiting: &mut Vec<*const ()>) -> String {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || {
        let ptr = std::rc::Rc::as_ptr(o) as *const ();
        if visiting.contains(&ptr) {
            return String::new();
        }
        let elements = match &*o.borrow() {
            ObjectType::Array(a) => a.elements().to_vec(),
            ObjectType::Function(f) => return f.source_text(),
            ObjectType::Ordinary(ord) => {
                if ord.is_error() {
                    return error_to_string(o);
                }
                return "[object Object]".to_string();
            }
        };
        visiting.push(ptr);
        let joined = elements
            .iter()
            .map(|e| {
                if e.is_nullish() {
                    String::new()
                } else {
                    to_string_inner(e, visiting)
                }
            })
            .collect::<Vec<_>>()
            .join(",");
        visiting.pop();
        joined
    })
}

/// "Name: message", or just the name when the message is empty.
pub fn error_to_string(o: &JsObjectType) -> String {
    let name = match get(o, &PropertyKey::from("name")) {
        JsValue::Undefined => "Error".to_string(),
        v => to_string(&v),
    };
    let message = match get(o, &PropertyKey::from("message")) {
        JsValue::Undefined => String::new(),
        v => to_string(&v),
    };
    if message.is_empty() {
        name
    } else if name.is_empty() {
        message
    } else {
        format!("{}: {}", name, message)
    }
}

/// Human readable rendering used by `console.log`, the REPL and `Debug`.
/// Strings at the top level are printed bare; nested ones are quoted.
pub fn to_display_string(v: &JsValue) -> String {
    let mut visiting = Vec::new();
    inspect(v, &mut visiting, 0)
}

fn inspect(v: &JsValue, visiting: &mut Vec<*const ()>, depth: usize) -> String {
    match v {
        JsValue::String(s) if depth > 0 => format!("'{}'", s),
        JsValue::BigInt(b) => format!("{}n", b),
        JsValue::Object(o) => {
            let ptr = std::rc::Rc::as_ptr(o) as *const ();
            if visiting.contains(&ptr) {
                return "[Circular]".to_string();
            }
            let entries: Vec<(Option<String>, JsValue)> = match &*o.borrow() {
                ObjectType::Function(f) => {
                    let name = f.name();
                    return if name.is_empty() {
                        "[Function (anonymous)]".to_string()
                    } else {
                        format!("[Function: {}]", name)
                    };
                }
                ObjectType::Array(a) => a.elements().iter().map(|e| (None, e.clone())).collect(),
                ObjectType::Ordinary(ord) => {
                    if ord.is_error() {
                        return error_to_string(o);
                    }
                    ord.own_property_keys()
                        .into_iter()
                        .map(|k| {
                            let value = ord.get_own_property(&k).unwrap_or(JsValue::Undefined);
                            (Some(k.to_string()), value)
                        })
                        .collect()
                }
            };
            let is_array = v.is_array();
            if depth > 2 {
                return if is_array { "[Array]" } else { "[Object]" }.to_string();
            }
            visiting.push(ptr);
            let parts: Vec<String> = entries
                .iter()
                .map(|(k, e)| {
                    let rendered = inspect(e, visiting, depth + 1);
                    match k {
                        Some(k) => format!("{}: {}", k, rendered),
                        None => rendered,
                    }
                })
                .collect();
            visiting.pop();
            match (is_array, parts.is_empty()) {
                (true, true) => "[]".to_string(),
                (true, false) => format!("[ {} ]", parts.join(", ")),
                (false, true) => "{}".to_string(),
                (false, false) => format!("{{ {} }}", parts.join(", ")),
            }
        }
        _ => to_string(v),
    }
}

/// ToInt32: modulo 2^32, then reinterpreted as signed.
pub fn to_int32(v: &JsValue) -> i32 {
    to_uint32(v) as i32
}

pub fn to_uint32(v: &JsValue) -> u32 {
    let n = to_number(v);
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let int = n.trunc();
    let modulo = int.rem_euclid(4294967296.0);
    modulo as u32
}

/// ToIntegerOrInfinity, used for index arguments of built-ins.
pub fn to_integer(v: &JsValue) -> f64 {
    let n = to_number(v);
    if n.is_nan() {
        0.0
    } else {
        n.trunc()
    }
}

pub fn to_property_key(v: &JsValue) -> PropertyKey {
    match v {
        JsValue::Symbol(s) => PropertyKey::Sym(s.clone()),
        _ => PropertyKey::Str(to_string(v)),
    }
}
