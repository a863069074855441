//! String built-in.
//!
//! Strings index by character, matching how the evaluator reports `length`
//! and `s[i]`.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{to_integer, to_string, to_uint32};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::array::new_array;
use super::core::{arg, relative_index};

/// Longest string `repeat` will build, in bytes.
const MAX_STRING_LENGTH: usize = 1 << 28;

/// Register the String built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let string = BuiltInObject::new("String")
        .with_constructor(string_constructor)
        .add_method("fromCharCode", from_char_code)
        .add_prototype_method("charAt", char_at)
        .add_prototype_method("charCodeAt", char_code_at)
        .add_prototype_method("indexOf", index_of)
        .add_prototype_method("includes", includes)
        .add_prototype_method("startsWith", starts_with)
        .add_prototype_method("endsWith", ends_with)
        .add_prototype_method("slice", slice)
        .add_prototype_method("substring", substring)
        .add_prototype_method("toUpperCase", to_upper_case)
        .add_prototype_method("toLowerCase", to_lower_case)
        .add_prototype_method("trim", trim)
        .add_prototype_method("trimStart", trim_start)
        .add_prototype_method("trimEnd", trim_end)
        .add_prototype_method("split", split)
        .add_prototype_method("repeat", repeat)
        .add_prototype_method("concat", concat)
        .add_prototype_method("toString", value_of)
        .add_prototype_method("valueOf", value_of);

    registry.register_object(string);
}

fn this_string(this: &JsValue, method: &str) -> Result<String, JErrorType> {
    match this {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "String.prototype.{} called on null or undefined",
            method
        ))),
        v => Ok(to_string(v)),
    }
}

fn chars_of(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// Character position of the first match at or after `from`.
fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// `String(v)` converts; symbols render as `Symbol(desc)`.
fn string_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(match args.first() {
        None => JsValue::String(String::new()),
        Some(v) => JsValue::String(to_string(v)),
    })
}

/// String.fromCharCode
fn from_char_code(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let units: Vec<u16> = args
        .iter()
        .map(|a| to_uint32(a) as u16)
        .collect();
    Ok(JsValue::String(String::from_utf16_lossy(&units)))
}

/// String.prototype.charAt
fn char_at(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(&this, "charAt")?;
    let i = to_integer(&arg(&args, 0));
    let c = if i < 0.0 { None } else { s.chars().nth(i as usize) };
    Ok(JsValue::String(c.map(String::from).unwrap_or_default()))
}

/// String.prototype.charCodeAt
fn char_code_at(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(&this, "charCodeAt")?;
    let i = to_integer(&arg(&args, 0));
    let c = if i < 0.0 { None } else { s.chars().nth(i as usize) };
    Ok(JsValue::Number(c.map(|c| c as u32 as f64).unwrap_or(f64::NAN)))
}

/// String.prototype.indexOf
fn index_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = chars_of(&this_string(&this, "indexOf")?);
    let needle = chars_of(&to_string(&arg(&args, 0)));
    let from = to_integer(&arg(&args, 1)).max(0.0).min(s.len() as f64) as usize;
    Ok(JsValue::Number(
        find_from(&s, &needle, from).map(|i| i as f64).unwrap_or(-1.0),
    ))
}

/// String.prototype.includes
fn includes(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = chars_of(&this_string(&this, "includes")?);
    let needle = chars_of(&to_string(&arg(&args, 0)));
    let from = to_integer(&arg(&args, 1)).max(0.0).min(s.len() as f64) as usize;
    Ok(JsValue::Boolean(find_from(&s, &needle, from).is_some()))
}

fn starts_with(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = chars_of(&this_string(&this, "startsWith")?);
    let needle = chars_of(&to_string(&arg(&args, 0)));
    let from = to_integer(&arg(&args, 1)).max(0.0).min(s.len() as f64) as usize;
    Ok(JsValue::Boolean(s[from..].starts_with(&needle)))
}

fn ends_with(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = chars_of(&this_string(&this, "endsWith")?);
    let needle = chars_of(&to_string(&arg(&args, 0)));
    let end = relative_index(&arg(&args, 1), s.len(), s.len());
    Ok(JsValue::Boolean(s[..end].ends_with(&needle)))
}

/// String.prototype.slice
fn slice(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = chars_of(&this_string(&this, "slice")?);
    let start = relative_index(&arg(&args, 0), s.len(), 0);
    let end = relative_index(&arg(&args, 1), s.len(), s.len());
    let out: String = if start < end {
        s[start..end].iter().collect()
    } else {
        String::new()
    };
    Ok(JsValue::String(out))
}

/// Unlike `slice`, negative arguments clamp to zero and the bounds are swapped
/// when `start > end`.
fn substring(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = chars_of(&this_string(&this, "substring")?);
    let len = s.len() as f64;
    let clamp = |v: &JsValue, default: f64| match v {
        JsValue::Undefined => default,
        v => to_integer(v).max(0.0).min(len),
    };
    let a = clamp(&arg(&args, 0), 0.0) as usize;
    let b = clamp(&arg(&args, 1), len) as usize;
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    Ok(JsValue::String(s[start..end].iter().collect()))
}

fn to_upper_case(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(&this, "toUpperCase")?.to_uppercase()))
}

fn to_lower_case(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(&this, "toLowerCase")?.to_lowercase()))
}

/// String.prototype.trim
fn trim(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(&this, "trim")?.trim().to_string()))
}

fn trim_start(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(
        this_string(&this, "trimStart")?.trim_start().to_string(),
    ))
}

fn trim_end(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(&this, "trimEnd")?.trim_end().to_string()))
}

/// `split()` yields `[s]`, `split("")` yields characters.
fn split(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(&this, "split")?;
    let limit = match arg(&args, 1) {
        JsValue::Undefined => usize::MAX,
        v => to_uint32(&v) as usize,
    };
    let parts: Vec<JsValue> = match arg(&args, 0) {
        JsValue::Undefined => vec![JsValue::String(s)],
        sep => {
            let sep = to_string(&sep);
            if sep.is_empty() {
                s.chars().map(|c| JsValue::String(c.to_string())).collect()
            } else {
                s.split(sep.as_str()).map(JsValue::from).collect()
            }
        }
    };
    new_array(ctx, parts.into_iter().take(limit).collect())
}

fn repeat(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this_string(&this, "repeat")?;
    let count = to_integer(&arg(&args, 0));
    if count < 0.0 || count.is_infinite() {
        return Err(JErrorType::RangeError(format!("Invalid count value: {}", count)));
    }
    let count = count as usize;
    if s.len().saturating_mul(count) > MAX_STRING_LENGTH {
        return Err(JErrorType::RangeError("Invalid string length".to_string()));
    }
    Ok(JsValue::String(s.repeat(count)))
}

fn concat(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut s = this_string(&this, "concat")?;
    for a in &args {
        s.push_str(&to_string(a));
    }
    Ok(JsValue::String(s))
}

fn value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(&this, "valueOf")?))
}
