//! JSON built-in object.
//!
//! Provides `JSON.parse` and `JSON.stringify`. Replacer and reviver
//! arguments are not supported; the `space` argument of `stringify` is.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{get, own_keys, set};
use crate::runner::ds::operations::type_conversion::{number_to_string, to_integer, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::{STACK_RED_ZONE, STACK_SEGMENT_SIZE};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::array::new_array;
use super::core::arg;

type Chars<'a> = Peekable<CharIndices<'a>>;

/// Longest indent `space` may produce.
const MAX_GAP: usize = 10;

/// Register the JSON object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    registry.register_object(
        BuiltInObject::new("JSON")
            .add_method("parse", json_parse)
            .add_method("stringify", json_stringify),
    );
}

fn unexpected_end() -> JErrorType {
    JErrorType::SyntaxError("Unexpected end of JSON input".to_string())
}

fn unexpected_token(c: char, pos: usize) -> JErrorType {
    JErrorType::SyntaxError(format!("Unexpected token '{}' in JSON at position {}", c, pos))
}

/// Error for whatever comes next in the input.
fn unexpected_next(chars: &mut Chars) -> JErrorType {
    match chars.peek() {
        Some(&(pos, c)) => unexpected_token(c, pos),
        None => unexpected_end(),
    }
}

/// JSON.parse - Parse a JSON text into a script value.
fn json_parse(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let text = to_string(&arg(&args, 0));
    let mut chars = text.char_indices().peekable();
    let value = parse_value(ctx, &mut chars)?;
    skip_whitespace(&mut chars);
    match chars.next() {
        None => Ok(value),
        Some((pos, c)) => Err(unexpected_token(c, pos)),
    }
}

// JSON allows only these four.
fn skip_whitespace(chars: &mut Chars) {
    while let Some(&(_, c)) = chars.peek() {
        if !matches!(c, ' ' | '\t' | '\n' | '\r') {
            break;
        }
        chars.next();
    }
}

fn parse_value(ctx: &mut EvalContext, chars: &mut Chars) -> Result<JsValue, JErrorType> {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || {
        skip_whitespace(chars);
        match chars.peek() {
            Some(&(_, '"')) => Ok(JsValue::String(parse_string(chars)?)),
            Some(&(_, c)) if c == '-' || c.is_ascii_digit() => parse_number(chars),
            Some(&(_, 't')) => parse_literal(chars, "true", JsValue::Boolean(true)),
            Some(&(_, 'f')) => parse_literal(chars, "false", JsValue::Boolean(false)),
            Some(&(_, 'n')) => parse_literal(chars, "null", JsValue::Null),
            Some(&(_, '[')) => parse_array(ctx, chars),
            Some(&(_, '{')) => parse_object(ctx, chars),
            Some(&(pos, c)) => Err(unexpected_token(c, pos)),
            None => Err(unexpected_end()),
        }
    })
}

fn parse_literal(chars: &mut Chars, word: &str, value: JsValue) -> Result<JsValue, JErrorType> {
    for expected in word.chars() {
        match chars.next() {
            Some((_, c)) if c == expected => {}
            Some((pos, c)) => return Err(unexpected_token(c, pos)),
            None => return Err(unexpected_end()),
        }
    }
    Ok(value)
}

fn read_hex4(chars: &mut Chars) -> Result<u32, JErrorType> {
    let mut code = 0;
    for _ in 0..4 {
        match chars.next() {
            Some((_, c)) if c.is_ascii_hexdigit() => code = code * 16 + c.to_digit(16).unwrap_or(0),
            Some((pos, c)) => return Err(unexpected_token(c, pos)),
            None => return Err(unexpected_end()),
        }
    }
    Ok(code)
}

/// Reads the rest of a `\u` escape, joining a surrogate pair when the low
/// half follows. Lone surrogates become U+FFFD.
fn read_unicode_escape(chars: &mut Chars) -> Result<char, JErrorType> {
    let high = read_hex4(chars)?;
    if !(0xD800..=0xDBFF).contains(&high) {
        return Ok(char::from_u32(high).unwrap_or('\u{FFFD}'));
    }
    let mut lookahead = chars.clone();
    if let (Some((_, '\\')), Some((_, 'u'))) = (lookahead.next(), lookahead.next()) {
        if let Ok(low) = read_hex4(&mut lookahead) {
            if (0xDC00..=0xDFFF).contains(&low) {
                *chars = lookahead;
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return Ok(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
        }
    }
    Ok('\u{FFFD}')
}

fn parse_string(chars: &mut Chars) -> Result<String, JErrorType> {
    chars.next(); // opening quote
    let mut result = String::new();
    loop {
        match chars.next() {
            Some((_, '"')) => return Ok(result),
            Some((_, '\\')) => match chars.next() {
                Some((_, '"')) => result.push('"'),
                Some((_, '\\')) => result.push('\\'),
                Some((_, '/')) => result.push('/'),
                Some((_, 'b')) => result.push('\u{0008}'),
                Some((_, 'f')) => result.push('\u{000C}'),
                Some((_, 'n')) => result.push('\n'),
                Some((_, 'r')) => result.push('\r'),
                Some((_, 't')) => result.push('\t'),
                Some((_, 'u')) => result.push(read_unicode_escape(chars)?),
                Some((pos, c)) => return Err(unexpected_token(c, pos)),
                None => return Err(unexpected_end()),
            },
            Some((pos, c)) if c < '\u{0020}' => {
                return Err(JErrorType::SyntaxError(format!(
                    "Bad control character in string literal in JSON at position {}",
                    pos
                )))
            }
            Some((_, c)) => result.push(c),
            None => return Err(JErrorType::SyntaxError("Unterminated string in JSON".to_string())),
        }
    }
}

/// Appends a run of ASCII digits to `text`, returning how many were read.
fn take_digits(chars: &mut Chars, text: &mut String) -> usize {
    let mut count = 0;
    while let Some(&(_, c)) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        text.push(c);
        chars.next();
        count += 1;
    }
    count
}

fn parse_number(chars: &mut Chars) -> Result<JsValue, JErrorType> {
    let mut text = String::new();
    if let Some(&(_, '-')) = chars.peek() {
        text.push('-');
        chars.next();
    }
    // No leading zeros: "0" stands alone as the integer part.
    match chars.peek() {
        Some(&(_, '0')) => {
            text.push('0');
            chars.next();
        }
        Some(&(_, c)) if c.is_ascii_digit() => {
            take_digits(chars, &mut text);
        }
        _ => return Err(unexpected_next(chars)),
    }
    if let Some(&(_, '.')) = chars.peek() {
        text.push('.');
        chars.next();
        if take_digits(chars, &mut text) == 0 {
            return Err(unexpected_next(chars));
        }
    }
    if let Some(&(_, c)) = chars.peek() {
        if c == 'e' || c == 'E' {
            text.push('e');
            chars.next();
            if let Some(&(_, sign)) = chars.peek() {
                if sign == '+' || sign == '-' {
                    text.push(sign);
                    chars.next();
                }
            }
            if take_digits(chars, &mut text) == 0 {
                return Err(unexpected_next(chars));
            }
        }
    }
    text.parse::<f64>()
        .map(JsValue::Number)
        .map_err(|_| JErrorType::SyntaxError(format!("Invalid number in JSON: {}", text)))
}

fn parse_array(ctx: &mut EvalContext, chars: &mut Chars) -> Result<JsValue, JErrorType> {
    chars.next(); // '['
    let mut elements = Vec::new();
    skip_whitespace(chars);
    if let Some(&(_, ']')) = chars.peek() {
        chars.next();
        return new_array(ctx, elements);
    }
    loop {
        elements.push(parse_value(ctx, chars)?);
        skip_whitespace(chars);
        match chars.next() {
            Some((_, ',')) => {}
            Some((_, ']')) => return new_array(ctx, elements),
            Some((pos, c)) => return Err(unexpected_token(c, pos)),
            None => return Err(unexpected_end()),
        }
    }
}

fn parse_object(ctx: &mut EvalContext, chars: &mut Chars) -> Result<JsValue, JErrorType> {
    chars.next(); // '{'
    let object = ctx.alloc_ordinary()?;
    let target = match &object {
        JsValue::Object(o) => o.clone(),
        _ => return Err(JErrorType::TypeError("JSON.parse: object allocation failed".to_string())),
    };
    skip_whitespace(chars);
    if let Some(&(_, '}')) = chars.peek() {
        chars.next();
        return Ok(object);
    }
    loop {
        skip_whitespace(chars);
        let key = match chars.peek() {
            Some(&(_, '"')) => parse_string(chars)?,
            _ => return Err(unexpected_next(chars)),
        };
        skip_whitespace(chars);
        match chars.next() {
            Some((_, ':')) => {}
            Some((pos, c)) => return Err(unexpected_token(c, pos)),
            None => return Err(unexpected_end()),
        }
        let value = parse_value(ctx, chars)?;
        set(&target, PropertyKey::from(key), value);
        skip_whitespace(chars);
        match chars.next() {
            Some((_, ',')) => {}
            Some((_, '}')) => return Ok(object),
            Some((pos, c)) => return Err(unexpected_token(c, pos)),
            None => return Err(unexpected_end()),
        }
    }
}

/// JSON.stringify - Convert a script value to a JSON string.
///
/// Values with no JSON form (undefined, functions, symbols) yield undefined
/// at the top level, are skipped as object members and become `null` in
/// arrays.
fn json_stringify(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut serializer = Serializer {
        gap: gap_from_space(&arg(&args, 2)),
        stack: Vec::new(),
    };
    Ok(match serializer.serialize(&arg(&args, 0), "")? {
        Some(s) => JsValue::String(s),
        None => JsValue::Undefined,
    })
}

fn gap_from_space(space: &JsValue) -> String {
    match space {
        JsValue::Number(_) => {
            let width = to_integer(space).max(0.0).min(MAX_GAP as f64) as usize;
            " ".repeat(width)
        }
        JsValue::String(s) => s.chars().take(MAX_GAP).collect(),
        _ => String::new(),
    }
}

struct Serializer {
    gap: String,
    /// Objects currently being serialized, for cycle detection.
    stack: Vec<*const ()>,
}

impl Serializer {
    fn serialize(&mut self, value: &JsValue, indent: &str) -> Result<Option<String>, JErrorType> {
        Ok(Some(match value {
            JsValue::Null => "null".to_string(),
            JsValue::Boolean(b) => b.to_string(),
            JsValue::Number(n) if n.is_finite() => number_to_string(*n),
            JsValue::Number(_) => "null".to_string(),
            JsValue::String(s) => quote(s),
            JsValue::BigInt(_) => {
                return Err(JErrorType::TypeError(
                    "Do not know how to serialize a BigInt".to_string(),
                ))
            }
            JsValue::Undefined | JsValue::Symbol(_) => return Ok(None),
            JsValue::Object(o) => {
                if matches!(&*o.borrow(), ObjectType::Function(_)) {
                    return Ok(None);
                }
                let ptr = std::rc::Rc::as_ptr(o) as *const ();
                if self.stack.contains(&ptr) {
                    return Err(JErrorType::TypeError(
                        "Converting circular structure to JSON".to_string(),
                    ));
                }
                self.stack.push(ptr);
                let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || {
                    if value.is_array() {
                        self.serialize_array(o, indent)
                    } else {
                        self.serialize_object(o, indent)
                    }
                });
                self.stack.pop();
                result?
            }
        }))
    }

    fn serialize_array(&mut self, o: &JsObjectType, indent: &str) -> Result<String, JErrorType> {
        let elements = match &*o.borrow() {
            ObjectType::Array(a) => a.elements().to_vec(),
            _ => vec![],
        };
        let inner = format!("{}{}", indent, self.gap);
        let mut parts = Vec::with_capacity(elements.len());
        for e in &elements {
            parts.push(self.serialize(e, &inner)?.unwrap_or_else(|| "null".to_string()));
        }
        Ok(self.wrap('[', ']', parts, indent, &inner))
    }

    fn serialize_object(&mut self, o: &JsObjectType, indent: &str) -> Result<String, JErrorType> {
        let inner = format!("{}{}", indent, self.gap);
        let separator = if self.gap.is_empty() { ":" } else { ": " };
        let mut parts = vec![];
        for key in own_keys(o) {
            let name = match &key {
                PropertyKey::Str(s) => s.clone(),
                PropertyKey::Sym(_) => continue,
            };
            let value = get(o, &key);
            if let Some(s) = self.serialize(&value, &inner)? {
                parts.push(format!("{}{}{}", quote(&name), separator, s));
            }
        }
        Ok(self.wrap('{', '}', parts, indent, &inner))
    }

    fn wrap(&self, open: char, close: char, parts: Vec<String>, indent: &str, inner: &str) -> String {
        if parts.is_empty() {
            format!("{}{}", open, close)
        } else if self.gap.is_empty() {
            format!("{}{}{}", open, parts.join(","), close)
        } else {
            let separator = format!(",\n{}", inner);
            format!("{}\n{}{}\n{}{}", open, inner, parts.join(&separator), indent, close)
        }
    }
}

/// Quotes a string with JSON escaping.
fn quote(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('"');
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\u{0008}' => result.push_str("\\b"),
            '\u{000C}' => result.push_str("\\f"),
            c if c < '\u{0020}' => result.push_str(&format!("\\u{:04x}", c as u32)),
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::operations::object::array_elements;

    fn parse(ctx: &mut EvalContext, text: &str) -> Result<JsValue, JErrorType> {
        json_parse(ctx, JsValue::Undefined, vec![JsValue::from(text)])
    }

    fn stringify(ctx: &mut EvalContext, args: Vec<JsValue>) -> JsValue {
        json_stringify(ctx, JsValue::Undefined, args).unwrap()
    }

    #[test]
    fn test_parse_primitives() {
        let mut ctx = EvalContext::new();
        assert_eq!(parse(&mut ctx, " 42 ").unwrap(), JsValue::Number(42.0));
        assert_eq!(parse(&mut ctx, "-1.5e2").unwrap(), JsValue::Number(-150.0));
        assert_eq!(parse(&mut ctx, "true").unwrap(), JsValue::Boolean(true));
        assert_eq!(parse(&mut ctx, "null").unwrap(), JsValue::Null);
        assert_eq!(
            parse(&mut ctx, r#""a\nb\u0041\ud83d\ude00""#).unwrap(),
            JsValue::from("a\nbA\u{1F600}")
        );
    }

    #[test]
    fn test_parse_array_and_object() {
        let mut ctx = EvalContext::new();
        let v = parse(&mut ctx, "[1, [2], {\"k\": \"v\"}]").unwrap();
        let elements = array_elements(&v).unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(array_elements(&elements[1]).unwrap(), vec![JsValue::Number(2.0)]);
        let o = elements[2].as_object().unwrap();
        assert_eq!(get(o, &PropertyKey::from("k")), JsValue::from("v"));
    }

    #[test]
    fn test_parse_errors() {
        let mut ctx = EvalContext::new();
        for (text, message) in &[
            ("", "Unexpected end of JSON input"),
            ("[1,", "Unexpected end of JSON input"),
            ("[1,]", "Unexpected token ']' in JSON at position 3"),
            ("01", "Unexpected token '1' in JSON at position 1"),
            ("{'a': 1}", "Unexpected token ''' in JSON at position 1"),
            ("tru", "Unexpected end of JSON input"),
            ("1 2", "Unexpected token '2' in JSON at position 2"),
        ] {
            match parse(&mut ctx, text) {
                Err(JErrorType::SyntaxError(m)) => assert_eq!(&m, message, "input {:?}", text),
                other => panic!("{:?} gave {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_stringify_values() {
        let mut ctx = EvalContext::new();
        let array = parse(&mut ctx, "[1, \"a\", null, true, {\"x\": [ ]}]").unwrap();
        assert_eq!(
            stringify(&mut ctx, vec![array]),
            JsValue::from("[1,\"a\",null,true,{\"x\":[]}]")
        );
        assert_eq!(stringify(&mut ctx, vec![JsValue::Undefined]), JsValue::Undefined);
        assert_eq!(stringify(&mut ctx, vec![JsValue::Number(f64::NAN)]), JsValue::from("null"));
        assert_eq!(
            stringify(&mut ctx, vec![JsValue::from("q\"\u{1}")]),
            JsValue::from("\"q\\\"\\u0001\"")
        );
    }

    #[test]
    fn test_stringify_with_indent() {
        let mut ctx = EvalContext::new();
        let v = parse(&mut ctx, "{\"a\": [1, 2], \"b\": {}}").unwrap();
        assert_eq!(
            stringify(&mut ctx, vec![v, JsValue::Undefined, JsValue::Number(2.0)]),
            JsValue::from("{\n  \"a\": [\n    1,\n    2\n  ],\n  \"b\": {}\n}")
        );
    }

    #[test]
    fn test_stringify_cycle_is_type_error() {
        let mut ctx = EvalContext::new();
        let v = ctx.alloc_ordinary().unwrap();
        set(v.as_object().unwrap(), PropertyKey::from("self"), v.clone());
        let result = json_stringify(&mut ctx, JsValue::Undefined, vec![v.clone()]);
        assert!(matches!(result, Err(JErrorType::TypeError(_))));
        set(v.as_object().unwrap(), PropertyKey::from("self"), JsValue::Null);
    }
}
