use num_bigint::BigInt;

use crate::runner::ds::operations::type_conversion::{string_to_bigint, string_to_number};

/// Numeric value of a numeric literal token. Leading zeros are read as decimal.
pub fn parse_numeric_literal(text: &str) -> f64 {
    string_to_number(text)
}

/// Value of a bigint literal token such as `123n` or `0xffn`.
pub fn parse_bigint_literal(text: &str) -> Option<BigInt> {
    string_to_bigint(text.strip_suffix('n').unwrap_or(text))
}

/// Deepest nesting the parser accepts. Every open bracket and every prefix
/// operator in a run such as `!!-x` counts as one level.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Byte offset where `source` first nests deeper than [`MAX_NESTING_DEPTH`].
/// String literals and comments are skipped.
pub fn find_excessive_nesting(source: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut prefix_run = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = match source[i + 2..].find("*/") {
                    Some(end) => i + 2 + end + 2,
                    None => bytes.len(),
                };
                continue;
            }
            b'"' | b'\'' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                prefix_run = 0;
            }
            b'(' | b'[' | b'{' => {
                depth += 1;
                prefix_run = 0;
            }
            b')' | b']' | b'}' => {
                depth = depth.saturating_sub(1);
                prefix_run = 0;
            }
            b'!' | b'~' | b'+' | b'-' => prefix_run += 1,
            b' ' | b'\t' | b'\r' | b'\n' => {}
            _ => prefix_run = 0,
        }
        if depth + prefix_run > MAX_NESTING_DEPTH {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn take_hex(chars: &mut std::iter::Peekable<std::str::Chars>, count: usize) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..count {
        let d = chars.peek()?.to_digit(16)?;
        chars.next();
        value = value * 16 + d;
    }
    Some(value)
}

fn read_unicode_escape(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<u32> {
    if chars.peek() == Some(&'{') {
        chars.next();
        let mut value = 0u32;
        let mut digits = 0;
        while let Some(c) = chars.next() {
            if c == '}' {
                return if digits > 0 && value <= 0x10FFFF {
                    Some(value)
                } else {
                    None
                };
            }
            value = value.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
            digits += 1;
        }
        None
    } else {
        take_hex(chars, 4)
    }
}

/// Resolves escape sequences in the body of a string literal (quotes already
/// stripped). Unknown escapes stand for the escaped character itself; lone
/// surrogates become U+FFFD.
pub fn unescape_string(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut pending_high: Option<u32> = None;
    while let Some(c) = chars.next() {
        if c != '\\' {
            if pending_high.take().is_some() {
                out.push('\u{FFFD}');
            }
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some(e) => e,
            None => return Err("Invalid or unexpected token".to_string()),
        };
        let code = match escaped {
            'n' => '\n' as u32,
            't' => '\t' as u32,
            'r' => '\r' as u32,
            'b' => 0x08,
            'f' => 0x0C,
            'v' => 0x0B,
            '0' if !chars.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) => 0,
            'x' => take_hex(&mut chars, 2)
                .ok_or_else(|| "Invalid hexadecimal escape sequence".to_string())?,
            'u' => read_unicode_escape(&mut chars)
                .ok_or_else(|| "Invalid Unicode escape sequence".to_string())?,
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                continue;
            }
            '\n' | '\u{2028}' | '\u{2029}' => continue,
            other => other as u32,
        };
        match (pending_high.take(), code) {
            (Some(high), 0xDC00..=0xDFFF) => {
                let combined = 0x10000 + ((high - 0xD800) << 10) + (code - 0xDC00);
                out.push(std::char::from_u32(combined).unwrap_or('\u{FFFD}'));
            }
            (previous, 0xD800..=0xDBFF) => {
                if previous.is_some() {
                    out.push('\u{FFFD}');
                }
                pending_high = Some(code);
            }
            (previous, _) => {
                if previous.is_some() {
                    out.push('\u{FFFD}');
                }
                out.push(std::char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
        }
    }
    if pending_high.is_some() {
        out.push('\u{FFFD}');
    }
    Ok(out)
}
