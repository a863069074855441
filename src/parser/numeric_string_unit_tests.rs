use super::util::{parse_bigint_literal, parse_numeric_literal, unescape_string};
use num_bigint::BigInt;

fn assert_number(input: &str, expected: f64) {
    let actual = parse_numeric_literal(input);
    assert!(
        actual == expected,
        "For the input: \"{}\", the expected out was: \"{}\", but got: \"{}\"",
        input,
        expected,
        actual
    );
}

#[test]
fn test_decimal_literals() {
    assert_number("1234", 1234.0);
    assert_number("12.5", 12.5);
    assert_number(".5", 0.5);
    assert_number("5.", 5.0);
    assert_number("1e3", 1000.0);
    assert_number("2.5E-3", 0.0025);
}

#[test]
fn test_prefixed_literals() {
    assert_number("0xff", 255.0);
    assert_number("0XFF", 255.0);
    assert_number("0o17", 15.0);
    assert_number("0b1010", 10.0);
}

#[test]
fn test_leading_zero_is_decimal() {
    assert_number("017", 17.0);
}

#[test]
fn test_bigint_literals() {
    assert_eq!(parse_bigint_literal("0n"), Some(BigInt::from(0)));
    assert_eq!(
        parse_bigint_literal("123456789012345678901234567890n").map(|b| b.to_string()),
        Some("123456789012345678901234567890".to_string())
    );
    assert_eq!(parse_bigint_literal("0x10n"), Some(BigInt::from(16)));
}

#[test]
fn test_simple_escapes() {
    assert_eq!(unescape_string("a\\nb\\t\\\\").unwrap(), "a\nb\t\\");
    assert_eq!(unescape_string("\\'\\\"").unwrap(), "'\"");
    assert_eq!(unescape_string("\\q").unwrap(), "q");
    assert_eq!(unescape_string("\\0").unwrap(), "\0");
}

#[test]
fn test_hex_and_unicode_escapes() {
    assert_eq!(unescape_string("\\x41").unwrap(), "A");
    assert_eq!(unescape_string("\\u00e9").unwrap(), "é");
    assert_eq!(unescape_string("\\u{1F600}").unwrap(), "\u{1F600}");
    assert_eq!(unescape_string("\\uD83D\\uDE00").unwrap(), "\u{1F600}");
    assert_eq!(unescape_string("\\uD83D").unwrap(), "\u{FFFD}");
    assert!(unescape_string("\\xZZ").is_err());
    assert!(unescape_string("\\u{110000}").is_err());
}

#[test]
fn test_line_continuation() {
    assert_eq!(unescape_string("a\\\nb").unwrap(), "ab");
}
