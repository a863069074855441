//! `console`: `log` and `info` print to stdout, `warn` and `error` to stderr.

use std::io::{self, Write};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::to_display_string;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

#[derive(Clone, Copy)]
enum Stream {
    Out,
    Err,
}

macro_rules! console_method {
    ($name:ident, $stream:expr) => {
        fn $name(
            _ctx: &mut EvalContext,
            _this: JsValue,
            args: Vec<JsValue>,
        ) -> Result<JsValue, JErrorType> {
            emit($stream, &args);
            Ok(JsValue::Undefined)
        }
    };
}

console_method!(console_log, Stream::Out);
console_method!(console_info, Stream::Out);
console_method!(console_warn, Stream::Err);
console_method!(console_error, Stream::Err);

pub fn register(registry: &mut BuiltInRegistry) {
    registry.register_object(
        BuiltInObject::new("console")
            .add_method("log", console_log)
            .add_method("info", console_info)
            .add_method("warn", console_warn)
            .add_method("error", console_error),
    );
}

/// One output line: arguments rendered for display and space separated.
pub fn format_line(args: &[JsValue]) -> String {
    let mut line = String::new();
    for (i, v) in args.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&to_display_string(v));
    }
    line
}

// A closed pipe is not a script error.
fn emit(stream: Stream, args: &[JsValue]) {
    let line = format_line(args);
    let _ = match stream {
        Stream::Out => writeln!(io::stdout().lock(), "{}", line),
        Stream::Err => writeln!(io::stderr().lock(), "{}", line),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        let args = vec![
            JsValue::from("a"),
            JsValue::Number(1.5),
            JsValue::Undefined,
            JsValue::Boolean(true),
        ];
        assert_eq!(format_line(&args), "a 1.5 undefined true");
        assert_eq!(format_line(&[]), "");
    }

    #[test]
    fn test_methods_return_undefined() {
        let mut ctx = EvalContext::new();
        let r = console_warn(&mut ctx, JsValue::Undefined, vec![JsValue::from("w")]);
        assert_eq!(r.unwrap(), JsValue::Undefined);
    }
}
