//! End-to-end evaluation tests.
//!
//! Each test parses and runs source through a [`Runtime`] and checks the
//! completion value, globals, or the error that escaped.

extern crate qs_engine;

use pretty_assertions::assert_eq;

use qs_engine::runner::ds::error::JErrorType;
use qs_engine::runner::ds::operations::type_conversion::to_string;
use qs_engine::runner::ds::value::JsValue;
use qs_engine::runner::{EvalError, EvaluationState, Runtime, RuntimeConfig};

/// Helper to run code in a fresh runtime, returning the completion value.
fn run_js(code: &str) -> Result<JsValue, EvalError> {
    Runtime::new().eval(code)
}

fn run_ok(code: &str) -> JsValue {
    match run_js(code) {
        Ok(v) => v,
        Err(e) => panic!("`{}` failed: {}", code, e),
    }
}

fn num(code: &str) -> f64 {
    match run_ok(code) {
        JsValue::Number(n) => n,
        other => panic!("`{}` gave {:?}, expected a number", code, other),
    }
}

fn string(code: &str) -> String {
    to_string(&run_ok(code))
}

fn run_err(code: &str) -> EvalError {
    match run_js(code) {
        Ok(v) => panic!("`{}` should fail, got {:?}", code, v),
        Err(e) => e,
    }
}

// ============================================================================
// Completion values
// ============================================================================

#[test]
fn test_completion_value_is_last_value_statement() {
    assert_eq!(num("1; 2; 3"), 3.0);
    assert_eq!(num("1; var x = 2;"), 1.0);
    assert_eq!(run_ok("var x = 2;"), JsValue::Undefined);
    assert_eq!(run_ok(""), JsValue::Undefined);
    assert_eq!(num("var i = 0; while (i < 3) { i++; } i"), 3.0);
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_arithmetic_and_precedence() {
    assert_eq!(num("1 + 2 * 3"), 7.0);
    assert_eq!(num("(1 + 2) * 3"), 9.0);
    assert_eq!(num("2 ** 3 ** 2"), 512.0);
    assert_eq!(num("7 % 4"), 3.0);
    assert_eq!(num("10 / 4"), 2.5);
    assert!(num("0 / 0").is_nan());
    assert_eq!(num("1 / 0"), f64::INFINITY);
}

#[test]
fn test_string_concatenation() {
    assert_eq!(string("'a' + 1"), "a1");
    assert_eq!(string("1 + 2 + 'x'"), "3x");
    assert_eq!(string("'x' + 1 + 2"), "x12");
    assert_eq!(string("'' + null + undefined + true"), "nullundefinedtrue");
    assert_eq!(string("[1, 2] + ''"), "1,2");
    assert_eq!(string("({}) + ''"), "[object Object]");
}

#[test]
fn test_number_formatting() {
    assert_eq!(string("'' + 0.1"), "0.1");
    assert_eq!(string("'' + 1e21"), "1e+21");
    assert_eq!(string("'' + 1e-7"), "1e-7");
    assert_eq!(string("'' + 0.000001"), "0.000001");
    assert_eq!(string("'' + -0"), "0");
    assert_eq!(string("'' + 0.1 + 0.2"), "0.10.2");
    assert_eq!(string("'' + (0.1 + 0.2)"), "0.30000000000000004");
    assert_eq!(string("'' + 123456789012345680000"), "123456789012345680000");
}

#[test]
fn test_equality() {
    assert_eq!(run_ok("null == undefined"), JsValue::Boolean(true));
    assert_eq!(run_ok("null === undefined"), JsValue::Boolean(false));
    assert_eq!(run_ok("'1' == 1"), JsValue::Boolean(true));
    assert_eq!(run_ok("'1' === 1"), JsValue::Boolean(false));
    assert_eq!(run_ok("NaN === NaN"), JsValue::Boolean(false));
    assert_eq!(run_ok("0 === -0"), JsValue::Boolean(true));
    assert_eq!(run_ok("var a = {}; var b = a; a === b"), JsValue::Boolean(true));
    assert_eq!(run_ok("({}) === ({})"), JsValue::Boolean(false));
    assert_eq!(run_ok("true == 1"), JsValue::Boolean(true));
    assert_eq!(run_ok("1n == 1"), JsValue::Boolean(true));
}

#[test]
fn test_logical_operators_short_circuit() {
    assert_eq!(num("var n = 0; false && n++; n"), 0.0);
    assert_eq!(num("var n = 0; true || n++; n"), 0.0);
    assert_eq!(string("null ?? 'fallback'"), "fallback");
    assert_eq!(num("0 ?? 5"), 0.0);
    assert_eq!(num("0 || 5"), 5.0);
}

#[test]
fn test_bitwise_operators() {
    assert_eq!(num("5 & 3"), 1.0);
    assert_eq!(num("5 | 3"), 7.0);
    assert_eq!(num("5 ^ 3"), 6.0);
    assert_eq!(num("~5"), -6.0);
    assert_eq!(num("1 << 31"), -2147483648.0);
    assert_eq!(num("-1 >>> 28"), 15.0);
    assert_eq!(num("-16 >> 2"), -4.0);
}

#[test]
fn test_typeof() {
    assert_eq!(string("typeof 1"), "number");
    assert_eq!(string("typeof 'a'"), "string");
    assert_eq!(string("typeof undefined"), "undefined");
    assert_eq!(string("typeof null"), "object");
    assert_eq!(string("typeof {}"), "object");
    assert_eq!(string("typeof []"), "object");
    assert_eq!(string("typeof function () {}"), "function");
    assert_eq!(string("typeof 1n"), "bigint");
    assert_eq!(string("typeof Symbol()"), "symbol");
    assert_eq!(string("typeof notDeclaredAnywhere"), "undefined");
}

#[test]
fn test_bigint_arithmetic() {
    assert_eq!(string("2n ** 64n"), "18446744073709551616");
    assert_eq!(string("7n / 2n"), "3");
    assert_eq!(string("-7n % 2n"), "-1");
    assert!(matches!(
        run_err("1n + 1"),
        EvalError::Exception(JErrorType::TypeError(_))
    ));
    assert!(matches!(
        run_err("1n / 0n"),
        EvalError::Exception(JErrorType::RangeError(_))
    ));
}

#[test]
fn test_update_and_compound_assignment() {
    assert_eq!(num("var x = 1; x++"), 1.0);
    assert_eq!(num("var x = 1; ++x"), 2.0);
    assert_eq!(num("var x = 10; x -= 3; x *= 2; x"), 14.0);
    assert_eq!(num("var o = { n: 1 }; o.n += 4; o.n"), 5.0);
    assert_eq!(num("var a = [1]; a[0]++; a[0]"), 2.0);
}

// ============================================================================
// Scoping
// ============================================================================

#[test]
fn test_var_is_hoisted() {
    assert_eq!(run_ok("var r = typeof x; var x = 1; r"), JsValue::from("undefined"));
    assert_eq!(run_ok("x; var x = 1;"), JsValue::Undefined);
}

#[test]
fn test_let_and_const_are_block_scoped() {
    assert_eq!(num("let x = 1; { let x = 2; } x"), 1.0);
    assert_eq!(num("var x = 1; { var x = 2; } x"), 2.0);
    assert!(matches!(
        run_err("{ let y = 1; } y"),
        EvalError::Exception(JErrorType::ReferenceError(_))
    ));
}

#[test]
fn test_temporal_dead_zone() {
    match run_err("x; let x = 1;") {
        EvalError::Exception(JErrorType::ReferenceError(m)) => {
            assert_eq!(m, "Cannot access 'x' before initialization")
        }
        other => panic!("unexpected {}", other),
    }
}

#[test]
fn test_const_assignment_is_type_error() {
    match run_err("const c = 1; c = 2;") {
        EvalError::Exception(JErrorType::TypeError(m)) => {
            assert_eq!(m, "Assignment to constant variable.")
        }
        other => panic!("unexpected {}", other),
    }
}

#[test]
fn test_undeclared_read_and_write() {
    match run_err("missing + 1") {
        EvalError::Exception(JErrorType::ReferenceError(m)) => {
            assert_eq!(m, "missing is not defined")
        }
        other => panic!("unexpected {}", other),
    }
    assert!(matches!(
        run_err("undeclared = 5"),
        EvalError::Exception(JErrorType::ReferenceError(_))
    ));
}

#[test]
fn test_implicit_globals_when_configured() {
    let config = RuntimeConfig::parse("implicit_globals = true").unwrap();
    let mut rt = Runtime::with_config(config);
    rt.eval("function f() { created = 42; } f();").unwrap();
    assert_eq!(rt.get_global("created"), JsValue::Number(42.0));
}

#[test]
fn test_builtins_can_be_shadowed_not_assigned() {
    assert_eq!(num("var Math = 5; Math"), 5.0);
    assert_eq!(num("function f() { let console = 3; return console; } f()"), 3.0);
    assert!(matches!(
        run_err("Math = 1"),
        EvalError::Exception(JErrorType::TypeError(_))
    ));
}

#[test]
fn test_for_let_gives_each_iteration_its_own_binding() {
    let code = r#"
        var fns = [];
        for (let i = 0; i < 3; i++) { fns.push(() => i); }
        fns[0]() + fns[1]() * 10 + fns[2]() * 100
    "#;
    assert_eq!(num(code), 210.0);
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_recursion_and_hoisted_declarations() {
    assert_eq!(num("fact(5); function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); } fact(6)"), 720.0);
    let code = r#"
        function isEven(n) { return n === 0 ? true : isOdd(n - 1); }
        function isOdd(n) { return n === 0 ? false : isEven(n - 1); }
        isEven(10)
    "#;
    assert_eq!(run_ok(code), JsValue::Boolean(true));
}

#[test]
fn test_closures_capture_lexical_scope() {
    let code = r#"
        function makeCounter() {
            let count = 0;
            return function () { count = count + 1; return count; };
        }
        var a = makeCounter();
        var b = makeCounter();
        a(); a();
        b();
        a() * 10 + b()
    "#;
    assert_eq!(num(code), 32.0);
}

#[test]
fn test_lexical_not_dynamic_scoping() {
    let code = r#"
        var x = 'global';
        function read() { return x; }
        function caller() { var x = 'local'; return read(); }
        caller()
    "#;
    assert_eq!(string(code), "global");
}

#[test]
fn test_arguments_binding() {
    assert_eq!(num("function f(a, b) { return a + b; } f(1, 2, 3)"), 3.0);
    assert_eq!(run_ok("function f(a, b) { return b; } f(1)"), JsValue::Undefined);
    assert_eq!(run_ok("function f() {} f()"), JsValue::Undefined);
}

#[test]
fn test_arrow_functions() {
    assert_eq!(num("var sq = x => x * x; sq(7)"), 49.0);
    assert_eq!(num("var add = (a, b) => { return a + b; }; add(2, 3)"), 5.0);
    let code = r#"
        var obj = {
            value: 42,
            get: function () { var inner = () => this.value; return inner(); }
        };
        obj.get()
    "#;
    assert_eq!(num(code), 42.0);
}

#[test]
fn test_method_calls_receive_this() {
    let code = r#"
        var counter = { n: 0, inc() { this.n++; return this; } };
        counter.inc().inc().n
    "#;
    assert_eq!(num(code), 2.0);
}

#[test]
fn test_named_function_expression_sees_itself() {
    assert_eq!(num("var f = function g(n) { return n ? n + g(n - 1) : 0; }; f(4)"), 10.0);
}

#[test]
fn test_function_length_and_name() {
    assert_eq!(num("function f(a, b, c) {} f.length"), 3.0);
    assert_eq!(string("function named() {} named.name"), "named");
}

#[test]
fn test_calling_non_function() {
    match run_err("var o = {}; o.missing()") {
        EvalError::Exception(JErrorType::TypeError(m)) => {
            assert_eq!(m, "o.missing is not a function")
        }
        other => panic!("unexpected {}", other),
    }
}

#[test]
fn test_call_depth_limit() {
    match run_err("function f() { return f(); } f()") {
        EvalError::Exception(JErrorType::RangeError(m)) => {
            assert_eq!(m, "Maximum call stack size exceeded")
        }
        other => panic!("unexpected {}", other),
    }
    let config = RuntimeConfig::parse("max_call_depth = 10").unwrap();
    let mut rt = Runtime::with_config(config);
    assert!(rt.eval("function d(n) { return n === 0 ? 0 : d(n - 1); } d(20)").is_err());
    assert_eq!(rt.context_mut().call_depth(), 0);
    assert_eq!(rt.eval("d(5)").unwrap(), JsValue::Number(0.0));
}

#[test]
fn test_deep_recursion_within_limit() {
    let config = RuntimeConfig::parse("max_call_depth = 5000").unwrap();
    let mut rt = Runtime::with_config(config);
    let v = rt
        .eval("function sum(n) { return n === 0 ? 0 : n + sum(n - 1); } sum(4000)")
        .unwrap();
    assert_eq!(v, JsValue::Number(8002000.0));
}

#[test]
fn test_step_budget() {
    let config = RuntimeConfig::parse("max_steps = 1000").unwrap();
    let mut rt = Runtime::with_config(config);
    let err = rt.eval("while (true) {}").unwrap_err();
    assert!(matches!(err, EvalError::Exception(JErrorType::RangeError(_))));
    let err = rt.eval("try { while (true) {} } catch (e) { 'caught' }").unwrap_err();
    assert!(matches!(err, EvalError::Exception(JErrorType::RangeError(_))));
    assert_eq!(rt.eval("1 + 1").unwrap(), JsValue::Number(2.0));
}

// ============================================================================
// Objects, arrays, new
// ============================================================================

#[test]
fn test_object_literals_and_properties() {
    assert_eq!(num("var o = { a: 1, 'b': 2, ['c' + 1]: 3 }; o.a + o.b + o.c1"), 6.0);
    assert_eq!(num("var x = 4; var o = { x }; o.x"), 4.0);
    assert_eq!(run_ok("var o = {}; o.missing"), JsValue::Undefined);
    assert_eq!(run_ok("var o = { a: 1 }; delete o.a; 'a' in o"), JsValue::Boolean(false));
    assert_eq!(string("var o = { b: 1, a: 2 }; Object.keys(o).join()"), "b,a");
}

#[test]
fn test_property_access_on_nullish_is_type_error() {
    match run_err("var u; u.x") {
        EvalError::Exception(JErrorType::TypeError(m)) => {
            assert_eq!(m, "Cannot read properties of undefined (reading 'x')")
        }
        other => panic!("unexpected {}", other),
    }
}

#[test]
fn test_arrays() {
    assert_eq!(num("var a = [1, 2, 3]; a.length"), 3.0);
    assert_eq!(run_ok("[1, 2][5]"), JsValue::Undefined);
    assert_eq!(num("var a = []; a[3] = 1; a.length"), 4.0);
    assert_eq!(num("var a = [1, 2, 3]; a.length = 1; a.length"), 1.0);
    assert_eq!(string("String([1, [2, 3], null])"), "1,2,3,");
    assert_eq!(string("var a = [1]; a.push(a); String(a)"), "1,");
}

#[test]
fn test_array_growth_per_write_is_capped() {
    for code in &[
        "var a = []; a[16777215] = 1;",
        "var a = []; a.length = 16777216;",
        "new Array(16777216)",
        "Array(100000)",
    ] {
        match run_js(code) {
            Err(EvalError::Exception(JErrorType::RangeError(m))) => {
                assert_eq!(m, "Invalid array length")
            }
            other => panic!("`{}` gave {:?}", code, other.map_err(|e| e.to_string())),
        }
    }
    assert_eq!(num("var a = []; a[65535] = 1; a.length"), 65536.0);
    assert_eq!(
        num("var a = []; for (var i = 0; i < 3; i++) { a.length += 60000; } a.length"),
        180000.0
    );
}

#[test]
fn test_deeply_nested_array_to_string() {
    let code = "var a = []; for (var i = 0; i < 10000; i++) { a = [a, 1]; } \
                var s = String(a) + ''; while (a.length) { a = a[0]; } s.length";
    assert_eq!(num(code), 20000.0);
}

#[test]
fn test_new_with_script_constructor() {
    let code = r#"
        function Point(x, y) { this.x = x; this.y = y; }
        Point.prototype.sum = function () { return this.x + this.y; };
        var p = new Point(2, 3);
        p.sum() + (p instanceof Point ? 100 : 0)
    "#;
    assert_eq!(num(code), 105.0);
    assert_eq!(num("function F() { return { v: 9 }; } new F().v"), 9.0);
    assert!(matches!(
        run_err("var arrow = () => 1; new arrow()"),
        EvalError::Exception(JErrorType::TypeError(_))
    ));
    assert!(matches!(
        run_err("new Symbol()"),
        EvalError::Exception(JErrorType::TypeError(_))
    ));
}

// ============================================================================
// Exceptions
// ============================================================================

#[test]
fn test_throw_and_catch() {
    assert_eq!(num("try { throw 42; } catch (e) { e + 1 }"), 43.0);
    assert_eq!(string("try { null.x; } catch (e) { e.name }"), "TypeError");
    assert_eq!(string("try { undefinedThing; } catch (e) { e.message }"), "undefinedThing is not defined");
    assert_eq!(
        string("try { throw new RangeError('bad'); } catch (e) { String(e) }"),
        "RangeError: bad"
    );
    assert_eq!(
        run_ok("try { throw new TypeError('x'); } catch (e) { e instanceof TypeError && e instanceof Error }"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_finally_runs() {
    let code = r#"
        var log = [];
        function f() {
            try { log.push('try'); return 1; }
            finally { log.push('finally'); }
        }
        f();
        log.join()
    "#;
    assert_eq!(string(code), "try,finally");
    assert_eq!(num("function g() { try { return 1; } finally { return 2; } } g()"), 2.0);
}

#[test]
fn test_uncaught_throw() {
    let err = run_err("throw 'boom'");
    assert_eq!(err.to_string(), "Uncaught boom");
    let err = run_err("throw new Error('bad thing')");
    assert_eq!(err.to_string(), "Uncaught Error: bad thing");
}

#[test]
fn test_control_flow() {
    let code = r#"
        var out = 0;
        for (var i = 0; i < 10; i++) {
            if (i === 2) continue;
            if (i === 5) break;
            out += i;
        }
        out
    "#;
    assert_eq!(num(code), 8.0);
    assert_eq!(num("var n = 0; do { n++; } while (n < 5); n"), 5.0);
    assert_eq!(num("var n = 0; do { n++; } while (false); n"), 1.0);
}

// ============================================================================
// Syntax errors and runtime state
// ============================================================================

#[test]
fn test_syntax_errors() {
    for code in &[
        "var = ;",
        "return 1;",
        "break;",
        "const x;",
        "1 = 2;",
        "((a, a) => a)",
        "let x = 1; let x = 2;",
        "-2 ** 2",
    ] {
        assert!(
            matches!(run_js(code), Err(EvalError::Syntax(_))),
            "`{}` should be a syntax error",
            code
        );
    }
}

#[test]
fn test_deep_nesting_is_a_syntax_error() {
    let depth = 10_000;
    let code = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    match run_js(&code) {
        Err(EvalError::Syntax(m)) => assert!(m.contains("Maximum nesting depth exceeded"), "{}", m),
        other => panic!("unexpected {:?}", other.map_err(|e| e.to_string())),
    }
    let code = format!("{}1{}", "(".repeat(200), ")".repeat(200));
    assert_eq!(num(&code), 1.0);
    assert_eq!(num("(-2) ** 2"), 4.0);
}

#[test]
fn test_evaluation_state() {
    let mut rt = Runtime::new();
    assert_eq!(rt.state(), EvaluationState::Ready);
    let _ = rt.eval("syntax error here");
    assert_eq!(rt.state(), EvaluationState::Threw);
    rt.eval("1").unwrap();
    assert_eq!(rt.state(), EvaluationState::Completed);
}

#[test]
fn test_heap_limit() {
    let config = RuntimeConfig::parse("[heap]\nmax_objects = 50").unwrap();
    let mut rt = Runtime::with_config(config);
    match rt.eval("var keep = []; while (true) { keep.push({}); }") {
        Err(EvalError::Exception(JErrorType::RangeError(m))) => assert_eq!(m, "Out of memory"),
        other => panic!("unexpected {:?}", other.map_err(|e| e.to_string())),
    }
}

#[test]
fn test_runtime_teardown_releases_closures() {
    let mut rt = Runtime::new();
    rt.eval("function outer() { var big = [1, 2, 3]; return function () { return big; }; } var f = outer();")
        .unwrap();
    let f = rt.get_global("f");
    assert!(f.is_callable());
    drop(rt);
    // The host handle outlives the runtime and stays a valid function value.
    assert!(f.is_callable());
}
