//! Benchmark runner for the tree-walking evaluator.
//!
//! Runs each workload twice, written recursively and iteratively, so the cost
//! of calls shows up next to plain loops.

extern crate qs_engine;

use std::time::{Duration, Instant};

use qs_engine::runner::ds::value::JsValue;
use qs_engine::runner::{Runtime, RuntimeConfig};

/// Run a benchmark in a fresh runtime per iteration and return the total time.
fn run_benchmark(name: &str, code: &str, iterations: u32) -> Duration {
    let start = Instant::now();
    for _ in 0..iterations {
        let mut rt = Runtime::with_config(RuntimeConfig::default());
        if let Err(e) = rt.eval(code) {
            panic!("benchmark {} failed: {}", name, e);
        }
    }
    start.elapsed()
}

fn run_and_get_var(code: &str, var_name: &str) -> JsValue {
    let mut rt = Runtime::new();
    match rt.eval(code) {
        Ok(_) => rt.get_global(var_name),
        Err(_) => JsValue::Undefined,
    }
}

// ============================================================================
// Benchmark definitions
// ============================================================================

const FIB_RECURSIVE: &str = r#"
function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
var result = fib(18);
"#;

const FIB_ITERATIVE: &str = r#"
var a = 0;
var b = 1;
for (var i = 0; i < 18; i++) {
    var temp = a;
    a = b;
    b = temp + b;
}
var result = a;
"#;

const FACTORIAL_RECURSIVE: &str = r#"
function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); }
var result = 0;
for (var k = 0; k < 50; k++) { result = fact(12); }
"#;

const FACTORIAL_ITERATIVE: &str = r#"
var result = 0;
for (var k = 0; k < 50; k++) {
    var f = 1;
    for (var i = 2; i <= 12; i++) { f = f * i; }
    result = f;
}
"#;

const SUM_RECURSIVE: &str = r#"
function sum(n) { if (n === 0) { return 0; } return n + sum(n - 1); }
var result = sum(800);
"#;

const SUM_ITERATIVE: &str = r#"
var result = 0;
for (var i = 1; i <= 800; i++) { result += i; }
"#;

const GCD_RECURSIVE: &str = r#"
function gcd(a, b) { return b === 0 ? a : gcd(b, a % b); }
var result = 0;
for (var k = 0; k < 200; k++) { result = result + gcd(1071, 462); }
"#;

const GCD_ITERATIVE: &str = r#"
var result = 0;
for (var k = 0; k < 200; k++) {
    var a = 1071;
    var b = 462;
    while (b !== 0) {
        var temp = b;
        b = a % b;
        a = temp;
    }
    result = result + a;
}
"#;

const CLOSURE_COUNTER: &str = r#"
function makeCounter() {
    let count = 0;
    return () => { count++; return count; };
}
var counter = makeCounter();
var result = 0;
for (let i = 0; i < 2000; i++) { result = counter(); }
"#;

fn main() {
    println!("=======================================================");
    println!("  qs Engine - Tree-Walking Evaluator Benchmarks");
    println!("  Recursive vs Iterative Workloads");
    println!("=======================================================\n");

    let benchmarks: Vec<(&str, &str, &str, u32)> = vec![
        ("Fibonacci (n=18)", FIB_RECURSIVE, FIB_ITERATIVE, 20),
        ("Factorial (12 x 50)", FACTORIAL_RECURSIVE, FACTORIAL_ITERATIVE, 50),
        ("Sum (1..800)", SUM_RECURSIVE, SUM_ITERATIVE, 50),
        ("GCD (200 pairs)", GCD_RECURSIVE, GCD_ITERATIVE, 50),
    ];

    println!("{:<30} {:>14} {:>14} {:>10}", "Benchmark", "Recursive", "Iterative", "Ratio");
    println!("{}", "-".repeat(70));

    let mut total_recursive = Duration::ZERO;
    let mut total_iterative = Duration::ZERO;

    for (name, recursive, iterative, iterations) in &benchmarks {
        let rec_dur = run_benchmark(name, recursive, *iterations);
        let iter_dur = run_benchmark(name, iterative, *iterations);
        total_recursive += rec_dur;
        total_iterative += iter_dur;

        let ratio = rec_dur.as_secs_f64() / iter_dur.as_secs_f64();
        println!(
            "{:<30} {:>12.2?} {:>12.2?} {:>9.2}x",
            name, rec_dur, iter_dur, ratio
        );
    }

    println!("{}", "-".repeat(70));
    let total_ratio = total_recursive.as_secs_f64() / total_iterative.as_secs_f64();
    println!(
        "{:<30} {:>12.2?} {:>12.2?} {:>9.2}x",
        "TOTAL", total_recursive, total_iterative, total_ratio
    );

    let closure_dur = run_benchmark("closure counter", CLOSURE_COUNTER, 50);
    println!("\n{:<30} {:>12.2?}", "Closure counter (2K calls)", closure_dur);

    println!("\n=======================================================");
    println!("  Correctness Verification");
    println!("=======================================================\n");

    let verifications: Vec<(&str, &str, f64)> = vec![
        ("Fibonacci (rec)", FIB_RECURSIVE, 2584.0),
        ("Fibonacci (iter)", FIB_ITERATIVE, 2584.0),
        ("Factorial (rec)", FACTORIAL_RECURSIVE, 479001600.0),
        ("Sum (rec)", SUM_RECURSIVE, 320400.0),
        ("GCD (rec)", GCD_RECURSIVE, 4200.0),
        ("Closure counter", CLOSURE_COUNTER, 2000.0),
    ];

    println!("{:<20} {:>12} {:>12}", "Test", "Expected", "Actual");
    println!("{}", "-".repeat(46));

    for (name, code, expected) in verifications {
        let actual = match run_and_get_var(code, "result") {
            JsValue::Number(n) => n,
            _ => f64::NAN,
        };
        let status = if actual == expected { "✓" } else { "✗" };
        println!("{:<20} {:>12} {:>4} {:>7}", name, expected, status, actual);
    }
}
