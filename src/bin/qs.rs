//! Command-line front end for the qs engine.
//!
//! Usage:
//!   qs [--config <file>] <file.js>     # Execute a JavaScript file
//!   qs [--config <file>] -e "code"     # Evaluate JavaScript code
//!   qs [--config <file>]               # Start REPL (interactive mode)
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` to see it.

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::process;

use qs_engine::runner::ds::operations::type_conversion::to_display_string;
use qs_engine::runner::ds::value::JsValue;
use qs_engine::runner::{Runtime, RuntimeConfig};

enum Mode {
    File(String),
    Eval(String),
    Repl,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (config, mode) = match parse_args(&args) {
        Some(parsed) => parsed,
        None => {
            print_usage();
            process::exit(1);
        }
    };

    let config = match config {
        Some(path) => match RuntimeConfig::load(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        },
        None => RuntimeConfig::default(),
    };
    let mut runtime = Runtime::with_config(config);

    match mode {
        Mode::File(path) => run_file(&mut runtime, &path),
        Mode::Eval(code) => eval_code(&mut runtime, &code),
        Mode::Repl => run_repl(&mut runtime),
    }
}

fn parse_args(args: &[String]) -> Option<(Option<String>, Mode)> {
    let mut config = None;
    let mut mode = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            "-c" | "--config" => config = Some(iter.next()?.clone()),
            "-e" | "--eval" if mode.is_none() => mode = Some(Mode::Eval(iter.next()?.clone())),
            file if mode.is_none() && !file.starts_with('-') => {
                mode = Some(Mode::File(file.to_string()))
            }
            _ => return None,
        }
    }
    Some((config, mode.unwrap_or(Mode::Repl)))
}

fn print_usage() {
    eprintln!("qs - JavaScript Engine");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  qs [--config <file>] <file.js>   Execute a JavaScript file");
    eprintln!("  qs [--config <file>] -e \"code\"   Evaluate JavaScript code");
    eprintln!("  qs [--config <file>]             Start REPL (interactive mode)");
}

fn run_file(runtime: &mut Runtime, filename: &str) {
    let source = match fs::read_to_string(filename) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", filename, e);
            process::exit(1);
        }
    };
    if let Err(e) = runtime.eval(&source) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn eval_code(runtime: &mut Runtime, code: &str) {
    match runtime.eval(code) {
        Ok(JsValue::Undefined) => {}
        Ok(value) => println!("{}", to_display_string(&value)),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn run_repl(runtime: &mut Runtime) {
    println!("qs v{} - JavaScript Engine", qs_engine::VERSION);
    println!("Type JavaScript code and press Enter. Type .builtins to list built-ins, .exit to quit.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }

        let input = match lines.next() {
            None => break,
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        };
        let input = input.trim();

        if input == ".exit" || input == ".quit" {
            break;
        }
        if input.is_empty() {
            continue;
        }
        if input == ".builtins" {
            print_builtins(runtime);
            continue;
        }

        match runtime.eval(input) {
            Ok(JsValue::Undefined) => {}
            Ok(value) => println!("{}", to_display_string(&value)),
            Err(e) => eprintln!("{}", e),
        }
    }

    println!("Goodbye!");
}

fn print_builtins(runtime: &mut Runtime) {
    match runtime.context_mut().registry() {
        Some(registry) => println!("{}", registry.names().join(" ")),
        None => println!("(built-ins disabled)"),
    }
}
