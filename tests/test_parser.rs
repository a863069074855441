//! Parser integration tests over whole scripts.

extern crate qs_engine;

use pretty_assertions::assert_eq;

use qs_engine::parser::api::{parse_to_ast, parse_to_token_tree};
use qs_engine::parser::ast::{ExpressionType, StatementType, VariableDeclarationKind};

const CLOSURE: &str = r#"
function makeAdder(x) {
    // captured by the returned arrow
    return (y) => x + y;
}
var add2 = makeAdder(2);
add2(3);
"#;

const CONTROL_FLOW: &str = r#"
let total = 0;
for (let i = 0; i < 10; i++) {
    if (i % 2 === 0) { continue; }
    total += i;
}
do { total--; } while (total > 20);
try {
    throw new Error('x');
} catch (e) {
    total = -total;
} finally {
    /* block comment */
}
"#;

#[test]
fn test_closure_script_shape() {
    let program = parse_to_ast(CLOSURE).unwrap();
    assert_eq!(program.body.len(), 3);
    assert_eq!(program.var_names, vec!["add2".to_string()]);
    match &program.body[0] {
        StatementType::FunctionDeclaration(f) => {
            assert_eq!(f.id.as_ref().map(|i| i.name.as_str()), Some("makeAdder"));
            assert_eq!(f.params.len(), 1);
            assert!(!f.is_arrow);
        }
        other => panic!("expected a function declaration, got {:?}", other),
    }
    match &program.body[2] {
        StatementType::ExpressionStatement {
            expression: ExpressionType::CallExpression { arguments, .. },
            ..
        } => assert_eq!(arguments.len(), 1),
        other => panic!("expected a call, got {:?}", other),
    }
}

#[test]
fn test_control_flow_script_shape() {
    let program = parse_to_ast(CONTROL_FLOW).unwrap();
    assert!(program.var_names.is_empty());
    let kinds: Vec<&str> = program
        .body
        .iter()
        .map(|s| match s {
            StatementType::VariableDeclaration(v) if v.kind == VariableDeclarationKind::Let => "let",
            StatementType::ForStatement { .. } => "for",
            StatementType::DoWhileStatement { .. } => "do",
            StatementType::TryStatement { .. } => "try",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["let", "for", "do", "try"]);
}

#[test]
fn test_automatic_semicolons() {
    let program = parse_to_ast("var a = 1\nvar b = 2\na + b").unwrap();
    assert_eq!(program.body.len(), 3);
    assert_eq!(program.var_names, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_numeric_literal_forms() {
    for src in &["0x1F", "0o17", "0b101", ".5", "5.", "1e3", "10n"] {
        assert!(parse_to_ast(src).is_ok(), "`{}` should parse", src);
    }
}

#[test]
fn test_token_tree_lists_rules_with_spans() {
    let tree = parse_to_token_tree("1 + 2;").unwrap();
    let first = tree.lines().next().unwrap();
    assert!(first.starts_with("script => (0,6)"), "got {}", first);
    assert!(tree.contains("numeric_literal"));
}

#[test]
fn test_rejected_scripts() {
    for src in &[
        "var 1x = 2;",
        "if (true",
        "'unterminated",
        "let let = 1;",
        "function () {}",
        "a => { return }}",
        "class A {}",
    ] {
        assert!(parse_to_ast(src).is_err(), "`{}` should be rejected", src);
    }
}
