use super::api::{parse_to_ast, JsParser, Rule};
use super::ast::*;

use pest::consumes_to;
use pest::parses_to;
use pest::Parser;

fn parse_ok(script: &str) -> ProgramData {
    match parse_to_ast(script) {
        Ok(p) => p,
        Err(e) => panic!("failed to parse {:?}: {}", script, e),
    }
}

fn parse_err_message(script: &str) -> String {
    match parse_to_ast(script) {
        Ok(_) => panic!("expected {:?} to be rejected", script),
        Err(e) => e.variant.message().to_string(),
    }
}

fn single_expression(script: &str) -> ExpressionType {
    let mut program = parse_ok(script);
    assert_eq!(program.body.len(), 1);
    match program.body.remove(0) {
        StatementType::ExpressionStatement { expression, .. } => expression,
        other => panic!("expected an expression statement, got {:?}", other),
    }
}

#[test]
fn test_decimal_number_token() {
    parses_to! {
        parser: JsParser,
        input: "10.5e3",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 6)
        ]
    };
}

#[test]
fn test_bigint_token() {
    parses_to! {
        parser: JsParser,
        input: "123n",
        rule: Rule::literal,
        tokens: [
            literal(0, 4, [
                bigint_literal(0, 4)
            ])
        ]
    };
}

#[test]
fn test_string_token() {
    parses_to! {
        parser: JsParser,
        input: "'a\\'b'",
        rule: Rule::string_literal,
        tokens: [
            string_literal(0, 6, [
                single_string_chars(1, 5)
            ])
        ]
    };
}

#[test]
fn test_reserved_word_is_not_identifier() {
    assert!(JsParser::parse(Rule::identifier, "while").is_err());
    assert!(JsParser::parse(Rule::identifier, "whiley").is_ok());
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    match single_expression("1 + 2 * 3;") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Add,
            right,
            ..
        } => assert!(matches!(
            *right,
            ExpressionType::BinaryExpression {
                operator: BinaryOperator::Multiply,
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_subtraction_is_left_associative() {
    match single_expression("a - b - c") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Subtract,
            left,
            right,
            ..
        } => {
            assert!(matches!(*left, ExpressionType::BinaryExpression { .. }));
            assert!(matches!(*right, ExpressionType::Identifier(_)));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_exponent_is_right_associative() {
    match single_expression("2 ** 3 ** 2") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Exponent,
            left,
            right,
            ..
        } => {
            assert!(matches!(*left, ExpressionType::Literal(_)));
            assert!(matches!(
                *right,
                ExpressionType::BinaryExpression {
                    operator: BinaryOperator::Exponent,
                    ..
                }
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_assignment_is_right_associative() {
    match single_expression("a = b += 1") {
        ExpressionType::AssignmentExpression {
            operator: AssignmentOperator::Equals,
            right,
            ..
        } => assert!(matches!(
            *right,
            ExpressionType::AssignmentExpression {
                operator: AssignmentOperator::AddEquals,
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_nullish_and_logical_operators() {
    assert!(matches!(
        single_expression("a ?? b"),
        ExpressionType::LogicalExpression {
            operator: LogicalOperator::NullishCoalescing,
            ..
        }
    ));
    assert!(matches!(
        single_expression("a ? b : c ? d : e"),
        ExpressionType::ConditionalExpression { .. }
    ));
}

#[test]
fn test_member_call_chain() {
    match single_expression("obj.list[0].push(1, 2)") {
        ExpressionType::CallExpression {
            callee, arguments, ..
        } => {
            assert_eq!(arguments.len(), 2);
            match *callee {
                ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                    property,
                    ..
                }) => assert_eq!(property.name, "push"),
                other => panic!("unexpected callee {:?}", other),
            }
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_new_with_member_callee() {
    match single_expression("new ns.Point(1, 2).x") {
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            object,
            ..
        }) => assert!(matches!(
            *object,
            ExpressionType::NewExpression { ref arguments, .. } if arguments.len() == 2
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_arrow_functions() {
    match single_expression("(a, b) => a + b") {
        ExpressionType::ArrowFunctionExpression(f) => {
            assert!(f.is_arrow);
            assert_eq!(f.params.len(), 2);
            assert!(matches!(f.body, FunctionBodyType::Expression(_)));
        }
        other => panic!("unexpected {:?}", other),
    }
    match single_expression("x => { var y = x; return y; }") {
        ExpressionType::ArrowFunctionExpression(f) => {
            assert_eq!(f.var_names, vec!["y".to_string()]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_object_literal_forms() {
    match single_expression("({ a: 1, 'b c': 2, 3: 3, [k]: 4, d, m() { return 1; } })") {
        ExpressionType::ObjectExpression { properties, .. } => {
            assert_eq!(properties.len(), 6);
            assert!(matches!(&properties[1].key, PropertyKeyType::Static(k) if k == "b c"));
            assert!(matches!(&properties[2].key, PropertyKeyType::Static(k) if k == "3"));
            assert!(matches!(&properties[3].key, PropertyKeyType::Computed(_)));
            assert!(matches!(&properties[4].value, ExpressionType::Identifier(_)));
            assert!(matches!(&properties[5].value, ExpressionType::FunctionExpression(_)));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_var_names_are_hoisted_out_of_blocks() {
    let program = parse_ok("var a = 1; if (a) { var b; } for (var i = 0; i < 1; i++) {} let c;");
    assert_eq!(
        program.var_names,
        vec!["a".to_string(), "b".to_string(), "i".to_string()]
    );
}

#[test]
fn test_statements() {
    let program = parse_ok(
        "function f(x) { return x }
         while (true) { break; }
         do { continue } while (false)
         try { throw 1 } catch (e) {} finally {}
         ;",
    );
    assert_eq!(program.body.len(), 5);
    assert!(matches!(program.body[0], StatementType::FunctionDeclaration(_)));
    assert!(matches!(program.body[1], StatementType::WhileStatement { .. }));
    assert!(matches!(program.body[2], StatementType::DoWhileStatement { .. }));
    assert!(matches!(
        program.body[3],
        StatementType::TryStatement {
            handler: Some(_),
            finalizer: Some(_),
            ..
        }
    ));
    assert!(matches!(program.body[4], StatementType::EmptyStatement { .. }));
}

#[test]
fn test_comments_are_skipped() {
    let program = parse_ok("// line\n1 /* block */ + 2;");
    assert_eq!(program.body.len(), 1);
}

#[test]
fn test_invalid_assignment_target() {
    assert_eq!(parse_err_message("1 = 2"), "Invalid left-hand side in assignment");
    assert_eq!(
        parse_err_message("f()++"),
        "Invalid left-hand side expression in postfix operation"
    );
    assert_eq!(
        parse_err_message("++1"),
        "Invalid left-hand side expression in prefix operation"
    );
}

#[test]
fn test_control_flow_outside_context() {
    assert_eq!(parse_err_message("return 1"), "Illegal return statement");
    assert_eq!(parse_err_message("break;"), "Illegal break statement");
    assert_eq!(
        parse_err_message("function f() { continue; }"),
        "Illegal continue statement: no surrounding iteration statement"
    );
    assert_eq!(
        parse_err_message("while (1) { function g() { break; } }"),
        "Illegal break statement"
    );
}

#[test]
fn test_declaration_errors() {
    assert_eq!(
        parse_err_message("const x;"),
        "Missing initializer in const declaration"
    );
    assert_eq!(
        parse_err_message("let a = 1; let a = 2;"),
        "Identifier 'a' has already been declared"
    );
    assert_eq!(
        parse_err_message("((a, a) => a)"),
        "Duplicate parameter name not allowed in this context"
    );
    parse_ok("function f(a, a) { return a; }");
}

#[test]
fn test_error_position() {
    match parse_to_ast("var x = 1;\nx = ;") {
        Err(e) => match e.line_col {
            pest::error::LineColLocation::Pos((line, _)) => assert_eq!(line, 2),
            pest::error::LineColLocation::Span((line, _), _) => assert_eq!(line, 2),
        },
        Ok(_) => panic!("expected a syntax error"),
    }
}

#[test]
fn test_unary_base_of_exponent_is_rejected() {
    let message = "Unary operator used immediately before exponentiation expression";
    assert_eq!(parse_err_message("-2 ** 2"), message);
    assert_eq!(parse_err_message("typeof x ** 2"), message);
    parse_ok("(-2) ** 2");
    parse_ok("2 ** -2");
    parse_ok("x++ ** 2");
}

#[test]
fn test_deep_nesting_is_a_syntax_error() {
    let depth = 10_000;
    let script = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(parse_err_message(&script), "Maximum nesting depth exceeded");
    let script = format!("{}1", "!".repeat(depth));
    assert_eq!(parse_err_message(&script), "Maximum nesting depth exceeded");
    let script = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
    assert_eq!(parse_err_message(&script), "Maximum nesting depth exceeded");
}

#[test]
fn test_moderate_nesting_parses() {
    let script = format!("{}1{}", "(".repeat(100), ")".repeat(100));
    assert!(matches!(single_expression(&script), ExpressionType::Literal(_)));
    parse_ok("var s = '(((((((((('; // ((((((((((\n/* [[[[[[[[ */ s");
}

#[test]
fn test_long_operator_chain_parses() {
    let script = vec!["1"; 1_000].join(" + ");
    assert!(matches!(
        single_expression(&script),
        ExpressionType::BinaryExpression { .. }
    ));
}

#[test]
fn test_nesting_scan_skips_strings_and_comments() {
    use super::util::{find_excessive_nesting, MAX_NESTING_DEPTH};
    let deep = "(".repeat(MAX_NESTING_DEPTH + 1);
    assert_eq!(find_excessive_nesting(&deep), Some(MAX_NESTING_DEPTH));
    assert_eq!(find_excessive_nesting(&format!("'{}'", deep)), None);
    assert_eq!(find_excessive_nesting(&format!("\"\\\"{}\"", deep)), None);
    assert_eq!(find_excessive_nesting(&format!("// {}\n1", deep)), None);
    assert_eq!(find_excessive_nesting(&format!("/* {} */ 1", deep)), None);
    assert_eq!(find_excessive_nesting(&"(1)".repeat(MAX_NESTING_DEPTH * 2)), None);
}
