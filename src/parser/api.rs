use std::rc::Rc;

use pest::error::{Error, ErrorVariant};
use pest::iterators::{Pair, Pairs};
use pest::{Parser, Span};
use pest_derive::Parser;

use super::ast::*;
use super::static_semantics::{validate_program, var_declared_names};
use super::util::{
    find_excessive_nesting, parse_bigint_literal, parse_numeric_literal, unescape_string,
};
use crate::runner::ds::operations::type_conversion::number_to_string;

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

const TAB_WIDTH: usize = 2;

// Each grammar level costs several pest frames, so parsing runs on a
// dedicated stack segment whenever less than the red zone is left.
const PARSE_RED_ZONE: usize = 32 * 1024 * 1024;
const PARSE_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Debug rendering of the raw pest pairs, one rule per line.
pub fn parse_to_token_tree(script: &str) -> Result<String, Error<Rule>> {
    check_nesting(script)?;
    stacker::maybe_grow(PARSE_RED_ZONE, PARSE_STACK_SIZE, || {
        let mut tree = vec![];
        for pair in JsParser::parse(Rule::script, script)? {
            tree.push(pair_to_string(pair, 0).join("\n"));
        }
        Ok(tree.join("\n"))
    })
}

fn pair_to_string(pair: Pair<Rule>, level: usize) -> Vec<String> {
    let mut tree = vec![];
    let span = pair.as_span();
    tree.push(format!(
        "{}{:?} => ({},{}) #{:?}",
        " ".repeat(level * TAB_WIDTH),
        pair.as_rule(),
        span.start(),
        span.end(),
        span.as_str()
    ));
    for child_pair in pair.into_inner() {
        tree.append(pair_to_string(child_pair, level + 1).as_mut());
    }
    tree
}

/// Parses and validates a whole script.
pub fn parse_to_ast(script: &str) -> Result<ProgramData, Error<Rule>> {
    check_nesting(script)?;
    stacker::maybe_grow(PARSE_RED_ZONE, PARSE_STACK_SIZE, || build_program(script))
}

fn check_nesting(script: &str) -> Result<(), Error<Rule>> {
    match find_excessive_nesting(script) {
        None => Ok(()),
        Some(offset) => Err(Error::new_from_pos(
            ErrorVariant::CustomError {
                message: "Maximum nesting depth exceeded".to_string(),
            },
            pest::Position::new(script, offset).unwrap_or_else(|| pest::Position::from_start(script)),
        )),
    }
}

fn build_program(script: &str) -> Result<ProgramData, Error<Rule>> {
    let mut pairs = JsParser::parse(Rule::script, script)?;
    let script_pair = pairs.next().ok_or_else(|| empty_parse_error(script))?;
    let meta = get_meta(&script_pair);
    let body = build_ast_from_statement_list(script_pair.into_inner())?;
    let program = ProgramData {
        meta,
        var_names: var_declared_names(&body),
        body,
    };
    validate_program(&program, script)?;
    Ok(program)
}

fn empty_parse_error(script: &str) -> Error<Rule> {
    Error::new_from_pos(
        ErrorVariant::CustomError {
            message: "Empty parse result".to_string(),
        },
        pest::Position::from_start(script),
    )
}

fn get_meta(pair: &Pair<Rule>) -> Meta {
    let span = pair.as_span();
    Meta {
        start_index: span.start(),
        end_index: span.end(),
    }
}

fn get_unexpected_error(id: i32, span: Span) -> Error<Rule> {
    let message = format!("Unexpected state reached - {}", id);
    Error::new_from_span(ErrorVariant::CustomError { message }, span)
}

fn get_validation_error(message: String, span: Span) -> Error<Rule> {
    Error::new_from_span(ErrorVariant::CustomError { message }, span)
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::function_kw
            | Rule::return_kw
            | Rule::if_kw
            | Rule::else_kw
            | Rule::while_kw
            | Rule::do_kw
            | Rule::for_kw
            | Rule::break_kw
            | Rule::continue_kw
            | Rule::throw_kw
            | Rule::try_kw
            | Rule::catch_kw
            | Rule::finally_kw
            | Rule::new_kw
    )
}

/// Children of `pair` without keyword tokens, which carry no information.
fn significant_children(pair: Pair<Rule>) -> Vec<Pair<Rule>> {
    pair.into_inner()
        .filter(|p| !is_keyword(p.as_rule()))
        .collect()
}

fn take_child<'i>(children: &mut std::vec::IntoIter<Pair<'i, Rule>>, span: Span<'i>, id: i32) -> Result<Pair<'i, Rule>, Error<Rule>> {
    children.next().ok_or_else(|| get_unexpected_error(id, span))
}

fn first_child(pair: Pair<Rule>, id: i32) -> Result<Pair<Rule>, Error<Rule>> {
    let span = pair.as_span();
    pair.into_inner()
        .next()
        .ok_or_else(|| get_unexpected_error(id, span))
}

fn build_ast_from_statement_list(pairs: Pairs<Rule>) -> Result<Vec<StatementType>, Error<Rule>> {
    let mut statements = vec![];
    for pair in pairs {
        match pair.as_rule() {
            Rule::statement => statements.push(build_ast_from_statement(pair)?),
            Rule::EOI => { /* Do nothing */ }
            _ => return Err(get_unexpected_error(1, pair.as_span())),
        }
    }
    Ok(statements)
}

fn build_ast_from_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let inner_pair = first_child(pair, 2)?;
    let meta = get_meta(&inner_pair);
    let span = inner_pair.as_span();
    Ok(match inner_pair.as_rule() {
        Rule::block_statement => StatementType::BlockStatement {
            meta,
            body: build_ast_from_statement_list(inner_pair.into_inner())?,
        },
        Rule::variable_statement => StatementType::VariableDeclaration(
            build_ast_from_variable_declaration_list(first_child(inner_pair, 3)?)?,
        ),
        Rule::function_declaration => {
            StatementType::FunctionDeclaration(Rc::new(build_ast_from_function(inner_pair)?))
        }
        Rule::if_statement => {
            let mut children = significant_children(inner_pair).into_iter();
            let test = build_ast_from_expression(take_child(&mut children, span, 4)?)?;
            let consequent = Box::new(build_ast_from_statement(take_child(&mut children, span, 5)?)?);
            let alternate = match children.next() {
                Some(p) => Some(Box::new(build_ast_from_statement(p)?)),
                None => None,
            };
            StatementType::IfStatement {
                meta,
                test,
                consequent,
                alternate,
            }
        }
        Rule::while_statement => {
            let mut children = significant_children(inner_pair).into_iter();
            let test = build_ast_from_expression(take_child(&mut children, span, 6)?)?;
            let body = Box::new(build_ast_from_statement(take_child(&mut children, span, 7)?)?);
            StatementType::WhileStatement { meta, test, body }
        }
        Rule::do_while_statement => {
            let mut children = significant_children(inner_pair).into_iter();
            let body = Box::new(build_ast_from_statement(take_child(&mut children, span, 8)?)?);
            let test = build_ast_from_expression(take_child(&mut children, span, 9)?)?;
            StatementType::DoWhileStatement { meta, body, test }
        }
        Rule::for_statement => build_ast_from_for_statement(inner_pair)?,
        Rule::continue_statement => StatementType::ContinueStatement { meta },
        Rule::break_statement => StatementType::BreakStatement { meta },
        Rule::return_statement => {
            let argument = match significant_children(inner_pair).into_iter().next() {
                Some(p) => Some(build_ast_from_expression(p)?),
                None => None,
            };
            StatementType::ReturnStatement { meta, argument }
        }
        Rule::throw_statement => {
            let mut children = significant_children(inner_pair).into_iter();
            let argument = build_ast_from_expression(take_child(&mut children, span, 10)?)?;
            StatementType::ThrowStatement { meta, argument }
        }
        Rule::try_statement => build_ast_from_try_statement(inner_pair)?,
        Rule::empty_statement => StatementType::EmptyStatement { meta },
        Rule::expression_statement => StatementType::ExpressionStatement {
            meta,
            expression: build_ast_from_expression(first_child(inner_pair, 11)?)?,
        },
        _ => return Err(get_unexpected_error(12, span)),
    })
}

fn build_ast_from_variable_declaration_list(
    pair: Pair<Rule>,
) -> Result<VariableDeclarationData, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut kind = VariableDeclarationKind::Var;
    let mut declarations = vec![];
    for inner_pair in pair.into_inner() {
        match inner_pair.as_rule() {
            Rule::var_kind => {
                kind = match inner_pair.as_str() {
                    "let" => VariableDeclarationKind::Let,
                    "const" => VariableDeclarationKind::Const,
                    _ => VariableDeclarationKind::Var,
                }
            }
            Rule::variable_declaration => {
                let d_meta = get_meta(&inner_pair);
                let span = inner_pair.as_span();
                let mut children = inner_pair.into_inner();
                let id = get_identifier_data(children.next().ok_or_else(|| get_unexpected_error(13, span))?);
                let init = match children.next() {
                    Some(p) => Some(build_ast_from_assignment_expression(p)?),
                    None => None,
                };
                declarations.push(VariableDeclaratorData {
                    meta: d_meta,
                    id,
                    init,
                });
            }
            _ => return Err(get_unexpected_error(14, inner_pair.as_span())),
        }
    }
    Ok(VariableDeclarationData {
        meta,
        kind,
        declarations,
    })
}

fn build_ast_from_for_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut init = None;
    let mut test = None;
    let mut update = None;
    let mut body = None;
    for inner_pair in significant_children(pair) {
        match inner_pair.as_rule() {
            Rule::for_init => {
                let p = first_child(inner_pair, 15)?;
                init = Some(match p.as_rule() {
                    Rule::variable_declaration_list => {
                        ForInitType::VariableDeclaration(build_ast_from_variable_declaration_list(p)?)
                    }
                    _ => ForInitType::Expression(build_ast_from_expression(p)?),
                });
            }
            Rule::for_test => test = Some(build_ast_from_expression(first_child(inner_pair, 16)?)?),
            Rule::for_update => {
                update = Some(build_ast_from_expression(first_child(inner_pair, 17)?)?)
            }
            Rule::statement => body = Some(Box::new(build_ast_from_statement(inner_pair)?)),
            _ => return Err(get_unexpected_error(18, inner_pair.as_span())),
        }
    }
    Ok(StatementType::ForStatement {
        meta,
        init,
        test,
        update,
        body: body.ok_or_else(|| get_unexpected_error(19, span))?,
    })
}

fn build_ast_from_try_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut block = vec![];
    let mut handler = None;
    let mut finalizer = None;
    for inner_pair in significant_children(pair) {
        match inner_pair.as_rule() {
            Rule::block_statement => block = build_ast_from_statement_list(inner_pair.into_inner())?,
            Rule::catch_clause => {
                let c_meta = get_meta(&inner_pair);
                let mut param = None;
                let mut body = vec![];
                for p in significant_children(inner_pair) {
                    match p.as_rule() {
                        Rule::identifier => param = Some(get_identifier_data(p)),
                        Rule::block_statement => body = build_ast_from_statement_list(p.into_inner())?,
                        _ => return Err(get_unexpected_error(20, p.as_span())),
                    }
                }
                handler = Some(CatchClauseData {
                    meta: c_meta,
                    param,
                    body,
                });
            }
            Rule::finally_clause => {
                let b = first_finally_block(inner_pair)?;
                finalizer = Some(build_ast_from_statement_list(b.into_inner())?);
            }
            _ => return Err(get_unexpected_error(21, inner_pair.as_span())),
        }
    }
    Ok(StatementType::TryStatement {
        meta,
        block,
        handler,
        finalizer,
    })
}

fn first_finally_block(pair: Pair<Rule>) -> Result<Pair<Rule>, Error<Rule>> {
    let span = pair.as_span();
    significant_children(pair)
        .into_iter()
        .next()
        .ok_or_else(|| get_unexpected_error(22, span))
}

fn get_identifier_data(pair: Pair<Rule>) -> IdentifierData {
    IdentifierData {
        meta: get_meta(&pair),
        name: pair.as_str().to_string(),
    }
}

/// Builds a function declaration, function expression or method.
fn build_ast_from_function(pair: Pair<Rule>) -> Result<FunctionData, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut id = None;
    let mut params = vec![];
    let mut body = vec![];
    for inner_pair in significant_children(pair) {
        match inner_pair.as_rule() {
            Rule::identifier => id = Some(get_identifier_data(inner_pair)),
            Rule::formal_parameters => params = get_formal_parameters(inner_pair),
            Rule::function_body => body = build_ast_from_statement_list(inner_pair.into_inner())?,
            _ => return Err(get_unexpected_error(23, inner_pair.as_span())),
        }
    }
    Ok(FunctionData {
        meta,
        id,
        params,
        var_names: var_declared_names(&body),
        body: FunctionBodyType::Block(body),
        is_arrow: false,
    })
}

fn get_formal_parameters(pair: Pair<Rule>) -> Vec<IdentifierData> {
    pair.into_inner().map(get_identifier_data).collect()
}

fn build_ast_from_arrow_function(pair: Pair<Rule>) -> Result<FunctionData, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut children = pair.into_inner();
    let params_pair = first_child(children.next().ok_or_else(|| get_unexpected_error(24, span))?, 25)?;
    let params = match params_pair.as_rule() {
        Rule::identifier => vec![get_identifier_data(params_pair)],
        _ => get_formal_parameters(params_pair),
    };
    let body_pair = children.next().ok_or_else(|| get_unexpected_error(26, span))?;
    let (body, var_names) = match body_pair.as_rule() {
        Rule::function_body => {
            let statements = build_ast_from_statement_list(body_pair.into_inner())?;
            let names = var_declared_names(&statements);
            (FunctionBodyType::Block(statements), names)
        }
        _ => (
            FunctionBodyType::Expression(Box::new(build_ast_from_assignment_expression(body_pair)?)),
            vec![],
        ),
    };
    Ok(FunctionData {
        meta,
        id: None,
        params,
        body,
        is_arrow: true,
        var_names,
    })
}

fn build_ast_from_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut expressions = vec![];
    for inner_pair in pair.into_inner() {
        expressions.push(build_ast_from_assignment_expression(inner_pair)?);
    }
    if expressions.len() == 1 {
        if let Some(e) = expressions.pop() {
            return Ok(e);
        }
    }
    Ok(ExpressionType::SequenceExpression { meta, expressions })
}

fn build_ast_from_assignment_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut children = pair.into_inner();
    let first = children.next().ok_or_else(|| get_unexpected_error(27, span))?;
    if first.as_rule() == Rule::arrow_function {
        return Ok(ExpressionType::ArrowFunctionExpression(Rc::new(
            build_ast_from_arrow_function(first)?,
        )));
    }
    let left = build_ast_from_conditional_expression(first)?;
    match children.next() {
        None => Ok(left),
        Some(op_pair) => {
            let operator = match op_pair.as_str() {
                "=" => AssignmentOperator::Equals,
                "+=" => AssignmentOperator::AddEquals,
                "-=" => AssignmentOperator::SubtractEquals,
                "*=" => AssignmentOperator::MultiplyEquals,
                "/=" => AssignmentOperator::DivideEquals,
                "%=" => AssignmentOperator::ModuloEquals,
                "**=" => AssignmentOperator::ExponentEquals,
                "<<=" => AssignmentOperator::BitwiseLeftShiftEquals,
                ">>=" => AssignmentOperator::BitwiseRightShiftEquals,
                ">>>=" => AssignmentOperator::BitwiseUnsignedRightShiftEquals,
                "|=" => AssignmentOperator::BitwiseOrEquals,
                "^=" => AssignmentOperator::BitwiseXorEquals,
                "&=" => AssignmentOperator::BitwiseAndEquals,
                _ => return Err(get_unexpected_error(28, op_pair.as_span())),
            };
            let right = build_ast_from_assignment_expression(
                children.next().ok_or_else(|| get_unexpected_error(29, span))?,
            )?;
            if !left.is_valid_simple_assignment_target() {
                return Err(get_validation_error(
                    "Invalid left-hand side in assignment".to_string(),
                    span,
                ));
            }
            Ok(ExpressionType::AssignmentExpression {
                meta,
                operator,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
    }
}

fn build_ast_from_conditional_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut children = pair.into_inner();
    let test = build_ast_from_binary_expression(children.next().ok_or_else(|| get_unexpected_error(30, span))?)?;
    match children.next() {
        None => Ok(test),
        Some(_question_mark) => {
            let consequent = build_ast_from_assignment_expression(
                children.next().ok_or_else(|| get_unexpected_error(31, span))?,
            )?;
            let alternate = build_ast_from_assignment_expression(
                children.next().ok_or_else(|| get_unexpected_error(32, span))?,
            )?;
            Ok(ExpressionType::ConditionalExpression {
                meta,
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            })
        }
    }
}

enum ChainOperator {
    Binary(BinaryOperator),
    Logical(LogicalOperator),
}

fn get_chain_operator(pair: &Pair<Rule>) -> Result<ChainOperator, Error<Rule>> {
    Ok(match pair.as_str() {
        "||" => ChainOperator::Logical(LogicalOperator::Or),
        "??" => ChainOperator::Logical(LogicalOperator::NullishCoalescing),
        "&&" => ChainOperator::Logical(LogicalOperator::And),
        "|" => ChainOperator::Binary(BinaryOperator::BitwiseOr),
        "^" => ChainOperator::Binary(BinaryOperator::BitwiseXor),
        "&" => ChainOperator::Binary(BinaryOperator::BitwiseAnd),
        "==" => ChainOperator::Binary(BinaryOperator::Equal),
        "!=" => ChainOperator::Binary(BinaryOperator::NotEqual),
        "===" => ChainOperator::Binary(BinaryOperator::StrictlyEqual),
        "!==" => ChainOperator::Binary(BinaryOperator::StrictlyUnequal),
        "<" => ChainOperator::Binary(BinaryOperator::LessThan),
        "<=" => ChainOperator::Binary(BinaryOperator::LessThanEqual),
        ">" => ChainOperator::Binary(BinaryOperator::GreaterThan),
        ">=" => ChainOperator::Binary(BinaryOperator::GreaterThanEqual),
        "instanceof" => ChainOperator::Binary(BinaryOperator::InstanceOf),
        "in" => ChainOperator::Binary(BinaryOperator::In),
        "<<" => ChainOperator::Binary(BinaryOperator::BitwiseLeftShift),
        ">>" => ChainOperator::Binary(BinaryOperator::BitwiseRightShift),
        ">>>" => ChainOperator::Binary(BinaryOperator::BitwiseUnsignedRightShift),
        "+" => ChainOperator::Binary(BinaryOperator::Add),
        "-" => ChainOperator::Binary(BinaryOperator::Subtract),
        "*" => ChainOperator::Binary(BinaryOperator::Multiply),
        "/" => ChainOperator::Binary(BinaryOperator::Divide),
        "%" => ChainOperator::Binary(BinaryOperator::Modulo),
        _ => return Err(get_unexpected_error(33, pair.as_span())),
    })
}

/// Builds any of the left-associative binary levels, from `||` down to
/// `* / %`, folding `a op b op c` into `(a op b) op c`.
fn build_ast_from_binary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    if pair.as_rule() == Rule::exponentiation_expression {
        return build_ast_from_exponentiation_expression(pair);
    }
    let start = pair.as_span().start();
    let span = pair.as_span();
    let mut children = pair.into_inner();
    let mut left = build_ast_from_binary_expression(
        children.next().ok_or_else(|| get_unexpected_error(34, span))?,
    )?;
    while let Some(op_pair) = children.next() {
        let operator = get_chain_operator(&op_pair)?;
        let right_pair = children.next().ok_or_else(|| get_unexpected_error(35, span))?;
        let end = right_pair.as_span().end();
        let right = Box::new(build_ast_from_binary_expression(right_pair)?);
        let meta = Meta {
            start_index: start,
            end_index: end,
        };
        left = match operator {
            ChainOperator::Binary(operator) => ExpressionType::BinaryExpression {
                meta,
                operator,
                left: Box::new(left),
                right,
            },
            ChainOperator::Logical(operator) => ExpressionType::LogicalExpression {
                meta,
                operator,
                left: Box::new(left),
                right,
            },
        };
    }
    Ok(left)
}

fn build_ast_from_exponentiation_expression(
    pair: Pair<Rule>,
) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut children = pair.into_inner();
    let base_pair = children.next().ok_or_else(|| get_unexpected_error(36, span))?;
    let base_is_unary = base_pair
        .clone()
        .into_inner()
        .next()
        .map_or(false, |p| p.as_rule() == Rule::unary_operator);
    let base = build_ast_from_unary_expression(base_pair)?;
    match children.next() {
        None => Ok(base),
        Some(operator) => {
            // `-a ** b` is ambiguous and must be parenthesized.
            if base_is_unary {
                return Err(get_validation_error(
                    "Unary operator used immediately before exponentiation expression".to_string(),
                    operator.as_span(),
                ));
            }
            let exponent = build_ast_from_exponentiation_expression(
                children.next().ok_or_else(|| get_unexpected_error(37, span))?,
            )?;
            Ok(ExpressionType::BinaryExpression {
                meta,
                operator: BinaryOperator::Exponent,
                left: Box::new(base),
                right: Box::new(exponent),
            })
        }
    }
}

fn build_ast_from_unary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut children = pair.into_inner();
    let first = children.next().ok_or_else(|| get_unexpected_error(38, span))?;
    if first.as_rule() == Rule::update_expression {
        return build_ast_from_update_expression(first);
    }
    let operator = match first.as_str() {
        "-" => UnaryOperator::Minus,
        "+" => UnaryOperator::Plus,
        "!" => UnaryOperator::LogicalNot,
        "~" => UnaryOperator::BitwiseNot,
        "typeof" => UnaryOperator::TypeOf,
        "void" => UnaryOperator::Void,
        "delete" => UnaryOperator::Delete,
        _ => return Err(get_unexpected_error(39, first.as_span())),
    };
    let argument = build_ast_from_unary_expression(
        children.next().ok_or_else(|| get_unexpected_error(40, span))?,
    )?;
    Ok(ExpressionType::UnaryExpression {
        meta,
        operator,
        argument: Box::new(argument),
    })
}

fn get_update_operator(pair: &Pair<Rule>) -> UpdateOperator {
    if pair.as_str() == "++" {
        UpdateOperator::PlusPlus
    } else {
        UpdateOperator::MinusMinus
    }
}

fn build_ast_from_update_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut children = pair.into_inner();
    let first = children.next().ok_or_else(|| get_unexpected_error(41, span))?;
    let (operator, argument, prefix) = if first.as_rule() == Rule::update_operator {
        let operator = get_update_operator(&first);
        let argument = build_ast_from_unary_expression(
            children.next().ok_or_else(|| get_unexpected_error(42, span))?,
        )?;
        (operator, argument, true)
    } else {
        let argument = build_ast_from_left_hand_side_expression(first)?;
        match children.next() {
            None => return Ok(argument),
            Some(op) => (get_update_operator(&op), argument, false),
        }
    };
    if !argument.is_valid_simple_assignment_target() {
        let message = if prefix {
            "Invalid left-hand side expression in prefix operation"
        } else {
            "Invalid left-hand side expression in postfix operation"
        };
        return Err(get_validation_error(message.to_string(), span));
    }
    Ok(ExpressionType::UpdateExpression {
        meta,
        operator,
        argument: Box::new(argument),
        prefix,
    })
}

fn build_ast_from_left_hand_side_expression(
    pair: Pair<Rule>,
) -> Result<ExpressionType, Error<Rule>> {
    let span = pair.as_span();
    let mut children = pair.into_inner();
    let first = children.next().ok_or_else(|| get_unexpected_error(43, span))?;
    let object = match first.as_rule() {
        Rule::new_expression => build_ast_from_new_expression(first)?,
        _ => build_ast_from_primary_expression(first)?,
    };
    apply_suffixes(object, span.start(), children)
}

/// Applies `.x`, `[x]` and `(args)` suffixes left to right.
fn apply_suffixes(
    mut object: ExpressionType,
    start: usize,
    suffixes: Pairs<Rule>,
) -> Result<ExpressionType, Error<Rule>> {
    for suffix in suffixes {
        let meta = Meta {
            start_index: start,
            end_index: suffix.as_span().end(),
        };
        object = match suffix.as_rule() {
            Rule::member_dot => ExpressionType::MemberExpression(
                MemberExpressionType::SimpleMemberExpression {
                    meta,
                    object: Box::new(object),
                    property: get_identifier_data(first_child(suffix, 44)?),
                },
            ),
            Rule::member_bracket => ExpressionType::MemberExpression(
                MemberExpressionType::ComputedMemberExpression {
                    meta,
                    object: Box::new(object),
                    property: Box::new(build_ast_from_expression(first_child(suffix, 45)?)?),
                },
            ),
            Rule::arguments => ExpressionType::CallExpression {
                meta,
                callee: Box::new(object),
                arguments: get_arguments(suffix)?,
            },
            _ => return Err(get_unexpected_error(46, suffix.as_span())),
        };
    }
    Ok(object)
}

fn get_arguments(pair: Pair<Rule>) -> Result<Vec<ExpressionType>, Error<Rule>> {
    pair.into_inner()
        .map(build_ast_from_assignment_expression)
        .collect()
}

fn build_ast_from_new_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut children = significant_children(pair).into_iter();
    let callee_pair = take_child(&mut children, span, 47)?;
    let callee_start = callee_pair.as_span().start();
    let mut callee_children = callee_pair.into_inner();
    let primary = build_ast_from_primary_expression(
        callee_children
            .next()
            .ok_or_else(|| get_unexpected_error(48, span))?,
    )?;
    let callee = apply_suffixes(primary, callee_start, callee_children)?;
    let arguments = match children.next() {
        Some(p) => get_arguments(p)?,
        None => vec![],
    };
    Ok(ExpressionType::NewExpression {
        meta,
        callee: Box::new(callee),
        arguments,
    })
}

fn build_ast_from_primary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let inner_pair = first_child(pair, 49)?;
    let meta = get_meta(&inner_pair);
    Ok(match inner_pair.as_rule() {
        Rule::this_kw => ExpressionType::ThisExpression { meta },
        Rule::function_expression => {
            ExpressionType::FunctionExpression(Rc::new(build_ast_from_function(inner_pair)?))
        }
        Rule::literal => ExpressionType::Literal(build_ast_from_literal(inner_pair)?),
        Rule::identifier => ExpressionType::Identifier(get_identifier_data(inner_pair)),
        Rule::array_literal => ExpressionType::ArrayExpression {
            meta,
            elements: inner_pair
                .into_inner()
                .map(build_ast_from_assignment_expression)
                .collect::<Result<Vec<_>, _>>()?,
        },
        Rule::object_literal => build_ast_from_object_literal(inner_pair)?,
        Rule::parenthesized_expression => build_ast_from_expression(first_child(inner_pair, 50)?)?,
        _ => return Err(get_unexpected_error(51, inner_pair.as_span())),
    })
}

fn build_ast_from_literal(pair: Pair<Rule>) -> Result<LiteralData, Error<Rule>> {
    let inner_pair = first_child(pair, 52)?;
    let meta = get_meta(&inner_pair);
    let value = match inner_pair.as_rule() {
        Rule::null_literal => LiteralType::NullLiteral,
        Rule::boolean_literal => LiteralType::BooleanLiteral(inner_pair.as_str() == "true"),
        Rule::numeric_literal => LiteralType::NumberLiteral(parse_numeric_literal(inner_pair.as_str())),
        Rule::bigint_literal => match parse_bigint_literal(inner_pair.as_str()) {
            Some(b) => LiteralType::BigIntLiteral(b),
            None => {
                return Err(get_validation_error(
                    "Invalid BigInt literal".to_string(),
                    inner_pair.as_span(),
                ))
            }
        },
        Rule::string_literal => LiteralType::StringLiteral(get_string_value(inner_pair)?),
        _ => return Err(get_unexpected_error(53, inner_pair.as_span())),
    };
    Ok(LiteralData { meta, value })
}

fn get_string_value(pair: Pair<Rule>) -> Result<String, Error<Rule>> {
    let span = pair.as_span();
    let raw = match pair.into_inner().next() {
        Some(chars) => chars.as_str(),
        None => "",
    };
    unescape_string(raw).map_err(|message| get_validation_error(message, span))
}

fn build_ast_from_object_literal(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut properties = vec![];
    for property_pair in pair.into_inner() {
        let p_meta = get_meta(&property_pair);
        let inner_pair = first_child(property_pair, 54)?;
        let span = inner_pair.as_span();
        let property = match inner_pair.as_rule() {
            Rule::shorthand_property => {
                let id = get_identifier_data(first_child(inner_pair, 55)?);
                PropertyData {
                    meta: p_meta,
                    key: PropertyKeyType::Static(id.name.clone()),
                    value: ExpressionType::Identifier(id),
                }
            }
            Rule::keyed_property => {
                let mut children = inner_pair.into_inner();
                let key = build_property_key(children.next().ok_or_else(|| get_unexpected_error(56, span))?)?;
                let value = build_ast_from_assignment_expression(
                    children.next().ok_or_else(|| get_unexpected_error(57, span))?,
                )?;
                PropertyData {
                    meta: p_meta,
                    key,
                    value,
                }
            }
            Rule::method_property => {
                let f_meta = get_meta(&inner_pair);
                let mut children = inner_pair.into_inner();
                let key_pair = children.next().ok_or_else(|| get_unexpected_error(58, span))?;
                let key_meta = get_meta(&key_pair);
                let key = build_property_key(key_pair)?;
                let params = get_formal_parameters(children.next().ok_or_else(|| get_unexpected_error(59, span))?);
                let body = build_ast_from_statement_list(
                    children
                        .next()
                        .ok_or_else(|| get_unexpected_error(60, span))?
                        .into_inner(),
                )?;
                let id = match &key {
                    PropertyKeyType::Static(name) => Some(IdentifierData {
                        name: name.clone(),
                        meta: key_meta,
                    }),
                    PropertyKeyType::Computed(_) => None,
                };
                let function = FunctionData {
                    meta: f_meta,
                    id,
                    params,
                    var_names: var_declared_names(&body),
                    body: FunctionBodyType::Block(body),
                    is_arrow: false,
                };
                PropertyData {
                    meta: p_meta,
                    key,
                    value: ExpressionType::FunctionExpression(Rc::new(function)),
                }
            }
            _ => return Err(get_unexpected_error(61, span)),
        };
        properties.push(property);
    }
    Ok(ExpressionType::ObjectExpression { meta, properties })
}

fn build_property_key(pair: Pair<Rule>) -> Result<PropertyKeyType, Error<Rule>> {
    let inner_pair = first_child(pair, 62)?;
    Ok(match inner_pair.as_rule() {
        Rule::computed_property_name => PropertyKeyType::Computed(Box::new(
            build_ast_from_assignment_expression(first_child(inner_pair, 63)?)?,
        )),
        Rule::string_literal => PropertyKeyType::Static(get_string_value(inner_pair)?),
        Rule::numeric_literal => PropertyKeyType::Static(number_to_string(parse_numeric_literal(
            inner_pair.as_str(),
        ))),
        _ => PropertyKeyType::Static(inner_pair.as_str().to_string()),
    })
}
