use std::collections::HashSet;

use pest::error::{Error, ErrorVariant};
use pest::{Position, Span};

use crate::parser::api::Rule;
use crate::parser::ast::{
    ExpressionType, ForInitType, FunctionBodyType, FunctionData, HasMeta, MemberExpressionType,
    Meta, ProgramData, PropertyKeyType, StatementType, VariableDeclarationData,
    VariableDeclarationKind,
};

/// Names declared with `var` in a statement list, including nested blocks
/// but not nested functions. Duplicates are removed; first occurrence wins.
pub(crate) fn var_declared_names(statements: &[StatementType]) -> Vec<String> {
    let mut names = vec![];
    for s in statements {
        collect_var_names(s, &mut names);
    }
    let mut seen = HashSet::new();
    names.retain(|n| seen.insert(n.clone()));
    names
}

fn collect_var_names(statement: &StatementType, names: &mut Vec<String>) {
    match statement {
        StatementType::VariableDeclaration(v) if v.kind == VariableDeclarationKind::Var => {
            names.extend(v.declarations.iter().map(|d| d.id.name.clone()));
        }
        StatementType::BlockStatement { body, .. } => {
            body.iter().for_each(|s| collect_var_names(s, names));
        }
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_var_names(consequent, names);
            if let Some(a) = alternate {
                collect_var_names(a, names);
            }
        }
        StatementType::WhileStatement { body, .. } | StatementType::DoWhileStatement { body, .. } => {
            collect_var_names(body, names)
        }
        StatementType::ForStatement { init, body, .. } => {
            if let Some(ForInitType::VariableDeclaration(v)) = init {
                if v.kind == VariableDeclarationKind::Var {
                    names.extend(v.declarations.iter().map(|d| d.id.name.clone()));
                }
            }
            collect_var_names(body, names);
        }
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            block.iter().for_each(|s| collect_var_names(s, names));
            if let Some(h) = handler {
                h.body.iter().for_each(|s| collect_var_names(s, names));
            }
            if let Some(f) = finalizer {
                f.iter().for_each(|s| collect_var_names(s, names));
            }
        }
        _ => {}
    }
}

/// `let` and `const` declarations made directly in a statement list.
/// The flag is true for `const`.
pub(crate) fn lexically_declared_names(statements: &[StatementType]) -> Vec<(String, bool)> {
    let mut names = vec![];
    for s in statements {
        match s {
            StatementType::VariableDeclaration(v) if v.kind != VariableDeclarationKind::Var => {
                let is_const = v.kind == VariableDeclarationKind::Const;
                names.extend(v.declarations.iter().map(|d| (d.id.name.clone(), is_const)));
            }
            _ => {}
        }
    }
    names
}

#[derive(Clone, Copy)]
struct Context {
    in_function: bool,
    in_loop: bool,
}

fn get_error(message: &str, meta: &Meta, source: &str) -> Error<Rule> {
    let variant = ErrorVariant::CustomError {
        message: message.to_string(),
    };
    match Span::new(source, meta.start_index, meta.end_index) {
        Some(span) => Error::new_from_span(variant, span),
        None => Error::new_from_pos(variant, Position::from_start(source)),
    }
}

/// Early errors the grammar alone does not catch.
pub(crate) fn validate_program(program: &ProgramData, source: &str) -> Result<(), Error<Rule>> {
    let ctx = Context {
        in_function: false,
        in_loop: false,
    };
    validate_statement_list(&program.body, ctx, source)
}

fn validate_statement_list(
    statements: &[StatementType],
    ctx: Context,
    source: &str,
) -> Result<(), Error<Rule>> {
    check_duplicate_lexical_declarations(statements, source)?;
    for s in statements {
        validate_statement(s, ctx, source)?;
    }
    Ok(())
}

fn check_duplicate_lexical_declarations(
    statements: &[StatementType],
    source: &str,
) -> Result<(), Error<Rule>> {
    let var_names: HashSet<String> = var_declared_names(statements).into_iter().collect();
    let mut lexical = HashSet::new();
    for s in statements {
        if let StatementType::VariableDeclaration(v) = s {
            if v.kind == VariableDeclarationKind::Var {
                continue;
            }
            for d in &v.declarations {
                if !lexical.insert(d.id.name.clone()) || var_names.contains(&d.id.name) {
                    return Err(get_error(
                        &format!("Identifier '{}' has already been declared", d.id.name),
                        &d.meta,
                        source,
                    ));
                }
            }
        }
    }
    Ok(())
}

fn validate_statement(statement: &StatementType, ctx: Context, source: &str) -> Result<(), Error<Rule>> {
    match statement {
        StatementType::ExpressionStatement { expression, .. } => validate_expression(expression, source),
        StatementType::BlockStatement { body, .. } => validate_statement_list(body, ctx, source),
        StatementType::EmptyStatement { .. } => Ok(()),
        StatementType::VariableDeclaration(v) => validate_variable_declaration(v, source),
        StatementType::FunctionDeclaration(f) => validate_function(f, source),
        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            validate_expression(test, source)?;
            validate_statement(consequent, ctx, source)?;
            if let Some(a) = alternate {
                validate_statement(a, ctx, source)?;
            }
            Ok(())
        }
        StatementType::WhileStatement { test, body, .. }
        | StatementType::DoWhileStatement { test, body, .. } => {
            validate_expression(test, source)?;
            validate_statement(body, Context { in_loop: true, ..ctx }, source)
        }
        StatementType::ForStatement {
            init,
            test,
            update,
            body,
            ..
        } => {
            match init {
                Some(ForInitType::VariableDeclaration(v)) => validate_variable_declaration(v, source)?,
                Some(ForInitType::Expression(e)) => validate_expression(e, source)?,
                None => {}
            }
            if let Some(t) = test {
                validate_expression(t, source)?;
            }
            if let Some(u) = update {
                validate_expression(u, source)?;
            }
            validate_statement(body, Context { in_loop: true, ..ctx }, source)
        }
        StatementType::BreakStatement { meta } => {
            if ctx.in_loop {
                Ok(())
            } else {
                Err(get_error("Illegal break statement", meta, source))
            }
        }
        StatementType::ContinueStatement { meta } => {
            if ctx.in_loop {
                Ok(())
            } else {
                Err(get_error(
                    "Illegal continue statement: no surrounding iteration statement",
                    meta,
                    source,
                ))
            }
        }
        StatementType::ReturnStatement { meta, argument } => {
            if !ctx.in_function {
                return Err(get_error("Illegal return statement", meta, source));
            }
            match argument {
                Some(a) => validate_expression(a, source),
                None => Ok(()),
            }
        }
        StatementType::ThrowStatement { argument, .. } => validate_expression(argument, source),
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            validate_statement_list(block, ctx, source)?;
            if let Some(h) = handler {
                validate_statement_list(&h.body, ctx, source)?;
            }
            if let Some(f) = finalizer {
                validate_statement_list(f, ctx, source)?;
            }
            Ok(())
        }
    }
}

fn validate_variable_declaration(
    v: &VariableDeclarationData,
    source: &str,
) -> Result<(), Error<Rule>> {
    for d in &v.declarations {
        match &d.init {
            Some(init) => validate_expression(init, source)?,
            None if v.kind == VariableDeclarationKind::Const => {
                return Err(get_error(
                    "Missing initializer in const declaration",
                    &d.meta,
                    source,
                ))
            }
            None => {}
        }
    }
    Ok(())
}

fn validate_function(f: &FunctionData, source: &str) -> Result<(), Error<Rule>> {
    if f.is_arrow {
        let mut seen = HashSet::new();
        for p in &f.params {
            if !seen.insert(p.name.as_str()) {
                return Err(get_error(
                    "Duplicate parameter name not allowed in this context",
                    &p.meta,
                    source,
                ));
            }
        }
    }
    let ctx = Context {
        in_function: true,
        in_loop: false,
    };
    match &f.body {
        FunctionBodyType::Block(body) => validate_statement_list(body, ctx, source),
        FunctionBodyType::Expression(e) => validate_expression(e, source),
    }
}

fn validate_expression(expression: &ExpressionType, source: &str) -> Result<(), Error<Rule>> {
    match expression {
        ExpressionType::Literal(_)
        | ExpressionType::Identifier(_)
        | ExpressionType::ThisExpression { .. } => Ok(()),
        ExpressionType::ArrayExpression { elements, .. } => {
            for e in elements {
                validate_expression(e, source)?;
            }
            Ok(())
        }
        ExpressionType::ObjectExpression { properties, .. } => {
            for p in properties {
                if let PropertyKeyType::Computed(k) = &p.key {
                    validate_expression(k, source)?;
                }
                validate_expression(&p.value, source)?;
            }
            Ok(())
        }
        ExpressionType::FunctionExpression(f) | ExpressionType::ArrowFunctionExpression(f) => {
            validate_function(f, source)
        }
        ExpressionType::UnaryExpression { argument, .. }
        | ExpressionType::UpdateExpression { argument, .. } => validate_expression(argument, source),
        ExpressionType::BinaryExpression { left, right, .. }
        | ExpressionType::LogicalExpression { left, right, .. } => {
            validate_expression(left, source)?;
            validate_expression(right, source)
        }
        ExpressionType::AssignmentExpression { left, right, .. } => {
            if !left.is_valid_simple_assignment_target() {
                return Err(get_error(
                    "Invalid left-hand side in assignment",
                    left.get_meta(),
                    source,
                ));
            }
            validate_expression(left, source)?;
            validate_expression(right, source)
        }
        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            validate_expression(test, source)?;
            validate_expression(consequent, source)?;
            validate_expression(alternate, source)
        }
        ExpressionType::CallExpression {
            callee, arguments, ..
        }
        | ExpressionType::NewExpression {
            callee, arguments, ..
        } => {
            validate_expression(callee, source)?;
            for a in arguments {
                validate_expression(a, source)?;
            }
            Ok(())
        }
        ExpressionType::MemberExpression(m) => match m {
            MemberExpressionType::SimpleMemberExpression { object, .. } => {
                validate_expression(object, source)
            }
            MemberExpressionType::ComputedMemberExpression {
                object, property, ..
            } => {
                validate_expression(object, source)?;
                validate_expression(property, source)
            }
        },
        ExpressionType::SequenceExpression { expressions, .. } => {
            for e in expressions {
                validate_expression(e, source)?;
            }
            Ok(())
        }
    }
}
