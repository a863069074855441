//! Statement execution.

use log::trace;

use crate::parser::ast::{
    CatchClauseData, ExpressionType, ForInitType, ProgramData, StatementType,
    VariableDeclarationData, VariableDeclarationKind,
};
use crate::parser::static_semantics::lexically_declared_names;
use crate::runner::ds::env_record::EnvironmentRecordType;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::expression::evaluate_expression;
use super::function::instantiate_function;
use super::types::{Completion, CompletionType, EvalResult, ValueResult};

/// Runs a whole program in the global scope and returns the value of the
/// last statement that produced one.
pub fn evaluate_program(program: &ProgramData, ctx: &mut EvalContext) -> ValueResult {
    {
        let mut global = ctx.global_env.borrow_mut();
        if let EnvironmentRecordType::Global(rec) = &mut global.inner {
            for name in &program.var_names {
                rec.create_global_var_binding(name);
            }
        }
    }
    instantiate_block_declarations(&program.body, ctx)?;
    let completion = evaluate_statement_list(&program.body, ctx)?;
    Ok(completion.value.unwrap_or(JsValue::Undefined))
}

/// Declares the `let`/`const` names of a statement list (uninitialized) and
/// binds its function declarations, all in the current environment.
pub(crate) fn instantiate_block_declarations(
    body: &[StatementType],
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    let env = ctx.lex_env.clone();
    {
        let mut e = env.borrow_mut();
        let rec = e.inner.as_env_record_mut();
        for (name, is_const) in lexically_declared_names(body) {
            if is_const {
                rec.create_immutable_binding(name);
            } else {
                rec.create_mutable_binding(name);
            }
        }
    }
    for s in body {
        if let StatementType::FunctionDeclaration(data) = s {
            let f = instantiate_function(data, ctx)?;
            if let Some(id) = &data.id {
                let mut e = env.borrow_mut();
                let rec = e.inner.as_env_record_mut();
                rec.create_mutable_binding(id.name.clone());
                rec.initialize_binding(&id.name, f);
            }
        }
    }
    Ok(())
}

/// Execute statements in order. The completion value is that of the last
/// statement that produced one.
pub(crate) fn evaluate_statement_list(body: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    let mut last = None;
    for s in body {
        let completion = evaluate_statement(s, ctx)?;
        if completion.is_abrupt() {
            return Ok(completion.update_empty(last));
        }
        if completion.value.is_some() {
            last = completion.value;
        }
    }
    Ok(Completion {
        completion_type: CompletionType::Normal,
        value: last,
    })
}

/// Execute a statement and return its completion.
pub fn evaluate_statement(stmt: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    ctx.tick()?;
    match stmt {
        StatementType::EmptyStatement { .. } | StatementType::FunctionDeclaration(_) => {
            Ok(Completion::normal())
        }
        StatementType::ExpressionStatement { expression, .. } => {
            let value = evaluate_expression(expression, ctx)?;
            Ok(Completion::normal_with_value(value))
        }
        StatementType::BlockStatement { body, .. } => evaluate_block(body, ctx),
        StatementType::VariableDeclaration(decl) => {
            evaluate_variable_declaration(decl, ctx)?;
            Ok(Completion::normal())
        }
        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            let completion = if to_boolean(&evaluate_expression(test, ctx)?) {
                evaluate_statement(consequent, ctx)?
            } else if let Some(alternate) = alternate {
                evaluate_statement(alternate, ctx)?
            } else {
                Completion::normal()
            };
            Ok(completion.update_empty(Some(JsValue::Undefined)))
        }
        StatementType::WhileStatement { test, body, .. } => {
            evaluate_while_statement(test, body, ctx)
        }
        StatementType::DoWhileStatement { body, test, .. } => {
            evaluate_do_while_statement(body, test, ctx)
        }
        StatementType::ForStatement {
            init,
            test,
            update,
            body,
            ..
        } => evaluate_for_statement(init.as_ref(), test.as_ref(), update.as_ref(), body, ctx),
        StatementType::BreakStatement { .. } => Ok(Completion::break_completion()),
        StatementType::ContinueStatement { .. } => Ok(Completion::continue_completion()),
        StatementType::ReturnStatement { argument, .. } => {
            let value = match argument {
                Some(a) => evaluate_expression(a, ctx)?,
                None => JsValue::Undefined,
            };
            Ok(Completion::return_value(value))
        }
        StatementType::ThrowStatement { argument, .. } => {
            let value = evaluate_expression(argument, ctx)?;
            Err(JErrorType::Thrown(value))
        }
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => evaluate_try_statement(block, handler.as_ref(), finalizer.as_deref(), ctx),
    }
}

/// True when the block declares something that needs its own environment.
fn needs_block_scope(body: &[StatementType]) -> bool {
    body.iter().any(|s| match s {
        StatementType::FunctionDeclaration(_) => true,
        StatementType::VariableDeclaration(v) => v.kind != VariableDeclarationKind::Var,
        _ => false,
    })
}

/// Runs `f` with `env` as the current environment, restoring the previous one
/// whether or not `f` fails.
fn with_environment<T>(
    ctx: &mut EvalContext,
    env: JsLexEnvironmentType,
    f: impl FnOnce(&mut EvalContext) -> Result<T, JErrorType>,
) -> Result<T, JErrorType> {
    let saved = std::mem::replace(&mut ctx.lex_env, env);
    let result = f(ctx);
    ctx.lex_env = saved;
    result
}

/// Execute a block statement.
fn evaluate_block(body: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    if !needs_block_scope(body) {
        return evaluate_statement_list(body, ctx);
    }
    let block_env = ctx.new_declarative_env(ctx.lex_env.clone());
    with_environment(ctx, block_env, |ctx| {
        instantiate_block_declarations(body, ctx)?;
        evaluate_statement_list(body, ctx)
    })
}

/// Execute a `var`, `let` or `const` declaration list. A `var` without an
/// initializer leaves the hoisted binding alone.
fn evaluate_variable_declaration(
    decl: &VariableDeclarationData,
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    for d in &decl.declarations {
        let name = d.id.name.as_str();
        if decl.kind == VariableDeclarationKind::Var {
            if let Some(init) = &d.init {
                let value = evaluate_expression(init, ctx)?;
                ctx.set_binding(name, value)?;
            }
            continue;
        }
        let value = match &d.init {
            Some(init) => evaluate_expression(init, ctx)?,
            None => JsValue::Undefined,
        };
        let mut env = ctx.lex_env.borrow_mut();
        let rec = env.inner.as_env_record_mut();
        if !rec.initialize_binding(name, value.clone()) {
            // A declaration that is the whole body of an if or loop has no
            // enclosing block to hoist into.
            if decl.kind == VariableDeclarationKind::Const {
                rec.create_immutable_binding(name.to_string());
            } else {
                rec.create_mutable_binding(name.to_string());
            }
            rec.initialize_binding(name, value);
        }
    }
    Ok(())
}

/// Applies a loop body's completion. Returns Some when the loop must stop
/// with that completion.
fn loop_continues(completion: Completion, last: &mut Option<JsValue>) -> Option<Completion> {
    if completion.value.is_some() {
        *last = completion.value.clone();
    }
    match completion.completion_type {
        CompletionType::Normal | CompletionType::Continue => None,
        CompletionType::Break => Some(Completion {
            completion_type: CompletionType::Normal,
            value: last.clone(),
        }),
        CompletionType::Return => Some(completion),
    }
}

/// Execute a while loop.
fn evaluate_while_statement(
    test: &ExpressionType,
    body: &StatementType,
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut last = None;
    while to_boolean(&evaluate_expression(test, ctx)?) {
        ctx.tick()?;
        if let Some(done) = loop_continues(evaluate_statement(body, ctx)?, &mut last) {
            return Ok(done);
        }
    }
    Ok(Completion {
        completion_type: CompletionType::Normal,
        value: last.or(Some(JsValue::Undefined)),
    })
}

/// Execute a do-while loop.
fn evaluate_do_while_statement(
    body: &StatementType,
    test: &ExpressionType,
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut last = None;
    loop {
        ctx.tick()?;
        if let Some(done) = loop_continues(evaluate_statement(body, ctx)?, &mut last) {
            return Ok(done);
        }
        if !to_boolean(&evaluate_expression(test, ctx)?) {
            break;
        }
    }
    Ok(Completion {
        completion_type: CompletionType::Normal,
        value: last.or(Some(JsValue::Undefined)),
    })
}

/// Gives each iteration of a `for (let ...)` loop its own copy of the loop
/// variables, so closures created in the body see that iteration's values.
fn copy_iteration_environment(ctx: &mut EvalContext, outer: &JsLexEnvironmentType) {
    let copy = {
        let current = ctx.lex_env.borrow();
        match &current.inner {
            EnvironmentRecordType::Declarative(d) => Some(d.snapshot()),
            EnvironmentRecordType::Global(_) => None,
        }
    };
    if let Some(record) = copy {
        let env = ctx.new_declarative_env(outer.clone());
        env.borrow_mut().inner = EnvironmentRecordType::Declarative(record);
        ctx.lex_env = env;
    }
}

/// Execute a for loop. `let` declarations in the head get a fresh
/// environment per iteration.
fn evaluate_for_statement(
    init: Option<&ForInitType>,
    test: Option<&ExpressionType>,
    update: Option<&ExpressionType>,
    body: &StatementType,
    ctx: &mut EvalContext,
) -> EvalResult {
    let per_iteration = matches!(
        init,
        Some(ForInitType::VariableDeclaration(v)) if v.kind != VariableDeclarationKind::Var
    );
    let outer = ctx.lex_env.clone();
    let loop_env = if per_iteration {
        ctx.new_declarative_env(outer.clone())
    } else {
        outer.clone()
    };
    with_environment(ctx, loop_env, |ctx| {
        match init {
            Some(ForInitType::VariableDeclaration(v)) => {
                if per_iteration {
                    let mut env = ctx.lex_env.borrow_mut();
                    let rec = env.inner.as_env_record_mut();
                    for d in &v.declarations {
                        if v.kind == VariableDeclarationKind::Const {
                            rec.create_immutable_binding(d.id.name.clone());
                        } else {
                            rec.create_mutable_binding(d.id.name.clone());
                        }
                    }
                }
                evaluate_variable_declaration(v, ctx)?;
            }
            Some(ForInitType::Expression(e)) => {
                evaluate_expression(e, ctx)?;
            }
            None => {}
        }
        if per_iteration {
            copy_iteration_environment(ctx, &outer);
        }
        let mut last = None;
        loop {
            if let Some(t) = test {
                if !to_boolean(&evaluate_expression(t, ctx)?) {
                    break;
                }
            }
            ctx.tick()?;
            if let Some(done) = loop_continues(evaluate_statement(body, ctx)?, &mut last) {
                return Ok(done);
            }
            if per_iteration {
                copy_iteration_environment(ctx, &outer);
            }
            if let Some(u) = update {
                evaluate_expression(u, ctx)?;
            }
        }
        Ok(Completion {
            completion_type: CompletionType::Normal,
            value: last.or(Some(JsValue::Undefined)),
        })
    })
}

/// Binds the caught value to the catch parameter and runs the handler.
fn evaluate_catch_clause(
    handler: &CatchClauseData,
    error: JErrorType,
    ctx: &mut EvalContext,
) -> EvalResult {
    let value = ctx.error_to_value(error)?;
    let catch_env = ctx.new_declarative_env(ctx.lex_env.clone());
    if let Some(param) = &handler.param {
        let mut env = catch_env.borrow_mut();
        let rec = env.inner.as_env_record_mut();
        rec.create_mutable_binding(param.name.clone());
        rec.initialize_binding(&param.name, value);
    }
    with_environment(ctx, catch_env, |ctx| evaluate_block(&handler.body, ctx))
}

/// Execute a try statement. The finalizer's abrupt completion, if any,
/// replaces the result of the try and catch blocks.
fn evaluate_try_statement(
    block: &[StatementType],
    handler: Option<&CatchClauseData>,
    finalizer: Option<&[StatementType]>,
    ctx: &mut EvalContext,
) -> EvalResult {
    let result = match (evaluate_block(block, ctx), handler) {
        (Err(error), Some(handler)) if !ctx.is_budget_exhausted() => {
            trace!("caught {}", error);
            evaluate_catch_clause(handler, error, ctx)
        }
        (result, _) => result,
    };
    if ctx.is_budget_exhausted() {
        return result;
    }
    if let Some(finalizer) = finalizer {
        let f = evaluate_block(finalizer, ctx)?;
        if f.is_abrupt() {
            return Ok(f);
        }
    }
    result.map(|c| c.update_empty(Some(JsValue::Undefined)))
}
