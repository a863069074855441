//! Function creation, calls and construction.

use std::rc::Rc;

use log::trace;

use crate::parser::ast::{FunctionBodyType, FunctionData};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{FunctionKind, FunctionObject};
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{JsObject, JsObjectType, ObjectClass, ObjectType};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::operations::object::get;
use crate::runner::ds::operations::type_conversion::to_display_string;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::expression::evaluate_expression;
use super::statement::{evaluate_statement_list, instantiate_block_declarations};
use super::types::{CompletionType, ValueResult};
use super::{STACK_RED_ZONE, STACK_SEGMENT_SIZE};

/// Creates a closure over the current environment. Arrow functions also
/// capture the current `this`.
pub fn instantiate_function(data: &Rc<FunctionData>, ctx: &mut EvalContext) -> ValueResult {
    let lexical_this = if data.is_arrow {
        Some(ctx.this_value.clone())
    } else {
        None
    };
    let f = FunctionObject::new_script(data.clone(), ctx.lex_env.clone(), lexical_this);
    Ok(JsValue::Object(ctx.alloc(ObjectType::Function(f))?))
}

/// A named function expression sees its own name, bound in an environment
/// between the closure and the surrounding scope.
pub fn instantiate_named_function_expression(
    data: &Rc<FunctionData>,
    ctx: &mut EvalContext,
) -> ValueResult {
    let name = match &data.id {
        Some(id) => id.name.clone(),
        None => return instantiate_function(data, ctx),
    };
    let func_env = ctx.new_declarative_env(ctx.lex_env.clone());
    let saved = std::mem::replace(&mut ctx.lex_env, func_env.clone());
    let f = instantiate_function(data, ctx);
    ctx.lex_env = saved;
    let f = f?;
    {
        let mut env = func_env.borrow_mut();
        let rec = env.inner.as_env_record_mut();
        rec.create_immutable_binding(name.clone());
        rec.initialize_binding(&name, f.clone());
    }
    Ok(f)
}

fn function_kind(f: &JsValue) -> Option<FunctionKind> {
    match f {
        JsValue::Object(o) => match &*o.borrow() {
            ObjectType::Function(func) => Some(func.kind().clone()),
            _ => None,
        },
        _ => None,
    }
}

/// [[Call]] for any callable value.
pub fn call_function(
    ctx: &mut EvalContext,
    f: &JsValue,
    this: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    let kind = function_kind(f).ok_or_else(|| {
        JErrorType::TypeError(format!("{} is not a function", to_display_string(f)))
    })?;
    ctx.tick()?;
    ctx.enter_call()?;
    let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || match kind {
        FunctionKind::Native { func, name } => {
            trace!("calling native {}", name);
            func.call(ctx, this, args)
        }
        FunctionKind::Script {
            data,
            env,
            lexical_this,
        } => call_script_function(ctx, &data, env, lexical_this.unwrap_or(this), args),
    });
    ctx.exit_call();
    result
}

fn call_script_function(
    ctx: &mut EvalContext,
    data: &Rc<FunctionData>,
    env: JsLexEnvironmentType,
    this: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    let func_env = ctx.new_declarative_env(env);
    {
        let mut e = func_env.borrow_mut();
        let rec = e.inner.as_env_record_mut();
        let mut args = args.into_iter();
        for p in &data.params {
            rec.create_mutable_binding(p.name.clone());
            rec.initialize_binding(&p.name, args.next().unwrap_or(JsValue::Undefined));
        }
        for name in &data.var_names {
            if !rec.has_binding(name) {
                rec.create_mutable_binding(name.clone());
                rec.initialize_binding(name, JsValue::Undefined);
            }
        }
    }
    let saved_env = std::mem::replace(&mut ctx.lex_env, func_env);
    let saved_this = std::mem::replace(&mut ctx.this_value, this);
    let result = match &data.body {
        FunctionBodyType::Expression(e) => evaluate_expression(e, ctx),
        FunctionBodyType::Block(body) => instantiate_block_declarations(body, ctx)
            .and_then(|_| evaluate_statement_list(body, ctx))
            .map(|c| match c.completion_type {
                CompletionType::Return => c.value.unwrap_or(JsValue::Undefined),
                _ => JsValue::Undefined,
            }),
    };
    ctx.lex_env = saved_env;
    ctx.this_value = saved_this;
    result
}

/// The `prototype` object of a script function, created on first use.
pub fn ensure_prototype(ctx: &mut EvalContext, f: &JsObjectType) -> Result<JsValue, JErrorType> {
    let key = PropertyKey::from("prototype");
    if let Some(p) = f.borrow().as_js_object().get_own_property(&key) {
        return Ok(p);
    }
    let proto = ctx.alloc_ordinary()?;
    f.borrow_mut()
        .as_js_object_mut()
        .define_own_property(key, PropertyDescriptor::new_hidden(proto.clone()));
    Ok(proto)
}

pub(crate) fn is_script_function(f: &JsObjectType) -> bool {
    matches!(&*f.borrow(), ObjectType::Function(func) if matches!(func.kind(), FunctionKind::Script { .. }))
}

/// Built-ins that may be called but not used with `new`.
const NON_CONSTRUCTIBLE_NATIVES: [&str; 2] = ["Symbol", "BigInt"];

/// [[Construct]]. Script functions get a fresh object whose prototype is
/// `F.prototype`; native constructors build their own result.
pub fn construct(
    ctx: &mut EvalContext,
    f: &JsValue,
    args: Vec<JsValue>,
    callee_text: &str,
) -> ValueResult {
    let not_a_constructor = || JErrorType::TypeError(format!("{} is not a constructor", callee_text));
    let fo = match f {
        JsValue::Object(o) => o.clone(),
        _ => return Err(not_a_constructor()),
    };
    let is_constructor = match &*fo.borrow() {
        ObjectType::Function(func) => {
            let native = matches!(func.kind(), FunctionKind::Native { .. });
            func.is_constructor()
                && !(native && NON_CONSTRUCTIBLE_NATIVES.contains(&func.name().as_str()))
        }
        _ => false,
    };
    if !is_constructor {
        return Err(not_a_constructor());
    }
    if !is_script_function(&fo) {
        return call_function(ctx, f, JsValue::Undefined, args);
    }
    let proto = match ensure_prototype(ctx, &fo)? {
        JsValue::Object(p) => Some(p),
        _ => None,
    };
    let instance = ctx.alloc_ordinary()?;
    if let JsValue::Object(o) = &instance {
        o.borrow_mut().as_js_object_mut().set_prototype_of(proto);
    }
    let result = call_function(ctx, f, instance.clone(), args)?;
    if result.is_object() {
        Ok(result)
    } else {
        Ok(instance)
    }
}

/// `value instanceof f`.
///
/// Script functions walk the prototype chain. Native constructors classify
/// by object kind, and error constructors by the error's `name`.
pub fn instance_of(ctx: &mut EvalContext, value: &JsValue, f: &JsValue) -> Result<bool, JErrorType> {
    let fo = match f {
        JsValue::Object(o) if o.borrow().is_callable() => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(
                "Right-hand side of 'instanceof' is not callable".to_string(),
            ))
        }
    };
    let obj = match value {
        JsValue::Object(o) => o.clone(),
        _ => return Ok(false),
    };
    if is_script_function(&fo) {
        let proto = match ensure_prototype(ctx, &fo)? {
            JsValue::Object(p) => p,
            _ => return Ok(false),
        };
        let mut current = obj.borrow().as_js_object().get_prototype_of();
        while let Some(p) = current {
            if Rc::ptr_eq(&p, &proto) {
                return Ok(true);
            }
            current = p.borrow().as_js_object().get_prototype_of();
        }
        return Ok(false);
    }
    let name = match &*fo.borrow() {
        ObjectType::Function(func) => func.name(),
        _ => String::new(),
    };
    let class = match &*obj.borrow() {
        ObjectType::Array(_) => "Array",
        ObjectType::Function(_) => "Function",
        ObjectType::Ordinary(o) if o.class() == ObjectClass::Error => "Error",
        ObjectType::Ordinary(_) => "Object",
    };
    Ok(match name.as_str() {
        "Object" => true,
        "Array" | "Function" | "Error" => class == name,
        n if n.ends_with("Error") => {
            class == "Error" && get(&obj, &PropertyKey::from("name")) == JsValue::String(name.clone())
        }
        _ => false,
    })
}
