//! The embeddable runtime: one global environment, one heap, one configuration.

use std::rc::Rc;

use log::{debug, trace, warn};
use pest::error::{Error, LineColLocation};
use thiserror::Error as ThisError;

use crate::parser::{parse_to_ast, Rule};
use crate::runner::config::RuntimeConfig;
use crate::runner::ds::array_object::ArrayObject;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::heap::RuntimeId;
use crate::runner::ds::object::{JsObject, JsObjectType, ObjectType};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::evaluate_program;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::resolver::PluginResolver;
use crate::runner::plugin::types::{BuiltInFn, EvalContext};

/// Why an evaluation produced no value.
#[derive(Debug, Clone, ThisError)]
pub enum EvalError {
    /// The source did not parse.
    #[error("SyntaxError: {0}")]
    Syntax(String),
    /// The script threw and nothing caught it.
    #[error(transparent)]
    Exception(#[from] JErrorType),
}

/// Lifecycle of the most recent evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationState {
    Ready,
    Running,
    Completed,
    Threw,
}

pub struct Runtime {
    ctx: EvalContext,
    config: RuntimeConfig,
    state: EvaluationState,
}

fn describe_syntax_error(e: &Error<Rule>) -> String {
    let (line, column) = match e.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    format!("{} at line {}, column {}", e.variant.message(), line, column)
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let mut ctx = EvalContext::with_config(config.heap.clone(), config.limits());
        if config.builtins {
            ctx.install_core_builtins(BuiltInRegistry::with_core());
        }
        debug!("runtime {} created", ctx.runtime_id);
        Runtime {
            ctx,
            config,
            state: EvaluationState::Ready,
        }
    }

    pub fn id(&self) -> RuntimeId {
        self.ctx.runtime_id
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn state(&self) -> EvaluationState {
        self.state
    }

    /// Parses and runs `source` against this runtime's globals. The result is
    /// the completion value of the last value-producing statement.
    pub fn eval(&mut self, source: &str) -> Result<JsValue, EvalError> {
        debug!("runtime {}: evaluating {} bytes", self.ctx.runtime_id, source.len());
        self.state = EvaluationState::Running;
        let result = match parse_to_ast(source) {
            Ok(program) => {
                self.ctx.reset_for_evaluation();
                evaluate_program(&program, &mut self.ctx).map_err(EvalError::from)
            }
            Err(e) => Err(EvalError::Syntax(describe_syntax_error(&e))),
        };
        self.state = match &result {
            Ok(_) => EvaluationState::Completed,
            Err(e) => {
                debug!("runtime {}: evaluation failed: {}", self.ctx.runtime_id, e);
                EvaluationState::Threw
            }
        };
        result
    }

    /// True when `value` is a primitive, an unowned object, or an object of
    /// this runtime.
    pub fn owns(&self, value: &JsValue) -> bool {
        match value {
            JsValue::Object(o) => o
                .borrow()
                .as_js_object()
                .owner()
                .map_or(true, |id| id == self.ctx.runtime_id),
            _ => true,
        }
    }

    /// Takes ownership of an unowned object. Fails for objects of another runtime.
    pub fn adopt(&mut self, value: &JsValue) -> bool {
        if !self.owns(value) {
            warn!(
                "runtime {}: rejected value owned by another runtime",
                self.ctx.runtime_id
            );
            return false;
        }
        if let JsValue::Object(o) = value {
            if o.borrow().as_js_object().owner().is_none() {
                o.borrow_mut().as_js_object_mut().set_owner(self.ctx.runtime_id);
                self.ctx.heap.adopt(o);
            }
        }
        true
    }

    /// Creates or overwrites a global binding.
    pub fn set_global(&mut self, name: &str, value: JsValue) -> bool {
        if !self.adopt(&value) {
            return false;
        }
        trace!("runtime {}: set global {}", self.ctx.runtime_id, name);
        self.ctx.set_global(name, value);
        true
    }

    /// A missing global reads as undefined.
    pub fn get_global(&self, name: &str) -> JsValue {
        self.ctx.get_global(name).unwrap_or(JsValue::Undefined)
    }

    /// Exposes a host closure to scripts as a global function.
    pub fn register_function<F>(&mut self, name: &str, f: F) -> Result<(), JErrorType>
    where
        F: Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType> + 'static,
    {
        let func = FunctionObject::new_native(name, BuiltInFn::Plugin(Rc::new(f)));
        let value = JsValue::Object(self.ctx.alloc(ObjectType::Function(func))?);
        debug!("runtime {}: registered host function {}", self.ctx.runtime_id, name);
        self.ctx.set_global(name, value);
        Ok(())
    }

    /// Adds a resolver to the super-global scope.
    pub fn add_resolver(&mut self, resolver: Box<dyn PluginResolver>) {
        self.ctx.add_resolver(resolver);
    }

    pub fn new_object(&mut self) -> Result<JsValue, JErrorType> {
        self.ctx.alloc_ordinary()
    }

    pub fn new_array(&mut self, elements: Vec<JsValue>) -> Result<JsValue, JErrorType> {
        let a: JsObjectType = self
            .ctx
            .alloc(ObjectType::Array(ArrayObject::from_list(elements)))?;
        Ok(JsValue::Object(a))
    }

    /// Objects on this runtime's heap that are still referenced.
    pub fn live_objects(&mut self) -> usize {
        self.ctx.heap.live_objects()
    }

    pub fn context_mut(&mut self) -> &mut EvalContext {
        &mut self.ctx
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        debug!("runtime {} dropped", self.ctx.runtime_id);
        self.ctx.super_global.borrow_mut().clear_cache();
        self.ctx.heap.teardown();
    }
}
