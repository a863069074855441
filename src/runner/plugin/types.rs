//! Core types for the plugin architecture.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

use crate::runner::ds::env_record::EnvironmentRecord;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::heap::{Heap, HeapConfig, RuntimeId};
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{JsObjectType, ObjectType, OrdinaryObject};
use crate::runner::ds::operations::lex_env::{
    get_identifier_reference, new_declarative_environment, new_global_environment,
};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_function;
use crate::runner::plugin::core_resolver::CorePluginResolver;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::resolver::PluginResolver;
use crate::runner::plugin::super_global::SuperGlobalEnvironment;

/// Shared handle to the super-global environment.
pub type SharedSuperGlobal = Rc<RefCell<SuperGlobalEnvironment>>;

/// Bounds applied to a single evaluation.
#[derive(Debug, Clone)]
pub struct ExecutionLimits {
    pub max_call_depth: usize,
    pub max_steps: Option<u64>,
    /// Assigning an undeclared name creates a global instead of throwing.
    pub implicit_globals: bool,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        ExecutionLimits {
            max_call_depth: 1000,
            max_steps: None,
            implicit_globals: false,
        }
    }
}

/// Execution state shared by the evaluator and every native function.
pub struct EvalContext {
    pub runtime_id: RuntimeId,
    pub global_env: JsLexEnvironmentType,
    /// Innermost environment of the code currently running.
    pub lex_env: JsLexEnvironmentType,
    pub this_value: JsValue,
    pub heap: Heap,
    pub super_global: SharedSuperGlobal,
    pub limits: ExecutionLimits,
    registry: Option<Rc<BuiltInRegistry>>,
    /// Function objects built for prototype methods, keyed by "Class.name".
    method_cache: HashMap<String, JsValue>,
    call_depth: usize,
    steps: u64,
    budget_exhausted: bool,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::with_config(HeapConfig::default(), ExecutionLimits::default())
    }

    pub fn with_config(heap_config: HeapConfig, limits: ExecutionLimits) -> Self {
        let global_env = new_global_environment();
        let mut heap = Heap::new(heap_config);
        heap.track_environment(&global_env);
        EvalContext {
            runtime_id: RuntimeId::new(),
            lex_env: global_env.clone(),
            global_env,
            this_value: JsValue::Undefined,
            heap,
            super_global: Rc::new(RefCell::new(SuperGlobalEnvironment::new())),
            limits,
            registry: None,
            method_cache: HashMap::new(),
            call_depth: 0,
            steps: 0,
            budget_exhausted: false,
        }
    }

    /// Makes the core built-ins resolvable: first as super-global names, then
    /// as prototype methods of primitives, arrays and objects.
    pub fn install_core_builtins(&mut self, registry: BuiltInRegistry) {
        let registry = Rc::new(registry);
        self.registry = Some(registry.clone());
        self.add_resolver(Box::new(CorePluginResolver::new(registry)));
    }

    pub fn registry(&self) -> Option<&Rc<BuiltInRegistry>> {
        self.registry.as_ref()
    }

    /// Register a plugin resolver with the super-global scope.
    pub fn add_resolver(&mut self, resolver: Box<dyn PluginResolver>) {
        self.super_global.borrow_mut().add_resolver(resolver);
    }

    /// Moves `object` onto this runtime's heap and tags it with the runtime id.
    pub fn alloc(&mut self, object: ObjectType) -> Result<JsObjectType, JErrorType> {
        let o = self.heap.allocate(object)?;
        o.borrow_mut().as_js_object_mut().set_owner(self.runtime_id);
        Ok(o)
    }

    pub fn alloc_ordinary(&mut self) -> Result<JsValue, JErrorType> {
        Ok(JsValue::Object(
            self.alloc(ObjectType::Ordinary(OrdinaryObject::new()))?,
        ))
    }

    /// Error object for an internal error, as seen by a `catch` clause.
    pub fn error_to_value(&mut self, error: JErrorType) -> Result<JsValue, JErrorType> {
        match error {
            JErrorType::Thrown(v) => Ok(v),
            e => {
                let o = OrdinaryObject::new_error(e.name(), &e.message());
                Ok(JsValue::Object(self.alloc(ObjectType::Ordinary(o))?))
            }
        }
    }

    /// Starts tracking a new block or call environment.
    pub fn new_declarative_env(&mut self, outer: JsLexEnvironmentType) -> JsLexEnvironmentType {
        let env = new_declarative_environment(Some(outer));
        self.heap.track_environment(&env);
        env
    }

    /// Resolves `name` through the scope chain and then the super-global scope.
    pub fn get_binding(&mut self, name: &str) -> Result<JsValue, JErrorType> {
        if let Some(env) = get_identifier_reference(&self.lex_env, name) {
            let value = env.borrow().inner.as_env_record().get_binding_value(name);
            return value;
        }
        self.resolve_super_global(name)
    }

    /// True when `name` resolves anywhere, including the super-global scope.
    pub fn has_binding(&self, name: &str) -> bool {
        get_identifier_reference(&self.lex_env, name).is_some()
            || self.super_global.borrow().has_name(name)
    }

    pub fn resolve_super_global(&mut self, name: &str) -> Result<JsValue, JErrorType> {
        let sg = self.super_global.clone();
        let value = sg.borrow_mut().resolve_binding(name, self);
        value
    }

    /// Assigns to an existing binding. Undeclared names are a ReferenceError
    /// unless implicit globals are enabled.
    pub fn set_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        if let Some(env) = get_identifier_reference(&self.lex_env, name) {
            trace!("set binding {}", name);
            let result = env.borrow_mut().inner.as_env_record_mut().set_mutable_binding(name, value);
            return result;
        }
        if self.super_global.borrow().has_name(name) {
            return Err(JErrorType::TypeError(
                "Assignment to constant variable.".to_string(),
            ));
        }
        if self.limits.implicit_globals {
            trace!("implicit global {}", name);
            self.set_global(name, value);
            Ok(())
        } else {
            Err(JErrorType::ReferenceError(format!("{} is not defined", name)))
        }
    }

    pub fn set_global(&mut self, name: &str, value: JsValue) {
        use crate::runner::ds::env_record::EnvironmentRecordType;
        if let EnvironmentRecordType::Global(g) = &mut self.global_env.borrow_mut().inner {
            g.set_global(name, value);
        }
    }

    pub fn get_global(&self, name: &str) -> Option<JsValue> {
        use crate::runner::ds::env_record::EnvironmentRecordType;
        match &self.global_env.borrow().inner {
            EnvironmentRecordType::Global(g) => g.get_global(name),
            EnvironmentRecordType::Declarative(_) => None,
        }
    }

    /// Function object for a built-in prototype method such as
    /// `Array.prototype.push`, created once and then cached.
    pub fn get_prototype_method(
        &mut self,
        class: &str,
        name: &str,
    ) -> Result<Option<JsValue>, JErrorType> {
        let cache_key = format!("{}.{}", class, name);
        if let Some(v) = self.method_cache.get(&cache_key) {
            return Ok(Some(v.clone()));
        }
        let func = match self
            .registry
            .as_ref()
            .and_then(|r| r.get_prototype_method(class, name))
        {
            Some(f) => f.clone(),
            None => return Ok(None),
        };
        let f = self.alloc(ObjectType::Function(FunctionObject::new_native(name, func)))?;
        let value = JsValue::Object(f);
        self.method_cache.insert(cache_key, value.clone());
        Ok(Some(value))
    }

    /// Calls any callable value. Used by built-ins that take callbacks.
    pub fn call_function(
        &mut self,
        f: &JsValue,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, JErrorType> {
        call_function(self, f, this, args)
    }

    pub fn enter_call(&mut self) -> Result<(), JErrorType> {
        if self.call_depth >= self.limits.max_call_depth {
            return Err(JErrorType::RangeError(
                "Maximum call stack size exceeded".to_string(),
            ));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    /// Counts one unit of work against the step budget.
    pub fn tick(&mut self) -> Result<(), JErrorType> {
        self.steps += 1;
        if let Some(max) = self.limits.max_steps {
            if self.steps > max {
                self.budget_exhausted = true;
                return Err(JErrorType::RangeError(
                    "Execution step limit exceeded".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Once the step budget runs out, `catch` and `finally` no longer run.
    pub fn is_budget_exhausted(&self) -> bool {
        self.budget_exhausted
    }

    /// Clears per-evaluation counters before a new top-level evaluation.
    pub fn reset_for_evaluation(&mut self) {
        self.steps = 0;
        self.call_depth = 0;
        self.budget_exhausted = false;
        self.lex_env = self.global_env.clone();
        self.this_value = JsValue::Undefined;
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Function signature for built-in methods.
/// Native functions receive the evaluation context, `this` value, and arguments.
pub type NativeFn =
    fn(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType>;

/// Boxed closure form of a built-in, used for host-registered functions.
pub type PluginFn = Rc<dyn Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType>>;

/// Built-in function - either compiled-in or plugin-provided.
#[derive(Clone)]
pub enum BuiltInFn {
    /// Direct function pointer - zero overhead for compiled-in functions.
    Native(NativeFn),

    /// Plugin-provided function, such as a host callback.
    Plugin(PluginFn),
}

impl BuiltInFn {
    /// Execute this built-in function.
    pub fn call(
        &self,
        ctx: &mut EvalContext,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, JErrorType> {
        match self {
            BuiltInFn::Native(f) => f(ctx, this, args),
            BuiltInFn::Plugin(f) => f(ctx, this, args),
        }
    }
}

/// Built-in object definition.
/// Represents a built-in object like Array, Object, String, Math.
pub struct BuiltInObject {
    /// Name of the object (e.g., "Array", "Object", "Math").
    pub name: String,

    /// Methods defined on the object itself, like `Math.abs` or `Object.keys`.
    pub methods: HashMap<String, BuiltInFn>,

    /// Methods reachable from instances, like `[].push` or `"".trim`.
    pub prototype_methods: HashMap<String, BuiltInFn>,

    /// Static properties.
    pub properties: HashMap<String, JsValue>,

    /// Constructor function, if this object is callable.
    pub constructor: Option<BuiltInFn>,
}

impl BuiltInObject {
    /// Create a new built-in object with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        BuiltInObject {
            name: name.into(),
            methods: HashMap::new(),
            prototype_methods: HashMap::new(),
            properties: HashMap::new(),
            constructor: None,
        }
    }

    /// Add a native method.
    pub fn add_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.methods.insert(name.into(), BuiltInFn::Native(func));
        self
    }

    /// Add a method available on instances.
    pub fn add_prototype_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.prototype_methods
            .insert(name.into(), BuiltInFn::Native(func));
        self
    }

    /// Add a property.
    pub fn add_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Set the constructor function.
    pub fn with_constructor(mut self, constructor: NativeFn) -> Self {
        self.constructor = Some(BuiltInFn::Native(constructor));
        self
    }
}

