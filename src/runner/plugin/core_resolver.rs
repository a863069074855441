//! Core plugin resolver: wraps the `BuiltInRegistry` as a `PluginResolver`.

use std::rc::Rc;

use log::debug;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::object::{JsObject, ObjectType, OrdinaryObject};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::resolver::PluginResolver;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

/// Exposes every registry entry as a super-global name.
///
/// An entry with a constructor becomes a callable function object (`Array`,
/// `Error`); one without becomes a plain namespace object (`Math`, `console`).
/// Methods are attached as hidden function properties and static values as
/// read-only properties.
pub struct CorePluginResolver {
    registry: Rc<BuiltInRegistry>,
}

impl CorePluginResolver {
    pub fn new(registry: Rc<BuiltInRegistry>) -> Self {
        CorePluginResolver { registry }
    }

    pub fn registry(&self) -> &BuiltInRegistry {
        &self.registry
    }

    fn materialize(
        &self,
        builtin: &BuiltInObject,
        ctx: &mut EvalContext,
    ) -> Result<JsValue, JErrorType> {
        let mut object = match &builtin.constructor {
            Some(ctor) => ObjectType::Function(FunctionObject::new_native(&builtin.name, ctor.clone())),
            None => ObjectType::Ordinary(OrdinaryObject::new()),
        };
        for (name, func) in &builtin.methods {
            let f = ctx.alloc(ObjectType::Function(FunctionObject::new_native(
                name,
                func.clone(),
            )))?;
            object.as_js_object_mut().define_own_property(
                PropertyKey::from(name.as_str()),
                PropertyDescriptor::new_hidden(JsValue::Object(f)),
            );
        }
        for (name, value) in &builtin.properties {
            object.as_js_object_mut().define_own_property(
                PropertyKey::from(name.as_str()),
                PropertyDescriptor::new_read_only(value.clone()),
            );
        }
        Ok(JsValue::Object(ctx.alloc(object)?))
    }
}

impl PluginResolver for CorePluginResolver {
    fn has_binding(&self, name: &str) -> bool {
        self.registry.has_object(name) || self.registry.get_value(name).is_some()
    }

    fn resolve(&self, name: &str, ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
        if let Some(v) = self.registry.get_value(name) {
            return Ok(v.clone());
        }
        match self.registry.get_object(name) {
            Some(builtin) => {
                debug!("materializing built-in {}", name);
                self.materialize(builtin, ctx)
            }
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
        }
    }

    fn name(&self) -> &str {
        "core"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::operations::object::get;

    #[test]
    fn test_namespace_object_has_methods_and_constants() {
        let mut ctx = EvalContext::new();
        let resolver = CorePluginResolver::new(Rc::new(BuiltInRegistry::with_core()));
        let math = resolver.resolve("Math", &mut ctx).unwrap();
        let math = math.as_object().unwrap();
        assert!(get(math, &PropertyKey::from("abs")).is_callable());
        assert_eq!(
            get(math, &PropertyKey::from("PI")),
            JsValue::Number(std::f64::consts::PI)
        );
        assert!(math.borrow().as_js_object().own_property_keys().is_empty());
    }

    #[test]
    fn test_constructor_entry_is_callable() {
        let mut ctx = EvalContext::new();
        let resolver = CorePluginResolver::new(Rc::new(BuiltInRegistry::with_core()));
        assert!(resolver.resolve("Array", &mut ctx).unwrap().is_callable());
        assert!(resolver.resolve("undefined", &mut ctx).unwrap() == JsValue::Undefined);
        assert!(!resolver.has_binding("Nope"));
    }
}
