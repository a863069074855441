use std::rc::Rc;

use crate::parser::ast::FunctionData;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{JsObject, ObjectBase};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::BuiltInFn;

/// What runs when a function object is called. Cloned out of the object
/// before the call so the callee may freely mutate its own properties.
#[derive(Clone)]
pub enum FunctionKind {
    Script {
        data: Rc<FunctionData>,
        env: JsLexEnvironmentType,
        /// Present for arrow functions, which reuse the `this` of their definition site.
        lexical_this: Option<JsValue>,
    },
    Native {
        name: String,
        func: BuiltInFn,
    },
}

pub struct FunctionObject {
    base: ObjectBase,
    kind: FunctionKind,
}

impl FunctionObject {
    pub fn new_script(
        data: Rc<FunctionData>,
        env: JsLexEnvironmentType,
        lexical_this: Option<JsValue>,
    ) -> Self {
        let mut base = ObjectBase::new();
        let name = data.id.as_ref().map(|i| i.name.clone()).unwrap_or_default();
        base.insert(
            PropertyKey::from("name"),
            PropertyDescriptor::new_read_only(JsValue::String(name)),
        );
        base.insert(
            PropertyKey::from("length"),
            PropertyDescriptor::new_read_only(JsValue::Number(data.params.len() as f64)),
        );
        FunctionObject {
            base,
            kind: FunctionKind::Script {
                data,
                env,
                lexical_this,
            },
        }
    }

    pub fn new_native(name: &str, func: BuiltInFn) -> Self {
        let mut base = ObjectBase::new();
        base.insert(
            PropertyKey::from("name"),
            PropertyDescriptor::new_read_only(JsValue::String(name.to_string())),
        );
        base.insert(
            PropertyKey::from("length"),
            PropertyDescriptor::new_read_only(JsValue::Number(0.0)),
        );
        FunctionObject {
            base,
            kind: FunctionKind::Native {
                name: name.to_string(),
                func,
            },
        }
    }

    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    pub fn name(&self) -> String {
        match &self.kind {
            FunctionKind::Script { data, .. } => {
                data.id.as_ref().map(|i| i.name.clone()).unwrap_or_default()
            }
            FunctionKind::Native { name, .. } => name.clone(),
        }
    }

    pub fn is_arrow(&self) -> bool {
        matches!(&self.kind, FunctionKind::Script { data, .. } if data.is_arrow)
    }

    /// Arrow functions cannot be used with `new`; everything else can.
    pub fn is_constructor(&self) -> bool {
        !self.is_arrow()
    }

    /// Text produced when a function is converted to a string.
    pub fn source_text(&self) -> String {
        match &self.kind {
            FunctionKind::Native { name, .. } => {
                format!("function {}() {{ [native code] }}", name)
            }
            FunctionKind::Script { data, .. } => {
                let params = data
                    .params
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                if data.is_arrow {
                    format!("({}) => {{ ... }}", params)
                } else {
                    format!("function {}({}) {{ ... }}", self.name(), params)
                }
            }
        }
    }
}

impl JsObject for FunctionObject {
    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::error::JErrorType;
    use crate::runner::plugin::types::EvalContext;

    fn answer(
        _ctx: &mut EvalContext,
        _this: JsValue,
        _args: Vec<JsValue>,
    ) -> Result<JsValue, JErrorType> {
        Ok(JsValue::Number(42.0))
    }

    #[test]
    fn test_native_function_metadata() {
        let f = FunctionObject::new_native("answer", BuiltInFn::Native(answer));
        assert_eq!(f.name(), "answer");
        assert!(f.is_constructor());
        assert_eq!(f.source_text(), "function answer() { [native code] }");
        assert_eq!(
            f.get_own_property(&PropertyKey::from("name")),
            Some(JsValue::String("answer".to_string()))
        );
        assert!(f.own_property_keys().is_empty());
    }
}
