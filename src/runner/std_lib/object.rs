//! Object built-in.
//!
//! Static helpers (`Object.keys` and friends) plus the methods every object
//! inherits, such as `hasOwnProperty`.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObject, JsObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{get, own_keys, set};
use crate::runner::ds::operations::type_conversion::{to_property_key, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::array::new_array;
use super::core::arg;

/// Register the Object built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let object = BuiltInObject::new("Object")
        .with_constructor(object_constructor)
        .add_method("keys", object_keys)
        .add_method("values", object_values)
        .add_method("entries", object_entries)
        .add_method("assign", object_assign)
        .add_prototype_method("hasOwnProperty", object_has_own_property)
        .add_prototype_method("toString", object_to_string)
        .add_prototype_method("valueOf", object_value_of);

    registry.register_object(object);
}

/// `Object(v)` returns objects unchanged and a fresh empty object otherwise.
fn object_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match args.into_iter().next() {
        Some(v @ JsValue::Object(_)) => Ok(v),
        _ => ctx.alloc_ordinary(),
    }
}

fn target_object(v: &JsValue, method: &str) -> Result<Option<JsObjectType>, JErrorType> {
    match v {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Object.{} called on null or undefined",
            method
        ))),
        JsValue::Object(o) => Ok(Some(o.clone())),
        _ => Ok(None),
    }
}

/// Enumerable string-keyed own properties, in enumeration order.
fn string_entries(o: &JsObjectType) -> Vec<(String, JsValue)> {
    own_keys(o)
        .into_iter()
        .filter_map(|k| match &k {
            PropertyKey::Str(s) => Some((s.clone(), get(o, &k))),
            PropertyKey::Sym(_) => None,
        })
        .collect()
}

/// Object.keys
fn object_keys(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let entries = match target_object(&arg(&args, 0), "keys")? {
        Some(o) => string_entries(&o),
        None => vec![],
    };
    new_array(ctx, entries.into_iter().map(|(k, _)| JsValue::String(k)).collect())
}

/// Object.values
fn object_values(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let entries = match target_object(&arg(&args, 0), "values")? {
        Some(o) => string_entries(&o),
        None => vec![],
    };
    new_array(ctx, entries.into_iter().map(|(_, v)| v).collect())
}

/// Object.entries - `[key, value]` pairs.
fn object_entries(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let entries = match target_object(&arg(&args, 0), "entries")? {
        Some(o) => string_entries(&o),
        None => vec![],
    };
    let mut pairs = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        pairs.push(new_array(ctx, vec![JsValue::String(k), v])?);
    }
    new_array(ctx, pairs)
}

/// Copies enumerable own properties of each source onto the target, left to right.
fn object_assign(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    let target_obj = match target_object(&target, "assign")? {
        Some(o) => o,
        None => return Ok(target),
    };
    for source in args.iter().skip(1) {
        if let JsValue::Object(src) = source {
            for key in own_keys(src) {
                let value = get(src, &key);
                if !set(&target_obj, key.clone(), value) {
                    return Err(JErrorType::TypeError(format!(
                        "Cannot assign to read only property '{}' of object",
                        key
                    )));
                }
            }
        }
    }
    Ok(target)
}

/// Object.prototype.hasOwnProperty
fn object_has_own_property(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let key = to_property_key(&arg(&args, 0));
    let has = match &this {
        JsValue::Object(o) => o.borrow().as_js_object().has_own_property(&key),
        JsValue::String(s) => {
            matches!(&key, PropertyKey::Str(k) if k == "length")
                || key.as_array_index().map_or(false, |i| i < s.chars().count())
        }
        JsValue::Undefined | JsValue::Null => {
            return Err(JErrorType::TypeError(
                "Cannot convert undefined or null to object".to_string(),
            ))
        }
        _ => false,
    };
    Ok(JsValue::Boolean(has))
}

/// Object.prototype.toString
fn object_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(to_string(&this)))
}

/// Object.prototype.valueOf - Returns the receiver.
fn object_value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(this)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::operations::object::array_elements;

    fn sample(ctx: &mut EvalContext) -> JsValue {
        let o = ctx.alloc_ordinary().unwrap();
        let obj = o.as_object().unwrap();
        set(obj, PropertyKey::from("b"), JsValue::Number(1.0));
        set(obj, PropertyKey::from("a"), JsValue::Number(2.0));
        o
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let mut ctx = EvalContext::new();
        let o = sample(&mut ctx);
        let keys = object_keys(&mut ctx, JsValue::Undefined, vec![o]).unwrap();
        assert_eq!(
            array_elements(&keys).unwrap(),
            vec![JsValue::from("b"), JsValue::from("a")]
        );
    }

    #[test]
    fn test_assign_copies_properties() {
        let mut ctx = EvalContext::new();
        let src = sample(&mut ctx);
        let target = ctx.alloc_ordinary().unwrap();
        let result = object_assign(&mut ctx, JsValue::Undefined, vec![target.clone(), src]).unwrap();
        assert_eq!(result, target);
        assert_eq!(
            get(target.as_object().unwrap(), &PropertyKey::from("a")),
            JsValue::Number(2.0)
        );
    }

    #[test]
    fn test_has_own_property() {
        let mut ctx = EvalContext::new();
        let o = sample(&mut ctx);
        let has = |ctx: &mut EvalContext, k: &str| {
            object_has_own_property(ctx, o.clone(), vec![JsValue::from(k)]).unwrap()
        };
        assert_eq!(has(&mut ctx, "a"), JsValue::Boolean(true));
        assert_eq!(has(&mut ctx, "zz"), JsValue::Boolean(false));
    }

    #[test]
    fn test_keys_of_null_is_type_error() {
        let mut ctx = EvalContext::new();
        assert!(object_keys(&mut ctx, JsValue::Undefined, vec![JsValue::Null]).is_err());
    }
}
