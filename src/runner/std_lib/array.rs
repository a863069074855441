//! Array built-in.
//!
//! Provides the Array constructor, `Array.isArray` and the methods reachable
//! from array instances.

use crate::runner::ds::array_object::ArrayObject;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::object_property::{MAX_ARRAY_LENGTH, MAX_DENSE_GROWTH};
use crate::runner::ds::operations::object::array_elements;
use crate::runner::ds::operations::test_and_comparison::{
    same_value_zero, strict_equality_comparison,
};
use crate::runner::ds::operations::type_conversion::{to_boolean, to_display_string, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::{arg, relative_index};

/// Register the Array built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let array = BuiltInObject::new("Array")
        .with_constructor(array_constructor)
        .add_method("isArray", is_array)
        .add_prototype_method("push", array_push)
        .add_prototype_method("pop", array_pop)
        .add_prototype_method("shift", array_shift)
        .add_prototype_method("unshift", array_unshift)
        .add_prototype_method("join", array_join)
        .add_prototype_method("toString", array_to_string)
        .add_prototype_method("indexOf", array_index_of)
        .add_prototype_method("includes", array_includes)
        .add_prototype_method("slice", array_slice)
        .add_prototype_method("concat", array_concat)
        .add_prototype_method("reverse", array_reverse)
        .add_prototype_method("forEach", array_for_each)
        .add_prototype_method("map", array_map)
        .add_prototype_method("filter", array_filter)
        .add_prototype_method("find", array_find)
        .add_prototype_method("some", array_some)
        .add_prototype_method("every", array_every)
        .add_prototype_method("reduce", array_reduce);

    registry.register_object(array);
}

fn invalid_length() -> JErrorType {
    JErrorType::RangeError("Invalid array length".to_string())
}

/// The receiver and a snapshot of its elements, or a TypeError when it is
/// not an array.
fn this_array(this: &JsValue, method: &str) -> Result<(JsObjectType, Vec<JsValue>), JErrorType> {
    match (this, array_elements(this)) {
        (JsValue::Object(o), Some(elements)) => Ok((o.clone(), elements)),
        _ => Err(JErrorType::TypeError(format!(
            "Array.prototype.{} called on non-array",
            method
        ))),
    }
}

fn with_array<R>(o: &JsObjectType, f: impl FnOnce(&mut ArrayObject) -> R) -> Option<R> {
    match &mut *o.borrow_mut() {
        ObjectType::Array(a) => Some(f(a)),
        _ => None,
    }
}

/// A new array owned by the current runtime.
pub(crate) fn new_array(ctx: &mut EvalContext, elements: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    if elements.len() > MAX_ARRAY_LENGTH {
        return Err(invalid_length());
    }
    Ok(JsValue::Object(
        ctx.alloc(ObjectType::Array(ArrayObject::from_list(elements)))?,
    ))
}

/// `Array(n)` makes `n` undefined slots; any other argument list becomes the elements.
fn array_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if let [JsValue::Number(n)] = args.as_slice() {
        let n = *n;
        if n < 0.0 || n.fract() != 0.0 || n > MAX_DENSE_GROWTH as f64 {
            return Err(invalid_length());
        }
        return new_array(ctx, vec![JsValue::Undefined; n as usize]);
    }
    new_array(ctx, args)
}

/// Array.isArray - Check if value is an array.
fn is_array(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(arg(&args, 0).is_array()))
}

/// Array.prototype.push
fn array_push(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (o, _) = this_array(&this, "push")?;
    let len = with_array(&o, |a| {
        for v in args {
            if !a.push(v) {
                return None;
            }
        }
        Some(a.len())
    })
    .flatten()
    .ok_or_else(invalid_length)?;
    Ok(JsValue::Number(len as f64))
}

/// Array.prototype.pop
fn array_pop(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (o, _) = this_array(&this, "pop")?;
    Ok(with_array(&o, |a| a.pop()).flatten().unwrap_or(JsValue::Undefined))
}

/// Swaps in a new element list, returning the new length.
fn replace_elements(o: &JsObjectType, elements: Vec<JsValue>) -> usize {
    with_array(o, |a| {
        *a = ArrayObject::from_list(elements);
        a.len()
    })
    .unwrap_or(0)
}

/// Array.prototype.shift
fn array_shift(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (o, mut elements) = this_array(&this, "shift")?;
    if elements.is_empty() {
        return Ok(JsValue::Undefined);
    }
    let first = elements.remove(0);
    replace_elements(&o, elements);
    Ok(first)
}

/// Array.prototype.unshift
fn array_unshift(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (o, elements) = this_array(&this, "unshift")?;
    if elements.len() + args.len() > MAX_ARRAY_LENGTH {
        return Err(invalid_length());
    }
    let mut combined = args;
    combined.extend(elements);
    Ok(JsValue::Number(replace_elements(&o, combined) as f64))
}

/// Joins elements the way `join` does: null and undefined become empty.
pub(crate) fn join_values(elements: &[JsValue], separator: &str) -> String {
    elements
        .iter()
        .map(|e| if e.is_nullish() { String::new() } else { to_string(e) })
        .collect::<Vec<_>>()
        .join(separator)
}

/// Array.prototype.join
fn array_join(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (_, elements) = this_array(&this, "join")?;
    let separator = match arg(&args, 0) {
        JsValue::Undefined => ",".to_string(),
        s => to_string(&s),
    };
    Ok(JsValue::String(join_values(&elements, &separator)))
}

/// Array.prototype.toString - Same as `join()` with a comma.
fn array_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(to_string(&this)))
}

/// Array.prototype.indexOf
fn array_index_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (_, elements) = this_array(&this, "indexOf")?;
    let target = arg(&args, 0);
    let start = relative_index(&arg(&args, 1), elements.len(), 0);
    let found = elements
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, e)| strict_equality_comparison(e, &target))
        .map(|(i, _)| i as f64)
        .unwrap_or(-1.0);
    Ok(JsValue::Number(found))
}

/// Array.prototype.includes - Uses SameValueZero, so `NaN` is found.
fn array_includes(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (_, elements) = this_array(&this, "includes")?;
    let target = arg(&args, 0);
    let start = relative_index(&arg(&args, 1), elements.len(), 0);
    Ok(JsValue::Boolean(
        elements[start..].iter().any(|e| same_value_zero(e, &target)),
    ))
}

/// Array.prototype.slice
fn array_slice(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (_, elements) = this_array(&this, "slice")?;
    let len = elements.len();
    let start = relative_index(&arg(&args, 0), len, 0);
    let end = relative_index(&arg(&args, 1), len, len);
    let slice = if start < end {
        elements[start..end].to_vec()
    } else {
        vec![]
    };
    new_array(ctx, slice)
}

/// Array.prototype.concat
fn array_concat(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (_, mut elements) = this_array(&this, "concat")?;
    for a in args {
        match array_elements(&a) {
            Some(more) => elements.extend(more),
            None => elements.push(a),
        }
    }
    new_array(ctx, elements)
}

/// Array.prototype.reverse
fn array_reverse(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (o, mut elements) = this_array(&this, "reverse")?;
    elements.reverse();
    replace_elements(&o, elements);
    Ok(this)
}

/// The callback argument of the iteration methods.
fn callback_arg(args: &[JsValue]) -> Result<JsValue, JErrorType> {
    let cb = arg(args, 0);
    if cb.is_callable() {
        Ok(cb)
    } else {
        Err(JErrorType::TypeError(format!(
            "{} is not a function",
            to_display_string(&cb)
        )))
    }
}

/// Calls `cb(element, index, array)` for each element until `visit` returns false.
fn each_element(
    ctx: &mut EvalContext,
    this: &JsValue,
    args: &[JsValue],
    method: &str,
    mut visit: impl FnMut(&JsValue, JsValue) -> bool,
) -> Result<(), JErrorType> {
    let (_, elements) = this_array(this, method)?;
    let cb = callback_arg(args)?;
    let this_arg = arg(args, 1);
    for (i, e) in elements.into_iter().enumerate() {
        let result = ctx.call_function(
            &cb,
            this_arg.clone(),
            vec![e.clone(), JsValue::Number(i as f64), this.clone()],
        )?;
        if !visit(&e, result) {
            break;
        }
    }
    Ok(())
}

/// Array.prototype.forEach
fn array_for_each(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    each_element(ctx, &this, &args, "forEach", |_, _| true)?;
    Ok(JsValue::Undefined)
}

/// Array.prototype.map
fn array_map(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut out = vec![];
    each_element(ctx, &this, &args, "map", |_, r| {
        out.push(r);
        true
    })?;
    new_array(ctx, out)
}

/// Array.prototype.filter
fn array_filter(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut out = vec![];
    each_element(ctx, &this, &args, "filter", |e, r| {
        if to_boolean(&r) {
            out.push(e.clone());
        }
        true
    })?;
    new_array(ctx, out)
}

/// Array.prototype.find
fn array_find(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut found = JsValue::Undefined;
    each_element(ctx, &this, &args, "find", |e, r| {
        if to_boolean(&r) {
            found = e.clone();
            false
        } else {
            true
        }
    })?;
    Ok(found)
}

/// Array.prototype.some
fn array_some(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut any = false;
    each_element(ctx, &this, &args, "some", |_, r| {
        any = to_boolean(&r);
        !any
    })?;
    Ok(JsValue::Boolean(any))
}

/// Array.prototype.every
fn array_every(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut all = true;
    each_element(ctx, &this, &args, "every", |_, r| {
        all = to_boolean(&r);
        all
    })?;
    Ok(JsValue::Boolean(all))
}

/// Array.prototype.reduce
fn array_reduce(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (_, elements) = this_array(&this, "reduce")?;
    let cb = callback_arg(&args)?;
    let mut items = elements.into_iter().enumerate();
    let mut acc = if args.len() >= 2 {
        args[1].clone()
    } else {
        match items.next() {
            Some((_, first)) => first,
            None => {
                return Err(JErrorType::TypeError(
                    "Reduce of empty array with no initial value".to_string(),
                ))
            }
        }
    };
    for (i, e) in items {
        acc = ctx.call_function(
            &cb,
            JsValue::Undefined,
            vec![acc, e, JsValue::Number(i as f64), this.clone()],
        )?;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array_of(ctx: &mut EvalContext, values: &[f64]) -> JsValue {
        new_array(ctx, values.iter().map(|n| JsValue::Number(*n)).collect()).unwrap()
    }

    #[test]
    fn test_push_and_pop() {
        let mut ctx = EvalContext::new();
        let a = array_of(&mut ctx, &[1.0]);
        let len = array_push(&mut ctx, a.clone(), vec![JsValue::Number(2.0)]).unwrap();
        assert_eq!(len, JsValue::Number(2.0));
        assert_eq!(array_pop(&mut ctx, a.clone(), vec![]).unwrap(), JsValue::Number(2.0));
        assert_eq!(array_elements(&a).unwrap(), vec![JsValue::Number(1.0)]);
    }

    #[test]
    fn test_join_and_slice() {
        let mut ctx = EvalContext::new();
        let a = array_of(&mut ctx, &[1.0, 2.0, 3.0]);
        assert_eq!(
            array_join(&mut ctx, a.clone(), vec![JsValue::from("-")]).unwrap(),
            JsValue::from("1-2-3")
        );
        let s = array_slice(&mut ctx, a, vec![JsValue::Number(-2.0)]).unwrap();
        assert_eq!(
            array_elements(&s).unwrap(),
            vec![JsValue::Number(2.0), JsValue::Number(3.0)]
        );
    }

    #[test]
    fn test_index_of_uses_strict_equality() {
        let mut ctx = EvalContext::new();
        let a = new_array(&mut ctx, vec![JsValue::from("1"), JsValue::Number(f64::NAN)]).unwrap();
        let idx = |ctx: &mut EvalContext, v: JsValue| array_index_of(ctx, a.clone(), vec![v]).unwrap();
        assert_eq!(idx(&mut ctx, JsValue::Number(1.0)), JsValue::Number(-1.0));
        assert_eq!(idx(&mut ctx, JsValue::from("1")), JsValue::Number(0.0));
        assert_eq!(idx(&mut ctx, JsValue::Number(f64::NAN)), JsValue::Number(-1.0));
        assert_eq!(
            array_includes(&mut ctx, a.clone(), vec![JsValue::Number(f64::NAN)]).unwrap(),
            JsValue::Boolean(true)
        );
    }

    #[test]
    fn test_constructor_length() {
        let mut ctx = EvalContext::new();
        let a = array_constructor(&mut ctx, JsValue::Undefined, vec![JsValue::Number(3.0)]).unwrap();
        assert_eq!(array_elements(&a).unwrap().len(), 3);
        assert!(array_constructor(&mut ctx, JsValue::Undefined, vec![JsValue::Number(-1.0)]).is_err());
    }

    #[test]
    fn test_method_on_non_array_is_type_error() {
        let mut ctx = EvalContext::new();
        assert!(matches!(
            array_push(&mut ctx, JsValue::Number(1.0), vec![]),
            Err(JErrorType::TypeError(_))
        ));
    }
}
