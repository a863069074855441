//! Expression evaluation.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::parser::ast::{
    BinaryOperator, ExpressionType, LiteralType, LogicalOperator, MemberExpressionType,
    PropertyData, PropertyKeyType, UnaryOperator, UpdateOperator,
};
use crate::runner::ds::array_object::ArrayObject;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::object_property::{PropertyKey, MAX_ARRAY_LENGTH};
use crate::runner::ds::operations::object::{get, has_property, set};
use crate::runner::ds::operations::test_and_comparison::{
    abstract_equality_comparison, compare_values, strict_equality_comparison,
};
use crate::runner::ds::operations::type_conversion::{
    to_boolean, to_int32, to_number, to_primitive, to_property_key, to_string, to_uint32, type_of,
    TYPE_STR_UNDEFINED,
};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::function::{
    call_function, construct, ensure_prototype, instance_of, instantiate_function,
    instantiate_named_function_expression, is_script_function,
};
use super::types::{Reference, ValueResult};
use super::{STACK_RED_ZONE, STACK_SEGMENT_SIZE};

const MIXED_BIGINT: &str = "Cannot mix BigInt and other types, use explicit conversions";
const MAX_BIGINT_SHIFT: i64 = 1 << 20;

/// Evaluate an expression and return its value.
pub fn evaluate_expression(expr: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || {
        evaluate_expression_inner(expr, ctx)
    })
}

fn evaluate_expression_inner(expr: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    match expr {
        ExpressionType::Literal(lit) => Ok(match &lit.value {
            LiteralType::NullLiteral => JsValue::Null,
            LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
            LiteralType::StringLiteral(s) => JsValue::String(s.clone()),
            LiteralType::NumberLiteral(n) => JsValue::Number(*n),
            LiteralType::BigIntLiteral(b) => JsValue::BigInt(b.clone()),
        }),
        ExpressionType::Identifier(id) => match ctx.get_binding(&id.name) {
            Err(JErrorType::ReferenceError(_))
                if id.name == "undefined" && !ctx.has_binding(&id.name) =>
            {
                Ok(JsValue::Undefined)
            }
            result => result,
        },
        ExpressionType::ThisExpression { .. } => Ok(ctx.this_value.clone()),
        ExpressionType::ArrayExpression { elements, .. } => {
            let values = evaluate_arguments(elements, ctx)?;
            if values.len() > MAX_ARRAY_LENGTH {
                return Err(JErrorType::RangeError("Invalid array length".to_string()));
            }
            let array = ctx.alloc(ObjectType::Array(ArrayObject::from_list(values)))?;
            Ok(JsValue::Object(array))
        }
        ExpressionType::ObjectExpression { properties, .. } => {
            evaluate_object_literal(properties, ctx)
        }
        ExpressionType::FunctionExpression(data) => {
            instantiate_named_function_expression(data, ctx)
        }
        ExpressionType::ArrowFunctionExpression(data) => instantiate_function(data, ctx),
        ExpressionType::UnaryExpression {
            operator, argument, ..
        } => evaluate_unary_expression(*operator, argument, ctx),
        ExpressionType::UpdateExpression {
            operator,
            argument,
            prefix,
            ..
        } => {
            let reference = evaluate_reference(argument, ctx)?;
            let old = to_numeric(&get_reference_value(ctx, &reference)?)?;
            let delta = match operator {
                UpdateOperator::PlusPlus => 1,
                UpdateOperator::MinusMinus => -1,
            };
            let new = match &old {
                Numeric::Number(n) => Numeric::Number(n + delta as f64),
                Numeric::BigInt(b) => Numeric::BigInt(b + BigInt::from(delta)),
            };
            put_reference_value(ctx, reference, new.clone().into_value())?;
            Ok(if *prefix { new } else { old }.into_value())
        }
        ExpressionType::BinaryExpression {
            operator,
            left,
            right,
            ..
        } => {
            let l = evaluate_expression(left, ctx)?;
            let r = evaluate_expression(right, ctx)?;
            apply_binary_operator(ctx, *operator, &l, &r)
        }
        ExpressionType::LogicalExpression {
            operator,
            left,
            right,
            ..
        } => {
            let l = evaluate_expression(left, ctx)?;
            let short_circuit = match operator {
                LogicalOperator::And => !to_boolean(&l),
                LogicalOperator::Or => to_boolean(&l),
                LogicalOperator::NullishCoalescing => !l.is_nullish(),
            };
            if short_circuit {
                Ok(l)
            } else {
                evaluate_expression(right, ctx)
            }
        }
        ExpressionType::AssignmentExpression {
            operator,
            left,
            right,
            ..
        } => {
            let reference = evaluate_reference(left, ctx)?;
            let value = match operator.binary_operator() {
                None => evaluate_expression(right, ctx)?,
                Some(op) => {
                    let current = get_reference_value(ctx, &reference)?;
                    let r = evaluate_expression(right, ctx)?;
                    apply_binary_operator(ctx, op, &current, &r)?
                }
            };
            put_reference_value(ctx, reference, value.clone())?;
            Ok(value)
        }
        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            if to_boolean(&evaluate_expression(test, ctx)?) {
                evaluate_expression(consequent, ctx)
            } else {
                evaluate_expression(alternate, ctx)
            }
        }
        ExpressionType::CallExpression {
            callee, arguments, ..
        } => {
            let (func, this) = match callee.as_ref() {
                ExpressionType::MemberExpression(m) => {
                    let (base, key) = evaluate_member_parts(m, ctx)?;
                    let f = get_value_property(ctx, &base, &key)?;
                    (f, base)
                }
                other => (evaluate_expression(other, ctx)?, JsValue::Undefined),
            };
            let args = evaluate_arguments(arguments, ctx)?;
            if !func.is_callable() {
                return Err(JErrorType::TypeError(format!(
                    "{} is not a function",
                    describe_callee(callee)
                )));
            }
            call_function(ctx, &func, this, args)
        }
        ExpressionType::NewExpression {
            callee, arguments, ..
        } => {
            let f = evaluate_expression(callee, ctx)?;
            let args = evaluate_arguments(arguments, ctx)?;
            construct(ctx, &f, args, &describe_callee(callee))
        }
        ExpressionType::MemberExpression(m) => {
            let (base, key) = evaluate_member_parts(m, ctx)?;
            get_value_property(ctx, &base, &key)
        }
        ExpressionType::SequenceExpression { expressions, .. } => {
            let mut value = JsValue::Undefined;
            for e in expressions {
                value = evaluate_expression(e, ctx)?;
            }
            Ok(value)
        }
    }
}

fn evaluate_arguments(args: &[ExpressionType], ctx: &mut EvalContext) -> Result<Vec<JsValue>, JErrorType> {
    let mut values = Vec::with_capacity(args.len());
    for a in args {
        values.push(evaluate_expression(a, ctx)?);
    }
    Ok(values)
}

fn evaluate_object_literal(properties: &[PropertyData], ctx: &mut EvalContext) -> ValueResult {
    let obj = ctx.alloc_ordinary()?;
    for p in properties {
        let key = match &p.key {
            PropertyKeyType::Static(s) => PropertyKey::from(s.as_str()),
            PropertyKeyType::Computed(e) => to_property_key(&evaluate_expression(e, ctx)?),
        };
        let value = evaluate_expression(&p.value, ctx)?;
        if let JsValue::Object(o) = &obj {
            set(o, key, value);
        }
    }
    Ok(obj)
}

/// Short source-like text for a callee, used in error messages.
fn describe_callee(expr: &ExpressionType) -> String {
    match expr {
        ExpressionType::Identifier(id) => id.name.clone(),
        ExpressionType::ThisExpression { .. } => "this".to_string(),
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            object,
            property,
            ..
        }) => format!("{}.{}", describe_callee(object), property.name),
        ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
            object,
            ..
        }) => format!("{}[...]", describe_callee(object)),
        ExpressionType::CallExpression { callee, .. } => format!("{}(...)", describe_callee(callee)),
        _ => "expression".to_string(),
    }
}

fn evaluate_member_parts(
    m: &MemberExpressionType,
    ctx: &mut EvalContext,
) -> Result<(JsValue, PropertyKey), JErrorType> {
    match m {
        MemberExpressionType::SimpleMemberExpression {
            object, property, ..
        } => {
            let base = evaluate_expression(object, ctx)?;
            Ok((base, PropertyKey::from(property.name.as_str())))
        }
        MemberExpressionType::ComputedMemberExpression {
            object, property, ..
        } => {
            let base = evaluate_expression(object, ctx)?;
            let key = evaluate_expression(property, ctx)?;
            Ok((base, to_property_key(&key)))
        }
    }
}

fn evaluate_reference(expr: &ExpressionType, ctx: &mut EvalContext) -> Result<Reference, JErrorType> {
    match expr {
        ExpressionType::Identifier(id) => Ok(Reference::Binding(id.name.clone())),
        ExpressionType::MemberExpression(m) => {
            let (base, key) = evaluate_member_parts(m, ctx)?;
            Ok(Reference::Property { base, key })
        }
        _ => Err(JErrorType::SyntaxError(
            "Invalid left-hand side in assignment".to_string(),
        )),
    }
}

fn get_reference_value(ctx: &mut EvalContext, reference: &Reference) -> ValueResult {
    match reference {
        Reference::Binding(name) => ctx.get_binding(name),
        Reference::Property { base, key } => get_value_property(ctx, base, key),
    }
}

fn put_reference_value(
    ctx: &mut EvalContext,
    reference: Reference,
    value: JsValue,
) -> Result<(), JErrorType> {
    match reference {
        Reference::Binding(name) => ctx.set_binding(&name, value),
        Reference::Property { base, key } => set_value_property(&base, key, value),
    }
}

fn is_key(key: &PropertyKey, name: &str) -> bool {
    matches!(key, PropertyKey::Str(s) if s == name)
}

/// Property read on any value. Own and inherited properties come first;
/// after that the built-in methods for the value's kind, then the generic
/// object methods.
pub fn get_value_property(ctx: &mut EvalContext, base: &JsValue, key: &PropertyKey) -> ValueResult {
    let class = match base {
        JsValue::Undefined | JsValue::Null => {
            return Err(JErrorType::TypeError(format!(
                "Cannot read properties of {} (reading '{}')",
                to_string(base),
                key
            )))
        }
        JsValue::String(s) => {
            if is_key(key, "length") {
                return Ok(JsValue::Number(s.chars().count() as f64));
            }
            if let Some(i) = key.as_array_index() {
                return Ok(s
                    .chars()
                    .nth(i)
                    .map(|c| JsValue::String(c.to_string()))
                    .unwrap_or(JsValue::Undefined));
            }
            "String"
        }
        JsValue::Number(_) => "Number",
        JsValue::Boolean(_) => "Boolean",
        JsValue::BigInt(_) => "BigInt",
        JsValue::Symbol(sym) => {
            if is_key(key, "description") {
                return Ok(sym
                    .description()
                    .map(JsValue::from)
                    .unwrap_or(JsValue::Undefined));
            }
            "Symbol"
        }
        JsValue::Object(o) => {
            if has_property(o, key) {
                return Ok(get(o, key));
            }
            if is_key(key, "prototype") && is_script_function(o) {
                return ensure_prototype(ctx, o);
            }
            match &*o.borrow() {
                ObjectType::Array(_) => "Array",
                ObjectType::Function(_) => "Function",
                ObjectType::Ordinary(_) => "Object",
            }
        }
    };
    let name = match key {
        PropertyKey::Str(s) => s,
        PropertyKey::Sym(_) => return Ok(JsValue::Undefined),
    };
    if let Some(m) = ctx.get_prototype_method(class, name)? {
        return Ok(m);
    }
    if class != "Object" {
        if let Some(m) = ctx.get_prototype_method("Object", name)? {
            return Ok(m);
        }
    }
    Ok(JsValue::Undefined)
}

/// Property write. Writes to primitives are dropped; writes to read-only
/// properties fail silently.
pub fn set_value_property(base: &JsValue, key: PropertyKey, value: JsValue) -> Result<(), JErrorType> {
    match base {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot set properties of {} (setting '{}')",
            to_string(base),
            key
        ))),
        JsValue::Object(o) => {
            let array_key = key.as_array_index().is_some() || is_key(&key, "length");
            if !set(o, key, value) && array_key && matches!(&*o.borrow(), ObjectType::Array(_)) {
                return Err(JErrorType::RangeError("Invalid array length".to_string()));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn evaluate_unary_expression(
    operator: UnaryOperator,
    argument: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    match operator {
        UnaryOperator::TypeOf => {
            if let ExpressionType::Identifier(id) = argument {
                if !ctx.has_binding(&id.name) {
                    return Ok(JsValue::String(TYPE_STR_UNDEFINED.to_string()));
                }
            }
            let v = evaluate_expression(argument, ctx)?;
            Ok(JsValue::String(type_of(&v).to_string()))
        }
        UnaryOperator::Delete => evaluate_delete(argument, ctx),
        _ => {
            let v = evaluate_expression(argument, ctx)?;
            Ok(match operator {
                UnaryOperator::LogicalNot => JsValue::Boolean(!to_boolean(&v)),
                UnaryOperator::Void => JsValue::Undefined,
                UnaryOperator::Minus => match to_numeric(&v)? {
                    Numeric::Number(n) => JsValue::Number(-n),
                    Numeric::BigInt(b) => JsValue::BigInt(-b),
                },
                UnaryOperator::Plus => match to_numeric(&v)? {
                    Numeric::Number(n) => JsValue::Number(n),
                    Numeric::BigInt(_) => {
                        return Err(JErrorType::TypeError(
                            "Cannot convert a BigInt value to a number".to_string(),
                        ))
                    }
                },
                UnaryOperator::BitwiseNot => match to_numeric(&v)? {
                    Numeric::Number(n) => JsValue::Number(!to_int32(&JsValue::Number(n)) as f64),
                    Numeric::BigInt(b) => JsValue::BigInt(-b - BigInt::from(1)),
                },
                UnaryOperator::TypeOf | UnaryOperator::Delete => JsValue::Undefined,
            })
        }
    }
}

fn evaluate_delete(argument: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    match argument {
        ExpressionType::MemberExpression(m) => {
            let (base, key) = evaluate_member_parts(m, ctx)?;
            match &base {
                JsValue::Object(o) => Ok(JsValue::Boolean(
                    o.borrow_mut().as_js_object_mut().delete(&key),
                )),
                JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(
                    "Cannot convert undefined or null to object".to_string(),
                )),
                _ => Ok(JsValue::Boolean(true)),
            }
        }
        ExpressionType::Identifier(_) => Ok(JsValue::Boolean(false)),
        other => {
            evaluate_expression(other, ctx)?;
            Ok(JsValue::Boolean(true))
        }
    }
}

/// A value after numeric conversion.
#[derive(Clone)]
pub enum Numeric {
    Number(f64),
    BigInt(BigInt),
}

impl Numeric {
    pub fn into_value(self) -> JsValue {
        match self {
            Numeric::Number(n) => JsValue::Number(n),
            Numeric::BigInt(b) => JsValue::BigInt(b),
        }
    }
}

pub fn to_numeric(v: &JsValue) -> Result<Numeric, JErrorType> {
    match to_primitive(v) {
        JsValue::BigInt(b) => Ok(Numeric::BigInt(b)),
        JsValue::Symbol(_) => Err(JErrorType::TypeError(
            "Cannot convert a Symbol value to a number".to_string(),
        )),
        p => Ok(Numeric::Number(to_number(&p))),
    }
}

/// Applies a binary operator to two already evaluated operands.
pub fn apply_binary_operator(
    ctx: &mut EvalContext,
    op: BinaryOperator,
    l: &JsValue,
    r: &JsValue,
) -> ValueResult {
    let ordering = |l: &JsValue, r: &JsValue| compare_values(l, r);
    Ok(JsValue::Boolean(match op {
        BinaryOperator::Equal => abstract_equality_comparison(l, r),
        BinaryOperator::NotEqual => !abstract_equality_comparison(l, r),
        BinaryOperator::StrictlyEqual => strict_equality_comparison(l, r),
        BinaryOperator::StrictlyUnequal => !strict_equality_comparison(l, r),
        BinaryOperator::LessThan => ordering(l, r) == Some(Ordering::Less),
        BinaryOperator::GreaterThan => ordering(l, r) == Some(Ordering::Greater),
        BinaryOperator::LessThanEqual => {
            matches!(ordering(l, r), Some(Ordering::Less) | Some(Ordering::Equal))
        }
        BinaryOperator::GreaterThanEqual => {
            matches!(ordering(l, r), Some(Ordering::Greater) | Some(Ordering::Equal))
        }
        BinaryOperator::InstanceOf => instance_of(ctx, l, r)?,
        BinaryOperator::In => match r {
            JsValue::Object(o) => has_property(o, &to_property_key(l)),
            _ => {
                return Err(JErrorType::TypeError(format!(
                    "Cannot use 'in' operator to search for '{}' in {}",
                    to_string(l),
                    to_string(r)
                )))
            }
        },
        BinaryOperator::Add => return add(l, r),
        _ => return numeric_binary_operator(op, l, r),
    }))
}

fn add(l: &JsValue, r: &JsValue) -> ValueResult {
    let lp = to_primitive(l);
    let rp = to_primitive(r);
    if matches!(lp, JsValue::String(_)) || matches!(rp, JsValue::String(_)) {
        if matches!(lp, JsValue::Symbol(_)) || matches!(rp, JsValue::Symbol(_)) {
            return Err(JErrorType::TypeError(
                "Cannot convert a Symbol value to a string".to_string(),
            ));
        }
        let mut s = to_string(&lp);
        s.push_str(&to_string(&rp));
        return Ok(JsValue::String(s));
    }
    numeric_binary_operator(BinaryOperator::Add, &lp, &rp)
}

fn numeric_binary_operator(op: BinaryOperator, l: &JsValue, r: &JsValue) -> ValueResult {
    match (to_numeric(l)?, to_numeric(r)?) {
        (Numeric::Number(a), Numeric::Number(b)) => Ok(JsValue::Number(number_operation(op, a, b))),
        (Numeric::BigInt(a), Numeric::BigInt(b)) => bigint_operation(op, a, b).map(JsValue::BigInt),
        _ => Err(JErrorType::TypeError(MIXED_BIGINT.to_string())),
    }
}

fn exponentiate(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

fn number_operation(op: BinaryOperator, a: f64, b: f64) -> f64 {
    let int32 = |n: f64| to_int32(&JsValue::Number(n));
    let shift = |n: f64| to_uint32(&JsValue::Number(n)) & 0x1f;
    match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide => a / b,
        BinaryOperator::Modulo => a % b,
        BinaryOperator::Exponent => exponentiate(a, b),
        BinaryOperator::BitwiseLeftShift => int32(a).wrapping_shl(shift(b)) as f64,
        BinaryOperator::BitwiseRightShift => (int32(a) >> shift(b)) as f64,
        BinaryOperator::BitwiseUnsignedRightShift => {
            (to_uint32(&JsValue::Number(a)) >> shift(b)) as f64
        }
        BinaryOperator::BitwiseAnd => (int32(a) & int32(b)) as f64,
        BinaryOperator::BitwiseOr => (int32(a) | int32(b)) as f64,
        BinaryOperator::BitwiseXor => (int32(a) ^ int32(b)) as f64,
        _ => f64::NAN,
    }
}

fn bigint_shift_left(a: BigInt, n: &BigInt) -> Result<BigInt, JErrorType> {
    let too_big = || JErrorType::RangeError("Maximum BigInt size exceeded".to_string());
    let n = n.to_i64().ok_or_else(too_big)?;
    if n > MAX_BIGINT_SHIFT {
        return Err(too_big());
    }
    Ok(if n >= 0 {
        a << n as usize
    } else {
        a >> n.unsigned_abs().min(u32::MAX as u64) as usize
    })
}

fn bigint_operation(op: BinaryOperator, a: BigInt, b: BigInt) -> Result<BigInt, JErrorType> {
    let division_by_zero = || JErrorType::RangeError("Division by zero".to_string());
    Ok(match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide => {
            if b.is_zero() {
                return Err(division_by_zero());
            }
            a / b
        }
        BinaryOperator::Modulo => {
            if b.is_zero() {
                return Err(division_by_zero());
            }
            a % b
        }
        BinaryOperator::Exponent => {
            if b < BigInt::zero() {
                return Err(JErrorType::RangeError(
                    "Exponent must be non-negative".to_string(),
                ));
            }
            let e = b.to_u32().ok_or_else(|| {
                JErrorType::RangeError("Maximum BigInt size exceeded".to_string())
            })?;
            a.pow(e)
        }
        BinaryOperator::BitwiseLeftShift => bigint_shift_left(a, &b)?,
        BinaryOperator::BitwiseRightShift => bigint_shift_left(a, &-b)?,
        BinaryOperator::BitwiseUnsignedRightShift => {
            return Err(JErrorType::TypeError(
                "BigInts have no unsigned right shift, use >> instead".to_string(),
            ))
        }
        BinaryOperator::BitwiseAnd => a & b,
        BinaryOperator::BitwiseOr => a | b,
        BinaryOperator::BitwiseXor => a ^ b,
        _ => return Err(JErrorType::TypeError(MIXED_BIGINT.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_operations() {
        assert_eq!(number_operation(BinaryOperator::Modulo, -7.0, 3.0), -1.0);
        assert_eq!(number_operation(BinaryOperator::BitwiseLeftShift, 1.0, 33.0), 2.0);
        assert_eq!(
            number_operation(BinaryOperator::BitwiseUnsignedRightShift, -1.0, 0.0),
            4294967295.0
        );
        assert!(exponentiate(1.0, f64::INFINITY).is_nan());
        assert_eq!(exponentiate(2.0, 10.0), 1024.0);
    }

    #[test]
    fn test_bigint_operations() {
        let big = |n: i64| BigInt::from(n);
        assert_eq!(bigint_operation(BinaryOperator::Divide, big(-7), big(2)).unwrap(), big(-3));
        assert_eq!(bigint_operation(BinaryOperator::Modulo, big(-7), big(2)).unwrap(), big(-1));
        assert_eq!(bigint_operation(BinaryOperator::BitwiseRightShift, big(-9), big(1)).unwrap(), big(-5));
        assert!(bigint_operation(BinaryOperator::Divide, big(1), big(0)).is_err());
        assert!(bigint_operation(BinaryOperator::Exponent, big(2), big(-1)).is_err());
    }

    #[test]
    fn test_mixing_bigint_and_number_is_type_error() {
        let r = numeric_binary_operator(
            BinaryOperator::Add,
            &JsValue::BigInt(BigInt::from(1)),
            &JsValue::Number(1.0),
        );
        assert!(matches!(r, Err(JErrorType::TypeError(_))));
    }
}
