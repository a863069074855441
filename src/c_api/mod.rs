//! C ABI for embedding the engine.
//!
//! Runtimes and values cross the boundary as opaque handles. Every handle the
//! library returns is owned by the caller and released exactly once with the
//! matching free function: `qs_value_free` for values, `qs_string_free` for
//! strings from `qs_value_to_string`, `qs_error_free` for error messages and
//! `qs_runtime_free` for runtimes. Passing a value into a function never
//! transfers ownership.
//!
//! ```c
//! QsRuntime *rt = qs_runtime_new();
//! QsError err = {0};
//! QsValue *v = qs_eval(rt, "1 + 2", &err);
//! double n = qs_value_to_number(v);
//! qs_value_free(v);
//! qs_runtime_free(rt);
//! ```

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use log::{error, warn};

use crate::runner::api::Runtime;
use crate::runner::config::RuntimeConfig;
use crate::runner::ds::array_object::ArrayObject;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::heap::RuntimeId;
use crate::runner::ds::object::{JsObject, ObjectType, OrdinaryObject};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{get, set};
use crate::runner::ds::operations::test_and_comparison::strict_equality_comparison;
use crate::runner::ds::operations::type_conversion::{to_boolean, to_number, to_string};
use crate::runner::ds::value::JsValue;

pub const QS_API_VERSION_MAJOR: u32 = 1;
pub const QS_API_VERSION_MINOR: u32 = 0;
pub const QS_API_VERSION_PATCH: u32 = 0;

pub const QS_ERROR_NONE: i32 = 0;
pub const QS_ERROR_INVALID_INPUT: i32 = 1;
pub const QS_ERROR_EVAL: i32 = 2;

/// Opaque runtime handle.
pub struct QsRuntime {
    inner: Runtime,
}

/// Opaque value handle. Remembers the runtime it came from, if any.
pub struct QsValue {
    value: JsValue,
    runtime: Option<RuntimeId>,
}

/// Error record filled in by fallible calls. `message` is released with
/// `qs_error_free`.
#[repr(C)]
pub struct QsError {
    pub message: *mut c_char,
    pub code: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QsValueType {
    Undefined = 0,
    Null = 1,
    Boolean = 2,
    Number = 3,
    String = 4,
    Object = 5,
    Array = 6,
    Function = 7,
    BigInt = 8,
    Symbol = 9,
}

/// Host function callable from script. Argument handles are only valid for
/// the duration of the call. A non-null result is taken over by the engine.
pub type QsNativeCallback =
    unsafe extern "C" fn(argc: i32, argv: *const *const QsValue) -> *mut QsValue;

fn into_handle(value: JsValue, runtime: Option<RuntimeId>) -> *mut QsValue {
    Box::into_raw(Box::new(QsValue { value, runtime }))
}

fn unowned(value: JsValue) -> *mut QsValue {
    into_handle(value, None)
}

fn to_c_string(s: &str) -> *mut c_char {
    let s = if s.contains('\0') {
        s.replace('\0', "\\0")
    } else {
        s.to_string()
    };
    CString::new(s).unwrap_or_default().into_raw()
}

unsafe fn set_error(error: *mut QsError, message: &str, code: i32) {
    if let Some(err) = error.as_mut() {
        err.message = to_c_string(message);
        err.code = code;
    }
}

unsafe fn clear_error(error: *mut QsError) {
    if let Some(err) = error.as_mut() {
        err.message = ptr::null_mut();
        err.code = QS_ERROR_NONE;
    }
}

/// Borrowed UTF-8 view of a C string. None for null or invalid UTF-8.
unsafe fn read_str<'a>(s: *const c_char, what: &str) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    match CStr::from_ptr(s).to_str() {
        Ok(s) => Some(s),
        Err(_) => {
            warn!("invalid UTF-8 in {}", what);
            None
        }
    }
}

/// Runs engine code, turning a panic into `default`.
fn guard<T>(what: &str, default: T, f: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(v) => v,
        Err(_) => {
            error!("panic in {}", what);
            default
        }
    }
}

fn object_owner(value: &JsValue) -> Option<RuntimeId> {
    value
        .as_object()
        .and_then(|o| o.try_borrow().ok().and_then(|o| o.as_js_object().owner()))
}

/// Both values may be combined: neither belongs to a runtime the other does not.
fn same_runtime(a: &QsValue, b: &QsValue) -> bool {
    let a_id = a.runtime.or_else(|| object_owner(&a.value));
    let b_id = b.runtime.or_else(|| object_owner(&b.value));
    match (a_id, b_id) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    }
}

/// Tags an unowned object stored into a container owned by `owner`.
fn claim(value: &JsValue, owner: Option<RuntimeId>) {
    if let (Some(id), Some(o)) = (owner, value.as_object()) {
        if let Ok(mut o) = o.try_borrow_mut() {
            if o.as_js_object().owner().is_none() {
                o.as_js_object_mut().set_owner(id);
            }
        }
    }
}

// === Runtime lifecycle ===

/// Creates a runtime with the default configuration. Returns null on failure.
#[no_mangle]
pub extern "C" fn qs_runtime_new() -> *mut QsRuntime {
    guard("qs_runtime_new", ptr::null_mut(), || {
        Box::into_raw(Box::new(QsRuntime {
            inner: Runtime::new(),
        }))
    })
}

/// Creates a runtime from a TOML configuration. A null `config` means the
/// defaults. An unparsable configuration returns null with code 1.
///
/// # Safety
/// `config` must be null or a valid NUL-terminated string. `error` must be
/// null or point to a writable `QsError`.
#[no_mangle]
pub unsafe extern "C" fn qs_runtime_new_with_config(
    config: *const c_char,
    error: *mut QsError,
) -> *mut QsRuntime {
    clear_error(error);
    let config = if config.is_null() {
        RuntimeConfig::default()
    } else {
        let source = match read_str(config, "runtime config") {
            Some(s) => s,
            None => {
                set_error(error, "Invalid UTF-8 in config", QS_ERROR_INVALID_INPUT);
                return ptr::null_mut();
            }
        };
        match RuntimeConfig::parse(source) {
            Ok(c) => c,
            Err(e) => {
                warn!("rejected runtime config: {}", e);
                set_error(error, &e.to_string(), QS_ERROR_INVALID_INPUT);
                return ptr::null_mut();
            }
        }
    };
    guard("qs_runtime_new_with_config", ptr::null_mut(), || {
        Box::into_raw(Box::new(QsRuntime {
            inner: Runtime::with_config(config),
        }))
    })
}

/// Destroys a runtime. Null is ignored. Value handles taken from the runtime
/// stay valid and must still be freed.
///
/// # Safety
/// `rt` must be null or a pointer from `qs_runtime_new*` not yet freed.
#[no_mangle]
pub unsafe extern "C" fn qs_runtime_free(rt: *mut QsRuntime) {
    if !rt.is_null() {
        guard("qs_runtime_free", (), || drop(Box::from_raw(rt)));
    }
}

// === Evaluation ===

/// Evaluates `source`. Returns the result, or null with `error` filled in:
/// code 1 for null or non-UTF-8 arguments, code 2 for syntax errors and
/// uncaught exceptions.
///
/// # Safety
/// `rt` must be a live runtime, `source` a NUL-terminated string and
/// `error` null or writable.
#[no_mangle]
pub unsafe extern "C" fn qs_eval(
    rt: *mut QsRuntime,
    source: *const c_char,
    error: *mut QsError,
) -> *mut QsValue {
    clear_error(error);
    let rt = match rt.as_mut() {
        Some(rt) => rt,
        None => {
            set_error(error, "Runtime handle is null", QS_ERROR_INVALID_INPUT);
            return ptr::null_mut();
        }
    };
    let source = match read_str(source, "source") {
        Some(s) => s,
        None => {
            set_error(error, "Source is null or not valid UTF-8", QS_ERROR_INVALID_INPUT);
            return ptr::null_mut();
        }
    };
    let result = guard("qs_eval", None, || Some(rt.inner.eval(source)));
    match result {
        Some(Ok(value)) => into_handle(value, Some(rt.inner.id())),
        Some(Err(e)) => {
            set_error(error, &e.to_string(), QS_ERROR_EVAL);
            ptr::null_mut()
        }
        None => {
            set_error(error, "Internal error during evaluation", QS_ERROR_EVAL);
            ptr::null_mut()
        }
    }
}

// === Value construction ===

#[no_mangle]
pub extern "C" fn qs_value_undefined() -> *mut QsValue {
    unowned(JsValue::Undefined)
}

#[no_mangle]
pub extern "C" fn qs_value_null() -> *mut QsValue {
    unowned(JsValue::Null)
}

#[no_mangle]
pub extern "C" fn qs_value_boolean(value: bool) -> *mut QsValue {
    unowned(JsValue::Boolean(value))
}

#[no_mangle]
pub extern "C" fn qs_value_number(value: f64) -> *mut QsValue {
    unowned(JsValue::Number(value))
}

/// Copies `value` into a new string handle. Null yields undefined; invalid
/// UTF-8 is replaced.
///
/// # Safety
/// `value` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn qs_value_string(value: *const c_char) -> *mut QsValue {
    if value.is_null() {
        return qs_value_undefined();
    }
    unowned(JsValue::String(
        CStr::from_ptr(value).to_string_lossy().into_owned(),
    ))
}

/// A new empty object. It belongs to the first runtime it is stored into.
#[no_mangle]
pub extern "C" fn qs_value_object() -> *mut QsValue {
    unowned(JsValue::Object(
        ObjectType::Ordinary(OrdinaryObject::new()).into_untracked(),
    ))
}

/// A new empty array. It belongs to the first runtime it is stored into.
#[no_mangle]
pub extern "C" fn qs_value_array() -> *mut QsValue {
    unowned(JsValue::Object(
        ObjectType::Array(ArrayObject::new()).into_untracked(),
    ))
}

// === Value inspection ===

/// # Safety
/// `value` must be null or a live value handle.
#[no_mangle]
pub unsafe extern "C" fn qs_value_type(value: *const QsValue) -> QsValueType {
    let value = match value.as_ref() {
        Some(v) => &v.value,
        None => return QsValueType::Undefined,
    };
    match value {
        JsValue::Undefined => QsValueType::Undefined,
        JsValue::Null => QsValueType::Null,
        JsValue::Boolean(_) => QsValueType::Boolean,
        JsValue::Number(_) => QsValueType::Number,
        JsValue::String(_) => QsValueType::String,
        JsValue::BigInt(_) => QsValueType::BigInt,
        JsValue::Symbol(_) => QsValueType::Symbol,
        JsValue::Object(o) => match &*o.borrow() {
            ObjectType::Array(_) => QsValueType::Array,
            ObjectType::Function(_) => QsValueType::Function,
            ObjectType::Ordinary(_) => QsValueType::Object,
        },
    }
}

/// # Safety
/// `value` must be null or a live value handle.
#[no_mangle]
pub unsafe extern "C" fn qs_value_to_boolean(value: *const QsValue) -> bool {
    value.as_ref().map_or(false, |v| to_boolean(&v.value))
}

/// # Safety
/// `value` must be null or a live value handle.
#[no_mangle]
pub unsafe extern "C" fn qs_value_to_number(value: *const QsValue) -> f64 {
    value.as_ref().map_or(f64::NAN, |v| to_number(&v.value))
}

/// Returns a new string, released with `qs_string_free`.
///
/// # Safety
/// `value` must be null or a live value handle.
#[no_mangle]
pub unsafe extern "C" fn qs_value_to_string(value: *const QsValue) -> *mut c_char {
    let s = match value.as_ref() {
        Some(v) => guard("qs_value_to_string", String::new(), || to_string(&v.value)),
        None => "undefined".to_string(),
    };
    to_c_string(&s)
}

/// # Safety
/// `a` and `b` must each be null or a live value handle.
#[no_mangle]
pub unsafe extern "C" fn qs_value_strict_equals(a: *const QsValue, b: *const QsValue) -> bool {
    match (a.as_ref(), b.as_ref()) {
        (Some(a), Some(b)) => strict_equality_comparison(&a.value, &b.value),
        (None, None) => true,
        _ => false,
    }
}

// === Object operations ===

/// Sets `obj[key] = value`. False when `obj` is not an object, the property is
/// read-only, an argument is invalid, or the handles come from different
/// runtimes.
///
/// # Safety
/// `obj` and `value` must be live value handles, `key` a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn qs_object_set(
    obj: *mut QsValue,
    key: *const c_char,
    value: *const QsValue,
) -> bool {
    let (obj, value) = match (obj.as_ref(), value.as_ref()) {
        (Some(o), Some(v)) => (o, v),
        _ => return false,
    };
    let key = match read_str(key, "property key") {
        Some(k) => k,
        None => return false,
    };
    let target = match &obj.value {
        JsValue::Object(o) => o,
        _ => return false,
    };
    if !same_runtime(obj, value) {
        warn!("qs_object_set: value belongs to another runtime");
        return false;
    }
    claim(&value.value, obj.runtime.or_else(|| object_owner(&obj.value)));
    set(target, PropertyKey::from(key), value.value.clone())
}

/// Reads `obj[key]`, following the prototype chain. Missing keys and
/// non-objects give undefined.
///
/// # Safety
/// `obj` must be null or a live value handle, `key` null or a NUL-terminated
/// string.
#[no_mangle]
pub unsafe extern "C" fn qs_object_get(obj: *const QsValue, key: *const c_char) -> *mut QsValue {
    let obj = match obj.as_ref() {
        Some(o) => o,
        None => return qs_value_undefined(),
    };
    let key = match read_str(key, "property key") {
        Some(k) => k,
        None => return qs_value_undefined(),
    };
    match &obj.value {
        JsValue::Object(o) => into_handle(get(o, &PropertyKey::from(key)), obj.runtime),
        _ => qs_value_undefined(),
    }
}

// === Array operations ===

/// Appends `value`. False when `arr` is not an array or the handles come from
/// different runtimes.
///
/// # Safety
/// `arr` and `value` must be null or live value handles.
#[no_mangle]
pub unsafe extern "C" fn qs_array_push(arr: *mut QsValue, value: *const QsValue) -> bool {
    let (arr, value) = match (arr.as_ref(), value.as_ref()) {
        (Some(a), Some(v)) => (a, v),
        _ => return false,
    };
    if !arr.value.is_array() {
        return false;
    }
    if !same_runtime(arr, value) {
        warn!("qs_array_push: value belongs to another runtime");
        return false;
    }
    claim(&value.value, arr.runtime.or_else(|| object_owner(&arr.value)));
    match &arr.value {
        JsValue::Object(o) => match &mut *o.borrow_mut() {
            ObjectType::Array(a) => a.push(value.value.clone()),
            _ => false,
        },
        _ => false,
    }
}

/// Number of elements, or -1 when `value` is not an array.
///
/// # Safety
/// `value` must be null or a live value handle.
#[no_mangle]
pub unsafe extern "C" fn qs_array_length(value: *const QsValue) -> i32 {
    match value.as_ref().map(|v| &v.value) {
        Some(JsValue::Object(o)) => match &*o.borrow() {
            ObjectType::Array(a) => a.len() as i32,
            _ => -1,
        },
        _ => -1,
    }
}

/// Element at `index`; undefined when out of bounds or not an array.
///
/// # Safety
/// `value` must be null or a live value handle.
#[no_mangle]
pub unsafe extern "C" fn qs_array_get(value: *const QsValue, index: i32) -> *mut QsValue {
    let handle = match value.as_ref() {
        Some(v) if index >= 0 => v,
        _ => return qs_value_undefined(),
    };
    let element = match &handle.value {
        JsValue::Object(o) => match &*o.borrow() {
            ObjectType::Array(a) => a.get_index(index as usize).cloned(),
            _ => None,
        },
        _ => None,
    };
    into_handle(element.unwrap_or(JsValue::Undefined), handle.runtime)
}

// === Globals ===

/// Creates or overwrites a global. False for invalid arguments or a value
/// from another runtime.
///
/// # Safety
/// `rt` must be a live runtime, `name` a NUL-terminated string and `value` a
/// live value handle.
#[no_mangle]
pub unsafe extern "C" fn qs_global_set(
    rt: *mut QsRuntime,
    name: *const c_char,
    value: *const QsValue,
) -> bool {
    let (rt, value) = match (rt.as_mut(), value.as_ref()) {
        (Some(r), Some(v)) => (r, v),
        _ => return false,
    };
    let name = match read_str(name, "global name") {
        Some(n) => n,
        None => return false,
    };
    if value.runtime.map_or(false, |id| id != rt.inner.id()) {
        warn!("qs_global_set: value for {} belongs to another runtime", name);
        return false;
    }
    rt.inner.set_global(name, value.value.clone())
}

/// Reads a global. Missing names give undefined.
///
/// # Safety
/// `rt` must be null or a live runtime, `name` null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn qs_global_get(rt: *const QsRuntime, name: *const c_char) -> *mut QsValue {
    let rt = match rt.as_ref() {
        Some(r) => r,
        None => return qs_value_undefined(),
    };
    match read_str(name, "global name") {
        Some(name) => into_handle(rt.inner.get_global(name), Some(rt.inner.id())),
        None => qs_value_undefined(),
    }
}

// === Host functions ===

/// Exposes `callback` to scripts as the global function `name`.
///
/// # Safety
/// `rt` must be a live runtime and `name` a NUL-terminated string. `callback`
/// must stay callable for the lifetime of the runtime.
#[no_mangle]
pub unsafe extern "C" fn qs_register_function(
    rt: *mut QsRuntime,
    name: *const c_char,
    callback: Option<QsNativeCallback>,
) -> bool {
    let (rt, callback) = match (rt.as_mut(), callback) {
        (Some(r), Some(c)) => (r, c),
        _ => return false,
    };
    let name = match read_str(name, "function name") {
        Some(n) => n.to_string(),
        None => return false,
    };
    let runtime = rt.inner.id();
    let fn_name = name.clone();
    let registered = rt.inner.register_function(&name, move |_ctx, _this, args| {
        let handles: Vec<*mut QsValue> = args
            .into_iter()
            .map(|v| into_handle(v, Some(runtime)))
            .collect();
        let argv: Vec<*const QsValue> = handles.iter().map(|h| *h as *const QsValue).collect();
        let result = callback(argv.len() as i32, argv.as_ptr());
        for h in handles {
            drop(Box::from_raw(h));
        }
        if result.is_null() {
            return Ok(JsValue::Undefined);
        }
        let result = Box::from_raw(result);
        if result.runtime.map_or(false, |id| id != runtime)
            || object_owner(&result.value).map_or(false, |id| id != runtime)
        {
            return Err(JErrorType::TypeError(format!(
                "{} returned a value from another runtime",
                fn_name
            )));
        }
        claim(&result.value, Some(runtime));
        Ok(result.value)
    });
    match registered {
        Ok(()) => true,
        Err(e) => {
            warn!("qs_register_function {}: {}", name, e);
            false
        }
    }
}

// === Memory ===

/// # Safety
/// `value` must be null or a value handle not yet freed.
#[no_mangle]
pub unsafe extern "C" fn qs_value_free(value: *mut QsValue) {
    if !value.is_null() {
        drop(Box::from_raw(value));
    }
}

/// # Safety
/// `s` must be null or a string from `qs_value_to_string` not yet freed.
#[no_mangle]
pub unsafe extern "C" fn qs_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Releases the message of an error record and resets it. The record itself
/// belongs to the caller.
///
/// # Safety
/// `error` must be null or point to a `QsError` filled in by this library.
#[no_mangle]
pub unsafe extern "C" fn qs_error_free(error: *mut QsError) {
    if let Some(err) = error.as_mut() {
        if !err.message.is_null() {
            drop(CString::from_raw(err.message));
        }
        err.message = ptr::null_mut();
        err.code = QS_ERROR_NONE;
    }
}

// === Metadata ===

/// Library version. Static; never free it.
#[no_mangle]
pub extern "C" fn qs_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn qs_api_version_major() -> u32 {
    QS_API_VERSION_MAJOR
}

#[no_mangle]
pub extern "C" fn qs_api_version_minor() -> u32 {
    QS_API_VERSION_MINOR
}

#[no_mangle]
pub extern "C" fn qs_api_version_patch() -> u32 {
    QS_API_VERSION_PATCH
}

/// True when a host built against `major.minor` can use this library.
#[no_mangle]
pub extern "C" fn qs_api_compatible(major: u32, minor: u32) -> bool {
    major == QS_API_VERSION_MAJOR && minor <= QS_API_VERSION_MINOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_c_string_escapes_nul() {
        let s = to_c_string("a\0b");
        let back = unsafe { CString::from_raw(s) };
        assert_eq!(back.to_str().unwrap(), "a\\0b");
    }

    #[test]
    fn test_api_compatibility() {
        assert!(qs_api_compatible(1, 0));
        assert!(!qs_api_compatible(2, 0));
        assert!(!qs_api_compatible(1, 1));
    }

    #[test]
    fn test_unowned_values_join_any_runtime() {
        let a = QsValue {
            value: JsValue::Number(1.0),
            runtime: None,
        };
        let b = QsValue {
            value: JsValue::Number(2.0),
            runtime: Some(RuntimeId::new()),
        };
        assert!(same_runtime(&a, &b));
        let c = QsValue {
            value: JsValue::Null,
            runtime: Some(RuntimeId::new()),
        };
        assert!(!same_runtime(&b, &c));
    }
}
