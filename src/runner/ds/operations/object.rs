use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::value::JsValue;

/// [[Get]]: own property first, then the prototype chain. Missing keys read
/// as undefined.
pub fn get(o: &JsObjectType, key: &PropertyKey) -> JsValue {
    let mut current = Some(o.clone());
    while let Some(obj) = current {
        let next = {
            let borrowed = obj.borrow();
            let js = borrowed.as_js_object();
            if let Some(v) = js.get_own_property(key) {
                return v;
            }
            js.get_prototype_of()
        };
        current = next;
    }
    JsValue::Undefined
}

/// True when `key` is found on `o` or anywhere on its prototype chain.
pub fn has_property(o: &JsObjectType, key: &PropertyKey) -> bool {
    let mut current = Some(o.clone());
    while let Some(obj) = current {
        let next = {
            let borrowed = obj.borrow();
            let js = borrowed.as_js_object();
            if js.has_own_property(key) {
                return true;
            }
            js.get_prototype_of()
        };
        current = next;
    }
    false
}

/// [[Set]] on the object itself. Returns false for read-only properties or
/// when the object is already borrowed further up the stack.
pub fn set(o: &JsObjectType, key: PropertyKey, value: JsValue) -> bool {
    match o.try_borrow_mut() {
        Ok(mut obj) => obj.as_js_object_mut().set(key, value),
        Err(_) => false,
    }
}

/// Snapshot of the elements of an array object, or None for anything else.
pub fn array_elements(v: &JsValue) -> Option<Vec<JsValue>> {
    match v {
        JsValue::Object(o) => match &*o.borrow() {
            ObjectType::Array(a) => Some(a.elements().to_vec()),
            _ => None,
        },
        _ => None,
    }
}

/// Enumerable own keys, in enumeration order.
pub fn own_keys(o: &JsObjectType) -> Vec<PropertyKey> {
    o.borrow().as_js_object().own_property_keys()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::{JsObject, OrdinaryObject};

    #[test]
    fn test_get_walks_prototype_chain() {
        let proto = ObjectType::Ordinary(OrdinaryObject::new()).into_untracked();
        set(&proto, PropertyKey::from("greet"), JsValue::from("hi"));
        let child = ObjectType::Ordinary(OrdinaryObject::new()).into_untracked();
        child
            .borrow_mut()
            .as_js_object_mut()
            .set_prototype_of(Some(proto.clone()));
        assert_eq!(get(&child, &PropertyKey::from("greet")), JsValue::from("hi"));
        assert!(has_property(&child, &PropertyKey::from("greet")));
        assert!(own_keys(&child).is_empty());
        assert_eq!(get(&child, &PropertyKey::from("nope")), JsValue::Undefined);
    }
}
