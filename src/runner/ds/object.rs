use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::array_object::ArrayObject;
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::heap::RuntimeId;
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::value::JsValue;

pub type JsObjectType = Rc<RefCell<ObjectType>>;

pub enum ObjectType {
    Ordinary(OrdinaryObject),
    Function(FunctionObject),
    Array(ArrayObject),
}

impl ObjectType {
    pub fn is_callable(&self) -> bool {
        matches!(self, ObjectType::Function(_))
    }

    pub fn as_js_object(&self) -> &dyn JsObject {
        match self {
            ObjectType::Ordinary(o) => o,
            ObjectType::Function(o) => o,
            ObjectType::Array(o) => o,
        }
    }

    pub fn as_js_object_mut(&mut self) -> &mut dyn JsObject {
        match self {
            ObjectType::Ordinary(o) => o,
            ObjectType::Function(o) => o,
            ObjectType::Array(o) => o,
        }
    }

    /// Wraps the object in a fresh heap cell that no runtime tracks. Used for
    /// values a host builds before handing them to a runtime.
    pub fn into_untracked(self) -> JsObjectType {
        Rc::new(RefCell::new(self))
    }
}

/// Property storage shared by every object kind. Keys keep their first
/// insertion position, which is the enumeration order.
pub struct ObjectBase {
    properties: HashMap<PropertyKey, PropertyDescriptor>,
    order: Vec<PropertyKey>,
    prototype: Option<JsObjectType>,
    owner: Option<RuntimeId>,
}

impl ObjectBase {
    pub fn new() -> Self {
        ObjectBase {
            properties: HashMap::new(),
            order: Vec::new(),
            prototype: None,
            owner: None,
        }
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.properties.contains_key(key)
    }

    pub fn insert(&mut self, key: PropertyKey, descriptor: PropertyDescriptor) {
        if !self.properties.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.properties.insert(key, descriptor);
    }

    pub fn remove(&mut self, key: &PropertyKey) -> bool {
        if self.properties.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    pub fn keys(&self) -> &[PropertyKey] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for ObjectBase {
    fn default() -> Self {
        Self::new()
    }
}

pub trait JsObject {
    fn get_object_base(&self) -> &ObjectBase;

    fn get_object_base_mut(&mut self) -> &mut ObjectBase;

    fn get_prototype_of(&self) -> Option<JsObjectType> {
        self.get_object_base().prototype.clone()
    }

    fn set_prototype_of(&mut self, prototype: Option<JsObjectType>) {
        self.get_object_base_mut().prototype = prototype;
    }

    fn owner(&self) -> Option<RuntimeId> {
        self.get_object_base().owner
    }

    fn set_owner(&mut self, owner: RuntimeId) {
        self.get_object_base_mut().owner = Some(owner);
    }

    fn get_own_property(&self, key: &PropertyKey) -> Option<JsValue> {
        self.get_object_base().get(key).map(|d| d.value.clone())
    }

    fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.get_object_base().contains(key)
    }

    fn define_own_property(&mut self, key: PropertyKey, descriptor: PropertyDescriptor) -> bool {
        self.get_object_base_mut().insert(key, descriptor);
        true
    }

    /// Assigns an own property. Returns false when the property is read-only.
    fn set(&mut self, key: PropertyKey, value: JsValue) -> bool {
        ordinary_set(self.get_object_base_mut(), key, value)
    }

    fn delete(&mut self, key: &PropertyKey) -> bool {
        let base = self.get_object_base_mut();
        if !base.get(key).map(|d| d.configurable).unwrap_or(true) {
            return false;
        }
        base.remove(key);
        true
    }

    /// Enumerable own keys in enumeration order.
    fn own_property_keys(&self) -> Vec<PropertyKey> {
        let base = self.get_object_base();
        base.keys()
            .iter()
            .filter(|k| base.get(k).map(|d| d.enumerable).unwrap_or(false))
            .cloned()
            .collect()
    }
}

pub(crate) fn ordinary_set(base: &mut ObjectBase, key: PropertyKey, value: JsValue) -> bool {
    if let Some(d) = base.properties.get_mut(&key) {
        if !d.writable {
            return false;
        }
        d.value = value;
        return true;
    }
    base.insert(key, PropertyDescriptor::new_data(value));
    true
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ObjectClass {
    Object,
    Error,
}

pub struct OrdinaryObject {
    base: ObjectBase,
    class: ObjectClass,
}

impl OrdinaryObject {
    pub fn new() -> Self {
        OrdinaryObject {
            base: ObjectBase::new(),
            class: ObjectClass::Object,
        }
    }

    /// An error object carrying `name` and `message` as hidden own properties.
    pub fn new_error(name: &str, message: &str) -> Self {
        let mut o = OrdinaryObject {
            base: ObjectBase::new(),
            class: ObjectClass::Error,
        };
        o.base.insert(
            PropertyKey::from("name"),
            PropertyDescriptor::new_hidden(JsValue::String(name.to_string())),
        );
        o.base.insert(
            PropertyKey::from("message"),
            PropertyDescriptor::new_hidden(JsValue::String(message.to_string())),
        );
        o
    }

    pub fn class(&self) -> ObjectClass {
        self.class
    }

    pub fn is_error(&self) -> bool {
        self.class == ObjectClass::Error
    }
}

impl Default for OrdinaryObject {
    fn default() -> Self {
        Self::new()
    }
}

impl JsObject for OrdinaryObject {
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

    #[test]
    fn test_insertion_order_is_kept() {
        let mut o = OrdinaryObject::new();
        o.set(PropertyKey::from("b"), JsValue::Number(1.0));
        o.set(PropertyKey::from("a"), JsValue::Number(2.0));
        o.set(PropertyKey::from("b"), JsValue::Number(3.0));
        assert_eq!(
            o.own_property_keys(),
            vec![PropertyKey::from("b"), PropertyKey::from("a")]
        );
        assert_eq!(o.get_own_property(&PropertyKey::from("b")), Some(JsValue::Number(3.0)));
    }

    #[test]
    fn test_read_only_property_rejects_set() {
        let mut o = OrdinaryObject::new();
        o.define_own_property(
            PropertyKey::from("k"),
            PropertyDescriptor::new_read_only(JsValue::Number(1.0)),
        );
        assert!(!o.set(PropertyKey::from("k"), JsValue::Number(2.0)));
        assert!(!o.delete(&PropertyKey::from("k")));
        assert!(o.own_property_keys().is_empty());
    }

    #[test]
    fn test_delete_removes_from_order() {
        let mut o = OrdinaryObject::new();
        o.set(PropertyKey::from("x"), JsValue::Null);
        o.set(PropertyKey::from("y"), JsValue::Null);
        assert!(o.delete(&PropertyKey::from("x")));
        assert_eq!(o.own_property_keys(), vec![PropertyKey::from("y")]);
    }

    #[test]
    fn test_error_object_hides_fields() {
        let e = OrdinaryObject::new_error("TypeError", "bad");
        assert!(e.is_error());
        assert!(e.own_property_keys().is_empty());
        assert_eq!(
            e.get_own_property(&PropertyKey::from("message")),
            Some(JsValue::String("bad".to_string()))
        );
    }
}
