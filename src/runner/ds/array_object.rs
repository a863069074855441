use crate::runner::ds::object::{ordinary_set, JsObject, ObjectBase};
use crate::runner::ds::object_property::{PropertyKey, MAX_ARRAY_LENGTH, MAX_DENSE_GROWTH};
use crate::runner::ds::value::JsValue;

/// Dense array. Indexed elements live in `elements`; any other key goes to
/// the ordinary property map.
pub struct ArrayObject {
    base: ObjectBase,
    elements: Vec<JsValue>,
}

impl ArrayObject {
    pub fn new() -> Self {
        ArrayObject {
            base: ObjectBase::new(),
            elements: Vec::new(),
        }
    }

    pub fn from_list(elements: Vec<JsValue>) -> Self {
        ArrayObject {
            base: ObjectBase::new(),
            elements,
        }
    }

    pub fn elements(&self) -> &[JsValue] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get_index(&self, index: usize) -> Option<&JsValue> {
        self.elements.get(index)
    }

    /// Appends `value`. Returns false once the array is at its maximum length.
    pub fn push(&mut self, value: JsValue) -> bool {
        if self.elements.len() >= MAX_ARRAY_LENGTH {
            return false;
        }
        self.elements.push(value);
        true
    }

    pub fn pop(&mut self) -> Option<JsValue> {
        self.elements.pop()
    }

    /// Writes `value` at `index`, filling any gap with undefined. Fails when
    /// the gap is wider than `MAX_DENSE_GROWTH`.
    pub fn set_index(&mut self, index: usize, value: JsValue) -> bool {
        if index >= MAX_ARRAY_LENGTH || index > self.elements.len() + MAX_DENSE_GROWTH {
            return false;
        }
        if index >= self.elements.len() {
            self.elements.resize(index + 1, JsValue::Undefined);
        }
        self.elements[index] = value;
        true
    }

    pub fn set_length(&mut self, length: usize) -> bool {
        if length > MAX_ARRAY_LENGTH || length > self.elements.len() + MAX_DENSE_GROWTH {
            return false;
        }
        self.elements.resize(length, JsValue::Undefined);
        true
    }
}

impl Default for ArrayObject {
    fn default() -> Self {
        Self::new()
    }
}

fn is_length_key(key: &PropertyKey) -> bool {
    matches!(key, PropertyKey::Str(s) if s == "length")
}

impl JsObject for ArrayObject {
    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_own_property(&self, key: &PropertyKey) -> Option<JsValue> {
        if let Some(i) = key.as_array_index() {
            return self.elements.get(i).cloned();
        }
        if is_length_key(key) {
            return Some(JsValue::Number(self.elements.len() as f64));
        }
        self.base.get(key).map(|d| d.value.clone())
    }

    fn has_own_property(&self, key: &PropertyKey) -> bool {
        if let Some(i) = key.as_array_index() {
            return i < self.elements.len();
        }
        is_length_key(key) || self.base.contains(key)
    }

    fn set(&mut self, key: PropertyKey, value: JsValue) -> bool {
        if let Some(i) = key.as_array_index() {
            return self.set_index(i, value);
        }
        if is_length_key(&key) {
            return match value {
                JsValue::Number(n) if n >= 0.0 && n.fract() == 0.0 => self.set_length(n as usize),
                _ => false,
            };
        }
        ordinary_set(&mut self.base, key, value)
    }

    fn delete(&mut self, key: &PropertyKey) -> bool {
        if let Some(i) = key.as_array_index() {
            if i < self.elements.len() {
                self.elements[i] = JsValue::Undefined;
            }
            return true;
        }
        if is_length_key(key) {
            return false;
        }
        self.base.remove(key);
        true
    }

    fn own_property_keys(&self) -> Vec<PropertyKey> {
        let mut keys: Vec<PropertyKey> = (0..self.elements.len()).map(PropertyKey::from).collect();
        for k in self.base.keys() {
            if self.base.get(k).map(|d| d.enumerable).unwrap_or(false) {
                keys.push(k.clone());
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_index() {
        let mut a = ArrayObject::new();
        assert!(a.push(JsValue::Number(1.0)));
        assert!(a.push(JsValue::Number(2.0)));
        assert_eq!(a.len(), 2);
        assert_eq!(a.get_own_property(&PropertyKey::from("1")), Some(JsValue::Number(2.0)));
        assert_eq!(a.get_own_property(&PropertyKey::from("2")), None);
        assert_eq!(
            a.get_own_property(&PropertyKey::from("length")),
            Some(JsValue::Number(2.0))
        );
    }

    #[test]
    fn test_set_past_end_fills_with_undefined() {
        let mut a = ArrayObject::new();
        assert!(a.set(PropertyKey::from("3"), JsValue::Boolean(true)));
        assert_eq!(a.len(), 4);
        assert_eq!(a.get_index(0), Some(&JsValue::Undefined));
    }

    #[test]
    fn test_length_truncates() {
        let mut a = ArrayObject::from_list(vec![JsValue::Null, JsValue::Null, JsValue::Null]);
        assert!(a.set(PropertyKey::from("length"), JsValue::Number(1.0)));
        assert_eq!(a.len(), 1);
        assert!(!a.set(PropertyKey::from("length"), JsValue::Number(-1.0)));
    }

    #[test]
    fn test_huge_index_is_rejected() {
        let mut a = ArrayObject::new();
        assert!(!a.set(PropertyKey::from("4000000000"), JsValue::Null));
        assert!(!a.set_index(MAX_ARRAY_LENGTH, JsValue::Null));
        assert_eq!(a.len(), 0);
    }

    #[test]
    fn test_growth_per_write_is_capped() {
        let mut a = ArrayObject::new();
        assert!(!a.set_index(MAX_DENSE_GROWTH + 1, JsValue::Null));
        assert!(!a.set_length(MAX_DENSE_GROWTH + 1));
        assert_eq!(a.len(), 0);
        assert!(a.set_index(MAX_DENSE_GROWTH, JsValue::Null));
        assert_eq!(a.len(), MAX_DENSE_GROWTH + 1);
        assert!(a.set_length(2 * MAX_DENSE_GROWTH + 1));
        assert!(a.set_length(0));
    }

    #[test]
    fn test_named_properties_follow_indices() {
        let mut a = ArrayObject::from_list(vec![JsValue::Null]);
        a.set(PropertyKey::from("tag"), JsValue::Null);
        assert_eq!(
            a.own_property_keys(),
            vec![PropertyKey::from("0"), PropertyKey::from("tag")]
        );
    }
}
