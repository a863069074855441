use std::collections::HashMap;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;

pub trait EnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool;
    fn create_mutable_binding(&mut self, name: String);
    fn create_immutable_binding(&mut self, name: String);
    fn initialize_binding(&mut self, name: &str, value: JsValue) -> bool;
    fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType>;
    fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType>;
    fn delete_binding(&mut self, name: &str) -> bool;
    /// Drops every binding. Used when the owning runtime shuts down.
    fn clear(&mut self);
}

pub enum EnvironmentRecordType {
    Declarative(DeclarativeEnvironmentRecord),
    Global(GlobalEnvironmentRecord),
}

impl EnvironmentRecordType {
    pub fn as_env_record(&self) -> &dyn EnvironmentRecord {
        match self {
            EnvironmentRecordType::Declarative(d) => d,
            EnvironmentRecordType::Global(d) => d,
        }
    }

    pub fn as_env_record_mut(&mut self) -> &mut dyn EnvironmentRecord {
        match self {
            EnvironmentRecordType::Declarative(d) => d,
            EnvironmentRecordType::Global(d) => d,
        }
    }

    pub fn clear(&mut self) {
        self.as_env_record_mut().clear();
    }
}

struct Binding {
    /// None until initialized; reading it before then is a TDZ error.
    value: Option<JsValue>,
    mutable: bool,
    deletable: bool,
}

pub struct DeclarativeEnvironmentRecord {
    bindings: HashMap<String, Binding>,
}

impl DeclarativeEnvironmentRecord {
    pub fn new() -> Self {
        DeclarativeEnvironmentRecord {
            bindings: HashMap::new(),
        }
    }

    /// Copies the current value of every binding. Used to give each loop
    /// iteration its own `let` bindings.
    pub fn snapshot(&self) -> DeclarativeEnvironmentRecord {
        let bindings = self
            .bindings
            .iter()
            .map(|(k, b)| {
                (
                    k.clone(),
                    Binding {
                        value: b.value.clone(),
                        mutable: b.mutable,
                        deletable: b.deletable,
                    },
                )
            })
            .collect();
        DeclarativeEnvironmentRecord { bindings }
    }

    pub fn names(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }
}

impl Default for DeclarativeEnvironmentRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentRecord for DeclarativeEnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    fn create_mutable_binding(&mut self, name: String) {
        self.bindings.entry(name).or_insert(Binding {
            value: None,
            mutable: true,
            deletable: false,
        });
    }

    fn create_immutable_binding(&mut self, name: String) {
        self.bindings.insert(
            name,
            Binding {
                value: None,
                mutable: false,
                deletable: false,
            },
        );
    }

    fn initialize_binding(&mut self, name: &str, value: JsValue) -> bool {
        match self.bindings.get_mut(name) {
            Some(b) => {
                b.value = Some(value);
                true
            }
            None => false,
        }
    }

    fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        match self.bindings.get_mut(name) {
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
            Some(b) => {
                if b.value.is_none() {
                    Err(JErrorType::ReferenceError(format!(
                        "Cannot access '{}' before initialization",
                        name
                    )))
                } else if !b.mutable {
                    Err(JErrorType::TypeError(
                        "Assignment to constant variable.".to_string(),
                    ))
                } else {
                    b.value = Some(value);
                    Ok(())
                }
            }
        }
    }

    fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        match self.bindings.get(name) {
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
            Some(Binding { value: None, .. }) => Err(JErrorType::ReferenceError(format!(
                "Cannot access '{}' before initialization",
                name
            ))),
            Some(Binding { value: Some(v), .. }) => Ok(v.clone()),
        }
    }

    fn delete_binding(&mut self, name: &str) -> bool {
        match self.bindings.get(name).map(|b| b.deletable) {
            Some(false) => false,
            Some(true) => {
                self.bindings.remove(name);
                true
            }
            None => true,
        }
    }

    fn clear(&mut self) {
        self.bindings.clear();
    }
}

/// The single name to value mapping at the root of every scope chain.
pub struct GlobalEnvironmentRecord {
    record: DeclarativeEnvironmentRecord,
}

impl GlobalEnvironmentRecord {
    pub fn new() -> Self {
        GlobalEnvironmentRecord {
            record: DeclarativeEnvironmentRecord::new(),
        }
    }

    /// Host-side write. Creates the binding or overwrites it, even if it was
    /// declared `const` by script.
    pub fn set_global(&mut self, name: &str, value: JsValue) {
        self.record.bindings.insert(
            name.to_string(),
            Binding {
                value: Some(value),
                mutable: true,
                deletable: true,
            },
        );
    }

    /// Host-side read. Missing and uninitialized bindings both read as None.
    pub fn get_global(&self, name: &str) -> Option<JsValue> {
        self.record.bindings.get(name).and_then(|b| b.value.clone())
    }

    /// Declares a `var` or function binding. An existing value is kept so a
    /// later script can redeclare a variable without resetting it.
    pub fn create_global_var_binding(&mut self, name: &str) {
        let b = self.record.bindings.entry(name.to_string()).or_insert(Binding {
            value: None,
            mutable: true,
            deletable: false,
        });
        b.mutable = true;
        if b.value.is_none() {
            b.value = Some(JsValue::Undefined);
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.record.names()
    }
}

impl Default for GlobalEnvironmentRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentRecord for GlobalEnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool {
        self.record.has_binding(name)
    }

    fn create_mutable_binding(&mut self, name: String) {
        self.record.bindings.insert(
            name,
            Binding {
                value: None,
                mutable: true,
                deletable: false,
            },
        );
    }

    fn create_immutable_binding(&mut self, name: String) {
        self.record.create_immutable_binding(name)
    }

    fn initialize_binding(&mut self, name: &str, value: JsValue) -> bool {
        self.record.initialize_binding(name, value)
    }

    fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        self.record.set_mutable_binding(name, value)
    }

    fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        self.record.get_binding_value(name)
    }

    fn delete_binding(&mut self, name: &str) -> bool {
        self.record.delete_binding(name)
    }

    fn clear(&mut self) {
        self.record.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_binding_is_tdz() {
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_mutable_binding("x".to_string());
        assert!(matches!(
            rec.get_binding_value("x"),
            Err(JErrorType::ReferenceError(_))
        ));
        assert!(rec.initialize_binding("x", JsValue::Number(1.0)));
        assert_eq!(rec.get_binding_value("x").unwrap(), JsValue::Number(1.0));
    }

    #[test]
    fn test_const_binding_rejects_assignment() {
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_immutable_binding("c".to_string());
        rec.initialize_binding("c", JsValue::Number(1.0));
        match rec.set_mutable_binding("c", JsValue::Number(2.0)) {
            Err(JErrorType::TypeError(msg)) => assert_eq!(msg, "Assignment to constant variable."),
            _ => panic!("expected a TypeError"),
        }
    }

    #[test]
    fn test_global_var_redeclaration_keeps_value() {
        let mut g = GlobalEnvironmentRecord::new();
        g.create_global_var_binding("v");
        assert_eq!(g.get_global("v"), Some(JsValue::Undefined));
        g.set_mutable_binding("v", JsValue::Number(5.0)).unwrap();
        g.create_global_var_binding("v");
        assert_eq!(g.get_global("v"), Some(JsValue::Number(5.0)));
    }

    #[test]
    fn test_host_set_overwrites() {
        let mut g = GlobalEnvironmentRecord::new();
        g.create_immutable_binding("k".to_string());
        g.initialize_binding("k", JsValue::Null);
        g.set_global("k", JsValue::Boolean(true));
        assert_eq!(g.get_global("k"), Some(JsValue::Boolean(true)));
        assert_eq!(g.get_global("missing"), None);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_mutable_binding("i".to_string());
        rec.initialize_binding("i", JsValue::Number(0.0));
        let mut copy = rec.snapshot();
        copy.set_mutable_binding("i", JsValue::Number(1.0)).unwrap();
        assert_eq!(rec.get_binding_value("i").unwrap(), JsValue::Number(0.0));
    }
}
