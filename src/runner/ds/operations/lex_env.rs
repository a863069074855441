use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::env_record::{
    DeclarativeEnvironmentRecord, EnvironmentRecordType, GlobalEnvironmentRecord,
};
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment};

pub fn new_declarative_environment(outer_lex: Option<JsLexEnvironmentType>) -> JsLexEnvironmentType {
    Rc::new(RefCell::new(LexEnvironment {
        inner: EnvironmentRecordType::Declarative(DeclarativeEnvironmentRecord::new()),
        outer: outer_lex,
    }))
}

pub fn new_global_environment() -> JsLexEnvironmentType {
    Rc::new(RefCell::new(LexEnvironment {
        inner: EnvironmentRecordType::Global(GlobalEnvironmentRecord::new()),
        outer: None,
    }))
}

/// Walks the chain from `lex` outwards and returns the first environment
/// that has a binding for `name`.
pub fn get_identifier_reference(
    lex: &JsLexEnvironmentType,
    name: &str,
) -> Option<JsLexEnvironmentType> {
    let mut current = Some(lex.clone());
    while let Some(env) = current {
        if env.borrow().inner.as_env_record().has_binding(name) {
            return Some(env);
        }
        current = env.borrow().outer.clone();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::value::JsValue;

    #[test]
    fn test_inner_binding_shadows_outer() {
        let global = new_global_environment();
        global
            .borrow_mut()
            .inner
            .as_env_record_mut()
            .create_mutable_binding("x".to_string());
        let inner = new_declarative_environment(Some(global.clone()));
        {
            let mut e = inner.borrow_mut();
            let rec = e.inner.as_env_record_mut();
            rec.create_mutable_binding("x".to_string());
            rec.initialize_binding("x", JsValue::Number(2.0));
        }
        let found = get_identifier_reference(&inner, "x").unwrap();
        assert!(Rc::ptr_eq(&found, &inner));
        assert!(get_identifier_reference(&inner, "y").is_none());
    }
}
