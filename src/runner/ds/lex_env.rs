use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::env_record::EnvironmentRecordType;

pub type JsLexEnvironmentType = Rc<RefCell<LexEnvironment>>;

/// One link of the scope chain. `outer` is None only for the global environment.
pub struct LexEnvironment {
    pub inner: EnvironmentRecordType,
    pub outer: Option<JsLexEnvironmentType>,
}
