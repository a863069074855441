use std::fmt;
use std::fmt::{Display, Formatter};

use crate::runner::ds::symbol::SymbolData;
use crate::runner::ds::value::JsValue;

/// Arrays never grow past this many elements.
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

/// Most slots a single index write, `length` store or `Array(n)` may add.
/// Longer arrays have to be grown step by step.
pub const MAX_DENSE_GROWTH: usize = 1 << 16;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Str(String),
    Sym(SymbolData),
}

impl PropertyKey {
    /// Returns the index when the key is a canonical array index ("0", "17", but not "017").
    pub fn as_array_index(&self) -> Option<usize> {
        match self {
            PropertyKey::Str(s) => {
                if s.is_empty() || s.len() > 10 || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                if s.len() > 1 && s.starts_with('0') {
                    return None;
                }
                s.parse::<u64>().ok().and_then(|i| {
                    if i < u32::MAX as u64 {
                        Some(i as usize)
                    } else {
                        None
                    }
                })
            }
            PropertyKey::Sym(_) => None,
        }
    }
}

impl Display for PropertyKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Str(s) => write!(f, "{}", s),
            PropertyKey::Sym(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::Str(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::Str(s)
    }
}

impl From<usize> for PropertyKey {
    fn from(i: usize) -> Self {
        PropertyKey::Str(i.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct PropertyDescriptor {
    pub value: JsValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl PropertyDescriptor {
    /// Descriptor for properties created by plain assignment.
    pub fn new_data(value: JsValue) -> Self {
        PropertyDescriptor {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Writable but skipped by key enumeration, used for built-in methods.
    pub fn new_hidden(value: JsValue) -> Self {
        PropertyDescriptor {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    pub fn new_read_only(value: JsValue) -> Self {
        PropertyDescriptor {
            value,
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }
}
