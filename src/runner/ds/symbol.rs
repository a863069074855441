use std::fmt;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// A symbol value. Identity comes from a random uuid, so two symbols created
/// with the same description are still distinct.
#[derive(Clone)]
pub struct SymbolData {
    id: Uuid,
    description: Option<String>,
}

impl SymbolData {
    pub fn new(description: Option<String>) -> Self {
        SymbolData {
            id: Uuid::new_v4(),
            description,
        }
    }

    pub fn new_empty() -> Self {
        Self::new(None)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for SymbolData {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for SymbolData {}

impl Hash for SymbolData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for SymbolData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or(""))
    }
}

impl fmt::Debug for SymbolData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?}, {})", self.description, self.id.to_hyphenated())
    }
}

/* Well known symbols */
lazy_static! {
    pub static ref SYMBOL_ITERATOR: SymbolData =
        SymbolData::new(Some("Symbol.iterator".to_string()));
    pub static ref SYMBOL_TO_STRING_TAG: SymbolData =
        SymbolData::new(Some("Symbol.toStringTag".to_string()));
}
