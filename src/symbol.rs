//! The global symbol intern table.
//!
//! Each distinct symbol name maps to exactly one [`Symbol`] handle, so symbol
//! equality is plain handle equality and symbols are cheap to copy, hash, and
//! use as environment keys. The table is populated on first use and entries
//! are never evicted.

use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, Mutex};

/// A canonical handle for an interned symbol name.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

struct InternTable {
    ids: HashMap<&'static str, Symbol>,
    names: Vec<&'static str>,
}

static TABLE: LazyLock<Mutex<InternTable>> = LazyLock::new(|| {
    Mutex::new(InternTable {
        ids: HashMap::new(),
        names: Vec::new(),
    })
});

/// The canonical symbol named NAME, creating it on first use.
pub fn intern(name: &str) -> Symbol {
    let mut table = TABLE.lock().expect("symbol table lock poisoned");
    if let Some(&symbol) = table.ids.get(name) {
        return symbol;
    }
    // Names live for the life of the process; symbols are never evicted.
    let leaked: &'static str = Box::leak(name.to_owned().into_boxed_str());
    let symbol = Symbol(table.names.len() as u32);
    table.names.push(leaked);
    table.ids.insert(leaked, symbol);
    symbol
}

impl Symbol {
    pub fn name(self) -> &'static str {
        TABLE.lock().expect("symbol table lock poisoned").names[self.0 as usize]
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_canonical() {
        let a = intern("canonical-test-symbol");
        let b = intern("canonical-test-symbol");
        let c = intern("canonical-test-other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.name(), "canonical-test-symbol");
        assert_eq!(format!("{a}"), "canonical-test-symbol");
    }

    #[test]
    fn test_intern_preserves_case() {
        let lower = intern("case-probe");
        let upper = intern("CASE-PROBE");
        assert_ne!(lower, upper);
    }
}
