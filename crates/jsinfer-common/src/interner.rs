//! Global string interner.
//!
//! An [`Atom`] is an index into a process-wide table of unique strings.
//! Interning the same string twice yields the same `Atom`, so name equality
//! is an integer comparison and atoms can be used directly as map keys.
//!
//! The table is append-only; interned strings live for the remainder of the
//! process. Analysis runs intern a bounded set of identifiers, so this is an
//! acceptable trade for lock-free reads on `as_str`.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::RwLock;

/// Interned string handle.
///
/// Ordering follows interning order, not lexicographic order; use
/// [`Atom::as_str`] when a stable textual ordering is needed.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

static INTERNER: Lazy<Interner> = Lazy::new(Interner::default);

#[derive(Default)]
struct Interner {
    map: DashMap<&'static str, Atom, rustc_hash::FxBuildHasher>,
    strings: RwLock<Vec<&'static str>>,
}

impl Interner {
    fn intern(&self, text: &str) -> Atom {
        if let Some(existing) = self.map.get(text) {
            return *existing;
        }

        let mut strings = self.strings.write().unwrap_or_else(|e| e.into_inner());
        // Re-check under the write lock: another thread may have raced us here.
        if let Some(existing) = self.map.get(text) {
            return *existing;
        }

        let leaked: &'static str = Box::leak(text.to_owned().into_boxed_str());
        let atom = Atom(u32::try_from(strings.len()).expect("interner table overflow"));
        strings.push(leaked);
        self.map.insert(leaked, atom);
        atom
    }

    fn resolve(&self, atom: Atom) -> &'static str {
        let strings = self.strings.read().unwrap_or_else(|e| e.into_inner());
        strings[atom.0 as usize]
    }
}

/// Intern a string, returning its atom.
pub fn intern(text: &str) -> Atom {
    INTERNER.intern(text)
}

impl Atom {
    /// The interned text.
    pub fn as_str(self) -> &'static str {
        INTERNER.resolve(self)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({:?})", self.as_str())
    }
}

impl From<&str> for Atom {
    fn from(text: &str) -> Self {
        intern(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let a = intern("length");
        let b = intern("length");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "length");
    }

    #[test]
    fn distinct_strings_get_distinct_atoms() {
        assert_ne!(intern("name"), intern("age"));
    }

    #[test]
    fn atoms_render_as_their_text() {
        assert_eq!(intern("charAt").to_string(), "charAt");
    }
}
