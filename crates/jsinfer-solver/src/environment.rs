//! The type environment: the symbol-to-type mapping threaded through
//! inference.
//!
//! The environment is a value: every operation returns a new environment and
//! never mutates the receiver, so control-flow analysis can fork a branch
//! environment and later merge it without bookkeeping. Unchanged
//! environments are returned as-is.

use crate::types::Type;
use indexmap::IndexMap;
use jsinfer_binder::{SymbolId, SymbolTable};
use rustc_hash::FxBuildHasher;
use std::io::{self, Write};
use tracing::trace;

/// Maps symbols to their currently known types.
#[derive(Clone, Debug, Default)]
pub struct TypeEnvironment {
    mappings: IndexMap<SymbolId, Type, FxBuildHasher>,
}

impl TypeEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// A new environment with `symbol` bound to `ty`.
    #[must_use]
    pub fn set_type(&self, symbol: SymbolId, ty: Type) -> Self {
        let mut mappings = self.mappings.clone();
        mappings.insert(symbol, ty);
        Self { mappings }
    }

    pub fn get_type(&self, symbol: SymbolId) -> Option<&Type> {
        self.mappings.get(&symbol)
    }

    pub fn has_type(&self, symbol: SymbolId) -> bool {
        self.mappings.contains_key(&symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Type)> {
        self.mappings.iter().map(|(symbol, ty)| (*symbol, ty))
    }

    /// Replace every occurrence of `old` with `new` across all bindings.
    ///
    /// Substitution chains: when a binding's type is rebuilt, other bindings
    /// that embed that same logical type are rewritten too, so a resolved
    /// variable propagates through every type that mentions it.
    #[must_use]
    pub fn substitute(&self, old: &Type, new: &Type) -> Self {
        if old.same(new) && old.equals(new) {
            return self.clone();
        }
        trace!(old = %old, new = %new, "substituting in environment");

        let mut mappings = self.mappings.clone();
        let mut changed = false;
        let mut worklist = vec![(old.clone(), new.clone())];

        while let Some((old, new)) = worklist.pop() {
            for ty in mappings.values_mut() {
                let substituted = ty.substitute(&old, &new);
                if substituted.equals(ty) {
                    continue;
                }
                changed = true;
                // A composite binding changed shape: everything embedding it
                // must be rewritten as well. The binding that *was* the old
                // type needs no follow-up, the first pass already covers it.
                if !ty.same(&old) {
                    worklist.push((ty.clone(), substituted.clone()));
                }
                *ty = substituted;
            }
        }

        if changed { Self { mappings } } else { self.clone() }
    }

    /// Bindings absent from `before` or mapped to a different type there.
    #[must_use]
    pub fn difference(&self, before: &Self) -> Self {
        let mappings: IndexMap<SymbolId, Type, FxBuildHasher> = self
            .mappings
            .iter()
            .filter(|(symbol, ty)| {
                !before.get_type(**symbol).is_some_and(|previous| previous.equals(ty))
            })
            .map(|(symbol, ty)| (*symbol, ty.clone()))
            .collect();
        Self { mappings }
    }

    /// Adopt every binding of `other` that this environment lacks. Existing
    /// bindings keep their type.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        let mut mappings = self.mappings.clone();
        let mut changed = false;
        for (symbol, ty) in &other.mappings {
            if !mappings.contains_key(symbol) {
                mappings.insert(*symbol, ty.clone());
                changed = true;
            }
        }
        if changed { Self { mappings } } else { self.clone() }
    }

    /// Replace the types of symbols this environment already binds with the
    /// types `new_types` gives them, except for `excluded` symbols. New
    /// symbols in `new_types` are not adopted. Replacements propagate like
    /// [`TypeEnvironment::substitute`].
    #[must_use]
    pub fn replace_types(&self, new_types: &Self, excluded: &[SymbolId]) -> Self {
        let mut result = self.clone();
        for (symbol, ty) in &self.mappings {
            if excluded.contains(symbol) {
                continue;
            }
            if let Some(new_type) = new_types.get_type(*symbol) {
                if !new_type.equals(ty) {
                    result = result.substitute(ty, new_type);
                }
            }
        }
        result
    }

    /// Write all bindings, sorted by symbol name, for debugging.
    pub fn dump(&self, symbols: &SymbolTable, out: &mut impl Write) -> io::Result<()> {
        let mut sorted: Vec<_> = self.mappings.iter().collect();
        sorted.sort_by_key(|(symbol, _)| symbols.get(**symbol).name.as_str());
        for (symbol, ty) in sorted {
            writeln!(out, "{} -> {}", symbols.get(*symbol).name, ty)?;
        }
        Ok(())
    }
}

impl PartialEq for TypeEnvironment {
    fn eq(&self, other: &Self) -> bool {
        self.mappings == other.mappings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsinfer_binder::SymbolFlags;
    use jsinfer_common::intern;
    use pretty_assertions::assert_eq;

    fn symbols(names: &[&str]) -> (SymbolTable, Vec<SymbolId>) {
        let mut table = SymbolTable::new();
        let ids = names
            .iter()
            .map(|name| table.declare(intern(name), SymbolFlags::VARIABLE))
            .collect();
        (table, ids)
    }

    #[test]
    fn set_type_leaves_the_receiver_unchanged() {
        let (_, ids) = symbols(&["x"]);
        let empty = TypeEnvironment::new();
        let bound = empty.set_type(ids[0], Type::Number);
        assert!(!empty.has_type(ids[0]));
        assert_eq!(bound.get_type(ids[0]), Some(&Type::Number));
    }

    #[test]
    fn substitute_resolves_a_variable_everywhere() {
        let (_, ids) = symbols(&["x", "xs"]);
        let v = Type::variable();
        let env = TypeEnvironment::new()
            .set_type(ids[0], v.clone())
            .set_type(ids[1], Type::array(v.clone()));

        let resolved = env.substitute(&v, &Type::String);
        assert_eq!(resolved.get_type(ids[0]), Some(&Type::String));
        assert_eq!(resolved.get_type(ids[1]), Some(&Type::array(Type::String)));
    }

    #[test]
    fn substitute_chains_through_embedding_types() {
        // f's return type embeds xs's type; resolving xs's element must
        // update f as well.
        let (_, ids) = symbols(&["xs", "f"]);
        let v = Type::variable();
        let xs = Type::array(v.clone());
        let f = Type::function(Type::Void, vec![], xs.clone());
        let env = TypeEnvironment::new()
            .set_type(ids[0], xs)
            .set_type(ids[1], f);

        let resolved = env.substitute(&v, &Type::Number);
        assert_eq!(resolved.get_type(ids[0]), Some(&Type::array(Type::Number)));
        match resolved.get_type(ids[1]) {
            Some(Type::Function(function)) => {
                assert_eq!(function.return_type, Type::array(Type::Number));
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn difference_keeps_new_and_changed_bindings() {
        let (_, ids) = symbols(&["unchanged", "changed", "added"]);
        let before = TypeEnvironment::new()
            .set_type(ids[0], Type::Number)
            .set_type(ids[1], Type::variable());
        let after = before
            .set_type(ids[1], Type::String)
            .set_type(ids[2], Type::Boolean);

        let diff = after.difference(&before);
        assert!(!diff.has_type(ids[0]));
        assert_eq!(diff.get_type(ids[1]), Some(&Type::String));
        assert_eq!(diff.get_type(ids[2]), Some(&Type::Boolean));
    }

    #[test]
    fn add_never_overrides_existing_bindings() {
        let (_, ids) = symbols(&["x", "y"]);
        let left = TypeEnvironment::new().set_type(ids[0], Type::Number);
        let right = TypeEnvironment::new()
            .set_type(ids[0], Type::String)
            .set_type(ids[1], Type::Boolean);

        let merged = left.add(&right);
        assert_eq!(merged.get_type(ids[0]), Some(&Type::Number));
        assert_eq!(merged.get_type(ids[1]), Some(&Type::Boolean));
    }

    #[test]
    fn replace_types_honors_exclusions_and_ignores_new_symbols() {
        let (_, ids) = symbols(&["x", "pinned", "other"]);
        let env = TypeEnvironment::new()
            .set_type(ids[0], Type::variable())
            .set_type(ids[1], Type::variable());
        let new_types = TypeEnvironment::new()
            .set_type(ids[0], Type::Number)
            .set_type(ids[1], Type::String)
            .set_type(ids[2], Type::Boolean);

        let replaced = env.replace_types(&new_types, &[ids[1]]);
        assert_eq!(replaced.get_type(ids[0]), Some(&Type::Number));
        assert!(replaced.get_type(ids[1]).is_some_and(Type::is_variable));
        assert!(!replaced.has_type(ids[2]));
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let (_, ids) = symbols(&["x", "y"]);
        let a = TypeEnvironment::new()
            .set_type(ids[0], Type::Number)
            .set_type(ids[1], Type::String);
        let b = TypeEnvironment::new()
            .set_type(ids[1], Type::String)
            .set_type(ids[0], Type::Number);
        assert_eq!(a, b);
    }

    #[test]
    fn dump_is_sorted_by_name() {
        let (table, ids) = symbols(&["zeta", "alpha"]);
        let env = TypeEnvironment::new()
            .set_type(ids[0], Type::Number)
            .set_type(ids[1], Type::String);
        let mut out = Vec::new();
        env.dump(&table, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "alpha -> string\nzeta -> number\n");
    }
}
