//! Symbols and the symbol arena.

use bitflags::bitflags;
use indexmap::IndexMap;
use jsinfer_common::Atom;
use std::fmt;

/// Index of a symbol in its [`SymbolTable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

bitflags! {
    /// Classification of a symbol, tested with bitwise AND.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct SymbolFlags: u32 {
        /// `var` declaration or function parameter.
        const FUNCTION_SCOPED_VARIABLE = 1 << 0;
        /// `let` / `const` declaration.
        const BLOCK_SCOPED_VARIABLE = 1 << 1;
        /// Property of a record.
        const PROPERTY = 1 << 2;
        /// Function declaration or expression.
        const FUNCTION = 1 << 3;
        /// The return-value slot of a function body.
        const RETURN = 1 << 4;
        /// Property whose name is not statically known (`obj[expr]`).
        /// Forces Any-typed, always-present access semantics on records.
        const COMPUTED = 1 << 5;
        /// Symbol without a source-level name (synthesized).
        const ANONYMOUS = 1 << 6;
        /// Declaration hoisted to the top of its scope.
        const HOISTED = 1 << 7;

        const VARIABLE = Self::FUNCTION_SCOPED_VARIABLE.bits() | Self::BLOCK_SCOPED_VARIABLE.bits();
    }
}

/// Opaque handle the engine uses to refer to AST nodes from symbols.
///
/// The binder records where a symbol was declared; the engine only carries
/// these through for diagnostics, so an index is all that is needed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef(pub u32);

/// A named, flagged declaration handle.
///
/// Immutable after creation except through the owning table's `&mut` methods;
/// the engine never mutates symbols during inference.
#[derive(Debug)]
pub struct Symbol {
    pub name: Atom,
    pub flags: SymbolFlags,
    /// Nested members, e.g. the symbol for `x` carries a member `y` once
    /// `x.y` has been seen. Keyed by member name.
    members: IndexMap<Atom, SymbolId>,
    /// Node where the symbol was declared, if any.
    pub declaration: Option<NodeRef>,
    /// First node that assigned a value to the symbol, if any.
    pub value_declaration: Option<NodeRef>,
}

impl Symbol {
    fn new(name: Atom, flags: SymbolFlags) -> Self {
        Self {
            name,
            flags,
            members: IndexMap::new(),
            declaration: None,
            value_declaration: None,
        }
    }

    /// True if the symbol's name is not statically known.
    pub fn is_computed(&self) -> bool {
        self.flags.contains(SymbolFlags::COMPUTED)
    }

    pub fn has_member(&self, name: Atom) -> bool {
        self.members.contains_key(&name)
    }

    pub fn get_member(&self, name: Atom) -> Option<SymbolId> {
        self.members.get(&name).copied()
    }

    pub fn members(&self) -> impl Iterator<Item = (Atom, SymbolId)> + '_ {
        self.members.iter().map(|(name, id)| (*name, *id))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())
    }
}

/// Arena owning every symbol of an analysis run.
///
/// Symbols are never deleted; their lifetime is the analysis pass.
#[derive(Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    /// Well-known slot for the return value of the function currently being
    /// analyzed.
    return_symbol: SymbolId,
    /// Well-known symbol standing in for all dynamically-named properties.
    computed_symbol: SymbolId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = Self {
            symbols: Vec::new(),
            return_symbol: SymbolId(0),
            computed_symbol: SymbolId(0),
        };
        table.return_symbol = table.declare(jsinfer_common::intern("return"), SymbolFlags::RETURN);
        table.computed_symbol = table.declare(
            jsinfer_common::intern("<computed>"),
            SymbolFlags::PROPERTY | SymbolFlags::COMPUTED | SymbolFlags::ANONYMOUS,
        );
        table
    }

    /// Create a new symbol and return its id.
    pub fn declare(&mut self, name: Atom, flags: SymbolFlags) -> SymbolId {
        let id = SymbolId(u32::try_from(self.symbols.len()).expect("symbol arena overflow"));
        self.symbols.push(Symbol::new(name, flags));
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    /// The return-value slot symbol.
    pub fn return_symbol(&self) -> SymbolId {
        self.return_symbol
    }

    /// The symbol standing in for computed (dynamically named) members.
    pub fn computed_symbol(&self) -> SymbolId {
        self.computed_symbol
    }

    /// Add `member` under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` already has a member with the same name. Duplicate
    /// members indicate a bug in the symbol-table builder, not a property of
    /// the analyzed program.
    pub fn add_member(&mut self, parent: SymbolId, member: SymbolId) {
        let name = self.get(member).name;
        let parent_symbol = self.get_mut(parent);
        assert!(
            !parent_symbol.has_member(name),
            "a member named '{name}' already exists on symbol '{}'",
            parent_symbol.name
        );
        parent_symbol.members.insert(name, member);
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
