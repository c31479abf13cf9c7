//! Symbol model for the jsinfer engine.
//!
//! Symbols are created once per declaration by the (external) symbol-table
//! builder and referenced from AST nodes. The inference engine only reads
//! them: the type a symbol resolves to lives in the solver's type
//! environment, not on the symbol itself.
//!
//! Symbols are arena-allocated; a [`SymbolId`] is an index into the owning
//! [`SymbolTable`]. Member maps are keyed by name so `x.y` and a later,
//! structurally rebuilt record type agree on which property they mean.

pub mod symbol;

pub use symbol::{NodeRef, Symbol, SymbolFlags, SymbolId, SymbolTable};
