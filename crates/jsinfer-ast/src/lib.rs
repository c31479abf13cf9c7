//! AST node model consumed by the inference engine.
//!
//! Parsing and symbol-table construction happen outside this workspace; the
//! engine receives nodes whose identifiers already carry their resolved
//! [`SymbolId`]s. Nodes expose a discriminant (the node kind) and
//! shape-specific children, which is all the refinement rules dispatch on.
//!
//! Function nodes are reference-counted so a `FunctionType` in the solver can
//! keep a backlink to its declaration without tying the type graph to the
//! lifetime of one AST traversal.

pub mod node;
pub mod ops;

pub use node::{FunctionBody, FunctionNode, Node, ObjectProperty};
pub use ops::{AssignmentOperator, BinaryOperator, LogicalOperator, UnaryOperator, UpdateOperator};
