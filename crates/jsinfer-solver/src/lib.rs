//! Type lattice, unification engine, and type environment.
//!
//! The solver is independent of the AST walk: it deals in [`Type`] values,
//! [`TypeEnvironment`] bindings, and the [`TypeUnifier`] rule engine. The
//! checker crate drives it from the refinement rules.

pub mod environment;
pub mod record;
pub mod types;
pub mod unify;
pub mod unify_rules;

pub use environment::TypeEnvironment;
pub use record::{ArrayType, PropertyMap, RecordType};
pub use types::{FunctionType, MaybeType, Type, TypeId, TypeParameters};
pub use unify::{TypeUnifier, UnificationError, UnifyRule};
