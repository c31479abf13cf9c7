//! Inference failures reported to the caller.
//!
//! These are diagnostics about the analyzed program. API misuse inside the
//! engine (adding a property twice, touching a builtin) panics instead, see
//! the solver crate.

use jsinfer_common::Atom;
use jsinfer_solver::{Type, UnificationError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("Type inference failure: {0}")]
    Unification(#[from] UnificationError),

    #[error("Type inference failure: the symbol {name} is being used before its declaration.")]
    UsedBeforeDeclaration { name: Atom },

    #[error("Type inference failure: access to this outside of a function.")]
    ThisOutsideFunction,

    #[error("Type inference failure: cannot invoke the non function type {callee}.")]
    NotInvocable { callee: Type },

    #[error(
        "Type inference failure: potential null pointer when accessing property {property} \
         on null or not initialized object of type {object}."
    )]
    NullPropertyAccess { property: Atom, object: Type },

    #[error(
        "Type inference failure: type {0} is not a record type and cannot be used as object."
    )]
    NotARecord(Type),

    #[error("Type inference failure: the type {0} does not support iteration.")]
    NotIterable(Type),

    #[error("Type inference failure: the operator {operator} is not supported.")]
    UnsupportedOperator { operator: String },

    #[error(
        "Type inference failure: there exists no refinement rule that can handle a node of \
         type {kind}."
    )]
    NoRefinementRule { kind: &'static str },

    #[error(
        "Type inference failure: the function cannot be called with this of type '{actual}' \
         whereas '{expected}' is required."
    )]
    IncompatibleThis { expected: Type, actual: Type },

    #[error(
        "Type inference failure: the argument {index} with type '{argument}' is not a subtype \
         of the required parameter type '{parameter}'."
    )]
    IncompatibleArgument { index: usize, argument: Type, parameter: Type },

    #[error(
        "Type inference failure: the return type '{actual}' of the callback is not a subtype \
         of the expected return type '{expected}'."
    )]
    IncompatibleCallbackReturn { expected: Type, actual: Type },
}
