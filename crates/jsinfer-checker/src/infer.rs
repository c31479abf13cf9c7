//! The refinement dispatcher.
//!
//! `TypeInference` owns the unifier and an ordered list of refinement rules.
//! Dispatch is by node shape: the first rule whose `can_refine` accepts the
//! node refines it. New node shapes are handled by registering a rule, the
//! dispatcher never changes.

use crate::context::InferenceContext;
use crate::error::InferenceError;
use crate::rules;
use jsinfer_ast::Node;
use jsinfer_binder::SymbolTable;
use jsinfer_solver::{Type, TypeUnifier};
use std::fmt;
use tracing::trace;

/// One refinement rule: recognizes a node shape and infers its type.
pub trait RefinementRule: fmt::Debug {
    /// Rule name, for diagnostics and traces.
    fn name(&self) -> &'static str;

    fn can_refine(&self, node: &Node) -> bool;

    /// Infer the node's type. `ctx` re-enters the dispatcher for children.
    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError>;
}

/// The inference engine: unifier plus refinement rule registry.
#[derive(Debug)]
pub struct TypeInference {
    unifier: TypeUnifier,
    rules: Vec<Box<dyn RefinementRule>>,
}

impl Default for TypeInference {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInference {
    pub fn new() -> Self {
        Self::with_rules(TypeUnifier::new(), rules::default_rules())
    }

    /// An engine with a custom unifier and rule list, first match wins.
    pub fn with_rules(unifier: TypeUnifier, rules: Vec<Box<dyn RefinementRule>>) -> Self {
        Self { unifier, rules }
    }

    pub fn unifier(&self) -> &TypeUnifier {
        &self.unifier
    }

    /// A context for one analysis run over `symbols`, starting from an empty
    /// type environment.
    pub fn context<'a>(&'a self, symbols: &'a mut SymbolTable) -> InferenceContext<'a, 'a> {
        InferenceContext::new(self, symbols)
    }

    /// Dispatch `node` to the first matching refinement rule.
    pub fn infer(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let rule = self
            .rules
            .iter()
            .find(|rule| rule.can_refine(node))
            .ok_or(InferenceError::NoRefinementRule { kind: node.kind_name() })?;
        trace!(rule = rule.name(), node = node.kind_name(), "refining");
        rule.refine(node, ctx)
    }
}
