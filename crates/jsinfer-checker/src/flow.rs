//! Forward flow analysis over statement sequences.
//!
//! The refinement rules handle the value side of statements (an if rule
//! infers its test, a while rule its condition); the flow analyzer handles
//! the control side: it walks statement sequences, forks the environment
//! into branches, and merges the branch results back. Merging unifies
//! conflicting bindings, so a record property added in only one branch is
//! dropped by the record meet.
//!
//! Loop bodies are analyzed once in a fork and merged back; there is no
//! fixpoint iteration.

use crate::context::InferenceContext;
use crate::error::InferenceError;
use jsinfer_ast::Node;
use jsinfer_binder::SymbolId;
use jsinfer_solver::{Type, TypeEnvironment};

#[derive(Debug)]
pub struct FlowAnalyzer;

impl FlowAnalyzer {
    /// Analyze a statement sequence in order.
    pub fn analyze(
        statements: &[Node],
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<(), InferenceError> {
        for statement in statements {
            Self::analyze_statement(statement, ctx)?;
        }
        Ok(())
    }

    /// Analyze one statement, descending into nested control flow.
    pub fn analyze_statement(
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<(), InferenceError> {
        match node {
            Node::Program { body } | Node::BlockStatement { body } => Self::analyze(body, ctx),
            Node::IfStatement { consequent, alternate, .. } => {
                // the rule infers the test in the pre-branch environment
                ctx.infer(node)?;
                let base = ctx.environment.clone();
                let then_env = Self::branch(consequent, ctx)?;
                let else_env = match alternate {
                    Some(alternate) => Self::branch(alternate, ctx)?,
                    None => base,
                };
                ctx.environment = then_env;
                Self::merge(ctx, &else_env)
            }
            Node::WhileStatement { body, .. }
            | Node::DoWhileStatement { body, .. }
            | Node::ForStatement { body, .. }
            | Node::ForOfStatement { body, .. } => {
                ctx.infer(node)?;
                let body_env = Self::branch(body, ctx)?;
                Self::merge(ctx, &body_env)
            }
            _ => {
                ctx.infer(node)?;
                Ok(())
            }
        }
    }

    fn branch(
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<TypeEnvironment, InferenceError> {
        let mut fork = ctx.fork();
        Self::analyze_statement(node, &mut fork)?;
        Ok(fork.environment)
    }

    /// Merge `other` into the context's environment: missing bindings are
    /// adopted, conflicting bindings are unified and the unification result
    /// substituted environment-wide.
    pub fn merge(
        ctx: &mut InferenceContext<'_, '_>,
        other: &TypeEnvironment,
    ) -> Result<(), InferenceError> {
        let bindings: Vec<(SymbolId, Type)> =
            other.iter().map(|(symbol, ty)| (symbol, ty.clone())).collect();
        for (symbol, ty) in bindings {
            match ctx.get_type(symbol) {
                None => ctx.set_type(symbol, ty),
                Some(existing) => {
                    let unified = ctx.unify(&ty, &existing)?;
                    ctx.substitute(&existing, &unified);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::TypeInference;
    use jsinfer_binder::{SymbolFlags, SymbolTable};
    use jsinfer_common::intern;
    use pretty_assertions::assert_eq;

    #[test]
    fn merge_adopts_missing_bindings() {
        let mut table = SymbolTable::new();
        let x = table.declare(intern("x"), SymbolFlags::BLOCK_SCOPED_VARIABLE);
        let engine = TypeInference::new();
        let mut ctx = engine.context(&mut table);

        let other = TypeEnvironment::new().set_type(x, Type::Number);
        FlowAnalyzer::merge(&mut ctx, &other).unwrap();

        assert_eq!(ctx.get_type(x), Some(Type::Number));
    }

    #[test]
    fn merge_unifies_conflicting_bindings() {
        let mut table = SymbolTable::new();
        let x = table.declare(intern("x"), SymbolFlags::BLOCK_SCOPED_VARIABLE);
        let engine = TypeInference::new();
        let mut ctx = engine.context(&mut table);
        ctx.set_type(x, Type::Null);

        let other = TypeEnvironment::new().set_type(x, Type::Number);
        FlowAnalyzer::merge(&mut ctx, &other).unwrap();

        assert_eq!(ctx.get_type(x), Some(Type::maybe(Type::Number)));
    }
}
