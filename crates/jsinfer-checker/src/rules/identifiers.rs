//! Identifier and `this` resolution.

use crate::context::InferenceContext;
use crate::error::InferenceError;
use crate::infer::RefinementRule;
use jsinfer_ast::Node;
use jsinfer_solver::Type;

/// Resolves an identifier through its symbol and the environment. The bare
/// identifier `undefined` is never symbol-bound and has type Void.
#[derive(Debug)]
pub struct IdentifierRule;

impl RefinementRule for IdentifierRule {
    fn name(&self) -> &'static str {
        "identifier"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::Identifier { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::Identifier { name, symbol } = node else {
            unreachable!("guarded by can_refine");
        };
        if name.as_str() == "undefined" {
            return Ok(Type::Void);
        }
        symbol
            .and_then(|symbol| ctx.get_type(symbol))
            .ok_or(InferenceError::UsedBeforeDeclaration { name: *name })
    }
}

/// `this` resolves through the symbol the binder assigned inside a function
/// body; anywhere else it is an error.
#[derive(Debug)]
pub struct ThisExpressionRule;

impl RefinementRule for ThisExpressionRule {
    fn name(&self) -> &'static str {
        "this"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::ThisExpression { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::ThisExpression { symbol } = node else {
            unreachable!("guarded by can_refine");
        };
        symbol
            .and_then(|symbol| ctx.get_type(symbol))
            .ok_or(InferenceError::ThisOutsideFunction)
    }
}
