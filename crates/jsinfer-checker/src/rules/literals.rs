//! Literals.

use crate::context::InferenceContext;
use crate::error::InferenceError;
use crate::infer::RefinementRule;
use jsinfer_ast::Node;
use jsinfer_solver::Type;

/// Number, string, boolean, and null literals.
#[derive(Debug)]
pub struct LiteralRule;

impl RefinementRule for LiteralRule {
    fn name(&self) -> &'static str {
        "literal"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(
            node,
            Node::NumberLiteral { .. }
                | Node::StringLiteral { .. }
                | Node::BooleanLiteral { .. }
                | Node::NullLiteral
        )
    }

    fn refine(
        &self,
        node: &Node,
        _: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        Ok(match node {
            Node::NumberLiteral { .. } => Type::Number,
            Node::StringLiteral { .. } => Type::String,
            Node::BooleanLiteral { .. } => Type::Boolean,
            Node::NullLiteral => Type::Null,
            _ => unreachable!("guarded by can_refine"),
        })
    }
}

/// Template literals are strings; the embedded expressions are still
/// inferred for their side effects on the environment.
#[derive(Debug)]
pub struct TemplateLiteralRule;

impl RefinementRule for TemplateLiteralRule {
    fn name(&self) -> &'static str {
        "template-literal"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::TemplateLiteral { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::TemplateLiteral { expressions } = node else {
            unreachable!("guarded by can_refine");
        };
        for expression in expressions {
            ctx.infer(expression)?;
        }
        Ok(Type::String)
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
    fn template_literals_are_strings_with_inferred_parts() {
        let mut table = SymbolTable::new();
        let x = table.declare(intern("x"), SymbolFlags::BLOCK_SCOPED_VARIABLE);
        let engine = TypeInference::new();
        let mut ctx = engine.context(&mut table);
        ctx.set_type(x, Type::Null);

        let node = Node::TemplateLiteral {
            expressions: vec![Node::assign(Node::ident("x", x), Node::number(5.0))],
        };
        assert_eq!(ctx.infer(&node).unwrap(), Type::String);
        // the embedded assignment still hit the environment
        assert_eq!(ctx.get_type(x), Some(Type::maybe(Type::Number)));
    }
}
