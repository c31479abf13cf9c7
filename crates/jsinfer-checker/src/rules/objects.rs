//! Object literals, array literals, and member access.

use crate::context::InferenceContext;
use crate::error::InferenceError;
use crate::infer::RefinementRule;
use jsinfer_ast::Node;
use jsinfer_solver::{Type, UnificationError};

/// An object literal becomes a record with one typed property per entry.
#[derive(Debug)]
pub struct ObjectExpressionRule;

impl RefinementRule for ObjectExpressionRule {
    fn name(&self) -> &'static str {
        "object-expression"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::ObjectExpression { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::ObjectExpression { properties } = node else {
            unreachable!("guarded by can_refine");
        };
        let mut typed = Vec::with_capacity(properties.len());
        for property in properties {
            let name = ctx.symbol(property.symbol).name;
            let ty = ctx.infer(&property.value)?;
            typed.push((name, ty));
        }
        Ok(Type::record(typed))
    }
}

/// An array literal folds its elements into one element type, starting from
/// a fresh variable so empty arrays stay polymorphic. Elements with no
/// common type degrade the array to `Any[]`.
#[derive(Debug)]
pub struct ArrayExpressionRule;

impl RefinementRule for ArrayExpressionRule {
    fn name(&self) -> &'static str {
        "array-expression"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::ArrayExpression { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::ArrayExpression { elements } = node else {
            unreachable!("guarded by can_refine");
        };
        let mut element = Type::variable();
        for entry in elements {
            let entry_type = ctx.infer(entry)?;
            element = match ctx.unify(&entry_type, &element) {
                Ok(unified) => unified,
                Err(InferenceError::Unification(UnificationError::NotUnifiable { .. })) => {
                    Type::Any
                }
                Err(error) => return Err(error),
            };
        }
        Ok(Type::array(element))
    }
}

/// Member access reads a property off the object's record-shaped type.
///
/// Reading never changes the record: a missing property is simply Void
/// (`if (x.address)` is a legitimate existence test). Property writes are
/// the assignment rule's business.
#[derive(Debug)]
pub struct MemberExpressionRule;

impl RefinementRule for MemberExpressionRule {
    fn name(&self) -> &'static str {
        "member-expression"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::MemberExpression { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::MemberExpression { object, property } = node else {
            unreachable!("guarded by can_refine");
        };
        let property_symbol = ctx.property_symbol(property);
        let property_name = ctx.symbol(property_symbol).name;
        let object_type = ctx.object_type(object, property_name)?;
        if matches!(object_type, Type::Any) {
            return Ok(Type::Any);
        }
        Ok(object_type.property_type(ctx.symbol(property_symbol)).unwrap_or(Type::Void))
    }
}
