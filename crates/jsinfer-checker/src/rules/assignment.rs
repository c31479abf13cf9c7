//! Assignment expressions.

use crate::context::InferenceContext;
use crate::error::InferenceError;
use crate::infer::RefinementRule;
use crate::rules::operators;
use jsinfer_ast::{AssignmentOperator, Node};
use jsinfer_binder::SymbolId;
use jsinfer_solver::Type;

/// `x = e`, `x.y = e`, and compound forms like `x += e`.
///
/// The assignee is bound to a fresh copy of the right-hand type: the value
/// may alias, but a later refinement of the source must not silently retype
/// the assignee. Re-assignment widens rather than overwrites: the new type is
/// unified with the existing binding, so `let x = null; x = 5` leaves x as
/// Maybe<number>.
#[derive(Debug)]
pub struct AssignmentExpressionRule;

impl RefinementRule for AssignmentExpressionRule {
    fn name(&self) -> &'static str {
        "assignment-expression"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::AssignmentExpression { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::AssignmentExpression { operator, left, right } = node else {
            unreachable!("guarded by can_refine");
        };

        let right_type = match operator {
            AssignmentOperator::Assign => ctx.infer(right)?,
            AssignmentOperator::Compound(op) => {
                let left_type = ctx.infer(left)?;
                let right_type = ctx.infer(right)?;
                operators::refine_operator(*op, &left_type, &right_type, ctx)?
            }
        };

        let assigned = right_type.fresh();
        match &**left {
            Node::MemberExpression { object, property } => {
                set_property_type(object, property, assigned, ctx)?;
            }
            Node::Identifier { name, symbol } => {
                let symbol =
                    symbol.ok_or(InferenceError::UsedBeforeDeclaration { name: *name })?;
                bind(symbol, assigned, ctx)?;
            }
            Node::ThisExpression { symbol } => {
                let symbol = symbol.ok_or(InferenceError::ThisOutsideFunction)?;
                bind(symbol, assigned, ctx)?;
            }
            other => {
                if let Some(symbol) = other.symbol() {
                    bind(symbol, assigned, ctx)?;
                }
            }
        }

        Ok(right_type)
    }
}

/// Bind an assignee symbol, widening against its previous type if it had one.
fn bind(
    symbol: SymbolId,
    assigned: Type,
    ctx: &mut InferenceContext<'_, '_>,
) -> Result<(), InferenceError> {
    let bound = match ctx.get_type(symbol) {
        Some(existing) => ctx.unify(&assigned, &existing)?,
        None => assigned,
    };
    ctx.set_type(symbol, bound);
    Ok(())
}

/// Write through a member target: add or update the property copy-on-write
/// and substitute the updated record across the environment, so every alias
/// of the record sees the new shape.
fn set_property_type(
    object: &Node,
    property: &Node,
    property_type: Type,
    ctx: &mut InferenceContext<'_, '_>,
) -> Result<(), InferenceError> {
    let property_symbol = ctx.property_symbol(property);
    let property_name = ctx.symbol(property_symbol).name;
    let object_type = ctx.object_type(object, property_name)?;
    if matches!(object_type, Type::Any) {
        return Ok(());
    }
    // Strings are readable through their builtins but never writable.
    if !matches!(object_type, Type::Record(_) | Type::Array(_)) {
        return Err(InferenceError::NotARecord(object_type));
    }

    let updated = if object_type.has_property(ctx.symbol(property_symbol)) {
        object_type.with_property_set(ctx.symbol(property_symbol), property_type)
    } else {
        object_type.with_property_added(ctx.symbol(property_symbol), property_type)
    };
    ctx.substitute(&object_type, &updated);
    Ok(())
}
