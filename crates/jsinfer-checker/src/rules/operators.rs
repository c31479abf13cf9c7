//! Operator expressions and the binary operator table.
//!
//! The operand constraints per operator:
//!
//! ```text
//! + - * / % << >> >>> | ^ &  : (Maybe<number>, Maybe<number>) -> number
//! < <= > >=                  : (Maybe<number>, Maybe<number>) -> boolean
//! == != in instanceof        : (any, any)                     -> boolean
//! === !==                    : (T, T)                         -> boolean
//! ```
//!
//! `+` on strings is not supported.

use crate::context::InferenceContext;
use crate::error::InferenceError;
use crate::infer::RefinementRule;
use jsinfer_ast::{BinaryOperator, Node, UnaryOperator};
use jsinfer_solver::Type;

/// Apply the operator table to already-inferred operand types.
pub(crate) fn refine_operator(
    operator: BinaryOperator,
    left: &Type,
    right: &Type,
    ctx: &mut InferenceContext<'_, '_>,
) -> Result<Type, InferenceError> {
    use BinaryOperator::*;
    match operator {
        Add | Subtract | Multiply | Divide | Remainder | ShiftLeft | ShiftRight
        | ShiftRightUnsigned | BitwiseOr | BitwiseXor | BitwiseAnd => {
            constrain_numeric(left, right, ctx)?;
            Ok(Type::Number)
        }
        LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            constrain_numeric(left, right, ctx)?;
            Ok(Type::Boolean)
        }
        Equal | NotEqual | In | Instanceof => Ok(Type::Boolean),
        StrictEqual | StrictNotEqual => {
            ctx.unify(left, right)?;
            Ok(Type::Boolean)
        }
    }
}

fn constrain_numeric(
    left: &Type,
    right: &Type,
    ctx: &mut InferenceContext<'_, '_>,
) -> Result<(), InferenceError> {
    let operand = Type::maybe(Type::Number);
    ctx.unify(left, &operand)?;
    ctx.unify(&operand, right)?;
    Ok(())
}

/// Binary expressions like `5 + 2`.
#[derive(Debug)]
pub struct BinaryExpressionRule;

impl RefinementRule for BinaryExpressionRule {
    fn name(&self) -> &'static str {
        "binary-expression"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::BinaryExpression { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::BinaryExpression { operator, left, right } = node else {
            unreachable!("guarded by can_refine");
        };
        // Fresh copies: using a variable in an expression must not narrow
        // the variable itself. If x was null before `x + 1`, it still is.
        let left_type = ctx.infer(left)?.fresh();
        let right_type = ctx.infer(right)?.fresh();
        refine_operator(*operator, &left_type, &right_type, ctx)
    }
}

/// `&&` and `||` yield boolean; the operands are inferred for their effects.
#[derive(Debug)]
pub struct LogicalExpressionRule;

impl RefinementRule for LogicalExpressionRule {
    fn name(&self) -> &'static str {
        "logical-expression"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::LogicalExpression { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::LogicalExpression { left, right, .. } = node else {
            unreachable!("guarded by can_refine");
        };
        ctx.infer(left)?;
        ctx.infer(right)?;
        Ok(Type::Boolean)
    }
}

#[derive(Debug)]
pub struct UnaryExpressionRule;

impl RefinementRule for UnaryExpressionRule {
    fn name(&self) -> &'static str {
        "unary-expression"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::UnaryExpression { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::UnaryExpression { operator, argument } = node else {
            unreachable!("guarded by can_refine");
        };
        let argument_type = ctx.infer(argument)?;
        match operator {
            UnaryOperator::Void => Ok(Type::Void),
            UnaryOperator::Plus | UnaryOperator::Minus | UnaryOperator::BitwiseNot => {
                ctx.unify(&argument_type, &Type::Number)?;
                Ok(Type::Number)
            }
            UnaryOperator::Not => Ok(Type::Boolean),
            UnaryOperator::Typeof => Ok(Type::String),
            UnaryOperator::Delete => {
                Err(InferenceError::UnsupportedOperator { operator: operator.to_string() })
            }
        }
    }
}

/// `++` and `--` require a number-compatible operand and yield number.
#[derive(Debug)]
pub struct UpdateExpressionRule;

impl RefinementRule for UpdateExpressionRule {
    fn name(&self) -> &'static str {
        "update-expression"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::UpdateExpression { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::UpdateExpression { argument, .. } = node else {
            unreachable!("guarded by can_refine");
        };
        let argument_type = ctx.infer(argument)?;
        ctx.unify(&Type::maybe(Type::Number), &argument_type)?;
        Ok(Type::Number)
    }
}

/// `test ? consequent : alternate` unifies the two result types.
#[derive(Debug)]
pub struct ConditionalExpressionRule;

impl RefinementRule for ConditionalExpressionRule {
    fn name(&self) -> &'static str {
        "conditional-expression"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::ConditionalExpression { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::ConditionalExpression { test, consequent, alternate } = node else {
            unreachable!("guarded by can_refine");
        };
        ctx.infer(test)?;
        let consequent_type = ctx.infer(consequent)?;
        let alternate_type = ctx.infer(alternate)?;
        ctx.unify(&consequent_type, &alternate_type)
    }
}

/// A comma sequence has the type of its last expression.
#[derive(Debug)]
pub struct SequenceExpressionRule;

impl RefinementRule for SequenceExpressionRule {
    fn name(&self) -> &'static str {
        "sequence-expression"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::SequenceExpression { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::SequenceExpression { expressions } = node else {
            unreachable!("guarded by can_refine");
        };
        let mut ty = Type::Void;
        for expression in expressions {
            ty = ctx.infer(expression)?;
        }
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::TypeInference;
    use jsinfer_ast::{LogicalOperator, UpdateOperator};
    use jsinfer_binder::{SymbolFlags, SymbolTable};
    use jsinfer_common::intern;
    use pretty_assertions::assert_eq;

    #[test]
    fn logical_yields_boolean_and_applies_operand_effects() {
        let mut table = SymbolTable::new();
        let x = table.declare(intern("x"), SymbolFlags::BLOCK_SCOPED_VARIABLE);
        let engine = TypeInference::new();
        let mut ctx = engine.context(&mut table);
        ctx.set_type(x, Type::Null);

        let node = Node::LogicalExpression {
            operator: LogicalOperator::And,
            left: Box::new(Node::assign(Node::ident("x", x), Node::number(5.0))),
            right: Box::new(Node::boolean(true)),
        };
        assert_eq!(ctx.infer(&node).unwrap(), Type::Boolean);
        // the embedded assignment still hit the environment
        assert_eq!(ctx.get_type(x), Some(Type::maybe(Type::Number)));
    }

    #[test]
    fn an_empty_sequence_is_void() {
        let mut table = SymbolTable::new();
        let engine = TypeInference::new();
        let mut ctx = engine.context(&mut table);

        let node = Node::SequenceExpression { expressions: vec![] };
        assert_eq!(ctx.infer(&node).unwrap(), Type::Void);
    }

    #[test]
    fn a_sequence_has_the_type_of_its_last_expression() {
        let mut table = SymbolTable::new();
        let engine = TypeInference::new();
        let mut ctx = engine.context(&mut table);

        let node = Node::SequenceExpression {
            expressions: vec![Node::number(1.0), Node::string("a")],
        };
        assert_eq!(ctx.infer(&node).unwrap(), Type::String);
    }

    #[test]
    fn a_conditional_unifies_its_branches() {
        let mut table = SymbolTable::new();
        let engine = TypeInference::new();
        let mut ctx = engine.context(&mut table);

        let node = Node::ConditionalExpression {
            test: Box::new(Node::boolean(true)),
            consequent: Box::new(Node::NullLiteral),
            alternate: Box::new(Node::number(1.0)),
        };
        assert_eq!(ctx.infer(&node).unwrap(), Type::maybe(Type::Number));
    }

    #[test]
    fn unary_operators_follow_the_table() {
        let mut table = SymbolTable::new();
        let engine = TypeInference::new();
        let mut ctx = engine.context(&mut table);

        let unary = |operator, argument: Node| Node::UnaryExpression {
            operator,
            argument: Box::new(argument),
        };
        assert_eq!(
            ctx.infer(&unary(UnaryOperator::Minus, Node::number(1.0))).unwrap(),
            Type::Number
        );
        assert_eq!(
            ctx.infer(&unary(UnaryOperator::Not, Node::boolean(false))).unwrap(),
            Type::Boolean
        );
        assert_eq!(
            ctx.infer(&unary(UnaryOperator::Typeof, Node::number(1.0))).unwrap(),
            Type::String
        );
        assert_eq!(
            ctx.infer(&unary(UnaryOperator::Void, Node::number(1.0))).unwrap(),
            Type::Void
        );
        assert!(matches!(
            ctx.infer(&unary(UnaryOperator::Delete, Node::number(1.0))).unwrap_err(),
            InferenceError::UnsupportedOperator { .. }
        ));
    }

    #[test]
    fn update_requires_a_numeric_operand() {
        let mut table = SymbolTable::new();
        let x = table.declare(intern("x"), SymbolFlags::BLOCK_SCOPED_VARIABLE);
        let s = table.declare(intern("s"), SymbolFlags::BLOCK_SCOPED_VARIABLE);
        let engine = TypeInference::new();
        let mut ctx = engine.context(&mut table);
        ctx.set_type(x, Type::Number);
        ctx.set_type(s, Type::String);

        let increment = Node::UpdateExpression {
            operator: UpdateOperator::Increment,
            argument: Box::new(Node::ident("x", x)),
        };
        assert_eq!(ctx.infer(&increment).unwrap(), Type::Number);

        let bad = Node::UpdateExpression {
            operator: UpdateOperator::Decrement,
            argument: Box::new(Node::ident("s", s)),
        };
        assert!(matches!(ctx.infer(&bad).unwrap_err(), InferenceError::Unification(_)));
    }
}
