//! The built-in refinement rules.
//!
//! One rule per node shape (a few rules cover sibling shapes, like all four
//! literal kinds). The registry order is irrelevant for the built-in set as
//! the predicates are disjoint.

mod assignment;
mod functions;
mod identifiers;
mod literals;
mod objects;
mod operators;
mod statements;

use crate::infer::RefinementRule;

pub use functions::{CallExpressionRule, FunctionRule};

/// The default refinement rule registry.
pub fn default_rules() -> Vec<Box<dyn RefinementRule>> {
    vec![
        Box::new(literals::LiteralRule),
        Box::new(literals::TemplateLiteralRule),
        Box::new(identifiers::IdentifierRule),
        Box::new(identifiers::ThisExpressionRule),
        Box::new(objects::ObjectExpressionRule),
        Box::new(objects::ArrayExpressionRule),
        Box::new(objects::MemberExpressionRule),
        Box::new(operators::BinaryExpressionRule),
        Box::new(operators::LogicalExpressionRule),
        Box::new(operators::UnaryExpressionRule),
        Box::new(operators::UpdateExpressionRule),
        Box::new(operators::ConditionalExpressionRule),
        Box::new(operators::SequenceExpressionRule),
        Box::new(assignment::AssignmentExpressionRule),
        Box::new(functions::FunctionRule),
        Box::new(functions::CallExpressionRule::default()),
        Box::new(statements::BlockStatementRule),
        Box::new(statements::ExpressionStatementRule),
        Box::new(statements::VariableDeclarationRule),
        Box::new(statements::IfStatementRule),
        Box::new(statements::WhileStatementRule),
        Box::new(statements::ForStatementRule),
        Box::new(statements::ForOfStatementRule),
        Box::new(statements::ReturnStatementRule),
        Box::new(statements::ThrowStatementRule),
        Box::new(statements::BreakStatementRule),
    ]
}
