//! AST nodes.

use crate::ops::{
    AssignmentOperator, BinaryOperator, LogicalOperator, UnaryOperator, UpdateOperator,
};
use jsinfer_binder::SymbolId;
use jsinfer_common::Atom;
use std::sync::Arc;

/// One property entry of an object expression.
///
/// The binder has already created a property symbol for the key; the value is
/// inferred by the engine.
#[derive(Clone, Debug)]
pub struct ObjectProperty {
    pub symbol: SymbolId,
    pub value: Node,
}

/// Body of a function: a single expression (arrow shorthand) or a statement
/// block.
#[derive(Clone, Debug)]
pub enum FunctionBody {
    Expression(Node),
    Block(Vec<Node>),
}

/// A function declaration or expression.
///
/// Shared via `Arc` so a `FunctionType` can point back at its declaration
/// after the enclosing traversal has moved on.
#[derive(Clone, Debug)]
pub struct FunctionNode {
    /// Symbol of the function itself (named declarations); `None` for
    /// anonymous expressions.
    pub symbol: Option<SymbolId>,
    /// Symbol bound to `this` inside the body, when the body mentions it.
    pub this_symbol: Option<SymbolId>,
    /// Parameter identifiers, in order. Each carries its own symbol.
    pub params: Vec<Node>,
    pub body: FunctionBody,
}

/// An AST node.
///
/// The set of shapes mirrors what the refinement rules dispatch on; adding a
/// new shape means registering a new rule, not editing existing ones.
#[derive(Clone, Debug)]
pub enum Node {
    Program { body: Vec<Node> },

    // Statements
    BlockStatement { body: Vec<Node> },
    ExpressionStatement { expression: Box<Node> },
    VariableDeclaration { declarations: Vec<Node> },
    VariableDeclarator { id: Box<Node>, init: Option<Box<Node>> },
    IfStatement { test: Box<Node>, consequent: Box<Node>, alternate: Option<Box<Node>> },
    WhileStatement { test: Box<Node>, body: Box<Node> },
    DoWhileStatement { body: Box<Node>, test: Box<Node> },
    ForStatement {
        init: Option<Box<Node>>,
        test: Option<Box<Node>>,
        update: Option<Box<Node>>,
        body: Box<Node>,
    },
    ForOfStatement { left: Box<Node>, right: Box<Node>, body: Box<Node> },
    ReturnStatement { argument: Option<Box<Node>> },
    ThrowStatement { argument: Box<Node> },
    BreakStatement,

    // Expressions
    Identifier { name: Atom, symbol: Option<SymbolId> },
    ThisExpression { symbol: Option<SymbolId> },
    NumberLiteral { value: f64 },
    StringLiteral { value: Atom },
    BooleanLiteral { value: bool },
    NullLiteral,
    TemplateLiteral { expressions: Vec<Node> },
    ObjectExpression { properties: Vec<ObjectProperty> },
    ArrayExpression { elements: Vec<Node> },
    MemberExpression { object: Box<Node>, property: Box<Node> },
    AssignmentExpression { operator: AssignmentOperator, left: Box<Node>, right: Box<Node> },
    BinaryExpression { operator: BinaryOperator, left: Box<Node>, right: Box<Node> },
    LogicalExpression { operator: LogicalOperator, left: Box<Node>, right: Box<Node> },
    UnaryExpression { operator: UnaryOperator, argument: Box<Node> },
    UpdateExpression { operator: UpdateOperator, argument: Box<Node> },
    ConditionalExpression { test: Box<Node>, consequent: Box<Node>, alternate: Box<Node> },
    SequenceExpression { expressions: Vec<Node> },
    CallExpression { callee: Box<Node>, arguments: Vec<Node> },
    Function(Arc<FunctionNode>),
}

impl Node {
    /// The node's discriminant name, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Program { .. } => "Program",
            Self::BlockStatement { .. } => "BlockStatement",
            Self::ExpressionStatement { .. } => "ExpressionStatement",
            Self::VariableDeclaration { .. } => "VariableDeclaration",
            Self::VariableDeclarator { .. } => "VariableDeclarator",
            Self::IfStatement { .. } => "IfStatement",
            Self::WhileStatement { .. } => "WhileStatement",
            Self::DoWhileStatement { .. } => "DoWhileStatement",
            Self::ForStatement { .. } => "ForStatement",
            Self::ForOfStatement { .. } => "ForOfStatement",
            Self::ReturnStatement { .. } => "ReturnStatement",
            Self::ThrowStatement { .. } => "ThrowStatement",
            Self::BreakStatement => "BreakStatement",
            Self::Identifier { .. } => "Identifier",
            Self::ThisExpression { .. } => "ThisExpression",
            Self::NumberLiteral { .. } => "NumberLiteral",
            Self::StringLiteral { .. } => "StringLiteral",
            Self::BooleanLiteral { .. } => "BooleanLiteral",
            Self::NullLiteral => "NullLiteral",
            Self::TemplateLiteral { .. } => "TemplateLiteral",
            Self::ObjectExpression { .. } => "ObjectExpression",
            Self::ArrayExpression { .. } => "ArrayExpression",
            Self::MemberExpression { .. } => "MemberExpression",
            Self::AssignmentExpression { .. } => "AssignmentExpression",
            Self::BinaryExpression { .. } => "BinaryExpression",
            Self::LogicalExpression { .. } => "LogicalExpression",
            Self::UnaryExpression { .. } => "UnaryExpression",
            Self::UpdateExpression { .. } => "UpdateExpression",
            Self::ConditionalExpression { .. } => "ConditionalExpression",
            Self::SequenceExpression { .. } => "SequenceExpression",
            Self::CallExpression { .. } => "CallExpression",
            Self::Function(_) => "Function",
        }
    }

    /// The symbol an identifier-like node resolves to, if bound.
    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            Self::Identifier { symbol, .. } | Self::ThisExpression { symbol } => *symbol,
            Self::Function(function) => function.symbol,
            _ => None,
        }
    }

    // Convenience constructors, mostly for tests and embedders building
    // trees by hand.

    pub fn number(value: f64) -> Self {
        Self::NumberLiteral { value }
    }

    pub fn string(value: &str) -> Self {
        Self::StringLiteral { value: jsinfer_common::intern(value) }
    }

    pub fn boolean(value: bool) -> Self {
        Self::BooleanLiteral { value }
    }

    pub fn ident(name: &str, symbol: SymbolId) -> Self {
        Self::Identifier { name: jsinfer_common::intern(name), symbol: Some(symbol) }
    }

    /// The `undefined` identifier, which is never symbol-bound.
    pub fn undefined() -> Self {
        Self::Identifier { name: jsinfer_common::intern("undefined"), symbol: None }
    }

    pub fn member(object: Node, property: Node) -> Self {
        Self::MemberExpression { object: Box::new(object), property: Box::new(property) }
    }

    pub fn assign(left: Node, right: Node) -> Self {
        Self::AssignmentExpression {
            operator: AssignmentOperator::Assign,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(callee: Node, arguments: Vec<Node>) -> Self {
        Self::CallExpression { callee: Box::new(callee), arguments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_match_shapes() {
        assert_eq!(Node::number(1.0).kind_name(), "NumberLiteral");
        assert_eq!(Node::NullLiteral.kind_name(), "NullLiteral");
        assert_eq!(
            Node::assign(Node::undefined(), Node::number(1.0)).kind_name(),
            "AssignmentExpression"
        );
    }

    #[test]
    fn undefined_identifier_is_unbound() {
        assert_eq!(Node::undefined().symbol(), None);
    }
}
