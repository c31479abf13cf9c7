//! Statement rules. Statements carry no value, so all of these yield Void;
//! their job is the effect on the environment. Branching and loop bodies are
//! the flow analyzer's business, the rules here only infer the value parts
//! (conditions, initializers, arguments).

use crate::context::InferenceContext;
use crate::error::InferenceError;
use crate::infer::RefinementRule;
use jsinfer_ast::Node;
use jsinfer_solver::Type;

#[derive(Debug)]
pub struct BlockStatementRule;

impl RefinementRule for BlockStatementRule {
    fn name(&self) -> &'static str {
        "block"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::Program { .. } | Node::BlockStatement { .. })
    }

    fn refine(&self, _: &Node, _: &mut InferenceContext<'_, '_>) -> Result<Type, InferenceError> {
        Ok(Type::Void)
    }
}

#[derive(Debug)]
pub struct ExpressionStatementRule;

impl RefinementRule for ExpressionStatementRule {
    fn name(&self) -> &'static str {
        "expression-statement"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::ExpressionStatement { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::ExpressionStatement { expression } = node else {
            unreachable!("guarded by can_refine");
        };
        ctx.infer(expression)?;
        Ok(Type::Void)
    }
}

/// `let x = init` binds x to a fresh copy of the initializer's type; an
/// uninitialized declaration binds Void. The declarator yields the bound
/// type, the declaration yields Void.
#[derive(Debug)]
pub struct VariableDeclarationRule;

impl VariableDeclarationRule {
    fn refine_declarator(
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::VariableDeclarator { id, init } = node else {
            unreachable!("guarded by can_refine");
        };
        let variable_type = match init {
            // Fresh: later refinements of the initializer's source must not
            // retype this binding through the shared id (aliasing cut).
            Some(init) => ctx.infer(init)?.fresh(),
            None => Type::Void,
        };

        let symbol = match &**id {
            Node::Identifier { name, symbol } => {
                symbol.ok_or(InferenceError::UsedBeforeDeclaration { name: *name })?
            }
            other => other
                .symbol()
                .unwrap_or_else(|| panic!("declarator target {} has no symbol", other.kind_name())),
        };
        ctx.set_type(symbol, variable_type.clone());
        Ok(variable_type)
    }
}

impl RefinementRule for VariableDeclarationRule {
    fn name(&self) -> &'static str {
        "variable-declaration"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::VariableDeclaration { .. } | Node::VariableDeclarator { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        match node {
            Node::VariableDeclaration { declarations } => {
                for declarator in declarations {
                    Self::refine_declarator(declarator, ctx)?;
                }
                Ok(Type::Void)
            }
            declarator => Self::refine_declarator(declarator, ctx),
        }
    }
}

#[derive(Debug)]
pub struct IfStatementRule;

impl RefinementRule for IfStatementRule {
    fn name(&self) -> &'static str {
        "if"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::IfStatement { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::IfStatement { test, .. } = node else {
            unreachable!("guarded by can_refine");
        };
        ctx.infer(test)?;
        Ok(Type::Void)
    }
}

/// `while` and `do..while`: the condition is the only value part.
#[derive(Debug)]
pub struct WhileStatementRule;

impl RefinementRule for WhileStatementRule {
    fn name(&self) -> &'static str {
        "while"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::WhileStatement { .. } | Node::DoWhileStatement { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let (Node::WhileStatement { test, .. } | Node::DoWhileStatement { test, .. }) = node
        else {
            unreachable!("guarded by can_refine");
        };
        ctx.infer(test)?;
        Ok(Type::Void)
    }
}

#[derive(Debug)]
pub struct ForStatementRule;

impl RefinementRule for ForStatementRule {
    fn name(&self) -> &'static str {
        "for"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::ForStatement { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::ForStatement { init, test, update, .. } = node else {
            unreachable!("guarded by can_refine");
        };
        if let Some(init) = init {
            ctx.infer(init)?;
        }
        if let Some(test) = test {
            ctx.infer(test)?;
        }
        if let Some(update) = update {
            ctx.infer(update)?;
        }
        Ok(Type::Void)
    }
}

/// `for (x of xs)` binds the loop variable to the element type of the
/// iterated array. Anything that is not an array does not iterate.
#[derive(Debug)]
pub struct ForOfStatementRule;

impl RefinementRule for ForOfStatementRule {
    fn name(&self) -> &'static str {
        "for-of"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::ForOfStatement { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::ForOfStatement { left, right, .. } = node else {
            unreachable!("guarded by can_refine");
        };
        let right_type = ctx.infer(right)?;
        let element = match &right_type {
            Type::Array(array) => array.of.clone(),
            _ => return Err(InferenceError::NotIterable(right_type)),
        };

        match &**left {
            Node::VariableDeclaration { declarations } => {
                for declarator in declarations {
                    if let Node::VariableDeclarator { id, .. } = declarator {
                        if let Some(symbol) = id.symbol() {
                            ctx.set_type(symbol, element.clone());
                        }
                    }
                }
            }
            other => {
                if let Some(symbol) = other.symbol() {
                    ctx.set_type(symbol, element);
                }
            }
        }
        Ok(Type::Void)
    }
}

/// `return e` unifies the argument's type into the RETURN slot, so multiple
/// returns meet in one type.
#[derive(Debug)]
pub struct ReturnStatementRule;

impl RefinementRule for ReturnStatementRule {
    fn name(&self) -> &'static str {
        "return"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::ReturnStatement { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::ReturnStatement { argument } = node else {
            unreachable!("guarded by can_refine");
        };
        let mut argument_type = match argument {
            Some(argument) => ctx.infer(argument)?,
            None => Type::Void,
        };
        let return_symbol = ctx.symbols().return_symbol();
        if let Some(current) = ctx.get_type(return_symbol) {
            argument_type = ctx.unify(&current, &argument_type)?;
        }
        ctx.set_type(return_symbol, argument_type);
        Ok(Type::Void)
    }
}

#[derive(Debug)]
pub struct ThrowStatementRule;

impl RefinementRule for ThrowStatementRule {
    fn name(&self) -> &'static str {
        "throw"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::ThrowStatement { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::ThrowStatement { argument } = node else {
            unreachable!("guarded by can_refine");
        };
        ctx.infer(argument)?;
        Ok(Type::Void)
    }
}

#[derive(Debug)]
pub struct BreakStatementRule;

impl RefinementRule for BreakStatementRule {
    fn name(&self) -> &'static str {
        "break"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::BreakStatement)
    }

    fn refine(&self, _: &Node, _: &mut InferenceContext<'_, '_>) -> Result<Type, InferenceError> {
        Ok(Type::Void)
    }
}
