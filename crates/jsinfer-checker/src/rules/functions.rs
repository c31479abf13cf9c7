//! Function expressions and call expressions.

use crate::context::InferenceContext;
use crate::error::InferenceError;
use crate::flow::FlowAnalyzer;
use crate::infer::RefinementRule;
use jsinfer_ast::{FunctionBody, FunctionNode, Node};
use jsinfer_solver::Type;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::sync::Arc;
use tracing::debug;

/// A function expression or declaration becomes a `FunctionType` of fresh
/// variables: the body is not analyzed until the function is called with
/// concrete argument types.
///
/// Hoisted declarations may already carry a type; re-inferring must return
/// that same type, or every mention of the function would mint new
/// variables and never compare equal to the previous one.
#[derive(Debug)]
pub struct FunctionRule;

impl FunctionRule {
    fn infer_function_type(function: &Arc<FunctionNode>, ctx: &mut InferenceContext<'_, '_>) -> Type {
        let params: Vec<Type> = function.params.iter().map(|_| Type::variable()).collect();
        let return_type = match &function.body {
            FunctionBody::Expression(_) => Type::variable(),
            FunctionBody::Block(body) => {
                if always_returns(body) {
                    Type::variable()
                } else {
                    // some exit path falls off the end
                    Type::Void
                }
            }
        };
        let ty =
            Type::declared_function(Type::variable(), params, return_type, function.clone());
        if let Some(symbol) = function.symbol {
            ctx.set_type(symbol, ty.clone());
        }
        ty
    }
}

impl RefinementRule for FunctionRule {
    fn name(&self) -> &'static str {
        "function"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::Function(_))
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::Function(function) = node else {
            unreachable!("guarded by can_refine");
        };

        let ty = match function.symbol.and_then(|symbol| ctx.get_type(symbol)) {
            Some(existing @ Type::Function(_)) => existing,
            _ => Self::infer_function_type(function, ctx),
        };

        // capture the declaration-site environment for later invocation
        let captured = ty.with_environment(ctx.environment.clone());
        if let Some(symbol) = function.symbol {
            ctx.set_type(symbol, captured.clone());
        }
        Ok(captured)
    }
}

/// True if every non-exception exit of the statement sequence is an explicit
/// return.
fn always_returns(statements: &[Node]) -> bool {
    statements.iter().any(statement_always_returns)
}

fn statement_always_returns(node: &Node) -> bool {
    match node {
        Node::ReturnStatement { .. } | Node::ThrowStatement { .. } => true,
        Node::BlockStatement { body } => always_returns(body),
        Node::IfStatement { consequent, alternate: Some(alternate), .. } => {
            statement_always_returns(consequent) && statement_always_returns(alternate)
        }
        _ => false,
    }
}

const MAX_CALL_DEPTH: usize = 20;

/// Call expressions.
///
/// A call to a function with a known declaration analyzes the body in a
/// forked call context with the argument types bound to the parameters, then
/// propagates refinements back to the caller. Externally declared (builtin)
/// functions only carry a signature; arguments are unified and checked
/// against it, and callback arguments that do have a declaration are invoked
/// against the expected callback signature.
#[derive(Debug, Default)]
pub struct CallExpressionRule {
    /// Active invocation depth per declaration, for the recursion guard.
    depths: RefCell<FxHashMap<usize, usize>>,
}

impl RefinementRule for CallExpressionRule {
    fn name(&self) -> &'static str {
        "call-expression"
    }

    fn can_refine(&self, node: &Node) -> bool {
        matches!(node, Node::CallExpression { .. })
    }

    fn refine(
        &self,
        node: &Node,
        ctx: &mut InferenceContext<'_, '_>,
    ) -> Result<Type, InferenceError> {
        let Node::CallExpression { callee, arguments } = node else {
            unreachable!("guarded by can_refine");
        };

        let callee_type = ctx.infer(callee)?;
        match &callee_type {
            Type::Any => return Ok(Type::Any),
            Type::Function(_) => {}
            _ => return Err(InferenceError::NotInvocable { callee: callee_type }),
        }

        let this_type = this_type(callee, ctx)?;
        let argument_types = arguments
            .iter()
            .map(|argument| ctx.infer(argument))
            .collect::<Result<Vec<_>, _>>()?;

        let declaration = match &callee_type {
            Type::Function(function) => function.declaration.clone(),
            _ => unreachable!("checked above"),
        };
        match declaration {
            Some(declaration) => {
                self.invoke(ctx, &callee_type, &declaration, this_type, &argument_types)
            }
            None => self.call_external(ctx, callee_type, &this_type, &argument_types),
        }
    }
}

impl CallExpressionRule {
    /// Invoke a function whose body is known, guarded against unbounded
    /// recursion.
    fn invoke(
        &self,
        ctx: &mut InferenceContext<'_, '_>,
        function_type: &Type,
        declaration: &Arc<FunctionNode>,
        this_type: Type,
        argument_types: &[Type],
    ) -> Result<Type, InferenceError> {
        let key = Arc::as_ptr(declaration) as usize;
        {
            let mut depths = self.depths.borrow_mut();
            let depth = depths.entry(key).or_insert(0);
            if *depth >= MAX_CALL_DEPTH {
                debug!(depth = *depth, "recursion limit reached, using the declared return type");
                return Ok(end_recursion(function_type));
            }
            *depth += 1;
        }
        let result = self.invoke_body(ctx, function_type, declaration, this_type, argument_types);
        *self.depths.borrow_mut().get_mut(&key).expect("depth entry") -= 1;
        result
    }

    fn invoke_body(
        &self,
        ctx: &mut InferenceContext<'_, '_>,
        function_type: &Type,
        declaration: &Arc<FunctionNode>,
        this_type: Type,
        argument_types: &[Type],
    ) -> Result<Type, InferenceError> {
        let Type::Function(function) = function_type else {
            unreachable!("callee is a function");
        };
        let return_symbol = ctx.symbols().return_symbol();

        let (return_type, call_env, parameter_symbols) = {
            let mut call = ctx.fork();
            if let Some(environment) = &function.environment {
                call.environment = call.environment.add(environment);
            }
            call.set_type(return_symbol, function.return_type.fresh());
            if let Some(this_symbol) = declaration.this_symbol {
                call.set_type(this_symbol, this_type);
            }

            let mut parameter_symbols = Vec::with_capacity(declaration.params.len());
            for (index, parameter) in declaration.params.iter().enumerate() {
                let Some(symbol) = parameter.symbol() else { continue };
                let argument = argument_types.get(index).cloned().unwrap_or(Type::Void);
                call.set_type(symbol, argument);
                parameter_symbols.push((index, symbol));
            }

            match &declaration.body {
                FunctionBody::Expression(expression) => {
                    let inferred = call.infer(expression)?;
                    call.set_type(return_symbol, inferred);
                }
                FunctionBody::Block(statements) => FlowAnalyzer::analyze(statements, &mut call)?,
            }

            let return_type = call.get_type(return_symbol).unwrap_or(Type::Void);
            (return_type, call.environment, parameter_symbols)
        };

        // A record argument may have grown a property inside the call; the
        // caller's alias is the same logical type and must see the change.
        for (index, symbol) in &parameter_symbols {
            let argument = &argument_types[*index];
            if !matches!(argument, Type::Record(_) | Type::Array(_)) {
                continue;
            }
            if let Some(parameter_type) = call_env.get_type(*symbol) {
                if parameter_type.same(argument) && !parameter_type.equals(argument) {
                    let parameter_type = parameter_type.clone();
                    ctx.substitute(argument, &parameter_type);
                }
            }
        }

        let mut excluded = vec![return_symbol];
        if let Some(this_symbol) = declaration.this_symbol {
            excluded.push(this_symbol);
        }
        ctx.environment = ctx.environment.replace_types(&call_env, &excluded);

        Ok(return_type)
    }

    /// Check a call against an externally declared signature. The signature
    /// is tracked locally and updated in lockstep with every variable the
    /// unifications resolve, so later parameters and the return type see
    /// earlier resolutions.
    fn call_external(
        &self,
        ctx: &mut InferenceContext<'_, '_>,
        function_type: Type,
        this_type: &Type,
        argument_types: &[Type],
    ) -> Result<Type, InferenceError> {
        let mut current = function_type;

        let expected_this = function_parts(&current).0;
        if !expected_this.is_sub_type(this_type) {
            return Err(InferenceError::IncompatibleThis {
                expected: expected_this,
                actual: this_type.clone(),
            });
        }

        let parameter_count = match &current {
            Type::Function(function) => function.params.len(),
            _ => unreachable!("callee is a function"),
        };

        for index in 0..parameter_count {
            let parameter_type = function_param(&current, index);
            let argument_type = argument_types.get(index);

            if let (Type::Function(expected), Some(Type::Function(actual_fn))) =
                (&parameter_type, argument_type)
            {
                if actual_fn.declaration.is_some() && expected.declaration.is_none() {
                    current = self.invoke_callback(
                        ctx,
                        current,
                        index,
                        &parameter_type,
                        actual_fn.declaration.clone().expect("checked above"),
                    )?;
                    continue;
                }
            }

            match argument_type {
                Some(argument) => {
                    let unified = ctx.unify(argument, &parameter_type)?;
                    current = mirror_resolution(current, &parameter_type, argument, &unified);
                    let updated_parameter = function_param(&current, index);
                    if !updated_parameter.is_sub_type(&unified) {
                        return Err(InferenceError::IncompatibleArgument {
                            index: index + 1,
                            argument: unified,
                            parameter: updated_parameter,
                        });
                    }
                }
                None => {
                    // missing argument: undefined, accepted anywhere a
                    // value can be absent
                    if !parameter_type.is_sub_type(&Type::Void) {
                        return Err(InferenceError::IncompatibleArgument {
                            index: index + 1,
                            argument: Type::Void,
                            parameter: parameter_type,
                        });
                    }
                }
            }
        }

        Ok(function_parts(&current).1)
    }

    /// A declared function passed where a builtin expects a callback: run
    /// its body against the expected callback signature and unify the
    /// expected return with what the body actually returns. This is what
    /// resolves `numbers.map(n => n > 1)` to `boolean[]`.
    fn invoke_callback(
        &self,
        ctx: &mut InferenceContext<'_, '_>,
        current: Type,
        index: usize,
        expected_callback: &Type,
        declaration: Arc<FunctionNode>,
    ) -> Result<Type, InferenceError> {
        let Type::Function(expected) = expected_callback else {
            unreachable!("expected parameter is a function");
        };
        let actual_return = self.invoke(
            ctx,
            expected_callback,
            &declaration,
            expected.this_type.clone(),
            &expected.params,
        )?;

        let expected_return = match function_param(&current, index) {
            Type::Function(callback) => callback.return_type.clone(),
            _ => unreachable!("expected parameter is a function"),
        };
        let unified = ctx.unify(&expected_return, &actual_return)?;
        let current = mirror_resolution(current, &expected_return, &actual_return, &unified);

        let updated_return = match function_param(&current, index) {
            Type::Function(callback) => callback.return_type.clone(),
            _ => unreachable!("expected parameter is a function"),
        };
        if !updated_return.is_sub_type(&actual_return) {
            return Err(InferenceError::IncompatibleCallbackReturn {
                expected: updated_return,
                actual: actual_return,
            });
        }
        Ok(current)
    }
}

/// When the depth cap cuts a recursion off, the caller gets the declared
/// return type; an unresolved variable return degrades to Any.
fn end_recursion(function_type: &Type) -> Type {
    let Type::Function(function) = function_type else {
        unreachable!("callee is a function");
    };
    if function.return_type.is_variable() {
        Type::Any
    } else {
        function.return_type.fresh()
    }
}

/// `this` for the call: the object of a method call, undefined otherwise.
fn this_type(callee: &Node, ctx: &mut InferenceContext<'_, '_>) -> Result<Type, InferenceError> {
    if let Node::MemberExpression { object, property } = callee {
        let property_symbol = ctx.property_symbol(property);
        let property_name = ctx.symbol(property_symbol).name;
        ctx.object_type(object, property_name)
    } else {
        Ok(Type::Void)
    }
}

fn function_parts(function_type: &Type) -> (Type, Type) {
    match function_type {
        Type::Function(function) => {
            (function.this_type.clone(), function.return_type.clone())
        }
        _ => unreachable!("callee is a function"),
    }
}

fn function_param(function_type: &Type, index: usize) -> Type {
    match function_type {
        Type::Function(function) => function.params[index].clone(),
        _ => unreachable!("callee is a function"),
    }
}

/// Apply the same variable resolution `unify` performed on the environment
/// to the locally tracked signature.
fn mirror_resolution(current: Type, left: &Type, right: &Type, unified: &Type) -> Type {
    if left.is_variable() && !left.same(unified) {
        current.substitute(left, unified)
    } else if right.is_variable() && !right.same(unified) {
        current.substitute(right, unified)
    } else {
        current
    }
}
