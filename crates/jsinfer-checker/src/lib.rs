//! Type inference for a dynamically typed JavaScript-like language.
//!
//! The engine is a structural Hindley-Milner variant driven by refinement
//! rules: each AST node shape has a rule that computes its type against the
//! current [`TypeEnvironment`], and a forward flow analysis walks statements
//! so branches fork the environment and join it back by unification.
//!
//! ```
//! use jsinfer_binder::{SymbolFlags, SymbolTable};
//! use jsinfer_checker::TypeInference;
//! use jsinfer_ast::Node;
//! use jsinfer_solver::Type;
//!
//! let mut symbols = SymbolTable::new();
//! let x = symbols.declare(jsinfer_common::intern("x"), SymbolFlags::BLOCK_SCOPED_VARIABLE);
//! let engine = TypeInference::new();
//! let mut ctx = engine.context(&mut symbols);
//! ctx.analyze(&[
//!     Node::VariableDeclaration {
//!         declarations: vec![Node::VariableDeclarator {
//!             id: Box::new(Node::ident("x", x)),
//!             init: Some(Box::new(Node::NullLiteral)),
//!         }],
//!     },
//!     Node::ExpressionStatement {
//!         expression: Box::new(Node::assign(Node::ident("x", x), Node::number(5.0))),
//!     },
//! ])
//! .unwrap();
//! assert_eq!(ctx.get_type(x), Some(Type::maybe(Type::Number)));
//! ```

mod context;
mod error;
mod flow;
mod infer;
mod rules;

pub use context::InferenceContext;
pub use error::InferenceError;
pub use flow::FlowAnalyzer;
pub use infer::{RefinementRule, TypeInference};
pub use rules::{default_rules, CallExpressionRule, FunctionRule};

#[doc(inline)]
pub use jsinfer_solver::TypeEnvironment;
