//! The mutable state threaded through refinement: the type environment, the
//! symbol table, and a handle back into the engine.

use crate::error::InferenceError;
use crate::flow::FlowAnalyzer;
use crate::infer::TypeInference;
use jsinfer_ast::Node;
use jsinfer_binder::{Symbol, SymbolId, SymbolTable};
use jsinfer_common::Atom;
use jsinfer_solver::{Type, TypeEnvironment};

/// Per-run inference state handed to every refinement rule.
///
/// Forking yields a child context over the same engine and symbol table but
/// an independent copy of the environment; the parent is unusable until the
/// child is dropped, which is exactly the branch/call discipline the flow
/// analysis needs.
#[derive(Debug)]
pub struct InferenceContext<'e, 's> {
    engine: &'e TypeInference,
    symbols: &'s mut SymbolTable,
    pub environment: TypeEnvironment,
}

impl<'e, 's> InferenceContext<'e, 's> {
    pub(crate) fn new(engine: &'e TypeInference, symbols: &'s mut SymbolTable) -> Self {
        Self { engine, symbols, environment: TypeEnvironment::new() }
    }

    pub fn engine(&self) -> &'e TypeInference {
        self.engine
    }

    pub fn symbols(&self) -> &SymbolTable {
        self.symbols
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        self.symbols.get(id)
    }

    /// A child context with its own copy of the environment.
    pub fn fork(&mut self) -> InferenceContext<'e, '_> {
        InferenceContext {
            engine: self.engine,
            symbols: &mut *self.symbols,
            environment: self.environment.clone(),
        }
    }

    /// Infer the type of `node` through the engine's rule registry.
    pub fn infer(&mut self, node: &Node) -> Result<Type, InferenceError> {
        self.engine.infer(node, self)
    }

    /// Analyze a statement sequence, including control flow.
    pub fn analyze(&mut self, statements: &[Node]) -> Result<(), InferenceError> {
        FlowAnalyzer::analyze(statements, self)
    }

    /// Unify two types; when the unification resolves a type variable, the
    /// resolution is substituted across the whole environment.
    pub fn unify(&mut self, t1: &Type, t2: &Type) -> Result<Type, InferenceError> {
        let unified = self.engine.unifier().unify(t1, t2)?;
        if t1.is_variable() && !t1.same(&unified) {
            self.substitute(t1, &unified);
        } else if t2.is_variable() && !t2.same(&unified) {
            self.substitute(t2, &unified);
        }
        Ok(unified)
    }

    pub fn get_type(&self, symbol: SymbolId) -> Option<Type> {
        self.environment.get_type(symbol).cloned()
    }

    pub fn set_type(&mut self, symbol: SymbolId, ty: Type) {
        self.environment = self.environment.set_type(symbol, ty);
    }

    pub fn substitute(&mut self, old: &Type, new: &Type) {
        self.environment = self.environment.substitute(old, new);
    }

    /// The property symbol a member access refers to: the bound symbol of an
    /// identifier key, or the computed-member symbol when the name is not
    /// statically known (`obj[expr]`).
    pub fn property_symbol(&self, property: &Node) -> SymbolId {
        property.symbol().unwrap_or_else(|| self.symbols.computed_symbol())
    }

    /// The record-shaped type of a member expression's object.
    ///
    /// Any stays Any; a variable object is pinned to a fresh empty record;
    /// null, undefined, and maybe objects are potential null dereferences.
    pub fn object_type(&mut self, object: &Node, property: Atom) -> Result<Type, InferenceError> {
        let inferred = self.infer(object)?;
        match &inferred {
            Type::Any | Type::Record(_) | Type::Array(_) | Type::String => Ok(inferred),
            Type::Variable(_) => {
                let record = Type::empty_record();
                self.substitute(&inferred, &record);
                Ok(record)
            }
            Type::Void | Type::Null | Type::Maybe(_) => {
                Err(InferenceError::NullPropertyAccess { property, object: inferred })
            }
            _ => Err(InferenceError::NotARecord(inferred)),
        }
    }
}
