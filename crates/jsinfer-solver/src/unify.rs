//! Unification of two types into their most specific common type.
//!
//! The engine itself only knows the Hindley-Milner skeleton (equality fast
//! path, variable binding with occurs check); everything about concrete
//! types lives in an ordered rule list. The first rule whose `can_unify`
//! accepts the pair performs the unification, so new type combinations are
//! handled by registering a rule, not by editing the engine.

use crate::types::Type;
use crate::unify_rules;
use std::fmt;
use thiserror::Error;
use tracing::trace;

/// Failure to unify two types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnificationError {
    /// No registered rule covers the combination.
    #[error(
        "Unification for type '{left}' and '{right}' failed because there exists no rule \
         that can be used to unify the given types."
    )]
    NotUnifiable { left: Type, right: Type },
    /// Binding the variable would embed it in its own structure.
    #[error(
        "Unification for type '{left}' and '{right}' failed because the type variable occurs \
         in the other type and binding it would create a cyclic type."
    )]
    Cyclic { left: Type, right: Type },
    /// A rule matched but the types are incompatible.
    #[error("Unification for type '{left}' and '{right}' failed because {reason}.")]
    Incompatible { left: Type, right: Type, reason: String },
}

impl UnificationError {
    pub fn incompatible(left: &Type, right: &Type, reason: impl Into<String>) -> Self {
        Self::Incompatible { left: left.clone(), right: right.clone(), reason: reason.into() }
    }
}

/// One unification rule for a combination of concrete types.
pub trait UnifyRule: fmt::Debug + Send + Sync {
    /// Rule name, for diagnostics and traces.
    fn name(&self) -> &'static str;

    /// True if this rule handles the pair. Must be symmetric in the pair.
    fn can_unify(&self, t1: &Type, t2: &Type) -> bool;

    /// Unify the pair. `unifier` re-enters the engine for nested types.
    fn unify(&self, t1: &Type, t2: &Type, unifier: &TypeUnifier)
    -> Result<Type, UnificationError>;
}

/// The unification engine: an ordered, injectable rule list.
#[derive(Debug)]
pub struct TypeUnifier {
    rules: Vec<Box<dyn UnifyRule>>,
}

impl Default for TypeUnifier {
    fn default() -> Self {
        Self::with_rules(unify_rules::default_rules())
    }
}

impl TypeUnifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine with a custom rule list, first match wins.
    pub fn with_rules(rules: Vec<Box<dyn UnifyRule>>) -> Self {
        Self { rules }
    }

    /// Unify `t1` and `t2`. Commutative in the resulting type's shape,
    /// though not necessarily in its identity.
    pub fn unify(&self, t1: &Type, t2: &Type) -> Result<Type, UnificationError> {
        if t1.equals(t2) {
            return Ok(t1.clone());
        }

        if t1.is_base_type() && t2.is_base_type() {
            return self.unify_base_types(t1, t2);
        }

        if t1.is_variable() {
            if t1.occurs_in(t2) {
                return Err(UnificationError::Cyclic { left: t1.clone(), right: t2.clone() });
            }
            return Ok(t2.clone());
        }

        // t2 is the variable; swap so the branch above applies.
        self.unify(t2, t1)
    }

    fn unify_base_types(&self, t1: &Type, t2: &Type) -> Result<Type, UnificationError> {
        for rule in &self.rules {
            if rule.can_unify(t1, t2) {
                trace!(rule = rule.name(), left = %t1, right = %t2, "unifying");
                return rule.unify(t1, t2, self);
            }
        }
        Err(UnificationError::NotUnifiable { left: t1.clone(), right: t2.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn equal_types_unify_to_the_left_operand() {
        let unifier = TypeUnifier::new();
        let record = Type::record([(jsinfer_common::intern("x"), Type::Number)]);
        let unified = unifier.unify(&record, &record.fresh()).unwrap();
        assert!(unified.same(&record));
    }

    #[test]
    fn a_variable_binds_to_the_other_type() {
        let unifier = TypeUnifier::new();
        let v = Type::variable();
        assert_eq!(unifier.unify(&v, &Type::Number).unwrap(), Type::Number);
        assert_eq!(unifier.unify(&Type::Number, &v).unwrap(), Type::Number);
    }

    #[test]
    fn two_distinct_variables_unify_to_one_of_them() {
        let unifier = TypeUnifier::new();
        let a = Type::variable();
        let b = Type::variable();
        let unified = unifier.unify(&a, &b).unwrap();
        assert!(unified.same(&a) || unified.same(&b));
    }

    #[test]
    fn occurs_check_rejects_cyclic_bindings() {
        let unifier = TypeUnifier::new();
        let v = Type::variable();
        let array = Type::array(v.clone());
        let error = unifier.unify(&v, &array).unwrap_err();
        assert!(matches!(error, UnificationError::Cyclic { .. }));
        // and with the operands flipped
        assert!(unifier.unify(&array, &v).is_err());
    }

    #[test]
    fn unrelated_base_types_report_a_missing_rule() {
        let unifier = TypeUnifier::new();
        let error = unifier.unify(&Type::Number, &Type::String).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Unification for type 'number' and 'string' failed because there exists no rule \
             that can be used to unify the given types."
        );
    }

    #[test]
    fn an_empty_rule_list_only_handles_the_skeleton() {
        let unifier = TypeUnifier::with_rules(Vec::new());
        assert_eq!(unifier.unify(&Type::Null, &Type::Null).unwrap(), Type::Null);
        assert!(unifier.unify(&Type::Null, &Type::Number).is_err());
    }
}
