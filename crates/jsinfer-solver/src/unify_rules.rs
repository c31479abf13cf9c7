//! The built-in unification rules, in registration order.
//!
//! Order matters: earlier rules take precedence, and several predicates are
//! written to be disjoint with what precedes them (the Maybe widening rule
//! can assume Null, Void, and Any were already handled).

use crate::record::PropertyMap;
use crate::types::{Type, TypeParameters};
use crate::unify::{TypeUnifier, UnificationError, UnifyRule};

/// The default rule list.
pub fn default_rules() -> Vec<Box<dyn UnifyRule>> {
    vec![
        Box::new(AnyRule),
        Box::new(NullMaybeRule),
        Box::new(NullPromotionRule),
        Box::new(VoidAbsorptionRule),
        Box::new(MaybeWideningRule),
        Box::new(RecordMeetRule),
        Box::new(ParametrizedRule),
    ]
}

/// `unify(Any, T) = Any`: once a value is dynamic, it stays dynamic.
#[derive(Debug)]
struct AnyRule;

impl UnifyRule for AnyRule {
    fn name(&self) -> &'static str {
        "any"
    }

    fn can_unify(&self, t1: &Type, t2: &Type) -> bool {
        matches!(t1, Type::Any) || matches!(t2, Type::Any)
    }

    fn unify(&self, t1: &Type, _: &Type, _: &TypeUnifier) -> Result<Type, UnificationError> {
        Ok(if matches!(t1, Type::Any) { t1.clone() } else { Type::Any })
    }
}

/// `unify(Null, Maybe<T>) = Maybe<T>`: the maybe already admits null.
#[derive(Debug)]
struct NullMaybeRule;

impl UnifyRule for NullMaybeRule {
    fn name(&self) -> &'static str {
        "null-maybe"
    }

    fn can_unify(&self, t1: &Type, t2: &Type) -> bool {
        matches!((t1, t2), (Type::Null, Type::Maybe(_)) | (Type::Maybe(_), Type::Null))
    }

    fn unify(&self, t1: &Type, t2: &Type, _: &TypeUnifier) -> Result<Type, UnificationError> {
        Ok(if matches!(t1, Type::Maybe(_)) { t1.clone() } else { t2.clone() })
    }
}

/// `unify(Null, T) = Maybe<T>`: a binding seen as null and later as T holds
/// either. `let x = null; x = 5;` gives x the type `Maybe<number>`.
#[derive(Debug)]
struct NullPromotionRule;

impl NullPromotionRule {
    fn other<'t>(t1: &'t Type, t2: &'t Type) -> Option<&'t Type> {
        match (t1, t2) {
            (Type::Null, other) | (other, Type::Null) => Some(other),
            _ => None,
        }
    }
}

impl UnifyRule for NullPromotionRule {
    fn name(&self) -> &'static str {
        "null-promotion"
    }

    fn can_unify(&self, t1: &Type, t2: &Type) -> bool {
        Self::other(t1, t2).is_some_and(|other| !matches!(other, Type::Maybe(_) | Type::Void))
    }

    fn unify(&self, t1: &Type, t2: &Type, _: &TypeUnifier) -> Result<Type, UnificationError> {
        let other = Self::other(t1, t2).expect("one operand is null");
        Ok(Type::maybe(other.clone()))
    }
}

/// `unify(Void, T) = T`: undefined is the uninitialized value, any concrete
/// type is more specific.
#[derive(Debug)]
struct VoidAbsorptionRule;

impl UnifyRule for VoidAbsorptionRule {
    fn name(&self) -> &'static str {
        "void-absorption"
    }

    fn can_unify(&self, t1: &Type, t2: &Type) -> bool {
        matches!(t1, Type::Void) || matches!(t2, Type::Void)
    }

    fn unify(&self, t1: &Type, t2: &Type, _: &TypeUnifier) -> Result<Type, UnificationError> {
        Ok(if matches!(t1, Type::Void) { t2.clone() } else { t1.clone() })
    }
}

/// `unify(Maybe<T>, U) = Maybe<unify(T, U))`: widening the wrapped type.
/// Null, Void, Any, and Maybe operands never reach this rule.
#[derive(Debug)]
struct MaybeWideningRule;

impl MaybeWideningRule {
    fn split<'t>(t1: &'t Type, t2: &'t Type) -> Option<(&'t Type, &'t Type)> {
        match (t1, t2) {
            // two maybes unify pointwise through the parametrized rule
            (maybe @ Type::Maybe(_), other) | (other, maybe @ Type::Maybe(_))
                if !matches!(other, Type::Maybe(_)) =>
            {
                Some((maybe, other))
            }
            _ => None,
        }
    }
}

impl UnifyRule for MaybeWideningRule {
    fn name(&self) -> &'static str {
        "maybe-widening"
    }

    fn can_unify(&self, t1: &Type, t2: &Type) -> bool {
        Self::split(t1, t2).is_some()
    }

    fn unify(
        &self,
        t1: &Type,
        t2: &Type,
        unifier: &TypeUnifier,
    ) -> Result<Type, UnificationError> {
        let (maybe, other) = Self::split(t1, t2).expect("one operand is a maybe");
        let Type::Maybe(wrapped) = maybe else { unreachable!() };
        if other.equals(&wrapped.of) {
            return Ok(maybe.clone());
        }
        Ok(Type::maybe(unifier.unify(other, &wrapped.of)?))
    }
}

/// `unify({..}, {..})`: the intersection of the properties, each with a
/// unified type. This is the meet that joins the branches of an `if`: a
/// property added in only one branch is dropped.
#[derive(Debug)]
struct RecordMeetRule;

impl UnifyRule for RecordMeetRule {
    fn name(&self) -> &'static str {
        "record-meet"
    }

    fn can_unify(&self, t1: &Type, t2: &Type) -> bool {
        matches!((t1, t2), (Type::Record(_), Type::Record(_)))
    }

    fn unify(
        &self,
        t1: &Type,
        t2: &Type,
        unifier: &TypeUnifier,
    ) -> Result<Type, UnificationError> {
        let (Type::Record(a), Type::Record(b)) = (t1, t2) else { unreachable!() };
        let (smaller, smaller_type, larger) = if a.properties.len() <= b.properties.len() {
            (a, t1, b)
        } else {
            (b, t2, a)
        };

        let mut changed = false;
        let mut common = PropertyMap::default();
        for (name, ty) in &smaller.properties {
            let Some(other) = larger.properties.get(name) else {
                changed = true;
                continue;
            };
            let unified = unifier.unify(ty, other)?;
            if !unified.equals(ty) {
                changed = true;
            }
            common.insert(*name, unified);
        }

        if changed { Ok(Type::record(common)) } else { Ok(smaller_type.clone()) }
    }
}

/// Two parametrized types of the same kind unify pointwise; the result keeps
/// the left operand's identity so environment substitution still recognizes
/// it.
#[derive(Debug)]
struct ParametrizedRule;

impl UnifyRule for ParametrizedRule {
    fn name(&self) -> &'static str {
        "parametrized"
    }

    fn can_unify(&self, t1: &Type, t2: &Type) -> bool {
        t1.same_kind(t2) && t1.type_parameters().is_some()
    }

    fn unify(
        &self,
        t1: &Type,
        t2: &Type,
        unifier: &TypeUnifier,
    ) -> Result<Type, UnificationError> {
        let left = t1.type_parameters().expect("parametrized operand");
        let right = t2.type_parameters().expect("parametrized operand");
        if left.len() != right.len() {
            return Err(UnificationError::incompatible(
                t1,
                t2,
                "the parametrized types have a different number of type parameters and therefore cannot be unified",
            ));
        }

        let unified = left
            .iter()
            .zip(right.iter())
            .map(|(a, b)| unifier.unify(a, b))
            .collect::<Result<TypeParameters, _>>()?;

        if left.iter().zip(&unified).all(|(a, b)| a.equals(b)) {
            return Ok(t1.clone());
        }
        Ok(t1.with_type_parameters(unified, t1.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsinfer_common::intern;
    use pretty_assertions::assert_eq;

    fn unify(t1: &Type, t2: &Type) -> Result<Type, UnificationError> {
        TypeUnifier::new().unify(t1, t2)
    }

    #[test]
    fn any_absorbs_every_operand() {
        for t in [Type::Number, Type::Void, Type::Null, Type::maybe(Type::String)] {
            assert_eq!(unify(&Type::Any, &t).unwrap(), Type::Any);
            assert_eq!(unify(&t, &Type::Any).unwrap(), Type::Any);
        }
    }

    #[test]
    fn any_takes_precedence_over_void() {
        assert_eq!(unify(&Type::Any, &Type::Void).unwrap(), Type::Any);
        assert_eq!(unify(&Type::Void, &Type::Any).unwrap(), Type::Any);
    }

    #[test]
    fn null_with_maybe_keeps_the_maybe() {
        let maybe_number = Type::maybe(Type::Number);
        let unified = unify(&Type::Null, &maybe_number).unwrap();
        assert!(unified.same(&maybe_number));
        assert!(unify(&maybe_number, &Type::Null).unwrap().same(&maybe_number));
    }

    #[test]
    fn null_promotes_the_other_operand_to_maybe() {
        assert_eq!(unify(&Type::Number, &Type::Null).unwrap(), Type::maybe(Type::Number));
        assert_eq!(unify(&Type::Null, &Type::Number).unwrap(), Type::maybe(Type::Number));
    }

    #[test]
    fn void_is_absorbed_by_the_concrete_operand() {
        assert_eq!(unify(&Type::Void, &Type::String).unwrap(), Type::String);
        assert_eq!(unify(&Type::String, &Type::Void).unwrap(), Type::String);
        // null wins over undefined: the binding was observed as null
        assert_eq!(unify(&Type::Void, &Type::Null).unwrap(), Type::Null);
    }

    #[test]
    fn maybe_widens_its_wrapped_type() {
        let maybe_number = Type::maybe(Type::Number);
        // same wrapped type: the maybe operand is reused
        assert!(unify(&maybe_number, &Type::Number).unwrap().same(&maybe_number));
        // incompatible wrapped type: the nested unification fails
        assert!(unify(&maybe_number, &Type::String).is_err());
        let v = Type::variable();
        assert_eq!(unify(&Type::maybe(v), &Type::Number).unwrap(), Type::maybe(Type::Number));
    }

    #[test]
    fn two_maybes_unify_pointwise_and_keep_identity() {
        let v = Type::variable();
        let left = Type::maybe(v);
        let right = Type::maybe(Type::Number);
        let unified = unify(&left, &right).unwrap();
        assert_eq!(unified, Type::maybe(Type::Number));
        assert!(unified.same(&left));
    }

    #[test]
    fn record_meet_is_the_property_intersection() {
        let left = Type::record([(intern("name"), Type::String), (intern("age"), Type::Number)]);
        let right = Type::record([(intern("name"), Type::String)]);
        let unified = unify(&left, &right).unwrap();
        assert_eq!(unified, Type::record([(intern("name"), Type::String)]));
        // the smaller operand already is the intersection
        assert!(unify(&left, &right).unwrap().same(&right) || unified.equals(&right));
    }

    #[test]
    fn record_meet_unifies_common_property_types() {
        let left = Type::record([(intern("x"), Type::Null)]);
        let right = Type::record([(intern("x"), Type::Number)]);
        let unified = unify(&left, &right).unwrap();
        assert_eq!(unified, Type::record([(intern("x"), Type::maybe(Type::Number))]));
    }

    #[test]
    fn arrays_unify_elementwise_and_keep_identity() {
        let v = Type::variable();
        let left = Type::array(v);
        let right = Type::array(Type::Number);
        let unified = unify(&left, &right).unwrap();
        assert_eq!(unified, Type::array(Type::Number));
        assert!(unified.same(&left));
    }

    #[test]
    fn function_arity_mismatch_fails_with_a_parameter_count_reason() {
        let unary = Type::function(Type::Void, vec![Type::Number], Type::Number);
        let binary = Type::function(Type::Void, vec![Type::Number, Type::Number], Type::Number);
        let error = unify(&unary, &binary).unwrap_err();
        match error {
            UnificationError::Incompatible { reason, .. } => {
                assert!(reason.contains("number of type parameters"));
            }
            other => panic!("expected an incompatibility, got {other}"),
        }
    }

    #[test]
    fn functions_unify_pointwise() {
        let v = Type::variable();
        let left = Type::function(Type::Void, vec![v], Type::Boolean);
        let right = Type::function(Type::Void, vec![Type::String], Type::Boolean);
        let unified = unify(&left, &right).unwrap();
        assert_eq!(unified, Type::function(Type::Void, vec![Type::String], Type::Boolean));
        assert!(unified.same(&left));
    }

    #[test]
    fn record_and_array_do_not_unify() {
        let record = Type::record([(intern("length"), Type::Number)]);
        let array = Type::array(Type::Number);
        assert!(unify(&record, &array).is_err());
    }
}
