//! The type lattice: value types, identity, subtyping, and substitution.
//!
//! Every operation here is pure: types are immutable after construction and
//! all structural changes are copy-on-write. A [`TypeId`] identifies the
//! *logical* type; substitution rebuilds object graphs, so two structurally
//! different instances that share an id are still the same logical type
//! ([`Type::same`]). Object identity alone is never enough to recognize "the
//! variable that later got resolved".

use crate::record::{ArrayType, RecordType};
use crate::environment::TypeEnvironment;
use jsinfer_ast::FunctionNode;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity token of a type instance.
///
/// Nullary flyweights use fixed well-known ids; composites and variables draw
/// from a process-wide counter. Multiple `Type` instances may share an id and
/// are then the same logical type even when structurally different.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u64);

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(TypeId::FIRST_DYNAMIC);

impl TypeId {
    pub const ANY: Self = Self(1);
    pub const VOID: Self = Self(2);
    pub const NULL: Self = Self(3);
    pub const NUMBER: Self = Self(4);
    pub const BOOLEAN: Self = Self(5);
    pub const STRING: Self = Self(6);

    const FIRST_DYNAMIC: u64 = 16;

    /// Allocate a new unique id.
    pub fn fresh() -> Self {
        Self(NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Ordered list of a parametrized type's parameters.
pub type TypeParameters = SmallVec<[Type; 4]>;

/// A value type.
///
/// Closed set of variants; parametrized variants (Function, Maybe, Array)
/// share the generic pointwise routines [`Type::type_parameters`] /
/// [`Type::with_type_parameters`].
#[derive(Clone, Debug)]
pub enum Type {
    /// Absorbing element: subtype of everything and everything's subtype.
    Any,
    /// `undefined` - the absent value, coerces freely.
    Void,
    Null,
    Number,
    Boolean,
    /// Carries a fixed, non-overridable builtin property table.
    String,
    /// Structural record (object literals).
    Record(Arc<RecordType>),
    /// Record specialized with an element type; builtin methods are
    /// synthesized from the element type.
    Array(Arc<ArrayType>),
    Function(Arc<FunctionType>),
    /// Either null/undefined or a value of the wrapped type.
    Maybe(Arc<MaybeType>),
    /// Placeholder for a not-yet-resolved type. Equality is identity-only.
    Variable(TypeId),
}

/// `Function(thisType, params) -> returnType`; `this` is modeled as an
/// explicit parameter.
#[derive(Debug)]
pub struct FunctionType {
    pub id: TypeId,
    pub this_type: Type,
    pub params: Vec<Type>,
    pub return_type: Type,
    /// Declaring AST node; absent for externally defined (builtin) functions.
    pub declaration: Option<Arc<FunctionNode>>,
    /// Type environment captured at the declaration site.
    pub environment: Option<TypeEnvironment>,
}

/// `Maybe<T>`.
#[derive(Debug)]
pub struct MaybeType {
    pub id: TypeId,
    pub of: Type,
}

impl Type {
    pub fn record(properties: impl IntoIterator<Item = (jsinfer_common::Atom, Type)>) -> Self {
        Self::Record(Arc::new(RecordType::new(properties)))
    }

    pub fn empty_record() -> Self {
        Self::record([])
    }

    pub fn array(of: Type) -> Self {
        Self::Array(Arc::new(ArrayType::of(of)))
    }

    pub fn function(this_type: Type, params: Vec<Type>, return_type: Type) -> Self {
        Self::Function(Arc::new(FunctionType {
            id: TypeId::fresh(),
            this_type,
            params,
            return_type,
            declaration: None,
            environment: None,
        }))
    }

    pub fn declared_function(
        this_type: Type,
        params: Vec<Type>,
        return_type: Type,
        declaration: Arc<FunctionNode>,
    ) -> Self {
        Self::Function(Arc::new(FunctionType {
            id: TypeId::fresh(),
            this_type,
            params,
            return_type,
            declaration: Some(declaration),
            environment: None,
        }))
    }

    /// A copy of this function type carrying the given declaration-site
    /// environment; identity is preserved.
    ///
    /// # Panics
    ///
    /// Panics on non-function types.
    pub fn with_environment(&self, environment: TypeEnvironment) -> Self {
        match self {
            Self::Function(function) => Self::Function(Arc::new(FunctionType {
                id: function.id,
                this_type: function.this_type.clone(),
                params: function.params.clone(),
                return_type: function.return_type.clone(),
                declaration: function.declaration.clone(),
                environment: Some(environment),
            })),
            _ => panic!("{self} is not a function type"),
        }
    }

    pub fn maybe(of: Type) -> Self {
        // Maybe<Maybe<T>> adds no information; collapse on construction.
        if let Self::Maybe(_) = of {
            return of;
        }
        Self::Maybe(Arc::new(MaybeType { id: TypeId::fresh(), of }))
    }

    pub fn variable() -> Self {
        Self::Variable(TypeId::fresh())
    }

    /// The identity token of this instance.
    pub fn id(&self) -> TypeId {
        match self {
            Self::Any => TypeId::ANY,
            Self::Void => TypeId::VOID,
            Self::Null => TypeId::NULL,
            Self::Number => TypeId::NUMBER,
            Self::Boolean => TypeId::BOOLEAN,
            Self::String => TypeId::STRING,
            Self::Record(record) => record.id,
            Self::Array(array) => array.id,
            Self::Function(function) => function.id,
            Self::Maybe(maybe) => maybe.id,
            Self::Variable(id) => *id,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// A concrete (non-variable) type.
    pub fn is_base_type(&self) -> bool {
        !self.is_variable()
    }

    /// True if both instances denote the same logical type.
    ///
    /// This is the only correct way to detect "the variable that later got
    /// resolved": substitution produces new object graphs, so reference
    /// identity is insufficient.
    pub fn same(&self, other: &Type) -> bool {
        self.id() == other.id()
    }

    /// True if both types have the same variant tag, ignoring parameters.
    pub fn same_kind(&self, other: &Type) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Structural equality: same kind and equal parameters. Type variables
    /// compare by identity only, never structurally.
    pub fn equals(&self, other: &Type) -> bool {
        match (self, other) {
            (Self::Variable(a), Self::Variable(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a.properties == b.properties,
            (Self::Array(a), Self::Array(b)) => {
                a.of.equals(&b.of) && a.properties == b.properties
            }
            (Self::Maybe(a), Self::Maybe(b)) => a.of.equals(&b.of),
            (Self::Function(a), Self::Function(b)) => {
                a.params.len() == b.params.len()
                    && a.this_type.equals(&b.this_type)
                    && a.return_type.equals(&b.return_type)
                    && a.params.iter().zip(&b.params).all(|(x, y)| x.equals(y))
            }
            _ => self.same_kind(other),
        }
    }

    /// True if `t` can be used where `self` is expected.
    pub fn is_sub_type(&self, t: &Type) -> bool {
        // Any absorbs in both directions.
        if matches!(self, Self::Any) || matches!(t, Self::Any) {
            return true;
        }
        // The absent value coerces to anything.
        if matches!(t, Self::Void) {
            return true;
        }

        match self {
            // Placeholder: not known yet, the variable can still become `t`.
            Self::Variable(_) => true,
            Self::Maybe(maybe) => match t {
                Self::Null => true,
                Self::Maybe(other) => maybe.of.is_sub_type(&other.of),
                _ => maybe.of.is_sub_type(t),
            },
            Self::Record(record) => match t {
                Self::Record(other) => record.is_record_sub_type(other),
                _ => false,
            },
            Self::Array(array) => match t {
                Self::Array(other) => {
                    array.is_property_sub_type(other) && array.of.is_sub_type(&other.of)
                }
                _ => false,
            },
            Self::Function(_) => {
                if !self.same_kind(t) {
                    return false;
                }
                self.pointwise(t, Type::is_sub_type)
            }
            _ => self.equals(t),
        }
    }

    /// Occurs check: true if `t` is this type or part of its structure.
    /// Callers use it to reject building cyclic substitutions.
    pub fn contains_type(&self, t: &Type) -> bool {
        if self.same(t) {
            return true;
        }
        match self {
            Self::Record(record) => record.properties.values().any(|p| p.contains_type(t)),
            Self::Array(array) => {
                array.of.contains_type(t)
                    || array.properties.values().any(|p| p.contains_type(t))
            }
            Self::Maybe(maybe) => maybe.of.contains_type(t),
            Self::Function(function) => {
                function.this_type.contains_type(t)
                    || function.return_type.contains_type(t)
                    || function.params.iter().any(|p| p.contains_type(t))
            }
            _ => false,
        }
    }

    /// Reverse of [`Type::contains_type`].
    pub fn occurs_in(&self, t: &Type) -> bool {
        t.contains_type(self)
    }

    /// Structurally replace every occurrence of `old` with `new`, returning a
    /// new value. The result keeps the receiver's id when rebuilt; unchanged
    /// structures are returned as-is (no churn).
    pub fn substitute(&self, old: &Type, new: &Type) -> Type {
        if self.same(old) {
            return new.clone();
        }

        match self {
            Self::Record(record) => record.substitute_properties(old, new).map_or_else(
                || self.clone(),
                |properties| Self::Record(Arc::new(record.with_properties_and_id(properties, record.id))),
            ),
            Self::Array(array) => {
                let of = array.of.substitute(old, new);
                let properties = array.substitute_properties(old, new);
                if of.equals(&array.of) && properties.is_none() {
                    return self.clone();
                }
                let properties = properties.unwrap_or_else(|| array.properties.clone());
                Self::Array(Arc::new(ArrayType::with_parts(of, properties, array.id)))
            }
            Self::Function(_) | Self::Maybe(_) => {
                let params = self.type_parameters().expect("parametrized variant");
                let substituted: TypeParameters =
                    params.iter().map(|p| p.substitute(old, new)).collect();
                if params.iter().zip(&substituted).all(|(a, b)| a.equals(b)) {
                    return self.clone();
                }
                self.with_type_parameters(substituted, self.id())
            }
            _ => self.clone(),
        }
    }

    /// Re-instantiate with a new identity, for generic reuse. The structure
    /// is shared; only the top-level id changes. Nullary flyweights are
    /// returned unchanged, a variable becomes a new variable.
    pub fn fresh(&self) -> Type {
        match self {
            Self::Variable(_) => Self::variable(),
            Self::Record(record) => {
                Self::Record(Arc::new(record.with_properties_and_id(record.properties.clone(), TypeId::fresh())))
            }
            Self::Array(array) => Self::Array(Arc::new(ArrayType::with_parts(
                array.of.clone(),
                array.properties.clone(),
                TypeId::fresh(),
            ))),
            Self::Function(_) | Self::Maybe(_) => {
                let params = self.type_parameters().expect("parametrized variant");
                self.with_type_parameters(params, TypeId::fresh())
            }
            _ => self.clone(),
        }
    }

    /// The ordered type-parameter list of a parametrized variant; `None` for
    /// everything else. Function order is `[this, return, params...]`.
    pub fn type_parameters(&self) -> Option<TypeParameters> {
        match self {
            Self::Function(function) => {
                let mut params = TypeParameters::new();
                params.push(function.this_type.clone());
                params.push(function.return_type.clone());
                params.extend(function.params.iter().cloned());
                Some(params)
            }
            Self::Maybe(maybe) => Some(SmallVec::from_iter([maybe.of.clone()])),
            Self::Array(array) => Some(SmallVec::from_iter([array.of.clone()])),
            _ => None,
        }
    }

    /// Rebuild a parametrized variant from a parameter list, with the given
    /// id. Function declaration/environment backlinks are preserved.
    ///
    /// # Panics
    ///
    /// Panics on non-parametrized variants or a parameter count that does not
    /// fit the variant shape; both indicate a bug in the calling rule.
    pub fn with_type_parameters(&self, params: TypeParameters, id: TypeId) -> Type {
        match self {
            Self::Function(function) => {
                assert!(
                    params.len() >= 2,
                    "a function type takes at least this and return parameters"
                );
                let mut iter = params.into_iter();
                let this_type = iter.next().expect("this type");
                let return_type = iter.next().expect("return type");
                Self::Function(Arc::new(FunctionType {
                    id,
                    this_type,
                    params: iter.collect(),
                    return_type,
                    declaration: function.declaration.clone(),
                    environment: function.environment.clone(),
                }))
            }
            Self::Maybe(_) => {
                assert!(params.len() == 1, "a maybe type takes exactly one type parameter");
                let of = params.into_iter().next().expect("wrapped type");
                Self::Maybe(Arc::new(MaybeType { id, of }))
            }
            Self::Array(array) => {
                assert!(params.len() == 1, "an array type takes exactly one type parameter");
                let of = params.into_iter().next().expect("element type");
                Self::Array(Arc::new(ArrayType::with_parts(of, array.properties.clone(), id)))
            }
            _ => panic!("{self} is not a parametrized type"),
        }
    }

    fn pointwise(&self, other: &Type, relate: impl Fn(&Type, &Type) -> bool) -> bool {
        let (Some(left), Some(right)) = (self.type_parameters(), other.type_parameters()) else {
            return false;
        };
        left.len() == right.len() && left.iter().zip(right.iter()).all(|(a, b)| relate(a, b))
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Void => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Number => f.write_str("number"),
            Self::Boolean => f.write_str("boolean"),
            Self::String => f.write_str("string"),
            Self::Record(record) => {
                f.write_str("{")?;
                for (i, (name, ty)) in record.properties.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                f.write_str("}")
            }
            Self::Array(array) => write!(f, "{}[]", array.of),
            Self::Function(function) => {
                write!(f, "{}.(", function.this_type)?;
                for (i, param) in function.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {}", function.return_type)
            }
            Self::Maybe(maybe) => write!(f, "Maybe<{}>", maybe.of),
            Self::Variable(id) => write!(f, "@ ({})", id.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsinfer_common::intern;
    use pretty_assertions::assert_eq;

    #[test]
    fn subtyping_is_reflexive() {
        let types = [
            Type::Any,
            Type::Void,
            Type::Null,
            Type::Number,
            Type::Boolean,
            Type::String,
            Type::record([(intern("name"), Type::String)]),
            Type::array(Type::Number),
            Type::function(Type::Void, vec![Type::Number], Type::Boolean),
            Type::maybe(Type::Number),
            Type::variable(),
        ];
        for t in &types {
            assert!(t.is_sub_type(t), "{t} should be a subtype of itself");
            assert!(t.equals(t), "{t} should equal itself");
        }
    }

    #[test]
    fn any_absorbs_on_both_sides() {
        for t in [Type::Number, Type::Void, Type::record([]), Type::variable()] {
            assert!(Type::Any.is_sub_type(&t));
            assert!(t.is_sub_type(&Type::Any));
        }
    }

    #[test]
    fn void_is_a_subtype_of_everything() {
        for t in [Type::Number, Type::String, Type::maybe(Type::Boolean)] {
            assert!(t.is_sub_type(&Type::Void));
        }
        assert!(!Type::Void.is_sub_type(&Type::Number));
    }

    #[test]
    fn record_subtyping_is_width_and_depth() {
        let wide = Type::record([(intern("name"), Type::String), (intern("age"), Type::Number)]);
        let narrow = Type::record([(intern("name"), Type::String)]);
        assert!(narrow.is_sub_type(&wide));
        assert!(!wide.is_sub_type(&narrow));
    }

    #[test]
    fn array_elements_are_covariant() {
        assert!(Type::array(Type::Number).is_sub_type(&Type::array(Type::Number)));
        assert!(!Type::array(Type::Number).is_sub_type(&Type::array(Type::String)));
    }

    #[test]
    fn maybe_accepts_null_void_and_the_wrapped_type() {
        let maybe_number = Type::maybe(Type::Number);
        assert!(maybe_number.is_sub_type(&Type::Null));
        assert!(maybe_number.is_sub_type(&Type::Void));
        assert!(maybe_number.is_sub_type(&Type::Number));
        assert!(maybe_number.is_sub_type(&Type::maybe(Type::Number)));
        assert!(!maybe_number.is_sub_type(&Type::String));
    }

    #[test]
    fn variables_are_equal_by_identity_only() {
        let a = Type::variable();
        let b = Type::variable();
        assert!(!a.equals(&b));
        assert!(a.equals(&a.clone()));
        assert!(a.same(&a.clone()));
    }

    #[test]
    fn same_survives_structural_rebuilds() {
        let record = Type::record([(intern("x"), Type::variable())]);
        let variable = match &record {
            Type::Record(r) => r.properties[&intern("x")].clone(),
            _ => unreachable!(),
        };
        let rebuilt = record.substitute(&variable, &Type::Number);
        assert!(record.same(&rebuilt));
        assert!(!record.equals(&rebuilt));
    }

    #[test]
    fn substituting_a_type_for_itself_is_identity() {
        let t = Type::record([(intern("name"), Type::String)]);
        let substituted = t.substitute(&t, &t);
        assert!(t.equals(&substituted));
        assert!(t.same(&substituted));
    }

    #[test]
    fn substitution_rewrites_nested_occurrences() {
        let v = Type::variable();
        let f = Type::function(Type::Void, vec![v.clone()], Type::maybe(v.clone()));
        let resolved = f.substitute(&v, &Type::Number);
        match &resolved {
            Type::Function(function) => {
                assert_eq!(function.params[0], Type::Number);
                assert_eq!(function.return_type, Type::maybe(Type::Number));
            }
            other => panic!("expected function, got {other}"),
        }
        // the rebuilt function is the same logical type
        assert!(f.same(&resolved));
    }

    #[test]
    fn occurs_check_sees_through_structure() {
        let v = Type::variable();
        let array = Type::array(v.clone());
        assert!(v.occurs_in(&array));
        assert!(array.contains_type(&v));
        assert!(!v.occurs_in(&Type::array(Type::Number)));
    }

    #[test]
    fn fresh_changes_identity_but_not_structure() {
        let t = Type::maybe(Type::Number);
        let fresh = t.fresh();
        assert!(t.equals(&fresh));
        assert!(!t.same(&fresh));
        // nullary flyweights keep their identity
        assert!(Type::Number.same(&Type::Number.fresh()));
    }

    #[test]
    fn function_arity_mismatch_is_not_a_subtype() {
        let unary = Type::function(Type::Void, vec![Type::Number], Type::Number);
        let binary = Type::function(Type::Void, vec![Type::Number, Type::Number], Type::Number);
        assert!(!unary.is_sub_type(&binary));
        assert!(!unary.equals(&binary));
    }

    #[test]
    fn pretty_names_are_compact() {
        assert_eq!(Type::array(Type::Number).to_string(), "number[]");
        assert_eq!(Type::maybe(Type::String).to_string(), "Maybe<string>");
        assert_eq!(
            Type::record([(intern("name"), Type::String)]).to_string(),
            "{name: string}"
        );
        assert_eq!(
            Type::function(Type::Void, vec![Type::Number], Type::Boolean).to_string(),
            "undefined.(number) -> boolean"
        );
    }

    #[test]
    fn maybe_collapses_nested_maybes() {
        let m = Type::maybe(Type::maybe(Type::Number));
        assert_eq!(m, Type::maybe(Type::Number));
    }
}
