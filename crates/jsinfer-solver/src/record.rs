//! Record-shaped types: structural records, arrays, and the builtin
//! property tables of String and Array.
//!
//! Property maps are keyed by name, so a property means the same thing
//! across structurally rebuilt record instances. All mutating operations are
//! copy-on-write and preserve the receiver's id.

use crate::types::{Type, TypeId};
use indexmap::IndexMap;
use jsinfer_binder::Symbol;
use jsinfer_common::{Atom, intern};
use once_cell::sync::Lazy;
use rustc_hash::FxBuildHasher;

/// Property-name to type map. Ordering is insertion order and irrelevant for
/// equality.
pub type PropertyMap = IndexMap<Atom, Type, FxBuildHasher>;

/// A structural record: a set of uniquely named, typed properties.
#[derive(Debug)]
pub struct RecordType {
    pub id: TypeId,
    pub properties: PropertyMap,
}

impl RecordType {
    pub fn new(properties: impl IntoIterator<Item = (Atom, Type)>) -> Self {
        Self {
            id: TypeId::fresh(),
            properties: properties.into_iter().collect(),
        }
    }

    pub fn with_properties_and_id(&self, properties: PropertyMap, id: TypeId) -> Self {
        Self { id, properties }
    }

    /// Width+depth subtyping: `other` is a subtype if every property of
    /// `self` exists on `other` with a subtype-compatible type.
    pub(crate) fn is_record_sub_type(&self, other: &RecordType) -> bool {
        self.properties.iter().all(|(name, expected)| {
            other
                .properties
                .get(name)
                .is_some_and(|actual| expected.is_sub_type(actual))
        })
    }

    /// Substitute inside every property type; `None` when nothing changed.
    pub(crate) fn substitute_properties(&self, old: &Type, new: &Type) -> Option<PropertyMap> {
        let mut changed = false;
        let substituted: PropertyMap = self
            .properties
            .iter()
            .map(|(name, ty)| {
                let next = ty.substitute(old, new);
                if !next.equals(ty) {
                    changed = true;
                }
                (*name, next)
            })
            .collect();
        changed.then_some(substituted)
    }
}

/// An array: a record specialized with an element type `of`. Builtin method
/// types are synthesized from `of` on access.
#[derive(Debug)]
pub struct ArrayType {
    pub id: TypeId,
    pub of: Type,
    pub properties: PropertyMap,
}

impl ArrayType {
    pub fn of(of: Type) -> Self {
        Self::with_parts(of, PropertyMap::default(), TypeId::fresh())
    }

    pub fn with_parts(of: Type, properties: PropertyMap, id: TypeId) -> Self {
        Self { id, of, properties }
    }

    pub(crate) fn is_property_sub_type(&self, other: &ArrayType) -> bool {
        self.properties.iter().all(|(name, expected)| {
            other
                .properties
                .get(name)
                .is_some_and(|actual| expected.is_sub_type(actual))
        })
    }

    pub(crate) fn substitute_properties(&self, old: &Type, new: &Type) -> Option<PropertyMap> {
        let mut changed = false;
        let substituted: PropertyMap = self
            .properties
            .iter()
            .map(|(name, ty)| {
                let next = ty.substitute(old, new);
                if !next.equals(ty) {
                    changed = true;
                }
                (*name, next)
            })
            .collect();
        changed.then_some(substituted)
    }
}

const ARRAY_BUILTINS: &[&str] = &[
    "length", "concat", "copyWithin", "every", "fill", "filter", "find", "findIndex", "forEach",
    "includes", "indexOf", "join", "lastIndexOf", "map", "pop", "push", "reduce", "reduceRight",
    "reverse", "shift", "slice", "some", "sort", "splice", "unshift",
];

fn is_array_builtin(name: Atom) -> bool {
    ARRAY_BUILTINS.contains(&name.as_str())
}

/// Array indices appear as numeric property names.
fn is_index_name(name: Atom) -> bool {
    name.as_str().parse::<u64>().is_ok()
}

static STRING_BUILTINS: Lazy<PropertyMap> = Lazy::new(|| {
    let string = Type::String;
    let number = Type::Number;
    let boolean = Type::Boolean;
    let maybe_number = || Type::maybe(Type::Number);

    let string_fn = |params: Vec<Type>, ret: Type| Type::function(string.clone(), params, ret);

    let mut builtins = PropertyMap::default();
    builtins.insert(intern("length"), number.clone());
    builtins.insert(intern("charAt"), string_fn(vec![number.clone()], string.clone()));
    builtins.insert(intern("charCodeAt"), string_fn(vec![number.clone()], number.clone()));
    builtins.insert(intern("codePointAt"), string_fn(vec![number.clone()], number.clone()));
    builtins.insert(
        intern("endsWith"),
        string_fn(vec![string.clone(), maybe_number()], boolean.clone()),
    );
    builtins.insert(
        intern("includes"),
        string_fn(vec![string.clone(), maybe_number()], boolean.clone()),
    );
    builtins.insert(
        intern("indexOf"),
        string_fn(vec![string.clone(), maybe_number()], number.clone()),
    );
    builtins.insert(
        intern("lastIndexOf"),
        string_fn(vec![string.clone(), maybe_number()], number.clone()),
    );
    builtins.insert(
        intern("normalize"),
        string_fn(vec![Type::maybe(string.clone())], string.clone()),
    );
    builtins.insert(intern("repeat"), string_fn(vec![number.clone()], string.clone()));
    builtins.insert(
        intern("replace"),
        string_fn(vec![string.clone(), string.clone()], string.clone()),
    );
    builtins.insert(
        intern("slice"),
        string_fn(vec![number.clone(), maybe_number()], string.clone()),
    );
    builtins.insert(
        intern("split"),
        string_fn(vec![Type::maybe(string.clone()), maybe_number()], Type::array(string.clone())),
    );
    builtins.insert(
        intern("startsWith"),
        string_fn(vec![string.clone(), maybe_number()], boolean.clone()),
    );
    builtins.insert(
        intern("substr"),
        string_fn(vec![number.clone(), maybe_number()], string.clone()),
    );
    builtins.insert(
        intern("substring"),
        string_fn(vec![number.clone(), maybe_number()], string.clone()),
    );
    builtins.insert(intern("toLocaleLowerCase"), string_fn(vec![], string.clone()));
    builtins.insert(intern("toLocaleUpperCase"), string_fn(vec![], string.clone()));
    builtins.insert(intern("toLowerCase"), string_fn(vec![], string.clone()));
    builtins.insert(intern("toString"), string_fn(vec![], string.clone()));
    builtins.insert(intern("toUpperCase"), string_fn(vec![], string.clone()));
    builtins.insert(intern("trim"), string_fn(vec![], string.clone()));
    builtins.insert(intern("valueOf"), string_fn(vec![], string.clone()));
    builtins
});

/// Property access on record-shaped types.
///
/// A `COMPUTED` symbol means the property name is not statically known:
/// records report the property as always present with type Any, arrays read
/// their element type. Builtin String/Array properties are immutable.
impl Type {
    /// True if reading `symbol` on this type yields something.
    pub fn has_property(&self, symbol: &Symbol) -> bool {
        match self {
            Self::Any => true,
            Self::String => STRING_BUILTINS.contains_key(&symbol.name),
            Self::Record(record) => {
                symbol.is_computed() || record.properties.contains_key(&symbol.name)
            }
            Self::Array(array) => {
                symbol.is_computed()
                    || is_index_name(symbol.name)
                    || is_array_builtin(symbol.name)
                    || array.properties.contains_key(&symbol.name)
            }
            _ => false,
        }
    }

    /// The type of the property named by `symbol`, or `None` if no such
    /// property exists.
    pub fn property_type(&self, symbol: &Symbol) -> Option<Type> {
        match self {
            Self::Any => Some(Self::Any),
            Self::String => STRING_BUILTINS.get(&symbol.name).cloned(),
            Self::Record(record) => {
                if symbol.is_computed() {
                    return Some(Self::Any);
                }
                record.properties.get(&symbol.name).cloned()
            }
            Self::Array(array) => {
                if symbol.is_computed() || is_index_name(symbol.name) {
                    return Some(array.of.clone());
                }
                if is_array_builtin(symbol.name) {
                    return Some(self.array_builtin_type(array, symbol.name));
                }
                array.properties.get(&symbol.name).cloned()
            }
            _ => None,
        }
    }

    /// Copy-on-write addition of a new property; the result keeps this
    /// type's id.
    ///
    /// # Panics
    ///
    /// Panics if the property already exists or the receiver is not a plain
    /// record or array: both indicate a bug in the calling rule.
    pub fn with_property_added(&self, symbol: &Symbol, ty: Type) -> Type {
        assert!(
            !self.has_property(symbol),
            "a property named '{}' already exists on {self}",
            symbol.name
        );
        match self {
            Self::Record(record) => {
                let mut properties = record.properties.clone();
                properties.insert(symbol.name, ty);
                Self::Record(record.with_properties_and_id(properties, record.id).into())
            }
            Self::Array(array) => {
                let mut properties = array.properties.clone();
                properties.insert(symbol.name, ty);
                Self::Array(ArrayType::with_parts(array.of.clone(), properties, array.id).into())
            }
            _ => panic!("cannot add a property to {self}"),
        }
    }

    /// Copy-on-write update of an existing property; the result keeps this
    /// type's id. Computed names leave a record unchanged (the write target
    /// is unknown) and replace an array's element type.
    ///
    /// # Panics
    ///
    /// Panics if the property does not exist, if it is a String/Array
    /// builtin, or if the receiver is not record-shaped.
    pub fn with_property_set(&self, symbol: &Symbol, ty: Type) -> Type {
        match self {
            Self::String => panic!("cannot modify properties of the builtin type string"),
            Self::Record(record) => {
                if symbol.is_computed() {
                    return self.clone();
                }
                assert!(
                    record.properties.contains_key(&symbol.name),
                    "no property named '{}' on {self}; new properties go through with_property_added",
                    symbol.name
                );
                let mut properties = record.properties.clone();
                properties.insert(symbol.name, ty);
                Self::Record(record.with_properties_and_id(properties, record.id).into())
            }
            Self::Array(array) => {
                assert!(
                    !is_array_builtin(symbol.name),
                    "the builtin array property '{}' cannot be changed",
                    symbol.name
                );
                if symbol.is_computed() || is_index_name(symbol.name) {
                    return Self::Array(
                        ArrayType::with_parts(ty, array.properties.clone(), array.id).into(),
                    );
                }
                assert!(
                    array.properties.contains_key(&symbol.name),
                    "no property named '{}' on {self}; new properties go through with_property_added",
                    symbol.name
                );
                let mut properties = array.properties.clone();
                properties.insert(symbol.name, ty);
                Self::Array(ArrayType::with_parts(array.of.clone(), properties, array.id).into())
            }
            _ => panic!("cannot set a property on {self}"),
        }
    }

    /// Synthesize the type of a builtin array method from the element type.
    fn array_builtin_type(&self, array: &ArrayType, name: Atom) -> Type {
        let this = self.clone();
        let of = array.of.clone();
        let number = Type::Number;
        let maybe_array = Type::maybe(this.clone());
        let maybe_number = || Type::maybe(Type::Number);

        // Callback-taking methods share the predicate shape
        // (element, index, array) -> boolean with a variable this.
        let callback_this = Type::variable();
        let callback_this_arg = Type::maybe(callback_this.clone());
        let predicate = Type::function(
            callback_this.clone(),
            vec![of.clone(), number.clone(), this.clone()],
            Type::Boolean,
        );

        match name.as_str() {
            "length" => number,
            "concat" => Type::function(
                this.clone(),
                vec![this.clone(), maybe_array.clone(), maybe_array],
                this,
            ),
            "copyWithin" => Type::function(
                this,
                vec![number.clone(), number, maybe_number()],
                Type::Void,
            ),
            "every" | "some" => {
                Type::function(this, vec![predicate, callback_this_arg], Type::Boolean)
            }
            "filter" => Type::function(this.clone(), vec![predicate, callback_this_arg], this),
            "fill" => Type::function(this, vec![of, number.clone(), number], Type::Void),
            "find" => Type::function(this, vec![predicate, callback_this_arg], of),
            "findIndex" => Type::function(this, vec![predicate, callback_this_arg], number),
            "forEach" => {
                let callback = Type::function(
                    callback_this,
                    vec![of, number, this.clone()],
                    Type::Void,
                );
                Type::function(this, vec![callback, callback_this_arg], Type::Void)
            }
            "includes" => Type::function(this, vec![of, maybe_number()], Type::Boolean),
            "indexOf" | "lastIndexOf" => {
                Type::function(this, vec![of, maybe_number()], number)
            }
            "join" => Type::function(this, vec![Type::maybe(Type::String)], Type::String),
            "map" => {
                let mapped = Type::variable();
                let callback = Type::function(
                    callback_this,
                    vec![of, number, this.clone()],
                    mapped.clone(),
                );
                Type::function(this, vec![callback, callback_this_arg], Type::array(mapped))
            }
            "pop" | "shift" => Type::function(this, vec![], of),
            "push" | "unshift" => Type::function(this, vec![of], number),
            "reduce" | "reduceRight" => {
                let accumulated = Type::variable();
                let reducer = Type::function(
                    Type::Void,
                    vec![accumulated.clone(), of, number, this.clone()],
                    accumulated.clone(),
                );
                Type::function(this, vec![reducer, Type::maybe(accumulated.clone())], accumulated)
            }
            "reverse" => Type::function(this.clone(), vec![], this),
            "slice" => Type::function(this.clone(), vec![number, maybe_number()], this),
            "splice" => Type::function(this.clone(), vec![number.clone(), maybe_number()], this),
            "sort" => {
                let comparator =
                    Type::function(Type::Void, vec![of.clone(), of], number);
                Type::function(this.clone(), vec![Type::maybe(comparator)], this)
            }
            other => panic!("'{other}' is not a builtin array method"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsinfer_binder::{SymbolFlags, SymbolTable};
    use pretty_assertions::assert_eq;

    fn property_symbol(table: &mut SymbolTable, name: &str) -> jsinfer_binder::SymbolId {
        table.declare(intern(name), SymbolFlags::PROPERTY)
    }

    #[test]
    fn add_property_preserves_identity() {
        let mut table = SymbolTable::new();
        let name = property_symbol(&mut table, "name");

        let record = Type::empty_record();
        let widened = record.with_property_added(table.get(name), Type::String);
        assert!(record.same(&widened));
        assert!(widened.has_property(table.get(name)));
        assert!(!record.has_property(table.get(name)));
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn add_property_rejects_duplicates() {
        let mut table = SymbolTable::new();
        let name = property_symbol(&mut table, "name");
        let record = Type::empty_record().with_property_added(table.get(name), Type::String);
        let _ = record.with_property_added(table.get(name), Type::Number);
    }

    #[test]
    #[should_panic(expected = "no property named")]
    fn set_property_requires_existence() {
        let mut table = SymbolTable::new();
        let name = property_symbol(&mut table, "name");
        let _ = Type::empty_record().with_property_set(table.get(name), Type::String);
    }

    #[test]
    fn computed_properties_read_as_any_and_are_always_present() {
        let table = SymbolTable::new();
        let computed = table.computed_symbol();
        let record = Type::empty_record();
        assert!(record.has_property(table.get(computed)));
        assert_eq!(record.property_type(table.get(computed)), Some(Type::Any));
        // writes through an unknown name leave the record alone
        let written = record.with_property_set(table.get(computed), Type::Number);
        assert!(written.equals(&record));
    }

    #[test]
    fn string_builtins_resolve_and_are_immutable() {
        let mut table = SymbolTable::new();
        let char_at = property_symbol(&mut table, "charAt");
        let ty = Type::String.property_type(table.get(char_at)).expect("charAt");
        match ty {
            Type::Function(function) => {
                assert_eq!(function.params, vec![Type::Number]);
                assert_eq!(function.return_type, Type::String);
            }
            other => panic!("expected function, got {other}"),
        }
        let missing = property_symbol(&mut table, "notAStringMethod");
        assert!(Type::String.property_type(table.get(missing)).is_none());
    }

    #[test]
    #[should_panic(expected = "builtin type string")]
    fn string_builtins_cannot_be_overwritten() {
        let mut table = SymbolTable::new();
        let char_at = property_symbol(&mut table, "charAt");
        let _ = Type::String.with_property_set(table.get(char_at), Type::Number);
    }

    #[test]
    fn array_index_access_reads_the_element_type() {
        let mut table = SymbolTable::new();
        let index = property_symbol(&mut table, "0");
        let array = Type::array(Type::Number);
        assert_eq!(array.property_type(table.get(index)), Some(Type::Number));
    }

    #[test]
    fn array_map_synthesizes_a_variable_result_element() {
        let mut table = SymbolTable::new();
        let map = property_symbol(&mut table, "map");
        let array = Type::array(Type::Number);
        let map_type = array.property_type(table.get(map)).expect("map builtin");
        match map_type {
            Type::Function(function) => match &function.return_type {
                Type::Array(result) => assert!(result.of.is_variable()),
                other => panic!("expected array result, got {other}"),
            },
            other => panic!("expected function, got {other}"),
        }
    }

    #[test]
    #[should_panic(expected = "cannot be changed")]
    fn array_builtins_cannot_be_overwritten() {
        let mut table = SymbolTable::new();
        let push = property_symbol(&mut table, "push");
        let _ = Type::array(Type::Number).with_property_set(table.get(push), Type::Number);
    }
}
