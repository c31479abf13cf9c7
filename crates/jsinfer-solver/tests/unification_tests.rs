//! End-to-end solver scenarios: unification results flowing back into the
//! type environment, the way the checker drives both.

use jsinfer_binder::{SymbolFlags, SymbolId, SymbolTable};
use jsinfer_common::intern;
use jsinfer_solver::{Type, TypeEnvironment, TypeUnifier};
use pretty_assertions::assert_eq;

fn declare(table: &mut SymbolTable, name: &str) -> SymbolId {
    table.declare(intern(name), SymbolFlags::VARIABLE)
}

/// Resolving a variable propagates into every binding that mentions it,
/// which is what happens when `let xs = []; xs.push(5);` pins the element.
#[test]
fn resolved_variables_propagate_through_the_environment() {
    let unifier = TypeUnifier::new();
    let mut table = SymbolTable::new();
    let xs = declare(&mut table, "xs");
    let first = declare(&mut table, "first");

    let element = Type::variable();
    let env = TypeEnvironment::new()
        .set_type(xs, Type::array(element.clone()))
        .set_type(first, element.clone());

    let resolved = unifier.unify(&element, &Type::Number).unwrap();
    let env = env.substitute(&element, &resolved);

    assert_eq!(env.get_type(xs), Some(&Type::array(Type::Number)));
    assert_eq!(env.get_type(first), Some(&Type::Number));
}

/// `let x = null; x = 5;` widens x to Maybe<number>.
#[test]
fn null_then_number_assignment_yields_maybe_number() {
    let unifier = TypeUnifier::new();
    let mut table = SymbolTable::new();
    let x = declare(&mut table, "x");

    let env = TypeEnvironment::new().set_type(x, Type::Null);
    let widened = unifier.unify(env.get_type(x).unwrap(), &Type::Number).unwrap();
    let env = env.set_type(x, widened);

    assert_eq!(env.get_type(x), Some(&Type::maybe(Type::Number)));

    // a later null assignment is already covered
    let again = unifier.unify(env.get_type(x).unwrap(), &Type::Null).unwrap();
    assert!(again.same(env.get_type(x).unwrap()));
}

/// Joining the environments of two branches keeps only the record
/// properties both branches agree on.
#[test]
fn branch_join_meets_record_types() {
    let unifier = TypeUnifier::new();
    let mut table = SymbolTable::new();
    let person = declare(&mut table, "person");

    let base = Type::record([(intern("name"), Type::String)]);
    let then_branch = TypeEnvironment::new().set_type(
        person,
        Type::record([(intern("name"), Type::String), (intern("age"), Type::Number)]),
    );
    let else_branch = TypeEnvironment::new().set_type(person, base.clone());

    let joined = unifier
        .unify(
            then_branch.get_type(person).unwrap(),
            else_branch.get_type(person).unwrap(),
        )
        .unwrap();
    assert_eq!(joined, base);
}

/// An uninitialized binding (`undefined`) takes on the first concrete type
/// it is assigned, in either unification order.
#[test]
fn undefined_bindings_adopt_the_assigned_type() {
    let unifier = TypeUnifier::new();
    assert_eq!(unifier.unify(&Type::Void, &Type::String).unwrap(), Type::String);
    assert_eq!(unifier.unify(&Type::String, &Type::Void).unwrap(), Type::String);
}
