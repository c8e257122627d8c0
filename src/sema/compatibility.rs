// src/sema/compatibility.rs
//
// The subtype, consistency, and common-supertype relations. These are
// pure functions over the type lattice; class ancestry comes from the
// table.

use crate::sema::class_table::ClassTable;
use crate::sema::types::Type;

/// `sub <: sup`. Reflexive; primitives only subtype themselves;
/// instances follow the declared superclass chain; functions are
/// contravariant in parameters and covariant in return type; arrays
/// are invariant; `T <: T|null`.
pub fn is_subtype(sub: &Type, sup: &Type, classes: &ClassTable) -> bool {
    if sub == sup {
        return true;
    }
    match (sub, sup) {
        (Type::Instance(_), Type::Object) => true,
        (Type::Instance(s), Type::Instance(t)) => classes.is_descendant(*s, *t),
        (Type::Null, Type::Optional(_)) => true,
        (_, Type::Optional(element)) => is_subtype(sub, element, classes),
        (Type::Function(s), Type::Function(t)) => {
            s.params.len() == t.params.len()
                && s.params
                    .iter()
                    .zip(t.params.iter())
                    .all(|(sp, tp)| is_subtype(tp, sp, classes))
                && is_subtype(&s.return_type, &t.return_type, classes)
        }
        _ => false,
    }
}

/// Gradual-typing compatibility: `any` on either side, or equality.
/// A consistent-but-not-subtype assignment goes through with a
/// runtime coercion marker.
pub fn is_consistent(a: &Type, b: &Type) -> bool {
    matches!(a, Type::Any) || matches!(b, Type::Any) || a == b
}

/// Smallest common supertype in the lattice. `any` is the top and
/// always a valid answer; `None` only for primitive disagreements
/// the language does not permit.
pub fn common_super_type(a: &Type, b: &Type, classes: &ClassTable) -> Option<Type> {
    if matches!(a, Type::Any) || matches!(b, Type::Any) {
        return Some(Type::Any);
    }
    if is_subtype(a, b, classes) {
        return Some(b.clone());
    }
    if is_subtype(b, a, classes) {
        return Some(a.clone());
    }
    if a.is_numeric() && b.is_numeric() {
        return Some(Type::Float);
    }
    match (a, b) {
        (Type::Null, other) | (other, Type::Null) if other.can_be_optional_element() => {
            Some(Type::optional(other.clone()))
        }
        (Type::Optional(element), other) | (other, Type::Optional(element)) => {
            let joined = common_super_type(element, other, classes)?;
            if joined.can_be_optional_element() {
                Some(Type::optional(joined))
            } else {
                None
            }
        }
        (Type::Instance(x), Type::Instance(y)) => Some(
            classes
                .common_ancestor(*x, *y)
                .map(Type::Instance)
                .unwrap_or(Type::Object),
        ),
        (Type::Instance(_), Type::Object) | (Type::Object, Type::Instance(_)) => {
            Some(Type::Object)
        }
        _ => None,
    }
}

/// The storage-level type seen when reading an array element: object
/// and optional cells are tagged slots represented as `any`; numeric
/// and boolean cells are unboxed and read back verbatim.
pub fn actual_element_type(t: &Type) -> Type {
    match t {
        Type::Object
        | Type::Instance(_)
        | Type::Optional(_)
        | Type::Function(_)
        | Type::Array(_) => Type::Any,
        other => other.clone(),
    }
}
