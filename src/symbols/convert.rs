//! Type algebra: assignability under conversion strictness levels,
//! common and widest scalar computation.

use super::scalars::ScalarType;
use super::types::{ColumnSymbol, TypeSymbol};

/// Conversion strictness for assignability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversion {
    /// Identity only.
    None,
    /// The target is strictly wider in the scalar lattice.
    Promotable,
    /// Promotable in either direction.
    Compatible,
    /// Always assignable.
    Any,
}

/// Scalar-to-scalar assignability.
pub fn scalar_assignable(from: ScalarType, to: ScalarType, conversion: Conversion) -> bool {
    if from == to {
        return true;
    }
    match conversion {
        Conversion::None => false,
        Conversion::Promotable => from.promotes_to(to),
        Conversion::Compatible => from.promotes_to(to) || to.promotes_to(from),
        Conversion::Any => true,
    }
}

/// Column-to-column assignability: equal names, assignable types.
pub fn column_assignable(from: &ColumnSymbol, to: &ColumnSymbol, conversion: Conversion) -> bool {
    crate::base::name_eq(&from.name, &to.name)
        && type_assignable(&from.column_type, &to.column_type, conversion)
}

/// General assignability.
///
/// Tables are structural: `from` is assignable to `to` iff every column
/// of `to` exists in `from` (by name, case-insensitive) with an
/// assignable type. Tuples require structural identity under `None` and
/// per-column assignability otherwise.
pub fn type_assignable(from: &TypeSymbol, to: &TypeSymbol, conversion: Conversion) -> bool {
    match (from, to) {
        (TypeSymbol::Error, _) | (_, TypeSymbol::Error) => false,
        (TypeSymbol::Scalar(a), TypeSymbol::Scalar(b)) => scalar_assignable(*a, *b, conversion),
        (TypeSymbol::Table(a), TypeSymbol::Table(b)) => b.columns.iter().all(|required| {
            a.find_column(&required.name)
                .is_some_and(|c| type_assignable(&c.column_type, &required.column_type, conversion))
        }),
        (TypeSymbol::Tuple(a), TypeSymbol::Tuple(b)) => {
            a.columns.len() == b.columns.len()
                && a.columns
                    .iter()
                    .zip(b.columns.iter())
                    .all(|(x, y)| column_assignable(x, y, conversion))
        }
        (TypeSymbol::Void, TypeSymbol::Void) => true,
        _ => matches!(conversion, Conversion::Any),
    }
}

/// The "better" of two common-type candidates: a non-dynamic scalar
/// beats dynamic, and a candidate the current promotes to beats the
/// current.
pub fn better_common(current: Option<ScalarType>, candidate: ScalarType) -> ScalarType {
    match current {
        None => candidate,
        Some(cur) => {
            if cur == ScalarType::Dynamic && candidate != ScalarType::Dynamic {
                candidate
            } else if cur.promotes_to(candidate) {
                candidate
            } else {
                cur
            }
        }
    }
}

/// The common scalar over a set of argument types, or `None` when no
/// scalar participates.
pub fn common_scalar<'a>(types: impl Iterator<Item = &'a TypeSymbol>) -> Option<ScalarType> {
    let mut best: Option<ScalarType> = None;
    for t in types {
        if let TypeSymbol::Scalar(s) = t {
            best = Some(better_common(best, *s));
        }
    }
    best
}

/// The widest numeric scalar among the given types.
pub fn widest_numeric<'a>(types: impl Iterator<Item = &'a TypeSymbol>) -> Option<ScalarType> {
    let mut best: Option<ScalarType> = None;
    for t in types {
        if let TypeSymbol::Scalar(s) = t
            && let Some(rank) = s.widening_rank()
        {
            match best.and_then(|b| b.widening_rank()) {
                Some(best_rank) if best_rank >= rank => {}
                _ => best = Some(*s),
            }
        }
    }
    best
}

/// The widest common scalar of two column types, used by the by-name
/// unifier: identical types keep themselves; distinct scalars with a
/// promotion between them keep the wider; anything else collapses to
/// dynamic.
pub fn unified_column_type(a: &TypeSymbol, b: &TypeSymbol) -> TypeSymbol {
    if a == b {
        return a.clone();
    }
    if let (TypeSymbol::Scalar(x), TypeSymbol::Scalar(y)) = (a, b) {
        if x.promotes_to(*y) {
            return TypeSymbol::Scalar(*y);
        }
        if y.promotes_to(*x) {
            return TypeSymbol::Scalar(*x);
        }
    }
    TypeSymbol::DYNAMIC
}
