//! Built-in symbols: scalar operators, functions, aggregates, plug-ins.
//!
//! Built once per process and shared by every catalog; the binder
//! resolves against these after local and database symbols.

mod aggregates;
mod functions;
mod operators;

use std::sync::Arc;

use crate::base::name_eq;
use crate::symbols::{FunctionSymbol, OperatorSymbol};
use crate::syntax::OperatorKind;

pub use aggregates::AGGREGATES;
pub use functions::{FUNCTIONS, PLUGINS};
pub use operators::operator;

/// Look up a built-in scalar function by name.
pub fn find_function(name: &str) -> Option<&'static Arc<FunctionSymbol>> {
    FUNCTIONS.iter().find(|f| name_eq(&f.name, name))
}

/// Look up a built-in aggregate by name.
pub fn find_aggregate(name: &str) -> Option<&'static Arc<FunctionSymbol>> {
    AGGREGATES.iter().find(|f| name_eq(&f.name, name))
}

/// Look up a query plug-in (for `evaluate`) by name.
pub fn find_plugin(name: &str) -> Option<&'static Arc<FunctionSymbol>> {
    PLUGINS.iter().find(|f| name_eq(&f.name, name))
}

/// The signature set of a scalar operator.
pub fn find_operator(kind: OperatorKind) -> &'static Arc<OperatorSymbol> {
    operator(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_lookup_case_insensitive() {
        assert!(find_function("strcat").is_some());
        assert!(find_function("StrCat").is_some());
        assert!(find_function("no_such_fn").is_none());
    }

    #[test]
    fn test_aggregates_are_not_functions() {
        assert!(find_aggregate("sum").is_some());
        assert!(find_function("sum").is_none());
    }

    #[test]
    fn test_every_operator_kind_has_signatures() {
        use crate::syntax::OperatorKind::*;
        for kind in [
            Add, Subtract, Multiply, Divide, Modulo, UnaryMinus, Equal, NotEqual, LessThan,
            GreaterThanOrEqual, EqualTilde, MatchRegex, Contains, Has, StartsWithCs, Like, In,
            NotInCs, Between, HasAny, And, Or, Search,
        ] {
            assert!(
                !operator(kind).signatures.is_empty(),
                "no signatures for {kind:?}"
            );
        }
    }
}
