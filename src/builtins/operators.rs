//! Signature sets for the built-in scalar operators.

use std::sync::{Arc, LazyLock};

use rustc_hash::FxHashMap;

use crate::symbols::{
    OperatorSymbol, Parameter, ParameterTypeKind, ReturnKind, Signature, TypeSymbol,
};
use crate::syntax::OperatorKind;

fn sig(name: &str, parameters: Vec<Parameter>, return_kind: ReturnKind) -> Arc<Signature> {
    Signature::new(name, parameters, return_kind)
}

fn kind_param(name: &str, kind: ParameterTypeKind) -> Parameter {
    Parameter::of_kind(name, kind)
}

fn decl_param(name: &str, types: &[TypeSymbol]) -> Parameter {
    Parameter::declared(name, types.to_vec())
}

/// Arithmetic: one widest-numeric signature plus the temporal forms.
fn arithmetic(kind: OperatorKind) -> Vec<Arc<Signature>> {
    let name = kind.display_name();
    let mut sigs = vec![sig(
        name,
        vec![
            kind_param("left", ParameterTypeKind::Number),
            kind_param("right", ParameterTypeKind::Number),
        ],
        ReturnKind::Widest,
    )];
    match kind {
        OperatorKind::Add => {
            sigs.push(sig(
                name,
                vec![
                    decl_param("left", &[TypeSymbol::DATETIME]),
                    decl_param("right", &[TypeSymbol::TIMESPAN]),
                ],
                ReturnKind::Declared(TypeSymbol::DATETIME),
            ));
            sigs.push(sig(
                name,
                vec![
                    decl_param("left", &[TypeSymbol::TIMESPAN]),
                    decl_param("right", &[TypeSymbol::DATETIME]),
                ],
                ReturnKind::Declared(TypeSymbol::DATETIME),
            ));
            sigs.push(sig(
                name,
                vec![
                    decl_param("left", &[TypeSymbol::TIMESPAN]),
                    decl_param("right", &[TypeSymbol::TIMESPAN]),
                ],
                ReturnKind::Declared(TypeSymbol::TIMESPAN),
            ));
        }
        OperatorKind::Subtract => {
            sigs.push(sig(
                name,
                vec![
                    decl_param("left", &[TypeSymbol::DATETIME]),
                    decl_param("right", &[TypeSymbol::DATETIME]),
                ],
                ReturnKind::Declared(TypeSymbol::TIMESPAN),
            ));
            sigs.push(sig(
                name,
                vec![
                    decl_param("left", &[TypeSymbol::DATETIME]),
                    decl_param("right", &[TypeSymbol::TIMESPAN]),
                ],
                ReturnKind::Declared(TypeSymbol::DATETIME),
            ));
            sigs.push(sig(
                name,
                vec![
                    decl_param("left", &[TypeSymbol::TIMESPAN]),
                    decl_param("right", &[TypeSymbol::TIMESPAN]),
                ],
                ReturnKind::Declared(TypeSymbol::TIMESPAN),
            ));
        }
        _ => {}
    }
    sigs
}

fn unary(kind: OperatorKind) -> Vec<Arc<Signature>> {
    let name = kind.display_name();
    vec![
        sig(
            name,
            vec![kind_param("operand", ParameterTypeKind::Number)],
            ReturnKind::Parameter0,
        ),
        sig(
            name,
            vec![decl_param("operand", &[TypeSymbol::TIMESPAN])],
            ReturnKind::Declared(TypeSymbol::TIMESPAN),
        ),
    ]
}

/// Equality and ordering accept any comparable scalar pair, dynamic
/// included; the result is always boolean.
fn comparison(kind: OperatorKind) -> Vec<Arc<Signature>> {
    vec![sig(
        kind.display_name(),
        vec![
            kind_param("left", ParameterTypeKind::CommonScalarOrDynamic),
            kind_param("right", ParameterTypeKind::CommonScalarOrDynamic),
        ],
        ReturnKind::Declared(TypeSymbol::BOOL),
    )]
}

fn string_predicate(kind: OperatorKind) -> Vec<Arc<Signature>> {
    vec![sig(
        kind.display_name(),
        vec![
            kind_param("text", ParameterTypeKind::StringOrDynamic),
            kind_param("term", ParameterTypeKind::StringOrDynamic),
        ],
        ReturnKind::Declared(TypeSymbol::BOOL),
    )]
}

fn regex_predicate(kind: OperatorKind) -> Vec<Arc<Signature>> {
    vec![sig(
        kind.display_name(),
        vec![
            kind_param("text", ParameterTypeKind::StringOrDynamic),
            decl_param("pattern", &[TypeSymbol::STRING]),
        ],
        ReturnKind::Declared(TypeSymbol::BOOL),
    )]
}

fn in_list(kind: OperatorKind) -> Vec<Arc<Signature>> {
    vec![sig(
        kind.display_name(),
        vec![
            kind_param("value", ParameterTypeKind::CommonScalarOrDynamic),
            kind_param("set", ParameterTypeKind::CommonScalarOrDynamic).repeatable(),
        ],
        ReturnKind::Declared(TypeSymbol::BOOL),
    )]
}

fn between(kind: OperatorKind) -> Vec<Arc<Signature>> {
    vec![sig(
        kind.display_name(),
        vec![
            kind_param("value", ParameterTypeKind::CommonSummable),
            kind_param("low", ParameterTypeKind::CommonSummable),
            kind_param("high", ParameterTypeKind::CommonSummable),
        ],
        ReturnKind::Declared(TypeSymbol::BOOL),
    )]
}

fn logical(kind: OperatorKind) -> Vec<Arc<Signature>> {
    vec![sig(
        kind.display_name(),
        vec![
            decl_param("left", &[TypeSymbol::BOOL, TypeSymbol::DYNAMIC]),
            decl_param("right", &[TypeSymbol::BOOL, TypeSymbol::DYNAMIC]),
        ],
        ReturnKind::Declared(TypeSymbol::BOOL),
    )]
}

fn signatures_for(kind: OperatorKind) -> Vec<Arc<Signature>> {
    use OperatorKind::*;
    match kind {
        Add | Subtract | Multiply | Divide | Modulo => arithmetic(kind),
        UnaryPlus | UnaryMinus => unary(kind),
        Equal | NotEqual | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            comparison(kind)
        }
        EqualTilde | BangTilde => comparison(kind),
        MatchRegex => regex_predicate(kind),
        In | InCs | NotIn | NotInCs => in_list(kind),
        Between | NotBetween => between(kind),
        HasAny => in_list(kind),
        And | Or => logical(kind),
        Search => string_predicate(kind),
        // every remaining kind is a string predicate
        _ => string_predicate(kind),
    }
}

static OPERATORS: LazyLock<FxHashMap<OperatorKind, Arc<OperatorSymbol>>> = LazyLock::new(|| {
    use OperatorKind::*;
    let all = [
        Add, Subtract, Multiply, Divide, Modulo, UnaryPlus, UnaryMinus, Equal, NotEqual, LessThan,
        LessThanOrEqual, GreaterThan, GreaterThanOrEqual, EqualTilde, BangTilde, MatchRegex,
        Contains, NotContains, ContainsCs, NotContainsCs, StartsWith, NotStartsWith, StartsWithCs,
        NotStartsWithCs, EndsWith, NotEndsWith, EndsWithCs, NotEndsWithCs, Has, NotHas, HasCs,
        NotHasCs, HasPrefix, NotHasPrefix, HasPrefixCs, NotHasPrefixCs, HasSuffix, NotHasSuffix,
        HasSuffixCs, NotHasSuffixCs, Like, NotLike, LikeCs, NotLikeCs, In, InCs, NotIn, NotInCs,
        Between, NotBetween, HasAny, And, Or, Search,
    ];
    all.into_iter()
        .map(|kind| (kind, OperatorSymbol::new(kind, signatures_for(kind))))
        .collect()
});

/// The shared operator symbol for a kind.
pub fn operator(kind: OperatorKind) -> &'static Arc<OperatorSymbol> {
    OPERATORS
        .get(&kind)
        .expect("every operator kind is registered")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_has_temporal_overloads() {
        let add = operator(OperatorKind::Add);
        assert!(add.signatures.len() >= 4);
        let mul = operator(OperatorKind::Multiply);
        assert_eq!(mul.signatures.len(), 1);
    }

    #[test]
    fn test_operator_identity_is_shared() {
        let a = operator(OperatorKind::Equal);
        let b = operator(OperatorKind::Equal);
        assert!(Arc::ptr_eq(a, b));
    }
}
