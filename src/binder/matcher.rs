//! Overload resolution over signature sets, and the post-resolution
//! signature check.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::Span;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::symbols::{
    ArgumentKind, Conversion, Parameter, ParameterTypeKind, ScalarType, Signature, TypeSymbol,
    scalar_assignable, type_assignable,
};
use crate::syntax::Literal;

// ============================================================================
// ARGUMENT VIEW
// ============================================================================

/// Everything the matcher needs to know about one bound argument.
#[derive(Debug, Clone)]
pub struct ArgumentInfo {
    /// Supplied parameter name, for named arguments.
    pub name: Option<SmolStr>,
    pub arg_type: TypeSymbol,
    pub span: Span,
    /// The node the argument came from, when it exists in a tree.
    pub expr: Option<crate::syntax::ExprId>,
    pub is_star: bool,
    pub is_constant: bool,
    pub is_literal: bool,
    pub literal: Option<Literal>,
    /// The argument is a direct column reference from the row scope.
    pub is_column_ref: bool,
}

impl ArgumentInfo {
    pub fn of_type(arg_type: TypeSymbol) -> Self {
        Self {
            name: None,
            arg_type,
            span: Span::default(),
            expr: None,
            is_star: false,
            is_constant: false,
            is_literal: false,
            literal: None,
            is_column_ref: false,
        }
    }
}

// ============================================================================
// MATCH KINDS
// ============================================================================

/// Ordered category of the argument/parameter relationship; higher is a
/// better match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    None,
    NotType,
    Scalar,
    Summable,
    Number,
    Compatible,
    Promoted,
    Tabular,
    Table,
    Database,
    Cluster,
    OneOfTwo,
    Exact,
}

fn scalar_of(t: &TypeSymbol) -> Option<ScalarType> {
    t.as_scalar()
}

/// Classify one argument against one parameter.
///
/// `arg_types` carries every argument's bound type for the
/// `Parameter0/1/2` alias kinds.
pub fn match_kind(parameter: &Parameter, arg: &ArgumentInfo, arg_types: &[TypeSymbol]) -> MatchKind {
    // star only fits a star-kinded parameter
    if arg.is_star {
        return if parameter.argument_kind == ArgumentKind::Star {
            MatchKind::Exact
        } else {
            MatchKind::None
        };
    }
    if parameter.argument_kind == ArgumentKind::Star {
        return MatchKind::None;
    }

    let t = &arg.arg_type;
    // error operands match anything so selection stays stable and no
    // cascading diagnostics fire
    if t.is_error() {
        return MatchKind::Exact;
    }

    match parameter.type_kind {
        ParameterTypeKind::Declared => {
            let types = &parameter.declared_types;
            if types.iter().any(|d| type_assignable(t, d, Conversion::None)) {
                return match types.len() {
                    1 => MatchKind::Exact,
                    2 => MatchKind::OneOfTwo,
                    _ => MatchKind::Scalar,
                };
            }
            if types
                .iter()
                .any(|d| type_assignable(t, d, Conversion::Promotable))
            {
                return MatchKind::Promoted;
            }
            if types
                .iter()
                .any(|d| type_assignable(t, d, Conversion::Compatible))
            {
                return MatchKind::Compatible;
            }
            // dynamic converts to any scalar target
            if t.is_dynamic() && types.iter().any(|d| d.is_scalar()) {
                return MatchKind::Compatible;
            }
            MatchKind::None
        }
        ParameterTypeKind::Scalar
        | ParameterTypeKind::CommonScalar
        | ParameterTypeKind::CommonScalarOrDynamic => {
            if t.is_scalar() {
                MatchKind::Scalar
            } else {
                MatchKind::None
            }
        }
        ParameterTypeKind::Integer => match scalar_of(t) {
            Some(s) if s.is_integer() => MatchKind::Number,
            Some(ScalarType::Dynamic) => MatchKind::Compatible,
            _ => MatchKind::None,
        },
        ParameterTypeKind::RealOrDecimal => match scalar_of(t) {
            Some(ScalarType::Real) | Some(ScalarType::Decimal) => MatchKind::OneOfTwo,
            Some(ScalarType::Dynamic) => MatchKind::Compatible,
            _ => MatchKind::None,
        },
        ParameterTypeKind::StringOrDynamic => match scalar_of(t) {
            Some(ScalarType::String) | Some(ScalarType::Dynamic) => MatchKind::OneOfTwo,
            _ => MatchKind::None,
        },
        ParameterTypeKind::IntegerOrDynamic => match scalar_of(t) {
            Some(s) if s.is_integer() => MatchKind::OneOfTwo,
            Some(ScalarType::Dynamic) => MatchKind::OneOfTwo,
            _ => MatchKind::None,
        },
        ParameterTypeKind::Number | ParameterTypeKind::CommonNumber => match scalar_of(t) {
            Some(s) if s.is_numeric() => MatchKind::Number,
            Some(ScalarType::Dynamic) => MatchKind::Compatible,
            _ => MatchKind::None,
        },
        ParameterTypeKind::Summable | ParameterTypeKind::CommonSummable => match scalar_of(t) {
            Some(s) if s.is_summable() => MatchKind::Summable,
            Some(ScalarType::Dynamic) => MatchKind::Compatible,
            _ => MatchKind::None,
        },
        ParameterTypeKind::Tabular => {
            if t.is_table() {
                MatchKind::Tabular
            } else {
                MatchKind::None
            }
        }
        ParameterTypeKind::SingleColumnTable => match t.as_table() {
            Some(table) if table.columns.len() == 1 => MatchKind::Table,
            Some(_) => MatchKind::Tabular,
            None => MatchKind::None,
        },
        ParameterTypeKind::Database => MatchKind::None,
        ParameterTypeKind::Cluster => MatchKind::None,
        ParameterTypeKind::NotBool => match scalar_of(t) {
            Some(ScalarType::Bool) | None => MatchKind::None,
            Some(_) => MatchKind::NotType,
        },
        ParameterTypeKind::NotRealOrBool => match scalar_of(t) {
            Some(ScalarType::Real) | Some(ScalarType::Bool) | None => MatchKind::None,
            Some(_) => MatchKind::NotType,
        },
        ParameterTypeKind::NotDynamic => match scalar_of(t) {
            Some(ScalarType::Dynamic) | None => MatchKind::None,
            Some(_) => MatchKind::NotType,
        },
        ParameterTypeKind::Parameter0 => alias_match(t, arg_types.first()),
        ParameterTypeKind::Parameter1 => alias_match(t, arg_types.get(1)),
        ParameterTypeKind::Parameter2 => alias_match(t, arg_types.get(2)),
    }
}

fn alias_match(t: &TypeSymbol, other: Option<&TypeSymbol>) -> MatchKind {
    let Some(other) = other else {
        return MatchKind::None;
    };
    if t == other {
        MatchKind::Exact
    } else if type_assignable(t, other, Conversion::Promotable) {
        MatchKind::Promoted
    } else if type_assignable(t, other, Conversion::Compatible) || t.is_dynamic() {
        MatchKind::Compatible
    } else {
        MatchKind::None
    }
}

// ============================================================================
// ARGUMENT → PARAMETER MAPPING
// ============================================================================

/// Map argument positions to parameter indices, honoring named
/// arguments when the signature allows them. `None` when the shape is
/// irreconcilable (unknown name and nothing positional to absorb it).
pub fn map_arguments(signature: &Signature, args: &[ArgumentInfo]) -> Vec<Option<usize>> {
    let mut mapping = Vec::with_capacity(args.len());
    let mut next_positional = 0usize;
    for arg in args {
        match (&arg.name, signature.named_arguments_allowed) {
            (Some(name), true) => {
                let index = signature.find_parameter(name);
                if let Some(index) = index {
                    mapping.push(Some(index));
                    if index == next_positional {
                        next_positional += 1;
                    }
                } else {
                    mapping.push(None);
                }
            }
            _ => {
                let index = if next_positional < signature.parameters.len() {
                    Some(next_positional)
                } else if signature.parameters.last().is_some_and(|p| p.is_repeatable) {
                    Some(signature.parameters.len() - 1)
                } else {
                    None
                };
                mapping.push(index);
                next_positional = (next_positional + 1).min(signature.parameters.len());
            }
        }
    }
    mapping
}

// ============================================================================
// BEST-MATCH SELECTION
// ============================================================================

/// The outcome of overload resolution.
#[derive(Debug, Clone)]
pub enum MatchResult {
    /// A unique best signature.
    Best(Arc<Signature>),
    /// Several signatures tied; no unique winner.
    Ambiguous(Vec<Arc<Signature>>),
}

/// Select the best signature for the arguments (spec'd ordering:
/// arity filter, per-argument match kinds, match count, pairwise
/// better-than). Deterministic in candidate order.
pub fn get_best_matching(signatures: &[Arc<Signature>], args: &[ArgumentInfo]) -> MatchResult {
    debug_assert!(!signatures.is_empty());

    // 1. arity filter; when nothing fits, fall back to the closest by
    //    minimum count
    let mut candidates: Vec<&Arc<Signature>> = signatures
        .iter()
        .filter(|s| s.accepts_count(args.len()))
        .collect();
    if candidates.is_empty() {
        let closest = signatures
            .iter()
            .map(|s| s.min_argument_count().abs_diff(args.len()))
            .min()
            .unwrap_or(0);
        candidates = signatures
            .iter()
            .filter(|s| s.min_argument_count().abs_diff(args.len()) == closest)
            .collect();
    }

    if candidates.len() == 1 {
        return MatchResult::Best(candidates[0].clone());
    }

    // 2./3. per-argument kinds and match counts
    let arg_types: Vec<TypeSymbol> = args.iter().map(|a| a.arg_type.clone()).collect();
    let scored: Vec<(usize, Vec<MatchKind>)> = candidates
        .iter()
        .map(|sig| {
            let mapping = map_arguments(sig, args);
            let kinds: Vec<MatchKind> = args
                .iter()
                .zip(mapping.iter())
                .map(|(arg, slot)| match slot {
                    Some(index) => sig
                        .parameter_for_position(*index)
                        .or_else(|| sig.parameters.get(*index))
                        .map(|p| match_kind(p, arg, &arg_types))
                        .unwrap_or(MatchKind::None),
                    None => MatchKind::None,
                })
                .collect();
            let count = kinds.iter().filter(|k| **k > MatchKind::None).count();
            (count, kinds)
        })
        .collect();

    let best_count = scored.iter().map(|(c, _)| *c).max().unwrap_or(0);
    let top: Vec<usize> = (0..candidates.len())
        .filter(|i| scored[*i].0 == best_count)
        .collect();

    if top.len() == 1 {
        return MatchResult::Best(candidates[top[0]].clone());
    }

    // 4. pairwise better-than among the tied set
    let full = args.len();
    let beats = |a: usize, b: usize| -> bool {
        let (count_a, kinds_a) = &scored[a];
        let (count_b, kinds_b) = &scored[b];
        if *count_a == full && *count_b < full {
            return true;
        }
        let mut strictly_better_somewhere = false;
        for (ka, kb) in kinds_a.iter().zip(kinds_b.iter()) {
            if ka < kb {
                return false;
            }
            if ka > kb {
                strictly_better_somewhere = true;
            }
        }
        strictly_better_somewhere
    };

    for &i in &top {
        if top.iter().all(|&j| j == i || beats(i, j)) {
            return MatchResult::Best(candidates[i].clone());
        }
    }

    MatchResult::Ambiguous(top.iter().map(|&i| candidates[i].clone()).collect())
}

// ============================================================================
// SIGNATURE CHECK
// ============================================================================

/// Validate the selected signature against the actual arguments,
/// producing diagnostics (never failing).
pub fn check_signature(
    signature: &Signature,
    args: &[ArgumentInfo],
    call_span: Span,
    user_defined: bool,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    // arity
    if !signature.accepts_count(args.len()) {
        diagnostics.push(Diagnostic::error(
            DiagnosticKind::WrongNumberOfArguments {
                name: signature.symbol_name.clone(),
                provided: args.len(),
            },
            call_span,
        ));
        return diagnostics;
    }

    // named-argument shape
    if args.iter().any(|a| a.name.is_some()) {
        if !signature.named_arguments_allowed {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::NamedArgumentsNotSupported,
                call_span,
            ));
        } else {
            check_named_arguments(signature, args, &mut diagnostics);
        }
    }

    // star placement: a star argument must be last
    if let Some(star_at) = args.iter().position(|a| a.is_star)
        && star_at + 1 != args.len()
    {
        diagnostics.push(Diagnostic::error(
            DiagnosticKind::StarMustBeLastArgument,
            args[star_at].span,
        ));
    }

    let mapping = map_arguments(signature, args);
    let arg_types: Vec<TypeSymbol> = args.iter().map(|a| a.arg_type.clone()).collect();
    let conversion = if user_defined {
        Conversion::Compatible
    } else {
        Conversion::Promotable
    };

    let mut satisfied = vec![false; signature.parameters.len()];
    for (arg, slot) in args.iter().zip(mapping.iter()) {
        let Some(index) = *slot else { continue };
        let Some(parameter) = signature
            .parameter_for_position(index)
            .or_else(|| signature.parameters.get(index))
        else {
            continue;
        };
        if index < satisfied.len() {
            satisfied[index] = true;
        }
        check_argument(parameter, arg, &arg_types, conversion, &mut diagnostics);
    }

    // missing non-optional parameters
    for (i, parameter) in signature.parameters.iter().enumerate() {
        if !parameter.is_optional && !satisfied[i] {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::MissingArgument {
                    parameter: parameter.name.clone(),
                },
                call_span,
            ));
        }
    }

    diagnostics
}

fn check_named_arguments(
    signature: &Signature,
    args: &[ArgumentInfo],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut seen: Vec<&SmolStr> = Vec::new();
    let mut out_of_order = false;
    let mut position = 0usize;
    for arg in args {
        match &arg.name {
            Some(name) => {
                match signature.find_parameter(name) {
                    None => diagnostics.push(Diagnostic::error(
                        DiagnosticKind::UnknownNamedArgument { name: name.clone() },
                        arg.span,
                    )),
                    Some(index) => {
                        if seen.iter().any(|n| crate::base::name_eq(n, name)) {
                            diagnostics.push(Diagnostic::error(
                                DiagnosticKind::DuplicateNamedArgument { name: name.clone() },
                                arg.span,
                            ));
                        }
                        if index != position {
                            out_of_order = true;
                        }
                        seen.push(name);
                    }
                }
            }
            None => {
                if out_of_order {
                    diagnostics.push(Diagnostic::error(
                        DiagnosticKind::UnnamedArgumentAfterNamed,
                        arg.span,
                    ));
                }
            }
        }
        position += 1;
    }
}

fn check_argument(
    parameter: &Parameter,
    arg: &ArgumentInfo,
    arg_types: &[TypeSymbol],
    conversion: Conversion,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // error operands already carry their own diagnostic
    if arg.arg_type.is_error() {
        return;
    }

    // syntactic shape
    match parameter.argument_kind {
        ArgumentKind::Expression => {}
        ArgumentKind::Star => {
            if !arg.is_star {
                diagnostics.push(Diagnostic::error(DiagnosticKind::StarNotAllowed, arg.span));
                return;
            }
        }
        ArgumentKind::Column => {
            if !arg.is_column_ref {
                diagnostics.push(Diagnostic::error(DiagnosticKind::ColumnRequired, arg.span));
            }
        }
        ArgumentKind::Constant => {
            if !arg.is_constant {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::ConstantRequired,
                    arg.span,
                ));
            }
        }
        ArgumentKind::Literal => {
            if !arg.is_literal {
                diagnostics.push(Diagnostic::error(DiagnosticKind::LiteralRequired, arg.span));
            }
        }
        ArgumentKind::LiteralNotEmpty => {
            if !arg.is_literal {
                diagnostics.push(Diagnostic::error(DiagnosticKind::LiteralRequired, arg.span));
            } else if arg.literal.as_ref().is_some_and(|l| l.is_empty_string()) {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::NonEmptyLiteralRequired,
                    arg.span,
                ));
            }
        }
    }

    if arg.is_star {
        return;
    }

    // default-value sentinel bypasses the type check
    if let (Some(indicator), Some(literal)) =
        (&parameter.default_value_indicator, &arg.literal)
        && literal.as_str() == Some(indicator.as_str())
    {
        return;
    }

    // enumerated accepted values
    if !parameter.values.is_empty() {
        let text = arg.literal.as_ref().and_then(|l| l.as_str());
        let ok = text.is_some_and(|t| {
            parameter.values.iter().any(|v| {
                if parameter.case_sensitive_values {
                    v == t
                } else {
                    crate::base::name_eq(v, t)
                }
            })
        });
        if !ok {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::ValueNotAllowed {
                    values: parameter.values.clone(),
                },
                arg.span,
            ));
            return;
        }
    }

    // type admissibility
    if !parameter_accepts(parameter, &arg.arg_type, arg_types, conversion) {
        diagnostics.push(Diagnostic::error(
            DiagnosticKind::WrongArgumentType {
                expected: expected_names(parameter),
                actual: arg.arg_type.display_name(),
            },
            arg.span,
        ));
    }
}

/// Whether the argument type satisfies the parameter under the given
/// conversion.
pub fn parameter_accepts(
    parameter: &Parameter,
    arg_type: &TypeSymbol,
    arg_types: &[TypeSymbol],
    conversion: Conversion,
) -> bool {
    if arg_type.is_error() {
        return true;
    }
    let scalar = arg_type.as_scalar();
    match parameter.type_kind {
        ParameterTypeKind::Declared => {
            parameter
                .declared_types
                .iter()
                .any(|d| type_assignable(arg_type, d, conversion))
                || (arg_type.is_dynamic()
                    && parameter.declared_types.iter().any(|d| d.is_scalar()))
        }
        ParameterTypeKind::Scalar
        | ParameterTypeKind::CommonScalar
        | ParameterTypeKind::CommonScalarOrDynamic => arg_type.is_scalar(),
        ParameterTypeKind::Integer => {
            scalar.is_some_and(|s| s.is_integer() || s == ScalarType::Dynamic)
        }
        ParameterTypeKind::RealOrDecimal => scalar.is_some_and(|s| {
            matches!(s, ScalarType::Real | ScalarType::Decimal | ScalarType::Dynamic)
        }),
        ParameterTypeKind::StringOrDynamic => {
            scalar.is_some_and(|s| matches!(s, ScalarType::String | ScalarType::Dynamic))
        }
        ParameterTypeKind::IntegerOrDynamic => {
            scalar.is_some_and(|s| s.is_integer() || s == ScalarType::Dynamic)
        }
        ParameterTypeKind::Number | ParameterTypeKind::CommonNumber => {
            scalar.is_some_and(|s| s.is_numeric() || s == ScalarType::Dynamic)
        }
        ParameterTypeKind::Summable | ParameterTypeKind::CommonSummable => {
            scalar.is_some_and(|s| s.is_summable() || s == ScalarType::Dynamic)
        }
        ParameterTypeKind::Tabular => arg_type.is_table(),
        ParameterTypeKind::SingleColumnTable => {
            arg_type.as_table().is_some_and(|t| t.columns.len() == 1)
        }
        ParameterTypeKind::Database | ParameterTypeKind::Cluster => {
            // validated through the literal lookup in the return resolver
            scalar == Some(ScalarType::String)
        }
        ParameterTypeKind::NotBool => scalar.is_some_and(|s| s != ScalarType::Bool),
        ParameterTypeKind::NotRealOrBool => {
            scalar.is_some_and(|s| !matches!(s, ScalarType::Real | ScalarType::Bool))
        }
        ParameterTypeKind::NotDynamic => scalar.is_some_and(|s| s != ScalarType::Dynamic),
        ParameterTypeKind::Parameter0 => alias_accepts(arg_type, arg_types.first(), conversion),
        ParameterTypeKind::Parameter1 => alias_accepts(arg_type, arg_types.get(1), conversion),
        ParameterTypeKind::Parameter2 => alias_accepts(arg_type, arg_types.get(2), conversion),
    }
}

fn alias_accepts(t: &TypeSymbol, other: Option<&TypeSymbol>, conversion: Conversion) -> bool {
    match other {
        Some(other) => {
            type_assignable(t, other, conversion)
                || t.is_dynamic()
                || other.is_dynamic()
                || matches!(
                    (t.as_scalar(), other.as_scalar()),
                    (Some(a), Some(b)) if scalar_assignable(a, b, Conversion::Compatible)
                )
        }
        None => true,
    }
}

fn expected_names(parameter: &Parameter) -> Vec<SmolStr> {
    match parameter.type_kind {
        ParameterTypeKind::Declared => parameter
            .declared_types
            .iter()
            .map(|t| t.display_name())
            .collect(),
        ParameterTypeKind::Scalar
        | ParameterTypeKind::CommonScalar
        | ParameterTypeKind::CommonScalarOrDynamic => vec!["scalar".into()],
        ParameterTypeKind::Integer => vec!["int".into(), "long".into()],
        ParameterTypeKind::RealOrDecimal => vec!["real".into(), "decimal".into()],
        ParameterTypeKind::StringOrDynamic => vec!["string".into(), "dynamic".into()],
        ParameterTypeKind::IntegerOrDynamic => {
            vec!["int".into(), "long".into(), "dynamic".into()]
        }
        ParameterTypeKind::Number | ParameterTypeKind::CommonNumber => vec!["number".into()],
        ParameterTypeKind::Summable | ParameterTypeKind::CommonSummable => {
            vec!["number".into(), "datetime".into(), "timespan".into()]
        }
        ParameterTypeKind::Tabular | ParameterTypeKind::SingleColumnTable => {
            vec!["tabular".into()]
        }
        ParameterTypeKind::Database => vec!["database".into()],
        ParameterTypeKind::Cluster => vec!["cluster".into()],
        ParameterTypeKind::NotBool => vec!["any non-bool scalar".into()],
        ParameterTypeKind::NotRealOrBool => vec!["any non-real non-bool scalar".into()],
        ParameterTypeKind::NotDynamic => vec!["any non-dynamic scalar".into()],
        ParameterTypeKind::Parameter0
        | ParameterTypeKind::Parameter1
        | ParameterTypeKind::Parameter2 => vec!["same as paired argument".into()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::ReturnKind;

    fn args(types: &[TypeSymbol]) -> Vec<ArgumentInfo> {
        types.iter().map(|t| ArgumentInfo::of_type(t.clone())).collect()
    }

    fn num_sig(name: &str, t: &TypeSymbol) -> Arc<Signature> {
        Signature::new(
            name,
            vec![
                Parameter::declared("left", vec![t.clone()]),
                Parameter::declared("right", vec![t.clone()]),
            ],
            ReturnKind::Declared(t.clone()),
        )
    }

    #[test]
    fn test_exact_beats_promoted() {
        let sigs = vec![
            num_sig("op", &TypeSymbol::LONG),
            num_sig("op", &TypeSymbol::INT),
        ];
        let result = get_best_matching(&sigs, &args(&[TypeSymbol::INT, TypeSymbol::INT]));
        match result {
            MatchResult::Best(sig) => {
                assert_eq!(sig.parameters[0].declared_types[0], TypeSymbol::INT);
            }
            other => panic!("expected best, got {other:?}"),
        }
    }

    #[test]
    fn test_mixed_args_pick_promotable_signature() {
        let sigs = vec![
            num_sig("op", &TypeSymbol::LONG),
            num_sig("op", &TypeSymbol::INT),
        ];
        // (int, long): only the long signature matches both
        let result = get_best_matching(&sigs, &args(&[TypeSymbol::INT, TypeSymbol::LONG]));
        match result {
            MatchResult::Best(sig) => {
                assert_eq!(sig.parameters[0].declared_types[0], TypeSymbol::LONG);
            }
            other => panic!("expected best, got {other:?}"),
        }
    }

    #[test]
    fn test_selection_is_order_independent() {
        let a = num_sig("op", &TypeSymbol::LONG);
        let b = num_sig("op", &TypeSymbol::INT);
        let input = args(&[TypeSymbol::INT, TypeSymbol::INT]);
        let r1 = get_best_matching(&[a.clone(), b.clone()], &input);
        let r2 = get_best_matching(&[b.clone(), a.clone()], &input);
        match (r1, r2) {
            (MatchResult::Best(x), MatchResult::Best(y)) => assert!(Arc::ptr_eq(&x, &y)),
            other => panic!("expected best twice, got {other:?}"),
        }
    }

    #[test]
    fn test_identical_signatures_are_ambiguous() {
        let sigs = vec![
            num_sig("op", &TypeSymbol::LONG),
            num_sig("op", &TypeSymbol::LONG),
        ];
        let result = get_best_matching(&sigs, &args(&[TypeSymbol::LONG, TypeSymbol::LONG]));
        assert!(matches!(result, MatchResult::Ambiguous(v) if v.len() == 2));
    }

    #[test]
    fn test_check_signature_arity() {
        let sig = num_sig("op", &TypeSymbol::LONG);
        let diags = check_signature(&sig, &args(&[TypeSymbol::LONG]), Span::default(), false);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].code(),
            crate::diagnostics::codes::WRONG_NUMBER_OF_ARGUMENTS
        );
    }

    #[test]
    fn test_check_signature_wrong_type() {
        let sig = num_sig("op", &TypeSymbol::LONG);
        let diags = check_signature(
            &sig,
            &args(&[TypeSymbol::LONG, TypeSymbol::STRING]),
            Span::default(),
            false,
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].code(),
            crate::diagnostics::codes::WRONG_ARGUMENT_TYPE
        );
    }

    #[test]
    fn test_named_args_rejected_for_builtins() {
        let sig = num_sig("op", &TypeSymbol::LONG);
        let mut a = args(&[TypeSymbol::LONG, TypeSymbol::LONG]);
        a[0].name = Some("left".into());
        let diags = check_signature(&sig, &a, Span::default(), false);
        assert!(diags
            .iter()
            .any(|d| d.code() == crate::diagnostics::codes::NAMED_ARGUMENTS_NOT_SUPPORTED));
    }

    #[test]
    fn test_literal_value_set() {
        let sig = Signature::new(
            "join",
            vec![Parameter::declared("kind", vec![TypeSymbol::STRING])
                .with_argument_kind(ArgumentKind::Literal)
                .with_values(vec!["inner".into(), "leftouter".into()], false)],
            ReturnKind::Declared(TypeSymbol::Void),
        );
        let mut arg = ArgumentInfo::of_type(TypeSymbol::STRING);
        arg.is_literal = true;
        arg.literal = Some(Literal::String("cross".into()));
        let diags = check_signature(&sig, &[arg], Span::default(), false);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), crate::diagnostics::codes::VALUE_NOT_ALLOWED);
    }
}
