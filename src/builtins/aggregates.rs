//! Built-in aggregate functions (visible in summarize and friends).

use std::sync::{Arc, LazyLock};

use smol_str::SmolStr;

use crate::symbols::{
    ArgumentKind, FunctionOrigin, FunctionSymbol, Parameter, ParameterTypeKind, ResultNameKind,
    ReturnKind, Signature, TypeSymbol,
};

fn aggregate(
    name: &str,
    signatures: Vec<Arc<Signature>>,
    result_name_kind: ResultNameKind,
) -> Arc<FunctionSymbol> {
    Arc::new(FunctionSymbol {
        name: SmolStr::from(name),
        signatures,
        origin: FunctionOrigin::BuiltIn,
        is_aggregate: true,
        is_plugin: false,
        is_constant_foldable: false,
        result_name_kind,
        result_name_prefix: Some(SmolStr::from(name)),
    })
}

fn sig(name: &str, parameters: Vec<Parameter>, return_kind: ReturnKind) -> Arc<Signature> {
    Signature::new(name, parameters, return_kind)
}

fn prefixed(name: &str, parameters: Vec<Parameter>, return_kind: ReturnKind) -> Arc<FunctionSymbol> {
    let s = sig(name, parameters, return_kind);
    aggregate(name, vec![s], ResultNameKind::PrefixAndOnlyArgument)
}

pub static AGGREGATES: LazyLock<Vec<Arc<FunctionSymbol>>> = LazyLock::new(|| {
    vec![
        aggregate(
            "count",
            vec![sig("count", vec![], ReturnKind::Declared(TypeSymbol::LONG))],
            ResultNameKind::PrefixOnly,
        ),
        prefixed(
            "countif",
            vec![Parameter::declared("predicate", vec![TypeSymbol::BOOL])],
            ReturnKind::Declared(TypeSymbol::LONG),
        ),
        prefixed(
            "dcount",
            vec![
                Parameter::of_kind("value", ParameterTypeKind::Scalar),
                Parameter::of_kind("accuracy", ParameterTypeKind::Integer).optional(),
            ],
            ReturnKind::Declared(TypeSymbol::LONG),
        ),
        // sum(int) widens to long through the promotion lattice
        prefixed(
            "sum",
            vec![Parameter::of_kind("value", ParameterTypeKind::Summable)],
            ReturnKind::Parameter0Promoted,
        ),
        prefixed(
            "sumif",
            vec![
                Parameter::of_kind("value", ParameterTypeKind::Summable),
                Parameter::declared("predicate", vec![TypeSymbol::BOOL]),
            ],
            ReturnKind::Parameter0Promoted,
        ),
        prefixed(
            "avg",
            vec![Parameter::of_kind("value", ParameterTypeKind::Summable)],
            ReturnKind::Declared(TypeSymbol::REAL),
        ),
        prefixed(
            "avgif",
            vec![
                Parameter::of_kind("value", ParameterTypeKind::Summable),
                Parameter::declared("predicate", vec![TypeSymbol::BOOL]),
            ],
            ReturnKind::Declared(TypeSymbol::REAL),
        ),
        prefixed(
            "min",
            vec![Parameter::of_kind("value", ParameterTypeKind::CommonSummable)],
            ReturnKind::Parameter0,
        ),
        prefixed(
            "max",
            vec![Parameter::of_kind("value", ParameterTypeKind::CommonSummable)],
            ReturnKind::Parameter0,
        ),
        prefixed(
            "minif",
            vec![
                Parameter::of_kind("value", ParameterTypeKind::CommonSummable),
                Parameter::declared("predicate", vec![TypeSymbol::BOOL]),
            ],
            ReturnKind::Parameter0,
        ),
        prefixed(
            "maxif",
            vec![
                Parameter::of_kind("value", ParameterTypeKind::CommonSummable),
                Parameter::declared("predicate", vec![TypeSymbol::BOOL]),
            ],
            ReturnKind::Parameter0,
        ),
        aggregate(
            "any",
            vec![sig(
                "any",
                vec![Parameter::of_kind("value", ParameterTypeKind::Scalar)],
                ReturnKind::Parameter0,
            )],
            ResultNameKind::OnlyArgument,
        ),
        aggregate(
            "take_any",
            vec![sig(
                "take_any",
                vec![Parameter::of_kind("value", ParameterTypeKind::Scalar)],
                ReturnKind::Parameter0,
            )],
            ResultNameKind::OnlyArgument,
        ),
        aggregate(
            "arg_min",
            vec![sig(
                "arg_min",
                vec![
                    Parameter::of_kind("minimized", ParameterTypeKind::CommonSummable),
                    Parameter::of_kind("returned", ParameterTypeKind::Scalar)
                        .with_argument_kind(ArgumentKind::Column)
                        .optional()
                        .repeatable(),
                ],
                ReturnKind::Parameter0,
            )],
            ResultNameKind::FirstArgumentValueIfColumn,
        ),
        aggregate(
            "arg_max",
            vec![sig(
                "arg_max",
                vec![
                    Parameter::of_kind("maximized", ParameterTypeKind::CommonSummable),
                    Parameter::of_kind("returned", ParameterTypeKind::Scalar)
                        .with_argument_kind(ArgumentKind::Column)
                        .optional()
                        .repeatable(),
                ],
                ReturnKind::Parameter0,
            )],
            ResultNameKind::FirstArgumentValueIfColumn,
        ),
        prefixed(
            "percentile",
            vec![
                Parameter::of_kind("value", ParameterTypeKind::Number),
                Parameter::of_kind("percentile", ParameterTypeKind::Number)
                    .with_argument_kind(ArgumentKind::Constant),
            ],
            ReturnKind::Parameter0,
        ),
        prefixed(
            "stdev",
            vec![Parameter::of_kind("value", ParameterTypeKind::Number)],
            ReturnKind::Declared(TypeSymbol::REAL),
        ),
        prefixed(
            "variance",
            vec![Parameter::of_kind("value", ParameterTypeKind::Number)],
            ReturnKind::Declared(TypeSymbol::REAL),
        ),
        prefixed(
            "make_list",
            vec![
                Parameter::of_kind("value", ParameterTypeKind::Scalar),
                Parameter::of_kind("maxSize", ParameterTypeKind::Integer).optional(),
            ],
            ReturnKind::Declared(TypeSymbol::DYNAMIC),
        ),
        prefixed(
            "make_set",
            vec![
                Parameter::of_kind("value", ParameterTypeKind::Scalar),
                Parameter::of_kind("maxSize", ParameterTypeKind::Integer).optional(),
            ],
            ReturnKind::Declared(TypeSymbol::DYNAMIC),
        ),
        prefixed(
            "make_bag",
            vec![
                Parameter::declared("value", vec![TypeSymbol::DYNAMIC]),
                Parameter::of_kind("maxSize", ParameterTypeKind::Integer).optional(),
            ],
            ReturnKind::Declared(TypeSymbol::DYNAMIC),
        ),
        prefixed(
            "hll",
            vec![
                Parameter::of_kind("value", ParameterTypeKind::Scalar),
                Parameter::of_kind("accuracy", ParameterTypeKind::Integer).optional(),
            ],
            ReturnKind::Declared(TypeSymbol::DYNAMIC),
        ),
        prefixed(
            "tdigest",
            vec![Parameter::of_kind("value", ParameterTypeKind::Number)],
            ReturnKind::Declared(TypeSymbol::DYNAMIC),
        ),
    ]
});
