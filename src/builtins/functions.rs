//! Built-in scalar functions and query plug-ins.

use std::sync::{Arc, LazyLock};

use smol_str::SmolStr;

use crate::symbols::{
    ArgumentKind, ColumnSymbol, CustomReturnContext, FunctionOrigin, FunctionSymbol, Parameter,
    ParameterTypeKind, ResultNameKind, ReturnKind, ScalarType, Signature, TableSymbol, TypeSymbol,
};

fn function(name: &str, signatures: Vec<Arc<Signature>>) -> Arc<FunctionSymbol> {
    Arc::new(FunctionSymbol {
        name: SmolStr::from(name),
        signatures,
        origin: FunctionOrigin::BuiltIn,
        is_aggregate: false,
        is_plugin: false,
        is_constant_foldable: true,
        result_name_kind: ResultNameKind::PrefixAndOnlyArgument,
        result_name_prefix: Some(SmolStr::from(name)),
    })
}

fn plugin(name: &str, signatures: Vec<Arc<Signature>>) -> Arc<FunctionSymbol> {
    Arc::new(FunctionSymbol {
        name: SmolStr::from(name),
        signatures,
        origin: FunctionOrigin::BuiltIn,
        is_aggregate: false,
        is_plugin: true,
        is_constant_foldable: false,
        result_name_kind: ResultNameKind::None,
        result_name_prefix: None,
    })
}

fn sig(name: &str, parameters: Vec<Parameter>, return_kind: ReturnKind) -> Arc<Signature> {
    Signature::new(name, parameters, return_kind)
}

fn scalar(name: &str) -> Parameter {
    Parameter::of_kind(name, ParameterTypeKind::Scalar)
}

fn decl(name: &str, types: &[TypeSymbol]) -> Parameter {
    Parameter::declared(name, types.to_vec())
}

fn string_param(name: &str) -> Parameter {
    Parameter::of_kind(name, ParameterTypeKind::StringOrDynamic)
}

fn number(name: &str) -> Parameter {
    Parameter::of_kind(name, ParameterTypeKind::Number)
}

fn summable(name: &str) -> Parameter {
    Parameter::of_kind(name, ParameterTypeKind::Summable)
}

fn conversion_fn(name: &str, result: TypeSymbol) -> Arc<FunctionSymbol> {
    function(
        name,
        vec![sig(name, vec![scalar("value")], ReturnKind::Declared(result))],
    )
}

/// `toscalar(T)` is the single column's type; `toscalar(x)` is `x`'s.
fn toscalar_return(ctx: &CustomReturnContext<'_>) -> TypeSymbol {
    match ctx.argument_types.first() {
        Some(TypeSymbol::Table(t)) => t
            .columns
            .first()
            .map(|c| c.column_type.clone())
            .unwrap_or(TypeSymbol::DYNAMIC),
        Some(other) => other.clone(),
        None => TypeSymbol::Error,
    }
}

pub static FUNCTIONS: LazyLock<Vec<Arc<FunctionSymbol>>> = LazyLock::new(|| {
    let mut fns = vec![
        // ------------------------------------------------------------------
        // Catalog accessors
        // ------------------------------------------------------------------
        function(
            "table",
            vec![sig(
                "table",
                vec![
                    decl("name", &[TypeSymbol::STRING])
                        .with_argument_kind(ArgumentKind::LiteralNotEmpty),
                ],
                ReturnKind::Parameter0Table,
            )],
        ),
        function(
            "database",
            vec![sig(
                "database",
                vec![
                    decl("name", &[TypeSymbol::STRING])
                        .with_argument_kind(ArgumentKind::Literal)
                        .optional(),
                ],
                ReturnKind::Parameter0Database,
            )],
        ),
        function(
            "cluster",
            vec![sig(
                "cluster",
                vec![
                    decl("name", &[TypeSymbol::STRING])
                        .with_argument_kind(ArgumentKind::LiteralNotEmpty),
                ],
                ReturnKind::Parameter0Cluster,
            )],
        ),
        function(
            "toscalar",
            vec![sig(
                "toscalar",
                vec![Parameter::of_kind("value", ParameterTypeKind::Tabular)],
                ReturnKind::Custom(Arc::new(toscalar_return)),
            )],
        ),
        // ------------------------------------------------------------------
        // Strings
        // ------------------------------------------------------------------
        function(
            "strcat",
            vec![sig(
                "strcat",
                vec![scalar("arg").repeatable()],
                ReturnKind::Declared(TypeSymbol::STRING),
            )],
        ),
        function(
            "strcat_delim",
            vec![sig(
                "strcat_delim",
                vec![scalar("delimiter"), scalar("arg").repeatable()],
                ReturnKind::Declared(TypeSymbol::STRING),
            )],
        ),
        function(
            "strlen",
            vec![sig(
                "strlen",
                vec![string_param("source")],
                ReturnKind::Declared(TypeSymbol::LONG),
            )],
        ),
        function(
            "substring",
            vec![sig(
                "substring",
                vec![
                    string_param("source"),
                    Parameter::of_kind("start", ParameterTypeKind::Integer),
                    Parameter::of_kind("length", ParameterTypeKind::Integer).optional(),
                ],
                ReturnKind::Declared(TypeSymbol::STRING),
            )],
        ),
        function(
            "tolower",
            vec![sig(
                "tolower",
                vec![string_param("source")],
                ReturnKind::Declared(TypeSymbol::STRING),
            )],
        ),
        function(
            "toupper",
            vec![sig(
                "toupper",
                vec![string_param("source")],
                ReturnKind::Declared(TypeSymbol::STRING),
            )],
        ),
        function(
            "extract",
            vec![
                sig(
                    "extract",
                    vec![
                        decl("regex", &[TypeSymbol::STRING]),
                        Parameter::of_kind("captureGroup", ParameterTypeKind::Integer),
                        string_param("source"),
                    ],
                    ReturnKind::Declared(TypeSymbol::STRING),
                ),
                sig(
                    "extract",
                    vec![
                        decl("regex", &[TypeSymbol::STRING]),
                        Parameter::of_kind("captureGroup", ParameterTypeKind::Integer),
                        string_param("source"),
                        decl("typeLiteral", &[TypeSymbol::TYPE])
                            .with_argument_kind(ArgumentKind::Literal),
                    ],
                    ReturnKind::ParameterNLiteral,
                ),
            ],
        ),
        function(
            "split",
            vec![sig(
                "split",
                vec![
                    string_param("source"),
                    decl("delimiter", &[TypeSymbol::STRING]),
                    Parameter::of_kind("requestedIndex", ParameterTypeKind::Integer).optional(),
                ],
                ReturnKind::Declared(TypeSymbol::DYNAMIC),
            )],
        ),
        // ------------------------------------------------------------------
        // Nulls, conditionals
        // ------------------------------------------------------------------
        function(
            "isempty",
            vec![sig(
                "isempty",
                vec![scalar("value")],
                ReturnKind::Declared(TypeSymbol::BOOL),
            )],
        ),
        function(
            "isnull",
            vec![sig(
                "isnull",
                vec![scalar("value")],
                ReturnKind::Declared(TypeSymbol::BOOL),
            )],
        ),
        function(
            "iff",
            vec![sig(
                "iff",
                vec![
                    decl("predicate", &[TypeSymbol::BOOL]),
                    Parameter::of_kind("ifTrue", ParameterTypeKind::CommonScalarOrDynamic),
                    Parameter::of_kind("ifFalse", ParameterTypeKind::CommonScalarOrDynamic),
                ],
                ReturnKind::Common,
            )],
        ),
        function(
            "iif",
            vec![sig(
                "iif",
                vec![
                    decl("predicate", &[TypeSymbol::BOOL]),
                    Parameter::of_kind("ifTrue", ParameterTypeKind::CommonScalarOrDynamic),
                    Parameter::of_kind("ifFalse", ParameterTypeKind::CommonScalarOrDynamic),
                ],
                ReturnKind::Common,
            )],
        ),
        function(
            "coalesce",
            vec![sig(
                "coalesce",
                vec![Parameter::of_kind("arg", ParameterTypeKind::CommonScalarOrDynamic)
                    .repeatable()],
                ReturnKind::Common,
            )],
        ),
        function(
            "case",
            vec![sig(
                "case",
                vec![
                    decl("predicate", &[TypeSymbol::BOOL]),
                    Parameter::of_kind("then", ParameterTypeKind::CommonScalarOrDynamic)
                        .repeatable(),
                ],
                ReturnKind::Common,
            )],
        ),
        function(
            "max_of",
            vec![sig(
                "max_of",
                vec![Parameter::of_kind("arg", ParameterTypeKind::CommonScalarOrDynamic)
                    .repeatable()],
                ReturnKind::Common,
            )],
        ),
        function(
            "min_of",
            vec![sig(
                "min_of",
                vec![Parameter::of_kind("arg", ParameterTypeKind::CommonScalarOrDynamic)
                    .repeatable()],
                ReturnKind::Common,
            )],
        ),
        // ------------------------------------------------------------------
        // Temporal
        // ------------------------------------------------------------------
        function(
            "ago",
            vec![sig(
                "ago",
                vec![decl("interval", &[TypeSymbol::TIMESPAN])],
                ReturnKind::Declared(TypeSymbol::DATETIME),
            )],
        ),
        function(
            "now",
            vec![sig(
                "now",
                vec![decl("offset", &[TypeSymbol::TIMESPAN]).optional()],
                ReturnKind::Declared(TypeSymbol::DATETIME),
            )],
        ),
        function(
            "datetime_add",
            vec![sig(
                "datetime_add",
                vec![
                    decl("part", &[TypeSymbol::STRING]).with_argument_kind(ArgumentKind::Literal),
                    Parameter::of_kind("amount", ParameterTypeKind::Integer),
                    decl("datetime", &[TypeSymbol::DATETIME]),
                ],
                ReturnKind::Declared(TypeSymbol::DATETIME),
            )],
        ),
        // ------------------------------------------------------------------
        // Math
        // ------------------------------------------------------------------
        function(
            "abs",
            vec![sig("abs", vec![number("value")], ReturnKind::Parameter0)],
        ),
        function(
            "sqrt",
            vec![sig(
                "sqrt",
                vec![number("value")],
                ReturnKind::Declared(TypeSymbol::REAL),
            )],
        ),
        function(
            "log",
            vec![sig(
                "log",
                vec![number("value")],
                ReturnKind::Declared(TypeSymbol::REAL),
            )],
        ),
        function(
            "exp",
            vec![sig(
                "exp",
                vec![number("value")],
                ReturnKind::Declared(TypeSymbol::REAL),
            )],
        ),
        function(
            "pow",
            vec![sig(
                "pow",
                vec![number("base"), number("exponent")],
                ReturnKind::Declared(TypeSymbol::REAL),
            )],
        ),
        function(
            "round",
            vec![sig(
                "round",
                vec![
                    number("value"),
                    Parameter::of_kind("precision", ParameterTypeKind::Integer).optional(),
                ],
                ReturnKind::Parameter0,
            )],
        ),
        function(
            "bin",
            vec![sig(
                "bin",
                vec![summable("value"), summable("roundTo")],
                ReturnKind::Parameter0,
            )],
        ),
        function(
            "floor",
            vec![sig(
                "floor",
                vec![summable("value"), summable("roundTo")],
                ReturnKind::Parameter0,
            )],
        ),
        function(
            "range",
            vec![sig(
                "range",
                vec![summable("start"), summable("stop"), summable("step").optional()],
                ReturnKind::Declared(TypeSymbol::DYNAMIC),
            )],
        ),
        function(
            "row_number",
            vec![sig(
                "row_number",
                vec![
                    Parameter::of_kind("startingIndex", ParameterTypeKind::Integer).optional(),
                    decl("restart", &[TypeSymbol::BOOL]).optional(),
                ],
                ReturnKind::Declared(TypeSymbol::LONG),
            )],
        ),
        // ------------------------------------------------------------------
        // Dynamics
        // ------------------------------------------------------------------
        function(
            "pack",
            vec![sig(
                "pack",
                vec![scalar("keyValuePair").repeatable()],
                ReturnKind::Declared(TypeSymbol::DYNAMIC),
            )],
        ),
        function(
            "bag_pack",
            vec![sig(
                "bag_pack",
                vec![scalar("keyValuePair").repeatable()],
                ReturnKind::Declared(TypeSymbol::DYNAMIC),
            )],
        ),
        function(
            "pack_array",
            vec![sig(
                "pack_array",
                vec![scalar("value").repeatable()],
                ReturnKind::Declared(TypeSymbol::DYNAMIC),
            )],
        ),
        function(
            "array_length",
            vec![sig(
                "array_length",
                vec![decl("array", &[TypeSymbol::DYNAMIC])],
                ReturnKind::Declared(TypeSymbol::LONG),
            )],
        ),
        function(
            "parse_json",
            vec![sig(
                "parse_json",
                vec![string_param("source")],
                ReturnKind::Declared(TypeSymbol::DYNAMIC),
            )],
        ),
        function(
            "todynamic",
            vec![sig(
                "todynamic",
                vec![string_param("source")],
                ReturnKind::Declared(TypeSymbol::DYNAMIC),
            )],
        ),
        // ------------------------------------------------------------------
        // Size estimation
        // ------------------------------------------------------------------
        function(
            "estimate_data_size",
            vec![
                sig(
                    "estimate_data_size",
                    vec![scalar("column")
                        .with_argument_kind(ArgumentKind::Star)],
                    ReturnKind::Declared(TypeSymbol::LONG),
                ),
                sig(
                    "estimate_data_size",
                    vec![scalar("column").repeatable()],
                    ReturnKind::Declared(TypeSymbol::LONG),
                ),
            ],
        ),
    ];

    // Conversions
    fns.push(conversion_fn("toint", TypeSymbol::INT));
    fns.push(conversion_fn("tolong", TypeSymbol::LONG));
    fns.push(conversion_fn("todouble", TypeSymbol::REAL));
    fns.push(conversion_fn("toreal", TypeSymbol::REAL));
    fns.push(conversion_fn("todecimal", TypeSymbol::DECIMAL));
    fns.push(conversion_fn("tostring", TypeSymbol::STRING));
    fns.push(conversion_fn("tobool", TypeSymbol::BOOL));
    fns.push(conversion_fn("todatetime", TypeSymbol::DATETIME));
    fns.push(conversion_fn("totimespan", TypeSymbol::TIMESPAN));
    fns.push(conversion_fn("toguid", TypeSymbol::GUID));

    fns
});

// ============================================================================
// PLUG-INS (evaluate operator)
// ============================================================================

/// `bag_unpack(col)`: the input schema minus the bag column, opened so
/// the unpacked properties bind as inferred columns.
fn bag_unpack_return(ctx: &CustomReturnContext<'_>) -> TypeSymbol {
    let Some(row) = ctx.row_scope else {
        return TypeSymbol::Error;
    };
    TypeSymbol::Table(TableSymbol::open("", row.columns.clone()))
}

/// `pivot(col, agg)`: statically unknowable value columns → open table
/// over the remaining input columns.
fn pivot_return(ctx: &CustomReturnContext<'_>) -> TypeSymbol {
    let Some(row) = ctx.row_scope else {
        return TypeSymbol::Error;
    };
    TypeSymbol::Table(TableSymbol::open("", row.columns.clone()))
}

fn narrow_return(_ctx: &CustomReturnContext<'_>) -> TypeSymbol {
    TypeSymbol::Table(TableSymbol::schema(vec![
        ColumnSymbol::scalar("Row", ScalarType::Long),
        ColumnSymbol::scalar("Column", ScalarType::String),
        ColumnSymbol::scalar("Value", ScalarType::String),
    ]))
}

/// `dcount_intersect(h0, h1, …)`: one `s<i>: long` per argument.
fn dcount_intersect_return(ctx: &CustomReturnContext<'_>) -> TypeSymbol {
    let columns = (0..ctx.argument_types.len())
        .map(|i| ColumnSymbol::scalar(format!("s{i}"), ScalarType::Long))
        .collect();
    TypeSymbol::Table(TableSymbol::schema(columns))
}

pub static PLUGINS: LazyLock<Vec<Arc<FunctionSymbol>>> = LazyLock::new(|| {
    vec![
        plugin(
            "bag_unpack",
            vec![sig(
                "bag_unpack",
                vec![
                    decl("column", &[TypeSymbol::DYNAMIC]).with_argument_kind(ArgumentKind::Column),
                    decl("prefix", &[TypeSymbol::STRING])
                        .with_argument_kind(ArgumentKind::Literal)
                        .optional(),
                ],
                ReturnKind::Custom(Arc::new(bag_unpack_return)),
            )],
        ),
        plugin(
            "pivot",
            vec![sig(
                "pivot",
                vec![
                    scalar("pivotColumn").with_argument_kind(ArgumentKind::Column),
                    scalar("aggregate").optional().repeatable(),
                ],
                ReturnKind::Custom(Arc::new(pivot_return)),
            )],
        ),
        plugin(
            "narrow",
            vec![sig(
                "narrow",
                vec![],
                ReturnKind::Custom(Arc::new(narrow_return)),
            )],
        ),
        plugin(
            "dcount_intersect",
            vec![sig(
                "dcount_intersect",
                vec![decl("hll", &[TypeSymbol::DYNAMIC])
                    .with_argument_kind(ArgumentKind::Column)
                    .repeatable()],
                ReturnKind::Custom(Arc::new(dcount_intersect_return)),
            )],
        ),
    ]
});
