//! Stored-function expansion: caching policy, body facts, cycle safety,
//! pattern invocation, and the computed-return-type entry point.

mod common;

use std::sync::Arc;

use common::{assert_clean, assert_has_code, bind_with, result_columns};
use tabula::binder::Binder;
use tabula::diagnostics::codes;
use tabula::symbols::{
    Catalog, ClusterSymbol, ColumnSymbol, DatabaseSymbol, FunctionBody, FunctionOrigin,
    FunctionSymbol, Parameter, ReturnKind, ScalarType, Signature, TableSymbol, TypeSymbol,
};
use tabula::syntax::{
    Literal, PatternDeclaration, PatternSpec, QueryOp, Statement, SyntaxTree, TreeBuilder,
    TypeExpr,
};

/// A catalog whose database carries stored functions with pre-parsed
/// bodies.
fn stored_function_catalog() -> (Catalog, Arc<Signature>, Arc<Signature>) {
    let t = TableSymbol::new(
        "Events",
        vec![
            ColumnSymbol::scalar("id", ScalarType::Long),
            ColumnSymbol::scalar("kind", ScalarType::String),
        ],
    );

    // body of `tail(n)`: Events | take n
    let mut body = TreeBuilder::new();
    let events = body.name("Events");
    let n = body.name("n");
    let take = body.pipe_op(events, QueryOp::Take { count: n });
    body.expr_statement(take);
    let tail_sig = Signature::with_named_arguments(
        "tail",
        vec![Parameter::declared("n", vec![TypeSymbol::LONG])],
        ReturnKind::Computed(FunctionBody::Parsed(Arc::new(body.finish()))),
    );
    let tail = Arc::new(FunctionSymbol {
        name: "tail".into(),
        signatures: vec![tail_sig.clone()],
        origin: FunctionOrigin::Database,
        is_aggregate: false,
        is_plugin: false,
        is_constant_foldable: false,
        result_name_kind: Default::default(),
        result_name_prefix: None,
    });

    // body of `selfref()`: selfref()
    let mut body = TreeBuilder::new();
    let inner = body.call_named("selfref", vec![]);
    body.expr_statement(inner);
    let selfref_sig = Signature::with_named_arguments(
        "selfref",
        vec![],
        ReturnKind::Computed(FunctionBody::Parsed(Arc::new(body.finish()))),
    );
    let selfref = Arc::new(FunctionSymbol {
        name: "selfref".into(),
        signatures: vec![selfref_sig.clone()],
        origin: FunctionOrigin::Database,
        is_aggregate: false,
        is_plugin: false,
        is_constant_foldable: false,
        result_name_kind: Default::default(),
        result_name_prefix: None,
    });

    let db = DatabaseSymbol::new("db", vec![t], vec![tail, selfref]);
    let cluster = ClusterSymbol::new("c1", vec![db]);
    let catalog = Catalog::builder()
        .add_cluster(cluster)
        .current("c1", "db")
        .build()
        .expect("valid catalog");
    (catalog, tail_sig, selfref_sig)
}

#[test]
fn test_stored_function_expands_in_owning_database() {
    let (catalog, _, _) = stored_function_catalog();
    let mut b = TreeBuilder::new();
    let ten = b.lit_long(10);
    let call = b.call_named("tail", vec![ten]);
    b.expr_statement(call);
    let tree = b.finish();

    let result = bind_with(&tree, &catalog);
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![
            ("id".to_string(), "long".to_string()),
            ("kind".to_string(), "string".to_string()),
        ]
    );
}

#[test]
fn test_self_referential_expansion_terminates() {
    let (catalog, _, _) = stored_function_catalog();
    let mut b = TreeBuilder::new();
    let call = b.call_named("selfref", vec![]);
    b.expr_statement(call);
    let tree = b.finish();

    // termination is the property; the inner call gets no expansion
    let result = bind_with(&tree, &catalog);
    let info = result.semantics.get(call).expect("bound");
    assert!(info.result_type.is_error() || info.expansion.is_some());
}

#[test]
fn test_computed_return_type_entry_point() {
    let (catalog, tail_sig, _) = stored_function_catalog();
    let ty = Binder::computed_return_type(&tail_sig, &catalog);
    let table = ty.as_table().expect("tail() returns a table");
    assert_eq!(table.columns.len(), 2);
}

#[test]
fn test_body_facts_recorded_after_expansion() {
    let (catalog, tail_sig, _) = stored_function_catalog();
    assert!(tail_sig.body_facts().is_none(), "no facts before expansion");

    let mut b = TreeBuilder::new();
    let ten = b.lit_long(10);
    let call = b.call_named("tail", vec![ten]);
    b.expr_statement(call);
    let tree = b.finish();
    let result = bind_with(&tree, &catalog);
    assert_clean(&result);

    let facts = tail_sig.body_facts().expect("facts cached on signature");
    assert!(facts.has(tabula::symbols::FunctionBodyFacts::VARIABLE_RETURN));
}

/// A body calling unqualified `table(...)` must not be cached: its
/// meaning depends on the caller's database.
#[test]
fn test_unqualified_table_body_not_globally_cached() {
    let t = TableSymbol::new("Data", vec![ColumnSymbol::scalar("v", ScalarType::Long)]);

    let mut body = TreeBuilder::new();
    let name = body.lit_string("Data");
    let call = body.call_named("table", vec![name]);
    body.expr_statement(call);
    let sig = Signature::with_named_arguments(
        "data_of",
        vec![],
        ReturnKind::Computed(FunctionBody::Parsed(Arc::new(body.finish()))),
    );
    let function = Arc::new(FunctionSymbol {
        name: "data_of".into(),
        signatures: vec![sig.clone()],
        origin: FunctionOrigin::Database,
        is_aggregate: false,
        is_plugin: false,
        is_constant_foldable: false,
        result_name_kind: Default::default(),
        result_name_prefix: None,
    });

    let db = DatabaseSymbol::new("db", vec![t], vec![function]);
    let catalog = Catalog::builder()
        .add_cluster(ClusterSymbol::new("c1", vec![db]))
        .current("c1", "db")
        .build()
        .unwrap();

    let mut b = TreeBuilder::new();
    let call = b.call_named("data_of", vec![]);
    b.expr_statement(call);
    let tree = b.finish();
    let result = bind_with(&tree, &catalog);
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![("v".to_string(), "long".to_string())]
    );

    let facts = sig.body_facts().expect("facts cached");
    assert!(facts.has(tabula::symbols::FunctionBodyFacts::UNQUALIFIED_TABLE));
    // nothing went into the per-catalog expansion cache
    assert!(catalog.cache().lock().expansions.is_empty());
}

#[test]
fn test_scalar_stored_function_without_parameters_is_fixed() {
    let mut body = TreeBuilder::new();
    let one = body.lit_long(1);
    let two = body.lit_long(2);
    let sum = body.binary(tabula::syntax::OperatorKind::Add, one, two);
    body.expr_statement(sum);
    let sig = Signature::with_named_arguments(
        "three",
        vec![],
        ReturnKind::Computed(FunctionBody::Parsed(Arc::new(body.finish()))),
    );
    let function = Arc::new(FunctionSymbol {
        name: "three".into(),
        signatures: vec![sig.clone()],
        origin: FunctionOrigin::Database,
        is_aggregate: false,
        is_plugin: false,
        is_constant_foldable: false,
        result_name_kind: Default::default(),
        result_name_prefix: None,
    });
    let db = DatabaseSymbol::new("db", vec![], vec![function]);
    let catalog = Catalog::builder()
        .add_cluster(ClusterSymbol::new("c1", vec![db]))
        .current("c1", "db")
        .build()
        .unwrap();

    let mut b = TreeBuilder::new();
    let call = b.call_named("three", vec![]);
    b.expr_statement(call);
    let tree = b.finish();
    let result = bind_with(&tree, &catalog);
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(call), TypeSymbol::LONG);
    // a parameterless body has a non-variable return, cached on the
    // signature
    assert_eq!(sig.non_variable_return(), Some(&TypeSymbol::LONG));
}

#[test]
fn test_pattern_invocation_matches_literals() {
    let mut b = TreeBuilder::new();

    // declare pattern app = (name:string) { "web" -> U | project a }
    let u = b.name("U");
    let a = b.name("a");
    let body_expr = b.pipe_op(
        u,
        QueryOp::Project {
            items: vec![b.item(a)],
        },
    );
    let spec = PatternSpec {
        parameters: vec![tabula::syntax::DeclaredParam {
            name: "name".into(),
            type_expr: TypeExpr::Scalar("string".into()),
        }],
        path_parameter: None,
        declarations: vec![PatternDeclaration {
            values: vec![Literal::String("web".into())],
            path_value: None,
            body: b.block(vec![Statement::Expr(body_expr)]),
        }],
    };
    b.pattern("app", spec);

    let arg = b.lit_string("web");
    let callee = b.name("app");
    let call = b.call(callee, vec![arg]);
    b.expr_statement(call);
    let tree = b.finish();

    let result = bind_with(&tree, &common::catalog());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![("a".to_string(), "long".to_string())]
    );
}

#[test]
fn test_pattern_invocation_without_match_diagnosed() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let body_expr = b.pipe_op(u, QueryOp::Count { as_name: None });
    let spec = PatternSpec {
        parameters: vec![tabula::syntax::DeclaredParam {
            name: "name".into(),
            type_expr: TypeExpr::Scalar("string".into()),
        }],
        path_parameter: None,
        declarations: vec![PatternDeclaration {
            values: vec![Literal::String("web".into())],
            path_value: None,
            body: b.block(vec![Statement::Expr(body_expr)]),
        }],
    };
    b.pattern("app", spec);

    let arg = b.lit_string("mobile");
    let callee = b.name("app");
    let call = b.call(callee, vec![arg]);
    b.expr_statement(call);
    let tree = b.finish();

    let result = bind_with(&tree, &common::catalog());
    assert_has_code(&result, codes::NO_PATTERN_MATCH);
}

/// The spec'd parser hook: text bodies parse through the catalog's
/// function-body parser; without one the expansion is unavailable.
#[test]
fn test_text_body_requires_parser() {
    struct CannedParser(SyntaxTree);
    impl tabula::symbols::FunctionBodyParser for CannedParser {
        fn parse(&self, _body: &str) -> Option<SyntaxTree> {
            Some(self.0.clone())
        }
    }

    let mut body = TreeBuilder::new();
    let lit = body.lit_long(42);
    body.expr_statement(lit);
    let canned = body.finish();

    let make_sig = || {
        Signature::with_named_arguments(
            "f",
            vec![],
            ReturnKind::Computed(FunctionBody::Text("42".into())),
        )
    };
    let make_catalog = |sig: &Arc<Signature>, parser: bool| {
        let function = Arc::new(FunctionSymbol {
            name: "f".into(),
            signatures: vec![sig.clone()],
            origin: FunctionOrigin::Database,
            is_aggregate: false,
            is_plugin: false,
            is_constant_foldable: false,
            result_name_kind: Default::default(),
            result_name_prefix: None,
        });
        let db = DatabaseSymbol::new("db", vec![], vec![function]);
        let mut builder = Catalog::builder()
            .add_cluster(ClusterSymbol::new("c1", vec![db]))
            .current("c1", "db");
        if parser {
            builder = builder.body_parser(Arc::new(CannedParser(canned.clone())));
        }
        builder.build().unwrap()
    };

    // with a parser the computed type comes from the body
    let sig = make_sig();
    let catalog = make_catalog(&sig, true);
    let mut b = TreeBuilder::new();
    let call = b.call_named("f", vec![]);
    b.expr_statement(call);
    let tree = b.finish();
    let result = bind_with(&tree, &catalog);
    assert_eq!(result.semantics.result_type(call), TypeSymbol::LONG);

    // without one, the expansion is recorded absent and the type is
    // the error sentinel
    let sig = make_sig();
    let catalog = make_catalog(&sig, false);
    let mut b = TreeBuilder::new();
    let call = b.call_named("f", vec![]);
    b.expr_statement(call);
    let tree = b.finish();
    let result = bind_with(&tree, &catalog);
    assert!(result.semantics.result_type(call).is_error());
}
