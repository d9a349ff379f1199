//! Row-scope rules of the query operators.

mod common;

use common::{assert_clean, assert_has_code, bind, result_columns};
use tabula::diagnostics::codes;
use tabula::symbols::TypeSymbol;
use tabula::syntax::{
    ColumnDecl, ForkBranch, JoinCondition, MvExpandItem, NamedParameter, OperatorKind, Ordering,
    ParsePatternPart, QueryOp, TreeBuilder, TypeExpr,
};

fn named_param(b: &mut TreeBuilder, name: &str, value: &str) -> NamedParameter {
    let v = b.name(value);
    NamedParameter {
        name: name.into(),
        value: v,
    }
}

#[test]
fn test_project_star_reemits_all_columns() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let star = b.star();
    let a = b.name("a");
    let one = b.lit_long(1);
    let sum = b.binary(OperatorKind::Add, a, one);
    let piped = b.pipe_op(
        u,
        QueryOp::Project {
            items: vec![b.item(star), b.named_item("d", sum)],
        },
    );
    b.expr_statement(piped);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![
            ("a".to_string(), "long".to_string()),
            ("c".to_string(), "string".to_string()),
            ("d".to_string(), "long".to_string()),
        ]
    );
}

#[test]
fn test_project_bare_expression_gets_positional_name() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let a = b.name("a");
    let one = b.lit_long(1);
    let sum = b.binary(OperatorKind::Add, a, one);
    let piped = b.pipe_op(
        u,
        QueryOp::Project {
            items: vec![b.item(sum)],
        },
    );
    b.expr_statement(piped);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![("Column1".to_string(), "long".to_string())]
    );
}

#[test]
fn test_project_duplicate_declaration_diagnosed() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let a1 = b.name("a");
    let a2 = b.name("a");
    let piped = b.pipe_op(
        u,
        QueryOp::Project {
            items: vec![b.named_item("x", a1), b.named_item("x", a2)],
        },
    );
    b.expr_statement(piped);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::DUPLICATE_COLUMN);
}

#[test]
fn test_extend_replaces_existing_column() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let lit = b.lit_real(1.5);
    let piped = b.pipe_op(
        u,
        QueryOp::Extend {
            items: vec![b.named_item("c", lit)],
        },
    );
    b.expr_statement(piped);
    let result = bind(&b.finish());
    assert_clean(&result);
    // position kept, type replaced
    assert_eq!(
        result_columns(&result),
        vec![
            ("a".to_string(), "long".to_string()),
            ("c".to_string(), "real".to_string()),
        ]
    );
}

#[test]
fn test_project_away_and_keep_and_rename_and_reorder() {
    let mut b = TreeBuilder::new();
    let logs = b.name("Logs");
    let level = b.name("Level");
    let away = b.pipe_op(logs, QueryOp::ProjectAway { columns: vec![level] });
    b.expr_statement(away);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![
            ("Timestamp".to_string(), "datetime".to_string()),
            ("Message".to_string(), "string".to_string()),
        ]
    );

    let mut b = TreeBuilder::new();
    let logs = b.name("Logs");
    let msg = b.name("Message");
    let ts = b.name("Timestamp");
    let keep = b.pipe_op(
        logs,
        QueryOp::ProjectKeep {
            columns: vec![msg, ts],
        },
    );
    b.expr_statement(keep);
    let result = bind(&b.finish());
    assert_clean(&result);
    // keep preserves row-scope order, not argument order
    assert_eq!(
        result_columns(&result),
        vec![
            ("Timestamp".to_string(), "datetime".to_string()),
            ("Message".to_string(), "string".to_string()),
        ]
    );

    let mut b = TreeBuilder::new();
    let logs = b.name("Logs");
    let old = b.name("Message");
    let renamed = b.pipe_op(
        logs,
        QueryOp::ProjectRename {
            items: vec![b.named_item("Text", old)],
        },
    );
    b.expr_statement(renamed);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result)[2],
        ("Text".to_string(), "string".to_string())
    );

    let mut b = TreeBuilder::new();
    let logs = b.name("Logs");
    let msg = b.name("Message");
    let reordered = b.pipe_op(
        logs,
        QueryOp::ProjectReorder {
            orderings: vec![Ordering {
                expr: msg,
                ascending: None,
            }],
        },
    );
    b.expr_statement(reordered);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result)
            .iter()
            .map(|(n, _)| n.as_str())
            .collect::<Vec<_>>(),
        vec!["Message", "Timestamp", "Level"]
    );
}

#[test]
fn test_rename_missing_source_diagnosed() {
    let mut b = TreeBuilder::new();
    let logs = b.name("Logs");
    let old = b.name("Nope");
    let renamed = b.pipe_op(
        logs,
        QueryOp::ProjectRename {
            items: vec![b.named_item("Text", old)],
        },
    );
    b.expr_statement(renamed);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::RENAME_SOURCE_NOT_FOUND);
}

#[test]
fn test_summarize_by_and_derived_aggregate_names() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let c = b.name("c");
    let a = b.name("a");
    let sum = b.call_named("sum", vec![a]);
    let count = b.call_named("count", vec![]);
    let piped = b.pipe_op(
        u,
        QueryOp::Summarize {
            aggregates: vec![b.item(sum), b.item(count)],
            by: vec![b.item(c)],
        },
    );
    b.expr_statement(piped);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![
            ("c".to_string(), "string".to_string()),
            ("sum_a".to_string(), "long".to_string()),
            ("count_".to_string(), "long".to_string()),
        ]
    );
}

#[test]
fn test_aggregate_outside_summarize_diagnosed() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let a = b.name("a");
    let sum = b.call_named("sum", vec![a]);
    let piped = b.pipe_op(
        u,
        QueryOp::Extend {
            items: vec![b.named_item("s", sum)],
        },
    );
    b.expr_statement(piped);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::AGGREGATE_NOT_ALLOWED);
}

#[test]
fn test_count_and_getschema_and_reduce_schemas() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let counted = b.pipe_op(u, QueryOp::Count { as_name: None });
    b.expr_statement(counted);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![("Count".to_string(), "long".to_string())]
    );

    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let schema = b.pipe_op(u, QueryOp::GetSchema);
    b.expr_statement(schema);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result_columns(&result).len(), 4);

    let mut b = TreeBuilder::new();
    let logs = b.name("Logs");
    let msg = b.name("Message");
    let reduced = b.pipe_op(
        logs,
        QueryOp::Reduce {
            by: msg,
            characters: None,
        },
    );
    b.expr_statement(reduced);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result)
            .iter()
            .map(|(n, _)| n.as_str())
            .collect::<Vec<_>>(),
        vec!["Pattern", "Count", "Representative"]
    );
}

#[test]
fn test_join_merges_and_uniquifies_columns() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let u2 = b.name("U2");
    let kind = named_param(&mut b, "kind", "inner");
    let joined = b.pipe_op(
        u,
        QueryOp::Join {
            parameters: vec![kind],
            right: u2,
            on: vec![JoinCondition::Column("a".into())],
        },
    );
    b.expr_statement(joined);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![
            ("a".to_string(), "long".to_string()),
            ("c".to_string(), "string".to_string()),
            ("a_1".to_string(), "long".to_string()),
            ("d".to_string(), "real".to_string()),
        ]
    );
}

#[test]
fn test_join_kind_validated_and_semi_keeps_left() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let u2 = b.name("U2");
    let kind = named_param(&mut b, "kind", "sideways");
    let joined = b.pipe_op(
        u,
        QueryOp::Join {
            parameters: vec![kind],
            right: u2,
            on: vec![JoinCondition::Column("a".into())],
        },
    );
    b.expr_statement(joined);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::VALUE_NOT_ALLOWED);

    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let u2 = b.name("U2");
    let kind = named_param(&mut b, "kind", "leftsemi");
    let joined = b.pipe_op(
        u,
        QueryOp::Join {
            parameters: vec![kind],
            right: u2,
            on: vec![JoinCondition::Column("a".into())],
        },
    );
    b.expr_statement(joined);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![
            ("a".to_string(), "long".to_string()),
            ("c".to_string(), "string".to_string()),
        ]
    );
}

#[test]
fn test_join_on_expression_sees_left_and_right() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let u2 = b.name("U2");
    let left_row = b.name("$left");
    let left_a = b.path(left_row, "a");
    let right_row = b.name("$right");
    let right_a = b.path(right_row, "a");
    let eq = b.binary(OperatorKind::Equal, left_a, right_a);
    let kind = named_param(&mut b, "kind", "inner");
    let joined = b.pipe_op(
        u,
        QueryOp::Join {
            parameters: vec![kind],
            right: u2,
            on: vec![JoinCondition::Expr(eq)],
        },
    );
    b.expr_statement(joined);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(left_a), TypeSymbol::LONG);
    assert_eq!(result.semantics.result_type(right_a), TypeSymbol::LONG);
}

#[test]
fn test_lookup_requires_on_clause() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let u2 = b.name("U2");
    let looked = b.pipe_op(
        u,
        QueryOp::Lookup {
            parameters: vec![],
            right: u2,
            on: vec![],
        },
    );
    b.expr_statement(looked);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::MISSING_JOIN_ON);
}

#[test]
fn test_union_outer_splits_conflicting_types() {
    let mut b = TreeBuilder::new();
    let t = b.name("T");
    let u = b.name("U");
    let unioned = b.operator(QueryOp::Union {
        parameters: vec![],
        tables: vec![t, u],
    });
    b.expr_statement(unioned);
    let result = bind(&b.finish());
    assert_clean(&result);
    // c:int vs c:string split into suffixed columns
    assert_eq!(
        result_columns(&result),
        vec![
            ("c_int".to_string(), "int".to_string()),
            ("c_string".to_string(), "string".to_string()),
            ("a".to_string(), "long".to_string()),
        ]
    );
}

#[test]
fn test_union_inner_keeps_common_columns() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let u2 = b.name("U2");
    let kind = named_param(&mut b, "kind", "inner");
    let unioned = b.operator(QueryOp::Union {
        parameters: vec![kind],
        tables: vec![u, u2],
    });
    b.expr_statement(unioned);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![("a".to_string(), "long".to_string())]
    );
}

#[test]
fn test_datatable_value_count_mismatch() {
    let mut b = TreeBuilder::new();
    let one = b.lit_int(1);
    let two = b.lit_int(2);
    let three = b.lit_int(3);
    let dt = b.operator(QueryOp::DataTable {
        schema: vec![
            ColumnDecl::new("a", "int"),
            ColumnDecl::new("b", "int"),
        ],
        values: vec![one, two, three],
    });
    b.expr_statement(dt);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::DATATABLE_VALUE_COUNT);
}

#[test]
fn test_mv_expand_types_and_to_typeof() {
    let mut b = TreeBuilder::new();
    let open = b.name("OpenT");
    let bag = b.name("bag");
    let typed = b.name("vals");
    let expanded = b.pipe_op(
        open,
        QueryOp::MvExpand {
            parameters: vec![],
            items: vec![
                MvExpandItem {
                    name: None,
                    value: bag,
                    to_type: None,
                },
                MvExpandItem {
                    name: None,
                    value: typed,
                    to_type: Some(TypeExpr::Scalar("long".into())),
                },
            ],
            row_limit: None,
        },
    );
    b.expr_statement(expanded);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![
            ("bag".to_string(), "dynamic".to_string()),
            ("vals".to_string(), "long".to_string()),
        ]
    );
}

#[test]
fn test_parse_appends_typed_columns() {
    let mut b = TreeBuilder::new();
    let logs = b.name("Logs");
    let msg = b.name("Message");
    let parsed = b.pipe_op(
        logs,
        QueryOp::Parse {
            parameters: vec![],
            source: msg,
            pattern: vec![
                ParsePatternPart::Literal("took ".into()),
                ParsePatternPart::Column {
                    name: "Duration".into(),
                    type_name: Some("long".into()),
                },
                ParsePatternPart::Star,
                ParsePatternPart::Column {
                    name: "Unit".into(),
                    type_name: None,
                },
            ],
        },
    );
    b.expr_statement(parsed);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![
            ("Timestamp".to_string(), "datetime".to_string()),
            ("Level".to_string(), "string".to_string()),
            ("Message".to_string(), "string".to_string()),
            ("Duration".to_string(), "long".to_string()),
            ("Unit".to_string(), "string".to_string()),
        ]
    );
}

#[test]
fn test_find_unifies_by_name_search_prefixes_table_column() {
    let mut b = TreeBuilder::new();
    let t = b.name("T");
    let u = b.name("U");
    let c = b.name("c");
    let lit = b.lit_long(0);
    let pred = b.binary(OperatorKind::NotEqual, c, lit);
    let found = b.operator(QueryOp::Find {
        parameters: vec![],
        tables: Some(vec![t, u]),
        predicate: pred,
    });
    b.expr_statement(found);
    let result = bind(&b.finish());
    assert_clean(&result);
    // c:int vs c:string unify to dynamic; a survives by name
    assert_eq!(
        result_columns(&result),
        vec![
            ("c".to_string(), "dynamic".to_string()),
            ("a".to_string(), "long".to_string()),
        ]
    );

    let mut b = TreeBuilder::new();
    let term = b.lit_string("error");
    let searched = b.operator(QueryOp::Search {
        parameters: vec![],
        tables: None,
        predicate: term,
    });
    b.expr_statement(searched);
    let result = bind(&b.finish());
    assert_clean(&result);
    let columns = result_columns(&result);
    assert_eq!(columns[0].0, "$table");
    assert_eq!(columns[0].1, "string");
}

#[test]
fn test_fork_branches_bind_against_fork_input() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let a = b.name("a");
    let lit = b.lit_long(0);
    let pred = b.binary(OperatorKind::GreaterThan, a, lit);
    let branch1 = b.operator(QueryOp::Filter { predicate: pred });
    let branch2 = b.operator(QueryOp::Count { as_name: None });
    let forked = b.pipe_op(
        u,
        QueryOp::Fork {
            branches: vec![
                ForkBranch {
                    name: None,
                    pipeline: branch1,
                },
                ForkBranch {
                    name: Some("totals".into()),
                    pipeline: branch2,
                },
            ],
        },
    );
    b.expr_statement(forked);
    let result = bind(&b.finish());
    assert_clean(&result);
    // the operator's own scope is the final branch
    assert_eq!(
        result_columns(&result),
        vec![("Count".to_string(), "long".to_string())]
    );
}

#[test]
fn test_partition_by_column_and_body_scope() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let key = b.name("c");
    let a = b.name("a");
    let body = b.operator(QueryOp::Project {
        items: vec![b.item(a)],
    });
    let partitioned = b.pipe_op(
        u,
        QueryOp::Partition {
            parameters: vec![],
            by: key,
            body,
        },
    );
    b.expr_statement(partitioned);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![("a".to_string(), "long".to_string())]
    );
}

#[test]
fn test_evaluate_plugin_custom_schema() {
    let mut b = TreeBuilder::new();
    let open = b.name("OpenT");
    let bag = b.name("props");
    let call = b.call_named("bag_unpack", vec![bag]);
    let evaluated = b.pipe_op(
        open,
        QueryOp::Evaluate {
            parameters: vec![],
            call,
        },
    );
    b.expr_statement(evaluated);
    let result = bind(&b.finish());
    assert_clean(&result);
    let Some(TypeSymbol::Table(table)) = &result.result_type else {
        panic!("expected table");
    };
    assert!(table.is_open, "bag_unpack output schema is open");
}

#[test]
fn test_invoke_passes_input_as_first_argument() {
    let mut b = TreeBuilder::new();

    let t_ref = b.name("t");
    let a = b.name("a");
    let body_expr = b.pipe_op(
        t_ref,
        QueryOp::Project {
            items: vec![b.item(a)],
        },
    );
    let body = b.block(vec![tabula::syntax::Statement::Expr(body_expr)]);
    b.let_function(
        "keep_a",
        vec![tabula::syntax::DeclaredParam {
            name: "t".into(),
            type_expr: TypeExpr::Table(vec![ColumnDecl::new("a", "long")]),
        }],
        body,
    );

    let u = b.name("U");
    let callee = b.name("keep_a");
    let call = b.call(callee, vec![]);
    let invoked = b.pipe_op(u, QueryOp::Invoke { call });
    b.expr_statement(invoked);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![("a".to_string(), "long".to_string())]
    );
}

#[test]
fn test_print_and_consume_and_sample() {
    let mut b = TreeBuilder::new();
    let hello = b.lit_string("hello");
    let one = b.lit_long(1);
    let printed = b.operator(QueryOp::Print {
        items: vec![b.named_item("msg", hello), b.item(one)],
    });
    b.expr_statement(printed);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![
            ("msg".to_string(), "string".to_string()),
            ("print_1".to_string(), "long".to_string()),
        ]
    );

    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let consumed = b.pipe_op(u, QueryOp::Consume);
    b.expr_statement(consumed);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result_columns(&result).len(), 0);

    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let five = b.lit_long(5);
    let sampled = b.pipe_op(u, QueryOp::Sample { count: five });
    b.expr_statement(sampled);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result_columns(&result).len(), 2);
}

#[test]
fn test_take_requires_integer_count() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let not_a_number = b.lit_string("five");
    let taken = b.pipe_op(u, QueryOp::Take { count: not_a_number });
    b.expr_statement(taken);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::TYPE_EXPECTED);
}

#[test]
fn test_filter_requires_boolean() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let a = b.name("a");
    let filtered = b.pipe_op(u, QueryOp::Filter { predicate: a });
    b.expr_statement(filtered);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::BOOLEAN_EXPECTED);
}

#[test]
fn test_operator_without_input_still_produces_scope() {
    let mut b = TreeBuilder::new();
    let a = b.name("a");
    let lit = b.lit_long(0);
    let pred = b.binary(OperatorKind::GreaterThan, a, lit);
    // a filter at the head of a pipeline has no input
    let filtered = b.operator(QueryOp::Filter { predicate: pred });
    b.expr_statement(filtered);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::TABLE_EXPECTED);
    // best effort: the result is still tabular
    assert!(matches!(result.result_type, Some(TypeSymbol::Table(_))));
}

#[test]
fn test_render_chart_names_validated() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let rendered = b.pipe_op(
        u,
        QueryOp::Render {
            chart: "sparkles".into(),
            parameters: vec![],
        },
    );
    b.expr_statement(rendered);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::VALUE_NOT_ALLOWED);
}

#[test]
fn test_make_series_schema() {
    let mut b = TreeBuilder::new();
    let logs = b.name("Logs");
    let count = b.call_named("count", vec![]);
    let ts = b.name("Timestamp");
    let step = b.lit_timespan("1h");
    let level = b.name("Level");
    let series = b.pipe_op(
        logs,
        QueryOp::MakeSeries {
            aggregates: vec![tabula::syntax::MakeSeriesAggregate {
                item: b.item(count),
                default: None,
            }],
            on: ts,
            from: None,
            to: None,
            step,
            by: vec![b.item(level)],
        },
    );
    b.expr_statement(series);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![
            ("Level".to_string(), "string".to_string()),
            ("Timestamp".to_string(), "dynamic".to_string()),
            ("count_".to_string(), "dynamic".to_string()),
        ]
    );
}

#[test]
fn test_top_family_and_serialize_preserve_or_shape() {
    // top N by ordering preserves the row scope
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let n = b.lit_long(3);
    let a = b.name("a");
    let top = b.pipe_op(
        u,
        QueryOp::Top {
            count: n,
            by: vec![Ordering {
                expr: a,
                ascending: Some(false),
            }],
        },
    );
    b.expr_statement(top);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result_columns(&result).len(), 2);

    // top-hitters produces the of-column plus an approximate count
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let n = b.lit_long(5);
    let c = b.name("c");
    let hitters = b.pipe_op(
        u,
        QueryOp::TopHitters {
            count: n,
            of: c,
            by: None,
        },
    );
    b.expr_statement(hitters);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![
            ("c".to_string(), "string".to_string()),
            ("approximate_count_c".to_string(), "long".to_string()),
        ]
    );

    // sample-distinct keeps only the of-column
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let n = b.lit_long(5);
    let c = b.name("c");
    let sampled = b.pipe_op(u, QueryOp::SampleDistinct { count: n, of: c });
    b.expr_statement(sampled);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![("c".to_string(), "string".to_string())]
    );

    // serialize and execute_and_cache are pass-through
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let serialized = b.pipe_op(u, QueryOp::Serialize { items: vec![] });
    let cached = b.pipe_op(serialized, QueryOp::ExecuteAndCache);
    b.expr_statement(cached);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result_columns(&result).len(), 2);
}

#[test]
fn test_mv_apply_combines_outer_and_body_columns() {
    let mut b = TreeBuilder::new();
    let open = b.name("OpenT");
    let vals = b.name("vals");
    // inner pipeline: summarize total = sum(element)
    let element = b.name("element");
    let sum = b.call_named("sum", vec![element]);
    let body = b.operator(QueryOp::Summarize {
        aggregates: vec![b.named_item("total", sum)],
        by: vec![],
    });
    let applied = b.pipe_op(
        open,
        QueryOp::MvApply {
            items: vec![MvExpandItem {
                name: Some("element".into()),
                value: vals,
                to_type: Some(TypeExpr::Scalar("long".into())),
            }],
            row_limit: None,
            id_column: None,
            body,
        },
    );
    b.expr_statement(applied);
    let result = bind(&b.finish());
    assert_clean(&result);
    // outer columns (vals inferred on the open scope) plus the body's
    let columns = result_columns(&result);
    assert!(columns.contains(&("total".to_string(), "long".to_string())));
}

#[test]
fn test_distinct_star_and_columns() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let star = b.star();
    let distinct = b.pipe_op(u, QueryOp::Distinct { columns: vec![star] });
    b.expr_statement(distinct);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result_columns(&result).len(), 2);

    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let c = b.name("c");
    let distinct = b.pipe_op(u, QueryOp::Distinct { columns: vec![c] });
    b.expr_statement(distinct);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(
        result_columns(&result),
        vec![("c".to_string(), "string".to_string())]
    );
}
