//! Overload resolution and signature checking through the binder.

mod common;

use common::{assert_clean, assert_has_code, bind};
use tabula::diagnostics::codes;
use tabula::symbols::TypeSymbol;
use tabula::syntax::{Argument, OperatorKind, QueryOp, TreeBuilder};

#[test]
fn test_arithmetic_widest_typing() {
    let mut b = TreeBuilder::new();
    let x = b.lit_int(2);
    let y = b.lit_int(3);
    let m = b.binary(OperatorKind::Multiply, x, y);
    b.expr_statement(m);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(m), TypeSymbol::INT);

    let mut b = TreeBuilder::new();
    let x = b.lit_int(2);
    let y = b.lit_long(3);
    let m = b.binary(OperatorKind::Add, x, y);
    b.expr_statement(m);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(m), TypeSymbol::LONG);

    let mut b = TreeBuilder::new();
    let x = b.lit_real(2.0);
    let y = b.lit_long(3);
    let m = b.binary(OperatorKind::Add, x, y);
    b.expr_statement(m);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(m), TypeSymbol::REAL);
}

#[test]
fn test_temporal_arithmetic_overloads() {
    let mut b = TreeBuilder::new();
    let d = b.lit_datetime("2026-01-01");
    let t = b.lit_timespan("1d");
    let plus = b.binary(OperatorKind::Add, d, t);
    b.expr_statement(plus);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(plus), TypeSymbol::DATETIME);

    let mut b = TreeBuilder::new();
    let d1 = b.lit_datetime("2026-01-02");
    let d2 = b.lit_datetime("2026-01-01");
    let diff = b.binary(OperatorKind::Subtract, d1, d2);
    b.expr_statement(diff);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(diff), TypeSymbol::TIMESPAN);
}

#[test]
fn test_string_and_regex_predicates() {
    let mut b = TreeBuilder::new();
    let s = b.lit_string("abc");
    let term = b.lit_string("b");
    let has = b.binary(OperatorKind::Has, s, term);
    b.expr_statement(has);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(has), TypeSymbol::BOOL);

    // matches regex requires a string pattern
    let mut b = TreeBuilder::new();
    let s = b.lit_string("abc");
    let pattern = b.lit_long(5);
    let m = b.binary(OperatorKind::MatchRegex, s, pattern);
    b.expr_statement(m);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::WRONG_ARGUMENT_TYPE);
}

#[test]
fn test_in_list_and_between() {
    let mut b = TreeBuilder::new();
    let x = b.lit_long(1);
    let a = b.lit_long(2);
    let c = b.lit_long(3);
    let e = b.in_list(OperatorKind::In, x, vec![a, c]);
    b.expr_statement(e);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(e), TypeSymbol::BOOL);

    let mut b = TreeBuilder::new();
    let x = b.lit_long(5);
    let low = b.lit_long(1);
    let high = b.lit_long(10);
    let e = b.between(OperatorKind::Between, x, low, high);
    b.expr_statement(e);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(e), TypeSymbol::BOOL);
}

#[test]
fn test_logical_operators_require_bool() {
    let mut b = TreeBuilder::new();
    let t = b.lit_bool(true);
    let f = b.lit_bool(false);
    let and = b.binary(OperatorKind::And, t, f);
    b.expr_statement(and);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(and), TypeSymbol::BOOL);

    let mut b = TreeBuilder::new();
    let t = b.lit_bool(true);
    let n = b.lit_long(1);
    let and = b.binary(OperatorKind::And, t, n);
    b.expr_statement(and);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::WRONG_ARGUMENT_TYPE);
}

#[test]
fn test_wrong_arity_diagnosed() {
    let mut b = TreeBuilder::new();
    let s = b.lit_string("x");
    let extra = b.lit_string("y");
    let call = b.call_named("strlen", vec![s, extra]);
    b.expr_statement(call);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::WRONG_NUMBER_OF_ARGUMENTS);
}

#[test]
fn test_common_return_type_iff() {
    let mut b = TreeBuilder::new();
    let cond = b.lit_bool(true);
    let a = b.lit_int(1);
    let c = b.lit_long(2);
    let call = b.call_named("iff", vec![cond, a, c]);
    b.expr_statement(call);
    let result = bind(&b.finish());
    assert_clean(&result);
    // int promotes into the common long
    assert_eq!(result.semantics.result_type(call), TypeSymbol::LONG);
}

#[test]
fn test_conversion_functions_and_parameter0() {
    let mut b = TreeBuilder::new();
    let s = b.lit_string("12");
    let call = b.call_named("tolong", vec![s]);
    b.expr_statement(call);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(call), TypeSymbol::LONG);

    let mut b = TreeBuilder::new();
    let x = b.lit_real(1.5);
    let call = b.call_named("abs", vec![x]);
    b.expr_statement(call);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(call), TypeSymbol::REAL);
}

#[test]
fn test_typeof_literal_return_kind() {
    let mut b = TreeBuilder::new();
    let regex = b.lit_string("(\\d+)");
    let group = b.lit_long(1);
    let s = b.lit_string("v42");
    let ty = b.typeof_scalar("long");
    let call = b.call_named("extract", vec![regex, group, s, ty]);
    b.expr_statement(call);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(call), TypeSymbol::LONG);

    // the three-argument overload stays string
    let mut b = TreeBuilder::new();
    let regex = b.lit_string("(\\d+)");
    let group = b.lit_long(1);
    let s = b.lit_string("v42");
    let call = b.call_named("extract", vec![regex, group, s]);
    b.expr_statement(call);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(call), TypeSymbol::STRING);
}

#[test]
fn test_table_function_resolves_against_catalog() {
    let mut b = TreeBuilder::new();
    let name = b.lit_string("U");
    let call = b.call_named("table", vec![name]);
    b.expr_statement(call);
    let result = bind(&b.finish());
    assert_clean(&result);
    let ty = result.semantics.result_type(call);
    let table = ty.as_table().expect("table() yields a table");
    assert_eq!(table.name, "U");
}

#[test]
fn test_table_function_requires_nonempty_literal() {
    let mut b = TreeBuilder::new();
    let name = b.lit_string("");
    let call = b.call_named("table", vec![name]);
    b.expr_statement(call);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::NON_EMPTY_LITERAL_REQUIRED);
}

#[test]
fn test_database_path_table_lookup() {
    // database("other").Extra
    let mut b = TreeBuilder::new();
    let dbname = b.lit_string("other");
    let db = b.call_named("database", vec![dbname]);
    let table = b.path(db, "Extra");
    b.expr_statement(table);
    let result = bind(&b.finish());
    assert_clean(&result);
    let ty = result.semantics.result_type(table);
    assert_eq!(ty.as_table().unwrap().name, "Extra");
}

#[test]
fn test_named_arguments_on_user_functions_only() {
    // strcat(arg = "x") — built-ins reject names
    let mut b = TreeBuilder::new();
    let v = b.lit_string("x");
    let callee = b.name("strcat");
    let call = b.call_args(callee, vec![Argument::named("arg", v)]);
    b.expr_statement(call);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::NAMED_ARGUMENTS_NOT_SUPPORTED);

    // user function accepts them, in declaration order or by name
    let mut b = TreeBuilder::new();
    let x_ref = b.name("x");
    let body = b.block(vec![tabula::syntax::Statement::Expr(x_ref)]);
    b.let_function(
        "ident",
        vec![tabula::syntax::DeclaredParam {
            name: "x".into(),
            type_expr: tabula::syntax::TypeExpr::Scalar("long".into()),
        }],
        body,
    );
    let v = b.lit_long(7);
    let callee = b.name("ident");
    let call = b.call_args(callee, vec![Argument::named("x", v)]);
    b.expr_statement(call);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(call), TypeSymbol::LONG);
}

#[test]
fn test_unknown_named_argument_diagnosed() {
    let mut b = TreeBuilder::new();
    let x_ref = b.name("x");
    let body = b.block(vec![tabula::syntax::Statement::Expr(x_ref)]);
    b.let_function(
        "ident",
        vec![tabula::syntax::DeclaredParam {
            name: "x".into(),
            type_expr: tabula::syntax::TypeExpr::Scalar("long".into()),
        }],
        body,
    );
    let v = b.lit_long(7);
    let callee = b.name("ident");
    let call = b.call_args(callee, vec![Argument::named("y", v)]);
    b.expr_statement(call);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::UNKNOWN_NAMED_ARGUMENT);
}

#[test]
fn test_star_must_be_last() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let star = b.star();
    let extra = b.name("a");
    let call = b.call_named("estimate_data_size", vec![star, extra]);
    let piped = b.pipe_op(u, QueryOp::Extend { items: vec![b.named_item("sz", call)] });
    b.expr_statement(piped);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::STAR_MUST_BE_LAST);
}

#[test]
fn test_not_a_function_diagnosed() {
    let mut b = TreeBuilder::new();
    let u = b.name("U");
    let a = b.name("a");
    let call = b.call(a, vec![]);
    let piped = b.pipe_op(u, QueryOp::Extend { items: vec![b.named_item("x", call)] });
    b.expr_statement(piped);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::NOT_A_FUNCTION);
}

#[test]
fn test_zero_argument_function_without_parens() {
    let mut b = TreeBuilder::new();
    let now = b.name("now");
    b.expr_statement(now);
    let result = bind(&b.finish());
    assert_clean(&result);
    assert_eq!(result.semantics.result_type(now), TypeSymbol::DATETIME);

    // a function that needs arguments requires the list
    let mut b = TreeBuilder::new();
    let strlen = b.name("strlen");
    b.expr_statement(strlen);
    let result = bind(&b.finish());
    assert_has_code(&result, codes::ARGUMENT_LIST_REQUIRED);
}
