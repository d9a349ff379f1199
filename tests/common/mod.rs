//! Shared fixtures for binder integration tests.

// not every test binary uses every helper
#![allow(dead_code)]

use std::sync::Arc;

use tabula::binder::{BindResult, Binder, BinderOptions};
use tabula::symbols::{
    Catalog, ClusterSymbol, ColumnSymbol, DatabaseSymbol, ScalarType, TableSymbol, TypeSymbol,
};
use tabula::syntax::SyntaxTree;

/// A catalog with one cluster `help` holding:
/// - `db` (current): `T(c:int)`, `U(a:long, c:string)`, `U2(a:long, d:real)`,
///   `Logs(Timestamp:datetime, Level:string, Message:string)`,
///   `OpenT` (open, no declared columns)
/// - `other`: `Extra(x:long)`
pub fn catalog() -> Catalog {
    let t = TableSymbol::new("T", vec![ColumnSymbol::scalar("c", ScalarType::Int)]);
    let u = TableSymbol::new(
        "U",
        vec![
            ColumnSymbol::scalar("a", ScalarType::Long),
            ColumnSymbol::scalar("c", ScalarType::String),
        ],
    );
    let u2 = TableSymbol::new(
        "U2",
        vec![
            ColumnSymbol::scalar("a", ScalarType::Long),
            ColumnSymbol::scalar("d", ScalarType::Real),
        ],
    );
    let logs = TableSymbol::new(
        "Logs",
        vec![
            ColumnSymbol::scalar("Timestamp", ScalarType::DateTime),
            ColumnSymbol::scalar("Level", ScalarType::String),
            ColumnSymbol::scalar("Message", ScalarType::String),
        ],
    );
    let open_t = TableSymbol::open("OpenT", Vec::new());

    let db = DatabaseSymbol::new("db", vec![t, u, u2, logs, open_t], Vec::new());
    let extra = TableSymbol::new("Extra", vec![ColumnSymbol::scalar("x", ScalarType::Long)]);
    let other = DatabaseSymbol::new("other", vec![extra], Vec::new());

    let cluster = ClusterSymbol::new("help", vec![db, other]);
    Catalog::builder()
        .add_cluster(cluster)
        .current("help", "db")
        .build()
        .expect("fixture catalog is valid")
}

/// Bind a tree against the fixture catalog.
pub fn bind(tree: &SyntaxTree) -> BindResult {
    bind_with(tree, &catalog())
}

pub fn bind_with(tree: &SyntaxTree, catalog: &Catalog) -> BindResult {
    Binder::bind(tree, catalog, &BinderOptions::default()).expect("binding is not cancelled")
}

/// The final statement's row scope as (name, type-name) pairs.
pub fn result_columns(result: &BindResult) -> Vec<(String, String)> {
    let Some(TypeSymbol::Table(table)) = &result.result_type else {
        panic!("expected a tabular result, got {:?}", result.result_type);
    };
    table_columns(table)
}

pub fn table_columns(table: &Arc<TableSymbol>) -> Vec<(String, String)> {
    table
        .columns
        .iter()
        .map(|c| {
            (
                c.name.to_string(),
                c.column_type.display_name().to_string(),
            )
        })
        .collect()
}

/// Assert the bind produced no diagnostics.
#[track_caller]
pub fn assert_clean(result: &BindResult) {
    let diagnostics = result.diagnostics();
    assert!(
        diagnostics.is_empty(),
        "expected no diagnostics, got: {:?}",
        diagnostics
            .iter()
            .map(|d| format!("{}: {}", d.code(), d.message))
            .collect::<Vec<_>>()
    );
}

/// Assert some diagnostic carries the given code.
#[track_caller]
pub fn assert_has_code(result: &BindResult, code: &str) {
    let diagnostics = result.diagnostics();
    assert!(
        diagnostics.iter().any(|d| d.code() == code),
        "expected a {code} diagnostic, got: {:?}",
        diagnostics
            .iter()
            .map(|d| format!("{}: {}", d.code(), d.message))
            .collect::<Vec<_>>()
    );
}
