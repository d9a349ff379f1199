//! Column unification over ordered table lists.
//!
//! Three disciplines (by-name, by-name-and-type, common-columns), all
//! deterministic in first-appearance order. Results are memoized in the
//! per-catalog cache when every input is a declared table of the
//! current database; anything else is ephemeral.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::{UniqueNames, name_cmp_key};
use crate::symbols::{
    BindingCacheData, Catalog, ColumnSymbol, TableSymbol, UnifyKey, UnifyStrategy,
    unified_column_type,
};

/// Merge column lists by name: one output column per name; conflicting
/// types collapse to the widest common scalar, else dynamic.
pub fn unify_by_name(tables: &[Arc<TableSymbol>]) -> Arc<TableSymbol> {
    let mut merged: IndexMap<SmolStr, Arc<ColumnSymbol>> = IndexMap::new();
    for table in tables {
        for column in &table.columns {
            let key = name_cmp_key(&column.name);
            match merged.get(&key) {
                None => {
                    merged.insert(key, column.clone());
                }
                Some(existing) => {
                    if existing.column_type != column.column_type {
                        let unified =
                            unified_column_type(&existing.column_type, &column.column_type);
                        let replacement = existing.with_type(unified);
                        merged.insert(key, replacement);
                    }
                }
            }
        }
    }
    TableSymbol::schema(merged.into_values().collect())
}

/// Merge by name and type: a name with a single type keeps it; a name
/// with several types emits one `name_type` column per distinct type,
/// uniquified, in first-appearance order.
pub fn unify_by_name_and_type(tables: &[Arc<TableSymbol>]) -> Arc<TableSymbol> {
    // name -> distinct (type, representative column) in appearance order
    let mut merged: IndexMap<SmolStr, Vec<Arc<ColumnSymbol>>> = IndexMap::new();
    for table in tables {
        for column in &table.columns {
            let variants = merged.entry(name_cmp_key(&column.name)).or_default();
            if !variants.iter().any(|c| c.column_type == column.column_type) {
                variants.push(column.clone());
            }
        }
    }

    let mut names = UniqueNames::new();
    let mut columns = Vec::new();
    for variants in merged.into_values() {
        if variants.len() == 1 {
            let column = variants.into_iter().next().expect("non-empty variants");
            let unique = names.add(&column.name);
            columns.push(if unique == column.name {
                column
            } else {
                column.with_name(unique)
            });
        } else {
            for column in variants {
                let suffixed = format!("{}_{}", column.name, column.column_type.display_name());
                let unique = names.add(&suffixed);
                columns.push(column.with_name(unique));
            }
        }
    }
    TableSymbol::schema(columns)
}

/// Intersect by name across all tables, keeping the first table's
/// declaration for each surviving column.
pub fn common_columns(tables: &[Arc<TableSymbol>]) -> Arc<TableSymbol> {
    let Some((first, rest)) = tables.split_first() else {
        return TableSymbol::schema(Vec::new());
    };
    let columns = first
        .columns
        .iter()
        .filter(|c| rest.iter().all(|t| t.find_column(&c.name).is_some()))
        .cloned()
        .collect();
    TableSymbol::schema(columns)
}

/// Unify with cache participation.
///
/// The result is cached only when every input table is a declared table
/// of the current database, whose identity is stable for the catalog's
/// lifetime.
pub fn unify_cached(
    strategy: UnifyStrategy,
    tables: &[Arc<TableSymbol>],
    catalog: &Catalog,
    cache: &mut BindingCacheData,
) -> Arc<TableSymbol> {
    let cacheable = !tables.is_empty()
        && tables.iter().all(|t| catalog.is_current_database_table(t));

    if cacheable {
        let key = UnifyKey::new(strategy, tables);
        if let Some(hit) = cache.unification.get(&key) {
            tracing::trace!(?strategy, "unification cache hit");
            return hit.clone();
        }
        let result = run(strategy, tables);
        cache.unification.insert(key, result.clone());
        return result;
    }

    run(strategy, tables)
}

fn run(strategy: UnifyStrategy, tables: &[Arc<TableSymbol>]) -> Arc<TableSymbol> {
    match strategy {
        UnifyStrategy::ByName => unify_by_name(tables),
        UnifyStrategy::ByNameAndType => unify_by_name_and_type(tables),
        UnifyStrategy::CommonColumns => common_columns(tables),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{ScalarType, TypeSymbol};

    fn table(name: &str, cols: &[(&str, ScalarType)]) -> Arc<TableSymbol> {
        Arc::new(TableSymbol {
            name: name.into(),
            columns: cols
                .iter()
                .map(|(n, t)| ColumnSymbol::scalar(*n, *t))
                .collect(),
            is_open: false,
        })
    }

    #[test]
    fn test_unify_by_name_same_type_keeps_one() {
        let t1 = table("A", &[("x", ScalarType::Long), ("y", ScalarType::String)]);
        let t2 = table("B", &[("x", ScalarType::Long)]);
        let u = unify_by_name(&[t1, t2]);
        assert_eq!(u.columns.len(), 2);
        assert_eq!(u.columns[0].name, "x");
        assert_eq!(u.columns[0].column_type, TypeSymbol::LONG);
    }

    #[test]
    fn test_unify_by_name_conflict_widens_then_dynamic() {
        let t1 = table("A", &[("x", ScalarType::Int)]);
        let t2 = table("B", &[("x", ScalarType::Long)]);
        let widened = unify_by_name(&[t1, t2]);
        assert_eq!(widened.columns[0].column_type, TypeSymbol::LONG);

        let t3 = table("A", &[("x", ScalarType::String)]);
        let t4 = table("B", &[("x", ScalarType::Long)]);
        let collapsed = unify_by_name(&[t3, t4]);
        assert_eq!(collapsed.columns[0].column_type, TypeSymbol::DYNAMIC);
    }

    #[test]
    fn test_unify_by_name_idempotent() {
        let t1 = table("A", &[("x", ScalarType::Int), ("y", ScalarType::String)]);
        let t2 = table("B", &[("x", ScalarType::Long), ("z", ScalarType::Real)]);
        let once = unify_by_name(&[t1, t2]);
        let twice = unify_by_name(std::slice::from_ref(&once));
        assert_eq!(once.columns, twice.columns);
    }

    #[test]
    fn test_unify_by_name_and_type_splits() {
        let t1 = table("A", &[("x", ScalarType::Long), ("y", ScalarType::String)]);
        let t2 = table("B", &[("x", ScalarType::String)]);
        let u = unify_by_name_and_type(&[t1, t2]);
        let names: Vec<_> = u.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x_long", "x_string", "y"]);
    }

    #[test]
    fn test_unify_by_name_and_type_collision_with_existing() {
        // a declared column already named like a suffixed variant
        let t1 = table(
            "A",
            &[("x", ScalarType::Long), ("x_string", ScalarType::Bool)],
        );
        let t2 = table("B", &[("x", ScalarType::String)]);
        let u = unify_by_name_and_type(&[t1, t2]);
        let names: Vec<_> = u.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x_long", "x_string", "x_string_1"]);
    }

    #[test]
    fn test_common_columns_keeps_first_declaration() {
        let t1 = table("A", &[("x", ScalarType::Int), ("y", ScalarType::String)]);
        let t2 = table("B", &[("x", ScalarType::Long)]);
        let u = common_columns(&[t1, t2]);
        assert_eq!(u.columns.len(), 1);
        assert_eq!(u.columns[0].column_type, TypeSymbol::INT);
    }
}
