//! Binder-session scopes and per-binding caches.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::base::name_cmp_key;
use crate::symbols::{
    CallSiteFingerprint, ClusterSymbol, ColumnSymbol, DatabaseSymbol, Expansion, Symbol,
    TableSymbol, TypeSymbol,
};

// ============================================================================
// SCOPE KIND
// ============================================================================

/// What function namespace the current position exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeKind {
    /// Ordinary expressions: scalar functions, no aggregates.
    #[default]
    Normal,
    /// Summarize/make-series value slots: aggregates visible.
    Aggregate,
    /// `evaluate` argument position: plug-ins visible.
    PlugIn,
}

// ============================================================================
// LOCAL SCOPE
// ============================================================================

/// Layered let/as/parameter bindings.
///
/// Lookup collects every declaration of a name across all live layers;
/// more than one hit is an ambiguity (the caller turns it into a
/// `Group`). Declaration order inside a layer is preserved for the
/// symbols-in-scope query.
#[derive(Debug, Clone, Default)]
pub struct LocalScope {
    layers: Vec<IndexMap<SmolStr, Vec<Symbol>>>,
}

impl LocalScope {
    pub fn new() -> Self {
        Self {
            layers: vec![IndexMap::new()],
        }
    }

    pub fn push_layer(&mut self) {
        self.layers.push(IndexMap::new());
    }

    pub fn pop_layer(&mut self) {
        debug_assert!(self.layers.len() > 1);
        self.layers.pop();
    }

    /// Replace the whole scope (function expansion uses a fresh one).
    pub fn take(&mut self) -> LocalScope {
        std::mem::replace(self, LocalScope::new())
    }

    pub fn restore(&mut self, saved: LocalScope) {
        *self = saved;
    }

    pub fn declare(&mut self, symbol: Symbol) {
        let key = name_cmp_key(symbol.name());
        self.declare_keyed(key, symbol);
    }

    /// Declare under an explicit name (let aliases keep the aliased
    /// entity's own name on the symbol).
    pub fn declare_as(&mut self, name: impl AsRef<str>, symbol: Symbol) {
        self.declare_keyed(name_cmp_key(name.as_ref()), symbol);
    }

    fn declare_keyed(&mut self, key: SmolStr, symbol: Symbol) {
        self.layers
            .last_mut()
            .expect("scope always has a base layer")
            .entry(key)
            .or_default()
            .push(symbol);
    }

    /// Every declaration of `name`, innermost layer last.
    pub fn find(&self, name: &str) -> Vec<Symbol> {
        let key = name_cmp_key(name);
        let mut hits = Vec::new();
        for layer in &self.layers {
            if let Some(symbols) = layer.get(&key) {
                hits.extend(symbols.iter().cloned());
            }
        }
        hits
    }

    /// All symbols, for the symbols-in-scope query.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.layers
            .iter()
            .flat_map(|layer| layer.values().flatten().cloned())
            .collect()
    }
}

// ============================================================================
// OPEN-ENTITY SYNTHESIS
// ============================================================================

/// Memoized synthesis of open clusters/databases/tables and inferred
/// columns. One per binder session; synthesized symbols never reach the
/// global cache.
#[derive(Debug, Default)]
pub struct OpenEntities {
    clusters: FxHashMap<SmolStr, Arc<ClusterSymbol>>,
    databases: FxHashMap<(usize, SmolStr), Arc<DatabaseSymbol>>,
    tables: FxHashMap<(usize, SmolStr), Arc<TableSymbol>>,
    /// Inferred columns per open table, in inference order.
    columns: FxHashMap<usize, IndexMap<SmolStr, Arc<ColumnSymbol>>>,
}

impl OpenEntities {
    pub fn open_cluster(&mut self, name: &str) -> Arc<ClusterSymbol> {
        self.clusters
            .entry(name_cmp_key(name))
            .or_insert_with(|| ClusterSymbol::open(name))
            .clone()
    }

    pub fn open_database(&mut self, cluster: &Arc<ClusterSymbol>, name: &str) -> Arc<DatabaseSymbol> {
        let key = (Arc::as_ptr(cluster) as usize, name_cmp_key(name));
        self.databases
            .entry(key)
            .or_insert_with(|| DatabaseSymbol::open(name))
            .clone()
    }

    pub fn open_table(&mut self, database: &Arc<DatabaseSymbol>, name: &str) -> Arc<TableSymbol> {
        let key = (Arc::as_ptr(database) as usize, name_cmp_key(name));
        self.tables
            .entry(key)
            .or_insert_with(|| TableSymbol::open(name, Vec::new()))
            .clone()
    }

    /// An inferred `dynamic` column on an open table.
    pub fn infer_column(&mut self, table: &Arc<TableSymbol>, name: &str) -> Arc<ColumnSymbol> {
        let table_key = Arc::as_ptr(table) as usize;
        self.columns
            .entry(table_key)
            .or_default()
            .entry(name_cmp_key(name))
            .or_insert_with(|| ColumnSymbol::new(name, TypeSymbol::DYNAMIC))
            .clone()
    }

    /// Columns inferred so far for a table, in inference order.
    pub fn inferred_columns(&self, table: &Arc<TableSymbol>) -> Vec<Arc<ColumnSymbol>> {
        self.columns
            .get(&(Arc::as_ptr(table) as usize))
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    /// The table extended with its inferred columns (declared columns
    /// stay a prefix; growth is monotonic within the session).
    pub fn effective_table(&self, table: &Arc<TableSymbol>) -> Arc<TableSymbol> {
        let inferred = self.inferred_columns(table);
        if inferred.is_empty() {
            return table.clone();
        }
        let mut columns = table.columns.clone();
        for col in inferred {
            if table.find_column(&col.name).is_none() {
                columns.push(col);
            }
        }
        Arc::new(TableSymbol {
            name: table.name.clone(),
            columns,
            is_open: table.is_open,
        })
    }
}

// ============================================================================
// LOCAL BINDING CACHE
// ============================================================================

/// Per-top-level-bind cache: expansions that must not outlive the call
/// plus the cycle-breaking "currently expanding" set.
#[derive(Debug, Default)]
pub struct LocalBindingCache {
    pub expansions: FxHashMap<CallSiteFingerprint, Option<Arc<Expansion>>>,
    /// Signatures (by identity) currently being expanded.
    pub expanding: FxHashSet<usize>,
}

impl LocalBindingCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{ScalarType, VariableSymbol};

    fn var(name: &str) -> Symbol {
        Symbol::Variable(VariableSymbol::new(name, TypeSymbol::LONG))
    }

    #[test]
    fn test_local_scope_collects_across_layers() {
        let mut scope = LocalScope::new();
        scope.declare(var("x"));
        scope.push_layer();
        scope.declare(var("x"));
        assert_eq!(scope.find("x").len(), 2);
        scope.pop_layer();
        assert_eq!(scope.find("x").len(), 1);
    }

    #[test]
    fn test_local_scope_duplicate_same_layer() {
        let mut scope = LocalScope::new();
        scope.declare(var("v"));
        scope.declare(var("v"));
        assert_eq!(scope.find("v").len(), 2);
        assert_eq!(scope.find("V").len(), 2);
    }

    #[test]
    fn test_open_synthesis_is_memoized() {
        let mut open = OpenEntities::default();
        let c = open.open_cluster("c1");
        let c2 = open.open_cluster("C1");
        assert!(Arc::ptr_eq(&c, &c2));

        let db = open.open_database(&c, "db");
        let t = open.open_table(&db, "T");
        let t2 = open.open_table(&db, "t");
        assert!(Arc::ptr_eq(&t, &t2));
        assert!(t.is_open);
    }

    #[test]
    fn test_inferred_columns_extend_monotonically() {
        let mut open = OpenEntities::default();
        let t = TableSymbol::open(
            "O",
            vec![ColumnSymbol::scalar("declared", ScalarType::Long)],
        );
        let foo = open.infer_column(&t, "foo");
        assert_eq!(foo.column_type, TypeSymbol::DYNAMIC);
        let again = open.infer_column(&t, "foo");
        assert!(Arc::ptr_eq(&foo, &again));

        open.infer_column(&t, "bar");
        let effective = open.effective_table(&t);
        let names: Vec<_> = effective.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["declared", "foo", "bar"]);
    }
}
