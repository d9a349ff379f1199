//! Name resolution: the fixed lookup order over the scope stack.

use std::sync::Arc;

use crate::builtins;
use crate::symbols::{Symbol, SymbolMatch, TypeSymbol};

use super::{Binder, ScopeKind};

// ============================================================================
// FUNCTION-KIND MASK
// ============================================================================

/// Which function origins a symbols-in-scope query includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncludeFunctionKinds(u8);

impl IncludeFunctionKinds {
    pub const BUILT_IN: IncludeFunctionKinds = IncludeFunctionKinds(1 << 0);
    pub const DATABASE: IncludeFunctionKinds = IncludeFunctionKinds(1 << 1);
    pub const LOCAL: IncludeFunctionKinds = IncludeFunctionKinds(1 << 2);
    pub const ALL: IncludeFunctionKinds = IncludeFunctionKinds(0b111);
    pub const NONE: IncludeFunctionKinds = IncludeFunctionKinds(0);

    pub fn union(self, other: IncludeFunctionKinds) -> IncludeFunctionKinds {
        IncludeFunctionKinds(self.0 | other.0)
    }

    pub fn contains(self, other: IncludeFunctionKinds) -> bool {
        self.0 & other.0 == other.0
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

/// What a lookup produced.
#[derive(Debug)]
pub(crate) enum LookupOutcome {
    One(Symbol),
    Many(Vec<Symbol>),
    NotFound,
}

impl LookupOutcome {
    fn from_hits(mut hits: Vec<Symbol>) -> LookupOutcome {
        match hits.len() {
            0 => LookupOutcome::NotFound,
            1 => LookupOutcome::One(hits.remove(0)),
            _ => LookupOutcome::Many(hits),
        }
    }
}

// ============================================================================
// RESOLUTION ORDER
// ============================================================================

impl Binder<'_> {
    /// Resolve `name` at the current position.
    ///
    /// `in_call_position` marks the callee of an invocation, where
    /// functions are eligible regardless of their arity.
    pub(crate) fn lookup_name(
        &mut self,
        name: &str,
        matches: SymbolMatch,
        in_call_position: bool,
    ) -> LookupOutcome {
        // a dotted left side short-circuits everything else
        if self.path_scope.is_some() {
            return self.lookup_in_path(name, matches);
        }

        // row scope columns
        if matches.contains(SymbolMatch::COLUMN)
            && let Some(row) = self.effective_row_scope()
            && let Some(column) = row.find_column(name)
        {
            return LookupOutcome::One(Symbol::Column(column.clone()));
        }

        // right row scope columns (join right side)
        if matches.contains(SymbolMatch::COLUMN)
            && let Some(right) = self.right_row_scope.clone()
            && let Some(column) = right.find_column(name)
        {
            return LookupOutcome::One(Symbol::Column(column.clone()));
        }

        // local scope: let bindings, as-names, parameters, local functions
        let local_hits: Vec<Symbol> = self
            .local_scope
            .find(name)
            .into_iter()
            .filter(|s| matches.accepts(s.kind()))
            .collect();
        if !local_hits.is_empty() {
            return LookupOutcome::from_hits(local_hits);
        }

        // current database members: tables always, stored functions when
        // invocable here (call position, or zero-argument)
        let mut db_hits = Vec::new();
        let database = self.catalog.current_database().clone();
        if matches.contains(SymbolMatch::TABLE)
            && let Some(table) = database.find_table(name)
        {
            db_hits.push(Symbol::Table(table.clone()));
        }
        if matches.contains(SymbolMatch::FUNCTION)
            && let Some(function) = database.find_function(name)
            && (in_call_position || function.min_argument_count() == 0)
        {
            db_hits.push(Symbol::Function(function.clone()));
        }
        if !db_hits.is_empty() {
            return LookupOutcome::from_hits(db_hits);
        }

        // sibling databases of the current cluster
        if matches.contains(SymbolMatch::DATABASE)
            && let Some(db) = self.catalog.current_cluster().find_database(name)
        {
            return LookupOutcome::One(Symbol::Database(db.clone()));
        }

        // built-in functions, ordered by the active scope kind
        if matches.contains(SymbolMatch::FUNCTION)
            && let Some(symbol) = self.lookup_builtin(name)
        {
            return LookupOutcome::One(symbol);
        }

        // open row scope: infer a dynamic column
        if matches.contains(SymbolMatch::COLUMN)
            && let Some(row) = self.row_scope.clone()
            && row.is_open
        {
            let column = self.session.open.infer_column(&row, name);
            tracing::trace!(name, "inferred dynamic column on open row scope");
            return LookupOutcome::One(Symbol::Column(column));
        }

        tracing::trace!(name, "name not found");
        LookupOutcome::NotFound
    }

    fn lookup_builtin(&self, name: &str) -> Option<Symbol> {
        if self.scope_kind == ScopeKind::PlugIn
            && let Some(plugin) = builtins::find_plugin(name)
        {
            return Some(Symbol::Function(plugin.clone()));
        }
        if let Some(aggregate) = builtins::find_aggregate(name) {
            // visible in every scope; misuse outside aggregate scope is
            // diagnosed at the call
            return Some(Symbol::Function(aggregate.clone()));
        }
        builtins::find_function(name).map(|f| Symbol::Function(f.clone()))
    }

    /// Member lookup on the left side of a dotted path.
    fn lookup_in_path(&mut self, name: &str, matches: SymbolMatch) -> LookupOutcome {
        let scope = self.path_scope.clone().expect("path scope present");
        match scope {
            Symbol::Cluster(cluster) => {
                if crate::base::name_eq(name, "database") {
                    if let Some(f) = builtins::find_function("database") {
                        return LookupOutcome::One(Symbol::Function(f.clone()));
                    }
                }
                if let Some(db) = cluster.find_database(name) {
                    return LookupOutcome::One(Symbol::Database(db.clone()));
                }
                if cluster.is_open {
                    let db = self.session.open.open_database(&cluster, name);
                    return LookupOutcome::One(Symbol::Database(db));
                }
                LookupOutcome::NotFound
            }
            Symbol::Database(database) => {
                if crate::base::name_eq(name, "table") {
                    if let Some(f) = builtins::find_function("table") {
                        return LookupOutcome::One(Symbol::Function(f.clone()));
                    }
                }
                let mut hits = Vec::new();
                if matches.contains(SymbolMatch::TABLE)
                    && let Some(table) = database.find_table(name)
                {
                    hits.push(Symbol::Table(table.clone()));
                }
                if matches.contains(SymbolMatch::FUNCTION)
                    && let Some(function) = database.find_function(name)
                {
                    hits.push(Symbol::Function(function.clone()));
                }
                if hits.is_empty() && database.is_open {
                    let table = self.session.open.open_table(&database, name);
                    return LookupOutcome::One(Symbol::Table(table));
                }
                LookupOutcome::from_hits(hits)
            }
            Symbol::Table(table) => self.lookup_table_member(&table, name),
            Symbol::Tuple(tuple) => match tuple.find_column(name) {
                Some(column) => LookupOutcome::One(Symbol::Column(column.clone())),
                None => LookupOutcome::NotFound,
            },
            Symbol::Variable(variable) => match &variable.var_type {
                TypeSymbol::Table(table) => self.lookup_table_member(&table.clone(), name),
                _ => LookupOutcome::NotFound,
            },
            _ => LookupOutcome::NotFound,
        }
    }

    fn lookup_table_member(
        &mut self,
        table: &Arc<crate::symbols::TableSymbol>,
        name: &str,
    ) -> LookupOutcome {
        let effective = self.session.open.effective_table(table);
        if let Some(column) = effective.find_column(name) {
            return LookupOutcome::One(Symbol::Column(column.clone()));
        }
        if table.is_open {
            let column = self.session.open.infer_column(table, name);
            return LookupOutcome::One(Symbol::Column(column));
        }
        LookupOutcome::NotFound
    }

    /// Whether a symbol with this kind should surface in the
    /// symbols-in-scope query given the function-kind mask.
    pub(crate) fn function_kind_included(
        symbol: &Symbol,
        include: IncludeFunctionKinds,
    ) -> bool {
        match symbol {
            Symbol::Function(f) => {
                let wanted = match f.origin {
                    crate::symbols::FunctionOrigin::BuiltIn => IncludeFunctionKinds::BUILT_IN,
                    crate::symbols::FunctionOrigin::Database => IncludeFunctionKinds::DATABASE,
                    crate::symbols::FunctionOrigin::Local => IncludeFunctionKinds::LOCAL,
                };
                include.contains(wanted)
            }
            _ => true,
        }
    }
}
