//! Position queries: the symbols visible at a cursor, and the row scope
//! in effect there.
//!
//! Both run a full bind with a probe position; while binding, the
//! binder snapshots its scope context at the innermost node containing
//! the position (preferring the preceding token on a boundary).

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::symbols::{Catalog, Symbol, SymbolMatch, TableSymbol};
use crate::syntax::{ExprId, SyntaxTree};

use super::lookup::IncludeFunctionKinds;
use super::{Binder, ScopeKind, Session};

/// A snapshot of the binder's scope context at one tree position.
#[derive(Debug, Clone)]
pub struct ScopeCapture {
    pub row_scope: Option<Arc<TableSymbol>>,
    pub right_row_scope: Option<Arc<TableSymbol>>,
    pub locals: Vec<Symbol>,
    pub scope_kind: ScopeKind,
    pub(crate) span_len: u32,
    pub(crate) at_token_end: bool,
}

impl Binder<'_> {
    /// Snapshot the scope context when this node contains the probe.
    pub(crate) fn probe_position(&mut self, id: ExprId) {
        let Some(position) = self.position_probe else {
            return;
        };
        let span = self.tree.span(id);
        if span.is_empty_default() || !span.contains(position) {
            return;
        }
        let span_len = span.len();
        let at_token_end = span.end() == position;
        let better = match &self.capture {
            None => true,
            Some(existing) => {
                span_len < existing.span_len
                    || (span_len == existing.span_len
                        && (at_token_end || !existing.at_token_end))
            }
        };
        if better {
            self.capture = Some(ScopeCapture {
                row_scope: self.effective_row_scope(),
                right_row_scope: self.right_row_scope.clone(),
                locals: self.local_scope.symbols(),
                scope_kind: self.scope_kind,
                span_len,
                at_token_end,
            });
        }
    }

    /// The symbols visible at `position`, filtered by the match mask
    /// and the function-origin mask. `None` only on cancellation.
    pub fn symbols_in_scope(
        tree: &SyntaxTree,
        position: u32,
        catalog: &Catalog,
        matches: SymbolMatch,
        include: IncludeFunctionKinds,
        cancellation: Option<CancellationToken>,
    ) -> Option<Vec<Symbol>> {
        let capture = Self::capture_at(tree, position, catalog, cancellation)?;
        let mut symbols = Vec::new();

        if matches.contains(SymbolMatch::COLUMN)
            && let Some(row) = &capture.row_scope
        {
            for column in &row.columns {
                symbols.push(Symbol::Column(column.clone()));
            }
        }
        if matches.contains(SymbolMatch::COLUMN)
            && let Some(right) = &capture.right_row_scope
        {
            for column in &right.columns {
                symbols.push(Symbol::Column(column.clone()));
            }
        }

        for symbol in &capture.locals {
            if matches.accepts(symbol.kind())
                && Self::function_kind_included(symbol, include)
            {
                symbols.push(symbol.clone());
            }
        }

        let database = catalog.current_database();
        if matches.contains(SymbolMatch::TABLE) {
            for table in &database.tables {
                symbols.push(Symbol::Table(table.clone()));
            }
        }
        if matches.contains(SymbolMatch::FUNCTION)
            && include.contains(IncludeFunctionKinds::DATABASE)
        {
            for function in &database.functions {
                symbols.push(Symbol::Function(function.clone()));
            }
        }
        if matches.contains(SymbolMatch::DATABASE) {
            for db in &catalog.current_cluster().databases {
                symbols.push(Symbol::Database(db.clone()));
            }
        }
        if matches.contains(SymbolMatch::FUNCTION)
            && include.contains(IncludeFunctionKinds::BUILT_IN)
        {
            if capture.scope_kind == ScopeKind::Aggregate {
                for aggregate in crate::builtins::AGGREGATES.iter() {
                    symbols.push(Symbol::Function(aggregate.clone()));
                }
            }
            for function in crate::builtins::FUNCTIONS.iter() {
                symbols.push(Symbol::Function(function.clone()));
            }
        }

        Some(symbols)
    }

    /// The row scope at `position`: what a piped operator written there
    /// would see. `None` on cancellation or outside any row context.
    pub fn row_scope_at(
        tree: &SyntaxTree,
        position: u32,
        catalog: &Catalog,
        cancellation: Option<CancellationToken>,
    ) -> Option<Arc<TableSymbol>> {
        Self::capture_at(tree, position, catalog, cancellation)?.row_scope
    }

    fn capture_at(
        tree: &SyntaxTree,
        position: u32,
        catalog: &Catalog,
        cancellation: Option<CancellationToken>,
    ) -> Option<ScopeCapture> {
        let cache = catalog.cache().clone();
        let mut guard = cache.lock();
        let mut session = Session::new(cancellation);
        let mut binder = Binder::new(tree, catalog.clone(), &mut *guard, &mut session);
        binder.position_probe = Some(position);
        binder.bind_statements(tree.statements());
        if binder.session.cancelled {
            return None;
        }
        let fallback = ScopeCapture {
            row_scope: None,
            right_row_scope: None,
            locals: binder.local_scope.symbols(),
            scope_kind: ScopeKind::Normal,
            span_len: u32::MAX,
            at_token_end: false,
        };
        Some(binder.capture.take().unwrap_or(fallback))
    }
}
