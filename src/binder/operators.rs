//! Per-operator binding rules: each pipe operator consumes the incoming
//! row scope and produces the next one.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::Span;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::symbols::{
    ColumnSymbol, ScalarType, SemanticInfo, Symbol, TableSymbol, TypeSymbol, UnifyStrategy,
};
use crate::syntax::{
    ColumnDecl, Expr, ExprId, JoinCondition, MakeSeriesAggregate, MvExpandItem, NamedParameter,
    Ordering, ParsePatternPart, ProjectionItem, QueryOp, TopNestedLevel,
};

use super::projection::{DeclareOutcome, ProjectionBuilder};
use super::unify::unify_cached;
use super::{Binder, ScopeKind};

/// Accepted values for an operator's named parameter.
struct ParameterRule {
    name: &'static str,
    values: &'static [&'static str],
}

const JOIN_KINDS: ParameterRule = ParameterRule {
    name: "kind",
    values: &[
        "inner",
        "innerunique",
        "leftouter",
        "rightouter",
        "fullouter",
        "leftsemi",
        "rightsemi",
        "leftanti",
        "rightanti",
        "anti",
        "leftantisemi",
        "rightantisemi",
    ],
};

const UNION_KINDS: ParameterRule = ParameterRule {
    name: "kind",
    values: &["inner", "outer"],
};

const BAG_EXPANSION: ParameterRule = ParameterRule {
    name: "bagexpansion",
    values: &["bag", "array"],
};

const PARSE_KINDS: ParameterRule = ParameterRule {
    name: "kind",
    values: &["simple", "regex", "relaxed"],
};

const RENDER_CHARTS: &[&str] = &[
    "table",
    "barchart",
    "columnchart",
    "piechart",
    "timechart",
    "linechart",
    "anomalychart",
    "areachart",
    "scatterchart",
    "ladderchart",
    "pivotchart",
    "timepivot",
    "card",
];

impl Binder<'_> {
    /// Bind one query operator against the current row scope.
    pub(crate) fn bind_query_operator(&mut self, id: ExprId, op: &QueryOp) -> SemanticInfo {
        if self.check_cancelled() {
            return SemanticInfo::error();
        }
        let span = self.tree.span(id);
        match op {
            QueryOp::Filter { predicate } => self.bind_filter(span, *predicate),
            QueryOp::Extend { items } => self.bind_extend(span, items),
            QueryOp::Project { items } => self.bind_project(span, items),
            QueryOp::ProjectAway { columns } => self.bind_project_away(span, columns),
            QueryOp::ProjectKeep { columns } => self.bind_project_keep(span, columns),
            QueryOp::ProjectRename { items } => self.bind_project_rename(span, items),
            QueryOp::ProjectReorder { orderings } => self.bind_project_reorder(span, orderings),
            QueryOp::Summarize { aggregates, by } => self.bind_summarize(span, aggregates, by),
            QueryOp::Distinct { columns } => self.bind_distinct(span, columns),
            QueryOp::Count { as_name } => self.bind_count(span, as_name.as_ref()),
            QueryOp::Take { count } => self.bind_take(span, *count),
            QueryOp::Top { count, by } => self.bind_top(span, *count, by),
            QueryOp::TopHitters { count, of, by } => self.bind_top_hitters(span, *count, *of, *by),
            QueryOp::TopNested { levels } => self.bind_top_nested(span, levels),
            QueryOp::Sort { orderings } => self.bind_sort(span, orderings),
            QueryOp::Sample { count } => self.bind_take(span, *count),
            QueryOp::SampleDistinct { count, of } => self.bind_sample_distinct(span, *count, *of),
            QueryOp::Serialize { items } => self.bind_serialize(span, items),
            QueryOp::As { name } => self.bind_as(span, name),
            QueryOp::Join {
                parameters,
                right,
                on,
            } => self.bind_join(span, parameters, *right, on, false),
            QueryOp::Lookup {
                parameters,
                right,
                on,
            } => self.bind_join(span, parameters, *right, on, true),
            QueryOp::Union { parameters, tables } => self.bind_union(span, parameters, tables),
            QueryOp::DataTable { schema, values } => self.bind_datatable(span, schema, values),
            QueryOp::Range {
                column,
                from,
                to,
                step,
            } => self.bind_range(span, column, *from, *to, *step),
            QueryOp::MvExpand {
                parameters,
                items,
                row_limit,
            } => self.bind_mv_expand(span, parameters, items, *row_limit),
            QueryOp::MvApply {
                items,
                row_limit,
                id_column,
                body,
            } => self.bind_mv_apply(span, items, *row_limit, id_column.as_ref(), *body),
            QueryOp::MakeSeries {
                aggregates,
                on,
                from,
                to,
                step,
                by,
            } => self.bind_make_series(span, aggregates, *on, *from, *to, *step, by),
            QueryOp::Parse {
                parameters,
                source,
                pattern,
            }
            | QueryOp::ParseWhere {
                parameters,
                source,
                pattern,
            } => self.bind_parse(span, parameters, *source, pattern),
            QueryOp::Find {
                parameters,
                tables,
                predicate,
            } => self.bind_find(span, parameters, tables.as_deref(), *predicate),
            QueryOp::Search {
                parameters,
                tables,
                predicate,
            } => self.bind_search(span, parameters, tables.as_deref(), *predicate),
            QueryOp::Fork { branches } => self.bind_fork(span, branches),
            QueryOp::Partition {
                parameters: _,
                by,
                body,
            } => self.bind_partition(span, *by, *body),
            QueryOp::Evaluate { parameters: _, call } => self.bind_evaluate(span, *call),
            QueryOp::Invoke { call } => self.bind_invoke(span, *call),
            QueryOp::Render { chart, parameters } => self.bind_render(span, chart, parameters),
            QueryOp::GetSchema => self.bind_getschema(span),
            QueryOp::Print { items } => self.bind_print(span, items),
            QueryOp::Consume => self.table_info(TableSymbol::schema(Vec::new())),
            QueryOp::ExecuteAndCache => self.bind_passthrough(span),
            QueryOp::Reduce { by, characters } => self.bind_reduce(span, *by, *characters),
        }
    }

    // ------------------------------------------------------------------
    // Shared helpers
    // ------------------------------------------------------------------

    fn table_info(&self, table: Arc<TableSymbol>) -> SemanticInfo {
        SemanticInfo::of_type(TypeSymbol::Table(table))
    }

    /// The incoming row scope; a missing one is a best-effort empty
    /// schema plus a diagnostic.
    fn require_row_scope(&mut self, span: Span) -> (Arc<TableSymbol>, Option<Diagnostic>) {
        match self.effective_row_scope() {
            Some(table) => (table, None),
            None => (
                TableSymbol::schema(Vec::new()),
                Some(Diagnostic::error(
                    DiagnosticKind::TableExpected {
                        actual: "nothing".into(),
                    },
                    span,
                )),
            ),
        }
    }

    /// Bind a sub-expression that must produce a table.
    fn bind_tabular(&mut self, id: ExprId) -> (Option<Arc<TableSymbol>>, Option<Diagnostic>) {
        let info = self.bind_expr(id);
        match &info.result_type {
            TypeSymbol::Table(t) => (Some(t.clone()), None),
            TypeSymbol::Error => (None, None),
            other => (
                None,
                Some(Diagnostic::error(
                    DiagnosticKind::TableExpected {
                        actual: other.display_name(),
                    },
                    self.tree.span(id),
                )),
            ),
        }
    }

    /// Bind a predicate that must be boolean.
    fn bind_predicate(&mut self, id: ExprId) -> Option<Diagnostic> {
        let info = self.bind_expr(id);
        if info.result_type.is_boolean() || info.result_type.is_error() {
            None
        } else {
            Some(Diagnostic::error(
                DiagnosticKind::BooleanExpected {
                    actual: info.result_type.display_name(),
                },
                self.tree.span(id),
            ))
        }
    }

    /// Validate an operator's named parameters against a rule set.
    fn check_parameters(
        &mut self,
        parameters: &[NamedParameter],
        rules: &[&ParameterRule],
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        for parameter in parameters {
            let Some(rule) = rules
                .iter()
                .find(|r| crate::base::name_eq(r.name, &parameter.name))
            else {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::UnknownNamedArgument {
                        name: parameter.name.clone(),
                    },
                    self.tree.span(parameter.value),
                ));
                continue;
            };
            if rule.values.is_empty() {
                self.bind_expr(parameter.value);
                continue;
            }
            let text = self.tree.literal_text(parameter.value);
            let ok = text
                .as_ref()
                .is_some_and(|t| rule.values.iter().any(|v| crate::base::name_eq(v, t)));
            if !ok {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::ValueNotAllowed {
                        values: rule.values.iter().map(|v| SmolStr::from(*v)).collect(),
                    },
                    self.tree.span(parameter.value),
                ));
            }
        }
    }

    fn parameter_text(&self, parameters: &[NamedParameter], name: &str) -> Option<SmolStr> {
        parameters
            .iter()
            .find(|p| crate::base::name_eq(&p.name, name))
            .and_then(|p| self.tree.literal_text(p.value))
    }

    /// The output column for a projection item: explicit name, derived
    /// name, or a positional fallback.
    fn item_column(
        &mut self,
        item: &ProjectionItem,
        ordinal: usize,
        fallback_prefix: &str,
    ) -> (Arc<ColumnSymbol>, TypeSymbol) {
        let info = self.bind_expr(item.value);
        let ty = info.result_type.clone();
        let name = item
            .name
            .clone()
            .or_else(|| self.derived_result_name(item.value))
            .unwrap_or_else(|| SmolStr::from(format!("{fallback_prefix}{ordinal}")));
        (ColumnSymbol::new(name, ty), info.result_type.clone())
    }

    fn with_diags(mut info: SemanticInfo, diagnostics: Vec<Diagnostic>) -> SemanticInfo {
        info.diagnostics.extend(diagnostics);
        info
    }

    // ------------------------------------------------------------------
    // Row-scope-preserving operators
    // ------------------------------------------------------------------

    fn bind_filter(&mut self, span: Span, predicate: ExprId) -> SemanticInfo {
        let (_, scope_diag) = self.require_row_scope(span);
        let predicate_diag = self.bind_predicate(predicate);
        // the predicate may have inferred columns on an open scope
        let (table, _) = self.require_row_scope(span);
        let mut diagnostics = Vec::new();
        diagnostics.extend(scope_diag);
        diagnostics.extend(predicate_diag);
        Self::with_diags(self.table_info(table), diagnostics)
    }

    fn bind_passthrough(&mut self, span: Span) -> SemanticInfo {
        let (table, diag) = self.require_row_scope(span);
        Self::with_diags(self.table_info(table), diag.into_iter().collect())
    }

    fn bind_take(&mut self, span: Span, count: ExprId) -> SemanticInfo {
        let (table, scope_diag) = self.require_row_scope(span);
        let info = self.bind_expr(count);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        if !matches!(
            info.result_type.as_scalar(),
            Some(s) if s.is_integer() || s == ScalarType::Dynamic
        ) && !info.result_type.is_error()
        {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::TypeExpected {
                    expected: "long".into(),
                    actual: info.result_type.display_name(),
                },
                self.tree.span(count),
            ));
        }
        Self::with_diags(self.table_info(table), diagnostics)
    }

    fn bind_sort(&mut self, span: Span, orderings: &[Ordering]) -> SemanticInfo {
        let (table, scope_diag) = self.require_row_scope(span);
        for ordering in orderings {
            self.bind_expr(ordering.expr);
        }
        Self::with_diags(self.table_info(table), scope_diag.into_iter().collect())
    }

    fn bind_top(&mut self, span: Span, count: ExprId, by: &[Ordering]) -> SemanticInfo {
        let info = self.bind_take(span, count);
        for ordering in by {
            self.bind_expr(ordering.expr);
        }
        info
    }

    fn bind_serialize(&mut self, span: Span, items: &[ProjectionItem]) -> SemanticInfo {
        if items.is_empty() {
            return self.bind_passthrough(span);
        }
        self.bind_extend(span, items)
    }

    fn bind_as(&mut self, span: Span, name: &SmolStr) -> SemanticInfo {
        let (table, diag) = self.require_row_scope(span);
        // downstream statements can refer to the pipeline by this name
        let named = Arc::new(TableSymbol {
            name: name.clone(),
            columns: table.columns.clone(),
            is_open: table.is_open,
        });
        self.local_scope
            .declare_as(name.clone(), Symbol::Table(named.clone()));
        Self::with_diags(self.table_info(named), diag.into_iter().collect())
    }

    fn bind_render(
        &mut self,
        span: Span,
        chart: &SmolStr,
        parameters: &[NamedParameter],
    ) -> SemanticInfo {
        let (table, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        if !RENDER_CHARTS.iter().any(|c| crate::base::name_eq(c, chart)) {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::ValueNotAllowed {
                    values: RENDER_CHARTS.iter().map(|v| SmolStr::from(*v)).collect(),
                },
                span,
            ));
        }
        for parameter in parameters {
            self.bind_expr(parameter.value);
        }
        Self::with_diags(self.table_info(table), diagnostics)
    }

    // ------------------------------------------------------------------
    // Projection operators
    // ------------------------------------------------------------------

    fn bind_extend(&mut self, span: Span, items: &[ProjectionItem]) -> SemanticInfo {
        let (table, scope_diag) = self.require_row_scope(span);
        let mut builder = ProjectionBuilder::from_columns(&table.columns);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        for (ordinal, item) in items.iter().enumerate() {
            let (column, ty) = self.item_column(item, ordinal + 1, "Column");
            if ty.is_table() {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::TypeExpected {
                        expected: "scalar".into(),
                        actual: ty.display_name(),
                    },
                    self.tree.span(item.value),
                ));
                continue;
            }
            builder.declare(column, true);
        }
        Self::with_diags(self.table_info(builder.into_table()), diagnostics)
    }

    fn bind_project(&mut self, span: Span, items: &[ProjectionItem]) -> SemanticInfo {
        let (table, scope_diag) = self.require_row_scope(span);
        let mut builder = ProjectionBuilder::new();
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        for (ordinal, item) in items.iter().enumerate() {
            // `*` re-emits every declared and inferred row-scope column
            if matches!(self.tree.expr(item.value), Expr::Star) {
                self.bind_expr(item.value);
                for column in &table.columns {
                    builder.declare(column.clone(), true);
                }
                continue;
            }
            let (column, _) = self.item_column(item, ordinal + 1, "Column");
            if item.name.is_some() {
                if builder.declare(column.clone(), false) == DeclareOutcome::Duplicate {
                    diagnostics.push(Diagnostic::error(
                        DiagnosticKind::DuplicateColumnDeclaration {
                            name: column.name.clone(),
                        },
                        self.tree.span(item.value),
                    ));
                }
            } else {
                builder.add(column, false, false);
            }
        }
        Self::with_diags(self.table_info(builder.into_table()), diagnostics)
    }

    fn bind_project_away(&mut self, span: Span, columns: &[ExprId]) -> SemanticInfo {
        let (table, scope_diag) = self.require_row_scope(span);
        let mut builder = ProjectionBuilder::from_columns(&table.columns);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        for column in columns {
            let Some(name) = self.tree.as_name(*column).cloned() else {
                self.bind_expr(*column);
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::ColumnRequired,
                    self.tree.span(*column),
                ));
                continue;
            };
            self.bind_expr(*column);
            if !builder.remove(&name) {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::RenameSourceNotFound { name },
                    self.tree.span(*column),
                ));
            }
        }
        Self::with_diags(self.table_info(builder.into_table()), diagnostics)
    }

    fn bind_project_keep(&mut self, span: Span, columns: &[ExprId]) -> SemanticInfo {
        let (table, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        let mut kept: Vec<SmolStr> = Vec::new();
        for column in columns {
            let Some(name) = self.tree.as_name(*column).cloned() else {
                self.bind_expr(*column);
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::ColumnRequired,
                    self.tree.span(*column),
                ));
                continue;
            };
            self.bind_expr(*column);
            if table.find_column(&name).is_none() {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::RenameSourceNotFound { name: name.clone() },
                    self.tree.span(*column),
                ));
            } else {
                kept.push(name);
            }
        }
        // keep row-scope declaration order
        let columns = table
            .columns
            .iter()
            .filter(|c| kept.iter().any(|k| crate::base::name_eq(k, &c.name)))
            .cloned()
            .collect();
        Self::with_diags(self.table_info(TableSymbol::schema(columns)), diagnostics)
    }

    fn bind_project_rename(&mut self, span: Span, items: &[ProjectionItem]) -> SemanticInfo {
        let (table, scope_diag) = self.require_row_scope(span);
        let mut builder = ProjectionBuilder::from_columns(&table.columns);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        for item in items {
            // rename is strictly name-to-name
            let source = self.tree.as_name(item.value).cloned();
            self.bind_expr(item.value);
            let (Some(new_name), Some(old_name)) = (item.name.clone(), source) else {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::ColumnRequired,
                    self.tree.span(item.value),
                ));
                continue;
            };
            if !builder.rename(&old_name, new_name) {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::RenameSourceNotFound { name: old_name },
                    self.tree.span(item.value),
                ));
            }
        }
        Self::with_diags(self.table_info(builder.into_table()), diagnostics)
    }

    fn bind_project_reorder(&mut self, span: Span, orderings: &[Ordering]) -> SemanticInfo {
        let (table, scope_diag) = self.require_row_scope(span);
        let mut builder = ProjectionBuilder::from_columns(&table.columns);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        let mut front = 0usize;
        for ordering in orderings {
            let Some(name) = self.tree.as_name(ordering.expr).cloned() else {
                self.bind_expr(ordering.expr);
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::ColumnRequired,
                    self.tree.span(ordering.expr),
                ));
                continue;
            };
            self.bind_expr(ordering.expr);
            if !builder.move_to_front(&name, &mut front) {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::RenameSourceNotFound { name },
                    self.tree.span(ordering.expr),
                ));
            }
        }
        Self::with_diags(self.table_info(builder.into_table()), diagnostics)
    }

    fn bind_distinct(&mut self, span: Span, columns: &[ExprId]) -> SemanticInfo {
        let (table, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        if columns.len() == 1 && matches!(self.tree.expr(columns[0]), Expr::Star) {
            self.bind_expr(columns[0]);
            return Self::with_diags(self.table_info(table), diagnostics);
        }
        let mut builder = ProjectionBuilder::new();
        for column in columns {
            let info = self.bind_expr(*column);
            match &info.referenced {
                Some(Symbol::Column(c)) => {
                    builder.declare(c.clone(), false);
                }
                _ if info.result_type.is_error() => {}
                _ => diagnostics.push(Diagnostic::error(
                    DiagnosticKind::ColumnRequired,
                    self.tree.span(*column),
                )),
            }
        }
        Self::with_diags(self.table_info(builder.into_table()), diagnostics)
    }

    // ------------------------------------------------------------------
    // Aggregation operators
    // ------------------------------------------------------------------

    fn bind_summarize(
        &mut self,
        span: Span,
        aggregates: &[ProjectionItem],
        by: &[ProjectionItem],
    ) -> SemanticInfo {
        let (_, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        let mut builder = ProjectionBuilder::new();

        // `by` items bind in normal scope and declare the group keys
        for (ordinal, item) in by.iter().enumerate() {
            let (column, _) = self.item_column(item, ordinal + 1, "Column");
            if builder.declare(column.clone(), false) == DeclareOutcome::Duplicate {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::DuplicateColumnDeclaration {
                        name: column.name.clone(),
                    },
                    self.tree.span(item.value),
                ));
            }
        }

        // aggregate items bind in aggregate scope
        let saved = self.scope_kind;
        self.scope_kind = ScopeKind::Aggregate;
        for (ordinal, item) in aggregates.iter().enumerate() {
            let (column, _) = self.item_column(item, by.len() + ordinal + 1, "Column");
            if item.name.is_some() {
                if builder.declare(column.clone(), false) == DeclareOutcome::Duplicate {
                    diagnostics.push(Diagnostic::error(
                        DiagnosticKind::DuplicateColumnDeclaration {
                            name: column.name.clone(),
                        },
                        self.tree.span(item.value),
                    ));
                }
            } else {
                builder.add(column, false, false);
            }
        }
        self.scope_kind = saved;

        Self::with_diags(self.table_info(builder.into_table()), diagnostics)
    }

    fn bind_count(&mut self, span: Span, as_name: Option<&SmolStr>) -> SemanticInfo {
        let (_, scope_diag) = self.require_row_scope(span);
        let name = as_name.cloned().unwrap_or_else(|| SmolStr::from("Count"));
        let table = TableSymbol::schema(vec![ColumnSymbol::scalar(name, ScalarType::Long)]);
        Self::with_diags(self.table_info(table), scope_diag.into_iter().collect())
    }

    fn bind_top_hitters(
        &mut self,
        span: Span,
        count: ExprId,
        of: ExprId,
        by: Option<ExprId>,
    ) -> SemanticInfo {
        let (_, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        self.bind_expr(count);
        let of_info = self.bind_expr(of);
        if let Some(by) = by {
            self.bind_expr(by);
        }
        let of_name = match self.tree.as_name(of) {
            Some(name) => name.clone(),
            None => {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::ColumnRequired,
                    self.tree.span(of),
                ));
                SmolStr::from("Column1")
            }
        };
        let counted = SmolStr::from(format!("approximate_count_{of_name}"));
        let table = TableSymbol::schema(vec![
            ColumnSymbol::new(of_name, of_info.result_type.clone()),
            ColumnSymbol::scalar(counted, ScalarType::Long),
        ]);
        Self::with_diags(self.table_info(table), diagnostics)
    }

    fn bind_top_nested(&mut self, span: Span, levels: &[TopNestedLevel]) -> SemanticInfo {
        let (_, scope_diag) = self.require_row_scope(span);
        let diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        let mut builder = ProjectionBuilder::new();
        for (ordinal, level) in levels.iter().enumerate() {
            if let Some(count) = level.count {
                self.bind_expr(count);
            }
            if let Some(others) = level.with_others {
                self.bind_expr(others);
            }
            let (of_column, _) = self.item_column(&level.of, ordinal * 2 + 1, "Column");
            builder.add(of_column, false, false);

            let saved = self.scope_kind;
            self.scope_kind = ScopeKind::Aggregate;
            let (agg_column, _) = self.item_column(&level.by, ordinal * 2 + 2, "aggregated_");
            self.scope_kind = saved;
            builder.add(agg_column, false, false);
        }
        Self::with_diags(self.table_info(builder.into_table()), diagnostics)
    }

    fn bind_sample_distinct(&mut self, span: Span, count: ExprId, of: ExprId) -> SemanticInfo {
        let (_, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        self.bind_expr(count);
        let info = self.bind_expr(of);
        let column = match &info.referenced {
            Some(Symbol::Column(c)) => c.clone(),
            _ => {
                if !info.result_type.is_error() {
                    diagnostics.push(Diagnostic::error(
                        DiagnosticKind::ColumnRequired,
                        self.tree.span(of),
                    ));
                }
                ColumnSymbol::new("Column1", info.result_type.clone())
            }
        };
        Self::with_diags(
            self.table_info(TableSymbol::schema(vec![column])),
            diagnostics,
        )
    }

    // ------------------------------------------------------------------
    // Sources
    // ------------------------------------------------------------------

    fn bind_datatable(
        &mut self,
        span: Span,
        schema: &[ColumnDecl],
        values: &[ExprId],
    ) -> SemanticInfo {
        let mut diagnostics = Vec::new();
        let columns: Vec<Arc<ColumnSymbol>> = schema
            .iter()
            .map(|decl| {
                let ty = match ScalarType::from_name(&decl.type_name) {
                    Some(scalar) => TypeSymbol::Scalar(scalar),
                    None => {
                        diagnostics.push(Diagnostic::error(
                            DiagnosticKind::InvalidTypeExpression,
                            span,
                        ));
                        TypeSymbol::Error
                    }
                };
                ColumnSymbol::new(decl.name.clone(), ty)
            })
            .collect();

        if !schema.is_empty() && values.len() % schema.len() != 0 {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::DataTableValueCountMismatch {
                    columns: schema.len(),
                    values: values.len(),
                },
                span,
            ));
        }

        for (index, value) in values.iter().enumerate() {
            let info = self.bind_expr(*value);
            if !info.is_constant && !info.result_type.is_error() {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::ConstantRequired,
                    self.tree.span(*value),
                ));
                continue;
            }
            if let Some(column) = columns.get(index % columns.len().max(1))
                && !info.result_type.is_error()
                && !column.column_type.is_error()
                && !crate::symbols::type_assignable(
                    &info.result_type,
                    &column.column_type,
                    crate::symbols::Conversion::Promotable,
                )
                && !info.result_type.is_dynamic()
            {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::TypeExpected {
                        expected: column.column_type.display_name(),
                        actual: info.result_type.display_name(),
                    },
                    self.tree.span(*value),
                ));
            }
        }

        Self::with_diags(self.table_info(TableSymbol::schema(columns)), diagnostics)
    }

    fn bind_range(
        &mut self,
        _span: Span,
        column: &SmolStr,
        from: ExprId,
        to: ExprId,
        step: ExprId,
    ) -> SemanticInfo {
        let mut diagnostics = Vec::new();
        for id in [from, to, step] {
            let info = self.bind_expr(id);
            let ok = matches!(
                info.result_type.as_scalar(),
                Some(s) if s.is_summable() || s == ScalarType::Dynamic
            );
            if !ok && !info.result_type.is_error() {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::TypeExpected {
                        expected: "number, datetime or timespan".into(),
                        actual: info.result_type.display_name(),
                    },
                    self.tree.span(id),
                ));
            }
        }
        // the output column takes the step expression's type
        let step_type = self.semantics.result_type(step);
        let table = TableSymbol::schema(vec![ColumnSymbol::new(column.clone(), step_type)]);
        Self::with_diags(self.table_info(table), diagnostics)
    }

    fn bind_print(&mut self, span: Span, items: &[ProjectionItem]) -> SemanticInfo {
        let _ = span;
        let mut builder = ProjectionBuilder::new();
        for (ordinal, item) in items.iter().enumerate() {
            let info = self.bind_expr(item.value);
            let name = item
                .name
                .clone()
                .unwrap_or_else(|| SmolStr::from(format!("print_{ordinal}")));
            builder.add(
                ColumnSymbol::new(name, info.result_type.clone()),
                false,
                false,
            );
        }
        self.table_info(builder.into_table())
    }

    fn bind_getschema(&mut self, span: Span) -> SemanticInfo {
        let (_, scope_diag) = self.require_row_scope(span);
        let table = TableSymbol::schema(vec![
            ColumnSymbol::scalar("ColumnName", ScalarType::String),
            ColumnSymbol::scalar("ColumnOrdinal", ScalarType::Long),
            ColumnSymbol::scalar("DataType", ScalarType::String),
            ColumnSymbol::scalar("ColumnType", ScalarType::String),
        ]);
        Self::with_diags(self.table_info(table), scope_diag.into_iter().collect())
    }

    fn bind_reduce(&mut self, span: Span, by: ExprId, characters: Option<ExprId>) -> SemanticInfo {
        let (_, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        let info = self.bind_expr(by);
        if !matches!(
            info.result_type.as_scalar(),
            Some(ScalarType::String) | Some(ScalarType::Dynamic)
        ) && !info.result_type.is_error()
        {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::TypeExpected {
                    expected: "string".into(),
                    actual: info.result_type.display_name(),
                },
                self.tree.span(by),
            ));
        }
        if let Some(characters) = characters {
            self.bind_expr(characters);
        }
        let table = TableSymbol::schema(vec![
            ColumnSymbol::scalar("Pattern", ScalarType::String),
            ColumnSymbol::scalar("Count", ScalarType::Long),
            ColumnSymbol::scalar("Representative", ScalarType::String),
        ]);
        Self::with_diags(self.table_info(table), diagnostics)
    }

    // ------------------------------------------------------------------
    // Joins and unions
    // ------------------------------------------------------------------

    fn bind_join(
        &mut self,
        span: Span,
        parameters: &[NamedParameter],
        right: ExprId,
        on: &[JoinCondition],
        is_lookup: bool,
    ) -> SemanticInfo {
        let (left, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        self.check_parameters(parameters, &[&JOIN_KINDS], &mut diagnostics);

        // the right side binds without the left row scope
        let saved_row = self.row_scope.take();
        let (right_table, right_diag) = self.bind_tabular(right);
        self.row_scope = saved_row;
        diagnostics.extend(right_diag);
        let right_table = right_table.unwrap_or_else(|| TableSymbol::schema(Vec::new()));

        if on.is_empty() && is_lookup {
            diagnostics.push(Diagnostic::error(DiagnosticKind::MissingJoinOnClause, span));
        }

        // `on` conditions see both sides ($left/$right)
        let mut key_names: Vec<SmolStr> = Vec::new();
        let saved_right = self.right_row_scope.replace(right_table.clone());
        for condition in on {
            match condition {
                JoinCondition::Column(name) => {
                    if left.find_column(name).is_none() || right_table.find_column(name).is_none() {
                        diagnostics.push(Diagnostic::error(
                            DiagnosticKind::RenameSourceNotFound { name: name.clone() },
                            span,
                        ));
                    }
                    key_names.push(name.clone());
                }
                JoinCondition::Expr(id) => {
                    let diag = self.bind_predicate(*id);
                    diagnostics.extend(diag);
                }
            }
        }
        self.right_row_scope = saved_right;

        let kind = self
            .parameter_text(parameters, "kind")
            .unwrap_or_else(|| SmolStr::from("innerunique"));

        let output = if matches!(kind.as_str(), "leftsemi" | "leftanti" | "anti" | "leftantisemi") {
            left.clone()
        } else if matches!(kind.as_str(), "rightsemi" | "rightanti" | "rightantisemi") {
            right_table.clone()
        } else {
            // left columns, then right columns uniquified with numeric
            // suffixes; lookup drops the right copy of each key
            let mut builder = ProjectionBuilder::from_columns(&left.columns);
            for column in &right_table.columns {
                let is_key = key_names.iter().any(|k| crate::base::name_eq(k, &column.name));
                if is_lookup && is_key {
                    continue;
                }
                builder.add(column.clone(), false, false);
            }
            builder.into_table()
        };

        Self::with_diags(self.table_info(output), diagnostics)
    }

    fn bind_union(
        &mut self,
        span: Span,
        parameters: &[NamedParameter],
        tables: &[ExprId],
    ) -> SemanticInfo {
        let mut diagnostics = Vec::new();
        self.check_parameters(parameters, &[&UNION_KINDS], &mut diagnostics);

        let mut inputs: Vec<Arc<TableSymbol>> = Vec::new();
        // a piped union includes the incoming row scope first
        if let Some(current) = self.effective_row_scope() {
            inputs.push(current);
        }
        for table in tables {
            let (bound, diag) = self.bind_tabular(*table);
            diagnostics.extend(diag);
            if let Some(bound) = bound {
                inputs.push(bound);
            }
        }
        if inputs.is_empty() {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::TableExpected {
                    actual: "nothing".into(),
                },
                span,
            ));
            return Self::with_diags(
                self.table_info(TableSymbol::schema(Vec::new())),
                diagnostics,
            );
        }

        let kind = self
            .parameter_text(parameters, "kind")
            .unwrap_or_else(|| SmolStr::from("outer"));
        let strategy = if crate::base::name_eq(&kind, "inner") {
            UnifyStrategy::CommonColumns
        } else {
            UnifyStrategy::ByNameAndType
        };
        let catalog = self.catalog.clone();
        let unified = unify_cached(strategy, &inputs, &catalog, self.cache);
        Self::with_diags(self.table_info(unified), diagnostics)
    }

    // ------------------------------------------------------------------
    // Expansion-shaped operators
    // ------------------------------------------------------------------

    fn bind_mv_expand(
        &mut self,
        span: Span,
        parameters: &[NamedParameter],
        items: &[MvExpandItem],
        row_limit: Option<ExprId>,
    ) -> SemanticInfo {
        let (table, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        self.check_parameters(parameters, &[&BAG_EXPANSION], &mut diagnostics);
        if let Some(limit) = row_limit {
            self.bind_expr(limit);
        }

        let mut builder = ProjectionBuilder::from_columns(&table.columns);
        for (ordinal, item) in items.iter().enumerate() {
            let info = self.bind_expr(item.value);
            let ty = match &item.to_type {
                Some(type_expr) => {
                    let type_expr = type_expr.clone();
                    let resolved = self.resolve_type_expr(&type_expr, item.value);
                    if resolved.is_error() {
                        diagnostics.push(Diagnostic::error(
                            DiagnosticKind::InvalidTypeExpression,
                            self.tree.span(item.value),
                        ));
                    }
                    resolved
                }
                // expanding a dynamic array yields dynamic elements
                None => TypeSymbol::DYNAMIC,
            };
            let name = item
                .name
                .clone()
                .or_else(|| self.derived_result_name(item.value))
                .unwrap_or_else(|| SmolStr::from(format!("Column{}", ordinal + 1)));
            if !info.result_type.is_dynamic() && !info.result_type.is_error() {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::TypeExpected {
                        expected: "dynamic".into(),
                        actual: info.result_type.display_name(),
                    },
                    self.tree.span(item.value),
                ));
            }
            builder.declare(ColumnSymbol::new(name, ty), true);
        }
        Self::with_diags(self.table_info(builder.into_table()), diagnostics)
    }

    fn bind_mv_apply(
        &mut self,
        span: Span,
        items: &[MvExpandItem],
        row_limit: Option<ExprId>,
        id_column: Option<&SmolStr>,
        body: ExprId,
    ) -> SemanticInfo {
        let (table, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        if let Some(limit) = row_limit {
            self.bind_expr(limit);
        }

        // the inner pipeline sees a table of just the applied columns
        let mut inner_columns: Vec<Arc<ColumnSymbol>> = Vec::new();
        for (ordinal, item) in items.iter().enumerate() {
            self.bind_expr(item.value);
            let ty = match &item.to_type {
                Some(type_expr) => {
                    let type_expr = type_expr.clone();
                    self.resolve_type_expr(&type_expr, item.value)
                }
                None => TypeSymbol::DYNAMIC,
            };
            let name = item
                .name
                .clone()
                .or_else(|| self.derived_result_name(item.value))
                .unwrap_or_else(|| SmolStr::from(format!("Column{}", ordinal + 1)));
            inner_columns.push(ColumnSymbol::new(name, ty));
        }
        if let Some(id_name) = id_column {
            inner_columns.push(ColumnSymbol::scalar(id_name.clone(), ScalarType::Long));
        }

        let inner_table = TableSymbol::schema(inner_columns);
        let saved = self.row_scope.replace(inner_table);
        let (body_table, body_diag) = self.bind_tabular(body);
        self.row_scope = saved;
        diagnostics.extend(body_diag);

        // outer columns plus whatever the inner pipeline produced
        let mut builder = ProjectionBuilder::from_columns(&table.columns);
        if let Some(body_table) = body_table {
            for column in &body_table.columns {
                builder.declare(column.clone(), true);
            }
        }
        Self::with_diags(self.table_info(builder.into_table()), diagnostics)
    }

    #[allow(clippy::too_many_arguments)]
    fn bind_make_series(
        &mut self,
        span: Span,
        aggregates: &[MakeSeriesAggregate],
        on: ExprId,
        from: Option<ExprId>,
        to: Option<ExprId>,
        step: ExprId,
        by: &[ProjectionItem],
    ) -> SemanticInfo {
        let (_, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        let mut builder = ProjectionBuilder::new();

        // group keys first
        for (ordinal, item) in by.iter().enumerate() {
            let (column, _) = self.item_column(item, ordinal + 1, "Column");
            builder.add(column, false, false);
        }

        // the axis column
        let on_info = self.bind_expr(on);
        if !matches!(
            on_info.result_type.as_scalar(),
            Some(s) if s.is_summable() || s == ScalarType::Dynamic
        ) && !on_info.result_type.is_error()
        {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::TypeExpected {
                    expected: "number, datetime or timespan".into(),
                    actual: on_info.result_type.display_name(),
                },
                self.tree.span(on),
            ));
        }
        let axis_name = self
            .derived_result_name(on)
            .unwrap_or_else(|| SmolStr::from("Axis"));
        builder.add(
            ColumnSymbol::new(axis_name, TypeSymbol::DYNAMIC),
            false,
            false,
        );

        for bound in [from, to] {
            if let Some(bound) = bound {
                self.bind_expr(bound);
            }
        }
        self.bind_expr(step);

        // series values become dynamic arrays
        let saved = self.scope_kind;
        self.scope_kind = ScopeKind::Aggregate;
        for (ordinal, aggregate) in aggregates.iter().enumerate() {
            let (column, _) = self.item_column(&aggregate.item, ordinal + 1, "Column");
            if let Some(default) = aggregate.default {
                self.bind_expr(default);
            }
            builder.add(column.with_type(TypeSymbol::DYNAMIC), false, false);
        }
        self.scope_kind = saved;

        Self::with_diags(self.table_info(builder.into_table()), diagnostics)
    }

    fn bind_parse(
        &mut self,
        span: Span,
        parameters: &[NamedParameter],
        source: ExprId,
        pattern: &[ParsePatternPart],
    ) -> SemanticInfo {
        let (table, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        self.check_parameters(parameters, &[&PARSE_KINDS], &mut diagnostics);

        let source_info = self.bind_expr(source);
        if !matches!(
            source_info.result_type.as_scalar(),
            Some(ScalarType::String) | Some(ScalarType::Dynamic)
        ) && !source_info.result_type.is_error()
        {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::TypeExpected {
                    expected: "string".into(),
                    actual: source_info.result_type.display_name(),
                },
                self.tree.span(source),
            ));
        }

        let mut builder = ProjectionBuilder::from_columns(&table.columns);
        for part in pattern {
            let ParsePatternPart::Column { name, type_name } = part else {
                continue;
            };
            let ty = match type_name {
                Some(type_name) => match ScalarType::from_name(type_name) {
                    Some(scalar) => TypeSymbol::Scalar(scalar),
                    None => {
                        diagnostics.push(Diagnostic::error(
                            DiagnosticKind::InvalidTypeExpression,
                            span,
                        ));
                        TypeSymbol::Error
                    }
                },
                None => TypeSymbol::STRING,
            };
            let column = ColumnSymbol::new(name.clone(), ty);
            if builder.declare(column, false) == DeclareOutcome::Duplicate {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::DuplicateColumnDeclaration { name: name.clone() },
                    span,
                ));
            }
        }
        Self::with_diags(self.table_info(builder.into_table()), diagnostics)
    }

    // ------------------------------------------------------------------
    // Multi-table scans
    // ------------------------------------------------------------------

    /// Candidate tables for find/search: the explicit `in (…)` list or
    /// the current database's tables.
    fn candidate_tables(
        &mut self,
        explicit: Option<&[ExprId]>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Arc<TableSymbol>> {
        match explicit {
            Some(ids) => {
                let mut tables = Vec::new();
                for id in ids {
                    let (table, diag) = self.bind_tabular(*id);
                    diagnostics.extend(diag);
                    if let Some(table) = table {
                        tables.push(table);
                    }
                }
                tables
            }
            None => self.catalog.current_database().tables.clone(),
        }
    }

    fn bind_find(
        &mut self,
        span: Span,
        _parameters: &[NamedParameter],
        tables: Option<&[ExprId]>,
        predicate: ExprId,
    ) -> SemanticInfo {
        let _ = span;
        let mut diagnostics = Vec::new();
        let candidates = self.candidate_tables(tables, &mut diagnostics);
        let catalog = self.catalog.clone();
        let unified = unify_cached(UnifyStrategy::ByName, &candidates, &catalog, self.cache);

        let saved = self.row_scope.replace(unified.clone());
        let diag = self.bind_predicate(predicate);
        let scope_after = self.effective_row_scope().unwrap_or(unified);
        self.row_scope = saved;
        diagnostics.extend(diag);

        Self::with_diags(self.table_info(scope_after), diagnostics)
    }

    fn bind_search(
        &mut self,
        span: Span,
        _parameters: &[NamedParameter],
        tables: Option<&[ExprId]>,
        predicate: ExprId,
    ) -> SemanticInfo {
        let _ = span;
        let mut diagnostics = Vec::new();
        // a piped search scans the incoming row scope; otherwise the
        // explicit list or the whole database
        let candidates = match (tables, self.effective_row_scope()) {
            (None, Some(current)) => vec![current],
            _ => self.candidate_tables(tables, &mut diagnostics),
        };
        let catalog = self.catalog.clone();
        let unified = unify_cached(
            UnifyStrategy::ByNameAndType,
            &candidates,
            &catalog,
            self.cache,
        );

        let saved = self.row_scope.replace(unified.clone());
        let info = self.bind_expr(predicate);
        // a bare string term is a full-text predicate
        let ok = info.result_type.is_boolean()
            || matches!(info.result_type.as_scalar(), Some(ScalarType::String))
            || info.result_type.is_error();
        if !ok {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::BooleanExpected {
                    actual: info.result_type.display_name(),
                },
                self.tree.span(predicate),
            ));
        }
        let scope_after = self.effective_row_scope().unwrap_or(unified);
        self.row_scope = saved;

        // leading source column, then the unified schema
        let mut columns = vec![ColumnSymbol::scalar("$table", ScalarType::String)];
        columns.extend(scope_after.columns.iter().cloned());
        Self::with_diags(self.table_info(TableSymbol::schema(columns)), diagnostics)
    }

    // ------------------------------------------------------------------
    // Structural operators
    // ------------------------------------------------------------------

    fn bind_fork(&mut self, span: Span, branches: &[crate::syntax::ForkBranch]) -> SemanticInfo {
        let (input, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();
        let mut last: Option<Arc<TableSymbol>> = None;
        for branch in branches {
            let saved = self.row_scope.replace(input.clone());
            let (table, diag) = self.bind_tabular(branch.pipeline);
            self.row_scope = saved;
            diagnostics.extend(diag);
            if let Some(table) = table {
                let named = match &branch.name {
                    Some(name) => Arc::new(TableSymbol {
                        name: name.clone(),
                        columns: table.columns.clone(),
                        is_open: table.is_open,
                    }),
                    None => table,
                };
                last = Some(named);
            }
        }
        let output = last.unwrap_or_else(|| TableSymbol::schema(Vec::new()));
        Self::with_diags(self.table_info(output), diagnostics)
    }

    fn bind_partition(&mut self, span: Span, by: ExprId, body: ExprId) -> SemanticInfo {
        let (input, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();

        let by_info = self.bind_expr(by);
        if !matches!(by_info.referenced, Some(Symbol::Column(_)))
            && !by_info.result_type.is_error()
        {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::ColumnRequired,
                self.tree.span(by),
            ));
        }

        let saved = self.row_scope.replace(input);
        let (body_table, diag) = self.bind_tabular(body);
        self.row_scope = saved;
        diagnostics.extend(diag);

        let output = body_table.unwrap_or_else(|| TableSymbol::schema(Vec::new()));
        Self::with_diags(self.table_info(output), diagnostics)
    }

    fn bind_evaluate(&mut self, span: Span, call: ExprId) -> SemanticInfo {
        let (_, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();

        let saved = self.scope_kind;
        self.scope_kind = ScopeKind::PlugIn;
        let info = self.bind_expr(call);
        self.scope_kind = saved;

        let output = match &info.result_type {
            TypeSymbol::Table(t) => t.clone(),
            TypeSymbol::Error => TableSymbol::schema(Vec::new()),
            other => {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::TableExpected {
                        actual: other.display_name(),
                    },
                    self.tree.span(call),
                ));
                TableSymbol::schema(Vec::new())
            }
        };
        Self::with_diags(self.table_info(output), diagnostics)
    }

    fn bind_invoke(&mut self, span: Span, call: ExprId) -> SemanticInfo {
        let (input, scope_diag) = self.require_row_scope(span);
        let mut diagnostics: Vec<Diagnostic> = scope_diag.into_iter().collect();

        // the piped input becomes the function's first argument
        let Expr::Call { callee, args } = self.tree.expr(call).clone() else {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::NotAFunction {
                    name: "<expression>".into(),
                },
                self.tree.span(call),
            ));
            return Self::with_diags(
                self.table_info(TableSymbol::schema(Vec::new())),
                diagnostics,
            );
        };

        let info = self.bind_invoke_call(call, callee, &args, input);
        let output = match &info.result_type {
            TypeSymbol::Table(t) => t.clone(),
            TypeSymbol::Error => TableSymbol::schema(Vec::new()),
            other => {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::TableExpected {
                        actual: other.display_name(),
                    },
                    self.tree.span(call),
                ));
                TableSymbol::schema(Vec::new())
            }
        };
        let mut result = Self::with_diags(self.table_info(output), diagnostics);
        result.expansion = info.expansion.clone();
        result
    }
}
