//! The binder: name resolution, overload resolution, schema inference.
//!
//! A [`Binder::bind`] call walks the tree bottom-up, attaching a
//! [`SemanticInfo`] to every expression node through a side table, and
//! threading a row scope left-to-right across piped query operators.
//! Semantic failures become diagnostics, never errors; the only way to
//! get nothing back is cancellation.

mod expand;
mod expr;
mod lookup;
mod matcher;
mod operators;
mod position;
mod projection;
mod returns;
mod scopes;
mod unify;

use std::sync::Arc;

use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;

use crate::diagnostics::Diagnostic;
use crate::symbols::{
    BindingCacheData, Catalog, ColumnSymbol, FunctionBody, FunctionBodyFacts, FunctionOrigin,
    FunctionSymbol, Parameter, PatternSymbol, ReturnKind, Signature, Symbol, TableSymbol,
    TypeSymbol, VariableSymbol,
};
pub use crate::symbols::{SemanticInfo, SemanticMap};
use crate::syntax::{
    DeclaredParam, ExprId, LetValue, Statement, SyntaxTree, TypeExpr,
};

pub use lookup::IncludeFunctionKinds;
pub use matcher::{ArgumentInfo, MatchKind, MatchResult, get_best_matching};
pub use position::ScopeCapture;
pub use projection::{DeclareOutcome, ProjectionBuilder};
pub use scopes::{LocalBindingCache, LocalScope, OpenEntities, ScopeKind};
pub use unify::{common_columns, unify_by_name, unify_by_name_and_type, unify_cached};

// ============================================================================
// OPTIONS AND RESULTS
// ============================================================================

/// Knobs for a [`Binder::bind`] call.
#[derive(Default, Clone)]
pub struct BinderOptions {
    /// Cooperative cancellation; checked at statement and operator
    /// boundaries.
    pub cancellation: Option<CancellationToken>,
}

/// The outcome of binding a tree.
#[derive(Debug)]
pub struct BindResult {
    /// Per-node semantic info.
    pub semantics: SemanticMap,
    /// The result type of the final expression statement, if any.
    pub result_type: Option<TypeSymbol>,
}

impl BindResult {
    /// All diagnostics, in node order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.semantics.diagnostics()
    }
}

// ============================================================================
// SESSION STATE
// ============================================================================

/// Mutable state shared across a binding session, including recursive
/// expansion passes.
pub(crate) struct Session {
    pub local_cache: LocalBindingCache,
    pub open: OpenEntities,
    pub cancellation: Option<CancellationToken>,
    pub cancelled: bool,
}

impl Session {
    fn new(cancellation: Option<CancellationToken>) -> Self {
        Self {
            local_cache: LocalBindingCache::new(),
            open: OpenEntities::default(),
            cancellation,
            cancelled: false,
        }
    }
}

// ============================================================================
// THE BINDER
// ============================================================================

/// One binding pass over one tree.
///
/// Expansion recursion creates a derived binder over the function body
/// (possibly a different tree) sharing the session and the locked
/// global cache.
pub struct Binder<'a> {
    pub(crate) tree: &'a SyntaxTree,
    pub(crate) catalog: Catalog,
    pub(crate) cache: &'a mut BindingCacheData,
    pub(crate) session: &'a mut Session,
    pub(crate) semantics: SemanticMap,

    // scope context
    pub(crate) local_scope: LocalScope,
    pub(crate) row_scope: Option<Arc<TableSymbol>>,
    pub(crate) right_row_scope: Option<Arc<TableSymbol>>,
    pub(crate) path_scope: Option<Symbol>,
    pub(crate) scope_kind: ScopeKind,

    // facts collection for the innermost expansion in progress
    pub(crate) facts_stack: Vec<FunctionBodyFacts>,

    // position queries
    pub(crate) position_probe: Option<u32>,
    pub(crate) capture: Option<ScopeCapture>,
}

impl<'a> Binder<'a> {
    fn new(
        tree: &'a SyntaxTree,
        catalog: Catalog,
        cache: &'a mut BindingCacheData,
        session: &'a mut Session,
    ) -> Self {
        Self {
            tree,
            catalog,
            cache,
            session,
            semantics: SemanticMap::new(),
            local_scope: LocalScope::new(),
            row_scope: None,
            right_row_scope: None,
            path_scope: None,
            scope_kind: ScopeKind::Normal,
            facts_stack: Vec::new(),
            position_probe: None,
            capture: None,
        }
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// Bind a whole tree against a catalog. Returns `None` only when
    /// cancelled; semantic problems surface as diagnostics.
    pub fn bind(tree: &SyntaxTree, catalog: &Catalog, options: &BinderOptions) -> Option<BindResult> {
        let cache = catalog.cache().clone();
        let mut guard = cache.lock();
        let mut session = Session::new(options.cancellation.clone());
        let mut binder = Binder::new(tree, catalog.clone(), &mut *guard, &mut session);
        let result_type = binder.bind_statements(tree.statements());
        if binder.session.cancelled {
            return None;
        }
        Some(BindResult {
            semantics: binder.semantics,
            result_type,
        })
    }

    /// Resolve a signature's declared return type, expanding a computed
    /// body when necessary.
    pub fn computed_return_type(signature: &Arc<Signature>, catalog: &Catalog) -> TypeSymbol {
        let cache = catalog.cache().clone();
        let mut guard = cache.lock();
        let mut session = Session::new(None);
        let empty = SyntaxTree::default();
        let mut binder = Binder::new(&empty, catalog.clone(), &mut *guard, &mut session);
        match &signature.return_kind {
            ReturnKind::Declared(t) => t.clone(),
            ReturnKind::Computed(_) => {
                let (ty, _expansion) =
                    binder.expand_signature(signature, FunctionOrigin::Database, &[]);
                ty
            }
            // non-declared kinds need a call site; without one the
            // best answer is the cached non-variable type
            _ => signature
                .non_variable_return()
                .cloned()
                .unwrap_or(TypeSymbol::Error),
        }
    }

    // ------------------------------------------------------------------
    // Cancellation
    // ------------------------------------------------------------------

    pub(crate) fn check_cancelled(&mut self) -> bool {
        if self.session.cancelled {
            return true;
        }
        if let Some(token) = &self.session.cancellation
            && token.is_cancelled()
        {
            self.session.cancelled = true;
            return true;
        }
        false
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Bind a statement block; the result is the final expression
    /// statement's type.
    pub(crate) fn bind_statements(&mut self, statements: &[Statement]) -> Option<TypeSymbol> {
        let mut result = None;
        for statement in statements {
            if self.check_cancelled() {
                return None;
            }
            match statement {
                Statement::Let { name, value, .. } => self.bind_let(name, value),
                Statement::Pattern { name, spec, .. } => {
                    let symbol = PatternSymbol::new(name.clone(), spec.clone());
                    self.local_scope.declare_as(name.clone(), Symbol::Pattern(symbol));
                }
                Statement::Expr(id) => {
                    let info = self.bind_expr(*id);
                    result = Some(info.result_type.clone());
                }
            }
        }
        result
    }

    fn bind_let(&mut self, name: &SmolStr, value: &LetValue) {
        match value {
            LetValue::Expr(id) => {
                let info = self.bind_expr(*id);
                // a let naming a catalog entity keeps the entity itself
                // visible (database aliases, table shorthands)
                let symbol = match &info.referenced {
                    Some(Symbol::Database(db)) => Symbol::Database(db.clone()),
                    Some(Symbol::Cluster(c)) => Symbol::Cluster(c.clone()),
                    Some(Symbol::Function(f)) if !matches!(info.result_type, TypeSymbol::Table(_)) => {
                        Symbol::Function(f.clone())
                    }
                    _ => {
                        if info.is_constant {
                            Symbol::Variable(VariableSymbol::constant(
                                name.clone(),
                                info.result_type.clone(),
                                info.constant_value.clone(),
                            ))
                        } else {
                            Symbol::Variable(VariableSymbol::new(
                                name.clone(),
                                info.result_type.clone(),
                            ))
                        }
                    }
                };
                self.local_scope.declare_as(name.clone(), symbol);
            }
            LetValue::Function(decl) => {
                let parameters = decl
                    .parameters
                    .iter()
                    .map(|p| self.declared_parameter(p))
                    .collect();
                let signature = Signature::with_named_arguments(
                    name.clone(),
                    parameters,
                    ReturnKind::Computed(FunctionBody::Block(decl.body.clone())),
                );
                let function = FunctionSymbol::new(name.clone(), vec![signature], FunctionOrigin::Local);
                self.local_scope
                    .declare_as(name.clone(), Symbol::Function(function));
            }
        }
    }

    /// Resolve a declared parameter (`x: long`, `t: (a: long)`,
    /// `t: (*)`) into a signature parameter.
    pub(crate) fn declared_parameter(&mut self, declared: &DeclaredParam) -> Parameter {
        let ty = self.resolve_type_expr(&declared.type_expr, ExprId(0));
        Parameter::declared(declared.name.clone(), vec![ty])
    }

    /// Resolve a type expression; unknown scalar names become the error
    /// sentinel (callers carrying a node attach the diagnostic).
    pub(crate) fn resolve_type_expr(&mut self, type_expr: &TypeExpr, _at: ExprId) -> TypeSymbol {
        match type_expr {
            TypeExpr::Scalar(name) => match crate::symbols::ScalarType::from_name(name) {
                Some(scalar) => TypeSymbol::Scalar(scalar),
                None => TypeSymbol::Error,
            },
            TypeExpr::Table(decls) => {
                let columns: Vec<Arc<ColumnSymbol>> = decls
                    .iter()
                    .map(|d| {
                        let ty = match crate::symbols::ScalarType::from_name(&d.type_name) {
                            Some(scalar) => TypeSymbol::Scalar(scalar),
                            None => TypeSymbol::Error,
                        };
                        ColumnSymbol::new(d.name.clone(), ty)
                    })
                    .collect();
                TypeSymbol::Table(TableSymbol::schema(columns))
            }
            TypeExpr::OpenTable => TypeSymbol::Table(TableSymbol::open("", Vec::new())),
        }
    }

    // ------------------------------------------------------------------
    // Row-scope helpers
    // ------------------------------------------------------------------

    /// The current row scope with any columns inferred so far appended.
    pub(crate) fn effective_row_scope(&self) -> Option<Arc<TableSymbol>> {
        self.row_scope
            .as_ref()
            .map(|t| self.session.open.effective_table(t))
    }

    /// Record semantic info for a node.
    pub(crate) fn set_info(&mut self, id: ExprId, info: SemanticInfo) -> Arc<SemanticInfo> {
        self.semantics.set(id, info)
    }

    /// Record facts discovered while expanding a body.
    pub(crate) fn note_fact(&mut self, fact: FunctionBodyFacts) {
        if let Some(top) = self.facts_stack.last_mut() {
            top.set(fact);
        }
    }
}

