//! Inline expansion of computed-return function bodies.
//!
//! A call site is fingerprinted by its signature plus every parameter's
//! (name, bound type, constness, constant value); identical call sites
//! share one expansion. Bodies that call `table(...)` unqualified are
//! never cached; stored-function expansions with variable returns go to
//! the per-catalog cache, everything else stays local to the bind.

use std::sync::Arc;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::symbols::{
    ArgumentFingerprint, CallSiteFingerprint, ClusterSymbol, DatabaseSymbol, Expansion,
    FunctionBody, FunctionBodyFacts, FunctionOrigin, PatternSymbol, SemanticInfo, SemanticMap,
    Signature, Symbol, TypeSymbol, VariableSymbol,
};
use crate::syntax::{Argument, ExprId, FunctionBlock, Literal, SyntaxTree};

use super::matcher::{ArgumentInfo, map_arguments};
use super::scopes::LocalScope;
use super::{Binder, ScopeKind};

impl Binder<'_> {
    /// Expand a computed-return signature for the given call-site
    /// arguments; returns the computed type and the expansion used.
    pub(crate) fn expand_signature(
        &mut self,
        signature: &Arc<Signature>,
        origin: FunctionOrigin,
        args: &[ArgumentInfo],
    ) -> (TypeSymbol, Option<Arc<Expansion>>) {
        // a body known not to vary never needs re-expansion
        if let Some(facts) = signature.body_facts()
            && !facts.has(FunctionBodyFacts::VARIABLE_RETURN)
            && let Some(ty) = signature.non_variable_return()
        {
            return (ty.clone(), None);
        }

        let fingerprint = self.call_site_fingerprint(signature, args);

        if let Some(cached) = self.session.local_cache.expansions.get(&fingerprint) {
            tracing::trace!(function = %signature.symbol_name, "local expansion cache hit");
            return cached_result(signature, cached);
        }
        if let Some(cached) = self.cache.expansions.get(&fingerprint) {
            tracing::trace!(function = %signature.symbol_name, "global expansion cache hit");
            return cached_result(signature, &cached.clone());
        }

        // cycle: already expanding this signature somewhere up-stack
        let key = Arc::as_ptr(signature) as usize;
        if !self.session.local_cache.expanding.insert(key) {
            tracing::debug!(
                function = %signature.symbol_name,
                "recursive expansion cut off"
            );
            return (
                signature
                    .non_variable_return()
                    .cloned()
                    .unwrap_or(TypeSymbol::Error),
                None,
            );
        }

        let outcome = self.run_expansion(signature, origin, args);
        self.session.local_cache.expanding.remove(&key);

        let (result_type, expansion, facts) = match outcome {
            Some(parts) => parts,
            None => {
                // body unavailable (no parser, or parse failure): cache
                // the absence so the probe is not repeated
                self.session
                    .local_cache
                    .expansions
                    .insert(fingerprint, None);
                let fallback = signature
                    .non_variable_return()
                    .cloned()
                    .unwrap_or(TypeSymbol::Error);
                return (fallback, None);
            }
        };

        signature.set_body_facts(facts);
        if !facts.has(FunctionBodyFacts::VARIABLE_RETURN) {
            signature.set_non_variable_return(result_type.clone());
        }

        let expansion = Arc::new(expansion);
        if facts.has(FunctionBodyFacts::UNQUALIFIED_TABLE) {
            // resolution depends on dynamic scope: never cached
        } else if origin == FunctionOrigin::Database
            && facts.has(FunctionBodyFacts::VARIABLE_RETURN)
        {
            self.cache
                .expansions
                .insert(fingerprint, Some(expansion.clone()));
        } else {
            self.session
                .local_cache
                .expansions
                .insert(fingerprint, Some(expansion.clone()));
        }

        (result_type, Some(expansion))
    }

    /// Parse (if needed) and bind the body under a derived context.
    fn run_expansion(
        &mut self,
        signature: &Arc<Signature>,
        origin: FunctionOrigin,
        args: &[ArgumentInfo],
    ) -> Option<(TypeSymbol, Expansion, FunctionBodyFacts)> {
        let body = signature.computed_body()?;

        // stored functions bind in their owning database's context
        let derived_catalog = if origin == FunctionOrigin::Database {
            match self.owning_database(signature) {
                Some((cluster, database)) => self.catalog.with_current(cluster, database),
                None => self.catalog.clone(),
            }
        } else {
            self.catalog.clone()
        };

        // a local function sees the scope it was declared in; a stored
        // function starts from its database alone
        let locals = self.expansion_locals(signature, origin, args);

        match body {
            FunctionBody::Block(block) => {
                let block = block.clone();
                let (ty, semantics, result, facts) =
                    self.bind_body_block(self.tree, derived_catalog, locals, &block.statements);
                Some((
                    ty.clone(),
                    Expansion {
                        tree: None,
                        result,
                        result_type: ty,
                        semantics,
                    },
                    self.finish_facts(signature, facts),
                ))
            }
            FunctionBody::Parsed(tree) => {
                let tree = tree.clone();
                let statements: Vec<_> = tree.statements().to_vec();
                let (ty, semantics, result, facts) =
                    self.bind_body_block(&tree, derived_catalog, locals, &statements);
                Some((
                    ty.clone(),
                    Expansion {
                        tree: Some(tree),
                        result,
                        result_type: ty,
                        semantics,
                    },
                    self.finish_facts(signature, facts),
                ))
            }
            FunctionBody::Text(text) => {
                let text = text.clone();
                let parser = self.catalog.body_parser()?.clone();
                let tree = Arc::new(parser.parse(&text)?);
                let statements: Vec<_> = tree.statements().to_vec();
                let (ty, semantics, result, facts) =
                    self.bind_body_block(&tree, derived_catalog, locals, &statements);
                Some((
                    ty.clone(),
                    Expansion {
                        tree: Some(tree),
                        result,
                        result_type: ty,
                        semantics,
                    },
                    self.finish_facts(signature, facts),
                ))
            }
        }
    }

    /// Bind a body's statements in a derived binder sharing this
    /// session and the locked global cache.
    fn bind_body_block(
        &mut self,
        tree: &SyntaxTree,
        catalog: crate::symbols::Catalog,
        locals: LocalScope,
        statements: &[crate::syntax::Statement],
    ) -> (TypeSymbol, SemanticMap, Option<ExprId>, FunctionBodyFacts) {
        let mut child = Binder {
            tree,
            catalog,
            cache: &mut *self.cache,
            session: &mut *self.session,
            semantics: SemanticMap::new(),
            local_scope: locals,
            row_scope: None,
            right_row_scope: None,
            path_scope: None,
            scope_kind: ScopeKind::Normal,
            facts_stack: vec![FunctionBodyFacts::NONE],
            position_probe: None,
            capture: None,
        };
        let ty = child
            .bind_statements(statements)
            .unwrap_or(TypeSymbol::Error);
        let facts = child.facts_stack.pop().unwrap_or_default();
        let result = statements.iter().rev().find_map(|s| match s {
            crate::syntax::Statement::Expr(id) => Some(*id),
            _ => None,
        });
        (ty, child.semantics, result, facts)
    }

    /// Merge child facts upward and decide variability.
    fn finish_facts(
        &mut self,
        signature: &Arc<Signature>,
        mut facts: FunctionBodyFacts,
    ) -> FunctionBodyFacts {
        // the return varies when the body sees argument-dependent state
        if !signature.parameters.is_empty()
            || facts.has(FunctionBodyFacts::UNQUALIFIED_TABLE)
        {
            facts.set(FunctionBodyFacts::VARIABLE_RETURN);
        }
        // propagate into the enclosing expansion, if any
        if let Some(top) = self.facts_stack.last_mut() {
            *top = top.union(facts);
        }
        facts
    }

    /// The expansion's local scope: the outer scope (local functions
    /// only) plus a fresh layer of parameters bound to the call's
    /// argument types (constants when the argument was a literal).
    fn expansion_locals(
        &self,
        signature: &Arc<Signature>,
        origin: FunctionOrigin,
        args: &[ArgumentInfo],
    ) -> LocalScope {
        let mapping = map_arguments(signature, args);
        let mut locals = if origin == FunctionOrigin::Local {
            let mut outer = self.local_scope.clone();
            outer.push_layer();
            outer
        } else {
            LocalScope::new()
        };
        for (index, parameter) in signature.parameters.iter().enumerate() {
            let arg = mapping
                .iter()
                .position(|slot| *slot == Some(index))
                .map(|pos| &args[pos]);
            let var_type = match arg {
                Some(a) => a.arg_type.clone(),
                None => parameter
                    .declared_types
                    .first()
                    .cloned()
                    .unwrap_or(TypeSymbol::DYNAMIC),
            };
            let symbol = match arg {
                Some(a) if a.is_constant => Symbol::Variable(VariableSymbol::constant(
                    parameter.name.clone(),
                    var_type,
                    a.literal.clone(),
                )),
                _ => Symbol::Variable(VariableSymbol::new(parameter.name.clone(), var_type)),
            };
            locals.declare(symbol);
        }
        locals
    }

    /// The call-site identity for expansion caching.
    fn call_site_fingerprint(
        &self,
        signature: &Arc<Signature>,
        args: &[ArgumentInfo],
    ) -> CallSiteFingerprint {
        let mapping = map_arguments(signature, args);
        let arguments = signature
            .parameters
            .iter()
            .enumerate()
            .map(|(index, parameter)| {
                let arg = mapping
                    .iter()
                    .position(|slot| *slot == Some(index))
                    .map(|pos| &args[pos]);
                ArgumentFingerprint {
                    name: parameter.name.clone(),
                    type_key: arg
                        .map(|a| a.arg_type.cache_key())
                        .unwrap_or_else(|| "<default>".to_string()),
                    is_constant: arg.is_some_and(|a| a.is_constant),
                    constant: arg
                        .and_then(|a| a.literal.as_ref())
                        .map(render_literal),
                }
            })
            .collect();
        CallSiteFingerprint {
            signature: Arc::as_ptr(signature) as usize,
            arguments,
        }
    }

    /// The cluster/database that own a stored function's signature.
    fn owning_database(
        &self,
        signature: &Arc<Signature>,
    ) -> Option<(Arc<ClusterSymbol>, Arc<DatabaseSymbol>)> {
        for cluster in self.catalog.clusters() {
            for database in &cluster.databases {
                for function in &database.functions {
                    if function
                        .signatures
                        .iter()
                        .any(|s| Arc::ptr_eq(s, signature))
                    {
                        return Some((cluster.clone(), database.clone()));
                    }
                }
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Pattern invocation
    // ------------------------------------------------------------------

    /// Bind `P(args)` against a pattern's literal-matched declarations.
    pub(crate) fn bind_pattern_call(
        &mut self,
        id: ExprId,
        pattern: &Arc<PatternSymbol>,
        args: &[Argument],
    ) -> SemanticInfo {
        let span = self.tree.span(id);

        let literals: Vec<Option<Literal>> = args
            .iter()
            .map(|arg| {
                self.bind_expr(arg.value);
                self.tree.as_literal(arg.value).cloned()
            })
            .collect();

        if literals.iter().any(|l| l.is_none()) {
            return SemanticInfo::error().with_diagnostic(Diagnostic::error(
                DiagnosticKind::LiteralRequired,
                span,
            ));
        }
        let literals: Vec<Literal> = literals.into_iter().flatten().collect();

        // declarations match on the exact literal argument tuple
        let declaration = pattern.spec.declarations.iter().find(|d| {
            d.values.len() == literals.len()
                && d.values.iter().zip(literals.iter()).all(|(a, b)| a == b)
        });
        let Some(declaration) = declaration else {
            return SemanticInfo::error().with_diagnostic(Diagnostic::error(
                DiagnosticKind::NoPatternMatch {
                    name: pattern.name.clone(),
                },
                span,
            ));
        };

        let (ty, semantics, result) =
            self.bind_pattern_body(pattern, declaration, &literals);
        let expansion = Arc::new(Expansion {
            tree: None,
            result,
            result_type: ty.clone(),
            semantics,
        });
        let mut info =
            SemanticInfo::referencing(Symbol::Pattern(pattern.clone()), ty);
        info.expansion = Some(expansion);
        info
    }

    fn bind_pattern_body(
        &mut self,
        pattern: &Arc<PatternSymbol>,
        declaration: &crate::syntax::PatternDeclaration,
        literals: &[Literal],
    ) -> (TypeSymbol, SemanticMap, Option<ExprId>) {
        let mut locals = self.local_scope.clone();
        locals.push_layer();
        for (parameter, literal) in pattern.spec.parameters.iter().zip(literals.iter()) {
            let ty = literal_type(literal);
            locals.declare(Symbol::Variable(VariableSymbol::constant(
                parameter.name.clone(),
                ty,
                Some(literal.clone()),
            )));
        }
        if let (Some(path_param), Some(path_value)) =
            (&pattern.spec.path_parameter, &declaration.path_value)
        {
            locals.declare(Symbol::Variable(VariableSymbol::constant(
                path_param.name.clone(),
                TypeSymbol::STRING,
                Some(Literal::String(path_value.clone())),
            )));
        }

        let block: &FunctionBlock = &declaration.body;
        let (ty, semantics, result, _facts) = self.bind_body_block(
            self.tree,
            self.catalog.clone(),
            locals,
            &block.statements.clone(),
        );
        (ty, semantics, result)
    }
}

fn cached_result(
    signature: &Arc<Signature>,
    cached: &Option<Arc<Expansion>>,
) -> (TypeSymbol, Option<Arc<Expansion>>) {
    match cached {
        Some(expansion) => (expansion.result_type.clone(), Some(expansion.clone())),
        None => (
            signature
                .non_variable_return()
                .cloned()
                .unwrap_or(TypeSymbol::Error),
            None,
        ),
    }
}

fn render_literal(literal: &Literal) -> String {
    format!("{literal:?}")
}

fn literal_type(literal: &Literal) -> TypeSymbol {
    match literal {
        Literal::Bool(_) => TypeSymbol::BOOL,
        Literal::Int(_) => TypeSymbol::INT,
        Literal::Long(_) => TypeSymbol::LONG,
        Literal::Real(_) => TypeSymbol::REAL,
        Literal::Decimal(_) => TypeSymbol::DECIMAL,
        Literal::String(_) => TypeSymbol::STRING,
        Literal::DateTime(_) => TypeSymbol::DATETIME,
        Literal::TimeSpan(_) => TypeSymbol::TIMESPAN,
        Literal::Dynamic(_) | Literal::Null => TypeSymbol::DYNAMIC,
        Literal::Guid(_) => TypeSymbol::GUID,
    }
}
