//! Return-type resolution: dispatch on a signature's return kind.

use std::sync::Arc;

use crate::symbols::{
    CustomReturnContext, Expansion, FunctionSymbol, Parameter, ParameterTypeKind, ReturnKind,
    ScalarType, Signature, Symbol, TypeSymbol, common_scalar, widest_numeric,
};
use crate::syntax::{Expr, Literal};

use super::matcher::{ArgumentInfo, map_arguments};
use super::Binder;

impl Binder<'_> {
    /// Resolve a non-computed return kind.
    ///
    /// Returns the type, never an expansion, and — for the catalog
    /// accessor kinds — the entity symbol the call denotes.
    pub(crate) fn resolve_return_type(
        &mut self,
        signature: &Arc<Signature>,
        args: &[ArgumentInfo],
        container: Option<&Symbol>,
    ) -> (TypeSymbol, Option<Arc<Expansion>>, Option<Symbol>) {
        let mapping = map_arguments(signature, args);
        let arg_for_param = |index: usize| -> Option<&ArgumentInfo> {
            mapping
                .iter()
                .position(|slot| *slot == Some(index))
                .map(|pos| &args[pos])
        };

        match &signature.return_kind {
            ReturnKind::Declared(t) => (t.clone(), None, None),
            ReturnKind::Parameter0 => (param_type(signature, arg_for_param(0), 0), None, None),
            ReturnKind::Parameter1 => (param_type(signature, arg_for_param(1), 1), None, None),
            ReturnKind::Parameter2 => (param_type(signature, arg_for_param(2), 2), None, None),
            ReturnKind::ParameterN => {
                let last = signature.parameters.len().saturating_sub(1);
                (param_type(signature, arg_for_param(last), last), None, None)
            }
            ReturnKind::ParameterNLiteral => {
                let last = signature.parameters.len().saturating_sub(1);
                let ty = arg_for_param(last)
                    .map(|arg| self.type_literal_of(arg))
                    .unwrap_or(TypeSymbol::Error);
                (ty, None, None)
            }
            ReturnKind::Parameter0Promoted => {
                let ty = match param_type(signature, arg_for_param(0), 0) {
                    TypeSymbol::Scalar(ScalarType::Int) => TypeSymbol::LONG,
                    TypeSymbol::Scalar(ScalarType::Decimal) => TypeSymbol::REAL,
                    other => other,
                };
                (ty, None, None)
            }
            ReturnKind::Common => {
                let constrained: Vec<TypeSymbol> = args
                    .iter()
                    .zip(mapping.iter())
                    .filter(|(_, slot)| {
                        slot.and_then(|i| signature.parameters.get(i))
                            .is_some_and(is_common_parameter)
                    })
                    .map(|(a, _)| a.arg_type.clone())
                    .collect();
                let pool = if constrained.is_empty() {
                    args.iter().map(|a| a.arg_type.clone()).collect()
                } else {
                    constrained
                };
                let ty = common_scalar(pool.iter())
                    .map(TypeSymbol::Scalar)
                    .unwrap_or(TypeSymbol::Error);
                (ty, None, None)
            }
            ReturnKind::Widest => {
                let types: Vec<TypeSymbol> = args.iter().map(|a| a.arg_type.clone()).collect();
                let ty = widest_numeric(types.iter())
                    .map(TypeSymbol::Scalar)
                    .unwrap_or(TypeSymbol::Error);
                (ty, None, None)
            }
            ReturnKind::Parameter0Cluster => {
                let (symbol, ty) = self.resolve_cluster_literal(args.first());
                (ty, None, symbol)
            }
            ReturnKind::Parameter0Database => {
                let (symbol, ty) = self.resolve_database_literal(args.first(), container);
                (ty, None, symbol)
            }
            ReturnKind::Parameter0Table => {
                let (symbol, ty) = self.resolve_table_literal(args.first(), container);
                (ty, None, symbol)
            }
            ReturnKind::Custom(custom) => {
                let argument_types: Vec<TypeSymbol> =
                    args.iter().map(|a| a.arg_type.clone()).collect();
                let argument_literals: Vec<Option<Literal>> =
                    args.iter().map(|a| a.literal.clone()).collect();
                let row_scope = self.effective_row_scope();
                let context = CustomReturnContext {
                    argument_types: &argument_types,
                    argument_literals: &argument_literals,
                    row_scope: row_scope.as_ref(),
                };
                ((custom)(&context), None, None)
            }
            ReturnKind::Computed(_) => {
                // handled by resolve_return_with_expansion; reaching here
                // means no call context (ambiguity tie) — fall back
                let ty = signature
                    .non_variable_return()
                    .cloned()
                    .unwrap_or(TypeSymbol::Error);
                (ty, None, None)
            }
        }
    }

    /// Resolve a selected signature's return for a function call,
    /// expanding computed bodies.
    pub(crate) fn resolve_return_with_expansion(
        &mut self,
        function: &Arc<FunctionSymbol>,
        signature: &Arc<Signature>,
        args: &[ArgumentInfo],
        container: Option<&Symbol>,
    ) -> (TypeSymbol, Option<Arc<Expansion>>, Option<Symbol>) {
        if signature.is_computed() {
            let (ty, expansion) = self.expand_signature(signature, function.origin, args);
            (ty, expansion, None)
        } else {
            self.resolve_return_type(signature, args, container)
        }
    }

    /// The denoted type of a `typeof(...)` argument.
    fn type_literal_of(&mut self, arg: &ArgumentInfo) -> TypeSymbol {
        let Some(id) = arg.expr else {
            return TypeSymbol::Error;
        };
        match self.tree.expr(id) {
            Expr::TypeOf(type_expr) => {
                let type_expr = type_expr.clone();
                self.resolve_type_expr(&type_expr, id)
            }
            _ => TypeSymbol::Error,
        }
    }

    // ------------------------------------------------------------------
    // Catalog accessor literals
    // ------------------------------------------------------------------

    fn resolve_cluster_literal(
        &mut self,
        arg: Option<&ArgumentInfo>,
    ) -> (Option<Symbol>, TypeSymbol) {
        let Some(name) = literal_text(arg) else {
            return (None, TypeSymbol::Error);
        };
        if let Some(cluster) = self.catalog.find_cluster(&name) {
            return (Some(Symbol::Cluster(cluster.clone())), TypeSymbol::Void);
        }
        // unknown clusters are always synthesized open: the outer
        // catalog cannot enumerate the universe of clusters
        let open = self.session.open.open_cluster(&name);
        (Some(Symbol::Cluster(open)), TypeSymbol::Void)
    }

    fn resolve_database_literal(
        &mut self,
        arg: Option<&ArgumentInfo>,
        container: Option<&Symbol>,
    ) -> (Option<Symbol>, TypeSymbol) {
        let cluster = match container {
            Some(Symbol::Cluster(c)) => c.clone(),
            _ => self.catalog.current_cluster().clone(),
        };
        let Some(name) = literal_text(arg) else {
            // `database()` with no argument denotes the current database
            let db = self.catalog.current_database().clone();
            return (Some(Symbol::Database(db)), TypeSymbol::Void);
        };
        if let Some(db) = cluster.find_database(&name) {
            return (Some(Symbol::Database(db.clone())), TypeSymbol::Void);
        }
        if cluster.is_open {
            let db = self.session.open.open_database(&cluster, &name);
            return (Some(Symbol::Database(db)), TypeSymbol::Void);
        }
        (None, TypeSymbol::Error)
    }

    fn resolve_table_literal(
        &mut self,
        arg: Option<&ArgumentInfo>,
        container: Option<&Symbol>,
    ) -> (Option<Symbol>, TypeSymbol) {
        let database = match container {
            Some(Symbol::Database(d)) => d.clone(),
            _ => self.catalog.current_database().clone(),
        };
        let Some(name) = literal_text(arg) else {
            return (None, TypeSymbol::Error);
        };
        if let Some(table) = database.find_table(&name) {
            return (
                Some(Symbol::Table(table.clone())),
                TypeSymbol::Table(table.clone()),
            );
        }
        if database.is_open {
            let table = self.session.open.open_table(&database, &name);
            return (Some(Symbol::Table(table.clone())), TypeSymbol::Table(table));
        }
        (None, TypeSymbol::Error)
    }
}

fn is_common_parameter(parameter: &Parameter) -> bool {
    matches!(
        parameter.type_kind,
        ParameterTypeKind::CommonScalar
            | ParameterTypeKind::CommonScalarOrDynamic
            | ParameterTypeKind::CommonNumber
            | ParameterTypeKind::CommonSummable
    )
}

/// An argument's bound type, falling back to the parameter's first
/// declared type when the optional argument is absent.
fn param_type(
    signature: &Signature,
    arg: Option<&ArgumentInfo>,
    index: usize,
) -> TypeSymbol {
    match arg {
        Some(arg) => arg.arg_type.clone(),
        None => signature
            .parameters
            .get(index)
            .and_then(|p| p.declared_types.first().cloned())
            .unwrap_or(TypeSymbol::Error),
    }
}

fn literal_text(arg: Option<&ArgumentInfo>) -> Option<smol_str::SmolStr> {
    arg.and_then(|a| a.literal.as_ref()).and_then(|l| match l {
        Literal::String(s) => Some(s.clone()),
        _ => None,
    })
}
