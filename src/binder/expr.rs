//! Expression binding: literals, names, paths, operators, calls.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::builtins;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::symbols::{
    FunctionBodyFacts, FunctionOrigin, FunctionSymbol, GroupSymbol, ResultNameKind, SemanticInfo,
    Symbol, SymbolMatch, TableSymbol, TupleSymbol, TypeSymbol,
};
use crate::syntax::{Argument, Expr, ExprId, Literal, OperatorKind};

use super::lookup::LookupOutcome;
use super::matcher::{ArgumentInfo, MatchResult, check_signature, get_best_matching};
use super::{Binder, ScopeKind};

impl Binder<'_> {
    /// Bind one expression node, recording and returning its info.
    pub(crate) fn bind_expr(&mut self, id: ExprId) -> Arc<SemanticInfo> {
        self.probe_position(id);

        let expr = self.tree.expr(id).clone();
        let info = match expr {
            Expr::Literal(literal) => self.bind_literal(&literal),
            Expr::Name(name) => self.bind_name(id, &name),
            Expr::Path { lhs, member } => self.bind_path(id, lhs, &member),
            Expr::Element { lhs, index } => self.bind_element(id, lhs, index),
            Expr::Unary { op, operand } => self.bind_operator_application(id, op, &[operand]),
            Expr::Binary { op, left, right } => {
                self.bind_operator_application(id, op, &[left, right])
            }
            Expr::Between {
                op,
                value,
                low,
                high,
            } => self.bind_operator_application(id, op, &[value, low, high]),
            Expr::InList { op, value, set } => {
                let mut operands = vec![value];
                operands.extend(set.iter().copied());
                self.bind_operator_application(id, op, &operands)
            }
            Expr::Call { callee, args } => self.bind_call(id, callee, &args),
            Expr::Star => SemanticInfo::of_type(TypeSymbol::Void),
            Expr::TypeOf(type_expr) => {
                let denoted = self.resolve_type_expr(&type_expr, id);
                let mut info = SemanticInfo::of_type(TypeSymbol::TYPE).constant(None);
                if denoted.is_error() {
                    info = info.with_diagnostic(Diagnostic::error(
                        DiagnosticKind::InvalidTypeExpression,
                        self.tree.span(id),
                    ));
                }
                info
            }
            Expr::Pipe { input, operator } => self.bind_pipe(input, operator),
            Expr::Operator(op) => self.bind_query_operator(id, &op),
        };
        self.set_info(id, info)
    }

    // ------------------------------------------------------------------
    // Literals
    // ------------------------------------------------------------------

    fn bind_literal(&self, literal: &Literal) -> SemanticInfo {
        let ty = match literal {
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
        };
        SemanticInfo::of_type(ty).constant(Some(literal.clone()))
    }

    // ------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------

    fn bind_name(&mut self, id: ExprId, name: &str) -> SemanticInfo {
        let span = self.tree.span(id);

        // whole-row references, valid only while joining
        if crate::base::name_eq(name, "$left") {
            return match (&self.row_scope, &self.right_row_scope) {
                (Some(left), Some(_)) => {
                    let tuple = TupleSymbol::from_table(left);
                    SemanticInfo::referencing(
                        Symbol::Tuple(tuple.clone()),
                        TypeSymbol::Tuple(tuple),
                    )
                }
                _ => SemanticInfo::error().with_diagnostic(Diagnostic::error(
                    DiagnosticKind::NoRowContext { name: name.into() },
                    span,
                )),
            };
        }
        if crate::base::name_eq(name, "$right") {
            return match &self.right_row_scope {
                Some(right) => {
                    let tuple = TupleSymbol::from_table(right);
                    SemanticInfo::referencing(
                        Symbol::Tuple(tuple.clone()),
                        TypeSymbol::Tuple(tuple),
                    )
                }
                None => SemanticInfo::error().with_diagnostic(Diagnostic::error(
                    DiagnosticKind::NoRowContext { name: name.into() },
                    span,
                )),
            };
        }

        match self.lookup_name(name, SymbolMatch::EXPRESSION, false) {
            LookupOutcome::One(symbol) => self.name_reference_info(id, symbol),
            LookupOutcome::Many(symbols) => {
                let group = GroupSymbol::new(name, symbols);
                SemanticInfo::referencing(Symbol::Group(group), TypeSymbol::Error)
                    .with_diagnostic(Diagnostic::error(
                        DiagnosticKind::AmbiguousName { name: name.into() },
                        span,
                    ))
            }
            LookupOutcome::NotFound => {
                let kind = if self.scope_kind == ScopeKind::Aggregate {
                    DiagnosticKind::NameNotFoundInAggregateContext { name: name.into() }
                } else {
                    DiagnosticKind::NameNotFound { name: name.into() }
                };
                SemanticInfo::error().with_diagnostic(Diagnostic::error(kind, span))
            }
        }
    }

    /// Semantic info for a resolved bare-name reference.
    fn name_reference_info(&mut self, id: ExprId, symbol: Symbol) -> SemanticInfo {
        match &symbol {
            Symbol::Function(function) => {
                // zero-argument invocation without parentheses
                let function = function.clone();
                if function.min_argument_count() == 0 {
                    let mut info = self.bind_function_call(id, &function, &[], None);
                    info.referenced = Some(symbol);
                    info
                } else {
                    let span = self.tree.span(id);
                    SemanticInfo::referencing(symbol.clone(), TypeSymbol::Error).with_diagnostic(
                        Diagnostic::error(
                            DiagnosticKind::ArgumentListRequired {
                                name: function.name.clone(),
                            },
                            span,
                        ),
                    )
                }
            }
            Symbol::Variable(variable) => {
                let mut info =
                    SemanticInfo::referencing(symbol.clone(), variable.var_type.clone());
                if variable.is_constant {
                    info = info.constant(variable.constant_value.clone());
                }
                info
            }
            _ => {
                let result_type = symbol.result_type();
                SemanticInfo::referencing(symbol, result_type)
            }
        }
    }

    // ------------------------------------------------------------------
    // Paths and element access
    // ------------------------------------------------------------------

    fn bind_path(&mut self, id: ExprId, lhs: ExprId, member: &str) -> SemanticInfo {
        let lhs_info = self.bind_expr(lhs);
        let span = self.tree.span(id);

        if lhs_info.result_type.is_error() {
            return SemanticInfo::error();
        }
        // member access into a dynamic value stays dynamic
        if lhs_info.result_type.is_dynamic() {
            return SemanticInfo::of_type(TypeSymbol::DYNAMIC);
        }

        let Some(scope) = self.path_scope_symbol(&lhs_info) else {
            return SemanticInfo::error().with_diagnostic(Diagnostic::error(
                DiagnosticKind::NameNotFound {
                    name: member.into(),
                },
                span,
            ));
        };

        let saved = self.path_scope.replace(scope);
        let outcome = self.lookup_name(member, SymbolMatch::EXPRESSION, false);
        self.path_scope = saved;

        match outcome {
            LookupOutcome::One(symbol) => self.name_reference_info(id, symbol),
            LookupOutcome::Many(symbols) => {
                let group = GroupSymbol::new(member, symbols);
                SemanticInfo::referencing(Symbol::Group(group), TypeSymbol::Error)
                    .with_diagnostic(Diagnostic::error(
                        DiagnosticKind::AmbiguousName {
                            name: member.into(),
                        },
                        span,
                    ))
            }
            LookupOutcome::NotFound => SemanticInfo::error().with_diagnostic(Diagnostic::error(
                DiagnosticKind::NameNotFound {
                    name: member.into(),
                },
                span,
            )),
        }
    }

    /// The symbol a path left side exposes as a member namespace.
    fn path_scope_symbol(&self, info: &SemanticInfo) -> Option<Symbol> {
        match &info.referenced {
            Some(symbol @ (Symbol::Cluster(_) | Symbol::Database(_) | Symbol::Table(_)
            | Symbol::Tuple(_) | Symbol::Variable(_))) => Some(symbol.clone()),
            _ => match &info.result_type {
                TypeSymbol::Table(t) => Some(Symbol::Table(t.clone())),
                TypeSymbol::Tuple(t) => Some(Symbol::Tuple(t.clone())),
                _ => None,
            },
        }
    }

    fn bind_element(&mut self, id: ExprId, lhs: ExprId, index: ExprId) -> SemanticInfo {
        let lhs_info = self.bind_expr(lhs);
        self.bind_expr(index);
        if lhs_info.result_type.is_error() {
            return SemanticInfo::error();
        }
        if lhs_info.result_type.is_dynamic() {
            return SemanticInfo::of_type(TypeSymbol::DYNAMIC);
        }
        SemanticInfo::error().with_diagnostic(Diagnostic::error(
            DiagnosticKind::TypeExpected {
                expected: "dynamic".into(),
                actual: lhs_info.result_type.display_name(),
            },
            self.tree.span(id),
        ))
    }

    // ------------------------------------------------------------------
    // Operator applications
    // ------------------------------------------------------------------

    fn bind_operator_application(
        &mut self,
        id: ExprId,
        op: OperatorKind,
        operands: &[ExprId],
    ) -> SemanticInfo {
        let args: Vec<ArgumentInfo> = operands
            .iter()
            .map(|operand| {
                let info = self.bind_expr(*operand);
                self.argument_info(*operand, None, &info)
            })
            .collect();

        // root-cause rule: error operands suppress this node's own
        // diagnostics
        let has_error_operand = args.iter().any(|a| a.arg_type.is_error());

        let operator = builtins::find_operator(op).clone();
        let span = self.tree.span(id);

        let (result_type, diagnostics, signature) =
            match get_best_matching(&operator.signatures, &args) {
                MatchResult::Best(signature) => {
                    let diagnostics = check_signature(&signature, &args, span, false);
                    let (ty, _, _) = self.resolve_return_type(&signature, &args, None);
                    (ty, diagnostics, Some(signature))
                }
                MatchResult::Ambiguous(tied) => {
                    let (ty, diagnostics) = self.tie_break_return(&tied, span, &operator.kind);
                    (ty, diagnostics, None)
                }
            };

        let mut info =
            SemanticInfo::referencing(Symbol::Operator(operator), result_type);
        if !has_error_operand {
            for d in diagnostics {
                info.diagnostics.push(d);
            }
        }
        if args.iter().all(|a| a.is_constant) && signature.is_some() {
            info.is_constant = true;
        }
        info
    }

    /// §4.7: tied signatures with one common return type resolve to it,
    /// disagreeing ties are an error.
    fn tie_break_return(
        &mut self,
        tied: &[Arc<crate::symbols::Signature>],
        span: crate::base::Span,
        kind: &OperatorKind,
    ) -> (TypeSymbol, Vec<Diagnostic>) {
        let mut declared: Vec<TypeSymbol> = Vec::new();
        for signature in tied {
            if let crate::symbols::ReturnKind::Declared(t) = &signature.return_kind {
                declared.push(t.clone());
            }
        }
        if declared.len() == tied.len()
            && declared.windows(2).all(|w| w[0] == w[1])
            && let Some(first) = declared.first()
        {
            return (first.clone(), Vec::new());
        }
        (
            TypeSymbol::Error,
            vec![Diagnostic::error(
                DiagnosticKind::AmbiguousCall {
                    name: kind.display_name().into(),
                },
                span,
            )],
        )
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    fn bind_call(&mut self, id: ExprId, callee: ExprId, args: &[Argument]) -> SemanticInfo {
        let span = self.tree.span(id);

        // resolve the callee without triggering zero-arg invocation
        let (symbol, container) = self.resolve_callee(callee);

        let Some(symbol) = symbol else {
            // resolve_callee already attached the diagnostic to the
            // callee node
            return SemanticInfo::error();
        };

        match &symbol {
            Symbol::Function(function) => {
                let function = function.clone();
                self.set_info(
                    callee,
                    SemanticInfo::referencing(symbol.clone(), TypeSymbol::Void),
                );
                self.bind_function_call(id, &function, args, container)
            }
            Symbol::Pattern(pattern) => {
                let pattern = pattern.clone();
                self.set_info(
                    callee,
                    SemanticInfo::referencing(symbol.clone(), TypeSymbol::Void),
                );
                self.bind_pattern_call(id, &pattern, args)
            }
            other => {
                let name = SmolStr::from(other.name());
                self.set_info(callee, SemanticInfo::referencing(symbol.clone(), TypeSymbol::Error));
                SemanticInfo::error().with_diagnostic(Diagnostic::error(
                    DiagnosticKind::NotAFunction { name },
                    span,
                ))
            }
        }
    }

    /// Resolve a call's callee to its symbol, plus the container symbol
    /// when the callee was a dotted path (`database("db").fn`).
    fn resolve_callee(&mut self, callee: ExprId) -> (Option<Symbol>, Option<Symbol>) {
        let mask = SymbolMatch::FUNCTION
            .union(SymbolMatch::LOCAL)
            .union(SymbolMatch::PATTERN)
            .union(SymbolMatch::TABLE);
        match self.tree.expr(callee).clone() {
            Expr::Name(name) => {
                let span = self.tree.span(callee);
                match self.lookup_name(&name, mask, true) {
                    LookupOutcome::One(symbol) => (Some(symbol), None),
                    LookupOutcome::Many(symbols) => {
                        let group = GroupSymbol::new(name.clone(), symbols);
                        self.set_info(
                            callee,
                            SemanticInfo::referencing(
                                Symbol::Group(group),
                                TypeSymbol::Error,
                            )
                            .with_diagnostic(Diagnostic::error(
                                DiagnosticKind::AmbiguousName { name },
                                span,
                            )),
                        );
                        (None, None)
                    }
                    LookupOutcome::NotFound => {
                        // a resolvable non-invocable name is a better
                        // diagnostic than "not defined"
                        let kind = if let LookupOutcome::One(_) =
                            self.lookup_name(&name, SymbolMatch::EXPRESSION, false)
                        {
                            DiagnosticKind::NotAFunction { name }
                        } else if self.scope_kind == ScopeKind::Aggregate {
                            DiagnosticKind::NameNotFoundInAggregateContext { name }
                        } else {
                            DiagnosticKind::NameNotFound { name }
                        };
                        self.set_info(
                            callee,
                            SemanticInfo::error()
                                .with_diagnostic(Diagnostic::error(kind, span)),
                        );
                        (None, None)
                    }
                }
            }
            Expr::Path { lhs, member } => {
                let lhs_info = self.bind_expr(lhs);
                let span = self.tree.span(callee);
                if lhs_info.result_type.is_error() {
                    self.set_info(callee, SemanticInfo::error());
                    return (None, None);
                }
                let container = self.path_scope_symbol(&lhs_info);
                let Some(scope) = container.clone() else {
                    self.set_info(
                        callee,
                        SemanticInfo::error().with_diagnostic(Diagnostic::error(
                            DiagnosticKind::NotAFunction {
                                name: member.clone(),
                            },
                            span,
                        )),
                    );
                    return (None, None);
                };
                let saved = self.path_scope.replace(scope);
                let outcome = self.lookup_name(&member, mask, true);
                self.path_scope = saved;
                match outcome {
                    LookupOutcome::One(symbol) => (Some(symbol), container),
                    LookupOutcome::Many(symbols) => {
                        let group = GroupSymbol::new(member.clone(), symbols);
                        self.set_info(
                            callee,
                            SemanticInfo::referencing(Symbol::Group(group), TypeSymbol::Error)
                                .with_diagnostic(Diagnostic::error(
                                    DiagnosticKind::AmbiguousName { name: member },
                                    span,
                                )),
                        );
                        (None, None)
                    }
                    LookupOutcome::NotFound => {
                        self.set_info(
                            callee,
                            SemanticInfo::error().with_diagnostic(Diagnostic::error(
                                DiagnosticKind::NameNotFound { name: member },
                                span,
                            )),
                        );
                        (None, None)
                    }
                }
            }
            _ => {
                let info = self.bind_expr(callee);
                let name = SmolStr::from("<expression>");
                if !info.result_type.is_error() {
                    let span = self.tree.span(callee);
                    self.set_info(
                        callee,
                        SemanticInfo::error().with_diagnostic(Diagnostic::error(
                            DiagnosticKind::NotAFunction { name },
                            span,
                        )),
                    );
                }
                (None, None)
            }
        }
    }

    /// Bind an invocation of a resolved function symbol.
    pub(crate) fn bind_function_call(
        &mut self,
        id: ExprId,
        function: &Arc<FunctionSymbol>,
        args: &[Argument],
        container: Option<Symbol>,
    ) -> SemanticInfo {
        let span = self.tree.span(id);
        let mut diagnostics = Vec::new();

        // aggregates only apply inside aggregation scopes
        if function.is_aggregate && self.scope_kind != ScopeKind::Aggregate {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::AggregateNotAllowed {
                    name: function.name.clone(),
                },
                span,
            ));
        }

        // record body facts for the expansion in progress
        self.note_catalog_function_use(function, container.as_ref());

        // bind arguments; aggregate argument expressions are ordinary
        // scalar expressions again
        let saved_scope_kind = self.scope_kind;
        if function.is_aggregate || function.is_plugin {
            self.scope_kind = ScopeKind::Normal;
        }
        let bound_args: Vec<ArgumentInfo> = args
            .iter()
            .map(|arg| {
                let info = self.bind_expr(arg.value);
                self.argument_info(arg.value, arg.name.clone(), &info)
            })
            .collect();
        self.scope_kind = saved_scope_kind;

        self.bind_function_call_core(function, bound_args, container, diagnostics, span)
    }

    /// `invoke f(a, b)`: the piped input is the implicit first argument.
    pub(crate) fn bind_invoke_call(
        &mut self,
        id: ExprId,
        callee: ExprId,
        args: &[Argument],
        input: Arc<TableSymbol>,
    ) -> SemanticInfo {
        let span = self.tree.span(id);
        let (symbol, container) = self.resolve_callee(callee);
        let Some(symbol) = symbol else {
            return SemanticInfo::error();
        };
        let Symbol::Function(function) = &symbol else {
            let name = SmolStr::from(symbol.name());
            return SemanticInfo::error().with_diagnostic(Diagnostic::error(
                DiagnosticKind::NotAFunction { name },
                span,
            ));
        };
        let function = function.clone();
        self.set_info(
            callee,
            SemanticInfo::referencing(symbol.clone(), TypeSymbol::Void),
        );

        let mut bound_args = vec![ArgumentInfo::of_type(TypeSymbol::Table(input))];
        for arg in args {
            let info = self.bind_expr(arg.value);
            bound_args.push(self.argument_info(arg.value, arg.name.clone(), &info));
        }
        let info = self.bind_function_call_core(&function, bound_args, container, Vec::new(), span);
        self.set_info(id, info.clone());
        info
    }

    /// Overload selection, signature checking, and return resolution
    /// for already-bound arguments.
    fn bind_function_call_core(
        &mut self,
        function: &Arc<FunctionSymbol>,
        bound_args: Vec<ArgumentInfo>,
        container: Option<Symbol>,
        mut diagnostics: Vec<Diagnostic>,
        span: crate::base::Span,
    ) -> SemanticInfo {
        let has_error_operand = bound_args.iter().any(|a| a.arg_type.is_error());

        let user_defined = function.origin != FunctionOrigin::BuiltIn;
        let (result_type, expansion, referenced_entity) =
            match get_best_matching(&function.signatures, &bound_args) {
                MatchResult::Best(signature) => {
                    diagnostics.extend(check_signature(&signature, &bound_args, span, user_defined));
                    self.resolve_return_with_expansion(
                        function,
                        &signature,
                        &bound_args,
                        container.as_ref(),
                    )
                }
                MatchResult::Ambiguous(tied) => {
                    let mut declared: Vec<TypeSymbol> = Vec::new();
                    for signature in &tied {
                        if let crate::symbols::ReturnKind::Declared(t) = &signature.return_kind {
                            declared.push(t.clone());
                        }
                    }
                    if declared.len() == tied.len() && declared.windows(2).all(|w| w[0] == w[1]) {
                        (declared[0].clone(), None, None)
                    } else {
                        diagnostics.push(Diagnostic::error(
                            DiagnosticKind::AmbiguousCall {
                                name: function.name.clone(),
                            },
                            span,
                        ));
                        (TypeSymbol::Error, None, None)
                    }
                }
            };

        let referenced = referenced_entity.unwrap_or(Symbol::Function(function.clone()));
        let mut info = SemanticInfo::referencing(referenced, result_type);
        info.expansion = expansion;
        if !has_error_operand {
            info.diagnostics.extend(diagnostics);
        }
        if function.is_constant_foldable && bound_args.iter().all(|a| a.is_constant) {
            info.is_constant = true;
        }
        info
    }

    fn note_catalog_function_use(
        &mut self,
        function: &Arc<FunctionSymbol>,
        container: Option<&Symbol>,
    ) {
        if function.origin != FunctionOrigin::BuiltIn {
            return;
        }
        if crate::base::name_eq(&function.name, "table") {
            if container.is_some() {
                self.note_fact(FunctionBodyFacts::QUALIFIED_TABLE);
            } else {
                self.note_fact(FunctionBodyFacts::UNQUALIFIED_TABLE);
            }
        } else if crate::base::name_eq(&function.name, "database") {
            self.note_fact(FunctionBodyFacts::DATABASE);
        } else if crate::base::name_eq(&function.name, "cluster") {
            self.note_fact(FunctionBodyFacts::CLUSTER);
        }
    }

    // ------------------------------------------------------------------
    // Argument views
    // ------------------------------------------------------------------

    /// Build the matcher's view of one bound argument.
    pub(crate) fn argument_info(
        &self,
        id: ExprId,
        name: Option<SmolStr>,
        info: &SemanticInfo,
    ) -> ArgumentInfo {
        let expr = self.tree.expr(id);
        ArgumentInfo {
            name,
            arg_type: info.result_type.clone(),
            span: self.tree.span(id),
            expr: Some(id),
            is_star: matches!(expr, Expr::Star),
            is_constant: info.is_constant,
            is_literal: matches!(expr, Expr::Literal(_) | Expr::TypeOf(_)),
            literal: self.tree.as_literal(id).cloned(),
            is_column_ref: matches!(info.referenced, Some(Symbol::Column(_))),
        }
    }

    // ------------------------------------------------------------------
    // Result-name derivation
    // ------------------------------------------------------------------

    /// Derive the output column name for a bare projection/aggregate
    /// item, per the called function's result-name rule.
    pub(crate) fn derived_result_name(&self, value: ExprId) -> Option<SmolStr> {
        let info = self.semantics.get(value)?;
        if let Some(Symbol::Column(column)) = &info.referenced {
            return Some(column.name.clone());
        }
        let Expr::Call { args, .. } = self.tree.expr(value) else {
            return None;
        };
        let Some(Symbol::Function(function)) = &info.referenced else {
            return None;
        };
        let first_arg_column = args.first().and_then(|a| {
            self.semantics.get(a.value).and_then(|i| match &i.referenced {
                Some(Symbol::Column(c)) => Some(c.name.clone()),
                _ => None,
            })
        });
        match function.result_name_kind {
            ResultNameKind::None => None,
            ResultNameKind::OnlyArgument => first_arg_column,
            ResultNameKind::PrefixAndOnlyArgument => {
                let prefix = function.result_name_prefix.as_deref().unwrap_or("");
                Some(SmolStr::from(format!(
                    "{prefix}_{}",
                    first_arg_column.as_deref().unwrap_or("")
                )))
            }
            ResultNameKind::PrefixOnly => {
                let prefix = function.result_name_prefix.as_deref().unwrap_or("");
                Some(SmolStr::from(format!("{prefix}_")))
            }
            ResultNameKind::FirstArgumentValueIfColumn => first_arg_column,
        }
    }

    // ------------------------------------------------------------------
    // Pipes
    // ------------------------------------------------------------------

    fn bind_pipe(&mut self, input: ExprId, operator: ExprId) -> SemanticInfo {
        let input_info = self.bind_expr(input);

        let input_table: Option<Arc<TableSymbol>> = match &input_info.result_type {
            TypeSymbol::Table(t) => Some(t.clone()),
            TypeSymbol::Error => None,
            other => {
                let diag = Diagnostic::error(
                    DiagnosticKind::TableExpected {
                        actual: other.display_name(),
                    },
                    self.tree.span(input),
                );
                // best effort: continue with an empty scope
                let _ = self.set_info(
                    input,
                    SemanticInfo {
                        diagnostics: {
                            let mut d = input_info.diagnostics.clone();
                            d.push(diag);
                            d
                        },
                        ..(*input_info).clone()
                    },
                );
                None
            }
        };

        let saved = self.row_scope.take();
        self.row_scope = Some(
            input_table.unwrap_or_else(|| TableSymbol::schema(Vec::new())),
        );
        let op_info = self.bind_expr(operator);
        self.row_scope = saved;

        SemanticInfo::of_type(op_info.result_type.clone())
    }
}
