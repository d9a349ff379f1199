//! Semantic annotations: the per-node info record, the side table, and
//! function-body expansions.
//!
//! These live with the symbol model because cached expansions are part
//! of the catalog-scoped binding cache, below the binder itself.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::model::Symbol;
use super::types::TypeSymbol;
use crate::diagnostics::Diagnostic;
use crate::syntax::{ExprId, Literal, SyntaxTree};

// ============================================================================
// SEMANTIC INFO
// ============================================================================

/// Everything binding attaches to one expression node.
///
/// `result_type` is never "missing": unknown binds as `Error`.
#[derive(Debug, Clone)]
pub struct SemanticInfo {
    /// The symbol a name/call resolved to, if any.
    pub referenced: Option<Symbol>,
    pub result_type: TypeSymbol,
    pub diagnostics: Vec<Diagnostic>,
    pub is_constant: bool,
    /// The literal value when the node is a constant literal.
    pub constant_value: Option<Literal>,
    /// The expansion used to compute a variable return type.
    pub expansion: Option<Arc<Expansion>>,
}

impl SemanticInfo {
    pub fn of_type(result_type: TypeSymbol) -> Self {
        Self {
            referenced: None,
            result_type,
            diagnostics: Vec::new(),
            is_constant: false,
            constant_value: None,
            expansion: None,
        }
    }

    pub fn referencing(symbol: Symbol, result_type: TypeSymbol) -> Self {
        Self {
            referenced: Some(symbol),
            result_type,
            diagnostics: Vec::new(),
            is_constant: false,
            constant_value: None,
            expansion: None,
        }
    }

    pub fn error() -> Self {
        Self::of_type(TypeSymbol::Error)
    }

    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }

    pub fn constant(mut self, value: Option<Literal>) -> Self {
        self.is_constant = true;
        self.constant_value = value;
        self
    }
}

/// The annotation side table: node id → semantic info.
///
/// Keeps the syntax tree immutable; one map per binding pass (the main
/// query and each expansion have their own).
#[derive(Debug, Default)]
pub struct SemanticMap {
    entries: FxHashMap<ExprId, Arc<SemanticInfo>>,
}

impl SemanticMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: ExprId, info: SemanticInfo) -> Arc<SemanticInfo> {
        let info = Arc::new(info);
        self.entries.insert(id, info.clone());
        info
    }

    pub fn get(&self, id: ExprId) -> Option<&Arc<SemanticInfo>> {
        self.entries.get(&id)
    }

    pub fn result_type(&self, id: ExprId) -> TypeSymbol {
        self.get(id)
            .map(|i| i.result_type.clone())
            .unwrap_or(TypeSymbol::Error)
    }

    pub fn is_constant(&self, id: ExprId) -> bool {
        self.get(id).is_some_and(|i| i.is_constant)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ExprId, &Arc<SemanticInfo>)> {
        self.entries.iter()
    }

    /// All diagnostics in the table, in node-id order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut keyed: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, info)| !info.diagnostics.is_empty())
            .collect();
        keyed.sort_by_key(|(id, _)| **id);
        keyed
            .into_iter()
            .flat_map(|(_, info)| info.diagnostics.iter().cloned())
            .collect()
    }
}

// ============================================================================
// EXPANSIONS
// ============================================================================

/// The bound form of a function body under one set of argument types.
///
/// For a `let`-bound function the body nodes live in the caller's tree
/// and `tree` is `None`; for stored functions parsed from text the
/// expansion owns the parsed tree.
#[derive(Debug)]
pub struct Expansion {
    pub tree: Option<Arc<SyntaxTree>>,
    /// The body's result expression, when one exists.
    pub result: Option<ExprId>,
    pub result_type: TypeSymbol,
    /// Semantic annotations of the expanded body.
    pub semantics: SemanticMap,
}
