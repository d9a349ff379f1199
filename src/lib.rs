//! # tabula-base
//!
//! Core library for tabular query language semantic analysis: symbols,
//! type algebra, and the binder.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! binder    → name resolution, overload resolution, schema inference
//!   ↓
//! builtins  → built-in operators, scalar functions, aggregates
//!   ↓
//! symbols   → symbol model, scalar lattice, conversions, catalog
//!   ↓
//! syntax    → arena syntax tree, TreeBuilder
//!   ↓
//! base      → primitives (Span, name comparison, unique names)
//! ```
//!
//! The lexer and parser live outside this crate: callers hand the binder
//! an already-built [`syntax::SyntaxTree`] (the [`syntax::TreeBuilder`]
//! constructs one programmatically) together with a
//! [`symbols::Catalog`] snapshot, and receive a side table of
//! [`binder::SemanticInfo`] keyed by node id.

// ============================================================================
// MODULES (dependency order: base → syntax → symbols → builtins → binder)
// ============================================================================

/// Foundation types: spans, case-insensitive names, unique-name helpers
pub mod base;

/// Syntax: arena tree the binder consumes, programmatic builder
pub mod syntax;

/// Symbols: scalar types, entity symbols, signatures, conversions, catalog
pub mod symbols;

/// Built-in operators, scalar functions, aggregates, plug-ins
pub mod builtins;

/// The binder: scopes, lookup, overloads, expansion, query operators
pub mod binder;

/// Diagnostics: kinds, codes, severities
pub mod diagnostics;

// Re-export commonly needed items
pub use base::{Span, name_eq};
pub use binder::{BindResult, Binder, BinderOptions, SemanticInfo, SemanticMap};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use symbols::{Catalog, CatalogBuilder, ScalarType, Symbol, TypeSymbol};
pub use syntax::{ExprId, SyntaxTree, TreeBuilder};
