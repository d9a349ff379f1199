//! Symbols — the immutable descriptor model the binder resolves against.
//!
//! Everything here is a value: columns, tables, databases, functions and
//! their signatures never mutate after construction. "Changing" a
//! symbol always produces a new value; binding-session state (inferred
//! columns, open entities, expansions) lives in the binder and in the
//! per-catalog [`GlobalBindingCache`].

mod cache;
mod catalog;
mod convert;
mod functions;
mod model;
mod scalars;
mod semantic;
mod types;

pub use cache::{
    ArgumentFingerprint, BindingCacheData, CallSiteFingerprint, GlobalBindingCache, UnifyKey,
    UnifyStrategy,
};
pub use catalog::{Catalog, CatalogBuilder, CatalogError, FunctionBodyParser};
pub use convert::{
    Conversion, better_common, column_assignable, common_scalar, scalar_assignable,
    type_assignable, unified_column_type, widest_numeric,
};
pub use functions::{
    ArgumentKind, CustomReturn, CustomReturnContext, FunctionBody, FunctionBodyFacts,
    FunctionOrigin, FunctionSymbol, OperatorSymbol, Parameter, ParameterTypeKind, ResultNameKind,
    ReturnKind, Signature,
};
pub use model::{
    ClusterSymbol, DatabaseSymbol, GroupSymbol, PatternSymbol, Symbol, SymbolKind, SymbolMatch,
    VariableSymbol,
};
pub use scalars::ScalarType;
pub use semantic::{Expansion, SemanticInfo, SemanticMap};
pub use types::{ColumnSymbol, TableSymbol, TupleSymbol, TypeSymbol};
