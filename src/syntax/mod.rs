//! Syntax — the read-only tree the binder consumes.
//!
//! The lexer and parser are external collaborators: this module defines
//! the arena-backed tree they produce and a [`TreeBuilder`] for
//! constructing trees programmatically (tests, tooling, generated
//! queries). The binder never mutates a tree; semantic information goes
//! into a side table keyed by [`ExprId`].

mod build;
mod ops;
mod tree;

pub use build::TreeBuilder;
pub use ops::{OperatorCategory, OperatorKind};
pub use tree::{
    Argument, ColumnDecl, DataValueRow, DeclaredParam, Expr, ExprId, ExprNode, ForkBranch,
    FunctionBlock, FunctionDeclaration, JoinCondition, LetValue, Literal, MakeSeriesAggregate,
    MvExpandItem, NamedParameter, Ordering, ParsePatternPart, PatternDeclaration, PatternSpec,
    ProjectionItem, QueryOp, Statement, SyntaxTree, TopNestedLevel, TypeExpr,
};
