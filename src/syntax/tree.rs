//! The arena syntax tree.
//!
//! A [`SyntaxTree`] owns every expression node of one query block in a
//! flat arena addressed by [`ExprId`]. Statements reference expressions
//! by id; nested function bodies (from `let` declarations) share the
//! same arena. Trees are immutable once built.

use smol_str::SmolStr;

use super::ops::OperatorKind;
use crate::base::Span;

/// Index of an expression node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ============================================================================
// LITERALS AND TYPE EXPRESSIONS
// ============================================================================

/// A literal value carried by the tree.
///
/// The lexer has already decoded the token; the binder only needs the
/// value and its scalar category.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i32),
    Long(i64),
    Real(f64),
    Decimal(SmolStr),
    String(SmolStr),
    DateTime(SmolStr),
    TimeSpan(SmolStr),
    Dynamic(SmolStr),
    Guid(SmolStr),
    Null,
}

impl Literal {
    /// The string payload, for literal-valued parameters.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s)
            | Literal::Decimal(s)
            | Literal::DateTime(s)
            | Literal::TimeSpan(s)
            | Literal::Dynamic(s)
            | Literal::Guid(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty_string(&self) -> bool {
        matches!(self, Literal::String(s) if s.is_empty())
    }
}

/// A type written in source (`typeof(long)`, `(a:long, b:string)`, `(*)`).
///
/// Scalar names are left unresolved here; the binder maps them to
/// [`crate::symbols::ScalarType`] and diagnoses unknown names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A scalar type name (`long`, `string`, …).
    Scalar(SmolStr),
    /// A closed tabular shape with declared columns.
    Table(Vec<ColumnDecl>),
    /// The open tabular shape `(*)`.
    OpenTable,
}

/// A column declaration `name: type` in a type expression, `datatable`
/// schema, or `parse` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDecl {
    pub name: SmolStr,
    pub type_name: SmolStr,
}

impl ColumnDecl {
    pub fn new(name: impl Into<SmolStr>, type_name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

/// An argument in a call: optionally named (`param = expr`).
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<SmolStr>,
    pub value: ExprId,
}

impl Argument {
    pub fn positional(value: ExprId) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<SmolStr>, value: ExprId) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

/// One expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// A bare name reference (column, local, table, function, `$left`…).
    Name(SmolStr),
    /// Dotted member access `lhs.member`.
    Path { lhs: ExprId, member: SmolStr },
    /// Dynamic element access `lhs["key"]` or `lhs[index]`.
    Element { lhs: ExprId, index: ExprId },
    /// Unary operator application.
    Unary { op: OperatorKind, operand: ExprId },
    /// Binary operator application.
    Binary {
        op: OperatorKind,
        left: ExprId,
        right: ExprId,
    },
    /// `value between (low .. high)` and its negation.
    Between {
        op: OperatorKind,
        value: ExprId,
        low: ExprId,
        high: ExprId,
    },
    /// `value in (e1, e2, …)` family.
    InList {
        op: OperatorKind,
        value: ExprId,
        set: Vec<ExprId>,
    },
    /// Function/pattern invocation.
    Call { callee: ExprId, args: Vec<Argument> },
    /// The star expression `*`.
    Star,
    /// A literal type expression (`typeof(...)`).
    TypeOf(TypeExpr),
    /// `input | operator`.
    Pipe { input: ExprId, operator: ExprId },
    /// A query operator node. Standalone at a pipeline head for source
    /// operators (`range`, `union`, `find`, `print`, `datatable`, …);
    /// otherwise the right side of a [`Expr::Pipe`].
    Operator(QueryOp),
}

// ============================================================================
// QUERY OPERATORS
// ============================================================================

/// `name = expr`, or a bare expression whose output name is derived.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionItem {
    pub name: Option<SmolStr>,
    pub value: ExprId,
}

impl ProjectionItem {
    pub fn bare(value: ExprId) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<SmolStr>, value: ExprId) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

/// A sort/top ordering: expression plus optional direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub expr: ExprId,
    /// `None` means the grammar supplied no direction (defaults to desc).
    pub ascending: Option<bool>,
}

/// A named operator parameter such as `kind=inner` or `bagexpansion=bag`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedParameter {
    pub name: SmolStr,
    pub value: ExprId,
}

/// A join `on` condition: a bare column name matched on both sides, or
/// an equality expression over `$left`/`$right` paths.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    Column(SmolStr),
    Expr(ExprId),
}

/// An `mv-expand` item: optional output name, source expression,
/// optional `to typeof(...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MvExpandItem {
    pub name: Option<SmolStr>,
    pub value: ExprId,
    pub to_type: Option<TypeExpr>,
}

/// One aggregate slot of `make-series`, with its optional `default=`.
#[derive(Debug, Clone, PartialEq)]
pub struct MakeSeriesAggregate {
    pub item: ProjectionItem,
    pub default: Option<ExprId>,
}

/// One `parse` pattern segment.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsePatternPart {
    /// A literal text anchor.
    Literal(SmolStr),
    /// A captured column, optionally typed (`name:long`).
    Column {
        name: SmolStr,
        type_name: Option<SmolStr>,
    },
    /// The `*` skip marker.
    Star,
}

/// One branch of `fork`: an optional result name and a sub-pipeline
/// whose head operator receives the fork input's row scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ForkBranch {
    pub name: Option<SmolStr>,
    pub pipeline: ExprId,
}

/// One level of `top-nested`.
#[derive(Debug, Clone, PartialEq)]
pub struct TopNestedLevel {
    pub count: Option<ExprId>,
    pub of: ProjectionItem,
    pub with_others: Option<ExprId>,
    pub by: ProjectionItem,
}

/// A row of datatable values (flattened: the grammar supplies values in
/// row-major order, the builder groups them for convenience only).
pub type DataValueRow = Vec<ExprId>;

/// A pipe-chained (or pipeline-head) query operator.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOp {
    /// `where` / `filter`.
    Filter { predicate: ExprId },
    Extend { items: Vec<ProjectionItem> },
    Project { items: Vec<ProjectionItem> },
    ProjectAway { columns: Vec<ExprId> },
    ProjectKeep { columns: Vec<ExprId> },
    /// `project-rename new = old`.
    ProjectRename { items: Vec<ProjectionItem> },
    ProjectReorder { orderings: Vec<Ordering> },
    Summarize {
        aggregates: Vec<ProjectionItem>,
        by: Vec<ProjectionItem>,
    },
    /// `distinct *` is a single `Expr::Star` item.
    Distinct { columns: Vec<ExprId> },
    Count { as_name: Option<SmolStr> },
    /// `take` / `limit`.
    Take { count: ExprId },
    Top {
        count: ExprId,
        by: Vec<Ordering>,
    },
    TopHitters {
        count: ExprId,
        of: ExprId,
        by: Option<ExprId>,
    },
    TopNested { levels: Vec<TopNestedLevel> },
    /// `sort by` / `order by`.
    Sort { orderings: Vec<Ordering> },
    Sample { count: ExprId },
    SampleDistinct { count: ExprId, of: ExprId },
    Serialize { items: Vec<ProjectionItem> },
    As { name: SmolStr },
    Join {
        parameters: Vec<NamedParameter>,
        right: ExprId,
        on: Vec<JoinCondition>,
    },
    Lookup {
        parameters: Vec<NamedParameter>,
        right: ExprId,
        on: Vec<JoinCondition>,
    },
    Union {
        parameters: Vec<NamedParameter>,
        tables: Vec<ExprId>,
    },
    DataTable {
        schema: Vec<ColumnDecl>,
        values: Vec<ExprId>,
    },
    Range {
        column: SmolStr,
        from: ExprId,
        to: ExprId,
        step: ExprId,
    },
    MvExpand {
        parameters: Vec<NamedParameter>,
        items: Vec<MvExpandItem>,
        row_limit: Option<ExprId>,
    },
    MvApply {
        items: Vec<MvExpandItem>,
        row_limit: Option<ExprId>,
        id_column: Option<SmolStr>,
        body: ExprId,
    },
    MakeSeries {
        aggregates: Vec<MakeSeriesAggregate>,
        on: ExprId,
        from: Option<ExprId>,
        to: Option<ExprId>,
        step: ExprId,
        by: Vec<ProjectionItem>,
    },
    Parse {
        parameters: Vec<NamedParameter>,
        source: ExprId,
        pattern: Vec<ParsePatternPart>,
    },
    ParseWhere {
        parameters: Vec<NamedParameter>,
        source: ExprId,
        pattern: Vec<ParsePatternPart>,
    },
    /// `find [in (T1, …)] where predicate`; `None` tables means the
    /// current database's tables.
    Find {
        parameters: Vec<NamedParameter>,
        tables: Option<Vec<ExprId>>,
        predicate: ExprId,
    },
    /// `search [in (T1, …)] predicate`; without `in`, the incoming row
    /// scope (if any) or the current database's tables.
    Search {
        parameters: Vec<NamedParameter>,
        tables: Option<Vec<ExprId>>,
        predicate: ExprId,
    },
    Fork { branches: Vec<ForkBranch> },
    Partition {
        parameters: Vec<NamedParameter>,
        by: ExprId,
        body: ExprId,
    },
    /// `evaluate plugin(args)`.
    Evaluate {
        parameters: Vec<NamedParameter>,
        call: ExprId,
    },
    /// `invoke f(args)`: the piped input becomes the first argument.
    Invoke { call: ExprId },
    Render {
        chart: SmolStr,
        parameters: Vec<NamedParameter>,
    },
    GetSchema,
    Print { items: Vec<ProjectionItem> },
    Consume,
    ExecuteAndCache,
    Reduce {
        by: ExprId,
        characters: Option<ExprId>,
    },
}

impl QueryOp {
    /// The operator keyword for diagnostics.
    pub fn keyword(&self) -> &'static str {
        match self {
            QueryOp::Filter { .. } => "where",
            QueryOp::Extend { .. } => "extend",
            QueryOp::Project { .. } => "project",
            QueryOp::ProjectAway { .. } => "project-away",
            QueryOp::ProjectKeep { .. } => "project-keep",
            QueryOp::ProjectRename { .. } => "project-rename",
            QueryOp::ProjectReorder { .. } => "project-reorder",
            QueryOp::Summarize { .. } => "summarize",
            QueryOp::Distinct { .. } => "distinct",
            QueryOp::Count { .. } => "count",
            QueryOp::Take { .. } => "take",
            QueryOp::Top { .. } => "top",
            QueryOp::TopHitters { .. } => "top-hitters",
            QueryOp::TopNested { .. } => "top-nested",
            QueryOp::Sort { .. } => "sort",
            QueryOp::Sample { .. } => "sample",
            QueryOp::SampleDistinct { .. } => "sample-distinct",
            QueryOp::Serialize { .. } => "serialize",
            QueryOp::As { .. } => "as",
            QueryOp::Join { .. } => "join",
            QueryOp::Lookup { .. } => "lookup",
            QueryOp::Union { .. } => "union",
            QueryOp::DataTable { .. } => "datatable",
            QueryOp::Range { .. } => "range",
            QueryOp::MvExpand { .. } => "mv-expand",
            QueryOp::MvApply { .. } => "mv-apply",
            QueryOp::MakeSeries { .. } => "make-series",
            QueryOp::Parse { .. } => "parse",
            QueryOp::ParseWhere { .. } => "parse-where",
            QueryOp::Find { .. } => "find",
            QueryOp::Search { .. } => "search",
            QueryOp::Fork { .. } => "fork",
            QueryOp::Partition { .. } => "partition",
            QueryOp::Evaluate { .. } => "evaluate",
            QueryOp::Invoke { .. } => "invoke",
            QueryOp::Render { .. } => "render",
            QueryOp::GetSchema => "getschema",
            QueryOp::Print { .. } => "print",
            QueryOp::Consume => "consume",
            QueryOp::ExecuteAndCache => "execute_and_cache",
            QueryOp::Reduce { .. } => "reduce",
        }
    }
}

// ============================================================================
// STATEMENTS AND DECLARATIONS
// ============================================================================

/// A function parameter declaration `name: type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredParam {
    pub name: SmolStr,
    pub type_expr: TypeExpr,
}

/// A `let`-bound (or database-stored) function: parameters and a body
/// block whose final expression statement is the result.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub parameters: Vec<DeclaredParam>,
    pub body: FunctionBlock,
}

/// A function body: statements sharing the enclosing tree's arena.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBlock {
    pub statements: Vec<Statement>,
}

impl FunctionBlock {
    /// The result expression: the last expression statement, if any.
    pub fn result(&self) -> Option<ExprId> {
        self.statements.iter().rev().find_map(|s| match s {
            Statement::Expr(id) => Some(*id),
            _ => None,
        })
    }
}

/// One `declare pattern` alternative: literal argument values, an
/// optional path value, and the body to use when they match.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternDeclaration {
    pub values: Vec<Literal>,
    pub path_value: Option<SmolStr>,
    pub body: FunctionBlock,
}

/// The full pattern statement payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSpec {
    pub parameters: Vec<DeclaredParam>,
    pub path_parameter: Option<DeclaredParam>,
    pub declarations: Vec<PatternDeclaration>,
}

/// What a `let` statement binds.
#[derive(Debug, Clone, PartialEq)]
pub enum LetValue {
    Expr(ExprId),
    Function(FunctionDeclaration),
}

/// A block-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let {
        name: SmolStr,
        span: Span,
        value: LetValue,
    },
    Pattern {
        name: SmolStr,
        span: Span,
        spec: PatternSpec,
    },
    Expr(ExprId),
}

// ============================================================================
// THE TREE
// ============================================================================

/// One arena slot: the expression and its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub expr: Expr,
    pub span: Span,
}

/// An immutable query block: top-level statements over a flat
/// expression arena.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyntaxTree {
    pub(super) exprs: Vec<ExprNode>,
    pub(super) statements: Vec<Statement>,
}

impl SyntaxTree {
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()].expr
    }

    pub fn span(&self, id: ExprId) -> Span {
        self.exprs[id.index()].span
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Iterate all node ids in arena order.
    pub fn ids(&self) -> impl Iterator<Item = ExprId> + '_ {
        (0..self.exprs.len() as u32).map(ExprId)
    }

    /// The name text if the node is a bare name reference.
    pub fn as_name(&self, id: ExprId) -> Option<&SmolStr> {
        match self.expr(id) {
            Expr::Name(n) => Some(n),
            _ => None,
        }
    }

    /// The literal if the node is a literal expression.
    pub fn as_literal(&self, id: ExprId) -> Option<&Literal> {
        match self.expr(id) {
            Expr::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// The literal text of a name or string literal, used where the
    /// grammar allows either spelling (operator parameter values,
    /// `kind=inner` vs `kind="inner"`).
    pub fn literal_text(&self, id: ExprId) -> Option<SmolStr> {
        match self.expr(id) {
            Expr::Name(n) => Some(n.clone()),
            Expr::Literal(Literal::String(s)) => Some(s.clone()),
            Expr::Literal(Literal::Bool(b)) => Some(SmolStr::from(if *b { "true" } else { "false" })),
            Expr::Literal(Literal::Long(v)) => Some(SmolStr::from(v.to_string())),
            Expr::Literal(Literal::Int(v)) => Some(SmolStr::from(v.to_string())),
            _ => None,
        }
    }
}
