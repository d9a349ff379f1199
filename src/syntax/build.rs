//! Programmatic tree construction.
//!
//! The builder is what a parser front-end targets, and what tests use
//! directly. Every constructor allocates one arena node and returns its
//! id; statements are appended in order and `finish` seals the tree.

use smol_str::SmolStr;

use super::ops::OperatorKind;
use super::tree::{
    Argument, ColumnDecl, DeclaredParam, Expr, ExprId, ExprNode, FunctionBlock,
    FunctionDeclaration, LetValue, Literal, PatternSpec, ProjectionItem, QueryOp, Statement,
    SyntaxTree, TypeExpr,
};
use crate::base::Span;

/// Incremental [`SyntaxTree`] builder.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    tree: SyntaxTree,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.tree.exprs.len() as u32);
        self.tree.exprs.push(ExprNode {
            expr,
            span: Span::default(),
        });
        id
    }

    /// Attach a source span to an already-allocated node.
    pub fn set_span(&mut self, id: ExprId, span: Span) {
        self.tree.exprs[id.index()].span = span;
    }

    // ------------------------------------------------------------------
    // Leaf expressions
    // ------------------------------------------------------------------

    pub fn literal(&mut self, value: Literal) -> ExprId {
        self.alloc(Expr::Literal(value))
    }

    pub fn lit_bool(&mut self, v: bool) -> ExprId {
        self.literal(Literal::Bool(v))
    }

    pub fn lit_int(&mut self, v: i32) -> ExprId {
        self.literal(Literal::Int(v))
    }

    pub fn lit_long(&mut self, v: i64) -> ExprId {
        self.literal(Literal::Long(v))
    }

    pub fn lit_real(&mut self, v: f64) -> ExprId {
        self.literal(Literal::Real(v))
    }

    pub fn lit_string(&mut self, v: impl Into<SmolStr>) -> ExprId {
        self.literal(Literal::String(v.into()))
    }

    pub fn lit_datetime(&mut self, v: impl Into<SmolStr>) -> ExprId {
        self.literal(Literal::DateTime(v.into()))
    }

    pub fn lit_timespan(&mut self, v: impl Into<SmolStr>) -> ExprId {
        self.literal(Literal::TimeSpan(v.into()))
    }

    pub fn lit_dynamic(&mut self, v: impl Into<SmolStr>) -> ExprId {
        self.literal(Literal::Dynamic(v.into()))
    }

    pub fn name(&mut self, n: impl Into<SmolStr>) -> ExprId {
        self.alloc(Expr::Name(n.into()))
    }

    pub fn star(&mut self) -> ExprId {
        self.alloc(Expr::Star)
    }

    pub fn typeof_scalar(&mut self, type_name: impl Into<SmolStr>) -> ExprId {
        self.alloc(Expr::TypeOf(TypeExpr::Scalar(type_name.into())))
    }

    pub fn typeof_table(&mut self, columns: Vec<ColumnDecl>) -> ExprId {
        self.alloc(Expr::TypeOf(TypeExpr::Table(columns)))
    }

    // ------------------------------------------------------------------
    // Compound expressions
    // ------------------------------------------------------------------

    pub fn path(&mut self, lhs: ExprId, member: impl Into<SmolStr>) -> ExprId {
        self.alloc(Expr::Path {
            lhs,
            member: member.into(),
        })
    }

    pub fn element(&mut self, lhs: ExprId, index: ExprId) -> ExprId {
        self.alloc(Expr::Element { lhs, index })
    }

    pub fn unary(&mut self, op: OperatorKind, operand: ExprId) -> ExprId {
        self.alloc(Expr::Unary { op, operand })
    }

    pub fn binary(&mut self, op: OperatorKind, left: ExprId, right: ExprId) -> ExprId {
        self.alloc(Expr::Binary { op, left, right })
    }

    pub fn between(&mut self, op: OperatorKind, value: ExprId, low: ExprId, high: ExprId) -> ExprId {
        self.alloc(Expr::Between {
            op,
            value,
            low,
            high,
        })
    }

    pub fn in_list(&mut self, op: OperatorKind, value: ExprId, set: Vec<ExprId>) -> ExprId {
        self.alloc(Expr::InList { op, value, set })
    }

    pub fn call(&mut self, callee: ExprId, args: Vec<ExprId>) -> ExprId {
        let args = args.into_iter().map(Argument::positional).collect();
        self.alloc(Expr::Call { callee, args })
    }

    pub fn call_args(&mut self, callee: ExprId, args: Vec<Argument>) -> ExprId {
        self.alloc(Expr::Call { callee, args })
    }

    /// Shorthand: call a function by bare name.
    pub fn call_named(&mut self, function: impl Into<SmolStr>, args: Vec<ExprId>) -> ExprId {
        let callee = self.name(function);
        self.call(callee, args)
    }

    pub fn pipe(&mut self, input: ExprId, operator: ExprId) -> ExprId {
        self.alloc(Expr::Pipe { input, operator })
    }

    pub fn operator(&mut self, op: QueryOp) -> ExprId {
        self.alloc(Expr::Operator(op))
    }

    /// Shorthand: `input | op`.
    pub fn pipe_op(&mut self, input: ExprId, op: QueryOp) -> ExprId {
        let operator = self.operator(op);
        self.pipe(input, operator)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn let_expr(&mut self, name: impl Into<SmolStr>, value: ExprId) {
        self.tree.statements.push(Statement::Let {
            name: name.into(),
            span: Span::default(),
            value: LetValue::Expr(value),
        });
    }

    pub fn let_function(
        &mut self,
        name: impl Into<SmolStr>,
        parameters: Vec<DeclaredParam>,
        body: FunctionBlock,
    ) {
        self.tree.statements.push(Statement::Let {
            name: name.into(),
            span: Span::default(),
            value: LetValue::Function(FunctionDeclaration { parameters, body }),
        });
    }

    pub fn pattern(&mut self, name: impl Into<SmolStr>, spec: PatternSpec) {
        self.tree.statements.push(Statement::Pattern {
            name: name.into(),
            span: Span::default(),
            spec,
        });
    }

    pub fn expr_statement(&mut self, expr: ExprId) {
        self.tree.statements.push(Statement::Expr(expr));
    }

    /// A function body block from statements built on this same arena.
    pub fn block(&self, statements: Vec<Statement>) -> FunctionBlock {
        FunctionBlock { statements }
    }

    pub fn finish(self) -> SyntaxTree {
        self.tree
    }

    // ------------------------------------------------------------------
    // Small conveniences used heavily by tests
    // ------------------------------------------------------------------

    pub fn item(&self, value: ExprId) -> ProjectionItem {
        ProjectionItem::bare(value)
    }

    pub fn named_item(&self, name: impl Into<SmolStr>, value: ExprId) -> ProjectionItem {
        ProjectionItem::named(name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_allocates_sequential_ids() {
        let mut b = TreeBuilder::new();
        let a = b.lit_long(1);
        let c = b.name("x");
        let d = b.binary(OperatorKind::Add, a, c);
        b.expr_statement(d);
        let tree = b.finish();
        assert_eq!(a, ExprId(0));
        assert_eq!(c, ExprId(1));
        assert_eq!(d, ExprId(2));
        assert_eq!(tree.statements().len(), 1);
        assert!(matches!(tree.expr(d), Expr::Binary { .. }));
    }

    #[test]
    fn test_spans_default_then_set() {
        let mut b = TreeBuilder::new();
        let n = b.name("T");
        b.set_span(n, Span::new(0, 1));
        b.expr_statement(n);
        let tree = b.finish();
        assert_eq!(tree.span(n), Span::new(0, 1));
    }
}
