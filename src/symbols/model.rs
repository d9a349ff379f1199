//! Entity symbols and the closed symbol variant set.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use super::functions::{FunctionSymbol, OperatorSymbol};
use super::types::{ColumnSymbol, TableSymbol, TupleSymbol, TypeSymbol};
use crate::base::name_eq;
use crate::syntax::{Literal, PatternSpec};

// ============================================================================
// ENTITY SYMBOLS
// ============================================================================

/// A database: tables and stored functions; `is_open` permits
/// undeclared tables, synthesized on reference.
#[derive(Debug, Clone)]
pub struct DatabaseSymbol {
    pub name: SmolStr,
    pub tables: Vec<Arc<TableSymbol>>,
    pub functions: Vec<Arc<FunctionSymbol>>,
    pub is_open: bool,
}

impl DatabaseSymbol {
    pub fn new(
        name: impl Into<SmolStr>,
        tables: Vec<Arc<TableSymbol>>,
        functions: Vec<Arc<FunctionSymbol>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            tables,
            functions,
            is_open: false,
        })
    }

    pub fn open(name: impl Into<SmolStr>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            tables: Vec::new(),
            functions: Vec::new(),
            is_open: true,
        })
    }

    pub fn find_table(&self, name: &str) -> Option<&Arc<TableSymbol>> {
        self.tables.iter().find(|t| name_eq(&t.name, name))
    }

    pub fn find_function(&self, name: &str) -> Option<&Arc<FunctionSymbol>> {
        self.functions.iter().find(|f| name_eq(&f.name, name))
    }
}

/// A cluster of databases.
#[derive(Debug, Clone)]
pub struct ClusterSymbol {
    pub name: SmolStr,
    pub databases: Vec<Arc<DatabaseSymbol>>,
    pub is_open: bool,
}

impl ClusterSymbol {
    pub fn new(name: impl Into<SmolStr>, databases: Vec<Arc<DatabaseSymbol>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            databases,
            is_open: false,
        })
    }

    pub fn open(name: impl Into<SmolStr>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            databases: Vec::new(),
            is_open: true,
        })
    }

    pub fn find_database(&self, name: &str) -> Option<&Arc<DatabaseSymbol>> {
        self.databases.iter().find(|d| name_eq(&d.name, name))
    }
}

/// A `let`-bound value, `as`-named table, or expanded function
/// parameter.
#[derive(Debug, Clone)]
pub struct VariableSymbol {
    pub name: SmolStr,
    pub var_type: TypeSymbol,
    pub is_constant: bool,
    pub constant_value: Option<Literal>,
}

impl VariableSymbol {
    pub fn new(name: impl Into<SmolStr>, var_type: TypeSymbol) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            var_type,
            is_constant: false,
            constant_value: None,
        })
    }

    pub fn constant(
        name: impl Into<SmolStr>,
        var_type: TypeSymbol,
        value: Option<Literal>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            var_type,
            is_constant: true,
            constant_value: value,
        })
    }
}

/// A `declare pattern` symbol: typed parameters and literal-matched
/// declarations (bodies live in the declaring tree's arena).
#[derive(Debug, Clone)]
pub struct PatternSymbol {
    pub name: SmolStr,
    pub spec: Arc<PatternSpec>,
}

impl PatternSymbol {
    pub fn new(name: impl Into<SmolStr>, spec: PatternSpec) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            spec: Arc::new(spec),
        })
    }
}

/// The unordered set behind an ambiguous name. Never a result type.
#[derive(Debug, Clone)]
pub struct GroupSymbol {
    pub name: SmolStr,
    pub members: Vec<Symbol>,
}

impl GroupSymbol {
    pub fn new(name: impl Into<SmolStr>, members: Vec<Symbol>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            members,
        })
    }
}

// ============================================================================
// THE SYMBOL VARIANT SET
// ============================================================================

/// Any named thing the binder can resolve a reference to.
#[derive(Debug, Clone)]
pub enum Symbol {
    Column(Arc<ColumnSymbol>),
    Table(Arc<TableSymbol>),
    Tuple(Arc<TupleSymbol>),
    Database(Arc<DatabaseSymbol>),
    Cluster(Arc<ClusterSymbol>),
    Function(Arc<FunctionSymbol>),
    Operator(Arc<OperatorSymbol>),
    Pattern(Arc<PatternSymbol>),
    Variable(Arc<VariableSymbol>),
    Group(Arc<GroupSymbol>),
}

/// Discriminant for match masks and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Column,
    Table,
    Tuple,
    Database,
    Cluster,
    Function,
    Operator,
    Pattern,
    Variable,
    Group,
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Column(s) => &s.name,
            Symbol::Table(s) => &s.name,
            Symbol::Tuple(_) => "",
            Symbol::Database(s) => &s.name,
            Symbol::Cluster(s) => &s.name,
            Symbol::Function(s) => &s.name,
            Symbol::Operator(s) => s.kind.display_name(),
            Symbol::Pattern(s) => &s.name,
            Symbol::Variable(s) => &s.name,
            Symbol::Group(s) => &s.name,
        }
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Column(_) => SymbolKind::Column,
            Symbol::Table(_) => SymbolKind::Table,
            Symbol::Tuple(_) => SymbolKind::Tuple,
            Symbol::Database(_) => SymbolKind::Database,
            Symbol::Cluster(_) => SymbolKind::Cluster,
            Symbol::Function(_) => SymbolKind::Function,
            Symbol::Operator(_) => SymbolKind::Operator,
            Symbol::Pattern(_) => SymbolKind::Pattern,
            Symbol::Variable(_) => SymbolKind::Variable,
            Symbol::Group(_) => SymbolKind::Group,
        }
    }

    /// The type this symbol has when referenced as an expression.
    ///
    /// Entities that are not values (databases, clusters, functions,
    /// patterns) are `Void`; a `Group` is `Error` (invariant: a group
    /// never becomes a legal result type).
    pub fn result_type(&self) -> TypeSymbol {
        match self {
            Symbol::Column(c) => c.column_type.clone(),
            Symbol::Table(t) => TypeSymbol::Table(t.clone()),
            Symbol::Tuple(t) => TypeSymbol::Tuple(t.clone()),
            Symbol::Variable(v) => v.var_type.clone(),
            Symbol::Database(_) | Symbol::Cluster(_) | Symbol::Function(_)
            | Symbol::Operator(_) | Symbol::Pattern(_) => TypeSymbol::Void,
            Symbol::Group(_) => TypeSymbol::Error,
        }
    }

    pub fn as_function(&self) -> Option<&Arc<FunctionSymbol>> {
        match self {
            Symbol::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Arc<TableSymbol>> {
        match self {
            Symbol::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_column(&self) -> Option<&Arc<ColumnSymbol>> {
        match self {
            Symbol::Column(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.kind(), self.name())
    }
}

// ============================================================================
// MATCH MASK
// ============================================================================

/// What categories a lookup is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolMatch(u16);

impl SymbolMatch {
    pub const COLUMN: SymbolMatch = SymbolMatch(1 << 0);
    pub const TABLE: SymbolMatch = SymbolMatch(1 << 1);
    pub const FUNCTION: SymbolMatch = SymbolMatch(1 << 2);
    pub const LOCAL: SymbolMatch = SymbolMatch(1 << 3);
    pub const DATABASE: SymbolMatch = SymbolMatch(1 << 4);
    pub const CLUSTER: SymbolMatch = SymbolMatch(1 << 5);
    pub const PATTERN: SymbolMatch = SymbolMatch(1 << 6);

    pub const NONE: SymbolMatch = SymbolMatch(0);
    pub const ANY: SymbolMatch = SymbolMatch(u16::MAX);

    /// Everything legal in expression position.
    pub const EXPRESSION: SymbolMatch = SymbolMatch(
        Self::COLUMN.0 | Self::TABLE.0 | Self::FUNCTION.0 | Self::LOCAL.0 | Self::PATTERN.0,
    );

    pub fn union(self, other: SymbolMatch) -> SymbolMatch {
        SymbolMatch(self.0 | other.0)
    }

    pub fn contains(self, other: SymbolMatch) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether a symbol of the given kind passes this mask.
    pub fn accepts(self, kind: SymbolKind) -> bool {
        let wanted = match kind {
            SymbolKind::Column | SymbolKind::Tuple => Self::COLUMN,
            SymbolKind::Table => Self::TABLE,
            SymbolKind::Function | SymbolKind::Operator => Self::FUNCTION,
            SymbolKind::Variable => Self::LOCAL,
            SymbolKind::Database => Self::DATABASE,
            SymbolKind::Cluster => Self::CLUSTER,
            SymbolKind::Pattern => Self::PATTERN,
            SymbolKind::Group => return true,
        };
        self.0 & wanted.0 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::scalars::ScalarType;

    #[test]
    fn test_group_result_type_is_error() {
        let c = ColumnSymbol::scalar("x", ScalarType::Long);
        let group = GroupSymbol::new(
            "x",
            vec![Symbol::Column(c.clone()), Symbol::Column(c)],
        );
        assert!(Symbol::Group(group).result_type().is_error());
    }

    #[test]
    fn test_match_mask() {
        let m = SymbolMatch::COLUMN.union(SymbolMatch::LOCAL);
        assert!(m.accepts(SymbolKind::Column));
        assert!(m.accepts(SymbolKind::Variable));
        assert!(!m.accepts(SymbolKind::Table));
        assert!(SymbolMatch::EXPRESSION.accepts(SymbolKind::Function));
    }
}
