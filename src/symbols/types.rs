//! Type symbols: columns, tables, tuples, and the result-type enum.
//!
//! All type values are immutable. "Mutation" (rename, retype, adding an
//! inferred column to an open table's view) always builds a new value.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use super::scalars::ScalarType;
use crate::base::name_eq;

// ============================================================================
// COLUMNS
// ============================================================================

/// An immutable column: case-preserving name, case-insensitive lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSymbol {
    pub name: SmolStr,
    pub column_type: TypeSymbol,
}

impl ColumnSymbol {
    pub fn new(name: impl Into<SmolStr>, column_type: TypeSymbol) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            column_type,
        })
    }

    pub fn scalar(name: impl Into<SmolStr>, scalar: ScalarType) -> Arc<Self> {
        Self::new(name, TypeSymbol::Scalar(scalar))
    }

    /// A copy with a different name.
    pub fn with_name(&self, name: impl Into<SmolStr>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            column_type: self.column_type.clone(),
        })
    }

    /// A copy with a different type.
    pub fn with_type(&self, column_type: TypeSymbol) -> Arc<Self> {
        Arc::new(Self {
            name: self.name.clone(),
            column_type,
        })
    }
}

// ============================================================================
// TABLES AND TUPLES
// ============================================================================

/// An ordered column list; `is_open` permits undeclared columns, which
/// the binder infers as `dynamic` on reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSymbol {
    pub name: SmolStr,
    pub columns: Vec<Arc<ColumnSymbol>>,
    pub is_open: bool,
}

impl TableSymbol {
    pub fn new(name: impl Into<SmolStr>, columns: Vec<Arc<ColumnSymbol>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            columns,
            is_open: false,
        })
    }

    pub fn open(name: impl Into<SmolStr>, columns: Vec<Arc<ColumnSymbol>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            columns,
            is_open: true,
        })
    }

    /// An anonymous schema (operator outputs).
    pub fn schema(columns: Vec<Arc<ColumnSymbol>>) -> Arc<Self> {
        Self::new("", columns)
    }

    pub fn find_column(&self, name: &str) -> Option<&Arc<ColumnSymbol>> {
        self.columns.iter().find(|c| name_eq(&c.name, name))
    }

    /// A copy with one more column appended (open-table inference).
    pub fn with_column(&self, column: Arc<ColumnSymbol>) -> Arc<Self> {
        let mut columns = self.columns.clone();
        columns.push(column);
        Arc::new(Self {
            name: self.name.clone(),
            columns,
            is_open: self.is_open,
        })
    }

    /// Structural display: `(a: long, b: string)`.
    pub fn display_schema(&self) -> String {
        let mut s = String::from("(");
        for (i, c) in self.columns.iter().enumerate() {
            if i > 0 {
                s.push_str(", ");
            }
            s.push_str(&c.name);
            s.push_str(": ");
            s.push_str(&c.column_type.display_name());
        }
        s.push(')');
        s
    }
}

/// The value of a whole-row reference (`$left`, `$right`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleSymbol {
    pub columns: Vec<Arc<ColumnSymbol>>,
}

impl TupleSymbol {
    pub fn new(columns: Vec<Arc<ColumnSymbol>>) -> Arc<Self> {
        Arc::new(Self { columns })
    }

    pub fn from_table(table: &TableSymbol) -> Arc<Self> {
        Self::new(table.columns.clone())
    }

    pub fn find_column(&self, name: &str) -> Option<&Arc<ColumnSymbol>> {
        self.columns.iter().find(|c| name_eq(&c.name, name))
    }
}

// ============================================================================
// RESULT TYPES
// ============================================================================

/// The type attached to every bound expression.
///
/// Never absent after binding: unknown is `Error`. Symbols that are not
/// values (databases, functions referenced without invocation) carry
/// `Void`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSymbol {
    Scalar(ScalarType),
    Table(Arc<TableSymbol>),
    Tuple(Arc<TupleSymbol>),
    Void,
    Error,
}

impl TypeSymbol {
    pub const BOOL: TypeSymbol = TypeSymbol::Scalar(ScalarType::Bool);
    pub const INT: TypeSymbol = TypeSymbol::Scalar(ScalarType::Int);
    pub const LONG: TypeSymbol = TypeSymbol::Scalar(ScalarType::Long);
    pub const REAL: TypeSymbol = TypeSymbol::Scalar(ScalarType::Real);
    pub const DECIMAL: TypeSymbol = TypeSymbol::Scalar(ScalarType::Decimal);
    pub const STRING: TypeSymbol = TypeSymbol::Scalar(ScalarType::String);
    pub const DATETIME: TypeSymbol = TypeSymbol::Scalar(ScalarType::DateTime);
    pub const TIMESPAN: TypeSymbol = TypeSymbol::Scalar(ScalarType::TimeSpan);
    pub const DYNAMIC: TypeSymbol = TypeSymbol::Scalar(ScalarType::Dynamic);
    pub const GUID: TypeSymbol = TypeSymbol::Scalar(ScalarType::Guid);
    pub const TYPE: TypeSymbol = TypeSymbol::Scalar(ScalarType::Type);

    pub fn is_error(&self) -> bool {
        matches!(self, TypeSymbol::Error)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, TypeSymbol::Scalar(_))
    }

    pub fn is_table(&self) -> bool {
        matches!(self, TypeSymbol::Table(_))
    }

    pub fn as_scalar(&self) -> Option<ScalarType> {
        match self {
            TypeSymbol::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Arc<TableSymbol>> {
        match self {
            TypeSymbol::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, TypeSymbol::Scalar(ScalarType::Dynamic))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            TypeSymbol::Scalar(ScalarType::Bool) | TypeSymbol::Scalar(ScalarType::Dynamic)
        )
    }

    /// Display name for diagnostics.
    pub fn display_name(&self) -> SmolStr {
        match self {
            TypeSymbol::Scalar(s) => SmolStr::from(s.name()),
            TypeSymbol::Table(t) => {
                if t.name.is_empty() {
                    SmolStr::from(t.display_schema())
                } else {
                    t.name.clone()
                }
            }
            TypeSymbol::Tuple(_) => SmolStr::from("tuple"),
            TypeSymbol::Void => SmolStr::from("void"),
            TypeSymbol::Error => SmolStr::from("error"),
        }
    }

    /// A stable structural key for fingerprints and cache lookups.
    pub fn cache_key(&self) -> String {
        match self {
            TypeSymbol::Scalar(s) => s.name().to_string(),
            TypeSymbol::Table(t) => {
                let mut key = String::from("T[");
                for c in &t.columns {
                    key.push_str(&c.name);
                    key.push(':');
                    key.push_str(&c.column_type.cache_key());
                    key.push(',');
                }
                if t.is_open {
                    key.push('*');
                }
                key.push(']');
                key
            }
            TypeSymbol::Tuple(t) => {
                let mut key = String::from("R[");
                for c in &t.columns {
                    key.push_str(&c.name);
                    key.push(':');
                    key.push_str(&c.column_type.cache_key());
                    key.push(',');
                }
                key.push(']');
                key
            }
            TypeSymbol::Void => "void".to_string(),
            TypeSymbol::Error => "error".to_string(),
        }
    }
}

impl fmt::Display for TypeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl From<ScalarType> for TypeSymbol {
    fn from(s: ScalarType) -> Self {
        TypeSymbol::Scalar(s)
    }
}
