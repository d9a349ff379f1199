//! Scalar operator kinds.
//!
//! Every unary/binary/set operator the grammar can produce. The binder
//! resolves each kind against its built-in signature set exactly like a
//! function call.

use std::fmt;

/// Coarse grouping of operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCategory {
    Arithmetic,
    Comparison,
    Regex,
    String,
    Set,
    Logical,
    Search,
}

/// The kind of a built-in scalar operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    UnaryPlus,
    UnaryMinus,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // Regex-tilde
    EqualTilde,
    BangTilde,
    MatchRegex,

    // String (case-insensitive, Cs = case-sensitive, Not = negated)
    Contains,
    NotContains,
    ContainsCs,
    NotContainsCs,
    StartsWith,
    NotStartsWith,
    StartsWithCs,
    NotStartsWithCs,
    EndsWith,
    NotEndsWith,
    EndsWithCs,
    NotEndsWithCs,
    Has,
    NotHas,
    HasCs,
    NotHasCs,
    HasPrefix,
    NotHasPrefix,
    HasPrefixCs,
    NotHasPrefixCs,
    HasSuffix,
    NotHasSuffix,
    HasSuffixCs,
    NotHasSuffixCs,
    Like,
    NotLike,
    LikeCs,
    NotLikeCs,

    // Set
    In,
    InCs,
    NotIn,
    NotInCs,
    Between,
    NotBetween,
    HasAny,

    // Logical
    And,
    Or,

    // Full-text search predicate
    Search,
}

impl OperatorKind {
    pub fn category(self) -> OperatorCategory {
        use OperatorKind::*;
        match self {
            Add | Subtract | Multiply | Divide | Modulo | UnaryPlus | UnaryMinus => {
                OperatorCategory::Arithmetic
            }
            Equal | NotEqual | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
                OperatorCategory::Comparison
            }
            EqualTilde | BangTilde | MatchRegex => OperatorCategory::Regex,
            In | InCs | NotIn | NotInCs | Between | NotBetween | HasAny => OperatorCategory::Set,
            And | Or => OperatorCategory::Logical,
            Search => OperatorCategory::Search,
            _ => OperatorCategory::String,
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(self, OperatorKind::UnaryPlus | OperatorKind::UnaryMinus)
    }

    /// The display name used in diagnostics and derived column names.
    pub fn display_name(self) -> &'static str {
        use OperatorKind::*;
        match self {
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Divide => "/",
            Modulo => "%",
            UnaryPlus => "+",
            UnaryMinus => "-",
            Equal => "==",
            NotEqual => "!=",
            LessThan => "<",
            LessThanOrEqual => "<=",
            GreaterThan => ">",
            GreaterThanOrEqual => ">=",
            EqualTilde => "=~",
            BangTilde => "!~",
            MatchRegex => "matches regex",
            Contains => "contains",
            NotContains => "!contains",
            ContainsCs => "contains_cs",
            NotContainsCs => "!contains_cs",
            StartsWith => "startswith",
            NotStartsWith => "!startswith",
            StartsWithCs => "startswith_cs",
            NotStartsWithCs => "!startswith_cs",
            EndsWith => "endswith",
            NotEndsWith => "!endswith",
            EndsWithCs => "endswith_cs",
            NotEndsWithCs => "!endswith_cs",
            Has => "has",
            NotHas => "!has",
            HasCs => "has_cs",
            NotHasCs => "!has_cs",
            HasPrefix => "hasprefix",
            NotHasPrefix => "!hasprefix",
            HasPrefixCs => "hasprefix_cs",
            NotHasPrefixCs => "!hasprefix_cs",
            HasSuffix => "hassuffix",
            NotHasSuffix => "!hassuffix",
            HasSuffixCs => "hassuffix_cs",
            NotHasSuffixCs => "!hassuffix_cs",
            Like => "like",
            NotLike => "!like",
            LikeCs => "like_cs",
            NotLikeCs => "!like_cs",
            In => "in~",
            InCs => "in",
            NotIn => "!in~",
            NotInCs => "!in",
            Between => "between",
            NotBetween => "!between",
            HasAny => "has_any",
            And => "and",
            Or => "or",
            Search => "*",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
