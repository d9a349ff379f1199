//! Diagnostics — semantic error reporting.
//!
//! Binding never fails with an `Err`: every semantic problem becomes a
//! [`Diagnostic`] attached to the offending node's semantic info or to
//! the surrounding operator. Consumers suppress their own message when
//! an operand's type is already `Error`, so only root causes surface.

use std::fmt;

use smol_str::SmolStr;

use crate::base::Span;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// The category of a semantic diagnostic.
///
/// Codes are stable (`codes` module); messages are formatted from the
/// payload at construction time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A name that resolved to nothing.
    NameNotFound { name: SmolStr },
    /// A name used where only aggregate functions are visible.
    NameNotFoundInAggregateContext { name: SmolStr },
    /// A name that resolved to more than one symbol.
    AmbiguousName { name: SmolStr },
    /// Call arity outside every signature's range.
    WrongNumberOfArguments { name: SmolStr, provided: usize },
    /// An argument whose type fits no candidate parameter.
    WrongArgumentType {
        expected: Vec<SmolStr>,
        actual: SmolStr,
    },
    /// The argument must be a literal.
    LiteralRequired,
    /// The argument must be a non-empty literal.
    NonEmptyLiteralRequired,
    /// The argument must be a constant expression.
    ConstantRequired,
    /// The argument must name a column of the row scope.
    ColumnRequired,
    /// The referenced symbol is not invocable.
    NotAFunction { name: SmolStr },
    /// A function invoked without its required argument list.
    ArgumentListRequired { name: SmolStr },
    /// An aggregate used outside summarize and friends.
    AggregateNotAllowed { name: SmolStr },
    /// An output column declared twice.
    DuplicateColumnDeclaration { name: SmolStr },
    /// A rename source that is not in the row scope.
    RenameSourceNotFound { name: SmolStr },
    /// Pattern invocation with no matching pattern signature.
    NoPatternMatch { name: SmolStr },
    /// A `typeof`/type expression that is not well formed.
    InvalidTypeExpression,
    /// `*` in a position that does not accept it.
    StarNotAllowed,
    /// `*` followed by further arguments.
    StarMustBeLastArgument,
    /// A named argument whose name is no parameter of the signature.
    UnknownNamedArgument { name: SmolStr },
    /// The same parameter supplied by name twice.
    DuplicateNamedArgument { name: SmolStr },
    /// An unnamed argument after an out-of-order named one.
    UnnamedArgumentAfterNamed,
    /// Named arguments used on a symbol that does not accept them.
    NamedArgumentsNotSupported,
    /// A required parameter with no argument.
    MissingArgument { parameter: SmolStr },
    /// A literal outside the parameter's accepted value set.
    ValueNotAllowed { values: Vec<SmolStr> },
    /// The ambiguous-overload outcome of signature matching.
    AmbiguousCall { name: SmolStr },
    /// An expression of the wrong type in a typed operator slot.
    TypeExpected { expected: SmolStr, actual: SmolStr },
    /// A boolean predicate required (where, filter conditions).
    BooleanExpected { actual: SmolStr },
    /// Tabular input required (pipe operands, tabular parameters).
    TableExpected { actual: SmolStr },
    /// join/lookup without an `on` clause where one is mandatory.
    MissingJoinOnClause,
    /// A named operator parameter that must be supplied.
    MissingRequiredNamedParameter { name: SmolStr },
    /// `$left`/`$right` outside a join context.
    NoRowContext { name: SmolStr },
    /// datatable literal count not a multiple of the column count.
    DataTableValueCountMismatch { columns: usize, values: usize },
}

impl DiagnosticKind {
    /// The stable code for this kind.
    pub fn code(&self) -> &'static str {
        use DiagnosticKind::*;
        match self {
            NameNotFound { .. } => codes::NAME_NOT_FOUND,
            NameNotFoundInAggregateContext { .. } => codes::NAME_NOT_FOUND_AGGREGATE,
            AmbiguousName { .. } => codes::AMBIGUOUS_NAME,
            WrongNumberOfArguments { .. } => codes::WRONG_NUMBER_OF_ARGUMENTS,
            WrongArgumentType { .. } => codes::WRONG_ARGUMENT_TYPE,
            LiteralRequired => codes::LITERAL_REQUIRED,
            NonEmptyLiteralRequired => codes::NON_EMPTY_LITERAL_REQUIRED,
            ConstantRequired => codes::CONSTANT_REQUIRED,
            ColumnRequired => codes::COLUMN_REQUIRED,
            NotAFunction { .. } => codes::NOT_A_FUNCTION,
            ArgumentListRequired { .. } => codes::ARGUMENT_LIST_REQUIRED,
            AggregateNotAllowed { .. } => codes::AGGREGATE_NOT_ALLOWED,
            DuplicateColumnDeclaration { .. } => codes::DUPLICATE_COLUMN,
            RenameSourceNotFound { .. } => codes::RENAME_SOURCE_NOT_FOUND,
            NoPatternMatch { .. } => codes::NO_PATTERN_MATCH,
            InvalidTypeExpression => codes::INVALID_TYPE_EXPRESSION,
            StarNotAllowed => codes::STAR_NOT_ALLOWED,
            StarMustBeLastArgument => codes::STAR_MUST_BE_LAST,
            UnknownNamedArgument { .. } => codes::UNKNOWN_NAMED_ARGUMENT,
            DuplicateNamedArgument { .. } => codes::DUPLICATE_NAMED_ARGUMENT,
            UnnamedArgumentAfterNamed => codes::UNNAMED_AFTER_NAMED,
            NamedArgumentsNotSupported => codes::NAMED_ARGUMENTS_NOT_SUPPORTED,
            MissingArgument { .. } => codes::MISSING_ARGUMENT,
            ValueNotAllowed { .. } => codes::VALUE_NOT_ALLOWED,
            AmbiguousCall { .. } => codes::AMBIGUOUS_CALL,
            TypeExpected { .. } => codes::TYPE_EXPECTED,
            BooleanExpected { .. } => codes::BOOLEAN_EXPECTED,
            TableExpected { .. } => codes::TABLE_EXPECTED,
            MissingJoinOnClause => codes::MISSING_JOIN_ON,
            MissingRequiredNamedParameter { .. } => codes::MISSING_NAMED_PARAMETER,
            NoRowContext { .. } => codes::NO_ROW_CONTEXT,
            DataTableValueCountMismatch { .. } => codes::DATATABLE_VALUE_COUNT,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use DiagnosticKind::*;
        match self {
            NameNotFound { name } => write!(f, "The name '{name}' does not refer to any known column, table, variable or function."),
            NameNotFoundInAggregateContext { name } => write!(f, "The name '{name}' does not refer to any known aggregate function."),
            AmbiguousName { name } => write!(f, "The name '{name}' refers to more than one item."),
            WrongNumberOfArguments { name, provided } => write!(f, "The function '{name}' does not accept {provided} argument(s)."),
            WrongArgumentType { expected, actual } => {
                write!(f, "The expression has the wrong type '{actual}'; expected ")?;
                for (i, t) in expected.iter().enumerate() {
                    if i > 0 {
                        write!(f, " or ")?;
                    }
                    write!(f, "'{t}'")?;
                }
                write!(f, ".")
            }
            LiteralRequired => write!(f, "The expression must be a literal value."),
            NonEmptyLiteralRequired => write!(f, "The expression must be a non-empty literal value."),
            ConstantRequired => write!(f, "The expression must be a constant."),
            ColumnRequired => write!(f, "The expression must be a column reference."),
            NotAFunction { name } => write!(f, "The name '{name}' is not a function."),
            ArgumentListRequired { name } => write!(f, "The function '{name}' requires an argument list."),
            AggregateNotAllowed { name } => write!(f, "The aggregate function '{name}' is not allowed in this context."),
            DuplicateColumnDeclaration { name } => write!(f, "A column named '{name}' is already declared."),
            RenameSourceNotFound { name } => write!(f, "The column '{name}' is not present in the current schema."),
            NoPatternMatch { name } => write!(f, "No declaration of pattern '{name}' matches the supplied arguments."),
            InvalidTypeExpression => write!(f, "The expression is not a well-formed type."),
            StarNotAllowed => write!(f, "A star expression is not allowed in this context."),
            StarMustBeLastArgument => write!(f, "A star expression must be the last argument."),
            UnknownNamedArgument { name } => write!(f, "There is no parameter named '{name}'."),
            DuplicateNamedArgument { name } => write!(f, "The parameter '{name}' is specified more than once."),
            UnnamedArgumentAfterNamed => write!(f, "An unnamed argument cannot follow an out-of-order named argument."),
            NamedArgumentsNotSupported => write!(f, "Named arguments are not supported for this function."),
            MissingArgument { parameter } => write!(f, "The argument for parameter '{parameter}' is missing."),
            ValueNotAllowed { values } => {
                write!(f, "The value must be one of: ")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{v}'")?;
                }
                write!(f, ".")
            }
            AmbiguousCall { name } => write!(f, "The call to '{name}' is ambiguous."),
            TypeExpected { expected, actual } => write!(f, "Expected a value of type '{expected}', found '{actual}'."),
            BooleanExpected { actual } => write!(f, "A boolean expression is required, found '{actual}'."),
            TableExpected { actual } => write!(f, "A tabular expression is required, found '{actual}'."),
            MissingJoinOnClause => write!(f, "The operator requires an 'on' clause."),
            MissingRequiredNamedParameter { name } => write!(f, "The required parameter '{name}' is missing."),
            NoRowContext { name } => write!(f, "The name '{name}' is only valid inside a join."),
            DataTableValueCountMismatch { columns, values } => write!(f, "The number of values ({values}) must be a multiple of the number of columns ({columns})."),
        }
    }
}

/// A semantic diagnostic with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub span: Span,
    pub message: SmolStr,
}

impl Diagnostic {
    /// Create an error diagnostic; the message is rendered immediately.
    pub fn error(kind: DiagnosticKind, span: Span) -> Self {
        let message = SmolStr::from(kind.to_string());
        Self {
            kind,
            severity: Severity::Error,
            span,
            message,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(kind: DiagnosticKind, span: Span) -> Self {
        let message = SmolStr::from(kind.to_string());
        Self {
            kind,
            severity: Severity::Warning,
            span,
            message,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Stable diagnostic codes.
///
/// ## Code Ranges
///
/// - **E0001-E0019**: name resolution
/// - **E0020-E0049**: calls, signatures, arguments
/// - **E0050-E0079**: projections and operators
pub mod codes {
    // ========================================================================
    // NAME RESOLUTION (E0001-E0019)
    // ========================================================================

    /// Undefined name.
    pub const NAME_NOT_FOUND: &str = "E0001";
    /// Undefined name in an aggregate-only context.
    pub const NAME_NOT_FOUND_AGGREGATE: &str = "E0002";
    /// Ambiguous name (multiple candidates).
    pub const AMBIGUOUS_NAME: &str = "E0003";
    /// Not a function.
    pub const NOT_A_FUNCTION: &str = "E0004";
    /// Function used without an argument list.
    pub const ARGUMENT_LIST_REQUIRED: &str = "E0005";
    /// `$left`/`$right` used outside a join.
    pub const NO_ROW_CONTEXT: &str = "E0006";

    // ========================================================================
    // CALLS AND ARGUMENTS (E0020-E0049)
    // ========================================================================

    /// Wrong number of arguments.
    pub const WRONG_NUMBER_OF_ARGUMENTS: &str = "E0020";
    /// Wrong argument type.
    pub const WRONG_ARGUMENT_TYPE: &str = "E0021";
    /// Literal required.
    pub const LITERAL_REQUIRED: &str = "E0022";
    /// Non-empty literal required.
    pub const NON_EMPTY_LITERAL_REQUIRED: &str = "E0023";
    /// Constant required.
    pub const CONSTANT_REQUIRED: &str = "E0024";
    /// Column reference required.
    pub const COLUMN_REQUIRED: &str = "E0025";
    /// Aggregate not allowed in this context.
    pub const AGGREGATE_NOT_ALLOWED: &str = "E0026";
    /// Star not allowed here.
    pub const STAR_NOT_ALLOWED: &str = "E0027";
    /// Star must be the last argument.
    pub const STAR_MUST_BE_LAST: &str = "E0028";
    /// Unknown named argument.
    pub const UNKNOWN_NAMED_ARGUMENT: &str = "E0029";
    /// Duplicate named argument.
    pub const DUPLICATE_NAMED_ARGUMENT: &str = "E0030";
    /// Unnamed argument after an out-of-order named argument.
    pub const UNNAMED_AFTER_NAMED: &str = "E0031";
    /// Named arguments unsupported for this symbol.
    pub const NAMED_ARGUMENTS_NOT_SUPPORTED: &str = "E0032";
    /// Missing argument for a required parameter.
    pub const MISSING_ARGUMENT: &str = "E0033";
    /// Literal value outside the accepted set.
    pub const VALUE_NOT_ALLOWED: &str = "E0034";
    /// Ambiguous overload.
    pub const AMBIGUOUS_CALL: &str = "E0035";
    /// No pattern declaration matches.
    pub const NO_PATTERN_MATCH: &str = "E0036";

    // ========================================================================
    // OPERATORS AND PROJECTIONS (E0050-E0079)
    // ========================================================================

    /// Duplicate output column.
    pub const DUPLICATE_COLUMN: &str = "E0050";
    /// Rename source column missing.
    pub const RENAME_SOURCE_NOT_FOUND: &str = "E0051";
    /// Malformed type expression.
    pub const INVALID_TYPE_EXPRESSION: &str = "E0052";
    /// General expected-type mismatch.
    pub const TYPE_EXPECTED: &str = "E0053";
    /// Boolean predicate required.
    pub const BOOLEAN_EXPECTED: &str = "E0054";
    /// Tabular operand required.
    pub const TABLE_EXPECTED: &str = "E0055";
    /// Missing join `on` clause.
    pub const MISSING_JOIN_ON: &str = "E0056";
    /// Missing required named operator parameter.
    pub const MISSING_NAMED_PARAMETER: &str = "E0057";
    /// datatable value/column count mismatch.
    pub const DATATABLE_VALUE_COUNT: &str = "E0058";
}
