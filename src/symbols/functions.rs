//! Functions, operators, parameters, and signatures.

use std::fmt;
use std::sync::{Arc, OnceLock};

use smol_str::SmolStr;

use super::types::{TableSymbol, TypeSymbol};
use crate::syntax::{FunctionBlock, Literal, OperatorKind, SyntaxTree};

// ============================================================================
// PARAMETERS
// ============================================================================

/// How a parameter constrains its argument's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterTypeKind {
    /// One of the explicitly declared types.
    Declared,
    /// Any scalar.
    Scalar,
    /// int or long.
    Integer,
    /// real or decimal.
    RealOrDecimal,
    /// string or dynamic.
    StringOrDynamic,
    /// int, long or dynamic.
    IntegerOrDynamic,
    /// Any numeric scalar.
    Number,
    /// Numeric, datetime or timespan.
    Summable,
    /// Any tabular value.
    Tabular,
    /// A table with exactly one column.
    SingleColumnTable,
    /// A database reference.
    Database,
    /// A cluster reference.
    Cluster,
    /// Any scalar except bool.
    NotBool,
    /// Any scalar except real and bool.
    NotRealOrBool,
    /// Any scalar except dynamic.
    NotDynamic,
    /// Same type as the argument bound to parameter 0.
    Parameter0,
    /// Same type as the argument bound to parameter 1.
    Parameter1,
    /// Same type as the argument bound to parameter 2.
    Parameter2,
    /// Participates in the common-scalar return computation.
    CommonScalar,
    /// Common scalar, dynamic also accepted.
    CommonScalarOrDynamic,
    /// Common numeric scalar.
    CommonNumber,
    /// Common summable scalar.
    CommonSummable,
}

/// What syntactic shape the argument must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArgumentKind {
    /// Any expression.
    #[default]
    Expression,
    /// A column reference from the row scope.
    Column,
    /// A constant expression.
    Constant,
    /// A literal.
    Literal,
    /// A non-empty literal.
    LiteralNotEmpty,
    /// The star expression.
    Star,
}

/// One declared parameter of a signature.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: SmolStr,
    pub type_kind: ParameterTypeKind,
    /// Accepted types when `type_kind` is `Declared`.
    pub declared_types: Vec<TypeSymbol>,
    pub argument_kind: ArgumentKind,
    pub is_optional: bool,
    pub is_repeatable: bool,
    /// Enumerated accepted literal values, if restricted.
    pub values: Vec<SmolStr>,
    pub case_sensitive_values: bool,
    /// A literal that counts as "use the default value".
    pub default_value_indicator: Option<SmolStr>,
}

impl Parameter {
    pub fn declared(name: impl Into<SmolStr>, types: Vec<TypeSymbol>) -> Self {
        Self {
            name: name.into(),
            type_kind: ParameterTypeKind::Declared,
            declared_types: types,
            argument_kind: ArgumentKind::Expression,
            is_optional: false,
            is_repeatable: false,
            values: Vec::new(),
            case_sensitive_values: false,
            default_value_indicator: None,
        }
    }

    pub fn of_kind(name: impl Into<SmolStr>, type_kind: ParameterTypeKind) -> Self {
        Self {
            name: name.into(),
            type_kind,
            declared_types: Vec::new(),
            argument_kind: ArgumentKind::Expression,
            is_optional: false,
            is_repeatable: false,
            values: Vec::new(),
            case_sensitive_values: false,
            default_value_indicator: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.is_repeatable = true;
        self
    }

    pub fn with_argument_kind(mut self, kind: ArgumentKind) -> Self {
        self.argument_kind = kind;
        self
    }

    pub fn with_values(mut self, values: Vec<SmolStr>, case_sensitive: bool) -> Self {
        self.values = values;
        self.case_sensitive_values = case_sensitive;
        self
    }

    pub fn with_default_indicator(mut self, indicator: impl Into<SmolStr>) -> Self {
        self.default_value_indicator = Some(indicator.into());
        self
    }
}

// ============================================================================
// FUNCTION BODIES AND FACTS
// ============================================================================

/// The body of a computed-return signature.
#[derive(Debug, Clone)]
pub enum FunctionBody {
    /// A `let`-bound function: statements in the declaring tree's arena.
    Block(FunctionBlock),
    /// A stored function body as text, parsed on demand through the
    /// catalog's body parser.
    Text(SmolStr),
    /// A stored function body already parsed into its own tree.
    Parsed(Arc<SyntaxTree>),
}

/// Facts discovered while expanding a body, kept as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunctionBodyFacts(u8);

impl FunctionBodyFacts {
    pub const NONE: FunctionBodyFacts = FunctionBodyFacts(0);
    /// The body references `cluster(...)`.
    pub const CLUSTER: FunctionBodyFacts = FunctionBodyFacts(1 << 0);
    /// The body references `database(...)`.
    pub const DATABASE: FunctionBodyFacts = FunctionBodyFacts(1 << 1);
    /// The body calls `table(...)` with a qualified path.
    pub const QUALIFIED_TABLE: FunctionBodyFacts = FunctionBodyFacts(1 << 2);
    /// The body calls `table(...)` unqualified (dynamic-scope lookup).
    pub const UNQUALIFIED_TABLE: FunctionBodyFacts = FunctionBodyFacts(1 << 3);
    /// The result schema depends on the argument types.
    pub const VARIABLE_RETURN: FunctionBodyFacts = FunctionBodyFacts(1 << 4);

    pub fn set(&mut self, flag: FunctionBodyFacts) {
        self.0 |= flag.0;
    }

    pub fn has(self, flag: FunctionBodyFacts) -> bool {
        self.0 & flag.0 != 0
    }

    pub fn union(self, other: FunctionBodyFacts) -> FunctionBodyFacts {
        FunctionBodyFacts(self.0 | other.0)
    }
}

// ============================================================================
// RETURN KINDS
// ============================================================================

/// Inputs available to a custom return-type closure.
pub struct CustomReturnContext<'a> {
    /// Bound argument types, in call order.
    pub argument_types: &'a [TypeSymbol],
    /// Literal argument values where the argument was a literal.
    pub argument_literals: &'a [Option<Literal>],
    /// The row scope in effect at the call, if any.
    pub row_scope: Option<&'a Arc<TableSymbol>>,
}

/// A custom schema function (used by plug-ins like `bag_unpack`).
pub type CustomReturn = Arc<dyn Fn(&CustomReturnContext<'_>) -> TypeSymbol + Send + Sync>;

/// How a signature determines its return type.
#[derive(Clone)]
pub enum ReturnKind {
    /// A fixed declared type.
    Declared(TypeSymbol),
    /// Computed by expanding the function body.
    Computed(FunctionBody),
    /// The type of the argument bound to the indexed parameter.
    Parameter0,
    Parameter1,
    Parameter2,
    /// The type of the last parameter's argument.
    ParameterN,
    /// The type named by the last parameter's `typeof` literal.
    ParameterNLiteral,
    /// Parameter 0's type widened through the scalar lattice.
    Parameter0Promoted,
    /// The common scalar across `Common*`-kind parameters.
    Common,
    /// The widest numeric scalar among numeric arguments.
    Widest,
    /// Evaluate parameter 0's string literal against the catalog.
    Parameter0Cluster,
    Parameter0Database,
    Parameter0Table,
    /// Delegate to the signature's own schema closure.
    Custom(CustomReturn),
}

impl fmt::Debug for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnKind::Declared(t) => write!(f, "Declared({t})"),
            ReturnKind::Computed(_) => write!(f, "Computed"),
            ReturnKind::Parameter0 => write!(f, "Parameter0"),
            ReturnKind::Parameter1 => write!(f, "Parameter1"),
            ReturnKind::Parameter2 => write!(f, "Parameter2"),
            ReturnKind::ParameterN => write!(f, "ParameterN"),
            ReturnKind::ParameterNLiteral => write!(f, "ParameterNLiteral"),
            ReturnKind::Parameter0Promoted => write!(f, "Parameter0Promoted"),
            ReturnKind::Common => write!(f, "Common"),
            ReturnKind::Widest => write!(f, "Widest"),
            ReturnKind::Parameter0Cluster => write!(f, "Parameter0Cluster"),
            ReturnKind::Parameter0Database => write!(f, "Parameter0Database"),
            ReturnKind::Parameter0Table => write!(f, "Parameter0Table"),
            ReturnKind::Custom(_) => write!(f, "Custom"),
        }
    }
}

// ============================================================================
// SIGNATURES
// ============================================================================

/// One overload of a function or operator.
#[derive(Debug)]
pub struct Signature {
    /// Display name of the owning symbol.
    pub symbol_name: SmolStr,
    pub parameters: Vec<Parameter>,
    pub return_kind: ReturnKind,
    /// Named arguments allowed (user-defined functions only).
    pub named_arguments_allowed: bool,
    /// Facts from the first expansion of a computed body.
    body_facts: OnceLock<FunctionBodyFacts>,
    /// Cached return type when expansion showed it does not vary.
    non_variable_return: OnceLock<TypeSymbol>,
}

impl Signature {
    pub fn new(
        symbol_name: impl Into<SmolStr>,
        parameters: Vec<Parameter>,
        return_kind: ReturnKind,
    ) -> Arc<Self> {
        Arc::new(Self {
            symbol_name: symbol_name.into(),
            parameters,
            return_kind,
            named_arguments_allowed: false,
            body_facts: OnceLock::new(),
            non_variable_return: OnceLock::new(),
        })
    }

    pub fn with_named_arguments(
        symbol_name: impl Into<SmolStr>,
        parameters: Vec<Parameter>,
        return_kind: ReturnKind,
    ) -> Arc<Self> {
        Arc::new(Self {
            symbol_name: symbol_name.into(),
            parameters,
            return_kind,
            named_arguments_allowed: true,
            body_facts: OnceLock::new(),
            non_variable_return: OnceLock::new(),
        })
    }

    pub fn min_argument_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| !p.is_optional && !p.is_repeatable)
            .count()
            + usize::from(
                self.parameters
                    .iter()
                    .any(|p| p.is_repeatable && !p.is_optional),
            )
    }

    pub fn max_argument_count(&self) -> usize {
        if self.parameters.iter().any(|p| p.is_repeatable) {
            usize::MAX
        } else {
            self.parameters.len()
        }
    }

    pub fn accepts_count(&self, count: usize) -> bool {
        count >= self.min_argument_count() && count <= self.max_argument_count()
    }

    /// The parameter an argument position maps to, with the last
    /// parameter absorbing repeats.
    pub fn parameter_for_position(&self, position: usize) -> Option<&Parameter> {
        if position < self.parameters.len() {
            self.parameters.get(position)
        } else if self.parameters.last().is_some_and(|p| p.is_repeatable) {
            self.parameters.last()
        } else {
            None
        }
    }

    pub fn find_parameter(&self, name: &str) -> Option<usize> {
        self.parameters
            .iter()
            .position(|p| crate::base::name_eq(&p.name, name))
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.return_kind, ReturnKind::Computed(_))
    }

    pub fn computed_body(&self) -> Option<&FunctionBody> {
        match &self.return_kind {
            ReturnKind::Computed(body) => Some(body),
            _ => None,
        }
    }

    pub fn body_facts(&self) -> Option<FunctionBodyFacts> {
        self.body_facts.get().copied()
    }

    /// Record body facts from the first expansion; later calls keep the
    /// first value (facts depend only on the body text).
    pub fn set_body_facts(&self, facts: FunctionBodyFacts) {
        let _ = self.body_facts.set(facts);
    }

    pub fn non_variable_return(&self) -> Option<&TypeSymbol> {
        self.non_variable_return.get()
    }

    pub fn set_non_variable_return(&self, ty: TypeSymbol) {
        let _ = self.non_variable_return.set(ty);
    }
}

// ============================================================================
// FUNCTIONS AND OPERATORS
// ============================================================================

/// Where a function symbol came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionOrigin {
    BuiltIn,
    Database,
    Local,
}

/// How the output column name of a call is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultNameKind {
    /// No derived name; callers fall back to positional naming.
    #[default]
    None,
    /// The single argument's column name (`any(x)` → `x`).
    OnlyArgument,
    /// `prefix_arg` (`sum(x)` → `sum_x`).
    PrefixAndOnlyArgument,
    /// Just the prefix (`count()` → `count_`).
    PrefixOnly,
    /// The first argument's value when it is a column reference.
    FirstArgumentValueIfColumn,
}

/// A function, aggregate, or plug-in: a named signature collection.
#[derive(Debug)]
pub struct FunctionSymbol {
    pub name: SmolStr,
    pub signatures: Vec<Arc<Signature>>,
    pub origin: FunctionOrigin,
    pub is_aggregate: bool,
    pub is_plugin: bool,
    pub is_constant_foldable: bool,
    pub result_name_kind: ResultNameKind,
    pub result_name_prefix: Option<SmolStr>,
}

impl FunctionSymbol {
    pub fn new(
        name: impl Into<SmolStr>,
        signatures: Vec<Arc<Signature>>,
        origin: FunctionOrigin,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            signatures,
            origin,
            is_aggregate: false,
            is_plugin: false,
            is_constant_foldable: false,
            result_name_kind: ResultNameKind::None,
            result_name_prefix: None,
        })
    }

    pub fn min_argument_count(&self) -> usize {
        self.signatures
            .iter()
            .map(|s| s.min_argument_count())
            .min()
            .unwrap_or(0)
    }
}

/// A built-in scalar operator: a signature collection per kind.
#[derive(Debug)]
pub struct OperatorSymbol {
    pub kind: OperatorKind,
    pub signatures: Vec<Arc<Signature>>,
}

impl OperatorSymbol {
    pub fn new(kind: OperatorKind, signatures: Vec<Arc<Signature>>) -> Arc<Self> {
        Arc::new(Self { kind, signatures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::types::TypeSymbol;

    #[test]
    fn test_argument_counts() {
        let sig = Signature::new(
            "f",
            vec![
                Parameter::declared("a", vec![TypeSymbol::LONG]),
                Parameter::declared("b", vec![TypeSymbol::LONG]).optional(),
            ],
            ReturnKind::Declared(TypeSymbol::LONG),
        );
        assert_eq!(sig.min_argument_count(), 1);
        assert_eq!(sig.max_argument_count(), 2);
        assert!(sig.accepts_count(1));
        assert!(sig.accepts_count(2));
        assert!(!sig.accepts_count(0));
        assert!(!sig.accepts_count(3));
    }

    #[test]
    fn test_repeatable_parameter_absorbs_tail() {
        let sig = Signature::new(
            "strcat",
            vec![Parameter::of_kind("arg", ParameterTypeKind::Scalar).repeatable()],
            ReturnKind::Declared(TypeSymbol::STRING),
        );
        assert_eq!(sig.min_argument_count(), 1);
        assert_eq!(sig.max_argument_count(), usize::MAX);
        assert!(sig.parameter_for_position(7).is_some());
    }

    #[test]
    fn test_body_facts_first_write_wins() {
        let sig = Signature::new(
            "f",
            vec![],
            ReturnKind::Computed(FunctionBody::Text("T | count".into())),
        );
        let mut facts = FunctionBodyFacts::NONE;
        facts.set(FunctionBodyFacts::VARIABLE_RETURN);
        sig.set_body_facts(facts);
        sig.set_body_facts(FunctionBodyFacts::NONE);
        assert!(sig.body_facts().unwrap().has(FunctionBodyFacts::VARIABLE_RETURN));
    }
}
