//! Scalar types and the widening lattice.

use std::fmt;

/// The closed set of scalar types.
///
/// `Type` is the type of `typeof(...)` literals. There is no null
/// scalar: a null literal binds as `Dynamic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Int,
    Long,
    Real,
    Decimal,
    String,
    DateTime,
    TimeSpan,
    Dynamic,
    Guid,
    Type,
}

impl ScalarType {
    pub const ALL: [ScalarType; 11] = [
        ScalarType::Bool,
        ScalarType::Int,
        ScalarType::Long,
        ScalarType::Real,
        ScalarType::Decimal,
        ScalarType::String,
        ScalarType::DateTime,
        ScalarType::TimeSpan,
        ScalarType::Dynamic,
        ScalarType::Guid,
        ScalarType::Type,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int => "int",
            ScalarType::Long => "long",
            ScalarType::Real => "real",
            ScalarType::Decimal => "decimal",
            ScalarType::String => "string",
            ScalarType::DateTime => "datetime",
            ScalarType::TimeSpan => "timespan",
            ScalarType::Dynamic => "dynamic",
            ScalarType::Guid => "guid",
            ScalarType::Type => "type",
        }
    }

    /// Resolve a type name as written in source, including aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        let folded = name.to_ascii_lowercase();
        Some(match folded.as_str() {
            "bool" | "boolean" => ScalarType::Bool,
            "int" | "int32" => ScalarType::Int,
            "long" | "int64" => ScalarType::Long,
            "real" | "double" => ScalarType::Real,
            "decimal" => ScalarType::Decimal,
            "string" => ScalarType::String,
            "datetime" | "date" => ScalarType::DateTime,
            "timespan" | "time" => ScalarType::TimeSpan,
            "dynamic" => ScalarType::Dynamic,
            "guid" | "uuid" | "uniqueid" => ScalarType::Guid,
            "type" => ScalarType::Type,
            _ => return None,
        })
    }

    pub fn is_integer(self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::Long)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ScalarType::Int | ScalarType::Long | ScalarType::Real | ScalarType::Decimal
        )
    }

    /// Summable types: usable with `sum`-family aggregates.
    pub fn is_summable(self) -> bool {
        self.is_numeric() || matches!(self, ScalarType::DateTime | ScalarType::TimeSpan)
    }

    /// Strict widening: `b` accepts every value of `self` losslessly.
    ///
    /// The lattice declares exactly `int → long` and `decimal → real`.
    pub fn promotes_to(self, other: ScalarType) -> bool {
        matches!(
            (self, other),
            (ScalarType::Int, ScalarType::Long) | (ScalarType::Decimal, ScalarType::Real)
        )
    }

    /// Rank used by widest-numeric return kinds; `None` for non-numeric.
    pub fn widening_rank(self) -> Option<u8> {
        match self {
            ScalarType::Int => Some(1),
            ScalarType::Long => Some(2),
            ScalarType::Decimal => Some(3),
            ScalarType::Real => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("long", Some(ScalarType::Long))]
    #[case("Double", Some(ScalarType::Real))]
    #[case("boolean", Some(ScalarType::Bool))]
    #[case("date", Some(ScalarType::DateTime))]
    #[case("time", Some(ScalarType::TimeSpan))]
    #[case("float", None)]
    fn test_from_name(#[case] name: &str, #[case] expected: Option<ScalarType>) {
        assert_eq!(ScalarType::from_name(name), expected);
    }

    #[test]
    fn test_promotions_are_exactly_two() {
        let mut pairs = Vec::new();
        for a in ScalarType::ALL {
            for b in ScalarType::ALL {
                if a.promotes_to(b) {
                    pairs.push((a, b));
                }
            }
        }
        assert_eq!(
            pairs,
            vec![
                (ScalarType::Int, ScalarType::Long),
                (ScalarType::Decimal, ScalarType::Real)
            ]
        );
    }

    #[test]
    fn test_summable_includes_temporal() {
        assert!(ScalarType::DateTime.is_summable());
        assert!(ScalarType::TimeSpan.is_summable());
        assert!(!ScalarType::String.is_summable());
        assert!(!ScalarType::Dynamic.is_summable());
    }

    #[test]
    fn test_widening_rank_order() {
        let ranks: Vec<_> = [
            ScalarType::Int,
            ScalarType::Long,
            ScalarType::Decimal,
            ScalarType::Real,
        ]
        .iter()
        .map(|t| t.widening_rank().unwrap())
        .collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
    }
}
