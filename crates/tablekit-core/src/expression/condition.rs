//! Condition tree types.

use std::fmt;

use tablekit_model::AttributeValue;

/// How a condition joins its preceding sibling (or how a nested group
/// attaches to its parent leaf).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Join {
    /// Logical AND (the default).
    #[default]
    And,
    /// Logical OR.
    Or,
}

impl Join {
    /// The expression keyword for this join.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Filter operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `=`
    Equal,
    /// `<>`
    NotEqual,
    /// `<`
    LowerThan,
    /// `<=`
    LowerOrEqualThan,
    /// `>`
    BiggerThan,
    /// `>=`
    BiggerOrEqualThan,
    /// `begins_with(path, prefix)`
    BeginsWith,
    /// `path BETWEEN low AND high`
    Between,
    /// `contains(path, operand)`
    Contains,
    /// `path IN (...)`
    In,
    /// `attribute_exists(path)`
    Exists,
    /// `attribute_not_exists(path)`
    NotExists,
}

impl Operation {
    /// The comparator token for plain comparison operations.
    #[must_use]
    pub(crate) fn comparator(self) -> Option<&'static str> {
        match self {
            Self::Equal => Some("="),
            Self::NotEqual => Some("<>"),
            Self::LowerThan => Some("<"),
            Self::LowerOrEqualThan => Some("<="),
            Self::BiggerThan => Some(">"),
            Self::BiggerOrEqualThan => Some(">="),
            _ => None,
        }
    }
}

/// One node of a filter condition tree.
///
/// A leaf applies `operation` to `property`; a node with `nested` children
/// additionally attaches the parenthesized group after its own leaf.
/// Grouping is structural — evaluation order comes from the tree shape,
/// never from operator precedence.
#[derive(Debug, Clone)]
pub struct Condition {
    /// The item attribute the condition applies to.
    pub property: String,
    /// The operation to apply.
    pub operation: Operation,
    /// The operand for single-value operations; a list value for `In`.
    pub value: Option<AttributeValue>,
    /// Lower bound for `Between`.
    pub low: Option<AttributeValue>,
    /// Upper bound for `Between`.
    pub high: Option<AttributeValue>,
    /// A nested condition group attached after this leaf.
    pub nested: Vec<Condition>,
    /// How this condition joins its preceding sibling. Defaults to AND.
    pub join_as: Join,
}

impl Condition {
    /// A single-value condition.
    #[must_use]
    pub fn new(property: impl Into<String>, operation: Operation, value: AttributeValue) -> Self {
        Self {
            property: property.into(),
            operation,
            value: Some(value),
            low: None,
            high: None,
            nested: Vec::new(),
            join_as: Join::And,
        }
    }

    /// A `BETWEEN` condition with inclusive bounds.
    #[must_use]
    pub fn between(
        property: impl Into<String>,
        low: AttributeValue,
        high: AttributeValue,
    ) -> Self {
        Self {
            property: property.into(),
            operation: Operation::Between,
            value: None,
            low: Some(low),
            high: Some(high),
            nested: Vec::new(),
            join_as: Join::And,
        }
    }

    /// An `attribute_exists` condition.
    #[must_use]
    pub fn exists(property: impl Into<String>) -> Self {
        Self::value_free(property, Operation::Exists)
    }

    /// An `attribute_not_exists` condition.
    #[must_use]
    pub fn not_exists(property: impl Into<String>) -> Self {
        Self::value_free(property, Operation::NotExists)
    }

    fn value_free(property: impl Into<String>, operation: Operation) -> Self {
        Self {
            property: property.into(),
            operation,
            value: None,
            low: None,
            high: None,
            nested: Vec::new(),
            join_as: Join::And,
        }
    }

    /// Join this condition to its preceding sibling with OR.
    #[must_use]
    pub fn or(mut self) -> Self {
        self.join_as = Join::Or;
        self
    }

    /// Attach a nested condition group after this leaf.
    #[must_use]
    pub fn with_nested(mut self, nested: Vec<Condition>) -> Self {
        self.nested = nested;
        self
    }
}

/// Operations permitted on the sort key.
///
/// The restricted set — no `contains`, `in`, or `<>` — is enforced by the
/// type, so an illegal sort-key operation cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOperation {
    /// `=`
    Equal,
    /// `<`
    LowerThan,
    /// `<=`
    LowerOrEqualThan,
    /// `>`
    BiggerThan,
    /// `>=`
    BiggerOrEqualThan,
    /// `begins_with(path, prefix)`
    BeginsWith,
    /// `path BETWEEN start AND end`
    Between,
}

impl RangeOperation {
    /// The comparator token for plain comparison operations.
    #[must_use]
    pub(crate) fn comparator(self) -> Option<&'static str> {
        match self {
            Self::Equal => Some("="),
            Self::LowerThan => Some("<"),
            Self::LowerOrEqualThan => Some("<="),
            Self::BiggerThan => Some(">"),
            Self::BiggerOrEqualThan => Some(">="),
            Self::BeginsWith | Self::Between => None,
        }
    }
}

/// A condition on the sort key within one partition.
#[derive(Debug, Clone)]
pub struct RangeKeyCondition {
    /// The operation to apply.
    pub operation: RangeOperation,
    /// The operand for single-value operations.
    pub value: Option<AttributeValue>,
    /// Start bound for `Between`.
    pub start: Option<AttributeValue>,
    /// End bound for `Between`.
    pub end: Option<AttributeValue>,
}

impl RangeKeyCondition {
    /// A single-value sort-key condition.
    #[must_use]
    pub fn new(operation: RangeOperation, value: AttributeValue) -> Self {
        Self {
            operation,
            value: Some(value),
            start: None,
            end: None,
        }
    }

    /// A `BETWEEN` sort-key condition with inclusive bounds.
    #[must_use]
    pub fn between(start: AttributeValue, end: AttributeValue) -> Self {
        Self {
            operation: RangeOperation::Between,
            value: None,
            start: Some(start),
            end: Some(end),
        }
    }
}
