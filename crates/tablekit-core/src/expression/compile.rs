//! Compilation of condition trees into wire-format expressions.
//!
//! Output is an expression string plus attribute name (`#prop`) and value
//! (`:prop`) placeholder maps. Placeholder identity is a pure function of
//! the referenced property: repeated references reuse the same placeholder,
//! `BETWEEN` bounds and `IN` elements get deterministic suffixes. Given the
//! same input list, output is byte-identical; expression text follows input
//! order with no canonicalization.

use std::collections::HashMap;
use std::fmt::Write as _;

use tablekit_model::AttributeValue;

use super::condition::{Condition, Join, Operation, RangeKeyCondition, RangeOperation};

/// Errors raised while compiling an expression.
///
/// These are programmer errors in the condition tree; they surface before
/// any remote call is issued.
#[derive(Debug, thiserror::Error)]
pub enum ExpressionError {
    /// A single-value operation was given no operand.
    #[error("operation on `{property}` requires a value")]
    MissingValue {
        /// The property whose condition is malformed.
        property: String,
    },
    /// A `BETWEEN` operation is missing one or both bounds.
    #[error("BETWEEN on `{property}` requires both bounds")]
    MissingBounds {
        /// The property whose condition is malformed.
        property: String,
    },
    /// An `IN` operation was given an empty candidate list.
    #[error("IN on `{property}` requires a non-empty value list")]
    EmptyValueList {
        /// The property whose condition is malformed.
        property: String,
    },
}

/// Suffix convention for the two `BETWEEN` value placeholders.
///
/// Both conventions are in active use: filter compilation defaults to
/// [`BetweenSuffix::LowHigh`] (configurable), sort-key compilation uses
/// [`BetweenSuffix::StartEnd`] to match the range condition's own bound
/// names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BetweenSuffix {
    /// `:prop_low` / `:prop_high`.
    #[default]
    LowHigh,
    /// `:prop_start` / `:prop_end`.
    StartEnd,
}

impl BetweenSuffix {
    /// The (lower, upper) placeholder suffix pair.
    #[must_use]
    pub fn pair(self) -> (&'static str, &'static str) {
        match self {
            Self::LowHigh => ("_low", "_high"),
            Self::StartEnd => ("_start", "_end"),
        }
    }
}

/// A compiled expression: the string plus its placeholder maps.
#[derive(Debug, Clone, Default)]
pub struct CompiledExpression {
    /// The expression string.
    pub expression: String,
    /// Attribute name placeholders (`#prop` -> `prop`).
    pub names: HashMap<String, String>,
    /// Attribute value placeholders (`:prop` -> value).
    pub values: HashMap<String, AttributeValue>,
}

impl CompiledExpression {
    /// Returns `true` if no expression was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expression.is_empty()
    }
}

/// Compile a filter condition list into one expression.
///
/// Siblings join with each node's own `join_as`; a node's nested group is
/// parenthesized and attaches with the group's join keyword (taken from the
/// first nested condition, defaulting to AND). An empty list compiles to an
/// empty expression.
pub fn compile_conditions(
    conditions: &[Condition],
    suffix: BetweenSuffix,
) -> Result<CompiledExpression, ExpressionError> {
    let mut compiler = Compiler::new(suffix);
    compiler.render_list(conditions)?;
    Ok(compiler.finish())
}

/// Compile the key condition for one partition, optionally constrained on
/// the sort key.
///
/// Placeholders here are keyed by the *physical* key attribute names.
/// Sort-key `BETWEEN` bounds always use the `_start`/`_end` convention.
pub fn compile_key_condition(
    partition_attribute: &str,
    partition_value: &AttributeValue,
    range_attribute: Option<&str>,
    range: Option<&RangeKeyCondition>,
) -> Result<CompiledExpression, ExpressionError> {
    let mut compiler = Compiler::new(BetweenSuffix::StartEnd);
    let name = compiler.name_placeholder(partition_attribute);
    let value = compiler.value_placeholder(partition_attribute, partition_value.clone());
    let _ = write!(compiler.expression, "({name} = {value})");

    if let (Some(attribute), Some(condition)) = (range_attribute, range) {
        compiler.expression.push_str(" AND ");
        compiler.render_range(attribute, condition)?;
    }

    Ok(compiler.finish())
}

/// Compile a projection property list.
///
/// Produces a comma-joined list of name placeholders plus the name map;
/// an empty property list compiles to an empty expression.
#[must_use]
pub fn compile_projection(properties: &[String]) -> CompiledExpression {
    let mut compiler = Compiler::new(BetweenSuffix::default());
    let placeholders: Vec<String> = properties
        .iter()
        .map(|property| compiler.name_placeholder(property))
        .collect();
    compiler.expression = placeholders.join(", ");
    compiler.finish()
}

struct Compiler {
    expression: String,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
    suffix: BetweenSuffix,
}

impl Compiler {
    fn new(suffix: BetweenSuffix) -> Self {
        Self {
            expression: String::new(),
            names: HashMap::new(),
            values: HashMap::new(),
            suffix,
        }
    }

    fn finish(self) -> CompiledExpression {
        CompiledExpression {
            expression: self.expression,
            names: self.names,
            values: self.values,
        }
    }

    /// Register and return the name placeholder for a property.
    fn name_placeholder(&mut self, property: &str) -> String {
        let placeholder = format!("#{property}");
        self.names.insert(placeholder.clone(), property.to_owned());
        placeholder
    }

    /// Register and return a value placeholder for a property.
    ///
    /// Repeated registrations for one property reuse the placeholder; the
    /// last value wins.
    fn value_placeholder(&mut self, property: &str, value: AttributeValue) -> String {
        self.suffixed_value_placeholder(property, "", value)
    }

    fn suffixed_value_placeholder(
        &mut self,
        property: &str,
        suffix: &str,
        value: AttributeValue,
    ) -> String {
        let placeholder = format!(":{property}{suffix}");
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    fn render_list(&mut self, conditions: &[Condition]) -> Result<(), ExpressionError> {
        for (i, condition) in conditions.iter().enumerate() {
            if i > 0 {
                let _ = write!(self.expression, " {} ", condition.join_as.keyword());
            }
            self.render_node(condition)?;
        }
        Ok(())
    }

    fn render_node(&mut self, condition: &Condition) -> Result<(), ExpressionError> {
        self.render_leaf(condition)?;

        if !condition.nested.is_empty() {
            let group_join = condition.nested.first().map_or(Join::And, |c| c.join_as);
            let _ = write!(self.expression, " {} (", group_join.keyword());
            self.render_list(&condition.nested)?;
            self.expression.push(')');
        }
        Ok(())
    }

    fn render_leaf(&mut self, condition: &Condition) -> Result<(), ExpressionError> {
        let property = condition.property.as_str();
        let name = self.name_placeholder(property);

        if let Some(comparator) = condition.operation.comparator() {
            let operand = require_value(condition)?;
            let value = self.value_placeholder(property, operand);
            let _ = write!(self.expression, "({name} {comparator} {value})");
            return Ok(());
        }

        match condition.operation {
            Operation::BeginsWith => {
                let operand = require_value(condition)?;
                let value = self.value_placeholder(property, operand);
                let _ = write!(self.expression, "(begins_with({name}, {value}))");
            }
            Operation::Contains => {
                let operand = require_value(condition)?;
                let value = self.value_placeholder(property, operand);
                let _ = write!(self.expression, "(contains({name}, {value}))");
            }
            Operation::Between => {
                let (low, high) = match (&condition.low, &condition.high) {
                    (Some(low), Some(high)) => (low.clone(), high.clone()),
                    _ => {
                        return Err(ExpressionError::MissingBounds {
                            property: property.to_owned(),
                        });
                    }
                };
                let (low_suffix, high_suffix) = self.suffix.pair();
                let low = self.suffixed_value_placeholder(property, low_suffix, low);
                let high = self.suffixed_value_placeholder(property, high_suffix, high);
                let _ = write!(self.expression, "({name} BETWEEN {low} AND {high})");
            }
            Operation::In => {
                let candidates = match require_value(condition)? {
                    AttributeValue::L(list) => list,
                    scalar => vec![scalar],
                };
                if candidates.is_empty() {
                    return Err(ExpressionError::EmptyValueList {
                        property: property.to_owned(),
                    });
                }
                let placeholders: Vec<String> = candidates
                    .into_iter()
                    .enumerate()
                    .map(|(i, candidate)| {
                        self.suffixed_value_placeholder(property, &format!("_{i}"), candidate)
                    })
                    .collect();
                let _ = write!(self.expression, "({name} IN ({}))", placeholders.join(", "));
            }
            Operation::Exists => {
                let _ = write!(self.expression, "(attribute_exists({name}))");
            }
            Operation::NotExists => {
                let _ = write!(self.expression, "(attribute_not_exists({name}))");
            }
            // Comparators are handled above.
            _ => unreachable!("comparator operations are rendered before this match"),
        }
        Ok(())
    }

    fn render_range(
        &mut self,
        attribute: &str,
        condition: &RangeKeyCondition,
    ) -> Result<(), ExpressionError> {
        let name = self.name_placeholder(attribute);

        if let Some(comparator) = condition.operation.comparator() {
            let operand = condition.value.clone().ok_or_else(|| ExpressionError::MissingValue {
                property: attribute.to_owned(),
            })?;
            let value = self.value_placeholder(attribute, operand);
            let _ = write!(self.expression, "({name} {comparator} {value})");
            return Ok(());
        }

        match condition.operation {
            RangeOperation::BeginsWith => {
                let operand = condition.value.clone().ok_or_else(|| {
                    ExpressionError::MissingValue {
                        property: attribute.to_owned(),
                    }
                })?;
                let value = self.value_placeholder(attribute, operand);
                let _ = write!(self.expression, "(begins_with({name}, {value}))");
            }
            RangeOperation::Between => {
                let (start, end) = match (&condition.start, &condition.end) {
                    (Some(start), Some(end)) => (start.clone(), end.clone()),
                    _ => {
                        return Err(ExpressionError::MissingBounds {
                            property: attribute.to_owned(),
                        });
                    }
                };
                let (start_suffix, end_suffix) = BetweenSuffix::StartEnd.pair();
                let start = self.suffixed_value_placeholder(attribute, start_suffix, start);
                let end = self.suffixed_value_placeholder(attribute, end_suffix, end);
                let _ = write!(self.expression, "({name} BETWEEN {start} AND {end})");
            }
            // Comparators are handled above.
            _ => unreachable!("comparator operations are rendered before this match"),
        }
        Ok(())
    }

}

fn require_value(condition: &Condition) -> Result<AttributeValue, ExpressionError> {
    condition
        .value
        .clone()
        .ok_or_else(|| ExpressionError::MissingValue {
            property: condition.property.clone(),
        })
}
