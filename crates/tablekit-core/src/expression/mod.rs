//! Condition trees and the expression compiler.
//!
//! Callers build [`Condition`] trees (or the restricted
//! [`RangeKeyCondition`] for the sort key); the compiler turns them into
//! the store's wire form — an expression string plus attribute name and
//! value placeholder maps — with deterministic, collision-free placeholder
//! naming. Compilation is a pure function of its input: no counters, no
//! hidden state.

pub mod compile;
pub mod condition;

pub use compile::{
    BetweenSuffix, CompiledExpression, ExpressionError, compile_conditions, compile_key_condition,
    compile_projection,
};
pub use condition::{Condition, Join, Operation, RangeKeyCondition, RangeOperation};
