//! Core access-layer logic for Tablekit.
//!
//! Three components do the heavy lifting: the key template resolver
//! ([`key`]), the expression compiler ([`expression`]), and the paginated
//! retrieval engine ([`engine`]). The entity facade ([`entity`]) binds an
//! entity's key templates and index configuration to those components,
//! producing its get/batch/create/update/delete/list/query method sets.
//! All remote traffic flows through the [`store::RemoteStore`] trait.
#![allow(missing_docs, clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod config;
pub mod cursor;
pub mod engine;
pub mod entity;
pub mod error;
pub mod expression;
pub mod key;
pub mod store;

pub use config::AccessConfig;
pub use engine::{
    ParallelSegment, PartitionCondition, QueryRequest, RetrievalEngine, RetrievalResult, SortOrder,
};
pub use entity::{
    CreateConfig, Entity, EntityDefinition, GetOptions, IndexDefinition, NamedRangeQuery,
    QueryScope, QuerySpec, RangeBounds, TypeIndex,
};
pub use error::AccessError;
pub use expression::{
    BetweenSuffix, CompiledExpression, Condition, ExpressionError, Join, Operation,
    RangeKeyCondition, RangeOperation,
};
pub use key::{KeySegment, KeyTemplate};
pub use store::RemoteStore;
