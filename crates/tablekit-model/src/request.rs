//! Request parameter blocks for the store's operations.
//!
//! All structs use `PascalCase` JSON field naming to match the store's wire
//! protocol. Optional fields are omitted when `None`, and empty maps are
//! omitted, to produce minimal payloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::attribute_value::AttributeValue;
use crate::{Item, Key};

/// Passthrough options for point and batch reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReadOptions {
    /// If `true`, a strongly consistent read is used; otherwise the read is
    /// eventually consistent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,

    /// A projection expression identifying the attributes to retrieve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,

    /// Substitution tokens for attribute names in the projection.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,
}

/// Parameters for one scan or query page — the single primitive the
/// retrieval engine repeatedly invokes.
///
/// A request with a key-condition expression addresses one partition
/// (a query); a request without one is an unconditioned scan, optionally
/// sliced by a parallel-segment descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageRequest {
    /// The name of the table to read.
    pub table_name: String,

    /// The name of a secondary index to read instead of the base table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,

    /// The condition selecting the partition and constraining the sort key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_condition_expression: Option<String>,

    /// Conditions applied to items after they are read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,

    /// The attributes to retrieve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,

    /// Substitution tokens for attribute names in any expression.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,

    /// Substitution tokens for attribute values in any expression.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: HashMap<String, AttributeValue>,

    /// Traversal order within the partition. `None` or `Some(true)` is
    /// ascending; `Some(false)` is descending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_index_forward: Option<bool>,

    /// The maximum number of items to evaluate for this page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,

    /// The primary key of the first item this page will evaluate; taken
    /// from the previous page's last evaluated key.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub exclusive_start_key: Key,

    /// If `true`, a strongly consistent read is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,

    /// For a parallel scan, the segment this request reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<i32>,

    /// For a parallel scan, the total number of segments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_segments: Option<i32>,
}

/// Parameters for a point write, produced by an entity's creation builder
/// and forwarded verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRequest {
    /// The name of the table to write into.
    pub table_name: String,

    /// The full item to write.
    pub item: Item,

    /// A condition that must hold for the write to succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,

    /// Substitution tokens for attribute names in the condition.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,

    /// Substitution tokens for attribute values in the condition.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: HashMap<String, AttributeValue>,
}

/// Parameters for a point update, produced by an entity's update builder
/// and forwarded verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateRequest {
    /// The name of the table containing the item.
    pub table_name: String,

    /// The primary key of the item to update.
    pub key: Key,

    /// The update expression to apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_expression: Option<String>,

    /// A condition that must hold for the update to succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,

    /// Substitution tokens for attribute names in any expression.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,

    /// Substitution tokens for attribute values in any expression.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: HashMap<String, AttributeValue>,
}
