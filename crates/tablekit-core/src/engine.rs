//! The paginated retrieval engine.
//!
//! One [`QueryRequest`] describes a whole logical retrieval; the engine
//! compiles it into page parameters once, then drives
//! `scan_or_query_page` in a strict sequential loop — page N's returned
//! key is the only way to request page N+1 — accumulating items until a
//! stopping condition is met. Remote failures abort the loop and discard
//! anything accumulated: callers get all requested items or an error,
//! never a partial result.

use std::sync::Arc;

use tablekit_model::{AttributeValue, Item, PageRequest};
use tracing::debug;

use crate::config::AccessConfig;
use crate::cursor;
use crate::error::AccessError;
use crate::expression::{
    CompiledExpression, Condition, RangeKeyCondition, compile_conditions, compile_key_condition,
    compile_projection,
};
use crate::store::RemoteStore;

/// Traversal order within a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending sort-key order (the store default).
    #[default]
    Ascending,
    /// Descending sort-key order.
    Descending,
}

/// The partition a query addresses: a physical key attribute and the
/// resolved partition key value.
#[derive(Debug, Clone)]
pub struct PartitionCondition {
    /// The physical partition key attribute name.
    pub attribute: String,
    /// The resolved partition key value.
    pub value: AttributeValue,
}

/// One segment of a parallel scan. Passed through unchanged on every page
/// call; the engine never fans out segments itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelSegment {
    /// The segment this retrieval reads.
    pub segment: i32,
    /// The total number of segments the scan is divided into.
    pub total: i32,
}

/// A declarative description of one logical retrieval.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// The table to read.
    pub table: String,
    /// A secondary index to read instead of the base table.
    pub index: Option<String>,
    /// The partition to query; `None` makes this an unconditioned scan.
    pub partition: Option<PartitionCondition>,
    /// The physical sort key attribute, required with `range_condition`.
    pub range_attribute: Option<String>,
    /// A condition on the sort key within the partition.
    pub range_condition: Option<RangeKeyCondition>,
    /// Filter conditions applied after items are read.
    pub filters: Vec<Condition>,
    /// The attributes to retrieve; `None` retrieves whole items.
    pub projection: Option<Vec<String>>,
    /// Traversal order within the partition.
    pub order: SortOrder,
    /// Bound on total items across all pages.
    pub limit: Option<usize>,
    /// `true` (the default) loops until exhaustion or the limit; `false`
    /// stops after one page, exposing any returned cursor.
    pub full_retrieval: bool,
    /// If `true`, strongly consistent reads.
    pub consistent_read: Option<bool>,
    /// An opaque cursor from a previous retrieval to resume from.
    pub pagination_cursor: Option<String>,
    /// Parallel-scan segment descriptor; only valid on unconditioned scans.
    pub parallel_segment: Option<ParallelSegment>,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            table: String::new(),
            index: None,
            partition: None,
            range_attribute: None,
            range_condition: None,
            filters: Vec::new(),
            projection: None,
            order: SortOrder::Ascending,
            limit: None,
            full_retrieval: true,
            consistent_read: None,
            pagination_cursor: None,
            parallel_segment: None,
        }
    }
}

impl QueryRequest {
    /// A full-retrieval request against a table.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }
}

/// The assembled result of one logical retrieval.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    /// All accumulated items, in retrieval order.
    pub items: Vec<Item>,
    /// Present iff the store reported more pages and the engine stopped
    /// before exhausting them.
    pub pagination_cursor: Option<String>,
}

/// Drives scan/query requests through a [`RemoteStore`] to completion.
#[derive(Debug)]
pub struct RetrievalEngine<S> {
    store: Arc<S>,
    config: AccessConfig,
}

impl<S> Clone for RetrievalEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: RemoteStore> RetrievalEngine<S> {
    /// Create an engine over a store handle.
    #[must_use]
    pub fn new(store: Arc<S>, config: AccessConfig) -> Self {
        Self { store, config }
    }

    /// Run one logical retrieval to its stopping condition.
    pub async fn run(&self, request: &QueryRequest) -> Result<RetrievalResult, AccessError> {
        validate(request)?;
        let template = build_page_template(request, &self.config)?;

        let mut items: Vec<Item> = Vec::new();
        let mut cursor = request.pagination_cursor.as_deref().and_then(cursor::decode);
        let mut pages_issued = 0u32;

        loop {
            let mut page_request = template.clone();
            if let Some(limit) = request.limit {
                // Floor of 1 guarantees forward progress on every call.
                let remaining = limit.saturating_sub(items.len()).max(1);
                page_request.limit = Some(i32::try_from(remaining).unwrap_or(i32::MAX));
            }
            if let Some(start) = cursor.take() {
                page_request.exclusive_start_key = start;
            }

            let page = self.store.scan_or_query_page(page_request).await?;
            pages_issued += 1;
            items.extend(page.items);
            debug!(pages_issued, accumulated = items.len(), table = %request.table, "retrieved page");

            let more = !page.last_evaluated_key.is_empty();
            let limit_reached = request.limit.is_some_and(|limit| items.len() >= limit);

            if !more || limit_reached || !request.full_retrieval {
                let pagination_cursor = more.then(|| cursor::encode(&page.last_evaluated_key));
                return Ok(RetrievalResult {
                    items,
                    pagination_cursor,
                });
            }

            cursor = Some(page.last_evaluated_key);
        }
    }

    /// Retrieve every matching item as a flat list.
    ///
    /// Forces full retrieval with no limit; the final cursor is guaranteed
    /// absent and is discarded.
    pub async fn list_all(&self, request: &QueryRequest) -> Result<Vec<Item>, AccessError> {
        let mut full = request.clone();
        full.full_retrieval = true;
        full.limit = None;
        Ok(self.run(&full).await?.items)
    }
}

/// Reject request shapes the store would reject, before any remote call.
fn validate(request: &QueryRequest) -> Result<(), AccessError> {
    if request.limit == Some(0) {
        return Err(AccessError::InvalidRequest(
            "limit must be greater than 0".to_owned(),
        ));
    }
    if request.range_condition.is_some() {
        if request.partition.is_none() {
            return Err(AccessError::InvalidRequest(
                "a range condition requires a partition condition".to_owned(),
            ));
        }
        if request.range_attribute.is_none() {
            return Err(AccessError::InvalidRequest(
                "a range condition requires the sort key attribute name".to_owned(),
            ));
        }
    }
    if let Some(segment) = request.parallel_segment {
        if request.partition.is_some() {
            return Err(AccessError::InvalidRequest(
                "parallel segments only apply to unconditioned scans".to_owned(),
            ));
        }
        if segment.total < 1 || segment.segment < 0 || segment.segment >= segment.total {
            return Err(AccessError::InvalidRequest(format!(
                "segment {} is not within 0..{}",
                segment.segment, segment.total
            )));
        }
    }
    Ok(())
}

/// Compile a request's expressions once into the page-call template the
/// retrieval loop clones per call.
fn build_page_template(
    request: &QueryRequest,
    config: &AccessConfig,
) -> Result<PageRequest, AccessError> {
    let mut page = PageRequest {
        table_name: request.table.clone(),
        index_name: request.index.clone(),
        consistent_read: request.consistent_read,
        ..PageRequest::default()
    };

    if let Some(partition) = &request.partition {
        let key_condition = compile_key_condition(
            &partition.attribute,
            &partition.value,
            request.range_attribute.as_deref(),
            request.range_condition.as_ref(),
        )?;
        page.key_condition_expression = Some(key_condition.expression.clone());
        merge(&mut page, key_condition);

        // Ordering only applies within a partition.
        if request.order == SortOrder::Descending {
            page.scan_index_forward = Some(false);
        }
    }

    let filter = compile_conditions(&request.filters, config.between_suffix)?;
    if !filter.is_empty() {
        page.filter_expression = Some(filter.expression.clone());
        merge(&mut page, filter);
    }

    if let Some(projection) = &request.projection {
        let compiled = compile_projection(projection);
        if !compiled.is_empty() {
            page.projection_expression = Some(compiled.expression.clone());
            merge(&mut page, compiled);
        }
    }

    if let Some(segment) = request.parallel_segment {
        page.segment = Some(segment.segment);
        page.total_segments = Some(segment.total);
    }

    Ok(page)
}

fn merge(page: &mut PageRequest, compiled: CompiledExpression) {
    page.expression_attribute_names.extend(compiled.names);
    page.expression_attribute_values.extend(compiled.values);
}
