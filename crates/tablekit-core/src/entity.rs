//! The entity facade.
//!
//! An [`EntityDefinition`] registers a logical entity once: its type tag,
//! table, key templates with their physical attribute names, secondary
//! indexes, named range-query presets, and the entity-supplied
//! creation/update builders. [`Entity`] binds a definition to a
//! [`RemoteStore`] and exposes the full operation set; [`QueryScope`]
//! carries the query methods for either the base keys or one index.
//! Definitions are immutable after registration and re-read on every call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tablekit_model::{AttributeValue, Item, Key, PutRequest, ReadOptions, UpdateRequest};

use crate::config::AccessConfig;
use crate::engine::{
    PartitionCondition, QueryRequest, RetrievalEngine, RetrievalResult, SortOrder,
};
use crate::error::AccessError;
use crate::expression::{Condition, RangeKeyCondition, RangeOperation, compile_projection};
use crate::key::KeyTemplate;
use crate::store::RemoteStore;

/// An alternate partition/range key pair over the same items.
#[derive(Debug, Clone)]
pub struct IndexDefinition {
    /// The physical index identifier sent on the wire.
    pub index_name: String,
    /// Template for the index partition key.
    pub partition_template: KeyTemplate,
    /// Physical attribute name of the index partition key.
    pub partition_attribute: String,
    /// Template for the index sort key, if the index has one.
    pub range_template: Option<KeyTemplate>,
    /// Physical attribute name of the index sort key.
    pub range_attribute: Option<String>,
}

/// Configuration of the type-scoped listing index.
#[derive(Debug, Clone)]
pub struct TypeIndex {
    /// The physical index identifier.
    pub index_name: String,
    /// The attribute holding the entity type tag.
    pub type_attribute: String,
}

/// Bound values produced by a named range query's parameter mapping.
#[derive(Debug, Clone, Default)]
pub struct RangeBounds {
    /// Operand for single-value operations.
    pub value: Option<AttributeValue>,
    /// Start bound for `Between`.
    pub start: Option<AttributeValue>,
    /// End bound for `Between`.
    pub end: Option<AttributeValue>,
}

/// A preset sort-key query registered under a name.
///
/// Without a mapping, parameters pass through raw under the operation's
/// expected field names: `value` for single-value operations, `start` and
/// `end` for `Between`.
#[derive(Clone)]
pub struct NamedRangeQuery {
    /// The sort-key operation the preset applies.
    pub operation: RangeOperation,
    /// Optional parameter-to-value mapping.
    pub map: Option<Arc<dyn Fn(&Item) -> RangeBounds + Send + Sync>>,
}

impl fmt::Debug for NamedRangeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedRangeQuery")
            .field("operation", &self.operation)
            .field("map", &self.map.as_ref().map(|_| ".."))
            .finish()
    }
}

impl NamedRangeQuery {
    /// A preset with raw parameter pass-through.
    #[must_use]
    pub fn new(operation: RangeOperation) -> Self {
        Self {
            operation,
            map: None,
        }
    }

    /// A preset with a parameter-to-value mapping.
    pub fn mapped(
        operation: RangeOperation,
        map: impl Fn(&Item) -> RangeBounds + Send + Sync + 'static,
    ) -> Self {
        Self {
            operation,
            map: Some(Arc::new(map)),
        }
    }

    fn resolve(&self, params: &Item) -> RangeKeyCondition {
        let bounds = self.map.as_ref().map_or_else(
            || RangeBounds {
                value: params.get("value").cloned(),
                start: params.get("start").cloned(),
                end: params.get("end").cloned(),
            },
            |map| map(params),
        );
        RangeKeyCondition {
            operation: self.operation,
            value: bounds.value,
            start: bounds.start,
            end: bounds.end,
        }
    }
}

/// Options forwarded to the creation builder.
#[derive(Debug, Clone, Default)]
pub struct CreateConfig {
    /// Allow replacing an existing item with the same key.
    pub allow_overwrite: bool,
}

/// Passthrough options for `get` and `batch_get`.
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// If `true`, a strongly consistent read.
    pub consistent_read: Option<bool>,
    /// Attributes to retrieve; `None` retrieves whole items.
    pub projection: Option<Vec<String>>,
}

impl GetOptions {
    fn into_read_options(self) -> ReadOptions {
        let mut options = ReadOptions {
            consistent_read: self.consistent_read,
            ..ReadOptions::default()
        };
        if let Some(projection) = &self.projection {
            let compiled = compile_projection(projection);
            if !compiled.is_empty() {
                options.projection_expression = Some(compiled.expression);
                options.expression_attribute_names = compiled.names;
            }
        }
        options
    }
}

/// Builder producing the store parameters for a create.
pub type CreationBuilder = Arc<dyn Fn(&Item, &CreateConfig) -> PutRequest + Send + Sync>;

/// Builder producing the store parameters for an update.
pub type UpdateBuilder = Arc<dyn Fn(&Item) -> UpdateRequest + Send + Sync>;

/// The registered description of one logical entity.
#[derive(Clone)]
pub struct EntityDefinition {
    /// The entity type tag.
    pub entity_type: String,
    /// The table holding this entity's items.
    pub table: String,
    /// Template for the partition key.
    pub partition_template: KeyTemplate,
    /// Physical attribute name of the partition key.
    pub partition_attribute: String,
    /// Template for the range key.
    pub range_template: KeyTemplate,
    /// Physical attribute name of the range key.
    pub range_attribute: String,
    /// Secondary indexes by logical name.
    pub indexes: HashMap<String, IndexDefinition>,
    /// Named range-query presets.
    pub range_queries: HashMap<String, NamedRangeQuery>,
    /// Type-scoped listing configuration; listing is unavailable without it.
    pub type_index: Option<TypeIndex>,
    /// Entity-supplied creation builder; `create` is unavailable without it.
    pub creation_builder: Option<CreationBuilder>,
    /// Entity-supplied update builder; `update` is unavailable without it.
    pub update_builder: Option<UpdateBuilder>,
}

impl fmt::Debug for EntityDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDefinition")
            .field("entity_type", &self.entity_type)
            .field("table", &self.table)
            .field("partition_attribute", &self.partition_attribute)
            .field("range_attribute", &self.range_attribute)
            .field("indexes", &self.indexes.keys().collect::<Vec<_>>())
            .field("range_queries", &self.range_queries.keys().collect::<Vec<_>>())
            .field("type_index", &self.type_index)
            .finish_non_exhaustive()
    }
}

impl EntityDefinition {
    /// Register an entity's type, table, and key templates.
    #[must_use]
    pub fn new(
        entity_type: impl Into<String>,
        table: impl Into<String>,
        partition_template: KeyTemplate,
        partition_attribute: impl Into<String>,
        range_template: KeyTemplate,
        range_attribute: impl Into<String>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            table: table.into(),
            partition_template,
            partition_attribute: partition_attribute.into(),
            range_template,
            range_attribute: range_attribute.into(),
            indexes: HashMap::new(),
            range_queries: HashMap::new(),
            type_index: None,
            creation_builder: None,
            update_builder: None,
        }
    }

    /// Register a secondary index under a logical name.
    #[must_use]
    pub fn with_index(mut self, name: impl Into<String>, index: IndexDefinition) -> Self {
        self.indexes.insert(name.into(), index);
        self
    }

    /// Register a named range-query preset.
    #[must_use]
    pub fn with_range_query(mut self, name: impl Into<String>, query: NamedRangeQuery) -> Self {
        self.range_queries.insert(name.into(), query);
        self
    }

    /// Enable type-scoped listing over the given index.
    #[must_use]
    pub fn with_type_index(mut self, type_index: TypeIndex) -> Self {
        self.type_index = Some(type_index);
        self
    }

    /// Supply the creation builder.
    #[must_use]
    pub fn with_creation_builder(
        mut self,
        builder: impl Fn(&Item, &CreateConfig) -> PutRequest + Send + Sync + 'static,
    ) -> Self {
        self.creation_builder = Some(Arc::new(builder));
        self
    }

    /// Supply the update builder.
    #[must_use]
    pub fn with_update_builder(
        mut self,
        builder: impl Fn(&Item) -> UpdateRequest + Send + Sync + 'static,
    ) -> Self {
        self.update_builder = Some(Arc::new(builder));
        self
    }

    /// Resolve the physical primary key for the given params.
    #[must_use]
    pub fn primary_key(&self, params: &Item) -> Key {
        let partition = self.partition_template.resolve_key_string(params);
        let range = self.range_template.resolve_key_string(params);
        let mut key = Key::new();
        key.insert(self.partition_attribute.clone(), AttributeValue::S(partition));
        key.insert(self.range_attribute.clone(), AttributeValue::S(range));
        key
    }
}

/// Caller-tunable parts of a facade query.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    /// An inline sort-key condition.
    pub range_condition: Option<RangeKeyCondition>,
    /// Filter conditions applied after items are read.
    pub filters: Vec<Condition>,
    /// Attributes to retrieve; `None` retrieves whole items.
    pub projection: Option<Vec<String>>,
    /// Traversal order within the partition.
    pub order: SortOrder,
    /// Bound on total items across all pages.
    pub limit: Option<usize>,
    /// `false` stops after one page, exposing any returned cursor.
    pub full_retrieval: bool,
    /// If `true`, strongly consistent reads.
    pub consistent_read: Option<bool>,
    /// An opaque cursor from a previous call to resume from.
    pub pagination_cursor: Option<String>,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            range_condition: None,
            filters: Vec::new(),
            projection: None,
            order: SortOrder::Ascending,
            limit: None,
            full_retrieval: true,
            consistent_read: None,
            pagination_cursor: None,
        }
    }
}

/// A registered entity bound to a store handle.
pub struct Entity<S> {
    definition: Arc<EntityDefinition>,
    store: Arc<S>,
    engine: RetrievalEngine<S>,
}

impl<S> fmt::Debug for Entity<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

impl<S> Clone for Entity<S> {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            store: Arc::clone(&self.store),
            engine: self.engine.clone(),
        }
    }
}

impl<S: RemoteStore> Entity<S> {
    /// Bind a definition to a store handle.
    #[must_use]
    pub fn new(definition: Arc<EntityDefinition>, store: Arc<S>, config: AccessConfig) -> Self {
        let engine = RetrievalEngine::new(Arc::clone(&store), config);
        Self {
            definition,
            store,
            engine,
        }
    }

    /// The bound definition.
    #[must_use]
    pub fn definition(&self) -> &EntityDefinition {
        &self.definition
    }

    /// Read one item by its resolved primary key.
    pub async fn get(&self, params: &Item, options: GetOptions) -> Result<Option<Item>, AccessError> {
        let key = self.definition.primary_key(params);
        let item = self
            .store
            .point_read(&self.definition.table, key, options.into_read_options())
            .await?;
        Ok(item)
    }

    /// Delete one item by its resolved primary key.
    pub async fn delete(&self, params: &Item) -> Result<(), AccessError> {
        let key = self.definition.primary_key(params);
        self.store.point_delete(&self.definition.table, key).await?;
        Ok(())
    }

    /// Read many items by key in one batch call.
    ///
    /// Each key params object is resolved independently; duplicates are
    /// forwarded as-is, never deduplicated.
    pub async fn batch_get(
        &self,
        keys: &[Item],
        options: GetOptions,
    ) -> Result<Vec<Item>, AccessError> {
        let resolved: Vec<Key> = keys
            .iter()
            .map(|params| self.definition.primary_key(params))
            .collect();
        let items = self
            .store
            .batch_read(&self.definition.table, resolved, options.into_read_options())
            .await?;
        Ok(items)
    }

    /// Create an item, delegating parameter construction to the entity's
    /// creation builder and forwarding its output verbatim.
    pub async fn create(&self, item: &Item, config: &CreateConfig) -> Result<(), AccessError> {
        let builder = self
            .definition
            .creation_builder
            .as_ref()
            .ok_or(AccessError::UnsupportedOperation("a creation builder"))?;
        let put = builder(item, config);
        self.store.point_write(put).await?;
        Ok(())
    }

    /// Update an item, delegating parameter construction to the entity's
    /// update builder and forwarding its output verbatim.
    pub async fn update(&self, params: &Item) -> Result<Option<Item>, AccessError> {
        let builder = self
            .definition
            .update_builder
            .as_ref()
            .ok_or(AccessError::UnsupportedOperation("an update builder"))?;
        let update = builder(params);
        let attributes = self.store.point_update(update).await?;
        Ok(attributes)
    }

    /// Query methods over the entity's base keys.
    #[must_use]
    pub fn query(&self) -> QueryScope<'_, S> {
        QueryScope {
            entity: self,
            index: None,
        }
    }

    /// Query methods bound to a defined secondary index.
    pub fn index(&self, name: &str) -> Result<QueryScope<'_, S>, AccessError> {
        let index = self
            .definition
            .indexes
            .get(name)
            .ok_or_else(|| AccessError::UnknownIndex(name.to_owned()))?;
        Ok(QueryScope {
            entity: self,
            index: Some(index),
        })
    }

    /// One page (or a bounded run) of the type-scoped listing.
    pub async fn list(&self, spec: QuerySpec) -> Result<RetrievalResult, AccessError> {
        let request = self.listing_request(spec)?;
        self.engine.run(&request).await
    }

    /// Every item of this entity type, as a flat list.
    pub async fn list_all(&self) -> Result<Vec<Item>, AccessError> {
        let request = self.listing_request(QuerySpec::default())?;
        self.engine.list_all(&request).await
    }

    fn listing_request(&self, spec: QuerySpec) -> Result<QueryRequest, AccessError> {
        let type_index = self
            .definition
            .type_index
            .as_ref()
            .ok_or(AccessError::UnsupportedOperation("a type index"))?;
        Ok(QueryRequest {
            table: self.definition.table.clone(),
            index: Some(type_index.index_name.clone()),
            partition: Some(PartitionCondition {
                attribute: type_index.type_attribute.clone(),
                value: AttributeValue::S(self.definition.entity_type.clone()),
            }),
            filters: spec.filters,
            projection: spec.projection,
            order: spec.order,
            limit: spec.limit,
            full_retrieval: spec.full_retrieval,
            consistent_read: spec.consistent_read,
            pagination_cursor: spec.pagination_cursor,
            ..QueryRequest::default()
        })
    }
}

/// The query method set, bound to the base keys or to one index.
#[derive(Debug)]
pub struct QueryScope<'a, S> {
    entity: &'a Entity<S>,
    index: Option<&'a IndexDefinition>,
}

impl<S: RemoteStore> QueryScope<'_, S> {
    /// Run a fully caller-described query.
    pub async fn custom(
        &self,
        params: &Item,
        spec: QuerySpec,
    ) -> Result<RetrievalResult, AccessError> {
        let request = self.build_request(params, spec);
        self.entity.engine.run(&request).await
    }

    /// Return the first matching item, paging until one is found or the
    /// partition is exhausted. Pagination fields are stripped.
    pub async fn one(&self, params: &Item, spec: QuerySpec) -> Result<Option<Item>, AccessError> {
        let mut spec = spec;
        spec.limit = Some(1);
        spec.full_retrieval = true;
        spec.pagination_cursor = None;
        let request = self.build_request(params, spec);
        let result = self.entity.engine.run(&request).await?;
        Ok(result.items.into_iter().next())
    }

    /// Return every matching item as a flat list, discarding the cursor.
    pub async fn all(&self, params: &Item, spec: QuerySpec) -> Result<Vec<Item>, AccessError> {
        let mut spec = spec;
        spec.full_retrieval = true;
        let request = self.build_request(params, spec);
        let result = self.entity.engine.run(&request).await?;
        Ok(result.items)
    }

    /// Run a named range-query preset; identical to [`Self::custom`] with
    /// the range condition pre-filled from the preset.
    pub async fn named(
        &self,
        name: &str,
        params: &Item,
        spec: QuerySpec,
    ) -> Result<RetrievalResult, AccessError> {
        let preset = self
            .entity
            .definition
            .range_queries
            .get(name)
            .ok_or_else(|| AccessError::UnknownRangeQuery(name.to_owned()))?;
        let mut spec = spec;
        spec.range_condition = Some(preset.resolve(params));
        self.custom(params, spec).await
    }

    fn build_request(&self, params: &Item, spec: QuerySpec) -> QueryRequest {
        let definition = &self.entity.definition;
        let (template, partition_attribute, range_attribute, index_name) =
            self.index.map_or_else(
                || {
                    (
                        &definition.partition_template,
                        definition.partition_attribute.as_str(),
                        Some(definition.range_attribute.as_str()),
                        None,
                    )
                },
                |index| {
                    (
                        &index.partition_template,
                        index.partition_attribute.as_str(),
                        index.range_attribute.as_deref(),
                        Some(index.index_name.clone()),
                    )
                },
            );

        let partition_value = template.resolve_key_string(params);
        QueryRequest {
            table: definition.table.clone(),
            index: index_name,
            partition: Some(PartitionCondition {
                attribute: partition_attribute.to_owned(),
                value: AttributeValue::S(partition_value),
            }),
            range_attribute: range_attribute.map(ToOwned::to_owned),
            range_condition: spec.range_condition,
            filters: spec.filters,
            projection: spec.projection,
            order: spec.order,
            limit: spec.limit,
            full_retrieval: spec.full_retrieval,
            consistent_read: spec.consistent_read,
            pagination_cursor: spec.pagination_cursor,
            parallel_segment: None,
        }
    }
}
