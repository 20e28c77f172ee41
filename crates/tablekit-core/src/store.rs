//! The external store boundary.
//!
//! Everything the access layer needs from the store is behind
//! [`RemoteStore`]: point reads/writes, batch reads, and the single
//! scan-or-query-page primitive the retrieval engine loops over. Each call
//! is one suspension point; the layer issues no retries and holds no state
//! across calls — retry policy, if any, belongs to the implementation.

use async_trait::async_trait;
use tablekit_model::{Item, Key, Page, PageRequest, PutRequest, ReadOptions, StoreError, UpdateRequest};

/// A remote partitioned key-value store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read one item by primary key. Returns `None` if absent.
    async fn point_read(
        &self,
        table: &str,
        key: Key,
        options: ReadOptions,
    ) -> Result<Option<Item>, StoreError>;

    /// Delete one item by primary key.
    async fn point_delete(&self, table: &str, key: Key) -> Result<(), StoreError>;

    /// Write one full item.
    async fn point_write(&self, put: PutRequest) -> Result<(), StoreError>;

    /// Apply an update spec to one item, returning the updated attributes
    /// when the store reports them.
    async fn point_update(&self, update: UpdateRequest) -> Result<Option<Item>, StoreError>;

    /// Read many items by primary key in one call. Order and multiplicity
    /// follow the store's semantics, not the request's.
    async fn batch_read(
        &self,
        table: &str,
        keys: Vec<Key>,
        options: ReadOptions,
    ) -> Result<Vec<Item>, StoreError>;

    /// Read one scan or query page.
    async fn scan_or_query_page(&self, request: PageRequest) -> Result<Page, StoreError>;
}
