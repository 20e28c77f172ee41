//! Response shapes for the store's operations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Item, Key};

/// One page of a scan or query.
///
/// A non-empty `last_evaluated_key` means the store has more pages; feeding
/// it back as the next request's exclusive start key resumes the read where
/// this page stopped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Page {
    /// The items evaluated for this page, in traversal order.
    #[serde(default)]
    pub items: Vec<Item>,

    /// The primary key of the last item evaluated; empty when the read is
    /// exhausted.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub last_evaluated_key: Key,
}

impl Page {
    /// Returns `true` if the store reported further pages.
    #[must_use]
    pub fn has_more(&self) -> bool {
        !self.last_evaluated_key.is_empty()
    }
}
