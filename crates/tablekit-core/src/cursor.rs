//! The pagination cursor codec.
//!
//! A cursor is the store's native last-evaluated-key map, serialized to
//! canonical JSON (deterministically ordered keys) and base64-encoded into
//! an opaque printable token. Decoding is total: any malformed or foreign
//! token decodes to "absent" with a diagnostic, never an error — this is
//! the canonical bad-token recovery path.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tablekit_model::{AttributeValue, Key};
use tracing::warn;

/// Encode a last-evaluated-key map into an opaque cursor token.
#[must_use]
pub fn encode(last_key: &Key) -> String {
    // BTreeMap ordering makes the text form canonical regardless of the
    // source map's iteration order.
    let ordered: BTreeMap<&String, &AttributeValue> = last_key.iter().collect();
    match serde_json::to_string(&ordered) {
        Ok(json) => STANDARD.encode(json),
        Err(error) => {
            warn!(%error, "failed to serialize pagination cursor");
            String::new()
        }
    }
}

/// Decode a cursor token back into a last-evaluated-key map.
///
/// Returns `None` for anything that does not round-trip: bad base64, bad
/// JSON, or JSON that is not an object.
#[must_use]
pub fn decode(token: &str) -> Option<Key> {
    let bytes = match STANDARD.decode(token) {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(%error, "ignoring pagination cursor with invalid encoding");
            return None;
        }
    };

    let value: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(error) => {
            warn!(%error, "ignoring unparseable pagination cursor");
            return None;
        }
    };

    if !value.is_object() {
        warn!("ignoring pagination cursor that is not a key map");
        return None;
    }

    match serde_json::from_value::<Key>(value) {
        Ok(key) => Some(key),
        Err(error) => {
            warn!(%error, "ignoring pagination cursor with foreign key shape");
            None
        }
    }
}
