//! Key template resolution.
//!
//! A logical key is described by a [`KeyTemplate`]: either a function of the
//! caller-supplied params, or an ordered sequence of segments mixing
//! constant literals with `.field` placeholder references into the params.
//! Resolution is stateless and pure; the physical composite key string is
//! the resolved segments joined with `#`.

use std::fmt;
use std::sync::Arc;

use tablekit_model::{AttributeValue, Item};

/// Delimiter joining resolved segments into a composite key string.
pub const KEY_DELIMITER: &str = "#";

/// Marker prefix identifying a placeholder segment in a raw template.
const FIELD_MARKER: char = '.';

/// A single segment of a segment-list key template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySegment {
    /// A constant literal, passed through unchanged.
    Literal(String),
    /// A reference into the params object by field name.
    Field(String),
}

impl KeySegment {
    /// Parse a raw segment: a leading `.` marks a field reference,
    /// anything else is a literal.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.strip_prefix(FIELD_MARKER).map_or_else(
            || Self::Literal(raw.to_owned()),
            |field| Self::Field(field.to_owned()),
        )
    }
}

/// A logical key definition.
///
/// Both shapes resolve through [`KeyTemplate::resolve`]; call sites never
/// branch on which shape an entity registered.
#[derive(Clone)]
pub enum KeyTemplate {
    /// A function of the params. The function owns its own validation.
    Derived(Arc<dyn Fn(&Item) -> Vec<AttributeValue> + Send + Sync>),
    /// An ordered sequence of literal and placeholder segments.
    Segments(Vec<KeySegment>),
}

impl fmt::Debug for KeyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Derived(_) => f.write_str("KeyTemplate::Derived(..)"),
            Self::Segments(segments) => f.debug_tuple("KeyTemplate::Segments").field(segments).finish(),
        }
    }
}

impl KeyTemplate {
    /// Build a derived template from a function of the params.
    pub fn derived(f: impl Fn(&Item) -> Vec<AttributeValue> + Send + Sync + 'static) -> Self {
        Self::Derived(Arc::new(f))
    }

    /// Build a segment-list template from raw segment strings, parsing
    /// `.field` placeholder markers.
    pub fn segments<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Segments(raw.into_iter().map(|s| KeySegment::parse(s.as_ref())).collect())
    }

    /// Resolve this template against the params into ordered key segments.
    ///
    /// A placeholder referencing a missing field, or a field holding a
    /// non-scalar value, yields `None` in that position; [`key_string`]
    /// renders it as an empty segment rather than rejecting the key.
    /// Callers that want validation can inspect the `None`s before joining.
    #[must_use]
    pub fn resolve(&self, params: &Item) -> Vec<Option<String>> {
        match self {
            Self::Derived(f) => f(params)
                .iter()
                .map(AttributeValue::key_segment)
                .collect(),
            Self::Segments(segments) => segments
                .iter()
                .map(|segment| match segment {
                    KeySegment::Literal(lit) => Some(lit.clone()),
                    KeySegment::Field(field) => {
                        params.get(field).and_then(AttributeValue::key_segment)
                    }
                })
                .collect(),
        }
    }

    /// Resolve and join in one step.
    #[must_use]
    pub fn resolve_key_string(&self, params: &Item) -> String {
        key_string(&self.resolve(params))
    }
}

/// Join resolved segments into a composite key string.
///
/// Segments are joined with [`KEY_DELIMITER`] in declared order — never
/// re-ordered or deduplicated. Unresolved segments render empty.
#[must_use]
pub fn key_string(segments: &[Option<String>]) -> String {
    segments
        .iter()
        .map(|s| s.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(KEY_DELIMITER)
}
