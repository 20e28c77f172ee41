//! Access-layer configuration.

use std::env;

use crate::expression::BetweenSuffix;

/// Configuration for compilation and retrieval behavior.
#[derive(Debug, Clone, Default)]
pub struct AccessConfig {
    /// Placeholder suffix convention for `BETWEEN` bounds in filter
    /// expressions (sort-key conditions always use `_start`/`_end`).
    pub between_suffix: BetweenSuffix,
}

impl AccessConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            between_suffix: env_between_suffix("TABLEKIT_BETWEEN_SUFFIX", BetweenSuffix::default()),
        }
    }
}

fn env_between_suffix(key: &str, default: BetweenSuffix) -> BetweenSuffix {
    env::var(key).map_or(default, |v| match v.as_str() {
        "start_end" => BetweenSuffix::StartEnd,
        "low_high" => BetweenSuffix::LowHigh,
        _ => default,
    })
}
