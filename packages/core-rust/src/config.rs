//! Composition settings.

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// How boxed consumers are reached from raw-input composites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Use the raw view of a consumer whenever it offers one.
    #[default]
    Specialized,
    /// Always box the arguments. Output is identical, only slower.
    Generic,
}

/// Settings consumed by [`BatchFolder`](crate::batch::BatchFolder) and
/// [`Unboxing`](crate::dispatch::Unboxing).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Dispatch route policy for boxed consumers.
    pub dispatch: DispatchMode,
}

impl ComposeConfig {
    /// Parses a config from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid config document.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid compose config")
    }
}
