//! Collection configuration.
//!
//! Settings can be built in code or parsed from a JSON document, e.g.
//!
//! ```json
//! { "animated": false, "project_elements": true }
//! ```
//!
//! Missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Behavior knobs shared by every operation of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Animation flag used when an operation is called with `animated: None`.
    #[serde(default = "default_animated")]
    pub animated: bool,

    /// Whether to publish the type-erased projection after each mutation.
    #[serde(default = "default_project_elements")]
    pub project_elements: bool,
}

fn default_animated() -> bool {
    true
}

fn default_project_elements() -> bool {
    true
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            animated: default_animated(),
            project_elements: default_project_elements(),
        }
    }
}

impl CollectionConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve a per-call animation override against the default.
    pub fn resolve_animated(&self, animated: Option<bool>) -> bool {
        animated.unwrap_or(self.animated)
    }
}
