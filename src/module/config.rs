use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{module::OptionValue, Result};

/// Configuration document as supplied by the host.
///
/// ```json
/// {
///     "modules": {
///         "fps_spoof": { "enabled": true, "options": { "multiplier": 2.5 } },
///         "privacy": { "enabled": true }
///     }
/// }
/// ```
///
/// Module names are kept as strings here; unknown names are reported and skipped when the
/// snapshot is resolved into a [`crate::module::ModuleRegistry`], so a newer configuration
/// file still loads with an older engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Settings per module name
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleSettings>,
}

/// Settings of one module in a [`ConfigSnapshot`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleSettings {
    /// Whether the module takes part in the scan
    #[serde(default)]
    pub enabled: bool,
    /// Option overrides; options not listed keep their defaults
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
}

impl ConfigSnapshot {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the document is not valid JSON or does not have the
    /// expected shape.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the snapshot back to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
