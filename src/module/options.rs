use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{module::ModuleId, Error, Result};

/// A scalar option value.
///
/// Deserializes from plain JSON scalars: `true`, `3`, `1.5`, `"text"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean flag
    Bool(bool),
    /// Integer
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Text
    Text(String),
}

impl OptionValue {
    fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "boolean",
            OptionValue::Integer(_) => "integer",
            OptionValue::Float(_) => "float",
            OptionValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(value) => write!(f, "{value}"),
            OptionValue::Integer(value) => write!(f, "{value}"),
            OptionValue::Float(value) => write!(f, "{value}"),
            OptionValue::Text(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Integer(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

/// Resolved state of one module: its enabled flag and typed options.
///
/// Modules are created by the [`crate::module::ModuleRegistry`] and read-only once the
/// registry is handed to a scanner. The typed getters fail with [`Error::ModuleConfig`], which
/// the scanner builder turns into "this module is disabled for the scan".
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    id: ModuleId,
    enabled: bool,
    options: BTreeMap<String, OptionValue>,
}

impl Module {
    /// Creates a disabled module holding its default options.
    #[must_use]
    pub fn new(id: ModuleId) -> Self {
        Module {
            id,
            enabled: false,
            options: id
                .default_options()
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        }
    }

    /// Identifier of this module.
    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Returns `true` if the module takes part in the scan.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_option(&mut self, key: &str, value: OptionValue) {
        self.options.insert(key.to_string(), value);
    }

    /// Raw option value.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    /// Text option `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleConfig`] if the option is missing or not text.
    pub fn text(&self, key: &str) -> Result<&str> {
        match self.required(key)? {
            OptionValue::Text(value) => Ok(value),
            other => Err(self.mistyped(key, "text", other)),
        }
    }

    /// Integer option `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleConfig`] if the option is missing or not an integer.
    pub fn integer(&self, key: &str) -> Result<i64> {
        match self.required(key)? {
            OptionValue::Integer(value) => Ok(*value),
            other => Err(self.mistyped(key, "integer", other)),
        }
    }

    /// Float option `key`. Integer values are widened.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleConfig`] if the option is missing or not numeric.
    pub fn float(&self, key: &str) -> Result<f64> {
        match self.required(key)? {
            OptionValue::Float(value) => Ok(*value),
            #[allow(clippy::cast_precision_loss)]
            OptionValue::Integer(value) => Ok(*value as f64),
            other => Err(self.mistyped(key, "float", other)),
        }
    }

    /// Boolean option `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleConfig`] if the option is missing or not a boolean.
    pub fn boolean(&self, key: &str) -> Result<bool> {
        match self.required(key)? {
            OptionValue::Bool(value) => Ok(*value),
            other => Err(self.mistyped(key, "boolean", other)),
        }
    }

    fn required(&self, key: &str) -> Result<&OptionValue> {
        self.options.get(key).ok_or_else(|| Error::ModuleConfig {
            module: self.id,
            message: format!("missing option '{key}'"),
        })
    }

    fn mistyped(&self, key: &str, expected: &str, found: &OptionValue) -> Error {
        Error::ModuleConfig {
            module: self.id,
            message: format!(
                "option '{key}' must be {expected}, found {} {found}",
                found.type_name()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let mut module = Module::new(ModuleId::FpsSpoof);
        assert_eq!(module.float("multiplier").unwrap(), 1.0);

        module.set_option("multiplier", OptionValue::Integer(3));
        assert_eq!(module.float("multiplier").unwrap(), 3.0);
        assert_eq!(module.integer("multiplier").unwrap(), 3);

        module.set_option("multiplier", "fast".into());
        assert!(matches!(
            module.float("multiplier"),
            Err(Error::ModuleConfig {
                module: ModuleId::FpsSpoof,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_option() {
        let module = Module::new(ModuleId::WebsocketUrl);
        let error = module.text("url").unwrap_err();
        assert_eq!(error.to_string(), "Module websocket_url: missing option 'url'");
    }

    #[test]
    fn test_untagged_values() {
        let values: Vec<OptionValue> = serde_json::from_str(r#"[true, 3, 1.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                OptionValue::Bool(true),
                OptionValue::Integer(3),
                OptionValue::Float(1.5),
                OptionValue::Text("x".into())
            ]
        );
    }
}
