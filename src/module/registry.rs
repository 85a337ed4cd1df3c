use std::str::FromStr;

use strum::IntoEnumIterator;
use tracing::warn;

use crate::{
    module::{ConfigSnapshot, Module, ModuleId, OptionValue},
    Result,
};

/// The `{module -> enabled, options}` snapshot every scan is built against.
///
/// A registry is assembled once, before any class is scanned, and then shared read-only
/// (usually behind an [`std::sync::Arc`]) with the [`crate::scanner::ScannerBuilder`]. There is
/// one [`Module`] per [`ModuleId`]; all of them start disabled with their default options.
///
/// # Examples
///
/// ```rust
/// use classpatch::module::{ModuleId, ModuleRegistry};
///
/// let mut registry = ModuleRegistry::new();
/// registry
///     .enable(ModuleId::ChangeModStrings)
///     .set_option(ModuleId::ChangeModStrings, "fps_text", "CPS");
///
/// assert!(registry.is_enabled(ModuleId::ChangeModStrings));
/// assert!(!registry.is_enabled(ModuleId::FpsSpoof));
/// assert_eq!(registry.module(ModuleId::ChangeModStrings).text("fps_text")?, "CPS");
/// # Ok::<(), classpatch::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRegistry {
    modules: Vec<Module>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    /// Creates a registry with every module disabled.
    #[must_use]
    pub fn new() -> Self {
        ModuleRegistry {
            modules: ModuleId::iter().map(Module::new).collect(),
        }
    }

    /// Resolves a configuration snapshot. Unknown module names are logged and skipped.
    #[must_use]
    pub fn from_config(config: &ConfigSnapshot) -> Self {
        let mut registry = Self::new();
        for (name, settings) in &config.modules {
            let Ok(id) = ModuleId::from_str(name) else {
                warn!(module = %name, "ignoring settings of unknown module");
                continue;
            };

            let module = registry.module_mut(id);
            module.set_enabled(settings.enabled);
            for (key, value) in &settings.options {
                module.set_option(key, value.clone());
            }
        }
        registry
    }

    /// Parses a JSON configuration document and resolves it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the document cannot be decoded.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::from_config(&ConfigSnapshot::from_json(json)?))
    }

    /// Enables a module.
    pub fn enable(&mut self, id: ModuleId) -> &mut Self {
        self.module_mut(id).set_enabled(true);
        self
    }

    /// Disables a module.
    pub fn disable(&mut self, id: ModuleId) -> &mut Self {
        self.module_mut(id).set_enabled(false);
        self
    }

    /// Overrides an option of a module.
    pub fn set_option(
        &mut self,
        id: ModuleId,
        key: &str,
        value: impl Into<OptionValue>,
    ) -> &mut Self {
        self.module_mut(id).set_option(key, value.into());
        self
    }

    /// The module with identifier `id`.
    #[must_use]
    pub fn module(&self, id: ModuleId) -> &Module {
        // one module per identifier, in declaration order
        &self.modules[id as usize]
    }

    /// Returns `true` if module `id` is enabled.
    #[must_use]
    pub fn is_enabled(&self, id: ModuleId) -> bool {
        self.module(id).is_enabled()
    }

    /// Iterates over the enabled modules.
    pub fn enabled(&self) -> impl Iterator<Item = &Module> + '_ {
        self.modules.iter().filter(|module| module.is_enabled())
    }

    /// Iterates over all modules.
    pub fn iter(&self) -> impl Iterator<Item = &Module> + '_ {
        self.modules.iter()
    }

    fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_module_present() {
        let registry = ModuleRegistry::new();
        for id in ModuleId::iter() {
            assert_eq!(registry.module(id).id(), id);
            assert!(!registry.is_enabled(id));
        }
    }

    #[test]
    fn test_from_json() {
        let registry = ModuleRegistry::from_json(
            r#"{"modules": {
                "hurt_cam_shake": {"enabled": true, "options": {"multiplier": 0.5}},
                "no_such_module": {"enabled": true}
            }}"#,
        )
        .unwrap();

        assert!(registry.is_enabled(ModuleId::HurtCamShake));
        assert_eq!(
            registry.module(ModuleId::HurtCamShake).float("multiplier").unwrap(),
            0.5
        );
        assert_eq!(registry.enabled().count(), 1);
    }

    #[test]
    fn test_options_keep_defaults() {
        let registry = ModuleRegistry::from_json(
            r#"{"modules": {"toggle_sprint_text": {"enabled": true, "options": {"flying_text": "soaring"}}}}"#,
        )
        .unwrap();
        let module = registry.module(ModuleId::ToggleSprintText);
        assert_eq!(module.text("flying_text").unwrap(), "soaring");
        assert_eq!(module.text("riding_text").unwrap(), "riding");
    }
}
