pub mod factories;

use std::sync::Arc;

use crate::module::{ModuleId, ModuleRegistry};

// Helper function to create a registry with the given modules enabled and their default options
pub fn registry_with(enabled: &[ModuleId]) -> Arc<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    for id in enabled {
        registry.enable(*id);
    }
    Arc::new(registry)
}
