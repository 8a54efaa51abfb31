use super::{DotNetPlatform, NodeJsPlatform, PhpPlatform, PlatformDefinition, PythonPlatform};
use std::sync::Arc;

/// The closed, process-wide set of supported platforms. Built once at
/// startup; shared read-only between concurrent invocations.
#[derive(Clone)]
pub struct PlatformRegistry {
    platforms: Vec<Arc<dyn PlatformDefinition>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self {
            platforms: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DotNetPlatform));
        registry.register(Arc::new(NodeJsPlatform));
        registry.register(Arc::new(PythonPlatform));
        registry.register(Arc::new(PhpPlatform));
        registry
    }

    pub fn register(&mut self, platform: Arc<dyn PlatformDefinition>) {
        self.platforms.push(platform);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn PlatformDefinition>> {
        self.platforms
            .iter()
            .find(|p| p.id().eq_ignore_ascii_case(id))
            .cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn PlatformDefinition>> {
        self.platforms.iter()
    }

    /// Platform identifiers in a stable, sorted order (for error messages
    /// and listings).
    pub fn platform_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self.platforms.iter().map(|p| p.id()).collect();
        ids.sort();
        ids
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
