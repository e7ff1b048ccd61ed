/// Resource-type tags for scratch keys
///
/// Every scratch key carries a small integer identifying the kind of resource
/// it describes, so that a texture key can never collide with a buffer key
/// made of the same words. Tags are handed out by an explicit registration
/// table built once at startup (`Engine::initialize`), never lazily.

use rustc_hash::FxHashMap;

/// Resource categories that can carry a scratch key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceCategory {
    /// Sampled texture (optionally also a render target)
    Texture,
    /// Standalone render target without a sampleable texture
    RenderTarget,
    /// Vertex/index/uniform buffer
    Buffer,
    /// Depth/stencil attachment
    Attachment,
}

impl ResourceCategory {
    /// All categories, in registration order
    pub const ALL: [ResourceCategory; 4] = [
        ResourceCategory::Texture,
        ResourceCategory::RenderTarget,
        ResourceCategory::Buffer,
        ResourceCategory::Attachment,
    ];
}

/// Stable integer tag of a resource category
///
/// Zero is never handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceType(u32);

impl ResourceType {
    /// Raw tag value
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Registration table mapping categories to tags
#[derive(Debug, Clone, Default)]
pub struct ResourceTypeTable {
    types: FxHashMap<ResourceCategory, ResourceType>,
}

impl ResourceTypeTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every category registered in `ResourceCategory::ALL` order
    pub fn standard() -> Self {
        let mut table = Self::new();
        for category in ResourceCategory::ALL {
            table.register(category);
        }
        table
    }

    /// Register a category, returning its tag
    ///
    /// Registering the same category twice returns the original tag.
    pub fn register(&mut self, category: ResourceCategory) -> ResourceType {
        let next = ResourceType(self.types.len() as u32 + 1);
        *self.types.entry(category).or_insert(next)
    }

    /// Tag of a registered category
    pub fn get(&self, category: ResourceCategory) -> Option<ResourceType> {
        self.types.get(&category).copied()
    }

    /// Number of registered categories
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
#[path = "resource_type_tests.rs"]
mod tests;
