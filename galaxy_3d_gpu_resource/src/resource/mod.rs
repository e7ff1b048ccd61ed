//! Resource identity and caching
//!
//! Resource-type tags, unique and scratch keys, and the cache that indexes
//! live and purgeable textures by those keys.

mod resource_type;
mod unique_key;
mod scratch_key;
mod resource_cache;

pub use resource_type::{ResourceCategory, ResourceType, ResourceTypeTable};
pub use unique_key::UniqueKey;
pub use scratch_key::{
    ScratchKey, ScratchKeyFlags, TextureShape,
    compute_texture_scratch_key,
    TEXTURE_SCRATCH_KEY_WORDS, SAMPLE_COUNT_SHIFT,
};
pub use resource_cache::{ResourceCache, ResourceId};
