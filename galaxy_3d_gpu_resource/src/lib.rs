/*!
# Galaxy 3D GPU Resource

Texture resource layer of the Galaxy 3D engine.

This crate tracks the lifecycle and cache identity of GPU texture memory,
independently of the graphics API. Backends (the in-crate mock, Vulkan in
`galaxy_3d_gpu_resource_vulkan`) plug in through the `Caps`,
`TextureBackend` and `TextureFactory` traits.

## Architecture

- **GpuContext**: validates requests, reuses cached storage, drives flushes
  and mip regeneration
- **ResourceCache**: indexes textures by unique key and scratch key, keeps
  keyed textures alive as purgeable after their last reference is dropped
- **Texture / TextureRef**: shape information, mipmap validity state machine,
  counted reference with the backend-stealing protocol
- **ScratchKey**: storage fingerprint used to find fungible memory
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod caps;
pub mod resource;
pub mod texture;
pub mod context;
pub mod mock;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Context
    pub use crate::context::{ContextConfig, GpuContext, FlushToken};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Capability sub-module
    pub mod caps {
        pub use crate::caps::*;
    }

    // Resource identity sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Texture sub-module
    pub mod texture {
        pub use crate::texture::*;
    }

    // Mock backend sub-module
    pub mod mock {
        pub use crate::mock::*;
    }
}
