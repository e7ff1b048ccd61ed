/// Backend seam of a texture
///
/// `TextureBackend` is the per-API object behind a `Texture` (a mock handle,
/// a Vulkan image). `TextureFactory` allocates and wraps those objects for a
/// `GpuContext`. Optional capabilities are probed with methods returning
/// `Option` instead of downcasting.

use std::fmt;
use std::sync::Arc;
use crate::caps::{BackendApi, BackendFormat, Caps};
use crate::error::Result;
use crate::texture::{MipmapStatus, Mipmapped, TextureDesc};

/// Whether the texture is responsible for freeing its backend object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendObjectOwnership {
    /// Owned by someone else; never freed here
    Borrowed,
    /// Freed when the texture is destroyed
    Owned,
}

/// Raw API handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendHandle {
    /// Mock handle id
    Mock(u64),
    /// `VkImage` as its raw value
    Vulkan { image: u64 },
}

impl BackendHandle {
    pub fn backend(&self) -> BackendApi {
        match self {
            BackendHandle::Mock(_) => BackendApi::Mock,
            BackendHandle::Vulkan { .. } => BackendApi::Vulkan,
        }
    }
}

/// API-level description of a texture, as exchanged with external code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTexture {
    pub width: u32,
    pub height: u32,
    pub mipmapped: Mipmapped,
    pub format: BackendFormat,
    pub handle: BackendHandle,
}

impl BackendTexture {
    pub fn backend(&self) -> BackendApi {
        self.handle.backend()
    }
}

/// Render-target capability of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendRenderTarget {
    /// MSAA sample count, at least 1
    pub sample_count: u32,
}

/// Frees the memory of a stolen texture
pub type ReleaseProc = Box<dyn FnOnce() + Send>;

/// Backend texture whose ownership has left the resource layer
///
/// The new owner is responsible for calling `release` (or running the
/// release proc from `into_parts`) once it is done with the texture.
pub struct StolenBackendTexture {
    texture: BackendTexture,
    release_proc: ReleaseProc,
}

impl StolenBackendTexture {
    pub fn new(texture: BackendTexture, release_proc: ReleaseProc) -> Self {
        Self { texture, release_proc }
    }

    pub fn backend_texture(&self) -> &BackendTexture {
        &self.texture
    }

    pub fn into_parts(self) -> (BackendTexture, ReleaseProc) {
        (self.texture, self.release_proc)
    }

    /// Free the backend memory
    pub fn release(self) {
        (self.release_proc)();
    }
}

impl fmt::Debug for StolenBackendTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StolenBackendTexture")
            .field("texture", &self.texture)
            .finish_non_exhaustive()
    }
}

/// Backend object behind a `Texture`
pub trait TextureBackend: Send + Sync {
    /// API this object belongs to
    fn backend_api(&self) -> BackendApi;

    /// Whether destroying the texture frees the object
    fn ownership(&self) -> BackendObjectOwnership;

    /// Description of the underlying object
    fn backend_texture(&self) -> BackendTexture;

    /// Render-target capability, if the texture can be drawn into
    fn render_target(&self) -> Option<BackendRenderTarget> {
        None
    }

    /// Give up ownership of the backend object
    ///
    /// Returns `None` when the object cannot be handed out (borrowed, or
    /// already stolen). On success the backend must no longer free the
    /// object when dropped.
    fn steal_backend_texture(&self) -> Option<StolenBackendTexture> {
        None
    }
}

/// Freshly allocated or wrapped backend object
pub struct AllocatedTexture {
    pub backend: Box<dyn TextureBackend>,
    /// Initial mip state chosen by the factory
    pub mipmap_status: MipmapStatus,
}

/// Backend-specific texture allocation
pub trait TextureFactory: Send {
    /// Capabilities of the device this factory allocates on
    fn caps(&self) -> Arc<dyn Caps>;

    /// Allocate a texture from a validated descriptor
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<AllocatedTexture>;

    /// Adopt or borrow an existing backend object
    fn wrap_backend_texture(
        &mut self,
        texture: &BackendTexture,
        ownership: BackendObjectOwnership,
    ) -> Result<AllocatedTexture>;

    /// Rebuild levels 1.. of a mipmapped texture from level 0
    fn regenerate_mipmaps(&mut self, texture: &BackendTexture) -> Result<()>;
}
