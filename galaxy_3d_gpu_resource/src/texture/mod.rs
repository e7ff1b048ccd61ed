//! Texture resources
//!
//! Descriptor types, the backend seam, the mipmap state machine, and the
//! `Texture` / `TextureRef` pair itself.

mod types;
mod backend;
mod mipmap;
mod texture;

pub use types::{
    Renderable, Mipmapped, Protected,
    TextureType, MipmapFilter,
    TextureDesc, TextureInfo,
};
pub use backend::{
    BackendObjectOwnership, BackendHandle, BackendTexture, BackendRenderTarget,
    ReleaseProc, StolenBackendTexture,
    TextureBackend, TextureFactory, AllocatedTexture,
};
pub use mipmap::{
    MipmapStatus, MipmapTracker, MipmapDirtyReport,
    FlushEpoch, DirtyProvenance,
    REGEN_DID_NOT_FAIL, CREATED_DIRTY_REASON,
};
pub use texture::{
    Texture, TextureRef, StealError, StealFailure,
    max_mipmap_level, compute_gpu_memory_size,
};
