/// Mock texture backend and factory

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use rustc_hash::FxHashSet;
use crate::caps::{BackendApi, BackendFormat, Caps};
use crate::error::{Error, Result};
use crate::mock::MockCaps;
use crate::texture::{
    AllocatedTexture, BackendHandle, BackendObjectOwnership, BackendRenderTarget,
    BackendTexture, MipmapStatus, StolenBackendTexture, TextureBackend, TextureDesc,
    TextureFactory,
};

const SOURCE: &str = "galaxy3d::gpu::Mock";

// ============================================================================
// Handle registry
// ============================================================================

/// Set of live mock handles, shared by a factory and its textures
#[derive(Debug, Clone, Default)]
pub struct MockHandleRegistry {
    live: Arc<Mutex<FxHashSet<u64>>>,
    next: Arc<AtomicU64>,
}

impl MockHandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashSet<u64>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a fresh handle (never 0)
    pub fn allocate(&self) -> u64 {
        let handle = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        self.lock().insert(handle);
        handle
    }

    /// Mark an externally created handle as live
    pub fn adopt(&self, handle: u64) {
        self.lock().insert(handle);
    }

    /// Free a handle, returning whether it was live
    pub fn free(&self, handle: u64) -> bool {
        self.lock().remove(&handle)
    }

    pub fn is_live(&self, handle: u64) -> bool {
        self.lock().contains(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.lock().len()
    }
}

// ============================================================================
// Mock texture backend
// ============================================================================

/// Backend object of a mock texture
#[derive(Debug)]
pub struct MockTextureBackend {
    texture: BackendTexture,
    handle: u64,
    ownership: BackendObjectOwnership,
    render_target: Option<BackendRenderTarget>,
    stolen: AtomicBool,
    registry: MockHandleRegistry,
}

impl MockTextureBackend {
    pub fn new(
        texture: BackendTexture,
        ownership: BackendObjectOwnership,
        render_target: Option<BackendRenderTarget>,
        registry: MockHandleRegistry,
    ) -> Result<Self> {
        let BackendHandle::Mock(handle) = texture.handle else {
            return Err(Error::InvalidResource(format!(
                "{:?} is not a mock handle",
                texture.handle
            )));
        };
        Ok(Self {
            texture,
            handle,
            ownership,
            render_target,
            stolen: AtomicBool::new(false),
            registry,
        })
    }

    pub fn handle(&self) -> u64 {
        self.handle
    }

    pub fn is_stolen(&self) -> bool {
        self.stolen.load(Ordering::Acquire)
    }
}

impl TextureBackend for MockTextureBackend {
    fn backend_api(&self) -> BackendApi {
        BackendApi::Mock
    }

    fn ownership(&self) -> BackendObjectOwnership {
        self.ownership
    }

    fn backend_texture(&self) -> BackendTexture {
        self.texture
    }

    fn render_target(&self) -> Option<BackendRenderTarget> {
        self.render_target
    }

    fn steal_backend_texture(&self) -> Option<StolenBackendTexture> {
        if self.ownership == BackendObjectOwnership::Borrowed {
            return None;
        }
        if self.stolen.swap(true, Ordering::AcqRel) {
            return None;
        }

        let registry = self.registry.clone();
        let handle = self.handle;
        Some(StolenBackendTexture::new(
            self.texture,
            Box::new(move || {
                registry.free(handle);
            }),
        ))
    }
}

impl Drop for MockTextureBackend {
    fn drop(&mut self) {
        if self.ownership == BackendObjectOwnership::Owned && !self.is_stolen() {
            self.registry.free(self.handle);
        }
    }
}

// ============================================================================
// Mock factory
// ============================================================================

/// Switches and counters of a `MockTextureFactory`
///
/// Cloned out of the factory before it is moved into a context, so tests
/// can inject failures and count calls afterwards.
#[derive(Debug, Clone, Default)]
pub struct MockFactoryControl {
    fail_allocations: Arc<AtomicBool>,
    fail_mipmap_regeneration: Arc<AtomicBool>,
    allocations: Arc<AtomicUsize>,
    regenerations: Arc<AtomicUsize>,
}

impl MockFactoryControl {
    /// Make `create_texture` fail with `OutOfMemory`
    pub fn set_fail_allocations(&self, fail: bool) {
        self.fail_allocations.store(fail, Ordering::Relaxed);
    }

    /// Make `regenerate_mipmaps` fail with a backend error
    pub fn set_fail_mipmap_regeneration(&self, fail: bool) {
        self.fail_mipmap_regeneration.store(fail, Ordering::Relaxed);
    }

    /// Successful `create_texture` calls
    pub fn allocation_count(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Successful `regenerate_mipmaps` calls
    pub fn regeneration_count(&self) -> usize {
        self.regenerations.load(Ordering::Relaxed)
    }
}

/// Texture factory of the mock backend
///
/// New mipmapped textures start `Dirty` (their contents are undefined);
/// wrapped mipmapped textures start `Valid`.
pub struct MockTextureFactory {
    caps: Arc<MockCaps>,
    registry: MockHandleRegistry,
    control: MockFactoryControl,
}

impl MockTextureFactory {
    pub fn new() -> Self {
        Self::with_caps(MockCaps::new())
    }

    pub fn with_caps(caps: MockCaps) -> Self {
        Self {
            caps: Arc::new(caps),
            registry: MockHandleRegistry::new(),
            control: MockFactoryControl::default(),
        }
    }

    pub fn registry(&self) -> MockHandleRegistry {
        self.registry.clone()
    }

    pub fn control(&self) -> MockFactoryControl {
        self.control.clone()
    }
}

impl Default for MockTextureFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureFactory for MockTextureFactory {
    fn caps(&self) -> Arc<dyn Caps> {
        self.caps.clone()
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<AllocatedTexture> {
        if self.control.fail_allocations.load(Ordering::Relaxed) {
            crate::engine_warn!(SOURCE, "Allocation of \"{}\" failed (injected)", desc.label);
            return Err(Error::OutOfMemory);
        }
        if !matches!(desc.format, BackendFormat::Mock(_)) {
            crate::engine_bail!(SOURCE, "Format {:?} is not a mock format", desc.format);
        }

        let handle = self.registry.allocate();
        let texture = BackendTexture {
            width: desc.width,
            height: desc.height,
            mipmapped: desc.mipmapped,
            format: desc.format,
            handle: BackendHandle::Mock(handle),
        };
        let render_target = desc.renderable.is_yes().then_some(BackendRenderTarget {
            sample_count: desc.sample_count,
        });
        let backend = MockTextureBackend::new(
            texture,
            BackendObjectOwnership::Owned,
            render_target,
            self.registry.clone(),
        )?;

        self.control.allocations.fetch_add(1, Ordering::Relaxed);
        crate::engine_trace!(SOURCE, "Allocated mock texture #{} ({}x{})",
            handle, desc.width, desc.height);

        Ok(AllocatedTexture {
            backend: Box::new(backend),
            mipmap_status: if desc.mipmapped.is_yes() {
                MipmapStatus::Dirty
            } else {
                MipmapStatus::Unallocated
            },
        })
    }

    fn wrap_backend_texture(
        &mut self,
        texture: &BackendTexture,
        ownership: BackendObjectOwnership,
    ) -> Result<AllocatedTexture> {
        let backend = MockTextureBackend::new(*texture, ownership, None, self.registry.clone())?;
        if ownership == BackendObjectOwnership::Owned {
            self.registry.adopt(backend.handle());
        }

        Ok(AllocatedTexture {
            backend: Box::new(backend),
            mipmap_status: if texture.mipmapped.is_yes() {
                MipmapStatus::Valid
            } else {
                MipmapStatus::Unallocated
            },
        })
    }

    fn regenerate_mipmaps(&mut self, texture: &BackendTexture) -> Result<()> {
        let BackendHandle::Mock(handle) = texture.handle else {
            crate::engine_bail!(SOURCE, "{:?} is not a mock handle", texture.handle);
        };
        if self.control.fail_mipmap_regeneration.load(Ordering::Relaxed) {
            crate::engine_bail!(SOURCE, "Mipmap regeneration of mock texture #{} failed", handle);
        }
        self.control.regenerations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
#[path = "mock_texture_tests.rs"]
mod tests;
