/// GPU context
///
/// One `GpuContext` per device timeline. It validates texture requests,
/// looks for reusable storage in its cache before asking the backend
/// factory to allocate, and drives mip regeneration and the flush counter.
///
/// Textures keep a weak pointer to the shared part of the context, so they
/// can outlive it: once the context is gone their last drop simply frees the
/// backend object.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use crate::caps::{BackendApi, Caps};
use crate::context::{FlushState, FlushToken};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::resource::{
    compute_texture_scratch_key, ResourceCache, ResourceCategory, ResourceType, UniqueKey,
};
use crate::texture::{
    BackendObjectOwnership, BackendTexture, FlushEpoch, MipmapFilter, MipmapStatus, Protected,
    Texture, TextureDesc, TextureFactory, TextureInfo, TextureRef, TextureType,
};

const SOURCE: &str = "galaxy3d::gpu::Context";

/// Context configuration
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Abort on contract violations and record mip provenance
    pub enable_diagnostics: bool,
    /// Name used in logs
    pub label: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enable_diagnostics: cfg!(debug_assertions),
            label: "Galaxy3D GPU Context".to_string(),
        }
    }
}

/// State shared between a context and its textures
pub(crate) struct ContextShared {
    pub(crate) config: ContextConfig,
    pub(crate) caps: Arc<dyn Caps>,
    pub(crate) texture_resource_type: ResourceType,
    pub(crate) flush: FlushState,
    abandoned: AtomicBool,
    cache: Mutex<ResourceCache>,
    factory: Mutex<Box<dyn TextureFactory>>,
}

impl ContextShared {
    /// Lock the cache
    ///
    /// Never drop a `TextureRef` while holding the guard: releasing the last
    /// reference locks the cache again.
    pub(crate) fn lock_cache(&self) -> MutexGuard<'_, ResourceCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_factory(&self) -> MutexGuard<'_, Box<dyn TextureFactory>> {
        self.factory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owner of the texture resources of one device
pub struct GpuContext {
    shared: Arc<ContextShared>,
}

impl GpuContext {
    /// Create a context around a backend texture factory
    ///
    /// # Errors
    ///
    /// `InitializationFailed` if `Engine::initialize()` has not run.
    pub fn new<F: TextureFactory + 'static>(factory: F, config: ContextConfig) -> Result<Self> {
        let texture_resource_type = Engine::resource_type(ResourceCategory::Texture)?;
        let caps = factory.caps();

        crate::engine_info!(SOURCE, "Creating context \"{}\" ({:?} backend, diagnostics: {})",
            config.label, caps.backend(), config.enable_diagnostics);

        Ok(Self {
            shared: Arc::new(ContextShared {
                config,
                caps,
                texture_resource_type,
                flush: FlushState::new(),
                abandoned: AtomicBool::new(false),
                cache: Mutex::new(ResourceCache::new()),
                factory: Mutex::new(Box::new(factory)),
            }),
        })
    }

    pub fn config(&self) -> &ContextConfig {
        &self.shared.config
    }

    pub fn caps(&self) -> &dyn Caps {
        self.shared.caps.as_ref()
    }

    pub fn backend(&self) -> BackendApi {
        self.shared.caps.backend()
    }

    /// Tag carried by every texture scratch key of this context
    pub fn texture_resource_type(&self) -> ResourceType {
        self.shared.texture_resource_type
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> &Arc<ContextShared> {
        &self.shared
    }

    fn reject(&self, message: String) -> Error {
        crate::engine_warn!(SOURCE, "{}", message);
        Error::InvalidResource(message)
    }

    fn check_not_abandoned(&self) -> Result<()> {
        if self.is_abandoned() {
            return Err(Error::ContextAbandoned);
        }
        Ok(())
    }

    fn check_owned(&self, texture: &Texture) -> Result<()> {
        if !texture.is_owned_by(&self.shared) {
            return Err(self.reject(format!(
                "Texture \"{}\" belongs to another context",
                texture.label()
            )));
        }
        Ok(())
    }

    // ===== TEXTURE CREATION =====

    fn validate_desc(&self, desc: &TextureDesc) -> Result<()> {
        let caps = self.caps();

        if desc.width == 0 || desc.height == 0 {
            return Err(self.reject(format!(
                "Texture \"{}\" has empty dimensions {}x{}",
                desc.label, desc.width, desc.height
            )));
        }
        if desc.width > caps.max_texture_size() || desc.height > caps.max_texture_size() {
            return Err(self.reject(format!(
                "Texture \"{}\" {}x{} exceeds the maximum size {}",
                desc.label, desc.width, desc.height, caps.max_texture_size()
            )));
        }
        if desc.format.backend() != caps.backend() {
            return Err(self.reject(format!(
                "Texture \"{}\" uses a {:?} format on a {:?} context",
                desc.label, desc.format.backend(), caps.backend()
            )));
        }
        if desc.texture_type == TextureType::External {
            return Err(self.reject(format!(
                "External texture \"{}\" cannot be allocated, only wrapped",
                desc.label
            )));
        }
        if desc.sample_count == 0 {
            return Err(self.reject(format!(
                "Texture \"{}\" has a sample count of 0",
                desc.label
            )));
        }
        if desc.sample_count > 1 && !desc.renderable.is_yes() {
            return Err(self.reject(format!(
                "Texture \"{}\" is multisampled ({}x) but not renderable",
                desc.label, desc.sample_count
            )));
        }
        if desc.sample_count > 1 && desc.mipmapped.is_yes() {
            return Err(self.reject(format!(
                "Texture \"{}\" is multisampled ({}x) and cannot have mipmaps",
                desc.label, desc.sample_count
            )));
        }
        if desc.renderable.is_yes() {
            if caps.is_format_compressed(desc.format) {
                return Err(self.reject(format!(
                    "Texture \"{}\" cannot render to compressed format {:?}",
                    desc.label, desc.format
                )));
            }
            if !caps.is_format_renderable(desc.format, desc.sample_count) {
                return Err(self.reject(format!(
                    "Format {:?} is not renderable with {} samples (texture \"{}\")",
                    desc.format, desc.sample_count, desc.label
                )));
            }
        }
        Ok(())
    }

    /// Create a texture, reusing cached storage when possible
    ///
    /// A purgeable texture with the same scratch key is handed back instead
    /// of allocating. Compressed and rectangle textures have no scratch key
    /// and are always allocated.
    ///
    /// # Errors
    ///
    /// `InvalidResource` for an invalid descriptor, `ContextAbandoned` after
    /// `abandon()`, or whatever the backend factory reports.
    pub fn create_texture(&self, desc: &TextureDesc) -> Result<TextureRef> {
        self.check_not_abandoned()?;
        self.validate_desc(desc)?;

        // Only plain 2D storage is fungible
        let scratch_key = if desc.texture_type == TextureType::TwoD {
            compute_texture_scratch_key(
                self.caps(),
                self.shared.texture_resource_type,
                desc.format,
                &desc.shape(),
            )
        } else {
            None
        };

        if let Some(key) = &scratch_key {
            let reused = self.shared.lock_cache().find_and_ref_scratch(key);
            if let Some(texture) = reused {
                crate::engine_trace!(SOURCE, "Reusing scratch texture {:?} for \"{}\"",
                    texture.resource_id(), desc.label);
                return Ok(texture);
            }
        }

        let allocated = self.shared.lock_factory().create_texture(desc)?;
        let info = TextureInfo::from(desc);
        let texture = self
            .shared
            .lock_cache()
            .insert(scratch_key, |id| Texture::new(id, &self.shared, allocated, info));
        Ok(texture)
    }

    /// Adopt (`Owned`) or borrow (`Borrowed`) an existing backend texture
    ///
    /// Wrapped textures have no scratch key. A mipmapped backend texture is
    /// assumed to arrive with valid mips.
    pub fn wrap_backend_texture(
        &self,
        backend_texture: &BackendTexture,
        texture_type: TextureType,
        ownership: BackendObjectOwnership,
        label: &str,
    ) -> Result<TextureRef> {
        self.check_not_abandoned()?;

        if backend_texture.backend() != self.backend() {
            return Err(self.reject(format!(
                "Cannot wrap a {:?} texture on a {:?} context",
                backend_texture.backend(), self.backend()
            )));
        }
        if backend_texture.width == 0 || backend_texture.height == 0 {
            return Err(self.reject(format!(
                "Cannot wrap texture \"{}\" with empty dimensions",
                label
            )));
        }

        let allocated = self
            .shared
            .lock_factory()
            .wrap_backend_texture(backend_texture, ownership)?;
        let info = TextureInfo {
            width: backend_texture.width,
            height: backend_texture.height,
            format: backend_texture.format,
            texture_type,
            protected: Protected::No,
            label: label.to_string(),
        };
        let texture = self
            .shared
            .lock_cache()
            .insert(None, |id| Texture::new(id, &self.shared, allocated, info));
        Ok(texture)
    }

    // ===== KEYS =====

    /// Reference the texture holding `key`, if any
    pub fn find_texture_by_unique_key(&self, key: &UniqueKey) -> Option<TextureRef> {
        let found = self.shared.lock_cache().find_and_ref_unique(key);
        found
    }

    /// Give `key` to `texture`, taking it from any other holder
    pub fn assign_unique_key(&self, texture: &Texture, key: UniqueKey) -> Result<()> {
        self.check_owned(texture)?;
        let tag = key.tag();
        if !self.shared.lock_cache().change_unique_key(texture.resource_id(), key) {
            return Err(self.reject(format!(
                "Texture \"{}\" is no longer tracked by the cache",
                texture.label()
            )));
        }
        crate::engine_trace!(SOURCE, "Unique key {:?} assigned to \"{}\"", tag, texture.label());
        Ok(())
    }

    /// Drop the unique key of `texture`; `false` if it had none
    pub fn remove_unique_key(&self, texture: &Texture) -> bool {
        texture.is_owned_by(&self.shared)
            && self.shared.lock_cache().remove_unique_key(texture.resource_id())
    }

    /// Drop the scratch key of `texture`; `false` if it had none
    pub fn remove_scratch_key(&self, texture: &Texture) -> bool {
        texture.is_owned_by(&self.shared)
            && self.shared.lock_cache().remove_scratch_key(texture.resource_id())
    }

    // ===== CACHE STATISTICS =====

    /// Number of textures tracked, referenced or purgeable
    pub fn resource_count(&self) -> usize {
        self.shared.lock_cache().resource_count()
    }

    /// Number of textures kept alive only by their keys
    pub fn purgeable_resource_count(&self) -> usize {
        self.shared.lock_cache().purgeable_count()
    }

    /// Bytes of GPU memory held by tracked textures
    pub fn gpu_memory_usage(&self) -> u64 {
        self.shared.lock_cache().gpu_memory_bytes()
    }

    /// Destroy every purgeable texture, returning how many were freed
    pub fn purge_unreferenced_resources(&self) -> usize {
        self.shared.lock_cache().purge_unreferenced()
    }

    // ===== FLUSH =====

    /// Enter a flush; `None` if one is already running
    pub fn begin_flush(&self) -> Option<FlushToken<'_>> {
        let token = self.shared.flush.begin();
        if let Some(token) = &token {
            crate::engine_trace!(SOURCE, "Flush #{} begins", token.epoch().number);
        }
        token
    }

    /// Run an (empty) flush, advancing the epoch
    pub fn flush(&self) {
        if let Some(token) = self.begin_flush() {
            drop(token);
        }
    }

    pub fn flush_epoch(&self) -> FlushEpoch {
        self.shared.flush.epoch()
    }

    // ===== MIPMAPS =====

    /// Bring dirty mips back in sync with level 0
    ///
    /// Valid mips are left alone. When the backend fails, the reason is
    /// recorded on the texture and the error returned.
    ///
    /// # Errors
    ///
    /// `InvalidResource` for textures without mips, read-only or compressed
    /// textures, the backend's error otherwise.
    pub fn regenerate_mipmaps(&self, texture: &Texture) -> Result<()> {
        self.check_not_abandoned()?;
        self.check_owned(texture)?;

        match texture.mipmap_status() {
            MipmapStatus::Unallocated => {
                return Err(self.reject(format!(
                    "Texture \"{}\" has no mipmaps to regenerate",
                    texture.label()
                )));
            }
            MipmapStatus::Valid => return Ok(()),
            MipmapStatus::Dirty => {}
        }
        if texture.read_only() {
            return Err(self.reject(format!(
                "Read-only texture \"{}\" cannot regenerate its mipmaps",
                texture.label()
            )));
        }
        if self.caps().is_format_compressed(texture.format()) {
            return Err(self.reject(format!(
                "Compressed texture \"{}\" cannot regenerate its mipmaps",
                texture.label()
            )));
        }

        let result = self
            .shared
            .lock_factory()
            .regenerate_mipmaps(&texture.backend_texture());

        match result {
            Ok(()) => {
                texture.mark_mipmaps_clean();
                crate::engine_trace!(SOURCE, "Regenerated mipmaps of \"{}\"", texture.label());
                Ok(())
            }
            Err(e) => {
                texture.record_mipmap_regen_failure(&e.to_string());
                Err(e)
            }
        }
    }

    /// Draw-time hook called before `texture` is sampled with `filter`
    ///
    /// # Panics
    ///
    /// With diagnostics enabled, when a mip filter samples dirty mips.
    pub fn prepare_for_sampling(&self, texture: &Texture, filter: MipmapFilter) {
        if filter == MipmapFilter::None {
            return;
        }
        if !texture.mipmapped() {
            crate::engine_trace!(SOURCE, "Texture \"{}\" sampled with {:?} but has no mipmaps",
                texture.label(), filter);
            return;
        }
        texture.assert_mipmaps_not_dirty();
    }

    // ===== ABANDON =====

    /// Stop using the device
    ///
    /// Purgeable textures are destroyed and every later allocation fails
    /// with `ContextAbandoned`. Live textures stay usable as plain objects.
    pub fn abandon(&self) {
        if self.shared.abandoned.swap(true, Ordering::AcqRel) {
            return;
        }
        let purged = self.purge_unreferenced_resources();
        crate::engine_info!(SOURCE, "Context \"{}\" abandoned ({} purgeable textures freed)",
            self.shared.config.label, purged);
    }

    pub fn is_abandoned(&self) -> bool {
        self.shared.abandoned.load(Ordering::Acquire)
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        crate::engine_debug!(SOURCE, "Context \"{}\" dropped", self.shared.config.label);
    }
}

#[cfg(test)]
#[path = "gpu_context_tests.rs"]
mod tests;
