/// GPU texture resource
///
/// A `Texture` pairs a backend object with everything the resource layer
/// tracks about it: immutable shape information, the mipmap state machine,
/// and its slot in the owning context's cache.
///
/// Textures are shared through `TextureRef`, an atomically counted
/// reference. Dropping the last `TextureRef` hands the texture back to the
/// cache, which keeps it for reuse if it still carries a key.

use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use crate::caps::{BackendFormat, Caps};
use crate::context::ContextShared;
use crate::resource::{compute_texture_scratch_key, ResourceId, ScratchKey, TextureShape, UniqueKey};
use crate::texture::{
    AllocatedTexture, BackendObjectOwnership, BackendRenderTarget, BackendTexture,
    DirtyProvenance, FlushEpoch, MipmapDirtyReport, MipmapStatus, MipmapTracker, Mipmapped,
    Renderable, StolenBackendTexture, TextureBackend, TextureInfo, TextureType,
};

const SOURCE: &str = "galaxy3d::gpu::Texture";

// ===== SIZING =====

/// Highest mip level index of a full chain: floor(log2(max(width, height)))
pub fn max_mipmap_level(width: u32, height: u32) -> u32 {
    width.max(height).checked_ilog2().unwrap_or(0)
}

/// GPU memory footprint of a texture, in bytes
///
/// Uncompressed formats: one level plus a third for the mip chain.
/// Compressed formats: exact sum of the blocks of every level.
pub fn compute_gpu_memory_size(
    caps: &dyn Caps,
    format: BackendFormat,
    width: u32,
    height: u32,
    mipmapped: bool,
) -> u64 {
    let bytes_per_block = caps.bytes_per_block(format) as u64;

    if !caps.is_format_compressed(format) {
        let base = width as u64 * height as u64 * bytes_per_block;
        return if mipmapped { base + base / 3 } else { base };
    }

    let (block_width, block_height) = caps.block_dimensions(format);
    let levels = if mipmapped { max_mipmap_level(width, height) + 1 } else { 1 };

    (0..levels)
        .map(|level| {
            let level_width = (width >> level).max(1);
            let level_height = (height >> level).max(1);
            level_width.div_ceil(block_width) as u64
                * level_height.div_ceil(block_height) as u64
                * bytes_per_block
        })
        .sum()
}

// ===== TEXTURE =====

/// Texture owned by the resource layer
pub struct Texture {
    id: ResourceId,
    context: Weak<ContextShared>,
    backend: Box<dyn TextureBackend>,
    info: TextureInfo,
    max_mipmap_level: u32,
    read_only: bool,
    diagnostics: bool,
    gpu_memory_size: u64,
    mipmap: Mutex<MipmapTracker>,
}

impl Texture {
    /// Build a texture around freshly allocated backend memory
    ///
    /// The maximum mip level is fixed here: a full chain for `Dirty` or
    /// `Valid`, 0 for `Unallocated`. `External` textures are read-only.
    pub(crate) fn new(
        id: ResourceId,
        context: &Arc<ContextShared>,
        allocated: AllocatedTexture,
        info: TextureInfo,
    ) -> Self {
        let AllocatedTexture { backend, mipmap_status } = allocated;
        let mipmapped = mipmap_status != MipmapStatus::Unallocated;
        let diagnostics = context.config.enable_diagnostics;

        let max_mipmap_level = if mipmapped {
            max_mipmap_level(info.width, info.height)
        } else {
            0
        };
        let gpu_memory_size = compute_gpu_memory_size(
            context.caps.as_ref(),
            info.format,
            info.width,
            info.height,
            mipmapped,
        );
        let mipmap = MipmapTracker::new(mipmap_status, diagnostics, || context.flush.epoch());

        crate::engine_debug!(SOURCE, "Texture \"{}\" {}x{} created ({:?} mips, {:?})",
            info.label, info.width, info.height, mipmap_status, backend.ownership());

        Self {
            id,
            context: Arc::downgrade(context),
            backend,
            read_only: info.texture_type == TextureType::External,
            info,
            max_mipmap_level,
            diagnostics,
            gpu_memory_size,
            mipmap: Mutex::new(mipmap),
        }
    }

    pub(crate) fn is_owned_by(&self, context: &Arc<ContextShared>) -> bool {
        std::ptr::eq(self.context.as_ptr(), Arc::as_ptr(context))
    }

    // ===== PROPERTIES =====

    pub fn resource_id(&self) -> ResourceId {
        self.id
    }

    pub fn info(&self) -> &TextureInfo {
        &self.info
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    pub fn format(&self) -> BackendFormat {
        self.info.format
    }

    pub fn texture_type(&self) -> TextureType {
        self.info.texture_type
    }

    pub fn is_protected(&self) -> bool {
        self.info.protected.is_yes()
    }

    pub fn label(&self) -> &str {
        &self.info.label
    }

    /// Whether the contents may be written (always `true` for `External`)
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Index of the smallest mip level, 0 without a mip chain
    pub fn max_mipmap_level(&self) -> u32 {
        self.max_mipmap_level
    }

    /// Footprint counted against the context's memory usage
    pub fn gpu_memory_size(&self) -> u64 {
        self.gpu_memory_size
    }

    pub fn ownership(&self) -> BackendObjectOwnership {
        self.backend.ownership()
    }

    pub fn backend_texture(&self) -> BackendTexture {
        self.backend.backend_texture()
    }

    /// Render-target view of the texture, if it is renderable
    pub fn as_render_target(&self) -> Option<BackendRenderTarget> {
        self.backend.render_target()
    }

    /// Sample count of the render target, 1 otherwise
    pub fn sample_count(&self) -> u32 {
        self.as_render_target().map_or(1, |rt| rt.sample_count)
    }

    // ===== CACHE KEYS =====

    /// Scratch key describing this texture's storage
    ///
    /// `None` for compressed formats, non-2D textures, or once the context
    /// is gone.
    pub fn compute_scratch_key(&self) -> Option<ScratchKey> {
        if self.info.texture_type != TextureType::TwoD {
            return None;
        }
        let context = self.context.upgrade()?;
        let shape = TextureShape {
            width: self.info.width,
            height: self.info.height,
            renderable: Renderable::from(self.as_render_target().is_some()),
            sample_count: self.sample_count(),
            mipmapped: Mipmapped::from(self.mipmapped()),
            protected: self.info.protected,
        };
        compute_texture_scratch_key(
            context.caps.as_ref(),
            context.texture_resource_type,
            self.info.format,
            &shape,
        )
    }

    /// Unique key currently held in the cache
    pub fn unique_key(&self) -> Option<UniqueKey> {
        let context = self.context.upgrade()?;
        let key = context.lock_cache().unique_key(self.id).cloned();
        key
    }

    /// Scratch key currently held in the cache
    pub fn scratch_key(&self) -> Option<ScratchKey> {
        let context = self.context.upgrade()?;
        let key = context.lock_cache().scratch_key(self.id);
        key
    }

    // ===== MIPMAPS =====

    fn lock_mipmap(&self) -> MutexGuard<'_, MipmapTracker> {
        self.mipmap.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_epoch(&self) -> FlushEpoch {
        self.context
            .upgrade()
            .map(|context| context.flush.epoch())
            .unwrap_or_default()
    }

    /// Whether the texture has a mip chain
    pub fn mipmapped(&self) -> bool {
        self.mipmap_status() != MipmapStatus::Unallocated
    }

    pub fn mipmap_status(&self) -> MipmapStatus {
        self.lock_mipmap().status()
    }

    pub fn mipmaps_are_dirty(&self) -> bool {
        self.lock_mipmap().is_dirty()
    }

    /// Cause of the current dirty state, when diagnostics recorded one
    pub fn mipmap_dirty_provenance(&self) -> Option<DirtyProvenance> {
        self.lock_mipmap().provenance()
    }

    /// Last regeneration-failure reason recorded with diagnostics
    pub fn mipmap_regen_failure(&self) -> String {
        self.lock_mipmap().regen_failure().to_string()
    }

    /// Level 0 changed: derived levels are stale
    ///
    /// Only a `Valid` chain changes state; the first reason is kept.
    pub fn mark_mipmaps_dirty(&self, reason: &'static str) {
        let changed = self.lock_mipmap().mark_dirty(reason, || self.current_epoch());
        if changed {
            crate::engine_trace!(SOURCE, "Mipmaps of \"{}\" dirtied by \"{}\"", self.info.label, reason);
        }
    }

    /// Derived levels match level 0 again
    ///
    /// # Panics
    ///
    /// With diagnostics enabled, when the texture has no mip chain.
    pub fn mark_mipmaps_clean(&self) {
        self.lock_mipmap().mark_clean();
    }

    /// Remember why regenerating the mips failed (diagnostics only)
    pub fn record_mipmap_regen_failure(&self, reason: &str) {
        self.lock_mipmap().record_regen_failure(reason);
    }

    /// Report sampling of stale mips without aborting
    ///
    /// `Ok` unless the chain is `Dirty`.
    pub fn check_mipmaps_not_dirty(&self) -> std::result::Result<(), MipmapDirtyReport> {
        let (provenance, regen_failure) = {
            let tracker = self.lock_mipmap();
            if !tracker.is_dirty() {
                return Ok(());
            }
            (tracker.provenance(), tracker.regen_failure().to_string())
        };

        let render_target = self.as_render_target();
        Err(MipmapDirtyReport {
            provenance,
            current_epoch: self.current_epoch(),
            width: self.info.width,
            height: self.info.height,
            format: self.info.format,
            render_target: render_target.is_some(),
            sample_count: render_target.map_or(1, |rt| rt.sample_count),
            ownership: self.ownership(),
            texture_type: self.info.texture_type,
            read_only: self.read_only,
            regen_failure,
            label: self.info.label.clone(),
        })
    }

    /// Abort if the mips are about to be sampled while stale
    ///
    /// Skipped entirely without diagnostics and for textures without mips.
    ///
    /// # Panics
    ///
    /// With the full `MipmapDirtyReport` as message.
    pub fn assert_mipmaps_not_dirty(&self) {
        if !self.diagnostics || !self.mipmapped() {
            return;
        }
        if let Err(report) = self.check_mipmaps_not_dirty() {
            crate::engine_error!(SOURCE, "{}", report);
            panic!("{}", report);
        }
    }

    /// Whether contract violations abort
    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics
    }

    // ===== RELEASE =====

    fn release_last_reference(self) {
        match self.context.upgrade() {
            Some(context) => {
                context.lock_cache().notify_ref_count_zero(self);
            }
            None => drop(self),
        }
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("label", &self.info.label)
            .field("width", &self.info.width)
            .field("height", &self.info.height)
            .field("format", &self.info.format)
            .field("ownership", &self.ownership())
            .finish_non_exhaustive()
    }
}

// ===== TEXTURE REF =====

/// Counted reference to a `Texture`
///
/// Cloning is cheap and thread-safe. The last drop returns the texture to
/// the context's cache.
pub struct TextureRef {
    texture: ManuallyDrop<Arc<Texture>>,
}

impl TextureRef {
    pub(crate) fn from_arc(texture: Arc<Texture>) -> Self {
        Self { texture: ManuallyDrop::new(texture) }
    }

    /// Whether both references point at the same texture
    pub fn ptr_eq(a: &TextureRef, b: &TextureRef) -> bool {
        Arc::ptr_eq(&*a.texture, &*b.texture)
    }

    /// Number of live references to this texture
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&*self.texture)
    }

    /// Take the backend object out of the resource layer
    ///
    /// Succeeds only for the sole reference to a texture whose backend can
    /// relinquish its object. The texture's keys are removed from the cache
    /// before the reference is dropped, so no lookup can find it afterwards.
    /// On failure nothing changes and the reference is handed back inside the
    /// error.
    pub fn steal_backend_texture(self) -> std::result::Result<StolenBackendTexture, StealError> {
        let id = self.id;
        let diagnostics = self.diagnostics;

        let Some(context) = self.context.upgrade() else {
            if self.ref_count() != 1 {
                return Err(StealError::new(StealFailure::NotUnique, self));
            }
            return match self.backend.steal_backend_texture() {
                Some(stolen) => Ok(stolen),
                None => Err(StealError::new(StealFailure::NotRelinquishable, self)),
            };
        };

        let (stolen, count_before) = {
            // Lookups resurrect references under this lock, so the uniqueness
            // check cannot race with the cache.
            let mut cache = context.lock_cache();
            if self.ref_count() != 1 {
                drop(cache);
                return Err(StealError::new(StealFailure::NotUnique, self));
            }
            let Some(stolen) = self.backend.steal_backend_texture() else {
                drop(cache);
                return Err(StealError::new(StealFailure::NotRelinquishable, self));
            };
            let count = cache.resource_count();
            cache.remove_keys(id);
            (stolen, count)
        };

        drop(self);

        if diagnostics {
            let count_after = context.lock_cache().resource_count();
            assert!(
                count_after < count_before,
                "stolen texture still tracked by the cache ({} resources before, {} after)",
                count_before,
                count_after
            );
        }

        crate::engine_debug!(SOURCE, "Backend texture of {:?} stolen", id);
        Ok(stolen)
    }
}

impl Deref for TextureRef {
    type Target = Texture;

    fn deref(&self) -> &Texture {
        &self.texture
    }
}

impl Clone for TextureRef {
    fn clone(&self) -> Self {
        Self::from_arc(Arc::clone(&self.texture))
    }
}

impl Drop for TextureRef {
    fn drop(&mut self) {
        // SAFETY: `texture` is never used again after this point.
        let texture = unsafe { ManuallyDrop::take(&mut self.texture) };
        if let Some(texture) = Arc::into_inner(texture) {
            texture.release_last_reference();
        }
    }
}

impl fmt::Debug for TextureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self.texture, f)
    }
}

// ===== STEAL ERRORS =====

/// Why a steal was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StealFailure {
    /// Another `TextureRef` to the texture is alive
    NotUnique,
    /// The backend cannot hand out its object (borrowed or already stolen)
    NotRelinquishable,
}

impl fmt::Display for StealFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StealFailure::NotUnique => write!(f, "texture is referenced more than once"),
            StealFailure::NotRelinquishable => write!(f, "backend cannot relinquish the texture"),
        }
    }
}

/// Failed steal, carrying the untouched texture back
#[derive(Debug)]
pub struct StealError {
    failure: StealFailure,
    texture: TextureRef,
}

impl StealError {
    fn new(failure: StealFailure, texture: TextureRef) -> Self {
        crate::engine_debug!(SOURCE, "Steal of \"{}\" refused: {}", texture.label(), failure);
        Self { failure, texture }
    }

    pub fn failure(&self) -> StealFailure {
        self.failure
    }

    /// Get the texture back
    pub fn into_texture(self) -> TextureRef {
        self.texture
    }
}

impl fmt::Display for StealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cannot steal backend texture \"{}\": {}", self.texture.label(), self.failure)
    }
}

impl std::error::Error for StealError {}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
