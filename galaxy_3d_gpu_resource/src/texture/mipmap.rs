/// Mipmap validity tracking
///
/// A mipmapped texture's derived levels are either in sync with level 0
/// (`Valid`) or stale (`Dirty`). Textures without a mip chain are
/// `Unallocated` and never leave that state.
///
/// | from \ op   | mark_dirty | mark_clean                        |
/// |-------------|------------|-----------------------------------|
/// | Unallocated | no-op      | contract violation                |
/// | Dirty       | no-op      | Valid                             |
/// | Valid       | Dirty      | Valid                             |
///
/// With diagnostics enabled the tracker also remembers *why* and *when*
/// (flush epoch) the chain went dirty, so that sampling stale mips can be
/// reported with its cause.

use std::fmt;
use crate::caps::BackendFormat;
use crate::texture::{BackendObjectOwnership, TextureType};

/// Regeneration-failure reason recorded while nothing has failed
pub const REGEN_DID_NOT_FAIL: &str = "did not fail";

/// Reason recorded for textures constructed with stale mips
pub const CREATED_DIRTY_REASON: &str = "created dirty";

/// Validity of a texture's mip chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipmapStatus {
    /// No mip chain
    Unallocated,
    /// Derived levels are stale
    Dirty,
    /// Derived levels match level 0
    Valid,
}

/// Position of the context on its flush timeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FlushEpoch {
    /// Number of the next (or current) flush
    pub number: u64,
    /// Whether that flush is in progress
    pub in_flush: bool,
}

impl fmt::Display for FlushEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let position = if self.in_flush { "in" } else { "before" };
        write!(f, "{} flush #{}", position, self.number)
    }
}

/// Why and when a mip chain went dirty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyProvenance {
    pub reason: &'static str,
    pub epoch: FlushEpoch,
}

/// Mipmap state machine of one texture
#[derive(Debug, Clone)]
pub struct MipmapTracker {
    status: MipmapStatus,
    diagnostics: bool,
    provenance: Option<DirtyProvenance>,
    regen_failure: String,
}

impl MipmapTracker {
    /// Create a tracker in `status`
    ///
    /// `epoch` is only called when diagnostics are enabled and the texture
    /// starts out dirty.
    pub fn new(status: MipmapStatus, diagnostics: bool, epoch: impl FnOnce() -> FlushEpoch) -> Self {
        let provenance = (diagnostics && status == MipmapStatus::Dirty).then(|| DirtyProvenance {
            reason: CREATED_DIRTY_REASON,
            epoch: epoch(),
        });

        Self {
            status,
            diagnostics,
            provenance,
            regen_failure: REGEN_DID_NOT_FAIL.to_string(),
        }
    }

    pub fn status(&self) -> MipmapStatus {
        self.status
    }

    pub fn is_dirty(&self) -> bool {
        self.status == MipmapStatus::Dirty
    }

    /// Whether dirty provenance and regeneration failures are recorded
    pub fn diagnostics(&self) -> bool {
        self.diagnostics
    }

    /// Cause of the current dirty state (diagnostics only)
    pub fn provenance(&self) -> Option<DirtyProvenance> {
        self.provenance
    }

    /// Last regeneration-failure reason (diagnostics only)
    pub fn regen_failure(&self) -> &str {
        &self.regen_failure
    }

    /// Valid -> Dirty
    ///
    /// The first cause is kept: dirtying an already dirty chain changes
    /// nothing. Returns whether the status changed.
    pub fn mark_dirty(&mut self, reason: &'static str, epoch: impl FnOnce() -> FlushEpoch) -> bool {
        if self.status != MipmapStatus::Valid {
            return false;
        }
        self.status = MipmapStatus::Dirty;
        if self.diagnostics {
            self.provenance = Some(DirtyProvenance { reason, epoch: epoch() });
        }
        true
    }

    /// Dirty -> Valid, Valid -> Valid
    ///
    /// # Panics
    ///
    /// On a texture without a mip chain, when diagnostics are enabled.
    /// Without diagnostics the call is ignored.
    pub fn mark_clean(&mut self) {
        if self.status == MipmapStatus::Unallocated {
            if self.diagnostics {
                panic!("mark_mipmaps_clean called on a texture without mipmaps");
            }
            return;
        }
        self.status = MipmapStatus::Valid;
        self.provenance = None;
        self.regen_failure.clear();
        self.regen_failure.push_str(REGEN_DID_NOT_FAIL);
    }

    /// Remember why the last regeneration failed (diagnostics only)
    pub fn record_regen_failure(&mut self, reason: &str) {
        if self.diagnostics {
            self.regen_failure = reason.to_string();
        }
    }
}

/// Everything known about a texture sampled with dirty mips
///
/// Produced by `Texture::check_mipmaps_not_dirty`. The `Display` output is
/// meant for humans and may change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipmapDirtyReport {
    /// Recorded cause, `None` if diagnostics were off when it went dirty
    pub provenance: Option<DirtyProvenance>,
    pub current_epoch: FlushEpoch,
    pub width: u32,
    pub height: u32,
    pub format: BackendFormat,
    pub render_target: bool,
    pub sample_count: u32,
    pub ownership: BackendObjectOwnership,
    pub texture_type: TextureType,
    pub read_only: bool,
    pub regen_failure: String,
    pub label: String,
}

impl MipmapDirtyReport {
    /// Whether the mips went dirty inside the flush that is now running
    pub fn dirtied_during_current_flush(&self) -> bool {
        self.current_epoch.in_flush
            && self.provenance.is_some_and(|p| p.epoch == self.current_epoch)
    }
}

impl fmt::Display for MipmapDirtyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provenance {
            Some(provenance) => write!(
                f,
                "Mipmaps dirty unexpectedly. Dirtied by \"{}\" {}, now we're {}.",
                provenance.reason, provenance.epoch, self.current_epoch
            )?,
            None => write!(
                f,
                "Mipmaps dirty unexpectedly. Dirtied by an unrecorded cause, now we're {}.",
                self.current_epoch
            )?,
        }
        write!(
            f,
            " Texture \"{}\" {}x{}, format: {:?}, render target: {}, samples: {}, borrowed: {}, type: {:?}, read-only: {}, regen failed: {}",
            self.label,
            self.width,
            self.height,
            self.format,
            self.render_target,
            self.sample_count,
            self.ownership == BackendObjectOwnership::Borrowed,
            self.texture_type,
            self.read_only,
            self.regen_failure,
        )
    }
}

#[cfg(test)]
#[path = "mipmap_tests.rs"]
mod tests;
