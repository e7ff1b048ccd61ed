/// Scratch keys: storage fingerprints for fungible GPU memory
///
/// Two textures with equal scratch keys are interchangeable as storage: same
/// dimensions, same format fingerprint, same render/mip/protection
/// attributes. The cache uses the key to hand out a released texture instead
/// of allocating a new one.
///
/// Texture key layout (five words after the resource-type tag):
///
/// | word | content                                   |
/// |------|-------------------------------------------|
/// | 0    | width                                     |
/// | 1    | height                                    |
/// | 2    | format fingerprint, low 32 bits           |
/// | 3    | format fingerprint, high 32 bits          |
/// | 4    | `ScratchKeyFlags` \| sample count << 3    |

use bitflags::bitflags;
use crate::caps::{BackendFormat, Caps};
use crate::resource::ResourceType;
use crate::texture::{Mipmapped, Protected, Renderable};

/// Number of data words in a texture scratch key
pub const TEXTURE_SCRATCH_KEY_WORDS: usize = 5;

/// Bit position of the sample count in the packed word
pub const SAMPLE_COUNT_SHIFT: u32 = 3;

bitflags! {
    /// Boolean attributes packed in the low bits of word 4
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ScratchKeyFlags: u32 {
        const MIPMAPPED = 1 << 0;
        const PROTECTED = 1 << 1;
        const RENDERABLE = 1 << 2;
    }
}

/// Attributes that decide whether two textures can share storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureShape {
    pub width: u32,
    pub height: u32,
    pub renderable: Renderable,
    pub sample_count: u32,
    pub mipmapped: Mipmapped,
    pub protected: Protected,
}

/// Non-unique fingerprint used to find reusable GPU memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScratchKey {
    resource_type: ResourceType,
    words: [u32; TEXTURE_SCRATCH_KEY_WORDS],
}

impl ScratchKey {
    /// Build the key of a texture from its shape and format fingerprint
    ///
    /// Pure function. The caller guarantees non-zero dimensions, a sample
    /// count of at least 1, and a sample count of 1 unless renderable; these
    /// are checked in debug builds only.
    pub fn for_texture(resource_type: ResourceType, format_key: u64, shape: &TextureShape) -> Self {
        debug_assert!(shape.width > 0 && shape.height > 0);
        debug_assert!(shape.sample_count > 0);
        debug_assert!(shape.sample_count == 1 || shape.renderable.is_yes());
        debug_assert!(shape.sample_count < 1 << (32 - SAMPLE_COUNT_SHIFT));

        let mut flags = ScratchKeyFlags::empty();
        flags.set(ScratchKeyFlags::MIPMAPPED, shape.mipmapped.is_yes());
        flags.set(ScratchKeyFlags::PROTECTED, shape.protected.is_yes());
        flags.set(ScratchKeyFlags::RENDERABLE, shape.renderable.is_yes());

        Self {
            resource_type,
            words: [
                shape.width,
                shape.height,
                (format_key & 0xFFFF_FFFF) as u32,
                (format_key >> 32) as u32,
                flags.bits() | (shape.sample_count << SAMPLE_COUNT_SHIFT),
            ],
        }
    }

    /// Resource-type tag
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Raw data words
    pub fn words(&self) -> &[u32; TEXTURE_SCRATCH_KEY_WORDS] {
        &self.words
    }

    pub fn width(&self) -> u32 {
        self.words[0]
    }

    pub fn height(&self) -> u32 {
        self.words[1]
    }

    /// Format fingerprint reassembled from words 2 and 3
    pub fn format_key(&self) -> u64 {
        (self.words[2] as u64) | ((self.words[3] as u64) << 32)
    }

    /// Packed attribute word
    pub fn packed(&self) -> u32 {
        self.words[4]
    }

    pub fn flags(&self) -> ScratchKeyFlags {
        ScratchKeyFlags::from_bits_truncate(self.words[4])
    }

    pub fn sample_count(&self) -> u32 {
        self.words[4] >> SAMPLE_COUNT_SHIFT
    }
}

/// Scratch key of a texture, or `None` when its format is compressed
///
/// Compressed textures are never fungible: their contents are uploaded once
/// and they are never rendered to, so there is nothing to recycle.
pub fn compute_texture_scratch_key(
    caps: &dyn Caps,
    resource_type: ResourceType,
    format: BackendFormat,
    shape: &TextureShape,
) -> Option<ScratchKey> {
    if caps.is_format_compressed(format) {
        return None;
    }
    Some(ScratchKey::for_texture(resource_type, caps.format_key(format), shape))
}

#[cfg(test)]
#[path = "scratch_key_tests.rs"]
mod tests;
