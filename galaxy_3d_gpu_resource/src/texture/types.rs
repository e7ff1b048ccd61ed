/// Texture descriptor and attribute types

use crate::caps::BackendFormat;
use crate::resource::TextureShape;

/// Whether a texture can also be used as a draw target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Renderable {
    No,
    Yes,
}

/// Whether a texture has (or requests) a mip chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mipmapped {
    No,
    Yes,
}

/// Whether a texture lives in protected (DRM) memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protected {
    No,
    Yes,
}

/// Texture shape category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    /// Regular 2D texture
    TwoD,
    /// Rectangle texture (unnormalized coordinates, no mips in practice)
    Rectangle,
    /// Externally produced image (camera, video decoder); always read-only
    External,
}

/// Mip filter requested by a sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipmapFilter {
    /// Base level only
    None,
    Nearest,
    Linear,
}

macro_rules! impl_yes_no {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                /// `true` for `Yes`
                pub fn is_yes(self) -> bool {
                    self == $ty::Yes
                }
            }

            impl From<bool> for $ty {
                fn from(value: bool) -> Self {
                    if value { $ty::Yes } else { $ty::No }
                }
            }
        )*
    };
}

impl_yes_no!(Renderable, Mipmapped, Protected);

/// Descriptor for allocating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Backend pixel format
    pub format: BackendFormat,
    /// Shape category
    pub texture_type: TextureType,
    /// Also usable as a draw target
    pub renderable: Renderable,
    /// MSAA sample count (1 unless renderable)
    pub sample_count: u32,
    /// Allocate a full mip chain
    pub mipmapped: Mipmapped,
    /// Protected memory
    pub protected: Protected,
    /// Debug label
    pub label: String,
}

impl TextureDesc {
    /// Single-sampled, non-renderable, non-mipmapped 2D texture
    pub fn new(width: u32, height: u32, format: BackendFormat) -> Self {
        Self {
            width,
            height,
            format,
            texture_type: TextureType::TwoD,
            renderable: Renderable::No,
            sample_count: 1,
            mipmapped: Mipmapped::No,
            protected: Protected::No,
            label: String::new(),
        }
    }

    /// Attributes that decide storage compatibility
    pub fn shape(&self) -> TextureShape {
        TextureShape {
            width: self.width,
            height: self.height,
            renderable: self.renderable,
            sample_count: self.sample_count,
            mipmapped: self.mipmapped,
            protected: self.protected,
        }
    }
}

/// Read-only properties of a created texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Backend pixel format
    pub format: BackendFormat,
    /// Shape category
    pub texture_type: TextureType,
    /// Protected memory
    pub protected: Protected,
    /// Debug label
    pub label: String,
}

impl From<&TextureDesc> for TextureInfo {
    fn from(desc: &TextureDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            texture_type: desc.texture_type,
            protected: desc.protected,
            label: desc.label.clone(),
        }
    }
}
