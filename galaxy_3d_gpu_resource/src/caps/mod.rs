//! Backend capability queries
//!
//! The resource layer never interprets pixel formats itself. Everything it
//! needs to know about a format (compression, block layout, cache
//! fingerprint) comes from the `Caps` implementation of the active backend.

use crate::mock::MockFormat;

/// Graphics API a format, handle, or context belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendApi {
    /// In-process mock backend (no GPU)
    Mock,
    /// Vulkan through `ash`
    Vulkan,
}

/// Backend pixel format, opaque to the resource layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendFormat {
    /// Mock backend format
    Mock(MockFormat),
    /// Raw `VkFormat` value
    Vulkan(i32),
}

impl BackendFormat {
    /// Backend this format belongs to
    pub fn backend(&self) -> BackendApi {
        match self {
            BackendFormat::Mock(_) => BackendApi::Mock,
            BackendFormat::Vulkan(_) => BackendApi::Vulkan,
        }
    }
}

/// Capability provider trait
///
/// Implemented once per backend (`MockCaps`, `VulkanCaps`). Queries about a
/// format belonging to another backend must answer conservatively (not
/// compressed, not renderable, zero-sized).
pub trait Caps: Send + Sync {
    /// Backend these caps describe
    fn backend(&self) -> BackendApi;

    /// Whether the format is block-compressed
    fn is_format_compressed(&self, format: BackendFormat) -> bool;

    /// Deterministic 64-bit fingerprint of the format
    ///
    /// Two formats that are interchangeable for storage reuse must return the
    /// same value; the value must not change for the lifetime of the process.
    fn format_key(&self, format: BackendFormat) -> u64;

    /// Bytes per block (per pixel for uncompressed formats)
    fn bytes_per_block(&self, format: BackendFormat) -> u32;

    /// Block dimensions in pixels, (1, 1) for uncompressed formats
    fn block_dimensions(&self, _format: BackendFormat) -> (u32, u32) {
        (1, 1)
    }

    /// Whether the format can be rendered to with the given sample count
    fn is_format_renderable(&self, format: BackendFormat, sample_count: u32) -> bool;

    /// Largest supported width or height
    fn max_texture_size(&self) -> u32;
}
