/// Mock formats and capabilities

use crate::caps::{BackendApi, BackendFormat, Caps};

/// Pixel formats understood by the mock backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockFormat {
    Rgba8,
    Bgra8,
    R8,
    Rgba16F,
    /// ETC2 RGB, 8 bytes per 4x4 block
    Etc2Rgb8,
    /// BC1 RGBA, 8 bytes per 4x4 block
    Bc1Rgba,
}

impl MockFormat {
    pub fn is_compressed(self) -> bool {
        matches!(self, MockFormat::Etc2Rgb8 | MockFormat::Bc1Rgba)
    }

    /// Bytes per pixel, or per block for compressed formats
    pub fn bytes_per_block(self) -> u32 {
        match self {
            MockFormat::R8 => 1,
            MockFormat::Rgba8 | MockFormat::Bgra8 => 4,
            MockFormat::Rgba16F => 8,
            MockFormat::Etc2Rgb8 | MockFormat::Bc1Rgba => 8,
        }
    }

    pub fn block_dimensions(self) -> (u32, u32) {
        if self.is_compressed() { (4, 4) } else { (1, 1) }
    }

    /// Stable fingerprint, never 0
    pub fn key(self) -> u64 {
        self as u64 + 1
    }
}

/// Capabilities of the mock device
#[derive(Debug, Clone)]
pub struct MockCaps {
    max_texture_size: u32,
    max_sample_count: u32,
}

impl MockCaps {
    /// 16384 pixels per side, up to 8 samples
    pub fn new() -> Self {
        Self {
            max_texture_size: 16384,
            max_sample_count: 8,
        }
    }

    pub fn with_max_texture_size(mut self, size: u32) -> Self {
        self.max_texture_size = size;
        self
    }

    pub fn with_max_sample_count(mut self, count: u32) -> Self {
        self.max_sample_count = count;
        self
    }

    pub fn max_sample_count(&self) -> u32 {
        self.max_sample_count
    }
}

impl Default for MockCaps {
    fn default() -> Self {
        Self::new()
    }
}

impl Caps for MockCaps {
    fn backend(&self) -> BackendApi {
        BackendApi::Mock
    }

    fn is_format_compressed(&self, format: BackendFormat) -> bool {
        match format {
            BackendFormat::Mock(format) => format.is_compressed(),
            _ => false,
        }
    }

    fn format_key(&self, format: BackendFormat) -> u64 {
        match format {
            BackendFormat::Mock(format) => format.key(),
            _ => 0,
        }
    }

    fn bytes_per_block(&self, format: BackendFormat) -> u32 {
        match format {
            BackendFormat::Mock(format) => format.bytes_per_block(),
            _ => 0,
        }
    }

    fn block_dimensions(&self, format: BackendFormat) -> (u32, u32) {
        match format {
            BackendFormat::Mock(format) => format.block_dimensions(),
            _ => (1, 1),
        }
    }

    fn is_format_renderable(&self, format: BackendFormat, sample_count: u32) -> bool {
        match format {
            BackendFormat::Mock(format) => {
                !format.is_compressed()
                    && sample_count.is_power_of_two()
                    && sample_count <= self.max_sample_count
            }
            _ => false,
        }
    }

    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }
}

#[cfg(test)]
#[path = "mock_caps_tests.rs"]
mod tests;
