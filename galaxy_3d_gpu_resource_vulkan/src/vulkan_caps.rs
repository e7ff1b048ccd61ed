/// Vulkan capability provider

use ash::vk;
use galaxy_3d_gpu_resource::galaxy3d::caps::{BackendApi, BackendFormat, Caps};

/// Device limits and format tables of a Vulkan physical device
#[derive(Debug, Clone, Copy)]
pub struct VulkanCaps {
    max_texture_size: u32,
    /// Sample counts supported for color attachments
    sample_counts: vk::SampleCountFlags,
}

impl VulkanCaps {
    pub fn new(max_texture_size: u32, sample_counts: vk::SampleCountFlags) -> Self {
        Self {
            max_texture_size,
            sample_counts,
        }
    }

    /// Read the limits of a physical device
    pub fn from_physical_device(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> Self {
        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let limits = properties.limits;
        Self::new(
            limits.max_image_dimension2_d,
            limits.framebuffer_color_sample_counts,
        )
    }

    pub fn sample_counts(&self) -> vk::SampleCountFlags {
        self.sample_counts
    }

    /// `VkFormat` behind a backend format, if it is a Vulkan one
    pub fn vk_format(format: BackendFormat) -> Option<vk::Format> {
        match format {
            BackendFormat::Vulkan(raw) => Some(vk::Format::from_raw(raw)),
            _ => None,
        }
    }

    /// Backend format wrapping a `VkFormat`
    pub fn backend_format(format: vk::Format) -> BackendFormat {
        BackendFormat::Vulkan(format.as_raw())
    }

    pub fn supports_sample_count(&self, sample_count: u32) -> bool {
        sample_count.is_power_of_two()
            && sample_count <= 64
            && self.sample_counts.contains(vk::SampleCountFlags::from_raw(sample_count))
    }
}

// ===== FORMAT TABLES =====

fn is_compressed(format: vk::Format) -> bool {
    let raw = format.as_raw();
    (vk::Format::BC1_RGB_UNORM_BLOCK.as_raw()..=vk::Format::BC7_SRGB_BLOCK.as_raw()).contains(&raw)
        || (vk::Format::ETC2_R8G8B8_UNORM_BLOCK.as_raw()..=vk::Format::EAC_R11G11_SNORM_BLOCK.as_raw())
            .contains(&raw)
        || (vk::Format::ASTC_4X4_UNORM_BLOCK.as_raw()..=vk::Format::ASTC_12X12_SRGB_BLOCK.as_raw())
            .contains(&raw)
}

fn is_astc(format: vk::Format) -> bool {
    let raw = format.as_raw();
    (vk::Format::ASTC_4X4_UNORM_BLOCK.as_raw()..=vk::Format::ASTC_12X12_SRGB_BLOCK.as_raw()).contains(&raw)
}

/// ASTC footprints, each with a UNORM and an SRGB variant
const ASTC_BLOCKS: [(u32, u32); 14] = [
    (4, 4), (5, 4), (5, 5), (6, 5), (6, 6), (8, 5), (8, 6),
    (8, 8), (10, 5), (10, 6), (10, 8), (10, 10), (12, 10), (12, 12),
];

fn block_dimensions(format: vk::Format) -> (u32, u32) {
    if is_astc(format) {
        let index = (format.as_raw() - vk::Format::ASTC_4X4_UNORM_BLOCK.as_raw()) as usize / 2;
        return ASTC_BLOCKS[index];
    }
    if is_compressed(format) {
        return (4, 4);
    }
    (1, 1)
}

fn bytes_per_block(format: vk::Format) -> u32 {
    match format {
        // 8-byte blocks
        vk::Format::BC1_RGB_UNORM_BLOCK
        | vk::Format::BC1_RGB_SRGB_BLOCK
        | vk::Format::BC1_RGBA_UNORM_BLOCK
        | vk::Format::BC1_RGBA_SRGB_BLOCK
        | vk::Format::BC4_UNORM_BLOCK
        | vk::Format::BC4_SNORM_BLOCK
        | vk::Format::ETC2_R8G8B8_UNORM_BLOCK
        | vk::Format::ETC2_R8G8B8_SRGB_BLOCK
        | vk::Format::ETC2_R8G8B8A1_UNORM_BLOCK
        | vk::Format::ETC2_R8G8B8A1_SRGB_BLOCK
        | vk::Format::EAC_R11_UNORM_BLOCK
        | vk::Format::EAC_R11_SNORM_BLOCK => 8,
        f if is_compressed(f) => 16,

        vk::Format::R8_UNORM
        | vk::Format::R8_SNORM
        | vk::Format::R8_UINT
        | vk::Format::R8_SINT
        | vk::Format::R8_SRGB => 1,

        vk::Format::R8G8_UNORM
        | vk::Format::R8G8_SNORM
        | vk::Format::R8G8_UINT
        | vk::Format::R8G8_SINT
        | vk::Format::R16_UNORM
        | vk::Format::R16_UINT
        | vk::Format::R16_SINT
        | vk::Format::R16_SFLOAT
        | vk::Format::R5G6B5_UNORM_PACK16
        | vk::Format::B5G6R5_UNORM_PACK16
        | vk::Format::R4G4B4A4_UNORM_PACK16
        | vk::Format::D16_UNORM => 2,

        vk::Format::R8G8B8A8_UNORM
        | vk::Format::R8G8B8A8_SNORM
        | vk::Format::R8G8B8A8_UINT
        | vk::Format::R8G8B8A8_SINT
        | vk::Format::R8G8B8A8_SRGB
        | vk::Format::B8G8R8A8_UNORM
        | vk::Format::B8G8R8A8_SRGB
        | vk::Format::A2B10G10R10_UNORM_PACK32
        | vk::Format::A2R10G10B10_UNORM_PACK32
        | vk::Format::B10G11R11_UFLOAT_PACK32
        | vk::Format::R16G16_UNORM
        | vk::Format::R16G16_SFLOAT
        | vk::Format::R32_UINT
        | vk::Format::R32_SINT
        | vk::Format::R32_SFLOAT
        | vk::Format::D32_SFLOAT
        | vk::Format::D24_UNORM_S8_UINT => 4,

        vk::Format::R16G16B16A16_UNORM
        | vk::Format::R16G16B16A16_UINT
        | vk::Format::R16G16B16A16_SINT
        | vk::Format::R16G16B16A16_SFLOAT
        | vk::Format::R32G32_UINT
        | vk::Format::R32G32_SFLOAT => 8,

        vk::Format::R32G32B32A32_UINT
        | vk::Format::R32G32B32A32_SINT
        | vk::Format::R32G32B32A32_SFLOAT => 16,

        _ => 0,
    }
}

/// Uncompressed color formats usable as color attachments
fn is_color_renderable(format: vk::Format) -> bool {
    match format {
        vk::Format::D16_UNORM
        | vk::Format::D32_SFLOAT
        | vk::Format::D24_UNORM_S8_UINT
        | vk::Format::R8_SNORM
        | vk::Format::R8G8_SNORM
        | vk::Format::R8G8B8A8_SNORM => false,
        f => !is_compressed(f) && bytes_per_block(f) > 0,
    }
}

impl Caps for VulkanCaps {
    fn backend(&self) -> BackendApi {
        BackendApi::Vulkan
    }

    fn is_format_compressed(&self, format: BackendFormat) -> bool {
        Self::vk_format(format).is_some_and(is_compressed)
    }

    fn format_key(&self, format: BackendFormat) -> u64 {
        match format {
            BackendFormat::Vulkan(raw) => raw as u32 as u64,
            _ => 0,
        }
    }

    fn bytes_per_block(&self, format: BackendFormat) -> u32 {
        Self::vk_format(format).map_or(0, bytes_per_block)
    }

    fn block_dimensions(&self, format: BackendFormat) -> (u32, u32) {
        Self::vk_format(format).map_or((1, 1), block_dimensions)
    }

    fn is_format_renderable(&self, format: BackendFormat, sample_count: u32) -> bool {
        Self::vk_format(format).is_some_and(is_color_renderable)
            && self.supports_sample_count(sample_count)
    }

    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }
}

#[cfg(test)]
#[path = "vulkan_caps_tests.rs"]
mod tests;
