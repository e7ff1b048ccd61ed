//! Unit tests for vulkan_caps.rs
//!
//! Format tables only; nothing here needs a Vulkan device.

use ash::vk;
use galaxy_3d_gpu_resource::galaxy3d::caps::{BackendApi, BackendFormat, Caps};
use galaxy_3d_gpu_resource::galaxy3d::mock::MockFormat;
use super::VulkanCaps;

fn caps() -> VulkanCaps {
    VulkanCaps::new(
        8192,
        vk::SampleCountFlags::TYPE_1 | vk::SampleCountFlags::TYPE_2 | vk::SampleCountFlags::TYPE_4,
    )
}

fn fmt(format: vk::Format) -> BackendFormat {
    VulkanCaps::backend_format(format)
}

#[test]
fn test_backend_and_limits() {
    let caps = caps();
    assert_eq!(caps.backend(), BackendApi::Vulkan);
    assert_eq!(caps.max_texture_size(), 8192);
}

#[test]
fn test_vk_format_conversion() {
    let format = fmt(vk::Format::R8G8B8A8_UNORM);
    assert_eq!(VulkanCaps::vk_format(format), Some(vk::Format::R8G8B8A8_UNORM));
    assert_eq!(VulkanCaps::vk_format(BackendFormat::Mock(MockFormat::Rgba8)), None);
}

#[test]
fn test_compressed_families() {
    let caps = caps();
    for format in [
        vk::Format::BC1_RGB_UNORM_BLOCK,
        vk::Format::BC7_SRGB_BLOCK,
        vk::Format::ETC2_R8G8B8_UNORM_BLOCK,
        vk::Format::EAC_R11G11_SNORM_BLOCK,
        vk::Format::ASTC_4X4_UNORM_BLOCK,
        vk::Format::ASTC_12X12_SRGB_BLOCK,
    ] {
        assert!(caps.is_format_compressed(fmt(format)), "{:?}", format);
    }
    assert!(!caps.is_format_compressed(fmt(vk::Format::R8G8B8A8_UNORM)));
    assert!(!caps.is_format_compressed(BackendFormat::Mock(MockFormat::Bc1Rgba)));
}

#[test]
fn test_block_sizes() {
    let caps = caps();
    assert_eq!(caps.bytes_per_block(fmt(vk::Format::BC1_RGBA_UNORM_BLOCK)), 8);
    assert_eq!(caps.bytes_per_block(fmt(vk::Format::BC3_UNORM_BLOCK)), 16);
    assert_eq!(caps.bytes_per_block(fmt(vk::Format::ETC2_R8G8B8_UNORM_BLOCK)), 8);
    assert_eq!(caps.bytes_per_block(fmt(vk::Format::ETC2_R8G8B8A8_UNORM_BLOCK)), 16);
    assert_eq!(caps.bytes_per_block(fmt(vk::Format::ASTC_8X8_SRGB_BLOCK)), 16);

    assert_eq!(caps.bytes_per_block(fmt(vk::Format::R8_UNORM)), 1);
    assert_eq!(caps.bytes_per_block(fmt(vk::Format::R16_SFLOAT)), 2);
    assert_eq!(caps.bytes_per_block(fmt(vk::Format::B8G8R8A8_SRGB)), 4);
    assert_eq!(caps.bytes_per_block(fmt(vk::Format::R16G16B16A16_SFLOAT)), 8);
    assert_eq!(caps.bytes_per_block(fmt(vk::Format::R32G32B32A32_SFLOAT)), 16);
    assert_eq!(caps.bytes_per_block(fmt(vk::Format::UNDEFINED)), 0);
}

#[test]
fn test_block_dimensions() {
    let caps = caps();
    assert_eq!(caps.block_dimensions(fmt(vk::Format::R8G8B8A8_UNORM)), (1, 1));
    assert_eq!(caps.block_dimensions(fmt(vk::Format::BC1_RGB_UNORM_BLOCK)), (4, 4));
    assert_eq!(caps.block_dimensions(fmt(vk::Format::EAC_R11_UNORM_BLOCK)), (4, 4));
    assert_eq!(caps.block_dimensions(fmt(vk::Format::ASTC_4X4_SRGB_BLOCK)), (4, 4));
    assert_eq!(caps.block_dimensions(fmt(vk::Format::ASTC_6X5_UNORM_BLOCK)), (6, 5));
    assert_eq!(caps.block_dimensions(fmt(vk::Format::ASTC_10X8_SRGB_BLOCK)), (10, 8));
    assert_eq!(caps.block_dimensions(fmt(vk::Format::ASTC_12X12_SRGB_BLOCK)), (12, 12));
}

#[test]
fn test_format_key_is_raw_value() {
    let caps = caps();
    assert_eq!(
        caps.format_key(fmt(vk::Format::R8G8B8A8_UNORM)),
        vk::Format::R8G8B8A8_UNORM.as_raw() as u64
    );
    assert_ne!(
        caps.format_key(fmt(vk::Format::R8G8B8A8_UNORM)),
        caps.format_key(fmt(vk::Format::R8G8B8A8_SRGB))
    );
    assert_eq!(caps.format_key(BackendFormat::Mock(MockFormat::Rgba8)), 0);
}

#[test]
fn test_renderability() {
    let caps = caps();
    let rgba = fmt(vk::Format::R8G8B8A8_UNORM);
    assert!(caps.is_format_renderable(rgba, 1));
    assert!(caps.is_format_renderable(rgba, 4));
    assert!(!caps.is_format_renderable(rgba, 8));
    assert!(!caps.is_format_renderable(rgba, 3));

    assert!(!caps.is_format_renderable(fmt(vk::Format::BC1_RGB_UNORM_BLOCK), 1));
    assert!(!caps.is_format_renderable(fmt(vk::Format::D32_SFLOAT), 1));
    assert!(!caps.is_format_renderable(fmt(vk::Format::UNDEFINED), 1));
    assert!(!caps.is_format_renderable(BackendFormat::Mock(MockFormat::Rgba8), 1));
}
