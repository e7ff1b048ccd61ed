/*!
# Galaxy 3D GPU Resource - Vulkan Backend

Vulkan implementation of the texture backend seam of `galaxy_3d_gpu_resource`.

This crate provides `Caps`, `TextureBackend` and `TextureFactory`
implementations using the Ash library for Vulkan bindings and gpu-allocator
for memory management. Device and instance creation stay with the caller:
the factory is built from an existing `ash::Device`, allocator and queue.

## Example

```no_run
use std::sync::{Arc, Mutex};
use ash::vk;
use gpu_allocator::vulkan::Allocator;
use galaxy_3d_gpu_resource::galaxy3d::{ContextConfig, Engine, GpuContext, Result};
use galaxy_3d_gpu_resource_vulkan::galaxy3d::{VulkanCaps, VulkanTextureFactory};

fn create_context(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    device: ash::Device,
    allocator: Arc<Mutex<Allocator>>,
    queue: vk::Queue,
    queue_family: u32,
) -> Result<GpuContext> {
    Engine::initialize()?;
    let caps = VulkanCaps::from_physical_device(instance, physical_device);
    let factory = VulkanTextureFactory::new(device, allocator, queue, queue_family, caps);
    GpuContext::new(factory, ContextConfig::default())
}
```
*/

mod vulkan_caps;
mod vulkan_texture;
mod vulkan_texture_factory;

pub mod galaxy3d {
    pub use crate::vulkan_caps::VulkanCaps;
    pub use crate::vulkan_texture::VulkanTexture;
    pub use crate::vulkan_texture_factory::VulkanTextureFactory;
}
