/// Vulkan texture factory
///
/// Allocates sampled (and optionally color-attachment) 2D images through
/// gpu-allocator, wraps externally created images, and rebuilds mip chains
/// with `vkCmdBlitImage`. Every image handed to the resource layer rests in
/// `SHADER_READ_ONLY_OPTIMAL` between operations.

use std::sync::{Arc, Mutex, MutexGuard};
use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::{AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use galaxy_3d_gpu_resource::galaxy3d::caps::{BackendFormat, Caps};
use galaxy_3d_gpu_resource::galaxy3d::texture::{
    max_mipmap_level, AllocatedTexture, BackendHandle, BackendObjectOwnership,
    BackendRenderTarget, BackendTexture, MipmapStatus, TextureDesc, TextureFactory,
};
use galaxy_3d_gpu_resource::galaxy3d::{Error, Result};
use galaxy_3d_gpu_resource::{engine_bail, engine_err, engine_error, engine_trace};
use crate::vulkan_caps::VulkanCaps;
use crate::vulkan_texture::VulkanTexture;

const SOURCE: &str = "galaxy3d::vulkan";

const COLOR_LEVEL_0: vk::ImageSubresourceRange = vk::ImageSubresourceRange {
    aspect_mask: vk::ImageAspectFlags::COLOR,
    base_mip_level: 0,
    level_count: 1,
    base_array_layer: 0,
    layer_count: 1,
};

fn color_levels(base_mip_level: u32, level_count: u32) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        base_mip_level,
        level_count,
        ..COLOR_LEVEL_0
    }
}

fn mip_level_count(width: u32, height: u32, mipmapped: bool) -> u32 {
    if mipmapped {
        max_mipmap_level(width, height) + 1
    } else {
        1
    }
}

/// Allocates `VulkanTexture`s on one device and queue
pub struct VulkanTextureFactory {
    device: ash::Device,
    allocator: Arc<Mutex<Allocator>>,
    /// Queue used for layout transitions and mip blits
    queue: vk::Queue,
    queue_family: u32,
    caps: Arc<VulkanCaps>,
}

impl VulkanTextureFactory {
    pub fn new(
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
        queue: vk::Queue,
        queue_family: u32,
        caps: VulkanCaps,
    ) -> Self {
        Self {
            device,
            allocator,
            queue,
            queue_family,
            caps: Arc::new(caps),
        }
    }

    fn lock_allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| engine_err!(SOURCE, "GPU allocator mutex poisoned"))
    }

    fn vk_format(format: BackendFormat) -> Result<vk::Format> {
        VulkanCaps::vk_format(format)
            .ok_or_else(|| Error::InvalidResource(format!("{:?} is not a Vulkan format", format)))
    }

    fn create_view(&self, image: vk::Image, format: vk::Format, mip_levels: u32) -> Result<vk::ImageView> {
        let view_create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(color_levels(0, mip_levels));

        unsafe {
            self.device.create_image_view(&view_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create texture image view: {:?}", e))
        }
    }

    /// Record commands into a transient buffer, submit, and wait for the queue
    fn submit_one_time(&self, record: impl FnOnce(vk::CommandBuffer)) -> Result<()> {
        unsafe {
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(self.queue_family)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT);

            let command_pool = self.device.create_command_pool(&command_pool_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create one-time command pool: {:?}", e))?;

            let result = self.record_and_submit(command_pool, record);
            self.device.destroy_command_pool(command_pool, None);
            result
        }
    }

    unsafe fn record_and_submit(
        &self,
        command_pool: vk::CommandPool,
        record: impl FnOnce(vk::CommandBuffer),
    ) -> Result<()> {
        let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffers = self.device.allocate_command_buffers(&command_buffer_allocate_info)
            .map_err(|e| engine_err!(SOURCE, "Failed to allocate one-time command buffer: {:?}", e))?;
        let command_buffer = command_buffers[0];

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        self.device.begin_command_buffer(command_buffer, &begin_info)
            .map_err(|e| engine_err!(SOURCE, "Failed to begin one-time command buffer: {:?}", e))?;

        record(command_buffer);

        self.device.end_command_buffer(command_buffer)
            .map_err(|e| engine_err!(SOURCE, "Failed to end one-time command buffer: {:?}", e))?;

        let submit_info = vk::SubmitInfo::default()
            .command_buffers(&command_buffers);

        self.device.queue_submit(self.queue, &[submit_info], vk::Fence::null())
            .map_err(|e| engine_err!(SOURCE, "Failed to submit one-time commands to GPU: {:?}", e))?;

        self.device.queue_wait_idle(self.queue)
            .map_err(|e| engine_err!(SOURCE, "Failed to wait for one-time commands: {:?}", e))?;

        Ok(())
    }

    fn image_barrier(
        &self,
        command_buffer: vk::CommandBuffer,
        image: vk::Image,
        range: vk::ImageSubresourceRange,
        (old_layout, src_access, src_stage): (vk::ImageLayout, vk::AccessFlags, vk::PipelineStageFlags),
        (new_layout, dst_access, dst_stage): (vk::ImageLayout, vk::AccessFlags, vk::PipelineStageFlags),
    ) {
        let barrier = vk::ImageMemoryBarrier::default()
            .old_layout(old_layout)
            .new_layout(new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(range)
            .src_access_mask(src_access)
            .dst_access_mask(dst_access);

        unsafe {
            self.device.cmd_pipeline_barrier(
                command_buffer,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
    }

    /// Destroy a partially built image after a failed step
    fn discard_image(&self, image: vk::Image, allocation: Option<gpu_allocator::vulkan::Allocation>) {
        unsafe {
            self.device.destroy_image(image, None);
        }
        if let (Some(allocation), Ok(mut allocator)) = (allocation, self.allocator.lock()) {
            allocator.free(allocation).ok();
        }
    }
}

const UNDEFINED: (vk::ImageLayout, vk::AccessFlags, vk::PipelineStageFlags) = (
    vk::ImageLayout::UNDEFINED,
    vk::AccessFlags::empty(),
    vk::PipelineStageFlags::TOP_OF_PIPE,
);
const SHADER_READ: (vk::ImageLayout, vk::AccessFlags, vk::PipelineStageFlags) = (
    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
    vk::AccessFlags::SHADER_READ,
    vk::PipelineStageFlags::FRAGMENT_SHADER,
);
const TRANSFER_SRC: (vk::ImageLayout, vk::AccessFlags, vk::PipelineStageFlags) = (
    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
    vk::AccessFlags::TRANSFER_READ,
    vk::PipelineStageFlags::TRANSFER,
);
const TRANSFER_DST: (vk::ImageLayout, vk::AccessFlags, vk::PipelineStageFlags) = (
    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
    vk::AccessFlags::TRANSFER_WRITE,
    vk::PipelineStageFlags::TRANSFER,
);

impl TextureFactory for VulkanTextureFactory {
    fn caps(&self) -> Arc<dyn Caps> {
        self.caps.clone()
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<AllocatedTexture> {
        let format = Self::vk_format(desc.format)?;
        let mipmapped = desc.mipmapped.is_yes();
        let mip_levels = mip_level_count(desc.width, desc.height, mipmapped);

        let mut usage_flags = vk::ImageUsageFlags::SAMPLED
            | vk::ImageUsageFlags::TRANSFER_SRC
            | vk::ImageUsageFlags::TRANSFER_DST;
        if desc.renderable.is_yes() {
            usage_flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
        }
        let create_flags = if desc.protected.is_yes() {
            vk::ImageCreateFlags::PROTECTED
        } else {
            vk::ImageCreateFlags::empty()
        };

        let image_create_info = vk::ImageCreateInfo::default()
            .flags(create_flags)
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width: desc.width,
                height: desc.height,
                depth: 1,
            })
            .mip_levels(mip_levels)
            .array_layers(1)
            .samples(vk::SampleCountFlags::from_raw(desc.sample_count))
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage_flags)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe {
            self.device.create_image(&image_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create texture image: {:?}", e))?
        };

        let requirements = unsafe { self.device.get_image_memory_requirements(image) };
        let allocation = self.lock_allocator()?.allocate(&AllocationCreateDesc {
            name: if desc.label.is_empty() { "texture" } else { desc.label.as_str() },
            requirements,
            location: MemoryLocation::GpuOnly,
            linear: false,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        });
        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(_e) => {
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                engine_error!(SOURCE, "Out of GPU memory for texture (size: {}x{}, {:.2} MB)",
                    desc.width, desc.height, size_mb);
                self.discard_image(image, None);
                return Err(Error::OutOfMemory);
            }
        };

        let bound = unsafe { self.device.bind_image_memory(image, allocation.memory(), allocation.offset()) };
        if let Err(e) = bound {
            self.discard_image(image, Some(allocation));
            engine_bail!(SOURCE, "Failed to bind texture image memory: {:?}", e);
        }

        let view = match self.create_view(image, format, mip_levels) {
            Ok(view) => view,
            Err(e) => {
                self.discard_image(image, Some(allocation));
                return Err(e);
            }
        };

        // All levels rest in SHADER_READ_ONLY; contents stay undefined
        let transitioned = self.submit_one_time(|command_buffer| {
            self.image_barrier(command_buffer, image, color_levels(0, mip_levels), UNDEFINED, SHADER_READ);
        });
        if let Err(e) = transitioned {
            unsafe {
                self.device.destroy_image_view(view, None);
            }
            self.discard_image(image, Some(allocation));
            return Err(e);
        }

        let descriptor = BackendTexture {
            width: desc.width,
            height: desc.height,
            mipmapped: desc.mipmapped,
            format: desc.format,
            handle: BackendHandle::Vulkan { image: image.as_raw() },
        };
        let render_target = desc.renderable.is_yes().then_some(BackendRenderTarget {
            sample_count: desc.sample_count,
        });

        engine_trace!(SOURCE, "Created image {:#x} ({}x{}, {} levels, {:?})",
            image.as_raw(), desc.width, desc.height, mip_levels, format);

        Ok(AllocatedTexture {
            backend: Box::new(VulkanTexture::owned(
                image,
                view,
                allocation,
                self.device.clone(),
                self.allocator.clone(),
                descriptor,
                render_target,
            )),
            mipmap_status: if mipmapped {
                MipmapStatus::Dirty
            } else {
                MipmapStatus::Unallocated
            },
        })
    }

    fn wrap_backend_texture(
        &mut self,
        texture: &BackendTexture,
        ownership: BackendObjectOwnership,
    ) -> Result<AllocatedTexture> {
        let BackendHandle::Vulkan { image } = texture.handle else {
            engine_bail!(SOURCE, "{:?} is not a Vulkan image", texture.handle);
        };
        if ownership == BackendObjectOwnership::Owned {
            // Memory of an external image is unknown to the allocator
            return Err(Error::InvalidResource(
                "Vulkan images can only be wrapped as borrowed".to_string(),
            ));
        }

        let format = Self::vk_format(texture.format)?;
        let image = vk::Image::from_raw(image);
        let mipmapped = texture.mipmapped.is_yes();
        let view = self.create_view(
            image,
            format,
            mip_level_count(texture.width, texture.height, mipmapped),
        )?;

        Ok(AllocatedTexture {
            backend: Box::new(VulkanTexture::borrowed(
                image,
                view,
                self.device.clone(),
                self.allocator.clone(),
                *texture,
            )),
            mipmap_status: if mipmapped {
                MipmapStatus::Valid
            } else {
                MipmapStatus::Unallocated
            },
        })
    }

    fn regenerate_mipmaps(&mut self, texture: &BackendTexture) -> Result<()> {
        let BackendHandle::Vulkan { image } = texture.handle else {
            engine_bail!(SOURCE, "{:?} is not a Vulkan image", texture.handle);
        };
        let image = vk::Image::from_raw(image);
        let mip_levels = mip_level_count(texture.width, texture.height, texture.mipmapped.is_yes());
        if mip_levels < 2 {
            return Ok(());
        }

        self.submit_one_time(|command_buffer| {
            // Levels 1.. are fully overwritten
            self.image_barrier(command_buffer, image, color_levels(1, mip_levels - 1), UNDEFINED, TRANSFER_DST);

            for mip in 1..mip_levels {
                let src_mip = mip - 1;
                let src_width = (texture.width >> src_mip).max(1);
                let src_height = (texture.height >> src_mip).max(1);
                let dst_width = (texture.width >> mip).max(1);
                let dst_height = (texture.height >> mip).max(1);

                let src_state = if src_mip == 0 { SHADER_READ } else { TRANSFER_DST };
                self.image_barrier(command_buffer, image, color_levels(src_mip, 1), src_state, TRANSFER_SRC);

                let blit = vk::ImageBlit::default()
                    .src_subresource(vk::ImageSubresourceLayers {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        mip_level: src_mip,
                        base_array_layer: 0,
                        layer_count: 1,
                    })
                    .src_offsets([
                        vk::Offset3D { x: 0, y: 0, z: 0 },
                        vk::Offset3D {
                            x: src_width as i32,
                            y: src_height as i32,
                            z: 1,
                        },
                    ])
                    .dst_subresource(vk::ImageSubresourceLayers {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        mip_level: mip,
                        base_array_layer: 0,
                        layer_count: 1,
                    })
                    .dst_offsets([
                        vk::Offset3D { x: 0, y: 0, z: 0 },
                        vk::Offset3D {
                            x: dst_width as i32,
                            y: dst_height as i32,
                            z: 1,
                        },
                    ]);

                unsafe {
                    self.device.cmd_blit_image(
                        command_buffer,
                        image,
                        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                        image,
                        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                        &[blit],
                        vk::Filter::LINEAR,
                    );
                }

                self.image_barrier(command_buffer, image, color_levels(src_mip, 1), TRANSFER_SRC, SHADER_READ);
            }

            self.image_barrier(command_buffer, image, color_levels(mip_levels - 1, 1), TRANSFER_DST, SHADER_READ);
        })?;

        engine_trace!(SOURCE, "Regenerated {} mip levels of image {:#x}", mip_levels - 1, image.as_raw());
        Ok(())
    }
}
