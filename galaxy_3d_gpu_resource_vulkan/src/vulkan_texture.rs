/// Vulkan texture backend object

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::{Allocation, Allocator};
use galaxy_3d_gpu_resource::galaxy3d::caps::BackendApi;
use galaxy_3d_gpu_resource::galaxy3d::texture::{
    BackendObjectOwnership, BackendRenderTarget, BackendTexture, StolenBackendTexture,
    TextureBackend,
};
use galaxy_3d_gpu_resource::engine_warn;

const SOURCE: &str = "galaxy3d::vulkan";

struct ImageState {
    view: vk::ImageView,
    /// `None` for borrowed images and once stolen
    allocation: Option<Allocation>,
    stolen: bool,
}

/// Vulkan image, its view, and (when owned) its memory
pub struct VulkanTexture {
    image: vk::Image,
    state: Mutex<ImageState>,
    device: ash::Device,
    allocator: Arc<Mutex<Allocator>>,
    ownership: BackendObjectOwnership,
    descriptor: BackendTexture,
    render_target: Option<BackendRenderTarget>,
}

impl VulkanTexture {
    /// Image allocated by the factory; freed on drop
    pub(crate) fn owned(
        image: vk::Image,
        view: vk::ImageView,
        allocation: Allocation,
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
        descriptor: BackendTexture,
        render_target: Option<BackendRenderTarget>,
    ) -> Self {
        Self {
            image,
            state: Mutex::new(ImageState {
                view,
                allocation: Some(allocation),
                stolen: false,
            }),
            device,
            allocator,
            ownership: BackendObjectOwnership::Owned,
            descriptor,
            render_target,
        }
    }

    /// Image owned by someone else; only the view is destroyed on drop
    pub(crate) fn borrowed(
        image: vk::Image,
        view: vk::ImageView,
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
        descriptor: BackendTexture,
    ) -> Self {
        Self {
            image,
            state: Mutex::new(ImageState {
                view,
                allocation: None,
                stolen: false,
            }),
            device,
            allocator,
            ownership: BackendObjectOwnership::Borrowed,
            descriptor,
            render_target: None,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ImageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn image(&self) -> vk::Image {
        self.image
    }

    pub fn view(&self) -> vk::ImageView {
        self.lock_state().view
    }

    pub fn is_stolen(&self) -> bool {
        self.lock_state().stolen
    }
}

impl TextureBackend for VulkanTexture {
    fn backend_api(&self) -> BackendApi {
        BackendApi::Vulkan
    }

    fn ownership(&self) -> BackendObjectOwnership {
        self.ownership
    }

    fn backend_texture(&self) -> BackendTexture {
        self.descriptor
    }

    fn render_target(&self) -> Option<BackendRenderTarget> {
        self.render_target
    }

    fn steal_backend_texture(&self) -> Option<StolenBackendTexture> {
        if self.ownership == BackendObjectOwnership::Borrowed {
            return None;
        }
        let mut state = self.lock_state();
        if state.stolen {
            return None;
        }
        let allocation = state.allocation.take()?;
        state.stolen = true;

        let device = self.device.clone();
        let allocator = self.allocator.clone();
        let image = self.image;
        Some(StolenBackendTexture::new(
            self.descriptor,
            Box::new(move || unsafe {
                device.destroy_image(image, None);
                let result = allocator
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .free(allocation);
                if let Err(e) = result {
                    engine_warn!(SOURCE, "Failed to free memory of stolen image {:#x}: {:?}",
                        image.as_raw(), e);
                }
            }),
        ))
    }
}

impl Drop for VulkanTexture {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        unsafe {
            if state.view != vk::ImageView::null() {
                self.device.destroy_image_view(state.view, None);
            }

            if self.ownership == BackendObjectOwnership::Borrowed || state.stolen {
                return;
            }

            if let Some(allocation) = state.allocation.take() {
                let result = self
                    .allocator
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .free(allocation);
                if let Err(e) = result {
                    engine_warn!(SOURCE, "Failed to free texture memory: {:?}", e);
                }
            }

            self.device.destroy_image(self.image, None);
        }
    }
}
