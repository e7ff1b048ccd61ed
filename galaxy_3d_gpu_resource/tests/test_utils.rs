#![allow(dead_code)]
//! Shared helpers for the integration tests
//!
//! Every test builds its own mock-backed context so tests stay independent
//! when run in parallel.

use galaxy_3d_gpu_resource::galaxy3d::caps::BackendFormat;
use galaxy_3d_gpu_resource::galaxy3d::mock::{
    MockFactoryControl, MockFormat, MockHandleRegistry, MockTextureFactory,
};
use galaxy_3d_gpu_resource::galaxy3d::texture::{BackendHandle, Mipmapped, TextureDesc, TextureRef};
use galaxy_3d_gpu_resource::galaxy3d::{ContextConfig, Engine, GpuContext};

/// Context plus the observation handles of its mock factory
pub struct MockContext {
    pub context: GpuContext,
    pub registry: MockHandleRegistry,
    pub control: MockFactoryControl,
}

/// Create a mock-backed context with diagnostics enabled
pub fn create_mock_context(label: &str) -> MockContext {
    Engine::initialize().unwrap();
    let factory = MockTextureFactory::new();
    let registry = factory.registry();
    let control = factory.control();
    let config = ContextConfig {
        enable_diagnostics: true,
        label: label.to_string(),
    };
    MockContext {
        context: GpuContext::new(factory, config).unwrap(),
        registry,
        control,
    }
}

pub fn rgba_desc(width: u32, height: u32) -> TextureDesc {
    TextureDesc::new(width, height, BackendFormat::Mock(MockFormat::Rgba8))
}

pub fn mipmapped_desc(width: u32, height: u32) -> TextureDesc {
    TextureDesc {
        mipmapped: Mipmapped::Yes,
        ..rgba_desc(width, height)
    }
}

/// Mock handle behind a texture
pub fn mock_handle(texture: &TextureRef) -> u64 {
    match texture.backend_texture().handle {
        BackendHandle::Mock(handle) => handle,
        other => panic!("not a mock texture: {:?}", other),
    }
}
