//! Unit tests for mock_texture.rs

use crate::caps::BackendFormat;
use crate::error::Error;
use crate::mock::{MockFormat, MockHandleRegistry, MockTextureBackend, MockTextureFactory};
use crate::texture::{
    BackendHandle, BackendObjectOwnership, BackendTexture, MipmapStatus, Mipmapped, Renderable,
    TextureBackend, TextureDesc, TextureFactory,
};

fn rgba_desc(width: u32, height: u32) -> TextureDesc {
    TextureDesc::new(width, height, BackendFormat::Mock(MockFormat::Rgba8))
}

fn external_texture(handle: u64, mipmapped: Mipmapped) -> BackendTexture {
    BackendTexture {
        width: 32,
        height: 32,
        mipmapped,
        format: BackendFormat::Mock(MockFormat::Rgba8),
        handle: BackendHandle::Mock(handle),
    }
}

// ============================================================================
// MockHandleRegistry
// ============================================================================

#[test]
fn test_registry_allocate_and_free() {
    let registry = MockHandleRegistry::new();
    let a = registry.allocate();
    let b = registry.allocate();
    assert_ne!(a, b);
    assert_ne!(a, 0);
    assert_eq!(registry.live_count(), 2);

    assert!(registry.free(a));
    assert!(!registry.free(a));
    assert!(!registry.is_live(a));
    assert!(registry.is_live(b));
}

#[test]
fn test_registry_clones_share_state() {
    let registry = MockHandleRegistry::new();
    let clone = registry.clone();
    let handle = registry.allocate();
    assert!(clone.is_live(handle));
}

// ============================================================================
// MockTextureBackend
// ============================================================================

#[test]
fn test_backend_rejects_foreign_handle() {
    let texture = BackendTexture {
        handle: BackendHandle::Vulkan { image: 7 },
        ..external_texture(1, Mipmapped::No)
    };
    let result = MockTextureBackend::new(
        texture,
        BackendObjectOwnership::Owned,
        None,
        MockHandleRegistry::new(),
    );
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_owned_backend_frees_on_drop() {
    let registry = MockHandleRegistry::new();
    let handle = registry.allocate();
    let backend = MockTextureBackend::new(
        external_texture(handle, Mipmapped::No),
        BackendObjectOwnership::Owned,
        None,
        registry.clone(),
    )
    .unwrap();
    drop(backend);
    assert!(!registry.is_live(handle));
}

#[test]
fn test_borrowed_backend_never_frees() {
    let registry = MockHandleRegistry::new();
    let handle = registry.allocate();
    let backend = MockTextureBackend::new(
        external_texture(handle, Mipmapped::No),
        BackendObjectOwnership::Borrowed,
        None,
        registry.clone(),
    )
    .unwrap();
    assert!(backend.steal_backend_texture().is_none());
    drop(backend);
    assert!(registry.is_live(handle));
}

#[test]
fn test_steal_transfers_release_responsibility() {
    let registry = MockHandleRegistry::new();
    let handle = registry.allocate();
    let backend = MockTextureBackend::new(
        external_texture(handle, Mipmapped::No),
        BackendObjectOwnership::Owned,
        None,
        registry.clone(),
    )
    .unwrap();

    let stolen = backend.steal_backend_texture().unwrap();
    assert!(backend.is_stolen());
    assert!(backend.steal_backend_texture().is_none());

    drop(backend);
    assert!(registry.is_live(handle));

    assert_eq!(stolen.backend_texture().handle, BackendHandle::Mock(handle));
    stolen.release();
    assert!(!registry.is_live(handle));
}

// ============================================================================
// MockTextureFactory
// ============================================================================

#[test]
fn test_factory_initial_mip_status() {
    let mut factory = MockTextureFactory::new();

    let plain = factory.create_texture(&rgba_desc(16, 16)).unwrap();
    assert_eq!(plain.mipmap_status, MipmapStatus::Unallocated);

    let mut desc = rgba_desc(16, 16);
    desc.mipmapped = Mipmapped::Yes;
    let mipmapped = factory.create_texture(&desc).unwrap();
    assert_eq!(mipmapped.mipmap_status, MipmapStatus::Dirty);

    let wrapped = factory
        .wrap_backend_texture(&external_texture(500, Mipmapped::Yes), BackendObjectOwnership::Borrowed)
        .unwrap();
    assert_eq!(wrapped.mipmap_status, MipmapStatus::Valid);
}

#[test]
fn test_factory_render_target_capability() {
    let mut factory = MockTextureFactory::new();
    let mut desc = rgba_desc(8, 8);
    desc.renderable = Renderable::Yes;
    desc.sample_count = 4;

    let allocated = factory.create_texture(&desc).unwrap();
    assert_eq!(allocated.backend.render_target().unwrap().sample_count, 4);
    assert_eq!(allocated.backend.ownership(), BackendObjectOwnership::Owned);
}

#[test]
fn test_factory_tracks_live_handles() {
    let mut factory = MockTextureFactory::new();
    let registry = factory.registry();
    let control = factory.control();

    let allocated = factory.create_texture(&rgba_desc(4, 4)).unwrap();
    assert_eq!(registry.live_count(), 1);
    assert_eq!(control.allocation_count(), 1);

    drop(allocated);
    assert_eq!(registry.live_count(), 0);
}

#[test]
fn test_factory_wrap_owned_adopts_handle() {
    let mut factory = MockTextureFactory::new();
    let registry = factory.registry();

    let wrapped = factory
        .wrap_backend_texture(&external_texture(900, Mipmapped::No), BackendObjectOwnership::Owned)
        .unwrap();
    assert!(registry.is_live(900));
    drop(wrapped);
    assert!(!registry.is_live(900));
}

#[test]
fn test_factory_injected_failures() {
    let mut factory = MockTextureFactory::new();
    let control = factory.control();

    control.set_fail_allocations(true);
    assert!(matches!(factory.create_texture(&rgba_desc(4, 4)), Err(Error::OutOfMemory)));
    control.set_fail_allocations(false);

    let texture = external_texture(3, Mipmapped::Yes);
    assert!(factory.regenerate_mipmaps(&texture).is_ok());
    assert_eq!(control.regeneration_count(), 1);

    control.set_fail_mipmap_regeneration(true);
    assert!(matches!(factory.regenerate_mipmaps(&texture), Err(Error::BackendError(_))));
    assert_eq!(control.regeneration_count(), 1);
}
