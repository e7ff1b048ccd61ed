//! Integration tests for scratch-key storage reuse
//!
//! No GPU required.
//!
//! Run with: cargo test --test scratch_reuse_integration_tests

mod test_utils;

use galaxy_3d_gpu_resource::galaxy3d::caps::BackendFormat;
use galaxy_3d_gpu_resource::galaxy3d::mock::MockFormat;
use galaxy_3d_gpu_resource::galaxy3d::resource::{compute_texture_scratch_key, TextureShape};
use galaxy_3d_gpu_resource::galaxy3d::texture::{Mipmapped, Protected, Renderable, TextureDesc};
use test_utils::{create_mock_context, rgba_desc};

// ============================================================================
// REUSE TESTS
// ============================================================================

#[test]
fn test_integration_frame_transients_are_recycled() {
    let mock = create_mock_context("scratch_transients");

    // Ten frames, each using the same two intermediate targets
    for _ in 0..10 {
        let blur = mock.context.create_texture(&rgba_desc(512, 512)).unwrap();
        let bloom = mock.context.create_texture(&rgba_desc(256, 256)).unwrap();
        assert_ne!(blur.resource_id(), bloom.resource_id());
    }

    assert_eq!(mock.control.allocation_count(), 2);
    assert_eq!(mock.context.resource_count(), 2);
    assert_eq!(mock.context.purgeable_resource_count(), 2);
    assert_eq!(mock.registry.live_count(), 2);
}

#[test]
fn test_integration_scratch_key_matches_public_builder() {
    let mock = create_mock_context("scratch_builder");
    let desc = TextureDesc {
        renderable: Renderable::Yes,
        sample_count: 4,
        protected: Protected::Yes,
        ..rgba_desc(300, 200)
    };
    let texture = mock.context.create_texture(&desc).unwrap();

    let expected = compute_texture_scratch_key(
        mock.context.caps(),
        mock.context.texture_resource_type(),
        desc.format,
        &TextureShape {
            width: 300,
            height: 200,
            renderable: Renderable::Yes,
            sample_count: 4,
            mipmapped: Mipmapped::No,
            protected: Protected::Yes,
        },
    );
    assert_eq!(texture.scratch_key(), expected);
    assert_eq!(expected.unwrap().packed(), 0b110 | (4 << 3));
}

#[test]
fn test_integration_textures_released_from_worker_threads() {
    let mock = create_mock_context("scratch_threads");
    let textures: Vec<_> = (0..8)
        .map(|_| mock.context.create_texture(&rgba_desc(64, 64)).unwrap())
        .collect();

    let workers: Vec<_> = textures
        .into_iter()
        .map(|texture| {
            let extra = texture.clone();
            std::thread::spawn(move || {
                drop(extra);
                drop(texture);
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(mock.context.resource_count(), 8);
    assert_eq!(mock.context.purgeable_resource_count(), 8);

    let reused = mock.context.create_texture(&rgba_desc(64, 64)).unwrap();
    assert_eq!(mock.control.allocation_count(), 8);
    assert_eq!(mock.context.purgeable_resource_count(), 7);
    drop(reused);

    assert_eq!(mock.context.purge_unreferenced_resources(), 8);
    assert_eq!(mock.registry.live_count(), 0);
}

#[test]
fn test_integration_compressed_uploads_bypass_the_scratch_pool() {
    let mock = create_mock_context("scratch_compressed");
    let desc = TextureDesc {
        mipmapped: Mipmapped::Yes,
        ..TextureDesc::new(64, 64, BackendFormat::Mock(MockFormat::Bc1Rgba))
    };

    let texture = mock.context.create_texture(&desc).unwrap();
    assert!(texture.scratch_key().is_none());
    assert!(texture.compute_scratch_key().is_none());
    // 16x16 + 8x8 + 4x4 + 2x2 + 1 + 1 + 1 blocks of 8 bytes
    assert_eq!(texture.gpu_memory_size(), (256 + 64 + 16 + 4 + 1 + 1 + 1) * 8);

    drop(texture);
    assert_eq!(mock.context.resource_count(), 0);
    assert_eq!(mock.context.gpu_memory_usage(), 0);
}
