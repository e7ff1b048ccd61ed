//! Integration tests for mipmap validity across a frame loop
//!
//! No GPU required.
//!
//! Run with: cargo test --test mipmap_integration_tests

mod test_utils;

use galaxy_3d_gpu_resource::galaxy3d::texture::{MipmapFilter, MipmapStatus};
use test_utils::{create_mock_context, mipmapped_desc};

// ============================================================================
// FRAME LOOP
// ============================================================================

#[test]
fn test_integration_render_then_regenerate_then_sample() {
    let mock = create_mock_context("mip_frame_loop");
    let target = mock.context.create_texture(&mipmapped_desc(256, 256)).unwrap();
    assert_eq!(target.max_mipmap_level(), 8);

    for frame in 0..3 {
        let flush = mock.context.begin_flush().unwrap();

        // Render into level 0, then bring the chain back in sync before sampling
        target.mark_mipmaps_dirty("render pass");
        assert_eq!(target.mipmap_status(), MipmapStatus::Dirty);
        mock.context.regenerate_mipmaps(&target).unwrap();
        mock.context.prepare_for_sampling(&target, MipmapFilter::Linear);

        assert_eq!(flush.epoch().number, frame);
        drop(flush);
    }

    assert_eq!(mock.control.regeneration_count(), 3);
    assert_eq!(mock.context.flush_epoch().number, 3);
}

#[test]
fn test_integration_report_identifies_dirtying_flush() {
    let mock = create_mock_context("mip_report");
    let texture = mock.context.create_texture(&mipmapped_desc(64, 64)).unwrap();
    mock.context.regenerate_mipmaps(&texture).unwrap();

    mock.context.flush();
    let flush = mock.context.begin_flush().unwrap();
    texture.mark_mipmaps_dirty("copy");
    texture.mark_mipmaps_dirty("ignored");

    let report = texture.check_mipmaps_not_dirty().unwrap_err();
    assert!(report.dirtied_during_current_flush());
    assert_eq!(report.provenance.unwrap().reason, "copy");

    let text = report.to_string();
    assert!(text.contains("\"copy\" in flush #1"));
    assert!(text.contains("now we're in flush #1"));
    drop(flush);

    let report = texture.check_mipmaps_not_dirty().unwrap_err();
    assert!(!report.dirtied_during_current_flush());
    assert!(report.to_string().contains("now we're before flush #2"));
}

#[test]
fn test_integration_failed_regeneration_is_reported() {
    let mock = create_mock_context("mip_regen_failure");
    let texture = mock.context.create_texture(&mipmapped_desc(64, 64)).unwrap();
    mock.control.set_fail_mipmap_regeneration(true);

    assert!(mock.context.regenerate_mipmaps(&texture).is_err());

    let report = texture.check_mipmaps_not_dirty().unwrap_err();
    assert!(report.regen_failure.contains("Mipmap regeneration"));
    assert!(report.to_string().contains("regen failed: Backend error"));
}

#[test]
fn test_integration_sampling_dirty_mips_aborts() {
    let mock = create_mock_context("mip_abort");
    let texture = mock.context.create_texture(&mipmapped_desc(64, 64)).unwrap();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        mock.context.prepare_for_sampling(&texture, MipmapFilter::Linear);
    }));
    assert!(result.is_err());

    // The context stays usable after the aborted draw
    mock.context.regenerate_mipmaps(&texture).unwrap();
    mock.context.prepare_for_sampling(&texture, MipmapFilter::Linear);
}
