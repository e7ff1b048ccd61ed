//! Unit tests for mipmap.rs

use crate::caps::BackendFormat;
use crate::mock::MockFormat;
use crate::texture::{
    BackendObjectOwnership, DirtyProvenance, FlushEpoch, MipmapDirtyReport, MipmapStatus,
    MipmapTracker, TextureType, CREATED_DIRTY_REASON, REGEN_DID_NOT_FAIL,
};

fn epoch(number: u64, in_flush: bool) -> FlushEpoch {
    FlushEpoch { number, in_flush }
}

fn no_epoch() -> FlushEpoch {
    panic!("epoch must not be queried");
}

// ============================================================================
// TRANSITIONS
// ============================================================================

#[test]
fn test_mark_dirty_from_valid() {
    let mut tracker = MipmapTracker::new(MipmapStatus::Valid, true, no_epoch);
    assert!(tracker.mark_dirty("resize", || epoch(3, false)));
    assert_eq!(tracker.status(), MipmapStatus::Dirty);
    assert_eq!(
        tracker.provenance(),
        Some(DirtyProvenance { reason: "resize", epoch: epoch(3, false) })
    );
}

#[test]
fn test_second_mark_dirty_keeps_first_reason() {
    let mut tracker = MipmapTracker::new(MipmapStatus::Valid, true, no_epoch);
    tracker.mark_dirty("resize", || epoch(1, false));
    assert!(!tracker.mark_dirty("second", || epoch(2, true)));
    assert_eq!(tracker.provenance().unwrap().reason, "resize");
    assert_eq!(tracker.provenance().unwrap().epoch, epoch(1, false));
}

#[test]
fn test_mark_dirty_on_unallocated_is_noop() {
    let mut tracker = MipmapTracker::new(MipmapStatus::Unallocated, true, no_epoch);
    assert!(!tracker.mark_dirty("draw", no_epoch));
    assert_eq!(tracker.status(), MipmapStatus::Unallocated);
    assert!(tracker.provenance().is_none());
}

#[test]
fn test_mark_clean_from_dirty_and_valid() {
    let mut tracker = MipmapTracker::new(MipmapStatus::Valid, true, no_epoch);
    tracker.mark_clean();
    assert_eq!(tracker.status(), MipmapStatus::Valid);

    tracker.mark_dirty("upload", || epoch(0, false));
    tracker.mark_clean();
    assert_eq!(tracker.status(), MipmapStatus::Valid);
    assert!(tracker.provenance().is_none());
}

#[test]
#[should_panic(expected = "without mipmaps")]
fn test_mark_clean_on_unallocated_panics_with_diagnostics() {
    let mut tracker = MipmapTracker::new(MipmapStatus::Unallocated, true, no_epoch);
    tracker.mark_clean();
}

#[test]
fn test_mark_clean_on_unallocated_ignored_without_diagnostics() {
    let mut tracker = MipmapTracker::new(MipmapStatus::Unallocated, false, no_epoch);
    tracker.mark_clean();
    assert_eq!(tracker.status(), MipmapStatus::Unallocated);
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

#[test]
fn test_created_dirty_records_epoch() {
    let tracker = MipmapTracker::new(MipmapStatus::Dirty, true, || epoch(7, true));
    assert_eq!(
        tracker.provenance(),
        Some(DirtyProvenance { reason: CREATED_DIRTY_REASON, epoch: epoch(7, true) })
    );
}

#[test]
fn test_no_provenance_without_diagnostics() {
    let mut tracker = MipmapTracker::new(MipmapStatus::Dirty, false, no_epoch);
    assert!(tracker.provenance().is_none());

    tracker.mark_clean();
    tracker.mark_dirty("resize", no_epoch);
    assert!(tracker.is_dirty());
    assert!(tracker.provenance().is_none());
}

#[test]
fn test_regen_failure_reset_on_clean() {
    let mut tracker = MipmapTracker::new(MipmapStatus::Dirty, true, || epoch(0, false));
    assert_eq!(tracker.regen_failure(), REGEN_DID_NOT_FAIL);

    tracker.record_regen_failure("device lost");
    assert_eq!(tracker.regen_failure(), "device lost");

    tracker.mark_clean();
    assert_eq!(tracker.regen_failure(), REGEN_DID_NOT_FAIL);
}

#[test]
fn test_regen_failure_not_recorded_without_diagnostics() {
    let mut tracker = MipmapTracker::new(MipmapStatus::Dirty, false, no_epoch);
    tracker.record_regen_failure("device lost");
    assert_eq!(tracker.regen_failure(), REGEN_DID_NOT_FAIL);
}

// ============================================================================
// REPORT
// ============================================================================

fn report(provenance: Option<DirtyProvenance>, current: FlushEpoch) -> MipmapDirtyReport {
    MipmapDirtyReport {
        provenance,
        current_epoch: current,
        width: 64,
        height: 32,
        format: BackendFormat::Mock(MockFormat::Rgba8),
        render_target: true,
        sample_count: 1,
        ownership: BackendObjectOwnership::Borrowed,
        texture_type: TextureType::TwoD,
        read_only: false,
        regen_failure: REGEN_DID_NOT_FAIL.to_string(),
        label: "atlas".to_string(),
    }
}

#[test]
fn test_flush_epoch_display() {
    assert_eq!(epoch(4, true).to_string(), "in flush #4");
    assert_eq!(epoch(2, false).to_string(), "before flush #2");
}

#[test]
fn test_report_display_mentions_cause_and_texture() {
    let text = report(
        Some(DirtyProvenance { reason: "resize", epoch: epoch(3, false) }),
        epoch(4, true),
    )
    .to_string();

    assert!(text.contains("\"resize\" before flush #3"));
    assert!(text.contains("now we're in flush #4"));
    assert!(text.contains("64x32"));
    assert!(text.contains("borrowed: true"));
    assert!(text.contains("regen failed: did not fail"));
    assert!(text.contains("\"atlas\""));
}

#[test]
fn test_report_without_provenance() {
    let text = report(None, epoch(1, false)).to_string();
    assert!(text.contains("unrecorded cause"));
}

#[test]
fn test_dirtied_during_current_flush() {
    let same = report(
        Some(DirtyProvenance { reason: "draw", epoch: epoch(5, true) }),
        epoch(5, true),
    );
    assert!(same.dirtied_during_current_flush());

    let earlier = report(
        Some(DirtyProvenance { reason: "draw", epoch: epoch(4, true) }),
        epoch(5, true),
    );
    assert!(!earlier.dirtied_during_current_flush());

    let between = report(
        Some(DirtyProvenance { reason: "draw", epoch: epoch(5, false) }),
        epoch(5, false),
    );
    assert!(!between.dirtied_during_current_flush());
}
