/// Flush epoch counter
///
/// The context counts flushes so that diagnostics can tell whether a texture
/// went dirty during the flush that is sampling it or long before. The
/// number identifies the next flush while idle and the running flush while
/// one is in progress; it increments when a flush ends.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use crate::texture::FlushEpoch;

/// Flush counter of one context
#[derive(Debug, Default)]
pub struct FlushState {
    number: AtomicU64,
    flushing: AtomicBool,
}

impl FlushState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position on the flush timeline
    pub fn epoch(&self) -> FlushEpoch {
        FlushEpoch {
            number: self.number.load(Ordering::Acquire),
            in_flush: self.flushing.load(Ordering::Acquire),
        }
    }

    /// Enter a flush; it ends when the token is dropped
    ///
    /// Flushes do not nest: beginning one while another is running returns
    /// `None`.
    pub fn begin(&self) -> Option<FlushToken<'_>> {
        self.flushing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlushToken { state: self })
    }

    fn end(&self) {
        self.number.fetch_add(1, Ordering::AcqRel);
        self.flushing.store(false, Ordering::Release);
    }
}

/// Running flush; dropping it ends the flush
#[derive(Debug)]
pub struct FlushToken<'a> {
    state: &'a FlushState,
}

impl FlushToken<'_> {
    /// Epoch of the running flush
    pub fn epoch(&self) -> FlushEpoch {
        self.state.epoch()
    }
}

impl Drop for FlushToken<'_> {
    fn drop(&mut self) {
        self.state.end();
    }
}

#[cfg(test)]
#[path = "flush_tests.rs"]
mod tests;
