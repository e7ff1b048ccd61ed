//! Mock backend (no GPU required)
//!
//! A complete in-process backend used by the test suites and by code that
//! wants to exercise the resource layer without a device. Handles are plain
//! integers tracked in a `MockHandleRegistry`, so tests can observe exactly
//! which backend objects are alive.

mod mock_caps;
mod mock_texture;

pub use mock_caps::{MockCaps, MockFormat};
pub use mock_texture::{
    MockHandleRegistry, MockTextureBackend, MockTextureFactory, MockFactoryControl,
};
