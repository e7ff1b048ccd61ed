//! GPU context
//!
//! The logical timeline that owns a backend's caps, texture factory,
//! resource cache, and flush counter.

mod flush;
mod gpu_context;

pub use flush::{FlushState, FlushToken};
pub use gpu_context::{ContextConfig, GpuContext};
pub(crate) use gpu_context::ContextShared;
