/// Galaxy3D GPU resource layer - process-wide state
///
/// Holds the two pieces of state that must be shared by every GPU context in
/// the process: the resource-type registration table (scratch key tags) and
/// the logger.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::error::{Error, Result};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::resource::{ResourceCategory, ResourceType, ResourceTypeTable};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Minimum severity forwarded to the logger
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogSeverity::Info as u8);

/// Internal state structure, built once by `Engine::initialize`
struct EngineState {
    /// Stable tags for every resource category, fixed at startup
    resource_types: ResourceTypeTable,
}

impl EngineState {
    fn new() -> Self {
        Self {
            resource_types: ResourceTypeTable::standard(),
        }
    }
}

// ===== PUBLIC API =====

/// Process-wide entry point
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_gpu_resource::galaxy3d::{Engine, ContextConfig, GpuContext};
/// use galaxy_3d_gpu_resource::galaxy3d::mock::MockTextureFactory;
///
/// Engine::initialize()?;
/// let context = GpuContext::new(MockTextureFactory::new(), ContextConfig::default())?;
/// # Ok::<(), galaxy_3d_gpu_resource::galaxy3d::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Initialize the engine
    ///
    /// Installs the resource-type table. Must run before any `GpuContext` is
    /// created. Calling it again is harmless.
    pub fn initialize() -> Result<()> {
        let state = ENGINE_STATE.get_or_init(EngineState::new);
        crate::engine_debug!(
            "galaxy3d::Engine",
            "Engine initialized ({} resource types registered)",
            state.resource_types.len()
        );
        Ok(())
    }

    /// Whether `initialize()` has run
    pub fn is_initialized() -> bool {
        ENGINE_STATE.get().is_some()
    }

    /// Look up the stable tag registered for a resource category
    ///
    /// # Errors
    ///
    /// `InitializationFailed` if the engine is not initialized or the category
    /// was never registered.
    pub fn resource_type(category: ResourceCategory) -> Result<ResourceType> {
        let state = ENGINE_STATE.get().ok_or_else(|| {
            Error::InitializationFailed(
                "Engine not initialized. Call Engine::initialize() first.".to_string(),
            )
        })?;

        state.resource_types.get(category).ok_or_else(|| {
            Error::InitializationFailed(format!(
                "Resource category {:?} has no registered type",
                category
            ))
        })
    }

    // ===== LOGGING API =====

    /// Replace the default logger with a custom implementation
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to `DefaultLogger`
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Set the minimum severity forwarded to the logger
    pub fn set_log_level(level: LogSeverity) {
        LOG_LEVEL.store(level as u8, Ordering::Relaxed);
    }

    /// Current minimum severity
    pub fn log_level() -> LogSeverity {
        LogSeverity::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(severity, source, message, None, None);
    }

    /// Internal logging method with file:line information (for ERROR logs)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(severity, source, message, Some(file), Some(line));
    }

    fn dispatch(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: Option<&'static str>,
        line: Option<u32>,
    ) {
        if severity < Self::log_level() {
            return;
        }
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file,
                line,
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
