//! Device wake lock
//!
//! Keeps the display awake while audio plays. This is a UX nicety, not a
//! correctness requirement: the engine acquires on entering `Playing`,
//! releases on every other status, and swallows failures with a debug log.
//!
//! The handle is an engine field rather than process-global state, so engines
//! in tests do not interfere with each other.

/// Platform wake-lock abstraction.
pub trait WakeLock: Send {
    /// Request the lock. Failure (permission denied, unsupported) is
    /// acceptable and reported only for logging.
    fn acquire(&mut self) -> Result<(), String>;

    /// Release the lock. Releasing an unheld lock is fine.
    fn release(&mut self) -> Result<(), String>;
}

/// No-op implementation for platforms without wake-lock support.
pub struct NoopWakeLock;

impl WakeLock for NoopWakeLock {
    fn acquire(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn release(&mut self) -> Result<(), String> {
        Ok(())
    }
}
