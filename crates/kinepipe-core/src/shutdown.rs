//! Cooperative shutdown via a global atomic flag

use std::sync::atomic::{AtomicBool, Ordering};

/// Global shutdown flag — set by the SIGTERM/SIGINT handler.
pub fn shutdown_flag() -> &'static AtomicBool {
    static FLAG: AtomicBool = AtomicBool::new(false);
    &FLAG
}

/// Check if shutdown was requested. Workers poll this between items.
pub fn is_shutdown_requested() -> bool {
    shutdown_flag().load(Ordering::Relaxed)
}

/// Request shutdown (for signal handlers).
pub fn request_shutdown() {
    shutdown_flag().store(true, Ordering::Relaxed);
}
