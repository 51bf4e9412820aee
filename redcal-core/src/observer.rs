//! Notifications from the engine to whatever presents it.

/// Receives progress and change notifications. All methods default to no-ops.
pub trait SyncObserver: Send + Sync {
    /// Short human-readable status, e.g. "Loading projects (20/80)".
    fn status(&self, _message: &str) {}

    /// Connection or sync availability changed.
    fn connection_changed(&self, _connected: bool) {}

    /// Appointments changed in a way that affects what the calendar shows.
    fn appointment_changed(&self) {}

    /// Errors collected by a batch run, reported together once it finishes.
    fn errors(&self, _messages: &[String]) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {}
