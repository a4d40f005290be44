//! Events that trigger lifecycle transitions

/// Events that can trigger lifecycle transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleEvent {
    /// Probe allocated every resource
    Attach,
    /// A flush acquired the device lock
    FlushStarted,
    /// The flush holding the lock finished (successfully or not)
    FlushFinished,
    /// Detach was requested; no new flushes may start
    DetachRequested,
    /// The in-flight flush drained and the device is released
    DetachComplete,
}
