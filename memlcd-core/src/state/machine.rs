//! Lifecycle state definition
//!
//! `Uninitialized → Attached → (Flushing ⇄ Idle) → Detaching → Detached`

use super::events::LifecycleEvent;

/// Per-device lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Not probed yet
    #[default]
    Uninitialized,
    /// Probed, no flush has run yet
    Attached,
    /// A flush holds the device lock
    Flushing,
    /// Attached and between flushes
    Idle,
    /// Detach requested; waiting for an in-flight flush to drain
    Detaching,
    /// Released; terminal
    Detached,
}

impl DeviceState {
    /// Check if a new flush may start from this state
    pub fn accepts_flush(&self) -> bool {
        matches!(self, DeviceState::Attached | DeviceState::Idle)
    }

    /// Check if flush requests should still be queued
    pub fn accepts_requests(&self) -> bool {
        matches!(
            self,
            DeviceState::Attached | DeviceState::Idle | DeviceState::Flushing
        )
    }

    /// Check if detach has begun or finished
    pub fn is_shutting_down(&self) -> bool {
        matches!(self, DeviceState::Detaching | DeviceState::Detached)
    }

    /// Process an event and return the next state
    ///
    /// Events that make no sense in the current state leave it unchanged;
    /// callers detect rejection by comparing the result.
    pub fn transition(self, event: LifecycleEvent) -> Self {
        use DeviceState::*;
        use LifecycleEvent::*;

        match (self, event) {
            (Uninitialized, Attach) => Attached,

            (Attached, FlushStarted) | (Idle, FlushStarted) => Flushing,
            (Flushing, FlushFinished) => Idle,

            (Attached, DetachRequested)
            | (Idle, DetachRequested)
            | (Flushing, DetachRequested) => Detaching,

            // A flush finishing during detach keeps the device detaching
            (Detaching, FlushFinished) => Detaching,
            (Detaching, DetachComplete) => Detached,

            // Default: stay in current state
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_flush_cycle() {
        let state = DeviceState::Uninitialized.transition(LifecycleEvent::Attach);
        assert_eq!(state, DeviceState::Attached);

        let flushing = state.transition(LifecycleEvent::FlushStarted);
        assert_eq!(flushing, DeviceState::Flushing);

        let idle = flushing.transition(LifecycleEvent::FlushFinished);
        assert_eq!(idle, DeviceState::Idle);

        assert_eq!(
            idle.transition(LifecycleEvent::FlushStarted),
            DeviceState::Flushing
        );
    }

    #[test]
    fn test_no_nested_flush() {
        let state = DeviceState::Flushing;
        assert!(!state.accepts_flush());
        assert_eq!(state.transition(LifecycleEvent::FlushStarted), state);
    }

    #[test]
    fn test_detach_while_flushing() {
        let detaching = DeviceState::Flushing.transition(LifecycleEvent::DetachRequested);
        assert_eq!(detaching, DeviceState::Detaching);

        // The in-flight flush ends without reopening the device
        let still = detaching.transition(LifecycleEvent::FlushFinished);
        assert_eq!(still, DeviceState::Detaching);

        let done = still.transition(LifecycleEvent::DetachComplete);
        assert_eq!(done, DeviceState::Detached);
    }

    #[test]
    fn test_detached_is_terminal() {
        let events = [
            LifecycleEvent::Attach,
            LifecycleEvent::FlushStarted,
            LifecycleEvent::FlushFinished,
            LifecycleEvent::DetachRequested,
            LifecycleEvent::DetachComplete,
        ];

        for event in events {
            assert_eq!(
                DeviceState::Detached.transition(event),
                DeviceState::Detached
            );
        }
    }

    #[test]
    fn test_detaching_rejects_flush() {
        let state = DeviceState::Detaching;
        assert!(!state.accepts_flush());
        assert!(!state.accepts_requests());
        assert!(state.is_shutting_down());
        assert_eq!(state.transition(LifecycleEvent::FlushStarted), state);
    }

    #[test]
    fn test_uninitialized_cannot_flush() {
        let state = DeviceState::default();
        assert_eq!(state, DeviceState::Uninitialized);
        assert!(!state.accepts_flush());
        assert_eq!(state.transition(LifecycleEvent::FlushStarted), state);
    }

    #[test]
    fn test_request_acceptance() {
        assert!(DeviceState::Attached.accepts_requests());
        assert!(DeviceState::Idle.accepts_requests());
        assert!(DeviceState::Flushing.accepts_requests());
        assert!(!DeviceState::Detached.accepts_requests());
    }
}
