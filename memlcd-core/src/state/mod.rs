//! Device lifecycle state machine
//!
//! Tracks where a panel is between probe and remove. The driver feeds
//! events in; the machine decides whether a flush may start and when the
//! device is gone for good.

pub mod events;
pub mod machine;

pub use events::LifecycleEvent;
pub use machine::DeviceState;
