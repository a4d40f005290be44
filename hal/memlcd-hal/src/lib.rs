//! memlcd Hardware Abstraction Layer
//!
//! This crate defines the two hardware capabilities a memory LCD needs:
//! a write-only serial transport and a digital output for the latch
//! ("DISP") line. Chip-specific HALs implement them, and the panel driver
//! only ever talks to these traits, so tests can substitute mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  memlcd-driver (scheduler, device)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  memlcd-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!            ┌─────────────────┐
//!            │ memlcd-hal-     │
//!            │    rp2040       │
//!            └─────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Digital output (latch line)
//! - [`spi::SpiBus`] - Synchronous SPI transport

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod spi;

// Re-export key traits at crate root for convenience
pub use gpio::{Level, OutputPin};
pub use spi::{Mode, SpiBus, SpiConfig};
