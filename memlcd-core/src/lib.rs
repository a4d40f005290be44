//! Board-agnostic core logic for Sharp memory LCD panels
//!
//! This crate contains everything about the panel that does not touch
//! hardware:
//!
//! - Panel geometry, model presets and board configuration types
//! - A minimal `panel.toml` parser
//! - The transmit frame layout (mode byte, line addresses, trailers)
//! - The RGB888 → 1bpp frame encoder
//! - The per-device lifecycle state machine
//! - Error types shared by the driver stack

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod state;

pub use config::{PanelConfig, PanelGeometry, PanelInfo, PanelModel};
pub use encoder::{encode, encode_line, luma, PixelSource, LUMA_THRESHOLD};
pub use error::{ConfigError, LcdError};
pub use frame::{reverse_bits, FrameError, TransmitFrame};
pub use state::{DeviceState, LifecycleEvent};
