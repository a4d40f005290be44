//! Configuration types
//!
//! Board-agnostic panel geometry and wiring, plus the `panel.toml` parser.

pub mod hardware;
pub mod panel;
pub mod toml;

pub use hardware::*;
pub use panel::*;
pub use toml::{parse_config, ParseError};
