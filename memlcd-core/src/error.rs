//! Error types shared by the driver stack

/// Configuration problems detected while probing a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Width is zero or not a multiple of 8
    InvalidWidth,
    /// Height is zero or too tall for an 8-bit line address
    InvalidHeight,
    /// No latch (DISP) pin configured
    MissingLatchPin,
    /// Pin number out of range for the target
    InvalidPin,
    /// The same GPIO is assigned to two functions
    PinConflict,
    /// Refresh interval of zero
    InvalidRefreshInterval,
}

/// Errors surfaced by a memory LCD device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LcdError {
    /// Pixel surface or transmit frame could not be allocated
    AllocationFailure,
    /// Invalid geometry, pin or transport configuration
    Configuration(ConfigError),
    /// The transport rejected a frame; this refresh cycle was dropped
    Transport,
    /// The device is detaching or detached
    Detached,
    /// Surface access outside the pixel buffer
    OutOfBounds,
}

impl From<ConfigError> for LcdError {
    fn from(err: ConfigError) -> Self {
        LcdError::Configuration(err)
    }
}

impl LcdError {
    /// Whether the device remains usable after this error
    ///
    /// Only probe-time failures are fatal; a failed transfer just
    /// drops one refresh.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LcdError::Transport | LcdError::OutOfBounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: LcdError = ConfigError::MissingLatchPin.into();
        assert_eq!(err, LcdError::Configuration(ConfigError::MissingLatchPin));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_transport_is_recoverable() {
        assert!(LcdError::Transport.is_recoverable());
        assert!(!LcdError::AllocationFailure.is_recoverable());
        assert!(!LcdError::Detached.is_recoverable());
    }
}
