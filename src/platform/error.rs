//! Platform error types
//!
//! This module defines error types for flash partition operations.

use core::fmt;

/// Result type for platform operations
pub type Result<T> = core::result::Result<T, PlatformError>;

/// Platform-level errors
///
/// All partition implementations map their HAL-specific errors to these
/// variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlatformError {
    /// Flash operation failed
    Flash(FlashError),
    /// Partition initialization failed
    InitializationFailed,
    /// Partition not present or too small
    ResourceUnavailable,
}

/// Flash-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Address or length outside the partition bounds
    InvalidAddress,
    /// Read operation failed
    ReadFailed,
    /// Write operation failed
    WriteFailed,
    /// Erase operation failed
    EraseFailed,
}

impl From<FlashError> for PlatformError {
    fn from(err: FlashError) -> Self {
        PlatformError::Flash(err)
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::Flash(e) => write!(f, "flash error: {:?}", e),
            PlatformError::InitializationFailed => write!(f, "partition initialization failed"),
            PlatformError::ResourceUnavailable => write!(f, "partition not available"),
        }
    }
}

impl fmt::Display for FlashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlashError::InvalidAddress => write!(f, "invalid address"),
            FlashError::ReadFailed => write!(f, "read failed"),
            FlashError::WriteFailed => write!(f, "write failed"),
            FlashError::EraseFailed => write!(f, "erase failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_error_conversion() {
        let err: PlatformError = FlashError::WriteFailed.into();
        assert_eq!(err, PlatformError::Flash(FlashError::WriteFailed));
    }

    #[test]
    fn test_error_display() {
        let err = PlatformError::Flash(FlashError::EraseFailed);
        assert_eq!(format!("{}", err), "flash error: EraseFailed");
    }
}
