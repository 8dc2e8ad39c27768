//! Platform abstraction layer
//!
//! This module provides hardware abstraction for the flash partition that
//! backs the parameter store. Platform-specific code (flash drivers) lives
//! behind the [`FlashPartition`] trait; the rest of the crate is
//! target-independent.

pub mod error;
pub mod traits;

// In-memory partition for host-side testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{FlashError, PlatformError, Result};
pub use traits::FlashPartition;
