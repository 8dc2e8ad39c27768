//! Flash partition interface trait
//!
//! This module defines the flash partition interface that platform
//! implementations must provide. The parameter store uses the partition for
//! its two redundant record regions.
//!
//! # Flash Characteristics
//!
//! - Flash is organized in sectors (typically 4 KB)
//! - Erase operations set all bytes to 0xFF
//! - Write operations can only change bits from 1 to 0 (erase first)
//! - Erase/write are blocking and can take 100ms+
//!
//! # Partition Layout
//!
//! All offsets are relative to the partition start. The store reserves two
//! sectors:
//!
//! ```text
//! [Primary Record]  0x0000 - 0x1000 (4 KB)
//! [Backup Record]   0x1000 - 0x2000 (4 KB)
//! ```

use crate::platform::Result;

/// Flash partition interface
///
/// Platform implementations provide this interface for erase/read/write
/// access to the partition reserved for parameter storage. Locating the
/// partition (the original `find(name)` step) is the constructor's job;
/// a value implementing this trait is the located handle.
///
/// # Safety Invariants
///
/// - Only one owner per partition instance (no concurrent access)
/// - Implementations must reject out-of-bounds offsets
pub trait FlashPartition {
    /// Read data from the partition
    ///
    /// Reads `buf.len()` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if the range
    /// is out of bounds, `FlashError::ReadFailed` if the read fails.
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()>;

    /// Write data to the partition
    ///
    /// The target range must have been erased first; writing can only change
    /// bits from 1 to 0.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if the range
    /// is out of bounds, `FlashError::WriteFailed` if the write fails.
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<()>;

    /// Erase a partition region
    ///
    /// Sets all bytes in `[offset, offset + len)` to 0xFF. `offset` must be
    /// sector-aligned and `len` a multiple of the sector size.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` for
    /// unaligned or out-of-bounds ranges, `FlashError::EraseFailed` if the
    /// erase fails.
    fn erase(&mut self, offset: u32, len: u32) -> Result<()>;

    /// Get the minimum erasable unit size (typically 4096 bytes)
    fn sector_size(&self) -> u32;

    /// Get the total partition size in bytes
    fn capacity(&self) -> u32;
}
