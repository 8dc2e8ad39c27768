//! Mock flash partition for testing
//!
//! Provides an in-memory partition simulation for unit tests.

use crate::platform::{error::FlashError, traits::FlashPartition, Result};
use core::cell::RefCell;
use std::vec::Vec;

/// Flash sector size (4 KB)
const SECTOR_SIZE: u32 = 4096;

/// Default partition capacity (4 sectors)
const PARTITION_CAPACITY: u32 = 4 * SECTOR_SIZE;

/// Mock flash partition
///
/// Simulates a flash partition in memory for testing. Supports:
/// - Read/write/erase with real flash semantics (erased state 0xFF,
///   writes can only clear bits)
/// - Corruption injection for testing record validation and fallback
/// - Erase count tracking per sector for save-coalescing validation
/// - Write/erase failure injection for testing redundant-save behavior
///
/// # Example
///
/// ```
/// use nvparam::platform::mock::MockFlash;
/// use nvparam::platform::traits::FlashPartition;
///
/// let mut flash = MockFlash::new();
///
/// flash.erase(0, 4096).unwrap();
/// flash.write(0, &[0x33, 0xCC]).unwrap();
///
/// let mut buf = [0u8; 2];
/// flash.read(0, &mut buf).unwrap();
/// assert_eq!(buf, [0x33, 0xCC]);
/// assert_eq!(flash.erase_count(0), 1);
/// ```
#[derive(Debug)]
pub struct MockFlash {
    /// Partition contents (initialized to 0xFF - erased state)
    storage: RefCell<Vec<u8>>,
    /// Erase count per sector
    erase_counts: RefCell<Vec<u32>>,
    /// Fail all write operations when set
    fail_writes: RefCell<bool>,
    /// Fail all erase operations when set
    fail_erases: RefCell<bool>,
}

impl MockFlash {
    /// Create a new mock partition (4 sectors, fully erased)
    pub fn new() -> Self {
        let storage = vec![0xFF; PARTITION_CAPACITY as usize];
        let sector_count = (PARTITION_CAPACITY / SECTOR_SIZE) as usize;

        Self {
            storage: RefCell::new(storage),
            erase_counts: RefCell::new(vec![0; sector_count]),
            fail_writes: RefCell::new(false),
            fail_erases: RefCell::new(false),
        }
    }

    /// Get partition contents (for test verification)
    pub fn contents(&self, offset: u32, len: usize) -> Vec<u8> {
        let storage = self.storage.borrow();
        storage[offset as usize..(offset as usize + len)].to_vec()
    }

    /// Inject corruption at `offset` (for testing error recovery)
    ///
    /// Flips every bit in the range, which defeats any checksum over it.
    pub fn inject_corruption(&mut self, offset: u32, len: usize) {
        let mut storage = self.storage.borrow_mut();
        for byte in storage[offset as usize..(offset as usize + len)].iter_mut() {
            *byte = !*byte;
        }
    }

    /// Get erase count for the sector containing `offset`
    pub fn erase_count(&self, offset: u32) -> u32 {
        let sector = (offset / SECTOR_SIZE) as usize;
        self.erase_counts.borrow()[sector]
    }

    /// Make all subsequent write operations fail
    pub fn set_fail_writes(&mut self, fail: bool) {
        *self.fail_writes.borrow_mut() = fail;
    }

    /// Make all subsequent erase operations fail
    pub fn set_fail_erases(&mut self, fail: bool) {
        *self.fail_erases.borrow_mut() = fail;
    }

    fn in_bounds(&self, offset: u32, len: usize) -> bool {
        (offset as usize)
            .checked_add(len)
            .is_some_and(|end| end <= PARTITION_CAPACITY as usize)
    }
}

impl Default for MockFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashPartition for MockFlash {
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()> {
        if !self.in_bounds(offset, buf.len()) {
            return Err(FlashError::InvalidAddress.into());
        }

        let storage = self.storage.borrow();
        buf.copy_from_slice(&storage[offset as usize..(offset as usize + buf.len())]);

        Ok(())
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        if !self.in_bounds(offset, data.len()) {
            return Err(FlashError::InvalidAddress.into());
        }

        if *self.fail_writes.borrow() {
            return Err(FlashError::WriteFailed.into());
        }

        // Flash can only change bits from 1 to 0
        let mut storage = self.storage.borrow_mut();
        for (i, byte) in data.iter().enumerate() {
            storage[offset as usize + i] &= byte;
        }

        Ok(())
    }

    fn erase(&mut self, offset: u32, len: u32) -> Result<()> {
        if !offset.is_multiple_of(SECTOR_SIZE) || !len.is_multiple_of(SECTOR_SIZE) {
            return Err(FlashError::InvalidAddress.into());
        }

        if !self.in_bounds(offset, len as usize) {
            return Err(FlashError::InvalidAddress.into());
        }

        if *self.fail_erases.borrow() {
            return Err(FlashError::EraseFailed.into());
        }

        let mut storage = self.storage.borrow_mut();
        for byte in storage[offset as usize..(offset + len) as usize].iter_mut() {
            *byte = 0xFF;
        }

        let start_sector = (offset / SECTOR_SIZE) as usize;
        let mut erase_counts = self.erase_counts.borrow_mut();
        for sector in 0..(len / SECTOR_SIZE) as usize {
            erase_counts[start_sector + sector] += 1;
        }

        Ok(())
    }

    fn sector_size(&self) -> u32 {
        SECTOR_SIZE
    }

    fn capacity(&self) -> u32 {
        PARTITION_CAPACITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erased_state_is_ff() {
        let mut flash = MockFlash::new();
        let mut buf = [0u8; 16];
        flash.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0xFF; 16]);
    }

    #[test]
    fn test_write_only_clears_bits() {
        let mut flash = MockFlash::new();
        flash.erase(0, SECTOR_SIZE).unwrap();
        flash.write(0, &[0xF0]).unwrap();
        flash.write(0, &[0x0F]).unwrap();

        let mut buf = [0u8; 1];
        flash.read(0, &mut buf).unwrap();
        assert_eq!(buf[0], 0x00); // 0xF0 & 0x0F
    }

    #[test]
    fn test_erase_requires_alignment() {
        let mut flash = MockFlash::new();
        assert!(flash.erase(100, SECTOR_SIZE).is_err());
        assert!(flash.erase(0, 100).is_err());
        assert!(flash.erase(0, SECTOR_SIZE).is_ok());
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut flash = MockFlash::new();
        let mut buf = [0u8; 8];
        assert!(flash.read(PARTITION_CAPACITY, &mut buf).is_err());
        assert!(flash.write(PARTITION_CAPACITY - 4, &buf).is_err());
    }

    #[test]
    fn test_erase_count_tracking() {
        let mut flash = MockFlash::new();
        assert_eq!(flash.erase_count(0), 0);
        flash.erase(0, SECTOR_SIZE).unwrap();
        flash.erase(0, SECTOR_SIZE).unwrap();
        flash.erase(SECTOR_SIZE, SECTOR_SIZE).unwrap();
        assert_eq!(flash.erase_count(0), 2);
        assert_eq!(flash.erase_count(SECTOR_SIZE), 1);
    }

    #[test]
    fn test_failure_injection() {
        let mut flash = MockFlash::new();
        flash.set_fail_writes(true);
        assert!(flash.write(0, &[0x00]).is_err());
        flash.set_fail_writes(false);
        flash.set_fail_erases(true);
        assert!(flash.erase(0, SECTOR_SIZE).is_err());
    }
}
