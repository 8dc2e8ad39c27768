#![cfg_attr(not(any(test, feature = "mock")), no_std)]

//! nvparam - crash-safe parameter storage for embedded firmware
//!
//! This library provides a fixed-schema, typed parameter store held in RAM and
//! persisted to two redundant regions of byte-erasable flash. A record header
//! with independent header and payload CRC-16 checksums makes loads power-loss
//! safe: a torn or corrupted primary region falls back to the backup copy.
//!
//! # Example
//!
//! ```no_run
//! use nvparam::params::{ParamDesc, ParamStore};
//! # use nvparam::platform::{traits::FlashPartition, Result};
//! # struct Ram(Vec<u8>);
//! # impl FlashPartition for Ram {
//! #     fn read(&mut self, o: u32, buf: &mut [u8]) -> Result<()> {
//! #         buf.copy_from_slice(&self.0[o as usize..o as usize + buf.len()]);
//! #         Ok(())
//! #     }
//! #     fn write(&mut self, o: u32, data: &[u8]) -> Result<()> {
//! #         self.0[o as usize..o as usize + data.len()].copy_from_slice(data);
//! #         Ok(())
//! #     }
//! #     fn erase(&mut self, o: u32, len: u32) -> Result<()> {
//! #         self.0[o as usize..(o + len) as usize].fill(0xFF);
//! #         Ok(())
//! #     }
//! #     fn sector_size(&self) -> u32 { 4096 }
//! #     fn capacity(&self) -> u32 { self.0.len() as u32 }
//! # }
//!
//! static SCHEMA: &[ParamDesc] = &[
//!     ParamDesc::string("car", 15, "wow"),
//!     ParamDesc::int32("my_age", "25"),
//!     ParamDesc::float32("voltage", "12.34"),
//! ];
//!
//! let flash = Ram(vec![0xFF; 8192]);
//! let mut store = ParamStore::init_and_load(flash, SCHEMA).unwrap();
//!
//! let mut age = [0u8; 4];
//! store.read_by_name("my_age", &mut age).unwrap();
//!
//! store.write_by_name("my_age", &26i32.to_le_bytes()).unwrap();
//! store.save_to_flash().unwrap();
//! ```

// Platform abstraction layer (flash partition access)
pub mod platform;

// Parameter store core (table, marshaling, record codec, gateway)
pub mod params;

// Logging macros (defmt on embedded targets, println in host tests)
pub mod logging;
