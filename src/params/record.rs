//! On-flash record codec
//!
//! One persisted record is a fixed 8-byte header followed by a snapshot of
//! the parameter image:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Magic: u16 = 0xCC33                         │  Offset: 0
//! ├─────────────────────────────────────────────┤
//! │ Payload size: u16                           │  Offset: 2
//! ├─────────────────────────────────────────────┤
//! │ Payload CRC-16                              │  Offset: 4
//! ├─────────────────────────────────────────────┤
//! │ Header CRC-16 (over the 6 bytes above)      │  Offset: 6
//! ├─────────────────────────────────────────────┤
//! │ Payload: `size` image bytes                 │  Offset: 8
//! └─────────────────────────────────────────────┘
//! ```
//!
//! All fields little-endian. The header CRC validates the header on its own,
//! so a corrupt payload size is caught before any payload bytes are read; the
//! payload CRC then validates the image independently of the header region.

use crc::{Crc, CRC_16_MODBUS};

/// Record magic word; distinct from erased-flash patterns (0xFFFF / 0x0000)
pub const PARAM_MAGIC: u16 = 0xCC33;

/// CRC-16 algorithm used for both header and payload checks
///
/// CRC-16/MODBUS (poly 0x8005 reflected, init 0xFFFF). Must match on every
/// platform for records to be portable across builds.
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Calculate the record CRC-16 of `data`
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Record validation failure
///
/// Ordered by check: magic, header CRC, declared size, payload CRC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Magic word mismatch (erased or foreign data)
    BadMagic,
    /// Header CRC mismatch
    BadHeaderCrc,
    /// Declared payload size exceeds the schema image size
    SizeTooLarge,
    /// Payload CRC mismatch
    BadPayloadCrc,
}

/// Persisted record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Magic word (0xCC33)
    pub magic: u16,
    /// Payload size in bytes
    pub size: u16,
    /// CRC-16 over the payload
    pub payload_crc: u16,
    /// CRC-16 over the preceding three fields
    pub header_crc: u16,
}

impl RecordHeader {
    /// Size of the serialized header in bytes
    pub const SIZE: usize = 8;

    /// Stamp a header for an image snapshot
    pub fn for_payload(payload: &[u8]) -> Self {
        let magic = PARAM_MAGIC;
        let size = payload.len() as u16;
        let payload_crc = crc16(payload);

        let mut head = [0u8; 6];
        head[0..2].copy_from_slice(&magic.to_le_bytes());
        head[2..4].copy_from_slice(&size.to_le_bytes());
        head[4..6].copy_from_slice(&payload_crc.to_le_bytes());

        Self {
            magic,
            size,
            payload_crc,
            header_crc: crc16(&head),
        }
    }

    /// Serialize the header (little-endian)
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..2].copy_from_slice(&self.magic.to_le_bytes());
        buf[2..4].copy_from_slice(&self.size.to_le_bytes());
        buf[4..6].copy_from_slice(&self.payload_crc.to_le_bytes());
        buf[6..8].copy_from_slice(&self.header_crc.to_le_bytes());
        buf
    }

    /// Parse and validate a header read from flash
    ///
    /// Checks short-circuit in order: magic, header CRC, declared size against
    /// `max_payload` (the schema image size). A header that fails here must
    /// not be used to read payload bytes.
    pub fn parse(buf: &[u8; Self::SIZE], max_payload: usize) -> Result<Self, CodecError> {
        let header = Self {
            magic: u16::from_le_bytes([buf[0], buf[1]]),
            size: u16::from_le_bytes([buf[2], buf[3]]),
            payload_crc: u16::from_le_bytes([buf[4], buf[5]]),
            header_crc: u16::from_le_bytes([buf[6], buf[7]]),
        };

        if header.magic != PARAM_MAGIC {
            return Err(CodecError::BadMagic);
        }
        if crc16(&buf[..6]) != header.header_crc {
            return Err(CodecError::BadHeaderCrc);
        }
        if header.size as usize > max_payload {
            return Err(CodecError::SizeTooLarge);
        }

        Ok(header)
    }

    /// Validate payload bytes against the header's payload CRC
    ///
    /// `payload` must hold exactly the declared size.
    pub fn check_payload(&self, payload: &[u8]) -> Result<(), CodecError> {
        if crc16(payload) != self.payload_crc {
            return Err(CodecError::BadPayloadCrc);
        }
        Ok(())
    }
}
