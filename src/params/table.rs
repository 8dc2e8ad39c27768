//! Static parameter schema
//!
//! The schema is an ordered table of field descriptors, fixed at compile time.
//! Descriptor order defines both the index space and the byte layout of the
//! in-memory image: `offset[i]` is the sum of the sizes of all earlier fields.
//! [`ParamTable`] derives the offsets once at initialization and validates the
//! schema (unique names, legal per-kind sizes, capacity bound).

use heapless::Vec;

use super::{record::RecordHeader, ParamError};

/// Maximum number of schema entries
pub const MAX_PARAMS: usize = 64;

/// Maximum image size: one flash sector minus the record header
pub const IMAGE_CAPACITY: usize = super::store::PARAM_SECTOR_SIZE as usize - RecordHeader::SIZE;

/// Parameter type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamKind {
    /// NUL-terminated string (stored size = capacity + 1)
    Str,
    /// Fixed-length raw byte array
    Array,
    /// Signed integer, stored as 4 or 8 bytes little-endian
    Int,
    /// Unsigned integer, hexadecimal text representation, 4 or 8 bytes
    Hex,
    /// IEEE 754 float, 4 or 8 bytes
    Float,
}

/// Parameter descriptor
///
/// One named, typed, fixed-size entry in the schema. The default value is
/// kept as a source literal and parsed by the marshaler at resume time, the
/// same way for every kind the textual `write` path parses values.
#[derive(Debug, Clone, Copy)]
pub struct ParamDesc {
    /// Unique parameter name
    pub name: &'static str,
    /// Default value as a source literal
    pub default: &'static str,
    /// Type tag
    pub kind: ParamKind,
    /// Stored size in bytes
    pub size: usize,
}

impl ParamDesc {
    /// String parameter holding up to `capacity` bytes (plus NUL)
    pub const fn string(name: &'static str, capacity: usize, default: &'static str) -> Self {
        Self {
            name,
            default,
            kind: ParamKind::Str,
            size: capacity + 1,
        }
    }

    /// Raw byte array of `len` bytes; default is hex pairs ("AB CD EF")
    pub const fn array(name: &'static str, len: usize, default: &'static str) -> Self {
        Self {
            name,
            default,
            kind: ParamKind::Array,
            size: len,
        }
    }

    /// 32-bit signed integer; default is a decimal or C-prefixed literal
    pub const fn int32(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            default,
            kind: ParamKind::Int,
            size: 4,
        }
    }

    /// 64-bit signed integer
    pub const fn int64(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            default,
            kind: ParamKind::Int,
            size: 8,
        }
    }

    /// 32-bit unsigned integer; default is a bare hex literal ("A001")
    pub const fn hex32(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            default,
            kind: ParamKind::Hex,
            size: 4,
        }
    }

    /// 64-bit unsigned integer, hex representation
    pub const fn hex64(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            default,
            kind: ParamKind::Hex,
            size: 8,
        }
    }

    /// Single-precision float; default is a decimal literal
    pub const fn float32(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            default,
            kind: ParamKind::Float,
            size: 4,
        }
    }

    /// Double-precision float
    pub const fn float64(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            default,
            kind: ParamKind::Float,
            size: 8,
        }
    }

    /// Check the stored size is legal for the kind
    fn size_is_valid(&self) -> bool {
        match self.kind {
            ParamKind::Str | ParamKind::Array => self.size >= 1,
            ParamKind::Int | ParamKind::Hex | ParamKind::Float => {
                self.size == 4 || self.size == 8
            }
        }
    }
}

/// Validated schema with derived offsets
///
/// Built once at store initialization from a static descriptor slice.
pub struct ParamTable {
    descs: &'static [ParamDesc],
    offsets: Vec<u16, MAX_PARAMS>,
    image_size: usize,
}

impl ParamTable {
    /// Build and validate the offset table
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: empty schema, duplicate name, or illegal size
    /// - `OutOfMemory`: more than [`MAX_PARAMS`] entries or total size over
    ///   [`IMAGE_CAPACITY`]
    pub fn new(descs: &'static [ParamDesc]) -> Result<Self, ParamError> {
        if descs.is_empty() {
            return Err(ParamError::InvalidArgument);
        }
        if descs.len() > MAX_PARAMS {
            return Err(ParamError::OutOfMemory);
        }

        for (i, desc) in descs.iter().enumerate() {
            if !desc.size_is_valid() {
                return Err(ParamError::InvalidArgument);
            }
            if descs[..i].iter().any(|d| d.name == desc.name) {
                return Err(ParamError::InvalidArgument);
            }
        }

        let mut offsets = Vec::new();
        let mut size = 0usize;
        for desc in descs {
            // Capacity checked above; the offset fits u16 while size stays
            // under IMAGE_CAPACITY
            offsets.push(size as u16).map_err(|_| ParamError::OutOfMemory)?;
            size += desc.size;
            if size > IMAGE_CAPACITY {
                return Err(ParamError::OutOfMemory);
            }
        }

        Ok(Self {
            descs,
            offsets,
            image_size: size,
        })
    }

    /// Number of schema entries
    pub fn len(&self) -> usize {
        self.descs.len()
    }

    /// True if the schema is empty (never, for a validated table)
    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }

    /// Total image size in bytes
    pub fn image_size(&self) -> usize {
        self.image_size
    }

    /// Descriptor by index
    pub fn get(&self, idx: usize) -> Option<&ParamDesc> {
        self.descs.get(idx)
    }

    /// All descriptors, in index order
    pub fn descs(&self) -> &'static [ParamDesc] {
        self.descs
    }

    /// Index of the field with the given name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.descs.iter().position(|d| d.name == name)
    }

    /// Byte range of field `idx` within the image
    ///
    /// `idx` must be a valid index (callers look the descriptor up first).
    pub fn field_range(&self, idx: usize) -> core::ops::Range<usize> {
        let start = self.offsets[idx] as usize;
        start..start + self.descs[idx].size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TABLE: &[ParamDesc] = &[
        ParamDesc::string("car", 15, "wow"),
        ParamDesc::array("mac_addr", 6, "AB CD EF 01 02 03"),
        ParamDesc::int32("my_age", "25"),
        ParamDesc::int64("my_money", "56789123456789"),
        ParamDesc::hex32("reg_addr", "A001"),
        ParamDesc::hex64("reg_value", "12345678ABCDEF"),
        ParamDesc::float32("voltage", "12.34"),
        ParamDesc::float64("energy", "87654321.123"),
    ];

    #[test]
    fn test_offsets_are_contiguous() {
        let table = ParamTable::new(TABLE).unwrap();

        let mut expected = 0usize;
        for i in 0..table.len() {
            let range = table.field_range(i);
            assert_eq!(range.start, expected, "gap or overlap before index {}", i);
            assert_eq!(range.len(), table.get(i).unwrap().size);
            expected = range.end;
        }
        assert_eq!(expected, table.image_size());
    }

    #[test]
    fn test_image_size_is_sum_of_sizes() {
        let table = ParamTable::new(TABLE).unwrap();
        let sum: usize = TABLE.iter().map(|d| d.size).sum();
        assert_eq!(table.image_size(), sum);
        assert_eq!(table.image_size(), 16 + 6 + 4 + 8 + 4 + 8 + 4 + 8);
    }

    #[test]
    fn test_index_lookup() {
        let table = ParamTable::new(TABLE).unwrap();
        assert_eq!(table.index_of("car"), Some(0));
        assert_eq!(table.index_of("energy"), Some(7));
        assert_eq!(table.index_of("missing"), None);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        static DUP: &[ParamDesc] = &[
            ParamDesc::int32("twice", "1"),
            ParamDesc::int32("twice", "2"),
        ];
        assert_eq!(ParamTable::new(DUP).err(), Some(ParamError::InvalidArgument));
    }

    #[test]
    fn test_empty_schema_rejected() {
        static EMPTY: &[ParamDesc] = &[];
        assert_eq!(ParamTable::new(EMPTY).err(), Some(ParamError::InvalidArgument));
    }

    #[test]
    fn test_oversized_schema_rejected() {
        static BIG: &[ParamDesc] = &[
            ParamDesc::array("a", 3000, ""),
            ParamDesc::array("b", 3000, ""),
        ];
        assert_eq!(ParamTable::new(BIG).err(), Some(ParamError::OutOfMemory));
    }

    #[test]
    fn test_illegal_scalar_size_rejected() {
        static BAD: &[ParamDesc] = &[ParamDesc {
            name: "odd",
            default: "0",
            kind: ParamKind::Int,
            size: 3,
        }];
        assert_eq!(ParamTable::new(BAD).err(), Some(ParamError::InvalidArgument));
    }
}
