//! Parameter store gateway
//!
//! [`ParamStore`] owns the in-memory image and the flash partition handle and
//! is the only mutation path: every read and write is a copy in or out
//! through the marshaler, never a reference into the image.
//!
//! Persistence is redundant: each save erases and rewrites two fixed regions
//! (primary at offset 0, backup one sector up), each holding a complete
//! record. A load prefers the primary region and falls back to the backup,
//! so corruption of a single region (power loss during a save included)
//! never loses the configuration. There is no merge or repair across
//! regions; a load that succeeds from the backup does not rewrite the
//! primary.
//!
//! # Concurrency
//!
//! The store is `&mut self` throughout. Concurrent callers share it behind a
//! single mutex (e.g. `embassy_sync::mutex::Mutex`) held for the full
//! duration of each operation, flash I/O included; the auto-save task in
//! [`super::saver`] follows the same discipline.

use heapless::Vec;

use super::marshal;
use super::record::{CodecError, RecordHeader};
use super::table::{ParamDesc, ParamTable, IMAGE_CAPACITY};
use super::ParamError;
use crate::platform::error::{FlashError, PlatformError};
use crate::platform::traits::FlashPartition;
use crate::{log_debug, log_error, log_info, log_warn};

#[cfg(feature = "autosave")]
use super::saver::{SaveChannel, SaveRequest};

/// Record region size; one erasable flash sector
pub const PARAM_SECTOR_SIZE: u32 = 4096;

/// Partition offset of the primary record region
pub const PRIMARY_OFFSET: u32 = 0;

/// Partition offset of the backup record region
pub const BACKUP_OFFSET: u32 = PRIMARY_OFFSET + PARAM_SECTOR_SIZE;

/// Why a region failed to yield a valid record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum RegionError {
    Codec(CodecError),
    Flash(FlashError),
}

impl From<CodecError> for RegionError {
    fn from(err: CodecError) -> Self {
        RegionError::Codec(err)
    }
}

impl From<PlatformError> for RegionError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Flash(e) => RegionError::Flash(e),
            _ => RegionError::Flash(FlashError::ReadFailed),
        }
    }
}

/// Parameter store with redundant flash persistence
pub struct ParamStore<F: FlashPartition> {
    flash: F,
    table: ParamTable,
    image: Vec<u8, IMAGE_CAPACITY>,
    /// Image differs from the last successful save
    dirty: bool,
    #[cfg(feature = "autosave")]
    saver: Option<&'static SaveChannel>,
}

impl<F: FlashPartition> ParamStore<F> {
    /// Initialize the store
    ///
    /// Validates the schema, checks the partition holds both record regions,
    /// allocates the image, and resumes every field to its default. Nothing
    /// is read from flash; call [`load_from_flash`](Self::load_from_flash)
    /// (or use [`init_and_load`](Self::init_and_load)) to restore persisted
    /// values.
    ///
    /// # Errors
    ///
    /// - `StorageUnavailable`: partition smaller than two regions
    /// - `InvalidArgument` / `OutOfMemory`: schema rejected by [`ParamTable`]
    pub fn init(flash: F, descs: &'static [ParamDesc]) -> Result<Self, ParamError> {
        if flash.capacity() < BACKUP_OFFSET + PARAM_SECTOR_SIZE {
            log_error!("param partition too small for two record regions");
            return Err(ParamError::StorageUnavailable);
        }

        let table = ParamTable::new(descs)?;

        let mut image = Vec::new();
        image
            .resize(table.image_size(), 0)
            .map_err(|_| ParamError::OutOfMemory)?;

        let mut store = Self {
            flash,
            table,
            image,
            dirty: false,
            #[cfg(feature = "autosave")]
            saver: None,
        };

        for idx in 0..store.table.len() {
            store.resume_field(idx);
        }

        Ok(store)
    }

    /// Initialize and load persisted values from flash
    ///
    /// A fresh or fully corrupted partition is not an error: the store comes
    /// up on schema defaults and logs a warning, matching first-boot
    /// behavior on an erased device.
    pub fn init_and_load(flash: F, descs: &'static [ParamDesc]) -> Result<Self, ParamError> {
        let mut store = Self::init(flash, descs)?;
        match store.load_from_flash() {
            Ok(()) => log_info!("params loaded from flash"),
            Err(_) => log_warn!("no valid param record found, using defaults"),
        }
        Ok(store)
    }

    /// Deinitialize the store, returning the partition handle
    pub fn release(self) -> F {
        self.flash
    }

    /// Number of parameters in the schema
    pub fn count(&self) -> usize {
        self.table.len()
    }

    /// Schema descriptors, in index order
    pub fn descs(&self) -> &'static [ParamDesc] {
        self.table.descs()
    }

    /// Descriptor by index
    pub fn desc(&self, idx: usize) -> Option<&ParamDesc> {
        self.table.get(idx)
    }

    /// Index of a parameter by name
    ///
    /// # Errors
    ///
    /// `UnknownField` if no parameter has that name.
    pub fn find(&self, name: &str) -> Result<usize, ParamError> {
        self.table.index_of(name).ok_or(ParamError::UnknownField)
    }

    /// True if the image has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Attach the auto-save channel
    ///
    /// Once attached, every successful mutation schedules a debounced save
    /// through [`super::saver::ParamSaver`].
    #[cfg(feature = "autosave")]
    pub fn attach_saver(&mut self, channel: &'static SaveChannel) {
        self.saver = Some(channel);
    }

    /// Read a parameter into `out` at the caller's width
    ///
    /// # Errors
    ///
    /// - `UnknownField`: index out of range
    /// - `InvalidArgument`: empty buffer or unsupported width for the kind
    pub fn read_by_index(&self, idx: usize, out: &mut [u8]) -> Result<(), ParamError> {
        let desc = self.table.get(idx).ok_or(ParamError::UnknownField)?;
        if out.is_empty() {
            return Err(ParamError::InvalidArgument);
        }

        let range = self.table.field_range(idx);
        marshal::read(desc.kind, &self.image[range], out)
            .map_err(|_| ParamError::InvalidArgument)
    }

    /// Read a parameter by name
    pub fn read_by_name(&self, name: &str, out: &mut [u8]) -> Result<(), ParamError> {
        let idx = self.find(name)?;
        self.read_by_index(idx, out)
    }

    /// Write a parameter from `input` at the caller's width
    ///
    /// Arms the auto-save debounce on success.
    ///
    /// # Errors
    ///
    /// As [`read_by_index`](Self::read_by_index); width violations are
    /// rejected before any byte of the field changes.
    pub fn write_by_index(&mut self, idx: usize, input: &[u8]) -> Result<(), ParamError> {
        let desc = self.table.get(idx).ok_or(ParamError::UnknownField)?;
        if input.is_empty() {
            return Err(ParamError::InvalidArgument);
        }

        let range = self.table.field_range(idx);
        marshal::write(desc.kind, &mut self.image[range], input)
            .map_err(|_| ParamError::InvalidArgument)?;

        self.mark_dirty();
        Ok(())
    }

    /// Write a parameter by name
    pub fn write_by_name(&mut self, name: &str, input: &[u8]) -> Result<(), ParamError> {
        let idx = self.find(name)?;
        self.write_by_index(idx, input)
    }

    /// Reset one parameter to its schema default
    pub fn resume_by_index(&mut self, idx: usize) -> Result<(), ParamError> {
        if idx >= self.table.len() {
            return Err(ParamError::UnknownField);
        }
        self.resume_field(idx);
        self.mark_dirty();
        Ok(())
    }

    /// Reset one parameter to its schema default, by name
    pub fn resume_by_name(&mut self, name: &str) -> Result<(), ParamError> {
        let idx = self.find(name)?;
        self.resume_by_index(idx)
    }

    /// Reset every parameter to its schema default
    pub fn resume_all(&mut self) {
        for idx in 0..self.table.len() {
            self.resume_field(idx);
        }
        self.mark_dirty();
    }

    /// Replace the image from the first valid flash region
    ///
    /// Prefers the primary region, falls back to the backup. A record is
    /// staged and fully validated before it touches the image, so a total
    /// load failure leaves the current values (defaults or an earlier load)
    /// intact. A valid record shorter than the image (schema grew since the
    /// save) replaces only its declared prefix.
    ///
    /// # Errors
    ///
    /// `StorageUnavailable` if neither region holds a valid record.
    pub fn load_from_flash(&mut self) -> Result<(), ParamError> {
        let mut scratch: Vec<u8, IMAGE_CAPACITY> = Vec::new();

        for (offset, which) in [(PRIMARY_OFFSET, "primary"), (BACKUP_OFFSET, "backup")] {
            scratch.clear();
            match self.read_region(offset, &mut scratch) {
                Ok(()) => {
                    self.image[..scratch.len()].copy_from_slice(&scratch);
                    self.dirty = false;
                    log_debug!("param load success from {} region", which);
                    return Ok(());
                }
                Err(e) => {
                    log_warn!("param {} region invalid: {:?}", which, e);
                }
            }
        }

        log_error!("param load failed, both regions invalid");
        Err(ParamError::StorageUnavailable)
    }

    /// Persist the image to both flash regions
    ///
    /// Stamps a fresh record and erases+writes each region independently; a
    /// failure in one region is logged and does not stop the other. Succeeds
    /// when at least one region was written completely, clearing the dirty
    /// flag and disarming any pending auto-save.
    ///
    /// # Errors
    ///
    /// `Flash(..)` if both regions failed.
    pub fn save_to_flash(&mut self) -> Result<(), ParamError> {
        let header = RecordHeader::for_payload(&self.image);

        let primary = self.write_region(PRIMARY_OFFSET, &header);
        if let Err(e) = primary {
            log_error!("param write failed to primary region: {:?}", e);
        }
        let backup = self.write_region(BACKUP_OFFSET, &header);
        if let Err(e) = backup {
            log_error!("param write failed to backup region: {:?}", e);
        }

        match (primary, backup) {
            // Both regions failed; the image keeps its dirty flag
            (Err(e), Err(_)) => Err(e),
            _ => {
                self.dirty = false;
                Ok(())
            }
        }
    }

    /// Parse a default literal into its field slice
    fn resume_field(&mut self, idx: usize) {
        let desc = self.table.descs()[idx];
        let range = self.table.field_range(idx);
        marshal::from_text(desc.kind, &mut self.image[range], desc.default);
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;

        #[cfg(feature = "autosave")]
        if let Some(channel) = self.saver {
            // Full channel means a save is already pending; dropping the
            // request keeps the coalescing contract
            channel.try_send(SaveRequest::Schedule).ok();
        }
    }

    /// Erase a region and write header + payload into it
    fn write_region(&mut self, offset: u32, header: &RecordHeader) -> Result<(), ParamError> {
        self.flash.erase(offset, PARAM_SECTOR_SIZE)?;
        self.flash.write(offset, &header.to_bytes())?;
        self.flash
            .write(offset + RecordHeader::SIZE as u32, &self.image)?;
        Ok(())
    }

    /// Read and validate one region into `scratch`
    ///
    /// The header is validated before any payload byte is read, and the
    /// payload CRC before the caller may touch the image.
    fn read_region(
        &mut self,
        offset: u32,
        scratch: &mut Vec<u8, IMAGE_CAPACITY>,
    ) -> Result<(), RegionError> {
        let mut head = [0u8; RecordHeader::SIZE];
        self.flash.read(offset, &mut head)?;

        let header = RecordHeader::parse(&head, self.table.image_size())?;

        scratch
            .resize(header.size as usize, 0)
            .map_err(|_| RegionError::Codec(CodecError::SizeTooLarge))?;
        self.flash
            .read(offset + RecordHeader::SIZE as u32, scratch)?;

        header.check_payload(scratch)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockFlash;

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

    fn store() -> ParamStore<MockFlash> {
        ParamStore::init(MockFlash::new(), TABLE).unwrap()
    }

    #[test]
    fn test_init_resumes_defaults() {
        let store = store();

        let mut buf = [0u8; 16];
        store.read_by_name("car", &mut buf).unwrap();
        assert_eq!(&buf[..4], b"wow\0");

        let mut age = [0u8; 4];
        store.read_by_name("my_age", &mut age).unwrap();
        assert_eq!(i32::from_le_bytes(age), 25);

        let mut addr = [0u8; 4];
        store.read_by_name("reg_addr", &mut addr).unwrap();
        assert_eq!(u32::from_le_bytes(addr), 0xA001);

        let mut volts = [0u8; 4];
        store.read_by_name("voltage", &mut volts).unwrap();
        assert_eq!(f32::from_le_bytes(volts), 12.34);

        assert!(!store.is_dirty());
    }

    #[test]
    fn test_write_marks_dirty_and_reads_back() {
        let mut store = store();

        store.write_by_name("my_age", &30i32.to_le_bytes()).unwrap();
        assert!(store.is_dirty());

        // Widened read of the 4-byte field
        let mut wide = [0u8; 8];
        store.read_by_name("my_age", &mut wide).unwrap();
        assert_eq!(i64::from_le_bytes(wide), 30);
    }

    #[test]
    fn test_unknown_field() {
        let mut store = store();
        let mut buf = [0u8; 4];
        assert_eq!(
            store.read_by_name("nope", &mut buf),
            Err(ParamError::UnknownField)
        );
        assert_eq!(
            store.write_by_name("nope", &buf),
            Err(ParamError::UnknownField)
        );
        assert_eq!(store.resume_by_name("nope"), Err(ParamError::UnknownField));
        assert_eq!(store.resume_by_index(99), Err(ParamError::UnknownField));
    }

    #[test]
    fn test_empty_buffer_rejected() {
        let mut store = store();
        let mut empty: [u8; 0] = [];
        assert_eq!(
            store.read_by_name("my_age", &mut empty),
            Err(ParamError::InvalidArgument)
        );
        assert_eq!(
            store.write_by_name("my_age", &empty),
            Err(ParamError::InvalidArgument)
        );
    }

    #[test]
    fn test_width_mismatch_leaves_field_untouched() {
        let mut store = store();
        assert_eq!(
            store.write_by_name("my_age", &[1, 2, 3]),
            Err(ParamError::InvalidArgument)
        );
        assert!(!store.is_dirty());

        let mut age = [0u8; 4];
        store.read_by_name("my_age", &mut age).unwrap();
        assert_eq!(i32::from_le_bytes(age), 25);
    }

    #[test]
    fn test_resume_restores_default() {
        let mut store = store();
        store.write_by_name("voltage", &9.9f32.to_le_bytes()).unwrap();
        store.resume_by_name("voltage").unwrap();

        let mut volts = [0u8; 4];
        store.read_by_name("voltage", &mut volts).unwrap();
        assert_eq!(f32::from_le_bytes(volts), 12.34);
        assert!(store.is_dirty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let mut store = store();
        store.write_by_name("car", b"rust").unwrap();
        store.write_by_name("my_money", &(-123456789i64).to_le_bytes()).unwrap();
        store.save_to_flash().unwrap();
        assert!(!store.is_dirty());

        // Fresh process: new store over the same partition
        let flash = store.release();
        let mut store = ParamStore::init(flash, TABLE).unwrap();
        store.load_from_flash().unwrap();

        let mut buf = [0u8; 16];
        store.read_by_name("car", &mut buf).unwrap();
        assert_eq!(&buf[..5], b"rust\0");

        let mut money = [0u8; 8];
        store.read_by_name("my_money", &mut money).unwrap();
        assert_eq!(i64::from_le_bytes(money), -123456789);
    }

    #[test]
    fn test_backup_fallback_on_primary_corruption() {
        let mut store = store();
        store.write_by_name("my_age", &77i32.to_le_bytes()).unwrap();
        store.save_to_flash().unwrap();

        let mut flash = store.release();
        // Corrupt the primary region's payload CRC field
        flash.inject_corruption(PRIMARY_OFFSET + 4, 2);

        let mut store = ParamStore::init(flash, TABLE).unwrap();
        store.load_from_flash().unwrap();

        let mut age = [0u8; 4];
        store.read_by_name("my_age", &mut age).unwrap();
        assert_eq!(i32::from_le_bytes(age), 77);
    }

    #[test]
    fn test_both_regions_corrupt_leaves_image_untouched() {
        let mut store = store();
        store.save_to_flash().unwrap();

        let mut flash = store.release();
        // Corrupt the magic word in both regions
        flash.inject_corruption(PRIMARY_OFFSET, 2);
        flash.inject_corruption(BACKUP_OFFSET, 2);

        let mut store = ParamStore::init(flash, TABLE).unwrap();
        store.write_by_name("my_age", &55i32.to_le_bytes()).unwrap();

        assert_eq!(store.load_from_flash(), Err(ParamError::StorageUnavailable));

        // The failed load must not clobber the current image
        let mut age = [0u8; 4];
        store.read_by_name("my_age", &mut age).unwrap();
        assert_eq!(i32::from_le_bytes(age), 55);
    }

    #[test]
    fn test_erased_flash_boots_on_defaults() {
        // First boot: no record anywhere, init_and_load still succeeds
        let mut store = ParamStore::init_and_load(MockFlash::new(), TABLE).unwrap();
        assert_eq!(store.load_from_flash(), Err(ParamError::StorageUnavailable));

        let mut age = [0u8; 4];
        store.read_by_name("my_age", &mut age).unwrap();
        assert_eq!(i32::from_le_bytes(age), 25);
    }

    #[test]
    fn test_save_fails_when_both_regions_fail() {
        let mut store = store();
        store.write_by_name("my_age", &99i32.to_le_bytes()).unwrap();
        store.flash.set_fail_erases(true);

        assert!(matches!(store.save_to_flash(), Err(ParamError::Flash(_))));
        assert!(store.is_dirty());
    }

    #[test]
    fn test_short_record_replaces_prefix_only() {
        // Save under a truncated schema, reload under the full one: fields
        // past the old image keep their defaults
        static SHORT: &[ParamDesc] = &[
            ParamDesc::string("car", 15, "wow"),
            ParamDesc::array("mac_addr", 6, "AB CD EF 01 02 03"),
        ];

        let mut store = ParamStore::init(MockFlash::new(), SHORT).unwrap();
        store.write_by_name("car", b"gone").unwrap();
        store.save_to_flash().unwrap();

        let flash = store.release();
        let mut store = ParamStore::init(flash, TABLE).unwrap();
        store.load_from_flash().unwrap();

        let mut buf = [0u8; 16];
        store.read_by_name("car", &mut buf).unwrap();
        assert_eq!(&buf[..5], b"gone\0");

        let mut age = [0u8; 4];
        store.read_by_name("my_age", &mut age).unwrap();
        assert_eq!(i32::from_le_bytes(age), 25);
    }
}
