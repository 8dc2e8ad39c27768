//! Parameter store core
//!
//! A fixed schema of named, typed values is held in a flat in-memory image and
//! persisted to two redundant flash regions. Modules, leaf first:
//!
//! - [`table`]: the static schema (descriptors, derived offset table)
//! - [`marshal`]: width-exact encoding between caller buffers and stored fields
//! - [`record`]: the on-flash record header codec (magic + dual CRC-16)
//! - [`store`]: the public gateway (typed read/write, resume, save/load)
//! - [`saver`]: debounced auto-save task (feature `autosave`)
//! - [`console`]: text command front end (feature `cli`)

use core::fmt;

use crate::platform::error::{FlashError, PlatformError};

pub mod marshal;
pub mod record;
pub mod store;
pub mod table;

#[cfg(feature = "autosave")]
pub mod saver;

#[cfg(feature = "cli")]
pub mod console;

pub use record::{CodecError, RecordHeader, PARAM_MAGIC};
pub use store::{ParamStore, BACKUP_OFFSET, PARAM_SECTOR_SIZE, PRIMARY_OFFSET};
pub use table::{ParamDesc, ParamKind, ParamTable, IMAGE_CAPACITY, MAX_PARAMS};

#[cfg(feature = "autosave")]
pub use saver::{ParamSaver, SaveChannel, SaveRequest};

#[cfg(feature = "cli")]
pub use console::ParamConsole;

/// Parameter store error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamError {
    /// Store has not been initialized
    NotInitialized,
    /// No parameter with the given name or index
    UnknownField,
    /// Empty buffer, unsupported width, or malformed schema entry
    InvalidArgument,
    /// Partition missing, too small, or no valid record in either region
    StorageUnavailable,
    /// Schema does not fit the image capacity
    OutOfMemory,
    /// Flash I/O failed on both regions
    Flash(FlashError),
}

impl From<FlashError> for ParamError {
    fn from(err: FlashError) -> Self {
        ParamError::Flash(err)
    }
}

impl From<PlatformError> for ParamError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Flash(e) => ParamError::Flash(e),
            PlatformError::InitializationFailed | PlatformError::ResourceUnavailable => {
                ParamError::StorageUnavailable
            }
        }
    }
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::NotInitialized => write!(f, "param store not initialized"),
            ParamError::UnknownField => write!(f, "unknown parameter"),
            ParamError::InvalidArgument => write!(f, "invalid argument"),
            ParamError::StorageUnavailable => write!(f, "storage unavailable"),
            ParamError::OutOfMemory => write!(f, "schema exceeds image capacity"),
            ParamError::Flash(e) => write!(f, "flash error: {:?}", e),
        }
    }
}
