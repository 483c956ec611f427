//! Persistent key-value storage abstractions
//!
//! Provides traits for durable key-value storage that can be implemented
//! on top of flash (NVS partitions, sequential storage) or, on the host,
//! on top of a file.

use core::fmt;

/// Storage namespaces
///
/// Each namespace has an independent lifecycle: the learned mapping, the
/// calibration table and the operator settings can be cleared separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Namespace {
    /// Grid position to sensor identity table
    Mapping,
    /// Per-position calibration offsets
    Calibration,
    /// Operator settings (interval, network)
    Settings,
}

/// Storage keys
///
/// Keys are typed and constructed from grid coordinates; they are never
/// formatted to a string and parsed back. The binary form used by storage
/// backends is produced by [`StorageKey::to_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageKey {
    /// Sensor identity assigned to a grid position
    MappingSlot { row: u8, col: u8 },
    /// Whether the stored mapping is complete
    MappingComplete,
    /// Calibration offset of a grid position
    CalibrationOffset { row: u8, col: u8 },
    /// Whether a calibration has been stored
    CalibrationDone,
    /// Operator settings blob (postcard)
    Settings,
}

/// Length of the binary key encoding
pub const KEY_LEN: usize = 3;

const TAG_MAPPING_SLOT: u8 = 0;
const TAG_MAPPING_COMPLETE: u8 = 1;
const TAG_CALIBRATION_OFFSET: u8 = 2;
const TAG_CALIBRATION_DONE: u8 = 3;
const TAG_SETTINGS: u8 = 4;

impl StorageKey {
    /// Namespace this key belongs to
    pub const fn namespace(self) -> Namespace {
        match self {
            StorageKey::MappingSlot { .. } | StorageKey::MappingComplete => Namespace::Mapping,
            StorageKey::CalibrationOffset { .. } | StorageKey::CalibrationDone => {
                Namespace::Calibration
            }
            StorageKey::Settings => Namespace::Settings,
        }
    }

    /// Encode as `[tag, row, col]`
    pub const fn to_bytes(self) -> [u8; KEY_LEN] {
        match self {
            StorageKey::MappingSlot { row, col } => [TAG_MAPPING_SLOT, row, col],
            StorageKey::MappingComplete => [TAG_MAPPING_COMPLETE, 0, 0],
            StorageKey::CalibrationOffset { row, col } => [TAG_CALIBRATION_OFFSET, row, col],
            StorageKey::CalibrationDone => [TAG_CALIBRATION_DONE, 0, 0],
            StorageKey::Settings => [TAG_SETTINGS, 0, 0],
        }
    }

    /// Decode a key from its binary form
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let &[tag, row, col] = bytes else {
            return None;
        };
        match tag {
            TAG_MAPPING_SLOT => Some(StorageKey::MappingSlot { row, col }),
            TAG_MAPPING_COMPLETE => Some(StorageKey::MappingComplete),
            TAG_CALIBRATION_OFFSET => Some(StorageKey::CalibrationOffset { row, col }),
            TAG_CALIBRATION_DONE => Some(StorageKey::CalibrationDone),
            TAG_SETTINGS => Some(StorageKey::Settings),
            _ => None,
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKey::MappingSlot { row, col } => write!(f, "{}_{}", row, col),
            StorageKey::MappingComplete => f.write_str("complete"),
            StorageKey::CalibrationOffset { row, col } => write!(f, "c{}_{}", row, col),
            StorageKey::CalibrationDone => f.write_str("done"),
            StorageKey::Settings => f.write_str("settings"),
        }
    }
}

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Backend could not be opened
    Unavailable,
    /// Key not found
    NotFound,
    /// Buffer too small for the data
    BufferTooSmall,
    /// Data corrupted or invalid
    Corrupted,
    /// Storage is full
    Full,
    /// Write or erase failed
    Write,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StorageError::Unavailable => "storage unavailable",
            StorageError::NotFound => "key not found",
            StorageError::BufferTooSmall => "buffer too small",
            StorageError::Corrupted => "data corrupted",
            StorageError::Full => "storage full",
            StorageError::Write => "write failed",
        };
        f.write_str(text)
    }
}

/// Durable key-value storage
///
/// Implementations should handle:
/// - Wear leveling across flash sectors
/// - Data integrity (CRC or similar)
/// - Single-key writes that are atomic (a key holds either the old or the
///   new value, never a mix)
///
/// Multi-key atomicity is not required; callers order their writes so a
/// completion flag is written last.
pub trait KeyValueStore {
    /// Read a value by key into the provided buffer
    ///
    /// Returns the number of bytes read.
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value by key
    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError>;

    /// Remove a single key (removing a missing key is not an error)
    fn remove(&mut self, key: StorageKey) -> Result<(), StorageError>;

    /// Check if a key exists in storage
    fn exists(&mut self, key: StorageKey) -> bool;

    /// Erase every key of a namespace
    fn erase_namespace(&mut self, namespace: Namespace) -> Result<(), StorageError>;
}
