//! Unified error type for the clarity core.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Errors never cross component boundaries: each component logs what it
//! sees and falls back to a safe state. The type exists for the
//! collaborator seams (storage, preference codec) where a `Result` is
//! the natural return.

use core::fmt;

/// Top-level error type used across the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Storage
    /// The preference backend failed to read, write or erase.
    Storage(StorageError),

    /// The persisted preference blob could not be decoded.
    CorruptPreferences,

    // Identifiers
    /// A string did not name any known panel.
    UnknownPanel,

    /// A string did not name any known theme.
    UnknownTheme,

    // Generic
    /// Buffer too small for the requested operation.
    BufferOverflow,
}

/// Failures reported by a [`PreferenceBackend`](crate::preferences::PreferenceBackend).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Flash or NVS read failed.
    ReadFailed,
    /// Flash or NVS write failed.
    WriteFailed,
    /// Erasing the namespace failed.
    EraseFailed,
    /// The stored item does not fit the read buffer.
    TooLarge,
}

// Convenience conversions

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::Storage(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Storage(e) => write!(f, "storage error: {e}"),
            Error::CorruptPreferences => f.write_str("corrupt preference blob"),
            Error::UnknownPanel => f.write_str("unknown panel name"),
            Error::UnknownTheme => f.write_str("unknown theme name"),
            Error::BufferOverflow => f.write_str("buffer too small"),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            StorageError::ReadFailed => "read failed",
            StorageError::WriteFailed => "write failed",
            StorageError::EraseFailed => "erase failed",
            StorageError::TooLarge => "item too large",
        };
        f.write_str(msg)
    }
}
