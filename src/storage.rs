//! Persistent storage for user preferences.
//!
//! Uses the nRF52840's internal flash via `sequential-storage` crate to
//! keep the preference blob across power cycles.
//!
//! Storage layout:
//!   - One map item, keyed by a byte derived from the namespace and key
//!     names in `config.rs`.
//!   - The whole flash range is the namespace: wiping erases every page.
//!
//! The core calls the backend synchronously, so each operation runs the
//! async flash future to completion with `block_on`. The NVMC is blocking
//! underneath; `BlockingAsync` only adapts the trait.

use core::ops::Range;

use clarity::config::{
    PREFS_KEY, PREFS_MAX_BLOB, PREFS_NAMESPACE, STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START,
};
use clarity::preferences::PreferenceBackend;
use clarity::StorageError;
use defmt::{debug, error, info};
use embassy_futures::block_on;
use embedded_storage_async::nor_flash::NorFlash;
use sequential_storage::cache::NoCache;

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of our storage region.
const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of our storage region.
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Map key of the preference blob.
const PREFS_ITEM_KEY: u8 = item_key(PREFS_NAMESPACE, PREFS_KEY);

/// Scratch space for sequential-storage: item header plus the blob.
const WORK_BUF_SIZE: usize = PREFS_MAX_BLOB + 32;

/// FNV-1a over `namespace/key`, folded to one byte.
const fn item_key(namespace: &str, key: &str) -> u8 {
    let mut hash: u32 = 0x811c_9dc5;
    let parts = [namespace.as_bytes(), b"/", key.as_bytes()];
    let mut p = 0;
    while p < parts.len() {
        let bytes = parts[p];
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(0x0100_0193);
            i += 1;
        }
        p += 1;
    }
    (hash ^ (hash >> 8) ^ (hash >> 16) ^ (hash >> 24)) as u8
}

/// Preference backend over a NOR flash range.
pub struct FlashBackend<F> {
    flash: F,
    range: Range<u32>,
}

impl<F: NorFlash> FlashBackend<F> {
    pub fn new(flash: F) -> Self {
        Self {
            flash,
            range: STORAGE_START..STORAGE_END,
        }
    }
}

impl<F: NorFlash> PreferenceBackend for FlashBackend<F> {
    fn fetch(&mut self, buf: &mut [u8]) -> Result<Option<usize>, StorageError> {
        let mut work = [0u8; WORK_BUF_SIZE];

        let item = block_on(sequential_storage::map::fetch_item::<u8, &[u8], _>(
            &mut self.flash,
            self.range.clone(),
            &mut NoCache::new(),
            &mut work,
            &PREFS_ITEM_KEY,
        ));

        match item {
            Ok(Some(data)) if data.len() > buf.len() => Err(StorageError::TooLarge),
            Ok(Some(data)) => {
                buf[..data.len()].copy_from_slice(data);
                debug!("Flash: read {} byte preference blob", data.len());
                Ok(Some(data.len()))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                error!("Flash read error: {:?}", defmt::Debug2Format(&e));
                Err(StorageError::ReadFailed)
            }
        }
    }

    fn store(&mut self, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > PREFS_MAX_BLOB {
            return Err(StorageError::TooLarge);
        }
        let mut work = [0u8; WORK_BUF_SIZE];

        match block_on(sequential_storage::map::store_item::<u8, &[u8], _>(
            &mut self.flash,
            self.range.clone(),
            &mut NoCache::new(),
            &mut work,
            &PREFS_ITEM_KEY,
            &data,
        )) {
            Ok(()) => {
                info!("Flash: saved {} byte preference blob", data.len());
                Ok(())
            }
            Err(e) => {
                error!("Flash write error: {:?}", defmt::Debug2Format(&e));
                Err(StorageError::WriteFailed)
            }
        }
    }

    fn wipe(&mut self) -> Result<(), StorageError> {
        match block_on(sequential_storage::erase_all(
            &mut self.flash,
            self.range.clone(),
        )) {
            Ok(()) => {
                info!("Flash: preference pages erased");
                Ok(())
            }
            Err(e) => {
                error!("Flash erase error: {:?}", defmt::Debug2Format(&e));
                Err(StorageError::EraseFailed)
            }
        }
    }
}
