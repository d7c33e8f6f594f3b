//! User preferences: default panel and theme.
//!
//! The blob is plain text, one `key=value` per line:
//!
//! ```text
//! default_panel=OilPressure
//! theme=Day
//! ```
//!
//! Unknown keys are skipped and missing keys keep their defaults, so
//! firmware versions can add settings without a migration. A blob that
//! cannot be parsed at all is wiped and re-seeded.

use core::fmt::Write;

use heapless::String;

use crate::config::PREFS_MAX_BLOB;
use crate::error::{Error, StorageError};
use crate::ui::{PanelName, ThemeName};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Preferences {
    pub default_panel: PanelName,
    pub theme: ThemeName,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_panel: PanelName::OilPressure,
            theme: ThemeName::Day,
        }
    }
}

const KEY_DEFAULT_PANEL: &str = "default_panel";
const KEY_THEME: &str = "theme";

/// Serialize preferences into the text form.
pub fn encode(prefs: &Preferences) -> Result<String<PREFS_MAX_BLOB>, Error> {
    let mut out = String::new();
    write!(
        out,
        "{}={}\n{}={}\n",
        KEY_DEFAULT_PANEL, prefs.default_panel, KEY_THEME, prefs.theme
    )
    .map_err(|_| Error::BufferOverflow)?;
    Ok(out)
}

/// Parse the text form.
pub fn decode(data: &[u8]) -> Result<Preferences, Error> {
    let text = core::str::from_utf8(data).map_err(|_| Error::CorruptPreferences)?;
    let mut prefs = Preferences::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or(Error::CorruptPreferences)?;
        let value = value.trim();
        match key.trim() {
            KEY_DEFAULT_PANEL => {
                prefs.default_panel = value.parse().map_err(|_| Error::CorruptPreferences)?
            }
            KEY_THEME => prefs.theme = value.parse().map_err(|_| Error::CorruptPreferences)?,
            _ => trace!("Prefs: skipping unknown key"),
        }
    }
    Ok(prefs)
}

/// Key/value persistence for the preference blob.
///
/// Implementations are synchronous; one call per operation and never more
/// than one per dispatcher tick.
pub trait PreferenceBackend {
    /// Read the blob into `buf`. `Ok(None)` when nothing is stored.
    fn fetch(&mut self, buf: &mut [u8]) -> Result<Option<usize>, StorageError>;

    /// Replace the stored blob.
    fn store(&mut self, data: &[u8]) -> Result<(), StorageError>;

    /// Remove everything in the preference namespace.
    fn wipe(&mut self) -> Result<(), StorageError>;
}

/// Cached preferences backed by a [`PreferenceBackend`].
pub struct PreferenceStore<B> {
    backend: B,
    current: Preferences,
    /// True if the cache differs from what was last written.
    dirty: bool,
}

impl<B: PreferenceBackend> PreferenceStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            current: Preferences::default(),
            dirty: false,
        }
    }

    /// Read preferences from the backend. Never fails: anything unreadable
    /// yields the defaults.
    pub fn load(&mut self) -> Preferences {
        let mut buf = [0u8; PREFS_MAX_BLOB];

        self.current = match self.backend.fetch(&mut buf) {
            Ok(Some(len)) => match decode(&buf[..len]) {
                Ok(prefs) => {
                    info!("Prefs: loaded {:?}", prefs);
                    prefs
                }
                Err(e) => {
                    error!("Prefs: {}, resetting namespace", e);
                    self.reset()
                }
            },
            Ok(None) => {
                info!("Prefs: nothing stored, seeding defaults");
                let defaults = Preferences::default();
                if let Err(e) = self.save(&defaults) {
                    error!("Prefs: seeding failed: {}", e);
                }
                defaults
            }
            Err(StorageError::TooLarge) => {
                error!("Prefs: stored blob too large, resetting namespace");
                self.reset()
            }
            Err(e) => {
                error!("Prefs: read failed: {}, using defaults", e);
                Preferences::default()
            }
        };
        self.dirty = false;
        self.current
    }

    /// Write `prefs` to the backend.
    pub fn save(&mut self, prefs: &Preferences) -> Result<(), Error> {
        let blob = encode(prefs)?;
        self.backend.store(blob.as_bytes())?;
        debug!("Prefs: saved {:?}", prefs);
        Ok(())
    }

    fn reset(&mut self) -> Preferences {
        let defaults = Preferences::default();
        if let Err(e) = self.backend.wipe() {
            error!("Prefs: wipe failed: {}", e);
        }
        if let Err(e) = self.save(&defaults) {
            error!("Prefs: re-seeding failed: {}", e);
        }
        defaults
    }

    pub fn current(&self) -> Preferences {
        self.current
    }

    pub fn set_theme(&mut self, theme: ThemeName) {
        if self.current.theme != theme {
            self.current.theme = theme;
            self.dirty = true;
        }
    }

    pub fn set_default_panel(&mut self, panel: PanelName) {
        if self.current.default_panel != panel {
            self.current.default_panel = panel;
            self.dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Persist pending changes. A failed write is logged and not retried.
    pub fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        let prefs = self.current;
        if let Err(e) = self.save(&prefs) {
            error!("Prefs: save failed: {}", e);
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::MemoryBackend;

    #[test]
    fn encode_produces_key_value_lines() {
        let prefs = Preferences {
            default_panel: PanelName::OilTemperature,
            theme: ThemeName::Night,
        };
        let blob = encode(&prefs).unwrap();
        assert_eq!(blob.as_str(), "default_panel=OilTemperature\ntheme=Night\n");
        assert_eq!(decode(blob.as_bytes()).unwrap(), prefs);
    }

    #[test]
    fn decode_tolerates_comments_unknown_and_missing_keys() {
        let blob = b"# written by v2\n\nbrightness=7\ntheme = Night\n";
        let prefs = decode(blob).unwrap();
        assert_eq!(prefs.theme, ThemeName::Night);
        assert_eq!(prefs.default_panel, PanelName::OilPressure);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(decode(b"theme=Dusk"), Err(Error::CorruptPreferences));
        assert_eq!(decode(b"no separator"), Err(Error::CorruptPreferences));
        assert_eq!(decode(&[0xff, 0xfe]), Err(Error::CorruptPreferences));
    }

    #[test]
    fn load_seeds_defaults_when_empty() {
        let mut store = PreferenceStore::new(MemoryBackend::new());
        assert_eq!(store.load(), Preferences::default());
        assert_eq!(
            store.backend().contents(),
            Some(&b"default_panel=OilPressure\ntheme=Day\n"[..])
        );
    }

    #[test]
    fn corrupt_blob_is_wiped_and_reseeded() {
        let mut store = PreferenceStore::new(MemoryBackend::with_contents(b"default_panel=Radio"));
        assert_eq!(store.load(), Preferences::default());
        assert_eq!(store.backend().wipes(), 1);
        assert_eq!(
            decode(store.backend().contents().unwrap()).unwrap(),
            Preferences::default()
        );
    }

    #[test]
    fn read_failure_falls_back_without_wiping() {
        let mut backend = MemoryBackend::with_contents(b"theme=Night\n");
        backend.fail_reads(true);
        let mut store = PreferenceStore::new(backend);
        assert_eq!(store.load(), Preferences::default());
        assert_eq!(store.backend().wipes(), 0);
    }

    #[test]
    fn flush_writes_only_when_dirty() {
        let mut store = PreferenceStore::new(MemoryBackend::with_contents(b"theme=Day\n"));
        store.load();
        let writes = store.backend().writes();

        store.set_theme(ThemeName::Day);
        store.flush();
        assert_eq!(store.backend().writes(), writes);

        store.set_theme(ThemeName::Night);
        assert!(store.is_dirty());
        store.flush();
        assert!(!store.is_dirty());
        assert_eq!(store.backend().writes(), writes + 1);
        assert_eq!(decode(store.backend().contents().unwrap()).unwrap().theme, ThemeName::Night);
    }

    #[test]
    fn failed_flush_is_not_retried() {
        let mut store = PreferenceStore::new(MemoryBackend::new());
        store.load();
        store.backend_mut().fail_writes(true);
        store.set_default_panel(PanelName::OilTemperature);
        store.flush();
        assert!(!store.is_dirty());
        assert_eq!(store.current().default_panel, PanelName::OilTemperature);
    }
}
