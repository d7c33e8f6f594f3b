//! Host-side collaborators for running the core without hardware.
//!
//! Everything here is `no_std` + `heapless` so integration tests can drive
//! the library exactly as the firmware does.

use heapless::{Deque, Vec};

use crate::config::PREFS_MAX_BLOB;
use crate::error::StorageError;
use crate::gpio::{GpioSource, Pin, PinMode};
use crate::graphics::{Completion, Graphics};
use crate::preferences::PreferenceBackend;
use crate::ui::{PanelName, ThemeName};

const SIM_PINS: usize = 64;

/// Scriptable pin levels.
pub struct SimGpio {
    digital: [bool; SIM_PINS],
    analog: [u16; SIM_PINS],
    modes: [Option<PinMode>; SIM_PINS],
}

impl SimGpio {
    pub const fn new() -> Self {
        Self {
            digital: [false; SIM_PINS],
            analog: [0; SIM_PINS],
            modes: [None; SIM_PINS],
        }
    }

    pub fn set_level(&mut self, pin: Pin, level: bool) {
        if let Some(slot) = self.digital.get_mut(pin as usize) {
            *slot = level;
        }
    }

    pub fn set_analog(&mut self, pin: Pin, value: u16) {
        if let Some(slot) = self.analog.get_mut(pin as usize) {
            *slot = value;
        }
    }

    /// Mode last applied through [`GpioSource::set_mode`].
    pub fn mode(&self, pin: Pin) -> Option<PinMode> {
        self.modes.get(pin as usize).copied().flatten()
    }
}

impl Default for SimGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioSource for SimGpio {
    fn read_digital(&self, pin: Pin) -> bool {
        self.digital.get(pin as usize).copied().unwrap_or(false)
    }

    fn read_analog(&self, pin: Pin) -> u16 {
        self.analog.get(pin as usize).copied().unwrap_or(0)
    }

    fn set_mode(&mut self, pin: Pin, mode: PinMode) {
        if let Some(slot) = self.modes.get_mut(pin as usize) {
            *slot = Some(mode);
        }
    }
}

const HISTORY: usize = 32;

/// Records every graphics call. Completions are queued by the test, or
/// automatically when `auto_complete` is on.
pub struct SimGraphics {
    auto_complete: bool,
    completions: Deque<Completion, 8>,
    loads: Deque<PanelName, HISTORY>,
    updates: Deque<(PanelName, u16), HISTORY>,
    theme: Option<ThemeName>,
    theme_changes: usize,
    renders: usize,
}

impl SimGraphics {
    /// Animations finish only when the test says so.
    pub const fn new() -> Self {
        Self {
            auto_complete: false,
            completions: Deque::new(),
            loads: Deque::new(),
            updates: Deque::new(),
            theme: None,
            theme_changes: 0,
            renders: 0,
        }
    }

    /// Every animation reports success on the following tick.
    pub fn auto_complete() -> Self {
        let mut g = Self::new();
        g.auto_complete = true;
        g
    }

    pub fn set_auto_complete(&mut self, on: bool) {
        self.auto_complete = on;
    }

    pub fn complete_load(&mut self, panel: PanelName) {
        self.queue(Completion::loaded(panel));
    }

    pub fn fail_load(&mut self, panel: PanelName) {
        self.queue(Completion::load_failed(panel));
    }

    pub fn complete_update(&mut self, panel: PanelName) {
        self.queue(Completion::updated(panel));
    }

    /// Panels passed to `load_panel`, oldest first.
    pub fn loads(&self) -> Vec<PanelName, HISTORY> {
        self.loads.iter().copied().collect()
    }

    pub fn last_load(&self) -> Option<PanelName> {
        self.loads.back().copied()
    }

    pub fn updates(&self) -> Vec<(PanelName, u16), HISTORY> {
        self.updates.iter().copied().collect()
    }

    /// Theme most recently applied.
    pub fn theme(&self) -> Option<ThemeName> {
        self.theme
    }

    pub fn theme_changes(&self) -> usize {
        self.theme_changes
    }

    pub fn renders(&self) -> usize {
        self.renders
    }

    fn queue(&mut self, c: Completion) {
        if self.completions.is_full() {
            self.completions.pop_front();
        }
        let _ = self.completions.push_back(c);
    }

    fn record<T>(log: &mut Deque<T, HISTORY>, item: T) {
        if log.is_full() {
            log.pop_front();
        }
        let _ = log.push_back(item);
    }
}

impl Default for SimGraphics {
    fn default() -> Self {
        Self::new()
    }
}

impl Graphics for SimGraphics {
    fn load_panel(&mut self, name: PanelName) {
        Self::record(&mut self.loads, name);
        if self.auto_complete {
            self.queue(Completion::loaded(name));
        }
    }

    fn update_panel(&mut self, name: PanelName, value: u16) {
        Self::record(&mut self.updates, (name, value));
        if self.auto_complete {
            self.queue(Completion::updated(name));
        }
    }

    fn apply_theme(&mut self, theme: ThemeName) {
        self.theme = Some(theme);
        self.theme_changes += 1;
    }

    fn poll_completion(&mut self) -> Option<Completion> {
        self.completions.pop_front()
    }

    fn render(&mut self) {
        self.renders += 1;
    }
}

/// In-memory preference backend with injectable failures.
pub struct MemoryBackend {
    data: Option<Vec<u8, PREFS_MAX_BLOB>>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
    wipes: usize,
}

impl MemoryBackend {
    pub const fn new() -> Self {
        Self {
            data: None,
            fail_reads: false,
            fail_writes: false,
            writes: 0,
            wipes: 0,
        }
    }

    /// Backend pre-loaded with a blob (truncated to the blob limit).
    pub fn with_contents(blob: &[u8]) -> Self {
        let mut b = Self::new();
        let len = blob.len().min(PREFS_MAX_BLOB);
        b.data = Vec::from_slice(&blob[..len]).ok();
        b
    }

    pub fn contents(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn fail_reads(&mut self, on: bool) {
        self.fail_reads = on;
    }

    pub fn fail_writes(&mut self, on: bool) {
        self.fail_writes = on;
    }

    /// Successful stores so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn wipes(&self) -> usize {
        self.wipes
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceBackend for MemoryBackend {
    fn fetch(&mut self, buf: &mut [u8]) -> Result<Option<usize>, StorageError> {
        if self.fail_reads {
            return Err(StorageError::ReadFailed);
        }
        match &self.data {
            None => Ok(None),
            Some(d) if d.len() > buf.len() => Err(StorageError::TooLarge),
            Some(d) => {
                buf[..d.len()].copy_from_slice(d);
                Ok(Some(d.len()))
            }
        }
    }

    fn store(&mut self, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::WriteFailed);
        }
        self.data = Some(Vec::from_slice(data).map_err(|_| StorageError::TooLarge)?);
        self.writes += 1;
        Ok(())
    }

    fn wipe(&mut self) -> Result<(), StorageError> {
        self.data = None;
        self.wipes += 1;
        Ok(())
    }
}
