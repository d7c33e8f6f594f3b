//! Application-wide constants and compile-time configuration.
//!
//! All pin assignments, timing parameters and storage layout constants
//! live here so they can be tuned in one place.

use crate::gpio::PinMap;
use crate::ui::PanelName;

/// Monotonic milliseconds since boot. Wall-clock time is never used.
pub type Millis = u64;

// Button timing

/// Level must stay high this long before a press is accepted (ms).
pub const BUTTON_DEBOUNCE_MS: Millis = 50;

/// Shortest press that counts as a short press (ms).
pub const SHORT_PRESS_MIN_MS: Millis = 50;

/// Hold duration at which the long press fires (ms).
pub const LONG_PRESS_THRESHOLD_MS: Millis = 2000;

/// Releases later than this are treated as over-long and ignored (ms).
pub const LONG_PRESS_MAX_MS: Millis = 5000;

/// Watchdog: a press held this long resets the machine to idle (ms).
pub const BUTTON_TIMEOUT_MS: Millis = 5100;

// Panel manager

/// Loads (and updates) that never report completion are forced after this (ms).
pub const LOAD_TIMEOUT_MS: Millis = 30_000;

/// Interval between sensor-driven gauge updates (ms).
pub const UPDATE_INTERVAL_MS: Millis = 500;

/// Show the splash panel before the default panel on boot.
pub const SHOW_SPLASH: bool = true;

/// Panels compiled into this build. Requests for anything else are dropped.
pub const REGISTERED_PANELS: &[PanelName] = &[
    PanelName::Splash,
    PanelName::OilPressure,
    PanelName::OilTemperature,
    PanelName::Key,
    PanelName::Lock,
    PanelName::Config,
];

/// Panels a user may choose as the default from the config menu.
pub const SELECTABLE_DEFAULT_PANELS: &[PanelName] =
    &[PanelName::OilPressure, PanelName::OilTemperature];

// Dispatcher

/// Target dispatcher period (ms).
pub const TICK_INTERVAL_MS: Millis = 10;

/// A gap between ticks longer than this is logged as a stall (ms).
pub const TICK_STALL_WARN_MS: Millis = 50;

// GPIO pin assignments (nRF52840 P0.x numbering)
//
//   Button         → P0.11  (active-high, external pull-down)
//   Key present    → P0.12
//   Key absent     → P0.24
//   Lock           → P0.25
//   Lights         → P0.13
//   Oil pressure   → P0.02  (AIN0)
//   Oil temp       → P0.03  (AIN1)
//   GC9A01 SPI     → SCK P0.19, MOSI P0.20, CS P0.21, DC P0.22, RST P0.23
//   Backlight      → P0.14

/// Default pin map for the cluster board.
pub const PINS: PinMap = PinMap {
    button: 11,
    key_present: 12,
    key_absent: 24,
    lock: 25,
    lights: 13,
    oil_pressure: 2,
    oil_temperature: 3,
};

// Preference storage

/// Storage namespace for persisted preferences.
pub const PREFS_NAMESPACE: &str = "clarity";

/// Key of the preference blob inside the namespace.
pub const PREFS_KEY: &str = "config";

/// Maximum encoded preference blob size (bytes).
pub const PREFS_MAX_BLOB: usize = 96;

/// Flash page index where preference storage starts (4 KB per page on nRF52840).
pub const STORAGE_FLASH_PAGE_START: u32 = 240;

/// Number of flash pages reserved for preference storage.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 2;
