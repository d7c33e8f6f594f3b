//! User interface vocabulary - panels, themes and button events.
//!
//! The panel manager switches between full-screen panels on a round
//! display; the only physical input is one pushbutton.
//!
//! ## Components
//!
//! - **Buttons**: debounce + short/long press classification
//! - **Panels**: per-panel input contracts (what a press asks for)
//! - **Input logic**: menu cursor helpers used by the config panel

pub mod buttons;
pub mod input_logic;
pub mod panels;

use core::fmt;
use core::str::FromStr;

use crate::error::Error;

/// Full-screen views the cluster can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelName {
    /// Boot logo.
    Splash,
    /// Oil pressure gauge.
    OilPressure,
    /// Oil temperature gauge.
    OilTemperature,
    /// Ignition key status.
    Key,
    /// Door lock status.
    Lock,
    /// Settings menu.
    Config,
}

impl PanelName {
    /// Every panel, in slot order.
    pub const ALL: [PanelName; 6] = [
        PanelName::Splash,
        PanelName::OilPressure,
        PanelName::OilTemperature,
        PanelName::Key,
        PanelName::Lock,
        PanelName::Config,
    ];

    /// Short identifier used for persistence.
    pub const fn as_str(self) -> &'static str {
        match self {
            PanelName::Splash => "Splash",
            PanelName::OilPressure => "OilPressure",
            PanelName::OilTemperature => "OilTemperature",
            PanelName::Key => "Key",
            PanelName::Lock => "Lock",
            PanelName::Config => "Config",
        }
    }

    /// Index into per-panel tables.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for PanelName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PanelName::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or(Error::UnknownPanel)
    }
}

impl fmt::Display for PanelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colour schemes. The graphics side resolves the actual palette.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThemeName {
    #[default]
    Day,
    Night,
}

impl ThemeName {
    pub const fn as_str(self) -> &'static str {
        match self {
            ThemeName::Day => "Day",
            ThemeName::Night => "Night",
        }
    }

    /// The other theme.
    pub const fn toggled(self) -> Self {
        match self {
            ThemeName::Day => ThemeName::Night,
            ThemeName::Night => ThemeName::Day,
        }
    }
}

impl FromStr for ThemeName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Day" => Ok(ThemeName::Day),
            "Night" => Ok(ThemeName::Night),
            _ => Err(Error::UnknownTheme),
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified button events (after debouncing).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressEvent {
    ShortPress,
    LongPress,
}
