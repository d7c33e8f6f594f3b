//! Panel input contracts.
//!
//! Panels never own the manager. A press is turned into an
//! [`ActionRequest`] by the current panel and handed back to the manager,
//! which is the only party that changes what is on screen. Rendering is
//! the graphics collaborator's business; a panel here is just the state
//! needed to answer button presses.

use crate::action::{ActionRequest, Origin};
use crate::config::SELECTABLE_DEFAULT_PANELS;
use crate::preferences::Preferences;
use crate::ui::input_logic::{cycle_option, select_next};
use crate::ui::{PanelName, ThemeName};

/// What a panel does with button presses.
pub trait PanelInput {
    fn on_short_press(&mut self) -> ActionRequest;
    fn on_long_press(&mut self) -> ActionRequest;

    /// When `false` the manager discards button events for this panel.
    fn can_process_input(&self) -> bool {
        true
    }
}

/// Analog sensors that drive gauge updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sensor {
    OilPressure,
    OilTemperature,
}

/// Boot logo. Ignores the button entirely.
pub struct SplashPanel;

impl PanelInput for SplashPanel {
    fn on_short_press(&mut self) -> ActionRequest {
        ActionRequest::NoOp
    }

    fn on_long_press(&mut self) -> ActionRequest {
        ActionRequest::NoOp
    }

    fn can_process_input(&self) -> bool {
        false
    }
}

/// A gauge backed by one analog sensor.
pub struct GaugePanel {
    sensor: Sensor,
}

impl GaugePanel {
    pub const fn new(sensor: Sensor) -> Self {
        Self { sensor }
    }

    pub const fn sensor(&self) -> Sensor {
        self.sensor
    }
}

impl PanelInput for GaugePanel {
    fn on_short_press(&mut self) -> ActionRequest {
        ActionRequest::NoOp
    }

    fn on_long_press(&mut self) -> ActionRequest {
        ActionRequest::LoadPanel(PanelName::Config, Origin::UserInput)
    }
}

/// Static status screens (key, lock). Long press opens the settings.
pub struct StatusPanel;

impl PanelInput for StatusPanel {
    fn on_short_press(&mut self) -> ActionRequest {
        ActionRequest::NoOp
    }

    fn on_long_press(&mut self) -> ActionRequest {
        ActionRequest::LoadPanel(PanelName::Config, Origin::UserInput)
    }
}

/// Entries of the settings menu, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuItem {
    DefaultPanel,
    Theme,
    Exit,
}

pub const MENU_ITEMS: [MenuItem; 3] = [MenuItem::DefaultPanel, MenuItem::Theme, MenuItem::Exit];

/// Settings menu: short press moves the cursor, long press executes the
/// selected entry.
pub struct ConfigPanel {
    selected: usize,
    default_panel: PanelName,
    theme: ThemeName,
}

impl ConfigPanel {
    pub fn new(prefs: Preferences, theme: ThemeName) -> Self {
        Self {
            selected: 0,
            default_panel: prefs.default_panel,
            theme,
        }
    }

    /// Reset the cursor and refresh the values shown next to each entry.
    pub fn refresh(&mut self, prefs: Preferences, theme: ThemeName) {
        self.selected = 0;
        self.default_panel = prefs.default_panel;
        self.theme = theme;
    }

    pub fn selected(&self) -> MenuItem {
        MENU_ITEMS[self.selected]
    }
}

impl PanelInput for ConfigPanel {
    fn on_short_press(&mut self) -> ActionRequest {
        self.selected = select_next(self.selected, MENU_ITEMS.len());
        debug!("Config: cursor on {:?}", self.selected());
        ActionRequest::NoOp
    }

    fn on_long_press(&mut self) -> ActionRequest {
        match self.selected() {
            MenuItem::DefaultPanel => {
                match cycle_option(SELECTABLE_DEFAULT_PANELS, self.default_panel) {
                    Some(next) => {
                        self.default_panel = next;
                        ActionRequest::SetDefaultPanel(next, Origin::UserInput)
                    }
                    None => ActionRequest::NoOp,
                }
            }
            MenuItem::Theme => {
                self.theme = self.theme.toggled();
                ActionRequest::SetTheme(self.theme, Origin::UserInput)
            }
            MenuItem::Exit => ActionRequest::LoadPanel(self.default_panel, Origin::UserInput),
        }
    }
}

/// A panel instance, created on first load and kept for the process.
pub enum Panel {
    Splash(SplashPanel),
    Gauge(GaugePanel),
    Status(StatusPanel),
    Config(ConfigPanel),
}

impl Panel {
    pub fn create(name: PanelName, prefs: Preferences, theme: ThemeName) -> Self {
        match name {
            PanelName::Splash => Panel::Splash(SplashPanel),
            PanelName::OilPressure => Panel::Gauge(GaugePanel::new(Sensor::OilPressure)),
            PanelName::OilTemperature => Panel::Gauge(GaugePanel::new(Sensor::OilTemperature)),
            PanelName::Key | PanelName::Lock => Panel::Status(StatusPanel),
            PanelName::Config => Panel::Config(ConfigPanel::new(prefs, theme)),
        }
    }

    /// Called each time the panel becomes the load target.
    pub fn on_enter(&mut self, prefs: Preferences, theme: ThemeName) {
        if let Panel::Config(config) = self {
            config.refresh(prefs, theme);
        }
    }

    /// Sensor feeding periodic updates, if any.
    pub fn sensor(&self) -> Option<Sensor> {
        match self {
            Panel::Gauge(g) => Some(g.sensor()),
            _ => None,
        }
    }

    fn input(&mut self) -> &mut dyn PanelInput {
        match self {
            Panel::Splash(p) => p,
            Panel::Gauge(p) => p,
            Panel::Status(p) => p,
            Panel::Config(p) => p,
        }
    }
}

impl PanelInput for Panel {
    fn on_short_press(&mut self) -> ActionRequest {
        self.input().on_short_press()
    }

    fn on_long_press(&mut self) -> ActionRequest {
        self.input().on_long_press()
    }

    fn can_process_input(&self) -> bool {
        match self {
            Panel::Splash(p) => p.can_process_input(),
            Panel::Gauge(p) => p.can_process_input(),
            Panel::Status(p) => p.can_process_input(),
            Panel::Config(p) => p.can_process_input(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> Preferences {
        Preferences {
            default_panel: PanelName::OilPressure,
            theme: ThemeName::Day,
        }
    }

    #[test]
    fn splash_refuses_input() {
        let p = Panel::create(PanelName::Splash, prefs(), ThemeName::Day);
        assert!(!p.can_process_input());
    }

    #[test]
    fn gauges_and_status_open_config_on_long_press() {
        for name in [PanelName::OilPressure, PanelName::Key, PanelName::Lock] {
            let mut p = Panel::create(name, prefs(), ThemeName::Day);
            assert!(p.can_process_input());
            assert_eq!(p.on_short_press(), ActionRequest::NoOp);
            assert_eq!(
                p.on_long_press(),
                ActionRequest::LoadPanel(PanelName::Config, Origin::UserInput)
            );
        }
    }

    #[test]
    fn gauge_panels_report_their_sensor() {
        let p = Panel::create(PanelName::OilTemperature, prefs(), ThemeName::Day);
        assert_eq!(p.sensor(), Some(Sensor::OilTemperature));
        let k = Panel::create(PanelName::Key, prefs(), ThemeName::Day);
        assert_eq!(k.sensor(), None);
    }

    #[test]
    fn config_menu_cycles_and_executes() {
        let mut p = ConfigPanel::new(prefs(), ThemeName::Night);
        assert_eq!(p.selected(), MenuItem::DefaultPanel);
        assert_eq!(
            p.on_long_press(),
            ActionRequest::SetDefaultPanel(PanelName::OilTemperature, Origin::UserInput)
        );

        p.on_short_press();
        assert_eq!(p.selected(), MenuItem::Theme);
        assert_eq!(
            p.on_long_press(),
            ActionRequest::SetTheme(ThemeName::Day, Origin::UserInput)
        );

        p.on_short_press();
        assert_eq!(
            p.on_long_press(),
            ActionRequest::LoadPanel(PanelName::OilTemperature, Origin::UserInput)
        );

        p.on_short_press();
        assert_eq!(p.selected(), MenuItem::DefaultPanel);
    }

    #[test]
    fn config_refresh_resets_cursor() {
        let mut p = Panel::create(PanelName::Config, prefs(), ThemeName::Day);
        p.on_short_press();
        p.on_enter(prefs(), ThemeName::Day);
        match p {
            Panel::Config(c) => assert_eq!(c.selected(), MenuItem::DefaultPanel),
            _ => panic!("expected config panel"),
        }
    }
}
