//! Panel manager: owns what is on screen.
//!
//! Producers (trigger arbiter, button via the current panel) only submit
//! [`ActionRequest`]s. The manager serializes them into one transition at
//! a time:
//!
//! ```text
//!   Idle(p) ──load q──▶ Loading(p, q) ──enter done──▶ Idle(q)
//!      │                                 (or timeout)
//!      └──update due──▶ Updating(p) ──update done──▶ Idle(p)
//! ```
//!
//! Panel-changing requests share a single pending slot: a newer request
//! replaces the pending one only if its priority is at least as high.
//! Theme and default-panel changes never touch the panel and are applied
//! on every tick from their own slots.

use crate::action::{ActionRequest, Origin};
use crate::config::{Millis, LOAD_TIMEOUT_MS, REGISTERED_PANELS, SHOW_SPLASH, UPDATE_INTERVAL_MS};
use crate::gpio::{GpioSource, Pin, PinMap};
use crate::graphics::{AnimationKind, Completion, Graphics};
use crate::preferences::{PreferenceBackend, PreferenceStore, Preferences};
use crate::triggers::TriggerId;
use crate::ui::panels::{Panel, PanelInput, Sensor};
use crate::ui::{PanelName, PressEvent, ThemeName};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelManagerState {
    Idle(PanelName),
    /// `(from, to, started_at)`
    Loading(PanelName, PanelName, Millis),
    /// `(current, started_at)`
    Updating(PanelName, Millis),
}

/// Panels to return to once a trigger-driven panel is released.
///
/// Holds at most one entry; pushing onto a full stack drops the stale one.
/// Each entry remembers the trigger that had put the panel on screen, if
/// any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestorationStack {
    slot: Option<(PanelName, Option<TriggerId>)>,
}

impl RestorationStack {
    pub const CAPACITY: usize = 1;

    pub const fn new() -> Self {
        Self { slot: None }
    }

    pub fn push(&mut self, panel: PanelName, owner: Option<TriggerId>) {
        if let Some((stale, _)) = self.slot.replace((panel, owner)) {
            debug!("Restore stack: {:?} replaced by {:?}", stale, panel);
        }
    }

    pub fn pop(&mut self) -> Option<(PanelName, Option<TriggerId>)> {
        self.slot.take()
    }

    pub fn top(&self) -> Option<PanelName> {
        self.slot.map(|(panel, _)| panel)
    }

    pub fn len(&self) -> usize {
        usize::from(self.slot.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}

pub struct PanelManager {
    state: PanelManagerState,
    pending: Option<ActionRequest>,
    pending_theme: Option<(ThemeName, Origin)>,
    pending_default: Option<PanelName>,
    restoration: RestorationStack,
    /// Trigger that put the current panel on screen.
    owner: Option<TriggerId>,
    panels: [Option<Panel>; PanelName::ALL.len()],
    pins: PinMap,
    preferences: Preferences,
    theme: ThemeName,
    last_update: Millis,
    booting: bool,
}

impl PanelManager {
    /// Manager already showing `initial`, with default preferences.
    pub fn new(initial: PanelName, pins: PinMap) -> Self {
        let preferences = Preferences::default();
        let mut panels: [Option<Panel>; PanelName::ALL.len()] = Default::default();
        panels[initial.index()] = Some(Panel::create(initial, preferences, preferences.theme));

        Self {
            state: PanelManagerState::Idle(initial),
            pending: None,
            pending_theme: None,
            pending_default: None,
            restoration: RestorationStack::new(),
            owner: None,
            panels,
            pins,
            preferences,
            theme: preferences.theme,
            last_update: 0,
            booting: false,
        }
    }

    /// Apply stored preferences and start the first load: the splash
    /// screen if enabled, otherwise the default panel.
    pub fn boot(&mut self, now: Millis, graphics: &mut impl Graphics, prefs: Preferences) {
        self.preferences = prefs;
        self.theme = prefs.theme;
        graphics.apply_theme(self.theme);

        self.pending = None;
        self.restoration.clear();
        self.owner = None;

        let first = if SHOW_SPLASH {
            self.booting = true;
            PanelName::Splash
        } else {
            prefs.default_panel
        };
        info!("Panel: boot into {} (theme {})", first, self.theme);
        self.start_load(first, first, now, graphics);
    }

    /// Queue a request. Takes effect on a later [`tick`](Self::tick).
    pub fn submit(&mut self, request: ActionRequest) {
        if request.is_noop() {
            return;
        }
        match request {
            ActionRequest::SetTheme(theme, origin) => {
                self.pending_theme = Some((theme, origin));
                return;
            }
            ActionRequest::SetDefaultPanel(panel, _) => {
                if is_registered(panel) {
                    self.pending_default = Some(panel);
                } else {
                    warn!("Panel: default {} not registered, dropped", panel);
                }
                return;
            }
            ActionRequest::LoadPanel(panel, _) if !is_registered(panel) => {
                warn!("Panel: {} not registered, dropped", panel);
                return;
            }
            ActionRequest::LoadPanel(..) | ActionRequest::Restore(_) | ActionRequest::NoOp => {}
        }

        match self.pending {
            Some(old) if request.priority() < old.priority() => {
                debug!("Panel: {:?} dropped, {:?} pending", request, old);
            }
            Some(old) => {
                debug!("Panel: {:?} replaces {:?}", request, old);
                self.pending = Some(request);
            }
            None => self.pending = Some(request),
        }
    }

    /// Route a classified button event to the current panel.
    pub fn handle_press(&mut self, event: PressEvent) {
        let current = match self.state {
            PanelManagerState::Loading(..) => {
                debug!("Panel: {:?} discarded during load", event);
                return;
            }
            PanelManagerState::Idle(p) | PanelManagerState::Updating(p, _) => p,
        };

        let panel = self.panel_mut(current);
        if !panel.can_process_input() {
            debug!("Panel: {} ignores input", current);
            return;
        }
        let request = match event {
            PressEvent::ShortPress => panel.on_short_press(),
            PressEvent::LongPress => panel.on_long_press(),
        };
        self.submit(request);
    }

    /// Advance one dispatcher pass.
    pub fn tick<B: PreferenceBackend>(
        &mut self,
        now: Millis,
        gpio: &impl GpioSource,
        graphics: &mut impl Graphics,
        prefs: &mut PreferenceStore<B>,
    ) {
        self.preferences = prefs.current();

        while let Some(completion) = graphics.poll_completion() {
            self.on_completion(completion, now);
        }

        if let Some((theme, origin)) = self.pending_theme.take() {
            self.apply_theme(theme, origin, graphics, prefs);
        }
        if let Some(panel) = self.pending_default.take() {
            info!("Panel: default panel is now {}", panel);
            prefs.set_default_panel(panel);
            self.preferences = prefs.current();
        }

        match self.state {
            PanelManagerState::Idle(current) => {
                if let Some(request) = self.pending.take() {
                    self.dispatch(request, current, now, graphics);
                } else if let Some(pin) = self.update_pin(current, now) {
                    let value = gpio.read_analog(pin);
                    trace!("Panel: update {} with {}", current, value);
                    graphics.update_panel(current, value);
                    self.state = PanelManagerState::Updating(current, now);
                    self.last_update = now;
                }
            }
            PanelManagerState::Loading(_, to, started) => {
                if now.saturating_sub(started) > LOAD_TIMEOUT_MS {
                    warn!("Panel: load of {} timed out, forcing", to);
                    self.finish_load(to, now);
                }
            }
            PanelManagerState::Updating(current, started) => {
                if now.saturating_sub(started) > LOAD_TIMEOUT_MS {
                    warn!("Panel: update of {} timed out, forcing", current);
                    self.state = PanelManagerState::Idle(current);
                }
            }
        }
    }

    /// Panel on screen. While loading this is still the outgoing panel.
    pub fn current(&self) -> PanelName {
        match self.state {
            PanelManagerState::Idle(p) | PanelManagerState::Updating(p, _) => p,
            PanelManagerState::Loading(from, _, _) => from,
        }
    }

    /// Panel being loaded, if a load is in flight.
    pub fn target(&self) -> Option<PanelName> {
        match self.state {
            PanelManagerState::Loading(_, to, _) => Some(to),
            _ => None,
        }
    }

    pub fn state(&self) -> PanelManagerState {
        self.state
    }

    pub fn pending(&self) -> Option<ActionRequest> {
        self.pending
    }

    pub fn restoration_top(&self) -> Option<PanelName> {
        self.restoration.top()
    }

    pub fn restoration_depth(&self) -> usize {
        self.restoration.len()
    }

    pub fn theme(&self) -> ThemeName {
        self.theme
    }

    fn dispatch(
        &mut self,
        request: ActionRequest,
        current: PanelName,
        now: Millis,
        graphics: &mut impl Graphics,
    ) {
        match request {
            ActionRequest::LoadPanel(target, origin) if target == current => {
                if let Origin::Trigger(id) = origin {
                    self.owner = Some(id);
                }
                debug!("Panel: {} already shown", target);
            }
            ActionRequest::LoadPanel(target, Origin::Trigger(id)) => {
                if let Some(holder) = self.owner.filter(|h| h.priority() > id.priority()) {
                    // Shown once the higher-priority trigger releases.
                    info!("Panel: {} held by {:?}, {} deferred", current, holder, target);
                    self.restoration.push(target, Some(id));
                    return;
                }
                // The splash is never something to come back to.
                if current != PanelName::Splash && self.restoration.top() != Some(current) {
                    self.restoration.push(current, self.owner);
                }
                self.owner = Some(id);
                self.start_load(current, target, now, graphics);
            }
            ActionRequest::LoadPanel(target, Origin::UserInput) => {
                self.restoration.clear();
                self.owner = None;
                self.start_load(current, target, now, graphics);
            }
            ActionRequest::Restore(id) => {
                if id.panel() != Some(current) {
                    // Released while another panel was on top: forget it.
                    if id.panel().is_some() && self.restoration.top() == id.panel() {
                        self.restoration.pop();
                    }
                    debug!("Panel: restore for {:?} ignored, {} on screen", id, current);
                    return;
                }
                let (target, owner) = self
                    .restoration
                    .pop()
                    .unwrap_or((self.preferences.default_panel, None));
                debug!("Panel: restore for {:?} -> {}", id, target);
                self.owner = owner;
                if target != current {
                    self.start_load(current, target, now, graphics);
                }
            }
            // Not panel-affecting; never stored in the pending slot.
            ActionRequest::SetTheme(..)
            | ActionRequest::SetDefaultPanel(..)
            | ActionRequest::NoOp => {}
        }
    }

    fn start_load(
        &mut self,
        from: PanelName,
        to: PanelName,
        now: Millis,
        graphics: &mut impl Graphics,
    ) {
        let (prefs, theme) = (self.preferences, self.theme);
        self.panel_mut(to).on_enter(prefs, theme);
        graphics.load_panel(to);
        self.state = PanelManagerState::Loading(from, to, now);
        info!("Panel: loading {} (from {})", to, from);
    }

    fn finish_load(&mut self, panel: PanelName, now: Millis) {
        self.state = PanelManagerState::Idle(panel);
        self.last_update = now;
        info!("Panel: showing {}", panel);

        if self.booting && panel == PanelName::Splash {
            self.booting = false;
            self.submit(ActionRequest::LoadPanel(
                self.preferences.default_panel,
                Origin::UserInput,
            ));
        }
    }

    fn on_completion(&mut self, completion: Completion, now: Millis) {
        match (self.state, completion.kind) {
            (PanelManagerState::Loading(_, to, _), AnimationKind::Load) if completion.panel == to => {
                if completion.ok {
                    self.finish_load(to, now);
                } else {
                    warn!("Panel: enter animation for {} failed, waiting for timeout", to);
                }
            }
            (PanelManagerState::Updating(p, _), AnimationKind::Update) if completion.panel == p => {
                if !completion.ok {
                    warn!("Panel: update animation for {} failed", p);
                }
                self.state = PanelManagerState::Idle(p);
            }
            _ => debug!("Panel: ignoring stale {:?}", completion),
        }
    }

    fn apply_theme<B: PreferenceBackend>(
        &mut self,
        theme: ThemeName,
        origin: Origin,
        graphics: &mut impl Graphics,
        prefs: &mut PreferenceStore<B>,
    ) {
        if theme != self.theme {
            info!("Panel: theme {} ({:?})", theme, origin);
            graphics.apply_theme(theme);
            self.theme = theme;
        }
        // Trigger-driven themes follow the lights and are not a user choice.
        if !origin.is_trigger() {
            prefs.set_theme(theme);
            self.preferences = prefs.current();
        }
    }

    /// Analog pin to sample if `panel` is due for a gauge update.
    fn update_pin(&self, panel: PanelName, now: Millis) -> Option<Pin> {
        if now.saturating_sub(self.last_update) < UPDATE_INTERVAL_MS {
            return None;
        }
        let sensor = self.panels[panel.index()].as_ref()?.sensor()?;
        Some(match sensor {
            Sensor::OilPressure => self.pins.oil_pressure,
            Sensor::OilTemperature => self.pins.oil_temperature,
        })
    }

    fn panel_mut(&mut self, name: PanelName) -> &mut Panel {
        let (prefs, theme) = (self.preferences, self.theme);
        self.panels[name.index()].get_or_insert_with(|| {
            debug!("Panel: creating {}", name);
            Panel::create(name, prefs, theme)
        })
    }
}

fn is_registered(panel: PanelName) -> bool {
    REGISTERED_PANELS.contains(&panel)
}
