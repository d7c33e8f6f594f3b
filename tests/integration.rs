//! Integration tests for the clarity coordination core, driven through the
//! dispatcher with simulated GPIO, graphics and storage.

use clarity::config::{Millis, LOAD_TIMEOUT_MS, PINS, TICK_INTERVAL_MS};
use clarity::gpio::GpioSource;
use clarity::panel_manager::PanelManagerState;
use clarity::sim::{MemoryBackend, SimGpio, SimGraphics};
use clarity::triggers::{TriggerArbiter, TriggerId, TriggerState};
use clarity::ui::buttons::{ButtonInput, ButtonState};
use clarity::{ActionRequest, Dispatcher, Origin, PanelName, PressEvent, ThemeName};

type Cluster = Dispatcher<SimGpio, SimGraphics, MemoryBackend>;

struct Bench {
    d: Cluster,
    now: Millis,
}

impl Bench {
    fn with_backend(backend: MemoryBackend) -> Self {
        let mut d = Dispatcher::new(SimGpio::new(), SimGraphics::auto_complete(), backend, PINS);
        d.start(0);
        Bench { d, now: 0 }
    }

    /// Booted past the splash and showing the default panel.
    fn booted() -> Self {
        let mut b = Self::with_backend(MemoryBackend::new());
        b.ticks(3);
        assert_eq!(b.d.panels().current(), PanelName::OilPressure);
        b
    }

    fn tick(&mut self) {
        self.now += TICK_INTERVAL_MS;
        self.d.tick(self.now);
    }

    fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    fn set(&mut self, pin: u8, level: bool) {
        self.d.gpio_mut().set_level(pin, level);
    }

    /// Hold the button for `ms`, release, and let the result settle.
    fn press(&mut self, ms: Millis) {
        self.set(PINS.button, true);
        let until = self.now + ms;
        while self.now < until {
            self.tick();
        }
        self.set(PINS.button, false);
        self.ticks(3);
    }
}

// - Triggers & button -------------------------------------

#[test]
fn lights_toggle_round_trip() {
    let mut b = Bench::booted();
    assert_eq!(b.d.panels().theme(), ThemeName::Day);
    let applied = b.d.graphics().theme_changes();

    b.set(PINS.lights, true);
    b.tick();
    assert_eq!(b.d.panels().theme(), ThemeName::Night);
    assert_eq!(b.d.graphics().theme(), Some(ThemeName::Night));
    assert_eq!(b.d.graphics().theme_changes(), applied + 1);
    assert_eq!(b.d.panels().current(), PanelName::OilPressure);
    assert!(b.d.graphics().loads().iter().all(|p| *p != PanelName::Lock));

    b.set(PINS.lights, false);
    b.tick();
    assert_eq!(b.d.panels().theme(), ThemeName::Day);
    assert_eq!(b.d.graphics().theme(), Some(ThemeName::Day));
    assert_eq!(b.d.graphics().theme_changes(), applied + 2);
    assert_eq!(b.d.panels().current(), PanelName::OilPressure);

    // Headlight-driven theme is not a user preference.
    assert_eq!(b.d.preferences().current().theme, ThemeName::Day);
}

#[test]
fn lock_over_oil_then_release() {
    let mut b = Bench::booted();

    b.set(PINS.lock, true);
    b.tick();
    assert_eq!(b.d.panels().target(), Some(PanelName::Lock));
    assert_eq!(b.d.panels().restoration_top(), Some(PanelName::OilPressure));
    b.tick();
    assert_eq!(b.d.panels().current(), PanelName::Lock);

    b.set(PINS.lock, false);
    b.tick();
    assert_eq!(b.d.panels().target(), Some(PanelName::OilPressure));
    b.tick();
    assert_eq!(b.d.panels().current(), PanelName::OilPressure);
    assert_eq!(b.d.panels().restoration_depth(), 0);
}

#[test]
fn theme_and_lock_in_same_tick_both_apply() {
    let mut b = Bench::booted();

    b.set(PINS.lights, true);
    b.set(PINS.lock, true);
    b.tick();
    assert_eq!(b.d.panels().theme(), ThemeName::Night);
    assert_eq!(b.d.panels().target(), Some(PanelName::Lock));

    b.tick();
    assert_eq!(b.d.panels().current(), PanelName::Lock);
    assert_eq!(b.d.panels().theme(), ThemeName::Night);
}

#[test]
fn overlapping_triggers_collapse_to_one_restore_entry() {
    let mut b = Bench::booted();

    b.set(PINS.lock, true);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::Lock);
    assert_eq!(b.d.panels().restoration_top(), Some(PanelName::OilPressure));

    b.set(PINS.key_present, true);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::Key);
    assert_eq!(b.d.panels().restoration_top(), Some(PanelName::Lock));
    assert_eq!(b.d.panels().restoration_depth(), 1);

    b.set(PINS.key_present, false);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::Lock);
    assert_eq!(b.d.panels().restoration_depth(), 0);

    b.set(PINS.lock, false);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::OilPressure);
    assert_eq!(b.d.panels().restoration_depth(), 0);
}

#[test]
fn key_stays_while_other_key_pin_is_high() {
    let mut b = Bench::booted();

    b.set(PINS.key_present, true);
    b.ticks(2);
    b.set(PINS.key_absent, true);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::Key);

    b.set(PINS.key_present, false);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::Key);
    assert_eq!(b.d.panels().target(), None);

    b.set(PINS.key_absent, false);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::OilPressure);
}

#[test]
fn releasing_lock_under_key_keeps_key() {
    let mut b = Bench::booted();

    b.set(PINS.lock, true);
    b.ticks(2);
    b.set(PINS.key_present, true);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::Key);

    b.set(PINS.lock, false);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::Key);
    assert_eq!(b.d.panels().restoration_depth(), 0);

    b.set(PINS.key_present, false);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::OilPressure);
}

#[test]
fn lock_does_not_replace_key_on_later_tick() {
    let mut b = Bench::booted();

    b.set(PINS.key_present, true);
    b.ticks(2);
    b.set(PINS.lock, true);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::Key);
    assert_eq!(b.d.panels().restoration_top(), Some(PanelName::Lock));

    b.set(PINS.key_present, false);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::Lock);

    b.set(PINS.lock, false);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::OilPressure);
}

/// Drive a button over a level script sampled every 10 ms.
fn run_button(script: &[(Millis, bool)], until: Millis) -> Vec<(Millis, PressEvent)> {
    let mut gpio = SimGpio::new();
    let mut button = ButtonInput::new(PINS.button);
    button.prime(&gpio);

    let mut events = Vec::new();
    let mut t = 0;
    while t <= until {
        if let Some(&(_, level)) = script.iter().rev().find(|(at, _)| *at <= t) {
            gpio.set_level(PINS.button, level);
        }
        if let Some(ev) = button.poll(&gpio, t) {
            events.push((t, ev));
        }
        t += 10;
    }
    events
}

#[test]
fn short_press_reports_on_release() {
    let events = run_button(&[(0, true), (300, false)], 400);
    assert_eq!(events, [(300, PressEvent::ShortPress)]);
}

#[test]
fn long_press_reports_at_threshold_and_release_is_silent() {
    let events = run_button(&[(0, true), (2500, false)], 2600);
    assert_eq!(events, [(2000, PressEvent::LongPress)]);
}

#[test]
fn bouncing_contact_registers_one_press() {
    let mut gpio = SimGpio::new();
    let mut button = ButtonInput::new(PINS.button);
    button.prime(&gpio);

    let mut events = Vec::new();
    for (t, level) in [(0, true), (10, false), (20, true)] {
        gpio.set_level(PINS.button, level);
        events.extend(button.poll(&gpio, t));
    }
    let mut t = 30;
    while t <= 120 {
        events.extend(button.poll(&gpio, t));
        t += 10;
    }

    assert!(events.is_empty());
    assert_eq!(button.state(), ButtonState::Pressed(0));
}

// - Boot & preferences ------------------------------------

#[test]
fn boot_uses_persisted_preferences() {
    let backend = MemoryBackend::with_contents(b"default_panel=OilTemperature\ntheme=Night\n");
    let mut b = Bench::with_backend(backend);
    assert_eq!(b.d.graphics().theme(), Some(ThemeName::Night));
    assert_eq!(b.d.panels().target(), Some(PanelName::Splash));

    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::OilTemperature);
    assert_eq!(b.d.panels().theme(), ThemeName::Night);
    assert_eq!(
        b.d.graphics().loads().as_slice(),
        &[PanelName::Splash, PanelName::OilTemperature]
    );
}

#[test]
fn corrupt_preferences_are_replaced_with_defaults() {
    let backend = MemoryBackend::with_contents(b"default_panel=Tachometer\n");
    let mut b = Bench::with_backend(backend);
    b.ticks(2);

    assert_eq!(b.d.panels().current(), PanelName::OilPressure);
    assert_eq!(b.d.preferences().backend().wipes(), 1);
    assert_eq!(
        b.d.preferences().backend().contents(),
        Some(&b"default_panel=OilPressure\ntheme=Day\n"[..])
    );
}

#[test]
fn unreadable_storage_still_boots() {
    let mut backend = MemoryBackend::new();
    backend.fail_reads(true);
    let mut b = Bench::with_backend(backend);
    b.ticks(2);

    assert_eq!(b.d.panels().current(), PanelName::OilPressure);
    assert_eq!(b.d.preferences().backend().wipes(), 0);
}

#[test]
fn button_is_ignored_on_splash() {
    let mut d: Cluster = Dispatcher::new(SimGpio::new(), SimGraphics::new(), MemoryBackend::new(), PINS);
    d.start(0);

    // Splash stays up until its animation completes; hold long enough for a
    // long press meanwhile.
    d.gpio_mut().set_level(PINS.button, true);
    let mut t = 10;
    while t <= 2100 {
        d.tick(t);
        t += 10;
    }
    d.gpio_mut().set_level(PINS.button, false);
    d.tick(t);
    assert_eq!(d.panels().target(), Some(PanelName::Splash));
    assert_eq!(d.graphics().loads().as_slice(), &[PanelName::Splash]);
}

// - Panels & menu -----------------------------------------

#[test]
fn long_press_opens_menu_and_theme_choice_persists() {
    let mut b = Bench::booted();

    b.press(2100);
    assert_eq!(b.d.panels().current(), PanelName::Config);

    // Default panel -> Theme.
    b.press(200);
    b.press(2100);
    assert_eq!(b.d.panels().theme(), ThemeName::Night);
    assert_eq!(b.d.preferences().current().theme, ThemeName::Night);
    assert_eq!(
        b.d.preferences().backend().contents(),
        Some(&b"default_panel=OilPressure\ntheme=Night\n"[..])
    );

    // Theme -> Exit.
    b.press(200);
    b.press(2100);
    assert_eq!(b.d.panels().current(), PanelName::OilPressure);
}

#[test]
fn lock_preempts_menu_and_restores_it() {
    let mut b = Bench::booted();
    b.press(2100);
    assert_eq!(b.d.panels().current(), PanelName::Config);

    b.set(PINS.lock, true);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::Lock);

    b.set(PINS.lock, false);
    b.ticks(2);
    assert_eq!(b.d.panels().current(), PanelName::Config);
}

#[test]
fn gauge_updates_carry_sensor_reading() {
    let mut b = Bench::booted();
    b.d.gpio_mut().set_analog(PINS.oil_pressure, 1234);

    b.ticks(60);
    let updates = b.d.graphics().updates();
    assert!(!updates.is_empty());
    assert!(updates
        .iter()
        .all(|&(panel, value)| panel == PanelName::OilPressure && value == 1234));
    assert_eq!(b.d.gpio().read_analog(PINS.oil_pressure), 1234);
}

#[test]
fn load_that_never_completes_is_forced_after_timeout() {
    let mut b = Bench::booted();
    b.d.graphics_mut().set_auto_complete(false);

    b.set(PINS.lock, true);
    b.tick();
    assert!(matches!(
        b.d.panels().state(),
        PanelManagerState::Loading(PanelName::OilPressure, PanelName::Lock, _)
    ));

    let started = b.now;
    while b.now <= started + LOAD_TIMEOUT_MS {
        b.tick();
    }
    assert_eq!(b.d.panels().state(), PanelManagerState::Idle(PanelName::Lock));
}

// - Arbitration -------------------------------------------

#[test]
fn trigger_requests_come_out_highest_priority_last() {
    let mut gpio = SimGpio::new();
    let mut arbiter = TriggerArbiter::new(&PINS);
    arbiter.prime(&gpio, 0);

    gpio.set_level(PINS.lights, true);
    gpio.set_level(PINS.lock, true);
    gpio.set_level(PINS.key_present, true);
    let requests = arbiter.poll(&gpio, 10);

    assert_eq!(
        requests.as_slice(),
        &[
            ActionRequest::SetTheme(ThemeName::Night, Origin::Trigger(TriggerId::Lights)),
            ActionRequest::LoadPanel(PanelName::Lock, Origin::Trigger(TriggerId::Lock)),
            ActionRequest::LoadPanel(PanelName::Key, Origin::Trigger(TriggerId::KeyPresent)),
        ]
    );
    assert_eq!(arbiter.state(TriggerId::Lock), TriggerState::Active);
    assert_eq!(arbiter.state(TriggerId::KeyAbsent), TriggerState::Inactive);
}

#[test]
fn critical_trigger_wins_same_tick_contention() {
    let mut b = Bench::booted();

    b.set(PINS.lock, true);
    b.set(PINS.key_present, true);
    b.tick();
    assert_eq!(b.d.panels().target(), Some(PanelName::Key));
}
