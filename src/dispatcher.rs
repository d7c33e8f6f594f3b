//! Cooperative dispatcher.
//!
//! Owns every component and the three collaborators, and drives them in a
//! fixed order once per tick:
//!
//! 1. trigger arbiter → panel manager
//! 2. button → current panel → panel manager
//! 3. panel manager tick
//! 4. graphics render
//! 5. flush changed preferences
//!
//! Nothing here blocks; the caller owns the timer and calls [`Dispatcher::tick`]
//! roughly every [`TICK_INTERVAL_MS`](crate::config::TICK_INTERVAL_MS).

use crate::config::{Millis, TICK_STALL_WARN_MS};
use crate::gpio::{GpioSource, PinMap};
use crate::graphics::Graphics;
use crate::panel_manager::PanelManager;
use crate::preferences::{PreferenceBackend, PreferenceStore};
use crate::triggers::TriggerArbiter;
use crate::ui::buttons::ButtonInput;
use crate::ui::PanelName;

pub struct Dispatcher<G, D, B> {
    gpio: G,
    graphics: D,
    prefs: PreferenceStore<B>,
    pins: PinMap,
    button: ButtonInput,
    triggers: TriggerArbiter,
    panels: PanelManager,
    last_tick: Option<Millis>,
}

impl<G, D, B> Dispatcher<G, D, B>
where
    G: GpioSource,
    D: Graphics,
    B: PreferenceBackend,
{
    pub fn new(gpio: G, graphics: D, backend: B, pins: PinMap) -> Self {
        Self {
            gpio,
            graphics,
            prefs: PreferenceStore::new(backend),
            pins,
            button: ButtonInput::new(pins.button),
            triggers: TriggerArbiter::new(&pins),
            panels: PanelManager::new(PanelName::Splash, pins),
            last_tick: None,
        }
    }

    /// Configure pins, record initial input levels, load preferences and
    /// start the boot sequence.
    pub fn start(&mut self, now: Millis) {
        self.pins.configure(&mut self.gpio);
        self.button.prime(&self.gpio);
        self.triggers.prime(&self.gpio, now);

        let prefs = self.prefs.load();
        self.panels.boot(now, &mut self.graphics, prefs);
        self.last_tick = Some(now);
        info!("Dispatcher: started at {} ms", now);
    }

    pub fn tick(&mut self, now: Millis) {
        if let Some(last) = self.last_tick {
            let gap = now.saturating_sub(last);
            if gap > TICK_STALL_WARN_MS {
                warn!("Dispatcher: stalled for {} ms", gap);
            }
        }
        self.last_tick = Some(now);

        for request in self.triggers.poll(&self.gpio, now) {
            self.panels.submit(request);
        }

        if let Some(event) = self.button.poll(&self.gpio, now) {
            self.panels.handle_press(event);
        }

        self.panels
            .tick(now, &self.gpio, &mut self.graphics, &mut self.prefs);
        self.graphics.render();
        self.prefs.flush();
    }

    pub fn panels(&self) -> &PanelManager {
        &self.panels
    }

    pub fn triggers(&self) -> &TriggerArbiter {
        &self.triggers
    }

    pub fn button(&self) -> &ButtonInput {
        &self.button
    }

    pub fn preferences(&self) -> &PreferenceStore<B> {
        &self.prefs
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }

    pub fn graphics(&self) -> &D {
        &self.graphics
    }

    pub fn graphics_mut(&mut self) -> &mut D {
        &mut self.graphics
    }
}
