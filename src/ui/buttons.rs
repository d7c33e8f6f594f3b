//! Pushbutton press classification.
//!
//! One physical button (active-high). Raw levels come from the GPIO source
//! every dispatcher tick; this machine debounces them and turns a press
//! into either a `ShortPress` (on release) or a `LongPress` (once, the
//! moment the hold crosses the threshold).
//!
//! Durations are measured from the press onset, i.e. the rising edge that
//! started debouncing. A press that survives debounce is real from that
//! first edge on.

use crate::config::{
    Millis, BUTTON_DEBOUNCE_MS, BUTTON_TIMEOUT_MS, LONG_PRESS_MAX_MS, LONG_PRESS_THRESHOLD_MS,
    SHORT_PRESS_MIN_MS,
};
use crate::gpio::{GpioSource, Pin};
use crate::ui::PressEvent;

/// Button machine states. Each carries the press onset time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    Idle,
    Debouncing(Millis),
    Pressed(Millis),
    LongPressSent(Millis),
}

/// Debounce + short/long press state machine for the pushbutton.
pub struct ButtonInput {
    pin: Pin,
    state: ButtonState,
    last_level: bool,
}

impl ButtonInput {
    pub const fn new(pin: Pin) -> Self {
        Self {
            pin,
            state: ButtonState::Idle,
            last_level: false,
        }
    }

    /// Record the current level without reacting to it, so a button held
    /// through boot does not register as a fresh press.
    pub fn prime(&mut self, gpio: &impl GpioSource) {
        self.last_level = gpio.read_digital(self.pin);
        debug!("Button: initial level {}", self.last_level);
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    /// Sample the pin and advance. Called once per dispatcher tick.
    pub fn poll(&mut self, gpio: &impl GpioSource, now: Millis) -> Option<PressEvent> {
        let level = gpio.read_digital(self.pin);
        self.step(level, now)
    }

    /// Advance with an explicit level sample.
    pub fn step(&mut self, level: bool, now: Millis) -> Option<PressEvent> {
        let rose = level && !self.last_level;
        let fell = !level && self.last_level;
        self.last_level = level;

        let (next, event) = match self.state {
            ButtonState::Idle if rose => (ButtonState::Debouncing(now), None),
            ButtonState::Idle => (ButtonState::Idle, None),

            // Bounces inside the window are ignored; only the level at the
            // end of the window matters.
            ButtonState::Debouncing(t) if now.saturating_sub(t) >= BUTTON_DEBOUNCE_MS => {
                if level {
                    trace!("Button: debounced press (onset {})", t);
                    (ButtonState::Pressed(t), None)
                } else {
                    trace!("Button: bounce rejected");
                    (ButtonState::Idle, None)
                }
            }
            ButtonState::Debouncing(t) => (ButtonState::Debouncing(t), None),

            ButtonState::Pressed(t) => self.step_pressed(t, level, fell, now),

            ButtonState::LongPressSent(_) if fell => (ButtonState::Idle, None),
            ButtonState::LongPressSent(t) if now.saturating_sub(t) >= BUTTON_TIMEOUT_MS => {
                warn!("Button: held past timeout, resetting to idle");
                (ButtonState::Idle, None)
            }
            ButtonState::LongPressSent(t) => (ButtonState::LongPressSent(t), None),
        };

        self.state = next;
        if let Some(ev) = event {
            info!("Button: {:?}", ev);
        }
        event
    }

    fn step_pressed(
        &self,
        t: Millis,
        level: bool,
        fell: bool,
        now: Millis,
    ) -> (ButtonState, Option<PressEvent>) {
        let held = now.saturating_sub(t);

        if fell {
            return if (SHORT_PRESS_MIN_MS..LONG_PRESS_THRESHOLD_MS).contains(&held) {
                (ButtonState::Idle, Some(PressEvent::ShortPress))
            } else if held > LONG_PRESS_MAX_MS {
                warn!("Button: press too long ({} ms), ignoring", held);
                (ButtonState::Idle, None)
            } else {
                // Too short, or a long hold whose threshold tick was missed.
                debug!("Button: release after {} ms ignored", held);
                (ButtonState::Idle, None)
            };
        }

        if held >= BUTTON_TIMEOUT_MS {
            warn!("Button: press timeout reached, resetting to idle");
            (ButtonState::Idle, None)
        } else if level && held >= LONG_PRESS_THRESHOLD_MS {
            (ButtonState::LongPressSent(t), Some(PressEvent::LongPress))
        } else {
            (ButtonState::Pressed(t), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Feed `level` every 10 ms over `[from, to]`, collecting events.
    fn hold(
        b: &mut ButtonInput,
        level: bool,
        from: Millis,
        to: Millis,
        out: &mut std::vec::Vec<(Millis, PressEvent)>,
    ) {
        let mut t = from;
        while t <= to {
            if let Some(ev) = b.step(level, t) {
                out.push((t, ev));
            }
            t += 10;
        }
    }

    #[test]
    fn short_press_fires_on_release() {
        let mut b = ButtonInput::new(0);
        let mut events = std::vec::Vec::new();
        hold(&mut b, true, 0, 290, &mut events);
        assert!(events.is_empty());
        assert_eq!(b.state(), ButtonState::Pressed(0));

        hold(&mut b, false, 300, 300, &mut events);
        assert_eq!(events, [(300, PressEvent::ShortPress)]);
        assert_eq!(b.state(), ButtonState::Idle);
    }

    #[test]
    fn long_press_fires_once_at_threshold() {
        let mut b = ButtonInput::new(0);
        let mut events = std::vec::Vec::new();
        hold(&mut b, true, 0, 2490, &mut events);
        assert_eq!(events, [(2000, PressEvent::LongPress)]);

        hold(&mut b, false, 2500, 2600, &mut events);
        assert_eq!(events.len(), 1);
        assert_eq!(b.state(), ButtonState::Idle);
    }

    #[test]
    fn bounce_inside_debounce_window_yields_single_press() {
        let mut b = ButtonInput::new(0);
        assert_eq!(b.step(true, 0), None);
        assert_eq!(b.step(false, 10), None);
        assert_eq!(b.step(true, 20), None);
        assert_eq!(b.state(), ButtonState::Debouncing(0));

        let mut events = std::vec::Vec::new();
        hold(&mut b, true, 30, 130, &mut events);
        assert!(events.is_empty());
        assert_eq!(b.state(), ButtonState::Pressed(0));
    }

    #[test]
    fn glitch_shorter_than_debounce_is_rejected() {
        let mut b = ButtonInput::new(0);
        b.step(true, 0);
        b.step(false, 20);
        assert_eq!(b.step(false, 50), None);
        assert_eq!(b.state(), ButtonState::Idle);
    }

    #[test]
    fn watchdog_resets_stuck_button() {
        let mut b = ButtonInput::new(0);
        let mut events = std::vec::Vec::new();
        hold(&mut b, true, 0, 5100, &mut events);
        assert_eq!(events, [(2000, PressEvent::LongPress)]);
        assert_eq!(b.state(), ButtonState::Idle);

        // Still high: no new edge, so nothing restarts.
        hold(&mut b, true, 5110, 9000, &mut events);
        assert_eq!(events.len(), 1);
        assert_eq!(b.state(), ButtonState::Idle);
    }

    #[test]
    fn release_after_missed_threshold_is_silent() {
        let mut b = ButtonInput::new(0);
        b.step(true, 0);
        b.step(true, 60);
        // Sparse sampling: next sample is already past the threshold and low.
        assert_eq!(b.step(false, 2200), None);
        assert_eq!(b.state(), ButtonState::Idle);
    }

    #[test]
    fn prime_swallows_level_held_at_boot() {
        struct High;
        impl GpioSource for High {
            fn read_digital(&self, _: Pin) -> bool {
                true
            }
            fn read_analog(&self, _: Pin) -> u16 {
                0
            }
            fn set_mode(&mut self, _: Pin, _: crate::gpio::PinMode) {}
        }

        let mut b = ButtonInput::new(3);
        b.prime(&High);
        assert_eq!(b.poll(&High, 0), None);
        assert_eq!(b.state(), ButtonState::Idle);
    }

    proptest! {
        #[test]
        fn at_most_one_event_per_press(levels in proptest::collection::vec(any::<bool>(), 1..600)) {
            let mut b = ButtonInput::new(0);
            let mut events_this_press = 0u32;
            let mut was_idle = true;
            for (i, level) in levels.iter().enumerate() {
                let now = i as Millis * 10;
                let ev = b.step(*level, now);
                if ev.is_some() {
                    events_this_press += 1;
                }
                prop_assert!(events_this_press <= 1);
                let idle = b.state() == ButtonState::Idle;
                if idle && !was_idle {
                    events_this_press = 0;
                }
                was_idle = idle;
            }
        }
    }
}
