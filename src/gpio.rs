//! GPIO capability consumed by the core.
//!
//! Reads are raw: no debounce happens below this trait, the button state
//! machine and the trigger arbiter apply their own. Pins are read-only
//! from the core's point of view; `set_mode` runs once at startup.

/// Board pin number (P0.x on the nRF52840 build).
pub type Pin = u8;

/// Electrical configuration applied once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    Input,
    InputPullDown,
    InputPullUp,
    Analog,
}

/// Full-scale value returned by [`GpioSource::read_analog`] (12-bit ADC).
pub const ANALOG_MAX: u16 = 4095;

pub trait GpioSource {
    /// Current logic level of a digital pin.
    fn read_digital(&self, pin: Pin) -> bool;

    /// Raw ADC sample in `0..=ANALOG_MAX`.
    fn read_analog(&self, pin: Pin) -> u16;

    fn set_mode(&mut self, pin: Pin, mode: PinMode);
}

/// Pin assignment for one board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMap {
    pub button: Pin,
    pub key_present: Pin,
    pub key_absent: Pin,
    pub lock: Pin,
    pub lights: Pin,
    pub oil_pressure: Pin,
    pub oil_temperature: Pin,
}

impl PinMap {
    /// Configure every pin the core samples.
    ///
    /// All digital inputs are active-high with pull-downs, matching the
    /// harness wiring (an open input reads as "not asserted").
    pub fn configure(&self, gpio: &mut impl GpioSource) {
        for pin in [
            self.button,
            self.key_present,
            self.key_absent,
            self.lock,
            self.lights,
        ] {
            gpio.set_mode(pin, PinMode::InputPullDown);
        }
        gpio.set_mode(self.oil_pressure, PinMode::Analog);
        gpio.set_mode(self.oil_temperature, PinMode::Analog);
    }
}
