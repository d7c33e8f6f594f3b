//! nRF52840 implementation of the core's GPIO capability.
//!
//! Digital inputs are `Flex` pins so the pull configuration can be applied
//! through `set_mode` at startup. Analog inputs go through the SAADC, which
//! is asynchronous: the main loop calls [`NrfGpio::sample_analog`] before
//! each dispatcher tick and `read_analog` returns the cached result.

use clarity::gpio::{GpioSource, Pin, PinMode, ANALOG_MAX};
use defmt::{debug, warn};
use embassy_nrf::gpio::{Flex, Pull};
use embassy_nrf::saadc::Saadc;

pub const DIGITAL_PINS: usize = 5;
pub const ANALOG_PINS: usize = 2;

pub struct NrfGpio {
    digital: [(Pin, Flex<'static>); DIGITAL_PINS],
    /// Last SAADC result per analog pin, in channel order.
    analog: [(Pin, u16); ANALOG_PINS],
    saadc: Saadc<'static, ANALOG_PINS>,
}

impl NrfGpio {
    /// `analog` lists the pin number behind each SAADC channel, in the
    /// order the channels were configured.
    pub fn new(
        digital: [(Pin, Flex<'static>); DIGITAL_PINS],
        analog: [Pin; ANALOG_PINS],
        saadc: Saadc<'static, ANALOG_PINS>,
    ) -> Self {
        Self {
            digital,
            analog: analog.map(|pin| (pin, 0)),
            saadc,
        }
    }

    /// Convert every analog channel once and cache the results.
    pub async fn sample_analog(&mut self) {
        let mut buf = [0i16; ANALOG_PINS];
        self.saadc.sample(&mut buf).await;
        for ((_, cached), raw) in self.analog.iter_mut().zip(buf) {
            // Single-ended readings dip slightly below zero near ground.
            *cached = raw.clamp(0, ANALOG_MAX as i16) as u16;
        }
    }

    fn flex(&mut self, pin: Pin) -> Option<&mut Flex<'static>> {
        self.digital
            .iter_mut()
            .find(|(p, _)| *p == pin)
            .map(|(_, flex)| flex)
    }
}

impl GpioSource for NrfGpio {
    fn read_digital(&self, pin: Pin) -> bool {
        self.digital
            .iter()
            .find(|(p, _)| *p == pin)
            .map(|(_, flex)| flex.is_high())
            .unwrap_or(false)
    }

    fn read_analog(&self, pin: Pin) -> u16 {
        self.analog
            .iter()
            .find(|(p, _)| *p == pin)
            .map(|(_, value)| *value)
            .unwrap_or(0)
    }

    fn set_mode(&mut self, pin: Pin, mode: PinMode) {
        let pull = match mode {
            PinMode::Analog => {
                // Channels are fixed when the SAADC is created.
                if !self.analog.iter().any(|(p, _)| *p == pin) {
                    warn!("GPIO: P0.{} has no SAADC channel", pin);
                }
                return;
            }
            PinMode::Input => Pull::None,
            PinMode::InputPullDown => Pull::Down,
            PinMode::InputPullUp => Pull::Up,
        };

        match self.flex(pin) {
            Some(flex) => {
                flex.set_as_input(pull);
                debug!("GPIO: P0.{} -> {:?}", pin, mode);
            }
            None => warn!("GPIO: P0.{} is not wired on this board", pin),
        }
    }
}
