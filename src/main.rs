//! clarity firmware for nRF52840 + GC9A01.
//!
//! Wires the board peripherals to the coordination core and runs the
//! dispatcher on a fixed ticker. All decisions live in the library; this
//! file only owns hardware setup and the timer.

#![no_std]
#![no_main]

mod board;
#[path = "ui/display.rs"]
mod display;
mod storage;

use clarity::config::{PINS, TICK_INTERVAL_MS};
use clarity::Dispatcher;
use defmt::{error, info, unwrap};
use display_interface_spi::SPIInterface;
use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Flex, Level, Output, OutputDrive};
use embassy_nrf::nvmc::Nvmc;
use embassy_nrf::peripherals::SPI3;
use embassy_nrf::saadc::{self, ChannelConfig, Saadc};
use embassy_nrf::{bind_interrupts, spim};
use embassy_time::{Delay, Duration, Instant, Ticker};
use embedded_hal_bus::spi::ExclusiveDevice;
use gc9a01::mode::{BufferedGraphics, DisplayConfiguration};
use gc9a01::prelude::{DisplayResolution240x240, DisplayRotation};
use gc9a01::{Gc9a01, SPIDisplayInterface};
use static_cell::StaticCell;

use {defmt_rtt as _, panic_probe as _};

use board::NrfGpio;
use display::{ClusterDisplay, Present};
use storage::FlashBackend;

bind_interrupts!(struct Irqs {
    SAADC => saadc::InterruptHandler;
    SPIM3 => spim::InterruptHandler<SPI3>;
});

type Screen = Gc9a01<
    SPIInterface<ExclusiveDevice<spim::Spim<'static, SPI3>, Output<'static>, Delay>, Output<'static>>,
    DisplayResolution240x240,
    BufferedGraphics<DisplayResolution240x240>,
>;

impl Present for Screen {
    fn present(&mut self) -> bool {
        self.flush().is_ok()
    }
}

/// Frame buffer is ~115 KB; keep it out of the task arena.
static SCREEN: StaticCell<Screen> = StaticCell::new();

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("clarity starting...");

    // - Inputs --------------------------------------------
    let digital = [
        (PINS.button, Flex::new(p.P0_11)),
        (PINS.key_present, Flex::new(p.P0_12)),
        (PINS.key_absent, Flex::new(p.P0_24)),
        (PINS.lock, Flex::new(p.P0_25)),
        (PINS.lights, Flex::new(p.P0_13)),
    ];

    let mut saadc_config = saadc::Config::default();
    saadc_config.resolution = saadc::Resolution::_12BIT;
    let saadc = Saadc::new(
        p.SAADC,
        Irqs,
        saadc_config,
        [
            ChannelConfig::single_ended(p.P0_02),
            ChannelConfig::single_ended(p.P0_03),
        ],
    );
    saadc.calibrate().await;
    let gpio = NrfGpio::new(digital, [PINS.oil_pressure, PINS.oil_temperature], saadc);

    // - Display -------------------------------------------
    let mut spi_config = spim::Config::default();
    spi_config.frequency = spim::Frequency::M32;
    spi_config.mode = spim::MODE_0;
    let spi = spim::Spim::new_txonly(p.SPI3, Irqs, p.P0_19, p.P0_20, spi_config);

    let cs = Output::new(p.P0_21, Level::High, OutputDrive::HighDrive);
    let dc = Output::new(p.P0_22, Level::Low, OutputDrive::HighDrive);
    let mut rst = Output::new(p.P0_23, Level::Low, OutputDrive::Standard);
    let _backlight = Output::new(p.P0_14, Level::High, OutputDrive::Standard);

    let device = unwrap!(ExclusiveDevice::new(spi, cs, Delay));
    let screen = SCREEN.init(
        Gc9a01::new(
            SPIDisplayInterface::new(device, dc),
            DisplayResolution240x240,
            DisplayRotation::Rotate0,
        )
        .into_buffered_graphics(),
    );

    let mut delay = Delay;
    if screen.reset(&mut rst, &mut delay).is_err() {
        error!("Display reset failed");
    }
    if screen.init(&mut delay).is_err() {
        error!("Display init failed");
    }

    // - Storage -------------------------------------------
    let backend = FlashBackend::new(BlockingAsync::new(Nvmc::new(p.NVMC)));

    // - Run -----------------------------------------------
    let mut dispatcher = Dispatcher::new(gpio, ClusterDisplay::new(screen), backend, PINS);
    dispatcher.start(Instant::now().as_millis());

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));
    loop {
        dispatcher.gpio_mut().sample_analog().await;
        dispatcher.tick(Instant::now().as_millis());
        ticker.next().await;
    }
}
