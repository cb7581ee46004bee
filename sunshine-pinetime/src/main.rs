#![no_std]
#![no_main]

mod events;
mod peripherals;
mod system;
mod watchface;

// Panic handler and debugging
use defmt::unwrap;

use defmt_rtt as _;
use panic_probe as _;

// Device
use embassy_executor::Spawner;
use embassy_nrf::{
    bind_interrupts,
    gpio::{Input, Level, Output, OutputDrive, Pull},
    interrupt::{self, InterruptExt, Priority},
    peripherals::{SPI2, TWISPI1},
    spim, twim,
};
use embassy_time::{Duration, Timer};
use nrf_softdevice::Softdevice;
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    SPIM1_SPIS1_TWIM1_TWIS1_SPI1_TWI1 => twim::InterruptHandler<TWISPI1>;
    SPIM2_SPIS2_SPI2 => spim::InterruptHandler<SPI2>;
});

// Crate
use events::{FaceEvent, FACE_EVENTS};
use peripherals::{backlight::Backlight, button::Button, display::Display, touch::TouchController};
use sunshine_face::Engine;
use system::{
    bluetooth::{self, BleLink, Server, SoftdeviceRng},
    config,
    time::{TimeReference, WallClock},
};

// Include current UTC epoch at compile time
include!(concat!(env!("OUT_DIR"), "/utc.rs"));

static SERVER: StaticCell<Server> = StaticCell::new();

/// Polls the button state every 10ms
#[embassy_executor::task]
async fn poll_button(mut button: Button) {
    loop {
        if button.pressed().await {
            defmt::debug!("Button pressed");
            FACE_EVENTS.send(FaceEvent::Button).await;
        }

        // Re-schedule the timer interrupt in 10ms
        Timer::after(Duration::from_millis(10)).await;
    }
}

/// Polls the touch controller every 20ms
#[embassy_executor::task]
async fn poll_touch(mut touch: TouchController) {
    loop {
        if let Some(tap) = touch.try_event_detected() {
            FACE_EVENTS.send(FaceEvent::Touch(tap)).await;
        }

        // Re-schedule the timer interrupt in 20ms
        Timer::after(Duration::from_millis(20)).await;
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(config::chip());
    defmt::info!("Initializing");

    // Peripheral interrupts must stay clear of the SoftDevice's priorities
    interrupt::SPIM1_SPIS1_TWIM1_TWIS1_SPI1_TWI1.set_priority(Priority::P3);
    interrupt::SPIM2_SPIS2_SPI2.set_priority(Priority::P3);

    // Initialize Backlight, dark until the face is drawn
    let backlight = Backlight::init(
        Output::new(p.P0_14, Level::High, OutputDrive::Standard),
        Output::new(p.P0_22, Level::High, OutputDrive::Standard),
        Output::new(p.P0_23, Level::High, OutputDrive::Standard),
        0,
    );

    // Initialize Button
    let button = Button::init(
        Input::new(p.P0_13, Pull::None),
        Output::new(p.P0_15, Level::Low, OutputDrive::Standard),
    );

    // Initialize I2C
    let mut i2c_config = twim::Config::default();
    // Use I2C at 400KHz (the fastest clock available on the nRF52832)
    i2c_config.frequency = twim::Frequency::K400;
    let i2c = twim::Twim::new(p.TWISPI1, Irqs, p.P0_06, p.P0_07, i2c_config);

    // Initialize touch controller
    let touch = TouchController::init(
        i2c,
        Input::new(p.P0_28, Pull::Up), // Touchpad external interrupt pin: P0.28/AIN4 (TP_INT)
        Output::new(p.P0_10, Level::High, OutputDrive::Standard), // Touchpad reset pin: P0.10/NFC2 (TP_RESET)
    );

    // Initialize SPI
    let mut spim_config = spim::Config::default();
    // Use SPI at 8MHz (the fastest clock available on the nRF52832),
    // otherwise refreshing will be super slow.
    spim_config.frequency = spim::Frequency::M8;
    // SPI must be used in mode 3. Mode 0 (the default) won't work.
    spim_config.mode = spim::MODE_3;
    let spim = spim::Spim::new(p.SPI2, Irqs, p.P0_02, p.P0_04, p.P0_03, spim_config);

    // Initialize LCD
    let mut display = unwrap!(Display::init(
        spim,
        Output::new(p.P0_25, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_18, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_26, Level::Low, OutputDrive::Standard),
    ));
    if display.clear(config::FACE_CONFIG.palette.background).is_err() {
        defmt::warn!("Failed to clear display");
    }

    // Initialize Bluetooth
    let sd = Softdevice::enable(&config::softdevice());
    let server = SERVER.init(unwrap!(Server::new(sd)));
    let sd: &'static Softdevice = sd;

    // Wall clock starts at build time until the phone sets it
    let clock = WallClock::new(TimeReference::at_boot(UTC_EPOCH_MS));
    let face = Engine::new(config::FACE_CONFIG, BleLink::new(), SoftdeviceRng::new(sd));

    defmt::info!("Initialization finished");

    // Schedule tasks
    unwrap!(spawner.spawn(bluetooth::softdevice_task(sd)));
    unwrap!(spawner.spawn(bluetooth::link_task(sd, server)));
    unwrap!(spawner.spawn(poll_button(button)));
    unwrap!(spawner.spawn(poll_touch(touch)));
    unwrap!(spawner.spawn(watchface::watchface_task(face, display, backlight, clock)));
}
