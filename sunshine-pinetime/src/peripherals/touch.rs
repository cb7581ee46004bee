//! Touch controler module for PineTime

use cst816s::{TouchGesture, CST816S};
use embassy_nrf::{
    gpio::{Input, Output},
    peripherals::{P0_10, P0_28, TWISPI1},
    twim::Twim,
};
use embassy_time::Delay;
use sunshine_face::TapType;

type Touchpad = CST816S<Twim<'static, TWISPI1>, Input<'static, P0_28>, Output<'static, P0_10>>;

pub struct TouchController {
    /// Touchpad instance
    touchpad: Touchpad,
}

impl TouchController {
    /// Configure touch controller on boot
    pub fn init(
        twi: Twim<'static, TWISPI1>,
        interrupt_pin: Input<'static, P0_28>,
        reset_pin: Output<'static, P0_10>,
    ) -> Self {
        let mut touchpad = CST816S::new(twi, interrupt_pin, reset_pin);
        if touchpad.setup(&mut Delay).is_err() {
            defmt::warn!("Touch controller setup failed");
        }
        Self { touchpad }
    }

    /// Check for new touch event
    pub fn try_event_detected(&mut self) -> Option<TapType> {
        self.touchpad
            .read_one_touch_event(true)
            .map(|event| tap_type(event.gesture))
    }
}

/// Only a single click counts as a tap
fn tap_type(gesture: TouchGesture) -> TapType {
    match gesture {
        TouchGesture::SingleClick => TapType::Tap,
        _ => TapType::Touch,
    }
}
