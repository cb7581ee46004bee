//! Display control module for PineTime

use display_interface_spi::SPIInterface;
use embassy_nrf::{
    gpio::Output,
    peripherals::{P0_18, P0_25, P0_26, SPI2},
    spim::Spim,
};
use embassy_time::Delay;
use embedded_graphics::{pixelcolor::Rgb565, prelude::*};
use mipidsi::{models::ST7789, Builder, Orientation};

const LCD_W: u16 = 240;
const LCD_H: u16 = 240;

/// ST7789 panel driven over SPIM2
pub type Lcd = mipidsi::Display<
    SPIInterface<Spim<'static, SPI2>, Output<'static, P0_18>, Output<'static, P0_25>>,
    ST7789,
    Output<'static, P0_26>,
>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Error {
    /// Panel did not accept the init sequence
    Init,
}

pub struct Display {
    lcd: Lcd,
}

impl Display {
    /// Configure display settings on boot
    pub fn init(
        spim: Spim<'static, SPI2>,
        cs_pin: Output<'static, P0_25>,
        dc_pin: Output<'static, P0_18>,
        rst_pin: Output<'static, P0_26>,
    ) -> Result<Self, Error> {
        let lcd = Builder::st7789(SPIInterface::new(spim, dc_pin, cs_pin))
            .with_display_size(LCD_W, LCD_H)
            .with_orientation(Orientation::Portrait(false))
            .init(&mut Delay, Some(rst_pin))
            .map_err(|_| Error::Init)?;

        Ok(Self { lcd })
    }

    /// Clear the display
    pub fn clear(&mut self, color: Rgb565) -> Result<(), mipidsi::Error> {
        self.lcd.clear(color)
    }

    /// Draw target covering the whole panel
    pub fn target(&mut self) -> &mut Lcd {
        &mut self.lcd
    }
}
