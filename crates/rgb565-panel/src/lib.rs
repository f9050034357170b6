#![cfg_attr(not(test), no_std)]

//! MIPI-DCS RGB565 SPI panel primitives (ST7789 / ILI9341 family).

mod framebuffer;
pub mod protocol;

#[cfg(feature = "embedded-graphics")]
mod graphics;

pub use framebuffer::FrameBuffer;

use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

/// Driver configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// Visible width in pixels.
    pub width: u16,
    /// Visible height in pixels.
    pub height: u16,
    /// Controller column of visible x = 0.
    pub x_offset: u16,
    /// Controller row of visible y = 0.
    pub y_offset: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 240,
            height: 320,
            x_offset: 0,
            y_offset: 0,
        }
    }
}

/// Driver errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Error<SpiErr, DcErr> {
    /// SPI transaction failed.
    Spi(SpiErr),
    /// Data/command pin operation failed.
    Dc(DcErr),
    /// Window outside the panel, or payload length does not match it.
    InvalidInput,
}

pub type DriverResult<SpiErr, DcErr> = Result<(), Error<SpiErr, DcErr>>;

/// RGB565 panel driver: SPI bus plus data/command select pin.
#[derive(Debug)]
pub struct Rgb565Panel<SPI, DC> {
    spi: SPI,
    dc: DC,
    config: Config,
}

impl<SPI, DC> Rgb565Panel<SPI, DC>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
{
    pub fn new(spi: SPI, dc: DC, config: Config) -> Self {
        Self { spi, dc, config }
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Releases owned bus and pin.
    pub fn release(self) -> (SPI, DC) {
        (self.spi, self.dc)
    }

    /// Reset, wake, 16-bit pixel format, display on.
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> DriverResult<SPI::Error, DC::Error> {
        self.command(protocol::SWRESET, &[])?;
        delay.delay_ms(150);
        self.command(protocol::SLPOUT, &[])?;
        delay.delay_ms(10);
        self.command(protocol::COLMOD, &[protocol::COLMOD_RGB565])?;
        self.command(protocol::DISPON, &[])
    }

    /// Sends one command byte followed by its parameters.
    pub fn command(&mut self, cmd: u8, params: &[u8]) -> DriverResult<SPI::Error, DC::Error> {
        self.dc.set_low().map_err(Error::Dc)?;
        self.spi.write(&[cmd]).map_err(Error::Spi)?;

        if params.is_empty() {
            return Ok(());
        }
        self.dc.set_high().map_err(Error::Dc)?;
        self.spi.write(params).map_err(Error::Spi)
    }

    /// Sets the inclusive address window in visible coordinates.
    pub fn set_window(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> DriverResult<SPI::Error, DC::Error> {
        if x1 >= self.config.width || y1 >= self.config.height {
            return Err(Error::InvalidInput);
        }

        let columns = protocol::build_address_packet(
            x0.saturating_add(self.config.x_offset),
            x1.saturating_add(self.config.x_offset),
        )
        .ok_or(Error::InvalidInput)?;
        let rows = protocol::build_address_packet(
            y0.saturating_add(self.config.y_offset),
            y1.saturating_add(self.config.y_offset),
        )
        .ok_or(Error::InvalidInput)?;

        self.command(protocol::CASET, &columns)?;
        self.command(protocol::RASET, &rows)
    }

    /// Writes big-endian RGB565 `data` into the inclusive window.
    pub fn write_window(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
        data: &[u8],
    ) -> DriverResult<SPI::Error, DC::Error> {
        if x1 < x0 || y1 < y0 {
            return Err(Error::InvalidInput);
        }
        if data.len() != protocol::window_bytes(x1 - x0 + 1, y1 - y0 + 1) {
            return Err(Error::InvalidInput);
        }

        self.set_window(x0, y0, x1, y1)?;
        self.command(protocol::RAMWR, data)
    }
}
