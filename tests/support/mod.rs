#![allow(dead_code)]

use core::{cell::RefCell, convert::Infallible};

use embedded_hal::{
    digital::OutputPin,
    spi::{Operation, SpiDevice},
};
use jpgband::{BlockRect, BlockSink, Decompressor, ImageHeader, JdrStatus, JpegInput, Scale};
use jpgband_core::decoder::WorkArea;

/// SOI, a four-byte stand-in header, EOI.
pub const IMAGE: [u8; 8] = [0xFF, 0xD8, 0x00, 0x04, 0x00, 0x00, 0xFF, 0xD9];

/// Decoder double: checks SOI, skips the header, then emits MCUs in raster
/// order. Every pixel of the MCU at `(left, top)` is `color_at(left, top)`.
pub struct StubDecoder {
    pub header: ImageHeader,
    pub mcu: u16,
    pub fail_prepare: Option<JdrStatus>,
    pub seen_scale: Option<Scale>,
}

impl StubDecoder {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            header: ImageHeader::new(width, height),
            mcu: 16,
            fail_prepare: None,
            seen_scale: None,
        }
    }
}

pub fn color_at(left: u16, top: u16) -> [u8; 3] {
    [(left as u8).wrapping_mul(8), (top as u8).wrapping_mul(8), 0x40]
}

impl Decompressor for StubDecoder {
    fn prepare<I: JpegInput>(
        &mut self,
        input: &mut I,
        _work: &mut WorkArea,
    ) -> Result<ImageHeader, JdrStatus> {
        let mut soi = [0u8; 2];
        if input.read(&mut soi) != 2 || soi != [0xFF, 0xD8] {
            return Err(JdrStatus::Format1);
        }
        if input.skip(4) != 4 {
            return Err(JdrStatus::Input);
        }
        match self.fail_prepare {
            Some(status) => Err(status),
            None => Ok(self.header),
        }
    }

    fn decompress<I: JpegInput, S: BlockSink>(
        &mut self,
        _input: &mut I,
        _work: &mut WorkArea,
        sink: &mut S,
        scale: Scale,
    ) -> Result<(), JdrStatus> {
        self.seen_scale = Some(scale);
        let image = self.header.scaled(scale);
        let step = (self.mcu >> scale.ordinal()).max(1);

        let mut top = 0u16;
        while top < image.height {
            let bottom = (top + step).min(image.height) - 1;
            let mut left = 0u16;
            while left < image.width {
                let right = (left + step).min(image.width) - 1;
                let rect = BlockRect::new(left, top, right, bottom);
                let rgb = color_at(left, top).repeat(rect.pixel_count());
                if !sink.put_block(rect, &rgb) {
                    return Err(JdrStatus::Interrupted);
                }
                left += step;
            }
            top += step;
        }
        Ok(())
    }
}

/// What a [`MockSpi`]/[`MockDc`] pair saw on the bus.
#[derive(Debug, Default)]
pub struct BusLog {
    pub commands: Vec<(u8, Vec<u8>)>,
    dc_high: bool,
}

impl BusLog {
    pub fn count(&self, cmd: u8) -> usize {
        self.commands.iter().filter(|(c, _)| *c == cmd).count()
    }
}

pub struct MockSpi<'a>(pub &'a RefCell<BusLog>);
pub struct MockDc<'a>(pub &'a RefCell<BusLog>);

impl embedded_hal::spi::ErrorType for MockSpi<'_> {
    type Error = Infallible;
}

impl SpiDevice<u8> for MockSpi<'_> {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        let mut log = self.0.borrow_mut();
        for op in operations {
            if let Operation::Write(bytes) = op {
                if log.dc_high {
                    if let Some((_, params)) = log.commands.last_mut() {
                        params.extend_from_slice(bytes);
                    }
                } else {
                    log.commands.push((bytes[0], Vec::new()));
                }
            }
        }
        Ok(())
    }
}

impl embedded_hal::digital::ErrorType for MockDc<'_> {
    type Error = Infallible;
}

impl OutputPin for MockDc<'_> {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().dc_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().dc_high = true;
        Ok(())
    }
}
