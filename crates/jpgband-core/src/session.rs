//! Decode session: opens the source, sizes the buffers, runs the decoder.
//!
//! Every resource of a session (work area, band buffer, file handle, writer
//! borrow) is owned by a local of [`JpegRenderer::draw`] and released by drop,
//! so each early return below is also a complete cleanup.

use log::{debug, info, warn};

use crate::{
    band::{BandAccumulator, BandLayout},
    decoder::{Decompressor, ImageHeader, Scale, WorkArea},
    error::{BufferKind, DecodeError, SourceStage},
    fs::{FileSystem, NoFileSystem},
    input::{BufferInput, FileInput, InputSource},
    rgb565::ByteOrder,
    writer::PixelWriter,
};

/// Default decoder scratch pool size in bytes.
pub const DEFAULT_WORK_BYTES: usize = 3800;
/// Default band height in image rows.
pub const DEFAULT_BAND_LINES: usize = 16;
/// Largest block TJpgDec emits: one 16x16 MCU at full scale.
pub const MAX_MCU_PIXELS: usize = 16 * 16;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RendererConfig {
    pub work_bytes: usize,
    pub band_lines: usize,
    pub max_block_pixels: usize,
    pub byte_order: ByteOrder,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            work_bytes: DEFAULT_WORK_BYTES,
            band_lines: DEFAULT_BAND_LINES,
            max_block_pixels: MAX_MCU_PIXELS,
            byte_order: ByteOrder::BigEndian,
        }
    }
}

/// Display position of the image's top-left pixel. May be negative.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
}

impl Placement {
    pub const ORIGIN: Self = Self::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Where the compressed image comes from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImageSource<'a> {
    /// Path handed to the session's [`FileSystem`].
    File(&'a str),
    /// Complete compressed image in memory.
    Buffer(&'a [u8]),
}

impl ImageSource<'_> {
    fn is_empty(&self) -> bool {
        match self {
            Self::File(path) => path.is_empty(),
            Self::Buffer(data) => data.is_empty(),
        }
    }
}

/// Outcome of one finished decode.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DecodeReport {
    /// Source image size.
    pub header: ImageHeader,
    /// Output size after scaling.
    pub scaled: ImageHeader,
    pub scale: Scale,
    pub bands_written: u32,
    /// Scaled pixels never flushed. Non-zero means the decoder's blocks did
    /// not cover the image.
    pub pixels_remaining: usize,
    /// Bands were completed but no writer was given.
    pub writer_missing: bool,
    /// A file read or seek failed during the run.
    pub input_failed: bool,
}

/// Drives one external decompressor through repeated decode sessions.
pub struct JpegRenderer<D> {
    decoder: D,
    config: RendererConfig,
}

impl<D> JpegRenderer<D>
where
    D: Decompressor,
{
    pub const fn new(decoder: D, config: RendererConfig) -> Self {
        Self { decoder, config }
    }

    pub const fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn decoder_mut(&mut self) -> &mut D {
        &mut self.decoder
    }

    pub fn into_decoder(self) -> D {
        self.decoder
    }

    /// Decodes `source` and streams it to `writer` band by band.
    ///
    /// An empty source is a no-op returning an empty report. With no writer
    /// the image is still decoded and the report says so.
    pub fn draw<F>(
        &mut self,
        fs: &mut F,
        source: ImageSource<'_>,
        placement: Placement,
        scale: Scale,
        writer: Option<&mut dyn PixelWriter>,
    ) -> Result<DecodeReport, DecodeError>
    where
        F: FileSystem,
    {
        if source.is_empty() {
            debug!("jpeg: empty source, nothing to draw");
            return Ok(DecodeReport::default());
        }

        let mut input = open_source(fs, source)?;
        let mut work = allocate_work(self.config.work_bytes)?;

        let header = self.decoder.prepare(&mut input, &mut work).map_err(|status| {
            warn!(
                "jpeg: prepare fail status={} kind={}",
                status.code(),
                status.name()
            );
            DecodeError::DecoderPrepare(status)
        })?;

        let scaled = header.scaled(scale);
        let layout = BandLayout {
            image: scaled,
            band_lines: self.config.band_lines,
            max_block_pixels: self.config.max_block_pixels,
            byte_order: self.config.byte_order,
            origin_x: placement.x,
            origin_y: placement.y,
        };
        let mut bands = BandAccumulator::allocate(layout, writer)?;

        let result = self
            .decoder
            .decompress(&mut input, &mut work, &mut bands, scale);

        let report = DecodeReport {
            header,
            scaled,
            scale,
            bands_written: bands.bands_written(),
            pixels_remaining: bands.image_remaining(),
            writer_missing: bands.writer_missing(),
            input_failed: input.io_failed(),
        };

        if let Err(status) = result {
            warn!(
                "jpeg: decompress fail status={} kind={} rejected={:?} bands={}",
                status.code(),
                status.name(),
                bands.rejected(),
                report.bands_written
            );
            return Err(DecodeError::DecoderRuntime {
                status,
                partial: report,
            });
        }

        if report.pixels_remaining != 0 {
            warn!(
                "jpeg: decode ended with pixels_remaining={} scaled={}x{}",
                report.pixels_remaining, scaled.width, scaled.height
            );
        }
        if report.input_failed {
            warn!("jpeg: input stream failed during decode");
        }
        info!(
            "jpeg: size={}x{} position={},{} scale={} bands={} work_bytes={}",
            header.width,
            header.height,
            placement.x,
            placement.y,
            scale.ordinal(),
            report.bands_written,
            work.len_bytes()
        );

        Ok(report)
    }

    /// [`JpegRenderer::draw`] for an in-memory image.
    pub fn draw_buffer(
        &mut self,
        data: &[u8],
        placement: Placement,
        scale: Scale,
        writer: Option<&mut dyn PixelWriter>,
    ) -> Result<DecodeReport, DecodeError> {
        self.draw(
            &mut NoFileSystem,
            ImageSource::Buffer(data),
            placement,
            scale,
            writer,
        )
    }

    /// Reads the image header without decoding pixels.
    ///
    /// Returns `Ok(None)` for an empty source.
    pub fn probe<F>(
        &mut self,
        fs: &mut F,
        source: ImageSource<'_>,
    ) -> Result<Option<ImageHeader>, DecodeError>
    where
        F: FileSystem,
    {
        if source.is_empty() {
            return Ok(None);
        }

        let mut input = open_source(fs, source)?;
        let mut work = allocate_work(self.config.work_bytes)?;
        let header = self.decoder.prepare(&mut input, &mut work).map_err(|status| {
            warn!(
                "jpeg: probe prepare fail status={} kind={}",
                status.code(),
                status.name()
            );
            DecodeError::DecoderPrepare(status)
        })?;

        debug!("jpeg: probe size={}x{}", header.width, header.height);
        Ok(Some(header))
    }
}

fn open_source<'a, F>(
    fs: &mut F,
    source: ImageSource<'a>,
) -> Result<InputSource<'a, F::File>, DecodeError>
where
    F: FileSystem,
{
    match source {
        ImageSource::Buffer(data) => Ok(InputSource::Buffer(BufferInput::new(data))),
        ImageSource::File(path) => {
            let size = fs.stat(path).map_err(|err| {
                warn!("jpeg: file error path={} err={:?}", path, err);
                DecodeError::SourceUnavailable(SourceStage::Stat)
            })?;
            let file = fs.open(path).map_err(|err| {
                warn!("jpeg: error opening file path={} err={:?}", path, err);
                DecodeError::SourceUnavailable(SourceStage::Open)
            })?;
            debug!("jpeg: opened path={} size={}", path, size);
            Ok(InputSource::File(FileInput::new(file)))
        }
    }
}

fn allocate_work(bytes: usize) -> Result<WorkArea, DecodeError> {
    WorkArea::allocate(bytes).ok_or_else(|| {
        warn!("jpeg: work buffer alloc failed bytes={}", bytes);
        DecodeError::AllocationFailure(BufferKind::Work)
    })
}
