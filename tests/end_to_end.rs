mod support;

use core::cell::RefCell;
use std::io::Write as _;

use jpgband::{
    ByteOrder, DecodeError, FrameBuffer, FrameSink, ImageHeader, ImageSource, JdrStatus,
    JpegRenderer, PanelSink, Placement, RendererConfig, Rgb565Panel, Scale, SourceStage,
    StdFileSystem,
    panel::{Config, protocol},
    to_rgb565,
};
use support::{BusLog, IMAGE, MockDc, MockSpi, StubDecoder, color_at};

fn rgb565_at(left: u16, top: u16) -> u16 {
    let [r, g, b] = color_at(left, top);
    to_rgb565(r, g, b)
}

#[test]
fn negative_placement_is_clipped_into_framebuffer() {
    let mut backing = [0u16; 24 * 24];
    let frame = FrameBuffer::new(&mut backing, 24, 24).unwrap();
    let mut sink = FrameSink::new(frame, ByteOrder::BigEndian);
    let mut renderer = JpegRenderer::new(StubDecoder::new(32, 32), RendererConfig::default());

    let report = renderer
        .draw_buffer(&IMAGE, Placement::new(-8, -8), Scale::Full, Some(&mut sink))
        .unwrap();

    assert_eq!(report.bands_written, 2);
    assert_eq!(sink.pixels_written(), 24 * 24);

    let frame = sink.frame();
    assert_eq!(frame.pixel(0, 0), Some(rgb565_at(0, 0)));
    assert_eq!(frame.pixel(8, 0), Some(rgb565_at(16, 0)));
    assert_eq!(frame.pixel(0, 8), Some(rgb565_at(0, 16)));
    assert_eq!(frame.pixel(23, 23), Some(rgb565_at(16, 16)));
}

#[test]
fn image_file_decodes_through_std_file_system() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&IMAGE).unwrap();
    let path = file.path().to_str().unwrap().to_owned();

    let mut backing = [0u16; 16 * 16];
    let frame = FrameBuffer::new(&mut backing, 16, 16).unwrap();
    let mut sink = FrameSink::new(frame, ByteOrder::BigEndian);
    let mut renderer = JpegRenderer::new(StubDecoder::new(16, 16), RendererConfig::default());

    let report = renderer
        .draw(
            &mut StdFileSystem,
            ImageSource::File(&path),
            Placement::ORIGIN,
            Scale::Full,
            Some(&mut sink),
        )
        .unwrap();

    assert!(!report.input_failed);
    assert_eq!(report.header, ImageHeader::new(16, 16));
    let expected = rgb565_at(0, 0);
    assert!(sink.frame().pixels().iter().all(|&px| px == expected));
}

#[test]
fn little_endian_bands_land_unswapped_in_framebuffer() {
    let mut backing = [0u16; 16 * 16];
    let frame = FrameBuffer::new(&mut backing, 16, 16).unwrap();
    let mut sink = FrameSink::new(frame, ByteOrder::LittleEndian);
    let config = RendererConfig {
        byte_order: ByteOrder::LittleEndian,
        ..RendererConfig::default()
    };
    let mut renderer = JpegRenderer::new(StubDecoder::new(16, 16), config);

    renderer
        .draw_buffer(&IMAGE, Placement::ORIGIN, Scale::Full, Some(&mut sink))
        .unwrap();

    let expected = rgb565_at(0, 0);
    assert_ne!(expected.swap_bytes(), expected);
    assert_eq!(sink.frame().pixel(0, 0), Some(expected));
    assert_eq!(sink.frame().pixel(15, 15), Some(expected));
}

#[test]
fn missing_image_file_is_source_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.jpg");
    let mut renderer = JpegRenderer::new(StubDecoder::new(16, 16), RendererConfig::default());

    let mut calls = 0u32;
    let mut count = |_: jpgband::Window, _: &[u8]| calls += 1;
    let result = renderer.draw(
        &mut StdFileSystem,
        ImageSource::File(path.to_str().unwrap()),
        Placement::ORIGIN,
        Scale::Full,
        Some(&mut count),
    );

    assert_eq!(
        result,
        Err(DecodeError::SourceUnavailable(SourceStage::Stat))
    );
    assert_eq!(calls, 0);
}

#[test]
fn probe_reads_dimensions_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&IMAGE).unwrap();
    let path = file.path().to_str().unwrap().to_owned();
    let mut renderer = JpegRenderer::new(StubDecoder::new(320, 240), RendererConfig::default());

    let header = renderer
        .probe(&mut StdFileSystem, ImageSource::File(&path))
        .unwrap();

    assert_eq!(header, Some(ImageHeader::new(320, 240)));
}

#[test]
fn visible_band_goes_out_as_one_ramwr_burst() {
    let bus = RefCell::new(BusLog::default());
    let config = Config {
        width: 16,
        height: 16,
        x_offset: 0,
        y_offset: 0,
    };
    let mut panel = Rgb565Panel::new(MockSpi(&bus), MockDc(&bus), config);
    let mut sink = PanelSink::new(&mut panel);
    let mut renderer = JpegRenderer::new(StubDecoder::new(16, 16), RendererConfig::default());

    renderer
        .draw_buffer(&IMAGE, Placement::ORIGIN, Scale::Full, Some(&mut sink))
        .unwrap();
    assert_eq!(sink.failures(), 0);

    let log = bus.borrow();
    assert_eq!(log.count(protocol::RAMWR), 1);
    let (_, payload) = log
        .commands
        .iter()
        .find(|(cmd, _)| *cmd == protocol::RAMWR)
        .unwrap();
    assert_eq!(payload.len(), 512);
    assert_eq!(&payload[..2], &rgb565_at(0, 0).to_be_bytes());
}

#[test]
fn band_below_panel_edge_is_sent_row_by_row() {
    let bus = RefCell::new(BusLog::default());
    let config = Config {
        width: 16,
        height: 16,
        x_offset: 0,
        y_offset: 0,
    };
    let mut panel = Rgb565Panel::new(MockSpi(&bus), MockDc(&bus), config);
    let mut sink = PanelSink::new(&mut panel);
    let mut renderer = JpegRenderer::new(StubDecoder::new(16, 32), RendererConfig::default());

    let report = renderer
        .draw_buffer(&IMAGE, Placement::new(0, 8), Scale::Full, Some(&mut sink))
        .unwrap();
    assert_eq!(report.bands_written, 2);
    assert_eq!(sink.failures(), 0);

    let log = bus.borrow();
    assert_eq!(log.count(protocol::RAMWR), 8);
    let first_rows = log
        .commands
        .iter()
        .find(|(cmd, _)| *cmd == protocol::RASET)
        .map(|(_, rows)| rows.clone());
    assert_eq!(first_rows, Some(vec![0, 8, 0, 8]));
}

#[test]
fn out_of_range_scale_renders_at_one_eighth() {
    let mut backing = [0u16; 4];
    let frame = FrameBuffer::new(&mut backing, 2, 2).unwrap();
    let mut sink = FrameSink::new(frame, ByteOrder::BigEndian);
    let mut renderer = JpegRenderer::new(StubDecoder::new(16, 16), RendererConfig::default());

    let report = renderer
        .draw_buffer(&IMAGE, Placement::ORIGIN, Scale::from(9), Some(&mut sink))
        .unwrap();

    assert_eq!(report.scale, Scale::Eighth);
    assert_eq!(report.scaled, ImageHeader::new(2, 2));
    assert_eq!(sink.pixels_written(), 4);
    assert_eq!(renderer.into_decoder().seen_scale, Some(Scale::Eighth));
}

#[test]
fn unsupported_image_leaves_framebuffer_untouched() {
    let mut backing = [0u16; 16 * 16];
    let frame = FrameBuffer::new(&mut backing, 16, 16).unwrap();
    let mut sink = FrameSink::new(frame, ByteOrder::BigEndian);
    let mut decoder = StubDecoder::new(16, 16);
    decoder.fail_prepare = Some(JdrStatus::Format3);
    let mut renderer = JpegRenderer::new(decoder, RendererConfig::default());

    let result = renderer.draw_buffer(&IMAGE, Placement::ORIGIN, Scale::Full, Some(&mut sink));

    assert_eq!(result, Err(DecodeError::DecoderPrepare(JdrStatus::Format3)));
    assert_eq!(sink.pixels_written(), 0);
    assert!(sink.frame().pixels().iter().all(|&px| px == 0));
}
