#[allow(dead_code)]
mod common;

use iv_core::channel::ChannelView;
use iv_core::consts::OUTSIDE_COLOR;
use iv_core::display::DisplaySettings;
use iv_core::image::{DisplayFrame, ImageRecord};
use iv_core::render::cpu::{render_view, CpuBackend};
use iv_core::render::{create_backend, DevicePreference, DisplayBackend};
use iv_core::viewport::{ViewGeometry, Viewport};

use common::MemoryDecoder;

fn frame_of(buffer: iv_core::buffer::PixelBuffer) -> DisplayFrame {
    let decoder = MemoryDecoder::new();
    decoder.insert("frame", vec![buffer]);
    let mut record = ImageRecord::new("frame");
    record.read(&decoder, 0, false, &|_: f32| {}).unwrap();
    record.display_frame().unwrap()
}

fn checker() -> DisplayFrame {
    frame_of(common::rgb_u8(2, 2, |x, y| [(x * 100) as u8, (y * 100) as u8, 50]))
}

#[test]
fn test_identity_render_reproduces_pixels() {
    let frame = checker();
    let view = ViewGeometry::actual_size(2, 2);
    let out = CpuBackend
        .render(&frame, &DisplaySettings::default(), &view)
        .unwrap();
    assert_eq!(out.dimensions(), (2, 2));
    assert_eq!(out.get_pixel(0, 0).0, [0, 0, 50, 255]);
    assert_eq!(out.get_pixel(1, 0).0, [100, 0, 50, 255]);
    assert_eq!(out.get_pixel(1, 1).0, [100, 100, 50, 255]);
}

#[test]
fn test_outside_pixels_use_background() {
    let frame = checker();
    let view = ViewGeometry {
        window_width: 4,
        window_height: 2,
        zoom: 1.0,
        center_x: 1.0,
        center_y: 1.0,
    };
    let out = render_view(&frame.pixels, &DisplaySettings::default(), &view);
    assert_eq!(out.get_pixel(0, 0).0, OUTSIDE_COLOR);
    assert_eq!(out.get_pixel(3, 1).0, OUTSIDE_COLOR);
    assert_eq!(out.get_pixel(1, 0).0, [0, 0, 50, 255]);
    assert_eq!(out.get_pixel(2, 1).0, [100, 100, 50, 255]);
}

#[test]
fn test_zoom_two_replicates_pixels() {
    let frame = checker();
    let mut viewport = Viewport::default();
    viewport.set_image(2, 2);
    viewport.set_zoom(2.0);
    let out = render_view(&frame.pixels, &DisplaySettings::default(), &viewport.geometry(4, 4));
    for (x, y) in [(2, 0), (3, 0), (2, 1), (3, 1)] {
        assert_eq!(out.get_pixel(x, y).0, [100, 0, 50, 255]);
    }
}

#[test]
fn test_exposure_and_channel_selection() {
    let frame = frame_of(common::rgb_u8(1, 1, |_, _| [64, 32, 16]));
    let view = ViewGeometry::actual_size(1, 1);

    let brighter = DisplaySettings {
        exposure: 1.0,
        ..DisplaySettings::default()
    };
    assert_eq!(render_view(&frame.pixels, &brighter, &view).get_pixel(0, 0).0, [128, 64, 32, 255]);

    let red = DisplaySettings {
        channel: ChannelView::RED,
        ..DisplaySettings::default()
    };
    assert_eq!(render_view(&frame.pixels, &red, &view).get_pixel(0, 0).0, [64, 64, 64, 255]);

    let lum = DisplaySettings {
        channel: ChannelView::Luminance,
        ..DisplaySettings::default()
    };
    let y = (0.2126f32 * 64.0 + 0.7152 * 32.0 + 0.0722 * 16.0).round() as u8;
    let px = render_view(&frame.pixels, &lum, &view).get_pixel(0, 0).0;
    assert_eq!(px, [y, y, y, 255]);
}

#[test]
fn test_float_hdr_values_clamp() {
    let frame = frame_of(common::rgb_f32(1, 1, &[4.0, f32::NAN, -1.0]));
    let out = render_view(
        &frame.pixels,
        &DisplaySettings::default(),
        &ViewGeometry::actual_size(1, 1),
    );
    assert_eq!(out.get_pixel(0, 0).0, [255, 0, 0, 255]);
}

#[test]
fn test_large_view_renders_uniformly() {
    let frame = frame_of(common::gray_u8(8, 8, |_, _| 200));
    let mut viewport = Viewport::default();
    viewport.set_image(8, 8);
    viewport.fit_to_window(512, 512);
    let out = render_view(&frame.pixels, &DisplaySettings::default(), &viewport.geometry(512, 512));
    assert!(out.pixels().all(|p| p.0 == [200, 200, 200, 255]));
}

#[test]
fn test_empty_window() {
    let frame = checker();
    let mut view = ViewGeometry::actual_size(2, 2);
    view.window_width = 0;
    let out = render_view(&frame.pixels, &DisplaySettings::default(), &view);
    assert_eq!(out.dimensions(), (0, 2));
}

#[test]
fn test_cpu_preference_gives_host_backend() {
    let mut backend = create_backend(DevicePreference::Cpu);
    assert!(!backend.is_gpu());
    assert_eq!(backend.name(), "CPU/Rayon");

    let frame = checker();
    let out = backend
        .render(&frame, &DisplaySettings::default(), &ViewGeometry::actual_size(2, 2))
        .unwrap();
    assert_eq!(out.get_pixel(1, 1).0, [100, 100, 50, 255]);
    // Host backend holds no device state; release is a no-op.
    backend.release();
    assert!(backend
        .render(&frame, &DisplaySettings::default(), &ViewGeometry::actual_size(2, 2))
        .is_ok());
}
