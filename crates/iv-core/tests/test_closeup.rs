#[allow(dead_code)]
mod common;

use approx::assert_relative_eq;

use iv_core::closeup::Closeup;
use iv_core::image::{DisplayFrame, ImageRecord};

use common::MemoryDecoder;

fn ramp() -> DisplayFrame {
    let decoder = MemoryDecoder::new();
    decoder.insert("ramp", vec![common::gray_u8(5, 5, |x, y| (x + 10 * y) as u8)]);
    let mut record = ImageRecord::new("ramp");
    record.read(&decoder, 0, false, &|_: f32| {}).unwrap();
    record.frame().unwrap()
}

#[test]
fn test_closeup_interior() {
    let frame = ramp();
    let closeup = Closeup::sample(&frame, 2, 2, 3).unwrap();
    assert_eq!(closeup.size, 3);
    assert_eq!(closeup.center(), 1);
    assert_eq!(closeup.focus_u8, vec![22]);
    assert_relative_eq!(closeup.focus_f32[0], 22.0 / 255.0);
    assert!(closeup.present.iter().all(|&p| p));
    assert_relative_eq!(closeup.cell(0, 0).unwrap()[0], 11.0 / 255.0);
    assert_relative_eq!(closeup.cell(2, 2).unwrap()[0], 33.0 / 255.0);
    assert_eq!(closeup.channel_names, vec!["Y".to_string()]);
}

#[test]
fn test_closeup_at_corner_marks_absent_cells() {
    let frame = ramp();
    let closeup = Closeup::sample(&frame, 0, 0, 4).unwrap();
    // Even sizes round up.
    assert_eq!(closeup.size, 5);
    assert_eq!(closeup.present.iter().filter(|&&p| p).count(), 9);
    assert!(closeup.cell(0, 0).is_none());
    assert!(closeup.cell(1, 4).is_none());
    assert_relative_eq!(closeup.cell(2, 2).unwrap()[0], 0.0);
    assert_relative_eq!(closeup.cell(4, 3).unwrap()[0], 21.0 / 255.0);
    assert!(closeup.cell(9, 9).is_none());
}

#[test]
fn test_closeup_outside_image() {
    let frame = ramp();
    assert!(Closeup::sample(&frame, 5, 0, 3).is_none());
    assert!(Closeup::sample(&frame, 0, 7, 3).is_none());
}
