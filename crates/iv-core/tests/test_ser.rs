#[allow(dead_code)]
mod common;

use std::sync::Mutex;

use iv_core::error::IvError;
use iv_core::image::ImageRecord;
use iv_core::io::ser::SerReader;
use iv_core::io::{Decoder, FileDecoder};
use iv_core::spec::PixelType;

fn no_progress(_: f32) {}

fn mono_frames(width: u32, height: u32, count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            (0..height)
                .flat_map(|_| (0..width).map(move |x| (i * 50) as u8 + x as u8))
                .collect()
        })
        .collect()
}

#[test]
fn test_ser_spec_lists_frames_as_subimages() {
    let data = common::build_ser_with_frames(4, 2, &mono_frames(4, 2, 3));
    let file = common::write_test_ser(&data);

    let spec = FileDecoder.open_spec(file.path()).unwrap();
    assert_eq!((spec.width, spec.height), (4, 2));
    assert_eq!(spec.nchannels, 1);
    assert_eq!(spec.pixel_type, PixelType::U8);
    assert_eq!(spec.nsubimages, 3);
    assert_eq!(spec.format, "ser");
    assert!(spec
        .attributes
        .iter()
        .any(|(k, v)| k == "Observer" && v == "test"));
}

#[test]
fn test_ser_reads_requested_frame() {
    let data = common::build_ser_with_frames(4, 2, &mono_frames(4, 2, 3));
    let file = common::write_test_ser(&data);

    let buffer = FileDecoder.read_pixels(file.path(), 2, &no_progress).unwrap();
    assert_eq!(buffer.subimage(), 2);
    assert_eq!(buffer.pixel(1, 0), &[101]);
    assert_eq!(buffer.pixel(3, 1), &[103]);

    let err = FileDecoder.read_pixels(file.path(), 3, &no_progress).unwrap_err();
    assert!(matches!(err, IvError::SubimageOutOfRange { index: 3, total: 3 }));
}

#[test]
fn test_ser_12_bit_rescaled_to_u16() {
    let mut data = common::build_ser_header_full(2, 1, 12, 1, 0);
    for v in [4095u16, 0] {
        data.extend_from_slice(&v.to_le_bytes());
    }
    let file = common::write_test_ser(&data);

    let reader = SerReader::open(file.path()).unwrap();
    assert_eq!(reader.spec().pixel_type, PixelType::U16);
    let buffer = reader.read_subimage(0, &no_progress).unwrap();
    assert_eq!(buffer.sample(0, 0, 0), 1.0);
    assert_eq!(buffer.sample(1, 0, 0), 0.0);
}

#[test]
fn test_ser_bgr_reordered_to_rgb() {
    let mut data = common::build_ser_header_full(1, 1, 8, 1, 101);
    data.extend_from_slice(&[10, 20, 30]);
    let file = common::write_test_ser(&data);

    let buffer = FileDecoder.read_pixels(file.path(), 0, &no_progress).unwrap();
    assert_eq!(buffer.nchannels(), 3);
    assert_eq!(buffer.pixel(0, 0), &[30, 20, 10]);
}

#[test]
fn test_ser_rejects_bad_files() {
    let mut truncated = common::build_ser_header_full(4, 4, 8, 2, 0);
    truncated.extend_from_slice(&[0u8; 20]);
    let file = common::write_test_ser(&truncated);
    assert!(matches!(
        FileDecoder.open_spec(file.path()),
        Err(IvError::InvalidSer(_))
    ));

    let mut bad_magic = common::build_ser_with_frames(1, 1, &[vec![0]]);
    bad_magic[0] = b'X';
    let file = common::write_test_ser(&bad_magic);
    assert!(matches!(
        SerReader::open(file.path()),
        Err(IvError::InvalidSer(_))
    ));

    let empty = common::build_ser_header_full(4, 4, 8, 0, 0);
    let file = common::write_test_ser(&empty);
    assert!(SerReader::open(file.path()).is_err());

    // Width and height of -1 on disk.
    let negative = common::build_ser_header_full(u32::MAX, u32::MAX, 16, 1, 100);
    let file = common::write_test_ser(&negative);
    assert!(matches!(
        SerReader::open(file.path()),
        Err(IvError::InvalidSer(_))
    ));
    let mut record = ImageRecord::new(file.path());
    assert!(record.init_spec(&FileDecoder).is_err());
    assert!(record.is_broken());

    let huge = common::build_ser_header_full(65_536, 65_536, 16, i32::MAX as usize, 100);
    let file = common::write_test_ser(&huge);
    assert!(matches!(
        FileDecoder.open_spec(file.path()),
        Err(IvError::InvalidSer(_))
    ));

    let deep = common::build_ser_header_full(4, 4, 17, 1, 0);
    let file = common::write_test_ser(&deep);
    assert!(matches!(
        SerReader::open(file.path()),
        Err(IvError::InvalidSer(_))
    ));
}

#[test]
fn test_ser_read_reports_progress() {
    let data = common::build_ser_with_frames(2, 200, &[vec![7u8; 400]]);
    let file = common::write_test_ser(&data);

    let seen = Mutex::new(Vec::new());
    let record = |done: f32| seen.lock().unwrap().push(done);
    FileDecoder.read_pixels(file.path(), 0, &record).unwrap();

    let seen = seen.into_inner().unwrap();
    assert!(seen.len() >= 2);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert!(seen.iter().all(|d| (0.0..=1.0).contains(d)));
    assert_eq!(*seen.last().unwrap(), 1.0);
}
