use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use iv_core::buffer::PixelBuffer;
use iv_core::error::{IvError, Result};
use iv_core::io::{Decoder, ReadProgress};
use iv_core::io::ser::SER_HEADER_SIZE;
use iv_core::spec::{ImageSpec, PixelType};

/// Build a SER file header with configurable bit depth and color mode.
///
/// `color_id`: 0=MONO, 100=RGB, 101=BGR
pub fn build_ser_header_full(
    width: u32,
    height: u32,
    bit_depth: u32,
    num_frames: usize,
    color_id: i32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);

    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&color_id.to_le_bytes());
    // LittleEndian = 0 (little-endian per Siril convention)
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    // Observer
    let mut observer = [0u8; 40];
    observer[..4].copy_from_slice(b"test");
    buf.extend_from_slice(&observer);
    // Instrument, Telescope
    buf.extend_from_slice(&[0u8; 40]);
    buf.extend_from_slice(&[0u8; 40]);
    // DateTime, DateTimeUTC
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());

    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Complete mono 8-bit SER file with the given frames.
pub fn build_ser_with_frames(width: u32, height: u32, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = build_ser_header_full(width, height, 8, frames.len(), 0);
    for frame in frames {
        buf.extend_from_slice(frame);
    }
    buf
}

/// Write bytes to a temporary file with the given suffix (".ser", ".png").
pub fn write_temp(data: &[u8], suffix: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    f.write_all(data).expect("write data");
    f.flush().expect("flush");
    f
}

pub fn write_test_ser(data: &[u8]) -> tempfile::NamedTempFile {
    write_temp(data, ".ser")
}

/// Save an RGB8 PNG whose pixel (x, y) is `f(x, y)`.
pub fn write_rgb_png(
    width: u32,
    height: u32,
    f: impl Fn(u32, u32) -> [u8; 3],
) -> tempfile::NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("create temp file");
    let img = image::RgbImage::from_fn(width, height, |x, y| image::Rgb(f(x, y)));
    img.save(file.path()).expect("save png");
    file
}

/// One-channel u8 buffer with pixel (x, y) = `f(x, y)`.
pub fn gray_u8(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> PixelBuffer {
    let spec = ImageSpec::new(width, height, 1, PixelType::U8);
    let data = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| f(x, y))
        .collect();
    PixelBuffer::new(spec, 0, data).expect("valid buffer")
}

/// Three-channel u8 buffer with pixel (x, y) = `f(x, y)`.
pub fn rgb_u8(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> PixelBuffer {
    let spec = ImageSpec::new(width, height, 3, PixelType::U8);
    let mut data = Vec::with_capacity(spec.image_bytes());
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&f(x, y));
        }
    }
    PixelBuffer::new(spec, 0, data).expect("valid buffer")
}

/// Float RGB buffer from raw samples.
pub fn rgb_f32(width: u32, height: u32, samples: &[f32]) -> PixelBuffer {
    let spec = ImageSpec::new(width, height, 3, PixelType::F32);
    PixelBuffer::from_f32(spec, 0, samples).expect("valid buffer")
}

/// In-memory decoder that counts header opens and pixel reads.
#[derive(Default)]
pub struct MemoryDecoder {
    images: Mutex<HashMap<PathBuf, Vec<PixelBuffer>>>,
    opens: AtomicUsize,
    reads: AtomicUsize,
    fail_pixels: AtomicBool,
}

impl MemoryDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` with one buffer per subimage.
    pub fn insert(&self, path: impl Into<PathBuf>, frames: Vec<PixelBuffer>) {
        let total = frames.len();
        let frames = frames
            .into_iter()
            .enumerate()
            .map(|(i, frame)| {
                let mut spec = frame.spec().clone();
                spec.nsubimages = total;
                spec.format = "memory".into();
                PixelBuffer::new(spec, i, frame.data().to_vec()).expect("valid buffer")
            })
            .collect();
        self.images.lock().unwrap().insert(path.into(), frames);
    }

    /// Register a gray image whose subimage `i` is filled with `10 * i`.
    pub fn insert_gray(&self, path: impl Into<PathBuf>, width: u32, height: u32, subimages: usize) {
        let frames = (0..subimages)
            .map(|i| gray_u8(width, height, |_, _| (10 * i) as u8))
            .collect();
        self.insert(path, frames);
    }

    pub fn remove(&self, path: &Path) {
        self.images.lock().unwrap().remove(path);
    }

    pub fn set_fail_pixels(&self, fail: bool) {
        self.fail_pixels.store(fail, Ordering::SeqCst);
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

fn not_found(path: &Path) -> IvError {
    IvError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{} not found", path.display()),
    ))
}

impl Decoder for MemoryDecoder {
    fn open_spec(&self, path: &Path) -> Result<ImageSpec> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let images = self.images.lock().unwrap();
        let frames = images.get(path).ok_or_else(|| not_found(path))?;
        Ok(frames[0].spec().clone())
    }

    fn read_pixels(
        &self,
        path: &Path,
        subimage: usize,
        progress: &dyn ReadProgress,
    ) -> Result<PixelBuffer> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        progress.report(0.0);
        if self.fail_pixels.load(Ordering::SeqCst) {
            return Err(IvError::UnsupportedFormat("injected read failure".into()));
        }
        let images = self.images.lock().unwrap();
        let frames = images.get(path).ok_or_else(|| not_found(path))?;
        let frame = frames.get(subimage).ok_or(IvError::SubimageOutOfRange {
            index: subimage,
            total: frames.len(),
        })?;
        progress.report(1.0);
        Ok(frame.clone())
    }
}
