//! Memory-mapped reader for SER planetary video files. Each frame of the
//! video is exposed as one subimage.

use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;

use crate::buffer::PixelBuffer;
use crate::consts::PROGRESS_SCANLINE_STRIDE;
use crate::error::{IvError, Result};
use crate::spec::{ImageSpec, PixelType};

use super::decoder::ReadProgress;

pub const SER_HEADER_SIZE: usize = 178;
const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

const COLOR_ID_RGB: i32 = 100;
const COLOR_ID_BGR: i32 = 101;

/// SER file header (178 bytes).
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
    pub observer: String,
    pub instrument: String,
    pub telescope: String,
}

impl SerHeader {
    /// Bytes per sample (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_sample(&self) -> usize {
        if self.pixel_depth <= 8 { 1 } else { 2 }
    }

    /// Samples per pixel (1 for mono/bayer, 3 for RGB/BGR).
    pub fn planes_per_pixel(&self) -> usize {
        match self.color_id {
            COLOR_ID_RGB | COLOR_ID_BGR => 3,
            _ => 1,
        }
    }

    /// Bytes of one frame, `None` when the header's dimensions overflow.
    pub fn frame_byte_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.bytes_per_sample())?
            .checked_mul(self.planes_per_pixel())
    }

    fn color_name(&self) -> &'static str {
        match self.color_id {
            0 => "mono",
            8 => "bayer RGGB",
            9 => "bayer GRBG",
            10 => "bayer GBRG",
            11 => "bayer BGGR",
            COLOR_ID_RGB => "RGB",
            COLOR_ID_BGR => "BGR",
            _ => "unknown",
        }
    }
}

pub struct SerReader {
    mmap: Mmap,
    pub header: SerHeader,
}

impl SerReader {
    /// Open a SER file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(IvError::InvalidSer("File too small for SER header".into()));
        }
        if &mmap[0..14] != SER_MAGIC {
            return Err(IvError::InvalidSer("Missing LUCAM-RECORDER magic".into()));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;
        if header.frame_count == 0 {
            return Err(IvError::InvalidSer("File contains no frames".into()));
        }
        let expected = header
            .frame_byte_size()
            .and_then(|size| size.checked_mul(header.frame_count as usize))
            .and_then(|bytes| bytes.checked_add(SER_HEADER_SIZE))
            .ok_or_else(|| {
                IvError::InvalidSer(format!(
                    "Frame size overflows: {}x{}, {} frames",
                    header.width, header.height, header.frame_count
                ))
            })?;
        if mmap.len() < expected {
            return Err(IvError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected,
                mmap.len()
            )));
        }

        Ok(Self { mmap, header })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    pub fn spec(&self) -> ImageSpec {
        let h = &self.header;
        let pixel_type = if h.bytes_per_sample() == 1 {
            PixelType::U8
        } else {
            PixelType::U16
        };
        let mut spec = ImageSpec::new(h.width, h.height, h.planes_per_pixel(), pixel_type);
        spec.nsubimages = self.frame_count();
        spec.format = "ser".to_string();
        spec.attributes.push(("Color".into(), h.color_name().into()));
        spec.attributes.push(("BitDepth".into(), h.pixel_depth.to_string()));
        for (name, value) in [
            ("Observer", &h.observer),
            ("Instrument", &h.instrument),
            ("Telescope", &h.telescope),
        ] {
            if !value.is_empty() {
                spec.attributes.push((name.into(), value.clone()));
            }
        }
        spec
    }

    fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let total = self.frame_count();
        if index >= total {
            return Err(IvError::SubimageOutOfRange { index, total });
        }
        let size = self
            .header
            .frame_byte_size()
            .ok_or_else(|| IvError::InvalidSer("Frame size overflows".into()))?;
        let offset = SER_HEADER_SIZE + index * size;
        self.mmap
            .get(offset..offset + size)
            .ok_or_else(|| IvError::InvalidSer(format!("Frame {index} lies past the end of the file")))
    }

    /// Decode one frame into native-endian samples. Samples narrower than 16
    /// bits are rescaled to the full u16 range, BGR frames are reordered to RGB.
    pub fn read_subimage(&self, index: usize, progress: &dyn ReadProgress) -> Result<PixelBuffer> {
        let raw = self.frame_raw(index)?;
        let spec = self.spec();
        let h = &self.header;
        let planes = h.planes_per_pixel();
        let bps = h.bytes_per_sample();
        let row_samples = h.width as usize * planes;
        let max_val = ((1u32 << h.pixel_depth) - 1) as f32;
        let swap_bgr = h.color_id == COLOR_ID_BGR;

        let mut data = Vec::with_capacity(spec.image_bytes());
        for row in 0..h.height as usize {
            if row % PROGRESS_SCANLINE_STRIDE == 0 {
                progress.report(row as f32 / h.height as f32);
            }
            let line = &raw[row * row_samples * bps..(row + 1) * row_samples * bps];
            for px in line.chunks_exact(planes * bps) {
                for plane in 0..planes {
                    let src = if swap_bgr { planes - 1 - plane } else { plane };
                    let s = &px[src * bps..(src + 1) * bps];
                    if bps == 1 {
                        data.push(s[0]);
                    } else {
                        let v = if h.little_endian {
                            u16::from_le_bytes([s[0], s[1]])
                        } else {
                            u16::from_be_bytes([s[0], s[1]])
                        };
                        let scaled = if h.pixel_depth == 16 {
                            v
                        } else {
                            ((v as f32 / max_val).min(1.0) * 65535.0).round() as u16
                        };
                        data.extend_from_slice(&scaled.to_ne_bytes());
                    }
                }
            }
        }
        progress.report(1.0);
        PixelBuffer::new(spec, index, data)
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]); // skip magic

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()?;
    let height = cursor.read_i32::<LittleEndian>()?;
    let pixel_depth = cursor.read_i32::<LittleEndian>()?;
    let frame_count = cursor.read_i32::<LittleEndian>()?;

    let observer = read_fixed_string(&buf[42..82]);
    let instrument = read_fixed_string(&buf[82..122]);
    let telescope = read_fixed_string(&buf[122..162]);

    if width <= 0 || height <= 0 {
        return Err(IvError::InvalidSer(format!(
            "Invalid frame dimensions {width}x{height}"
        )));
    }
    if frame_count < 0 {
        return Err(IvError::InvalidSer(format!("Negative frame count {frame_count}")));
    }
    if !(1..=16).contains(&pixel_depth) {
        return Err(IvError::InvalidSer(format!("Unsupported pixel depth {pixel_depth}")));
    }

    // Follow Siril's convention: a LittleEndian field of 0 still means
    // little-endian samples, as most capture software writes it that way.
    let little_endian = le_flag != 1;

    Ok(SerHeader {
        color_id,
        little_endian,
        width: width as u32,
        height: height as u32,
        pixel_depth: pixel_depth as u32,
        frame_count: frame_count as u32,
        observer,
        instrument,
        telescope,
    })
}

fn read_fixed_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}
