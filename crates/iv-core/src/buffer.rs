//! Scanline-organized pixel storage for one subimage.
//!
//! Samples are kept in their native numeric type and native byte order. The
//! address accessors do no bounds checking of their own: callers must check
//! residency and coordinates first, an out-of-range coordinate is a contract
//! violation and panics on the slice index.

use num_traits::{PrimInt, ToPrimitive};

use crate::error::{IvError, Result};
use crate::spec::{ImageSpec, PixelType};

#[derive(Clone, Debug)]
pub struct PixelBuffer {
    spec: ImageSpec,
    subimage: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap decoded bytes. The length must match `spec` exactly.
    pub fn new(spec: ImageSpec, subimage: usize, data: Vec<u8>) -> Result<Self> {
        if spec.width == 0 || spec.height == 0 {
            return Err(IvError::InvalidDimensions {
                width: spec.width,
                height: spec.height,
            });
        }
        if spec.nchannels == 0 {
            return Err(IvError::UnsupportedFormat("image has no channels".into()));
        }
        if data.len() != spec.image_bytes() {
            return Err(IvError::UnsupportedFormat(format!(
                "pixel data is {} bytes, expected {} for {}x{}x{} {}",
                data.len(),
                spec.image_bytes(),
                spec.width,
                spec.height,
                spec.nchannels,
                spec.pixel_type
            )));
        }
        Ok(Self {
            spec,
            subimage,
            data,
        })
    }

    /// Build a buffer from normalized-or-native f32 samples, converting to the
    /// spec's pixel type.
    pub fn from_f32(spec: ImageSpec, subimage: usize, samples: &[f32]) -> Result<Self> {
        let mut data = Vec::with_capacity(spec.image_bytes());
        for &v in samples {
            match spec.pixel_type {
                PixelType::U8 => data.push((v.clamp(0.0, 1.0) * 255.0).round() as u8),
                PixelType::U16 => data
                    .extend_from_slice(&((v.clamp(0.0, 1.0) * 65535.0).round() as u16).to_ne_bytes()),
                PixelType::F32 => data.extend_from_slice(&v.to_ne_bytes()),
            }
        }
        Self::new(spec, subimage, data)
    }

    pub fn spec(&self) -> &ImageSpec {
        &self.spec
    }

    /// Subimage these pixels were read from.
    pub fn subimage(&self) -> usize {
        self.subimage
    }

    pub fn width(&self) -> u32 {
        self.spec.width
    }

    pub fn height(&self) -> u32 {
        self.spec.height
    }

    pub fn nchannels(&self) -> usize {
        self.spec.nchannels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Byte offset of pixel (x, y): `scanline_bytes * y + pixel_bytes * x`.
    pub fn pixel_offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.spec.scanline_bytes() + x as usize * self.spec.pixel_bytes()
    }

    /// Raw bytes of scanline `y`.
    ///
    /// # Panics
    /// If `y >= height`.
    pub fn scanline(&self, y: u32) -> &[u8] {
        let stride = self.spec.scanline_bytes();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Raw bytes of pixel (x, y), all channels.
    ///
    /// # Panics
    /// If the coordinate lies outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let start = self.pixel_offset(x, y);
        &self.data[start..start + self.spec.pixel_bytes()]
    }

    /// Channel `c` of pixel (x, y), normalized: integer types divided by the
    /// type maximum, float samples returned as stored.
    pub fn sample(&self, x: u32, y: u32, c: usize) -> f32 {
        let offset = self.pixel_offset(x, y) + c * self.spec.pixel_type.size();
        read_normalized(&self.data, offset, self.spec.pixel_type)
    }

    /// All channels of (x, y) as float. Integer sources are normalized to
    /// [0, 1]; float sources keep their native (possibly HDR) range.
    pub fn get_pixel_f32(&self, x: u32, y: u32, out: &mut [f32]) {
        let base = self.pixel_offset(x, y);
        let size = self.spec.pixel_type.size();
        for (c, slot) in out.iter_mut().take(self.spec.nchannels).enumerate() {
            *slot = read_normalized(&self.data, base + c * size, self.spec.pixel_type);
        }
    }

    /// All channels of (x, y) scaled to 0..=255.
    pub fn get_pixel_u8(&self, x: u32, y: u32, out: &mut [u8]) {
        let base = self.pixel_offset(x, y);
        let size = self.spec.pixel_type.size();
        for (c, slot) in out.iter_mut().take(self.spec.nchannels).enumerate() {
            let offset = base + c * size;
            *slot = match self.spec.pixel_type {
                PixelType::U8 => self.data[offset],
                PixelType::U16 => {
                    let v = u16::from_ne_bytes([self.data[offset], self.data[offset + 1]]);
                    ((v as u32 * 255 + 32_767) / 65_535) as u8
                }
                PixelType::F32 => {
                    let v = read_normalized(&self.data, offset, PixelType::F32);
                    if v.is_finite() {
                        (v.clamp(0.0, 1.0) * 255.0).round() as u8
                    } else if v == f32::INFINITY {
                        255
                    } else {
                        0
                    }
                }
            };
        }
    }
}

/// Normalize an integer sample by its type's maximum value.
pub fn normalize_int<T: PrimInt + ToPrimitive>(v: T) -> f32 {
    let max = T::max_value().to_f32().unwrap_or(1.0);
    v.to_f32().unwrap_or(0.0) / max
}

fn read_normalized(data: &[u8], offset: usize, pixel_type: PixelType) -> f32 {
    match pixel_type {
        PixelType::U8 => normalize_int(data[offset]),
        PixelType::U16 => normalize_int(u16::from_ne_bytes([data[offset], data[offset + 1]])),
        PixelType::F32 => f32::from_ne_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]),
    }
}
