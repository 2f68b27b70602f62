//! Pixel-level closeup around a focus pixel.

use ndarray::{Array2, Array3, ArrayView1};

use crate::image::DisplayFrame;

#[derive(Clone, Debug)]
pub struct Closeup {
    /// Side length of the grid, always odd.
    pub size: usize,
    pub focus: (u32, u32),
    pub channel_names: Vec<String>,
    /// `values[[row, col, channel]]`, float form of each cell's pixel.
    pub values: Array3<f32>,
    /// False for cells that fall outside the image.
    pub present: Array2<bool>,
    /// Focus pixel scaled to 0..=255.
    pub focus_u8: Vec<u8>,
    /// Focus pixel as float: normalized for integer images, native for float.
    pub focus_f32: Vec<f32>,
}

impl Closeup {
    /// Sample a `size` x `size` neighbourhood centered on (x, y). Even sizes
    /// are rounded up. `None` when the focus pixel is outside the image.
    pub fn sample(frame: &DisplayFrame, x: u32, y: u32, size: usize) -> Option<Self> {
        let pixels = &frame.pixels;
        if x >= pixels.width() || y >= pixels.height() {
            return None;
        }
        let size = size.max(1) | 1;
        let n = pixels.nchannels();
        let half = (size / 2) as i64;

        let mut values = Array3::<f32>::zeros((size, size, n));
        let mut present = Array2::<bool>::from_elem((size, size), false);
        let mut scratch = vec![0.0f32; n];
        for row in 0..size {
            let sy = y as i64 + row as i64 - half;
            for col in 0..size {
                let sx = x as i64 + col as i64 - half;
                if sx < 0 || sy < 0 || sx >= pixels.width() as i64 || sy >= pixels.height() as i64 {
                    continue;
                }
                pixels.get_pixel_f32(sx as u32, sy as u32, &mut scratch);
                for (c, &v) in scratch.iter().enumerate() {
                    values[[row, col, c]] = v;
                }
                present[[row, col]] = true;
            }
        }

        let mut focus_u8 = vec![0u8; n];
        let mut focus_f32 = vec![0.0f32; n];
        pixels.get_pixel_u8(x, y, &mut focus_u8);
        pixels.get_pixel_f32(x, y, &mut focus_f32);

        Some(Self {
            size,
            focus: (x, y),
            channel_names: frame.spec().channel_names.clone(),
            values,
            present,
            focus_u8,
            focus_f32,
        })
    }

    /// Index of the focus cell along each axis.
    pub fn center(&self) -> usize {
        self.size / 2
    }

    /// Channel values of one cell, `None` outside the image.
    pub fn cell(&self, row: usize, col: usize) -> Option<ArrayView1<'_, f32>> {
        if row >= self.size || col >= self.size || !self.present[[row, col]] {
            return None;
        }
        Some(self.values.slice(ndarray::s![row, col, ..]))
    }
}
