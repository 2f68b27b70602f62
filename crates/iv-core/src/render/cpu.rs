//! Host implementation of the display transform. Also the reference the GPU
//! path is checked against.

use image::RgbaImage;
use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::consts::{OUTSIDE_COLOR, PARALLEL_PIXEL_THRESHOLD};
use crate::display::{sanitize, DisplaySettings};
use crate::error::Result;
use crate::image::DisplayFrame;
use crate::viewport::ViewGeometry;

use super::DisplayBackend;

/// CPU backend using Rayon for parallelism.
pub struct CpuBackend;

impl DisplayBackend for CpuBackend {
    fn name(&self) -> &str {
        "CPU/Rayon"
    }

    fn render(
        &mut self,
        frame: &DisplayFrame,
        settings: &DisplaySettings,
        view: &ViewGeometry,
    ) -> Result<RgbaImage> {
        Ok(render_view(&frame.pixels, settings, view))
    }
}

/// Render `pixels` into a window described by `view`.
pub fn render_view(pixels: &PixelBuffer, settings: &DisplaySettings, view: &ViewGeometry) -> RgbaImage {
    let (ww, wh) = (view.window_width, view.window_height);
    if ww == 0 || wh == 0 {
        return RgbaImage::new(ww, wh);
    }

    let descriptor = settings.channel.describe(pixels.nchannels());
    let channels = descriptor.source_channels();
    let transform = settings.transform();
    let (iw, ih) = (pixels.width() as f32, pixels.height() as f32);

    let render_row = |(py, row): (usize, &mut [u8])| {
        let mut values = [0.0f32; 3];
        for (px, dst) in row.chunks_exact_mut(4).enumerate() {
            let (sx, sy) = view.source_coord(px as u32, py as u32);
            if sx < 0.0 || sy < 0.0 || sx >= iw || sy >= ih {
                dst.copy_from_slice(&OUTSIDE_COLOR);
                continue;
            }
            let (x, y) = (sx as u32, sy as u32);
            for (slot, &c) in values.iter_mut().zip(&channels) {
                *slot = sanitize(pixels.sample(x, y, c));
            }
            let rgb = descriptor.combine(&values[..channels.len()]);
            dst[0] = transform.apply_u8(rgb[0]);
            dst[1] = transform.apply_u8(rgb[1]);
            dst[2] = transform.apply_u8(rgb[2]);
            dst[3] = 255;
        }
    };

    let row_len = ww as usize * 4;
    let mut out = vec![0u8; row_len * wh as usize];
    if (ww as usize) * (wh as usize) >= PARALLEL_PIXEL_THRESHOLD {
        out.par_chunks_mut(row_len).enumerate().for_each(render_row);
    } else {
        out.chunks_mut(row_len).enumerate().for_each(render_row);
    }

    RgbaImage::from_raw(ww, wh, out).expect("buffer size matches dimensions")
}
