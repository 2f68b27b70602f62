//! Zoom and pan state for the main view.
//!
//! Zoom is a scale factor: 2.0 draws each source pixel as a 2x2 block, 0.5
//! draws every other pixel. The view center lives in source-image
//! coordinates and is kept inside the image rectangle, so at worst half the
//! window shows background and the image never leaves the screen.

use crate::consts::{MAX_ZOOM, MIN_ZOOM};

/// Everything a renderer needs to place the image in a window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewGeometry {
    pub window_width: u32,
    pub window_height: u32,
    pub zoom: f32,
    pub center_x: f32,
    pub center_y: f32,
}

impl ViewGeometry {
    /// A window exactly the size of the image at 1:1, centered.
    pub fn actual_size(image_width: u32, image_height: u32) -> Self {
        Self {
            window_width: image_width,
            window_height: image_height,
            zoom: 1.0,
            center_x: image_width as f32 * 0.5,
            center_y: image_height as f32 * 0.5,
        }
    }

    /// Source-space coordinate under the center of window pixel (px, py).
    pub fn source_coord(&self, px: u32, py: u32) -> (f32, f32) {
        let sx = self.center_x + (px as f32 + 0.5 - self.window_width as f32 * 0.5) / self.zoom;
        let sy = self.center_y + (py as f32 + 0.5 - self.window_height as f32 * 0.5) / self.zoom;
        (sx, sy)
    }
}

/// Interpret a zoom in the signed convention: positive magnifies, negative
/// minifies by `1/|zoom|`. Zero and non-finite values have no meaning.
pub fn signed_zoom_to_scale(zoom: f32) -> Option<f32> {
    if !zoom.is_finite() || zoom == 0.0 {
        None
    } else if zoom < 0.0 {
        Some(1.0 / -zoom)
    } else {
        Some(zoom)
    }
}

/// Smallest power of two strictly greater than `zoom`.
pub fn next_zoom_in(zoom: f32) -> f32 {
    let mut next = (zoom.log2().floor() + 1.0).exp2();
    if next <= zoom {
        next *= 2.0;
    }
    next
}

/// Largest power of two strictly less than `zoom`.
pub fn next_zoom_out(zoom: f32) -> f32 {
    let mut prev = (zoom.log2().ceil() - 1.0).exp2();
    if prev >= zoom {
        prev *= 0.5;
    }
    prev
}

/// Largest zoom at which the whole image fits in the window, aspect preserved.
pub fn zoom_to_fit(image_width: u32, image_height: u32, window_width: u32, window_height: u32) -> f32 {
    if image_width == 0 || image_height == 0 {
        return 1.0;
    }
    let zx = window_width as f32 / image_width as f32;
    let zy = window_height as f32 / image_height as f32;
    zx.min(zy)
}

/// Window size that shows the whole image at `zoom` (signed convention).
/// An invalid zoom is treated as 1:1.
pub fn window_size_to_fit(image_width: u32, image_height: u32, zoom: f32) -> (u32, u32) {
    let zoom = signed_zoom_to_scale(zoom).unwrap_or(1.0);
    let w = (image_width as f32 * zoom).ceil().max(1.0) as u32;
    let h = (image_height as f32 * zoom).ceil().max(1.0) as u32;
    (w, h)
}

#[derive(Clone, Debug)]
pub struct Viewport {
    zoom: f32,
    center_x: f32,
    center_y: f32,
    image_size: Option<(u32, u32)>,
    min_zoom: f32,
    max_zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(MIN_ZOOM, MAX_ZOOM)
    }
}

impl Viewport {
    /// `min_zoom`/`max_zoom` bound the zoom-in/zoom-out commands only.
    pub fn new(min_zoom: f32, max_zoom: f32) -> Self {
        Self {
            zoom: 1.0,
            center_x: 0.0,
            center_y: 0.0,
            image_size: None,
            min_zoom,
            max_zoom,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn center(&self) -> (f32, f32) {
        (self.center_x, self.center_y)
    }

    pub fn image_size(&self) -> Option<(u32, u32)> {
        self.image_size
    }

    /// Show a (new) image: keep the zoom, center the view on it.
    pub fn set_image(&mut self, width: u32, height: u32) {
        if self.image_size != Some((width, height)) {
            self.image_size = Some((width, height));
            self.center_x = width as f32 * 0.5;
            self.center_y = height as f32 * 0.5;
        }
    }

    pub fn clear_image(&mut self) {
        self.image_size = None;
    }

    /// Set zoom exactly (signed convention). Invalid values are ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if let Some(scale) = signed_zoom_to_scale(zoom) {
            self.zoom = scale;
            self.clamp_center();
        }
    }

    /// Step to the next power of two above the current zoom.
    pub fn zoom_in(&mut self) {
        if self.zoom < self.max_zoom {
            self.set_zoom(next_zoom_in(self.zoom).min(self.max_zoom));
        }
    }

    /// Step to the next power of two below the current zoom.
    pub fn zoom_out(&mut self) {
        if self.zoom > self.min_zoom {
            self.set_zoom(next_zoom_out(self.zoom).max(self.min_zoom));
        }
    }

    /// 1:1 pixel ratio.
    pub fn normal_size(&mut self) {
        self.set_zoom(1.0);
    }

    /// Zoom so the whole image exactly fills the window and center it.
    pub fn fit_to_window(&mut self, window_width: u32, window_height: u32) -> f32 {
        if let Some((w, h)) = self.image_size {
            let zoom = zoom_to_fit(w, h, window_width, window_height);
            if zoom > 0.0 {
                self.zoom = zoom;
            }
            self.center_x = w as f32 * 0.5;
            self.center_y = h as f32 * 0.5;
        }
        self.zoom
    }

    /// Window size that would show the current image at the current zoom.
    pub fn window_for_image(&self) -> Option<(u32, u32)> {
        self.image_size
            .map(|(w, h)| window_size_to_fit(w, h, self.zoom))
    }

    /// Move the view by a screen-space delta (window pixels).
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if dx.is_finite() && dy.is_finite() {
            self.center_x += dx / self.zoom;
            self.center_y += dy / self.zoom;
            self.clamp_center();
        }
    }

    pub fn set_center(&mut self, x: f32, y: f32) {
        if x.is_finite() && y.is_finite() {
            self.center_x = x;
            self.center_y = y;
            self.clamp_center();
        }
    }

    fn clamp_center(&mut self) {
        if let Some((w, h)) = self.image_size {
            self.center_x = self.center_x.clamp(0.0, w as f32);
            self.center_y = self.center_y.clamp(0.0, h as f32);
        }
    }

    pub fn geometry(&self, window_width: u32, window_height: u32) -> ViewGeometry {
        ViewGeometry {
            window_width,
            window_height,
            zoom: self.zoom,
            center_x: self.center_x,
            center_y: self.center_y,
        }
    }

    /// Image pixel under window position (mx, my), `None` outside the image.
    pub fn window_to_image(
        &self,
        mx: f32,
        my: f32,
        window_width: u32,
        window_height: u32,
    ) -> Option<(u32, u32)> {
        let (w, h) = self.image_size?;
        let sx = self.center_x + (mx - window_width as f32 * 0.5) / self.zoom;
        let sy = self.center_y + (my - window_height as f32 * 0.5) / self.zoom;
        if sx < 0.0 || sy < 0.0 || sx >= w as f32 || sy >= h as f32 {
            return None;
        }
        Some((sx as u32, sy as u32))
    }

    /// Window position of source coordinate (x, y).
    pub fn image_to_window(&self, x: f32, y: f32, window_width: u32, window_height: u32) -> (f32, f32) {
        (
            (x - self.center_x) * self.zoom + window_width as f32 * 0.5,
            (y - self.center_y) * self.zoom + window_height as f32 * 0.5,
        )
    }
}
