//! Tone transform from normalized pixel values to displayed intensity:
//!
//! `displayed = clamp((v * 2^exposure) ^ (1/gamma), 0, 1)`
//!
//! Exposure is applied before the gamma exponent. Every stage is sanitized so
//! NaN or infinite inputs never reach the output.

use serde::{Deserialize, Serialize};

use crate::channel::ChannelView;
use crate::consts::{DEFAULT_EXPOSURE, DEFAULT_GAMMA, GAMMA_FLOOR, MAX_EXPOSURE_STOPS};
use crate::image::ImageRecord;

/// Everything besides geometry that decides how a frame is shown.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub exposure: f32,
    pub gamma: f32,
    pub channel: ChannelView,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            exposure: DEFAULT_EXPOSURE,
            gamma: DEFAULT_GAMMA,
            channel: ChannelView::FullColor,
        }
    }
}

impl DisplaySettings {
    /// Settings for a record's own gamma/exposure with the given channel view.
    pub fn for_record(record: &ImageRecord, channel: ChannelView) -> Self {
        Self {
            exposure: record.exposure(),
            gamma: record.gamma(),
            channel,
        }
    }

    pub fn transform(&self) -> DisplayTransform {
        DisplayTransform::new(self.exposure, self.gamma)
    }
}

/// Precomputed per-frame constants of the tone transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayTransform {
    gain: f32,
    inv_gamma: f32,
}

impl DisplayTransform {
    pub fn new(exposure: f32, gamma: f32) -> Self {
        Self {
            gain: exposure_gain(exposure),
            inv_gamma: 1.0 / effective_gamma(gamma),
        }
    }

    /// `2^exposure`.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// `1/gamma`.
    pub fn inv_gamma(&self) -> f32 {
        self.inv_gamma
    }

    /// Exposure stage only: `v * 2^exposure`, unclamped above.
    pub fn pre_gamma(&self, v: f32) -> f32 {
        sanitize(sanitize(v) * self.gain)
    }

    /// Full transform of one normalized value.
    pub fn apply(&self, v: f32) -> f32 {
        let x = self.pre_gamma(v);
        let y = if self.inv_gamma == 1.0 {
            x
        } else {
            x.powf(self.inv_gamma)
        };
        sanitize(y).min(1.0)
    }

    /// Transform and quantize to an 8-bit code value.
    pub fn apply_u8(&self, v: f32) -> u8 {
        (self.apply(v) * 255.0).round() as u8
    }
}

/// NaN becomes 0, negatives clamp to 0, +inf clamps to the largest finite value.
pub fn sanitize(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, f32::MAX)
    }
}

/// `2^exposure`, with non-finite exposure treated as 0 stops.
pub fn exposure_gain(exposure: f32) -> f32 {
    let stops = if exposure.is_finite() {
        exposure.clamp(-MAX_EXPOSURE_STOPS, MAX_EXPOSURE_STOPS)
    } else {
        0.0
    };
    stops.exp2()
}

/// Gamma as the transform uses it: non-finite means 1, tiny values are floored.
pub fn effective_gamma(gamma: f32) -> f32 {
    if !gamma.is_finite() {
        DEFAULT_GAMMA
    } else {
        gamma.max(GAMMA_FLOOR)
    }
}
