use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_CLOSEUP_SIZE, DEFAULT_THUMBNAIL_SIZE, MAX_ZOOM, MIN_ZOOM};
use crate::render::DevicePreference;
use crate::viewport::Viewport;

/// User-tunable viewer behaviour. Every field falls back to its default when
/// missing from a config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Read each file's header as soon as it is added.
    pub fetch_spec_on_add: bool,
    /// Exposure nudge for the fine step, in stops.
    pub exposure_small_step: f32,
    /// Exposure nudge for the coarse step, in stops.
    pub exposure_large_step: f32,
    pub gamma_step: f32,
    pub min_gamma: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Side length of the closeup grid; forced odd.
    pub closeup_size: usize,
    pub thumbnail_size: u32,
    pub device: DevicePreference,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fetch_spec_on_add: true,
            exposure_small_step: 0.1,
            exposure_large_step: 0.5,
            gamma_step: 0.05,
            min_gamma: 0.1,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            closeup_size: DEFAULT_CLOSEUP_SIZE,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            device: DevicePreference::Auto,
        }
    }
}

impl ViewerConfig {
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.min_zoom, self.max_zoom)
    }

    /// Closeup size rounded up to an odd number, at least 1.
    pub fn closeup_size(&self) -> usize {
        self.closeup_size.max(1) | 1
    }
}
