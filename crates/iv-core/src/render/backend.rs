use std::fmt;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::display::DisplaySettings;
use crate::error::Result;
use crate::image::DisplayFrame;
use crate::viewport::ViewGeometry;

use super::cpu::CpuBackend;

/// Which device renders the display transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevicePreference {
    /// GPU when one is available, host otherwise.
    #[default]
    Auto,
    Cpu,
    Gpu,
}

impl fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Cpu => write!(f, "CPU"),
            Self::Gpu => write!(f, "GPU"),
        }
    }
}

/// Renders a frame through the display transform into a window-sized image.
pub trait DisplayBackend {
    fn name(&self) -> &str;

    fn is_gpu(&self) -> bool {
        false
    }

    /// Produce the displayed RGBA image for `view`. Window pixels outside the
    /// image get `OUTSIDE_COLOR`.
    fn render(
        &mut self,
        frame: &DisplayFrame,
        settings: &DisplaySettings,
        view: &ViewGeometry,
    ) -> Result<RgbaImage>;

    /// Drop device resources (e.g. after a lost context). The next render
    /// recreates them.
    fn release(&mut self) {}
}

/// Build the backend for a device preference, falling back to the host.
pub fn create_backend(preference: DevicePreference) -> Box<dyn DisplayBackend> {
    match preference {
        DevicePreference::Cpu => Box::new(CpuBackend),
        DevicePreference::Gpu | DevicePreference::Auto => gpu_or_cpu(preference),
    }
}

#[cfg(feature = "gpu")]
fn gpu_or_cpu(preference: DevicePreference) -> Box<dyn DisplayBackend> {
    use super::wgpu_backend::WgpuBackend;

    match WgpuBackend::new() {
        Ok(gpu) if preference == DevicePreference::Auto => Box::new(AutoBackend {
            gpu,
            cpu: CpuBackend,
        }),
        Ok(gpu) => Box::new(gpu),
        Err(e) => {
            tracing::warn!("GPU unavailable ({e}), rendering on the CPU");
            Box::new(CpuBackend)
        }
    }
}

#[cfg(not(feature = "gpu"))]
fn gpu_or_cpu(preference: DevicePreference) -> Box<dyn DisplayBackend> {
    if preference == DevicePreference::Gpu {
        tracing::warn!("built without the `gpu` feature, rendering on the CPU");
    }
    Box::new(CpuBackend)
}

/// GPU first; frames the device cannot take are rendered on the host.
#[cfg(feature = "gpu")]
struct AutoBackend {
    gpu: super::wgpu_backend::WgpuBackend,
    cpu: CpuBackend,
}

#[cfg(feature = "gpu")]
impl DisplayBackend for AutoBackend {
    fn name(&self) -> &str {
        self.gpu.name()
    }

    fn is_gpu(&self) -> bool {
        true
    }

    fn render(
        &mut self,
        frame: &DisplayFrame,
        settings: &DisplaySettings,
        view: &ViewGeometry,
    ) -> Result<RgbaImage> {
        match self.gpu.render(frame, settings, view) {
            Ok(image) => Ok(image),
            Err(e) => {
                tracing::warn!("GPU render failed ({e}), using the CPU for this frame");
                self.cpu.render(frame, settings, view)
            }
        }
    }

    fn release(&mut self) {
        self.gpu.release();
    }
}
