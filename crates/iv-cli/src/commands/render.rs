use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use iv_core::channel::ChannelView;
use iv_core::display::DisplaySettings;
use iv_core::render::{create_backend, DevicePreference};

use crate::summary::{self, RenderSummary};

use super::{load_config, read_with_progress};

#[derive(Clone, ValueEnum)]
pub enum DeviceChoice {
    Auto,
    Cpu,
    Gpu,
}

impl From<DeviceChoice> for DevicePreference {
    fn from(choice: DeviceChoice) -> Self {
        match choice {
            DeviceChoice::Auto => DevicePreference::Auto,
            DeviceChoice::Cpu => DevicePreference::Cpu,
            DeviceChoice::Gpu => DevicePreference::Gpu,
        }
    }
}

#[derive(Args)]
pub struct RenderArgs {
    /// Input image file
    pub file: PathBuf,

    /// Output PNG path
    #[arg(short, long, default_value = "view.png")]
    pub output: PathBuf,

    /// Subimage (SER frame) to show
    #[arg(long, default_value = "0")]
    pub subimage: usize,

    /// Exposure in stops
    #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
    pub exposure: f32,

    /// Display gamma
    #[arg(short, long, default_value = "1")]
    pub gamma: f32,

    /// Channel view: rgb, lum, r, g, b, a or a channel index
    #[arg(short, long, default_value = "rgb")]
    pub channel: String,

    /// Zoom: positive magnifies, negative -n shrinks to 1/n
    #[arg(short, long, allow_hyphen_values = true, conflicts_with = "fit")]
    pub zoom: Option<f32>,

    /// Fit the whole image into the output size
    #[arg(long)]
    pub fit: bool,

    /// Output size as WIDTHxHEIGHT (default: image at the chosen zoom)
    #[arg(short, long)]
    pub size: Option<String>,

    /// Compute device
    #[arg(long, value_enum)]
    pub device: Option<DeviceChoice>,

    /// Viewer config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn parse_channel(s: &str) -> Result<ChannelView> {
    let view = match s.to_ascii_lowercase().as_str() {
        "rgb" | "full" | "color" => ChannelView::FullColor,
        "lum" | "luminance" | "l" => ChannelView::Luminance,
        "r" | "red" => ChannelView::RED,
        "g" | "green" => ChannelView::GREEN,
        "b" | "blue" => ChannelView::BLUE,
        "a" | "alpha" => ChannelView::ALPHA,
        other => match other.parse::<usize>() {
            Ok(c) => ChannelView::Single(c),
            Err(_) => bail!("Unknown channel '{s}'"),
        },
    };
    Ok(view)
}

pub fn parse_size(s: &str) -> Result<(u32, u32)> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .with_context(|| format!("Size '{s}' is not WIDTHxHEIGHT"))?;
    let w: u32 = w.trim().parse().with_context(|| format!("Bad width in '{s}'"))?;
    let h: u32 = h.trim().parse().with_context(|| format!("Bad height in '{s}'"))?;
    if w == 0 || h == 0 {
        bail!("Size must be non-zero, got {w}x{h}");
    }
    Ok((w, h))
}

pub fn run(args: &RenderArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(ref device) = args.device {
        config.device = device.clone().into();
    }
    let channel = parse_channel(&args.channel)?;
    let size = args.size.as_deref().map(parse_size).transpose()?;

    let mut record = read_with_progress(&args.file, args.subimage)?;
    record.set_exposure(args.exposure);
    record.set_gamma(args.gamma);
    let frame = record.frame()?;
    let (iw, ih) = (frame.pixels.width(), frame.pixels.height());

    let mut viewport = config.viewport();
    viewport.set_image(iw, ih);
    if let Some(zoom) = args.zoom {
        viewport.set_zoom(zoom);
    }
    let (ww, wh) = match size {
        Some(size) => size,
        None => viewport
            .window_for_image()
            .context("Viewport has no image")?,
    };
    if args.fit {
        viewport.fit_to_window(ww, wh);
    }

    let settings = DisplaySettings::for_record(&record, channel);
    let view = viewport.geometry(ww, wh);
    let mut backend = create_backend(config.device);
    tracing::info!(backend = backend.name(), "rendering {ww}x{wh}");
    let rendered = backend.render(&frame, &settings, &view)?;
    rendered
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    summary::print_render_summary(&RenderSummary {
        input: &args.file,
        output: &args.output,
        device: backend.name(),
        settings,
        zoom: viewport.zoom(),
        size: (ww, wh),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_names_and_indices() {
        assert_eq!(parse_channel("RGB").unwrap(), ChannelView::FullColor);
        assert_eq!(parse_channel("lum").unwrap(), ChannelView::Luminance);
        assert_eq!(parse_channel("b").unwrap(), ChannelView::Single(2));
        assert_eq!(parse_channel("5").unwrap(), ChannelView::Single(5));
        assert!(parse_channel("purple").is_err());
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("640x480").unwrap(), (640, 480));
        assert_eq!(parse_size("32X16").unwrap(), (32, 16));
        assert!(parse_size("640").is_err());
        assert!(parse_size("0x10").is_err());
    }
}
