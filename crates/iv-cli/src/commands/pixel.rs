use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use iv_core::closeup::Closeup;

use crate::summary;

use super::{load_config, read_with_progress};

#[derive(Args)]
pub struct PixelArgs {
    /// Input image file
    pub file: PathBuf,

    /// Column of the focus pixel
    pub x: u32,

    /// Row of the focus pixel
    pub y: u32,

    /// Side length of the closeup grid (rounded up to odd)
    #[arg(short, long)]
    pub size: Option<usize>,

    /// Subimage (SER frame) to inspect
    #[arg(long, default_value = "0")]
    pub subimage: usize,

    /// Viewer config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &PixelArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let size = args.size.unwrap_or_else(|| config.closeup_size());

    let record = read_with_progress(&args.file, args.subimage)?;
    let frame = record.frame()?;
    let closeup = Closeup::sample(&frame, args.x, args.y, size).with_context(|| {
        format!(
            "({}, {}) is outside the {}x{} image",
            args.x,
            args.y,
            frame.pixels.width(),
            frame.pixels.height()
        )
    })?;

    summary::print_closeup(&closeup);
    Ok(())
}
