use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Subimage {index} out of range (total: {total})")]
    SubimageOutOfRange { index: usize, total: usize },

    #[error("Image index {index} out of range (total: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("No pixels resident for {0}")]
    NotResident(PathBuf),

    #[error("Could not open {path}: {reason}")]
    Broken { path: PathBuf, reason: String },

    #[error("GPU error: {0}")]
    Gpu(String),
}

pub type Result<T> = std::result::Result<T, IvError>;
