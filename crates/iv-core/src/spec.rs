use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-channel numeric type of the stored samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelType {
    U8,
    U16,
    F32,
}

impl PixelType {
    /// Bytes occupied by one sample.
    pub fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::F32 => 4,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32)
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => write!(f, "uint8"),
            Self::U16 => write!(f, "uint16"),
            Self::F32 => write!(f, "float"),
        }
    }
}

/// Structural description of one subimage, without pixel data.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSpec {
    pub width: u32,
    pub height: u32,
    pub nchannels: usize,
    pub pixel_type: PixelType,
    /// Number of subimages in the file. Fixed for a given file revision.
    pub nsubimages: usize,
    pub channel_names: Vec<String>,
    /// Short container format name ("png", "ser", ...).
    pub format: String,
    /// Extra name/value metadata from the file header.
    pub attributes: Vec<(String, String)>,
}

impl ImageSpec {
    pub fn new(width: u32, height: u32, nchannels: usize, pixel_type: PixelType) -> Self {
        Self {
            width,
            height,
            nchannels,
            pixel_type,
            nsubimages: 1,
            channel_names: default_channel_names(nchannels),
            format: String::new(),
            attributes: Vec::new(),
        }
    }

    /// Bytes per pixel (all channels).
    pub fn pixel_bytes(&self) -> usize {
        self.nchannels * self.pixel_type.size()
    }

    /// Bytes per scanline.
    pub fn scanline_bytes(&self) -> usize {
        self.width as usize * self.pixel_bytes()
    }

    /// Bytes for the whole subimage.
    pub fn image_bytes(&self) -> usize {
        self.scanline_bytes() * self.height as usize
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Conventional channel names for a channel count.
pub fn default_channel_names(nchannels: usize) -> Vec<String> {
    let names: &[&str] = match nchannels {
        1 => &["Y"],
        2 => &["Y", "A"],
        3 => &["R", "G", "B"],
        4 => &["R", "G", "B", "A"],
        _ => &["R", "G", "B", "A"],
    };
    (0..nchannels)
        .map(|c| {
            names
                .get(c)
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("channel{c}"))
        })
        .collect()
}
