//! Channel-view modes and the descriptor the display transform consumes.
//!
//! `FullColor` and `Luminance` are named modes outside the numeric cycle.
//! Cycling from either of them steps onto the channel ring at its ends:
//! forward lands on channel 0, backward on the last channel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{LUMINANCE_B, LUMINANCE_G, LUMINANCE_R};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelView {
    #[default]
    FullColor,
    Luminance,
    /// One channel by index, shown as gray.
    Single(usize),
}

impl ChannelView {
    pub const RED: Self = Self::Single(0);
    pub const GREEN: Self = Self::Single(1);
    pub const BLUE: Self = Self::Single(2);
    pub const ALPHA: Self = Self::Single(3);

    /// Move to the adjacent concrete channel, wrapping within
    /// `[0, nchannels - 1]`. `direction` is +1 or -1 (sign is what counts).
    pub fn cycle(self, nchannels: usize, direction: i32) -> Self {
        if nchannels == 0 {
            return self;
        }
        let n = nchannels as i64;
        let step = if direction < 0 { -1 } else { 1 };
        match self {
            Self::Single(c) => {
                let c = (c as i64).min(n - 1);
                Self::Single((c + step).rem_euclid(n) as usize)
            }
            Self::FullColor | Self::Luminance => {
                if step > 0 {
                    Self::Single(0)
                } else {
                    Self::Single(nchannels - 1)
                }
            }
        }
    }

    /// Resolve the mode against an image's channel count.
    pub fn describe(self, nchannels: usize) -> ChannelDescriptor {
        describe(self, nchannels)
    }
}

impl fmt::Display for ChannelView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullColor => write!(f, "RGB"),
            Self::Luminance => write!(f, "Luminance"),
            Self::Single(0) => write!(f, "Red"),
            Self::Single(1) => write!(f, "Green"),
            Self::Single(2) => write!(f, "Blue"),
            Self::Single(3) => write!(f, "Alpha"),
            Self::Single(c) => write!(f, "Channel {c}"),
        }
    }
}

/// Which source channels feed the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelSource {
    /// Channels 0, 1, 2 map to red, green, blue.
    All,
    /// One channel replicated into every output channel.
    Index(usize),
}

/// Shader configuration resolved from a [`ChannelView`] and a channel count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub source: ChannelSource,
    pub grayscale: bool,
    /// Red/green/blue are combined with the luminance weights before the
    /// exposure and gamma stages.
    pub luminance: bool,
}

impl ChannelDescriptor {
    /// Source channel indices the display reads, in output slot order.
    pub fn source_channels(&self) -> Vec<usize> {
        match self.source {
            ChannelSource::Index(c) => vec![c],
            ChannelSource::All => vec![0, 1, 2],
        }
    }

    /// Combine normalized source values (in `source_channels` order) into
    /// the pre-exposure RGB triple.
    pub fn combine(&self, values: &[f32]) -> [f32; 3] {
        if self.luminance {
            let y = values[0] * LUMINANCE_R + values[1] * LUMINANCE_G + values[2] * LUMINANCE_B;
            [y, y, y]
        } else if self.grayscale {
            [values[0]; 3]
        } else {
            [values[0], values[1], values[2]]
        }
    }
}

/// Resolve a view mode against a channel count.
///
/// Images with fewer than three channels have no colour to show: full colour
/// and luminance both degrade to channel 0 as gray. A single channel past the
/// end of the image falls back to full colour.
pub fn describe(mode: ChannelView, nchannels: usize) -> ChannelDescriptor {
    let gray = |c| ChannelDescriptor {
        source: ChannelSource::Index(c),
        grayscale: true,
        luminance: false,
    };
    match mode {
        ChannelView::Single(c) if c < nchannels => gray(c),
        ChannelView::Luminance if nchannels >= 3 => ChannelDescriptor {
            source: ChannelSource::All,
            grayscale: true,
            luminance: true,
        },
        _ if nchannels >= 3 => ChannelDescriptor {
            source: ChannelSource::All,
            grayscale: false,
            luminance: false,
        },
        _ => gray(0),
    }
}
