/// Minimum pixel count (h*w) of a rendered view to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Rec. 709 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.2126;

/// Rec. 709 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.7152;

/// Rec. 709 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.0722;

/// Default gamma of a freshly added image (no-op exponent).
pub const DEFAULT_GAMMA: f32 = 1.0;

/// Default exposure of a freshly added image, in stops.
pub const DEFAULT_EXPOSURE: f32 = 0.0;

/// Gamma values below this are treated as this value by the display transform.
pub const GAMMA_FLOOR: f32 = 1e-3;

/// Largest exposure magnitude (in stops) the display transform honours.
pub const MAX_EXPOSURE_STOPS: f32 = 64.0;

/// Smallest zoom reachable with the zoom-out command.
pub const MIN_ZOOM: f32 = 1.0 / 64.0;

/// Largest zoom reachable with the zoom-in command.
pub const MAX_ZOOM: f32 = 64.0;

/// Colour painted where the view extends past the image edges.
pub const OUTSIDE_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Number of scanlines decoded between progress reports.
pub const PROGRESS_SCANLINE_STRIDE: usize = 64;

/// Default side length of the pixel closeup grid.
pub const DEFAULT_CLOSEUP_SIZE: usize = 9;

/// Default longest edge of a generated thumbnail.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 128;
