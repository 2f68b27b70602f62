pub mod decoder;
pub mod raster;
pub mod ser;

pub use decoder::{Decoder, FileDecoder, ReadProgress};
