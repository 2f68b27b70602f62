pub mod buffer;
pub mod channel;
pub mod closeup;
pub mod config;
pub mod consts;
pub mod display;
pub mod error;
pub mod image;
pub mod io;
pub mod loader;
pub mod navigator;
pub mod render;
pub mod spec;
pub mod viewport;
