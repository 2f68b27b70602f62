pub mod menu_bar;
pub mod status;
pub mod viewport;
pub mod windows;
