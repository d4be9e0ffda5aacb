pub mod command_bar;
pub mod footer;
pub mod grid;
pub mod header;
pub mod render;
pub mod spinner;
