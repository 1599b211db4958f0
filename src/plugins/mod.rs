pub mod core;
pub mod grid;
pub mod orders;
pub mod render2d;
pub mod saveload;
pub mod ui;
