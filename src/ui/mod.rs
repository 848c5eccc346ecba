pub mod app;
pub mod board;
pub mod views;
pub mod windows;
