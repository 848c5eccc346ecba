pub mod api;
pub mod audio;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod dump;
pub mod logging;
pub mod models;
pub mod playback_settings;
pub mod player;
pub mod queue;
pub mod route;
pub mod selection;
pub mod sequencer;
pub mod settings;
pub mod text;
pub mod ui;
