pub mod analyze;
pub mod config;
pub mod presets;
pub mod resolve;
