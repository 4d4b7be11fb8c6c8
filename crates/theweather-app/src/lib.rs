//! Application layer for TheWeather
//!
//! Holds the screen session state, derives what should be displayed from
//! it, and wires configuration into the forecast layer.

pub mod display;
pub mod error_mapping;
pub mod session;
pub mod setup;

pub use display::DisplayState;
pub use session::{SessionState, WeatherSession};
