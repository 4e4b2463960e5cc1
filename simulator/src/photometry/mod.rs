//! Photometry models and utilities

pub mod illuminance;
pub mod luminosity;
pub mod spectrum;

pub use illuminance::{illuminance_map, mean_illuminance};
pub use luminosity::photopic_luminosity;
pub use spectrum::{SpectralCurve, WaveGrid, WaveGridError};
