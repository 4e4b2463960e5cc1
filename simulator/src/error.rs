//! Crate-level error type for optical image formation.

use thiserror::Error;

use crate::algo::misc::InterpError;
use crate::hardware::optics::MethodParseError;
use crate::photometry::spectrum::WaveGridError;

/// Errors that abort an optical image computation.
///
/// Unsupported off-axis or diffuser method names are not errors; they fall
/// back to a default and are logged.
#[derive(Debug, Error)]
pub enum OpticsError {
    #[error("Invalid optics configuration: {0}")]
    InvalidOpticsConfiguration(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    #[error("Spectral cube has {cube} wavelength planes but the grid has {grid} samples")]
    WavelengthMismatch { cube: usize, grid: usize },

    #[error("Wavelength grid error: {0}")]
    Wavelength(#[from] WaveGridError),

    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpError),

    #[error("Failed to parse optics configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl From<MethodParseError> for OpticsError {
    fn from(err: MethodParseError) -> Self {
        OpticsError::InvalidOpticsConfiguration(err.to_string())
    }
}
