//! Spectral sampling: wavelength grids, tabulated spectral curves, and the
//! physical constants needed to move between photon and energy units.
//!
//! # Units
//!
//! - **Wavelengths**: nanometers (nm)
//! - **Photon spectral irradiance**: photons s⁻¹ m⁻² nm⁻¹
//! - **Energy spectral irradiance**: W m⁻² nm⁻¹
//!
//! A [`WaveGrid`] is owned by the scene and copied onto the optical image at
//! the start of a formation run. Anything tabulated on a different grid
//! (lens transmittance, the photopic luminosity function) is resampled onto
//! it with [`SpectralCurve::resample`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algo::misc::{interp_clamped, InterpError};

/// Physical constants in SI units.
pub struct SI {}

impl SI {
    /// Planck's constant, J·s
    pub const PLANCK_CONSTANT: f64 = 6.626_070_15e-34;

    /// Speed of light in vacuum, m/s
    pub const SPEED_OF_LIGHT: f64 = 2.997_924_58e8;

    /// Maximum luminous efficacy of photopic vision, lm/W
    pub const LUMINOUS_EFFICACY: f64 = 683.0;
}

/// Energy of one photon at `wavelength_nm`, in joules (E = hc/λ).
pub fn photon_energy_joules(wavelength_nm: f64) -> f64 {
    SI::PLANCK_CONSTANT * SI::SPEED_OF_LIGHT / (wavelength_nm * 1e-9)
}

/// Errors constructing wavelength grids or spectral curves
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WaveGridError {
    #[error("Wavelength grid must contain at least one sample")]
    Empty,

    #[error("Wavelength {0} nm is not a positive finite value")]
    InvalidSample(f64),

    #[error("Wavelengths must be strictly increasing: {previous} nm followed by {current} nm at index {index}")]
    NotIncreasing {
        index: usize,
        previous: f64,
        current: f64,
    },

    #[error("Invalid wavelength range {start}..={end} nm with step {step} nm")]
    InvalidRange { start: f64, end: f64, step: f64 },

    #[error("Spectral curve has {wavelengths} wavelengths but {values} values")]
    LengthMismatch { wavelengths: usize, values: usize },

    #[error("Spectral curve value {value} at {wavelength} nm is outside [{min}, {max}]")]
    ValueOutOfRange {
        wavelength: f64,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error(transparent)]
    Interpolation(#[from] InterpError),
}

fn check_wavelengths(wavelengths: &[f64]) -> Result<(), WaveGridError> {
    if wavelengths.is_empty() {
        return Err(WaveGridError::Empty);
    }
    if let Some(&bad) = wavelengths.iter().find(|w| !w.is_finite() || **w <= 0.0) {
        return Err(WaveGridError::InvalidSample(bad));
    }
    for (index, pair) in wavelengths.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(WaveGridError::NotIncreasing {
                index: index + 1,
                previous: pair[0],
                current: pair[1],
            });
        }
    }
    Ok(())
}

/// Ordered, strictly increasing wavelength samples in nanometers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct WaveGrid {
    wavelengths: Vec<f64>,
}

impl WaveGrid {
    /// Create a grid from explicit samples.
    pub fn new(wavelengths: Vec<f64>) -> Result<Self, WaveGridError> {
        check_wavelengths(&wavelengths)?;
        Ok(Self { wavelengths })
    }

    /// Evenly spaced grid from `start_nm` to `end_nm` inclusive.
    ///
    /// The sample count is rounded so that a range like 400..=700 step 10
    /// yields exactly 31 samples despite floating point drift.
    pub fn uniform(start_nm: f64, end_nm: f64, step_nm: f64) -> Result<Self, WaveGridError> {
        let invalid = WaveGridError::InvalidRange {
            start: start_nm,
            end: end_nm,
            step: step_nm,
        };
        if !(step_nm.is_finite() && step_nm > 0.0) || !(end_nm >= start_nm) {
            return Err(invalid);
        }
        let count = ((end_nm - start_nm) / step_nm).round() as usize + 1;
        let wavelengths = (0..count)
            .map(|i| start_nm + i as f64 * step_nm)
            .collect();
        Self::new(wavelengths)
    }

    /// Single-sample grid.
    pub fn single(wavelength_nm: f64) -> Result<Self, WaveGridError> {
        Self::new(vec![wavelength_nm])
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    /// Always false; a grid holds at least one sample.
    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.wavelengths.iter().copied()
    }

    pub fn first(&self) -> f64 {
        self.wavelengths[0]
    }

    pub fn last(&self) -> f64 {
        self.wavelengths[self.wavelengths.len() - 1]
    }

    /// Spectral bin width in nm: spacing of the first two samples, 1 nm for
    /// a single-sample grid.
    pub fn bin_width(&self) -> f64 {
        match self.wavelengths.as_slice() {
            [first, second, ..] => second - first,
            _ => 1.0,
        }
    }

    /// Index of the sample equal to `wavelength_nm` (within 1e-9 nm).
    pub fn index_of(&self, wavelength_nm: f64) -> Option<usize> {
        self.wavelengths
            .iter()
            .position(|w| (w - wavelength_nm).abs() < 1e-9)
    }

    pub fn contains(&self, wavelength_nm: f64) -> bool {
        self.index_of(wavelength_nm).is_some()
    }
}

impl TryFrom<Vec<f64>> for WaveGrid {
    type Error = WaveGridError;

    fn try_from(wavelengths: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(wavelengths)
    }
}

impl From<WaveGrid> for Vec<f64> {
    fn from(grid: WaveGrid) -> Self {
        grid.wavelengths
    }
}

/// A tabulated function of wavelength, such as a transmittance curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralCurve {
    wavelengths: Vec<f64>,
    values: Vec<f64>,
}

impl SpectralCurve {
    pub fn new(wavelengths: Vec<f64>, values: Vec<f64>) -> Result<Self, WaveGridError> {
        let curve = Self {
            wavelengths,
            values,
        };
        curve.validate()?;
        Ok(curve)
    }

    /// Check table shape and ordering. Curves loaded through serde are only
    /// checked when this is called.
    pub fn validate(&self) -> Result<(), WaveGridError> {
        check_wavelengths(&self.wavelengths)?;
        if self.wavelengths.len() != self.values.len() {
            return Err(WaveGridError::LengthMismatch {
                wavelengths: self.wavelengths.len(),
                values: self.values.len(),
            });
        }
        if let Some((&wavelength, &value)) = self
            .wavelengths
            .iter()
            .zip(self.values.iter())
            .find(|(_, v)| !v.is_finite())
        {
            return Err(WaveGridError::ValueOutOfRange {
                wavelength,
                value,
                min: f64::MIN,
                max: f64::MAX,
            });
        }
        Ok(())
    }

    /// Additionally require every value to lie within `[min, max]`.
    pub fn validate_range(&self, min: f64, max: f64) -> Result<(), WaveGridError> {
        self.validate()?;
        match self
            .wavelengths
            .iter()
            .zip(self.values.iter())
            .find(|(_, v)| **v < min || **v > max)
        {
            Some((&wavelength, &value)) => Err(WaveGridError::ValueOutOfRange {
                wavelength,
                value,
                min,
                max,
            }),
            None => Ok(()),
        }
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at `wavelength_nm`: linear between samples, edge value outside
    /// the tabulated range.
    pub fn at(&self, wavelength_nm: f64) -> Result<f64, WaveGridError> {
        if self.values.len() == 1 {
            return Ok(self.values[0]);
        }
        Ok(interp_clamped(wavelength_nm, &self.wavelengths, &self.values)?)
    }

    /// Resample onto every sample of `grid`.
    pub fn resample(&self, grid: &WaveGrid) -> Result<Vec<f64>, WaveGridError> {
        grid.iter().map(|w| self.at(w)).collect()
    }
}
