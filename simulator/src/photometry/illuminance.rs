//! Spectral photon irradiance to illuminance.
//!
//! Each wavelength plane is converted from photon flux to radiant flux
//! (E = hc/λ per photon), weighted by V(λ) and summed across the grid:
//!
//! ```text
//! lux = 683 · Δλ · Σ_λ photons(λ) · hc/λ · V(λ)
//! ```

use ndarray::{Array2, Array3, Axis};

use super::luminosity::photopic_curve;
use super::spectrum::{photon_energy_joules, WaveGrid, SI};
use crate::error::OpticsError;

/// Illuminance map in lux for a photon irradiance cube
/// (photons s⁻¹ m⁻² nm⁻¹) sampled on `wavelengths`.
///
/// # Arguments
/// * `photons` - Cube indexed `(row, col, wavelength)`
/// * `wavelengths` - Grid with one sample per plane
///
/// # Returns
/// * `Ok(Array2)` - Lux per pixel
/// * `Err(OpticsError::WavelengthMismatch)` - Plane count differs from the grid
pub fn illuminance_map(
    photons: &Array3<f64>,
    wavelengths: &WaveGrid,
) -> Result<Array2<f64>, OpticsError> {
    let (rows, cols, planes) = photons.dim();
    if planes != wavelengths.len() {
        return Err(OpticsError::WavelengthMismatch {
            cube: planes,
            grid: wavelengths.len(),
        });
    }

    let bin = wavelengths.bin_width();
    let luminosity = photopic_curve(wavelengths);
    let mut lux = Array2::zeros((rows, cols));
    for ((plane, wavelength_nm), v) in photons
        .axis_iter(Axis(2))
        .zip(wavelengths.iter())
        .zip(luminosity)
    {
        let weight = SI::LUMINOUS_EFFICACY * bin * photon_energy_joules(wavelength_nm) * v;
        if weight > 0.0 {
            lux.scaled_add(weight, &plane);
        }
    }
    Ok(lux)
}

/// Spatial mean of an illuminance map, zero when the map is empty.
pub fn mean_illuminance(map: &Array2<f64>) -> f64 {
    map.mean().unwrap_or(0.0)
}
