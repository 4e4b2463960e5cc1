//! CIE 1924 photopic luminous efficiency function V(λ).
//!
//! V(λ) weights radiant power by the sensitivity of light-adapted human
//! vision, peaking at 555 nm. Multiplying by 683 lm/W converts weighted
//! watts to lumens, which is how the illuminance integrator turns spectral
//! irradiance into lux.
//!
//! Tabulated at 10 nm from 380 nm to 780 nm (plus the 555 nm peak) and
//! linearly interpolated. The function is zero outside the table.

use once_cell::sync::Lazy;

use super::spectrum::{SpectralCurve, WaveGrid};

#[rustfmt::skip]
const PHOTOPIC_WAVELENGTHS: [f64; 42] = [
    380.0, 390.0, 400.0, 410.0, 420.0, 430.0, 440.0, 450.0, 460.0, 470.0,
    480.0, 490.0, 500.0, 510.0, 520.0, 530.0, 540.0, 550.0, 555.0, 560.0,
    570.0, 580.0, 590.0, 600.0, 610.0, 620.0, 630.0, 640.0, 650.0, 660.0,
    670.0, 680.0, 690.0, 700.0, 710.0, 720.0, 730.0, 740.0, 750.0, 760.0,
    770.0, 780.0,
];

#[rustfmt::skip]
const PHOTOPIC_VALUES: [f64; 42] = [
    0.000039, 0.000120, 0.000396, 0.001210, 0.004000, 0.011600, 0.023000, 0.038000, 0.060000, 0.090980,
    0.139020, 0.208020, 0.323000, 0.503000, 0.710000, 0.862000, 0.954000, 0.994950, 1.000000, 0.995000,
    0.952000, 0.870000, 0.757000, 0.631000, 0.503000, 0.381000, 0.265000, 0.175000, 0.107000, 0.061000,
    0.032000, 0.017000, 0.008210, 0.004102, 0.002091, 0.001047, 0.000520, 0.000249, 0.000120, 0.000060,
    0.000030, 0.000015,
];

static PHOTOPIC: Lazy<SpectralCurve> = Lazy::new(|| {
    SpectralCurve::new(PHOTOPIC_WAVELENGTHS.to_vec(), PHOTOPIC_VALUES.to_vec())
        .expect("Photopic table should be valid")
});

/// V(λ) at `wavelength_nm`, zero outside 380-780 nm.
pub fn photopic_luminosity(wavelength_nm: f64) -> f64 {
    let first = PHOTOPIC_WAVELENGTHS[0];
    let last = PHOTOPIC_WAVELENGTHS[PHOTOPIC_WAVELENGTHS.len() - 1];
    if !(first..=last).contains(&wavelength_nm) {
        return 0.0;
    }
    PHOTOPIC.at(wavelength_nm).unwrap_or(0.0)
}

/// V(λ) sampled on every wavelength of `grid`.
pub fn photopic_curve(grid: &WaveGrid) -> Vec<f64> {
    grid.iter().map(photopic_luminosity).collect()
}
