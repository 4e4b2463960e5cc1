//! Scene radiance to image-plane irradiance.
//!
//! For a lens of f-number N imaging a source at magnification m, the
//! on-axis image irradiance is
//!
//! ```text
//! E = L · π / (4 · N² · (1 + |m|)²)
//! ```
//!
//! The cos⁴θ factor of the full camera equation is left to the off-axis
//! stage, so at the axis this is exactly the pinhole-camera law.

use std::f64::consts::PI;

use log::debug;
use ndarray::{Array3, Axis};

use super::support::{pad_cube, ImageGeometry};
use crate::error::OpticsError;
use crate::hardware::optics::OpticsConfig;
use crate::scene::Scene;

/// Radiance-to-irradiance factor π/(4·N²·(1+|m|)²).
pub fn irradiance_scale(f_number: f64, magnification: f64) -> f64 {
    let stretch = 1.0 + magnification.abs();
    PI / (4.0 * f_number * f_number * stretch * stretch)
}

/// Convert the scene radiance to padded image-plane irradiance.
///
/// Output has the padded size of `geometry` and the scene's wavelength
/// grid. The lens transmittance, when configured, is resampled onto the
/// scene grid and applied per wavelength.
pub fn scene_to_irradiance(
    scene: &Scene,
    optics: &OpticsConfig,
    geometry: &ImageGeometry,
) -> Result<Array3<f64>, OpticsError> {
    optics.validate()?;
    if scene.is_empty() {
        return Err(OpticsError::EmptyInput(format!(
            "scene '{}' has no samples",
            scene.name()
        )));
    }

    let scale = irradiance_scale(optics.f_number(), geometry.magnification);
    let transmittance = match optics.transmittance() {
        Some(curve) => curve.resample(scene.wavelengths())?,
        None => vec![1.0; scene.wavelengths().len()],
    };
    debug!(
        "Irradiance scale {:.6e} (f/{}, m = {:.4e})",
        scale,
        optics.f_number(),
        geometry.magnification
    );

    let (pad_rows, pad_cols) = geometry.pad;
    let mut cube = pad_cube(scene.radiance(), pad_rows, pad_cols);
    for (mut plane, t) in cube.axis_iter_mut(Axis(2)).zip(transmittance) {
        let factor = scale * t;
        plane.mapv_inplace(|v| v * factor);
    }
    Ok(cube)
}
