//! Off-axis relative illumination.
//!
//! A sample at radial distance r from the axis, on an image plane a
//! distance d behind the lens, sees the aperture at angle θ with
//! cos θ = d/√(d² + r²). Its irradiance is reduced by cos⁴θ.

use log::debug;
use ndarray::{Array2, Array3, Axis};

use super::support::SpatialSupport;
use crate::hardware::optics::OffAxisMethod;

/// cos⁴θ for every sample of `support`.
///
/// Exactly 1.0 on the axis and non-increasing with radius.
pub fn cos4th_factors(support: &SpatialSupport, image_distance_m: f64) -> Array2<f64> {
    let d2 = image_distance_m * image_distance_m;
    Array2::from_shape_fn(support.dim(), |(row, col)| {
        let r = support.radius(row, col);
        let cos2 = d2 / (d2 + r * r);
        cos2 * cos2
    })
}

/// Apply the selected falloff to every wavelength plane of `cube`.
pub fn apply_off_axis(
    cube: &mut Array3<f64>,
    method: OffAxisMethod,
    support: &SpatialSupport,
    image_distance_m: f64,
) {
    match method {
        OffAxisMethod::None => debug!("Off-axis falloff: none"),
        OffAxisMethod::Cos4th => {
            let factors = cos4th_factors(support, image_distance_m);
            debug!(
                "Off-axis falloff: cos4th, corner factor {:.4}",
                factors.iter().copied().fold(1.0, f64::min)
            );
            for mut plane in cube.axis_iter_mut(Axis(2)) {
                plane *= &factors;
            }
        }
    }
}
