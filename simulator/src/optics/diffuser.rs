//! Diffuser stage: blur added by elements behind the lens.
//!
//! `blur` models a cover glass or weak diffuser as an isotropic Gaussian.
//! `birefringent` models a four-spot optical low-pass filter: each plane
//! is replaced by the mean of four copies displaced by half the spot
//! separation along both axes.
//!
//! Both filters are separable and symmetric and run with mirrored edges,
//! so light that would leave the padded plane is folded back and every
//! plane total is preserved.
//!
//! Every call clears the optical image's cached illuminance, including
//! `skip`, so downstream consumers never read a stale map.

use log::{debug, warn};
use ndarray::{Array1, Axis};

use crate::hardware::optics::DiffuserMethod;
use crate::image_proc::convolve2d::{
    convolve_separable, fold_for_reflect, gaussian_kernel_1d, ConvolveOptions, EdgeMode,
};
use crate::optical_image::OpticalImage;
use crate::units::{Length, LengthExt};

/// Blurs narrower than this many samples leave the plane unchanged.
const MIN_SIGMA_PX: f64 = 1e-3;

/// Apply `method` to every wavelength plane of `oi`.
///
/// `blur` is the Gaussian standard deviation for `blur` and the spot
/// separation for `birefringent`. With `blur` selected but no scale set
/// the stage does nothing and logs a warning.
pub fn apply_diffuser(oi: &mut OpticalImage, method: DiffuserMethod, blur: Option<Length>) {
    oi.invalidate_illuminance();

    let spacing_m = match oi.sample_spacing() {
        Some(dx) => dx.as_meters(),
        None => {
            debug!("Diffuser: no image geometry, nothing to do");
            return;
        }
    };

    match method {
        DiffuserMethod::Skip => debug!("Diffuser: skip"),
        DiffuserMethod::Blur => {
            let Some(scale) = blur else {
                warn!("Diffuser blur selected without a blur scale; skipping");
                return;
            };
            let sigma_px = scale.as_meters() / spacing_m;
            if sigma_px < MIN_SIGMA_PX {
                debug!("Diffuser: blur sigma {sigma_px:.2e} px is negligible");
                return;
            }
            debug!(
                "Diffuser: gaussian blur, sigma {:.3} um ({:.3} px)",
                scale.as_micrometers(),
                sigma_px
            );
            gaussian_blur(oi, sigma_px);
        }
        DiffuserMethod::Birefringent => {
            let separation_px = blur.map_or(1.0, |d| d.as_meters() / spacing_m);
            debug!("Diffuser: birefringent, spot separation {separation_px:.3} px");
            birefringent_split(oi, separation_px);
        }
    }
}

fn gaussian_blur(oi: &mut OpticalImage, sigma_px: f64) {
    filter_planes(oi, &gaussian_kernel_1d(sigma_px));
}

fn birefringent_split(oi: &mut OpticalImage, separation_px: f64) {
    filter_planes(oi, &spot_pair_weights(separation_px / 2.0));
}

/// Taps splitting a sample equally between offsets `-h` and `+h`, with
/// bilinear weights when `h` is fractional.
fn spot_pair_weights(h: f64) -> Array1<f64> {
    let h = h.abs();
    let whole = h.floor();
    let frac = h - whole;
    let centre = whole as usize + 1;

    let mut weights = Array1::zeros(2 * centre + 1);
    for (offset, weight) in [(whole as usize, 1.0 - frac), (centre, frac)] {
        weights[centre + offset] += 0.5 * weight;
        weights[centre - offset] += 0.5 * weight;
    }
    weights
}

/// Run `kernel` along the rows and then the columns of every plane.
fn filter_planes(oi: &mut OpticalImage, kernel: &Array1<f64>) {
    let (rows, cols) = oi.size();
    let row_kernel = fold_for_reflect(&kernel.view(), cols);
    let col_kernel = fold_for_reflect(&kernel.view(), rows);
    let options = ConvolveOptions {
        parallel: true,
        edge_mode: EdgeMode::Reflect,
    };
    for mut plane in oi.photons_mut().axis_iter_mut(Axis(2)) {
        let filtered = convolve_separable(
            &plane.view(),
            &row_kernel.view(),
            &col_kernel.view(),
            options,
        );
        plane.assign(&filtered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::optics::OpticsConfig;
    use crate::optics::support::ImageGeometry;
    use crate::photometry::spectrum::WaveGrid;
    use crate::scene::Scene;
    use crate::units::{Angle, AngleExt};
    use approx::assert_relative_eq;
    use ndarray::{Array2, Array3};

    /// 16x16 scene at 1 um sampling, 20x20 after padding.
    fn image_with(cube: Array3<f64>) -> OpticalImage {
        let optics = OpticsConfig::new("Test", 4.0, Length::from_millimeters(50.0));
        let fov = 2.0 * (16.0 * 1e-6 / 2.0 / 0.05_f64).atan();
        let scene = Scene::uniform(
            16,
            16,
            WaveGrid::single(550.0).unwrap(),
            1.0,
            Angle::from_radians(fov),
            Length::from_meters(f64::INFINITY),
        )
        .unwrap();
        let mut oi = OpticalImage::new(optics);
        oi.begin(&scene);
        oi.set_geometry(ImageGeometry::new(&scene, oi.optics()).unwrap());
        oi.set_spectral_irradiance(cube);
        oi
    }

    fn centre_spike() -> Array3<f64> {
        let mut cube = Array3::zeros((20, 20, 1));
        cube[[10, 10, 0]] = 1.0;
        cube
    }

    #[test]
    fn test_skip_is_identity_and_clears_illuminance() {
        let mut oi = image_with(centre_spike());
        oi.set_illuminance(Array2::zeros((20, 20)), 0.0);
        apply_diffuser(&mut oi, DiffuserMethod::Skip, None);
        assert_eq!(oi.spectral_irradiance(), &centre_spike());
        assert!(oi.illuminance().is_none());
    }

    #[test]
    fn test_blur_without_scale_is_skipped() {
        let mut oi = image_with(centre_spike());
        apply_diffuser(&mut oi, DiffuserMethod::Blur, None);
        assert_eq!(oi.spectral_irradiance(), &centre_spike());
    }

    #[test]
    fn test_blur_spreads_and_conserves() {
        let mut oi = image_with(centre_spike());
        apply_diffuser(
            &mut oi,
            DiffuserMethod::Blur,
            Some(Length::from_micrometers(1.0)),
        );
        let out = oi.spectral_irradiance();
        assert_relative_eq!(out.sum(), 1.0, max_relative = 1e-9);
        assert!(out[[10, 10, 0]] < 1.0);
        assert!(out[[10, 11, 0]] > 0.0);
        assert_relative_eq!(out[[10, 11, 0]], out[[11, 10, 0]], max_relative = 1e-12);
        assert_relative_eq!(out[[10, 11, 0]], out[[10, 9, 0]], max_relative = 1e-12);
    }

    #[test]
    fn test_negligible_blur() {
        let mut oi = image_with(centre_spike());
        apply_diffuser(
            &mut oi,
            DiffuserMethod::Blur,
            Some(Length::from_nanometers(1e-6)),
        );
        assert_eq!(oi.spectral_irradiance(), &centre_spike());
    }

    #[test]
    fn test_birefringent_splits_into_four() {
        // Separation of 2 px shifts by exactly one sample each way
        let mut oi = image_with(centre_spike());
        apply_diffuser(
            &mut oi,
            DiffuserMethod::Birefringent,
            Some(Length::from_micrometers(2.0)),
        );
        let out = oi.spectral_irradiance();
        for &(r, c) in &[(9, 9), (9, 11), (11, 9), (11, 11)] {
            assert_relative_eq!(out[[r, c, 0]], 0.25, max_relative = 1e-9);
        }
        assert_relative_eq!(out[[10, 10, 0]], 0.0, epsilon = 1e-12);
        assert_relative_eq!(out.sum(), 1.0, max_relative = 1e-9);
    }

    #[test]
    fn test_birefringent_default_separation() {
        let mut oi = image_with(Array3::from_elem((20, 20, 1), 3.0));
        apply_diffuser(&mut oi, DiffuserMethod::Birefringent, None);
        for &v in oi.spectral_irradiance().iter() {
            assert_relative_eq!(v, 3.0, max_relative = 1e-12);
        }
    }

    fn ramp() -> Array3<f64> {
        Array3::from_shape_fn((20, 20, 1), |(r, c, _)| ((r * 3 + c * 7) % 5) as f64 + 0.5)
    }

    #[test]
    fn test_birefringent_conserves_beyond_padding() {
        // Spot offsets of 5 and 25 samples, past the 2 sample padding and
        // past the plane itself
        for separation_um in [10.0, 50.0] {
            let mut oi = image_with(ramp());
            let before = oi.spectral_irradiance().sum();
            apply_diffuser(
                &mut oi,
                DiffuserMethod::Birefringent,
                Some(Length::from_micrometers(separation_um)),
            );
            let out = oi.spectral_irradiance();
            assert_relative_eq!(out.sum(), before, max_relative = 1e-12);
            assert!(out.iter().all(|&v| v >= 0.0));
        }
    }

    #[test]
    fn test_birefringent_does_not_smear_edges() {
        let mut oi = image_with(Array3::from_elem((20, 20, 1), 3.0));
        apply_diffuser(
            &mut oi,
            DiffuserMethod::Birefringent,
            Some(Length::from_micrometers(10.0)),
        );
        for &v in oi.spectral_irradiance().iter() {
            assert_relative_eq!(v, 3.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_spot_pair_weights() {
        let whole = spot_pair_weights(1.0);
        assert_eq!(whole.to_vec(), vec![0.0, 0.5, 0.0, 0.5, 0.0]);

        let half = spot_pair_weights(0.5);
        assert_eq!(half.to_vec(), vec![0.25, 0.5, 0.25]);

        let frac = spot_pair_weights(2.25);
        assert_relative_eq!(frac.sum(), 1.0, max_relative = 1e-12);
        for i in 0..frac.len() {
            assert_eq!(frac[i], frac[frac.len() - 1 - i]);
        }
    }

    #[test]
    fn test_wide_blur_conserves() {
        // Gaussian far wider than the plane spreads it almost flat
        let mut oi = image_with(centre_spike());
        apply_diffuser(
            &mut oi,
            DiffuserMethod::Blur,
            Some(Length::from_micrometers(100.0)),
        );
        let out = oi.spectral_irradiance();
        assert_relative_eq!(out.sum(), 1.0, max_relative = 1e-9);
        let mean = 1.0 / 400.0;
        for &v in out.iter() {
            assert_relative_eq!(v, mean, max_relative = 1e-6);
        }
    }
}
