//! Diffraction-limited optical transfer function.
//!
//! An aberration-free lens with a circular pupil has a real, rotationally
//! symmetric OTF under incoherent illumination:
//!
//! ```text
//! MTF(f) = (2/π) · (φ − sin φ · cos φ),   φ = arccos(f/fc),   f ≤ fc
//! MTF(f) = 0,                                               f > fc
//! ```
//!
//! with cutoff fc = 1/(λ·N). Each wavelength plane is transformed, multiplied
//! by its MTF and transformed back. MTF(0) = 1, so the plane total is
//! preserved, and the operation is linear in the input.

use std::f64::consts::FRAC_2_PI;

use log::debug;
use ndarray::{Array2, Array3, Axis};
use rayon::prelude::*;
use rustfft::{num_complex::Complex64, FftDirection};

use super::support::FrequencySupport;
use crate::algo::fft2::{fft2, ifftshift2};
use crate::photometry::spectrum::WaveGrid;

/// Incoherent cutoff frequency in cycles per meter.
pub fn cutoff_frequency(wavelength_nm: f64, f_number: f64) -> f64 {
    1.0 / (wavelength_nm * 1e-9 * f_number)
}

/// Diffraction-limited MTF at radial `frequency` (cycles per meter).
pub fn diffraction_limited_mtf(frequency: f64, wavelength_nm: f64, f_number: f64) -> f64 {
    let rho = frequency.abs() / cutoff_frequency(wavelength_nm, f_number);
    if rho == 0.0 {
        return 1.0;
    }
    if rho >= 1.0 {
        return 0.0;
    }
    let phi = rho.acos();
    (FRAC_2_PI * (phi - phi.sin() * phi.cos())).max(0.0)
}

/// MTF over `support`, in centred layout (zero frequency at `(rows/2, cols/2)`).
pub fn mtf_plane(support: &FrequencySupport, wavelength_nm: f64, f_number: f64) -> Array2<f64> {
    Array2::from_shape_fn(support.dim(), |(row, col)| {
        diffraction_limited_mtf(support.radial(row, col), wavelength_nm, f_number)
    })
}

/// Multiply the spectrum of `plane` by `otf` (native FFT layout) and return
/// the real, non-negative part of the result.
pub fn filter_plane(plane: &Array2<f64>, otf: &Array2<f64>) -> Array2<f64> {
    let mut spectrum = plane.mapv(|v| Complex64::new(v, 0.0));
    fft2(&mut spectrum, FftDirection::Forward);
    spectrum.zip_mut_with(otf, |s, &m| *s *= m);
    fft2(&mut spectrum, FftDirection::Inverse);
    spectrum.mapv(|c| c.re.max(0.0))
}

/// Apply the diffraction-limited OTF to every wavelength plane of `cube`.
///
/// Planes are independent and are filtered in parallel.
///
/// # Arguments
/// * `cube` - Irradiance indexed `(row, col, wavelength)`, filtered in place
/// * `wavelengths` - One sample per plane, nanometers
/// * `support` - Frequency grid matching the plane shape
/// * `f_number` - Lens f-number, sets the cutoff 1/(λ·N)
pub fn apply_diffraction_limited(
    cube: &mut Array3<f64>,
    wavelengths: &WaveGrid,
    support: &FrequencySupport,
    f_number: f64,
) {
    if cube.is_empty() {
        return;
    }

    let nyquist = support.nyquist();
    cube.axis_iter_mut(Axis(2))
        .into_par_iter()
        .zip(wavelengths.as_slice().par_iter())
        .for_each(|(mut plane, &wavelength_nm)| {
            let fc = cutoff_frequency(wavelength_nm, f_number);
            if fc > nyquist {
                debug!(
                    "Cutoff {:.3e} cyc/m at {} nm exceeds Nyquist {:.3e} cyc/m; MTF truncated",
                    fc, wavelength_nm, nyquist
                );
            }
            let otf = ifftshift2(&mtf_plane(support, wavelength_nm, f_number));
            let filtered = filter_plane(&plane.to_owned(), &otf);
            plane.assign(&filtered);
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mtf_limits() {
        for &wavelength in &[400.0, 550.0, 700.0] {
            for &n in &[1.4, 4.0, 16.0] {
                let fc = cutoff_frequency(wavelength, n);
                assert_eq!(diffraction_limited_mtf(0.0, wavelength, n), 1.0);
                assert_eq!(diffraction_limited_mtf(fc, wavelength, n), 0.0);
                assert_eq!(diffraction_limited_mtf(1.5 * fc, wavelength, n), 0.0);
            }
        }
    }

    #[test]
    fn test_mtf_monotonic() {
        let fc = cutoff_frequency(550.0, 4.0);
        let mut previous = 1.0;
        for i in 1..=1000 {
            let value = diffraction_limited_mtf(fc * i as f64 / 1000.0, 550.0, 4.0);
            assert!(value <= previous, "MTF increased at step {i}");
            assert!(value >= 0.0);
            previous = value;
        }
    }

    #[test]
    fn test_mtf_half_cutoff() {
        // phi = acos(0.5) = pi/3 -> (2/pi)(pi/3 - sqrt(3)/4)
        let fc = cutoff_frequency(500.0, 2.0);
        let expected = FRAC_2_PI * (std::f64::consts::FRAC_PI_3 - 3.0_f64.sqrt() / 4.0);
        assert_relative_eq!(
            diffraction_limited_mtf(0.5 * fc, 500.0, 2.0),
            expected,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_mtf_plane_centred() {
        let support = FrequencySupport::new(8, 8, 1e-6);
        let plane = mtf_plane(&support, 550.0, 4.0);
        assert_eq!(plane[[4, 4]], 1.0);
        assert_eq!(plane[[4, 5]], plane[[4, 3]]);
        assert_eq!(plane[[5, 4]], plane[[3, 4]]);
        let native = ifftshift2(&plane);
        assert_eq!(native[[0, 0]], 1.0);
    }

    #[test]
    fn test_preserves_plane_total() {
        let support = FrequencySupport::new(32, 32, 0.5e-6);
        let grid = WaveGrid::new(vec![450.0, 550.0, 650.0]).unwrap();
        let mut cube = Array3::from_shape_fn((32, 32, 3), |(i, j, k)| {
            1.0 + 0.5 * ((i as f64 * 0.7).sin() * (j as f64 * 0.3).cos()) + k as f64
        });
        let before: Vec<f64> = (0..3).map(|k| cube.index_axis(Axis(2), k).sum()).collect();
        apply_diffraction_limited(&mut cube, &grid, &support, 4.0);
        for (k, total) in before.iter().enumerate() {
            let after = cube.index_axis(Axis(2), k).sum();
            assert_relative_eq!(after, *total, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_commutes_with_scaling() {
        let support = FrequencySupport::new(16, 16, 0.5e-6);
        let grid = WaveGrid::single(550.0).unwrap();
        let base = Array3::from_shape_fn((16, 16, 1), |(i, j, _)| ((i * 3 + j) % 5) as f64);

        let mut a = base.clone();
        apply_diffraction_limited(&mut a, &grid, &support, 2.8);
        a.mapv_inplace(|v| v * 3.5);

        let mut b = base.mapv(|v| v * 3.5);
        apply_diffraction_limited(&mut b, &grid, &support, 2.8);

        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_uniform_plane_unchanged() {
        let support = FrequencySupport::new(16, 12, 1e-6);
        let grid = WaveGrid::single(600.0).unwrap();
        let mut cube = Array3::from_elem((16, 12, 1), 4.0);
        apply_diffraction_limited(&mut cube, &grid, &support, 8.0);
        for &v in cube.iter() {
            assert_relative_eq!(v, 4.0, max_relative = 1e-10);
        }
    }
}
