//! Scene descriptor: the spectral radiance that the lens images.
//!
//! A [`Scene`] is read-only input to the formation pipeline. It carries a
//! spectral radiance cube indexed `(row, col, wavelength)`, the wavelength
//! grid for the third axis, the horizontal angular field of view, and the
//! distance from the lens to the scene.

use ndarray::{s, Array3, Axis};

use crate::error::OpticsError;
use crate::photometry::spectrum::WaveGrid;
use crate::units::{Angle, AngleExt, Length, LengthExt};

/// Spectral radiance scene.
///
/// Radiance is in photons s⁻¹ sr⁻¹ m⁻² nm⁻¹ and must be non-negative.
#[derive(Debug, Clone)]
pub struct Scene {
    name: String,
    radiance: Array3<f64>,
    wavelengths: WaveGrid,
    field_of_view: Angle,
    distance: Length,
}

impl Scene {
    /// Build a scene, checking that the cube and grid agree.
    ///
    /// A cube with zero rows or columns is accepted here; the pipeline
    /// rejects it with [`OpticsError::EmptyInput`] before forming an image.
    ///
    /// # Arguments
    /// * `name` - Label used in log messages
    /// * `radiance` - Cube indexed `(row, col, wavelength)`, finite and non-negative
    /// * `wavelengths` - One sample per radiance plane
    /// * `field_of_view` - Horizontal field of view, strictly between 0 and 180 degrees
    /// * `distance` - Source distance; use an infinite length for a distant source
    ///
    /// # Returns
    /// * `Ok(Scene)` - Validated scene
    /// * `Err(OpticsError::WavelengthMismatch)` - Plane count differs from the grid
    /// * `Err(OpticsError::InvalidScene)` - Bad field of view, distance, or radiance
    pub fn new(
        name: impl Into<String>,
        radiance: Array3<f64>,
        wavelengths: WaveGrid,
        field_of_view: Angle,
        distance: Length,
    ) -> Result<Self, OpticsError> {
        let planes = radiance.len_of(Axis(2));
        if planes != wavelengths.len() {
            return Err(OpticsError::WavelengthMismatch {
                cube: planes,
                grid: wavelengths.len(),
            });
        }

        let fov_deg = field_of_view.as_degrees();
        if !(fov_deg > 0.0 && fov_deg < 180.0) {
            return Err(OpticsError::InvalidScene(format!(
                "field of view must be in (0, 180) degrees, got {fov_deg}"
            )));
        }

        let distance_m = distance.as_meters();
        if distance_m.is_nan() || distance_m <= 0.0 {
            return Err(OpticsError::InvalidScene(format!(
                "source distance must be positive, got {distance_m} m"
            )));
        }

        if let Some(bad) = radiance.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(OpticsError::InvalidScene(format!(
                "radiance must be finite and non-negative, found {bad}"
            )));
        }

        Ok(Self {
            name: name.into(),
            radiance,
            wavelengths,
            field_of_view,
            distance,
        })
    }

    /// Constant radiance `level` at every pixel and wavelength.
    pub fn uniform(
        rows: usize,
        cols: usize,
        wavelengths: WaveGrid,
        level: f64,
        field_of_view: Angle,
        distance: Length,
    ) -> Result<Self, OpticsError> {
        let radiance = Array3::from_elem((rows, cols, wavelengths.len()), level);
        Self::new("uniform", radiance, wavelengths, field_of_view, distance)
    }

    /// A single bright pixel at `(rows/2, cols/2)` on a black background.
    pub fn point_source(
        rows: usize,
        cols: usize,
        wavelengths: WaveGrid,
        level: f64,
        field_of_view: Angle,
        distance: Length,
    ) -> Result<Self, OpticsError> {
        let mut radiance = Array3::zeros((rows, cols, wavelengths.len()));
        if rows > 0 && cols > 0 {
            radiance.slice_mut(s![rows / 2, cols / 2, ..]).fill(level);
        }
        Self::new("point source", radiance, wavelengths, field_of_view, distance)
    }

    /// Human-readable scene label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spectral radiance in photons s⁻¹ sr⁻¹ m⁻² nm⁻¹, indexed
    /// `(row, col, wavelength)`.
    pub fn radiance(&self) -> &Array3<f64> {
        &self.radiance
    }

    /// Wavelength grid of the radiance planes.
    pub fn wavelengths(&self) -> &WaveGrid {
        &self.wavelengths
    }

    /// Horizontal field of view
    pub fn field_of_view(&self) -> Angle {
        self.field_of_view
    }

    /// Horizontal field of view in degrees.
    pub fn field_of_view_deg(&self) -> f64 {
        self.field_of_view.as_degrees()
    }

    /// Distance from the lens to the scene, infinite for a distant source.
    pub fn source_distance(&self) -> Length {
        self.distance
    }

    /// (rows, cols)
    pub fn size(&self) -> (usize, usize) {
        let (rows, cols, _) = self.radiance.dim();
        (rows, cols)
    }

    pub fn is_empty(&self) -> bool {
        self.radiance.is_empty()
    }
}
