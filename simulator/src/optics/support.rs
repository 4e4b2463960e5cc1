//! Image-plane sampling geometry.
//!
//! The scene is imaged onto a grid of square samples whose spacing follows
//! from the field of view and the lens-to-image distance. The grid is
//! zero-padded by ⌈n/8⌉ samples on every side so that blur can spread
//! beyond the scene's edge instead of wrapping around.
//!
//! Both the spatial and the frequency support are centred on index `n/2`
//! (integer division). For the spatial grid this puts the pixel at
//! `(rows/2, cols/2)` exactly on the optical axis; for the frequency grid it
//! matches the layout undone by [`crate::algo::fft2::ifftshift2`].

use ndarray::{s, Array3};

use crate::error::OpticsError;
use crate::hardware::optics::OpticsConfig;
use crate::scene::Scene;
use crate::units::{AngleExt, Length, LengthExt};

/// Zero padding added to each side of an axis of length `n`.
pub fn pad_amount(n: usize) -> usize {
    n.div_ceil(8)
}

/// Zero-pad rows and columns of `cube` by `(pad_rows, pad_cols)` on each side.
pub fn pad_cube(cube: &Array3<f64>, pad_rows: usize, pad_cols: usize) -> Array3<f64> {
    let (rows, cols, planes) = cube.dim();
    let mut padded = Array3::zeros((rows + 2 * pad_rows, cols + 2 * pad_cols, planes));
    padded
        .slice_mut(s![pad_rows..pad_rows + rows, pad_cols..pad_cols + cols, ..])
        .assign(cube);
    padded
}

fn centred_coordinates(n: usize, step: f64) -> Vec<f64> {
    let centre = (n / 2) as f64;
    (0..n).map(|i| (i as f64 - centre) * step).collect()
}

/// Sample positions in meters relative to the optical axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialSupport {
    /// Row coordinates (y)
    pub y: Vec<f64>,
    /// Column coordinates (x)
    pub x: Vec<f64>,
}

impl SpatialSupport {
    /// Sample positions for a `rows × cols` plane with pitch `spacing_m`.
    pub fn new(rows: usize, cols: usize, spacing_m: f64) -> Self {
        Self {
            y: centred_coordinates(rows, spacing_m),
            x: centred_coordinates(cols, spacing_m),
        }
    }

    /// Radial distance of sample `(row, col)` from the axis.
    pub fn radius(&self, row: usize, col: usize) -> f64 {
        self.y[row].hypot(self.x[col])
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.y.len(), self.x.len())
    }
}

/// Spatial frequencies in cycles per meter for a sampled plane.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySupport {
    /// Vertical frequencies, one per row
    pub fy: Vec<f64>,
    /// Horizontal frequencies, one per column
    pub fx: Vec<f64>,
}

impl FrequencySupport {
    /// Frequency grid for a `rows × cols` plane with square samples of
    /// `spacing_m`: `(k − n/2)/(n·dx)` on each axis.
    pub fn new(rows: usize, cols: usize, spacing_m: f64) -> Self {
        Self {
            fy: centred_coordinates(rows, 1.0 / (rows as f64 * spacing_m)),
            fx: centred_coordinates(cols, 1.0 / (cols as f64 * spacing_m)),
        }
    }

    /// Radial frequency of element `(row, col)`.
    pub fn radial(&self, row: usize, col: usize) -> f64 {
        self.fy[row].hypot(self.fx[col])
    }

    /// Magnitude of the most negative column frequency.
    ///
    /// This is the Nyquist frequency 1/(2·dx) for an even number of
    /// columns and (n−1)/(2n·dx) for an odd number `n`.
    pub fn nyquist(&self) -> f64 {
        match self.fx.first() {
            Some(f) => f.abs(),
            None => 0.0,
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.fy.len(), self.fx.len())
    }
}

/// Geometry of the image plane for one scene/lens pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    /// Lens-to-image distance
    pub image_distance: Length,
    /// Lateral magnification (0 for a source at infinity)
    pub magnification: f64,
    /// Square sample pitch in the image plane
    pub sample_spacing: Length,
    /// Scene rows and columns before padding
    pub scene_size: (usize, usize),
    /// Padding on each side, rows then columns
    pub pad: (usize, usize),
    /// Horizontal field of view of the scene, degrees
    pub field_of_view_deg: f64,
}

impl ImageGeometry {
    /// Derive image-plane geometry from the scene and lens.
    pub fn new(scene: &Scene, optics: &OpticsConfig) -> Result<Self, OpticsError> {
        let (rows, cols) = scene.size();
        if rows == 0 || cols == 0 {
            return Err(OpticsError::EmptyInput(format!(
                "scene '{}' has size {rows}x{cols}",
                scene.name()
            )));
        }

        let image_distance = optics.image_distance(scene.source_distance())?;
        let magnification = optics.magnification(scene.source_distance())?;

        let half_fov = scene.field_of_view().as_radians() / 2.0;
        let width_m = 2.0 * image_distance.as_meters() * half_fov.tan();
        let spacing_m = width_m / cols as f64;

        Ok(Self {
            image_distance,
            magnification,
            sample_spacing: Length::from_meters(spacing_m),
            scene_size: (rows, cols),
            pad: (pad_amount(rows), pad_amount(cols)),
            field_of_view_deg: scene.field_of_view_deg(),
        })
    }

    /// Rows and columns after padding.
    pub fn padded_size(&self) -> (usize, usize) {
        (
            self.scene_size.0 + 2 * self.pad.0,
            self.scene_size.1 + 2 * self.pad.1,
        )
    }

    /// Horizontal field of view spanned by the padded grid, degrees.
    pub fn padded_field_of_view_deg(&self) -> f64 {
        let (_, cols) = self.padded_size();
        let half_width = cols as f64 * self.sample_spacing.as_meters() / 2.0;
        2.0 * (half_width / self.image_distance.as_meters())
            .atan()
            .to_degrees()
    }

    pub fn spatial_support(&self) -> SpatialSupport {
        let (rows, cols) = self.padded_size();
        SpatialSupport::new(rows, cols, self.sample_spacing.as_meters())
    }

    pub fn frequency_support(&self) -> FrequencySupport {
        let (rows, cols) = self.padded_size();
        FrequencySupport::new(rows, cols, self.sample_spacing.as_meters())
    }
}
