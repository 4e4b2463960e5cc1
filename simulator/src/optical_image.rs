//! The optical image: lens output at the image plane.
//!
//! An [`OpticalImage`] carries the optics configuration that forms it and,
//! once computed, the padded spectral photon irradiance cube, the
//! wavelength grid shared with the scene, the image-plane geometry, and
//! the illuminance derived from the cube.
//!
//! Illuminance is a cache over the irradiance cube. Anything that changes
//! the cube clears it, and the accessors report `None` until it is
//! recomputed.

use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis};

use crate::hardware::optics::OpticsConfig;
use crate::optics::support::{FrequencySupport, ImageGeometry, SpatialSupport};
use crate::photometry::spectrum::WaveGrid;
use crate::scene::Scene;
use crate::units::Length;

#[derive(Debug, Clone)]
pub struct OpticalImage {
    optics: OpticsConfig,
    photons: Array3<f64>,
    wavelengths: Option<WaveGrid>,
    geometry: Option<ImageGeometry>,
    illuminance: Option<Array2<f64>>,
    mean_illuminance: Option<f64>,
}

impl OpticalImage {
    /// An empty optical image that will be formed with `optics`.
    pub fn new(optics: OpticsConfig) -> Self {
        Self {
            optics,
            photons: Array3::zeros((0, 0, 0)),
            wavelengths: None,
            geometry: None,
            illuminance: None,
            mean_illuminance: None,
        }
    }

    /// Reset for a new run on `scene`, adopting its wavelength grid.
    pub(crate) fn begin(&mut self, scene: &Scene) {
        self.photons = Array3::zeros((0, 0, scene.wavelengths().len()));
        self.wavelengths = Some(scene.wavelengths().clone());
        self.geometry = None;
        self.invalidate_illuminance();
    }

    pub(crate) fn set_geometry(&mut self, geometry: ImageGeometry) {
        self.geometry = Some(geometry);
    }

    /// Replace the irradiance cube; the cached illuminance is dropped.
    pub fn set_spectral_irradiance(&mut self, photons: Array3<f64>) {
        self.photons = photons;
        self.invalidate_illuminance();
    }

    /// Mutable access to the irradiance cube; the cached illuminance is dropped.
    pub(crate) fn photons_mut(&mut self) -> &mut Array3<f64> {
        self.invalidate_illuminance();
        &mut self.photons
    }

    /// Drop the cached illuminance map and its mean.
    ///
    /// Called by every operation that changes the irradiance cube.
    pub fn invalidate_illuminance(&mut self) {
        self.illuminance = None;
        self.mean_illuminance = None;
    }

    pub(crate) fn set_illuminance(&mut self, map: Array2<f64>, mean: f64) {
        self.illuminance = Some(map);
        self.mean_illuminance = Some(mean);
    }

    /// Lens configuration used to form this image.
    pub fn optics(&self) -> &OpticsConfig {
        &self.optics
    }

    /// Spectral photon irradiance, photons s⁻¹ m⁻² nm⁻¹, indexed
    /// `(row, col, wavelength)` over the padded grid.
    pub fn spectral_irradiance(&self) -> &Array3<f64> {
        &self.photons
    }

    /// Wavelength grid shared with the scene, `None` before the first run.
    pub fn wavelengths(&self) -> Option<&WaveGrid> {
        self.wavelengths.as_ref()
    }

    /// Irradiance plane at `wavelength_nm`, if it is on the grid.
    pub fn photons_at(&self, wavelength_nm: f64) -> Option<ArrayView2<'_, f64>> {
        let index = self.wavelengths.as_ref()?.index_of(wavelength_nm)?;
        if index >= self.photons.len_of(Axis(2)) {
            return None;
        }
        Some(self.photons.index_axis(Axis(2), index))
    }

    /// Illuminance map in lux, `None` until computed or after the cube changed.
    pub fn illuminance(&self) -> Option<&Array2<f64>> {
        self.illuminance.as_ref()
    }

    /// Spatial mean of [`Self::illuminance`] in lux.
    ///
    /// # Returns
    /// * `Some(lux)` - Mean over the whole padded grid
    /// * `None` - Illuminance has not been computed for the current cube
    pub fn mean_illuminance(&self) -> Option<f64> {
        self.mean_illuminance
    }

    /// Image-plane geometry of the last run.
    pub fn geometry(&self) -> Option<&ImageGeometry> {
        self.geometry.as_ref()
    }

    /// Horizontal field of view inherited from the scene, degrees.
    pub fn field_of_view_deg(&self) -> Option<f64> {
        self.geometry.map(|g| g.field_of_view_deg)
    }

    /// Horizontal field of view spanned by the padded grid, degrees.
    pub fn padded_field_of_view_deg(&self) -> Option<f64> {
        self.geometry.map(|g| g.padded_field_of_view_deg())
    }

    /// Square sample pitch in the image plane.
    pub fn sample_spacing(&self) -> Option<Length> {
        self.geometry.map(|g| g.sample_spacing)
    }

    /// Lens-to-image distance from the thin-lens equation.
    pub fn image_distance(&self) -> Option<Length> {
        self.geometry.map(|g| g.image_distance)
    }

    /// Padding on each side, rows then columns
    pub fn pad(&self) -> Option<(usize, usize)> {
        self.geometry.map(|g| g.pad)
    }

    /// (rows, cols) of the padded cube
    pub fn size(&self) -> (usize, usize) {
        let (rows, cols, _) = self.photons.dim();
        (rows, cols)
    }

    /// Sample positions in meters, centred on the optical axis.
    pub fn spatial_support(&self) -> Option<SpatialSupport> {
        self.geometry.map(|g| g.spatial_support())
    }

    /// Spatial frequencies in cycles per meter matching the padded grid.
    pub fn frequency_support(&self) -> Option<FrequencySupport> {
        self.geometry.map(|g| g.frequency_support())
    }

    /// The part of the cube that images the scene, without padding.
    pub fn scene_region(&self) -> ArrayView3<'_, f64> {
        match self.geometry {
            Some(g) => {
                let (pr, pc) = g.pad;
                let (rows, cols) = g.scene_size;
                self.photons.slice(s![pr..pr + rows, pc..pc + cols, ..])
            }
            None => self.photons.view(),
        }
    }
}
