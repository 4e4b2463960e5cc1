//! Optical image formation pipeline.
//!
//! [`compute_optical_image`] turns a [`Scene`] into an [`OpticalImage`] by
//! running, in order:
//!
//! 1. radiance to irradiance on the padded image-plane grid
//! 2. off-axis falloff
//! 3. diffraction-limited OTF (skipped for [`OpticsModel::Skip`])
//! 4. diffuser
//! 5. illuminance
//!
//! Configuration errors abort the run before any stage executes and no
//! partially formed image is returned.

use std::time::Instant;

use log::{debug, info};

use crate::error::OpticsError;
use crate::hardware::optics::OpticsModel;
use crate::optical_image::OpticalImage;
use crate::optics::diffuser::apply_diffuser;
use crate::optics::falloff::apply_off_axis;
use crate::optics::irradiance::scene_to_irradiance;
use crate::optics::otf::apply_diffraction_limited;
use crate::optics::support::ImageGeometry;
use crate::photometry::illuminance::{illuminance_map, mean_illuminance};
use crate::scene::Scene;
use crate::units::LengthExt;

/// Receives progress notifications at fixed fractions of a run.
///
/// Notifications are observational only.
pub trait ProgressSink {
    fn report(&mut self, _fraction: f64, _stage: &str) {}
}

/// Discards progress notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Form the optical image of `scene` with the optics carried by `oi`.
///
/// # Arguments
/// * `scene` - Spectral radiance to image
/// * `oi` - Optical image holding the lens configuration; any previous
///   result it carries is replaced
///
/// # Returns
/// * `Ok(OpticalImage)` - Padded irradiance cube, geometry and illuminance
/// * `Err(OpticsError)` - Invalid optics, empty scene, or a source at or
///   inside the focal length
pub fn compute_optical_image(
    scene: &Scene,
    oi: OpticalImage,
) -> Result<OpticalImage, OpticsError> {
    compute_optical_image_with_progress(scene, oi, &mut NoProgress)
}

/// [`compute_optical_image`] with progress reported to `progress`.
pub fn compute_optical_image_with_progress(
    scene: &Scene,
    mut oi: OpticalImage,
    progress: &mut dyn ProgressSink,
) -> Result<OpticalImage, OpticsError> {
    let optics = oi.optics().clone();
    optics.validate()?;
    if scene.is_empty() {
        return Err(OpticsError::EmptyInput(format!(
            "scene '{}' has no samples",
            scene.name()
        )));
    }
    let geometry = ImageGeometry::new(scene, &optics)?;

    let run_start = Instant::now();
    progress.report(0.0, "start");
    oi.begin(scene);
    oi.set_geometry(geometry);
    debug!(
        "Image plane: {}x{} padded to {}x{}, dx = {:.4} um, image distance {:.4} mm",
        geometry.scene_size.0,
        geometry.scene_size.1,
        geometry.padded_size().0,
        geometry.padded_size().1,
        geometry.sample_spacing.as_micrometers(),
        geometry.image_distance.as_millimeters()
    );

    let stage_start = Instant::now();
    let irradiance = scene_to_irradiance(scene, &optics, &geometry)?;
    oi.set_spectral_irradiance(irradiance);
    debug!("Irradiance computed in {:?}", stage_start.elapsed());
    progress.report(0.2, "irradiance");

    let stage_start = Instant::now();
    apply_off_axis(
        oi.photons_mut(),
        optics.off_axis_method(),
        &geometry.spatial_support(),
        geometry.image_distance.as_meters(),
    );
    debug!("Off-axis falloff applied in {:?}", stage_start.elapsed());
    progress.report(0.4, "off-axis");

    match optics.model() {
        OpticsModel::DiffractionLimited => {
            let stage_start = Instant::now();
            let wavelengths = scene.wavelengths();
            apply_diffraction_limited(
                oi.photons_mut(),
                wavelengths,
                &geometry.frequency_support(),
                optics.f_number(),
            );
            debug!(
                "Diffraction-limited OTF applied to {} planes in {:?}",
                wavelengths.len(),
                stage_start.elapsed()
            );
        }
        OpticsModel::Skip => debug!("Optics model skip: OTF not applied"),
    }
    progress.report(0.7, "otf");

    let stage_start = Instant::now();
    apply_diffuser(
        &mut oi,
        optics.diffuser_method(),
        optics.diffuser_blur_scale(),
    );
    debug!("Diffuser stage done in {:?}", stage_start.elapsed());
    progress.report(0.85, "diffuser");

    let map = illuminance_map(oi.spectral_irradiance(), scene.wavelengths())?;
    let mean = mean_illuminance(&map);
    oi.set_illuminance(map, mean);
    progress.report(1.0, "done");

    info!(
        "Optical image '{}' via {} ({}, f/{}): mean illuminance {:.4e} lux in {:?}",
        scene.name(),
        optics.name(),
        optics.model(),
        optics.f_number(),
        mean,
        run_start.elapsed()
    );
    Ok(oi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::optics::{OffAxisMethod, OpticsConfig};
    use crate::photometry::spectrum::WaveGrid;
    use crate::units::{Angle, AngleExt, Length};

    #[derive(Default)]
    struct Recorder {
        checkpoints: Vec<(f64, String)>,
    }

    impl ProgressSink for Recorder {
        fn report(&mut self, fraction: f64, stage: &str) {
            self.checkpoints.push((fraction, stage.to_string()));
        }
    }

    fn scene() -> Scene {
        Scene::uniform(
            8,
            8,
            WaveGrid::uniform(500.0, 600.0, 50.0).unwrap(),
            1e18,
            Angle::from_degrees(2.0),
            Length::from_meters(f64::INFINITY),
        )
        .unwrap()
    }

    #[test]
    fn test_progress_checkpoints() {
        let oi = OpticalImage::new(OpticsConfig::new("Test", 4.0, Length::from_millimeters(10.0)));
        let mut recorder = Recorder::default();
        compute_optical_image_with_progress(&scene(), oi, &mut recorder).unwrap();
        let fractions: Vec<f64> = recorder.checkpoints.iter().map(|(f, _)| *f).collect();
        assert_eq!(fractions, vec![0.0, 0.2, 0.4, 0.7, 0.85, 1.0]);
        assert_eq!(recorder.checkpoints[5].1, "done");
    }

    #[test]
    fn test_failure_reports_nothing() {
        let oi = OpticalImage::new(OpticsConfig::new("Bad", -1.0, Length::from_millimeters(10.0)));
        let mut recorder = Recorder::default();
        let result = compute_optical_image_with_progress(&scene(), oi, &mut recorder);
        assert!(matches!(
            result,
            Err(OpticsError::InvalidOpticsConfiguration(_))
        ));
        assert!(recorder.checkpoints.is_empty());
    }

    #[test]
    fn test_output_is_populated() {
        let optics = OpticsConfig::new("Test", 2.8, Length::from_millimeters(10.0))
            .with_off_axis(OffAxisMethod::None);
        let oi = compute_optical_image(&scene(), OpticalImage::new(optics)).unwrap();
        // ⌈8/8⌉ = 1 sample of padding on each side
        assert_eq!(oi.size(), (10, 10));
        assert_eq!(oi.pad(), Some((1, 1)));
        assert_eq!(oi.wavelengths(), Some(scene().wavelengths()));
        assert!(oi.illuminance().is_some());
        assert!(oi.mean_illuminance().unwrap() > 0.0);
        assert!(oi.spectral_irradiance().iter().all(|&v| v >= 0.0));
    }
}
