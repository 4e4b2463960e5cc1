//! Lens configuration for optical image formation.
//!
//! An [`OpticsConfig`] describes a thin, aberration-free lens with a circular
//! aperture: its f-number, focal length, and which model and per-stage
//! methods the formation pipeline should run.
//!
//! # Physics Models
//!
//! - **Cutoff frequency**: fc = 1/(λ·N) cycles per unit length in the image plane
//! - **Airy disk radius**: r = 1.22·λ·N
//! - **Thin lens**: 1/s' = 1/f − 1/d, magnification m = −s'/d
//!
//! # Examples
//!
//! ```rust
//! use optical_image_sim::hardware::optics::{OpticsConfig, OffAxisMethod, models::F4_50MM};
//! use optical_image_sim::units::{Length, LengthExt, Wavelength};
//!
//! let lens = F4_50MM.clone().with_off_axis(OffAxisMethod::None);
//! let fc = lens.cutoff_frequency(Wavelength::from_nanometers(550.0));
//! let airy = lens.airy_disk_radius(Wavelength::from_nanometers(550.0));
//!
//! assert_eq!(lens.f_number(), 4.0);
//! assert!((fc - 1.0 / (550e-9 * 4.0)).abs() < 1e-3);
//! assert!((airy.as_micrometers() - 1.22 * 0.55 * 4.0).abs() < 1e-9);
//! ```

use std::fmt;
use std::str::FromStr;

use log::warn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::OpticsError;
use crate::photometry::spectrum::SpectralCurve;
use crate::units::{Length, LengthExt, Wavelength};

/// Failure to recognise a model or method name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MethodParseError {
    #[error("unsupported optics model: {0}")]
    UnsupportedModel(String),

    #[error("unsupported off-axis method: {0}")]
    UnsupportedOffAxisMethod(String),

    #[error("unsupported diffuser method: {0}")]
    UnsupportedDiffuserMethod(String),
}

/// Lowercase and drop spaces, underscores, and hyphens so that
/// "Diffraction Limited", "diffraction_limited" and "diffractionLimited"
/// compare equal.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Which optics model forms the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OpticsModel {
    /// Geometric irradiance followed by the diffraction-limited OTF
    DiffractionLimited,
    /// Geometric irradiance only
    Skip,
}

impl FromStr for OpticsModel {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "diffractionlimited" | "dlmtf" => Ok(OpticsModel::DiffractionLimited),
            "skip" => Ok(OpticsModel::Skip),
            _ => Err(MethodParseError::UnsupportedModel(s.to_string())),
        }
    }
}

impl fmt::Display for OpticsModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpticsModel::DiffractionLimited => write!(f, "diffractionLimited"),
            OpticsModel::Skip => write!(f, "skip"),
        }
    }
}

impl TryFrom<String> for OpticsModel {
    type Error = MethodParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OpticsModel> for String {
    fn from(model: OpticsModel) -> Self {
        model.to_string()
    }
}

/// Relative illumination falloff away from the optical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OffAxisMethod {
    /// No falloff
    None,
    /// cos⁴θ falloff
    #[default]
    Cos4th,
}

impl OffAxisMethod {
    /// Parse, falling back to [`OffAxisMethod::Cos4th`] with a warning.
    pub fn parse_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: MethodParseError| {
            warn!("{err}; falling back to cos4th");
            OffAxisMethod::Cos4th
        })
    }
}

impl FromStr for OffAxisMethod {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "none" | "skip" => Ok(OffAxisMethod::None),
            "cos4th" | "cos4" => Ok(OffAxisMethod::Cos4th),
            _ => Err(MethodParseError::UnsupportedOffAxisMethod(s.to_string())),
        }
    }
}

impl fmt::Display for OffAxisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffAxisMethod::None => write!(f, "none"),
            OffAxisMethod::Cos4th => write!(f, "cos4th"),
        }
    }
}

impl From<String> for OffAxisMethod {
    fn from(value: String) -> Self {
        OffAxisMethod::parse_or_default(&value)
    }
}

impl From<OffAxisMethod> for String {
    fn from(method: OffAxisMethod) -> Self {
        method.to_string()
    }
}

/// Optional element after the lens that blurs the image further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiffuserMethod {
    /// No diffuser
    #[default]
    Skip,
    /// Isotropic Gaussian blur
    Blur,
    /// Four-spot birefringent anti-aliasing filter
    Birefringent,
}

impl DiffuserMethod {
    /// Parse, falling back to [`DiffuserMethod::Skip`] with a warning.
    pub fn parse_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: MethodParseError| {
            warn!("{err}; no diffuser will be applied");
            DiffuserMethod::Skip
        })
    }
}

impl FromStr for DiffuserMethod {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "skip" | "none" => Ok(DiffuserMethod::Skip),
            "blur" | "gaussian" => Ok(DiffuserMethod::Blur),
            "birefringent" => Ok(DiffuserMethod::Birefringent),
            _ => Err(MethodParseError::UnsupportedDiffuserMethod(s.to_string())),
        }
    }
}

impl fmt::Display for DiffuserMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffuserMethod::Skip => write!(f, "skip"),
            DiffuserMethod::Blur => write!(f, "blur"),
            DiffuserMethod::Birefringent => write!(f, "birefringent"),
        }
    }
}

impl From<String> for DiffuserMethod {
    fn from(value: String) -> Self {
        DiffuserMethod::parse_or_default(&value)
    }
}

impl From<DiffuserMethod> for String {
    fn from(method: DiffuserMethod) -> Self {
        method.to_string()
    }
}

/// Complete lens configuration for one formation run.
///
/// Immutable once handed to the pipeline. Use the `with_*` builders to
/// derive variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpticsConfig {
    /// Lens model name or identifier
    name: String,
    model: OpticsModel,
    /// Focal length divided by aperture diameter
    f_number: f64,
    focal_length: Length,
    #[serde(default)]
    off_axis: OffAxisMethod,
    #[serde(default)]
    diffuser: DiffuserMethod,
    /// Standard deviation of the diffuser blur (or birefringent spot
    /// separation) in the image plane
    #[serde(default)]
    diffuser_blur: Option<Length>,
    /// Lens spectral transmittance, values in [0, 1]
    #[serde(default)]
    transmittance: Option<SpectralCurve>,
}

impl OpticsConfig {
    /// Diffraction-limited lens with cos⁴ falloff and no diffuser.
    pub fn new(name: impl Into<String>, f_number: f64, focal_length: Length) -> Self {
        Self {
            name: name.into(),
            model: OpticsModel::DiffractionLimited,
            f_number,
            focal_length,
            off_axis: OffAxisMethod::default(),
            diffuser: DiffuserMethod::default(),
            diffuser_blur: None,
            transmittance: None,
        }
    }

    /// Parse a JSON configuration and validate it.
    ///
    /// # Arguments
    /// * `json` - Configuration object with `name`, `model`, `f_number` and
    ///   `focal_length` (meters), plus the optional method fields
    ///
    /// # Returns
    /// * `Ok(OpticsConfig)` - Parsed and validated configuration
    /// * `Err(OpticsError::InvalidOpticsConfiguration)` - Unsupported model
    ///   name or physically meaningless values
    /// * `Err(OpticsError::ConfigParse)` - Malformed JSON or missing fields
    pub fn from_json(json: &str) -> Result<Self, OpticsError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        // Unknown model names are configuration errors, not parse errors
        if let Some(model) = value.get("model").and_then(serde_json::Value::as_str) {
            model.parse::<OpticsModel>()?;
        }
        let config: OpticsConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, OpticsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that the lens is physically meaningful.
    pub fn validate(&self) -> Result<(), OpticsError> {
        if !(self.f_number.is_finite() && self.f_number > 0.0) {
            return Err(OpticsError::InvalidOpticsConfiguration(format!(
                "f-number must be positive, got {}",
                self.f_number
            )));
        }
        let focal_m = self.focal_length.as_meters();
        if !(focal_m.is_finite() && focal_m > 0.0) {
            return Err(OpticsError::InvalidOpticsConfiguration(format!(
                "focal length must be positive, got {focal_m} m"
            )));
        }
        if let Some(blur) = self.diffuser_blur {
            let blur_m = blur.as_meters();
            if !(blur_m.is_finite() && blur_m >= 0.0) {
                return Err(OpticsError::InvalidOpticsConfiguration(format!(
                    "diffuser blur must be non-negative, got {blur_m} m"
                )));
            }
        }
        if let Some(curve) = &self.transmittance {
            curve.validate_range(0.0, 1.0).map_err(|err| {
                OpticsError::InvalidOpticsConfiguration(format!("transmittance: {err}"))
            })?;
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> OpticsModel {
        self.model
    }

    pub fn f_number(&self) -> f64 {
        self.f_number
    }

    pub fn focal_length(&self) -> Length {
        self.focal_length
    }

    pub fn off_axis_method(&self) -> OffAxisMethod {
        self.off_axis
    }

    pub fn diffuser_method(&self) -> DiffuserMethod {
        self.diffuser
    }

    pub fn diffuser_blur_scale(&self) -> Option<Length> {
        self.diffuser_blur
    }

    pub fn transmittance(&self) -> Option<&SpectralCurve> {
        self.transmittance.as_ref()
    }

    /// Clear aperture diameter, f/N
    pub fn aperture_diameter(&self) -> Length {
        self.focal_length / self.f_number
    }

    /// Diffraction cutoff frequency in cycles per meter at the image plane.
    pub fn cutoff_frequency(&self, wavelength: Wavelength) -> f64 {
        1.0 / (wavelength.as_meters() * self.f_number)
    }

    /// Radius of the first dark ring of the Airy pattern, 1.22·λ·N
    pub fn airy_disk_radius(&self, wavelength: Wavelength) -> Length {
        Length::from_meters(1.22 * wavelength.as_meters() * self.f_number)
    }

    /// Lens-to-image distance for a source at `source_distance`.
    ///
    /// An infinite source distance focuses at the focal length. Sources at
    /// or inside the focal length produce no real image.
    pub fn image_distance(&self, source_distance: Length) -> Result<Length, OpticsError> {
        let f = self.focal_length.as_meters();
        let d = source_distance.as_meters();
        if d.is_infinite() && d > 0.0 {
            return Ok(self.focal_length);
        }
        if !(d.is_finite() && d > f) {
            return Err(OpticsError::InvalidOpticsConfiguration(format!(
                "source distance {d} m must exceed focal length {f} m"
            )));
        }
        Ok(Length::from_meters(1.0 / (1.0 / f - 1.0 / d)))
    }

    /// Lateral magnification −s'/d (zero for a source at infinity).
    pub fn magnification(&self, source_distance: Length) -> Result<f64, OpticsError> {
        let image = self.image_distance(source_distance)?;
        let d = source_distance.as_meters();
        if d.is_infinite() {
            return Ok(0.0);
        }
        Ok(-image.as_meters() / d)
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn with_model(&self, model: OpticsModel) -> Self {
        Self {
            model,
            ..self.clone()
        }
    }

    /// Set the model by name; unknown names are a configuration error.
    pub fn with_model_name(&self, name: &str) -> Result<Self, OpticsError> {
        Ok(self.with_model(name.parse()?))
    }

    pub fn with_f_number(&self, f_number: f64) -> Self {
        Self {
            f_number,
            ..self.clone()
        }
    }

    pub fn with_focal_length(&self, focal_length: Length) -> Self {
        Self {
            focal_length,
            ..self.clone()
        }
    }

    pub fn with_off_axis(&self, off_axis: OffAxisMethod) -> Self {
        Self {
            off_axis,
            ..self.clone()
        }
    }

    pub fn with_diffuser(&self, diffuser: DiffuserMethod, blur: Option<Length>) -> Self {
        Self {
            diffuser,
            diffuser_blur: blur,
            ..self.clone()
        }
    }

    pub fn with_transmittance(&self, transmittance: SpectralCurve) -> Self {
        Self {
            transmittance: Some(transmittance),
            ..self.clone()
        }
    }
}

/// Standard lens models
pub mod models {
    use super::*;

    /// Small camera-module lens, f/4 with 3.86 mm focal length
    pub static DEFAULT_LENS: Lazy<OpticsConfig> = Lazy::new(|| {
        OpticsConfig::new("Default f/4", 4.0, Length::from_millimeters(3.86))
    });

    /// f/4 50 mm
    pub static F4_50MM: Lazy<OpticsConfig> =
        Lazy::new(|| OpticsConfig::new("50mm f/4", 4.0, Length::from_millimeters(50.0)));

    /// f/2.8 35 mm
    pub static F2_8_35MM: Lazy<OpticsConfig> =
        Lazy::new(|| OpticsConfig::new("35mm f/2.8", 2.8, Length::from_millimeters(35.0)));
}
