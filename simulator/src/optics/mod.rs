//! Stages of optical image formation.
//!
//! Each stage works on the padded spectral irradiance cube in place, except
//! [`irradiance`] which produces it.

pub mod diffuser;
pub mod falloff;
pub mod irradiance;
pub mod otf;
pub mod support;

pub use otf::{cutoff_frequency, diffraction_limited_mtf, mtf_plane};
pub use support::{FrequencySupport, ImageGeometry, SpatialSupport};
