//! Diffraction-limited optical image formation
//!
//! This crate turns a spectral radiance scene into the spectral irradiance
//! a thin, aberration-free lens forms at its image plane, together with
//! the photometric illuminance of that image.
//!
//! ```rust
//! use optical_image_sim::hardware::optics::models::F4_50MM;
//! use optical_image_sim::units::{Angle, AngleExt, Length, LengthExt};
//! use optical_image_sim::{compute_optical_image, OpticalImage, Scene, WaveGrid};
//!
//! let grid = WaveGrid::uniform(450.0, 650.0, 50.0).unwrap();
//! let scene = Scene::uniform(
//!     32,
//!     32,
//!     grid,
//!     1e17,
//!     Angle::from_degrees(1.0),
//!     Length::from_meters(f64::INFINITY),
//! )
//! .unwrap();
//!
//! let oi = compute_optical_image(&scene, OpticalImage::new(F4_50MM.clone())).unwrap();
//! assert_eq!(oi.size(), (40, 40));
//! assert!(oi.mean_illuminance().unwrap() > 0.0);
//! ```

pub mod algo;
pub mod error;
pub mod hardware;
pub mod image_proc;
pub mod optical_image;
pub mod optics;
pub mod photometry;
pub mod pipeline;
pub mod scene;
pub mod units;

// Re-exports for easier access
pub use error::OpticsError;
pub use hardware::optics::OpticsConfig;
pub use optical_image::OpticalImage;
pub use photometry::spectrum::WaveGrid;
pub use pipeline::{compute_optical_image, compute_optical_image_with_progress, ProgressSink};
pub use scene::Scene;
