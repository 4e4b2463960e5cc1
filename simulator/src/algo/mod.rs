//! Numerical building blocks for image formation
//!
//! Interpolation and 2D FFT helpers.

pub mod fft2;
pub mod misc;

pub use fft2::{fft2, ifftshift2};
pub use misc::{interp, interp_clamped, InterpError};
