//! Image processing routines used by the diffuser stage.

pub mod convolve2d;

pub use convolve2d::{
    convolve2d, convolve_separable, fold_for_reflect, gaussian_kernel_1d, ConvolveOptions,
    EdgeMode,
};
