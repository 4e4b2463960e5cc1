//! Hardware module for lens configurations

pub mod optics;

pub use optics::{DiffuserMethod, OffAxisMethod, OpticsConfig, OpticsModel};
