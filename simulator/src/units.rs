//! Type-safe physical units for optical image formation
//!
//! Lengths (focal length, wavelength, sample spacing, diffuser blur) and
//! angles (field of view) are carried as `uom` quantities so that the
//! millimetre/micrometre/nanometre conversions that optics code is full of
//! happen in one place.

use uom::si::angle::{degree, radian};
use uom::si::length::{meter, micrometer, millimeter, nanometer};

/// Length in SI base units
pub type Length = uom::si::f64::Length;

/// Wavelengths are lengths, aliased for readability at call sites
pub type Wavelength = Length;

/// Plane angle
pub type Angle = uom::si::f64::Angle;

/// Extension trait for length conversions commonly used in optics
pub trait LengthExt {
    /// Create length from nanometers (wavelengths)
    fn from_nanometers(nm: f64) -> Self;

    /// Get length in nanometers
    fn as_nanometers(&self) -> f64;

    /// Create length from micrometers (sample spacing, blur)
    fn from_micrometers(um: f64) -> Self;

    /// Get length in micrometers
    fn as_micrometers(&self) -> f64;

    /// Create length from millimeters (focal lengths)
    fn from_millimeters(mm: f64) -> Self;

    /// Get length in millimeters
    fn as_millimeters(&self) -> f64;

    /// Create length from meters
    fn from_meters(m: f64) -> Self;

    /// Get length in meters
    fn as_meters(&self) -> f64;
}

impl LengthExt for Length {
    fn from_nanometers(nm: f64) -> Self {
        Length::new::<nanometer>(nm)
    }

    fn as_nanometers(&self) -> f64 {
        self.get::<nanometer>()
    }

    fn from_micrometers(um: f64) -> Self {
        Length::new::<micrometer>(um)
    }

    fn as_micrometers(&self) -> f64 {
        self.get::<micrometer>()
    }

    fn from_millimeters(mm: f64) -> Self {
        Length::new::<millimeter>(mm)
    }

    fn as_millimeters(&self) -> f64 {
        self.get::<millimeter>()
    }

    fn from_meters(m: f64) -> Self {
        Length::new::<meter>(m)
    }

    fn as_meters(&self) -> f64 {
        self.get::<meter>()
    }
}

/// Extension trait for angle conversions
pub trait AngleExt {
    fn from_degrees(deg: f64) -> Self;
    fn as_degrees(&self) -> f64;
    fn from_radians(rad: f64) -> Self;
    fn as_radians(&self) -> f64;
}

impl AngleExt for Angle {
    fn from_degrees(deg: f64) -> Self {
        Angle::new::<degree>(deg)
    }

    fn as_degrees(&self) -> f64 {
        self.get::<degree>()
    }

    fn from_radians(rad: f64) -> Self {
        Angle::new::<radian>(rad)
    }

    fn as_radians(&self) -> f64 {
        self.get::<radian>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wavelength_conversions() {
        let wavelength = Wavelength::from_nanometers(550.0);
        assert_relative_eq!(wavelength.as_nanometers(), 550.0, epsilon = 1e-9);
        assert_relative_eq!(wavelength.as_micrometers(), 0.55, epsilon = 1e-12);
        assert_relative_eq!(wavelength.as_meters(), 5.5e-7, epsilon = 1e-18);
    }

    #[test]
    fn test_focal_length_conversions() {
        let focal = Length::from_millimeters(50.0);
        assert_relative_eq!(focal.as_meters(), 0.05, epsilon = 1e-15);
        assert_relative_eq!(focal.as_micrometers(), 50_000.0, epsilon = 1e-6);

        let spacing = Length::from_micrometers(1.4);
        assert_relative_eq!(spacing.as_millimeters(), 0.0014, epsilon = 1e-15);
    }

    #[test]
    fn test_length_math() {
        let a = Length::from_micrometers(4.0);
        let b = Length::from_micrometers(2.5);
        assert_relative_eq!((a + b).as_micrometers(), 6.5, epsilon = 1e-9);
        assert_relative_eq!((a * 2.0).as_micrometers(), 8.0, epsilon = 1e-9);
        assert!(b < a);
    }

    #[test]
    fn test_angle_conversions() {
        let fov = Angle::from_degrees(10.0);
        assert_relative_eq!(fov.as_radians(), 10.0_f64.to_radians(), epsilon = 1e-15);
        let right = Angle::from_radians(std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(right.as_degrees(), 90.0, epsilon = 1e-12);
    }
}
