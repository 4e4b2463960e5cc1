//! Miscellaneous numerical utilities.
//!
//! Currently holds the 1D linear interpolation used to put tabulated
//! spectral curves (photopic luminosity, lens transmittance) onto a
//! scene's wavelength grid.

use thiserror::Error;

/// Errors from 1D interpolation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpError {
    #[error("Value {0} is out of bounds for interpolation range [{1}, {2}]")]
    OutOfBounds(f64, f64, f64),
    #[error("Input vectors must have at least 2 points")]
    InsufficientData,
    #[error("Input vectors must have the same length")]
    MismatchedLengths,
    #[error("X values must be sorted in ascending order")]
    UnsortedData,
}

fn check_table(xs: &[f64], ys: &[f64]) -> Result<(), InterpError> {
    if xs.len() != ys.len() {
        return Err(InterpError::MismatchedLengths);
    }
    if xs.len() < 2 {
        return Err(InterpError::InsufficientData);
    }
    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(InterpError::UnsortedData);
    }
    Ok(())
}

/// Linear interpolation of `ys(xs)` at `x`.
///
/// `xs` must be strictly ascending. The interval is located by binary
/// search, so repeated queries against the same table are O(log n).
///
/// # Errors
///
/// * `InterpError::OutOfBounds` - x is outside \\[xs\\[0\\], xs\\[n-1\\]\\]
/// * `InterpError::InsufficientData` - fewer than 2 points
/// * `InterpError::MismatchedLengths` - xs and ys differ in length
/// * `InterpError::UnsortedData` - xs is not strictly ascending
pub fn interp(x: f64, xs: &[f64], ys: &[f64]) -> Result<f64, InterpError> {
    check_table(xs, ys)?;

    let min_x = xs[0];
    let max_x = xs[xs.len() - 1];
    if !(min_x..=max_x).contains(&x) {
        return Err(InterpError::OutOfBounds(x, min_x, max_x));
    }

    let idx = match xs.binary_search_by(|v| v.total_cmp(&x)) {
        Ok(exact) => return Ok(ys[exact]),
        Err(insert) => insert,
    };

    let (x1, x2) = (xs[idx - 1], xs[idx]);
    let (y1, y2) = (ys[idx - 1], ys[idx]);
    let t = (x - x1) / (x2 - x1);
    Ok(y1 + t * (y2 - y1))
}

/// Like [`interp`] but holds the first/last value outside the table.
pub fn interp_clamped(x: f64, xs: &[f64], ys: &[f64]) -> Result<f64, InterpError> {
    check_table(xs, ys)?;
    let clamped = x.clamp(xs[0], xs[xs.len() - 1]);
    interp(clamped, xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interp_midpoint() {
        let xs = [400.0, 500.0, 600.0];
        let ys = [0.0, 1.0, 0.5];
        assert_relative_eq!(interp(450.0, &xs, &ys).unwrap(), 0.5);
        assert_relative_eq!(interp(575.0, &xs, &ys).unwrap(), 0.625);
    }

    #[test]
    fn test_interp_exact_nodes() {
        let xs = [1.0, 2.0, 3.0];
        let ys = [10.0, 20.0, 30.0];
        assert_eq!(interp(1.0, &xs, &ys).unwrap(), 10.0);
        assert_eq!(interp(3.0, &xs, &ys).unwrap(), 30.0);
    }

    #[test]
    fn test_interp_errors() {
        assert_eq!(
            interp(0.0, &[1.0, 2.0], &[1.0, 2.0]),
            Err(InterpError::OutOfBounds(0.0, 1.0, 2.0))
        );
        assert_eq!(
            interp(1.0, &[1.0], &[1.0]),
            Err(InterpError::InsufficientData)
        );
        assert_eq!(
            interp(1.0, &[1.0, 2.0], &[1.0]),
            Err(InterpError::MismatchedLengths)
        );
        assert_eq!(
            interp(1.5, &[2.0, 1.0], &[1.0, 2.0]),
            Err(InterpError::UnsortedData)
        );
    }

    #[test]
    fn test_interp_clamped_holds_edges() {
        let xs = [400.0, 700.0];
        let ys = [0.2, 0.8];
        assert_eq!(interp_clamped(300.0, &xs, &ys).unwrap(), 0.2);
        assert_eq!(interp_clamped(900.0, &xs, &ys).unwrap(), 0.8);
        assert_relative_eq!(interp_clamped(550.0, &xs, &ys).unwrap(), 0.5);
    }
}
