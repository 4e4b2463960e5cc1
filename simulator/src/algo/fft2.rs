//! Two-dimensional discrete Fourier transforms on ndarray planes.
//!
//! Row transforms followed by column transforms using `rustfft`. The
//! inverse is normalised by `1/(rows*cols)` so that a forward/inverse pair
//! is the identity. [`ifftshift2`] moves a plane from the centred frequency
//! layout (zero frequency at index `n/2`) into the transform's native
//! layout (zero frequency at index 0).

use ndarray::Array2;
use rustfft::{num_complex::Complex64, FftDirection, FftPlanner};

/// In-place 2D FFT of a complex plane.
pub fn fft2(data: &mut Array2<Complex64>, direction: FftDirection) {
    let (rows, cols) = data.dim();
    if rows == 0 || cols == 0 {
        return;
    }

    let mut planner = FftPlanner::<f64>::new();
    let row_fft = planner.plan_fft(cols, direction);
    let col_fft = planner.plan_fft(rows, direction);

    let mut buffer = Vec::with_capacity(rows.max(cols));
    for mut row in data.rows_mut() {
        buffer.clear();
        buffer.extend(row.iter().copied());
        row_fft.process(&mut buffer);
        for (dst, src) in row.iter_mut().zip(buffer.iter()) {
            *dst = *src;
        }
    }
    for mut col in data.columns_mut() {
        buffer.clear();
        buffer.extend(col.iter().copied());
        col_fft.process(&mut buffer);
        for (dst, src) in col.iter_mut().zip(buffer.iter()) {
            *dst = *src;
        }
    }

    if direction == FftDirection::Inverse {
        let scale = 1.0 / (rows * cols) as f64;
        data.mapv_inplace(|c| c * scale);
    }
}

/// Move a centred-layout plane (zero frequency at `(r/2, c/2)`) into the
/// transform's native layout (zero frequency at `(0, 0)`).
pub fn ifftshift2<T: Clone>(centred: &Array2<T>) -> Array2<T> {
    let (rows, cols) = centred.dim();
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        centred[[(i + rows / 2) % rows, (j + cols / 2) % cols]].clone()
    })
}
