//! 2D convolution for image-plane blur.
//!
//! Output has the same size as the input. Samples that fall outside the
//! plane are supplied by the selected [`EdgeMode`]. Kernels are applied
//! without flipping, which is a true convolution for the symmetric kernels
//! used here.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};

/// Options for controlling the convolution operation
#[derive(Debug, Clone, Copy)]
pub struct ConvolveOptions {
    /// Whether to use parallel processing with rayon
    pub parallel: bool,

    /// Controls how edges are handled
    pub edge_mode: EdgeMode,
}

impl Default for ConvolveOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            edge_mode: EdgeMode::Reflect,
        }
    }
}

/// Edge handling modes for convolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeMode {
    /// Uses a constant value for pixels outside image bounds
    Constant(f64),

    /// Mirrors the plane about its edges (`d c b a | a b c d | d c b a`)
    Reflect,

    /// Wraps around to the other side of the plane
    Wrap,

    /// Extends the edge pixels outward
    Extend,
}

/// Convolve `input` with `kernel`, centred on `(rows/2, cols/2)` of the kernel.
pub fn convolve2d(
    input: &ArrayView2<f64>,
    kernel: &ArrayView2<f64>,
    options: ConvolveOptions,
) -> Array2<f64> {
    let mut output = Array2::zeros(input.dim());
    if input.is_empty() || kernel.is_empty() {
        return output;
    }

    let accumulate = |(i, j): (usize, usize), out: &mut f64| {
        *out = kernel_sum(input, kernel, i, j, options.edge_mode);
    };

    if options.parallel {
        Zip::indexed(&mut output).par_for_each(accumulate);
    } else {
        Zip::indexed(&mut output).for_each(accumulate);
    }
    output
}

fn kernel_sum(
    input: &ArrayView2<f64>,
    kernel: &ArrayView2<f64>,
    i: usize,
    j: usize,
    edge_mode: EdgeMode,
) -> f64 {
    let (kernel_rows, kernel_cols) = kernel.dim();
    let kr = (kernel_rows / 2) as isize;
    let kc = (kernel_cols / 2) as isize;

    let mut sum = 0.0;
    for ((ki, kj), &weight) in kernel.indexed_iter() {
        let ii = i as isize + ki as isize - kr;
        let jj = j as isize + kj as isize - kc;
        sum += weight * get_pixel(input, ii, jj, edge_mode);
    }
    sum
}

fn get_pixel(input: &ArrayView2<f64>, i: isize, j: isize, edge_mode: EdgeMode) -> f64 {
    let (rows, cols) = input.dim();
    let (rows, cols) = (rows as isize, cols as isize);
    if i >= 0 && i < rows && j >= 0 && j < cols {
        return input[[i as usize, j as usize]];
    }

    let (ri, rj) = match edge_mode {
        EdgeMode::Constant(value) => return value,
        EdgeMode::Reflect => (reflect_index(i, rows), reflect_index(j, cols)),
        EdgeMode::Wrap => (i.rem_euclid(rows), j.rem_euclid(cols)),
        EdgeMode::Extend => (i.clamp(0, rows - 1), j.clamp(0, cols - 1)),
    };
    input[[ri as usize, rj as usize]]
}

/// Mirror `i` into `[0, n)`; valid for any offset, including ones larger
/// than the axis itself.
fn reflect_index(i: isize, n: isize) -> isize {
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m < n {
        m
    } else {
        period - 1 - m
    }
}

/// Row pass with `row_kernel`, then column pass with `col_kernel`.
///
/// Equivalent to [`convolve2d`] with the outer product of the two kernels
/// for every [`EdgeMode`], at a cost linear in the kernel length.
///
/// # Arguments
/// * `input` - Plane to filter
/// * `row_kernel` - Taps applied along each row, centred at `len/2`
/// * `col_kernel` - Taps applied along each column, centred at `len/2`
/// * `options` - Parallelism and edge handling, shared by both passes
///
/// # Returns
/// A plane with the same shape as `input`
pub fn convolve_separable(
    input: &ArrayView2<f64>,
    row_kernel: &ArrayView1<f64>,
    col_kernel: &ArrayView1<f64>,
    options: ConvolveOptions,
) -> Array2<f64> {
    let rows_done = convolve2d(input, &row_kernel.view().insert_axis(Axis(0)), options);
    convolve2d(
        &rows_done.view(),
        &col_kernel.view().insert_axis(Axis(1)),
        options,
    )
}

/// Normalized 1D Gaussian with standard deviation `sigma_px`.
///
/// The kernel extends ⌈3σ⌉ samples either side of its centre, so its
/// length is always odd. A non-positive `sigma_px` gives the identity.
pub fn gaussian_kernel_1d(sigma_px: f64) -> Array1<f64> {
    if !(sigma_px > 0.0) {
        return Array1::ones(1);
    }
    let half = (3.0 * sigma_px).ceil() as usize;
    let denom = 2.0 * sigma_px * sigma_px;

    let mut kernel = Array1::from_shape_fn(2 * half + 1, |i| {
        let x = i as f64 - half as f64;
        (-(x * x) / denom).exp()
    });

    let sum = kernel.sum();
    if sum > 0.0 {
        kernel.mapv_inplace(|v| v / sum);
    }
    kernel
}

/// Fold a centred 1D kernel onto at most `2 * axis_len + 1` taps.
///
/// Under [`EdgeMode::Reflect`] offsets `k` and `k + 2 * axis_len` read the
/// same sample for every output position, so convolving an axis of
/// `axis_len` samples with the folded kernel gives the same result as
/// with the original.
pub fn fold_for_reflect(kernel: &ArrayView1<f64>, axis_len: usize) -> Array1<f64> {
    let len = kernel.len();
    if axis_len == 0 || len <= 2 * axis_len + 1 {
        return kernel.to_owned();
    }

    let centre = (len / 2) as isize;
    let period = 2 * axis_len as isize;
    let mut folded = Array1::zeros(2 * axis_len + 1);
    for (i, &weight) in kernel.iter().enumerate() {
        let offset = i as isize - centre;
        folded[(offset + axis_len as isize).rem_euclid(period) as usize] += weight;
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_reflect_index() {
        let n = 4;
        let expected = [
            (-1, 0),
            (-2, 1),
            (-4, 3),
            (-5, 3),
            (4, 3),
            (5, 2),
            (8, 0),
            (11, 3),
        ];
        for (i, r) in expected {
            assert_eq!(reflect_index(i, n), r, "index {i}");
        }
        assert_eq!(reflect_index(-7, 1), 0);
    }

    #[test]
    fn test_identity_kernel() {
        let input = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let kernel = array![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let out = convolve2d(&input.view(), &kernel.view(), ConvolveOptions::default());
        assert_eq!(out, input);
    }

    #[test]
    fn test_edge_modes() {
        let input = array![[1.0, 2.0, 3.0]];
        // Picks the right neighbour
        let kernel = array![[0.0, 0.0, 1.0]];
        let run = |edge_mode| {
            convolve2d(
                &input.view(),
                &kernel.view(),
                ConvolveOptions {
                    parallel: false,
                    edge_mode,
                },
            )
        };
        assert_eq!(run(EdgeMode::Constant(9.0)), array![[2.0, 3.0, 9.0]]);
        assert_eq!(run(EdgeMode::Reflect), array![[2.0, 3.0, 3.0]]);
        assert_eq!(run(EdgeMode::Wrap), array![[2.0, 3.0, 1.0]]);
        assert_eq!(run(EdgeMode::Extend), array![[2.0, 3.0, 3.0]]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let input = Array2::from_shape_fn((17, 11), |(i, j)| ((i * 7 + j * 3) % 10) as f64);
        let kernel = gaussian_kernel_1d(1.3);
        let kernel = kernel.view().insert_axis(Axis(0));
        let par = convolve2d(&input.view(), &kernel, ConvolveOptions::default());
        let seq = convolve2d(
            &input.view(),
            &kernel,
            ConvolveOptions {
                parallel: false,
                ..Default::default()
            },
        );
        for (a, b) in par.iter().zip(seq.iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_gaussian_kernel_shape_and_sum() {
        let kernel = gaussian_kernel_1d(1.0);
        assert_eq!(kernel.len(), 7);
        assert_relative_eq!(kernel.sum(), 1.0, max_relative = 1e-12);
        assert_eq!(kernel[2], kernel[4]);
        assert!(kernel[3] > kernel[4]);

        assert_eq!(gaussian_kernel_1d(0.4).len(), 5);
        assert_eq!(gaussian_kernel_1d(0.0), Array1::<f64>::ones(1));
    }

    #[test]
    fn test_separable_matches_outer_product() {
        let input = Array2::from_shape_fn((9, 12), |(i, j)| ((i * 5 + j * 7) % 13) as f64);
        let row = array![0.25, 0.5, 0.25];
        let col = array![0.1, 0.2, 0.4, 0.2, 0.1];
        let full = Array2::from_shape_fn((5, 3), |(i, j)| col[i] * row[j]);

        for edge_mode in [
            EdgeMode::Reflect,
            EdgeMode::Wrap,
            EdgeMode::Extend,
            EdgeMode::Constant(0.0),
        ] {
            let options = ConvolveOptions {
                parallel: false,
                edge_mode,
            };
            let separable = convolve_separable(&input.view(), &row.view(), &col.view(), options);
            let direct = convolve2d(&input.view(), &full.view(), options);
            for (a, b) in separable.iter().zip(direct.iter()) {
                assert_relative_eq!(*a, *b, max_relative = 1e-12, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_folded_kernel_matches_wide_kernel() {
        // Kernel much wider than the axis it is applied to
        let input = Array2::from_shape_fn((1, 4), |(_, j)| [3.0, 0.0, 1.0, 7.0][j]);
        let wide = gaussian_kernel_1d(3.0);
        assert_eq!(wide.len(), 19);
        let folded = fold_for_reflect(&wide.view(), 4);
        assert_eq!(folded.len(), 9);
        assert_relative_eq!(folded.sum(), 1.0, max_relative = 1e-12);

        let options = ConvolveOptions {
            parallel: false,
            edge_mode: EdgeMode::Reflect,
        };
        let a = convolve2d(&input.view(), &wide.view().insert_axis(Axis(0)), options);
        let b = convolve2d(&input.view(), &folded.view().insert_axis(Axis(0)), options);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(*x, *y, max_relative = 1e-12);
        }
        assert_relative_eq!(a.sum(), input.sum(), max_relative = 1e-12);

        // Short kernels are untouched
        assert_eq!(fold_for_reflect(&wide.view(), 100), wide);
    }

    #[test]
    fn test_reflect_blur_preserves_constant() {
        let input = Array2::from_elem((6, 9), 2.5);
        let kernel = gaussian_kernel_1d(2.0);
        let out = convolve_separable(
            &input.view(),
            &kernel.view(),
            &kernel.view(),
            ConvolveOptions::default(),
        );
        for &v in out.iter() {
            assert_relative_eq!(v, 2.5, max_relative = 1e-12);
        }
    }
}
