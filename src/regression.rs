//! Least squares by SVD pseudo-inverse.

use faer::Mat;

use crate::error::{AdvisorError, Result};

fn design_matrix(x: &[Vec<f64>], num_features: usize) -> Result<Mat<f64>> {
    if let Some(row) = x.iter().find(|row| row.len() != num_features) {
        return Err(AdvisorError::DimensionMismatch {
            expected: num_features,
            got: row.len(),
        });
    }
    Ok(Mat::from_fn(x.len(), num_features, |i, j| x[i][j]))
}

/// Thin SVD of `matrix` as `(U, singular values, V)`.
fn thin_svd(matrix: &Mat<f64>) -> Result<(Mat<f64>, Vec<f64>, Mat<f64>)> {
    let svd = matrix
        .thin_svd()
        .map_err(|err| AdvisorError::NumericalError {
            message: format!("singular value decomposition failed: {err:?}"),
        })?;
    let singular_values = svd.S().column_vector().iter().copied().collect();
    Ok((svd.U().to_owned(), singular_values, svd.V().to_owned()))
}

/// Solve `x * beta = y` in the least squares sense via the pseudo-inverse.
///
/// Singular values at or below `rcond * s_max` are treated as zero, so
/// rank-deficient or under-determined designs yield the minimum-norm least
/// squares solution. With no rows the solution is all zeros.
pub fn solve(x: &[Vec<f64>], y: &[f64], num_features: usize, rcond: f64) -> Result<Vec<f64>> {
    if x.len() != y.len() {
        return Err(AdvisorError::DimensionMismatch {
            expected: x.len(),
            got: y.len(),
        });
    }
    if x.is_empty() {
        return Ok(vec![0.0; num_features]);
    }

    let matrix = design_matrix(x, num_features)?;
    let (u, singular_values, v) = thin_svd(&matrix)?;

    let s_max = singular_values.iter().copied().fold(0.0_f64, f64::max);
    let cutoff = rcond * s_max;

    // beta = V * diag(1/s) * U^T * y, skipping singular values under the cutoff
    let mut beta = vec![0.0; num_features];
    for (k, &s) in singular_values.iter().enumerate() {
        if s <= cutoff {
            continue;
        }
        let projection: f64 = y.iter().enumerate().map(|(i, yi)| u[(i, k)] * yi).sum();
        let weight = projection / s;
        for (j, bj) in beta.iter_mut().enumerate() {
            *bj += v[(j, k)] * weight;
        }
    }

    if beta.iter().any(|b| !b.is_finite()) {
        return Err(AdvisorError::NumericalError {
            message: "least squares solution is not finite".to_string(),
        });
    }
    Ok(beta)
}

/// Numerical rank of the matrix with rows `x`.
///
/// Singular values above `s_max * max(rows, cols) * f64::EPSILON` count
/// towards the rank.
pub fn matrix_rank(x: &[Vec<f64>], num_features: usize) -> Result<usize> {
    if x.is_empty() {
        return Ok(0);
    }
    let matrix = design_matrix(x, num_features)?;
    let (_, singular_values, _) = thin_svd(&matrix)?;
    let s_max = singular_values.iter().copied().fold(0.0_f64, f64::max);
    let tolerance = s_max * x.len().max(num_features) as f64 * f64::EPSILON;
    Ok(singular_values.iter().filter(|&&s| s > tolerance).count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_solve_exact_system() {
        let x = vec![vec![1.0, 0.0], vec![0.0, 2.0], vec![1.0, 1.0]];
        let y = vec![3.0, 4.0, 5.0];
        let beta = solve(&x, &y, 2, 1e-5).unwrap();
        assert_abs_diff_eq!(beta[0], 3.0, epsilon = 1e-10);
        assert_abs_diff_eq!(beta[1], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_solve_underdetermined_is_minimum_norm() {
        // One equation, two unknowns: b0 + b1 = 2 has minimum-norm solution (1, 1).
        let x = vec![vec![1.0, 1.0]];
        let beta = solve(&x, &[2.0], 2, 1e-5).unwrap();
        assert_abs_diff_eq!(beta[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(beta[1], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_solve_collinear_columns() {
        // Second column duplicates the first; the solution splits the weight evenly.
        let x = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![-1.0, -1.0]];
        let y = vec![2.0, 4.0, -2.0];
        let beta = solve(&x, &y, 2, 1e-5).unwrap();
        assert_abs_diff_eq!(beta[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(beta[1], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_solve_empty_and_mismatched() {
        assert_eq!(solve(&[], &[], 3, 1e-5).unwrap(), vec![0.0; 3]);
        assert!(matches!(
            solve(&[vec![1.0, 2.0]], &[1.0, 2.0], 2, 1e-5),
            Err(AdvisorError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            solve(&[vec![1.0]], &[1.0], 2, 1e-5),
            Err(AdvisorError::DimensionMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn test_matrix_rank() {
        assert_eq!(matrix_rank(&[], 3).unwrap(), 0);
        let x = vec![vec![1.0, 0.0, 0.0], vec![2.0, 0.0, 0.0]];
        assert_eq!(matrix_rank(&x, 3).unwrap(), 1);
        let x = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]];
        assert_eq!(matrix_rank(&x, 3).unwrap(), 3);
    }
}
