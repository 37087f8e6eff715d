use crate::dense::Mat;
use crate::traits::LinearSolver;
use nalgebra::{DMatrix, DVector};

/// LU decomposition with partial pivoting.
#[derive(Debug, Default, Clone, Copy)]
pub struct LU {}

impl LinearSolver for LU {
    fn solve(&self, a_mat: &Mat<f64>, b: &[f64]) -> Result<Vec<f64>, String> {
        let n = a_mat.rows();
        if a_mat.cols() != n {
            return Err(format!("matrix must be square ({}x{})", n, a_mat.cols()));
        }
        if b.len() != n {
            return Err(format!("rhs length {} does not match order {}", b.len(), n));
        }

        let a = DMatrix::from_row_slice(n, n, a_mat.values());
        let x = a
            .lu()
            .solve(&DVector::from_column_slice(b))
            .ok_or_else(|| "matrix is singular".to_string())?;

        if x.iter().any(|xi| !xi.is_finite()) {
            return Err("solution is not finite".to_string());
        }
        Ok(x.iter().copied().collect())
    }
}
