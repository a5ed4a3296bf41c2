//! The operator contract shared by all backends.

use std::sync::Arc;

use hf_mesh::CartesianMesh;
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dense::DenseElasticity;
use crate::error::{ElasticityError, ElasticityResult};
use crate::toeplitz::ToeplitzElasticity;

/// Traction-from-opening operator over all cells of a mesh.
///
/// Backends differ only in storage; `entry`, `gather` and `matvec` must give
/// the same numbers for the same index sets.
pub trait ElasticityOperator: Send + Sync + std::fmt::Debug {
    /// Number of cells (rows and columns) of the full operator.
    fn num_cells(&self) -> usize;

    /// Influence of a unit opening of cell `col` on the traction at `row`.
    fn entry(&self, row: usize, col: usize) -> f64;

    /// Sub-matrix on the given row and column cell sets.
    fn gather(&self, rows: &[usize], cols: &[usize]) -> DMatrix<f64> {
        DMatrix::from_fn(rows.len(), cols.len(), |r, c| self.entry(rows[r], cols[c]))
    }

    /// `C[rows, cols] · x`, rows evaluated in parallel.
    fn matvec(&self, rows: &[usize], cols: &[usize], x: &[f64]) -> ElasticityResult<Vec<f64>> {
        check_sizes(self.num_cells(), rows, cols, x)?;
        Ok(rows
            .par_iter()
            .map(|&r| row_dot(self, r, cols, x))
            .collect())
    }

    /// Single-threaded `matvec`; same summation order as the parallel path.
    fn matvec_serial(
        &self,
        rows: &[usize],
        cols: &[usize],
        x: &[f64],
    ) -> ElasticityResult<Vec<f64>> {
        check_sizes(self.num_cells(), rows, cols, x)?;
        Ok(rows.iter().map(|&r| row_dot(self, r, cols, x)).collect())
    }
}

fn row_dot<O: ElasticityOperator + ?Sized>(op: &O, row: usize, cols: &[usize], x: &[f64]) -> f64 {
    cols.iter()
        .zip(x)
        .map(|(&c, xc)| op.entry(row, c) * xc)
        .sum()
}

fn check_sizes(len: usize, rows: &[usize], cols: &[usize], x: &[f64]) -> ElasticityResult<()> {
    if cols.len() != x.len() {
        return Err(ElasticityError::SizeMismatch {
            expected: cols.len(),
            got: x.len(),
        });
    }
    if let Some(&cell) = rows.iter().chain(cols).find(|&&c| c >= len) {
        return Err(ElasticityError::CellOutOfRange { cell, len });
    }
    Ok(())
}

/// Storage backend selected once at setup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElasticityKind {
    /// Full `n x n` matrix
    #[default]
    Dense,
    /// One coefficient per cell offset
    Toeplitz,
}

/// Build the operator for `mesh` with plain strain modulus `e_prime`.
pub fn build_operator(
    kind: ElasticityKind,
    mesh: &CartesianMesh,
    e_prime: f64,
) -> ElasticityResult<Arc<dyn ElasticityOperator>> {
    Ok(match kind {
        ElasticityKind::Dense => Arc::new(DenseElasticity::new(mesh, e_prime)?),
        ElasticityKind::Toeplitz => Arc::new(ToeplitzElasticity::new(mesh, e_prime)?),
    })
}
