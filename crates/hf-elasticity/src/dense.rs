//! Full-matrix backend.

use hf_mesh::CartesianMesh;
use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{ElasticityError, ElasticityResult};
use crate::kernel::rectangular_dd_influence;
use crate::operator::ElasticityOperator;

/// Dense `n x n` influence matrix, assembled column by column in parallel.
#[derive(Debug, Clone)]
pub struct DenseElasticity {
    matrix: DMatrix<f64>,
}

impl DenseElasticity {
    pub fn new(mesh: &CartesianMesh, e_prime: f64) -> ElasticityResult<Self> {
        if !(e_prime > 0.0) || !e_prime.is_finite() {
            return Err(ElasticityError::InvalidModulus { value: e_prime });
        }
        let n = mesh.num_cells();
        let (a, b) = (mesh.hx() / 2.0, mesh.hy() / 2.0);
        debug!(cells = n, "assembling dense elasticity matrix");

        let mut data = vec![0.0; n * n];
        data.par_chunks_mut(n).enumerate().for_each(|(col, column)| {
            let pc = mesh.center(col);
            for (row, value) in column.iter_mut().enumerate() {
                let pr = mesh.center(row);
                *value = rectangular_dd_influence(pr[0] - pc[0], pr[1] - pc[1], a, b, e_prime);
            }
        });

        Ok(Self {
            matrix: DMatrix::from_vec(n, n, data),
        })
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

impl ElasticityOperator for DenseElasticity {
    fn num_cells(&self) -> usize {
        self.matrix.nrows()
    }

    #[inline]
    fn entry(&self, row: usize, col: usize) -> f64 {
        self.matrix[(row, col)]
    }
}
