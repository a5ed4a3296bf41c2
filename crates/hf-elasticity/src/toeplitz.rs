//! Block-Toeplitz backend.
//!
//! On a uniform mesh the influence between two cells depends only on the
//! absolute index offsets `(|di|, |dj|)`, so `nx * ny` coefficients describe
//! the whole operator.

use hf_mesh::CartesianMesh;

use crate::error::{ElasticityError, ElasticityResult};
use crate::kernel::rectangular_dd_influence;
use crate::operator::ElasticityOperator;

#[derive(Debug, Clone)]
pub struct ToeplitzElasticity {
    nx: usize,
    num_cells: usize,
    coefficients: Vec<f64>,
}

impl ToeplitzElasticity {
    pub fn new(mesh: &CartesianMesh, e_prime: f64) -> ElasticityResult<Self> {
        if !(e_prime > 0.0) || !e_prime.is_finite() {
            return Err(ElasticityError::InvalidModulus { value: e_prime });
        }
        let (nx, ny) = (mesh.nx(), mesh.ny());
        let (hx, hy) = (mesh.hx(), mesh.hy());
        let mut coefficients = Vec::with_capacity(nx * ny);
        for dj in 0..ny {
            for di in 0..nx {
                coefficients.push(rectangular_dd_influence(
                    di as f64 * hx,
                    dj as f64 * hy,
                    hx / 2.0,
                    hy / 2.0,
                    e_prime,
                ));
            }
        }
        Ok(Self {
            nx,
            num_cells: nx * ny,
            coefficients,
        })
    }
}

impl ElasticityOperator for ToeplitzElasticity {
    fn num_cells(&self) -> usize {
        self.num_cells
    }

    #[inline]
    fn entry(&self, row: usize, col: usize) -> f64 {
        let (ri, rj) = (row % self.nx, row / self.nx);
        let (ci, cj) = (col % self.nx, col / self.nx);
        self.coefficients[ri.abs_diff(ci) + self.nx * rj.abs_diff(cj)]
    }
}
