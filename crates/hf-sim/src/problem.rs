//! Everything a step needs that does not change between steps on one mesh.

use std::sync::Arc;

use hf_elasticity::{ElasticityOperator, build_operator};
use hf_mesh::{CartesianMesh, ExtendedMesh};
use tracing::info;

use crate::config::SimulationConfig;
use crate::error::SimResult;
use crate::properties::{FluidConfig, Injection, InjectionConfig, Material, MaterialConfig};

/// Mesh, operator and properties of a simulation.
///
/// Rebuilt from the stored configs whenever the mesh is extended.
#[derive(Debug, Clone)]
pub struct Problem {
    pub mesh: CartesianMesh,
    pub operator: Arc<dyn ElasticityOperator>,
    pub material: Material,
    pub fluid: FluidConfig,
    pub injection: Injection,
    pub config: SimulationConfig,
    /// Cells with prescribed openings
    pub loaded: Vec<(usize, f64)>,
    material_config: MaterialConfig,
    injection_config: InjectionConfig,
}

impl Problem {
    pub fn new(
        mesh: CartesianMesh,
        material: &MaterialConfig,
        fluid: &FluidConfig,
        injection: &InjectionConfig,
        config: &SimulationConfig,
    ) -> SimResult<Self> {
        config.validate()?;
        fluid.validate()?;
        let props = Material::on_mesh(material, &mesh)?;
        let operator = build_operator(config.elasticity, &mesh, props.e_prime)?;
        let inj = Injection::on_mesh(injection, &mesh)?;
        let loaded = config
            .loading
            .iter()
            .map(|o| -> SimResult<(usize, f64)> {
                Ok((mesh.locate_element(o.point[0], o.point[1])?, o.width))
            })
            .collect::<SimResult<Vec<_>>>()?;
        info!(
            nx = mesh.nx(),
            ny = mesh.ny(),
            cells = mesh.num_cells(),
            elasticity = ?config.elasticity,
            "problem assembled"
        );
        Ok(Self {
            mesh,
            operator,
            material: props,
            fluid: *fluid,
            injection: inj,
            config: config.clone(),
            loaded,
            material_config: material.clone(),
            injection_config: injection.clone(),
        })
    }

    /// Same problem on an extended mesh.
    pub fn extended(&self, ext: &ExtendedMesh) -> SimResult<Self> {
        Self::new(
            ext.mesh.clone(),
            &self.material_config,
            &self.fluid,
            &self.injection_config,
            &self.config,
        )
    }
}
