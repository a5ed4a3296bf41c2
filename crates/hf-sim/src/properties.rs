//! Material, fluid and injection properties.
//!
//! Case files carry the raw quantities; [`Material::on_mesh`] and
//! [`Injection::on_mesh`] evaluate them once per mesh into per-cell arrays
//! with the scaled moduli `E' = E/(1−ν²)`, `K' = √(32/π)·K_Ic`, `C' = 2·C_L`
//! and `μ' = 12·μ`.

use hf_core::units::{DynVisc, Pressure, VolumeRate, si};
use hf_mesh::CartesianMesh;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// `√(32/π)`
pub const KPRIME_FACTOR: f64 = 3.191_538_243_211_461_6;

/// Toughness as a function of position and propagation direction.
///
/// `angle` is the front normal angle measured from the x axis, folded into
/// `[0, π/2]`.
pub trait ToughnessModel: Send + Sync + std::fmt::Debug {
    /// Fracture toughness `K_Ic` (Pa·m^½).
    fn toughness(&self, point: [f64; 2], angle: f64) -> f64;

    /// Whether ribbon toughness has to be sampled on the projected front,
    /// which makes the step iterate on the front direction.
    fn needs_projection(&self) -> bool;
}

/// Coordinate axis a layered property varies along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    #[default]
    X,
    Y,
}

impl Axis {
    fn coordinate(self, point: [f64; 2]) -> f64 {
        match self {
            Axis::X => point[0],
            Axis::Y => point[1],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToughnessConfig {
    Uniform {
        k_ic: f64,
    },
    /// `k_ic` inside `|coordinate| < half_width`, `ratio·k_ic` beyond,
    /// ramped linearly over `smoothing` just inside the interface.
    Layered {
        k_ic: f64,
        ratio: f64,
        half_width: f64,
        #[serde(default)]
        axis: Axis,
        #[serde(default)]
        smoothing: f64,
    },
    /// Elliptic anisotropy with principal toughnesses along x and y.
    Elliptic { k_ic_x: f64, k_ic_y: f64 },
}

impl ToughnessModel for ToughnessConfig {
    fn toughness(&self, point: [f64; 2], angle: f64) -> f64 {
        match *self {
            ToughnessConfig::Uniform { k_ic } => k_ic,
            ToughnessConfig::Layered {
                k_ic,
                ratio,
                half_width,
                axis,
                smoothing,
            } => {
                let d = axis.coordinate(point).abs();
                let outer = ratio * k_ic;
                if d >= half_width {
                    outer
                } else if smoothing > 0.0 && d > half_width - smoothing {
                    k_ic + (outer - k_ic) * (d - (half_width - smoothing)) / smoothing
                } else {
                    k_ic
                }
            }
            ToughnessConfig::Elliptic { k_ic_x, k_ic_y } => {
                let (s, c) = angle.sin_cos();
                k_ic_x * k_ic_y / ((k_ic_y * c).powi(2) + (k_ic_x * s).powi(2)).sqrt()
            }
        }
    }

    fn needs_projection(&self) -> bool {
        !matches!(self, ToughnessConfig::Uniform { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StressConfig {
    Uniform {
        sigma0: f64,
    },
    /// `inside` within `|coordinate| ≤ half_width`, `outside` beyond.
    Layered {
        inside: f64,
        outside: f64,
        half_width: f64,
        #[serde(default)]
        axis: Axis,
    },
}

impl Default for StressConfig {
    fn default() -> Self {
        StressConfig::Uniform { sigma0: 0.0 }
    }
}

impl StressConfig {
    pub fn at(&self, point: [f64; 2]) -> f64 {
        match *self {
            StressConfig::Uniform { sigma0 } => sigma0,
            StressConfig::Layered {
                inside,
                outside,
                half_width,
                axis,
            } => {
                if axis.coordinate(point).abs() <= half_width {
                    inside
                } else {
                    outside
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    /// Young's modulus (Pa)
    pub youngs_modulus: f64,
    pub poisson_ratio: f64,
    pub toughness: ToughnessConfig,
    #[serde(default)]
    pub confining_stress: StressConfig,
    /// Carter leak-off coefficient `C_L` (m/s^½)
    #[serde(default)]
    pub carter_coefficient: f64,
    /// Leak-off stops where the fluid pressure is at or below this value
    #[serde(default)]
    pub pore_pressure: f64,
}

impl MaterialConfig {
    /// Uniform-toughness material from typed quantities.
    pub fn from_units(youngs_modulus: Pressure, poisson_ratio: f64, k_ic: f64) -> Self {
        Self {
            youngs_modulus: si::pascals(youngs_modulus),
            poisson_ratio,
            toughness: ToughnessConfig::Uniform { k_ic },
            confining_stress: StressConfig::default(),
            carter_coefficient: 0.0,
            pore_pressure: 0.0,
        }
    }

    pub fn e_prime(&self) -> f64 {
        self.youngs_modulus / (1.0 - self.poisson_ratio * self.poisson_ratio)
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.youngs_modulus > 0.0) || !self.youngs_modulus.is_finite() {
            return Err(SimError::InvalidConfig {
                what: format!("Young's modulus must be positive, got {}", self.youngs_modulus),
            });
        }
        if !(0.0..0.5).contains(&self.poisson_ratio) {
            return Err(SimError::InvalidConfig {
                what: format!("Poisson ratio must lie in [0, 0.5), got {}", self.poisson_ratio),
            });
        }
        if !(self.carter_coefficient >= 0.0) {
            return Err(SimError::InvalidConfig {
                what: format!(
                    "Carter coefficient must be non-negative, got {}",
                    self.carter_coefficient
                ),
            });
        }
        let k_ok = match self.toughness {
            ToughnessConfig::Uniform { k_ic } => k_ic >= 0.0,
            ToughnessConfig::Layered {
                k_ic,
                ratio,
                half_width,
                smoothing,
                ..
            } => k_ic >= 0.0 && ratio >= 0.0 && half_width > 0.0 && smoothing >= 0.0,
            ToughnessConfig::Elliptic { k_ic_x, k_ic_y } => k_ic_x > 0.0 && k_ic_y > 0.0,
        };
        if !k_ok {
            return Err(SimError::InvalidConfig {
                what: format!("invalid toughness {:?}", self.toughness),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluidConfig {
    /// Dynamic viscosity (Pa·s)
    pub viscosity: f64,
}

impl FluidConfig {
    pub fn from_units(viscosity: DynVisc) -> Self {
        Self {
            viscosity: si::pascal_seconds(viscosity),
        }
    }

    pub fn mu_prime(&self) -> f64 {
        12.0 * self.viscosity
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.viscosity >= 0.0) || !self.viscosity.is_finite() {
            return Err(SimError::InvalidConfig {
                what: format!("viscosity must be non-negative, got {}", self.viscosity),
            });
        }
        Ok(())
    }
}

/// Rate change taking effect at `from` (s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateChange {
    pub from: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionConfig {
    /// Total injection rate (m³/s) until the first scheduled change
    pub rate: f64,
    #[serde(default)]
    pub schedule: Vec<RateChange>,
    /// Source points; the rate is split evenly between their cells
    #[serde(default = "origin")]
    pub sources: Vec<[f64; 2]>,
}

fn origin() -> Vec<[f64; 2]> {
    vec![[0.0, 0.0]]
}

impl InjectionConfig {
    pub fn constant(rate: VolumeRate) -> Self {
        Self {
            rate: si::cubic_meters_per_second(rate),
            schedule: Vec::new(),
            sources: origin(),
        }
    }

    /// Total rate in effect at time `t`.
    pub fn rate_at(&self, t: f64) -> f64 {
        self.schedule
            .iter()
            .filter(|change| change.from <= t)
            .max_by(|a, b| a.from.total_cmp(&b.from))
            .map_or(self.rate, |change| change.rate)
    }

    pub fn validate(&self) -> SimResult<()> {
        let rates = std::iter::once(self.rate).chain(self.schedule.iter().map(|c| c.rate));
        for rate in rates {
            if !(rate >= 0.0) || !rate.is_finite() {
                return Err(SimError::InvalidConfig {
                    what: format!("injection rate must be non-negative, got {rate}"),
                });
            }
        }
        if self.sources.is_empty() {
            return Err(SimError::InvalidConfig {
                what: "injection needs at least one source".to_string(),
            });
        }
        Ok(())
    }
}

/// Material properties evaluated on one mesh.
#[derive(Debug, Clone)]
pub struct Material {
    pub e_prime: f64,
    pub k_prime: Vec<f64>,
    pub sigma0: Vec<f64>,
    pub c_prime: Vec<f64>,
    pub pore_pressure: f64,
    toughness: ToughnessConfig,
}

impl Material {
    pub fn on_mesh(config: &MaterialConfig, mesh: &CartesianMesh) -> SimResult<Self> {
        config.validate()?;
        let centers = mesh.centers();
        Ok(Self {
            e_prime: config.e_prime(),
            k_prime: centers
                .iter()
                .map(|&p| KPRIME_FACTOR * config.toughness.toughness(p, 0.0))
                .collect(),
            sigma0: centers.iter().map(|&p| config.confining_stress.at(p)).collect(),
            c_prime: vec![2.0 * config.carter_coefficient; mesh.num_cells()],
            pore_pressure: config.pore_pressure,
            toughness: config.toughness.clone(),
        })
    }

    /// `K'` at a front point moving along `angle`.
    pub fn k_prime_at(&self, point: [f64; 2], angle: f64) -> f64 {
        KPRIME_FACTOR * self.toughness.toughness(point, angle)
    }

    pub fn needs_projection(&self) -> bool {
        self.toughness.needs_projection()
    }
}

/// Injection evaluated on one mesh.
#[derive(Debug, Clone)]
pub struct Injection {
    pub source_cells: Vec<usize>,
    config: InjectionConfig,
}

impl Injection {
    pub fn on_mesh(config: &InjectionConfig, mesh: &CartesianMesh) -> SimResult<Self> {
        config.validate()?;
        let mut source_cells = config
            .sources
            .iter()
            .map(|&[x, y]| mesh.locate_element(x, y))
            .collect::<Result<Vec<_>, _>>()?;
        hf_core::cellset::normalize(&mut source_cells);
        Ok(Self {
            source_cells,
            config: config.clone(),
        })
    }

    pub fn total_rate(&self, t: f64) -> f64 {
        self.config.rate_at(t)
    }

    /// Per-cell injection rates at time `t`.
    pub fn rates(&self, t: f64, num_cells: usize) -> Vec<f64> {
        let mut q = vec![0.0; num_cells];
        let share = self.total_rate(t) / self.source_cells.len() as f64;
        for &c in &self.source_cells {
            q[c] += share;
        }
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_core::units::{gpa, m3ps, pa_s};

    #[test]
    fn scaled_moduli() {
        let mat = MaterialConfig::from_units(gpa(30.0), 0.25, 1e6);
        assert!((mat.e_prime() - 30e9 / 0.9375).abs() < 1e-3);
        let fluid = FluidConfig::from_units(pa_s(1e-3));
        assert!((fluid.mu_prime() - 1.2e-2).abs() < 1e-15);
        assert!((KPRIME_FACTOR - (32.0 / std::f64::consts::PI).sqrt()).abs() < 1e-15);
    }

    #[test]
    fn layered_toughness_ramps_into_barrier() {
        let k = ToughnessConfig::Layered {
            k_ic: 1e6,
            ratio: 4.0,
            half_width: 2.0,
            axis: Axis::X,
            smoothing: 0.5,
        };
        assert_eq!(k.toughness([0.0, 5.0], 0.0), 1e6);
        assert_eq!(k.toughness([-2.5, 0.0], 0.0), 4e6);
        let mid = k.toughness([1.75, 0.0], 0.0);
        assert!((mid - 2.5e6).abs() < 1e-6);
        assert!(k.needs_projection());
    }

    #[test]
    fn elliptic_toughness_hits_principal_values() {
        let k = ToughnessConfig::Elliptic {
            k_ic_x: 1e6,
            k_ic_y: 2e6,
        };
        assert!((k.toughness([0.0, 0.0], 0.0) - 1e6).abs() < 1e-6);
        assert!((k.toughness([0.0, 0.0], std::f64::consts::FRAC_PI_2) - 2e6).abs() < 1e-6);
    }

    #[test]
    fn schedule_switches_rate() {
        let mut inj = InjectionConfig::constant(m3ps(1e-3));
        inj.schedule = vec![
            RateChange { from: 10.0, rate: 0.0 },
            RateChange { from: 5.0, rate: 2e-3 },
        ];
        assert_eq!(inj.rate_at(1.0), 1e-3);
        assert_eq!(inj.rate_at(7.0), 2e-3);
        assert_eq!(inj.rate_at(10.0), 0.0);
    }

    #[test]
    fn injection_splits_between_sources() {
        let mesh = CartesianMesh::new(2.0, 2.0, 5, 5).unwrap();
        let cfg = InjectionConfig {
            rate: 1.0,
            schedule: Vec::new(),
            sources: vec![[-1.0, 0.0], [1.0, 0.0]],
        };
        let inj = Injection::on_mesh(&cfg, &mesh).unwrap();
        let q = inj.rates(0.0, mesh.num_cells());
        assert_eq!(q.iter().filter(|&&v| v == 0.5).count(), 2);
        assert!((q.iter().sum::<f64>() - 1.0).abs() < 1e-15);
    }
}
