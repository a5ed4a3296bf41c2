//! Planar hydraulic fracture propagation with an explicit front step.
//!
//! Provides:
//! - Case configuration (mesh, material, fluid, injection, numerics)
//! - Radial initialization from the self-similar vertex solutions
//! - The explicit front step: tentative level set, tip volumes and
//!   leak-off, width/pressure solve, ribbon inversion with toughness
//!   projection
//! - A controller with time-step selection, retries, mesh extension,
//!   bridging onto geometric targets and termination criteria
//! - A bounded history of accepted states

pub mod bridging;
pub mod config;
pub mod controller;
pub mod error;
pub mod fracture;
pub mod history;
pub mod init;
pub mod problem;
pub mod properties;
pub mod step;

mod projection;

pub use bridging::{AspectRatioTarget, BridgeDecision, BridgingState, BridgingTarget, bridge};
pub use config::{
    CaseConfig, InitialConfig, InitialRegime, MeshConfig, PrescribedOpening, ProjectionPolicy,
    SimulationConfig,
};
pub use controller::{Controller, RunEnd, RunSummary, StepReport, TerminationCriterion};
pub use error::{SimError, SimResult, StepError, StepResult, StepStatus};
pub use fracture::Fracture;
pub use history::FractureHistory;
pub use init::{radial_fracture, vertex_time};
pub use problem::Problem;
pub use properties::{
    Axis, FluidConfig, Injection, InjectionConfig, Material, MaterialConfig, RateChange,
    StressConfig, ToughnessConfig, ToughnessModel,
};
pub use step::{StepOutcome, attempt_step};
