//! Time-stepping driver.

use hf_core::timing::step_timing;
use hf_mesh::{CartesianMesh, ExtensionPlan, extension_sides_for};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::bridging::{BridgeDecision, BridgingState, BridgingTarget, bridge};
use crate::config::CaseConfig;
use crate::error::{SimError, SimResult, StepStatus};
use crate::fracture::Fracture;
use crate::history::FractureHistory;
use crate::init::radial_fracture;
use crate::problem::Problem;
use crate::step::{StepOutcome, attempt_step};

/// Bisections allowed while bridging onto a target before accepting anyway.
const MAX_BRIDGING_ATTEMPTS: usize = 40;

/// User condition ending a run early.
pub trait TerminationCriterion: Send + Sync {
    fn should_stop(&self, fracture: &Fracture) -> bool;
}

impl<F> TerminationCriterion for F
where
    F: Fn(&Fracture) -> bool + Send + Sync,
{
    fn should_stop(&self, fracture: &Fracture) -> bool {
        self(fracture)
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEnd {
    FinalTime,
    MaxSteps,
    Terminated,
    Closed,
}

/// One accepted step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub generation: usize,
    pub status: StepStatus,
    pub time: f64,
    pub dt: f64,
    /// Attempts including failed and bisected ones
    pub attempts: usize,
    /// The mesh was extended during this step
    pub extended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub end: RunEnd,
    pub steps: usize,
    pub time: f64,
    pub extensions: usize,
    pub reports: Vec<StepReport>,
}

/// Owns the problem and the accepted states, and advances them.
pub struct Controller {
    problem: Problem,
    history: FractureHistory,
    bridging: BridgingState,
    target: Option<Box<dyn BridgingTarget>>,
    termination: Vec<Box<dyn TerminationCriterion>>,
    extensions: usize,
    steps: usize,
}

impl Controller {
    pub fn new(problem: Problem, initial: Fracture) -> SimResult<Self> {
        if initial.mesh != problem.mesh.descriptor() || initial.num_cells() != problem.mesh.num_cells() {
            return Err(SimError::InvalidConfig {
                what: "initial fracture lives on a different mesh".to_string(),
            });
        }
        let history = FractureHistory::new(initial, problem.config.history_capacity);
        Ok(Self {
            problem,
            history,
            bridging: BridgingState::Idle,
            target: None,
            termination: Vec::new(),
            extensions: 0,
            steps: 0,
        })
    }

    /// Mesh, properties and radial initial state from a case file.
    pub fn from_case(case: &CaseConfig) -> SimResult<Self> {
        let m = &case.mesh;
        let mesh = CartesianMesh::new(m.lx, m.ly, m.nx, m.ny)?;
        let problem = Problem::new(
            mesh,
            &case.material,
            &case.fluid,
            &case.injection,
            &case.simulation,
        )?;
        let initial = radial_fracture(&problem, &case.initial)?;
        Self::new(problem, initial)
    }

    pub fn with_bridging(mut self, target: impl BridgingTarget + 'static) -> Self {
        self.target = Some(Box::new(target));
        self
    }

    pub fn with_termination(mut self, criterion: impl TerminationCriterion + 'static) -> Self {
        self.termination.push(Box::new(criterion));
        self
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn latest(&self) -> &Fracture {
        self.history.latest()
    }

    pub fn history(&self) -> &FractureHistory {
        &self.history
    }

    pub fn extensions(&self) -> usize {
        self.extensions
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Step length for the next attempt: the fastest tip crosses a fraction
    /// of a cell, bounded by the limit, the growth cap and the final time.
    ///
    /// A front whose fastest tip would advance less than `tol_v_stagnant`
    /// cell diagonals over the last step counts as stagnant and keeps the
    /// last step length.
    pub fn next_time_step(&self) -> f64 {
        let cfg = &self.problem.config;
        let mesh = &self.problem.mesh;
        let f = self.latest();
        let v = f.max_velocity();
        let stagnant = match f.last_time_step {
            Some(last) => !(v * last > cfg.tol_v_stagnant * mesh.cell_diag()),
            None => !(v > 0.0),
        };
        let mut dt = match cfg.fixed_time_step {
            Some(dt) => dt,
            None if !stagnant => cfg.time_step_prefactor * mesh.hx().min(mesh.hy()) / v,
            None => f.last_time_step.unwrap_or(0.1 * f.time),
        };
        if cfg.fixed_time_step.is_none()
            && let Some(last) = f.last_time_step
        {
            dt = dt.min(cfg.max_time_step_growth * last);
        }
        if let Some(limit) = cfg.time_step_limit {
            dt = dt.min(limit);
        }
        let remaining = cfg.final_time - f.time;
        if remaining > 0.0 {
            dt = dt.min(remaining);
        }
        dt
    }

    /// Advance by one accepted step, retrying with shorter steps and
    /// extending the mesh as needed.
    pub fn advance(&mut self) -> SimResult<StepReport> {
        let mut dt = self.next_time_step();
        let mut attempts = 0;
        let mut failures = 0;
        let mut bisections = 0;
        let mut extended = false;
        loop {
            attempts += 1;
            let result = attempt_step(&self.problem, self.history.latest(), dt);
            let err = match result {
                Ok(outcome) => {
                    if let Some(next) = self.bridge_retry(&outcome, dt, &mut bisections) {
                        dt = next;
                        continue;
                    }
                    return Ok(self.accept(outcome, dt, attempts, extended));
                }
                Err(err) => err,
            };

            if let Some(cells) = err.end_of_grid_cells() {
                if !self.problem.config.enable_remeshing {
                    return Err(SimError::StepFailed {
                        status: err.status(),
                        attempts,
                        source: err,
                    });
                }
                let cells = cells.to_vec();
                self.extend(&cells)?;
                extended = true;
                continue;
            }

            failures += 1;
            if failures > self.problem.config.max_reattempts {
                return Err(SimError::StepFailed {
                    status: err.status(),
                    attempts,
                    source: err,
                });
            }
            warn!(
                status = %err.status(),
                error = %err,
                dt,
                attempt = failures,
                "step attempt failed, retrying with a shorter step"
            );
            dt *= self.problem.config.reattempt_factor;
        }
    }

    /// Step until the final time, the step budget, a termination criterion
    /// or closure.
    pub fn run(&mut self) -> SimResult<RunSummary> {
        let final_time = self.problem.config.final_time;
        let max_steps = self.problem.config.max_steps;
        let mut reports = Vec::new();
        let end = loop {
            let f = self.latest();
            if f.closed {
                break RunEnd::Closed;
            }
            if f.time >= final_time * (1.0 - 1e-12) {
                break RunEnd::FinalTime;
            }
            if self.steps >= max_steps {
                break RunEnd::MaxSteps;
            }
            if self.termination.iter().any(|c| c.should_stop(f)) {
                break RunEnd::Terminated;
            }
            reports.push(self.advance()?);
        };
        step_timing::log_summary();
        let summary = RunSummary {
            end,
            steps: self.steps,
            time: self.latest().time,
            extensions: self.extensions,
            reports,
        };
        info!(
            end = ?summary.end,
            steps = summary.steps,
            time = summary.time,
            extensions = summary.extensions,
            "run finished"
        );
        Ok(summary)
    }

    fn accept(&mut self, outcome: StepOutcome, dt: f64, attempts: usize, extended: bool) -> StepReport {
        let status = outcome.status();
        let fracture = outcome.into_fracture();
        let time = fracture.time;
        let generation = self.history.push(fracture);
        self.steps += 1;
        info!(
            generation,
            time,
            dt,
            attempts,
            status = %status,
            "step accepted"
        );
        StepReport {
            generation,
            status,
            time,
            dt,
            attempts,
            extended,
        }
    }

    /// Shorter step to retry with when the attempt overshot the bridging
    /// target.
    fn bridge_retry(&mut self, outcome: &StepOutcome, dt: f64, bisections: &mut usize) -> Option<f64> {
        let target = self.target.as_ref()?;
        let before = target.measure(self.history.latest())?;
        let after = target.measure(outcome.fracture())?;
        match bridge(
            self.bridging,
            target.threshold(),
            target.tolerance(),
            before,
            after,
            dt,
        ) {
            BridgeDecision::Accept(state) => {
                self.bridging = state;
                None
            }
            BridgeDecision::Retry { .. } if *bisections >= MAX_BRIDGING_ATTEMPTS => {
                warn!(after, threshold = target.threshold(), "bridging gave up, accepting step");
                self.bridging = BridgingState::Idle;
                None
            }
            BridgeDecision::Retry { state, dt } => {
                *bisections += 1;
                self.bridging = state;
                Some(dt)
            }
        }
    }

    fn extend(&mut self, cells: &[usize]) -> SimResult<()> {
        let cfg = &self.problem.config;
        if self.extensions >= cfg.max_mesh_extensions {
            return Err(SimError::ExtensionLimit {
                extensions: self.extensions,
            });
        }
        let plan = ExtensionPlan {
            sides: extension_sides_for(&self.problem.mesh, cells),
            factor: cfg.mesh_extension_factor,
        };
        let ext = self.problem.mesh.extend(&plan)?;
        let cells = ext.mesh.num_cells();
        if cells > cfg.max_cells {
            return Err(SimError::CellLimit {
                cells,
                limit: cfg.max_cells,
            });
        }
        let problem = self.problem.extended(&ext)?;
        let fracture = self.history.latest().remapped(&ext)?;
        self.problem = problem;
        self.history.restart(fracture);
        self.extensions += 1;
        info!(
            sides = ?plan.sides,
            nx = self.problem.mesh.nx(),
            ny = self.problem.mesh.ny(),
            extensions = self.extensions,
            "mesh extended"
        );
        Ok(())
    }
}
