//! Accepted fracture state.

use hf_front::{CellSets, FrontLine, TipGeometry};
use hf_levelset::two_pass_signed_distance;
use hf_mesh::{CartesianMesh, ExtendedMesh, MeshDescriptor};
use serde::{Deserialize, Serialize};

use crate::error::{StepError, StepResult};

/// One accepted generation of the fracture.
///
/// Per-cell vectors span the whole mesh; `tips`, `fill` and `velocity` are
/// aligned with `sets.tip`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fracture {
    pub mesh: MeshDescriptor,
    pub time: f64,
    /// Signed distance to the front, negative inside
    pub sd: Vec<f64>,
    pub width: Vec<f64>,
    pub p_fluid: Vec<f64>,
    pub p_net: Vec<f64>,
    pub sets: CellSets,
    pub tips: Vec<TipGeometry>,
    pub fill: Vec<f64>,
    pub velocity: Vec<f64>,
    pub fronts: Vec<FrontLine>,
    /// Time each channel cell was reached by the front
    pub arrival: Vec<Option<f64>>,
    /// Time the zero vertex of each tip cell was reached
    pub zero_vertex_arrival: Vec<Option<f64>>,
    /// Leak-off volume of the last step
    pub leak_off: Vec<f64>,
    pub total_leak_off: f64,
    pub injected_volume: f64,
    /// Largest width each cell has had
    pub max_width: Vec<f64>,
    pub last_time_step: Option<f64>,
    pub closed: bool,
}

impl Fracture {
    pub fn num_cells(&self) -> usize {
        self.sd.len()
    }

    /// Stored fluid volume.
    pub fn volume(&self, cell_area: f64) -> f64 {
        self.width.iter().sum::<f64>() * cell_area
    }

    /// Fraction of the injected fluid still in the fracture.
    pub fn efficiency(&self) -> f64 {
        if self.injected_volume > 0.0 {
            (self.injected_volume - self.total_leak_off) / self.injected_volume
        } else {
            1.0
        }
    }

    /// Area enclosed by the front.
    pub fn footprint_area(&self, cell_area: f64) -> f64 {
        (self.sets.channel.len() as f64 + self.fill.iter().sum::<f64>()) * cell_area
    }

    pub fn max_velocity(&self) -> f64 {
        self.velocity.iter().copied().fold(0.0, f64::max)
    }

    pub fn tip_velocity(&self, cell: usize) -> Option<f64> {
        self.sets
            .tip
            .binary_search(&cell)
            .ok()
            .map(|k| self.velocity[k])
    }

    /// Bounding box `[xmin, xmax, ymin, ymax]` of the front segments.
    pub fn extent(&self) -> Option<[f64; 4]> {
        let mut points = self
            .fronts
            .iter()
            .flat_map(|f| f.segments.iter())
            .flat_map(|seg| seg.iter());
        let first = points.next()?;
        Some(points.fold(
            [first[0], first[0], first[1], first[1]],
            |[x0, x1, y0, y1], p| [x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1])],
        ))
    }

    /// Length over breadth of the front bounding box.
    pub fn aspect_ratio(&self) -> Option<f64> {
        let [x0, x1, y0, y1] = self.extent()?;
        let breadth = y1 - y0;
        (breadth > 0.0).then(|| (x1 - x0) / breadth)
    }

    /// Mean distance of the front points from `center`.
    pub fn mean_radius(&self, center: [f64; 2]) -> Option<f64> {
        let radii: Vec<f64> = self
            .fronts
            .iter()
            .flat_map(|f| f.segments.iter())
            .flat_map(|seg| seg.iter())
            .map(|p| (p[0] - center[0]).hypot(p[1] - center[1]))
            .collect();
        (!radii.is_empty()).then(|| hf_core::mean(&radii))
    }

    /// Carry the state onto an extended mesh and rebuild the signed distance
    /// from the tip cells.
    pub fn remapped(&self, ext: &ExtendedMesh) -> StepResult<Fracture> {
        let mesh = &ext.mesh;
        let map = |c: usize| ext.old_to_new[c];
        let channel = ext.remap_cells(&self.sets.channel);
        let tip = ext.remap_cells(&self.sets.tip);
        let sets = CellSets::new(mesh, channel, tip);

        let tips: Vec<TipGeometry> = self
            .tips
            .iter()
            .map(|t| TipGeometry {
                cell: map(t.cell),
                ..*t
            })
            .collect();
        let fronts = self
            .fronts
            .iter()
            .map(|f| FrontLine {
                cells: f.cells.iter().map(|&c| map(c)).collect(),
                ..f.clone()
            })
            .collect();

        let known: Vec<(usize, f64)> = self
            .sets
            .tip
            .iter()
            .map(|&c| (map(c), self.sd[c]))
            .collect();
        let sd = rebuild_signed_distance(mesh, &sets, &known)?;

        Ok(Fracture {
            mesh: mesh.descriptor(),
            time: self.time,
            sd,
            width: ext.remap(&self.width, 0.0),
            p_fluid: ext.remap(&self.p_fluid, 0.0),
            p_net: ext.remap(&self.p_net, 0.0),
            sets,
            tips,
            fill: self.fill.clone(),
            velocity: self.velocity.clone(),
            fronts,
            arrival: ext.remap(&self.arrival, None),
            zero_vertex_arrival: ext.remap(&self.zero_vertex_arrival, None),
            leak_off: ext.remap(&self.leak_off, 0.0),
            total_leak_off: self.total_leak_off,
            injected_volume: self.injected_volume,
            max_width: ext.remap(&self.max_width, 0.0),
            last_time_step: self.last_time_step,
            closed: self.closed,
        })
    }
}

/// Signed distance from `known` front values: outward over the cells
/// outside the crack, inward over the channel.
pub(crate) fn rebuild_signed_distance(
    mesh: &CartesianMesh,
    sets: &CellSets,
    known: &[(usize, f64)],
) -> StepResult<Vec<f64>> {
    let _t = hf_core::timing::step_timing::FAST_MARCHING.scope();
    let crack = hf_core::CellMask::from_cells(mesh.num_cells(), &sets.crack);
    let known_mask =
        hf_core::CellMask::from_cells(mesh.num_cells(), &known.iter().map(|k| k.0).collect::<Vec<_>>());
    let outward: Vec<usize> = (0..mesh.num_cells())
        .filter(|&c| !crack.contains(c) && !known_mask.contains(c))
        .collect();
    let inward: Vec<usize> = sets
        .channel
        .iter()
        .copied()
        .filter(|&c| !known_mask.contains(c))
        .collect();
    let (sd, report) = two_pass_signed_distance(mesh, known, &outward, &inward)?;
    if !report.unreached.is_empty() {
        return Err(StepError::LevelSetUnreached {
            count: report.unreached.len(),
        });
    }
    Ok(sd)
}
