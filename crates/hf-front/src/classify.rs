//! Channel / tip / ribbon / crack classification.

use hf_core::{CellMask, cellset};
use hf_mesh::CartesianMesh;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FrontError, FrontResult};
use crate::geometry::TipGeometry;
use crate::reconstruct::Reconstruction;

/// Filling fractions up to `1 + FILL_ROUNDING` are rounded to one.
pub const FILL_ROUNDING: f64 = 1e-4;

/// Cells at or above `1 - FULL_TOLERANCE` count as fully filled.
const FULL_TOLERANCE: f64 = 1e-9;

/// Small negative filling fractions within this bound are clipped to zero.
const NEGATIVE_TOLERANCE: f64 = 1e-12;

/// The four cell sets of a fracture footprint, each sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellSets {
    pub channel: Vec<usize>,
    pub tip: Vec<usize>,
    /// Channel cells with at least one tip neighbor
    pub ribbon: Vec<usize>,
    /// Channel and tip cells
    pub crack: Vec<usize>,
}

impl CellSets {
    /// Derive ribbon and crack from channel and tip.
    pub fn new(mesh: &CartesianMesh, mut channel: Vec<usize>, mut tip: Vec<usize>) -> Self {
        cellset::normalize(&mut channel);
        cellset::normalize(&mut tip);
        let tip_mask = CellMask::from_cells(mesh.num_cells(), &tip);
        let ribbon = channel
            .iter()
            .copied()
            .filter(|&c| {
                mesh.neighbors(c)
                    .into_iter()
                    .any(|n| n != c && tip_mask.contains(n))
            })
            .collect();
        let crack = cellset::union(&channel, &tip);
        Self {
            channel,
            tip,
            ribbon,
            crack,
        }
    }
}

/// Classified footprint with the geometry of the remaining tip cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub sets: CellSets,
    /// Geometry aligned with `sets.tip`
    pub tips: Vec<TipGeometry>,
    /// Filling fractions aligned with `sets.tip`
    pub fill: Vec<f64>,
    /// Cells that became channel in this classification
    pub graduated: Vec<usize>,
}

/// Round and validate a filling fraction.
pub fn checked_fill(cell: usize, ff: f64) -> FrontResult<f64> {
    if ff.is_nan() || ff < -NEGATIVE_TOLERANCE || ff > 1.0 + FILL_ROUNDING {
        return Err(FrontError::FillingFraction { cell, value: ff });
    }
    Ok(ff.clamp(0.0, 1.0))
}

/// Graduate fully filled cells to the channel and collect the rest as tip
/// cells.
pub fn classify(
    mesh: &CartesianMesh,
    prev_channel: &[usize],
    rec: &Reconstruction,
) -> FrontResult<Classification> {
    let prev = CellMask::from_cells(mesh.num_cells(), prev_channel);
    let mut channel = prev_channel.to_vec();
    let mut graduated = Vec::new();
    let mut tips = Vec::new();
    let mut fill = Vec::new();
    for (tip, &raw) in rec.tips.iter().zip(&rec.fill) {
        let ff = checked_fill(tip.cell, raw)?;
        if prev.contains(tip.cell) {
            continue;
        }
        if ff >= 1.0 - FULL_TOLERANCE {
            graduated.push(tip.cell);
            channel.push(tip.cell);
        } else {
            tips.push(*tip);
            fill.push(ff);
        }
    }
    if tips.is_empty() {
        return Err(FrontError::NoTipCells);
    }

    let order: Vec<usize> = {
        let mut idx: Vec<usize> = (0..tips.len()).collect();
        idx.sort_by_key(|&i| tips[i].cell);
        idx
    };
    let tips: Vec<TipGeometry> = order.iter().map(|&i| tips[i]).collect();
    let fill: Vec<f64> = order.iter().map(|&i| fill[i]).collect();
    let sets = CellSets::new(mesh, channel, tips.iter().map(|t| t.cell).collect());
    debug!(
        channel = sets.channel.len(),
        tip = sets.tip.len(),
        ribbon = sets.ribbon.len(),
        graduated = graduated.len(),
        "cells classified"
    );
    Ok(Classification {
        sets,
        tips,
        fill,
        graduated,
    })
}
