//! Validation of evaluated tip volumes.

use hf_core::mean;

use crate::error::{TipError, TipResult};

/// Negative volumes within this fraction of the mean are numerical noise.
pub const NEGATIVE_NOISE: f64 = 1e-4;

/// Reject non-finite, clearly negative, or all-zero tip volumes; flip small
/// negative ones to their absolute value.
pub fn validate_tip_volumes(cells: &[usize], volumes: &mut [f64]) -> TipResult<()> {
    for (&cell, &v) in cells.iter().zip(volumes.iter()) {
        if !v.is_finite() {
            return Err(TipError::VolumeInvalid { cell, value: v });
        }
    }
    let scale = mean(volumes).abs();
    for (&cell, v) in cells.iter().zip(volumes.iter_mut()) {
        if *v < 0.0 {
            if -*v <= NEGATIVE_NOISE * scale {
                *v = v.abs();
            } else {
                return Err(TipError::VolumeInvalid { cell, value: *v });
            }
        }
    }
    if !volumes.is_empty() && volumes.iter().all(|&v| v == 0.0) {
        return Err(TipError::VolumeInvalid {
            cell: cells.first().copied().unwrap_or_default(),
            value: 0.0,
        });
    }
    Ok(())
}
