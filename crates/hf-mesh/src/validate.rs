//! Mesh descriptor validation.

use crate::error::{MeshError, MeshResult};
use crate::mesh::MeshDescriptor;

/// Check counts and limits before any connectivity is built.
pub(crate) fn validate_descriptor(d: &MeshDescriptor) -> MeshResult<()> {
    for (axis, count) in [('x', d.nx), ('y', d.ny)] {
        if count < 3 {
            return Err(MeshError::TooFewCells { axis, count });
        }
    }
    for (axis, [min, max]) in [('x', d.x_limits), ('y', d.y_limits)] {
        if !min.is_finite() || !max.is_finite() || max <= min {
            return Err(MeshError::InvalidLimits { axis, min, max });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_descriptors() {
        let ok = MeshDescriptor {
            x_limits: [-1.0, 1.0],
            y_limits: [-1.0, 1.0],
            nx: 3,
            ny: 3,
        };
        assert!(validate_descriptor(&ok).is_ok());

        let few = MeshDescriptor { nx: 1, ..ok };
        assert_eq!(
            validate_descriptor(&few),
            Err(MeshError::TooFewCells { axis: 'x', count: 1 })
        );

        let flipped = MeshDescriptor {
            y_limits: [1.0, -1.0],
            ..ok
        };
        assert!(matches!(
            validate_descriptor(&flipped),
            Err(MeshError::InvalidLimits { axis: 'y', .. })
        ));
    }
}
