//! hf-mesh: fixed-topology Cartesian grid for the fracture plane.
//!
//! Provides:
//! - Cell centers, four- and eight-neighbor connectivity (boundary cells are
//!   their own neighbors)
//! - Vertex coordinates and cell/vertex connectivity
//! - Geometric queries (locate, circle selection)
//! - Domain extension with old-to-new index remapping
//! - Quarter symmetry of origin-centered meshes
//!
//! # Example
//!
//! ```
//! use hf_mesh::CartesianMesh;
//!
//! let mesh = CartesianMesh::new(1.0, 1.0, 5, 5).unwrap();
//! assert_eq!(mesh.num_cells(), 25);
//! let center = mesh.locate_element(0.0, 0.0).unwrap();
//! assert_eq!(mesh.center(center), [0.0, 0.0]);
//! ```

pub mod error;
pub mod extension;
pub mod mesh;
pub mod symmetry;
pub(crate) mod validate;

pub use error::{MeshError, MeshResult};
pub use extension::{ExtendedMesh, ExtensionPlan, extension_sides_for};
pub use mesh::{CartesianMesh, MeshDescriptor, Side};
pub use symmetry::QuarterSymmetry;
