//! Cartesian mesh of rectangular cells.
//!
//! Cells are numbered `i + nx * j` with `i` along x and `j` along y. Cell
//! centers span the domain limits exactly, so with odd counts and symmetric
//! limits a cell is centered on the origin.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{MeshError, MeshResult};
use crate::validate;

/// Side of a cell, in edge order `[bottom, right, top, left]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bottom,
    Right,
    Top,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Bottom, Side::Right, Side::Top, Side::Left];

    pub fn opposite(self) -> Side {
        match self {
            Side::Bottom => Side::Top,
            Side::Right => Side::Left,
            Side::Top => Side::Bottom,
            Side::Left => Side::Right,
        }
    }
}

/// Minimal description a mesh is rebuilt from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshDescriptor {
    /// Extreme cell-center x coordinates `[xmin, xmax]`
    pub x_limits: [f64; 2],
    /// Extreme cell-center y coordinates `[ymin, ymax]`
    pub y_limits: [f64; 2],
    pub nx: usize,
    pub ny: usize,
}

/// Immutable Cartesian mesh with precomputed connectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MeshDescriptor", into = "MeshDescriptor")]
pub struct CartesianMesh {
    nx: usize,
    ny: usize,
    hx: f64,
    hy: f64,
    x_limits: [f64; 2],
    y_limits: [f64; 2],
    centers: Vec<[f64; 2]>,
    /// left, right, bottom, top
    neighbors: Vec<[usize; 4]>,
    /// bottom-left, bottom-right, top-right, top-left
    cell_vertices: Vec<[usize; 4]>,
    vertices: Vec<[f64; 2]>,
    boundary_band: Vec<usize>,
}

impl CartesianMesh {
    /// Mesh centered on the origin with cell centers spanning `[-lx, lx] x [-ly, ly]`.
    pub fn new(lx: f64, ly: f64, nx: usize, ny: usize) -> MeshResult<Self> {
        Self::with_limits([-lx, lx], [-ly, ly], nx, ny)
    }

    /// Mesh with explicit cell-center limits. Even counts are bumped to the
    /// next odd number.
    pub fn with_limits(
        x_limits: [f64; 2],
        y_limits: [f64; 2],
        nx: usize,
        ny: usize,
    ) -> MeshResult<Self> {
        let nx = odd_count(nx, 'x');
        let ny = odd_count(ny, 'y');
        validate::validate_descriptor(&MeshDescriptor {
            x_limits,
            y_limits,
            nx,
            ny,
        })?;

        let hx = (x_limits[1] - x_limits[0]) / (nx - 1) as f64;
        let hy = (y_limits[1] - y_limits[0]) / (ny - 1) as f64;
        let num_cells = nx * ny;

        let mut centers = Vec::with_capacity(num_cells);
        let mut neighbors = Vec::with_capacity(num_cells);
        let mut cell_vertices = Vec::with_capacity(num_cells);
        let mut boundary_band = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                let c = i + nx * j;
                centers.push([x_limits[0] + i as f64 * hx, y_limits[0] + j as f64 * hy]);
                let left = if i > 0 { c - 1 } else { c };
                let right = if i + 1 < nx { c + 1 } else { c };
                let bottom = if j > 0 { c - nx } else { c };
                let top = if j + 1 < ny { c + nx } else { c };
                neighbors.push([left, right, bottom, top]);

                let v = i + (nx + 1) * j;
                cell_vertices.push([v, v + 1, v + nx + 2, v + nx + 1]);

                if i <= 1 || j <= 1 || i + 2 >= nx || j + 2 >= ny {
                    boundary_band.push(c);
                }
            }
        }

        let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                vertices.push([
                    x_limits[0] - hx / 2.0 + i as f64 * hx,
                    y_limits[0] - hy / 2.0 + j as f64 * hy,
                ]);
            }
        }

        Ok(Self {
            nx,
            ny,
            hx,
            hy,
            x_limits,
            y_limits,
            centers,
            neighbors,
            cell_vertices,
            vertices,
            boundary_band,
        })
    }

    pub fn descriptor(&self) -> MeshDescriptor {
        MeshDescriptor {
            x_limits: self.x_limits,
            y_limits: self.y_limits,
            nx: self.nx,
            ny: self.ny,
        }
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn hx(&self) -> f64 {
        self.hx
    }

    pub fn hy(&self) -> f64 {
        self.hy
    }

    pub fn num_cells(&self) -> usize {
        self.nx * self.ny
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn cell_area(&self) -> f64 {
        self.hx * self.hy
    }

    pub fn cell_diag(&self) -> f64 {
        self.hx.hypot(self.hy)
    }

    pub fn x_limits(&self) -> [f64; 2] {
        self.x_limits
    }

    pub fn y_limits(&self) -> [f64; 2] {
        self.y_limits
    }

    /// `[ymin, ymax, xmin, xmax]` of the cell centers.
    pub fn domain_limits(&self) -> [f64; 4] {
        [
            self.y_limits[0],
            self.y_limits[1],
            self.x_limits[0],
            self.x_limits[1],
        ]
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        i + self.nx * j
    }

    #[inline]
    pub fn ij(&self, cell: usize) -> (usize, usize) {
        (cell % self.nx, cell / self.nx)
    }

    #[inline]
    pub fn center(&self, cell: usize) -> [f64; 2] {
        self.centers[cell]
    }

    pub fn centers(&self) -> &[[f64; 2]] {
        &self.centers
    }

    /// `[left, right, bottom, top]`; boundary cells list themselves.
    #[inline]
    pub fn neighbors(&self, cell: usize) -> [usize; 4] {
        self.neighbors[cell]
    }

    /// Neighbor across `side`, or the cell itself on the domain boundary.
    #[inline]
    pub fn neighbor(&self, cell: usize, side: Side) -> usize {
        let [left, right, bottom, top] = self.neighbors[cell];
        match side {
            Side::Bottom => bottom,
            Side::Right => right,
            Side::Top => top,
            Side::Left => left,
        }
    }

    /// Neighbor across `side`, `None` when `side` is on the domain boundary.
    pub fn neighbor_across(&self, cell: usize, side: Side) -> Option<usize> {
        let n = self.neighbor(cell, side);
        (n != cell).then_some(n)
    }

    /// Eight-neighborhood laid out as
    ///
    /// ```text
    /// 6 5 4
    /// 7 c 3
    /// 0 1 2
    /// ```
    ///
    /// with boundary clamping.
    pub fn neighbors8(&self, cell: usize) -> [usize; 8] {
        let [left, right, bottom, top] = self.neighbors[cell];
        [
            self.neighbors[bottom][0],
            bottom,
            self.neighbors[bottom][1],
            right,
            self.neighbors[top][1],
            top,
            self.neighbors[top][0],
            left,
        ]
    }

    /// Vertex ids `[bottom-left, bottom-right, top-right, top-left]`.
    #[inline]
    pub fn cell_vertices(&self, cell: usize) -> [usize; 4] {
        self.cell_vertices[cell]
    }

    #[inline]
    pub fn vertex(&self, v: usize) -> [f64; 2] {
        self.vertices[v]
    }

    /// Cells sharing vertex `v`, `[bottom-left, bottom-right, top-right, top-left]`
    /// of the vertex; `None` outside the domain.
    pub fn vertex_cells(&self, v: usize) -> [Option<usize>; 4] {
        let vi = v % (self.nx + 1);
        let vj = v / (self.nx + 1);
        let cell = |i: Option<usize>, j: Option<usize>| match (i, j) {
            (Some(i), Some(j)) if i < self.nx && j < self.ny => Some(self.index(i, j)),
            _ => None,
        };
        [
            cell(vi.checked_sub(1), vj.checked_sub(1)),
            cell(Some(vi), vj.checked_sub(1)),
            cell(Some(vi), Some(vj)),
            cell(vi.checked_sub(1), Some(vj)),
        ]
    }

    /// True for the outermost ring of cells.
    pub fn is_boundary(&self, cell: usize) -> bool {
        let (i, j) = self.ij(cell);
        i == 0 || j == 0 || i + 1 == self.nx || j + 1 == self.ny
    }

    /// True for the two outermost rings; tip cells here mean the fracture
    /// has reached the end of the grid.
    pub fn is_near_boundary(&self, cell: usize) -> bool {
        let (i, j) = self.ij(cell);
        i <= 1 || j <= 1 || i + 2 >= self.nx || j + 2 >= self.ny
    }

    pub fn boundary_band(&self) -> &[usize] {
        &self.boundary_band
    }

    pub fn check_cell(&self, cell: usize) -> MeshResult<usize> {
        if cell < self.num_cells() {
            Ok(cell)
        } else {
            Err(MeshError::CellOutOfRange {
                cell,
                len: self.num_cells(),
            })
        }
    }

    /// Cell containing the point `(x, y)`.
    pub fn locate_element(&self, x: f64, y: f64) -> MeshResult<usize> {
        let fi = ((x - self.x_limits[0]) / self.hx).round();
        let fj = ((y - self.y_limits[0]) / self.hy).round();
        if !fi.is_finite() || !fj.is_finite() || fi < 0.0 || fj < 0.0 {
            return Err(MeshError::PointOutside { x, y });
        }
        let (i, j) = (fi as usize, fj as usize);
        if i >= self.nx || j >= self.ny {
            return Err(MeshError::PointOutside { x, y });
        }
        Ok(self.index(i, j))
    }

    /// Cells whose centers lie within `radius` of `center`.
    pub fn cells_inside_circle(&self, center: [f64; 2], radius: f64) -> Vec<usize> {
        self.centers
            .iter()
            .enumerate()
            .filter(|(_, c)| (c[0] - center[0]).hypot(c[1] - center[1]) <= radius)
            .map(|(i, _)| i)
            .collect()
    }

    /// Distance between two cell centers.
    pub fn distance(&self, a: usize, b: usize) -> f64 {
        let (pa, pb) = (self.centers[a], self.centers[b]);
        (pa[0] - pb[0]).hypot(pa[1] - pb[1])
    }
}

fn odd_count(n: usize, axis: char) -> usize {
    if n % 2 == 0 {
        warn!(axis = %axis, requested = n, used = n + 1, "even cell count, using the next odd count");
        n + 1
    } else {
        n
    }
}

impl TryFrom<MeshDescriptor> for CartesianMesh {
    type Error = MeshError;

    fn try_from(d: MeshDescriptor) -> MeshResult<Self> {
        CartesianMesh::with_limits(d.x_limits, d.y_limits, d.nx, d.ny)
    }
}

impl From<CartesianMesh> for MeshDescriptor {
    fn from(mesh: CartesianMesh) -> Self {
        mesh.descriptor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh() -> CartesianMesh {
        CartesianMesh::new(2.0, 1.0, 5, 3).unwrap()
    }

    #[test]
    fn metrics() {
        let m = mesh();
        assert_eq!(m.num_cells(), 15);
        assert!((m.hx() - 1.0).abs() < 1e-12);
        assert!((m.hy() - 1.0).abs() < 1e-12);
        assert!((m.cell_diag() - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(m.domain_limits(), [-1.0, 1.0, -2.0, 2.0]);
        assert_eq!(m.center(7), [0.0, 0.0]);
    }

    #[test]
    fn even_counts_become_odd() {
        let m = CartesianMesh::new(1.0, 1.0, 4, 6).unwrap();
        assert_eq!((m.nx(), m.ny()), (5, 7));
    }

    #[test]
    fn boundary_cells_are_self_neighbors() {
        let m = mesh();
        assert_eq!(m.neighbors(0), [0, 1, 0, 5]);
        assert_eq!(m.neighbors(14), [13, 14, 9, 14]);
        assert_eq!(m.neighbor_across(0, Side::Left), None);
        assert_eq!(m.neighbor_across(0, Side::Top), Some(5));
    }

    #[test]
    fn eight_neighborhood_layout() {
        let m = mesh();
        assert_eq!(m.neighbors8(7), [1, 2, 3, 8, 13, 12, 11, 6]);
    }

    #[test]
    fn vertices_surround_cells() {
        let m = mesh();
        let c = 7;
        let [bl, br, tr, tl] = m.cell_vertices(c);
        let center = m.center(c);
        assert_eq!(m.vertex(bl), [center[0] - 0.5, center[1] - 0.5]);
        assert_eq!(m.vertex(tr), [center[0] + 0.5, center[1] + 0.5]);
        assert_eq!(m.vertex(br)[0], m.vertex(tr)[0]);
        assert_eq!(m.vertex(tl)[1], m.vertex(tr)[1]);
        assert_eq!(m.vertex_cells(tr), [Some(7), Some(8), Some(13), Some(12)]);
        assert_eq!(m.vertex_cells(0), [None, None, Some(0), None]);
    }

    #[test]
    fn locate_and_select() {
        let m = mesh();
        assert_eq!(m.locate_element(0.1, -0.2).unwrap(), 7);
        assert!(m.locate_element(10.0, 0.0).is_err());
        let mut inside = m.cells_inside_circle([0.0, 0.0], 1.0);
        inside.sort();
        assert_eq!(inside, vec![2, 6, 7, 8, 12]);
    }

    #[test]
    fn boundary_band_covers_two_rings() {
        let m = CartesianMesh::new(3.0, 3.0, 7, 7).unwrap();
        assert!(m.is_near_boundary(m.index(1, 3)));
        assert!(!m.is_near_boundary(m.index(3, 3)));
        assert!(!m.is_near_boundary(m.index(2, 4)));
        assert_eq!(m.boundary_band().len(), 49 - 9);
    }

    #[test]
    fn serde_uses_descriptor() {
        let m = mesh();
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("x_limits"));
        let back: CartesianMesh = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
