//! Continuous front: closed polylines traced across cell edges.
//!
//! Vertex values come from [`vertex_field`]; vertices of channel cells are
//! held strictly inside so the front never re-enters the channel. Every
//! crossed edge carries one intersection point shared by the two cells on
//! either side, which links per-cell segments into polylines. A crossing
//! whose neighbor cell lies outside the search band grows the band; a
//! crossing on the domain boundary ends the step.

use std::collections::HashMap;
use std::f64::consts::FRAC_PI_4;

use hf_core::CellMask;
use hf_mesh::{CartesianMesh, Side};
use tracing::debug;

use crate::error::{FrontError, FrontResult};
use crate::geometry::{Corner, TipGeometry};
use crate::reconstruct::{FrontLine, gradient, validate, vertex_field};

/// Edge identified by its two vertex ids in ascending order.
type EdgeKey = (usize, usize);

/// Edges in the order `[bottom, right, top, left]`; edge `k` joins corners
/// `k` and `k + 1` of `[bl, br, tr, tl]`.
const EDGE_SIDES: [Side; 4] = [Side::Bottom, Side::Right, Side::Top, Side::Left];

#[derive(Debug, Clone)]
struct Segment {
    cell: usize,
    ends: [(EdgeKey, Side); 2],
    points: [[f64; 2]; 2],
}

#[derive(Debug, Default)]
struct Cut {
    segments: Vec<Segment>,
    crossed: Vec<usize>,
    full: Vec<usize>,
    at_boundary: Vec<usize>,
}

pub(crate) struct Traced {
    pub tips: Vec<TipGeometry>,
    pub fronts: Vec<FrontLine>,
}

pub(crate) fn trace(
    mesh: &CartesianMesh,
    sd: &[f64],
    channel: &CellMask,
    candidates: &[usize],
    max_iterations: usize,
) -> FrontResult<Traced> {
    let mut vertices = vertex_field(mesh, sd);
    let floor = -1e-12 * mesh.cell_diag();
    for c in (0..mesh.num_cells()).filter(|&c| channel.contains(c)) {
        for v in mesh.cell_vertices(c) {
            vertices[v] = vertices[v].min(floor);
        }
    }

    let mut region = CellMask::from_cells(mesh.num_cells(), candidates);
    for iteration in 0..max_iterations.max(1) {
        let cells = region.to_cells();
        let cut = cut_cells(mesh, sd, &vertices, &cells);
        if !cut.at_boundary.is_empty() {
            return Err(FrontError::ReachedEndOfGrid {
                cells: cut.at_boundary,
            });
        }

        let edges = index_edges(&cut.segments);
        let mut grow = Vec::new();
        for (key, ids) in edges.iter().filter(|(_, ids)| ids.len() == 1) {
            let seg = &cut.segments[ids[0]];
            let Some(&(_, side)) = seg.ends.iter().find(|(k, _)| k == key) else {
                continue;
            };
            let Some(across) = mesh.neighbor_across(seg.cell, side) else {
                continue;
            };
            if region.contains(across) || channel.contains(across) {
                return Err(FrontError::NotTracked {
                    cell: seg.cell,
                    what: "open front segment",
                });
            }
            grow.push(across);
        }

        if grow.is_empty() {
            return assemble(mesh, sd, &vertices, cut);
        }
        debug!(iteration, grow = grow.len(), "front leaves the search band");
        for c in grow {
            region.insert(c);
        }
    }
    Err(FrontError::NotConverged {
        iterations: max_iterations,
    })
}

fn cut_cells(mesh: &CartesianMesh, sd: &[f64], vertices: &[f64], cells: &[usize]) -> Cut {
    let mut cut = Cut::default();
    for &cell in cells {
        let corners = mesh.cell_vertices(cell);
        let values = corners.map(|v| vertices[v]);
        let inside = values.map(|v| v < 0.0);
        match inside.iter().filter(|&&i| i).count() {
            0 => continue,
            4 => {
                cut.full.push(cell);
                continue;
            }
            _ => {}
        }

        let mut crossings: [Option<((EdgeKey, Side), [f64; 2])>; 4] = [None; 4];
        let mut off_grid = false;
        for k in 0..4 {
            let (a, b) = (k, (k + 1) % 4);
            if inside[a] == inside[b] {
                continue;
            }
            let side = EDGE_SIDES[k];
            if mesh.neighbor_across(cell, side).is_none() {
                off_grid = true;
                continue;
            }
            let (pa, pb) = (mesh.vertex(corners[a]), mesh.vertex(corners[b]));
            let t = values[a] / (values[a] - values[b]);
            let point = [pa[0] + t * (pb[0] - pa[0]), pa[1] + t * (pb[1] - pa[1])];
            let key = (corners[a].min(corners[b]), corners[a].max(corners[b]));
            crossings[k] = Some(((key, side), point));
        }
        if off_grid {
            cut.at_boundary.push(cell);
            continue;
        }

        let pairs: Vec<(usize, usize)> = if crossings.iter().flatten().count() == 4 {
            // saddle: separate the corners whose sign differs from the center
            let center_inside = sd[cell] < 0.0;
            (0..4)
                .filter(|&k| inside[k] != center_inside)
                .map(|k| ((k + 3) % 4, k))
                .collect()
        } else {
            let crossed: Vec<usize> = (0..4).filter(|&k| crossings[k].is_some()).collect();
            match crossed.as_slice() {
                &[a, b] => vec![(a, b)],
                _ => Vec::new(),
            }
        };
        for (e0, e1) in pairs {
            if let (Some((end0, p0)), Some((end1, p1))) = (crossings[e0], crossings[e1]) {
                cut.segments.push(Segment {
                    cell,
                    ends: [end0, end1],
                    points: [p0, p1],
                });
            }
        }
        cut.crossed.push(cell);
    }
    cut
}

fn index_edges(segments: &[Segment]) -> HashMap<EdgeKey, Vec<usize>> {
    let mut edges: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
    for (i, seg) in segments.iter().enumerate() {
        for &(key, _) in &seg.ends {
            edges.entry(key).or_default().push(i);
        }
    }
    edges
}

fn assemble(
    mesh: &CartesianMesh,
    sd: &[f64],
    vertices: &[f64],
    cut: Cut,
) -> FrontResult<Traced> {
    let edges = index_edges(&cut.segments);
    let mut visited = vec![false; cut.segments.len()];
    let mut fronts = Vec::new();
    for start in 0..cut.segments.len() {
        if visited[start] {
            continue;
        }
        let mut line = FrontLine {
            closed: true,
            ..FrontLine::default()
        };
        let mut current = start;
        let mut entry = cut.segments[start].ends[0].0;
        loop {
            visited[current] = true;
            let seg = &cut.segments[current];
            let (first, second) = if seg.ends[0].0 == entry { (0, 1) } else { (1, 0) };
            line.cells.push(seg.cell);
            line.segments.push([seg.points[first], seg.points[second]]);
            let exit = seg.ends[second].0;
            let next = edges
                .get(&exit)
                .and_then(|ids| ids.iter().copied().find(|&o| o != current));
            match next {
                Some(n) if n == start => break,
                Some(n) if !visited[n] => {
                    current = n;
                    entry = exit;
                }
                _ => {
                    line.closed = false;
                    break;
                }
            }
        }
        fronts.push(line);
    }

    let mut tips = Vec::with_capacity(cut.crossed.len() + cut.full.len());
    for &cell in &cut.crossed {
        let own: Vec<&Segment> = cut.segments.iter().filter(|s| s.cell == cell).collect();
        let tip = match own.as_slice() {
            [seg] => match from_segment(mesh, vertices, seg) {
                Some(tip) => Some(tip),
                None => gradient(mesh, sd, vertices, cell)?,
            },
            _ => gradient(mesh, sd, vertices, cell)?,
        };
        let tip = tip.ok_or(FrontError::NotTracked {
            cell,
            what: "ambiguous front in cell",
        })?;
        tips.push(validate(tip)?);
    }
    for &cell in &cut.full {
        tips.push(TipGeometry {
            cell,
            zero_vertex: Corner::BottomLeft,
            l: mesh.hx() + mesh.hy(),
            alpha: FRAC_PI_4,
        });
    }
    tips.sort_by_key(|t| t.cell);

    debug!(
        fronts = fronts.len(),
        open = fronts.iter().filter(|f| !f.closed).count(),
        "continuous front traced"
    );
    Ok(Traced { tips, fronts })
}

fn from_segment(mesh: &CartesianMesh, vertices: &[f64], seg: &Segment) -> Option<TipGeometry> {
    let [pa, pb] = seg.points;
    let (dx, dy) = (pb[0] - pa[0], pb[1] - pa[1]);
    let len = dx.hypot(dy);
    if len < 1e-12 * mesh.cell_diag() {
        return None;
    }
    let mut n = [dy / len, -dx / len];
    let outside = mesh
        .cell_vertices(seg.cell)
        .into_iter()
        .find(|&v| vertices[v] >= 0.0)?;
    let q = mesh.vertex(outside);
    if (q[0] - pa[0]) * n[0] + (q[1] - pa[1]) * n[1] < 0.0 {
        n = [-n[0], -n[1]];
    }
    let mut tip = TipGeometry::from_line(mesh, seg.cell, pa, n);
    if tip.l < 0.0 && tip.l > -1e-9 * mesh.cell_diag() {
        tip.l = 0.0;
    }
    Some(tip)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(mesh: &CartesianMesh, center: [f64; 2], r: f64) -> Vec<f64> {
        mesh.centers()
            .iter()
            .map(|p| (p[0] - center[0]).hypot(p[1] - center[1]) - r)
            .collect()
    }

    #[test]
    fn circle_traces_one_closed_front() {
        let mesh = CartesianMesh::new(10.0, 10.0, 21, 21).unwrap();
        let sd = disk(&mesh, [0.0, 0.0], 4.3);
        let channel = CellMask::from_cells(
            mesh.num_cells(),
            &(0..mesh.num_cells()).filter(|&c| sd[c] < -1.5).collect::<Vec<_>>(),
        );
        let all: Vec<usize> = (0..mesh.num_cells()).filter(|&c| !channel.contains(c)).collect();
        let traced = trace(&mesh, &sd, &channel, &all, 5).unwrap();
        assert_eq!(traced.fronts.len(), 1);
        assert!(traced.fronts[0].closed);
        let length = traced.fronts[0].length();
        let exact = 2.0 * std::f64::consts::PI * 4.3;
        assert!((length - exact).abs() < 0.05 * exact, "{length} vs {exact}");
    }

    #[test]
    fn two_lobes_give_two_fronts() {
        let mesh = CartesianMesh::new(10.0, 10.0, 21, 21).unwrap();
        let a = disk(&mesh, [-5.0, 0.0], 2.2);
        let b = disk(&mesh, [5.0, 0.0], 2.2);
        let sd: Vec<f64> = a.iter().zip(&b).map(|(x, y)| x.min(*y)).collect();
        let none = CellMask::new(mesh.num_cells());
        let all: Vec<usize> = (0..mesh.num_cells()).collect();
        let traced = trace(&mesh, &sd, &none, &all, 5).unwrap();
        assert_eq!(traced.fronts.len(), 2);
        assert!(traced.fronts.iter().all(|f| f.closed));
    }

    #[test]
    fn narrow_band_grows_until_closed() {
        let mesh = CartesianMesh::new(10.0, 10.0, 21, 21).unwrap();
        let sd = disk(&mesh, [0.0, 0.0], 3.3);
        let none = CellMask::new(mesh.num_cells());
        let start = [mesh.locate_element(3.0, 0.0).unwrap()];
        let traced = trace(&mesh, &sd, &none, &start, 40).unwrap();
        assert_eq!(traced.fronts.len(), 1);
        assert!(traced.fronts[0].closed);

        assert!(matches!(
            trace(&mesh, &sd, &none, &start, 1),
            Err(FrontError::NotConverged { iterations: 1 })
        ));
    }

    #[test]
    fn front_on_domain_edge_ends_grid() {
        let mesh = CartesianMesh::new(3.0, 3.0, 7, 7).unwrap();
        let sd = disk(&mesh, [0.0, 0.0], 3.2);
        let none = CellMask::new(mesh.num_cells());
        let all: Vec<usize> = (0..mesh.num_cells()).collect();
        assert!(matches!(
            trace(&mesh, &sd, &none, &all, 3),
            Err(FrontError::ReachedEndOfGrid { .. })
        ));
    }
}
