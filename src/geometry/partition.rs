//! Component A — subvolume lattice & partition search.
//!
//! A `SubvolumeLattice` is the regular grid of axis-aligned cells the rest
//! of the subsystem is built on (spec §1: "the regular subvolume grid is
//! mandatory", not a general spatial index). Mapping a point to its cell is
//! bisection on sorted partition tables, same shape as the Fibonacci-hashed
//! bucket lookup in the teacher's `swarm/grid.rs` — a point goes in exactly
//! one bucket, found in `O(log n)` rather than `O(1)`, because the buckets
//! here are irregular mesh-aligned planes rather than a uniform hash.

use super::vector::{Axis, Face, Vector3};
use crate::config::FINE_PARTITION_LEN;
use crate::ids::{SubvolumeId, WallId};

/// Sorted coarse and fine partition arrays for one axis (spec §3).
#[derive(Clone, Debug)]
pub struct PartitionTable {
    /// Cell boundaries; strictly increasing, defines `coarse.len() - 1` cells.
    pub coarse: Vec<f64>,
    /// Fixed-length snap targets for partition refinement
    /// (`FINE_PARTITION_LEN` entries: exponential tail, linear interior,
    /// exponential tail).
    pub fine: Vec<f64>,
}

impl PartitionTable {
    pub fn new(coarse: Vec<f64>, fine: Vec<f64>) -> Self {
        debug_assert!(coarse.windows(2).all(|w| w[0] < w[1]), "coarse partitions must be strictly increasing");
        debug_assert_eq!(fine.len(), FINE_PARTITION_LEN, "fine partition array must have the fixed spec length");
        PartitionTable { coarse, fine }
    }

    pub fn num_cells(&self) -> usize {
        self.coarse.len().saturating_sub(1)
    }

    /// Largest index `i` such that `coarse[i] <= coord`, clamped to
    /// `[0, num_cells() - 1]`. Out-of-box points return a boundary cell.
    pub fn cell_index(&self, coord: f64) -> usize {
        match self.coarse.binary_search_by(|p| p.partial_cmp(&coord).unwrap()) {
            Ok(i) => i.min(self.num_cells().saturating_sub(1)),
            Err(0) => 0,
            Err(i) => (i - 1).min(self.num_cells().saturating_sub(1)),
        }
    }

    pub fn lower(&self, cell: usize) -> f64 {
        self.coarse[cell]
    }

    pub fn upper(&self, cell: usize) -> f64 {
        self.coarse[cell + 1]
    }
}

/// One axis-aligned cell of the lattice (spec §3 "Subvolume").
#[derive(Clone, Debug)]
pub struct Subvolume {
    pub ix: usize,
    pub iy: usize,
    pub iz: usize,
    /// Walls whose bounding geometry intersects this cell.
    pub walls: Vec<WallId>,
    /// Face-adjacent neighbors: `[-x, +x, -y, +y, -z, +z]`. `None` means the
    /// cell edge is the edge of the simulation world (BSP-node neighbors
    /// are out of scope per spec §4.A).
    pub neighbors: [Option<SubvolumeId>; 6],
}

impl Subvolume {
    fn neighbor_slot(face: Face) -> usize {
        let base = match face.axis {
            Axis::X => 0,
            Axis::Y => 2,
            Axis::Z => 4,
        };
        base + usize::from(face.positive)
    }

    pub fn neighbor(&self, face: Face) -> Option<SubvolumeId> {
        self.neighbors[Self::neighbor_slot(face)]
    }
}

/// The full 3D lattice of subvolumes, dense row-major indexed as
/// `k + (nz-1)*(j + (ny-1)*i)` (spec §3).
pub struct SubvolumeLattice {
    pub x: PartitionTable,
    pub y: PartitionTable,
    pub z: PartitionTable,
    pub cells: Vec<Subvolume>,
}

impl SubvolumeLattice {
    pub fn new(x: PartitionTable, y: PartitionTable, z: PartitionTable) -> Self {
        let (nx, ny, nz) = (x.num_cells(), y.num_cells(), z.num_cells());
        let mut cells = Vec::with_capacity(nx * ny * nz);
        for i in 0..nx {
            for j in 0..ny {
                for k in 0..nz {
                    cells.push(Subvolume {
                        ix: i,
                        iy: j,
                        iz: k,
                        walls: Vec::new(),
                        neighbors: [None; 6],
                    });
                }
            }
        }
        let mut lattice = SubvolumeLattice { x, y, z, cells };
        lattice.link_neighbors();
        lattice
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.x.num_cells(), self.y.num_cells(), self.z.num_cells())
    }

    #[inline]
    pub fn index_of(&self, i: usize, j: usize, k: usize) -> SubvolumeId {
        let (_, ny, nz) = self.dims();
        SubvolumeId(k + nz * (j + ny * i))
    }

    fn link_neighbors(&mut self) {
        let (nx, ny, nz) = self.dims();
        for i in 0..nx {
            for j in 0..ny {
                for k in 0..nz {
                    let id = self.index_of(i, j, k);
                    let mut neighbors = [None; 6];
                    if i > 0 {
                        neighbors[0] = Some(self.index_of(i - 1, j, k));
                    }
                    if i + 1 < nx {
                        neighbors[1] = Some(self.index_of(i + 1, j, k));
                    }
                    if j > 0 {
                        neighbors[2] = Some(self.index_of(i, j - 1, k));
                    }
                    if j + 1 < ny {
                        neighbors[3] = Some(self.index_of(i, j + 1, k));
                    }
                    if k > 0 {
                        neighbors[4] = Some(self.index_of(i, j, k - 1));
                    }
                    if k + 1 < nz {
                        neighbors[5] = Some(self.index_of(i, j, k + 1));
                    }
                    self.cells[id.index()].neighbors = neighbors;
                }
            }
        }
    }

    /// `cell_of(point) -> cell_index`: bisection on each axis's partition
    /// table. Out-of-box points return the nearest boundary cell.
    pub fn cell_of(&self, p: Vector3) -> SubvolumeId {
        let i = self.x.cell_index(p.x);
        let j = self.y.cell_index(p.y);
        let k = self.z.cell_index(p.z);
        self.index_of(i, j, k)
    }

    pub fn cell(&self, id: SubvolumeId) -> &Subvolume {
        &self.cells[id.index()]
    }

    /// `traverse(cell, face) -> cell`: follows a neighbor link. Returns
    /// `None` at the edge of the world.
    pub fn traverse(&self, cell: SubvolumeId, face: Face) -> Option<SubvolumeId> {
        self.cell(cell).neighbor(face)
    }

    /// Bounds of a cell as `(llf, urb)`.
    pub fn bounds(&self, id: SubvolumeId) -> (Vector3, Vector3) {
        let sv = self.cell(id);
        let llf = Vector3::new(self.x.lower(sv.ix), self.y.lower(sv.iy), self.z.lower(sv.iz));
        let urb = Vector3::new(self.x.upper(sv.ix), self.y.upper(sv.iy), self.z.upper(sv.iz));
        (llf, urb)
    }

    /// `collide_cell_time(origin, delta, cell) -> (t, face)`: the closed-form
    /// parametric time at which the ray `origin + t*delta`, `t in (0, inf)`,
    /// first exits `cell`. `t > 1` means the full displacement ends inside
    /// the cell. Ties are broken x before y before z (spec §4.A).
    pub fn collide_cell_time(&self, origin: Vector3, delta: Vector3, cell: SubvolumeId) -> (f64, Face) {
        let (llf, urb) = self.bounds(cell);
        let mut best_t = f64::INFINITY;
        let mut best_face = Face { axis: Axis::X, positive: true };

        for axis in Axis::ALL {
            let d = delta.component(axis);
            if d == 0.0 {
                continue;
            }
            let o = origin.component(axis);
            let positive = d > 0.0;
            let bound = if positive { urb.component(axis) } else { llf.component(axis) };
            let t = (bound - o) / d;
            if t < best_t {
                best_t = t;
                best_face = Face { axis, positive };
            }
        }
        (best_t, best_face)
    }
}

/// Yields each cell crossed by the segment `[start, end]`, along with the
/// portion of that segment lying within the cell. Used by both the waypoint
/// enclosure sweep (component C) and the from-scratch enclosure query
/// (component D) so the two share one cell-walking primitive instead of
/// duplicating the march.
pub struct RayWalk<'a> {
    lattice: &'a SubvolumeLattice,
    start: Vector3,
    delta: Vector3,
    at: Vector3,
    cell: Option<SubvolumeId>,
    target_cell: SubvolumeId,
    end: Vector3,
    steps: usize,
    max_steps: usize,
}

impl<'a> RayWalk<'a> {
    pub fn new(lattice: &'a SubvolumeLattice, start: Vector3, end: Vector3, max_steps: usize) -> Self {
        RayWalk {
            lattice,
            start,
            delta: end - start,
            at: start,
            cell: Some(lattice.cell_of(start)),
            target_cell: lattice.cell_of(end),
            end,
            steps: 0,
            max_steps,
        }
    }

    /// `true` once the walk has reached the target cell's exact end point.
    pub fn reached_target(&self) -> bool {
        self.cell.is_none() && self.at == self.end
    }
}

impl<'a> Iterator for RayWalk<'a> {
    /// `(cell, segment_start, segment_end)`.
    type Item = (SubvolumeId, Vector3, Vector3);

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.cell?;
        self.steps += 1;
        if self.steps > self.max_steps {
            self.cell = None;
            return None;
        }

        if cell == self.target_cell {
            let seg = (cell, self.at, self.end);
            self.at = self.end;
            self.cell = None;
            return Some(seg);
        }

        let (t, face) = self.lattice.collide_cell_time(self.at, self.delta, cell);
        let next_point = self.start + self.delta * t;
        let seg = (cell, self.at, next_point);
        self.at = next_point;
        self.cell = self.lattice.traverse(cell, face);
        Some(seg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_partition() -> PartitionTable {
        PartitionTable::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.0; FINE_PARTITION_LEN])
    }

    fn lattice() -> SubvolumeLattice {
        SubvolumeLattice::new(unit_partition(), unit_partition(), unit_partition())
    }

    #[test]
    fn cell_of_picks_correct_cell() {
        let l = lattice();
        let id = l.cell_of(Vector3::new(1.5, 0.5, 2.9));
        let sv = l.cell(id);
        assert_eq!((sv.ix, sv.iy, sv.iz), (1, 0, 2));
    }

    #[test]
    fn cell_of_clamps_out_of_box_points() {
        let l = lattice();
        let id = l.cell_of(Vector3::new(-5.0, 50.0, 1.0));
        let sv = l.cell(id);
        assert_eq!(sv.ix, 0);
        assert_eq!(sv.iy, 2);
    }

    #[test]
    fn neighbors_link_face_adjacent_cells() {
        let l = lattice();
        let a = l.index_of(1, 1, 1);
        let b = l.index_of(2, 1, 1);
        assert_eq!(l.cell(a).neighbor(Face { axis: Axis::X, positive: true }), Some(b));
        assert_eq!(l.cell(b).neighbor(Face { axis: Axis::X, positive: false }), Some(a));
    }

    #[test]
    fn ray_walk_visits_every_cell_in_order() {
        let l = lattice();
        let start = Vector3::new(0.5, 0.5, 0.5);
        let end = Vector3::new(2.5, 0.5, 0.5);
        let visited: Vec<_> = RayWalk::new(&l, start, end, 1000).map(|(c, _, _)| c).collect();
        assert_eq!(visited, vec![l.index_of(0, 0, 0), l.index_of(1, 0, 0), l.index_of(2, 0, 0)]);
    }
}
