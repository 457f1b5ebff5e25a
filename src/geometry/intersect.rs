//! Component B — ray/cell and ray/triangle intersection primitives.
//!
//! `collide_cell_time` lives in `partition.rs` since it only needs a cell's
//! bounds; triangle classification needs the wall's plane equation and
//! winding, so it gets its own module.

use super::vector::Vector3;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Triangle {
    pub vertices: [Vector3; 3],
    /// Outward unit normal.
    pub normal: Vector3,
    /// Plane offset: for any point `p` on the plane, `normal.dot(p) == d`.
    pub d: f64,
}

impl Triangle {
    pub fn new(vertices: [Vector3; 3]) -> Self {
        let e0 = vertices[1] - vertices[0];
        let e1 = vertices[2] - vertices[0];
        let raw_normal = e0.cross(e1);
        let len = raw_normal.length();
        let normal = if len > 0.0 { raw_normal * (1.0 / len) } else { raw_normal };
        let d = normal.dot(vertices[0]);
        Triangle { vertices, normal, d }
    }
}

/// Result of classifying a ray against a triangle (spec §4.B).
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Classification {
    /// `t < 0`, `t > 1`, the hit lies outside the triangle, or the
    /// back-check rejects a hit behind the query point.
    Miss,
    /// The ray enters from the side the outward normal faces.
    Front { t: f64, hit: Vector3 },
    /// The ray enters from the side opposite the outward normal.
    Back { t: f64, hit: Vector3 },
    /// The ray grazes an edge or vertex within tolerance; the caller should
    /// perturb and retry the enclosing cell scan.
    Redo,
}

/// `classify(origin, delta, triangle) -> {MISS, FRONT, BACK, REDO}`.
///
/// `eps` is the same relative tolerance used throughout (`config::eps_equals`
/// scale); it gates both the edge/vertex grazing test and the `t` bounds.
pub fn classify(origin: Vector3, delta: Vector3, tri: &Triangle, eps: f64) -> Classification {
    let denom = tri.normal.dot(delta);
    if denom == 0.0 {
        return Classification::Miss;
    }

    let t = (tri.d - tri.normal.dot(origin)) / denom;
    // A hit landing within `eps` of either endpoint is too close to call:
    // perturb and retry rather than risk silently missing or double-folding
    // a crossing right at a waypoint or molecule position (spec §8).
    if t.abs() < eps || (t - 1.0).abs() < eps {
        return Classification::Redo;
    }
    if !(t >= 0.0 && t < 1.0) {
        return Classification::Miss;
    }

    let hit = origin + delta * t;

    // Reject hits behind the query point along the direction of travel.
    if (hit - origin).dot(delta) < 0.0 {
        return Classification::Miss;
    }

    let edges = [
        (tri.vertices[0], tri.vertices[1]),
        (tri.vertices[1], tri.vertices[2]),
        (tri.vertices[2], tri.vertices[0]),
    ];

    let mut sign: Option<bool> = None;
    for (a, b) in edges {
        let edge = b - a;
        let edge_len = edge.length();
        if edge_len == 0.0 {
            continue;
        }
        let c = (hit - a).cross(edge).dot(tri.normal);
        let signed_dist = c / edge_len;
        if signed_dist.abs() < eps {
            return Classification::Redo;
        }
        let side = signed_dist > 0.0;
        match sign {
            None => sign = Some(side),
            Some(prev) if prev != side => return Classification::Miss,
            _ => {}
        }
    }

    if denom < 0.0 {
        Classification::Front { t, hit }
    } else {
        Classification::Back { t, hit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle_xy() -> Triangle {
        // Lies in the z=0 plane, outward normal +z, right-handed winding
        // when viewed from +z.
        Triangle::new([
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn approaching_against_the_outward_normal_is_front() {
        // Outward normal is +z; a ray coming from above and moving down
        // crosses against the normal, i.e. enters from the front face.
        let tri = unit_triangle_xy();
        let origin = Vector3::new(0.2, 0.2, 1.0);
        let delta = Vector3::new(0.0, 0.0, -2.0);
        match classify(origin, delta, &tri, 1e-9) {
            Classification::Front { t, .. } => assert!((t - 0.5).abs() < 1e-9),
            other => panic!("expected Front, got {:?}", other),
        }
    }

    #[test]
    fn approaching_along_the_outward_normal_is_back() {
        // A ray coming from below and moving up travels the same direction
        // as the outward normal, i.e. it exits through the back face.
        let tri = unit_triangle_xy();
        let origin = Vector3::new(0.2, 0.2, -1.0);
        let delta = Vector3::new(0.0, 0.0, 2.0);
        match classify(origin, delta, &tri, 1e-9) {
            Classification::Back { .. } => {}
            other => panic!("expected Back, got {:?}", other),
        }
    }

    #[test]
    fn outside_triangle_is_miss() {
        let tri = unit_triangle_xy();
        let origin = Vector3::new(0.9, 0.9, -1.0);
        let delta = Vector3::new(0.0, 0.0, 2.0);
        assert_eq!(classify(origin, delta, &tri, 1e-9), Classification::Miss);
    }

    #[test]
    fn edge_graze_is_redo() {
        let tri = unit_triangle_xy();
        let origin = Vector3::new(0.5, 0.0, -1.0);
        let delta = Vector3::new(0.0, 0.0, 2.0);
        assert_eq!(classify(origin, delta, &tri, 1e-6), Classification::Redo);
    }

    #[test]
    fn parallel_ray_is_miss() {
        let tri = unit_triangle_xy();
        let origin = Vector3::new(0.2, 0.2, 0.0);
        let delta = Vector3::new(1.0, 0.0, 0.0);
        assert_eq!(classify(origin, delta, &tri, 1e-9), Classification::Miss);
    }
}
