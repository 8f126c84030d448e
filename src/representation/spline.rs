//! Spline math and swept-profile meshes for trace representations.
//!
//! Pure Vec3 → Vec3 transforms: a cubic Hermite spline through control
//! points, rotation minimizing frames along it, and an elliptical profile
//! swept along the frames.

use glam::Vec3;

/// A point along the spline with position, tangent, and frame vectors.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SplinePoint {
    pub pos: Vec3,
    pub tangent: Vec3,
    pub normal: Vec3,
    pub binormal: Vec3,
    /// Index of the control point this sample belongs to.
    pub control: usize,
}

/// Cubic Hermite interpolation for position
fn hermite_point(p0: Vec3, m0: Vec3, p1: Vec3, m1: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11
}

/// Cubic Hermite interpolation for tangent (derivative of position)
fn hermite_tangent(p0: Vec3, m0: Vec3, p1: Vec3, m1: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;

    let dh00 = 6.0 * t2 - 6.0 * t;
    let dh10 = 3.0 * t2 - 4.0 * t + 1.0;
    let dh01 = -6.0 * t2 + 6.0 * t;
    let dh11 = 3.0 * t2 - 2.0 * t;

    p0 * dh00 + m0 * dh10 + p1 * dh01 + m1 * dh11
}

/// Average each interior point with its neighbours `passes` times.
pub(crate) fn smooth(points: &[Vec3], passes: usize) -> Vec<Vec3> {
    let mut out = points.to_vec();
    for _ in 0..passes {
        if out.len() < 3 {
            break;
        }
        out = (0..out.len())
            .map(|i| {
                if i == 0 || i == out.len() - 1 {
                    out[i]
                } else {
                    (out[i - 1] + out[i] * 2.0 + out[i + 1]) * 0.25
                }
            })
            .collect();
    }
    out
}

/// Spline samples through `controls`, `subdiv` samples per span, with
/// rotation minimizing frames. Fewer than two controls give no samples.
pub(crate) fn spline_points(controls: &[Vec3], subdiv: usize) -> Vec<SplinePoint> {
    let n = controls.len();
    if n < 2 {
        return Vec::new();
    }
    let subdiv = subdiv.max(1);

    let tangents: Vec<Vec3> = (0..n)
        .map(|i| {
            if i == 0 {
                controls[1] - controls[0]
            } else if i == n - 1 {
                controls[n - 1] - controls[n - 2]
            } else {
                (controls[i + 1] - controls[i - 1]) * 0.5
            }
        })
        .collect();

    let mut points = Vec::with_capacity((n - 1) * subdiv + 1);
    for i in 0..n - 1 {
        let (p0, p1) = (controls[i], controls[i + 1]);
        let (m0, m1) = (tangents[i], tangents[i + 1]);
        for j in 0..subdiv {
            let t = j as f32 / subdiv as f32;
            points.push(SplinePoint {
                pos: hermite_point(p0, m0, p1, m1, t),
                tangent: hermite_tangent(p0, m0, p1, m1, t).normalize_or_zero(),
                normal: Vec3::ZERO,
                binormal: Vec3::ZERO,
                control: if t < 0.5 { i } else { i + 1 },
            });
        }
    }
    points.push(SplinePoint {
        pos: controls[n - 1],
        tangent: tangents[n - 1].normalize_or_zero(),
        normal: Vec3::ZERO,
        binormal: Vec3::ZERO,
        control: n - 1,
    });

    compute_rmf(&mut points);
    points
}

/// Compute Rotation Minimizing Frames using the double reflection method
/// (Wang et al. 2008).
fn compute_rmf(points: &mut [SplinePoint]) {
    if points.is_empty() {
        return;
    }

    let t0 = points[0].tangent;
    let arbitrary = if t0.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let n0 = t0.cross(arbitrary).normalize_or_zero();
    let b0 = t0.cross(n0).normalize_or_zero();

    points[0].normal = n0;
    points[0].binormal = b0;

    for i in 0..points.len() - 1 {
        let x_i = points[i].pos;
        let x_i1 = points[i + 1].pos;
        let t_i = points[i].tangent;
        let t_i1 = points[i + 1].tangent;
        let r_i = points[i].normal;
        let s_i = points[i].binormal;

        let v1 = x_i1 - x_i;
        let c1 = v1.dot(v1);

        if c1 < 1e-10 {
            points[i + 1].normal = r_i;
            points[i + 1].binormal = s_i;
            continue;
        }

        let r_i_l = r_i - (2.0 / c1) * v1.dot(r_i) * v1;
        let t_i_l = t_i - (2.0 / c1) * v1.dot(t_i) * v1;

        let v2 = t_i1 - t_i_l;
        let c2 = v2.dot(v2);

        let r_i1 = if c2 < 1e-10 {
            r_i_l
        } else {
            r_i_l - (2.0 / c2) * v2.dot(r_i_l) * v2
        };

        let r_i1 = (r_i1 - t_i1 * t_i1.dot(r_i1)).normalize_or_zero();
        let s_i1 = t_i1.cross(r_i1).normalize_or_zero();

        points[i + 1].normal = r_i1;
        points[i + 1].binormal = s_i1;
    }
}

/// Swept-profile mesh: flat positions, per-vertex control index and
/// triangle index.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ProfileMesh {
    pub position: Vec<f32>,
    pub control: Vec<usize>,
    pub index: Vec<u32>,
}

/// Sweep an ellipse with half-axes `radius * aspect` (along the normal)
/// and `radius` (along the binormal) along `points`. `segments == 2`
/// produces a flat band.
pub(crate) fn sweep(
    points: &[SplinePoint],
    segments: usize,
    radius: f32,
    aspect: f32,
    base_vertex: u32,
) -> ProfileMesh {
    let mut mesh = ProfileMesh::default();
    if points.len() < 2 || segments < 2 {
        return mesh;
    }

    for point in points {
        for k in 0..segments {
            let angle = (k as f32 / segments as f32) * std::f32::consts::TAU;
            let offset = point.normal * (angle.cos() * radius * aspect)
                + point.binormal * (angle.sin() * radius);
            mesh.position.extend_from_slice(&(point.pos + offset).to_array());
            mesh.control.push(point.control);
        }
    }

    let ring = segments as u32;
    for i in 0..(points.len() - 1) as u32 {
        for k in 0..ring {
            let k_next = (k + 1) % ring;
            let v0 = base_vertex + i * ring + k;
            let v1 = base_vertex + i * ring + k_next;
            let v2 = base_vertex + (i + 1) * ring + k;
            let v3 = base_vertex + (i + 1) * ring + k_next;
            mesh.index.extend_from_slice(&[v0, v2, v1, v1, v2, v3]);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Vec<Vec3> {
        (0..n).map(|i| Vec3::X * i as f32 * 3.8).collect()
    }

    #[test]
    fn spline_passes_through_controls() {
        let controls = line(4);
        let points = spline_points(&controls, 5);
        assert_eq!(points.len(), 3 * 5 + 1);
        assert_eq!(points[0].pos, controls[0]);
        assert_eq!(points[5].pos, controls[1]);
        assert_eq!(points.last().map(|p| p.pos), Some(controls[3]));
    }

    #[test]
    fn frames_are_orthonormal() {
        let controls = vec![
            Vec3::ZERO,
            Vec3::new(3.0, 1.0, 0.0),
            Vec3::new(5.0, 4.0, 1.0),
            Vec3::new(6.0, 8.0, 3.0),
        ];
        for p in spline_points(&controls, 4) {
            assert!(p.normal.dot(p.tangent).abs() < 1e-4);
            assert!((p.normal.length() - 1.0).abs() < 1e-4);
            assert!((p.binormal.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn sweep_produces_rings_and_quads() {
        let points = spline_points(&line(3), 2);
        let mesh = sweep(&points, 6, 0.5, 1.0, 0);
        assert_eq!(mesh.position.len(), points.len() * 6 * 3);
        assert_eq!(mesh.control.len(), points.len() * 6);
        assert_eq!(mesh.index.len(), (points.len() - 1) * 6 * 6);
    }

    #[test]
    fn too_few_controls_give_nothing() {
        assert!(spline_points(&line(1), 4).is_empty());
        assert_eq!(sweep(&[], 6, 1.0, 1.0, 0), ProfileMesh::default());
    }

    #[test]
    fn smoothing_keeps_endpoints() {
        let pts = vec![Vec3::ZERO, Vec3::Y * 4.0, Vec3::X * 2.0];
        let s = smooth(&pts, 1);
        assert_eq!(s[0], pts[0]);
        assert_eq!(s[2], pts[2]);
        assert_eq!(s[1], Vec3::new(0.5, 2.0, 0.0));
    }
}
