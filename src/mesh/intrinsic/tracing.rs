// Copyright (C) 2026 the intrinsic-mesh contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar layout of the intrinsic mesh and the machinery built on it:
//! point location by walking across triangles, tracing an extrinsic
//! triangle's perimeter through the intrinsic triangulation, and the
//! common subdivision of the two meshes.
//!
//! All layouts are isometric: a triangle is placed in the plane purely from
//! its edge lengths, starting from a halfedge anchored at a known position
//! and direction. The support link `(S, A)` of an extrinsic triangle is
//! exactly such an anchor, which is what lets an extrinsic triangle be laid
//! out over the intrinsic triangulation.

use super::IntrinsicMesh;
use crate::prelude::*;
use std::f64::consts::{PI, TAU};

/// Iteration cap for a single perimeter-edge walk; hitting it means the
/// support link is inconsistent.
const MAX_TRACE_STEPS: usize = 200;

/// The common subdivision as three parallel lists: for each output
/// triangle, the extrinsic triangle containing it, the intrinsic triangle
/// containing it, and its 3-D corner coordinates.
#[derive(Debug, Clone, Default)]
pub struct CommonSubdivision {
    pub extrinsic: Vec<usize>,
    pub intrinsic: Vec<usize>,
    pub triangles: Vec<[DVec3; 3]>,
}

impl CommonSubdivision {
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

impl IntrinsicMesh {
    /// Isometric planar layout of extrinsic triangle `t`: first vertex at
    /// the origin, first edge along the x axis, using the Gram-Schmidt
    /// frame (tangent, normal x tangent, normal) of the triangle plane.
    pub fn te_flatten(&self, t: usize) -> [DVec2; 3] {
        let conn = self.he.conn();
        let h0 = conn.triangle_halfedge(t);
        let h1 = conn.next(h0);
        let h2 = conn.next(h1);
        let v0 = self.he.position(conn.halfedge(h0).vertex);
        let v1 = self.he.position(conn.halfedge(h1).vertex);
        let v2 = self.he.position(conn.halfedge(h2).vertex);
        let u = v1 - v0;
        let w = v2 - v0;
        let normal = u.cross(w).normalize();
        let tangent = u.normalize();
        let bitangent = normal.cross(tangent);
        [
            DVec2::ZERO,
            DVec2::new(tangent.dot(u), bitangent.dot(u)),
            DVec2::new(tangent.dot(w), bitangent.dot(w)),
        ]
    }

    /// Planar position of the apex of the triangle of `h0`, given the
    /// layout position of its origin and the direction of `h0`.
    pub(crate) fn compute_v2(&self, v0: DVec2, h0: usize, phi0: f64) -> DVec2 {
        let p = self.conn.previous(h0);
        let l2 = self.l[self.conn.h[p].edge];
        let phi1 = phi0 + self.h_angle(h0);
        v0 + l2 * DVec2::new(phi1.cos(), phi1.sin())
    }

    /// Canonical planar layout of the triangle of `h0`: origin at `(0,0)`,
    /// the edge of `h0` along the x axis.
    pub fn t_flatten(&self, h0: usize) -> [DVec2; 3] {
        let l0 = self.l[self.conn.h[h0].edge];
        let v0 = DVec2::ZERO;
        let v1 = DVec2::new(l0, 0.0);
        [v0, v1, self.compute_v2(v0, h0, 0.0)]
    }

    /// Lays out the triangle of `h0` with its origin at `v0` and `h0`
    /// heading in direction `phi0`. When `v1` is given it is reused
    /// instead of recomputed, which keeps a walk watertight across steps.
    /// Returns `(v1, v2, phi1, phi2)` where `phi1` is the direction of the
    /// second edge and `phi2` the outgoing direction at `v0` toward the
    /// apex.
    pub(crate) fn compute_flatten(
        &self,
        v0: DVec2,
        h0: usize,
        phi0: f64,
        v1: Option<DVec2>,
    ) -> (DVec2, DVec2, f64, f64) {
        let l0 = self.l[self.conn.h[h0].edge];
        let v1 = v1.unwrap_or_else(|| v0 + l0 * DVec2::new(phi0.cos(), phi0.sin()));
        let h1 = self.conn.next(h0);
        let h2 = self.conn.next(h1);
        let l1 = self.l[self.conn.h[h1].edge];
        let l2 = self.l[self.conn.h[h2].edge];
        let alpha = ((l0 * l0 + l1 * l1 - l2 * l2) / (2.0 * l0 * l1))
            .clamp(-1.0, 1.0)
            .acos();
        let phi1 = phi0 + PI - alpha;
        let v2 = v1 + l1 * DVec2::new(phi1.cos(), phi1.sin());
        let beta = ((l0 * l0 + l2 * l2 - l1 * l1) / (2.0 * l0 * l2))
            .clamp(-1.0, 1.0)
            .acos();
        let phi2 = phi0 + beta + PI;
        (v1, v2, phi1, phi2)
    }

    /// Locates the point `p`, expressed in a plane where the origin of
    /// `h0` sits at `(0,0)` and `h0` heads in direction `phi0`, by walking
    /// across intrinsic triangles toward it. Returns the halfedge of the
    /// containing triangle and the barycentric coordinates of `p` in its
    /// layout.
    ///
    /// A crossing into a border edge stops the walk at the current
    /// triangle; the returned coordinates then place `p` outside it and
    /// the caller decides what to do.
    pub fn point_location(&self, p: DVec2, h0: usize, phi0: f64) -> (usize, [f64; 3]) {
        let mut h0 = h0;
        let mut phi0 = phi0;
        let mut l0 = self.l[self.conn.h[h0].edge];
        let mut v0 = DVec2::ZERO;
        let mut v1 = l0 * DVec2::new(phi0.cos(), phi0.sin());
        loop {
            let h1 = self.conn.next(h0);
            let h2 = self.conn.next(h1);
            let l1 = self.l[self.conn.h[h1].edge];
            let l2 = self.l[self.conn.h[h2].edge];
            let alpha = ((l0 * l0 + l1 * l1 - l2 * l2) / (2.0 * l0 * l1))
                .clamp(-1.0, 1.0)
                .acos();
            let phi1 = phi0 + PI - alpha;
            let v2 = v1 + l1 * DVec2::new(phi1.cos(), phi1.sin());
            if !geom::ccw(v1, v2, p) && (geom::ccw(v2, v0, p) || geom::crossing(v1, v2, p, DVec2::ZERO)) {
                // cross the far edge v1-v2
                let m1 = self.conn.mate(h1);
                if m1 != NONE {
                    v0 = v2;
                    l0 = l1;
                    h0 = m1;
                    phi0 = phi1 + PI;
                    continue;
                }
            } else if !geom::ccw(v2, v0, p) {
                // cross the edge v2-v0
                let m2 = self.conn.mate(h2);
                if m2 != NONE {
                    let beta = ((l0 * l0 + l2 * l2 - l1 * l1) / (2.0 * l0 * l2))
                        .clamp(-1.0, 1.0)
                        .acos();
                    v1 = v2;
                    l0 = l2;
                    h0 = m2;
                    phi0 += beta;
                    continue;
                }
            }
            let a = geom::area(v0, v1, v2);
            let u = geom::area(p, v1, v2) / a;
            let v = geom::area(p, v2, v0) / a;
            return (h0, [u, v, 1.0 - u - v]);
        }
    }

    /// Locates the point at barycentric coordinates `uvw` of extrinsic
    /// triangle `te` on the intrinsic mesh, starting from the triangle's
    /// support link. Returns the intrinsic halfedge and intrinsic
    /// barycentric coordinates.
    pub fn te_point_location(&self, te: usize, uvw: [f64; 3]) -> (usize, [f64; 3]) {
        let v = self.te_flatten(te);
        let p = geom::from_barycentric(v[0], v[1], v[2], uvw);
        self.point_location(p, self.s[te], self.a[te])
    }

    /// Traces the perimeter of extrinsic triangle `te` (laid out as `ce`)
    /// through the intrinsic mesh. Every intrinsic triangle crossed by a
    /// perimeter edge is collected with its layout, and at each corner the
    /// fan around the corner vertex is swept up to the direction of the
    /// next edge. Interior neighbors that may overlap `te` without touching
    /// the perimeter are returned as an advancing front of
    /// `(position, halfedge, direction)` seeds.
    fn trace_perimeter(
        &self,
        te: usize,
        ce: &[DVec2; 3],
        mark: &mut [usize],
    ) -> (Vec<(usize, [DVec2; 3])>, Vec<(DVec2, usize, f64)>) {
        let mut trace: Vec<(usize, [DVec2; 3])> = Vec::new();
        let mut front: Vec<(DVec2, usize, f64)> = Vec::new();
        let he_conn = self.he.conn();
        let h0e = he_conn.triangle_halfedge(te);
        let h1e = he_conn.next(h0e);
        let h2e = he_conn.next(h1e);
        let ve = [
            he_conn.halfedge(h0e).vertex,
            he_conn.halfedge(h1e).vertex,
            he_conn.halfedge(h2e).vertex,
        ];
        let phie = [
            self.he.h_angle(h0e),
            self.he.h_angle(h1e),
            self.he.h_angle(h2e),
        ];
        let mut theta = 0.0; // direction of the perimeter edge being traced
        let mut h0 = self.s[te];
        let mut phi0 = self.a[te];
        for i in 0..3 {
            let to = ce[i];
            let tp = ce[(i + 1) % 3];
            let tv = ve[(i + 1) % 3];
            let mut v0 = ce[i];
            let mut v1: Option<DVec2> = None;
            let mut h1 = h0;
            let mut h2 = h0;
            let mut last_phi1 = phi0;
            let mut last_phi2 = phi0;
            let mut steps = 0;
            loop {
                steps += 1;
                if steps == MAX_TRACE_STEPS {
                    log::warn!("perimeter trace did not converge on extrinsic triangle {te}");
                    break;
                }
                let (cv1, cv2, phi1, phi2) = self.compute_flatten(v0, h0, phi0, v1);
                last_phi1 = phi1;
                last_phi2 = phi2;
                let t = self.conn.h[h0].triangle;
                if mark[t] != te {
                    trace.push((t, [v0, cv1, cv2]));
                    mark[t] = te;
                }
                h1 = self.conn.next(h0);
                h2 = self.conn.next(h1);
                if self.conn.h[h1].vertex == tv || self.conn.h[h2].vertex == tv {
                    break;
                }
                let m1 = self.conn.mate(h1);
                let m2 = self.conn.mate(h2);
                if geom::orient(to, tp, v0) <= 0.0
                    || geom::orient(to, tp, cv1) >= 0.0
                    || geom::orient(to, tp, cv2) >= 0.0
                {
                    assert!(m1 != NONE, "perimeter trace crossed the border");
                    if m2 != NONE
                        && mark[self.conn.h[m2].triangle] != te
                        && geom::in_triangle(ce, v0)
                        && geom::in_triangle(ce, cv2)
                    {
                        front.push((v0, m2, phi2 + PI));
                    }
                    v0 = cv2;
                    v1 = Some(cv1); // the far endpoint stays in place
                    h0 = m1;
                    phi0 = phi1 + PI;
                    continue;
                } else if geom::orient(cv2, v0, tp) <= 0.0 {
                    assert!(m2 != NONE, "perimeter trace crossed the border");
                    v1 = Some(cv2); // the origin stays in place
                    h0 = m2;
                    phi0 = phi2 + PI;
                    continue;
                }
                // neither side advances: the walk is stuck on a tolerance
                // knife edge and the step cap above will end it
            }

            // the target corner was reached; re-anchor on the halfedge
            // leaving it and sweep the corner fan up to the next edge
            if self.conn.h[h1].vertex == tv {
                h0 = h1;
                phi0 = last_phi1;
            } else {
                h0 = h2;
                phi0 = last_phi2;
            }
            theta += PI - phie[(i + 1) % 3];
            phi0 = phi0.rem_euclid(TAU);
            let v0 = tp;
            while phi0 > theta {
                let (fv1, fv2, fphi1, _) = self.compute_flatten(v0, h0, phi0, None);
                let m1 = self.conn.mate(self.conn.next(h0));
                if m1 != NONE
                    && mark[self.conn.h[m1].triangle] != te
                    && geom::in_triangle(ce, fv1)
                    && geom::in_triangle(ce, fv2)
                {
                    front.push((fv2, m1, fphi1 + PI));
                }
                let m = self.conn.mate(h0);
                if m == NONE {
                    break;
                }
                h0 = self.conn.next(m);
                phi0 -= self.h_angle(h0);
                let (gv1, gv2, _, _) = self.compute_flatten(v0, h0, phi0, None);
                let t = self.conn.h[h0].triangle;
                if mark[t] != te {
                    trace.push((t, [v0, gv1, gv2]));
                    mark[t] = te;
                }
            }
        }
        (trace, front)
    }

    /// All intrinsic triangles overlapping extrinsic triangle `te`: the
    /// perimeter trace plus an advancing front over interior neighbors
    /// whose barycenter falls inside `te`.
    fn collect_overlapping_triangles(
        &self,
        te: usize,
        ce: &[DVec2; 3],
        mark: &mut [usize],
    ) -> Vec<(usize, [DVec2; 3])> {
        let (mut trace, mut front) = self.trace_perimeter(te, ce, mark);
        while let Some((v0, h0, phi0)) = front.pop() {
            let t = self.conn.h[h0].triangle;
            if mark[t] == te {
                continue;
            }
            let (v1, v2, phi1, phi2) = self.compute_flatten(v0, h0, phi0, None);
            let center = (v0 + v1 + v2) / 3.0;
            if geom::in_triangle(ce, center) {
                trace.push((t, [v0, v1, v2]));
                mark[t] = te;
                let h1 = self.conn.next(h0);
                let h2 = self.conn.next(h1);
                let m1 = self.conn.mate(h1);
                let m2 = self.conn.mate(h2);
                if m1 != NONE {
                    front.push((v2, m1, phi1 + PI));
                }
                if m2 != NONE {
                    front.push((v0, m2, phi2 + PI));
                }
            }
        }
        trace
    }

    /// Barycentric coordinates (first two components) of each point with
    /// respect to the triangle `v`.
    fn to_barycentric(v: &[DVec2; 3], points: &[DVec2]) -> Vec<[f64; 2]> {
        let t_area = geom::area(v[0], v[1], v[2]);
        points
            .iter()
            .map(|&q| {
                [
                    geom::area(v[1], v[2], q) / t_area,
                    geom::area(v[2], v[0], q) / t_area,
                ]
            })
            .collect()
    }

    /// Fan-triangulates a convex polygon given in barycentric coordinates
    /// of extrinsic triangle `te` and maps the corners to 3-D.
    fn to_3d_triangles(&self, te: usize, uv: &[[f64; 2]]) -> Vec<[DVec3; 3]> {
        let conn = self.he.conn();
        let [v0, v1, v2] = conn.t_incidence(te);
        let corners = [
            self.he.position(v0),
            self.he.position(v1),
            self.he.position(v2),
        ];
        let at = |c: [f64; 2]| {
            corners[0] * c[0] + corners[1] * c[1] + corners[2] * (1.0 - c[0] - c[1])
        };
        let p0 = at(uv[0]);
        let mut p1 = at(uv[1]);
        let mut out = Vec::with_capacity(uv.len() - 2);
        for &c in &uv[2..] {
            let p2 = at(c);
            out.push([p0, p1, p2]);
            p1 = p2;
        }
        out
    }

    /// Builds the common subdivision of the extrinsic and intrinsic
    /// triangulations: for every extrinsic triangle, the intrinsic
    /// triangles overlapping it are collected in its planar layout, each
    /// overlap polygon is clipped, fan-triangulated, and mapped back to
    /// 3-D through the extrinsic embedding.
    pub fn generate_common_subdivision(&self) -> CommonSubdivision {
        let mut out = CommonSubdivision::default();
        let mut mark = vec![NONE; self.conn.num_triangles()];
        for te in 0..self.he.num_triangles() {
            let ce = self.te_flatten(te);
            let traced = self.collect_overlapping_triangles(te, &ce, &mut mark);
            for (t, tri) in traced {
                let overlap = geom::clip(&ce, &tri);
                if overlap.is_empty() {
                    continue;
                }
                let uv = Self::to_barycentric(&ce, &overlap);
                for coords in self.to_3d_triangles(te, &uv) {
                    out.extrinsic.push(te);
                    out.intrinsic.push(t);
                    out.triangles.push(coords);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::primitives::{create_grid, create_torus};
    use crate::mesh::Mesh;
    use approx::assert_relative_eq;

    fn intrinsic_grid(n: usize) -> IntrinsicMesh {
        let (v, f) = create_grid(n, n, 1.0, 1.0);
        IntrinsicMesh::new(Mesh::new(&v, &f).unwrap(), None).unwrap()
    }

    fn triangle_area_3d(t: &[DVec3; 3]) -> f64 {
        (t[1] - t[0]).cross(t[2] - t[0]).length() / 2.0
    }

    #[test]
    fn flatten_preserves_edge_lengths() {
        let im = intrinsic_grid(2);
        for t in 0..im.num_triangles() {
            let h0 = im.conn().triangle_halfedge(t);
            let tri = im.t_flatten(h0);
            let [l0, l1, l2] = {
                let [e0, e1, e2] = im.t_edges(t);
                [im.length(e0), im.length(e1), im.length(e2)]
            };
            assert_relative_eq!(tri[0].distance(tri[1]), l0, epsilon = 1e-12);
            assert_relative_eq!(tri[1].distance(tri[2]), l1, epsilon = 1e-12);
            assert_relative_eq!(tri[2].distance(tri[0]), l2, epsilon = 1e-12);
        }
    }

    #[test]
    fn extrinsic_flatten_is_isometric() {
        let (v, f) = create_torus(1.0, 0.3, 6, 6);
        let im = IntrinsicMesh::new(Mesh::new(&v, &f).unwrap(), None).unwrap();
        for te in 0..im.extrinsic().num_triangles() {
            let ce = im.te_flatten(te);
            let [v0, v1, v2] = im.extrinsic().t_incidence(te);
            let p = im.extrinsic();
            assert_relative_eq!(
                ce[0].distance(ce[1]),
                p.distance(v0, v1),
                epsilon = 1e-12
            );
            assert_relative_eq!(
                ce[1].distance(ce[2]),
                p.distance(v1, v2),
                epsilon = 1e-12
            );
            assert_relative_eq!(
                ce[2].distance(ce[0]),
                p.distance(v2, v0),
                epsilon = 1e-12
            );
            // counter-clockwise layout
            assert!(geom::orient(ce[0], ce[1], ce[2]) > 0.0);
        }
    }

    #[test]
    fn identity_point_location_round_trips() {
        let im = intrinsic_grid(2);
        let samples = [
            [0.2, 0.3, 0.5],
            [0.6, 0.2, 0.2],
            [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
        ];
        for te in 0..im.extrinsic().num_triangles() {
            for uvw in samples {
                let (h, uvw_i) = im.te_point_location(te, uvw);
                // both triangulations coincide, so the point stays in te
                assert_eq!(im.conn().halfedge(h).triangle, te);
                assert_relative_eq!(uvw_i[0] + uvw_i[1] + uvw_i[2], 1.0, epsilon = 1e-9);
                // interpolating the located coordinates over the intrinsic
                // triangle's (shared) vertices recovers the same 3-D point
                let tri = [
                    im.conn().halfedge(h).vertex,
                    im.conn().halfedge(im.conn().next(h)).vertex,
                    im.conn()
                        .halfedge(im.conn().next(im.conn().next(h)))
                        .vertex,
                ];
                let p3 = im.extrinsic().position(tri[0]) * uvw_i[0]
                    + im.extrinsic().position(tri[1]) * uvw_i[1]
                    + im.extrinsic().position(tri[2]) * uvw_i[2];
                let q3 = im.extrinsic().t_coord(te, uvw);
                assert_relative_eq!(p3.distance(q3), 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn point_location_walks_into_the_neighbor() {
        let im = intrinsic_grid(2);
        // triangle 0 spans (0,0), (0.5,0), (0,0.5); aim past its diagonal
        let h0 = im.conn().triangle_halfedge(0);
        let p = DVec2::new(0.4, 0.4);
        let (h, uvw) = im.point_location(p, h0, 0.0);
        assert_eq!(im.conn().halfedge(h).triangle, 1);
        assert!(uvw.iter().all(|&c| c >= -1e-9));
        // reconstruct the planar point from the identity embedding
        let a = im.conn().halfedge(h).vertex;
        let b = im.conn().halfedge(im.conn().next(h)).vertex;
        let c = im
            .conn()
            .halfedge(im.conn().next(im.conn().next(h)))
            .vertex;
        let q = im.extrinsic().position(a).truncate() * uvw[0]
            + im.extrinsic().position(b).truncate() * uvw[1]
            + im.extrinsic().position(c).truncate() * uvw[2];
        assert_relative_eq!(q.distance(p), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn identity_subdivision_reproduces_the_mesh() {
        let im = intrinsic_grid(2);
        let sub = im.generate_common_subdivision();
        assert_eq!(sub.len(), im.num_triangles());
        for i in 0..sub.len() {
            // each output triangle pairs a triangle with itself
            assert_eq!(sub.extrinsic[i], sub.intrinsic[i]);
            assert_relative_eq!(
                triangle_area_3d(&sub.triangles[i]),
                im.extrinsic().t_area(sub.extrinsic[i]),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn subdivision_conserves_area_after_refinement() {
        let (v, f) = create_grid(3, 3, 1.0, 0.4);
        let mut im = IntrinsicMesh::new(Mesh::new(&v, &f).unwrap(), None).unwrap();
        im.chew93(25f64.to_radians());
        im.check_consistency().unwrap();
        let sub = im.generate_common_subdivision();
        let mut per_te = vec![0.0; im.extrinsic().num_triangles()];
        for i in 0..sub.len() {
            per_te[sub.extrinsic[i]] += triangle_area_3d(&sub.triangles[i]);
        }
        for te in 0..im.extrinsic().num_triangles() {
            assert_relative_eq!(per_te[te], im.extrinsic().t_area(te), epsilon = 1e-6);
        }
    }

    #[test]
    fn torus_subdivision_conserves_total_area() {
        let (v, f) = create_torus(1.0, 0.3, 8, 8);
        let mut im = IntrinsicMesh::new(Mesh::new(&v, &f).unwrap(), None).unwrap();
        im.chew93(28f64.to_radians());
        im.displace_delaunay();
        im.check_consistency().unwrap();
        let total: f64 = (0..im.extrinsic().num_triangles())
            .map(|t| im.extrinsic().t_area(t))
            .sum();
        let sub = im.generate_common_subdivision();
        let sum: f64 = sub.triangles.iter().map(triangle_area_3d).sum();
        assert_relative_eq!(sum, total, epsilon = 1e-5 * total);
        // every referenced id is in range
        assert!(sub.extrinsic.iter().all(|&te| te < im.extrinsic().num_triangles()));
        assert!(sub.intrinsic.iter().all(|&t| t < im.num_triangles()));
    }
}
