// Copyright (C) 2026 the intrinsic-mesh contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Intrinsic triangulation with supporting-halfedge correspondence.
//!
//! An [`IntrinsicMesh`] starts as a deep copy of an extrinsic mesh's
//! connectivity, with one length per edge instead of vertex positions. From
//! there the intrinsic triangulation is free to diverge (edge flips, vertex
//! insertion, relocation) while every extrinsic triangle stays tethered to
//! it through its *support link*: an intrinsic halfedge anchored at the
//! triangle's first vertex plus the signed angle of the triangle's first
//! halfedge relative to it. Laying the intrinsic mesh out in the plane from
//! the support link recovers where the extrinsic triangle sits on the
//! intrinsic triangulation.

use crate::prelude::*;
use std::f64::consts::PI;
use std::fmt;

/// Cotangent Laplacian, diffusion and Poisson solvers, data transfer
mod laplace;

/// Edge split, triangle split, vertex relocation and Chew refinement
mod refine;

/// Planar flattening, point location and the common subdivision
mod tracing;

pub use tracing::CommonSubdivision;

/// Minimum allowed intrinsic edge length; shorter edges refuse to split.
pub const L_MIN: f64 = 1e-10;

/// Total surface angle below which an extrinsic vertex is tagged narrow
/// (60 degrees).
const NARROW_ANGLE_LIMIT: f64 = PI / 3.0;

/// Pops an arbitrary element from the working set.
pub(crate) fn pop_any(set: &mut HashSet<usize>) -> Option<usize> {
    let x = set.iter().next().copied()?;
    set.remove(&x);
    Some(x)
}

/// Intrinsic triangulation of the surface of an extrinsic mesh, described
/// by edge lengths over its own halfedge connectivity.
///
/// Vertices `0..extrinsic().num_vertices()` correspond to extrinsic
/// vertices; any vertex beyond that range is a Steiner vertex introduced by
/// refinement. Only Steiner vertices may be relocated.
#[derive(Debug, Clone)]
pub struct IntrinsicMesh {
    /// The supporting extrinsic mesh; never mutated after construction.
    pub(crate) he: Mesh,
    /// Deep copy of the extrinsic connectivity, free to diverge.
    pub(crate) conn: MeshConnectivity,
    /// Length of each intrinsic edge.
    pub(crate) l: Vec<f64>,
    /// Supporting intrinsic halfedge of each extrinsic triangle.
    pub(crate) s: Vec<usize>,
    /// Angle of each extrinsic triangle's first halfedge relative to its
    /// support, kept in `(-π, 0]`.
    pub(crate) a: Vec<f64>,
    /// Extrinsic vertices whose total surface angle is below the narrow
    /// limit.
    pub(crate) narrow: Vec<bool>,
    /// Smallest edge length of the input, before mollification.
    lmin0: f64,
}

impl IntrinsicMesh {
    /// Builds the intrinsic triangulation of `mesh`. Initially both
    /// triangulations coincide: the connectivity is copied, edge lengths
    /// are the 3-D distances, and every support link is the identity.
    ///
    /// When `mollification_factor` is given and some triangle violates the
    /// strict triangle inequality by that margin, every edge length is
    /// increased by the smallest uniform slack that restores it.
    pub fn new(mesh: Mesh, mollification_factor: Option<f64>) -> Result<Self> {
        let conn = mesh.conn().clone();
        let mut l = Vec::with_capacity(conn.num_edges());
        for e in 0..conn.num_edges() {
            let h0 = conn.edge_halfedges(e)[0];
            let h1 = conn.next(h0);
            l.push(mesh.distance(conn.halfedge(h0).vertex, conn.halfedge(h1).vertex));
        }
        let lmin0 = l.iter().copied().fold(f64::INFINITY, f64::min);
        let s = conn.t.clone();
        let a = vec![0.0; s.len()];
        let mut im = Self {
            he: mesh,
            conn,
            l,
            s,
            a,
            narrow: Vec::new(),
            lmin0,
        };
        if let Some(delta) = mollification_factor {
            im.mollify(delta);
        }
        im.mark_narrow_vertices(NARROW_ANGLE_LIMIT);
        im.check_consistency()?;
        Ok(im)
    }

    /// Adds a uniform slack to every edge so that each triangle satisfies
    /// `l_i + delta <= l_j + l_k` on all three sides. Returns whether any
    /// slack was needed. The uniform offset preserves the length order.
    pub fn mollify(&mut self, delta: f64) -> bool {
        let mut epsilon = 0.0f64;
        for t in 0..self.conn.num_triangles() {
            let l = self.t_lens(t);
            for i in 0..3 {
                let d = delta + l[i] - l[(i + 1) % 3] - l[(i + 2) % 3];
                epsilon = epsilon.max(d);
            }
        }
        if epsilon == 0.0 {
            return false;
        }
        for l in &mut self.l {
            *l += epsilon;
        }
        true
    }

    /// Tags extrinsic vertices whose total incident angle is below `limit`.
    fn mark_narrow_vertices(&mut self, limit: f64) {
        self.narrow = (0..self.conn.num_vertices())
            .map(|v| self.v_angle(v) < limit)
            .collect();
    }

    /// Whether a triangle touches a narrow extrinsic vertex.
    pub fn t_narrow(&self, t: usize) -> bool {
        self.conn
            .t_incidence(t)
            .into_iter()
            .any(|v| v < self.he.num_vertices() && self.narrow[v])
    }

    /// The extrinsic mesh this triangulation lives on.
    pub fn extrinsic(&self) -> &Mesh {
        &self.he
    }

    pub fn conn(&self) -> &MeshConnectivity {
        &self.conn
    }

    pub fn num_vertices(&self) -> usize {
        self.conn.num_vertices()
    }

    pub fn num_edges(&self) -> usize {
        self.conn.num_edges()
    }

    pub fn num_triangles(&self) -> usize {
        self.conn.num_triangles()
    }

    /// Length of an intrinsic edge.
    pub fn length(&self, e: usize) -> f64 {
        self.l[e]
    }

    /// The support link of an extrinsic triangle: its supporting intrinsic
    /// halfedge and the angle offset in `(-π, 0]`.
    pub fn support(&self, te: usize) -> (usize, f64) {
        (self.s[te], self.a[te])
    }

    /// Whether `v` is a Steiner vertex (introduced by refinement rather
    /// than copied from the extrinsic mesh).
    pub fn is_steiner(&self, v: usize) -> bool {
        v >= self.he.num_vertices()
    }

    pub fn is_narrow(&self, v: usize) -> bool {
        self.narrow[v]
    }

    pub fn mate(&self, he: usize) -> usize {
        self.conn.mate(he)
    }

    pub fn next(&self, he: usize) -> usize {
        self.conn.next(he)
    }

    pub fn previous(&self, he: usize) -> usize {
        self.conn.previous(he)
    }

    pub fn adj_vh(&self, v: usize) -> SVec<usize> {
        self.conn.adj_vh(v)
    }

    pub fn border_h(&self, v: usize) -> usize {
        self.conn.border_h(v)
    }

    /// The shortest intrinsic edge length.
    pub fn get_lmin(&self) -> f64 {
        self.l.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Average intrinsic edge length.
    pub fn l_average(&self) -> f64 {
        self.l.iter().sum::<f64>() / self.l.len() as f64
    }

    /// Longest intrinsic edge length.
    pub fn l_max(&self) -> f64 {
        self.l.iter().copied().fold(0.0, f64::max)
    }

    /// Total surface angle around a vertex, walking the fan clockwise and,
    /// if the walk runs into the border, sweeping the remaining triangles
    /// from the other side.
    pub fn v_angle(&self, v: usize) -> f64 {
        let h0 = self.conn.v[v];
        if h0 == NONE {
            return 0.0;
        }
        let mut a = 0.0;
        let mut h = h0;
        loop {
            a += self.h_angle(h);
            h = self.conn.mate(self.conn.previous(h));
            if h == NONE || h == h0 {
                break;
            }
        }
        if h == NONE {
            let mut m = self.conn.mate(h0);
            while m != NONE {
                let h = self.conn.next(m);
                a += self.h_angle(h);
                m = self.conn.mate(h);
            }
        }
        a
    }

    pub fn t_incidence(&self, t: usize) -> [usize; 3] {
        self.conn.t_incidence(t)
    }

    pub fn t_halfedges(&self, t: usize) -> [usize; 3] {
        self.conn.t_halfedges(t)
    }

    /// The three edges of a triangle.
    pub fn t_edges(&self, t: usize) -> [usize; 3] {
        let [h0, h1, h2] = self.conn.t_halfedges(t);
        [
            self.conn.h[h0].edge,
            self.conn.h[h1].edge,
            self.conn.h[h2].edge,
        ]
    }

    /// The three edge lengths of a triangle.
    pub fn t_lens(&self, t: usize) -> [f64; 3] {
        let [e0, e1, e2] = self.t_edges(t);
        [self.l[e0], self.l[e1], self.l[e2]]
    }

    /// Interior angle at the origin of `h0`, by the law of cosines on the
    /// intrinsic lengths, with the cosine clamped before `acos`.
    pub fn h_angle(&self, h0: usize) -> f64 {
        let h1 = self.conn.next(h0);
        let h2 = self.conn.next(h1);
        let l0 = self.l[self.conn.h[h0].edge];
        let l1 = self.l[self.conn.h[h1].edge];
        let l2 = self.l[self.conn.h[h2].edge];
        ((l0 * l0 + l2 * l2 - l1 * l1) / (2.0 * l0 * l2))
            .clamp(-1.0, 1.0)
            .acos()
    }

    /// Interior angle opposite to the edge of `he` in its triangle.
    pub fn t_opposite_angle(&self, he: usize) -> f64 {
        let h1 = self.conn.next(he);
        let h2 = self.conn.next(h1);
        let l0 = self.l[self.conn.h[he].edge];
        let l1 = self.l[self.conn.h[h1].edge];
        let l2 = self.l[self.conn.h[h2].edge];
        ((l1 * l1 + l2 * l2 - l0 * l0) / (2.0 * l1 * l2))
            .clamp(-1.0, 1.0)
            .acos()
    }

    /// The interior angles of a triangle, one per halfedge origin.
    pub fn t_angles(&self, t: usize) -> [f64; 3] {
        let [h0, h1, h2] = self.conn.t_halfedges(t);
        debug_assert_eq!(self.conn.next(h2), h0);
        [self.h_angle(h0), self.h_angle(h1), self.h_angle(h2)]
    }

    /// Heron area of the triangle owning `h0`, from its edge lengths.
    pub fn h_area(&self, h0: usize) -> f64 {
        let h1 = self.conn.next(h0);
        let h2 = self.conn.next(h1);
        let l0 = self.l[self.conn.h[h0].edge];
        let l1 = self.l[self.conn.h[h1].edge];
        let l2 = self.l[self.conn.h[h2].edge];
        let s = (l0 + l1 + l2) / 2.0;
        (s * (s - l0) * (s - l1) * (s - l2)).sqrt()
    }

    /// Length of the edge owning `he`.
    pub fn h_edge_len(&self, he: usize) -> f64 {
        self.l[self.conn.h[he].edge]
    }

    /// Smallest interior angle over all triangles not touching a narrow
    /// vertex.
    pub fn get_angle_min(&self) -> f64 {
        let mut amin = std::f64::consts::TAU;
        for t in 0..self.conn.num_triangles() {
            if !self.t_narrow(t) {
                for a in self.t_angles(t) {
                    amin = amin.min(a);
                }
            }
        }
        amin
    }

    /// Largest interior angle over all triangles not touching a narrow
    /// vertex.
    pub fn get_angle_max(&self) -> f64 {
        let mut amax = 0.0f64;
        for t in 0..self.conn.num_triangles() {
            if !self.t_narrow(t) {
                for a in self.t_angles(t) {
                    amax = amax.max(a);
                }
            }
        }
        amax
    }

    /// Smallest interior angle over corners that sit at extrinsic vertices.
    pub fn get_free_angle_min(&self) -> f64 {
        let mut amin = std::f64::consts::TAU;
        for t in 0..self.conn.num_triangles() {
            for h in self.conn.t_halfedges(t) {
                if self.conn.h[h].vertex < self.he.num_vertices() {
                    amin = amin.min(self.h_angle(h));
                }
            }
        }
        amin
    }

    /// Minimum incident angle per vertex.
    pub fn compute_angle_min(&self) -> Vec<f64> {
        let mut result = vec![std::f64::consts::TAU; self.conn.num_vertices()];
        for t in 0..self.conn.num_triangles() {
            for h in self.conn.t_halfedges(t) {
                let v = self.conn.h[h].vertex;
                result[v] = result[v].min(self.h_angle(h));
            }
        }
        result
    }

    /// Angle defect `2π - Σ incident angles` per vertex, the discrete
    /// Gaussian curvature.
    pub fn v_curvatures(&self) -> Vec<f64> {
        let mut result = vec![std::f64::consts::TAU; self.conn.num_vertices()];
        for t in 0..self.conn.num_triangles() {
            for h in self.conn.t_halfedges(t) {
                result[self.conn.h[h].vertex] -= self.h_angle(h);
            }
        }
        result
    }

    /// Whether any corner vertex of the triangle of `h0` lies on the
    /// border.
    pub fn t_on_border(&self, h0: usize) -> bool {
        let h1 = self.conn.next(h0);
        let h2 = self.conn.next(h1);
        self.conn.border_h(self.conn.h[h0].vertex) != NONE
            || self.conn.border_h(self.conn.h[h1].vertex) != NONE
            || self.conn.border_h(self.conn.h[h2].vertex) != NONE
    }

    /// Verifies the structural invariants: halfedge cycles of length
    /// three, the strict triangle inequality with positive Heron area on
    /// every triangle, and every support angle in `(-π, 0]`.
    pub fn check_consistency(&self) -> Result<()> {
        for t in 0..self.conn.num_triangles() {
            let h0 = self.conn.t[t];
            let h1 = self.conn.next(h0);
            let h2 = self.conn.next(h1);
            if self.conn.next(h2) != h0 {
                bail!("halfedges of triangle {t} do not close");
            }
            let l0 = self.l[self.conn.h[h0].edge];
            let l1 = self.l[self.conn.h[h1].edge];
            let l2 = self.l[self.conn.h[h2].edge];
            if !(l0 + l1 > l2 && l1 + l2 > l0 && l2 + l0 > l1) {
                bail!("triangle {t} violates the triangle inequality: ({l0}, {l1}, {l2})");
            }
            let s = (l0 + l1 + l2) / 2.0;
            if s * (s - l0) * (s - l1) * (s - l2) <= 0.0 {
                bail!("triangle {t} has nonpositive squared area");
            }
        }
        for (te, &a) in self.a.iter().enumerate() {
            if !(a <= 0.0 && a > -PI) {
                bail!("support angle of extrinsic triangle {te} out of (-pi, 0]: {a}");
            }
        }
        Ok(())
    }

    /// Updates support links before `h` stops being incident to its origin
    /// vertex: any extrinsic triangle supported by `h` is re-anchored on
    /// the next outgoing halfedge around the vertex, and its angle offset
    /// decremented by the angle of the new support.
    pub(crate) fn update_removal(&mut self, h: usize) {
        let v = self.conn.h[h].vertex;
        if v >= self.he.num_vertices() {
            return;
        }
        for he in self.he.conn().adj_vh(v) {
            let te = self.he.conn().h[he].triangle;
            if self.s[te] == h {
                let rf = self.conn.next(self.conn.mate(h));
                self.s[te] = rf;
                let theta = self.h_angle(rf);
                self.a[te] -= theta;
            }
        }
    }

    /// Symmetric to [`Self::update_removal`]: after a new halfedge `h`
    /// appears around a vertex, any extrinsic triangle whose support
    /// follows it in counter-clockwise order is promoted onto `h` while
    /// the cumulative angle stays in `(-π, 0]`.
    pub(crate) fn update_insertion(&mut self, h: usize) {
        let v = self.conn.h[h].vertex;
        if v >= self.he.num_vertices() {
            return;
        }
        for he in self.he.conn().adj_vh(v) {
            let te = self.he.conn().h[he].triangle;
            let rf = self.s[te];
            if self.conn.mate(self.conn.previous(rf)) == h {
                let theta = self.h_angle(rf);
                if self.a[te] + theta <= 0.0 {
                    self.s[te] = h;
                    self.a[te] += theta;
                    debug_assert!(self.a[te] <= 0.0 && self.a[te] > -PI);
                }
            }
        }
    }

    /// Intrinsic edge flip. The support links of both endpoints are
    /// detached first, the new diagonal length comes from the law of
    /// cosines on the two opposite angles, and after the rewire the
    /// support links are re-attached.
    pub fn swapedge(&mut self, e: usize) -> bool {
        if self.conn.e[e][1] == NONE {
            return false;
        }
        let [h0, h1] = self.conn.e[e];
        let n0 = self.conn.next(h0);
        let n1 = self.conn.next(h1);
        let p0 = self.conn.next(n0);
        let p1 = self.conn.next(n1);
        let v0 = self.conn.h[h0].vertex;
        let v1 = self.conn.h[h1].vertex;
        let w0 = self.conn.h[p1].vertex;
        let w1 = self.conn.h[p0].vertex;
        let t0 = self.conn.h[h0].triangle;
        let t1 = self.conn.h[h1].triangle;

        self.update_removal(h0);
        self.update_removal(h1);

        // new diagonal from the two angles facing it across the
        // quadrilateral
        let a0 = self.t_opposite_angle(n0);
        let a1 = self.t_opposite_angle(p1);
        let l0 = self.l[self.conn.h[p0].edge];
        let l1 = self.l[self.conn.h[n1].edge];
        self.l[e] = (l0 * l0 + l1 * l1 - 2.0 * l0 * l1 * (a0 + a1).cos()).sqrt();

        self.conn.h[h0] = Halfedge { vertex: w0, edge: e, triangle: t0, next: p0 };
        self.conn.h[h1] = Halfedge { vertex: w1, edge: e, triangle: t1, next: p1 };
        self.conn.h[n0].vertex = v1;
        self.conn.h[n0].triangle = t1;
        self.conn.h[n0].next = h1;
        self.conn.h[n1].vertex = v0;
        self.conn.h[n1].triangle = t0;
        self.conn.h[n1].next = h0;
        self.conn.h[p0].vertex = w1;
        self.conn.h[p0].triangle = t0;
        self.conn.h[p0].next = n1;
        self.conn.h[p1].vertex = w0;
        self.conn.h[p1].triangle = t1;
        self.conn.h[p1].next = n0;
        self.conn.v[v0] = n1;
        self.conn.v[v1] = n0;
        self.conn.v[w0] = h0;
        self.conn.v[w1] = h1;
        self.conn.t[t0] = h0;
        self.conn.t[t1] = h1;

        self.update_insertion(h0);
        self.update_insertion(h1);
        true
    }

    /// Flips the edge only when both pairs of angles adjacent to the
    /// diagonal stay clearly convex (below 0.95π on each side).
    pub fn conditional_swapedge(&mut self, e: usize) -> bool {
        if self.conn.e_is_border(e) {
            return false;
        }
        let [h0, h1] = self.conn.e[e];
        let a0 = self.h_angle(h0);
        let b0 = self.h_angle(self.conn.next(h0));
        let b1 = self.h_angle(h1);
        let a1 = self.h_angle(self.conn.next(h1));
        if a0 + a1 < 0.95 * PI && b0 + b1 < 0.95 * PI {
            self.swapedge(e)
        } else {
            false
        }
    }

    /// Intrinsic Delaunay legality: the two angles opposite the edge must
    /// not sum past π (within tolerance). Border edges are legal.
    pub fn e_legal(&self, e: usize) -> bool {
        if self.conn.e_is_border(e) {
            return true;
        }
        let [h0, h1] = self.conn.e[e];
        let a = self.t_opposite_angle(h0);
        let b = self.t_opposite_angle(h1);
        a + b <= PI + 1e-5
    }

    /// Flips every illegal edge until the triangulation is intrinsically
    /// Delaunay. Returns the number of flips.
    pub fn delaunay(&mut self) -> usize {
        let mut eset: HashSet<usize> = (0..self.conn.num_edges()).collect();
        self.delaunay_flip(&mut eset, None)
    }

    /// Processes the edge working set: every illegal edge is flipped and
    /// the four surrounding edges re-enter the set. When `tset` is given,
    /// the triangles touched by a flip are collected into it. Returns the
    /// number of flips.
    pub fn delaunay_flip(
        &mut self,
        eset: &mut HashSet<usize>,
        mut tset: Option<&mut HashSet<usize>>,
    ) -> usize {
        let mut n = 0;
        while let Some(e) = pop_any(eset) {
            if !self.e_legal(e) {
                self.swapedge(e);
                n += 1;
                let [h0, h1] = self.conn.e[e];
                if let Some(ts) = tset.as_deref_mut() {
                    ts.insert(self.conn.h[h0].triangle);
                    ts.insert(self.conn.h[h1].triangle);
                }
                eset.insert(self.conn.h[self.conn.next(h0)].edge);
                eset.insert(self.conn.h[self.conn.previous(h0)].edge);
                eset.insert(self.conn.h[self.conn.next(h1)].edge);
                eset.insert(self.conn.h[self.conn.previous(h1)].edge);
            }
        }
        n
    }

    /// Structure counters for diagnostics.
    pub fn stats(&self) -> MeshStats {
        let border_edges = self.conn.count_border_edges();
        let border_vertices = (0..self.conn.num_vertices())
            .filter(|&v| self.conn.border_h(v) != NONE)
            .count();
        let isolated_vertices = self.conn.v.iter().filter(|&&h| h == NONE).count();
        let chi = self.conn.num_vertices() as i64 - self.conn.num_edges() as i64
            + self.conn.num_triangles() as i64;
        MeshStats {
            vertices: self.conn.num_vertices(),
            edges: self.conn.num_edges(),
            triangles: self.conn.num_triangles(),
            border_edges,
            border_vertices,
            isolated_vertices,
            genus: (2 - chi) / 2,
            lmin_initial: self.lmin0,
            lmin: self.get_lmin(),
            angle_min: self.get_angle_min(),
            angle_max: self.get_angle_max(),
        }
    }
}

/// Summary counters of an intrinsic triangulation.
#[derive(Debug, Clone, Copy)]
pub struct MeshStats {
    pub vertices: usize,
    pub edges: usize,
    pub triangles: usize,
    pub border_edges: usize,
    pub border_vertices: usize,
    pub isolated_vertices: usize,
    /// Genus estimate from the Euler characteristic, meaningful for closed
    /// surfaces.
    pub genus: i64,
    pub lmin_initial: f64,
    pub lmin: f64,
    pub angle_min: f64,
    pub angle_max: f64,
}

impl fmt::Display for MeshStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# verts: {}", self.vertices)?;
        writeln!(f, "# edges: {}", self.edges)?;
        writeln!(f, "# tris:  {}", self.triangles)?;
        writeln!(f, "# genus: {}", self.genus)?;
        writeln!(f, "# border edges: {}", self.border_edges)?;
        writeln!(f, "# border verts: {}", self.border_vertices)?;
        writeln!(f, "# isolated verts: {}", self.isolated_vertices)?;
        writeln!(f, "lmin0: {}", self.lmin_initial)?;
        writeln!(f, "lmin:  {}", self.lmin)?;
        writeln!(f, "amin:  {}", self.angle_min.to_degrees())?;
        write!(f, "amax:  {}", self.angle_max.to_degrees())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::primitives::{create_grid, create_sphere, create_torus};
    use approx::assert_relative_eq;

    fn intrinsic_grid(n: usize) -> IntrinsicMesh {
        let (v, f) = create_grid(n, n, 1.0, 1.0);
        IntrinsicMesh::new(Mesh::new(&v, &f).unwrap(), None).unwrap()
    }

    #[test]
    fn construction_copies_the_extrinsic_mesh() {
        let im = intrinsic_grid(2);
        assert_eq!(im.num_vertices(), im.extrinsic().num_vertices());
        assert_eq!(im.num_edges(), im.extrinsic().num_edges());
        assert_eq!(im.num_triangles(), im.extrinsic().num_triangles());
        // identity support links
        for te in 0..im.extrinsic().num_triangles() {
            let (s, a) = im.support(te);
            assert_eq!(s, im.extrinsic().conn().triangle_halfedge(te));
            assert_eq!(a, 0.0);
        }
        // intrinsic lengths agree with the embedding
        for e in 0..im.num_edges() {
            let [h0, _] = im.conn().edge_halfedges(e);
            let v0 = im.conn().halfedge(h0).vertex;
            let v1 = im.conn().halfedge(im.conn().next(h0)).vertex;
            assert_relative_eq!(im.length(e), im.extrinsic().distance(v0, v1));
        }
        im.check_consistency().unwrap();
    }

    #[test]
    fn flat_grid_interior_angles() {
        let im = intrinsic_grid(2);
        // interior vertex of a flat grid sees a full turn
        assert_relative_eq!(im.v_angle(4), std::f64::consts::TAU, epsilon = 1e-12);
        // no narrow vertices on a grid: corners have 90 degrees
        for v in 0..im.num_vertices() {
            assert!(!im.is_narrow(v));
        }
        // curvature vanishes at the interior vertex
        let k = im.v_curvatures();
        assert_relative_eq!(k[4], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn angles_sum_to_pi() {
        let im = intrinsic_grid(3);
        for t in 0..im.num_triangles() {
            let [a0, a1, a2] = im.t_angles(t);
            assert_relative_eq!(a0 + a1 + a2, std::f64::consts::PI, epsilon = 1e-9);
        }
    }

    #[test]
    fn heron_area_matches_embedding() {
        let im = intrinsic_grid(2);
        for t in 0..im.num_triangles() {
            let h0 = im.conn().triangle_halfedge(t);
            assert_relative_eq!(im.h_area(h0), im.extrinsic().t_area(t), epsilon = 1e-12);
        }
    }

    #[test]
    fn grid_is_intrinsically_delaunay() {
        let mut im = intrinsic_grid(2);
        assert_eq!(im.delaunay(), 0);
        for e in 0..im.num_edges() {
            assert!(im.e_legal(e));
        }
    }

    #[test]
    fn flip_is_reversible() {
        let mut im = intrinsic_grid(2);
        let e = (0..im.num_edges())
            .find(|&e| !im.conn().e_is_border(e))
            .unwrap();
        let lengths = im.l.clone();
        let supports = im.s.clone();
        let angles = im.a.clone();
        let chi = im.num_vertices() as i64 - im.num_edges() as i64 + im.num_triangles() as i64;

        assert!(im.swapedge(e));
        im.check_consistency().unwrap();
        assert!(im.swapedge(e));
        im.check_consistency().unwrap();

        // lengths, support halfedges and support angles all return
        for (l0, l1) in lengths.iter().zip(&im.l) {
            assert_relative_eq!(l0, l1, epsilon = 1e-9);
        }
        assert_eq!(supports, im.s);
        for (a0, a1) in angles.iter().zip(&im.a) {
            assert_relative_eq!(a0, a1, epsilon = 1e-9);
        }
        // a flip never changes the Euler characteristic
        let chi2 = im.num_vertices() as i64 - im.num_edges() as i64 + im.num_triangles() as i64;
        assert_eq!(chi, chi2);
    }

    #[test]
    fn mollification_rescues_degenerate_triangles() {
        let (v, f) = create_sphere(8, 8);
        let mesh = Mesh::new(&v, &f).unwrap();
        // the poles carry zero-length edges, so the raw lengths fail
        assert!(IntrinsicMesh::new(mesh.clone(), None).is_err());
        let im = IntrinsicMesh::new(mesh, Some(1e-10)).unwrap();
        im.check_consistency().unwrap();
        assert!(im.get_lmin() > 0.0);
    }

    #[test]
    fn perturbed_sphere_delaunay_improves_min_angle() {
        let (mut v, f) = create_sphere(8, 8);
        // push one interior vertex off the unit sphere
        let interior = 4 * 9 + 4;
        v[interior] *= 1.01;
        let mesh = Mesh::new(&v, &f).unwrap();
        let mut im = IntrinsicMesh::new(mesh, Some(1e-10)).unwrap();
        let before = im.get_angle_min();
        im.delaunay();
        im.check_consistency().unwrap();
        let after = im.get_angle_min();
        assert!(after >= before - 1e-12);
        // Delaunay is idempotent
        assert_eq!(im.delaunay(), 0);
    }

    #[test]
    fn conditional_swap_respects_the_convexity_gate() {
        let mut im = intrinsic_grid(2);
        let e = (0..im.num_edges())
            .find(|&e| !im.conn().e_is_border(e))
            .unwrap();
        // right isoceles triangles: both adjacent angle pairs sum to pi/2,
        // comfortably under the 0.95 pi gate
        assert!(im.conditional_swapedge(e));
        im.check_consistency().unwrap();
    }

    #[test]
    fn torus_stats() {
        let (v, f) = create_torus(1.0, 0.3, 8, 8);
        let im = IntrinsicMesh::new(Mesh::new(&v, &f).unwrap(), None).unwrap();
        let stats = im.stats();
        assert_eq!(stats.border_edges, 0);
        assert_eq!(stats.genus, 1);
        assert_eq!(stats.isolated_vertices, 0);
        assert!(stats.angle_min > 0.0);
        // the display form mentions the genus
        assert!(format!("{stats}").contains("genus: 1"));
    }
}
