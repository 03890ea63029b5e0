// Copyright (C) 2026 the intrinsic-mesh contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Index-based halfedge data structure for 2-manifold triangle meshes with
//! border.
//!
//! Every entity lives in a dense array and is addressed by its `usize`
//! index; [`NONE`] marks the absence of an entity (the mate of a border
//! halfedge, the halfedge of an isolated vertex). Entities are append-only:
//! operations rewrite records in place and push new ones at the tail, but
//! never shrink the arrays.

use crate::prelude::*;
use float_ord::FloatOrd;
use rand::Rng;

/// Sentinel index meaning "no entity": the mate of a border halfedge, the
/// halfedge of an isolated vertex.
pub const NONE: usize = usize::MAX;

/// Small inline vector used for halfedge fans and vertex rings.
pub type SVec<T> = SmallVec<[T; 4]>;

/// One halfedge record: origin vertex, owning edge, owning triangle and the
/// next halfedge around the triangle. Three halfedges form a cycle per
/// triangle, so `previous` is two `next`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Halfedge {
    pub vertex: usize,
    pub edge: usize,
    pub triangle: usize,
    pub next: usize,
}

/// Pure connectivity of an indexed triangle mesh: one outgoing halfedge per
/// vertex, the halfedge pair per edge, one halfedge per triangle, and the
/// halfedge records themselves.
///
/// The extrinsic [`Mesh`] couples this with vertex positions; the intrinsic
/// mesh couples a deep copy of it with edge lengths.
#[derive(Debug, Clone, Default)]
pub struct MeshConnectivity {
    /// One outgoing halfedge per vertex, [`NONE`] when isolated
    pub(crate) v: Vec<usize>,
    /// The two halfedges of each edge; the second is [`NONE`] on border
    pub(crate) e: Vec<[usize; 2]>,
    /// One halfedge per triangle
    pub(crate) t: Vec<usize>,
    /// Halfedge records
    pub(crate) h: Vec<Halfedge>,
}

impl MeshConnectivity {
    pub fn num_vertices(&self) -> usize {
        self.v.len()
    }

    pub fn num_edges(&self) -> usize {
        self.e.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.t.len()
    }

    pub fn num_halfedges(&self) -> usize {
        self.h.len()
    }

    pub fn halfedge(&self, h: usize) -> Halfedge {
        self.h[h]
    }

    pub fn vertex_halfedge(&self, v: usize) -> usize {
        self.v[v]
    }

    pub fn edge_halfedges(&self, e: usize) -> [usize; 2] {
        self.e[e]
    }

    pub fn triangle_halfedge(&self, t: usize) -> usize {
        self.t[t]
    }

    /// The other halfedge on the same edge, or [`NONE`] on border.
    pub fn mate(&self, he: usize) -> usize {
        let e = self.h[he].edge;
        if self.e[e][0] == he {
            self.e[e][1]
        } else {
            self.e[e][0]
        }
    }

    /// The next halfedge around the triangle.
    pub fn next(&self, he: usize) -> usize {
        self.h[he].next
    }

    /// The previous halfedge around the triangle (two nexts).
    pub fn previous(&self, he: usize) -> usize {
        self.h[self.h[he].next].next
    }

    /// Whether the halfedge belongs to a border edge.
    pub fn h_is_border(&self, he: usize) -> bool {
        self.e[self.h[he].edge][1] == NONE
    }

    /// Whether the edge is on the border.
    pub fn e_is_border(&self, e: usize) -> bool {
        self.e[e][1] == NONE
    }

    /// The halfedges outgoing from `v`. The walk starts at the vertex
    /// halfedge and advances while an interior mate exists; if it runs into
    /// the border, the other side of the fan is collected by sweeping
    /// backwards from the start.
    pub fn adj_vh(&self, v: usize) -> SVec<usize> {
        let mut list = SVec::new();
        let h0 = self.v[v];
        if h0 == NONE {
            return list;
        }
        let mut he = h0;
        loop {
            list.push(he);
            he = self.mate(he);
            if he == NONE {
                break;
            }
            he = self.next(he);
            if he == h0 {
                return list;
            }
        }
        let mut back = SVec::new();
        let mut he = self.mate(self.previous(h0));
        while he != NONE {
            back.push(he);
            he = self.mate(self.previous(he));
        }
        back.reverse();
        back.extend(list);
        back
    }

    /// The outgoing border halfedge of `v`, or [`NONE`] when `v` is
    /// interior or isolated.
    pub fn border_h(&self, v: usize) -> usize {
        let h0 = self.v[v];
        if h0 == NONE {
            return NONE;
        }
        let mut he = h0;
        while !self.h_is_border(he) {
            he = self.next(self.mate(he));
            if he == h0 {
                return NONE;
            }
        }
        he
    }

    /// The next halfedge along the border polygon.
    pub fn h_nextborder(&self, he: usize) -> usize {
        let mut he = self.next(he);
        while !self.h_is_border(he) {
            he = self.next(self.mate(he));
        }
        he
    }

    /// The previous halfedge along the border polygon.
    pub fn h_prevborder(&self, he: usize) -> usize {
        let mut he = self.previous(he);
        while !self.h_is_border(he) {
            he = self.previous(self.mate(he));
        }
        he
    }

    /// Finds `vi` in the star of `v`; returns the halfedge from `vi` to
    /// `v`, or [`NONE`].
    pub fn find_vv(&self, v: usize, vi: usize) -> usize {
        for he in self.adj_vh(v) {
            if self.h[self.next(he)].vertex == vi {
                return he;
            }
        }
        NONE
    }

    /// The three halfedges of a triangle, starting at its anchor.
    pub fn t_halfedges(&self, t: usize) -> [usize; 3] {
        let h0 = self.t[t];
        let h1 = self.next(h0);
        let h2 = self.next(h1);
        [h0, h1, h2]
    }

    /// The three vertex indices of a triangle.
    pub fn t_incidence(&self, t: usize) -> [usize; 3] {
        let [h0, h1, h2] = self.t_halfedges(t);
        [self.h[h0].vertex, self.h[h1].vertex, self.h[h2].vertex]
    }

    /// Number of border edges.
    pub fn count_border_edges(&self) -> usize {
        self.e.iter().filter(|e| e[1] == NONE).count()
    }
}

/// Folds coincident input points under a quantized coordinate key while
/// recording the effective vertex index of every point passed through it,
/// in call order.
#[derive(Debug, Default)]
pub struct VertexDedup {
    map: HashMap<(i64, i64, i64), usize>,
    pub indices: Vec<usize>,
}

const DEDUP_PRECISION: f64 = 1e7;

impl VertexDedup {
    fn key(p: DVec3) -> (i64, i64, i64) {
        (
            (p.x * DEDUP_PRECISION) as i64,
            (p.y * DEDUP_PRECISION) as i64,
            (p.z * DEDUP_PRECISION) as i64,
        )
    }
}

/// Extrinsic mesh: a 2-manifold triangle mesh with border, embedded in 3-D.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub(crate) positions: Vec<DVec3>,
    pub(crate) conn: MeshConnectivity,
}

impl Mesh {
    /// Builds the mesh from vertex positions and triangle incidences.
    ///
    /// Fails when a coordinate is not finite, a triangle repeats a vertex
    /// or references one out of range, or an edge is used by more than two
    /// triangles.
    pub fn new(vertices: &[DVec3], triangles: &[[usize; 3]]) -> Result<Self> {
        let mut mesh = Self::default();
        for &p in vertices {
            if !p.is_finite() {
                bail!("nonfinite vertex coordinate {p}");
            }
            mesh.add_vertex(p);
        }
        for tri in triangles {
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[2] == tri[0] {
                bail!("triangle with repeated vertex indices {tri:?}");
            }
            if tri.iter().any(|&v| v >= vertices.len()) {
                bail!("triangle {tri:?} references a vertex out of range");
            }
        }
        mesh.sew(triangles)?;
        Ok(mesh)
    }

    /// Creates all halfedges, triangles and edges at once. Directed edges
    /// are keyed by their sorted endpoints; pairs of equal keys become
    /// interior edges, singletons become border edges.
    fn sew(&mut self, triangles: &[[usize; 3]]) -> Result<()> {
        // (min endpoint, max endpoint, halfedge)
        let mut pairs: Vec<(usize, usize, usize)> = Vec::with_capacity(triangles.len() * 3);
        for (ti, tri) in triangles.iter().enumerate() {
            let h = self.conn.h.len();
            for i in 0..3 {
                self.conn.h.push(Halfedge {
                    vertex: tri[i],
                    edge: NONE,
                    triangle: ti,
                    next: if i == 2 { h } else { h + i + 1 },
                });
                self.conn.v[tri[i]] = h + i;
                let (a, b) = (tri[i], tri[(i + 1) % 3]);
                pairs.push((a.min(b), a.max(b), h + i));
            }
            self.conn.t.push(h);
        }
        pairs.sort();
        let mut i = 0;
        while i < pairs.len() {
            let e = self.conn.e.len();
            let same = |x: &(usize, usize, usize), y: &(usize, usize, usize)| x.0 == y.0 && x.1 == y.1;
            if i + 1 < pairs.len() && same(&pairs[i], &pairs[i + 1]) {
                if i + 2 < pairs.len() && same(&pairs[i], &pairs[i + 2]) {
                    bail!(
                        "more than two triangles share the edge ({}, {})",
                        pairs[i].0,
                        pairs[i].1
                    );
                }
                self.conn.e.push([pairs[i].2, pairs[i + 1].2]);
                self.conn.h[pairs[i].2].edge = e;
                self.conn.h[pairs[i + 1].2].edge = e;
                i += 2;
            } else {
                self.conn.e.push([pairs[i].2, NONE]);
                self.conn.h[pairs[i].2].edge = e;
                i += 1;
            }
        }
        Ok(())
    }

    /// Appends an isolated vertex and returns its index.
    pub fn add_vertex(&mut self, p: DVec3) -> usize {
        let v = self.conn.v.len();
        self.positions.push(p);
        self.conn.v.push(NONE);
        v
    }

    /// Appends a vertex unless a coincident one (under coordinate
    /// quantization) was already added through the same `dedup`; either way
    /// the effective index is recorded in `dedup.indices` and returned.
    pub fn add_vertex_dedup(&mut self, p: DVec3, dedup: &mut VertexDedup) -> usize {
        let key = VertexDedup::key(p);
        let v = match dedup.map.get(&key) {
            Some(&v) => v,
            None => {
                let v = self.add_vertex(p);
                dedup.map.insert(key, v);
                v
            }
        };
        dedup.indices.push(v);
        v
    }

    /// Adds a triangle to the growing mesh; the result must stay manifold.
    /// For each directed edge the reversed halfedge is searched among the
    /// existing stars: a hit pairs the new halfedge into an interior edge,
    /// a miss creates a border edge.
    pub fn add_triangle(&mut self, v0: usize, v1: usize, v2: usize) -> usize {
        let t = self.conn.t.len();
        let inc = [v0, v1, v2];
        let mut m = [NONE; 3];
        for i in 0..3 {
            m[i] = self.conn.find_vv(inc[(i + 1) % 3], inc[i]);
        }
        let mut last = NONE;
        for i in 0..3 {
            let h = self.conn.h.len();
            let e = if m[i] == NONE {
                let e = self.conn.e.len();
                self.conn.e.push([h, NONE]);
                e
            } else {
                let e = self.conn.h[m[i]].edge;
                self.conn.e[e][1] = h;
                e
            };
            self.conn.h.push(Halfedge {
                vertex: inc[i],
                edge: e,
                triangle: t,
                next: if i == 2 { h - 2 } else { h + 1 },
            });
            self.conn.v[inc[i]] = h;
            last = h;
        }
        self.conn.t.push(last);
        t
    }

    pub fn conn(&self) -> &MeshConnectivity {
        &self.conn
    }

    pub fn num_vertices(&self) -> usize {
        self.conn.v.len()
    }

    pub fn num_edges(&self) -> usize {
        self.conn.e.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.conn.t.len()
    }

    pub fn position(&self, v: usize) -> DVec3 {
        self.positions[v]
    }

    pub fn positions(&self) -> &[DVec3] {
        &self.positions
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

    pub fn t_incidence(&self, t: usize) -> [usize; 3] {
        self.conn.t_incidence(t)
    }

    /// The incidence table of the whole triangulation.
    pub fn incidence_table(&self) -> Vec<[usize; 3]> {
        (0..self.conn.t.len()).map(|t| self.t_incidence(t)).collect()
    }

    /// Euclidean distance between two vertices.
    pub fn distance(&self, v0: usize, v1: usize) -> f64 {
        self.positions[v0].distance(self.positions[v1])
    }

    /// The shortest edge length of the mesh.
    pub fn get_lmin(&self) -> f64 {
        let mut lmin = f64::INFINITY;
        for e in &self.conn.e {
            let h0 = e[0];
            let h1 = self.conn.next(h0);
            let l = self.distance(self.conn.h[h0].vertex, self.conn.h[h1].vertex);
            lmin = lmin.min(l);
        }
        lmin
    }

    /// The smallest interior angle over all triangles.
    pub fn get_angle_min(&self) -> f64 {
        let mut amin = std::f64::consts::TAU;
        for t in 0..self.conn.t.len() {
            for a in self.t_angles(t) {
                amin = amin.min(a);
            }
        }
        amin
    }

    /// The interior angles of a triangle, one per halfedge origin.
    pub fn t_angles(&self, t: usize) -> [f64; 3] {
        let [h0, h1, h2] = self.conn.t_halfedges(t);
        debug_assert_eq!(self.conn.next(h2), h0);
        [self.h_angle(h0), self.h_angle(h1), self.h_angle(h2)]
    }

    /// Interior angle at the origin of `h0`, from the three edge lengths
    /// with the cosine clamped before `acos`.
    pub fn h_angle(&self, h0: usize) -> f64 {
        let h1 = self.conn.next(h0);
        let h2 = self.conn.next(h1);
        let c0 = self.positions[self.conn.h[h0].vertex];
        let c1 = self.positions[self.conn.h[h1].vertex];
        let c2 = self.positions[self.conn.h[h2].vertex];
        let l0 = c0.distance(c1);
        let l1 = c1.distance(c2);
        let l2 = c2.distance(c0);
        ((l0 * l0 + l2 * l2 - l1 * l1) / (2.0 * l0 * l2))
            .clamp(-1.0, 1.0)
            .acos()
    }

    fn xy(&self, v: usize) -> DVec2 {
        self.positions[v].truncate()
    }

    /// Planar orientation of three vertices (x and y coordinates only).
    pub fn orient(&self, v0: usize, v1: usize, v2: usize) -> f64 {
        geom::orient(self.xy(v0), self.xy(v1), self.xy(v2))
    }

    pub fn ccw(&self, v0: usize, v1: usize, v2: usize) -> bool {
        self.orient(v0, v1, v2) > 0.0
    }

    /// Whether `v` lies strictly inside the circumcircle of `(v0, v1, v2)`,
    /// by the sign of the 4x4 in-circle determinant on planar coordinates.
    pub fn incircle(&self, v0: usize, v1: usize, v2: usize, v: usize) -> bool {
        let d = self.xy(v);
        let a = self.xy(v0) - d;
        let b = self.xy(v1) - d;
        let c = self.xy(v2) - d;
        let (a2, b2, c2) = (a.length_squared(), b.length_squared(), c.length_squared());
        let det = a.x * (b.y * c2 - c.y * b2) - a.y * (b.x * c2 - c.x * b2)
            + a2 * (b.x * c.y - c.x * b.y);
        det > 0.0
    }

    /// Whether the edge of `he` forms a counter-clockwise triangle with `v`.
    pub fn h_ccw(&self, he: usize, v: usize) -> bool {
        self.ccw(
            self.conn.h[he].vertex,
            v,
            self.conn.h[self.conn.next(he)].vertex,
        )
    }

    /// Planar Delaunay edge flip. Border edges cannot be swapped, and the
    /// flip is rejected unless the surrounding quadrilateral is strictly
    /// convex: the two original endpoints must sit on opposite sides of the
    /// new diagonal, each beyond tolerance.
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
        let l = self.distance(w0, w1);
        let d0 = self.orient(w0, w1, v0) / l / 2.0;
        let d1 = self.orient(w0, w1, v1) / l / 2.0;
        const TOL: f64 = 1e-5;
        if !((d0 > TOL && d1 < -TOL) || (d0 < -TOL && d1 > TOL)) {
            return false;
        }
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
        true
    }

    /// Planar Delaunay legality: border edges are legal; an interior edge
    /// is legal when neither opposite vertex lies strictly inside the
    /// circumcircle of the triangle on the other side.
    pub fn e_legal(&self, e: usize) -> bool {
        if self.conn.e_is_border(e) {
            return true;
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
        !self.incircle(v0, v1, w1, w0) && !self.incircle(v0, w0, v1, w1)
    }

    /// Scans all edges and swaps illegal ones until a full pass makes no
    /// change. Returns the number of flips performed.
    pub fn delaunay(&mut self) -> usize {
        let mut flips = 0;
        loop {
            let mut changed = false;
            for e in 0..self.conn.e.len() {
                if !self.e_legal(e) && self.swapedge(e) {
                    flips += 1;
                    changed = true;
                }
            }
            if !changed {
                return flips;
            }
        }
    }

    /// Builds a planar triangulation of the points `(x, y)` by incremental
    /// insertion in x-sorted order: seed with the first three points
    /// oriented counter-clockwise, then stitch every further point to the
    /// maximal fan of border halfedges it sees.
    pub fn triangulate(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            bail!("coordinate arrays differ in length");
        }
        if x.len() < 3 {
            bail!("triangulation needs at least three points");
        }
        let mut mesh = Self::default();
        for (&xi, &yi) in x.iter().zip(y) {
            mesh.add_vertex(DVec3::new(xi, yi, 0.0));
        }
        let mut order: Vec<usize> = (0..x.len()).collect();
        order.sort_by_key(|&i| FloatOrd(x[i]));
        if mesh.ccw(order[0], order[1], order[2]) {
            mesh.add_triangle(order[0], order[1], order[2]);
        } else {
            mesh.add_triangle(order[0], order[2], order[1]);
        }
        // the leftmost vertex never leaves the hull, so the border walk can
        // always restart from it
        let mut bt = order[0];
        for &i in &order[3..] {
            let mut hbt = mesh.conn.border_h(bt);
            if mesh.h_ccw(hbt, i) {
                // move backward to the first border halfedge the point sees
                let mut he = mesh.conn.h_prevborder(hbt);
                while mesh.h_ccw(he, i) {
                    hbt = he;
                    he = mesh.conn.h_prevborder(he);
                }
            } else {
                // move forward until the point sees the border
                hbt = mesh.conn.h_nextborder(hbt);
                while !mesh.h_ccw(hbt, i) {
                    hbt = mesh.conn.h_nextborder(hbt);
                }
            }
            bt = mesh.conn.h[hbt].vertex;
            let a = mesh.conn.h[hbt].vertex;
            let b = mesh.conn.h[mesh.conn.next(hbt)].vertex;
            mesh.add_triangle(a, i, b);
            let mut he = mesh.conn.h_nextborder(hbt);
            while mesh.h_ccw(he, i) {
                let a = mesh.conn.h[he].vertex;
                let b = mesh.conn.h[mesh.conn.next(he)].vertex;
                mesh.add_triangle(a, i, b);
                he = mesh.conn.h_nextborder(he);
            }
        }
        Ok(mesh)
    }

    /// The edge vector of a halfedge, from origin to destination.
    pub fn edge_vector(&self, h0: usize) -> DVec3 {
        let h1 = self.conn.next(h0);
        self.positions[self.conn.h[h1].vertex] - self.positions[self.conn.h[h0].vertex]
    }

    /// Area of a triangle.
    pub fn t_area(&self, t: usize) -> f64 {
        let h0 = self.conn.t[t];
        let h1 = self.conn.next(h0);
        let e0 = self.edge_vector(h0);
        let e1 = self.edge_vector(h1);
        e0.cross(e1).length() / 2.0
    }

    /// Unit normal of a triangle.
    pub fn t_normal(&self, t: usize) -> DVec3 {
        let h0 = self.conn.t[t];
        let h1 = self.conn.next(h0);
        let e0 = self.edge_vector(h0);
        let e1 = self.edge_vector(h1);
        e0.cross(e1).normalize()
    }

    /// Angle-weighted average of the incident triangle normals.
    pub fn v_smooth_normal(&self, v: usize) -> DVec3 {
        let mut s = DVec3::ZERO;
        let h0 = self.conn.v[v];
        let mut h = h0;
        loop {
            let a = self.h_angle(h);
            s += self.t_normal(self.conn.h[h].triangle) * a;
            h = self.conn.mate(self.conn.previous(h));
            if h == NONE || h == h0 {
                break;
            }
        }
        if h == NONE {
            // the fan hit the border; sweep the other side from the start
            let mut m = self.conn.mate(h0);
            while m != NONE {
                let h = self.conn.next(m);
                let a = self.h_angle(h);
                s += self.t_normal(self.conn.h[h].triangle) * a;
                m = self.conn.mate(h);
            }
        }
        s.normalize_or_zero()
    }

    /// The 3-D point at barycentric coordinates `uvw` of triangle `t`.
    pub fn t_coord(&self, t: usize, uvw: [f64; 3]) -> DVec3 {
        let [v0, v1, v2] = self.conn.t_incidence(t);
        self.positions[v0] * uvw[0] + self.positions[v1] * uvw[1] + self.positions[v2] * uvw[2]
    }

    /// Randomly generates about `n` points on the surface, distributed
    /// proportionally to triangle area and uniformly within each triangle.
    /// Returns `(triangle, barycentric)` pairs.
    pub fn generate_random_points(&self, n: usize) -> Vec<(usize, [f64; 3])> {
        let mut rng = rand::rng();
        let areas: Vec<f64> = (0..self.conn.t.len()).map(|t| self.t_area(t)).collect();
        let total: f64 = areas.iter().sum();
        let mut points = Vec::with_capacity(n);
        for (t, a) in areas.iter().enumerate() {
            let ni = (a / total * n as f64).round() as usize;
            for _ in 0..ni {
                let e1: f64 = rng.random();
                let e2: f64 = rng.random();
                let s1 = e1.sqrt();
                let u = 1.0 - s1;
                let v = e2 * s1;
                points.push((t, [u, v, 1.0 - u - v]));
            }
        }
        points
    }
}
