// Copyright (C) 2026 the intrinsic-mesh contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Refinement of the intrinsic triangulation: edge and triangle splits,
//! vertex relocation, and the Chew-style loop that inserts circumcenters
//! until every non-narrow triangle clears a target minimum angle.
//!
//! Splits work entirely in a local planar layout of the affected triangles:
//! new edge lengths are measured in that layout, never from 3-D positions
//! (Steiner vertices have none).

use super::{pop_any, IntrinsicMesh, L_MIN};
use crate::prelude::*;
use smallvec::smallvec;
use std::f64::consts::PI;

/// Barycentric tolerance deciding when a located point counts as lying on
/// an edge.
const TOL: f64 = 1e-4;

impl IntrinsicMesh {
    /// Center used when relocating a vertex: the circumcenter of the
    /// triangle, or its barycenter when the triangle touches the border.
    fn t_center(&self, h0: usize, tri: &[DVec2; 3]) -> DVec2 {
        if self.t_on_border(h0) {
            geom::barycenter(tri[0], tri[1], tri[2])
        } else {
            geom::circumcenter(tri[0], tri[1], tri[2])
        }
    }

    /// Planar images of the ring endpoints after the center moves to `v0`.
    /// A ring edge whose far endpoint is `v` itself (the vertex appears
    /// more than once on its own link) must follow the displacement.
    fn move_all_images(
        &self,
        v: usize,
        hlist: &[usize],
        v0: DVec2,
        plist: &[DVec2],
    ) -> SVec<DVec2> {
        hlist
            .iter()
            .zip(plist)
            .map(|(&h, &p)| {
                let w = self.conn.h[self.conn.mate(h)].vertex;
                if w == v {
                    p + v0
                } else {
                    p
                }
            })
            .collect()
    }

    /// Relocates a Steiner vertex to the area-weighted average of the
    /// centers of its incident triangles, computed in a planar layout of
    /// its star. Extrinsic and border vertices are pinned. The move is
    /// rejected when any ring triangle would flip (the new position gets
    /// within tolerance of a ring edge). Returns whether the vertex moved;
    /// on success the modified triangles are added to `tset` when given.
    pub fn vertex_displacement(&mut self, v: usize, mut tset: Option<&mut HashSet<usize>>) -> bool {
        if v < self.he.num_vertices() {
            return false;
        }
        if self.conn.border_h(v) != NONE {
            return false;
        }
        // incident halfedges in counter-clockwise order
        let mut hlist: SVec<usize> = smallvec![self.conn.v[v]];
        loop {
            let h = self.conn.mate(self.conn.previous(*hlist.last().unwrap()));
            if h == hlist[0] {
                break;
            }
            hlist.push(h);
        }
        // star layout with v at the origin
        let n = hlist.len();
        let mut plist: SVec<DVec2> = SVec::with_capacity(n);
        let mut phi: f64 = 0.0;
        for &h in &hlist {
            let l = self.l[self.conn.h[h].edge];
            plist.push(l * DVec2::new(phi.cos(), phi.sin()));
            phi += self.h_angle(h);
        }
        let mut center = DVec2::ZERO;
        let mut atotal = 0.0;
        for i in 0..n {
            let tri = [DVec2::ZERO, plist[i], plist[(i + 1) % n]];
            let c = self.t_center(hlist[i], &tri);
            let a = geom::area(tri[0], tri[1], tri[2]);
            center += c * a;
            atotal += a;
        }
        let v0 = center / atotal;
        let flist = self.move_all_images(v, &hlist, v0, &plist);
        // reject the move if it would flip any ring triangle
        for i in 0..n {
            if geom::edge_point_distance(flist[i], flist[(i + 1) % n], v0) <= 1e-5 {
                return false;
            }
        }
        // detach support links, rewrite the spoke lengths, re-attach
        for &h in &hlist {
            let m = self.conn.mate(h);
            self.update_removal(m);
        }
        for (i, &h) in hlist.iter().enumerate() {
            let e = self.conn.h[h].edge;
            self.l[e] = v0.distance(flist[i]);
        }
        for &h in &hlist {
            let m = self.conn.mate(h);
            self.update_insertion(m);
        }
        if let Some(ts) = tset.as_deref_mut() {
            for &h in &hlist {
                ts.insert(self.conn.h[h].triangle);
            }
        }
        true
    }

    /// Relocates every Steiner vertex, `n` passes.
    pub fn displace_all(&mut self, n: usize) {
        for _ in 0..n {
            for v in self.he.num_vertices()..self.conn.num_vertices() {
                self.vertex_displacement(v, None);
            }
        }
    }

    /// Relocates every Steiner vertex once, then restores the Delaunay
    /// property.
    pub fn displace_delaunay(&mut self) {
        for v in self.he.num_vertices()..self.conn.num_vertices() {
            self.vertex_displacement(v, None);
        }
        self.delaunay();
    }

    /// Inserts a vertex at barycentric position `uvw` inside the triangle
    /// of `h0`, splitting it into three. New spoke lengths come from the
    /// planar layout of the triangle. The surrounding edges and the
    /// affected triangles are queued into `eset` / `tset`. Returns the new
    /// vertex.
    pub fn t_refine(
        &mut self,
        h0: usize,
        uvw: [f64; 3],
        eset: &mut HashSet<usize>,
        tset: &mut HashSet<usize>,
    ) -> usize {
        let t = self.conn.h[h0].triangle;
        let h1 = self.conn.next(h0);
        let h2 = self.conn.next(h1);
        let v0 = self.conn.h[h0].vertex;
        let v1 = self.conn.h[h1].vertex;
        let v2 = self.conn.h[h2].vertex;
        // local geometry of the insertion
        let c = self.t_flatten(h0);
        let p = geom::from_barycentric(c[0], c[1], c[2], uvw);
        // indices of the entities about to be created
        let t0 = self.conn.t.len();
        let t1 = t0 + 1;
        let h00 = self.conn.h.len();
        let (h01, h10, h11, h20, h21) = (h00 + 1, h00 + 2, h00 + 3, h00 + 4, h00 + 5);
        let e0 = self.conn.e.len();
        let (e1, e2) = (e0 + 1, e0 + 2);
        let v = self.conn.v.len();
        // rewire the existing triangle
        self.conn.t[t] = h2;
        self.conn.h[h0].triangle = t0;
        self.conn.h[h0].next = h11;
        self.conn.h[h1].triangle = t1;
        self.conn.h[h1].next = h21;
        self.conn.h[h2].triangle = t;
        self.conn.h[h2].next = h01;
        // new entities
        self.conn.t.push(h0); // t0
        self.conn.t.push(h1); // t1
        self.conn.h.push(Halfedge { vertex: v, edge: e0, triangle: t0, next: h0 }); // h00
        self.conn.h.push(Halfedge { vertex: v0, edge: e0, triangle: t, next: h20 }); // h01
        self.conn.h.push(Halfedge { vertex: v, edge: e1, triangle: t1, next: h1 }); // h10
        self.conn.h.push(Halfedge { vertex: v1, edge: e1, triangle: t0, next: h00 }); // h11
        self.conn.h.push(Halfedge { vertex: v, edge: e2, triangle: t, next: h2 }); // h20
        self.conn.h.push(Halfedge { vertex: v2, edge: e2, triangle: t1, next: h10 }); // h21
        self.conn.e.push([h00, h01]); // e0
        self.conn.e.push([h10, h11]); // e1
        self.conn.e.push([h20, h21]); // e2
        self.l.push(c[0].distance(p)); // e0
        self.l.push(c[1].distance(p)); // e1
        self.l.push(c[2].distance(p)); // e2
        self.conn.v.push(h00);
        self.update_insertion(h01);
        self.update_insertion(h11);
        self.update_insertion(h21);
        tset.insert(t);
        tset.insert(t0);
        tset.insert(t1);
        eset.insert(self.conn.h[h0].edge);
        eset.insert(self.conn.h[h1].edge);
        eset.insert(self.conn.h[h2].edge);
        v
    }

    /// Splits the edge of `h0` at parameter `s` along it, inserting one
    /// vertex, two triangles and three edges (one and two on border).
    /// Refuses edges shorter than [`L_MIN`]. The new lengths are measured
    /// in the planar layout of the one or two incident triangles. Returns
    /// the new vertex, or `None` when the split is refused.
    pub fn e_refine(
        &mut self,
        h0: usize,
        s: f64,
        eset: &mut HashSet<usize>,
        tset: &mut HashSet<usize>,
    ) -> Option<usize> {
        let e = self.conn.h[h0].edge;
        if self.l[e] < L_MIN {
            return None;
        }
        let n0 = self.conn.next(h0);
        let p0 = self.conn.previous(h0);
        let t0 = self.conn.h[h0].triangle;
        let v2 = self.conn.h[p0].vertex;
        let h1 = self.conn.mate(h0);

        // planar layout: triangle of h0, completed to the quadrilateral
        // when the edge is interior
        let c = self.t_flatten(h0);
        let c3 = (h1 != NONE).then(|| self.compute_v2(c[1], h1, -PI));
        let p = c[0].lerp(c[1], s);

        // indices of the entities about to be created
        let t0l = self.conn.t.len();
        let h00 = self.conn.h.len();
        let h01 = h00 + 1;
        let m1 = h00 + 2;
        let el = self.conn.e.len();
        let e0 = el + 1;
        let v = self.conn.v.len();

        // rewire the first side
        self.conn.t[t0] = h0;
        self.conn.h[h0].next = h00;
        self.conn.h[n0].triangle = t0l;
        self.conn.h[n0].next = h01;

        if h1 != NONE {
            let n1 = self.conn.next(h1);
            let p1 = self.conn.previous(h1);
            let t1 = self.conn.h[h1].triangle;
            let v3 = self.conn.h[p1].vertex;
            let t1l = t0l + 1;
            let h10 = h00 + 3;
            let h11 = h00 + 4;
            let m0 = h00 + 5;
            let e1 = el + 2;
            // rewire the second side
            self.conn.t[t1] = h1;
            self.conn.h[h1].edge = el;
            self.conn.h[h1].next = h10;
            self.conn.h[n1].triangle = t1l;
            self.conn.h[n1].next = h11;
            self.conn.e[e] = [h0, m0];
            self.l[e] = c[0].distance(p);
            // first side entities
            self.conn.t.push(n0); // t0l
            self.conn.h.push(Halfedge { vertex: v, edge: e0, triangle: t0, next: p0 }); // h00
            self.conn.h.push(Halfedge { vertex: v2, edge: e0, triangle: t0l, next: m1 }); // h01
            self.conn.h.push(Halfedge { vertex: v, edge: el, triangle: t0l, next: n0 }); // m1
            self.conn.e.push([m1, h1]); // el
            self.conn.e.push([h00, h01]); // e0
            self.l.push(c[1].distance(p)); // el
            self.l.push(c[2].distance(p)); // e0
            self.conn.v.push(h00);
            // second side entities
            self.conn.t.push(n1); // t1l
            self.conn.h.push(Halfedge { vertex: v, edge: e1, triangle: t1, next: p1 }); // h10
            self.conn.h.push(Halfedge { vertex: v3, edge: e1, triangle: t1l, next: m0 }); // h11
            self.conn.h.push(Halfedge { vertex: v, edge: e, triangle: t1l, next: n1 }); // m0
            self.conn.e.push([h10, h11]); // e1
            self.l.push(c3.unwrap().distance(p)); // e1
            self.update_insertion(h01);
            self.update_insertion(h11);
            tset.insert(t0);
            tset.insert(t0l);
            tset.insert(t1);
            tset.insert(t1l);
            eset.insert(self.conn.h[n0].edge);
            eset.insert(self.conn.h[n1].edge);
            eset.insert(self.conn.h[p0].edge);
            eset.insert(self.conn.h[p1].edge);
        } else {
            self.conn.e[e] = [h0, NONE];
            self.l[e] = c[0].distance(p);
            self.conn.t.push(n0); // t0l
            self.conn.h.push(Halfedge { vertex: v, edge: e0, triangle: t0, next: p0 }); // h00
            self.conn.h.push(Halfedge { vertex: v2, edge: e0, triangle: t0l, next: m1 }); // h01
            self.conn.h.push(Halfedge { vertex: v, edge: el, triangle: t0l, next: n0 }); // m1
            self.conn.e.push([m1, NONE]); // el
            self.conn.e.push([h00, h01]); // e0
            self.l.push(c[1].distance(p)); // el
            self.l.push(c[2].distance(p)); // e0
            self.conn.v.push(h00);
            self.update_insertion(h01);
            tset.insert(t0);
            tset.insert(t0l);
            eset.insert(self.conn.h[n0].edge);
            eset.insert(self.conn.h[p0].edge);
        }
        Some(v)
    }

    /// Splits the triangle at its circumcenter when its minimum angle is
    /// below `amin`, keeping the insertion on an edge when the located
    /// circumcenter falls onto one.
    fn t_refine_if(
        &mut self,
        t: usize,
        amin: f64,
        eset: &mut HashSet<usize>,
        tset: &mut HashSet<usize>,
    ) {
        let angles = self.t_angles(t);
        if angles.into_iter().fold(f64::INFINITY, f64::min) >= amin {
            return;
        }
        let h0 = self.conn.t[t];
        let tri = self.t_flatten(h0);
        let c = geom::circumcenter(tri[0], tri[1], tri[2]);
        let (h0, uvw) = self.point_location(c, h0, 0.0);
        if uvw.into_iter().fold(f64::INFINITY, f64::min) < TOL {
            if uvw.into_iter().fold(f64::NEG_INFINITY, f64::max) > 1.0 - TOL {
                // the circumcenter landed on a vertex; nothing to insert
                return;
            }
            let mut h = h0;
            for i in 0..3 {
                if uvw[i] < TOL {
                    // split the edge opposite the vanishing coordinate; the
                    // parameter stays strictly inside the edge even when
                    // the circumcenter fell outside a bordered mesh
                    let n = self.conn.next(h);
                    let s = uvw[(i + 1) % 3].clamp(TOL, 1.0 - TOL);
                    self.e_refine(n, s, eset, tset);
                    break;
                }
                h = self.conn.next(h);
            }
        } else {
            self.t_refine(h0, uvw, eset, tset);
        }
    }

    /// Refines the triangulation until no triangle has an interior angle
    /// below `amin`, restoring the Delaunay property after each split.
    pub fn refine_mesh(&mut self, amin: f64) {
        let mut tset: HashSet<usize> = (0..self.conn.num_triangles()).collect();
        let mut eset = HashSet::new();
        while let Some(t) = pop_any(&mut tset) {
            self.t_refine_if(t, amin, &mut eset, &mut tset);
            self.delaunay_flip(&mut eset, Some(&mut tset));
        }
    }

    /// Chew's refinement: repeatedly pops the worst triangle (smallest
    /// minimum angle, ties to the largest area) from the heap, inserts its
    /// circumcenter, restores Delaunay, and re-queues the affected
    /// triangles. Stops when no triangle below the target remains or a
    /// split produces no vertex.
    pub fn chew93(&mut self, min_angle: f64) {
        let mut heap = TriangleHeap::new(self, min_angle);
        let mut steps = 0usize;
        while let Some((t, _area, _angle)) = heap.pop() {
            steps += 1;
            if steps % 1000 == 0 {
                log::debug!(
                    "chew93: {steps} insertions, min angle {:.2} deg",
                    self.get_angle_min().to_degrees()
                );
            }
            let (v, tset) = self.t_add_vertex(t);
            if v.is_none() {
                break;
            }
            heap.update(self, &tset);
        }
    }

    /// Inserts a vertex at the circumcenter of triangle `t`, located by
    /// walking the intrinsic mesh from the triangle's widest corner. When
    /// the circumcenter falls onto an edge the edge is split instead, with
    /// the split parameter kept away from the endpoints. Returns the new
    /// vertex (or `None` on a degenerate split) and the set of affected
    /// triangles, already re-triangulated to Delaunay.
    fn t_add_vertex(&mut self, t: usize) -> (Option<usize>, HashSet<usize>) {
        const VERTEX_TOL: f64 = 1e-5;
        let hlist = self.conn.t_halfedges(t);
        let angles = self.t_angles(t);
        let widest = angles
            .iter()
            .position_max_by(|a, b| a.partial_cmp(b).unwrap())
            .unwrap();
        let tri = self.t_flatten(hlist[widest]);
        let c = geom::circumcenter(tri[0], tri[1], tri[2]);
        let (h0, uvw) = self.point_location(c, hlist[widest], 0.0);
        let mut eset = HashSet::new();
        let mut tset = HashSet::new();
        let min_uvw = uvw.into_iter().fold(f64::INFINITY, f64::min);
        let v = if min_uvw < VERTEX_TOL {
            if uvw.into_iter().fold(f64::NEG_INFINITY, f64::max) > 1.0 - VERTEX_TOL {
                // the circumcenter collapsed onto an existing vertex
                None
            } else {
                let mut h = h0;
                let mut inserted = None;
                for i in 0..3 {
                    if uvw[i] < VERTEX_TOL {
                        let n = self.conn.next(h);
                        let s = uvw[(i + 1) % 3].clamp(0.2, 0.8);
                        inserted = self.e_refine(n, s, &mut eset, &mut tset);
                        break;
                    }
                    h = self.conn.next(h);
                }
                inserted
            }
        } else {
            Some(self.t_refine(h0, uvw, &mut eset, &mut tset))
        };
        if v.is_some() {
            self.delaunay_flip(&mut eset, Some(&mut tset));
        }
        (v, tset)
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

    fn euler(im: &IntrinsicMesh) -> i64 {
        im.num_vertices() as i64 - im.num_edges() as i64 + im.num_triangles() as i64
    }

    #[test]
    fn triangle_split_counts_and_consistency() {
        let mut im = intrinsic_grid(2);
        let (nv, ne, nt) = (im.num_vertices(), im.num_edges(), im.num_triangles());
        let chi = euler(&im);
        let h0 = im.conn().triangle_halfedge(0);
        let mut eset = HashSet::new();
        let mut tset = HashSet::new();
        let v = im.t_refine(h0, [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0], &mut eset, &mut tset);
        assert_eq!(v, nv);
        assert!(im.is_steiner(v));
        assert_eq!(im.num_vertices(), nv + 1);
        assert_eq!(im.num_edges(), ne + 3);
        assert_eq!(im.num_triangles(), nt + 2);
        assert_eq!(euler(&im), chi);
        assert_eq!(tset.len(), 3);
        im.check_consistency().unwrap();
    }

    #[test]
    fn interior_edge_split_counts_and_consistency() {
        let mut im = intrinsic_grid(2);
        let e = (0..im.num_edges())
            .find(|&e| !im.conn().e_is_border(e))
            .unwrap();
        let (nv, ne, nt) = (im.num_vertices(), im.num_edges(), im.num_triangles());
        let chi = euler(&im);
        let h0 = im.conn().edge_halfedges(e)[0];
        let mut eset = HashSet::new();
        let mut tset = HashSet::new();
        let v = im.e_refine(h0, 0.5, &mut eset, &mut tset).unwrap();
        assert_eq!(v, nv);
        assert_eq!(im.num_vertices(), nv + 1);
        assert_eq!(im.num_edges(), ne + 3);
        assert_eq!(im.num_triangles(), nt + 2);
        assert_eq!(euler(&im), chi);
        assert_eq!(tset.len(), 4);
        im.check_consistency().unwrap();
    }

    #[test]
    fn border_edge_split_counts_and_consistency() {
        let mut im = intrinsic_grid(2);
        let e = (0..im.num_edges())
            .find(|&e| im.conn().e_is_border(e))
            .unwrap();
        let (nv, ne, nt) = (im.num_vertices(), im.num_edges(), im.num_triangles());
        let chi = euler(&im);
        let h0 = im.conn().edge_halfedges(e)[0];
        let mut eset = HashSet::new();
        let mut tset = HashSet::new();
        im.e_refine(h0, 0.4, &mut eset, &mut tset).unwrap();
        assert_eq!(im.num_vertices(), nv + 1);
        assert_eq!(im.num_edges(), ne + 2);
        assert_eq!(im.num_triangles(), nt + 1);
        assert_eq!(euler(&im), chi);
        im.check_consistency().unwrap();
    }

    #[test]
    fn edge_split_preserves_split_lengths() {
        let mut im = intrinsic_grid(2);
        let e = (0..im.num_edges())
            .find(|&e| !im.conn().e_is_border(e))
            .unwrap();
        let l = im.length(e);
        let h0 = im.conn().edge_halfedges(e)[0];
        let mut eset = HashSet::new();
        let mut tset = HashSet::new();
        im.e_refine(h0, 0.25, &mut eset, &mut tset).unwrap();
        // the two halves partition the original length
        let l_first = im.length(e);
        assert_relative_eq!(l_first, 0.25 * l, epsilon = 1e-12);
    }

    #[test]
    fn short_edges_refuse_to_split() {
        let mut im = intrinsic_grid(2);
        let e = (0..im.num_edges())
            .find(|&e| !im.conn().e_is_border(e))
            .unwrap();
        im.l[e] = L_MIN / 2.0;
        let h0 = im.conn().edge_halfedges(e)[0];
        let mut eset = HashSet::new();
        let mut tset = HashSet::new();
        assert!(im.e_refine(h0, 0.5, &mut eset, &mut tset).is_none());
        assert!(eset.is_empty() && tset.is_empty());
    }

    #[test]
    fn displacement_only_moves_interior_steiner_vertices() {
        let mut im = intrinsic_grid(2);
        // extrinsic vertices are pinned
        assert!(!im.vertex_displacement(4, None));
        // insert a Steiner vertex off-center, then relocate it
        let h0 = im.conn().triangle_halfedge(0);
        let mut eset = HashSet::new();
        let mut tset = HashSet::new();
        let v = im.t_refine(h0, [0.6, 0.2, 0.2], &mut eset, &mut tset);
        im.delaunay_flip(&mut eset, Some(&mut tset));
        let mut moved = HashSet::new();
        let ok = im.vertex_displacement(v, Some(&mut moved));
        assert!(ok);
        assert!(!moved.is_empty());
        im.check_consistency().unwrap();
    }

    fn stretched_grid(n: usize) -> IntrinsicMesh {
        let (v, f) = create_grid(n, n, 1.0, 0.4);
        IntrinsicMesh::new(Mesh::new(&v, &f).unwrap(), None).unwrap()
    }

    #[test]
    fn displace_all_keeps_consistency() {
        let mut im = stretched_grid(3);
        im.chew93(25f64.to_radians());
        im.displace_all(2);
        im.check_consistency().unwrap();
        im.displace_delaunay();
        im.check_consistency().unwrap();
        assert_eq!(im.delaunay(), 0);
    }

    #[test]
    fn chew_reaches_the_target_angle_on_a_grid() {
        let (v, f) = create_grid(4, 4, 1.0, 1.0);
        let mut im = IntrinsicMesh::new(Mesh::new(&v, &f).unwrap(), None).unwrap();
        let before = im.get_angle_min();
        im.chew93(30f64.to_radians());
        im.check_consistency().unwrap();
        assert!(im.get_angle_min() >= 30f64.to_radians());
        assert!(im.get_angle_min() >= before);
        // no triangle below target is left in a fresh heap
        let mut heap = TriangleHeap::new(&im, 30f64.to_radians());
        assert!(heap.pop().is_none());
    }

    #[test]
    fn chew_refines_a_stretched_grid() {
        let mut im = stretched_grid(4);
        let nv = im.num_vertices();
        // skinny cells: the minimum angle starts well below the target
        assert!(im.get_angle_min() < 25f64.to_radians());
        im.chew93(25f64.to_radians());
        im.check_consistency().unwrap();
        assert!(im.get_angle_min() >= 25f64.to_radians());
        // refinement actually inserted Steiner vertices
        assert!(im.num_vertices() > nv);
        assert_eq!(im.delaunay(), 0);
    }

    #[test]
    fn chew_monotonically_raises_the_min_angle() {
        let (v, f) = create_torus(1.0, 0.3, 6, 6);
        let mut im = IntrinsicMesh::new(Mesh::new(&v, &f).unwrap(), None).unwrap();
        let before = im.get_angle_min();
        im.chew93(28f64.to_radians());
        im.check_consistency().unwrap();
        assert!(im.get_angle_min() >= before - 1e-12);
        assert!(im.get_angle_min() >= 28f64.to_radians());
    }

    #[test]
    fn refine_mesh_clears_small_angles() {
        let mut im = stretched_grid(3);
        im.refine_mesh(25f64.to_radians());
        im.check_consistency().unwrap();
        assert!(im.get_angle_min() >= 25f64.to_radians() - 1e-9);
    }

    #[test]
    fn refinement_keeps_euler_characteristic() {
        let mut im = intrinsic_grid(3);
        let chi = euler(&im);
        im.chew93(28f64.to_radians());
        assert_eq!(euler(&im), chi);
    }
}
