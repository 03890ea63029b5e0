// Copyright (C) 2026 the intrinsic-mesh contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Priority queue of triangles for greedy refinement.
//!
//! Entries are ordered by `(min angle, -area)`, so the triangle with the
//! smallest minimum angle comes out first and ties go to the largest
//! triangle. Stale entries are handled by lazy deletion: every insertion
//! bumps a per-triangle timestamp, and [`TriangleHeap::pop`] silently drops
//! entries whose carried timestamp no longer matches.

use crate::prelude::*;
use float_ord::FloatOrd;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    angle: FloatOrd<f64>,
    neg_area: FloatOrd<f64>,
    triangle: usize,
    timestamp: u32,
}

/// Min-heap of triangles whose minimum angle is below a target, keyed by
/// `(angle, -area)` with lazy invalidation through timestamps.
#[derive(Debug)]
pub struct TriangleHeap {
    amin: f64,
    heap: BinaryHeap<Reverse<Entry>>,
    timestamps: Vec<u32>,
}

impl TriangleHeap {
    /// Builds the heap over every triangle of the mesh.
    pub fn new(mesh: &IntrinsicMesh, amin: f64) -> Self {
        let mut heap = Self {
            amin,
            heap: BinaryHeap::new(),
            timestamps: vec![0; mesh.num_triangles()],
        };
        for t in 0..mesh.num_triangles() {
            heap.insert_if(mesh, t);
        }
        heap
    }

    /// Extends the timestamp table to newly created triangles and
    /// re-inserts every triangle of the set.
    pub fn update(&mut self, mesh: &IntrinsicMesh, tset: &HashSet<usize>) {
        self.timestamps.resize(mesh.num_triangles(), 0);
        for &t in tset {
            self.insert_if(mesh, t);
        }
    }

    /// Pops the worst triangle still current: smallest minimum angle, ties
    /// broken by largest area. Returns `(triangle, area, angle)`.
    pub fn pop(&mut self) -> Option<(usize, f64, f64)> {
        while let Some(Reverse(entry)) = self.heap.pop() {
            if self.timestamps[entry.triangle] == entry.timestamp {
                return Some((entry.triangle, -entry.neg_area.0, entry.angle.0));
            }
        }
        None
    }

    /// Inserts a triangle when its minimum angle is below the target.
    /// Narrow triangles are never inserted. The timestamp is bumped either
    /// way, invalidating any queued entry for the triangle.
    pub fn insert_if(&mut self, mesh: &IntrinsicMesh, t: usize) {
        if mesh.t_narrow(t) {
            return;
        }
        let angle = mesh
            .t_angles(t)
            .into_iter()
            .fold(f64::INFINITY, f64::min);
        self.timestamps[t] += 1;
        if angle < self.amin {
            let area = mesh.h_area(mesh.conn().triangle_halfedge(t));
            self.heap.push(Reverse(Entry {
                angle: FloatOrd(angle),
                neg_area: FloatOrd(-area),
                triangle: t,
                timestamp: self.timestamps[t],
            }));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
