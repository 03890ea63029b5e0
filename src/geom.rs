// Copyright (C) 2026 the intrinsic-mesh contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pure geometric predicates and constructions on 2-D points.
//!
//! Everything here operates on plain [`DVec2`] values and carries no mesh
//! state. Orientation follows the usual convention: positive [`orient`]
//! means counter-clockwise.

use glam::DVec2;
use std::f64::consts::TAU;

/// Relative orientation of the triple `(a, b, c)`: positive when
/// counter-clockwise, negative when clockwise, zero when collinear.
pub fn orient(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (a.x - c.x) * (b.y - c.y) - (a.y - c.y) * (b.x - c.x)
}

/// Whether the triple `(a, b, c)` is counter-clockwise (collinear counts).
pub fn ccw(a: DVec2, b: DVec2, c: DVec2) -> bool {
    orient(a, b, c) >= 0.0
}

/// Signed area of the triangle `(a, b, c)`.
pub fn area(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    orient(a, b, c) / 2.0
}

/// Signed distance from the line through `a` and `b` to the point `c`.
pub fn edge_point_distance(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    orient(a, b, c) / 2.0 / a.distance(b)
}

/// Whether `p` lies inside the counter-clockwise triangle `v` (edges count).
pub fn in_triangle(v: &[DVec2; 3], p: DVec2) -> bool {
    orient(v[0], v[1], p) >= 0.0 && orient(v[1], v[2], p) >= 0.0 && orient(v[2], v[0], p) >= 0.0
}

/// Whether the open segment `v0-v1` crosses the segment `o-p`.
pub fn crossing(v0: DVec2, v1: DVec2, p: DVec2, o: DVec2) -> bool {
    let t0 = ccw(o, p, v0);
    let t1 = ccw(o, p, v1);
    let u0 = ccw(v0, v1, o);
    let u1 = ccw(v0, v1, p);
    (t0 != t1) && (u0 != u1)
}

/// Sutherland-Hodgman clipping of the convex polygon `p` against the three
/// half-planes of the counter-clockwise triangle `v`, in edge order. The
/// side function is the signed area rather than the euclidean distance.
/// Returns an empty polygon when fewer than three vertices survive.
pub fn clip(v: &[DVec2; 3], p: &[DVec2]) -> Vec<DVec2> {
    let mut inp: Vec<DVec2> = p.to_vec();
    let mut out: Vec<DVec2> = Vec::new();
    for i in 0..3 {
        let a: Vec<f64> = inp
            .iter()
            .map(|&q| area(v[i], v[(i + 1) % 3], q))
            .collect();
        out = Vec::with_capacity(inp.len() + 1);
        for j in 0..inp.len() {
            let k = (j + 1) % inp.len();
            if a[j] >= 0.0 {
                out.push(inp[j]);
            }
            if a[j] * a[k] < 0.0 {
                let s = a[j].abs() + a[k].abs();
                if s > 0.0 {
                    let t = a[j].abs() / s;
                    out.push(inp[j].lerp(inp[k], t));
                }
            }
        }
        inp = out.clone();
    }
    if out.len() < 3 {
        return Vec::new();
    }
    out
}

/// Circumcenter of the triangle `(a, b, c)`. The triangle must not be
/// degenerate.
pub fn circumcenter(a: DVec2, b: DVec2, c: DVec2) -> DVec2 {
    let b = b - a;
    let c = c - a;
    let d = 2.0 * (b.x * c.y - b.y * c.x);
    assert!(d != 0.0, "circumcenter of a degenerate triangle");
    let b2 = b.length_squared();
    let c2 = c.length_squared();
    DVec2::new((c.y * b2 - b.y * c2) / d, (b.x * c2 - c.x * b2) / d) + a
}

/// Barycenter of the triangle `(a, b, c)`.
pub fn barycenter(a: DVec2, b: DVec2, c: DVec2) -> DVec2 {
    (a + b + c) / 3.0
}

/// Barycentric coordinates of `p` with respect to the triangle `(a, b, c)`.
pub fn barycentric(a: DVec2, b: DVec2, c: DVec2, p: DVec2) -> [f64; 3] {
    let t = area(a, b, c);
    let u = area(b, c, p) / t;
    let v = area(c, a, p) / t;
    [u, v, 1.0 - u - v]
}

/// The point at barycentric coordinates `uvw` in the triangle `(a, b, c)`.
pub fn from_barycentric(a: DVec2, b: DVec2, c: DVec2, uvw: [f64; 3]) -> DVec2 {
    a * uvw[0] + b * uvw[1] + c * uvw[2]
}

/// Wraps an angle into `[0, 2π)`.
pub fn clamp_angle(a: f64) -> f64 {
    a.rem_euclid(TAU)
}
