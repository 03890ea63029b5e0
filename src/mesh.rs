// Copyright (C) 2026 the intrinsic-mesh contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// The index-based halfedge data structure and the extrinsic mesh
pub mod halfedge;
pub use halfedge::*;

/// The intrinsic triangulation layered over an extrinsic mesh
pub mod intrinsic;
pub use intrinsic::IntrinsicMesh;

/// Primitive shapes: grid, sphere, torus
pub mod primitives;

/// Priority queue of triangles driving Chew-style refinement
pub mod theap;
pub use theap::TriangleHeap;
