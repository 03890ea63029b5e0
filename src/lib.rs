// Copyright (C) 2026 the intrinsic-mesh contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Intrinsic triangulations layered over an indexed halfedge mesh.
//!
//! The crate maintains two coupled triangulations of the same surface: an
//! extrinsic triangle mesh embedded in 3-D ([`mesh::Mesh`]) and an intrinsic
//! triangulation of the same surface described purely by edge lengths
//! ([`mesh::IntrinsicMesh`]). The intrinsic triangulation can be improved
//! in place (Delaunay edge flips, Chew-style refinement, vertex relocation)
//! while a per-extrinsic-triangle supporting halfedge keeps the two
//! triangulations in correspondence, so that points, scalar fields and the
//! common subdivision can be mapped back and forth between them.

/// Some useful re-exports
pub mod prelude;

/// Pure 2-D and 3-D geometric predicates and constructions
pub mod geom;

/// The halfedge data structures: extrinsic mesh, intrinsic mesh, primitives
pub mod mesh;

/// Sparse linear-algebra entry points backing the diffusion solvers
pub mod solver;
