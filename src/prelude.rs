// Copyright (C) 2026 the intrinsic-mesh contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub use anyhow::{anyhow, bail, Context, Result};

pub use glam::{DVec2, DVec3};

pub use itertools::Itertools;
pub use smallvec::SmallVec;
pub use std::collections::{HashMap, HashSet};

pub use crate::geom;

pub use crate::mesh::halfedge::{Halfedge, Mesh, MeshConnectivity, SVec, VertexDedup, NONE};
pub use crate::mesh::intrinsic::{CommonSubdivision, IntrinsicMesh, L_MIN};
pub use crate::mesh::theap::TriangleHeap;
