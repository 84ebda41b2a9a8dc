// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene port contract for Vantage renderers.
//!
//! This crate defines the geometry values a decoder hands to a renderer and
//! the two ports the renderer side implements. It contains NO serialization
//! logic; the wire schema lives in vantage-proto.
//!
//! # Design Principles
//!
//! - **Renderers are dumb**: they receive finished geometry and insert it.
//! - **Scene state has one owner**: port methods are only ever called on the
//!   UI thread that owns the scene.
//! - **Empty means absent**: an optional attribute that was not supplied (or
//!   was rejected) is an empty sequence.
//!
//! # Crate Features
//!
//! - `std` (default): Enables std library. Disable for no_std contexts.

#![cfg_attr(not(feature = "std"), no_std)]
extern crate alloc;

mod geometry;
mod material;
mod port;

pub use geometry::{Geometry, GeometryKind, IndexTriple, PointCloud, TriangleMesh, Vec3};
pub use material::{Material, DEFAULT_SHADER};
pub use port::{ScenePort, ViewerUiPort};
