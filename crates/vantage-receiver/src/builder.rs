// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Geometry assembly from a decoded message.
//!
//! A message with a non-empty `faces` array becomes a [`TriangleMesh`];
//! anything else becomes a [`PointCloud`]. Malformed optional fields are left
//! empty (see [`crate::extract`]).

use tracing::debug;
use vantage_proto::{GeometryMessage, COLORS, NORMALS};
use vantage_scene_port::{Geometry, PointCloud, TriangleMesh};

use crate::extract::{extract_attribute, extract_positions, extract_triangles};

/// Build scene geometry from `msg`.
///
/// Callers are expected to have run [`GeometryMessage::check_message`]
/// first; this function never fails and only degrades.
pub fn build_geometry(msg: &GeometryMessage) -> Geometry {
    if msg.faces.check_non_empty() {
        build_triangle_mesh(msg).into()
    } else {
        build_point_cloud(msg).into()
    }
}

/// Mesh path: every field is attempted independently.
pub fn build_triangle_mesh(msg: &GeometryMessage) -> TriangleMesh {
    let mesh = TriangleMesh {
        vertices: extract_positions(msg).unwrap_or_default(),
        vertex_normals: extract_attribute(msg, NORMALS),
        vertex_colors: extract_attribute(msg, COLORS),
        triangles: extract_triangles(msg),
    };
    debug!(
        vertices = mesh.vertices.len(),
        triangles = mesh.triangles.len(),
        normals = mesh.has_vertex_normals(),
        colors = mesh.has_vertex_colors(),
        "built triangle mesh"
    );
    mesh
}

/// Cloud path: attributes are only read once the points were.
pub fn build_point_cloud(msg: &GeometryMessage) -> PointCloud {
    let mut cloud = PointCloud::default();
    if let Some(points) = extract_positions(msg) {
        cloud.points = points;
        cloud.normals = extract_attribute(msg, NORMALS);
        cloud.colors = extract_attribute(msg, COLORS);
    }
    debug!(
        points = cloud.len(),
        normals = cloud.has_normals(),
        colors = cloud.has_colors(),
        "built point cloud"
    );
    cloud
}
