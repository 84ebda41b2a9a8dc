// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Geometry values produced by the decoder.
//!
//! Everything is stored in f64 regardless of the wire precision, so one
//! geometry never mixes float widths.

use alloc::vec::Vec;

/// Three-component record (x, y, z) used for points, normals and colors.
pub type Vec3 = [f64; 3];

/// Vertex indices of one triangle.
pub type IndexTriple = [i64; 3];

/// Discriminant of [`Geometry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// Unconnected points.
    PointCloud,
    /// Vertices connected by triangles.
    TriangleMesh,
}

/// Point cloud with optional per-point attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
    /// Point positions.
    pub points: Vec<Vec3>,
    /// Per-point normals (empty when absent).
    pub normals: Vec<Vec3>,
    /// Per-point colors (empty when absent).
    pub colors: Vec<Vec3>,
}

impl PointCloud {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the cloud has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when normals were supplied.
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// True when colors were supplied.
    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }
}

/// Triangle mesh with optional per-vertex attributes.
///
/// A mesh may legitimately carry vertices but no triangles when the face
/// data was rejected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Vec3>,
    /// Per-vertex normals (empty when absent).
    pub vertex_normals: Vec<Vec3>,
    /// Per-vertex colors (empty when absent).
    pub vertex_colors: Vec<Vec3>,
    /// Triangles as vertex index triples.
    pub triangles: Vec<IndexTriple>,
}

impl TriangleMesh {
    /// True when vertex normals were supplied.
    pub fn has_vertex_normals(&self) -> bool {
        !self.vertex_normals.is_empty()
    }

    /// True when vertex colors were supplied.
    pub fn has_vertex_colors(&self) -> bool {
        !self.vertex_colors.is_empty()
    }

    /// True when at least one triangle survived decoding.
    pub fn has_triangles(&self) -> bool {
        !self.triangles.is_empty()
    }
}

/// Geometry handed to the scene.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// Point cloud.
    PointCloud(PointCloud),
    /// Triangle mesh.
    TriangleMesh(TriangleMesh),
}

impl Geometry {
    /// Which variant this is.
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::PointCloud(_) => GeometryKind::PointCloud,
            Geometry::TriangleMesh(_) => GeometryKind::TriangleMesh,
        }
    }

    /// Shorthand for `kind() == GeometryKind::PointCloud`.
    pub fn is_point_cloud(&self) -> bool {
        self.kind() == GeometryKind::PointCloud
    }

    /// Number of points (cloud) or vertices (mesh).
    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::PointCloud(pcd) => pcd.points.len(),
            Geometry::TriangleMesh(mesh) => mesh.vertices.len(),
        }
    }

    /// Borrow the point cloud, if this is one.
    pub fn as_point_cloud(&self) -> Option<&PointCloud> {
        match self {
            Geometry::PointCloud(pcd) => Some(pcd),
            Geometry::TriangleMesh(_) => None,
        }
    }

    /// Borrow the triangle mesh, if this is one.
    pub fn as_triangle_mesh(&self) -> Option<&TriangleMesh> {
        match self {
            Geometry::TriangleMesh(mesh) => Some(mesh),
            Geometry::PointCloud(_) => None,
        }
    }
}

impl From<PointCloud> for Geometry {
    fn from(pcd: PointCloud) -> Self {
        Geometry::PointCloud(pcd)
    }
}

impl From<TriangleMesh> for Geometry {
    fn from(mesh: TriangleMesh) -> Self {
        Geometry::TriangleMesh(mesh)
    }
}
