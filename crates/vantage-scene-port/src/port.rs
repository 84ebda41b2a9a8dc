// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port traits implemented by the rendering side.

use crate::{Geometry, Material};

/// Scene graph port.
///
/// Implementors own the scene; every call happens on the UI thread that owns
/// the implementor.
pub trait ScenePort {
    /// Insert `geometry` under `key`, replacing any geometry already stored
    /// under that key.
    fn add_geometry(&mut self, key: &str, geometry: Geometry, material: Material);
}

/// Viewer UI port.
///
/// All methods are fire-and-forget and UI-thread-only.
pub trait ViewerUiPort {
    /// Reset point-cloud specific UI state (first frame of a new stream).
    fn update_pointcloud_ui(&mut self);

    /// Re-frame the camera around the current point cloud.
    fn update_pointcloud_camera(&mut self);

    /// Request a redraw of the main surface.
    fn force_redraw(&mut self);
}
