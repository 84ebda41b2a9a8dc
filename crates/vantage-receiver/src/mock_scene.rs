// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mock scene for headless testing of the scene and UI ports.
//!
//! MockScene keeps inserted geometry in a HashMap and records every port
//! call in order, so tests can assert on both final state and call sequence.

use std::collections::HashMap;

use vantage_scene_port::{Geometry, GeometryKind, Material, ScenePort, ViewerUiPort};

/// One recorded port call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneEvent {
    /// `update_pointcloud_ui` was called.
    PointcloudUiUpdated,
    /// `add_geometry` was called.
    GeometryAdded {
        /// Scene key.
        key: String,
        /// Kind of the inserted geometry.
        kind: GeometryKind,
    },
    /// `update_pointcloud_camera` was called.
    PointcloudCameraUpdated,
    /// `force_redraw` was called.
    Redrawn,
}

/// Mock scene adapter for testing.
#[derive(Debug, Default)]
pub struct MockScene {
    /// Current geometry in the scene, by key.
    pub geometries: HashMap<String, (Geometry, Material)>,
    /// Every port call, oldest first.
    pub events: Vec<SceneEvent>,
}

impl MockScene {
    /// Create an empty mock scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get geometry by key.
    pub fn geometry(&self, key: &str) -> Option<&Geometry> {
        self.geometries.get(key).map(|(geometry, _)| geometry)
    }

    /// Get material by key.
    pub fn material(&self, key: &str) -> Option<&Material> {
        self.geometries.get(key).map(|(_, material)| material)
    }

    /// Number of distinct keys in the scene.
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Keys in `add_geometry` call order (repeats included).
    pub fn added_keys(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SceneEvent::GeometryAdded { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of `force_redraw` calls.
    pub fn redraw_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| **event == SceneEvent::Redrawn)
            .count()
    }
}

impl ScenePort for MockScene {
    fn add_geometry(&mut self, key: &str, geometry: Geometry, material: Material) {
        self.events.push(SceneEvent::GeometryAdded {
            key: key.to_owned(),
            kind: geometry.kind(),
        });
        self.geometries.insert(key.to_owned(), (geometry, material));
    }
}

impl ViewerUiPort for MockScene {
    fn update_pointcloud_ui(&mut self) {
        self.events.push(SceneEvent::PointcloudUiUpdated);
    }

    fn update_pointcloud_camera(&mut self) {
        self.events.push(SceneEvent::PointcloudCameraUpdated);
    }

    fn force_redraw(&mut self) {
        self.events.push(SceneEvent::Redrawn);
    }
}
