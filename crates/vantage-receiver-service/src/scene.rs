// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless scene: keeps the latest geometry per key and logs UI calls.

use std::collections::HashMap;

use tracing::{debug, info};
use vantage_scene_port::{Geometry, Material, ScenePort, ViewerUiPort};

#[derive(Debug, Default)]
pub(crate) struct HeadlessScene {
    objects: HashMap<String, (Geometry, Material)>,
    redraws: u64,
}

impl HeadlessScene {
    #[cfg(test)]
    pub(crate) fn object_count(&self) -> usize {
        self.objects.len()
    }
}

impl ScenePort for HeadlessScene {
    fn add_geometry(&mut self, key: &str, geometry: Geometry, material: Material) {
        let kind = geometry.kind();
        let vertices = geometry.vertex_count();
        let replaced = self
            .objects
            .insert(key.to_owned(), (geometry, material))
            .is_some();
        info!(key, ?kind, vertices, replaced, "scene geometry updated");
    }
}

impl ViewerUiPort for HeadlessScene {
    fn update_pointcloud_ui(&mut self) {
        debug!(objects = self.objects.len(), "point-cloud UI refreshed");
    }

    fn update_pointcloud_camera(&mut self) {
        info!("new point-cloud stream; camera reset");
    }

    fn force_redraw(&mut self) {
        self.redraws += 1;
        debug!(redraws = self.redraws, "redraw");
    }
}
