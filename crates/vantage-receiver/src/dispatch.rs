// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Hand-off of finished geometry to the thread that owns the scene.
//!
//! Decoder threads hold a [`SceneDispatcher`] and post [`SceneInsertion`]s
//! without ever touching the scene. The UI thread owns the matching
//! [`SceneWorker`], which applies insertions in arrival order.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};
use vantage_scene_port::{Geometry, Material, ScenePort, ViewerUiPort};

/// Scene object key for a geometry at `path`/`layer`/`time`.
///
/// Plain concatenation: distinct `(path, layer)` splits of the same string
/// map to the same key.
pub fn scene_key(path: &str, layer: &str, time: i32) -> String {
    format!("geom_{path}{layer}{time}")
}

/// One pending scene update, owned by value until applied.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneInsertion {
    /// Scene object key.
    pub key: String,
    /// Geometry to insert.
    pub geometry: Geometry,
    /// Material to render it with.
    pub material: Material,
    /// Frame time from the message.
    pub time: i32,
}

impl SceneInsertion {
    /// Insertion with the default material.
    pub fn new(geometry: Geometry, path: &str, time: i32, layer: &str) -> Self {
        Self {
            key: scene_key(path, layer, time),
            geometry,
            material: Material::default(),
            time,
        }
    }
}

/// Producer half of the scene channel.
#[derive(Clone, Debug)]
pub struct SceneDispatcher {
    tx: Sender<SceneInsertion>,
}

impl SceneDispatcher {
    /// Queue `geometry` for insertion on the scene thread.
    pub fn set_geometry(&self, geometry: Geometry, path: &str, time: i32, layer: &str) {
        self.post(SceneInsertion::new(geometry, path, time, layer));
    }

    /// Queue a prepared insertion. Fire-and-forget.
    pub fn post(&self, insertion: SceneInsertion) {
        if let Err(mpsc::SendError(lost)) = self.tx.send(insertion) {
            warn!(key = %lost.key, "scene thread is gone; dropping geometry");
        }
    }
}

/// Apply one insertion to `port`.
///
/// Point clouds at `time < 1` start a new stream: the point-cloud UI is
/// refreshed before the insert and the camera is reset after it. Every
/// point-cloud insert ends with a redraw.
pub fn apply_insertion<P>(port: &mut P, insertion: SceneInsertion)
where
    P: ScenePort + ViewerUiPort + ?Sized,
{
    let SceneInsertion {
        key,
        geometry,
        material,
        time,
    } = insertion;
    let is_point_cloud = geometry.is_point_cloud();
    let stream_start = time < 1;

    if is_point_cloud && stream_start {
        port.update_pointcloud_ui();
    }
    port.add_geometry(&key, geometry, material);
    if is_point_cloud {
        if stream_start {
            port.update_pointcloud_camera();
        }
        port.force_redraw();
    }
}

/// Consumer half of the scene channel; lives on the UI thread.
#[derive(Debug)]
pub struct SceneWorker<P> {
    port: P,
    rx: Receiver<SceneInsertion>,
}

impl<P: ScenePort + ViewerUiPort> SceneWorker<P> {
    /// Apply one insertion.
    pub fn apply(&mut self, insertion: SceneInsertion) {
        apply_insertion(&mut self.port, insertion);
    }

    /// Apply up to `max` queued insertions without blocking. Returns the
    /// number applied.
    pub fn drain_pending(&mut self, max: usize) -> usize {
        let mut applied = 0;
        while applied < max {
            let Ok(insertion) = self.rx.try_recv() else {
                break;
            };
            self.apply(insertion);
            applied += 1;
        }
        applied
    }

    /// Block and apply insertions until every dispatcher is dropped, then
    /// hand the port back.
    pub fn run(mut self) -> P {
        while let Ok(insertion) = self.rx.recv() {
            self.apply(insertion);
        }
        debug!("all scene dispatchers dropped");
        self.port
    }
}

impl<P> SceneWorker<P> {
    /// Borrow the scene port.
    pub fn port(&self) -> &P {
        &self.port
    }
}

/// Create a dispatcher/worker pair around `port`.
pub fn scene_channel<P>(port: P) -> (SceneDispatcher, SceneWorker<P>) {
    let (tx, rx) = mpsc::channel();
    (SceneDispatcher { tx }, SceneWorker { port, rx })
}

/// Move `port` onto a dedicated scene thread running [`SceneWorker::run`].
///
/// Joining the handle returns the port once all dispatchers are dropped.
pub fn spawn_scene_thread<P>(port: P) -> io::Result<(SceneDispatcher, JoinHandle<P>)>
where
    P: ScenePort + ViewerUiPort + Send + 'static,
{
    let (dispatcher, worker) = scene_channel(port);
    let handle = thread::Builder::new()
        .name("vantage-scene".into())
        .spawn(move || worker.run())?;
    Ok((dispatcher, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockScene, SceneEvent};
    use vantage_scene_port::{GeometryKind, PointCloud, TriangleMesh};

    fn cloud() -> Geometry {
        PointCloud {
            points: vec![[0.0; 3]],
            ..PointCloud::default()
        }
        .into()
    }

    #[test]
    fn key_concatenates_path_layer_time() {
        assert_eq!(scene_key("/scan", "lidar", 3), "geom_/scanlidar3");
        assert_eq!(scene_key("", "", -1), "geom_-1");
    }

    #[test]
    fn first_frame_cloud_updates_ui_and_camera() {
        let mut scene = MockScene::new();
        apply_insertion(&mut scene, SceneInsertion::new(cloud(), "p", 0, "l"));
        assert_eq!(
            scene.events,
            vec![
                SceneEvent::PointcloudUiUpdated,
                SceneEvent::GeometryAdded {
                    key: "geom_pl0".into(),
                    kind: GeometryKind::PointCloud,
                },
                SceneEvent::PointcloudCameraUpdated,
                SceneEvent::Redrawn,
            ]
        );
    }

    #[test]
    fn later_cloud_only_redraws() {
        let mut scene = MockScene::new();
        apply_insertion(&mut scene, SceneInsertion::new(cloud(), "p", 5, "l"));
        assert_eq!(scene.events.len(), 2);
        assert_eq!(scene.events[1], SceneEvent::Redrawn);
    }

    #[test]
    fn mesh_never_touches_ui() {
        let mut scene = MockScene::new();
        let mesh = Geometry::from(TriangleMesh::default());
        apply_insertion(&mut scene, SceneInsertion::new(mesh, "p", 0, "l"));
        assert_eq!(scene.events.len(), 1);
        assert_eq!(scene.redraw_count(), 0);
    }

    #[test]
    fn drain_respects_budget_and_order() {
        let (dispatcher, mut worker) = scene_channel(MockScene::new());
        for t in 1..=3 {
            dispatcher.set_geometry(cloud(), "p", t, "l");
        }
        assert_eq!(worker.drain_pending(2), 2);
        assert_eq!(worker.drain_pending(10), 1);
        assert_eq!(worker.drain_pending(10), 0);
        assert_eq!(
            worker.port().added_keys(),
            vec!["geom_pl1", "geom_pl2", "geom_pl3"]
        );
    }

    #[test]
    fn post_after_worker_dropped_is_silent() {
        let (dispatcher, worker) = scene_channel(MockScene::new());
        drop(worker);
        dispatcher.set_geometry(cloud(), "p", 0, "l");
    }
}
