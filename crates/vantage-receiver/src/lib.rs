// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Geometry receiver: turns decoded wire messages into scene geometry.
//!
//! This crate provides:
//! - attribute extraction with degrade-and-log semantics ([`extract`])
//! - mesh vs point-cloud assembly ([`builder`])
//! - the per-message handler that produces one reply status ([`receiver`])
//! - the channel that carries finished geometry to the UI thread ([`dispatch`])
//! - MockScene for headless testing of the scene/UI ports
//!
//! # Failure tiers
//!
//! Only a malformed positions array rejects a message. Every optional field
//! (normals, colors, faces) is validated on its own; a bad one is logged and
//! dropped while the rest of the message goes through.

pub mod builder;
pub mod dispatch;
pub mod extract;
mod mock_scene;
pub mod receiver;

pub use builder::build_geometry;
pub use dispatch::{
    apply_insertion, scene_channel, scene_key, spawn_scene_thread, SceneDispatcher,
    SceneInsertion, SceneWorker,
};
pub use mock_scene::{MockScene, SceneEvent};
pub use receiver::GeometryReceiver;
