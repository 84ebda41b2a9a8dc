// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Opaque material attached to inserted geometry.

use alloc::string::String;

/// Shader used when the decoder inserts geometry.
pub const DEFAULT_SHADER: &str = "defaultUnlit";

/// Rendering material.
///
/// The decoder never inspects this; it always passes [`Material::default`].
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Shader name understood by the renderer.
    pub shader: String,
    /// Linear RGBA base color.
    pub base_color: [f32; 4],
    /// Point size in pixels for point clouds.
    pub point_size: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            shader: String::from(DEFAULT_SHADER),
            base_color: [1.0, 1.0, 1.0, 1.0],
            point_size: 3.0,
        }
    }
}
