// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Data contracts for clustered light culling.
//!
//! Clustered shading divides view space into a 3D grid of clusters and
//! pre-computes, per cluster, the set of lights overlapping it. The culling
//! compute shader itself is an external collaborator; this module fixes the
//! buffer sizes and GPU layouts both sides must agree on, plus the
//! [`LightClusteringStage`] entry point the frame orchestrator invokes before
//! the geometry pass.

use crate::renderer::api::buffer::BufferId;
use crate::renderer::error::RenderError;
use crate::renderer::traits::{CommandEncoder, GraphicsDevice};
use bytemuck::{Pod, Zeroable};

/// Configuration for the view-space cluster grid.
///
/// X and Y subdivide the screen; Z subdivides the depth-buffer value range
/// linearly, per [`Self::z_slice_for_depth`]. Finer grids cull more
/// precisely but cost more compute and memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterGridConfig {
    /// Cluster counts along (x, y, z).
    pub dims: [u32; 3],
    /// Maximum number of light indices stored per cluster.
    /// Higher values handle dense light groups but use more memory.
    pub max_lights_per_cluster: u32,
}

impl Default for ClusterGridConfig {
    fn default() -> Self {
        Self {
            dims: [16, 9, 24],
            max_lights_per_cluster: 128,
        }
    }
}

impl ClusterGridConfig {
    /// Creates a new configuration with default values.
    pub const fn new() -> Self {
        Self {
            dims: [16, 9, 24],
            max_lights_per_cluster: 128,
        }
    }

    /// Creates a configuration optimized for many overlapping lights.
    pub const fn high_density() -> Self {
        Self {
            dims: [32, 18, 48],
            max_lights_per_cluster: 256,
        }
    }

    /// Creates a configuration optimized for low culling overhead.
    pub const fn low_overhead() -> Self {
        Self {
            dims: [8, 5, 12],
            max_lights_per_cluster: 64,
        }
    }

    /// The total number of clusters in the grid.
    #[inline]
    pub const fn cluster_count(&self) -> u32 {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// The required size in bytes of the per-cluster light-index buffer.
    ///
    /// Each cluster stores a count followed by `max_lights_per_cluster`
    /// light indices, all `u32`.
    pub fn light_index_buffer_size(&self) -> u64 {
        let per_cluster = 1 + self.max_lights_per_cluster as u64;
        self.cluster_count() as u64 * per_cluster * std::mem::size_of::<u32>() as u64
    }

    /// The required size in bytes of the cluster bounds buffer.
    /// Each cluster stores a view-space AABB as two vec4s.
    pub fn bounds_buffer_size(&self) -> u64 {
        self.cluster_count() as u64 * 2 * 16
    }

    /// The Z slice a post-projection depth value (0..1) falls into.
    ///
    /// This is the grid's depth-slicing convention: slices are linear in the
    /// depth-buffer value, and the shading shader's per-pixel cluster lookup
    /// uses the same mapping. A culling stage must bin lights by this
    /// function (or its WGSL equivalent) for the shading pass to read the
    /// clusters it fills.
    #[inline]
    pub fn z_slice_for_depth(&self, depth: f32) -> u32 {
        let slice = (depth.clamp(0.0, 1.0) * self.dims[2] as f32) as u32;
        slice.min(self.dims[2] - 1)
    }
}

/// GPU-friendly representation of a point light.
///
/// The renderer's light model is point lights; the layout matches the WGSL
/// struct used by both the culling and shading shaders (32 bytes, vec4-packed
/// as position+radius / color+intensity).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    /// Light position in world space.
    pub position: [f32; 3],
    /// Maximum range of the light.
    pub radius: f32,
    /// Light color (RGB, linear space).
    pub color: [f32; 3],
    /// Light intensity multiplier.
    pub intensity: f32,
}

impl GpuLight {
    /// Creates a point light from its parts.
    pub const fn new(position: [f32; 3], radius: f32, color: [f32; 3], intensity: f32) -> Self {
        Self {
            position,
            radius,
            color,
            intensity,
        }
    }

    /// The size in bytes of a light-list buffer holding `count` lights,
    /// preceded by a `u32` count (padded to 16 bytes).
    pub fn list_buffer_size(count: u32) -> u64 {
        16 + count as u64 * std::mem::size_of::<GpuLight>() as u64
    }
}

impl Default for GpuLight {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            radius: 10.0,
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

/// Uniforms for the light culling compute shader.
///
/// Uploaded once per frame with the current camera and grid state.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ClusterUniforms {
    /// Cluster counts along (x, y, z), plus the per-cluster light capacity.
    pub grid_dims: [u32; 4],
    /// Number of active lights in the light buffer.
    pub num_lights: u32,
    /// Near plane distance of the depth range being clustered.
    pub z_near: f32,
    /// Far plane distance of the depth range being clustered.
    pub z_far: f32,
    /// Padding for 16-byte alignment.
    pub _padding: u32,
    /// Screen dimensions in pixels (width, height).
    pub screen_dimensions: [f32; 2],
    /// Padding for 16-byte alignment.
    pub _padding2: [f32; 2],
}

impl Default for ClusterUniforms {
    fn default() -> Self {
        let config = ClusterGridConfig::default();
        Self {
            grid_dims: [
                config.dims[0],
                config.dims[1],
                config.dims[2],
                config.max_lights_per_cluster,
            ],
            num_lights: 0,
            z_near: 0.1,
            z_far: 1000.0,
            _padding: 0,
            screen_dimensions: [1920.0, 1080.0],
            _padding2: [0.0; 2],
        }
    }
}

/// The external light clustering stage invoked by the frame orchestrator.
///
/// `run` records the culling work for the current frame into `encoder` and
/// returns the per-cluster light-index buffer those commands write. The
/// returned buffer is what the shading pass of the *same* frame must read;
/// the orchestrator compares it against the previously bound one and rebinds
/// when it changes, so a stage double-buffering its output stays coherent.
pub trait LightClusteringStage: Send + Sync {
    /// Records this frame's culling commands and returns the buffer they fill.
    fn run(
        &mut self,
        device: &dyn GraphicsDevice,
        encoder: &mut dyn CommandEncoder,
    ) -> Result<BufferId, RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_count() {
        let config = ClusterGridConfig::default();
        assert_eq!(config.cluster_count(), 16 * 9 * 24);
    }

    #[test]
    fn test_cluster_grid_config_default() {
        let config = ClusterGridConfig::default();
        assert_eq!(config.dims, [16, 9, 24]);
        assert_eq!(config.max_lights_per_cluster, 128);
    }

    #[test]
    fn test_buffer_size_calculation() {
        let config = ClusterGridConfig::default();
        // 3456 clusters, each storing 1 count + 128 indices of 4 bytes.
        assert_eq!(config.light_index_buffer_size(), 3456 * 129 * 4);
        // Two vec4s of bounds per cluster.
        assert_eq!(config.bounds_buffer_size(), 3456 * 32);
    }

    #[test]
    fn test_z_slice_is_linear_in_depth() {
        let config = ClusterGridConfig::default();
        assert_eq!(config.z_slice_for_depth(0.0), 0);
        assert_eq!(config.z_slice_for_depth(0.5), 12);
        // The last slice absorbs depth == 1.0 and anything out of range.
        assert_eq!(config.z_slice_for_depth(0.999), 23);
        assert_eq!(config.z_slice_for_depth(1.0), 23);
        assert_eq!(config.z_slice_for_depth(2.0), 23);
    }

    #[test]
    fn test_gpu_light_size_and_alignment() {
        // GpuLight must stay two vec4s wide to match the WGSL layout.
        assert_eq!(std::mem::size_of::<GpuLight>(), 32);
    }

    #[test]
    fn test_light_list_buffer_size() {
        assert_eq!(GpuLight::list_buffer_size(0), 16);
        assert_eq!(GpuLight::list_buffer_size(10), 16 + 320);
    }

    #[test]
    fn test_cluster_uniforms_size() {
        let size = std::mem::size_of::<ClusterUniforms>();
        assert_eq!(size % 16, 0, "ClusterUniforms should be 16-byte aligned");
    }

    #[test]
    fn test_gpu_light_default() {
        let light = GpuLight::default();
        assert_eq!(light.color, [1.0, 1.0, 1.0]);
        assert_eq!(light.radius, 10.0);
    }
}
