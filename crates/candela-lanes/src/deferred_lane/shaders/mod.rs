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

//! Built-in shader sources for the clustered deferred lane.
//!
//! Each G-buffer layout has its own geometry/shading shader pair; the packed
//! variants carry WGSL pack/unpack helpers that mirror the CPU-side texel
//! encoding bit for bit.
//!
//! # Available Shaders
//!
//! - [`GEOMETRY_SPLIT_WGSL`] / [`GEOMETRY_PACKED_WGSL`] - Geometry pass writes
//! - [`SHADING_SPLIT_WGSL`] / [`SHADING_PACKED_WGSL`] - Fullscreen shading reads

use candela_core::renderer::cluster::ClusterGridConfig;
use candela_core::renderer::gbuffer::GBufferLayout;

/// Geometry pass shader for the split G-buffer layout.
///
/// Writes albedo to target 0 (`Rgba8Unorm`) and the world-space normal to
/// target 1 (`Rgba16Float`).
pub const GEOMETRY_SPLIT_WGSL: &str = include_str!("geometry_split.wgsl");

/// Geometry pass shader for the packed G-buffer layout.
///
/// Bit-packs albedo + normal into a single `Rgba32Uint` target using the
/// same encoding as `candela_core::renderer::gbuffer::pack_surface`.
pub const GEOMETRY_PACKED_WGSL: &str = include_str!("geometry_packed.wgsl");

/// Fullscreen shading shader for the split G-buffer layout.
pub const SHADING_SPLIT_WGSL: &str = include_str!("shading_split.wgsl");

/// Fullscreen shading shader for the packed G-buffer layout.
pub const SHADING_PACKED_WGSL: &str = include_str!("shading_packed.wgsl");

/// The cluster grid constants embedded in the shading shader sources.
///
/// The shaders ship with the default grid baked in; [`shading_source`]
/// rewrites these lines when the lane is configured differently.
const DEFAULT_DIMS_LINE: &str = "const CLUSTER_DIMS: vec3<u32> = vec3<u32>(16u, 9u, 24u);";
const DEFAULT_CAPACITY_LINE: &str = "const MAX_LIGHTS_PER_CLUSTER: u32 = 128u;";

/// Returns the geometry shader source for the given G-buffer layout.
pub fn geometry_source(layout: GBufferLayout) -> &'static str {
    match layout {
        GBufferLayout::Split => GEOMETRY_SPLIT_WGSL,
        GBufferLayout::Packed => GEOMETRY_PACKED_WGSL,
    }
}

/// Returns the shading shader source for the given G-buffer layout,
/// specialized to the given cluster grid.
pub fn shading_source(layout: GBufferLayout, grid: &ClusterGridConfig) -> String {
    let source = match layout {
        GBufferLayout::Split => SHADING_SPLIT_WGSL,
        GBufferLayout::Packed => SHADING_PACKED_WGSL,
    };
    source
        .replace(
            DEFAULT_DIMS_LINE,
            &format!(
                "const CLUSTER_DIMS: vec3<u32> = vec3<u32>({}u, {}u, {}u);",
                grid.dims[0], grid.dims[1], grid.dims[2]
            ),
        )
        .replace(
            DEFAULT_CAPACITY_LINE,
            &format!(
                "const MAX_LIGHTS_PER_CLUSTER: u32 = {}u;",
                grid.max_lights_per_cluster
            ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_split_shader_valid() {
        assert!(GEOMETRY_SPLIT_WGSL.contains("@vertex"));
        assert!(GEOMETRY_SPLIT_WGSL.contains("@fragment"));
    }

    #[test]
    fn test_geometry_packed_shader_valid() {
        assert!(GEOMETRY_PACKED_WGSL.contains("@vertex"));
        assert!(GEOMETRY_PACKED_WGSL.contains("@fragment"));
        assert!(GEOMETRY_PACKED_WGSL.contains("pack4x8unorm"));
        assert!(GEOMETRY_PACKED_WGSL.contains("pack2x16snorm"));
    }

    #[test]
    fn test_shading_shaders_valid() {
        for source in [SHADING_SPLIT_WGSL, SHADING_PACKED_WGSL] {
            assert!(source.contains("@vertex"));
            assert!(source.contains("@fragment"));
            assert!(source.contains(DEFAULT_DIMS_LINE));
            assert!(source.contains(DEFAULT_CAPACITY_LINE));
            // Depth slicing must stay linear, matching
            // ClusterGridConfig::z_slice_for_depth.
            assert!(source.contains("u32(depth * f32(CLUSTER_DIMS.z))"));
        }
        assert!(SHADING_PACKED_WGSL.contains("unpack4x8unorm"));
        assert!(SHADING_PACKED_WGSL.contains("unpack2x16snorm"));
    }

    #[test]
    fn test_shading_source_specializes_grid() {
        let grid = ClusterGridConfig {
            dims: [32, 18, 48],
            max_lights_per_cluster: 256,
        };
        let source = shading_source(GBufferLayout::Split, &grid);
        assert!(source.contains("vec3<u32>(32u, 18u, 48u)"));
        assert!(source.contains("MAX_LIGHTS_PER_CLUSTER: u32 = 256u"));
        assert!(!source.contains(DEFAULT_DIMS_LINE));
    }

    #[test]
    fn test_shading_source_default_grid_is_unchanged() {
        let source = shading_source(GBufferLayout::Packed, &ClusterGridConfig::default());
        assert_eq!(source, SHADING_PACKED_WGSL);
    }
}
