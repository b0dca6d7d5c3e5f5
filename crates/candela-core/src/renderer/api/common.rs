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

//! Shared enums, flags, and GPU-side uniform structures.

use crate::math::LinearRgba;

/// Defines the data format of indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 16-bit unsigned integer indices.
    Uint16,
    /// 32-bit unsigned integer indices.
    #[default]
    Uint32,
}

/// Defines the programmable stage in the graphics pipeline a shader module is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// The vertex shader stage.
    Vertex,
    /// The fragment (or pixel) shader stage.
    Fragment,
    /// The compute shader stage.
    Compute,
}

/// Flags representing which shader stages can access a resource binding.
///
/// This is used in bind group layouts to specify visibility of resources.
/// Multiple stages can be combined using bitwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderStageFlags {
    bits: u32,
}

impl ShaderStageFlags {
    /// No shader stages.
    pub const NONE: Self = Self { bits: 0 };
    /// Vertex shader stage.
    pub const VERTEX: Self = Self { bits: 1 << 0 };
    /// Fragment shader stage.
    pub const FRAGMENT: Self = Self { bits: 1 << 1 };
    /// Compute shader stage.
    pub const COMPUTE: Self = Self { bits: 1 << 2 };
    /// All graphics stages (vertex + fragment).
    pub const VERTEX_FRAGMENT: Self = Self {
        bits: Self::VERTEX.bits | Self::FRAGMENT.bits,
    };
    /// All stages.
    pub const ALL: Self = Self {
        bits: Self::VERTEX.bits | Self::FRAGMENT.bits | Self::COMPUTE.bits,
    };

    /// Creates a new set of shader stage flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Creates flags from a single shader stage.
    pub const fn from_stage(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => Self::VERTEX,
            ShaderStage::Fragment => Self::FRAGMENT,
            ShaderStage::Compute => Self::COMPUTE,
        }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks if these flags contain a specific stage.
    pub const fn contains(&self, stage: ShaderStage) -> bool {
        let stage_bits = Self::from_stage(stage).bits;
        (self.bits & stage_bits) == stage_bits
    }

    /// Checks if these flags contain every stage in `other`.
    pub const fn contains_all(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks if these flags are empty (no stages).
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl std::ops::BitOr for ShaderStageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for ShaderStageFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// The GPU-side representation of camera uniform data.
///
/// This structure is designed to be directly uploaded to a uniform buffer.
/// The layout must match the uniform block declaration in the shader.
///
/// **Important:** WGSL has specific alignment requirements. A 4x4 matrix is
/// aligned to 16 bytes, and vec3 needs padding to be treated as vec4 in
/// uniform buffers. The inverse projection matrix is carried so the shading
/// stage can reconstruct view-space position from depth and screen UV.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniformData {
    /// The combined view-projection matrix (projection * view).
    pub view_projection: [[f32; 4]; 4],
    /// The inverse of the projection matrix.
    pub inverse_projection: [[f32; 4]; 4],
    /// The inverse of the view matrix (view to world).
    pub inverse_view: [[f32; 4]; 4],
    /// The camera's position in world space.
    /// Note: The fourth component is padding for alignment.
    pub camera_position: [f32; 4],
    /// Presentation surface dimensions in pixels.
    pub screen_dimensions: [f32; 2],
    /// Padding for 16-byte alignment.
    pub _padding: [f32; 2],
}

impl CameraUniformData {
    /// Returns the data as a byte slice suitable for uploading to a GPU buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl Default for CameraUniformData {
    fn default() -> Self {
        const IDENTITY: [[f32; 4]; 4] = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        Self {
            view_projection: IDENTITY,
            inverse_projection: IDENTITY,
            inverse_view: IDENTITY,
            camera_position: [0.0; 4],
            screen_dimensions: [1.0, 1.0],
            _padding: [0.0; 2],
        }
    }
}

/// Data for a model's transform, formatted for GPU consumption.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    /// The model (object to world) matrix.
    pub model_matrix: [[f32; 4]; 4],
    /// The inverse-transpose of the model matrix, for transforming normals.
    pub normal_matrix: [[f32; 4]; 4],
}

/// Data for a material's properties, formatted for the geometry stage.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniforms {
    /// The material's base (albedo) color.
    pub base_color: LinearRgba,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_uniform_data_size() {
        // Three 4x4 matrices (64 bytes each) + vec4 + vec2 + padding
        assert_eq!(std::mem::size_of::<CameraUniformData>(), 224);
        assert_eq!(std::mem::size_of::<CameraUniformData>() % 16, 0);
    }

    #[test]
    fn test_model_uniforms_size() {
        assert_eq!(std::mem::size_of::<ModelUniforms>(), 128);
    }

    #[test]
    fn test_shader_stage_flags_union() {
        let vertex_fragment = ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT;
        assert_eq!(vertex_fragment, ShaderStageFlags::VERTEX_FRAGMENT);
        assert!(vertex_fragment.contains(ShaderStage::Vertex));
        assert!(vertex_fragment.contains(ShaderStage::Fragment));
        assert!(!vertex_fragment.contains(ShaderStage::Compute));
    }

    #[test]
    fn test_shader_stage_flags_contains_all() {
        let all = ShaderStageFlags::ALL;
        assert!(all.contains_all(ShaderStageFlags::VERTEX_FRAGMENT));
        assert!(!ShaderStageFlags::FRAGMENT.contains_all(ShaderStageFlags::VERTEX_FRAGMENT));
        assert!(ShaderStageFlags::NONE.is_empty());
    }

    #[test]
    fn test_camera_uniform_as_bytes_length() {
        let data = CameraUniformData::default();
        assert_eq!(data.as_bytes().len(), std::mem::size_of::<CameraUniformData>());
    }
}
