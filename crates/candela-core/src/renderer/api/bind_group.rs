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

//! Defines data structures for bind groups and bind group layouts.
//!
//! Bind groups are the mechanism for binding resources (buffers, textures,
//! samplers) to shaders in a graphics pipeline. They provide an abstraction
//! over the different binding models of various graphics APIs (descriptor sets
//! in Vulkan, bind groups in WebGPU).

use crate::renderer::api::buffer::BufferId;
use crate::renderer::api::common::ShaderStageFlags;
use crate::renderer::api::texture::{SamplerId, TextureViewDimension, TextureViewId};

/// An opaque handle to a bind group layout resource.
///
/// A bind group layout describes the structure and types of resources
/// that will be bound to a shader, without specifying the actual resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindGroupLayoutId(pub usize);

/// An opaque handle to a bind group resource.
///
/// A bind group represents the actual bound resources (buffers, textures, etc.)
/// that match a specific bind group layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindGroupId(pub usize);

/// Describes a single binding entry in a bind group layout.
#[derive(Debug, Clone)]
pub struct BindGroupLayoutEntry {
    /// The binding index (e.g., `@binding(0)` in WGSL).
    pub binding: u32,
    /// Which shader stages can access this binding.
    pub visibility: ShaderStageFlags,
    /// The type of resource being bound.
    pub ty: BindingType,
}

impl BindGroupLayoutEntry {
    /// Helper to create a `BindGroupLayoutEntry` for a buffer resource.
    pub fn buffer(
        binding: u32,
        visibility: ShaderStageFlags,
        ty: BufferBindingType,
        has_dynamic_offset: bool,
        min_binding_size: Option<std::num::NonZeroU64>,
    ) -> Self {
        Self {
            binding,
            visibility,
            ty: BindingType::Buffer {
                ty,
                has_dynamic_offset,
                min_binding_size,
            },
        }
    }

    /// Helper to create a `BindGroupLayoutEntry` for a 2D sampled texture.
    pub fn texture_2d(binding: u32, visibility: ShaderStageFlags, sample_type: TextureSampleType) -> Self {
        Self {
            binding,
            visibility,
            ty: BindingType::Texture {
                sample_type,
                view_dimension: TextureViewDimension::D2,
                multisampled: false,
            },
        }
    }

    /// Helper to create a `BindGroupLayoutEntry` for a sampler.
    pub fn sampler(binding: u32, visibility: ShaderStageFlags, ty: SamplerBindingType) -> Self {
        Self {
            binding,
            visibility,
            ty: BindingType::Sampler(ty),
        }
    }
}

/// Describes the type of buffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferBindingType {
    /// A uniform buffer.
    Uniform,
    /// A storage buffer (read/write or read-only).
    Storage {
        /// Whether the buffer is read-only in the shader.
        read_only: bool,
    },
}

/// The type of texture sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSampleType {
    /// A floating-point texture sample.
    Float {
        /// Whether the texture can be filtered.
        filterable: bool,
    },
    /// A depth texture sample.
    Depth,
    /// An unsigned integer texture sample.
    Uint,
    /// A signed integer texture sample.
    Sint,
}

/// The type of sampler binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerBindingType {
    /// A filtering sampler.
    Filtering,
    /// A non-filtering sampler.
    NonFiltering,
    /// A comparison sampler.
    Comparison,
}

/// The type of resource bound at a binding point.
#[derive(Debug, Clone)]
pub enum BindingType {
    /// A buffer binding (uniform or storage).
    Buffer {
        /// The type of buffer binding.
        ty: BufferBindingType,
        /// Whether this buffer has dynamic offsets.
        has_dynamic_offset: bool,
        /// Minimum size required for the buffer binding.
        min_binding_size: Option<std::num::NonZeroU64>,
    },
    /// A sampled texture binding.
    Texture {
        /// The type of sampler that can sample this texture.
        sample_type: TextureSampleType,
        /// The dimension of the texture view.
        view_dimension: TextureViewDimension,
        /// Whether the texture supports multisampling.
        multisampled: bool,
    },
    /// A sampler binding.
    Sampler(SamplerBindingType),
}

/// Describes a bind group layout to be created.
#[derive(Debug, Clone)]
pub struct BindGroupLayoutDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// The entries in this bind group layout.
    pub entries: &'a [BindGroupLayoutEntry],
}

/// Describes a buffer binding with offset and size.
#[derive(Debug, Clone, Copy)]
pub struct BufferBinding {
    /// The buffer to bind.
    pub buffer: BufferId,
    /// Offset into the buffer in bytes.
    pub offset: u64,
    /// Size of the binding, or None to bind from offset to end of buffer.
    pub size: Option<std::num::NonZeroU64>,
}

/// Describes a single resource binding in a bind group.
#[derive(Debug, Clone, Copy)]
pub enum BindingResource {
    /// Binds a buffer with optional offset and size.
    Buffer(BufferBinding),
    /// Binds a texture view.
    TextureView(TextureViewId),
    /// Binds a sampler.
    Sampler(SamplerId),
}

/// Describes a bind group to be created.
#[derive(Debug, Clone)]
pub struct BindGroupDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// The layout this bind group conforms to.
    pub layout: BindGroupLayoutId,
    /// The resources to bind at each binding point.
    pub entries: &'a [BindGroupEntry],
}

/// A single entry in a bind group.
#[derive(Debug, Clone, Copy)]
pub struct BindGroupEntry {
    /// The binding index.
    pub binding: u32,
    /// The resource to bind.
    pub resource: BindingResource,
}

impl BindGroupEntry {
    /// Helper to create a `BindGroupEntry` binding a whole buffer.
    pub fn buffer(binding: u32, buffer: BufferId) -> Self {
        Self {
            binding,
            resource: BindingResource::Buffer(BufferBinding {
                buffer,
                offset: 0,
                size: None,
            }),
        }
    }

    /// Helper to create a `BindGroupEntry` binding a texture view.
    pub fn texture_view(binding: u32, view: TextureViewId) -> Self {
        Self {
            binding,
            resource: BindingResource::TextureView(view),
        }
    }

    /// Helper to create a `BindGroupEntry` binding a sampler.
    pub fn sampler(binding: u32, sampler: SamplerId) -> Self {
        Self {
            binding,
            resource: BindingResource::Sampler(sampler),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_entry_buffer_helper() {
        let entry = BindGroupLayoutEntry::buffer(
            0,
            ShaderStageFlags::VERTEX_FRAGMENT,
            BufferBindingType::Uniform,
            false,
            None,
        );
        assert_eq!(entry.binding, 0);
        match entry.ty {
            BindingType::Buffer { ty, .. } => assert_eq!(ty, BufferBindingType::Uniform),
            _ => panic!("expected buffer binding"),
        }
    }

    #[test]
    fn layout_entry_texture_helper() {
        let entry =
            BindGroupLayoutEntry::texture_2d(1, ShaderStageFlags::FRAGMENT, TextureSampleType::Uint);
        match entry.ty {
            BindingType::Texture {
                sample_type,
                view_dimension,
                multisampled,
            } => {
                assert_eq!(sample_type, TextureSampleType::Uint);
                assert_eq!(view_dimension, TextureViewDimension::D2);
                assert!(!multisampled);
            }
            _ => panic!("expected texture binding"),
        }
    }

    #[test]
    fn bind_group_entry_buffer_binds_whole_range() {
        let entry = BindGroupEntry::buffer(2, BufferId(7));
        match entry.resource {
            BindingResource::Buffer(b) => {
                assert_eq!(b.buffer, BufferId(7));
                assert_eq!(b.offset, 0);
                assert!(b.size.is_none());
            }
            _ => panic!("expected buffer resource"),
        }
    }
}
