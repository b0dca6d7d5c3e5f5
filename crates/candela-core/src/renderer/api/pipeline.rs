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

//! Defines static pipeline state, pipeline layouts, and their descriptors.

use crate::candela_bitflags;
use crate::renderer::api::bind_group::BindGroupLayoutId;
use crate::renderer::api::shader::ShaderModuleId;
use crate::renderer::api::texture::TextureFormat;
use std::borrow::Cow;

/// The format of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
    /// Four 32-bit floats.
    Float32x4,
}

impl VertexFormat {
    /// Returns the size of this format in bytes.
    pub const fn size(&self) -> u64 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Each vertex after the second forms a triangle with the previous two.
    TriangleStrip,
    /// Every two vertices form a line.
    LineList,
}

/// Which triangle faces are culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// No culling.
    None,
    /// Cull front-facing triangles.
    Front,
    /// Cull back-facing triangles.
    #[default]
    Back,
}

/// Which winding order is considered front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Counter-clockwise winding is front-facing.
    #[default]
    Ccw,
    /// Clockwise winding is front-facing.
    Cw,
}

/// Comparison function used for depth testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    /// Comparison never passes.
    Never,
    /// Passes when the new value is less than the stored value.
    Less,
    /// Passes when the values are equal.
    Equal,
    /// Passes when the new value is less than or equal to the stored value.
    LessEqual,
    /// Passes when the new value is greater than the stored value.
    Greater,
    /// Comparison always passes.
    Always,
}

/// A single attribute within a vertex buffer layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexAttributeDescriptor {
    /// The format of the attribute data.
    pub format: VertexFormat,
    /// Byte offset of the attribute within one vertex.
    pub offset: u64,
    /// The shader location (e.g., `@location(0)` in WGSL).
    pub shader_location: u32,
}

/// Describes the memory layout of one vertex buffer slot.
#[derive(Debug, Clone)]
pub struct VertexBufferLayoutDescriptor<'a> {
    /// The stride in bytes between consecutive vertices.
    pub array_stride: u64,
    /// The attributes read from this buffer.
    pub attributes: Cow<'a, [VertexAttributeDescriptor]>,
}

/// Describes primitive assembly and rasterization state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveStateDescriptor {
    /// How vertices are assembled into primitives.
    pub topology: PrimitiveTopology,
    /// The winding order considered front-facing.
    pub front_face: FrontFace,
    /// Which faces are culled.
    pub cull_mode: CullMode,
}

impl Default for PrimitiveStateDescriptor {
    fn default() -> Self {
        Self {
            topology: PrimitiveTopology::TriangleList,
            front_face: FrontFace::Ccw,
            cull_mode: CullMode::Back,
        }
    }
}

/// Describes depth testing and writing state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStencilStateDescriptor {
    /// The format of the depth attachment.
    pub format: TextureFormat,
    /// Whether depth values are written.
    pub depth_write_enabled: bool,
    /// The depth comparison function.
    pub depth_compare: CompareFunction,
}

candela_bitflags! {
    /// Which color channels a pipeline writes to its color target.
    pub struct ColorWrites: u32 {
        /// The red channel.
        const RED = 1 << 0;
        /// The green channel.
        const GREEN = 1 << 1;
        /// The blue channel.
        const BLUE = 1 << 2;
        /// The alpha channel.
        const ALPHA = 1 << 3;
        /// All channels.
        const ALL = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits() | Self::ALPHA.bits();
    }
}

/// Describes one color target of a render pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTargetStateDescriptor {
    /// The texel format of the target attachment.
    pub format: TextureFormat,
    /// Which channels are written.
    pub write_mask: ColorWrites,
}

impl ColorTargetStateDescriptor {
    /// A target writing all channels of the given format, no blending.
    pub const fn opaque(format: TextureFormat) -> Self {
        Self {
            format,
            write_mask: ColorWrites::ALL,
        }
    }
}

/// Describes a render pipeline to be created by the `GraphicsDevice`.
#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The explicit pipeline layout.
    pub layout: PipelineLayoutId,
    /// The compiled vertex shader module.
    pub vertex_shader: ShaderModuleId,
    /// The vertex shader entry point.
    pub vertex_entry_point: Cow<'a, str>,
    /// The compiled fragment shader module, if any.
    pub fragment_shader: Option<ShaderModuleId>,
    /// The fragment shader entry point, if any.
    pub fragment_entry_point: Option<Cow<'a, str>>,
    /// The vertex buffer layouts consumed by the vertex stage.
    pub vertex_buffers: Cow<'a, [VertexBufferLayoutDescriptor<'a>]>,
    /// Primitive assembly and rasterization state.
    pub primitive: PrimitiveStateDescriptor,
    /// Depth state, or `None` for pipelines without a depth attachment.
    pub depth_stencil: Option<DepthStencilStateDescriptor>,
    /// The color targets written by the fragment stage.
    pub color_targets: Cow<'a, [ColorTargetStateDescriptor]>,
    /// Number of samples per texel (1 for non-multisampled).
    pub sample_count: u32,
}

/// Describes a compute pipeline to be created by the `GraphicsDevice`.
#[derive(Debug, Clone)]
pub struct ComputePipelineDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The explicit pipeline layout.
    pub layout: PipelineLayoutId,
    /// The compiled compute shader module.
    pub shader: ShaderModuleId,
    /// The compute shader entry point.
    pub entry_point: Cow<'a, str>,
}

/// Describes a pipeline layout: the ordered list of bind group layouts a
/// pipeline binds at group indices 0..n.
#[derive(Debug, Clone)]
pub struct PipelineLayoutDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// The bind group layouts, in group-index order.
    pub bind_group_layouts: &'a [BindGroupLayoutId],
}

/// An opaque handle to a render pipeline resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderPipelineId(pub usize);

/// An opaque handle to a compute pipeline resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComputePipelineId(pub usize);

/// An opaque handle to a pipeline layout resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineLayoutId(pub usize);
