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

use super::command_recorder::{CommandEncoder, DrawRecorder};
use crate::renderer::api::bind_group::{
    BindGroupDescriptor, BindGroupId, BindGroupLayoutDescriptor, BindGroupLayoutId,
};
use crate::renderer::api::buffer::{BufferDescriptor, BufferId};
use crate::renderer::api::command::{CommandBufferId, RenderBundleDescriptor, RenderBundleId};
use crate::renderer::api::pipeline::{
    ComputePipelineDescriptor, ComputePipelineId, PipelineLayoutDescriptor, PipelineLayoutId,
    RenderPipelineDescriptor, RenderPipelineId,
};
use crate::renderer::api::shader::{ShaderModuleDescriptor, ShaderModuleId};
use crate::renderer::api::texture::{
    SamplerDescriptor, SamplerId, TextureDescriptor, TextureFormat, TextureId,
    TextureViewDescriptor, TextureViewId,
};
use crate::renderer::error::{PipelineError, RenderError, ResourceError, ShaderError};

/// The central capability trait for a graphics backend.
///
/// `GraphicsDevice` abstracts resource creation, command recording, and
/// submission behind opaque IDs. Renderer code never touches backend types
/// directly; it holds IDs and hands them back to the device. This keeps the
/// rendering logic testable against a recording fake and portable across
/// backends.
///
/// All methods take `&self`: implementations are internally synchronized and
/// the device is shared across systems behind an `Arc`.
pub trait GraphicsDevice: Send + Sync + std::fmt::Debug + 'static {
    // --- Shaders ---

    /// Compiles a shader module from source.
    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ShaderError>;

    /// Destroys a shader module, releasing its backend resources.
    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ShaderError>;

    // --- Pipelines ---

    /// Creates a pipeline layout from an ordered list of bind group layouts.
    ///
    /// The position of each layout in the slice is the group index shaders
    /// bind it at.
    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, PipelineError>;

    /// Creates a render pipeline.
    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, PipelineError>;

    /// Destroys a render pipeline.
    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), PipelineError>;

    /// Creates a compute pipeline.
    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor,
    ) -> Result<ComputePipelineId, PipelineError>;

    /// Destroys a compute pipeline.
    fn destroy_compute_pipeline(&self, id: ComputePipelineId) -> Result<(), PipelineError>;

    // --- Bind groups ---

    /// Creates a bind group layout describing the shape of a binding set.
    fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError>;

    /// Destroys a bind group layout.
    fn destroy_bind_group_layout(&self, id: BindGroupLayoutId) -> Result<(), ResourceError>;

    /// Creates a bind group binding concrete resources to a layout.
    fn create_bind_group(
        &self,
        descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError>;

    /// Destroys a bind group.
    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError>;

    // --- Buffers ---

    /// Creates an uninitialized GPU buffer.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Creates a GPU buffer initialized with the given contents.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Schedules a write of `data` into `buffer` at `offset`.
    fn write_buffer(&self, buffer: BufferId, offset: u64, data: &[u8])
        -> Result<(), ResourceError>;

    /// Destroys a buffer.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    // --- Textures ---

    /// Creates a texture.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError>;

    /// Destroys a texture.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Creates a view over a texture.
    fn create_texture_view(
        &self,
        texture: TextureId,
        descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError>;

    /// Destroys a texture view.
    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError>;

    /// Creates a sampler.
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError>;

    /// Destroys a sampler.
    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError>;

    // --- Commands ---

    /// Creates a command encoder for recording a stream of GPU work.
    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder>;

    /// Records a render bundle by invoking `record` with a recorder whose
    /// commands are captured for later replay via
    /// [`RenderPass::execute_bundle`](super::command_recorder::RenderPass::execute_bundle).
    ///
    /// The callback shape (rather than a returned encoder object) lets
    /// backends use recording objects that borrow the device.
    fn record_render_bundle(
        &self,
        descriptor: &RenderBundleDescriptor,
        record: &mut dyn FnMut(&mut dyn DrawRecorder),
    ) -> Result<RenderBundleId, ResourceError>;

    /// Destroys a render bundle.
    fn destroy_render_bundle(&self, id: RenderBundleId) -> Result<(), ResourceError>;

    /// Submits a finished command buffer to the GPU queue.
    ///
    /// Buffers execute in submission order.
    fn submit_command_buffer(&self, id: CommandBufferId) -> Result<(), RenderError>;

    // --- Capabilities ---

    /// The format of the presentation surface, if one is configured.
    fn get_surface_format(&self) -> Option<TextureFormat>;

    /// Whether the backend supports a named optional feature.
    fn supports_feature(&self, name: &str) -> bool;
}
