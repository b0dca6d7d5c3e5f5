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

//! The fullscreen shading pass.
//!
//! Draws a single three-vertex triangle with no vertex buffers; the fragment
//! shader reads the G-buffer, reconstructs position from depth, and lights
//! each pixel from its cluster's light list. Depth testing is off: every
//! pixel of the target is shaded exactly once.

use super::shaders;
use candela_core::math::LinearRgba;
use candela_core::renderer::api::{
    BindGroupId, ColorTargetStateDescriptor, Operations, PrimitiveStateDescriptor,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipelineDescriptor, RenderPipelineId,
    ShaderModuleDescriptor, ShaderModuleId, ShaderSourceData, TextureFormat, TextureViewId,
};
use candela_core::renderer::api::pipeline::CullMode;
use candela_core::renderer::cluster::ClusterGridConfig;
use candela_core::renderer::error::RenderError;
use candela_core::renderer::gbuffer::GBufferLayout;
use candela_core::renderer::traits::{CommandEncoder, GraphicsDevice};
use std::borrow::Cow;

use super::layouts::DeferredLayouts;

/// The deferred lighting pass over the G-buffer.
#[derive(Debug)]
pub struct ShadingPass {
    shader: ShaderModuleId,
    pipeline: RenderPipelineId,
}

impl ShadingPass {
    /// Compiles the layout's shading shader variant (specialized to the
    /// cluster grid) and builds the fullscreen pipeline.
    pub fn new(
        device: &dyn GraphicsDevice,
        layouts: &DeferredLayouts,
        gbuffer_layout: GBufferLayout,
        grid: &ClusterGridConfig,
        output_format: TextureFormat,
    ) -> Result<Self, RenderError> {
        let source = shaders::shading_source(gbuffer_layout, grid);
        let shader = device.create_shader_module(&ShaderModuleDescriptor {
            label: Some("deferred_shading_shader"),
            source: ShaderSourceData::Wgsl(Cow::Owned(source)),
        })?;

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(Cow::Borrowed("deferred_shading_pipeline")),
            layout: layouts.shading_pipeline_layout,
            vertex_shader: shader,
            vertex_entry_point: Cow::Borrowed("vs_main"),
            fragment_shader: Some(shader),
            fragment_entry_point: Some(Cow::Borrowed("fs_main")),
            vertex_buffers: Cow::Borrowed(&[]),
            primitive: PrimitiveStateDescriptor {
                // The fullscreen triangle has no meaningful winding to cull.
                cull_mode: CullMode::None,
                ..Default::default()
            },
            depth_stencil: None,
            color_targets: Cow::Owned(vec![ColorTargetStateDescriptor::opaque(output_format)]),
            sample_count: 1,
        })?;

        Ok(Self { shader, pipeline })
    }

    /// Encodes the shading pass into `encoder`, writing `output_view`.
    ///
    /// Binds the scene set at group 0, the G-buffer read set at group 1, and
    /// the cluster light list at group 2, then draws the three vertices.
    pub fn encode(
        &self,
        encoder: &mut dyn CommandEncoder,
        output_view: TextureViewId,
        scene_bind_group: BindGroupId,
        gbuffer_bind_group: BindGroupId,
        cluster_bind_group: BindGroupId,
    ) {
        let descriptor = RenderPassDescriptor {
            label: Some("deferred_shading_pass"),
            color_attachments: vec![RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: Operations::clear(LinearRgba::TRANSPARENT),
            }],
            depth_stencil_attachment: None,
        };

        let mut pass = encoder.begin_render_pass(&descriptor);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &scene_bind_group);
        pass.set_bind_group(1, &gbuffer_bind_group);
        pass.set_bind_group(2, &cluster_bind_group);
        pass.draw(0..3, 0..1);
    }

    /// Releases the pass's GPU resources.
    pub fn destroy(&mut self, device: &dyn GraphicsDevice) {
        if let Err(err) = device.destroy_render_pipeline(self.pipeline) {
            log::warn!("Failed to destroy shading pipeline: {err}");
        }
        if let Err(err) = device.destroy_shader_module(self.shader) {
            log::warn!("Failed to destroy shading shader: {err}");
        }
    }
}
