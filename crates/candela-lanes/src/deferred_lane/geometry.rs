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

//! The geometry pass: rasterizes the scene into the G-buffer.
//!
//! Draw commands can be recorded live each frame or replayed from a
//! pre-recorded render bundle. Both paths funnel through [`record_draws`]
//! against the `DrawRecorder` surface, so a bundle replays exactly the
//! command sequence the live path would have issued. The bundle is
//! re-recorded whenever the scene's topology version moves past the one
//! captured at recording time.

use super::shaders;
use candela_core::math::LinearRgba;
use candela_core::renderer::api::{
    BindGroupId, ColorTargetStateDescriptor, IndexFormat, LoadOp, Operations,
    PrimitiveStateDescriptor, RenderBundleDescriptor, RenderBundleId, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, RenderPipelineDescriptor,
    RenderPipelineId, RenderScene, ShaderModuleDescriptor, ShaderModuleId, ShaderSourceData,
    StoreOp, VertexAttributeDescriptor, VertexBufferLayoutDescriptor, VertexFormat,
};
use candela_core::renderer::api::pipeline::{CompareFunction, DepthStencilStateDescriptor};
use candela_core::renderer::error::RenderError;
use candela_core::renderer::gbuffer::GBufferLayout;
use candela_core::renderer::traits::{CommandEncoder, DrawRecorder, GraphicsDevice};
use std::borrow::Cow;

use super::gbuffer::GBufferTargets;
use super::layouts::DeferredLayouts;
use super::GeometryStrategy;

/// A pre-recorded geometry draw sequence and the scene topology it captured.
#[derive(Debug, Clone, Copy)]
struct DrawBundle {
    id: RenderBundleId,
    topology_version: u64,
}

/// The G-buffer write pass.
#[derive(Debug)]
pub struct GeometryPass {
    gbuffer_layout: GBufferLayout,
    shader: ShaderModuleId,
    pipeline: RenderPipelineId,
    bundle: Option<DrawBundle>,
}

/// Vertex layout shared by all geometry pipelines:
/// position (vec3) + normal (vec3) + uv (vec2), interleaved, 32-byte stride.
fn vertex_buffer_layout() -> VertexBufferLayoutDescriptor<'static> {
    VertexBufferLayoutDescriptor {
        array_stride: 32,
        attributes: Cow::Owned(vec![
            VertexAttributeDescriptor {
                format: VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            },
            VertexAttributeDescriptor {
                format: VertexFormat::Float32x3,
                offset: 12,
                shader_location: 1,
            },
            VertexAttributeDescriptor {
                format: VertexFormat::Float32x2,
                offset: 24,
                shader_location: 2,
            },
        ]),
    }
}

/// Records the scene's draw sequence: pipeline, scene set, then per node
/// (group 1) and per material (group 2) the indexed draws of each primitive.
///
/// Scene traversal order is draw order. This is the single source of truth
/// for geometry commands; live passes and bundle recordings both call it.
fn record_draws(
    recorder: &mut dyn DrawRecorder,
    pipeline: RenderPipelineId,
    scene: &RenderScene,
    scene_bind_group: BindGroupId,
) {
    recorder.set_pipeline(&pipeline);
    recorder.set_bind_group(0, &scene_bind_group);

    for node in scene.nodes() {
        recorder.set_bind_group(1, &node.bind_group);
        for material in &node.materials {
            recorder.set_bind_group(2, &material.bind_group);
            for primitive in &material.primitives {
                recorder.set_vertex_buffer(0, &primitive.vertex_buffer, 0);
                recorder.set_index_buffer(&primitive.index_buffer, 0, IndexFormat::Uint32);
                recorder.draw_indexed(0..primitive.index_count, 0, 0..1);
            }
        }
    }
}

impl GeometryPass {
    /// Compiles the layout's geometry shader variant and builds the pipeline.
    pub fn new(
        device: &dyn GraphicsDevice,
        layouts: &DeferredLayouts,
        gbuffer_layout: GBufferLayout,
    ) -> Result<Self, RenderError> {
        let shader = device.create_shader_module(&ShaderModuleDescriptor {
            label: Some("deferred_geometry_shader"),
            source: ShaderSourceData::Wgsl(Cow::Borrowed(shaders::geometry_source(
                gbuffer_layout,
            ))),
        })?;

        let color_targets: Vec<ColorTargetStateDescriptor> = gbuffer_layout
            .color_formats()
            .iter()
            .map(|format| ColorTargetStateDescriptor::opaque(*format))
            .collect();

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(Cow::Borrowed("deferred_geometry_pipeline")),
            layout: layouts.geometry_pipeline_layout,
            vertex_shader: shader,
            vertex_entry_point: Cow::Borrowed("vs_main"),
            fragment_shader: Some(shader),
            fragment_entry_point: Some(Cow::Borrowed("fs_main")),
            vertex_buffers: Cow::Owned(vec![vertex_buffer_layout()]),
            primitive: PrimitiveStateDescriptor::default(),
            depth_stencil: Some(DepthStencilStateDescriptor {
                format: GBufferLayout::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
            }),
            color_targets: Cow::Owned(color_targets),
            sample_count: 1,
        })?;

        Ok(Self {
            gbuffer_layout,
            shader,
            pipeline,
            bundle: None,
        })
    }

    /// Encodes the geometry pass into `encoder`.
    ///
    /// Color attachments are cleared to transparent black and depth to 1.0.
    /// With [`GeometryStrategy::Bundled`], a stale or missing bundle is
    /// re-recorded first, then replayed; otherwise draws are recorded live.
    pub fn encode(
        &mut self,
        device: &dyn GraphicsDevice,
        encoder: &mut dyn CommandEncoder,
        targets: &GBufferTargets,
        scene: &RenderScene,
        scene_bind_group: BindGroupId,
        strategy: GeometryStrategy,
    ) -> Result<(), RenderError> {
        let bundle = match strategy {
            GeometryStrategy::Live => None,
            GeometryStrategy::Bundled => {
                Some(self.ensure_bundle(device, scene, scene_bind_group)?)
            }
        };

        let color_attachments = targets
            .color_views()
            .iter()
            .map(|view| RenderPassColorAttachment {
                view: *view,
                resolve_target: None,
                ops: Operations::clear(LinearRgba::TRANSPARENT),
            })
            .collect();

        let descriptor = RenderPassDescriptor {
            label: Some("deferred_geometry_pass"),
            color_attachments,
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: targets.depth_view(),
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
            }),
        };

        let mut pass = encoder.begin_render_pass(&descriptor);
        match bundle {
            Some(id) => pass.execute_bundle(&id),
            None => record_draws(pass.as_mut(), self.pipeline, scene, scene_bind_group),
        }
        Ok(())
    }

    /// Returns a bundle matching the scene's current topology, re-recording
    /// if none exists or the captured version is stale.
    fn ensure_bundle(
        &mut self,
        device: &dyn GraphicsDevice,
        scene: &RenderScene,
        scene_bind_group: BindGroupId,
    ) -> Result<RenderBundleId, RenderError> {
        if let Some(bundle) = self.bundle {
            if bundle.topology_version == scene.topology_version() {
                return Ok(bundle.id);
            }
            log::debug!(
                "Geometry bundle stale (recorded v{}, scene v{}); re-recording",
                bundle.topology_version,
                scene.topology_version()
            );
            if let Err(err) = device.destroy_render_bundle(bundle.id) {
                log::warn!("Failed to destroy stale geometry bundle: {err}");
            }
            self.bundle = None;
        }

        let pipeline = self.pipeline;
        let id = device.record_render_bundle(
            &RenderBundleDescriptor {
                label: Some("deferred_geometry_bundle"),
                color_formats: self.gbuffer_layout.color_formats(),
                depth_stencil_format: Some(GBufferLayout::DEPTH_FORMAT),
                sample_count: 1,
            },
            &mut |recorder| record_draws(recorder, pipeline, scene, scene_bind_group),
        )?;

        self.bundle = Some(DrawBundle {
            id,
            topology_version: scene.topology_version(),
        });
        Ok(id)
    }

    /// Releases the pass's GPU resources.
    pub fn destroy(&mut self, device: &dyn GraphicsDevice) {
        if let Some(bundle) = self.bundle.take() {
            if let Err(err) = device.destroy_render_bundle(bundle.id) {
                log::warn!("Failed to destroy geometry bundle: {err}");
            }
        }
        if let Err(err) = device.destroy_render_pipeline(self.pipeline) {
            log::warn!("Failed to destroy geometry pipeline: {err}");
        }
        if let Err(err) = device.destroy_shader_module(self.shader) {
            log::warn!("Failed to destroy geometry shader: {err}");
        }
    }
}
