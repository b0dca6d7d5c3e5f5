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

//! Command recording: encoder, pass, and bundle recorder wrappers.

use candela_core::renderer::api::bind_group::BindGroupId;
use candela_core::renderer::api::buffer::BufferId;
use candela_core::renderer::api::command::{
    CommandBufferId, ComputePassDescriptor, RenderBundleId, RenderPassDescriptor,
};
use candela_core::renderer::api::common::IndexFormat;
use candela_core::renderer::api::pipeline::{ComputePipelineId, RenderPipelineId};
use candela_core::renderer::traits::{CommandEncoder, ComputePass, DrawRecorder, RenderPass};
use std::any::Any;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use super::conversions::IntoWgpu;
use super::device::WgpuDevice;

/// An active render pass recording into a [`WgpuCommandEncoder`].
pub struct WgpuRenderPass<'a> {
    pub(crate) pass: wgpu::RenderPass<'a>,
    pub(crate) device: &'a WgpuDevice,
}

impl DrawRecorder for WgpuRenderPass<'_> {
    fn set_pipeline(&mut self, pipeline: &RenderPipelineId) {
        if let Some(wgpu_pipeline) = self.device.get_wgpu_render_pipeline(*pipeline) {
            self.pass.set_pipeline(&wgpu_pipeline);
        } else {
            log::warn!("WgpuRenderPass: RenderPipelineId {pipeline:?} not found.");
        }
    }

    fn set_bind_group(&mut self, index: u32, bind_group: &BindGroupId) {
        if let Some(wgpu_bind_group) = self.device.get_wgpu_bind_group(*bind_group) {
            self.pass.set_bind_group(index, wgpu_bind_group.as_ref(), &[]);
        } else {
            log::warn!("WgpuRenderPass: BindGroupId {bind_group:?} not found.");
        }
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &BufferId, offset: u64) {
        if let Some(wgpu_buffer) = self.device.get_wgpu_buffer(*buffer) {
            self.pass.set_vertex_buffer(slot, wgpu_buffer.slice(offset..));
        } else {
            log::warn!("WgpuRenderPass: Vertex BufferId {buffer:?} not found.");
        }
    }

    fn set_index_buffer(&mut self, buffer: &BufferId, offset: u64, index_format: IndexFormat) {
        if let Some(wgpu_buffer) = self.device.get_wgpu_buffer(*buffer) {
            self.pass
                .set_index_buffer(wgpu_buffer.slice(offset..), index_format.into_wgpu());
        } else {
            log::warn!("WgpuRenderPass: Index BufferId {buffer:?} not found.");
        }
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.pass.draw(vertices, instances);
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.pass.draw_indexed(indices, base_vertex, instances);
    }
}

impl<'pass> RenderPass<'pass> for WgpuRenderPass<'pass> {
    fn execute_bundle(&mut self, bundle: &RenderBundleId) {
        if let Some(wgpu_bundle) = self.device.get_wgpu_render_bundle(*bundle) {
            self.pass
                .execute_bundles(std::iter::once(wgpu_bundle.as_ref()));
        } else {
            log::warn!("WgpuRenderPass: RenderBundleId {bundle:?} not found.");
        }
    }
}

/// An active compute pass recording into a [`WgpuCommandEncoder`].
pub struct WgpuComputePass<'a> {
    pub(crate) pass: wgpu::ComputePass<'a>,
    pub(crate) device: &'a WgpuDevice,
}

impl<'pass> ComputePass<'pass> for WgpuComputePass<'pass> {
    fn set_pipeline(&mut self, pipeline: &ComputePipelineId) {
        if let Some(wgpu_pipeline) = self.device.get_wgpu_compute_pipeline(*pipeline) {
            self.pass.set_pipeline(&wgpu_pipeline);
        } else {
            log::warn!("WgpuComputePass: ComputePipelineId {pipeline:?} not found.");
        }
    }

    fn set_bind_group(&mut self, index: u32, bind_group: &BindGroupId) {
        if let Some(wgpu_bind_group) = self.device.get_wgpu_bind_group(*bind_group) {
            self.pass.set_bind_group(index, wgpu_bind_group.as_ref(), &[]);
        } else {
            log::warn!("WgpuComputePass: BindGroupId {bind_group:?} not found.");
        }
    }

    fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32) {
        self.pass.dispatch_workgroups(x, y, z);
    }
}

/// Records draw commands into a wgpu render bundle.
///
/// Exists only for the duration of `GraphicsDevice::record_render_bundle`;
/// the lane's draw-recording code sees it as a plain `DrawRecorder`.
pub(crate) struct WgpuBundleRecorder<'a> {
    pub(crate) encoder: wgpu::RenderBundleEncoder<'a>,
    pub(crate) device: &'a WgpuDevice,
    /// Pipeline/buffer registries, locked for the whole recording: the
    /// bundle encoder borrows what it records for its own lifetime `'a`,
    /// which a per-call `Arc` clone cannot provide.
    pub(crate) pipelines: &'a HashMap<RenderPipelineId, Arc<wgpu::RenderPipeline>>,
    pub(crate) buffers: &'a HashMap<BufferId, Arc<wgpu::Buffer>>,
}

impl DrawRecorder for WgpuBundleRecorder<'_> {
    fn set_pipeline(&mut self, pipeline: &RenderPipelineId) {
        if let Some(wgpu_pipeline) = self.pipelines.get(pipeline) {
            self.encoder.set_pipeline(wgpu_pipeline);
        } else {
            log::warn!("WgpuBundleRecorder: RenderPipelineId {pipeline:?} not found.");
        }
    }

    fn set_bind_group(&mut self, index: u32, bind_group: &BindGroupId) {
        if let Some(wgpu_bind_group) = self.device.get_wgpu_bind_group(*bind_group) {
            self.encoder
                .set_bind_group(index, wgpu_bind_group.as_ref(), &[]);
        } else {
            log::warn!("WgpuBundleRecorder: BindGroupId {bind_group:?} not found.");
        }
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &BufferId, offset: u64) {
        if let Some(wgpu_buffer) = self.buffers.get(buffer) {
            self.encoder
                .set_vertex_buffer(slot, wgpu_buffer.slice(offset..));
        } else {
            log::warn!("WgpuBundleRecorder: Vertex BufferId {buffer:?} not found.");
        }
    }

    fn set_index_buffer(&mut self, buffer: &BufferId, offset: u64, index_format: IndexFormat) {
        if let Some(wgpu_buffer) = self.buffers.get(buffer) {
            self.encoder
                .set_index_buffer(wgpu_buffer.slice(offset..), index_format.into_wgpu());
        } else {
            log::warn!("WgpuBundleRecorder: Index BufferId {buffer:?} not found.");
        }
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.encoder.draw(vertices, instances);
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.encoder.draw_indexed(indices, base_vertex, instances);
    }
}

/// The wgpu implementation of the core `CommandEncoder` trait.
pub struct WgpuCommandEncoder {
    pub(crate) encoder: Option<wgpu::CommandEncoder>,
    pub(crate) device: WgpuDevice,
}

impl CommandEncoder for WgpuCommandEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'encoder>,
    ) -> Box<dyn RenderPass<'encoder> + 'encoder> {
        // Resolve all views up front so their clones outlive the descriptor.
        let views: Vec<Option<wgpu::TextureView>> = descriptor
            .color_attachments
            .iter()
            .map(|att| {
                let view = self
                    .device
                    .get_wgpu_texture_view(att.view)
                    .map(|arc_view| (*arc_view).clone());
                if view.is_none() {
                    log::warn!(
                        "WgpuCommandEncoder: color attachment view {:?} not found; \
                         attachment skipped.",
                        att.view
                    );
                }
                view
            })
            .collect();
        let resolve_targets: Vec<Option<wgpu::TextureView>> = descriptor
            .color_attachments
            .iter()
            .map(|att| {
                att.resolve_target.and_then(|id| {
                    self.device
                        .get_wgpu_texture_view(id)
                        .map(|arc_view| (*arc_view).clone())
                })
            })
            .collect();

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = descriptor
            .color_attachments
            .iter()
            .enumerate()
            .map(|(i, att)| {
                views[i].as_ref().map(|view| wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: resolve_targets[i].as_ref(),
                    ops: wgpu::Operations {
                        load: att.ops.load.clone().into_wgpu(),
                        store: att.ops.store.into_wgpu(),
                    },
                    depth_slice: None,
                })
            })
            .collect();

        let depth_view: Option<wgpu::TextureView> =
            descriptor.depth_stencil_attachment.as_ref().and_then(|ds| {
                self.device
                    .get_wgpu_texture_view(ds.view)
                    .map(|arc_view| (*arc_view).clone())
            });

        let depth_stencil_attachment = match (&descriptor.depth_stencil_attachment, &depth_view) {
            (Some(ds), Some(view)) => Some(wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: ds.depth_ops.as_ref().map(|ops| wgpu::Operations {
                    load: ops.load.clone().into_wgpu(),
                    store: ops.store.into_wgpu(),
                }),
                stencil_ops: None,
            }),
            _ => None,
        };

        let wgpu_descriptor = wgpu::RenderPassDescriptor {
            label: descriptor.label,
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            ..Default::default()
        };

        let pass = self
            .encoder
            .as_mut()
            .expect("encoder already finished")
            .begin_render_pass(&wgpu_descriptor);

        Box::new(WgpuRenderPass {
            pass,
            device: &self.device,
        })
    }

    fn begin_compute_pass<'encoder>(
        &'encoder mut self,
        descriptor: &ComputePassDescriptor<'encoder>,
    ) -> Box<dyn ComputePass<'encoder> + 'encoder> {
        let pass = self
            .encoder
            .as_mut()
            .expect("encoder already finished")
            .begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: descriptor.label,
                timestamp_writes: None,
            });

        Box::new(WgpuComputePass {
            pass,
            device: &self.device,
        })
    }

    fn copy_buffer_to_buffer(
        &mut self,
        source: &BufferId,
        source_offset: u64,
        destination: &BufferId,
        destination_offset: u64,
        size: u64,
    ) {
        if let (Some(source_buffer), Some(destination_buffer)) = (
            self.device.get_wgpu_buffer(*source),
            self.device.get_wgpu_buffer(*destination),
        ) {
            self.encoder
                .as_mut()
                .expect("encoder already finished")
                .copy_buffer_to_buffer(
                    &source_buffer,
                    source_offset,
                    &destination_buffer,
                    destination_offset,
                    size,
                );
        } else {
            log::warn!(
                "WgpuCommandEncoder: copy_buffer_to_buffer with unknown buffer \
                 ({source:?} -> {destination:?}); copy skipped."
            );
        }
    }

    fn finish(mut self: Box<Self>) -> CommandBufferId {
        let finished_encoder = self.encoder.take().expect("encoder already finished");
        self.device
            .register_command_buffer(finished_encoder.finish())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
