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

//! The wgpu `GraphicsDevice` implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use wgpu::util::DeviceExt;

use candela_core::renderer::api::bind_group::{
    BindGroupDescriptor, BindGroupId, BindGroupLayoutDescriptor, BindGroupLayoutId,
    BindingResource,
};
use candela_core::renderer::api::buffer::{BufferDescriptor, BufferId};
use candela_core::renderer::api::command::{CommandBufferId, RenderBundleDescriptor, RenderBundleId};
use candela_core::renderer::api::pipeline::{
    ComputePipelineDescriptor, ComputePipelineId, PipelineLayoutDescriptor, PipelineLayoutId,
    RenderPipelineDescriptor, RenderPipelineId,
};
use candela_core::renderer::api::shader::{ShaderModuleDescriptor, ShaderModuleId, ShaderSourceData};
use candela_core::renderer::api::texture::{
    SamplerDescriptor, SamplerId, TextureDescriptor, TextureFormat, TextureId,
    TextureViewDescriptor, TextureViewId,
};
use candela_core::renderer::error::{PipelineError, RenderError, ResourceError, ShaderError};
use candela_core::renderer::traits::{CommandEncoder, DrawRecorder, GraphicsDevice};

use super::command::{WgpuBundleRecorder, WgpuCommandEncoder};
use super::context::WgpuGraphicsContext;
use super::conversions::IntoWgpu;

/// The internal, non-clonable state of the [`WgpuDevice`].
///
/// Every registry maps an opaque core ID to the reference-counted wgpu
/// object it stands for. Pass and bundle recorders clone the `Arc` out of
/// the registry, so destroying an ID while the GPU still uses the object is
/// safe; the object is dropped when the last recording releases it.
#[derive(Debug)]
struct WgpuDeviceInternal {
    context: Arc<Mutex<WgpuGraphicsContext>>,

    shader_modules: Mutex<HashMap<ShaderModuleId, Arc<wgpu::ShaderModule>>>,
    pipeline_layouts: Mutex<HashMap<PipelineLayoutId, Arc<wgpu::PipelineLayout>>>,
    render_pipelines: Mutex<HashMap<RenderPipelineId, Arc<wgpu::RenderPipeline>>>,
    compute_pipelines: Mutex<HashMap<ComputePipelineId, Arc<wgpu::ComputePipeline>>>,
    bind_group_layouts: Mutex<HashMap<BindGroupLayoutId, Arc<wgpu::BindGroupLayout>>>,
    bind_groups: Mutex<HashMap<BindGroupId, Arc<wgpu::BindGroup>>>,
    buffers: Mutex<HashMap<BufferId, Arc<wgpu::Buffer>>>,
    textures: Mutex<HashMap<TextureId, Arc<wgpu::Texture>>>,
    texture_views: Mutex<HashMap<TextureViewId, Arc<wgpu::TextureView>>>,
    samplers: Mutex<HashMap<SamplerId, Arc<wgpu::Sampler>>>,
    render_bundles: Mutex<HashMap<RenderBundleId, Arc<wgpu::RenderBundle>>>,

    next_shader_id: AtomicUsize,
    next_pipeline_layout_id: AtomicUsize,
    next_render_pipeline_id: AtomicUsize,
    next_compute_pipeline_id: AtomicUsize,
    next_bind_group_layout_id: AtomicUsize,
    next_bind_group_id: AtomicUsize,
    next_buffer_id: AtomicUsize,
    next_texture_id: AtomicUsize,
    next_texture_view_id: AtomicUsize,
    next_sampler_id: AtomicUsize,
    next_render_bundle_id: AtomicUsize,

    /// Command buffers that have been finished but not yet submitted.
    pending_command_buffers: Mutex<HashMap<CommandBufferId, wgpu::CommandBuffer>>,
    command_buffer_id_counter: AtomicU64,
}

/// A clonable, thread-safe handle to the wgpu graphics device.
///
/// It wraps the actual device state in an `Arc`, allowing it to be shared
/// across threads and with command encoders.
#[derive(Clone, Debug)]
pub struct WgpuDevice {
    internal: Arc<WgpuDeviceInternal>,
}

impl WgpuDevice {
    /// Wraps an initialized graphics context.
    pub fn new(context: Arc<Mutex<WgpuGraphicsContext>>) -> Self {
        Self {
            internal: Arc::new(WgpuDeviceInternal {
                context,
                shader_modules: Mutex::new(HashMap::new()),
                pipeline_layouts: Mutex::new(HashMap::new()),
                render_pipelines: Mutex::new(HashMap::new()),
                compute_pipelines: Mutex::new(HashMap::new()),
                bind_group_layouts: Mutex::new(HashMap::new()),
                bind_groups: Mutex::new(HashMap::new()),
                buffers: Mutex::new(HashMap::new()),
                textures: Mutex::new(HashMap::new()),
                texture_views: Mutex::new(HashMap::new()),
                samplers: Mutex::new(HashMap::new()),
                render_bundles: Mutex::new(HashMap::new()),
                next_shader_id: AtomicUsize::new(0),
                next_pipeline_layout_id: AtomicUsize::new(0),
                next_render_pipeline_id: AtomicUsize::new(0),
                next_compute_pipeline_id: AtomicUsize::new(0),
                next_bind_group_layout_id: AtomicUsize::new(0),
                next_bind_group_id: AtomicUsize::new(0),
                next_buffer_id: AtomicUsize::new(0),
                next_texture_id: AtomicUsize::new(0),
                next_texture_view_id: AtomicUsize::new(0),
                next_sampler_id: AtomicUsize::new(0),
                next_render_bundle_id: AtomicUsize::new(0),
                pending_command_buffers: Mutex::new(HashMap::new()),
                command_buffer_id_counter: AtomicU64::new(0),
            }),
        }
    }

    /// Creates a headless device: instance, adapter, and logical device in
    /// one blocking call.
    pub fn new_headless() -> Result<Self, RenderError> {
        let context = WgpuGraphicsContext::new_blocking()?;
        Ok(Self::new(Arc::new(Mutex::new(context))))
    }

    // --- ID generation helpers ---

    fn generate_shader_id(&self) -> ShaderModuleId {
        ShaderModuleId(self.internal.next_shader_id.fetch_add(1, Ordering::Relaxed))
    }

    fn generate_pipeline_layout_id(&self) -> PipelineLayoutId {
        PipelineLayoutId(
            self.internal
                .next_pipeline_layout_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    fn generate_render_pipeline_id(&self) -> RenderPipelineId {
        RenderPipelineId(
            self.internal
                .next_render_pipeline_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    fn generate_compute_pipeline_id(&self) -> ComputePipelineId {
        ComputePipelineId(
            self.internal
                .next_compute_pipeline_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    fn generate_bind_group_layout_id(&self) -> BindGroupLayoutId {
        BindGroupLayoutId(
            self.internal
                .next_bind_group_layout_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    fn generate_bind_group_id(&self) -> BindGroupId {
        BindGroupId(
            self.internal
                .next_bind_group_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    fn generate_buffer_id(&self) -> BufferId {
        BufferId(self.internal.next_buffer_id.fetch_add(1, Ordering::Relaxed))
    }

    fn generate_texture_id(&self) -> TextureId {
        TextureId(
            self.internal
                .next_texture_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    fn generate_texture_view_id(&self) -> TextureViewId {
        TextureViewId(
            self.internal
                .next_texture_view_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    fn generate_sampler_id(&self) -> SamplerId {
        SamplerId(
            self.internal
                .next_sampler_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    fn generate_render_bundle_id(&self) -> RenderBundleId {
        RenderBundleId(
            self.internal
                .next_render_bundle_id
                .fetch_add(1, Ordering::Relaxed),
        )
    }

    // --- Registry lookups used by pass and bundle recorders ---

    pub(crate) fn get_wgpu_render_pipeline(
        &self,
        id: RenderPipelineId,
    ) -> Option<Arc<wgpu::RenderPipeline>> {
        self.internal
            .render_pipelines
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
    }

    pub(crate) fn get_wgpu_compute_pipeline(
        &self,
        id: ComputePipelineId,
    ) -> Option<Arc<wgpu::ComputePipeline>> {
        self.internal
            .compute_pipelines
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
    }

    pub(crate) fn get_wgpu_bind_group(&self, id: BindGroupId) -> Option<Arc<wgpu::BindGroup>> {
        self.internal.bind_groups.lock().unwrap().get(&id).cloned()
    }

    pub(crate) fn get_wgpu_buffer(&self, id: BufferId) -> Option<Arc<wgpu::Buffer>> {
        self.internal.buffers.lock().unwrap().get(&id).cloned()
    }

    pub(crate) fn get_wgpu_texture_view(
        &self,
        id: TextureViewId,
    ) -> Option<Arc<wgpu::TextureView>> {
        self.internal
            .texture_views
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
    }

    pub(crate) fn get_wgpu_render_bundle(
        &self,
        id: RenderBundleId,
    ) -> Option<Arc<wgpu::RenderBundle>> {
        self.internal
            .render_bundles
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
    }

    /// Registers a view over an externally owned texture (e.g. a swapchain
    /// frame) and returns an abstract ID for it.
    pub fn register_external_texture_view(
        &self,
        texture: &wgpu::Texture,
        label: Option<&str>,
    ) -> Result<TextureViewId, ResourceError> {
        let wgpu_view = Arc::new(texture.create_view(&wgpu::TextureViewDescriptor {
            label,
            ..Default::default()
        }));
        let id = self.generate_texture_view_id();
        self.internal
            .texture_views
            .lock()
            .unwrap()
            .insert(id, wgpu_view);
        Ok(id)
    }

    /// Registers a finished wgpu command buffer, returning its abstract ID.
    pub(crate) fn register_command_buffer(&self, buffer: wgpu::CommandBuffer) -> CommandBufferId {
        let id = CommandBufferId(
            self.internal
                .command_buffer_id_counter
                .fetch_add(1, Ordering::SeqCst),
        );
        self.internal
            .pending_command_buffers
            .lock()
            .unwrap()
            .insert(id, buffer);
        id
    }

    /// Polls the underlying device in a blocking manner.
    ///
    /// Used during shutdown so all pending submissions complete before
    /// resources are destroyed.
    pub fn poll_device_blocking(&self) {
        let context = self.internal.context.lock().unwrap();
        if let Err(e) = context.device.poll(wgpu::PollType::Wait) {
            log::warn!("Failed to poll device during shutdown: {e:?}");
        }
    }
}

impl GraphicsDevice for WgpuDevice {
    // --- Shaders ---

    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ShaderError> {
        let wgpu_source = match &descriptor.source {
            ShaderSourceData::Wgsl(cow_str) => wgpu::ShaderSource::Wgsl(cow_str.clone()),
        };

        let context = self.internal.context.lock().unwrap();
        let wgpu_module = Arc::new(context.device.create_shader_module(
            wgpu::ShaderModuleDescriptor {
                label: descriptor.label,
                source: wgpu_source,
            },
        ));
        drop(context);

        let id = self.generate_shader_id();
        self.internal
            .shader_modules
            .lock()
            .unwrap()
            .insert(id, wgpu_module);

        log::info!(
            "WgpuDevice: Created shader module '{}' with ID: {id:?}",
            descriptor.label.unwrap_or_default()
        );
        Ok(id)
    }

    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ShaderError> {
        if self
            .internal
            .shader_modules
            .lock()
            .unwrap()
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed shader module with ID: {id:?}");
            Ok(())
        } else {
            Err(ShaderError::NotFound { id })
        }
    }

    // --- Pipelines ---

    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, PipelineError> {
        let layouts_guard = self.internal.bind_group_layouts.lock().unwrap();
        let mut wgpu_layouts: Vec<Arc<wgpu::BindGroupLayout>> = Vec::new();
        for layout_id in descriptor.bind_group_layouts {
            let layout = layouts_guard.get(layout_id).ok_or_else(|| {
                PipelineError::LayoutCreationFailed(format!(
                    "Unknown bind group layout {layout_id:?} in pipeline layout '{}'",
                    descriptor.label.unwrap_or_default()
                ))
            })?;
            wgpu_layouts.push(Arc::clone(layout));
        }
        drop(layouts_guard);

        let layout_refs: Vec<&wgpu::BindGroupLayout> =
            wgpu_layouts.iter().map(|l| l.as_ref()).collect();

        let context = self.internal.context.lock().unwrap();
        let wgpu_layout = Arc::new(context.device.create_pipeline_layout(
            &wgpu::PipelineLayoutDescriptor {
                label: descriptor.label,
                bind_group_layouts: &layout_refs,
                push_constant_ranges: &[],
            },
        ));
        drop(context);

        let id = self.generate_pipeline_layout_id();
        self.internal
            .pipeline_layouts
            .lock()
            .unwrap()
            .insert(id, wgpu_layout);

        log::debug!(
            "WgpuDevice: Created pipeline layout '{}' with ID: {id:?}",
            descriptor.label.unwrap_or_default()
        );
        Ok(id)
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, PipelineError> {
        let shader_modules = self.internal.shader_modules.lock().unwrap();
        let vs_module = shader_modules
            .get(&descriptor.vertex_shader)
            .cloned()
            .ok_or_else(|| PipelineError::InvalidShaderModuleForPipeline {
                id: descriptor.vertex_shader,
                pipeline_label: descriptor.label.as_deref().map(String::from),
            })?;
        let fs_module = match descriptor.fragment_shader {
            Some(fs_id) => Some(shader_modules.get(&fs_id).cloned().ok_or_else(|| {
                PipelineError::InvalidShaderModuleForPipeline {
                    id: fs_id,
                    pipeline_label: descriptor.label.as_deref().map(String::from),
                }
            })?),
            None => None,
        };
        drop(shader_modules);

        let layout = self
            .internal
            .pipeline_layouts
            .lock()
            .unwrap()
            .get(&descriptor.layout)
            .cloned()
            .ok_or_else(|| {
                PipelineError::LayoutCreationFailed(format!(
                    "Unknown pipeline layout {:?} for pipeline '{}'",
                    descriptor.layout,
                    descriptor.label.as_deref().unwrap_or_default()
                ))
            })?;

        // Attribute storage must outlive the wgpu vertex buffer layouts that
        // reference it.
        let attribute_storage: Vec<Vec<wgpu::VertexAttribute>> = descriptor
            .vertex_buffers
            .iter()
            .map(|vb| {
                vb.attributes
                    .iter()
                    .map(|attr| wgpu::VertexAttribute {
                        format: attr.format.into_wgpu(),
                        offset: attr.offset,
                        shader_location: attr.shader_location,
                    })
                    .collect()
            })
            .collect();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = descriptor
            .vertex_buffers
            .iter()
            .zip(attribute_storage.iter())
            .map(|(vb, attributes)| wgpu::VertexBufferLayout {
                array_stride: vb.array_stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect();

        let primitive = wgpu::PrimitiveState {
            topology: descriptor.primitive.topology.into_wgpu(),
            front_face: descriptor.primitive.front_face.into_wgpu(),
            cull_mode: descriptor.primitive.cull_mode.into_wgpu(),
            ..Default::default()
        };

        let depth_stencil = descriptor
            .depth_stencil
            .as_ref()
            .map(|ds| wgpu::DepthStencilState {
                format: ds.format.into_wgpu(),
                depth_write_enabled: ds.depth_write_enabled,
                depth_compare: ds.depth_compare.into_wgpu(),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            });

        let color_targets: Vec<Option<wgpu::ColorTargetState>> = descriptor
            .color_targets
            .iter()
            .map(|ct| {
                Some(wgpu::ColorTargetState {
                    format: ct.format.into_wgpu(),
                    blend: None,
                    write_mask: ct.write_mask.into_wgpu(),
                })
            })
            .collect();

        let context = self.internal.context.lock().unwrap();
        let wgpu_pipeline = Arc::new(context.device.create_render_pipeline(
            &wgpu::RenderPipelineDescriptor {
                label: descriptor.label.as_deref(),
                layout: Some(layout.as_ref()),
                vertex: wgpu::VertexState {
                    module: vs_module.as_ref(),
                    entry_point: Some(descriptor.vertex_entry_point.as_ref()),
                    buffers: &vertex_buffers,
                    compilation_options: Default::default(),
                },
                fragment: match (&fs_module, &descriptor.fragment_entry_point) {
                    (Some(module), Some(entry_point)) => Some(wgpu::FragmentState {
                        module: module.as_ref(),
                        entry_point: Some(entry_point.as_ref()),
                        targets: &color_targets,
                        compilation_options: Default::default(),
                    }),
                    (Some(_), None) => {
                        return Err(PipelineError::CompilationFailed {
                            label: descriptor.label.as_deref().map(String::from),
                            details: "Fragment shader provided without an entry point".to_string(),
                        });
                    }
                    _ => None,
                },
                primitive,
                depth_stencil,
                multisample: wgpu::MultisampleState {
                    count: descriptor.sample_count,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            },
        ));
        drop(context);

        let id = self.generate_render_pipeline_id();
        self.internal
            .render_pipelines
            .lock()
            .unwrap()
            .insert(id, wgpu_pipeline);

        log::info!(
            "WgpuDevice: Created render pipeline '{}' with ID: {id:?}",
            descriptor.label.as_deref().unwrap_or_default()
        );
        Ok(id)
    }

    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), PipelineError> {
        if self
            .internal
            .render_pipelines
            .lock()
            .unwrap()
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed render pipeline with ID: {id:?}");
            Ok(())
        } else {
            Err(PipelineError::InvalidRenderPipeline { id })
        }
    }

    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor,
    ) -> Result<ComputePipelineId, PipelineError> {
        let module = self
            .internal
            .shader_modules
            .lock()
            .unwrap()
            .get(&descriptor.shader)
            .cloned()
            .ok_or_else(|| PipelineError::InvalidShaderModuleForPipeline {
                id: descriptor.shader,
                pipeline_label: descriptor.label.as_deref().map(String::from),
            })?;
        let layout = self
            .internal
            .pipeline_layouts
            .lock()
            .unwrap()
            .get(&descriptor.layout)
            .cloned()
            .ok_or_else(|| {
                PipelineError::LayoutCreationFailed(format!(
                    "Unknown pipeline layout {:?} for compute pipeline '{}'",
                    descriptor.layout,
                    descriptor.label.as_deref().unwrap_or_default()
                ))
            })?;

        let context = self.internal.context.lock().unwrap();
        let wgpu_pipeline = Arc::new(context.device.create_compute_pipeline(
            &wgpu::ComputePipelineDescriptor {
                label: descriptor.label.as_deref(),
                layout: Some(layout.as_ref()),
                module: module.as_ref(),
                entry_point: Some(descriptor.entry_point.as_ref()),
                compilation_options: Default::default(),
                cache: None,
            },
        ));
        drop(context);

        let id = self.generate_compute_pipeline_id();
        self.internal
            .compute_pipelines
            .lock()
            .unwrap()
            .insert(id, wgpu_pipeline);

        log::info!(
            "WgpuDevice: Created compute pipeline '{}' with ID: {id:?}",
            descriptor.label.as_deref().unwrap_or_default()
        );
        Ok(id)
    }

    fn destroy_compute_pipeline(&self, id: ComputePipelineId) -> Result<(), PipelineError> {
        if self
            .internal
            .compute_pipelines
            .lock()
            .unwrap()
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed compute pipeline with ID: {id:?}");
            Ok(())
        } else {
            Err(PipelineError::LayoutCreationFailed(format!(
                "Unknown compute pipeline {id:?}"
            )))
        }
    }

    // --- Bind groups ---

    fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError> {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = descriptor
            .entries
            .iter()
            .map(|entry| wgpu::BindGroupLayoutEntry {
                binding: entry.binding,
                visibility: entry.visibility.into_wgpu(),
                ty: entry.ty.clone().into_wgpu(),
                count: None,
            })
            .collect();

        let context = self.internal.context.lock().unwrap();
        let wgpu_layout = Arc::new(context.device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: descriptor.label,
                entries: &entries,
            },
        ));
        drop(context);

        let id = self.generate_bind_group_layout_id();
        self.internal
            .bind_group_layouts
            .lock()
            .unwrap()
            .insert(id, wgpu_layout);

        log::debug!(
            "WgpuDevice: Created bind group layout '{}' with ID: {id:?}",
            descriptor.label.unwrap_or_default()
        );
        Ok(id)
    }

    fn destroy_bind_group_layout(&self, id: BindGroupLayoutId) -> Result<(), ResourceError> {
        if self
            .internal
            .bind_group_layouts
            .lock()
            .unwrap()
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed bind group layout with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn create_bind_group(
        &self,
        descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError> {
        let layout = self
            .internal
            .bind_group_layouts
            .lock()
            .unwrap()
            .get(&descriptor.layout)
            .cloned()
            .ok_or(ResourceError::NotFound)?;

        // Resolve every bound resource first so the Arcs stay alive while
        // the wgpu entries borrow them.
        enum Resolved {
            Buffer(Arc<wgpu::Buffer>, u64, Option<std::num::NonZeroU64>),
            TextureView(Arc<wgpu::TextureView>),
            Sampler(Arc<wgpu::Sampler>),
        }

        let mut resolved: Vec<(u32, Resolved)> = Vec::with_capacity(descriptor.entries.len());
        for entry in descriptor.entries {
            let resource = match entry.resource {
                BindingResource::Buffer(binding) => {
                    let buffer = self
                        .get_wgpu_buffer(binding.buffer)
                        .ok_or(ResourceError::NotFound)?;
                    Resolved::Buffer(buffer, binding.offset, binding.size)
                }
                BindingResource::TextureView(view_id) => Resolved::TextureView(
                    self.get_wgpu_texture_view(view_id)
                        .ok_or(ResourceError::NotFound)?,
                ),
                BindingResource::Sampler(sampler_id) => Resolved::Sampler(
                    self.internal
                        .samplers
                        .lock()
                        .unwrap()
                        .get(&sampler_id)
                        .cloned()
                        .ok_or(ResourceError::NotFound)?,
                ),
            };
            resolved.push((entry.binding, resource));
        }

        let entries: Vec<wgpu::BindGroupEntry> = resolved
            .iter()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: match resource {
                    Resolved::Buffer(buffer, offset, size) => {
                        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: buffer.as_ref(),
                            offset: *offset,
                            size: *size,
                        })
                    }
                    Resolved::TextureView(view) => {
                        wgpu::BindingResource::TextureView(view.as_ref())
                    }
                    Resolved::Sampler(sampler) => wgpu::BindingResource::Sampler(sampler.as_ref()),
                },
            })
            .collect();

        let context = self.internal.context.lock().unwrap();
        let wgpu_bind_group =
            Arc::new(context.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: descriptor.label,
                layout: layout.as_ref(),
                entries: &entries,
            }));
        drop(context);

        let id = self.generate_bind_group_id();
        self.internal
            .bind_groups
            .lock()
            .unwrap()
            .insert(id, wgpu_bind_group);

        log::debug!(
            "WgpuDevice: Created bind group '{}' with ID: {id:?}",
            descriptor.label.unwrap_or_default()
        );
        Ok(id)
    }

    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError> {
        if self
            .internal
            .bind_groups
            .lock()
            .unwrap()
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed bind group with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    // --- Buffers ---

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let context = self.internal.context.lock().unwrap();
        let wgpu_buffer = Arc::new(context.device.create_buffer(&wgpu::BufferDescriptor {
            label: descriptor.label.as_deref(),
            size: descriptor.size,
            usage: descriptor.usage.into_wgpu(),
            mapped_at_creation: descriptor.mapped_at_creation,
        }));
        drop(context);

        let id = self.generate_buffer_id();
        self.internal.buffers.lock().unwrap().insert(id, wgpu_buffer);

        log::info!(
            "WgpuDevice: Created buffer '{}' with ID: {id:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            descriptor.size
        );
        Ok(id)
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let context = self.internal.context.lock().unwrap();
        let wgpu_buffer = Arc::new(context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: descriptor.label.as_deref(),
                contents: data,
                usage: descriptor.usage.into_wgpu(),
            },
        ));
        drop(context);

        let id = self.generate_buffer_id();
        self.internal.buffers.lock().unwrap().insert(id, wgpu_buffer);

        log::info!(
            "WgpuDevice: Created buffer '{}' with initial data. ID: {id:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            data.len()
        );
        Ok(id)
    }

    fn write_buffer(&self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let wgpu_buffer = self.get_wgpu_buffer(buffer).ok_or(ResourceError::NotFound)?;

        let end_offset = offset + data.len() as u64;
        if end_offset > wgpu_buffer.size() {
            return Err(ResourceError::BackendError(format!(
                "Write of {} bytes at offset {offset} overruns buffer {buffer:?} ({} bytes)",
                data.len(),
                wgpu_buffer.size()
            )));
        }

        let context = self.internal.context.lock().unwrap();
        context.queue.write_buffer(&wgpu_buffer, offset, data);
        Ok(())
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        if self.internal.buffers.lock().unwrap().remove(&id).is_some() {
            log::debug!("WgpuDevice: Destroyed buffer with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    // --- Textures ---

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let context = self.internal.context.lock().unwrap();
        let wgpu_texture = Arc::new(context.device.create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label.as_deref(),
            size: descriptor.size.into_wgpu(),
            mip_level_count: descriptor.mip_level_count,
            sample_count: descriptor.sample_count,
            dimension: descriptor.dimension.into_wgpu(),
            format: descriptor.format.into_wgpu(),
            usage: descriptor.usage.into_wgpu(),
            view_formats: &[],
        }));
        drop(context);

        let id = self.generate_texture_id();
        self.internal
            .textures
            .lock()
            .unwrap()
            .insert(id, wgpu_texture);

        log::info!(
            "WgpuDevice: Created texture '{}' with ID: {id:?} ({}x{})",
            descriptor.label.as_deref().unwrap_or_default(),
            descriptor.size.width,
            descriptor.size.height
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        if self.internal.textures.lock().unwrap().remove(&id).is_some() {
            log::debug!("WgpuDevice: Destroyed texture with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn create_texture_view(
        &self,
        texture: TextureId,
        descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        let wgpu_texture = self
            .internal
            .textures
            .lock()
            .unwrap()
            .get(&texture)
            .cloned()
            .ok_or(ResourceError::NotFound)?;

        let wgpu_view = Arc::new(wgpu_texture.create_view(&wgpu::TextureViewDescriptor {
            label: descriptor.label.as_deref(),
            format: descriptor.format.map(|f| f.into_wgpu()),
            dimension: descriptor.dimension.map(|d| d.into_wgpu()),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: descriptor.base_mip_level,
            mip_level_count: descriptor.mip_level_count,
            base_array_layer: descriptor.base_array_layer,
            array_layer_count: descriptor.array_layer_count,
            usage: None,
        }));

        let id = self.generate_texture_view_id();
        self.internal
            .texture_views
            .lock()
            .unwrap()
            .insert(id, wgpu_view);

        log::debug!("WgpuDevice: Created texture view {id:?} for texture {texture:?}");
        Ok(id)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        if self
            .internal
            .texture_views
            .lock()
            .unwrap()
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed texture view with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let context = self.internal.context.lock().unwrap();
        let wgpu_sampler = Arc::new(context.device.create_sampler(&wgpu::SamplerDescriptor {
            label: descriptor.label.as_deref(),
            address_mode_u: descriptor.address_mode_u.into_wgpu(),
            address_mode_v: descriptor.address_mode_v.into_wgpu(),
            address_mode_w: descriptor.address_mode_w.into_wgpu(),
            mag_filter: descriptor.mag_filter.into_wgpu(),
            min_filter: descriptor.min_filter.into_wgpu(),
            mipmap_filter: descriptor.mipmap_filter.into_wgpu(),
            ..Default::default()
        }));
        drop(context);

        let id = self.generate_sampler_id();
        self.internal
            .samplers
            .lock()
            .unwrap()
            .insert(id, wgpu_sampler);

        log::debug!(
            "WgpuDevice: Created sampler '{}' with ID: {id:?}",
            descriptor.label.as_deref().unwrap_or_default()
        );
        Ok(id)
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        if self.internal.samplers.lock().unwrap().remove(&id).is_some() {
            log::debug!("WgpuDevice: Destroyed sampler with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    // --- Commands ---

    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder> {
        let context = self.internal.context.lock().unwrap();
        let encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label });

        Box::new(WgpuCommandEncoder {
            encoder: Some(encoder),
            device: self.clone(),
        })
    }

    fn record_render_bundle(
        &self,
        descriptor: &RenderBundleDescriptor,
        record: &mut dyn FnMut(&mut dyn DrawRecorder),
    ) -> Result<RenderBundleId, ResourceError> {
        let color_formats: Vec<Option<wgpu::TextureFormat>> = descriptor
            .color_formats
            .iter()
            .map(|format| Some(format.into_wgpu()))
            .collect();
        let depth_stencil =
            descriptor
                .depth_stencil_format
                .map(|format| wgpu::RenderBundleDepthStencil {
                    format: format.into_wgpu(),
                    depth_read_only: false,
                    stencil_read_only: false,
                });

        // The bundle encoder borrows the wgpu device, so the context stays
        // locked for the whole recording. The callback only touches the
        // resource registries, which use their own locks.
        let context = self.internal.context.lock().unwrap();
        let encoder = context.device.create_render_bundle_encoder(
            &wgpu::RenderBundleEncoderDescriptor {
                label: descriptor.label,
                color_formats: &color_formats,
                depth_stencil,
                sample_count: descriptor.sample_count,
                ..Default::default()
            },
        );

        let pipelines = self.internal.render_pipelines.lock().unwrap();
        let buffers = self.internal.buffers.lock().unwrap();
        let mut recorder = WgpuBundleRecorder {
            encoder,
            device: self,
            pipelines: &pipelines,
            buffers: &buffers,
        };
        record(&mut recorder);

        let bundle = recorder.encoder.finish(&wgpu::RenderBundleDescriptor {
            label: descriptor.label,
        });
        drop(context);

        let id = self.generate_render_bundle_id();
        self.internal
            .render_bundles
            .lock()
            .unwrap()
            .insert(id, Arc::new(bundle));

        log::info!(
            "WgpuDevice: Recorded render bundle '{}' with ID: {id:?}",
            descriptor.label.unwrap_or_default()
        );
        Ok(id)
    }

    fn destroy_render_bundle(&self, id: RenderBundleId) -> Result<(), ResourceError> {
        if self
            .internal
            .render_bundles
            .lock()
            .unwrap()
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed render bundle with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn submit_command_buffer(&self, id: CommandBufferId) -> Result<(), RenderError> {
        let buffer = self
            .internal
            .pending_command_buffers
            .lock()
            .unwrap()
            .remove(&id)
            .ok_or_else(|| {
                RenderError::Internal(format!(
                    "Attempted to submit unknown command buffer {id:?}"
                ))
            })?;

        let context = self.internal.context.lock().unwrap();
        context.queue.submit(std::iter::once(buffer));
        Ok(())
    }

    // --- Capabilities ---

    fn get_surface_format(&self) -> Option<TextureFormat> {
        self.internal
            .context
            .lock()
            .unwrap()
            .presentation_format
    }

    fn supports_feature(&self, name: &str) -> bool {
        let context = self.internal.context.lock().unwrap();
        match name {
            "gpu_timestamps" => context
                .active_device_features
                .contains(wgpu::Features::TIMESTAMP_QUERY),
            "texture_compression_bc" => context
                .active_device_features
                .contains(wgpu::Features::TEXTURE_COMPRESSION_BC),
            _ => {
                log::warn!("WgpuDevice: Unknown feature name in supports_feature: {name}");
                false
            }
        }
    }
}
