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

use candela_core::math::Extent2D;
use candela_core::renderer::api::*;
use candela_core::renderer::cluster::LightClusteringStage;
use candela_core::renderer::error::{
    PipelineError, RenderError, ResourceError, ShaderError,
};
use candela_core::renderer::gbuffer::GBufferLayout;
use candela_core::renderer::traits::{
    CommandEncoder, ComputePass, DrawRecorder, GraphicsDevice, RenderPass,
};
use candela_lanes::deferred_lane::{
    ClusteredDeferredLane, DeferredConfig, FrameOutcome, FrameStats, GeometryStrategy,
    SurfaceProvider,
};
use std::any::Any;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One GPU command observed by the recording device.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    BeginComputePass {
        label: Option<String>,
    },
    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },
    BeginRenderPass {
        label: Option<String>,
        color_attachments: Vec<TextureViewId>,
        color_cleared: bool,
        color_cleared_to_zero_alpha: bool,
        has_depth: bool,
        depth_cleared_to_one: bool,
    },
    SetRenderPipeline(RenderPipelineId),
    SetComputePipeline(ComputePipelineId),
    SetBindGroup {
        index: u32,
        bind_group: BindGroupId,
    },
    SetVertexBuffer {
        slot: u32,
        buffer: BufferId,
    },
    SetIndexBuffer {
        buffer: BufferId,
    },
    DrawIndexed {
        index_count: u32,
    },
    Draw {
        vertex_count: u32,
    },
    ExecuteBundle(RenderBundleId),
    Submit(CommandBufferId),
}

/// A `GraphicsDevice` that hands out sequential IDs and records every
/// command it sees, so tests can assert on the exact command stream.
#[derive(Debug, Default)]
struct RecordingDevice {
    commands: Arc<Mutex<Vec<Command>>>,
    bundles: Mutex<HashMap<usize, Vec<Command>>>,
    bundles_destroyed: Mutex<Vec<RenderBundleId>>,
    bind_group_labels: Mutex<Vec<String>>,
    buffer_writes: Mutex<Vec<(BufferId, u64, usize)>>,
    next_id: AtomicUsize,
    textures_created: AtomicUsize,
    textures_destroyed: AtomicUsize,
    bundles_recorded: AtomicUsize,
}

impl RecordingDevice {
    fn alloc(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }

    fn clear_commands(&self) {
        self.commands.lock().unwrap().clear();
    }

    fn bundle_contents(&self, id: RenderBundleId) -> Vec<Command> {
        self.bundles.lock().unwrap().get(&id.0).unwrap().clone()
    }

    fn cluster_bind_group_count(&self) -> usize {
        self.bind_group_labels
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.as_str() == "deferred_cluster_lights_bind_group")
            .count()
    }
}

struct RecordingRenderPass {
    commands: Arc<Mutex<Vec<Command>>>,
}

impl DrawRecorder for RecordingRenderPass {
    fn set_pipeline(&mut self, pipeline: &RenderPipelineId) {
        self.commands
            .lock()
            .unwrap()
            .push(Command::SetRenderPipeline(*pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: &BindGroupId) {
        self.commands.lock().unwrap().push(Command::SetBindGroup {
            index,
            bind_group: *bind_group,
        });
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &BufferId, _offset: u64) {
        self.commands.lock().unwrap().push(Command::SetVertexBuffer {
            slot,
            buffer: *buffer,
        });
    }

    fn set_index_buffer(&mut self, buffer: &BufferId, _offset: u64, _index_format: IndexFormat) {
        self.commands
            .lock()
            .unwrap()
            .push(Command::SetIndexBuffer { buffer: *buffer });
    }

    fn draw(&mut self, vertices: Range<u32>, _instances: Range<u32>) {
        self.commands.lock().unwrap().push(Command::Draw {
            vertex_count: vertices.end - vertices.start,
        });
    }

    fn draw_indexed(&mut self, indices: Range<u32>, _base_vertex: i32, _instances: Range<u32>) {
        self.commands.lock().unwrap().push(Command::DrawIndexed {
            index_count: indices.end - indices.start,
        });
    }
}

impl RenderPass<'_> for RecordingRenderPass {
    fn execute_bundle(&mut self, bundle: &RenderBundleId) {
        self.commands
            .lock()
            .unwrap()
            .push(Command::ExecuteBundle(*bundle));
    }
}

struct RecordingComputePass {
    commands: Arc<Mutex<Vec<Command>>>,
}

impl ComputePass<'_> for RecordingComputePass {
    fn set_pipeline(&mut self, pipeline: &ComputePipelineId) {
        self.commands
            .lock()
            .unwrap()
            .push(Command::SetComputePipeline(*pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: &BindGroupId) {
        self.commands.lock().unwrap().push(Command::SetBindGroup {
            index,
            bind_group: *bind_group,
        });
    }

    fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32) {
        self.commands
            .lock()
            .unwrap()
            .push(Command::Dispatch { x, y, z });
    }
}

struct RecordingEncoder {
    commands: Arc<Mutex<Vec<Command>>>,
    id: u64,
}

impl CommandEncoder for RecordingEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'encoder>,
    ) -> Box<dyn RenderPass<'encoder> + 'encoder> {
        self.commands.lock().unwrap().push(Command::BeginRenderPass {
            label: descriptor.label.map(str::to_owned),
            color_attachments: descriptor
                .color_attachments
                .iter()
                .map(|a| a.view)
                .collect(),
            color_cleared: descriptor
                .color_attachments
                .iter()
                .all(|a| matches!(a.ops.load, LoadOp::Clear(_))),
            color_cleared_to_zero_alpha: descriptor
                .color_attachments
                .iter()
                .all(|a| matches!(a.ops.load, LoadOp::Clear(c) if c.a == 0.0)),
            has_depth: descriptor.depth_stencil_attachment.is_some(),
            depth_cleared_to_one: descriptor
                .depth_stencil_attachment
                .as_ref()
                .and_then(|d| d.depth_ops.as_ref())
                .map(|ops| matches!(ops.load, LoadOp::Clear(v) if v == 1.0))
                .unwrap_or(false),
        });
        Box::new(RecordingRenderPass {
            commands: self.commands.clone(),
        })
    }

    fn begin_compute_pass<'encoder>(
        &'encoder mut self,
        descriptor: &ComputePassDescriptor<'encoder>,
    ) -> Box<dyn ComputePass<'encoder> + 'encoder> {
        self.commands.lock().unwrap().push(Command::BeginComputePass {
            label: descriptor.label.map(str::to_owned),
        });
        Box::new(RecordingComputePass {
            commands: self.commands.clone(),
        })
    }

    fn copy_buffer_to_buffer(
        &mut self,
        _source: &BufferId,
        _source_offset: u64,
        _destination: &BufferId,
        _destination_offset: u64,
        _size: u64,
    ) {
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        CommandBufferId(self.id)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Records draws destined for a render bundle into a private list.
struct BundleRecorder {
    commands: Vec<Command>,
}

impl DrawRecorder for BundleRecorder {
    fn set_pipeline(&mut self, pipeline: &RenderPipelineId) {
        self.commands.push(Command::SetRenderPipeline(*pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: &BindGroupId) {
        self.commands.push(Command::SetBindGroup {
            index,
            bind_group: *bind_group,
        });
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &BufferId, _offset: u64) {
        self.commands.push(Command::SetVertexBuffer {
            slot,
            buffer: *buffer,
        });
    }

    fn set_index_buffer(&mut self, buffer: &BufferId, _offset: u64, _index_format: IndexFormat) {
        self.commands.push(Command::SetIndexBuffer { buffer: *buffer });
    }

    fn draw(&mut self, vertices: Range<u32>, _instances: Range<u32>) {
        self.commands.push(Command::Draw {
            vertex_count: vertices.end - vertices.start,
        });
    }

    fn draw_indexed(&mut self, indices: Range<u32>, _base_vertex: i32, _instances: Range<u32>) {
        self.commands.push(Command::DrawIndexed {
            index_count: indices.end - indices.start,
        });
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_shader_module(
        &self,
        _descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ShaderError> {
        Ok(ShaderModuleId(self.alloc()))
    }

    fn destroy_shader_module(&self, _id: ShaderModuleId) -> Result<(), ShaderError> {
        Ok(())
    }

    fn create_pipeline_layout(
        &self,
        _descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, PipelineError> {
        Ok(PipelineLayoutId(self.alloc()))
    }

    fn create_render_pipeline(
        &self,
        _descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, PipelineError> {
        Ok(RenderPipelineId(self.alloc()))
    }

    fn destroy_render_pipeline(&self, _id: RenderPipelineId) -> Result<(), PipelineError> {
        Ok(())
    }

    fn create_compute_pipeline(
        &self,
        _descriptor: &ComputePipelineDescriptor,
    ) -> Result<ComputePipelineId, PipelineError> {
        Ok(ComputePipelineId(self.alloc()))
    }

    fn destroy_compute_pipeline(&self, _id: ComputePipelineId) -> Result<(), PipelineError> {
        Ok(())
    }

    fn create_bind_group_layout(
        &self,
        _descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError> {
        Ok(BindGroupLayoutId(self.alloc()))
    }

    fn destroy_bind_group_layout(&self, _id: BindGroupLayoutId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_bind_group(
        &self,
        descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError> {
        self.bind_group_labels
            .lock()
            .unwrap()
            .push(descriptor.label.unwrap_or("").to_owned());
        Ok(BindGroupId(self.alloc()))
    }

    fn destroy_bind_group(&self, _id: BindGroupId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_buffer(&self, _descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        Ok(BufferId(self.alloc()))
    }

    fn create_buffer_with_data(
        &self,
        _descriptor: &BufferDescriptor,
        _data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        Ok(BufferId(self.alloc()))
    }

    fn write_buffer(
        &self,
        buffer: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        self.buffer_writes
            .lock()
            .unwrap()
            .push((buffer, offset, data.len()));
        Ok(())
    }

    fn destroy_buffer(&self, _id: BufferId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_texture(&self, _descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        self.textures_created.fetch_add(1, Ordering::SeqCst);
        Ok(TextureId(self.alloc()))
    }

    fn destroy_texture(&self, _id: TextureId) -> Result<(), ResourceError> {
        self.textures_destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn create_texture_view(
        &self,
        _texture: TextureId,
        _descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        Ok(TextureViewId(self.alloc()))
    }

    fn destroy_texture_view(&self, _id: TextureViewId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_sampler(&self, _descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        Ok(SamplerId(self.alloc()))
    }

    fn destroy_sampler(&self, _id: SamplerId) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_command_encoder(&self, _label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(RecordingEncoder {
            commands: self.commands.clone(),
            id: self.alloc() as u64,
        })
    }

    fn record_render_bundle(
        &self,
        _descriptor: &RenderBundleDescriptor,
        record: &mut dyn FnMut(&mut dyn DrawRecorder),
    ) -> Result<RenderBundleId, ResourceError> {
        self.bundles_recorded.fetch_add(1, Ordering::SeqCst);
        let mut recorder = BundleRecorder {
            commands: Vec::new(),
        };
        record(&mut recorder);
        let id = self.alloc();
        self.bundles.lock().unwrap().insert(id, recorder.commands);
        Ok(RenderBundleId(id))
    }

    fn destroy_render_bundle(&self, id: RenderBundleId) -> Result<(), ResourceError> {
        self.bundles_destroyed.lock().unwrap().push(id);
        Ok(())
    }

    fn submit_command_buffer(&self, id: CommandBufferId) -> Result<(), RenderError> {
        self.commands.lock().unwrap().push(Command::Submit(id));
        Ok(())
    }

    fn get_surface_format(&self) -> Option<TextureFormat> {
        Some(TextureFormat::Bgra8UnormSrgb)
    }

    fn supports_feature(&self, _name: &str) -> bool {
        false
    }
}

/// Clustering stage that records a compute pass and hands back a fixed (or
/// per-frame) cluster buffer.
struct TestClustering {
    buffers: Vec<BufferId>,
    frame: usize,
}

impl TestClustering {
    fn with_buffer(buffer: BufferId) -> Self {
        Self {
            buffers: vec![buffer],
            frame: 0,
        }
    }

    fn with_buffers(buffers: Vec<BufferId>) -> Self {
        Self { buffers, frame: 0 }
    }
}

impl LightClusteringStage for TestClustering {
    fn run(
        &mut self,
        _device: &dyn GraphicsDevice,
        encoder: &mut dyn CommandEncoder,
    ) -> Result<BufferId, RenderError> {
        {
            let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
                label: Some("light_clustering"),
            });
            pass.set_pipeline(&ComputePipelineId(9000));
            pass.dispatch_workgroups(16, 9, 24);
        }
        let buffer = self.buffers[self.frame.min(self.buffers.len() - 1)];
        self.frame += 1;
        Ok(buffer)
    }
}

struct TestSurface {
    view: TextureViewId,
    fail: bool,
}

impl SurfaceProvider for TestSurface {
    fn acquire(&mut self) -> Result<TextureViewId, RenderError> {
        if self.fail {
            Err(RenderError::SurfaceAcquisitionFailed(
                "swapchain outdated".to_string(),
            ))
        } else {
            Ok(self.view)
        }
    }
}

fn test_scene() -> RenderScene {
    let mut scene = RenderScene::new();
    scene.push_node(SceneNode {
        bind_group: BindGroupId(500),
        materials: vec![
            SceneMaterial {
                bind_group: BindGroupId(600),
                primitives: vec![
                    ScenePrimitive {
                        vertex_buffer: BufferId(700),
                        index_buffer: BufferId(701),
                        index_count: 36,
                    },
                    ScenePrimitive {
                        vertex_buffer: BufferId(702),
                        index_buffer: BufferId(703),
                        index_count: 6,
                    },
                ],
            },
            SceneMaterial {
                bind_group: BindGroupId(601),
                primitives: vec![ScenePrimitive {
                    vertex_buffer: BufferId(704),
                    index_buffer: BufferId(705),
                    index_count: 12,
                }],
            },
        ],
    });
    scene.push_node(SceneNode {
        bind_group: BindGroupId(501),
        materials: vec![SceneMaterial {
            bind_group: BindGroupId(602),
            primitives: vec![ScenePrimitive {
                vertex_buffer: BufferId(706),
                index_buffer: BufferId(707),
                index_count: 3,
            }],
        }],
    });
    scene
}

fn make_lane(
    config: DeferredConfig,
) -> (Arc<RecordingDevice>, ClusteredDeferredLane) {
    let device = Arc::new(RecordingDevice::default());
    let lane = ClusteredDeferredLane::new(device.clone(), config, Extent2D::new(1920, 1080))
        .expect("lane construction");
    (device, lane)
}

fn pass_label_positions(commands: &[Command]) -> (usize, usize, usize, usize) {
    let compute = commands
        .iter()
        .position(|c| matches!(c, Command::BeginComputePass { .. }))
        .expect("compute pass");
    let geometry = commands
        .iter()
        .position(
            |c| matches!(c, Command::BeginRenderPass { label: Some(l), .. } if l == "deferred_geometry_pass"),
        )
        .expect("geometry pass");
    let shading = commands
        .iter()
        .position(
            |c| matches!(c, Command::BeginRenderPass { label: Some(l), .. } if l == "deferred_shading_pass"),
        )
        .expect("shading pass");
    let submit = commands
        .iter()
        .position(|c| matches!(c, Command::Submit(_)))
        .expect("submit");
    (compute, geometry, shading, submit)
}

/// Draw-recorder commands between two stream positions.
fn draw_commands(commands: &[Command], range: Range<usize>) -> Vec<Command> {
    commands[range]
        .iter()
        .filter(|c| {
            matches!(
                c,
                Command::SetRenderPipeline(_)
                    | Command::SetBindGroup { .. }
                    | Command::SetVertexBuffer { .. }
                    | Command::SetIndexBuffer { .. }
                    | Command::DrawIndexed { .. }
                    | Command::Draw { .. }
            )
        })
        .cloned()
        .collect()
}

#[test]
fn frame_runs_cluster_geometry_shading_then_one_submit() {
    let (device, mut lane) = make_lane(DeferredConfig::default());
    device.clear_commands();

    let scene = test_scene();
    let mut clustering = TestClustering::with_buffer(BufferId(800));
    let mut surface = TestSurface {
        view: TextureViewId(900),
        fail: false,
    };

    let outcome = lane
        .render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();
    assert!(matches!(outcome, FrameOutcome::Rendered(_)));

    let commands = device.commands();
    let (compute, geometry, shading, submit) = pass_label_positions(&commands);
    assert!(compute < geometry, "clustering must precede geometry");
    assert!(geometry < shading, "geometry must precede shading");
    assert!(shading < submit, "submit must come last");
    assert_eq!(
        commands
            .iter()
            .filter(|c| matches!(c, Command::Submit(_)))
            .count(),
        1,
        "exactly one submit per frame"
    );
    assert_eq!(lane.frame_index(), 1);
}

#[test]
fn geometry_pass_targets_match_split_layout() {
    let (device, mut lane) = make_lane(DeferredConfig::default());
    device.clear_commands();

    let scene = test_scene();
    let mut clustering = TestClustering::with_buffer(BufferId(800));
    let mut surface = TestSurface {
        view: TextureViewId(900),
        fail: false,
    };
    lane.render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();

    let commands = device.commands();
    let (_, geometry, _, _) = pass_label_positions(&commands);
    match &commands[geometry] {
        Command::BeginRenderPass {
            color_attachments,
            has_depth,
            ..
        } => {
            assert_eq!(color_attachments.len(), 2, "split layout: albedo + normal");
            assert!(*has_depth, "geometry pass always has a depth attachment");
        }
        _ => unreachable!(),
    }
}

#[test]
fn geometry_pass_targets_match_packed_layout() {
    let (device, mut lane) = make_lane(DeferredConfig {
        gbuffer_layout: GBufferLayout::Packed,
        ..Default::default()
    });
    device.clear_commands();

    let scene = test_scene();
    let mut clustering = TestClustering::with_buffer(BufferId(800));
    let mut surface = TestSurface {
        view: TextureViewId(900),
        fail: false,
    };
    lane.render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();

    let commands = device.commands();
    let (_, geometry, _, _) = pass_label_positions(&commands);
    match &commands[geometry] {
        Command::BeginRenderPass {
            color_attachments,
            has_depth,
            ..
        } => {
            assert_eq!(color_attachments.len(), 1, "packed layout: one attachment");
            assert!(*has_depth);
        }
        _ => unreachable!(),
    }
}

#[test]
fn live_geometry_draws_scene_in_traversal_order() {
    let (device, mut lane) = make_lane(DeferredConfig::default());
    device.clear_commands();

    let scene = test_scene();
    let mut clustering = TestClustering::with_buffer(BufferId(800));
    let mut surface = TestSurface {
        view: TextureViewId(900),
        fail: false,
    };
    lane.render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();

    let commands = device.commands();
    let (_, geometry, shading, _) = pass_label_positions(&commands);
    let draws = draw_commands(&commands, geometry..shading);

    let indexed: Vec<u32> = draws
        .iter()
        .filter_map(|c| match c {
            Command::DrawIndexed { index_count } => Some(*index_count),
            _ => None,
        })
        .collect();
    assert_eq!(indexed, vec![36, 6, 12, 3], "draws follow traversal order");

    let node_binds: Vec<BindGroupId> = draws
        .iter()
        .filter_map(|c| match c {
            Command::SetBindGroup { index: 1, bind_group } => Some(*bind_group),
            _ => None,
        })
        .collect();
    assert_eq!(node_binds, vec![BindGroupId(500), BindGroupId(501)]);

    let material_binds: Vec<BindGroupId> = draws
        .iter()
        .filter_map(|c| match c {
            Command::SetBindGroup { index: 2, bind_group } => Some(*bind_group),
            _ => None,
        })
        .collect();
    assert_eq!(
        material_binds,
        vec![BindGroupId(600), BindGroupId(601), BindGroupId(602)]
    );
}

#[test]
fn shading_pass_draws_one_fullscreen_triangle() {
    let (device, mut lane) = make_lane(DeferredConfig::default());
    device.clear_commands();

    let scene = test_scene();
    let mut clustering = TestClustering::with_buffer(BufferId(800));
    let mut surface = TestSurface {
        view: TextureViewId(900),
        fail: false,
    };
    lane.render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();

    let commands = device.commands();
    let (_, _, shading, submit) = pass_label_positions(&commands);

    match &commands[shading] {
        Command::BeginRenderPass {
            color_attachments,
            has_depth,
            ..
        } => {
            assert_eq!(color_attachments, &vec![TextureViewId(900)]);
            assert!(!*has_depth, "shading pass has no depth attachment");
        }
        _ => unreachable!(),
    }

    let draws = draw_commands(&commands, shading..submit);
    assert!(draws.contains(&Command::Draw { vertex_count: 3 }));
    let bound_groups: Vec<u32> = draws
        .iter()
        .filter_map(|c| match c {
            Command::SetBindGroup { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(bound_groups, vec![0, 1, 2]);
    assert_eq!(
        draws
            .iter()
            .filter(|c| matches!(c, Command::Draw { .. } | Command::DrawIndexed { .. }))
            .count(),
        1,
        "shading draws exactly once"
    );
}

#[test]
fn bundled_strategy_records_once_and_replays() {
    let (device, mut lane) = make_lane(DeferredConfig {
        strategy: GeometryStrategy::Bundled,
        ..Default::default()
    });

    let mut scene = test_scene();
    let mut clustering = TestClustering::with_buffer(BufferId(800));
    let mut surface = TestSurface {
        view: TextureViewId(900),
        fail: false,
    };

    lane.render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();
    assert_eq!(device.bundles_recorded.load(Ordering::SeqCst), 1);

    // Same topology: the bundle is replayed, not re-recorded.
    lane.render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();
    assert_eq!(device.bundles_recorded.load(Ordering::SeqCst), 1);

    let commands = device.commands();
    assert_eq!(
        commands
            .iter()
            .filter(|c| matches!(c, Command::ExecuteBundle(_)))
            .count(),
        2,
        "each frame replays the bundle"
    );

    // Topology change: the bundle goes stale, is destroyed and re-recorded.
    scene.push_node(SceneNode {
        bind_group: BindGroupId(502),
        materials: vec![],
    });
    lane.render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();
    assert_eq!(device.bundles_recorded.load(Ordering::SeqCst), 2);
    assert_eq!(device.bundles_destroyed.lock().unwrap().len(), 1);
}

#[test]
fn bundle_replays_exactly_the_live_draw_sequence() {
    // Two lanes built identically (only the strategy differs, which makes no
    // device calls), so resource IDs line up one to one.
    let (live_device, mut live_lane) = make_lane(DeferredConfig::default());
    let (bundled_device, mut bundled_lane) = make_lane(DeferredConfig {
        strategy: GeometryStrategy::Bundled,
        ..Default::default()
    });

    let scene = test_scene();

    live_device.clear_commands();
    let mut clustering = TestClustering::with_buffer(BufferId(800));
    let mut surface = TestSurface {
        view: TextureViewId(900),
        fail: false,
    };
    live_lane
        .render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();
    let live_commands = live_device.commands();
    let (_, geometry, shading, _) = pass_label_positions(&live_commands);
    let live_draws = draw_commands(&live_commands, geometry..shading);

    let mut clustering = TestClustering::with_buffer(BufferId(800));
    bundled_lane
        .render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();
    let bundled_commands = bundled_device.commands();
    let bundle_id = bundled_commands
        .iter()
        .find_map(|c| match c {
            Command::ExecuteBundle(id) => Some(*id),
            _ => None,
        })
        .expect("bundle executed");

    assert_eq!(
        bundled_device.bundle_contents(bundle_id),
        live_draws,
        "bundle must replay the exact live command sequence"
    );
}

#[test]
fn surface_failure_drops_frame_without_submitting() {
    let (device, mut lane) = make_lane(DeferredConfig::default());
    device.clear_commands();

    let scene = test_scene();
    let mut clustering = TestClustering::with_buffer(BufferId(800));
    let mut surface = TestSurface {
        view: TextureViewId(900),
        fail: true,
    };

    let outcome = lane
        .render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();
    assert_eq!(outcome, FrameOutcome::Dropped);
    assert!(
        device.commands().is_empty(),
        "a dropped frame records nothing"
    );
    assert_eq!(lane.frame_index(), 0);

    // The next frame renders normally.
    surface.fail = false;
    let outcome = lane
        .render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();
    assert!(matches!(outcome, FrameOutcome::Rendered(_)));
    assert_eq!(lane.frame_index(), 1);
}

#[test]
fn cluster_bind_group_rebinds_only_when_buffer_changes() {
    let (device, mut lane) = make_lane(DeferredConfig::default());

    let scene = test_scene();
    let mut surface = TestSurface {
        view: TextureViewId(900),
        fail: false,
    };
    // Frames 1 and 2 reuse buffer 800; frame 3 switches to 801.
    let mut clustering = TestClustering::with_buffers(vec![
        BufferId(800),
        BufferId(800),
        BufferId(801),
    ]);

    lane.render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();
    assert_eq!(device.cluster_bind_group_count(), 1);

    lane.render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();
    assert_eq!(
        device.cluster_bind_group_count(),
        1,
        "same buffer: no rebind"
    );

    lane.render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();
    assert_eq!(
        device.cluster_bind_group_count(),
        2,
        "new buffer: fresh bind group"
    );
}

#[test]
fn resize_recreates_all_targets_together() {
    let (device, mut lane) = make_lane(DeferredConfig::default());
    // Split layout: two color textures + depth.
    assert_eq!(device.textures_created.load(Ordering::SeqCst), 3);

    lane.resize(Extent2D::new(2560, 1440)).unwrap();
    assert_eq!(device.textures_created.load(Ordering::SeqCst), 6);
    assert_eq!(device.textures_destroyed.load(Ordering::SeqCst), 3);
    assert_eq!(lane.targets().size(), Extent2D::new(2560, 1440));

    // Resizing to the current size is a no-op.
    lane.resize(Extent2D::new(2560, 1440)).unwrap();
    assert_eq!(device.textures_created.load(Ordering::SeqCst), 6);
}

#[test]
fn frame_stats_reflect_scene_contents() {
    let (_, mut lane) = make_lane(DeferredConfig::default());

    let scene = test_scene();
    let mut clustering = TestClustering::with_buffer(BufferId(800));
    let mut surface = TestSurface {
        view: TextureViewId(900),
        fail: false,
    };

    let outcome = lane
        .render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();
    assert_eq!(
        outcome,
        FrameOutcome::Rendered(FrameStats {
            draw_calls: 4,
            triangles: 12 + 2 + 4 + 1,
        })
    );
}

#[test]
fn uploads_use_the_lane_buffers() {
    let (device, lane) = make_lane(DeferredConfig::default());

    lane.update_camera(&CameraUniformData::default()).unwrap();
    lane.update_lights(&[
        candela_core::renderer::cluster::GpuLight::new(
            [0.0, 2.0, 0.0],
            8.0,
            [1.0, 0.9, 0.8],
            3.0,
        ),
        candela_core::renderer::cluster::GpuLight::default(),
    ])
    .unwrap();

    let writes = device.buffer_writes.lock().unwrap().clone();
    assert_eq!(
        writes[0].2,
        std::mem::size_of::<CameraUniformData>(),
        "camera upload writes the full uniform block"
    );
    // Light upload: 16-byte count header, then two 32-byte lights.
    assert_eq!(writes[1].1, 0);
    assert_eq!(writes[1].2, 16);
    assert_eq!(writes[2].1, 16);
    assert_eq!(writes[2].2, 64);
}

#[test]
fn empty_scene_still_renders_a_frame() {
    let (device, mut lane) = make_lane(DeferredConfig::default());
    device.clear_commands();

    let scene = RenderScene::new();
    let mut clustering = TestClustering::with_buffer(BufferId(800));
    let mut surface = TestSurface {
        view: TextureViewId(900),
        fail: false,
    };

    let outcome = lane
        .render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();
    assert_eq!(outcome, FrameOutcome::Rendered(FrameStats::default()));

    // Both passes still run: the G-buffer is cleared and the shading pass
    // writes the background.
    let commands = device.commands();
    pass_label_positions(&commands);
}

#[test]
fn both_passes_clear_their_attachments() {
    let (device, mut lane) = make_lane(DeferredConfig::default());
    device.clear_commands();

    let scene = test_scene();
    let mut clustering = TestClustering::with_buffer(BufferId(800));
    let mut surface = TestSurface {
        view: TextureViewId(900),
        fail: false,
    };
    lane.render_frame(&mut clustering, &scene, &mut surface)
        .unwrap();

    let commands = device.commands();
    let (_, geometry, shading, _) = pass_label_positions(&commands);

    match &commands[geometry] {
        Command::BeginRenderPass {
            color_cleared,
            depth_cleared_to_one,
            ..
        } => {
            assert!(*color_cleared, "G-buffer colors are cleared each frame");
            assert!(*depth_cleared_to_one, "depth clears to the far plane");
        }
        _ => unreachable!(),
    }
    match &commands[shading] {
        Command::BeginRenderPass {
            color_cleared,
            color_cleared_to_zero_alpha,
            ..
        } => {
            assert!(*color_cleared, "the surface is cleared before shading");
            assert!(
                *color_cleared_to_zero_alpha,
                "the surface clears to transparent black, not opaque"
            );
        }
        _ => unreachable!(),
    }
}
