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

//! Clustered deferred rendering lane.
//!
//! One frame is one command stream, built and submitted in a fixed order:
//!
//! 1. **Light clustering** (compute): an external [`LightClusteringStage`]
//!    fills the per-cluster light-index buffer.
//! 2. **Geometry pass**: the scene is rasterized into the G-buffer.
//! 3. **Shading pass**: a fullscreen triangle reads the G-buffer and the
//!    cluster light lists and writes the lit image to the surface.
//!
//! Ordering within the stream is the only synchronization; nothing on the
//! CPU waits for the GPU. The whole frame is submitted as a single command
//! buffer at the end of [`ClusteredDeferredLane::render_frame`].

use candela_core::math::Extent2D;
use candela_core::renderer::api::{
    BindGroupDescriptor, BindGroupEntry, BindGroupId, BufferDescriptor, BufferId, BufferUsage,
    CameraUniformData, RenderScene, TextureFormat, TextureViewId,
};
use candela_core::renderer::cluster::{ClusterGridConfig, GpuLight, LightClusteringStage};
use candela_core::renderer::error::RenderError;
use candela_core::renderer::gbuffer::GBufferLayout;
use candela_core::renderer::traits::GraphicsDevice;
use std::borrow::Cow;
use std::sync::Arc;

pub mod gbuffer;
pub mod geometry;
pub mod layouts;
pub mod shaders;
pub mod shading;

pub use gbuffer::GBufferTargets;
pub use geometry::GeometryPass;
pub use layouts::DeferredLayouts;
pub use shading::ShadingPass;

/// How the geometry pass issues its draw commands.
///
/// Fixed at lane construction: the choice affects which GPU resources the
/// lane keeps alive, not per-frame state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryStrategy {
    /// Record every draw into the live command stream each frame.
    #[default]
    Live,
    /// Replay a pre-recorded render bundle, re-recording it only when the
    /// scene topology changes.
    Bundled,
}

/// Configuration for [`ClusteredDeferredLane`], fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct DeferredConfig {
    /// How the geometry pass stores surface attributes.
    pub gbuffer_layout: GBufferLayout,
    /// How geometry draws are issued.
    pub strategy: GeometryStrategy,
    /// The cluster grid the external culling stage and shading shader share.
    pub cluster_grid: ClusterGridConfig,
    /// Capacity of the scene light buffer.
    pub max_lights: u32,
}

impl Default for DeferredConfig {
    fn default() -> Self {
        Self {
            gbuffer_layout: GBufferLayout::Split,
            strategy: GeometryStrategy::Live,
            cluster_grid: ClusterGridConfig::default(),
            max_lights: 256,
        }
    }
}

/// Per-frame statistics of a rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Indexed draw calls issued by the geometry pass.
    pub draw_calls: u32,
    /// Triangles submitted by the geometry pass.
    pub triangles: u32,
}

/// The result of a [`ClusteredDeferredLane::render_frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was recorded and submitted.
    Rendered(FrameStats),
    /// Surface acquisition failed; the frame was skipped and nothing was
    /// submitted. Rendering continues next tick.
    Dropped,
}

/// Supplies the presentation target for each frame.
///
/// Acquisition failures reported as
/// [`RenderError::SurfaceAcquisitionFailed`] are recoverable; the lane turns
/// them into [`FrameOutcome::Dropped`].
pub trait SurfaceProvider {
    /// Acquires the texture view to render this frame into.
    fn acquire(&mut self) -> Result<TextureViewId, RenderError>;
}

/// The cluster light-list binding currently held by the lane.
#[derive(Debug, Clone, Copy)]
struct ClusterBinding {
    buffer: BufferId,
    bind_group: BindGroupId,
}

/// The clustered deferred frame orchestrator.
///
/// Owns the G-buffer targets, both render passes, and the scene-wide GPU
/// buffers (camera uniform, light list). The light culling compute stage is
/// an external collaborator passed into [`render_frame`].
///
/// [`render_frame`]: ClusteredDeferredLane::render_frame
#[derive(Debug)]
pub struct ClusteredDeferredLane {
    device: Arc<dyn GraphicsDevice>,
    config: DeferredConfig,
    layouts: DeferredLayouts,
    targets: GBufferTargets,
    geometry: GeometryPass,
    shading: ShadingPass,
    camera_buffer: BufferId,
    light_buffer: BufferId,
    scene_bind_group: BindGroupId,
    cluster_binding: Option<ClusterBinding>,
    frame_index: u64,
}

impl ClusteredDeferredLane {
    /// Builds the lane: layouts, G-buffer targets, scene buffers, and both
    /// pass pipelines. Any failure aborts construction.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        config: DeferredConfig,
        size: Extent2D,
    ) -> Result<Self, RenderError> {
        log::info!(
            "Initializing clustered deferred lane: {:?} G-buffer, {:?} geometry, {}x{}",
            config.gbuffer_layout,
            config.strategy,
            size.width,
            size.height
        );

        let layouts = DeferredLayouts::create(device.as_ref(), config.gbuffer_layout)?;
        let targets = GBufferTargets::create(
            device.as_ref(),
            config.gbuffer_layout,
            size,
            layouts.gbuffer_read_layout,
        )?;

        let camera_buffer = device.create_buffer(&BufferDescriptor {
            label: Some(Cow::Borrowed("deferred_camera_uniforms")),
            size: std::mem::size_of::<CameraUniformData>() as u64,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        })?;
        let light_buffer = device.create_buffer(&BufferDescriptor {
            label: Some(Cow::Borrowed("deferred_scene_lights")),
            size: GpuLight::list_buffer_size(config.max_lights),
            usage: BufferUsage::STORAGE | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        })?;
        let scene_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("deferred_scene_bind_group"),
            layout: layouts.scene_layout,
            entries: &[
                BindGroupEntry::buffer(0, camera_buffer),
                BindGroupEntry::buffer(1, light_buffer),
            ],
        })?;

        let geometry = GeometryPass::new(device.as_ref(), &layouts, config.gbuffer_layout)?;

        let output_format = device
            .get_surface_format()
            .unwrap_or(TextureFormat::Bgra8UnormSrgb);
        let shading = ShadingPass::new(
            device.as_ref(),
            &layouts,
            config.gbuffer_layout,
            &config.cluster_grid,
            output_format,
        )?;

        Ok(Self {
            device,
            config,
            layouts,
            targets,
            geometry,
            shading,
            camera_buffer,
            light_buffer,
            scene_bind_group,
            cluster_binding: None,
            frame_index: 0,
        })
    }

    /// The lane's configuration.
    pub fn config(&self) -> &DeferredConfig {
        &self.config
    }

    /// The current G-buffer targets.
    pub fn targets(&self) -> &GBufferTargets {
        &self.targets
    }

    /// Number of frames submitted so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Uploads this frame's camera state.
    pub fn update_camera(&self, camera: &CameraUniformData) -> Result<(), RenderError> {
        self.device
            .write_buffer(self.camera_buffer, 0, camera.as_bytes())?;
        Ok(())
    }

    /// Uploads the scene light list (count header, then the lights).
    ///
    /// Lists longer than the configured capacity are truncated with a
    /// warning.
    pub fn update_lights(&self, lights: &[GpuLight]) -> Result<(), RenderError> {
        let lights = if lights.len() > self.config.max_lights as usize {
            log::warn!(
                "Scene has {} lights but the lane holds {}; truncating",
                lights.len(),
                self.config.max_lights
            );
            &lights[..self.config.max_lights as usize]
        } else {
            lights
        };

        let header = [lights.len() as u32, 0, 0, 0];
        self.device
            .write_buffer(self.light_buffer, 0, bytemuck::cast_slice(&header))?;
        if !lights.is_empty() {
            self.device
                .write_buffer(self.light_buffer, 16, bytemuck::cast_slice(lights))?;
        }
        Ok(())
    }

    /// Recreates the G-buffer targets at `new_size`.
    ///
    /// The new set is created before the old one is destroyed, so a creation
    /// failure leaves the lane rendering at the previous size.
    pub fn resize(&mut self, new_size: Extent2D) -> Result<(), RenderError> {
        if new_size == self.targets.size() {
            return Ok(());
        }
        log::debug!(
            "Resizing G-buffer targets to {}x{}",
            new_size.width,
            new_size.height
        );
        let fresh = GBufferTargets::create(
            self.device.as_ref(),
            self.config.gbuffer_layout,
            new_size,
            self.layouts.gbuffer_read_layout,
        )?;
        let old = std::mem::replace(&mut self.targets, fresh);
        old.destroy(self.device.as_ref());
        Ok(())
    }

    /// Records and submits one frame.
    ///
    /// The command stream is: clustering compute, geometry pass, shading
    /// pass, one submit. A failed surface acquisition drops the frame
    /// (nothing is submitted) and returns [`FrameOutcome::Dropped`]; other
    /// errors propagate.
    pub fn render_frame(
        &mut self,
        clustering: &mut dyn LightClusteringStage,
        scene: &RenderScene,
        surface: &mut dyn SurfaceProvider,
    ) -> Result<FrameOutcome, RenderError> {
        let output_view = match surface.acquire() {
            Ok(view) => view,
            Err(RenderError::SurfaceAcquisitionFailed(reason)) => {
                log::warn!("Dropping frame {}: {reason}", self.frame_index);
                return Ok(FrameOutcome::Dropped);
            }
            Err(err) => return Err(err),
        };

        let mut encoder = self.device.create_command_encoder(Some("deferred_frame"));

        let cluster_buffer = clustering.run(self.device.as_ref(), encoder.as_mut())?;
        let cluster_bind_group = self.bind_cluster_buffer(cluster_buffer)?;

        self.geometry.encode(
            self.device.as_ref(),
            encoder.as_mut(),
            &self.targets,
            scene,
            self.scene_bind_group,
            self.config.strategy,
        )?;

        self.shading.encode(
            encoder.as_mut(),
            output_view,
            self.scene_bind_group,
            self.targets.read_bind_group(),
            cluster_bind_group,
        );

        let command_buffer = encoder.finish();
        self.device.submit_command_buffer(command_buffer)?;
        self.frame_index += 1;

        Ok(FrameOutcome::Rendered(FrameStats {
            draw_calls: scene.draw_count(),
            triangles: scene.triangle_count(),
        }))
    }

    /// Returns the bind group for this frame's cluster light buffer,
    /// rebinding only when the culling stage hands back a different buffer.
    fn bind_cluster_buffer(&mut self, buffer: BufferId) -> Result<BindGroupId, RenderError> {
        if let Some(binding) = self.cluster_binding {
            if binding.buffer == buffer {
                return Ok(binding.bind_group);
            }
        }

        let bind_group = self.device.create_bind_group(&BindGroupDescriptor {
            label: Some("deferred_cluster_lights_bind_group"),
            layout: self.layouts.cluster_lights_layout,
            entries: &[BindGroupEntry::buffer(0, buffer)],
        })?;

        if let Some(old) = self.cluster_binding.replace(ClusterBinding { buffer, bind_group }) {
            if let Err(err) = self.device.destroy_bind_group(old.bind_group) {
                log::warn!("Failed to destroy stale cluster bind group: {err}");
            }
        }
        Ok(bind_group)
    }

    /// Releases every GPU resource the lane owns.
    pub fn shutdown(mut self) {
        log::info!("Shutting down clustered deferred lane");
        let device = Arc::clone(&self.device);
        let device = device.as_ref();

        self.geometry.destroy(device);
        self.shading.destroy(device);
        if let Some(binding) = self.cluster_binding.take() {
            if let Err(err) = device.destroy_bind_group(binding.bind_group) {
                log::warn!("Failed to destroy cluster bind group: {err}");
            }
        }
        if let Err(err) = device.destroy_bind_group(self.scene_bind_group) {
            log::warn!("Failed to destroy scene bind group: {err}");
        }
        for buffer in [self.camera_buffer, self.light_buffer] {
            if let Err(err) = device.destroy_buffer(buffer) {
                log::warn!("Failed to destroy scene buffer {buffer:?}: {err}");
            }
        }
        self.targets.destroy(device);
        self.layouts.destroy(device);
    }
}
