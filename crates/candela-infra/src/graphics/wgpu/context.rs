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

use candela_core::renderer::api::texture::TextureFormat;
use candela_core::renderer::error::RenderError;

/// Holds the core wgpu state objects required for rendering.
///
/// The context is headless: it owns an adapter, logical device, and queue,
/// but no presentation surface. Embedders that present through their own
/// swapchain register the target view with the [`WgpuDevice`] and declare
/// its format via [`set_presentation_format`].
///
/// [`WgpuDevice`]: super::device::WgpuDevice
/// [`set_presentation_format`]: WgpuGraphicsContext::set_presentation_format
#[derive(Debug)]
pub struct WgpuGraphicsContext {
    /// The logical device used for all resource creation.
    pub device: wgpu::Device,
    /// The queue commands are submitted to.
    pub queue: wgpu::Queue,
    /// The human-readable adapter name, for logs and diagnostics.
    pub adapter_name: String,
    /// The optional features the device was created with.
    pub active_device_features: wgpu::Features,
    /// The format of the external presentation target, if one was declared.
    pub presentation_format: Option<TextureFormat>,
}

impl WgpuGraphicsContext {
    /// Asynchronously initializes the context against the given instance.
    ///
    /// Requests a high-performance adapter with no surface constraint, then
    /// creates the logical device with whichever optional features the
    /// adapter offers out of the set the renderer can use.
    pub async fn new(instance: &wgpu::Instance) -> Result<Self, RenderError> {
        log::info!("Initializing wgpu graphics context...");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| {
                RenderError::InitializationFailed(format!("No suitable adapter found: {e}"))
            })?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let wanted_features = wgpu::Features::TIMESTAMP_QUERY;
        let features_to_enable = adapter.features() & wanted_features;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("candela_logical_device"),
                required_features: features_to_enable,
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
            })
            .await
            .map_err(|e| {
                RenderError::InitializationFailed(format!("Failed to create logical device: {e}"))
            })?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("wgpu uncaptured error: {e:?}");
        }));

        let active_device_features = device.features();
        log::debug!("Active device features: {active_device_features:?}");

        Ok(Self {
            device,
            queue,
            adapter_name: adapter_info.name,
            active_device_features,
            presentation_format: None,
        })
    }

    /// Blocking convenience wrapper around [`new`](Self::new) that also
    /// creates the instance.
    pub fn new_blocking() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        pollster::block_on(Self::new(&instance))
    }

    /// Declares the texel format of the external presentation target.
    ///
    /// Render lanes query this through `GraphicsDevice::get_surface_format`
    /// to pick their output pipeline format.
    pub fn set_presentation_format(&mut self, format: TextureFormat) {
        self.presentation_format = Some(format);
    }

    /// The logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The submission queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
