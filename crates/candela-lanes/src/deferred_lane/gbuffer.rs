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

//! G-buffer render targets owned by the deferred lane.
//!
//! All attachments (color + depth), their views, the read sampler, and the
//! shading pass's read bind group live and die together: a resize destroys
//! and recreates the whole set so attachment sizes can never disagree.

use candela_core::math::Extent2D;
use candela_core::renderer::api::{
    BindGroupDescriptor, BindGroupEntry, BindGroupId, BindGroupLayoutId, SamplerDescriptor,
    SamplerId, TextureDescriptor, TextureDimension, TextureId, TextureUsage,
    TextureViewDescriptor, TextureViewId,
};
use candela_core::renderer::error::RenderError;
use candela_core::renderer::gbuffer::GBufferLayout;
use candela_core::renderer::traits::GraphicsDevice;
use std::borrow::Cow;

/// The live G-buffer attachments for one target size.
#[derive(Debug)]
pub struct GBufferTargets {
    layout: GBufferLayout,
    size: Extent2D,
    color_textures: Vec<TextureId>,
    color_views: Vec<TextureViewId>,
    depth_texture: TextureId,
    depth_view: TextureViewId,
    sampler: SamplerId,
    read_bind_group: BindGroupId,
}

impl GBufferTargets {
    /// Creates the full attachment set at the given size.
    ///
    /// `read_layout` is the shading pass's G-buffer binding set; the read
    /// bind group created here conforms to it.
    pub fn create(
        device: &dyn GraphicsDevice,
        layout: GBufferLayout,
        size: Extent2D,
        read_layout: BindGroupLayoutId,
    ) -> Result<Self, RenderError> {
        let extent = size.to_3d();

        let mut color_textures = Vec::new();
        let mut color_views = Vec::new();
        for (index, format) in layout.color_formats().iter().enumerate() {
            let texture = device.create_texture(&TextureDescriptor {
                label: Some(Cow::Owned(format!("gbuffer_color_{index}"))),
                size: extent,
                mip_level_count: 1,
                sample_count: 1,
                dimension: TextureDimension::D2,
                format: *format,
                usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
            })?;
            let view = device.create_texture_view(texture, &TextureViewDescriptor::default())?;
            color_textures.push(texture);
            color_views.push(view);
        }

        let depth_texture = device.create_texture(&TextureDescriptor {
            label: Some(Cow::Borrowed("gbuffer_depth")),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: GBufferLayout::DEPTH_FORMAT,
            usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
        })?;
        let depth_view = device.create_texture_view(depth_texture, &TextureViewDescriptor::default())?;

        // Nearest/clamp sampler; attachment reads are texel-exact.
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some(Cow::Borrowed("gbuffer_sampler")),
            ..Default::default()
        })?;

        let mut entries = Vec::new();
        for (binding, view) in color_views.iter().enumerate() {
            entries.push(BindGroupEntry::texture_view(binding as u32, *view));
        }
        entries.push(BindGroupEntry::texture_view(
            color_views.len() as u32,
            depth_view,
        ));
        entries.push(BindGroupEntry::sampler(
            color_views.len() as u32 + 1,
            sampler,
        ));

        let read_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("gbuffer_read_bind_group"),
            layout: read_layout,
            entries: &entries,
        })?;

        Ok(Self {
            layout,
            size,
            color_textures,
            color_views,
            depth_texture,
            depth_view,
            sampler,
            read_bind_group,
        })
    }

    /// Destroys every attachment, view, and the read bind group.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        if let Err(err) = device.destroy_bind_group(self.read_bind_group) {
            log::warn!("Failed to destroy G-buffer read bind group: {err}");
        }
        if let Err(err) = device.destroy_sampler(self.sampler) {
            log::warn!("Failed to destroy G-buffer sampler: {err}");
        }
        for view in self
            .color_views
            .iter()
            .copied()
            .chain(std::iter::once(self.depth_view))
        {
            if let Err(err) = device.destroy_texture_view(view) {
                log::warn!("Failed to destroy G-buffer view {view:?}: {err}");
            }
        }
        for texture in self
            .color_textures
            .iter()
            .copied()
            .chain(std::iter::once(self.depth_texture))
        {
            if let Err(err) = device.destroy_texture(texture) {
                log::warn!("Failed to destroy G-buffer texture {texture:?}: {err}");
            }
        }
    }

    /// The G-buffer attribute layout these targets were built for.
    pub fn layout(&self) -> GBufferLayout {
        self.layout
    }

    /// The current target size in pixels.
    pub fn size(&self) -> Extent2D {
        self.size
    }

    /// The color attachment views, in attachment-index order.
    pub fn color_views(&self) -> &[TextureViewId] {
        &self.color_views
    }

    /// The depth attachment view.
    pub fn depth_view(&self) -> TextureViewId {
        self.depth_view
    }

    /// The bind group the shading pass binds at group 1 to read the G-buffer.
    pub fn read_bind_group(&self) -> BindGroupId {
        self.read_bind_group
    }
}
