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

//! Defines descriptors for render/compute passes, command buffers, and
//! pre-recorded render bundles.

use crate::math::LinearRgba;
use crate::renderer::api::texture::{TextureFormat, TextureViewId};

/// An opaque handle to a finished, submittable command buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandBufferId(pub u64);

/// An opaque handle to a pre-recorded, replayable render bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderBundleId(pub usize);

/// The operation performed on an attachment at the start of a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOp<V> {
    /// Clear the attachment to the given value.
    Clear(V),
    /// Preserve the existing contents.
    Load,
}

/// The operation performed on an attachment at the end of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreOp {
    /// Write the results back to the attachment.
    #[default]
    Store,
    /// Discard the results.
    Discard,
}

/// The pair of load/store operations for one attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct Operations<V> {
    /// Operation at pass start.
    pub load: LoadOp<V>,
    /// Operation at pass end.
    pub store: StoreOp,
}

impl<V> Operations<V> {
    /// Clear at pass start, store at pass end.
    pub const fn clear(value: V) -> Self {
        Self {
            load: LoadOp::Clear(value),
            store: StoreOp::Store,
        }
    }
}

/// Describes one color attachment of a render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassColorAttachment {
    /// The texture view written by the pass.
    pub view: TextureViewId,
    /// The view receiving multisample resolve output, if any.
    pub resolve_target: Option<TextureViewId>,
    /// Load/store operations, with clear values in linear color.
    pub ops: Operations<LinearRgba>,
}

/// Describes the depth/stencil attachment of a render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassDepthStencilAttachment {
    /// The depth texture view.
    pub view: TextureViewId,
    /// Depth load/store operations, or `None` to leave depth untouched.
    pub depth_ops: Option<Operations<f32>>,
}

/// Describes a render pass to be begun on a command encoder.
#[derive(Debug, Clone, Default)]
pub struct RenderPassDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// The color attachments, in attachment-index order.
    pub color_attachments: Vec<RenderPassColorAttachment>,
    /// The depth/stencil attachment, if any.
    pub depth_stencil_attachment: Option<RenderPassDepthStencilAttachment>,
}

/// Describes a compute pass to be begun on a command encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputePassDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
}

/// Describes the attachment formats a render bundle will be replayed against.
///
/// A bundle recorded with these formats may only be executed inside a render
/// pass whose attachments match them exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderBundleDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// Formats of the color attachments, in attachment-index order.
    pub color_formats: &'a [TextureFormat],
    /// Format of the depth attachment, if the pass has one.
    pub depth_stencil_format: Option<TextureFormat>,
    /// Sample count of the target pass.
    pub sample_count: u32,
}
