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

//! Defines data structures for GPU textures, texture views, and samplers.

use crate::candela_bitflags;
use crate::math::dimension::Extent3D;
use std::borrow::Cow;

/// Defines the memory format of pixels in a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    // 8-bit per channel formats
    /// Four 8-bit unsigned normalized components (RGBA).
    Rgba8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA) in the sRGB color space.
    Rgba8UnormSrgb,
    /// Four 8-bit unsigned normalized components (BGRA). A common swapchain format.
    Bgra8Unorm,
    /// Four 8-bit unsigned normalized components (BGRA) in the sRGB color space.
    Bgra8UnormSrgb,
    // 16-bit float formats
    /// Four 16-bit float components.
    Rgba16Float,
    // 32-bit integer formats
    /// Four 32-bit unsigned integer components. Used for bit-packed attribute storage.
    Rgba32Uint,
    // Depth formats
    /// A 24-bit unsigned normalized depth format.
    Depth24Plus,
    /// A 32-bit float depth format.
    Depth32Float,
}

impl TextureFormat {
    /// Returns the size in bytes of a single pixel for this format.
    /// Note: This can be an approximation for packed or complex formats.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Bgra8Unorm
            | TextureFormat::Bgra8UnormSrgb => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgba32Uint => 16,
            TextureFormat::Depth24Plus => 4,
            TextureFormat::Depth32Float => 4,
        }
    }

    /// Returns `true` if this is a depth format.
    pub const fn is_depth(&self) -> bool {
        matches!(self, TextureFormat::Depth24Plus | TextureFormat::Depth32Float)
    }

    /// Returns `true` if this format holds unsigned integer texels.
    pub const fn is_uint(&self) -> bool {
        matches!(self, TextureFormat::Rgba32Uint)
    }
}

/// The dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureDimension {
    /// A one-dimensional texture.
    D1,
    /// A two-dimensional texture.
    #[default]
    D2,
    /// A three-dimensional texture.
    D3,
}

/// The dimensionality of a texture view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureViewDimension {
    /// A 1D texture view.
    D1,
    /// A 2D texture view.
    #[default]
    D2,
    /// A 2D array texture view.
    D2Array,
    /// A cube texture view.
    Cube,
    /// A 3D texture view.
    D3,
}

/// How a sampler resolves texture coordinates outside the [0, 1] range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Coordinates are clamped to the edge texel.
    #[default]
    ClampToEdge,
    /// Coordinates wrap around (tiling).
    Repeat,
    /// Coordinates wrap with mirroring.
    MirrorRepeat,
}

/// How a sampler interpolates between texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest-neighbor sampling (no interpolation).
    #[default]
    Nearest,
    /// Linear interpolation between texels.
    Linear,
}

candela_bitflags! {
    /// Flags describing how a texture may be used by the GPU.
    pub struct TextureUsage: u32 {
        /// The texture can be the source of a copy operation.
        const COPY_SRC = 1 << 0;
        /// The texture can be the destination of a copy or write operation.
        const COPY_DST = 1 << 1;
        /// The texture can be bound for sampling in a shader.
        const TEXTURE_BINDING = 1 << 2;
        /// The texture can be bound as a writable storage texture.
        const STORAGE_BINDING = 1 << 3;
        /// The texture can be used as a color or depth/stencil attachment.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

/// Describes a texture to be created by the `GraphicsDevice`.
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The size of the texture.
    pub size: Extent3D,
    /// Number of mip levels.
    pub mip_level_count: u32,
    /// Number of samples per texel (1 for non-multisampled).
    pub sample_count: u32,
    /// The dimensionality of the texture.
    pub dimension: TextureDimension,
    /// The texel format.
    pub format: TextureFormat,
    /// How the texture will be used.
    pub usage: TextureUsage,
}

/// Describes a view onto a texture.
#[derive(Debug, Clone, Default)]
pub struct TextureViewDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Overrides the texture's format for this view, if set.
    pub format: Option<TextureFormat>,
    /// Overrides the view dimensionality, if set.
    pub dimension: Option<TextureViewDimension>,
    /// First mip level visible through the view.
    pub base_mip_level: u32,
    /// Number of mip levels visible, or `None` for all remaining.
    pub mip_level_count: Option<u32>,
    /// First array layer visible through the view.
    pub base_array_layer: u32,
    /// Number of array layers visible, or `None` for all remaining.
    pub array_layer_count: Option<u32>,
}

/// Describes a sampler to be created by the `GraphicsDevice`.
#[derive(Debug, Clone, Default)]
pub struct SamplerDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Addressing mode for the U texture coordinate.
    pub address_mode_u: AddressMode,
    /// Addressing mode for the V texture coordinate.
    pub address_mode_v: AddressMode,
    /// Addressing mode for the W texture coordinate.
    pub address_mode_w: AddressMode,
    /// Filter used when magnifying.
    pub mag_filter: FilterMode,
    /// Filter used when minifying.
    pub min_filter: FilterMode,
    /// Filter used between mip levels.
    pub mipmap_filter: FilterMode,
}

/// An opaque handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// An opaque handle to a view onto a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureViewId(pub usize);

/// An opaque handle to a GPU sampler resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SamplerId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_classification() {
        assert!(TextureFormat::Depth24Plus.is_depth());
        assert!(TextureFormat::Depth32Float.is_depth());
        assert!(!TextureFormat::Rgba8Unorm.is_depth());
        assert!(TextureFormat::Rgba32Uint.is_uint());
        assert!(!TextureFormat::Rgba16Float.is_uint());
    }

    #[test]
    fn bytes_per_pixel() {
        assert_eq!(TextureFormat::Rgba8Unorm.bytes_per_pixel(), 4);
        assert_eq!(TextureFormat::Rgba16Float.bytes_per_pixel(), 8);
        assert_eq!(TextureFormat::Rgba32Uint.bytes_per_pixel(), 16);
    }

    #[test]
    fn sampler_descriptor_defaults_to_nearest_clamp() {
        let desc = SamplerDescriptor::default();
        assert_eq!(desc.address_mode_u, AddressMode::ClampToEdge);
        assert_eq!(desc.mag_filter, FilterMode::Nearest);
        assert_eq!(desc.min_filter, FilterMode::Nearest);
    }
}
