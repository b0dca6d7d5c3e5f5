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

//! G-buffer attribute layout and the packed-texel encoding.
//!
//! The geometry pass writes per-pixel surface attributes (albedo + normal)
//! that the shading pass reads back. Two layouts exist:
//!
//! - **Split**: albedo in an `Rgba8Unorm` attachment, normal in an
//!   `Rgba16Float` attachment. Simple, but two color writes per pixel.
//! - **Packed**: both attributes bit-packed into one `Rgba32Uint` attachment,
//!   trading quantization for bandwidth.
//!
//! Depth is never part of the color layout: it lives in a dedicated
//! depth attachment so the geometry pass gets hardware depth testing, and the
//! shading pass reconstructs position from depth + screen UV.
//!
//! # Packed texel encoding
//!
//! The packed encoding is a fixed contract, mirrored bit-for-bit by the WGSL
//! pack/unpack helpers in the packed shader variants:
//!
//! | word | bits 0..15              | bits 16..31             |
//! |------|-------------------------|-------------------------|
//! | 0    | albedo.r, albedo.g (unorm8 each, low byte first) | albedo.b, albedo.a |
//! | 1    | normal.x (snorm16)      | normal.y (snorm16)      |
//! | 2    | normal.z (snorm16)      | zero                    |
//! | 3    | zero (reserved)         | zero                    |
//!
//! Round-trip error is bounded by the quantization step: ≤ 1/255 per albedo
//! channel and ≤ 1/32767 per normal component.

use crate::math::LinearRgba;
use crate::renderer::api::texture::TextureFormat;

/// Selects how the geometry pass stores surface attributes.
///
/// Fixed at renderer construction; switching layouts requires rebuilding the
/// renderer and its frame targets, since attachment formats, binding-set
/// layouts, and shader variants all depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GBufferLayout {
    /// Separate albedo and normal attachments.
    #[default]
    Split,
    /// One combined wide-integer attachment.
    Packed,
}

impl GBufferLayout {
    /// The depth attachment format, common to both layouts.
    pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth24Plus;

    /// The color attachment formats for this layout, in attachment order.
    pub const fn color_formats(&self) -> &'static [TextureFormat] {
        match self {
            GBufferLayout::Split => {
                &[TextureFormat::Rgba8Unorm, TextureFormat::Rgba16Float]
            }
            GBufferLayout::Packed => &[TextureFormat::Rgba32Uint],
        }
    }

    /// The number of color attachments this layout allocates.
    pub const fn color_attachment_count(&self) -> usize {
        self.color_formats().len()
    }

    /// Bytes of color data written per pixel by the geometry pass.
    pub fn color_bytes_per_pixel(&self) -> u32 {
        self.color_formats()
            .iter()
            .map(|f| f.bytes_per_pixel())
            .sum()
    }
}

/// Quantizes a [0, 1] value to 8-bit unorm.
#[inline]
fn pack_unorm8(v: f32) -> u32 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u32
}

/// Expands an 8-bit unorm value to [0, 1].
#[inline]
fn unpack_unorm8(bits: u32) -> f32 {
    (bits & 0xFF) as f32 / 255.0
}

/// Quantizes a [-1, 1] value to 16-bit snorm.
#[inline]
fn pack_snorm16(v: f32) -> u32 {
    let q = (v.clamp(-1.0, 1.0) * 32767.0).round() as i32;
    (q as u32) & 0xFFFF
}

/// Expands a 16-bit snorm value to [-1, 1].
#[inline]
fn unpack_snorm16(bits: u32) -> f32 {
    let q = (bits & 0xFFFF) as u16 as i16;
    (q as f32 / 32767.0).clamp(-1.0, 1.0)
}

/// Packs an albedo color and a unit normal into one `Rgba32Uint` texel.
///
/// Albedo channels are clamped to [0, 1] and normal components to [-1, 1]
/// before quantization. Words 2 (high half) and 3 are zero.
pub fn pack_surface(albedo: LinearRgba, normal: [f32; 3]) -> [u32; 4] {
    let word0 = pack_unorm8(albedo.r)
        | (pack_unorm8(albedo.g) << 8)
        | (pack_unorm8(albedo.b) << 16)
        | (pack_unorm8(albedo.a) << 24);
    let word1 = pack_snorm16(normal[0]) | (pack_snorm16(normal[1]) << 16);
    let word2 = pack_snorm16(normal[2]);
    [word0, word1, word2, 0]
}

/// Unpacks a texel produced by [`pack_surface`] back into (albedo, normal).
pub fn unpack_surface(texel: [u32; 4]) -> (LinearRgba, [f32; 3]) {
    let albedo = LinearRgba::new(
        unpack_unorm8(texel[0]),
        unpack_unorm8(texel[0] >> 8),
        unpack_unorm8(texel[0] >> 16),
        unpack_unorm8(texel[0] >> 24),
    );
    let normal = [
        unpack_snorm16(texel[1]),
        unpack_snorm16(texel[1] >> 16),
        unpack_snorm16(texel[2]),
    ];
    (albedo, normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ALBEDO_TOLERANCE: f32 = 1.0 / 255.0;
    const NORMAL_TOLERANCE: f32 = 1.0 / 32767.0;

    #[test]
    fn split_layout_formats() {
        let layout = GBufferLayout::Split;
        assert_eq!(
            layout.color_formats(),
            &[TextureFormat::Rgba8Unorm, TextureFormat::Rgba16Float]
        );
        assert_eq!(layout.color_attachment_count(), 2);
        assert_eq!(layout.color_bytes_per_pixel(), 12);
    }

    #[test]
    fn packed_layout_formats() {
        let layout = GBufferLayout::Packed;
        assert_eq!(layout.color_formats(), &[TextureFormat::Rgba32Uint]);
        assert_eq!(layout.color_attachment_count(), 1);
        assert_eq!(layout.color_bytes_per_pixel(), 16);
    }

    #[test]
    fn depth_format_is_shared() {
        assert_eq!(GBufferLayout::DEPTH_FORMAT, TextureFormat::Depth24Plus);
        assert!(GBufferLayout::DEPTH_FORMAT.is_depth());
    }

    #[test]
    fn pack_round_trip_within_tolerance() {
        let albedo = LinearRgba::new(0.83, 0.12, 0.47, 1.0);
        let normal = [0.267, -0.535, 0.802];

        let (albedo2, normal2) = unpack_surface(pack_surface(albedo, normal));

        assert_abs_diff_eq!(albedo.r, albedo2.r, epsilon = ALBEDO_TOLERANCE);
        assert_abs_diff_eq!(albedo.g, albedo2.g, epsilon = ALBEDO_TOLERANCE);
        assert_abs_diff_eq!(albedo.b, albedo2.b, epsilon = ALBEDO_TOLERANCE);
        assert_abs_diff_eq!(albedo.a, albedo2.a, epsilon = ALBEDO_TOLERANCE);
        for i in 0..3 {
            assert_abs_diff_eq!(normal[i], normal2[i], epsilon = NORMAL_TOLERANCE);
        }
    }

    #[test]
    fn pack_round_trip_sweep() {
        // Sample the albedo and normal domains coarsely; every sample must
        // survive the quantization round trip within tolerance.
        for step in 0..=20 {
            let t = step as f32 / 20.0;
            let albedo = LinearRgba::new(t, 1.0 - t, t * 0.5, 1.0);
            let n = t * 2.0 - 1.0;
            // Not normalized on purpose: the encoding is per-component.
            let normal = [n, -n, 1.0 - t];

            let (albedo2, normal2) = unpack_surface(pack_surface(albedo, normal));
            assert_abs_diff_eq!(albedo.r, albedo2.r, epsilon = ALBEDO_TOLERANCE);
            assert_abs_diff_eq!(albedo.g, albedo2.g, epsilon = ALBEDO_TOLERANCE);
            assert_abs_diff_eq!(albedo.b, albedo2.b, epsilon = ALBEDO_TOLERANCE);
            for i in 0..3 {
                assert_abs_diff_eq!(normal[i], normal2[i], epsilon = NORMAL_TOLERANCE);
            }
        }
    }

    #[test]
    fn pack_quantizes_exactly_at_extremes() {
        let (albedo, normal) =
            unpack_surface(pack_surface(LinearRgba::WHITE, [1.0, -1.0, 1.0]));
        assert_eq!(albedo, LinearRgba::WHITE);
        assert_eq!(normal, [1.0, -1.0, 1.0]);

        let (albedo, normal) =
            unpack_surface(pack_surface(LinearRgba::TRANSPARENT, [0.0, 0.0, 0.0]));
        assert_eq!(albedo, LinearRgba::TRANSPARENT);
        assert_eq!(normal, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn pack_clamps_out_of_range_input() {
        let (albedo, normal) =
            unpack_surface(pack_surface(LinearRgba::new(2.0, -1.0, 0.5, 1.5), [1.5, -2.0, 0.0]));
        assert_eq!(albedo.r, 1.0);
        assert_eq!(albedo.g, 0.0);
        assert_eq!(albedo.a, 1.0);
        assert_eq!(normal[0], 1.0);
        assert_eq!(normal[1], -1.0);
    }

    #[test]
    fn reserved_words_stay_zero() {
        let texel = pack_surface(LinearRgba::WHITE, [1.0, 1.0, 1.0]);
        assert_eq!(texel[2] >> 16, 0, "high half of word 2 is reserved");
        assert_eq!(texel[3], 0, "word 3 is reserved");
    }
}
