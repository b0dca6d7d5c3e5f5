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

//! Binding-set contracts for the clustered deferred lane.
//!
//! Every bind group layout and pipeline layout the lane uses is created here,
//! once, at lane construction. Group indices are fixed:
//!
//! | group | geometry pass | shading pass    |
//! |-------|---------------|-----------------|
//! | 0     | scene         | scene           |
//! | 1     | model         | G-buffer read   |
//! | 2     | material      | cluster lights  |
//!
//! Each binding set is validated against its contract before anything is
//! created on the device, so a contract violation fails construction instead
//! of surfacing as a backend error mid-frame.

use candela_core::renderer::api::{
    BindGroupLayoutEntry, BindGroupLayoutDescriptor, BindGroupLayoutId, BindingType,
    BufferBindingType, CameraUniformData, MaterialUniforms, ModelUniforms,
    PipelineLayoutDescriptor, PipelineLayoutId, SamplerBindingType, ShaderStageFlags,
    TextureSampleType,
};
use candela_core::renderer::error::{PipelineError, RenderError};
use candela_core::renderer::gbuffer::GBufferLayout;
use candela_core::renderer::traits::GraphicsDevice;
use std::num::NonZeroU64;

/// All bind group layouts and pipeline layouts of the deferred lane.
///
/// Created once at lane construction and shared by both passes; the scene
/// set (group 0) is identical for geometry and shading so one camera/light
/// bind group serves the whole frame.
#[derive(Debug, Clone, Copy)]
pub struct DeferredLayouts {
    /// Group 0: camera uniform + scene light list.
    pub scene_layout: BindGroupLayoutId,
    /// Geometry group 1: per-node model/normal matrices.
    pub model_layout: BindGroupLayoutId,
    /// Geometry group 2: per-material uniforms.
    pub material_layout: BindGroupLayoutId,
    /// Shading group 1: G-buffer attachments + sampler.
    pub gbuffer_read_layout: BindGroupLayoutId,
    /// Shading group 2: per-cluster light indices.
    pub cluster_lights_layout: BindGroupLayoutId,
    /// Pipeline layout of the geometry pass: [scene, model, material].
    pub geometry_pipeline_layout: PipelineLayoutId,
    /// Pipeline layout of the shading pass: [scene, gbuffer, cluster].
    pub shading_pipeline_layout: PipelineLayoutId,
}

impl DeferredLayouts {
    /// Creates and validates all layouts for the given G-buffer layout.
    pub fn create(
        device: &dyn GraphicsDevice,
        gbuffer_layout: GBufferLayout,
    ) -> Result<Self, RenderError> {
        let scene_entries = [
            BindGroupLayoutEntry::buffer(
                0,
                ShaderStageFlags::VERTEX_FRAGMENT,
                BufferBindingType::Uniform,
                false,
                NonZeroU64::new(std::mem::size_of::<CameraUniformData>() as u64),
            ),
            BindGroupLayoutEntry::buffer(
                1,
                ShaderStageFlags::FRAGMENT,
                BufferBindingType::Storage { read_only: true },
                false,
                None,
            ),
        ];

        let model_entries = [BindGroupLayoutEntry::buffer(
            0,
            ShaderStageFlags::VERTEX,
            BufferBindingType::Uniform,
            false,
            NonZeroU64::new(std::mem::size_of::<ModelUniforms>() as u64),
        )];

        let material_entries = [BindGroupLayoutEntry::buffer(
            0,
            ShaderStageFlags::FRAGMENT,
            BufferBindingType::Uniform,
            false,
            NonZeroU64::new(std::mem::size_of::<MaterialUniforms>() as u64),
        )];

        let gbuffer_entries = gbuffer_read_entries(gbuffer_layout);

        let cluster_entries = [BindGroupLayoutEntry::buffer(
            0,
            ShaderStageFlags::FRAGMENT,
            BufferBindingType::Storage { read_only: true },
            false,
            None,
        )];

        validate_binding_set("deferred_scene", &scene_entries)?;
        validate_binding_set("deferred_model", &model_entries)?;
        validate_binding_set("deferred_material", &material_entries)?;
        validate_binding_set("deferred_gbuffer_read", &gbuffer_entries)?;
        validate_binding_set("deferred_cluster_lights", &cluster_entries)?;

        let scene_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("deferred_scene_layout"),
            entries: &scene_entries,
        })?;
        let model_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("deferred_model_layout"),
            entries: &model_entries,
        })?;
        let material_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("deferred_material_layout"),
            entries: &material_entries,
        })?;
        let gbuffer_read_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("deferred_gbuffer_read_layout"),
            entries: &gbuffer_entries,
        })?;
        let cluster_lights_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("deferred_cluster_lights_layout"),
            entries: &cluster_entries,
        })?;

        let geometry_pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("deferred_geometry_pipeline_layout"),
            bind_group_layouts: &[scene_layout, model_layout, material_layout],
        })?;
        let shading_pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("deferred_shading_pipeline_layout"),
            bind_group_layouts: &[scene_layout, gbuffer_read_layout, cluster_lights_layout],
        })?;

        Ok(Self {
            scene_layout,
            model_layout,
            material_layout,
            gbuffer_read_layout,
            cluster_lights_layout,
            geometry_pipeline_layout,
            shading_pipeline_layout,
        })
    }

    /// Destroys all layouts on the device.
    pub fn destroy(&self, device: &dyn GraphicsDevice) {
        for layout in [
            self.scene_layout,
            self.model_layout,
            self.material_layout,
            self.gbuffer_read_layout,
            self.cluster_lights_layout,
        ] {
            if let Err(err) = device.destroy_bind_group_layout(layout) {
                log::warn!("Failed to destroy bind group layout {layout:?}: {err}");
            }
        }
    }
}

/// The G-buffer read entries for the shading pass, per layout.
///
/// G-buffer attachments are read with `textureLoad`, so the float textures
/// are declared non-filterable and the sampler non-filtering. Uint textures
/// are unfilterable by nature.
fn gbuffer_read_entries(layout: GBufferLayout) -> Vec<BindGroupLayoutEntry> {
    match layout {
        GBufferLayout::Split => vec![
            BindGroupLayoutEntry::texture_2d(
                0,
                ShaderStageFlags::FRAGMENT,
                TextureSampleType::Float { filterable: false },
            ),
            BindGroupLayoutEntry::texture_2d(
                1,
                ShaderStageFlags::FRAGMENT,
                TextureSampleType::Float { filterable: false },
            ),
            BindGroupLayoutEntry::texture_2d(2, ShaderStageFlags::FRAGMENT, TextureSampleType::Depth),
            BindGroupLayoutEntry::sampler(
                3,
                ShaderStageFlags::FRAGMENT,
                SamplerBindingType::NonFiltering,
            ),
        ],
        GBufferLayout::Packed => vec![
            BindGroupLayoutEntry::texture_2d(0, ShaderStageFlags::FRAGMENT, TextureSampleType::Uint),
            BindGroupLayoutEntry::texture_2d(1, ShaderStageFlags::FRAGMENT, TextureSampleType::Depth),
            BindGroupLayoutEntry::sampler(
                2,
                ShaderStageFlags::FRAGMENT,
                SamplerBindingType::NonFiltering,
            ),
        ],
    }
}

/// Validates a binding set against the lane's render-pipeline contract.
///
/// Checks: binding indices contiguous from 0, no duplicates, no empty
/// visibility, storage buffers read-only, and float attachment reads
/// declared non-filterable.
fn validate_binding_set(
    label: &str,
    entries: &[BindGroupLayoutEntry],
) -> Result<(), PipelineError> {
    for (i, entry) in entries.iter().enumerate() {
        // With duplicates ruled out below, an index at or past the entry
        // count means some lower slot is unoccupied.
        if entry.binding as usize >= entries.len() {
            return Err(PipelineError::LayoutCreationFailed(format!(
                "'{label}' binding {} leaves a lower slot empty; bindings must be \
                 contiguous from 0",
                entry.binding
            )));
        }
        if entry.visibility.is_empty() {
            return Err(PipelineError::LayoutCreationFailed(format!(
                "'{label}' binding {} has empty stage visibility",
                entry.binding
            )));
        }
        for other in &entries[..i] {
            if other.binding == entry.binding {
                return Err(PipelineError::LayoutCreationFailed(format!(
                    "'{label}' declares binding {} twice",
                    entry.binding
                )));
            }
        }
        match &entry.ty {
            BindingType::Buffer {
                ty: BufferBindingType::Storage { read_only: false },
                ..
            } => {
                return Err(PipelineError::LayoutCreationFailed(format!(
                    "'{label}' binding {} is a writable storage buffer; render binding sets \
                     only take read-only storage",
                    entry.binding
                )));
            }
            BindingType::Texture {
                sample_type: TextureSampleType::Float { filterable: true },
                ..
            } => {
                return Err(PipelineError::LayoutCreationFailed(format!(
                    "'{label}' binding {} declares a filterable float texture; attachment \
                     reads must be non-filterable",
                    entry.binding
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_gbuffer_read_set_shape() {
        let entries = gbuffer_read_entries(GBufferLayout::Split);
        assert_eq!(entries.len(), 4);
        assert!(matches!(
            entries[0].ty,
            BindingType::Texture {
                sample_type: TextureSampleType::Float { filterable: false },
                ..
            }
        ));
        assert!(matches!(
            entries[2].ty,
            BindingType::Texture {
                sample_type: TextureSampleType::Depth,
                ..
            }
        ));
        assert!(matches!(
            entries[3].ty,
            BindingType::Sampler(SamplerBindingType::NonFiltering)
        ));
    }

    #[test]
    fn packed_gbuffer_read_set_shape() {
        let entries = gbuffer_read_entries(GBufferLayout::Packed);
        assert_eq!(entries.len(), 3);
        assert!(matches!(
            entries[0].ty,
            BindingType::Texture {
                sample_type: TextureSampleType::Uint,
                ..
            }
        ));
    }

    #[test]
    fn validation_rejects_duplicate_bindings() {
        let entries = [
            BindGroupLayoutEntry::buffer(
                0,
                ShaderStageFlags::FRAGMENT,
                BufferBindingType::Uniform,
                false,
                None,
            ),
            BindGroupLayoutEntry::buffer(
                0,
                ShaderStageFlags::FRAGMENT,
                BufferBindingType::Uniform,
                false,
                None,
            ),
        ];
        let err = validate_binding_set("dup", &entries).unwrap_err();
        assert!(matches!(err, PipelineError::LayoutCreationFailed(_)));
        assert!(format!("{err}").contains("twice"));
    }

    #[test]
    fn validation_rejects_lone_high_binding() {
        let entries = [BindGroupLayoutEntry::buffer(
            5,
            ShaderStageFlags::FRAGMENT,
            BufferBindingType::Uniform,
            false,
            None,
        )];
        let err = validate_binding_set("gappy", &entries).unwrap_err();
        assert!(format!("{err}").contains("contiguous from 0"));
    }

    #[test]
    fn validation_rejects_skipped_binding_slot() {
        let entries = [
            BindGroupLayoutEntry::buffer(
                0,
                ShaderStageFlags::VERTEX,
                BufferBindingType::Uniform,
                false,
                None,
            ),
            BindGroupLayoutEntry::buffer(
                2,
                ShaderStageFlags::FRAGMENT,
                BufferBindingType::Uniform,
                false,
                None,
            ),
        ];
        let err = validate_binding_set("skipped", &entries).unwrap_err();
        assert!(matches!(err, PipelineError::LayoutCreationFailed(_)));
        assert!(format!("{err}").contains("contiguous from 0"));
    }

    #[test]
    fn validation_rejects_empty_visibility() {
        let entries = [BindGroupLayoutEntry::buffer(
            0,
            ShaderStageFlags::NONE,
            BufferBindingType::Uniform,
            false,
            None,
        )];
        let err = validate_binding_set("invisible", &entries).unwrap_err();
        assert!(format!("{err}").contains("empty stage visibility"));
    }

    #[test]
    fn validation_rejects_writable_storage() {
        let entries = [BindGroupLayoutEntry::buffer(
            0,
            ShaderStageFlags::FRAGMENT,
            BufferBindingType::Storage { read_only: false },
            false,
            None,
        )];
        let err = validate_binding_set("rw", &entries).unwrap_err();
        assert!(format!("{err}").contains("read-only"));
    }

    #[test]
    fn validation_rejects_filterable_attachment_reads() {
        let entries = [BindGroupLayoutEntry::texture_2d(
            0,
            ShaderStageFlags::FRAGMENT,
            TextureSampleType::Float { filterable: true },
        )];
        let err = validate_binding_set("filterable", &entries).unwrap_err();
        assert!(format!("{err}").contains("non-filterable"));
    }

    #[test]
    fn lane_binding_sets_pass_validation() {
        for layout in [GBufferLayout::Split, GBufferLayout::Packed] {
            validate_binding_set("gbuffer_read", &gbuffer_read_entries(layout)).unwrap();
        }
    }
}
