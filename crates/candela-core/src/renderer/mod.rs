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

//! Core rendering abstractions: the backend-agnostic API surface, the
//! capability traits backends implement, G-buffer and cluster data contracts,
//! and the rendering error hierarchy.

pub mod api;
pub mod cluster;
pub mod error;
pub mod gbuffer;
pub mod traits;

pub use self::api::*;
pub use self::cluster::{ClusterGridConfig, ClusterUniforms, GpuLight, LightClusteringStage};
pub use self::error::{PipelineError, RenderError, ResourceError, ShaderError};
pub use self::gbuffer::{pack_surface, unpack_surface, GBufferLayout};
pub use self::traits::{CommandEncoder, ComputePass, DrawRecorder, GraphicsDevice, RenderPass};
