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

//! Backend-agnostic rendering API.
//!
//! Organized into several logical sub-modules:
//!
//! - **[`buffer`] / [`texture`]**: GPU resource handles and their descriptors.
//! - **[`bind_group`]**: Resource binding contracts shared between pipelines.
//! - **[`pipeline`]**: Static pipeline state, layouts, and configuration.
//! - **[`command`]**: Pass descriptors, command buffers, and render bundles.
//! - **[`shader`]**: Shader module descriptors.
//! - **[`scene`]**: The extracted scene consumed by render lanes.
//! - **[`common`]**: Shared enums, stage flags, and uniform blocks.

pub mod bind_group;
pub mod buffer;
pub mod command;
pub mod common;
pub mod pipeline;
pub mod scene;
pub mod shader;
pub mod texture;

pub use self::bind_group::*;
pub use self::buffer::*;
pub use self::command::*;
pub use self::common::*;
pub use self::pipeline::*;
pub use self::scene::*;
pub use self::shader::*;
pub use self::texture::*;
