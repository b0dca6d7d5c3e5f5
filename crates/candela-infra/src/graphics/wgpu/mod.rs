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

//! The wgpu 29 implementation of the `candela-core` graphics traits.
//!
//! [`WgpuDevice`] maps opaque core IDs to reference-counted wgpu objects
//! through internally synchronized registries; [`WgpuGraphicsContext`] owns
//! the logical device and queue.

pub mod command;
pub mod context;
pub mod conversions;
pub mod device;

pub use context::WgpuGraphicsContext;
pub use device::WgpuDevice;
