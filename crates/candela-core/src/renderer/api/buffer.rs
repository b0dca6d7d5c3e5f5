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

//! Defines data structures for GPU buffers.

use crate::candela_bitflags;
use std::borrow::Cow;

candela_bitflags! {
    /// Flags describing how a buffer may be used by the GPU.
    pub struct BufferUsage: u32 {
        /// The buffer can be used as a vertex buffer.
        const VERTEX = 1 << 0;
        /// The buffer can be used as an index buffer.
        const INDEX = 1 << 1;
        /// The buffer can be bound as a uniform buffer.
        const UNIFORM = 1 << 2;
        /// The buffer can be bound as a storage buffer.
        const STORAGE = 1 << 3;
        /// The buffer can be the destination of a copy or write operation.
        const COPY_DST = 1 << 4;
        /// The buffer can be the source of a copy operation.
        const COPY_SRC = 1 << 5;
    }
}

/// Describes a buffer to be created by the `GraphicsDevice`.
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The size of the buffer in bytes.
    pub size: u64,
    /// How the buffer will be used.
    pub usage: BufferUsage,
    /// Whether the buffer is mapped for CPU access at creation.
    pub mapped_at_creation: bool,
}

/// An opaque handle to a GPU buffer resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_usage_combination() {
        let usage = BufferUsage::UNIFORM | BufferUsage::COPY_DST;
        assert!(usage.contains(BufferUsage::UNIFORM));
        assert!(usage.contains(BufferUsage::COPY_DST));
        assert!(!usage.contains(BufferUsage::VERTEX));
    }

    #[test]
    fn buffer_descriptor_creation() {
        let descriptor = BufferDescriptor {
            label: Some(Cow::Borrowed("camera_uniforms")),
            size: 256,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        };
        assert_eq!(descriptor.size, 256);
        assert!(descriptor.usage.contains(BufferUsage::UNIFORM));
    }
}
