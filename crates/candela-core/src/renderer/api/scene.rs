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

//! The extracted, GPU-ready scene representation consumed by the render lane.
//!
//! The scene/asset system owns traversal, transforms, and asset storage; what
//! reaches the renderer is this flat node → material → primitive hierarchy
//! where every element is already resident on the GPU and referenced by
//! opaque handles. The traversal order of `nodes` is the draw order.

use crate::renderer::api::bind_group::BindGroupId;
use crate::renderer::api::buffer::BufferId;

/// One drawable primitive: vertex/index buffers plus the index count.
///
/// Index buffers always hold 32-bit indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenePrimitive {
    /// The vertex buffer.
    pub vertex_buffer: BufferId,
    /// The index buffer (`Uint32` indices).
    pub index_buffer: BufferId,
    /// The number of indices to draw.
    pub index_count: u32,
}

/// A material and the primitives drawn with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneMaterial {
    /// The material's bind group (uniforms, textures).
    pub bind_group: BindGroupId,
    /// The primitives rendered with this material.
    pub primitives: Vec<ScenePrimitive>,
}

/// A scene node: one transform binding and the materials drawn under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneNode {
    /// The node's transform bind group (model/normal matrices).
    pub bind_group: BindGroupId,
    /// The materials referenced by this node.
    pub materials: Vec<SceneMaterial>,
}

/// The complete extracted scene for one or more frames.
///
/// The node list is stable between mutations; `topology_version` advances on
/// every structural change so consumers holding pre-recorded draw sequences
/// (render bundles) know to re-record instead of replaying commands that
/// reference dropped resources.
#[derive(Debug, Clone, Default)]
pub struct RenderScene {
    nodes: Vec<SceneNode>,
    topology_version: u64,
}

impl RenderScene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// The nodes in draw order.
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// The current topology version. Advances on every structural mutation.
    pub fn topology_version(&self) -> u64 {
        self.topology_version
    }

    /// Appends a node, advancing the topology version.
    pub fn push_node(&mut self, node: SceneNode) {
        self.nodes.push(node);
        self.topology_version += 1;
    }

    /// Removes all nodes, advancing the topology version.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.topology_version += 1;
    }

    /// Total number of indexed draws this scene produces.
    pub fn draw_count(&self) -> u32 {
        self.nodes
            .iter()
            .flat_map(|n| n.materials.iter())
            .map(|m| m.primitives.len() as u32)
            .sum()
    }

    /// Total number of triangles this scene produces (index counts / 3).
    pub fn triangle_count(&self) -> u32 {
        self.nodes
            .iter()
            .flat_map(|n| n.materials.iter())
            .flat_map(|m| m.primitives.iter())
            .map(|p| p.index_count / 3)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primitive(count: u32) -> ScenePrimitive {
        ScenePrimitive {
            vertex_buffer: BufferId(0),
            index_buffer: BufferId(1),
            index_count: count,
        }
    }

    #[test]
    fn topology_version_advances_on_mutation() {
        let mut scene = RenderScene::new();
        assert_eq!(scene.topology_version(), 0);

        scene.push_node(SceneNode {
            bind_group: BindGroupId(0),
            materials: vec![],
        });
        assert_eq!(scene.topology_version(), 1);

        scene.clear();
        assert_eq!(scene.topology_version(), 2);
        assert!(scene.nodes().is_empty());
    }

    #[test]
    fn draw_and_triangle_counts() {
        let mut scene = RenderScene::new();
        scene.push_node(SceneNode {
            bind_group: BindGroupId(0),
            materials: vec![
                SceneMaterial {
                    bind_group: BindGroupId(1),
                    primitives: vec![primitive(3), primitive(6)],
                },
                SceneMaterial {
                    bind_group: BindGroupId(2),
                    primitives: vec![primitive(36)],
                },
            ],
        });
        assert_eq!(scene.draw_count(), 3);
        assert_eq!(scene.triangle_count(), 1 + 2 + 12);
    }
}
