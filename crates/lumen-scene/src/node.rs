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

//! The node hierarchy, stored as an index arena.
//!
//! A node's parent always precedes it in the arena, so world transforms are computed
//! in one forward pass.

use crate::index::{MeshIndex, NodeIndex, Registry};
use glam::{Mat4, Quat, Vec3};

/// One node of the hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// An optional name.
    pub name: Option<String>,
    /// The parent node; `None` for roots.
    pub parent: Option<NodeIndex>,
    /// Child nodes, in insertion order.
    pub children: Vec<NodeIndex>,
    /// Local translation.
    pub translation: Vec3,
    /// Local rotation.
    pub rotation: Quat,
    /// Local scale.
    pub scale: Vec3,
    /// The scene meshes this node places; empty when it carries no geometry.
    pub meshes: Vec<MeshIndex>,
    /// The skin of the source asset deforming the meshes, if any.
    pub skin: Option<u32>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: None,
            parent: None,
            children: Vec::new(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            meshes: Vec::new(),
            skin: None,
        }
    }
}

impl Node {
    /// The local transform, `T * R * S`.
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// An arena of nodes with parent links.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Registry<NodeIndex, Node>,
}

impl NodeArena {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node under `parent` (or as a root) and returns its index.
    ///
    /// # Panics
    /// If `parent` is out of range.
    pub fn add(&mut self, parent: Option<NodeIndex>, mut node: Node) -> NodeIndex {
        node.parent = parent;
        node.children.clear();
        let index = self.nodes.push(node);
        if let Some(parent) = parent {
            self.nodes[parent].children.push(index);
        }
        index
    }

    /// The node at `index`.
    pub fn get(&self, index: NodeIndex) -> &Node {
        &self.nodes[index]
    }

    /// The node at `index`, mutably. Hierarchy links are not meant to be edited.
    pub fn get_mut(&mut self, index: NodeIndex) -> &mut Node {
        &mut self.nodes[index]
    }

    /// The number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` for an empty arena.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root nodes, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(index, _)| index)
    }

    /// World transforms of every node, indexed like the arena.
    pub fn world_transforms(&self) -> Vec<Mat4> {
        let mut world: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        for (_, node) in self.nodes.iter() {
            let local = node.local_transform();
            let transform = match node.parent {
                Some(parent) => world[parent.0 as usize] * local,
                None => local,
            };
            world.push(transform);
        }
        world
    }

    /// Visits nodes depth-first, parents before children. When `visit` returns
    /// `false` the children of that node are skipped.
    pub fn traverse(&self, mut visit: impl FnMut(NodeIndex, &Node) -> bool) {
        let mut stack: Vec<NodeIndex> = self.roots().collect();
        stack.reverse();
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if visit(index, node) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn translated(x: f32) -> Node {
        Node {
            translation: Vec3::new(x, 0.0, 0.0),
            ..Default::default()
        }
    }

    #[test]
    fn world_transform_composes_parent_first() {
        // --- 1. ARRANGE ---
        let mut arena = NodeArena::new();
        let root = arena.add(
            None,
            Node {
                scale: Vec3::splat(2.0),
                ..Default::default()
            },
        );
        let child = arena.add(Some(root), translated(1.0));

        // --- 2. ACT ---
        let world = arena.world_transforms();

        // --- 3. ASSERT ---
        let origin = world[child.0 as usize].transform_point3(Vec3::ZERO);
        assert_relative_eq!(origin.x, 2.0);
        assert_relative_eq!(origin.y, 0.0);
    }

    #[test]
    fn local_transform_scales_before_rotating() {
        let node = Node {
            rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            scale: Vec3::new(3.0, 1.0, 1.0),
            ..Default::default()
        };

        let p = node.local_transform().transform_point3(Vec3::X);

        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn traversal_is_depth_first_with_cut_off() {
        let mut arena = NodeArena::new();
        let a = arena.add(None, Node::default());
        let b = arena.add(Some(a), Node::default());
        let _c = arena.add(Some(b), Node::default());
        let d = arena.add(Some(a), Node::default());
        let e = arena.add(None, Node::default());

        let mut visited = Vec::new();
        arena.traverse(|index, _| {
            visited.push(index);
            index != b
        });

        assert_eq!(visited, vec![a, b, d, e]);
    }
}
