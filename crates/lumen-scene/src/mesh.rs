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

//! Geometry sources and the drawables that pair them with a material.

use crate::index::{DrawableIndex, IndexSourceIndex, MaterialIndex, MeshIndex, VertexSourceIndex};
use crate::scene::Scene;
use lumen_core::renderer::{DrawCall, IndexFormat, PrimitiveTopology};

/// The index buffer part of a [`Mesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshIndices {
    /// The index source.
    pub source: IndexSourceIndex,
    /// The element type.
    pub format: IndexFormat,
    /// The number of indices drawn.
    pub count: u32,
}

/// Where a drawable's geometry lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mesh {
    /// The vertex source.
    pub vertex_source: VertexSourceIndex,
    /// The index source, for indexed meshes.
    pub indices: Option<MeshIndices>,
    /// The number of vertices.
    pub vertex_count: u32,
}

impl Mesh {
    /// A mesh drawn over `vertex_count` vertices without indices.
    pub fn non_indexed(vertex_source: VertexSourceIndex, vertex_count: u32) -> Self {
        Self {
            vertex_source,
            indices: None,
            vertex_count,
        }
    }

    /// A mesh drawn through an index source.
    pub fn indexed(
        vertex_source: VertexSourceIndex,
        vertex_count: u32,
        indices: MeshIndices,
    ) -> Self {
        Self {
            vertex_source,
            indices: Some(indices),
            vertex_count,
        }
    }

    /// The draw call submitting the whole mesh.
    pub fn draw_call(&self) -> DrawCall {
        match self.indices {
            Some(indices) => DrawCall::Indexed {
                format: indices.format,
                count: indices.count,
            },
            None => DrawCall::Arrays {
                first: 0,
                count: self.vertex_count,
            },
        }
    }
}

/// A mesh drawn with a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Drawable {
    /// The geometry.
    pub mesh: MeshIndex,
    /// The material.
    pub material: MaterialIndex,
    /// How vertices assemble into primitives.
    pub topology: PrimitiveTopology,
}

impl Scene {
    /// Registers a mesh.
    pub fn create_mesh(&mut self, mesh: Mesh) -> MeshIndex {
        assert!(
            self.vertex_sources.contains(mesh.vertex_source),
            "mesh refers to missing {}",
            mesh.vertex_source
        );
        if let Some(indices) = mesh.indices {
            assert!(
                self.index_sources.contains(indices.source),
                "mesh refers to missing {}",
                indices.source
            );
        }
        self.meshes.push(mesh)
    }

    /// Registers a drawable.
    pub fn create_drawable(
        &mut self,
        mesh: MeshIndex,
        material: MaterialIndex,
        topology: PrimitiveTopology,
    ) -> DrawableIndex {
        assert!(self.meshes.contains(mesh), "drawable refers to missing {mesh}");
        assert!(
            self.materials.contains(material),
            "drawable refers to missing {material}"
        );
        self.drawables.push(Drawable {
            mesh,
            material,
            topology,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_call_follows_index_presence() {
        let plain = Mesh::non_indexed(VertexSourceIndex(0), 36);
        assert_eq!(plain.draw_call(), DrawCall::Arrays { first: 0, count: 36 });

        let indexed = Mesh::indexed(
            VertexSourceIndex(0),
            4,
            MeshIndices {
                source: IndexSourceIndex(0),
                format: IndexFormat::Uint8,
                count: 6,
            },
        );
        assert_eq!(
            indexed.draw_call(),
            DrawCall::Indexed {
                format: IndexFormat::Uint8,
                count: 6
            }
        );
    }
}
