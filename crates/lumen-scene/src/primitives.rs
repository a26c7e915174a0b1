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

//! Built-in geometry.

use crate::error::Result;
use crate::index::MeshIndex;
use crate::mesh::{Mesh, MeshIndices};
use crate::scene::Scene;
use lumen_core::renderer::{
    GraphicsDevice, IndexFormat, IndexSourceDescriptor, VertexBufferData,
    VertexBufferLayoutDescriptor, VertexFormat, VertexSourceDescriptor,
};
use std::borrow::Cow;

/// Number of vertices of [`CUBE_VERTICES`].
pub const CUBE_VERTEX_COUNT: u32 = 36;

/// A unit cube spanning `[-1, 1]`, as a non-indexed triangle list. Each vertex is
/// position (3), normal (3), uv (2).
#[rustfmt::skip]
pub const CUBE_VERTICES: [f32; 36 * 8] = [
    // back
    -1.0, -1.0, -1.0,  0.0,  0.0, -1.0,  0.0, 0.0,
     1.0,  1.0, -1.0,  0.0,  0.0, -1.0,  1.0, 1.0,
     1.0, -1.0, -1.0,  0.0,  0.0, -1.0,  1.0, 0.0,
     1.0,  1.0, -1.0,  0.0,  0.0, -1.0,  1.0, 1.0,
    -1.0, -1.0, -1.0,  0.0,  0.0, -1.0,  0.0, 0.0,
    -1.0,  1.0, -1.0,  0.0,  0.0, -1.0,  0.0, 1.0,
    // front
    -1.0, -1.0,  1.0,  0.0,  0.0,  1.0,  0.0, 0.0,
     1.0, -1.0,  1.0,  0.0,  0.0,  1.0,  1.0, 0.0,
     1.0,  1.0,  1.0,  0.0,  0.0,  1.0,  1.0, 1.0,
     1.0,  1.0,  1.0,  0.0,  0.0,  1.0,  1.0, 1.0,
    -1.0,  1.0,  1.0,  0.0,  0.0,  1.0,  0.0, 1.0,
    -1.0, -1.0,  1.0,  0.0,  0.0,  1.0,  0.0, 0.0,
    // left
    -1.0,  1.0,  1.0, -1.0,  0.0,  0.0,  1.0, 0.0,
    -1.0,  1.0, -1.0, -1.0,  0.0,  0.0,  1.0, 1.0,
    -1.0, -1.0, -1.0, -1.0,  0.0,  0.0,  0.0, 1.0,
    -1.0, -1.0, -1.0, -1.0,  0.0,  0.0,  0.0, 1.0,
    -1.0, -1.0,  1.0, -1.0,  0.0,  0.0,  0.0, 0.0,
    -1.0,  1.0,  1.0, -1.0,  0.0,  0.0,  1.0, 0.0,
    // right
     1.0,  1.0,  1.0,  1.0,  0.0,  0.0,  1.0, 0.0,
     1.0, -1.0, -1.0,  1.0,  0.0,  0.0,  0.0, 1.0,
     1.0,  1.0, -1.0,  1.0,  0.0,  0.0,  1.0, 1.0,
     1.0, -1.0, -1.0,  1.0,  0.0,  0.0,  0.0, 1.0,
     1.0,  1.0,  1.0,  1.0,  0.0,  0.0,  1.0, 0.0,
     1.0, -1.0,  1.0,  1.0,  0.0,  0.0,  0.0, 0.0,
    // bottom
    -1.0, -1.0, -1.0,  0.0, -1.0,  0.0,  0.0, 1.0,
     1.0, -1.0, -1.0,  0.0, -1.0,  0.0,  1.0, 1.0,
     1.0, -1.0,  1.0,  0.0, -1.0,  0.0,  1.0, 0.0,
     1.0, -1.0,  1.0,  0.0, -1.0,  0.0,  1.0, 0.0,
    -1.0, -1.0,  1.0,  0.0, -1.0,  0.0,  0.0, 0.0,
    -1.0, -1.0, -1.0,  0.0, -1.0,  0.0,  0.0, 1.0,
    // top
    -1.0,  1.0, -1.0,  0.0,  1.0,  0.0,  0.0, 1.0,
     1.0,  1.0,  1.0,  0.0,  1.0,  0.0,  1.0, 0.0,
     1.0,  1.0, -1.0,  0.0,  1.0,  0.0,  1.0, 1.0,
     1.0,  1.0,  1.0,  0.0,  1.0,  0.0,  1.0, 0.0,
    -1.0,  1.0, -1.0,  0.0,  1.0,  0.0,  0.0, 1.0,
    -1.0,  1.0,  1.0,  0.0,  1.0,  0.0,  0.0, 0.0,
];

/// Corners of a fullscreen quad in the `z = 0` plane: position (3), uv (2).
#[rustfmt::skip]
pub const PLANE_VERTICES: [f32; 4 * 5] = [
     1.0,  1.0, 0.0,  1.0, 1.0, // top right
     1.0, -1.0, 0.0,  1.0, 0.0, // bottom right
    -1.0, -1.0, 0.0,  0.0, 0.0, // bottom left
    -1.0,  1.0, 0.0,  0.0, 1.0, // top left
];

/// Two triangles over [`PLANE_VERTICES`].
pub const PLANE_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

impl Scene {
    /// Uploads the cube and registers its mesh. Attributes sit at locations 0
    /// (position), 2 (normal) and 1 (uv).
    pub fn create_cube_mesh(&mut self, device: &mut dyn GraphicsDevice) -> Result<MeshIndex> {
        let layout = VertexBufferLayoutDescriptor::interleaved(&[
            (0, VertexFormat::Float32x3),
            (2, VertexFormat::Float32x3),
            (1, VertexFormat::Float32x2),
        ]);
        let vertex_source = self.create_vertex_source(
            device,
            &VertexSourceDescriptor {
                label: Some(Cow::Borrowed("cube")),
                buffers: vec![VertexBufferData {
                    data: Cow::Borrowed(bytemuck::cast_slice(&CUBE_VERTICES)),
                    layout,
                }],
            },
        )?;
        Ok(self.create_mesh(Mesh::non_indexed(vertex_source, CUBE_VERTEX_COUNT)))
    }

    /// Uploads the indexed plane and registers its mesh. Attributes sit at locations
    /// 0 (position) and 1 (uv).
    pub fn create_plane_mesh(&mut self, device: &mut dyn GraphicsDevice) -> Result<MeshIndex> {
        let layout = VertexBufferLayoutDescriptor::interleaved(&[
            (0, VertexFormat::Float32x3),
            (1, VertexFormat::Float32x2),
        ]);
        let vertex_source = self.create_vertex_source(
            device,
            &VertexSourceDescriptor {
                label: Some(Cow::Borrowed("plane")),
                buffers: vec![VertexBufferData {
                    data: Cow::Borrowed(bytemuck::cast_slice(&PLANE_VERTICES)),
                    layout,
                }],
            },
        )?;
        let index_source = self.create_index_source(
            device,
            &IndexSourceDescriptor {
                label: Some(Cow::Borrowed("plane")),
                data: Cow::Borrowed(bytemuck::cast_slice(&PLANE_INDICES)),
                format: IndexFormat::Uint32,
            },
        )?;
        Ok(self.create_mesh(Mesh::indexed(
            vertex_source,
            4,
            MeshIndices {
                source: index_source,
                format: IndexFormat::Uint32,
                count: PLANE_INDICES.len() as u32,
            },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_normals_are_unit_axes() {
        for vertex in CUBE_VERTICES.chunks_exact(8) {
            let normal = &vertex[3..6];
            let length: f32 = normal.iter().map(|c| c * c).sum();
            assert_eq!(length, 1.0);
        }
    }

    #[test]
    fn plane_indices_address_four_corners() {
        assert!(PLANE_INDICES.iter().all(|&i| i < 4));
    }
}
