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

//! Enums for draw-state configuration.

use serde::{Deserialize, Serialize};

/// Defines how vertices are connected to form a geometric primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrimitiveTopology {
    /// Vertices are rendered as a list of isolated points.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Vertices are rendered as a connected line strip.
    LineStrip,
    /// A line strip whose last vertex connects back to the first.
    LineLoop,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Vertices are rendered as a connected triangle strip.
    TriangleStrip,
    /// Triangles sharing the first vertex.
    TriangleFan,
    /// A line list with adjacency information for geometry shaders.
    LineListAdjacency,
    /// A line strip with adjacency information for geometry shaders.
    LineStripAdjacency,
    /// A triangle list with adjacency information for geometry shaders.
    TriangleListAdjacency,
    /// A triangle strip with adjacency information for geometry shaders.
    TriangleStripAdjacency,
}

impl PrimitiveTopology {
    /// Returns `true` for the topologies carrying adjacency vertices.
    pub fn has_adjacency(&self) -> bool {
        matches!(
            self,
            PrimitiveTopology::LineListAdjacency
                | PrimitiveTopology::LineStripAdjacency
                | PrimitiveTopology::TriangleListAdjacency
                | PrimitiveTopology::TriangleStripAdjacency
        )
    }

    /// Returns `true` for strip topologies.
    pub fn is_strip(&self) -> bool {
        matches!(
            self,
            PrimitiveTopology::LineStrip
                | PrimitiveTopology::TriangleStrip
                | PrimitiveTopology::LineStripAdjacency
                | PrimitiveTopology::TriangleStripAdjacency
        )
    }
}

/// The comparison function used for depth testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompareFunction {
    /// The test passes if the new value is less than the existing value.
    #[default]
    Less,
    /// The test passes if the new value is less than or equal to the existing value.
    LessEqual,
    /// The test passes if the new value is equal to the existing value.
    Equal,
}

/// Defines which face of a triangle to cull (not render).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CullMode {
    /// No culling is performed.
    #[default]
    Off,
    /// Cull front-facing triangles.
    Front,
    /// Cull back-facing triangles.
    Back,
}

/// How fragment colors combine with the colors already in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Fragments overwrite the target.
    #[default]
    Off,
    /// Standard alpha blending: `src * src_alpha + dst * (1 - src_alpha)`.
    Alpha,
    /// Additive blending: `src + dst`.
    Additive,
    /// Multiplicative blending: `src * dst`.
    Multiply,
}
