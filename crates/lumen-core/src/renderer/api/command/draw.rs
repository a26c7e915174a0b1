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

//! The shape of a draw call.

use crate::renderer::api::util::IndexFormat;

/// The shape of a draw call. The topology is passed alongside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawCall {
    /// Non-indexed draw over `count` vertices starting at `first`.
    Arrays {
        /// The first vertex.
        first: u32,
        /// The number of vertices.
        count: u32,
    },
    /// Indexed draw of `count` indices from the bound index source.
    Indexed {
        /// The element type of the bound index source.
        format: IndexFormat,
        /// The number of indices.
        count: u32,
    },
}

impl DrawCall {
    /// The number of vertices the call submits.
    pub fn element_count(&self) -> u32 {
        match self {
            DrawCall::Arrays { count, .. } | DrawCall::Indexed { count, .. } => *count,
        }
    }
}
