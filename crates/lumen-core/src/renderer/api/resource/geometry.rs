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

//! Vertex and index source descriptors.
//!
//! A vertex source groups one or more vertex buffers together with the attribute
//! layout a vertex shader reads them through; an index source is a buffer of
//! element indices of a fixed [`IndexFormat`].

use crate::renderer::api::util::IndexFormat;
use std::borrow::Cow;

/// An opaque handle to a vertex source (a set of vertex buffers plus their layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexSourceId(pub usize);

/// An opaque handle to an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexSourceId(pub usize);

/// The memory format of a single vertex attribute's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// Four 8-bit unsigned integer components.
    Uint8x4,
    /// Four 8-bit unsigned integer components normalized to `[0.0, 1.0]`.
    Unorm8x4,
    /// Four 16-bit unsigned integer components.
    Uint16x4,
    /// Four 16-bit unsigned integer components normalized to `[0.0, 1.0]`.
    Unorm16x4,
    /// One 32-bit float component.
    Float32,
    /// Two 32-bit float components.
    Float32x2,
    /// Three 32-bit float components.
    Float32x3,
    /// Four 32-bit float components.
    Float32x4,
    /// Four 32-bit unsigned integer components.
    Uint32x4,
}

impl VertexFormat {
    /// Returns the size in bytes of this vertex format
    pub fn size(&self) -> usize {
        match self {
            VertexFormat::Uint8x4 | VertexFormat::Unorm8x4 => 4,
            VertexFormat::Uint16x4 | VertexFormat::Unorm16x4 => 8,
            VertexFormat::Float32 => 4,
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
            VertexFormat::Uint32x4 => 16,
        }
    }
}

/// Describes a single vertex attribute within a vertex buffer layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttributeDescriptor {
    /// The input location of this attribute in the vertex shader (`@location(n)`).
    pub shader_location: u32,
    /// The format of the attribute's data.
    pub format: VertexFormat,
    /// The byte offset of this attribute from the start of the vertex.
    pub offset: u64,
}

/// Describes the memory layout of a single vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexBufferLayoutDescriptor {
    /// The byte distance between consecutive elements in the buffer.
    pub array_stride: u64,
    /// The attributes contained within each element of the buffer.
    pub attributes: Vec<VertexAttributeDescriptor>,
}

impl VertexBufferLayoutDescriptor {
    /// A tightly packed buffer holding a single attribute at `shader_location`.
    pub fn single(shader_location: u32, format: VertexFormat) -> Self {
        Self {
            array_stride: format.size() as u64,
            attributes: vec![VertexAttributeDescriptor {
                shader_location,
                format,
                offset: 0,
            }],
        }
    }

    /// An interleaved buffer whose attributes follow each other in declaration order.
    pub fn interleaved(attributes: &[(u32, VertexFormat)]) -> Self {
        let mut offset = 0;
        let attributes = attributes
            .iter()
            .map(|&(shader_location, format)| {
                let attribute = VertexAttributeDescriptor {
                    shader_location,
                    format,
                    offset,
                };
                offset += format.size() as u64;
                attribute
            })
            .collect();
        Self {
            array_stride: offset,
            attributes,
        }
    }
}

/// One vertex buffer of a vertex source: its bytes and how they are laid out.
#[derive(Debug, Clone)]
pub struct VertexBufferData<'a> {
    /// The raw vertex bytes.
    pub data: Cow<'a, [u8]>,
    /// The layout of each element.
    pub layout: VertexBufferLayoutDescriptor,
}

/// A descriptor used to create a [`VertexSourceId`].
#[derive(Debug, Clone)]
pub struct VertexSourceDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The vertex buffers, bound to consecutive buffer slots.
    pub buffers: Vec<VertexBufferData<'a>>,
}

/// A descriptor used to create an [`IndexSourceId`].
#[derive(Debug, Clone)]
pub struct IndexSourceDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The raw index bytes.
    pub data: Cow<'a, [u8]>,
    /// The element type of the indices.
    pub format: IndexFormat,
}

impl IndexSourceDescriptor<'_> {
    /// Number of indices stored in `data`.
    pub fn index_count(&self) -> u32 {
        (self.data.len() / self.format.size()) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_layout_accumulates_offsets() {
        let layout = VertexBufferLayoutDescriptor::interleaved(&[
            (0, VertexFormat::Float32x3),
            (2, VertexFormat::Float32x3),
            (1, VertexFormat::Float32x2),
        ]);

        assert_eq!(layout.array_stride, 32);
        let offsets: Vec<u64> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
    }

    #[test]
    fn index_count_depends_on_format() {
        let data = [0u8; 12];
        let descriptor = IndexSourceDescriptor {
            label: None,
            data: Cow::Borrowed(&data),
            format: IndexFormat::Uint16,
        };
        assert_eq!(descriptor.index_count(), 6);
    }
}
