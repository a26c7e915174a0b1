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

//! Defines data structures related to GPU texture resources.

use crate::math::Extent3D;
use crate::renderer::api::util::TextureFormat;
use bitflags::bitflags;
use std::borrow::Cow;

/// An opaque handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// The dimensionality of a texture as seen by shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureViewDimension {
    /// A one-dimensional texture.
    D1,
    /// A two-dimensional texture.
    D2,
    /// A cubemap texture (six 2D faces stored as array layers).
    Cube,
    /// A three-dimensional (volumetric) texture.
    D3,
}

impl TextureViewDimension {
    /// Number of array layers a texture of this dimension carries.
    pub fn array_layers(&self) -> u32 {
        match self {
            TextureViewDimension::Cube => 6,
            _ => 1,
        }
    }
}

/// The kind of data a shader expects when sampling a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleType {
    /// Filterable floating-point data (color textures).
    #[default]
    Float,
    /// Depth data.
    Depth,
}

bitflags! {
    /// A set of flags describing the allowed usages of a [`TextureId`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// The texture can be used as the source of a copy operation.
        const COPY_SRC = 1 << 0;
        /// The texture can be used as the destination of a copy operation.
        const COPY_DST = 1 << 1;
        /// The texture can be bound in a shader for sampling (reading).
        const TEXTURE_BINDING = 1 << 2;
        /// The texture can be used as a color or depth attachment of a framebuffer.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

impl TextureUsage {
    /// The usage set of framebuffer attachments: rendered into, sampled, blitted and read back.
    pub const ATTACHMENT: TextureUsage = TextureUsage::RENDER_ATTACHMENT
        .union(TextureUsage::TEXTURE_BINDING)
        .union(TextureUsage::COPY_SRC)
        .union(TextureUsage::COPY_DST);

    /// The usage set of sampled images uploaded from the CPU.
    pub const SAMPLED: TextureUsage = TextureUsage::TEXTURE_BINDING.union(TextureUsage::COPY_DST);
}

/// A descriptor used to create a [`TextureId`].
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The dimensions of the texture. Cubemaps use six array layers.
    pub size: Extent3D,
    /// The number of mipmap levels.
    pub mip_level_count: u32,
    /// The dimensionality of the texture.
    pub dimension: TextureViewDimension,
    /// The memory format of the texture's pixels.
    pub format: TextureFormat,
    /// The allowed usages for the texture.
    pub usage: TextureUsage,
}

impl<'a> TextureDescriptor<'a> {
    /// A single-mip 2D texture suitable for use as a framebuffer attachment.
    pub fn attachment(label: &'a str, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            label: Some(Cow::Borrowed(label)),
            size: Extent3D {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            dimension: TextureViewDimension::D2,
            format,
            usage: TextureUsage::ATTACHMENT,
        }
    }
}
