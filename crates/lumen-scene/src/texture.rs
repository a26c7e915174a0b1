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

//! Registry textures tagged with their dimensionality.

use lumen_core::renderer::{TextureId, TextureViewDimension};

/// A registry texture: a device texture tagged with its dimensionality.
///
/// The set is closed; bind sites match on it instead of dispatching dynamically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Texture {
    /// A one-dimensional texture (e.g. a lookup ramp).
    D1(TextureId),
    /// A two-dimensional image or render target.
    D2(TextureId),
    /// A cubemap (environment and IBL maps).
    Cube(TextureId),
    /// A volumetric texture.
    D3(TextureId),
}

impl Texture {
    /// Wraps a device texture of the given dimension.
    pub fn new(dimension: TextureViewDimension, id: TextureId) -> Self {
        match dimension {
            TextureViewDimension::D1 => Texture::D1(id),
            TextureViewDimension::D2 => Texture::D2(id),
            TextureViewDimension::Cube => Texture::Cube(id),
            TextureViewDimension::D3 => Texture::D3(id),
        }
    }

    /// The device texture.
    pub fn id(&self) -> TextureId {
        match *self {
            Texture::D1(id) | Texture::D2(id) | Texture::Cube(id) | Texture::D3(id) => id,
        }
    }

    /// The dimensionality of the texture.
    pub fn dimension(&self) -> TextureViewDimension {
        match self {
            Texture::D1(_) => TextureViewDimension::D1,
            Texture::D2(_) => TextureViewDimension::D2,
            Texture::Cube(_) => TextureViewDimension::Cube,
            Texture::D3(_) => TextureViewDimension::D3,
        }
    }
}
